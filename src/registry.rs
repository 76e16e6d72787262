//! Registry core: registration, parent resolution, and active-element
//! tracking.
//!
//! The registry keeps two views of the same population of elements: a flat
//! element-to-metadata map in registration order, and a logical-id index
//! mapping each id to every element currently registered under it. A third
//! structure, the pending-relationship queue, holds declared parent links
//! that could not be resolved yet because the parent has not mounted.
//!
//! Mount order is explicitly untrusted. A child may register before its
//! declared parent, a parent may remount under the same logical id, and two
//! unrelated subtrees may share ids. The registry reconciles all of this
//! opportunistically: at registration time (resolving pending links the new
//! element satisfies), and lazily before navigation (reconnecting orphans to
//! their nearest registered physical ancestor).
//!
//! # Example
//!
//! ```
//! use focal::prelude::*;
//! use focal::testing::TreeHandle;
//!
//! let manager: FocusManager<TreeHandle> = FocusManager::new();
//! let root = TreeHandle::root("root");
//! let button = root.spawn("ok-button");
//!
//! manager.register(FocusOptions::new("content"), root.clone());
//! manager.register(
//!     FocusOptions::new("item:ok").parent("content").tab_index(1),
//!     button.clone(),
//! );
//!
//! manager.set_active(LogicalId::from("item:ok"));
//! assert_eq!(manager.active(), Some(button));
//! ```

use crate::element::Element;
use crate::events::{EventResult, KeyEvent};
use crate::id::LogicalId;
use crate::macros::focus_trace;
use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;
use std::sync::Arc;

/// Callback fired when an element gains or loses focus.
pub type FocusCallback<E, P> = Arc<dyn Fn(&FocusContext<'_, E, P>) + Send + Sync>;

/// Per-element key handler. Runs before the default bindings; returning
/// [`EventResult::Continue`] lets the default bindings see the event.
pub type KeydownCallback<E, P> =
    Arc<dyn Fn(&KeyEvent, &FocusContext<'_, E, P>) -> EventResult + Send + Sync>;

/// Observer fired after every active-element change, including clears.
pub type ActiveChangeCallback<E, P> =
    Arc<dyn Fn(&FocusManager<E, P>, Option<&E>) + Send + Sync>;

/// Errors surfaced by the focus layer.
///
/// Almost nothing here is an error by design: unresolvable parents defer,
/// unknown targets no-op, malformed-looking ids degrade to opaque ids. What
/// remains is caller misconfiguration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FocusError {
    /// A radio group needs at least two trigger ids to mean anything.
    #[error("radio group requires at least two trigger ids, got {count}")]
    NotEnoughTriggers {
        /// Number of triggers supplied.
        count: usize,
    },
}

/// Target of [`FocusManager::set_active`]: a concrete element, or a logical
/// id resolved through candidate scoring.
#[derive(Debug, Clone)]
pub enum FocusTarget<E: Element> {
    /// A concrete element handle.
    Element(E),
    /// A logical id; the best-scoring registered candidate wins.
    Id(LogicalId),
}

impl<E: Element> FocusTarget<E> {
    /// Target a concrete element.
    pub fn element(element: E) -> Self {
        Self::Element(element)
    }

    /// Target a logical id.
    pub fn id(id: impl Into<LogicalId>) -> Self {
        Self::Id(id.into())
    }
}

impl<E: Element> From<LogicalId> for FocusTarget<E> {
    fn from(id: LogicalId) -> Self {
        Self::Id(id)
    }
}

impl<E: Element> From<crate::id::KnownId> for FocusTarget<E> {
    fn from(id: crate::id::KnownId) -> Self {
        Self::Id(id.into())
    }
}

impl<E: Element> From<&str> for FocusTarget<E> {
    fn from(id: &str) -> Self {
        Self::Id(LogicalId::parse(id))
    }
}

/// Context handed to focus, blur, and keydown callbacks.
///
/// Bundles the element, its logical id, its payload, and the manager handle
/// so a handler can re-navigate ("jump to this other region") directly.
pub struct FocusContext<'a, E: Element, P: 'static = ()> {
    manager: &'a FocusManager<E, P>,
    element: E,
    id: LogicalId,
    payload: Option<Arc<P>>,
}

impl<'a, E: Element, P: 'static> FocusContext<'a, E, P> {
    pub(crate) fn new(
        manager: &'a FocusManager<E, P>,
        element: E,
        id: LogicalId,
        payload: Option<Arc<P>>,
    ) -> Self {
        Self {
            manager,
            element,
            id,
            payload,
        }
    }

    /// The manager that delivered this event.
    pub fn manager(&self) -> &'a FocusManager<E, P> {
        self.manager
    }

    /// The element this event concerns.
    pub fn element(&self) -> &E {
        &self.element
    }

    /// The element's logical id.
    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    /// The payload attached at registration, if any.
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_deref()
    }
}

/// Registration options for one element.
///
/// Everything beyond the logical id is optional; defaults match an enabled,
/// priority-0, tab-index-0 region with no metadata or callbacks.
///
/// # Example
///
/// ```
/// use focal::prelude::*;
/// use focal::testing::TreeHandle;
///
/// let options: FocusOptions<TreeHandle> = FocusOptions::new("pane:chat")
///     .parent("content")
///     .priority(1)
///     .display_name("Chat")
///     .tag("pane");
/// ```
pub struct FocusOptions<E: Element, P: 'static = ()> {
    pub(crate) id: LogicalId,
    pub(crate) parent_id: Option<LogicalId>,
    pub(crate) payload: Option<Arc<P>>,
    pub(crate) priority: i32,
    pub(crate) tab_index: i32,
    pub(crate) disabled: bool,
    pub(crate) display_name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) on_keydown: Option<KeydownCallback<E, P>>,
    pub(crate) on_focus: Option<FocusCallback<E, P>>,
    pub(crate) on_blur: Option<FocusCallback<E, P>>,
}

impl<E: Element, P: 'static> FocusOptions<E, P> {
    /// Options for an element registered under `id`.
    pub fn new(id: impl Into<LogicalId>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            payload: None,
            priority: 0,
            tab_index: 0,
            disabled: false,
            display_name: None,
            description: None,
            tags: Vec::new(),
            on_keydown: None,
            on_focus: None,
            on_blur: None,
        }
    }

    /// Declare the logical parent. Resolution may be deferred if no such
    /// element is registered yet.
    pub fn parent(mut self, id: impl Into<LogicalId>) -> Self {
        self.parent_id = Some(id.into());
        self
    }

    /// Attach an opaque payload, later visible to callbacks.
    pub fn payload(mut self, payload: P) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Candidate-selection priority (default 0, higher wins).
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sibling traversal order (default 0, ascending).
    pub fn tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = tab_index;
        self
    }

    /// Disabled elements are skipped by navigation and scored out of
    /// candidate selection.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Human-readable name, for introspection only.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Longer description, for introspection only.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add one search tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replace the full tag list.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Per-element key handler, invoked before the default bindings.
    pub fn on_keydown<F>(mut self, handler: F) -> Self
    where
        F: Fn(&KeyEvent, &FocusContext<'_, E, P>) -> EventResult + Send + Sync + 'static,
    {
        self.on_keydown = Some(Arc::new(handler));
        self
    }

    /// Called when the element becomes active.
    pub fn on_focus<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FocusContext<'_, E, P>) + Send + Sync + 'static,
    {
        self.on_focus = Some(Arc::new(handler));
        self
    }

    /// Called when the element stops being active.
    pub fn on_blur<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FocusContext<'_, E, P>) + Send + Sync + 'static,
    {
        self.on_blur = Some(Arc::new(handler));
        self
    }
}

/// A partial update applied to an existing registration.
///
/// Only fields the patch explicitly sets are touched. Setting a parent id
/// re-runs parent resolution (and may defer, exactly as registration does).
pub struct OptionsPatch<E: Element, P: 'static = ()> {
    pub(crate) parent_id: Option<LogicalId>,
    pub(crate) payload: Option<Arc<P>>,
    pub(crate) priority: Option<i32>,
    pub(crate) tab_index: Option<i32>,
    pub(crate) disabled: Option<bool>,
    pub(crate) display_name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) on_keydown: Option<KeydownCallback<E, P>>,
    pub(crate) on_focus: Option<FocusCallback<E, P>>,
    pub(crate) on_blur: Option<FocusCallback<E, P>>,
}

impl<E: Element, P: 'static> OptionsPatch<E, P> {
    /// An empty patch; applying it changes nothing.
    pub fn new() -> Self {
        Self {
            parent_id: None,
            payload: None,
            priority: None,
            tab_index: None,
            disabled: None,
            display_name: None,
            description: None,
            tags: None,
            on_keydown: None,
            on_focus: None,
            on_blur: None,
        }
    }

    /// Re-declare the logical parent.
    pub fn parent(mut self, id: impl Into<LogicalId>) -> Self {
        self.parent_id = Some(id.into());
        self
    }

    /// Replace the payload.
    pub fn payload(mut self, payload: P) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Replace the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replace the tab index.
    pub fn tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    /// Enable or disable the element.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Replace the display name.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Replace the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the tag list.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Replace the key handler.
    pub fn on_keydown<F>(mut self, handler: F) -> Self
    where
        F: Fn(&KeyEvent, &FocusContext<'_, E, P>) -> EventResult + Send + Sync + 'static,
    {
        self.on_keydown = Some(Arc::new(handler));
        self
    }

    /// Replace the focus callback.
    pub fn on_focus<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FocusContext<'_, E, P>) + Send + Sync + 'static,
    {
        self.on_focus = Some(Arc::new(handler));
        self
    }

    /// Replace the blur callback.
    pub fn on_blur<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FocusContext<'_, E, P>) + Send + Sync + 'static,
    {
        self.on_blur = Some(Arc::new(handler));
        self
    }
}

impl<E: Element, P: 'static> Default for OptionsPatch<E, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`FocusManager::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Per-element registration metadata.
pub(crate) struct Registration<E: Element, P: 'static> {
    pub(crate) id: LogicalId,
    pub(crate) parent: Option<E>,
    /// Linked children, registration order, no duplicates.
    pub(crate) children: SmallVec<[E; 4]>,
    /// Monotonic registration sequence; the recency tie-breaker.
    pub(crate) seq: u64,
    pub(crate) payload: Option<Arc<P>>,
    pub(crate) priority: i32,
    pub(crate) tab_index: i32,
    pub(crate) disabled: bool,
    pub(crate) display_name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) on_keydown: Option<KeydownCallback<E, P>>,
    pub(crate) on_focus: Option<FocusCallback<E, P>>,
    pub(crate) on_blur: Option<FocusCallback<E, P>>,
}

/// A declared parent link waiting for its parent to register.
pub(crate) struct PendingRelationship<E> {
    pub(crate) child: E,
    pub(crate) parent_id: LogicalId,
    pub(crate) seq: u64,
}

pub(crate) struct RegistryInner<E: Element, P: 'static> {
    /// Element-to-metadata map; iteration order is registration order.
    pub(crate) elements: IndexMap<E, Registration<E, P>, FxBuildHasher>,
    /// Logical id to every element registered under it, registration order.
    pub(crate) logical_index: FxHashMap<LogicalId, Vec<E>>,
    /// Declared-but-unresolved parent links, scanned linearly; fine at UI
    /// scale (dozens of elements).
    pub(crate) pending: Vec<PendingRelationship<E>>,
    pub(crate) active: Option<E>,
    seq: u64,
    observers: Vec<(ObserverId, ActiveChangeCallback<E, P>)>,
    next_observer: u64,
}

impl<E: Element, P: 'static> RegistryInner<E, P> {
    fn empty() -> Self {
        Self {
            elements: IndexMap::default(),
            logical_index: FxHashMap::default(),
            pending: Vec::new(),
            active: None,
            seq: 0,
            observers: Vec::new(),
            next_observer: 0,
        }
    }
}

/// The focus registry and manager.
///
/// Cheap to clone; clones share one registry. Hand clones to whatever needs
/// to register elements or drive navigation rather than reaching for a
/// global.
///
/// All operations run to completion before returning; user callbacks are
/// invoked with the registry lock released, so callbacks may re-enter the
/// manager freely (navigate from `on_focus`, re-register from `on_blur`,
/// and so on).
pub struct FocusManager<E: Element, P: 'static = ()> {
    pub(crate) inner: Arc<RwLock<RegistryInner<E, P>>>,
}

impl<E: Element, P: 'static> Clone for FocusManager<E, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Element, P: 'static> Default for FocusManager<E, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element, P: 'static> FocusManager<E, P> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner::empty())),
        }
    }

    /// Register an element under a logical id.
    ///
    /// Idempotent per element: if the element is already registered, the old
    /// registration is fully removed first (exactly as if [`unregister`]
    /// had been called), so a re-register can change the logical id or the
    /// declared parent without leaving stale bookkeeping behind.
    ///
    /// Parent resolution tries, in order: the most recently registered
    /// element under the declared parent id; the nearest registered physical
    /// ancestor under that id; otherwise the link is deferred to the pending
    /// queue and the element stays parentless but fully focusable.
    ///
    /// [`unregister`]: FocusManager::unregister
    pub fn register(&self, options: FocusOptions<E, P>, element: E) {
        let active_cleared = {
            let mut inner = self.inner.write();
            let cleared = if inner.elements.contains_key(&element) {
                remove_element(&mut inner, &element)
            } else {
                false
            };

            inner.seq += 1;
            let seq = inner.seq;

            let parent = options
                .parent_id
                .as_ref()
                .and_then(|pid| resolve_parent(&inner, &element, pid));

            if parent.is_none() {
                if let Some(parent_id) = options.parent_id.clone() {
                    focus_trace!(
                        child = %options.id,
                        parent = %parent_id,
                        "parent not registered yet; deferring relationship"
                    );
                    inner.pending.push(PendingRelationship {
                        child: element.clone(),
                        parent_id,
                        seq,
                    });
                }
            }

            let registration = Registration {
                id: options.id.clone(),
                parent: None,
                children: SmallVec::new(),
                seq,
                payload: options.payload,
                priority: options.priority,
                tab_index: options.tab_index,
                disabled: options.disabled,
                display_name: options.display_name,
                description: options.description,
                tags: options.tags,
                on_keydown: options.on_keydown,
                on_focus: options.on_focus,
                on_blur: options.on_blur,
            };
            inner.elements.insert(element.clone(), registration);
            inner
                .logical_index
                .entry(options.id)
                .or_default()
                .push(element.clone());

            if let Some(parent) = parent {
                link_child(&mut inner, &parent, &element);
            }

            resolve_pending_for(&mut inner, &element);
            cleared
        };

        if active_cleared {
            self.notify_active_observers();
        }
    }

    /// Unregister one element, or every element under a logical id.
    ///
    /// With an element, only that element is removed (the id is advisory).
    /// Without one, every element registered under `id` is removed, and
    /// pending relationships that declared `id` as their parent are dropped
    /// with it. Either way, removed parents orphan their children: the
    /// children stay registered with their parent link cleared, eligible
    /// for lazy reconnection later.
    pub fn unregister(&self, id: &LogicalId, element: Option<&E>) {
        let active_cleared = {
            let mut inner = self.inner.write();
            match element {
                Some(el) => remove_element(&mut inner, el),
                None => {
                    let victims = inner.logical_index.get(id).cloned().unwrap_or_default();
                    let mut cleared = false;
                    for el in &victims {
                        cleared |= remove_element(&mut inner, el);
                    }
                    // The parent identity itself is gone; waiting on it is
                    // pointless.
                    inner.pending.retain(|p| p.parent_id != *id);
                    cleared
                }
            }
        };

        if active_cleared {
            self.notify_active_observers();
        }
    }

    /// Make an element active, resolving a logical id to its best candidate.
    ///
    /// No-op when the target cannot be resolved to a currently registered
    /// element, and when the target is already active. On a change the
    /// element receives physical input focus, then `on_blur` fires for the
    /// previous element and `on_focus` for the new one, then active-change
    /// observers run.
    pub fn set_active(&self, target: impl Into<FocusTarget<E>>) {
        let resolved = {
            let inner = self.inner.read();
            match target.into() {
                FocusTarget::Element(el) => inner.elements.contains_key(&el).then_some(el),
                FocusTarget::Id(id) => select_best_candidate(&inner, &id),
            }
        };
        if let Some(next) = resolved {
            self.activate(next);
        }
    }

    /// Leave no element active, firing `on_blur` on the current one.
    pub fn clear_active(&self) {
        let blur = {
            let mut inner = self.inner.write();
            let Some(prev) = inner.active.take() else {
                return;
            };
            inner
                .elements
                .get(&prev)
                .map(|r| (prev.clone(), r.id.clone(), r.payload.clone(), r.on_blur.clone()))
        };

        if let Some((el, id, payload, Some(on_blur))) = blur {
            on_blur(&FocusContext {
                manager: self,
                element: el,
                id,
                payload,
            });
        }
        self.notify_active_observers();
    }

    /// The currently active element, if any.
    #[must_use]
    pub fn active(&self) -> Option<E> {
        self.inner.read().active.clone()
    }

    /// The logical id of the currently active element, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<LogicalId> {
        let inner = self.inner.read();
        inner
            .active
            .as_ref()
            .and_then(|el| inner.elements.get(el))
            .map(|r| r.id.clone())
    }

    /// The best-scoring element currently registered under `id`.
    ///
    /// Disabled candidates score far below everything else, declared
    /// priority dominates among enabled ones, visibility breaks priority
    /// ties, and registration recency breaks the rest. The earliest
    /// registered candidate wins exact ties.
    #[must_use]
    pub fn best_candidate(&self, id: &LogicalId) -> Option<E> {
        select_best_candidate(&self.inner.read(), id)
    }

    /// Apply a partial options update to a registered element.
    ///
    /// No-op for unregistered elements. See [`OptionsPatch`].
    pub fn merge_options(&self, element: &E, patch: OptionsPatch<E, P>) {
        let mut inner = self.inner.write();
        let seq;
        {
            let Some(reg) = inner.elements.get_mut(element) else {
                return;
            };
            seq = reg.seq;
            if let Some(payload) = patch.payload {
                reg.payload = Some(payload);
            }
            if let Some(priority) = patch.priority {
                reg.priority = priority;
            }
            if let Some(tab_index) = patch.tab_index {
                reg.tab_index = tab_index;
            }
            if let Some(disabled) = patch.disabled {
                reg.disabled = disabled;
            }
            if let Some(name) = patch.display_name {
                reg.display_name = Some(name);
            }
            if let Some(description) = patch.description {
                reg.description = Some(description);
            }
            if let Some(tags) = patch.tags {
                reg.tags = tags;
            }
            if let Some(handler) = patch.on_keydown {
                reg.on_keydown = Some(handler);
            }
            if let Some(handler) = patch.on_focus {
                reg.on_focus = Some(handler);
            }
            if let Some(handler) = patch.on_blur {
                reg.on_blur = Some(handler);
            }
        }

        if let Some(parent_id) = patch.parent_id {
            unlink_from_parent(&mut inner, element);
            inner.pending.retain(|p| p.child != *element);
            match resolve_parent(&inner, element, &parent_id) {
                Some(parent) => link_child(&mut inner, &parent, element),
                None => inner.pending.push(PendingRelationship {
                    child: element.clone(),
                    parent_id,
                    seq,
                }),
            }
        }
    }

    /// Subscribe to active-element changes.
    ///
    /// The observer runs after every change (including clears) with the
    /// registry lock released; it may call back into the manager.
    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&FocusManager<E, P>, Option<&E>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        inner.next_observer += 1;
        let id = ObserverId(inner.next_observer);
        inner.observers.push((id, Arc::new(observer)));
        id
    }

    /// Remove a previously registered observer.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.inner.write().observers.retain(|(oid, _)| *oid != id);
    }

    /// Swap the active element and run the callback sequence.
    pub(crate) fn activate(&self, next: E) {
        let dispatch = {
            let mut inner = self.inner.write();
            if !inner.elements.contains_key(&next) {
                return;
            }
            if inner.active.as_ref() == Some(&next) {
                return;
            }
            let prev = inner.active.replace(next.clone());
            let blur = prev.and_then(|p| {
                inner
                    .elements
                    .get(&p)
                    .map(|r| (p.clone(), r.id.clone(), r.payload.clone(), r.on_blur.clone()))
            });
            let focus = inner
                .elements
                .get(&next)
                .map(|r| (r.id.clone(), r.payload.clone(), r.on_focus.clone()));
            (blur, focus)
        };

        next.focus();

        let (blur, focus) = dispatch;
        if let Some((el, id, payload, Some(on_blur))) = blur {
            on_blur(&FocusContext {
                manager: self,
                element: el,
                id,
                payload,
            });
        }
        if let Some((id, payload, Some(on_focus))) = focus {
            on_focus(&FocusContext {
                manager: self,
                element: next,
                id,
                payload,
            });
        }
        self.notify_active_observers();
    }

    /// Run every observer against the current active element.
    pub(crate) fn notify_active_observers(&self) {
        let (observers, active) = {
            let inner = self.inner.read();
            let observers: Vec<ActiveChangeCallback<E, P>> =
                inner.observers.iter().map(|(_, cb)| Arc::clone(cb)).collect();
            (observers, inner.active.clone())
        };
        for observer in observers {
            observer(self, active.as_ref());
        }
    }
}

/// Remove one element from every structure. Returns whether it was the
/// active element (the caller owes observers a notification).
pub(crate) fn remove_element<E: Element, P: 'static>(inner: &mut RegistryInner<E, P>, element: &E) -> bool {
    let Some(registration) = inner.elements.shift_remove(element) else {
        return false;
    };

    if let Some(bucket) = inner.logical_index.get_mut(&registration.id) {
        bucket.retain(|e| e != element);
        if bucket.is_empty() {
            inner.logical_index.remove(&registration.id);
        }
    }

    if let Some(parent) = registration.parent.as_ref() {
        if let Some(parent_reg) = inner.elements.get_mut(parent) {
            parent_reg.children.retain(|c| c != element);
        }
    }

    // Orphan, don't cascade: children stay registered and may reconnect
    // lazily to whatever registered ancestor still contains them.
    for child in &registration.children {
        if let Some(child_reg) = inner.elements.get_mut(child) {
            child_reg.parent = None;
        }
    }

    inner.pending.retain(|p| p.child != *element);

    if inner.active.as_ref() == Some(element) {
        inner.active = None;
        true
    } else {
        false
    }
}

/// Resolve a declared parent id for `element`.
///
/// Among registered elements under the id, the most recently registered one
/// wins. That is a heuristic, not a correctness claim: the most recent
/// remount is assumed to be the relevant one. Failing that, the nearest
/// registered physical ancestor under the id is used.
pub(crate) fn resolve_parent<E: Element, P: 'static>(
    inner: &RegistryInner<E, P>,
    element: &E,
    parent_id: &LogicalId,
) -> Option<E> {
    if let Some(bucket) = inner.logical_index.get(parent_id) {
        let most_recent = bucket
            .iter()
            .filter(|el| *el != element)
            .filter_map(|el| inner.elements.get(el).map(|r| (el, r.seq)))
            .max_by_key(|(_, seq)| *seq);
        if let Some((el, _)) = most_recent {
            return Some(el.clone());
        }
    }
    nearest_registered_ancestor(inner, element, Some(parent_id))
}

/// The deepest registered element physically containing `child`, optionally
/// restricted to one logical id.
///
/// Containers of a single element form a chain, so the deepest one is found
/// by keeping whichever of two candidates is contained in the other.
pub(crate) fn nearest_registered_ancestor<E: Element, P: 'static>(
    inner: &RegistryInner<E, P>,
    child: &E,
    id_filter: Option<&LogicalId>,
) -> Option<E> {
    let mut best: Option<&E> = None;
    for (el, reg) in &inner.elements {
        if el == child || !el.contains(child) {
            continue;
        }
        if let Some(want) = id_filter {
            if reg.id != *want {
                continue;
            }
        }
        best = match best {
            Some(current) if !current.contains(el) => Some(current),
            _ => Some(el),
        };
    }
    best.cloned()
}

/// Link `child` under `parent`, keeping both sides consistent.
pub(crate) fn link_child<E: Element, P: 'static>(inner: &mut RegistryInner<E, P>, parent: &E, child: &E) {
    if let Some(child_reg) = inner.elements.get_mut(child) {
        child_reg.parent = Some(parent.clone());
    }
    if let Some(parent_reg) = inner.elements.get_mut(parent) {
        if !parent_reg.children.contains(child) {
            parent_reg.children.push(child.clone());
        }
    }
}

/// Clear `child`'s parent link and drop it from that parent's child list.
pub(crate) fn unlink_from_parent<E: Element, P: 'static>(inner: &mut RegistryInner<E, P>, child: &E) {
    let old_parent = inner
        .elements
        .get_mut(child)
        .and_then(|r| r.parent.take());
    if let Some(parent) = old_parent {
        if let Some(parent_reg) = inner.elements.get_mut(&parent) {
            parent_reg.children.retain(|c| c != child);
        }
    }
}

/// Resolve pending relationships the freshly registered `parent` satisfies.
///
/// Only children the new element physically contains are claimed; a
/// same-named element elsewhere in the tree must not capture unrelated
/// subtrees.
fn resolve_pending_for<E: Element, P: 'static>(inner: &mut RegistryInner<E, P>, parent: &E) {
    let Some(parent_id) = inner.elements.get(parent).map(|r| r.id.clone()) else {
        return;
    };

    let mut pending = std::mem::take(&mut inner.pending);
    let mut claimed = Vec::new();
    pending.retain(|p| {
        if p.parent_id != parent_id {
            return true;
        }
        if !inner.elements.contains_key(&p.child) {
            // Stale entry; the child left without cleanup.
            return false;
        }
        if parent.contains(&p.child) {
            claimed.push(p.child.clone());
            false
        } else {
            true
        }
    });
    inner.pending = pending;

    for child in claimed {
        focus_trace!(parent = %parent_id, "resolved deferred relationship");
        unlink_from_parent(inner, &child);
        link_child(inner, parent, &child);
    }
}

/// Pick the best-scoring candidate under a logical id.
pub(crate) fn select_best_candidate<E: Element, P: 'static>(
    inner: &RegistryInner<E, P>,
    id: &LogicalId,
) -> Option<E> {
    let bucket = inner.logical_index.get(id)?;
    let mut best: Option<(&E, f64)> = None;
    for el in bucket {
        let Some(reg) = inner.elements.get(el) else {
            continue;
        };
        let score = candidate_score(reg, el);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((el, score)),
        }
    }
    best.map(|(el, _)| el.clone())
}

/// Candidate score: disabled sinks below everything, priority dominates,
/// visibility breaks priority ties, recency breaks the rest.
fn candidate_score<E: Element, P: 'static>(reg: &Registration<E, P>, element: &E) -> f64 {
    if reg.disabled {
        return -1000.0;
    }
    let visible = if element.is_visible() { 100.0 } else { 0.0 };
    f64::from(reg.priority) * 1000.0 + visible + reg.seq as f64 / 1_000_000.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::TreeHandle;

    fn manager() -> FocusManager<TreeHandle> {
        FocusManager::new()
    }

    #[test]
    fn register_and_set_active() {
        let m = manager();
        let root = TreeHandle::root("root");
        m.register(FocusOptions::new("content"), root.clone());

        m.set_active(LogicalId::from("content"));
        assert_eq!(m.active(), Some(root.clone()));
        assert_eq!(m.active_id(), Some(LogicalId::from("content")));
        assert_eq!(root.focus_count(), 1);
    }

    #[test]
    fn set_active_unknown_id_is_noop() {
        let m = manager();
        m.set_active(LogicalId::from("nowhere"));
        assert!(m.active().is_none());
    }

    #[test]
    fn set_active_same_element_fires_once() {
        let m = manager();
        let root = TreeHandle::root("root");
        m.register(FocusOptions::new("content"), root.clone());

        m.set_active(FocusTarget::element(root.clone()));
        m.set_active(FocusTarget::element(root.clone()));
        assert_eq!(root.focus_count(), 1);
    }

    #[test]
    fn reregistration_replaces_bookkeeping() {
        let m = manager();
        let root = TreeHandle::root("root");
        m.register(FocusOptions::new("content").priority(1), root.clone());
        m.register(FocusOptions::new("sidebar").priority(2), root.clone());

        let stats = m.stats();
        assert_eq!(stats.registered, 1);
        assert!(m.elements_of(&LogicalId::from("content")).is_empty());
        assert_eq!(m.elements_of(&LogicalId::from("sidebar")), vec![root]);
    }

    #[test]
    fn parent_resolution_prefers_most_recent() {
        let m = manager();
        let old_parent = TreeHandle::root("old");
        let new_parent = TreeHandle::root("new");
        let child = new_parent.spawn("child");

        m.register(FocusOptions::new("content"), old_parent);
        m.register(FocusOptions::new("content"), new_parent.clone());
        m.register(FocusOptions::new("item:x").parent("content"), child.clone());

        let info = m.registration_of(&child).unwrap();
        assert_eq!(info.parent, Some(new_parent));
    }

    #[test]
    fn unresolvable_parent_defers() {
        let m = manager();
        let root = TreeHandle::root("root");
        let child = root.spawn("child");

        m.register(FocusOptions::new("item:x").parent("content"), child.clone());
        assert_eq!(m.stats().pending, 1);
        assert!(m.registration_of(&child).unwrap().parent.is_none());

        // The child is parentless but fully focusable.
        m.set_active(LogicalId::from("item:x"));
        assert_eq!(m.active(), Some(child));
    }

    #[test]
    fn pending_resolves_when_parent_registers() {
        let m = manager();
        let root = TreeHandle::root("root");
        let child = root.spawn("child");

        m.register(FocusOptions::new("item:x").parent("content"), child.clone());
        m.register(FocusOptions::new("content"), root.clone());

        assert_eq!(m.stats().pending, 0);
        assert_eq!(m.registration_of(&child).unwrap().parent, Some(root.clone()));
        assert_eq!(m.registration_of(&root).unwrap().children, vec![child]);
    }

    #[test]
    fn pending_resolution_requires_containment() {
        let m = manager();
        let unrelated = TreeHandle::root("unrelated");
        let elsewhere = TreeHandle::root("elsewhere");
        let child = elsewhere.spawn("child");

        m.register(FocusOptions::new("item:x").parent("content"), child.clone());
        m.register(FocusOptions::new("content"), unrelated);

        // Same-named subtree elsewhere must not capture the child.
        assert_eq!(m.stats().pending, 1);
        assert!(m.registration_of(&child).unwrap().parent.is_none());
    }

    #[test]
    fn unregister_orphans_children() {
        let m = manager();
        let parent = TreeHandle::root("parent");
        let c1 = parent.spawn("c1");
        let c2 = parent.spawn("c2");

        m.register(FocusOptions::new("content"), parent.clone());
        m.register(FocusOptions::new("item:1").parent("content"), c1.clone());
        m.register(FocusOptions::new("item:2").parent("content"), c2.clone());

        m.unregister(&LogicalId::from("content"), None);

        assert_eq!(m.stats().registered, 2);
        assert!(m.registration_of(&c1).unwrap().parent.is_none());
        assert!(m.registration_of(&c2).unwrap().parent.is_none());
    }

    #[test]
    fn unregister_by_id_drops_dependent_pending() {
        let m = manager();
        let root = TreeHandle::root("root");
        let waiting = root.spawn("waiting");

        m.register(FocusOptions::new("item:w").parent("missing"), waiting.clone());
        assert_eq!(m.stats().pending, 1);

        // No element ever carried the id, but its identity is declared gone;
        // the child stops waiting for it.
        m.unregister(&LogicalId::from("missing"), None);
        assert_eq!(m.stats().pending, 0);
        assert!(m.registration_of(&waiting).unwrap().parent.is_none());
    }

    #[test]
    fn unregister_single_element_mode() {
        let m = manager();
        let a = TreeHandle::root("a");
        let b = TreeHandle::root("b");
        m.register(FocusOptions::new("pane:main"), a.clone());
        m.register(FocusOptions::new("pane:main"), b.clone());

        m.unregister(&LogicalId::from("pane:main"), Some(&a));

        assert_eq!(m.elements_of(&LogicalId::from("pane:main")), vec![b]);
    }

    #[test]
    fn unregister_active_clears_active() {
        let m = manager();
        let root = TreeHandle::root("root");
        m.register(FocusOptions::new("content"), root.clone());
        m.set_active(FocusTarget::element(root.clone()));

        m.unregister(&LogicalId::from("content"), Some(&root));
        assert!(m.active().is_none());
    }

    #[test]
    fn candidate_scoring_prefers_enabled_priority() {
        let m = manager();
        let disabled = TreeHandle::root("disabled");
        let enabled = TreeHandle::root("enabled");

        m.register(FocusOptions::new("pane:main").disabled(true), disabled);
        m.register(FocusOptions::new("pane:main").priority(1), enabled.clone());

        assert_eq!(m.best_candidate(&LogicalId::from("pane:main")), Some(enabled));
    }

    #[test]
    fn candidate_scoring_prefers_visible() {
        let m = manager();
        let hidden = TreeHandle::root("hidden");
        hidden.set_size(0, 0);
        let visible = TreeHandle::root("visible");

        m.register(FocusOptions::new("pane:main"), hidden);
        m.register(FocusOptions::new("pane:main"), visible.clone());

        assert_eq!(m.best_candidate(&LogicalId::from("pane:main")), Some(visible));
    }

    #[test]
    fn candidate_scoring_recency_breaks_ties() {
        let m = manager();
        let first = TreeHandle::root("first");
        let second = TreeHandle::root("second");

        m.register(FocusOptions::new("pane:main"), first);
        m.register(FocusOptions::new("pane:main"), second.clone());

        assert_eq!(m.best_candidate(&LogicalId::from("pane:main")), Some(second));
    }

    #[test]
    fn all_disabled_falls_back_to_first() {
        let m = manager();
        let first = TreeHandle::root("first");
        let second = TreeHandle::root("second");

        m.register(FocusOptions::new("pane:main").disabled(true), first.clone());
        m.register(FocusOptions::new("pane:main").disabled(true), second);

        assert_eq!(m.best_candidate(&LogicalId::from("pane:main")), Some(first));
    }

    #[test]
    fn focus_and_blur_callbacks_fire_in_order() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Mutex;

        let m = manager();
        let a = TreeHandle::root("a");
        let b = TreeHandle::root("b");
        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let log_a = Arc::clone(&log);
        let log_b = Arc::clone(&log);
        let log_blur = Arc::clone(&log);
        let calls_a = Arc::clone(&calls);

        m.register(
            FocusOptions::new("pane:a")
                .on_focus(move |ctx| {
                    calls_a.fetch_add(1, Ordering::SeqCst);
                    log_a.lock().unwrap().push(format!("focus {}", ctx.id()));
                })
                .on_blur(move |ctx| {
                    log_blur.lock().unwrap().push(format!("blur {}", ctx.id()));
                }),
            a.clone(),
        );
        m.register(
            FocusOptions::new("pane:b").on_focus(move |ctx| {
                log_b.lock().unwrap().push(format!("focus {}", ctx.id()));
            }),
            b.clone(),
        );

        m.set_active(FocusTarget::element(a.clone()));
        m.set_active(FocusTarget::element(b));

        let log = log.lock().unwrap();
        assert_eq!(*log, vec!["focus pane:a", "blur pane:a", "focus pane:b"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callbacks_can_renavigate() {
        let m = manager();
        let a = TreeHandle::root("a");
        let b = TreeHandle::root("b");

        m.register(
            FocusOptions::new("pane:a").on_focus(|ctx| {
                // A handler may immediately bounce focus somewhere else.
                ctx.manager().set_active(LogicalId::from("pane:b"));
            }),
            a.clone(),
        );
        m.register(FocusOptions::new("pane:b"), b.clone());

        m.set_active(FocusTarget::element(a));
        assert_eq!(m.active(), Some(b));
    }

    #[test]
    fn payload_reaches_callbacks() {
        use std::sync::Mutex;

        let m: FocusManager<TreeHandle, String> = FocusManager::new();
        let root = TreeHandle::root("root");
        let seen = Arc::new(Mutex::new(None));
        let seen_in = Arc::clone(&seen);

        m.register(
            FocusOptions::new("content")
                .payload("hello".to_string())
                .on_focus(move |ctx| {
                    *seen_in.lock().unwrap() = ctx.payload().cloned();
                }),
            root,
        );

        m.set_active(LogicalId::from("content"));
        assert_eq!(seen.lock().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn merge_options_updates_in_place() {
        let m = manager();
        let root = TreeHandle::root("root");
        m.register(FocusOptions::new("content"), root.clone());

        m.merge_options(&root, OptionsPatch::new().disabled(true).priority(5));

        let info = m.registration_of(&root).unwrap();
        assert!(info.disabled);
        assert_eq!(info.priority, 5);
        assert_eq!(info.id, LogicalId::from("content"));
    }

    #[test]
    fn merge_options_can_reparent() {
        let m = manager();
        let old_parent = TreeHandle::root("old");
        let new_parent = TreeHandle::root("new");
        let child = old_parent.spawn("child");

        m.register(FocusOptions::new("pane:old"), old_parent.clone());
        m.register(FocusOptions::new("pane:new"), new_parent.clone());
        m.register(FocusOptions::new("item:x").parent("pane:old"), child.clone());

        m.merge_options(&child, OptionsPatch::new().parent("pane:new"));

        assert_eq!(m.registration_of(&child).unwrap().parent, Some(new_parent));
        assert!(m.registration_of(&old_parent).unwrap().children.is_empty());
    }

    #[test]
    fn observers_see_changes_and_clears() {
        use std::sync::Mutex;

        let m = manager();
        let root = TreeHandle::root("root");
        m.register(FocusOptions::new("content"), root.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        let id = m.subscribe(move |manager, active| {
            seen_in
                .lock()
                .unwrap()
                .push(active.is_some().then(|| manager.active_id()).flatten());
        });

        m.set_active(FocusTarget::element(root.clone()));
        m.clear_active();
        m.unsubscribe(id);
        m.set_active(FocusTarget::element(root));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Some(LogicalId::from("content")));
        assert_eq!(seen[1], None);
    }
}
