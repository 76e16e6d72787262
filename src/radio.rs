//! Derived membership view over the active element ("radio group").
//!
//! A radio group watches a fixed set of trigger ids and continuously answers
//! one question: which trigger is the nearest enclosing ancestor of the
//! active element? Hosts use it to light up exactly one of several
//! mutually exclusive regions (the selected tab, the focused pane stack)
//! without re-deriving tree walks themselves.
//!
//! The value is sticky: when focus moves somewhere with no trigger
//! ancestor, the previous answer is retained rather than cleared.
//!
//! # Example
//!
//! ```
//! use focal::prelude::*;
//! use focal::testing::TreeHandle;
//!
//! let manager: FocusManager<TreeHandle> = FocusManager::new();
//! let left = TreeHandle::root("left");
//! let field = left.spawn("field");
//! manager.register(FocusOptions::new("pane:left"), left);
//! manager.register(FocusOptions::new("item:field").parent("pane:left"), field.clone());
//!
//! let group = manager
//!     .radio_group(vec!["pane:left".into(), "pane:right".into()])
//!     .expect("two triggers");
//!
//! manager.set_active(FocusTarget::element(field));
//! assert_eq!(group.current(), LogicalId::from("pane:left"));
//! ```

use crate::element::Element;
use crate::id::LogicalId;
use crate::registry::{FocusError, FocusManager, ObserverId, RegistryInner};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Callback fired when a radio group's value changes.
pub type RadioChangeCallback = Arc<dyn Fn(&LogicalId) + Send + Sync>;

struct RadioState {
    triggers: Vec<LogicalId>,
    current: RwLock<LogicalId>,
    listeners: RwLock<Vec<RadioChangeCallback>>,
}

impl RadioState {
    /// Recompute against a (possibly absent) active element; sticky on miss.
    fn recompute<E: Element, P: 'static>(&self, manager: &FocusManager<E, P>, active: Option<&E>) {
        let Some(active) = active else {
            return;
        };

        let found = {
            let inner = manager.inner.read();
            nearest_trigger(&inner, active, &self.triggers)
        };

        let Some(next) = found else {
            return;
        };
        let changed = {
            let mut current = self.current.write();
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        };
        if changed {
            let listeners: Vec<RadioChangeCallback> =
                self.listeners.read().iter().map(Arc::clone).collect();
            for listener in listeners {
                listener(&next);
            }
        }
    }
}

/// Walk the logical parent chain (inclusive) for the first trigger id.
fn nearest_trigger<E: Element, P: 'static>(
    inner: &RegistryInner<E, P>,
    start: &E,
    triggers: &[LogicalId],
) -> Option<LogicalId> {
    let mut current = Some(start.clone());
    // Parent links are id-resolved and may in principle cycle; bound the walk.
    let mut hops = inner.elements.len() + 1;
    while let Some(element) = current {
        if hops == 0 {
            break;
        }
        hops -= 1;
        let registration = inner.elements.get(&element)?;
        if triggers.contains(&registration.id) {
            return Some(registration.id.clone());
        }
        current = registration.parent.clone();
    }
    None
}

/// A continuously maintained "which trigger encloses focus" value.
///
/// Created by [`FocusManager::radio_group`]. Dropping the group detaches it
/// from the manager; no further recomputation happens.
pub struct RadioGroup<E: Element, P: 'static = ()> {
    state: Arc<RadioState>,
    observer: ObserverId,
    manager: Weak<RwLock<RegistryInner<E, P>>>,
}

impl<E: Element, P: 'static> RadioGroup<E, P> {
    /// The current value: the last trigger found enclosing the active
    /// element, initially the first trigger.
    #[must_use]
    pub fn current(&self) -> LogicalId {
        self.state.current.read().clone()
    }

    /// The trigger set this group watches.
    #[must_use]
    pub fn triggers(&self) -> &[LogicalId] {
        &self.state.triggers
    }

    /// Register a listener for value changes.
    ///
    /// Listeners live as long as the group and fire only on actual changes,
    /// not on every focus move.
    pub fn on_change<F>(&self, listener: F)
    where
        F: Fn(&LogicalId) + Send + Sync + 'static,
    {
        self.state.listeners.write().push(Arc::new(listener));
    }
}

impl<E: Element, P: 'static> Drop for RadioGroup<E, P> {
    fn drop(&mut self) {
        if let Some(inner) = self.manager.upgrade() {
            let manager = FocusManager { inner };
            manager.unsubscribe(self.observer);
        }
    }
}

impl<E: Element, P: 'static> FocusManager<E, P> {
    /// Create a radio group over a set of trigger ids.
    ///
    /// Fails fast with [`FocusError::NotEnoughTriggers`] for fewer than two
    /// triggers; a one-trigger group could never change and is a
    /// configuration mistake, not a runtime condition. The value starts at
    /// the first trigger and is recomputed immediately against the current
    /// active element, then on every subsequent change.
    pub fn radio_group(&self, triggers: Vec<LogicalId>) -> Result<RadioGroup<E, P>, FocusError> {
        if triggers.len() < 2 {
            return Err(FocusError::NotEnoughTriggers {
                count: triggers.len(),
            });
        }

        let state = Arc::new(RadioState {
            current: RwLock::new(triggers[0].clone()),
            triggers,
            listeners: RwLock::new(Vec::new()),
        });

        let observer_state = Arc::clone(&state);
        let observer = self.subscribe(move |manager, active| {
            observer_state.recompute(manager, active);
        });

        // Catch up with whatever is already focused.
        state.recompute(self, self.active().as_ref());

        Ok(RadioGroup {
            state,
            observer,
            manager: Arc::downgrade(&self.inner),
        })
    }
}
