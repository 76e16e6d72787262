//! Keyboard-driven traversal over the logical tree.
//!
//! Navigation moves the active element along resolved parent/child links:
//! sideways through siblings in tab order, up to the parent, down to the
//! first child. Before consulting any link, navigation gives the registry a
//! chance to lazily reconnect an orphaned active element to its nearest
//! registered physical ancestor, which is how out-of-order mount and
//! unmount self-heals without anyone re-registering.
//!
//! [`FocusManager::handle_key`] wires the default bindings: Tab and
//! Shift+Tab move between siblings, and the platform command modifier
//! (Command on macOS, Ctrl elsewhere) with Up/Down hops to the parent or
//! first child. An active element's own `on_keydown` handler sees every key
//! first and may consume it.

use crate::element::Element;
use crate::events::{ClickEvent, EventResult, KeyBinding, KeyCode, KeyEvent};
use crate::macros::focus_trace;
use crate::registry::{
    link_child, nearest_registered_ancestor, FocusContext, FocusManager, FocusTarget,
    RegistryInner,
};

/// Default binding: next sibling.
pub const BIND_SIBLING_FORWARD: KeyBinding = KeyBinding::key(KeyCode::Tab);
/// Default binding: previous sibling.
pub const BIND_SIBLING_BACKWARD: KeyBinding = KeyBinding::shift(KeyCode::Tab);
/// Default binding: parent.
pub const BIND_PARENT: KeyBinding = KeyBinding::platform(KeyCode::Up);
/// Default binding: first child.
pub const BIND_FIRST_CHILD: KeyBinding = KeyBinding::platform(KeyCode::Down);

impl<E: Element, P: 'static> FocusManager<E, P> {
    /// Move to the next (or previous) sibling of the active element.
    ///
    /// Siblings are the active element's parent's children, minus disabled
    /// ones, ordered by tab index with registration order breaking ties.
    /// Movement wraps. No-op without an active element, without a resolved
    /// parent, or when the active element itself is filtered out (disabled
    /// or just removed).
    pub fn focus_sibling(&self, forward: bool) {
        let next = {
            let mut inner = self.inner.write();
            ensure_relationships(&mut inner);
            let Some(active) = inner.active.clone() else {
                return;
            };
            let Some(parent) = inner.elements.get(&active).and_then(|r| r.parent.clone())
            else {
                return;
            };
            let Some(parent_reg) = inner.elements.get(&parent) else {
                return;
            };

            let mut siblings: Vec<(E, i32, u64)> = parent_reg
                .children
                .iter()
                .filter_map(|child| {
                    inner
                        .elements
                        .get(child)
                        .filter(|r| !r.disabled)
                        .map(|r| (child.clone(), r.tab_index, r.seq))
                })
                .collect();
            siblings.sort_by_key(|(_, tab_index, seq)| (*tab_index, *seq));

            let Some(position) = siblings.iter().position(|(el, _, _)| *el == active) else {
                return;
            };
            let len = siblings.len();
            let next_position = if forward {
                (position + 1) % len
            } else {
                (position + len - 1) % len
            };
            siblings.swap_remove(next_position).0
        };
        self.activate(next);
    }

    /// Move to the active element's resolved parent. No-op if unresolved.
    pub fn focus_parent(&self) {
        let parent = {
            let mut inner = self.inner.write();
            ensure_relationships(&mut inner);
            let Some(active) = inner.active.as_ref() else {
                return;
            };
            let Some(parent) = inner.elements.get(active).and_then(|r| r.parent.clone())
            else {
                return;
            };
            parent
        };
        self.activate(parent);
    }

    /// Move to the active element's first child, in registration order
    /// (not tab order). No-op if there are no children.
    pub fn focus_first_child(&self) {
        let child = {
            let mut inner = self.inner.write();
            ensure_relationships(&mut inner);
            let Some(active) = inner.active.as_ref() else {
                return;
            };
            let Some(child) = inner
                .elements
                .get(active)
                .and_then(|r| r.children.first().cloned())
            else {
                return;
            };
            child
        };
        self.activate(child);
    }

    /// Dispatch a key event.
    ///
    /// The active element's `on_keydown` handler runs first with full
    /// context; [`EventResult::Continue`] falls through to the default
    /// bindings, anything else stops dispatch.
    pub fn handle_key(&self, event: &KeyEvent) {
        let custom = {
            let inner = self.inner.read();
            inner.active.clone().and_then(|el| {
                inner.elements.get(&el).and_then(|r| {
                    r.on_keydown
                        .clone()
                        .map(|cb| (el.clone(), r.id.clone(), r.payload.clone(), cb))
                })
            })
        };

        if let Some((element, id, payload, on_keydown)) = custom {
            let context = FocusContext::new(self, element, id, payload);
            if on_keydown(event, &context) == EventResult::Handled {
                return;
            }
        }

        if BIND_SIBLING_FORWARD.matches(event) {
            self.focus_sibling(true);
        } else if BIND_SIBLING_BACKWARD.matches(event) {
            self.focus_sibling(false);
        } else if BIND_PARENT.matches(event) {
            self.focus_parent();
        } else if BIND_FIRST_CHILD.matches(event) {
            self.focus_first_child();
        }
    }

    /// Dispatch a click: the nearest registered element containing (or
    /// equal to) the click target becomes active.
    pub fn handle_click(&self, event: &ClickEvent<E>) {
        let target = {
            let inner = self.inner.read();
            if inner.elements.contains_key(&event.target) {
                Some(event.target.clone())
            } else {
                nearest_registered_ancestor(&inner, &event.target, None)
            }
        };
        if let Some(element) = target {
            self.set_active(FocusTarget::element(element));
        }
    }
}

/// Lazily reconnect an orphaned active element.
///
/// Runs before navigation consults parent/child links: if the active
/// element is parentless while relationships are still pending, link it to
/// its nearest registered physical ancestor, whatever that ancestor's id.
/// This is looser than declared-parent matching on purpose; the pending
/// entry stays queued unless the healed link happens to satisfy it, so an
/// exact-id parent registering later can still claim the child.
pub(crate) fn ensure_relationships<E: Element, P: 'static>(inner: &mut RegistryInner<E, P>) {
    if inner.pending.is_empty() {
        return;
    }
    let Some(active) = inner.active.clone() else {
        return;
    };
    let orphaned = inner
        .elements
        .get(&active)
        .map(|r| r.parent.is_none())
        .unwrap_or(false);
    if !orphaned {
        return;
    }
    let Some(ancestor) = nearest_registered_ancestor(inner, &active, None) else {
        return;
    };

    link_child(inner, &ancestor, &active);
    focus_trace!("reconnected orphaned active element to nearest ancestor");

    if let Some(ancestor_id) = inner.elements.get(&ancestor).map(|r| r.id.clone()) {
        inner
            .pending
            .retain(|p| !(p.child == active && p.parent_id == ancestor_id));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::KeyModifiers;
    use crate::registry::FocusOptions;
    use crate::testing::TreeHandle;

    struct Fixture {
        manager: FocusManager<TreeHandle>,
        parent: TreeHandle,
        children: Vec<TreeHandle>,
    }

    /// A parent with three children at tab indexes 0, 1, 2.
    fn family() -> Fixture {
        let manager = FocusManager::new();
        let parent = TreeHandle::root("parent");
        let children: Vec<TreeHandle> = (0..3).map(|i| parent.spawn(format!("c{i}"))).collect();

        manager.register(FocusOptions::new("content"), parent.clone());
        for (i, child) in children.iter().enumerate() {
            manager.register(
                FocusOptions::new(format!("item:{i}").as_str())
                    .parent("content")
                    .tab_index(i as i32),
                child.clone(),
            );
        }
        Fixture {
            manager,
            parent,
            children,
        }
    }

    #[test]
    fn sibling_moves_in_tab_order() {
        let f = family();
        f.manager.set_active(FocusTarget::element(f.children[0].clone()));

        f.manager.focus_sibling(true);
        assert_eq!(f.manager.active(), Some(f.children[1].clone()));
        f.manager.focus_sibling(true);
        assert_eq!(f.manager.active(), Some(f.children[2].clone()));
    }

    #[test]
    fn sibling_wraps_both_directions() {
        let f = family();
        f.manager.set_active(FocusTarget::element(f.children[2].clone()));

        f.manager.focus_sibling(true);
        assert_eq!(f.manager.active(), Some(f.children[0].clone()));
        f.manager.focus_sibling(false);
        assert_eq!(f.manager.active(), Some(f.children[2].clone()));
    }

    #[test]
    fn sibling_skips_disabled() {
        let f = family();
        f.manager.merge_options(
            &f.children[1],
            crate::registry::OptionsPatch::new().disabled(true),
        );
        f.manager.set_active(FocusTarget::element(f.children[0].clone()));

        f.manager.focus_sibling(true);
        assert_eq!(f.manager.active(), Some(f.children[2].clone()));
    }

    #[test]
    fn sibling_noop_when_active_is_disabled() {
        let f = family();
        f.manager.set_active(FocusTarget::element(f.children[0].clone()));
        f.manager.merge_options(
            &f.children[0],
            crate::registry::OptionsPatch::new().disabled(true),
        );

        f.manager.focus_sibling(true);
        assert_eq!(f.manager.active(), Some(f.children[0].clone()));
    }

    #[test]
    fn sibling_noop_without_parent() {
        let manager: FocusManager<TreeHandle> = FocusManager::new();
        let lone = TreeHandle::root("lone");
        manager.register(FocusOptions::new("content"), lone.clone());
        manager.set_active(FocusTarget::element(lone.clone()));

        manager.focus_sibling(true);
        assert_eq!(manager.active(), Some(lone));
    }

    #[test]
    fn tab_order_beats_registration_order() {
        let manager: FocusManager<TreeHandle> = FocusManager::new();
        let parent = TreeHandle::root("parent");
        let late = parent.spawn("late");
        let early = parent.spawn("early");

        manager.register(FocusOptions::new("content"), parent);
        // Registered first but tab index says second.
        manager.register(
            FocusOptions::new("item:late").parent("content").tab_index(2),
            late.clone(),
        );
        manager.register(
            FocusOptions::new("item:early").parent("content").tab_index(1),
            early.clone(),
        );

        manager.set_active(FocusTarget::element(early));
        manager.focus_sibling(true);
        assert_eq!(manager.active(), Some(late));
    }

    #[test]
    fn parent_and_first_child_hops() {
        let f = family();
        f.manager.set_active(FocusTarget::element(f.children[1].clone()));

        f.manager.focus_parent();
        assert_eq!(f.manager.active(), Some(f.parent.clone()));

        // First child is registration order, not tab order.
        f.manager.focus_first_child();
        assert_eq!(f.manager.active(), Some(f.children[0].clone()));
    }

    #[test]
    fn orphan_self_heals_on_navigation() {
        let manager: FocusManager<TreeHandle> = FocusManager::new();
        let root = TreeHandle::root("root");
        let a = root.spawn("a");
        let b = root.spawn("b");

        // Children declare a parent that never registers under that id.
        manager.register(FocusOptions::new("item:a").parent("ghost"), a.clone());
        manager.register(FocusOptions::new("item:b").parent("ghost"), b.clone());
        // The physical ancestor registers under a different id.
        manager.register(FocusOptions::new("content"), root.clone());

        manager.set_active(FocusTarget::element(a.clone()));
        manager.focus_sibling(true);

        // Lazy resolution linked a (and only a) under root; b is not a
        // sibling yet, so navigation had nowhere to go.
        assert_eq!(manager.registration_of(&a).unwrap().parent, Some(root));
        assert_eq!(manager.active(), Some(a));
    }

    #[test]
    fn default_bindings_drive_navigation() {
        let f = family();
        f.manager.set_active(FocusTarget::element(f.children[0].clone()));

        f.manager.handle_key(&KeyEvent::new(KeyCode::Tab));
        assert_eq!(f.manager.active(), Some(f.children[1].clone()));

        f.manager
            .handle_key(&KeyEvent::with_modifiers(KeyCode::Tab, KeyModifiers::SHIFT));
        assert_eq!(f.manager.active(), Some(f.children[0].clone()));

        f.manager.handle_key(&KeyEvent::with_modifiers(
            KeyCode::Up,
            KeyModifiers::platform(),
        ));
        assert_eq!(f.manager.active(), Some(f.parent.clone()));

        f.manager.handle_key(&KeyEvent::with_modifiers(
            KeyCode::Down,
            KeyModifiers::platform(),
        ));
        assert_eq!(f.manager.active(), Some(f.children[0].clone()));
    }

    #[test]
    fn custom_handler_consumes_or_passes() {
        let f = family();
        f.manager.merge_options(
            &f.children[0],
            crate::registry::OptionsPatch::new().on_keydown(|event, _ctx| {
                if event.code == KeyCode::Tab {
                    EventResult::Handled
                } else {
                    EventResult::Continue
                }
            }),
        );
        f.manager.set_active(FocusTarget::element(f.children[0].clone()));

        // Tab is eaten by the handler; focus stays put.
        f.manager.handle_key(&KeyEvent::new(KeyCode::Tab));
        assert_eq!(f.manager.active(), Some(f.children[0].clone()));

        // Shift+Tab passes through to the default bindings.
        f.manager
            .handle_key(&KeyEvent::with_modifiers(KeyCode::Tab, KeyModifiers::SHIFT));
        assert_eq!(f.manager.active(), Some(f.children[2].clone()));
    }

    #[test]
    fn custom_handler_can_renavigate() {
        let f = family();
        let target = f.children[2].clone();
        f.manager.merge_options(
            &f.children[0],
            crate::registry::OptionsPatch::new().on_keydown(move |event, ctx| {
                if event.code == KeyCode::Enter {
                    ctx.manager().set_active(FocusTarget::element(target.clone()));
                    return EventResult::Handled;
                }
                EventResult::Continue
            }),
        );
        f.manager.set_active(FocusTarget::element(f.children[0].clone()));

        f.manager.handle_key(&KeyEvent::new(KeyCode::Enter));
        assert_eq!(f.manager.active(), Some(f.children[2].clone()));
    }

    #[test]
    fn click_walks_to_nearest_registered() {
        let f = family();
        // Click lands on an unregistered grandchild of c1.
        let deep = f.children[1].spawn("deep");

        f.manager.handle_click(&ClickEvent::new(deep));
        assert_eq!(f.manager.active(), Some(f.children[1].clone()));
    }

    #[test]
    fn click_on_registered_element_activates_it() {
        let f = family();
        f.manager
            .handle_click(&ClickEvent::new(f.children[2].clone()));
        assert_eq!(f.manager.active(), Some(f.children[2].clone()));
    }

    #[test]
    fn click_outside_any_registered_tree_is_noop() {
        let f = family();
        let outsider = TreeHandle::root("outsider");
        f.manager.handle_click(&ClickEvent::new(outsider));
        assert!(f.manager.active().is_none());
    }
}
