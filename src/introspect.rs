//! Read-only introspection: stats, queries, and a tree dump.
//!
//! Everything here is off the critical path and safe to call from debug
//! overlays, logging hooks, or tests. Nothing mutates the registry.

use crate::element::Element;
use crate::id::LogicalId;
use crate::registry::{FocusManager, RegistryInner};
use rustc_hash::FxHashSet;
use std::fmt::Write as _;

/// A point-in-time copy of one element's registration metadata.
///
/// Callbacks and payload are omitted; this is the inspectable surface.
#[derive(Debug, Clone)]
pub struct RegistrationInfo<E: Element> {
    /// Logical id the element is registered under.
    pub id: LogicalId,
    /// Resolved logical parent, if any.
    pub parent: Option<E>,
    /// Linked children, registration order.
    pub children: Vec<E>,
    /// Candidate-selection priority.
    pub priority: i32,
    /// Sibling traversal order.
    pub tab_index: i32,
    /// Whether the element is disabled.
    pub disabled: bool,
    /// Human-readable name, if any.
    pub display_name: Option<String>,
    /// Longer description, if any.
    pub description: Option<String>,
    /// Search tags.
    pub tags: Vec<String>,
    /// Registration sequence number (higher registered later).
    pub seq: u64,
}

/// Registry-wide counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    /// Registered elements.
    pub registered: usize,
    /// Distinct logical ids currently in use.
    pub logical_ids: usize,
    /// Unresolved declared parent links.
    pub pending: usize,
    /// Logical id of the active element, if any.
    pub active_id: Option<LogicalId>,
}

impl<E: Element, P: 'static> FocusManager<E, P> {
    /// Snapshot one element's registration metadata.
    #[must_use]
    pub fn registration_of(&self, element: &E) -> Option<RegistrationInfo<E>> {
        let inner = self.inner.read();
        inner.elements.get(element).map(|r| RegistrationInfo {
            id: r.id.clone(),
            parent: r.parent.clone(),
            children: r.children.to_vec(),
            priority: r.priority,
            tab_index: r.tab_index,
            disabled: r.disabled,
            display_name: r.display_name.clone(),
            description: r.description.clone(),
            tags: r.tags.clone(),
            seq: r.seq,
        })
    }

    /// Every element registered under a logical id, registration order.
    #[must_use]
    pub fn elements_of(&self, id: &LogicalId) -> Vec<E> {
        self.inner
            .read()
            .logical_index
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every element carrying a tag, registration order.
    #[must_use]
    pub fn elements_by_tag(&self, tag: &str) -> Vec<E> {
        let inner = self.inner.read();
        inner
            .elements
            .iter()
            .filter(|(_, r)| r.tags.iter().any(|t| t == tag))
            .map(|(el, _)| el.clone())
            .collect()
    }

    /// Every element with a given display name, registration order.
    #[must_use]
    pub fn elements_by_display_name(&self, name: &str) -> Vec<E> {
        let inner = self.inner.read();
        inner
            .elements
            .iter()
            .filter(|(_, r)| r.display_name.as_deref() == Some(name))
            .map(|(el, _)| el.clone())
            .collect()
    }

    /// Registry-wide counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.read();
        RegistryStats {
            registered: inner.elements.len(),
            logical_ids: inner.logical_index.len(),
            pending: inner.pending.len(),
            active_id: inner
                .active
                .as_ref()
                .and_then(|el| inner.elements.get(el))
                .map(|r| r.id.clone()),
        }
    }

    /// Render the logical tree as indented text, one element per line.
    ///
    /// Roots (parentless elements) come first in registration order, each
    /// followed by its children. A trailing section lists unresolved
    /// pending relationships. Intended for debug output, not parsing.
    #[must_use]
    pub fn dump_tree(&self) -> String {
        let inner = self.inner.read();
        let mut out = String::new();
        let mut visited: FxHashSet<E> = FxHashSet::default();

        for (element, registration) in &inner.elements {
            if registration.parent.is_none() {
                dump_node(&inner, element, 0, &mut out, &mut visited);
            }
        }
        // Anything not reachable from a root (malformed parent links) still
        // shows up rather than silently disappearing from the dump.
        let stragglers: Vec<E> = inner
            .elements
            .keys()
            .filter(|el| !visited.contains(*el))
            .cloned()
            .collect();
        for element in stragglers {
            dump_node(&inner, &element, 0, &mut out, &mut visited);
        }

        for pending in &inner.pending {
            let child_id = inner
                .elements
                .get(&pending.child)
                .map(|r| r.id.to_string())
                .unwrap_or_else(|| "?".to_string());
            let _ = writeln!(
                out,
                "pending: {child_id} waiting for {} (#{})",
                pending.parent_id, pending.seq
            );
        }
        out
    }
}

fn dump_node<E: Element, P: 'static>(
    inner: &RegistryInner<E, P>,
    element: &E,
    depth: usize,
    out: &mut String,
    visited: &mut FxHashSet<E>,
) {
    if !visited.insert(element.clone()) {
        return;
    }
    let Some(registration) = inner.elements.get(element) else {
        return;
    };

    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str("- ");
    let _ = write!(out, "{}", registration.id);
    if let Some(name) = registration.display_name.as_deref() {
        let _ = write!(out, " \"{name}\"");
    }
    if registration.disabled {
        out.push_str(" (disabled)");
    }
    if inner.active.as_ref() == Some(element) {
        out.push_str(" [active]");
    }
    out.push('\n');

    for child in &registration.children {
        dump_node(inner, child, depth + 1, out, visited);
    }
}
