//! Test-support element implementation.
//!
//! [`TreeHandle`] is a minimal physical tree good enough to exercise the
//! registry: handles compare by identity, containment follows the tree's
//! parent links, focus calls are counted, and on-screen size is settable.
//! It backs this crate's own tests and doc examples; hosts embedding the
//! registry will have a real widget handle instead.
//!
//! # Example
//!
//! ```
//! use focal::element::Element;
//! use focal::testing::TreeHandle;
//!
//! let root = TreeHandle::root("root");
//! let child = root.spawn("child");
//! let grandchild = child.spawn("grandchild");
//!
//! assert!(root.contains(&grandchild));
//! assert!(!grandchild.contains(&root));
//! ```

use crate::element::Element;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

struct TreeNode {
    label: String,
    parent: RwLock<Weak<TreeNode>>,
    size: RwLock<(u16, u16)>,
    focus_count: AtomicU32,
}

/// A handle into a tiny physical element tree.
///
/// Clones share identity: `clone`d handles are equal and hash identically,
/// exactly like the host-owned widget handles the registry expects.
#[derive(Clone)]
pub struct TreeHandle {
    node: Arc<TreeNode>,
}

impl TreeHandle {
    /// Create a detached root element, 1x1 by default.
    #[must_use]
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            node: Arc::new(TreeNode {
                label: label.into(),
                parent: RwLock::new(Weak::new()),
                size: RwLock::new((1, 1)),
                focus_count: AtomicU32::new(0),
            }),
        }
    }

    /// Create a new element physically nested inside this one.
    #[must_use]
    pub fn spawn(&self, label: impl Into<String>) -> Self {
        let child = Self::root(label);
        *child.node.parent.write() = Arc::downgrade(&self.node);
        child
    }

    /// Move this element under a different physical parent.
    pub fn reparent(&self, new_parent: &TreeHandle) {
        *self.node.parent.write() = Arc::downgrade(&new_parent.node);
    }

    /// Detach this element from its physical parent.
    pub fn detach(&self) {
        *self.node.parent.write() = Weak::new();
    }

    /// Set the on-screen size; `(0, 0)` hides the element.
    pub fn set_size(&self, width: u16, height: u16) {
        *self.node.size.write() = (width, height);
    }

    /// How many times [`Element::focus`] was called on this handle.
    #[must_use]
    pub fn focus_count(&self) -> u32 {
        self.node.focus_count.load(Ordering::SeqCst)
    }

    /// The label given at construction.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.node.label
    }
}

impl PartialEq for TreeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for TreeHandle {}

impl std::hash::Hash for TreeHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.node), state);
    }
}

impl fmt::Debug for TreeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TreeHandle").field(&self.node.label).finish()
    }
}

impl Element for TreeHandle {
    fn contains(&self, other: &Self) -> bool {
        let mut current = other.node.parent.read().upgrade();
        while let Some(node) = current {
            if Arc::ptr_eq(&node, &self.node) {
                return true;
            }
            current = node.parent.read().upgrade();
        }
        false
    }

    fn focus(&self) {
        self.node.focus_count.fetch_add(1, Ordering::SeqCst);
    }

    fn visible_size(&self) -> (u16, u16) {
        *self.node.size.read()
    }
}
