//! # focal
//!
//! Focus registry and keyboard navigation for terminal UI element trees.
//!
//! focal maintains a *logical* tree of focusable regions layered over the
//! host's *physical* element tree and drives keyboard navigation across it:
//! Tab between siblings, a modifier hop to the parent or first child, click
//! to focus. Elements register and unregister as they mount and unmount, in
//! any order; focal reconciles declared logical parentage with physical
//! containment and keeps behavior deterministic under churn (remounts,
//! duplicate logical ids, disabled or hidden candidates).
//!
//! The registry never draws anything and never owns an element. It sees
//! opaque handles with three capabilities: a containment test, a way to
//! receive input focus, and an on-screen size query (the [`Element`]
//! trait). Any widget system that can answer those three questions can sit
//! underneath.
//!
//! # Quick Start
//!
//! ```
//! use focal::prelude::*;
//! use focal::testing::TreeHandle;
//!
//! let manager: FocusManager<TreeHandle> = FocusManager::new();
//!
//! // The binding layer registers elements as they mount...
//! let sidebar = TreeHandle::root("sidebar");
//! let entry = sidebar.spawn("entry");
//! manager.register(FocusOptions::new(KnownId::Sidebar), sidebar);
//! manager.register(
//!     FocusOptions::new("item:entry").parent(KnownId::Sidebar),
//!     entry.clone(),
//! );
//!
//! // ...and the input pipeline drives navigation.
//! manager.set_active(FocusTarget::element(entry));
//! manager.handle_key(&KeyEvent::new(KeyCode::Tab));
//! ```
//!
//! # Design
//!
//! - **Out-of-order mounting is normal.** A child may declare a parent id
//!   that nothing carries yet; the link is queued and resolved when a
//!   matching, physically containing element registers. Orphans left by an
//!   unmounted parent reconnect lazily to their nearest registered
//!   ancestor before navigation needs them.
//! - **Logical ids are not unique.** Several mounted instances may share
//!   one id; [`FocusManager::set_active`] scores the candidates (enabled
//!   over disabled, priority, visibility, recency) and picks one.
//! - **No globals.** The manager is a cheap-clone handle you pass around;
//!   observers and radio groups replace ambient reactivity.
//! - **Churn is not an error.** Unknown targets, unresolvable parents, and
//!   malformed-looking ids degrade to no-ops or diagnostics, never panics.

pub mod element;
pub mod events;
pub mod id;
pub mod introspect;
mod macros;
pub mod navigation;
pub mod radio;
pub mod registry;
pub mod testing;

pub use element::Element;
pub use events::{ClickEvent, EventResult, KeyBinding, KeyCode, KeyEvent, KeyModifiers};
pub use id::{FamilyPrefix, KnownId, LogicalId};
pub use introspect::{RegistrationInfo, RegistryStats};
pub use radio::RadioGroup;
pub use registry::{
    FocusContext, FocusError, FocusManager, FocusOptions, FocusTarget, ObserverId, OptionsPatch,
};

/// Commonly used types, re-exported for glob import.
///
/// ```
/// use focal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::element::Element;
    pub use crate::events::{
        ClickEvent, EventResult, KeyBinding, KeyCode, KeyEvent, KeyModifiers,
    };
    pub use crate::id::{FamilyPrefix, KnownId, LogicalId};
    pub use crate::introspect::{RegistrationInfo, RegistryStats};
    pub use crate::radio::RadioGroup;
    pub use crate::registry::{
        FocusContext, FocusError, FocusManager, FocusOptions, FocusTarget, ObserverId,
        OptionsPatch,
    };
}
