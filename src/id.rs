//! Logical identifiers for focusable regions.
//!
//! Elements register under a [`LogicalId`]: either one of the well-known
//! region ids every host application shares ([`KnownId`]), a structured
//! "family" id built from a fixed prefix and a caller-chosen suffix
//! (`pane:chat`, `tab:settings`), or an arbitrary opaque string. Many
//! elements may share one logical id at the same time; the registry treats
//! that as normal, not as a conflict.
//!
//! Parsing is infallible. A string that contains the family separator but
//! does not start with a known prefix is kept as an opaque id; it only
//! produces a diagnostic because it *looks* like a typo'd family id.
//!
//! # Example
//!
//! ```
//! use focal::id::{FamilyPrefix, KnownId, LogicalId};
//!
//! let sidebar = LogicalId::from(KnownId::Sidebar);
//! let pane = LogicalId::family(FamilyPrefix::Pane, "chat");
//! let custom = LogicalId::from("inspector");
//!
//! assert_eq!(pane.to_string(), "pane:chat");
//! assert_eq!(LogicalId::from("pane:chat"), pane);
//! assert!(custom.family_prefix().is_none());
//! ```

use crate::macros::focus_warn;
use smartstring::alias::String as SmartString;
use std::fmt;

/// Separator between a family prefix and its suffix.
pub const FAMILY_SEPARATOR: char = ':';

/// Well-known region ids shared across host applications.
///
/// These cover the standing regions of a typical terminal application
/// chrome. Anything else goes through a family or custom id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownId {
    /// The application root region.
    Root,
    /// The menu region.
    Menu,
    /// The sidebar region.
    Sidebar,
    /// The main content region.
    Content,
    /// The status bar region.
    StatusBar,
    /// The active dialog region.
    Dialog,
}

impl KnownId {
    /// All well-known ids, for parsing and introspection.
    pub const ALL: &'static [KnownId] = &[
        KnownId::Root,
        KnownId::Menu,
        KnownId::Sidebar,
        KnownId::Content,
        KnownId::StatusBar,
        KnownId::Dialog,
    ];

    /// The canonical string form of this id.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Menu => "menu",
            Self::Sidebar => "sidebar",
            Self::Content => "content",
            Self::StatusBar => "status-bar",
            Self::Dialog => "dialog",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_str() == s)
    }
}

impl fmt::Display for KnownId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of family-id prefixes.
///
/// A family id names one member of a dynamic group: `pane:chat` is the
/// chat member of the pane family. The prefix set is closed so that
/// membership queries stay meaningful; suffixes are caller-chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyPrefix {
    /// A pane within a split layout.
    Pane,
    /// A tab within a tab strip.
    Tab,
    /// A named group of controls.
    Group,
    /// An item within a list or tree.
    Item,
}

impl FamilyPrefix {
    /// All family prefixes, for parsing and introspection.
    pub const ALL: &'static [FamilyPrefix] = &[
        FamilyPrefix::Pane,
        FamilyPrefix::Tab,
        FamilyPrefix::Group,
        FamilyPrefix::Item,
    ];

    /// The canonical string form of this prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pane => "pane",
            Self::Tab => "tab",
            Self::Group => "group",
            Self::Item => "item",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for FamilyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical id a focusable region registers under.
///
/// Construction always normalizes: `LogicalId::from("sidebar")` yields the
/// well-known variant, `LogicalId::from("pane:chat")` the family variant,
/// so equality and hashing are consistent however the id was built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalId {
    /// One of the well-known region ids.
    Known(KnownId),
    /// A family member id: fixed prefix plus caller-chosen suffix.
    Family(FamilyPrefix, SmartString),
    /// An opaque caller-chosen id.
    Custom(SmartString),
}

impl LogicalId {
    /// Parse an id from its string form. Never fails.
    ///
    /// Strings containing [`FAMILY_SEPARATOR`] with an unknown prefix are
    /// kept opaque; they emit a warning because they look like malformed
    /// family ids, but malformed-looking input is not an error.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if let Some(known) = KnownId::parse(s) {
            return Self::Known(known);
        }
        if let Some((prefix, suffix)) = s.split_once(FAMILY_SEPARATOR) {
            match FamilyPrefix::parse(prefix) {
                Some(family) if Self::valid_suffix(suffix) => {
                    return Self::Family(family, suffix.into());
                }
                Some(_) | None => {
                    focus_warn!(
                        id = s,
                        "id looks like a family id but is not one; treating as opaque"
                    );
                }
            }
        }
        Self::Custom(s.into())
    }

    /// Build a family id from its parts.
    ///
    /// An invalid suffix (empty, or containing the separator) degrades to
    /// an opaque id of the joined string rather than failing.
    #[must_use]
    pub fn family(prefix: FamilyPrefix, suffix: &str) -> Self {
        if Self::valid_suffix(suffix) {
            Self::Family(prefix, suffix.into())
        } else {
            let joined = format!("{prefix}{FAMILY_SEPARATOR}{suffix}");
            focus_warn!(
                id = joined.as_str(),
                "invalid family suffix; treating as opaque"
            );
            Self::Custom(joined.into())
        }
    }

    /// The family prefix, when this is a family id.
    #[must_use]
    pub fn family_prefix(&self) -> Option<FamilyPrefix> {
        match self {
            Self::Family(prefix, _) => Some(*prefix),
            Self::Known(_) | Self::Custom(_) => None,
        }
    }

    /// The family suffix, when this is a family id.
    #[must_use]
    pub fn family_suffix(&self) -> Option<&str> {
        match self {
            Self::Family(_, suffix) => Some(suffix),
            Self::Known(_) | Self::Custom(_) => None,
        }
    }

    fn valid_suffix(suffix: &str) -> bool {
        !suffix.is_empty() && !suffix.contains(FAMILY_SEPARATOR)
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(known) => known.fmt(f),
            Self::Family(prefix, suffix) => {
                write!(f, "{prefix}{FAMILY_SEPARATOR}{suffix}")
            }
            Self::Custom(s) => f.write_str(s),
        }
    }
}

impl From<&str> for LogicalId {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for LogicalId {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<KnownId> for LogicalId {
    fn from(known: KnownId) -> Self {
        Self::Known(known)
    }
}
