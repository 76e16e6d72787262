//! Input event types and key bindings.
//!
//! The registry does not read the terminal itself; the host's input
//! pipeline translates whatever it receives into these types and hands them
//! to [`FocusManager::handle_key`](crate::registry::FocusManager::handle_key)
//! and [`FocusManager::handle_click`](crate::registry::FocusManager::handle_click).
//! Conversions from crossterm's event types are provided since that is what
//! most host pipelines run on.

use crate::element::Element;

/// Key codes the focus layer understands.
///
/// This is deliberately smaller than a full terminal key enum; codes the
/// registry has no binding for still flow through custom handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Escape.
    Esc,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Tab. Shift+Tab arrives as `Tab` with the shift modifier set.
    Tab,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// A function key.
    F(u8),
    /// A key this layer has no name for.
    Unidentified,
}

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    /// Control key.
    pub ctrl: bool,
    /// Shift key.
    pub shift: bool,
    /// Alt/Option key.
    pub alt: bool,
    /// Super key (Command on macOS, Windows key elsewhere).
    pub super_key: bool,
}

impl KeyModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        super_key: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
        alt: false,
        super_key: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
        alt: false,
        super_key: false,
    };

    /// Alt only.
    pub const ALT: Self = Self {
        ctrl: false,
        shift: false,
        alt: true,
        super_key: false,
    };

    /// Super only.
    pub const SUPER: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        super_key: true,
    };

    /// The platform's primary command modifier: Super (Command) on macOS,
    /// Control everywhere else.
    #[must_use]
    pub const fn platform() -> Self {
        #[cfg(target_os = "macos")]
        {
            Self::SUPER
        }
        #[cfg(not(target_os = "macos"))]
        {
            Self::CTRL
        }
    }
}

/// A key event delivered by the host input pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Key code.
    pub code: KeyCode,
    /// Modifier keys held.
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Create a key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Create a key event with explicit modifiers.
    #[must_use]
    pub const fn with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }
}

/// A click event delivered by the host input pipeline (capture phase).
///
/// The host performs hit-testing; the registry only needs the handle of the
/// innermost element under the pointer and walks outward from there to the
/// nearest registered region.
#[derive(Debug, Clone)]
pub struct ClickEvent<E: Element> {
    /// The innermost element under the pointer.
    pub target: E,
}

impl<E: Element> ClickEvent<E> {
    /// Create a click event for a target element.
    pub fn new(target: E) -> Self {
        Self { target }
    }
}

/// Outcome of a custom key handler.
///
/// `Continue` means "not handled, let the default bindings run"; anything a
/// handler actually consumed is `Handled` and stops dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum EventResult {
    /// The event was consumed; stop dispatch.
    Handled,
    /// The event was not consumed; fall through to default bindings.
    Continue,
}

/// Key binding helper.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    /// Key code to match.
    pub code: KeyCode,
    /// Required modifier keys.
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Create a binding for a simple key.
    pub const fn key(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Create a binding with Ctrl modifier.
    pub const fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CTRL,
        }
    }

    /// Create a binding with Alt modifier.
    pub const fn alt(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::ALT,
        }
    }

    /// Create a binding with Shift modifier.
    pub const fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    /// Create a binding with the platform command modifier
    /// (Command on macOS, Ctrl elsewhere).
    pub const fn platform(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::platform(),
        }
    }

    /// Check if this binding matches a key event.
    #[must_use]
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.code == event.code && self.modifiers == event.modifiers
    }
}

impl From<crossterm::event::KeyCode> for KeyCode {
    fn from(code: crossterm::event::KeyCode) -> Self {
        use crossterm::event::KeyCode as Ct;
        match code {
            Ct::Char(c) => Self::Char(c),
            Ct::Enter => Self::Enter,
            Ct::Esc => Self::Esc,
            Ct::Backspace => Self::Backspace,
            Ct::Delete => Self::Delete,
            // BackTab folds into Tab; the shift modifier carries the
            // direction (see the KeyEvent conversion).
            Ct::Tab | Ct::BackTab => Self::Tab,
            Ct::Up => Self::Up,
            Ct::Down => Self::Down,
            Ct::Left => Self::Left,
            Ct::Right => Self::Right,
            Ct::Home => Self::Home,
            Ct::End => Self::End,
            Ct::PageUp => Self::PageUp,
            Ct::PageDown => Self::PageDown,
            Ct::F(n) => Self::F(n),
            _ => Self::Unidentified,
        }
    }
}

impl From<crossterm::event::KeyModifiers> for KeyModifiers {
    fn from(modifiers: crossterm::event::KeyModifiers) -> Self {
        use crossterm::event::KeyModifiers as Ct;
        Self {
            ctrl: modifiers.contains(Ct::CONTROL),
            shift: modifiers.contains(Ct::SHIFT),
            alt: modifiers.contains(Ct::ALT),
            super_key: modifiers.contains(Ct::SUPER),
        }
    }
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(event: crossterm::event::KeyEvent) -> Self {
        let mut modifiers = KeyModifiers::from(event.modifiers);
        // Terminals report Shift+Tab as BackTab, usually without the shift
        // bit; normalize so bindings only ever see Tab.
        if event.code == crossterm::event::KeyCode::BackTab {
            modifiers.shift = true;
        }
        Self {
            code: KeyCode::from(event.code),
            modifiers,
        }
    }
}
