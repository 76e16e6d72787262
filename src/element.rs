//! The opaque element handle the registry navigates over.
//!
//! The registry never creates, draws, or owns UI elements. It holds handles
//! supplied by the host's binding layer and relies on exactly three
//! capabilities: a physical containment test against another handle, a way
//! to hand the element input focus, and an on-screen size query. Everything
//! else about the element (how it is rendered, laid out, or destroyed) is
//! the host's business.
//!
//! Handles are used as map keys, so they must be cheap to clone and have a
//! stable identity between `register` and the matching `unregister` (an
//! `Rc`/`Arc` around the host's widget state, an arena index, a slotmap key,
//! and so on).

/// A handle to a physical focusable region.
///
/// `contains` must reflect *physical* nesting: `a.contains(b)` when `b` is
/// laid out inside `a`. An element does not contain itself. For any element,
/// its containers must form a chain: if `a` and `b` both contain `x`, then
/// one of `a`, `b` contains the other. Every tree-shaped UI satisfies this;
/// the registry leans on it to find nearest ancestors through the
/// containment test alone, without a parent pointer on the handle.
///
/// Handles are owning, long-lived identities (hence `'static`), cheap to
/// clone, and stable between `register` and the matching `unregister`.
pub trait Element: Clone + Eq + std::hash::Hash + 'static {
    /// Whether `other` is physically nested inside this element.
    fn contains(&self, other: &Self) -> bool;

    /// Give this element input focus in the host UI.
    fn focus(&self);

    /// The element's on-screen size in terminal cells, `(0, 0)` or a zero
    /// axis when hidden or collapsed.
    fn visible_size(&self) -> (u16, u16);

    /// Whether the element currently occupies screen space.
    fn is_visible(&self) -> bool {
        let (w, h) = self.visible_size();
        w > 0 && h > 0
    }
}
