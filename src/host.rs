//! Host capabilities a field behavior needs from its document.
//!
//! The behavior never owns the document. It is handed a host at ready time,
//! queries it for elements, and leaves listeners behind.

use super::*;

/// Maps a selector to the currently present matching elements, in document
/// order and without duplicates.
pub trait ElementQuery {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>>;
}

/// Receives key-down notifications for one element. The listener may rewrite
/// `value` in place; it runs before the key's default action.
pub trait KeyDownListener {
    fn handle_key_down(&self, value: &mut String, event: &KeyboardEvent);
}

impl<F> KeyDownListener for F
where
    F: Fn(&mut String, &KeyboardEvent),
{
    fn handle_key_down(&self, value: &mut String, event: &KeyboardEvent) {
        self(value, event)
    }
}

pub trait KeyDownRegistry {
    fn add_key_down_listener(
        &mut self,
        node: NodeId,
        listener: Rc<dyn KeyDownListener>,
    ) -> Result<()>;
}

/// Everything a field behavior needs at initialization time.
pub trait FieldHost: ElementQuery + KeyDownRegistry {}

impl<T> FieldHost for T where T: ElementQuery + KeyDownRegistry {}
