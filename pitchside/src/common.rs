//! Common primitive types shared across the engine.

use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies an attached display window.
    ///
    /// Returned when a display subscribes to the engine. Keys are never
    /// reused, so a stale id from a closed display cannot address a newer
    /// one.
    pub struct DisplayId;
}
