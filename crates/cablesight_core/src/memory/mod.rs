//! Memory management for engine-owned objects.
//!
//! Scene nodes live in a generational arena. Handles carry a generation so
//! that a handle kept across an unmount/mount cycle resolves to nothing
//! instead of to an unrelated node that reused the slot.

mod slab;

pub use slab::{SlotArena, SlotHandle};
