//! # CABLESIGHT Core
//!
//! Ownership primitives shared by the visualization engine:
//! - `SlotArena`: generational storage for scene nodes, so a stale node
//!   handle can never alias a newer node after teardown and rebuild
//! - `InputCell`: latest-value cell written by the host, read once per tick
//! - `CancelToken`: cooperative cancellation for the frame loop
//!
//! ## Example
//!
//! ```rust,ignore
//! use cablesight_core::{SlotArena, InputCell};
//!
//! let mut arena = SlotArena::new();
//! let node = arena.insert("jacket");
//! assert_eq!(arena.get(node), Some(&"jacket"));
//!
//! let cell = InputCell::new(0u8);
//! cell.writer().set(3);
//! assert_eq!(cell.read().value, 3);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;
pub mod sync;

pub use memory::{SlotArena, SlotHandle};
pub use sync::{CancelToken, InputCell, InputWriter, Snapshot};
