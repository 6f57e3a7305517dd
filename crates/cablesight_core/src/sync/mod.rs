//! # Cross-Boundary Synchronization
//!
//! The engine has exactly one writer of scene state (its tick). Two things
//! cross into it from outside:
//!
//! ```text
//!   Host UI ──set()──► InputCell ──read()──► tick N (snapshot by value)
//!   Host UI ──cancel()─► CancelToken ──is_cancelled()──► request next frame?
//! ```
//!
//! Both are cheap to clone and safe to hand to another thread.

mod cancel;
mod latest;

pub use cancel::CancelToken;
pub use latest::{InputCell, InputWriter, Snapshot};
