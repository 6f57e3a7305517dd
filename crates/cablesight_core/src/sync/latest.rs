//! Latest-value cell.
//!
//! Writers replace the whole value under a write lock; readers clone it out
//! under a read lock. A reader therefore sees either the previous value or
//! the new one, never a mix of fields.

use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug)]
struct Versioned<T> {
    value: T,
    version: u64,
}

/// A value read out of an [`InputCell`] at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<T> {
    /// The value at the time of the read.
    pub value: T,
    /// Monotonic write counter. Zero means "never written since creation".
    pub version: u64,
}

/// Shared cell holding the most recent value written by the host.
#[derive(Debug)]
pub struct InputCell<T> {
    inner: Arc<RwLock<Versioned<T>>>,
}

impl<T: Clone> InputCell<T> {
    /// Creates a cell holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Versioned {
                value: initial,
                version: 0,
            })),
        }
    }

    /// Returns a writer handle for the host side.
    #[must_use]
    pub fn writer(&self) -> InputWriter<T> {
        InputWriter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Reads the current value by value.
    #[must_use]
    pub fn read(&self) -> Snapshot<T> {
        let guard = self.inner.read();
        Snapshot {
            value: guard.value.clone(),
            version: guard.version,
        }
    }

    /// Returns the current write counter without cloning the value.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }
}

impl<T> Clone for InputCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Host-side writer for an [`InputCell`].
#[derive(Debug)]
pub struct InputWriter<T> {
    inner: Arc<RwLock<Versioned<T>>>,
}

impl<T> InputWriter<T> {
    /// Replaces the value.
    pub fn set(&self, value: T) {
        let mut guard = self.inner.write();
        guard.value = value;
        guard.version += 1;
    }

    /// Mutates the value in place under the write lock.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut guard = self.inner.write();
        f(&mut guard.value);
        guard.version += 1;
    }
}

impl<T> Clone for InputWriter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Pair {
        a: u32,
        b: u32,
    }

    #[test]
    fn test_write_then_read() {
        let cell = InputCell::new(Pair { a: 0, b: 0 });
        assert_eq!(cell.read().version, 0);

        cell.writer().set(Pair { a: 1, b: 1 });
        let snap = cell.read();
        assert_eq!(snap.value, Pair { a: 1, b: 1 });
        assert_eq!(snap.version, 1);
    }

    #[test]
    fn test_update_in_place() {
        let cell = InputCell::new(Pair { a: 5, b: 7 });
        let writer = cell.writer();
        writer.update(|p| p.b = 9);
        assert_eq!(cell.read().value, Pair { a: 5, b: 9 });
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn test_no_torn_reads_across_threads() {
        let cell = InputCell::new(Pair { a: 0, b: 0 });
        let writer = cell.writer();

        let handle = std::thread::spawn(move || {
            for i in 0..10_000 {
                writer.set(Pair { a: i, b: i });
            }
        });

        for _ in 0..10_000 {
            let snap = cell.read().value;
            assert_eq!(snap.a, snap.b);
        }

        handle.join().unwrap();
        assert_eq!(cell.read().value, Pair { a: 9_999, b: 9_999 });
    }
}
