//! Clearable reference: a holder that can be invalidated independently of
//! the consumers that cached it.

use std::fmt;

use parking_lot::RwLock;

/// A single-assignment-until-cleared holder.
///
/// The registry hands these out from lookups and clears them when the slot is
/// rebound or removed. A consumer that finds its cached holder empty must go
/// back to the registry rather than keep using what it saw before.
pub struct ClearableReference<T> {
    value: RwLock<Option<T>>,
}

impl<T: Clone> ClearableReference<T> {
    /// Create a holder around `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    /// Create a holder that is already cleared.
    pub fn empty() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// The held value, or `None` once cleared.
    pub fn get(&self) -> Option<T> {
        self.value.read().clone()
    }

    /// Clear the holder, returning the value it held.
    ///
    /// Clearing an already cleared holder returns `None`.
    pub fn clear(&self) -> Option<T> {
        self.value.write().take()
    }

    /// Whether the holder has been cleared.
    pub fn is_cleared(&self) -> bool {
        self.value.read().is_none()
    }
}

impl<T> fmt::Debug for ClearableReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClearableReference")
            .field("cleared", &self.value.read().is_none())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
