//! Shared initialization context for buffers on one physical medium.

use crate::error::{MediumError, MediumResult};
use crate::medium::Medium;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Granularity of the size hint passed to [`Medium::init`].
const INIT_GRANULARITY: usize = 256;

/// Computes the one-time init size hint for a highest reserved address.
///
/// The hint is the next multiple of 256 strictly above `highest_address`,
/// or `None` when that multiple does not fit in `usize`.
#[must_use]
pub const fn init_size_hint(highest_address: usize) -> Option<usize> {
    match (highest_address / INIT_GRANULARITY).checked_add(1) {
        Some(units) => units.checked_mul(INIT_GRANULARITY),
        None => None,
    }
}

#[derive(Debug)]
struct SharedState<M> {
    medium: M,
    highest_address: usize,
    initialized_size: Option<usize>,
}

/// A handle to one physical medium shared by several buffers.
///
/// Cloning the handle shares the medium. The context tracks the highest end
/// address any buffer has reserved and whether the medium-wide [`Medium::init`]
/// has run; init runs at most once for the lifetime of the context.
///
/// Every buffer placed on the same physical medium must be created from
/// clones of the same `SharedMedium`.
///
/// # Example
///
/// ```rust
/// use eewl_medium::{InMemoryMedium, Medium, SharedMedium};
///
/// let shared = SharedMedium::new(InMemoryMedium::empty());
/// shared.reserve(0x60);
/// shared.reserve(0x120);
/// shared.ensure_initialized(0x120).unwrap();
///
/// assert_eq!(shared.lock().capacity(), 0x200);
/// ```
#[derive(Debug)]
pub struct SharedMedium<M> {
    state: Arc<Mutex<SharedState<M>>>,
}

impl<M> Clone for SharedMedium<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<M: Medium> SharedMedium<M> {
    /// Wraps a medium that has not been initialized yet.
    pub fn new(medium: M) -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState {
                medium,
                highest_address: 0,
                initialized_size: None,
            })),
        }
    }

    /// Records that a buffer occupies addresses up to `end_address` (exclusive).
    pub fn reserve(&self, end_address: usize) {
        let mut state = self.state.lock();
        if end_address > state.highest_address {
            state.highest_address = end_address;
        }
    }

    /// Runs the one-time medium initialization if it has not run yet, then
    /// checks that the medium covers addresses up to `end_address`
    /// (exclusive).
    ///
    /// Only the caller's own range is checked, so a buffer reserved past the
    /// medium does not affect buffers that fit.
    ///
    /// # Errors
    ///
    /// Returns [`MediumError::InitFailed`] (or the medium's own error) if the
    /// initialization fails, [`MediumError::SizeOverflow`] if the init size
    /// hint does not fit in `usize`, and [`MediumError::BeyondInitialized`]
    /// if the medium ends before `end_address`.
    pub fn ensure_initialized(&self, end_address: usize) -> MediumResult<()> {
        let mut state = self.state.lock();
        if end_address > state.highest_address {
            state.highest_address = end_address;
        }

        if state.initialized_size.is_none() {
            let highest = state.highest_address;
            let hint = init_size_hint(highest).ok_or(MediumError::SizeOverflow { requested: highest })?;
            state.medium.init(hint)?;
            tracing::debug!(size_hint = hint, "medium initialized");
            state.initialized_size = Some(hint);
        }

        let capacity = state.medium.capacity();
        if end_address > capacity {
            return Err(MediumError::BeyondInitialized {
                requested: end_address,
                initialized: capacity,
            });
        }
        Ok(())
    }

    /// Returns whether the one-time initialization has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized_size.is_some()
    }

    /// Returns the highest end address reserved so far.
    #[must_use]
    pub fn highest_address(&self) -> usize {
        self.state.lock().highest_address
    }

    /// Locks the medium for a sequence of accesses.
    pub fn lock(&self) -> SharedMediumGuard<'_, M> {
        SharedMediumGuard {
            guard: self.state.lock(),
        }
    }

    /// Runs `f` with exclusive access to the medium.
    pub fn with<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.state.lock().medium)
    }
}

/// Exclusive access to a shared medium, released on drop.
pub struct SharedMediumGuard<'a, M> {
    guard: MutexGuard<'a, SharedState<M>>,
}

impl<M> std::ops::Deref for SharedMediumGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &Self::Target {
        &self.guard.medium
    }
}

impl<M> std::ops::DerefMut for SharedMediumGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard.medium
    }
}
