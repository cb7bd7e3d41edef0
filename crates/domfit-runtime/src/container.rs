#![forbid(unsafe_code)]

//! The container size oracle and the grow/shrink callback pair.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use domfit_core::ScrollMetrics;

/// Something whose rendered and visible extents can be read synchronously.
///
/// `None` means the container no longer exists (for example, a weak handle
/// whose target was dropped). A pass that reads `None` ends immediately.
pub trait Container {
    /// Current extents, reflecting all mutations applied so far.
    fn metrics(&self) -> Option<ScrollMetrics>;
}

impl Container for Cell<ScrollMetrics> {
    fn metrics(&self) -> Option<ScrollMetrics> {
        Some(self.get())
    }
}

impl<T: Container + ?Sized> Container for Rc<T> {
    fn metrics(&self) -> Option<ScrollMetrics> {
        (**self).metrics()
    }
}

impl<T: Container> Container for Weak<T> {
    fn metrics(&self) -> Option<ScrollMetrics> {
        self.upgrade().and_then(|c| c.metrics())
    }
}

type StepFn = Box<dyn FnMut() -> bool>;

/// Host-supplied grow/shrink pair.
///
/// Each callback changes the rendered content by one discrete step and
/// returns whether another step in the same direction is possible.
///
/// # Preconditions
///
/// Callbacks must be monotonic and must eventually return `false` at a real
/// boundary. A pair that always returns `true` while the container can never
/// fit (or never overflow) keeps a pass alive indefinitely; the controller
/// does not guard against it.
pub struct FitCallbacks {
    grow: StepFn,
    shrink: StepFn,
}

impl FitCallbacks {
    /// Create a callback pair.
    pub fn new<G, S>(grow: G, shrink: S) -> Self
    where
        G: FnMut() -> bool + 'static,
        S: FnMut() -> bool + 'static,
    {
        Self {
            grow: Box::new(grow),
            shrink: Box::new(shrink),
        }
    }

    /// A pair that never changes anything.
    #[must_use]
    pub fn inert() -> Self {
        Self::new(|| false, || false)
    }

    /// Grow by one step.
    pub fn grow(&mut self) -> bool {
        (self.grow)()
    }

    /// Shrink by one step.
    pub fn shrink(&mut self) -> bool {
        (self.shrink)()
    }
}

impl fmt::Debug for FitCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitCallbacks").finish_non_exhaustive()
    }
}
