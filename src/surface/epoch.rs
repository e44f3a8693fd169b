//! Epoch-stamped deferred context release.
//!
//! A surface that unmounts hands its context to the host for release on a
//! later turn, so an immediate remount onto the same render target can still
//! use it. Each mount advances the target's epoch; a deferred release only
//! runs if no mount happened since it was scheduled.

use std::cell::Cell;
use std::rc::Rc;

use crate::gpu::GraphicsContext;

/// Snapshot of an [`EpochCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpochToken(u64);

/// Mount counter shared by everything that renders into one target.
#[derive(Debug, Clone, Default)]
pub struct EpochCounter(Rc<Cell<u64>>);

impl EpochCounter {
    /// Counter starting at epoch zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new epoch and return its token.
    pub fn advance(&self) -> EpochToken {
        let next = self.0.get() + 1;
        self.0.set(next);
        EpochToken(next)
    }

    /// Token of the current epoch.
    pub fn current(&self) -> EpochToken {
        EpochToken(self.0.get())
    }

    /// Whether `token` still names the current epoch.
    pub fn is_current(&self, token: EpochToken) -> bool {
        self.0.get() == token.0
    }
}

/// A context waiting to be released on a later turn.
#[derive(Debug)]
pub struct DeferredRelease<C: GraphicsContext> {
    token: EpochToken,
    counter: EpochCounter,
    context: C,
}

impl<C: GraphicsContext> DeferredRelease<C> {
    /// Stamp `context` with the current epoch of `counter`.
    pub fn new(counter: &EpochCounter, context: C) -> Self {
        Self {
            token: counter.current(),
            counter: counter.clone(),
            context,
        }
    }

    /// Release the context unless a newer mount has claimed the target.
    /// Returns whether the release happened.
    pub fn run(mut self) -> bool {
        if self.counter.is_current(self.token) {
            self.context.release();
            true
        } else {
            log::debug!("skipping stale context release");
            false
        }
    }
}
