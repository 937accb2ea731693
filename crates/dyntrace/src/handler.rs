//! Per-thread stacks of errors being handled and errors most recently caught.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    error::{DiagError, DiagResult, InternalFault},
    record::ErrorRef,
};

/// Thread-safe view of one thread's pending-interrupt flag.
///
/// Another thread uses it to request a cooperative cancellation; the owning
/// thread delivers an interrupt error at its next safe point and the flag is
/// cleared when that error is unwound through a handler.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clears the flag, returning whether it was set.
    pub(crate) fn clear(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// What [`HandlerStack::pop`] removed.
#[derive(Debug)]
pub struct Popped {
    pub error: ErrorRef,
    /// True if popping this error cleared a pending interrupt.
    pub interrupt_cleared: bool,
}

/// The two per-thread error stacks.
///
/// `handling` holds errors whose handler body is syntactically active;
/// `caught` holds the most recently caught errors, read by bare re-raise and
/// "current exception" introspection. They diverge under nested catch/finally.
#[derive(Debug, Default)]
pub struct HandlerStack {
    handling: Vec<ErrorRef>,
    caught: Vec<ErrorRef>,
}

impl HandlerStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `error` as being handled. Returns the depth after the push.
    pub fn push(&mut self, error: ErrorRef) -> usize {
        self.handling.push(error);
        self.handling.len()
    }

    /// Ends the innermost handler.
    ///
    /// Popping an interrupt-class abort clears `interrupt` so the interrupt is
    /// not delivered again once the handler completes. Popping an empty stack
    /// is an [`InternalFault::HandlerStackUnderflow`].
    pub fn pop(&mut self, interrupt: &InterruptHandle) -> Result<Popped, InternalFault> {
        let error = self.handling.pop().ok_or(InternalFault::HandlerStackUnderflow)?;
        let interrupt_cleared = error.class().clears_interrupt() && interrupt.clear();
        Ok(Popped {
            error,
            interrupt_cleared,
        })
    }

    /// Errors whose handler bodies are active, outermost first.
    #[must_use]
    pub fn active(&self) -> &[ErrorRef] {
        &self.handling
    }

    /// The error whose handler is innermost, if any.
    #[must_use]
    pub fn handling(&self) -> Option<&ErrorRef> {
        self.handling.last()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.handling.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handling.is_empty()
    }

    /// Records that `error` was caught.
    pub fn record_caught(&mut self, error: ErrorRef) {
        self.caught.push(error);
    }

    /// Forgets the most recently caught error.
    pub fn release_caught(&mut self) -> Result<ErrorRef, InternalFault> {
        self.caught.pop().ok_or(InternalFault::CaughtStackUnderflow)
    }

    /// The most recently caught error on this thread.
    pub fn current(&self) -> DiagResult<&ErrorRef> {
        self.caught.last().ok_or(DiagError::NoActiveError)
    }

    #[must_use]
    pub fn caught_depth(&self) -> usize {
        self.caught.len()
    }
}
