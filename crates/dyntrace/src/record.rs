//! The error object as seen by the diagnostics core.

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumString, IntoStaticStr};

use crate::frame::{CapturedTrace, DynamicFrame};

/// Shared, copy-on-write list of recorded dynamic frames, outermost call first.
///
/// The recorder and any number of errors may hold the same list; recording into
/// a shared list clones it first, so a list attached to an error never changes.
pub type FrameList = Arc<Vec<DynamicFrame>>;

/// Why a cooperative-cancellation error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum AbortReason {
    /// A user-requested stop (keyboard interrupt). Marks an abort in progress;
    /// unwinding it through a handler clears the thread's pending interrupt.
    Interrupt,
    /// Thread teardown requested by the host. Left pending after a handler runs.
    Shutdown,
}

/// Classification of an error, as far as this core cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Raised by script code.
    Script,
    /// Raised by host or library code called from a script.
    Host,
    /// Cooperative-cancellation signal delivered to a running thread.
    Abort(AbortReason),
}

impl ErrorClass {
    /// Returns true if popping a handler for this error must clear the thread's pending interrupt.
    #[must_use]
    pub fn clears_interrupt(self) -> bool {
        matches!(self, Self::Abort(AbortReason::Interrupt))
    }
}

/// Diagnostic state attached to one logical error.
///
/// Lifecycle: created at first throw with no traces, gains one
/// [`CapturedTrace`] per throw or re-raise, dropped with the error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    class: ErrorClass,
    message: Option<String>,
    /// Oldest first. Append-only.
    traces: Option<SmallVec<[CapturedTrace; 2]>>,
    dynamic_frames: Option<FrameList>,
}

impl ErrorRecord {
    #[must_use]
    pub fn new(class: ErrorClass, message: Option<String>) -> Self {
        Self {
            class,
            message,
            traces: None,
            dynamic_frames: None,
        }
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        self.class
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Captured traces, oldest first, or `None` if the error was never raised.
    #[must_use]
    pub fn traces(&self) -> Option<&[CapturedTrace]> {
        self.traces.as_deref()
    }

    #[must_use]
    pub fn trace_count(&self) -> usize {
        self.traces.as_ref().map_or(0, SmallVec::len)
    }

    #[must_use]
    pub fn dynamic_frames(&self) -> &[DynamicFrame] {
        self.dynamic_frames.as_deref().map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn has_dynamic_frames(&self) -> bool {
        self.dynamic_frames.is_some()
    }

    pub(crate) fn push_trace(&mut self, trace: CapturedTrace) -> usize {
        let traces = self.traces.get_or_insert_with(SmallVec::new);
        traces.push(trace);
        traces.len()
    }

    pub(crate) fn set_dynamic_frames(&mut self, frames: FrameList) {
        self.dynamic_frames = Some(frames);
    }
}

/// Handle to an [`ErrorRecord`] held by the error object and by handler stacks.
///
/// Errors never leave the thread that raised or caught them, so the handle is
/// single-threaded. Equality is identity.
#[derive(Debug, Clone)]
pub struct ErrorRef(Rc<RefCell<ErrorRecord>>);

impl ErrorRef {
    #[must_use]
    pub fn new(class: ErrorClass, message: Option<String>) -> Self {
        Self::from_record(ErrorRecord::new(class, message))
    }

    #[must_use]
    pub fn from_record(record: ErrorRecord) -> Self {
        Self(Rc::new(RefCell::new(record)))
    }

    /// Borrows the record for reading, e.g. to walk its frames.
    ///
    /// # Panics
    /// Panics if a capture is appending to the same error at the same time.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, ErrorRecord> {
        self.0.borrow()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ErrorRecord) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        self.0.borrow().class()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ErrorRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ErrorRef {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_interrupt_aborts_clear_the_flag() {
        assert!(ErrorClass::Abort(AbortReason::Interrupt).clears_interrupt());
        assert!(!ErrorClass::Abort(AbortReason::Shutdown).clears_interrupt());
        assert!(!ErrorClass::Script.clears_interrupt());
        assert!(!ErrorClass::Host.clears_interrupt());
    }

    #[test]
    fn fresh_record_has_no_history() {
        let record = ErrorRecord::new(ErrorClass::Script, Some("boom".to_owned()));
        assert!(record.traces().is_none());
        assert_eq!(record.trace_count(), 0);
        assert!(record.dynamic_frames().is_empty());
        assert_eq!(record.message(), Some("boom"));
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = ErrorRef::new(ErrorClass::Script, None);
        let b = ErrorRef::new(ErrorClass::Script, None);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn abort_reason_parses_from_name() {
        assert_eq!("Interrupt".parse::<AbortReason>(), Ok(AbortReason::Interrupt));
        let name: &'static str = AbortReason::Shutdown.into();
        assert_eq!(name, "Shutdown");
    }
}
