use std::fmt;

use crate::frame::LogicalFrame;

/// Result type alias for diagnostic operations that can fail.
pub type DiagResult<T> = Result<T, DiagError>;

/// Error type for the diagnostics core.
///
/// Separates the one condition a script can observe (asking for the current
/// error when none was caught) from faults that indicate the runtime paired its
/// own producer and consumer calls incorrectly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagError {
    /// `current()` was called with an empty caught-error stack.
    ///
    /// Surfaced to the script-level caller; not fatal to the runtime.
    NoActiveError,
    /// Bug in the runtime's own bookkeeping, not in user code.
    Internal(InternalFault),
}

impl fmt::Display for DiagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveError => f.write_str("no exception is currently being handled"),
            Self::Internal(fault) => write!(f, "internal diagnostics fault: {fault}"),
        }
    }
}

impl std::error::Error for DiagError {}

impl From<InternalFault> for DiagError {
    fn from(fault: InternalFault) -> Self {
        Self::Internal(fault)
    }
}

impl From<PartialTrace<'_>> for DiagError {
    fn from(partial: PartialTrace<'_>) -> Self {
        Self::Internal(partial.fault)
    }
}

/// Internal-consistency violations.
///
/// Each variant means a push/pop or record/capture pair inside the runtime got
/// out of step. They are reported to the tracer and returned, never swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalFault {
    /// The handling stack was popped while empty.
    HandlerStackUnderflow,
    /// The caught-error stack was released while empty.
    CaughtStackUnderflow,
    /// A trampoline frame was walked with no recorded dynamic frame left to
    /// substitute for it.
    FrameQueueUnderflow {
        /// Index of the captured trace being walked (in walk order).
        trace: usize,
        /// Index of the native frame within that trace (in walk order).
        frame: usize,
        /// Number of dynamic frames recorded for the error.
        recorded: usize,
    },
}

impl fmt::Display for InternalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandlerStackUnderflow => f.write_str("exception handler stack popped while empty"),
            Self::CaughtStackUnderflow => f.write_str("caught exception stack released while empty"),
            Self::FrameQueueUnderflow { trace, frame, recorded } => write!(
                f,
                "trampoline frame {frame} of trace {trace} has no dynamic frame to replace it ({recorded} recorded)"
            ),
        }
    }
}

impl std::error::Error for InternalFault {}

/// Best-effort result of a reconciliation walk that hit an [`InternalFault`].
///
/// `frames` holds everything yielded before the fault was detected; callers
/// that are already reporting an unrelated user error can still print it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialTrace<'a> {
    pub frames: Vec<LogicalFrame<'a>>,
    pub fault: InternalFault,
}

impl fmt::Display for PartialTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} frames)", self.fault, self.frames.len())
    }
}

impl std::error::Error for PartialTrace<'_> {}
