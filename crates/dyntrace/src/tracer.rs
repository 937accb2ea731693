//! Diagnostics event tracing.
//!
//! The [`ThreadDiagnosticContext`](crate::ThreadDiagnosticContext) is generic over
//! a [`DiagTracer`], so the production default [`NoopTracer`] compiles every hook
//! away while [`StderrTracer`] and [`RecordingTracer`] make recorder, capture and
//! handler traffic visible when chasing a pairing bug.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable event log to stderr |
//! | [`RecordingTracer`] | Full event recording for post-mortem analysis and tests |
//!
//! ```ignore
//! let mut ctx = ThreadDiagnosticContext::with_tracer(StderrTracer::with_limit(200));
//! ```

use crate::error::InternalFault;

/// Event emitted by the diagnostics core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagEvent {
    /// A dynamic frame was recorded.
    Record {
        /// Display name of the callee.
        name: String,
        /// Recorder depth after the append.
        depth: usize,
    },
    /// A native trace was attached to an error.
    Attach {
        /// Number of captured traces on the error after the append.
        traces: usize,
        /// Number of native frames in the new trace.
        frames: usize,
    },
    /// A handler body started.
    HandlerPush {
        /// Handling stack depth after the push.
        depth: usize,
    },
    /// A handler body finished.
    HandlerPop {
        /// Handling stack depth after the pop.
        depth: usize,
    },
    /// Unwinding an interrupt cleared the thread's pending interrupt.
    InterruptCleared,
    /// An internal-consistency fault was detected.
    Fault(InternalFault),
}

/// Hooks called at each diagnostics event.
///
/// Every method defaults to a no-op; implementations override only what they need.
pub trait DiagTracer: std::fmt::Debug {
    /// Called after a dynamic frame is appended to the recorder.
    #[inline(always)]
    fn on_record(&mut self, _name: &str, _depth: usize) {}

    /// Called after a captured trace is appended to an error.
    ///
    /// # Arguments
    /// * `traces` - Number of traces on the error after the append
    /// * `frames` - Native frames in the new trace
    #[inline(always)]
    fn on_attach(&mut self, _traces: usize, _frames: usize) {}

    /// Called when a handler body starts.
    #[inline(always)]
    fn on_handler_push(&mut self, _depth: usize) {}

    /// Called when a handler body finishes.
    #[inline(always)]
    fn on_handler_pop(&mut self, _depth: usize) {}

    /// Called when a pending interrupt is cleared by unwinding an interrupt error.
    #[inline(always)]
    fn on_interrupt_cleared(&mut self) {}

    /// Called for every internal-consistency fault before it is returned.
    #[inline(always)]
    fn on_fault(&mut self, _fault: &InternalFault) {}
}

// ============================================================================
// NoopTracer
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl DiagTracer for NoopTracer {}

// ============================================================================
// StderrTracer
// ============================================================================

/// Tracer that prints a human-readable event log to stderr.
///
/// Output format:
/// ```text
///   >>> RECORD main             depth=1
///   !!! ATTACH traces=1 frames=4
///   +++ HANDLER depth=1
///   --- HANDLER depth=0
/// ```
#[derive(Debug)]
pub struct StderrTracer {
    /// Maximum number of events to print. None = unlimited.
    limit: Option<usize>,
    count: usize,
    stopped: bool,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: None,
            count: 0,
            stopped: false,
        }
    }

    /// Creates a tracer that goes quiet after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
            stopped: false,
        }
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if self.stopped {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} events) ---");
            self.stopped = true;
        }
    }
}

impl Default for StderrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagTracer for StderrTracer {
    fn on_record(&mut self, name: &str, depth: usize) {
        self.emit(format_args!("  >>> RECORD {name:<16} depth={depth}"));
    }

    fn on_attach(&mut self, traces: usize, frames: usize) {
        self.emit(format_args!("  !!! ATTACH traces={traces} frames={frames}"));
    }

    fn on_handler_push(&mut self, depth: usize) {
        self.emit(format_args!("  +++ HANDLER depth={depth}"));
    }

    fn on_handler_pop(&mut self, depth: usize) {
        self.emit(format_args!("  --- HANDLER depth={depth}"));
    }

    fn on_interrupt_cleared(&mut self) {
        self.emit(format_args!("  ~~~ INTERRUPT CLEARED"));
    }

    fn on_fault(&mut self, fault: &InternalFault) {
        // faults are never rate limited
        eprintln!("  *** FAULT {fault}");
    }
}

// ============================================================================
// RecordingTracer
// ============================================================================

/// Tracer that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<DiagEvent>,
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[DiagEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<DiagEvent> {
        self.events
    }

    /// Returns the recorded faults, in order.
    pub fn faults(&self) -> impl Iterator<Item = &InternalFault> {
        self.events.iter().filter_map(|event| match event {
            DiagEvent::Fault(fault) => Some(fault),
            _ => None,
        })
    }

    fn push(&mut self, event: DiagEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl DiagTracer for RecordingTracer {
    fn on_record(&mut self, name: &str, depth: usize) {
        self.push(DiagEvent::Record {
            name: name.to_owned(),
            depth,
        });
    }

    fn on_attach(&mut self, traces: usize, frames: usize) {
        self.push(DiagEvent::Attach { traces, frames });
    }

    fn on_handler_push(&mut self, depth: usize) {
        self.push(DiagEvent::HandlerPush { depth });
    }

    fn on_handler_pop(&mut self, depth: usize) {
        self.push(DiagEvent::HandlerPop { depth });
    }

    fn on_interrupt_cleared(&mut self) {
        self.push(DiagEvent::InterruptCleared);
    }

    fn on_fault(&mut self, fault: &InternalFault) {
        self.push(DiagEvent::Fault(*fault));
    }
}
