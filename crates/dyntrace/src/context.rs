//! Per-thread diagnostics state, owned by whoever owns the thread.
//!
//! A [`ThreadDiagnosticContext`] bundles the frame recorder, the handler and
//! caught-error stacks, the pending-interrupt flag and a tracer. The scheduler
//! creates one per execution thread and passes it by `&mut` to every runtime
//! entry point that raises, catches or records; nothing here is global and
//! nothing is shared across threads except the [`InterruptHandle`].

use crate::{
    capture,
    config::ReconcileConfig,
    error::{DiagError, DiagResult, InternalFault, PartialTrace},
    frame::{CapturedTrace, ContextId, LogicalFrame, NativeFrame},
    handler::{HandlerStack, InterruptHandle},
    method::{MethodId, MethodRegistry},
    record::{ErrorRecord, ErrorRef, FrameList},
    recorder::FrameRecorder,
    reconcile::FrameReconciler,
    tracer::{DiagTracer, NoopTracer},
};

#[derive(Debug, Default)]
pub struct ThreadDiagnosticContext<Tr: DiagTracer = NoopTracer> {
    recorder: FrameRecorder,
    handlers: HandlerStack,
    interrupt: InterruptHandle,
    tracer: Tr,
}

impl ThreadDiagnosticContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<Tr: DiagTracer> ThreadDiagnosticContext<Tr> {
    pub fn with_tracer(tracer: Tr) -> Self {
        Self {
            recorder: FrameRecorder::new(),
            handlers: HandlerStack::new(),
            interrupt: InterruptHandle::new(),
            tracer,
        }
    }

    // ------------------------------------------------------------------
    // Frame recording
    // ------------------------------------------------------------------

    /// Logs a dynamic invocation. Called immediately before control enters `callee`.
    pub fn record(&mut self, context: Option<ContextId>, callee: MethodId, name: &str, file: &str, line: u32) {
        self.recorder.record(context, callee, name, file, line);
        self.tracer.on_record(name, self.recorder.depth());
    }

    /// Shares the current recorder log without clearing it.
    #[must_use]
    pub fn snapshot_frames(&self) -> FrameList {
        self.recorder.snapshot()
    }

    /// Takes the recorder log, leaving it empty.
    pub fn snapshot_and_clear(&mut self) -> FrameList {
        self.recorder.snapshot_and_clear()
    }

    /// Restores a saved log and returns the one it replaced.
    pub fn replace_frames(&mut self, frames: FrameList) -> FrameList {
        self.recorder.replace(frames)
    }

    #[must_use]
    pub fn recorder(&self) -> &FrameRecorder {
        &self.recorder
    }

    /// Runs a dynamic call body, dropping any frames it recorded once it returns.
    ///
    /// Frames survive in errors that captured them; only the live log shrinks.
    pub fn with_dynamic_call<R>(
        &mut self,
        context: Option<ContextId>,
        callee: MethodId,
        name: &str,
        file: &str,
        line: u32,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let depth = self.recorder.depth();
        self.record(context, callee, name, file, line);
        let result = body(self);
        self.recorder.truncate(depth);
        result
    }

    // ------------------------------------------------------------------
    // Trace capture
    // ------------------------------------------------------------------

    /// Attaches one native trace to `error`. Call exactly once per throw or re-raise.
    pub fn attach(&mut self, error: &ErrorRef, native_frames: impl IntoIterator<Item = NativeFrame>) -> ErrorRef {
        let before = error.borrow().trace_count();
        let traces = capture::attach(error, native_frames, &self.recorder);
        debug_assert_eq!(traces, before + 1);
        let frames = error.borrow().traces().and_then(<[CapturedTrace]>::last).map_or(0, CapturedTrace::len);
        self.tracer.on_attach(traces, frames);
        error.clone()
    }

    // ------------------------------------------------------------------
    // Handler stacks
    // ------------------------------------------------------------------

    /// Starts a handler body for `error` and links the recorder's frames to it.
    pub fn push(&mut self, error: ErrorRef) {
        capture::link_dynamic_frames(&error, &self.recorder);
        let depth = self.handlers.push(error);
        self.tracer.on_handler_push(depth);
    }

    /// Ends the innermost handler body.
    ///
    /// Clears the pending interrupt when the popped error is an interrupt abort.
    pub fn pop(&mut self) -> DiagResult<ErrorRef> {
        match self.handlers.pop(&self.interrupt) {
            Ok(popped) => {
                if popped.interrupt_cleared {
                    self.tracer.on_interrupt_cleared();
                }
                self.tracer.on_handler_pop(self.handlers.depth());
                Ok(popped.error)
            }
            Err(fault) => Err(self.report(fault)),
        }
    }

    /// Runs a handler body with `error` pushed, popping on every return path.
    ///
    /// A body that itself raises returns its error as `Ok(Err(..))`; the outer
    /// `Err` is reserved for a pop fault.
    pub fn with_handler<R>(&mut self, error: ErrorRef, body: impl FnOnce(&mut Self) -> R) -> DiagResult<R> {
        self.push(error);
        let result = body(self);
        self.pop()?;
        Ok(result)
    }

    /// Records that `error` was caught, making it the current error.
    pub fn record_caught(&mut self, error: ErrorRef) {
        self.handlers.record_caught(error);
    }

    /// Forgets the most recently caught error.
    pub fn release_caught(&mut self) -> DiagResult<ErrorRef> {
        self.handlers.release_caught().map_err(|fault| self.report(fault))
    }

    /// The most recently caught error, for bare re-raise and introspection.
    pub fn current(&self) -> DiagResult<ErrorRef> {
        self.handlers.current().cloned()
    }

    /// Errors whose handler bodies are active, outermost first.
    #[must_use]
    pub fn active_errors(&self) -> &[ErrorRef] {
        self.handlers.active()
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerStack {
        &self.handlers
    }

    // ------------------------------------------------------------------
    // Interrupts
    // ------------------------------------------------------------------

    /// A handle other threads can use to request an interrupt on this thread.
    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    #[must_use]
    pub fn interrupt_pending(&self) -> bool {
        self.interrupt.is_pending()
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Reconciles `record`, reporting any fault to the tracer.
    pub fn walk<'a>(
        &mut self,
        record: &'a ErrorRecord,
        methods: &'a MethodRegistry,
        config: &'a ReconcileConfig,
        reverse_order: bool,
    ) -> Result<Vec<LogicalFrame<'a>>, PartialTrace<'a>> {
        FrameReconciler::new(record, methods, config, reverse_order)
            .collect_frames()
            .inspect_err(|partial| self.tracer.on_fault(&partial.fault))
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }

    pub fn into_tracer(self) -> Tr {
        self.tracer
    }

    fn report(&mut self, fault: InternalFault) -> DiagError {
        self.tracer.on_fault(&fault);
        DiagError::Internal(fault)
    }
}
