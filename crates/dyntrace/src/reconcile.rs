//! Reconciliation of captured native traces with recorded dynamic frames.
//!
//! Native frames produced by the invocation trampoline say nothing about the
//! script routine they entered; the recorder logged that routine separately,
//! in call order. [`FrameReconciler`] walks an error's captured traces and
//! substitutes recorded frames for trampolines, drops runtime plumbing,
//! upgrades native frames whose identity matches the next recorded callee, and
//! finally drains any recorded frames no native frame accounted for.
//!
//! Default order is innermost first. With `reverse_order` set, traces and the
//! frames inside each trace are walked outermost first, and the recorded list
//! is consumed from its oldest entry.

use std::iter::FusedIterator;

use crate::{
    config::ReconcileConfig,
    error::{InternalFault, PartialTrace},
    frame::{CapturedTrace, DynamicFrame, FrameSource, LogicalFrame, NativeFrame, UNKNOWN_LINE},
    method::{MethodDesc, MethodRegistry},
    record::ErrorRecord,
};

/// Label used for native frames whose method id is not in the registry.
const UNKNOWN_METHOD: &str = "<unknown>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Traces,
    Drain,
    Done,
}

/// Single-pass iterator over the logical frames of one error.
///
/// Walking again requires a fresh reconciler. If a trampoline frame is reached
/// with no recorded frame left, iteration stops and [`fault`](Self::fault)
/// reports the underflow; frames yielded before that point remain valid.
#[derive(Debug)]
pub struct FrameReconciler<'a> {
    traces: &'a [CapturedTrace],
    dynamic: &'a [DynamicFrame],
    methods: &'a MethodRegistry,
    config: &'a ReconcileConfig,
    reverse: bool,
    phase: Phase,
    /// Position in walk order, not storage order.
    trace_pos: usize,
    frame_pos: usize,
    /// Number of dynamic frames consumed so far.
    taken: usize,
    fault: Option<InternalFault>,
}

impl<'a> FrameReconciler<'a> {
    #[must_use]
    pub fn new(
        record: &'a ErrorRecord,
        methods: &'a MethodRegistry,
        config: &'a ReconcileConfig,
        reverse_order: bool,
    ) -> Self {
        Self {
            traces: record.traces().unwrap_or_default(),
            dynamic: record.dynamic_frames(),
            methods,
            config,
            reverse: reverse_order,
            phase: Phase::Traces,
            trace_pos: 0,
            frame_pos: 0,
            taken: 0,
            fault: None,
        }
    }

    /// The fault that stopped the walk, if any.
    #[must_use]
    pub fn fault(&self) -> Option<InternalFault> {
        self.fault
    }

    /// Number of recorded frames not yet yielded.
    #[must_use]
    pub fn remaining_dynamic(&self) -> usize {
        self.dynamic.len() - self.taken
    }

    /// Drains the walk into a vector, or the best-effort prefix plus the fault.
    pub fn collect_frames(mut self) -> Result<Vec<LogicalFrame<'a>>, PartialTrace<'a>> {
        let frames: Vec<_> = self.by_ref().collect();
        match self.fault {
            Some(fault) => Err(PartialTrace { frames, fault }),
            None => Ok(frames),
        }
    }

    fn oriented(&self, pos: usize, len: usize) -> usize {
        if self.reverse { len - 1 - pos } else { pos }
    }

    /// Head of the working queue.
    ///
    /// The list is stored oldest call first, so innermost-first walks consume
    /// it from the back and outermost-first walks from the front.
    fn peek_dynamic(&self) -> Option<&'a DynamicFrame> {
        let remaining = self.remaining_dynamic();
        if remaining == 0 {
            return None;
        }
        let dynamic: &'a [DynamicFrame] = self.dynamic;
        let index = if self.reverse { self.taken } else { remaining - 1 };
        Some(&dynamic[index])
    }

    fn pop_dynamic(&mut self) -> Option<&'a DynamicFrame> {
        let frame = self.peek_dynamic()?;
        self.taken += 1;
        debug_assert!(self.taken <= self.dynamic.len());
        Some(frame)
    }

    fn fail(&mut self, fault: InternalFault) -> Option<LogicalFrame<'a>> {
        self.fault = Some(fault);
        self.phase = Phase::Done;
        None
    }

    /// Classifies one native frame; `None` means the frame is skipped.
    fn reconcile(&mut self, native: &'a NativeFrame, trace: usize, frame: usize) -> Option<Step<'a>> {
        let methods: &'a MethodRegistry = self.methods;
        let Some(desc) = methods.get(native.method) else {
            return Some(Step::Yield(unknown_frame(native)));
        };

        if self.config.is_trampoline(desc) {
            return Some(match self.pop_dynamic() {
                Some(dynamic) => Step::Yield(LogicalFrame::from_dynamic(dynamic)),
                None => Step::Fault(InternalFault::FrameQueueUnderflow {
                    trace,
                    frame,
                    recorded: self.dynamic.len(),
                }),
            });
        }

        if self.config.is_infrastructure(desc) {
            return None;
        }

        if let Some(head) = self.peek_dynamic()
            && head.callee() == native.method
        {
            self.taken += 1;
            return Some(Step::Yield(LogicalFrame::from_dynamic(head)));
        }

        Some(Step::Yield(self.plain_frame(native, desc)))
    }

    fn plain_frame(&self, native: &'a NativeFrame, desc: &'a MethodDesc) -> LogicalFrame<'a> {
        let (file, line) = match native.file.as_deref().filter(|file| !file.is_empty()) {
            Some(file) => (file, native.line.unwrap_or(UNKNOWN_LINE)),
            None => (desc.module.as_str(), UNKNOWN_LINE),
        };
        LogicalFrame {
            name: self.config.display_name(&desc.name),
            file,
            line,
            source: FrameSource::Native,
        }
    }
}

enum Step<'a> {
    Yield(LogicalFrame<'a>),
    Fault(InternalFault),
}

fn unknown_frame(native: &NativeFrame) -> LogicalFrame<'_> {
    LogicalFrame {
        name: UNKNOWN_METHOD,
        file: native.file.as_deref().unwrap_or(UNKNOWN_METHOD),
        line: native.line.unwrap_or(UNKNOWN_LINE),
        source: FrameSource::Native,
    }
}

impl<'a> Iterator for FrameReconciler<'a> {
    type Item = LogicalFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let traces = self.traces;
        loop {
            match self.phase {
                Phase::Traces => {
                    if self.trace_pos >= traces.len() {
                        self.phase = Phase::Drain;
                        continue;
                    }
                    let trace = &traces[self.oriented(self.trace_pos, traces.len())];
                    if self.frame_pos >= trace.len() {
                        self.trace_pos += 1;
                        self.frame_pos = 0;
                        continue;
                    }
                    let native = &trace.frames()[self.oriented(self.frame_pos, trace.len())];
                    let (trace_pos, frame_pos) = (self.trace_pos, self.frame_pos);
                    self.frame_pos += 1;
                    match self.reconcile(native, trace_pos, frame_pos) {
                        Some(Step::Yield(frame)) => return Some(frame),
                        Some(Step::Fault(fault)) => return self.fail(fault),
                        None => {}
                    }
                }
                Phase::Drain => {
                    if let Some(dynamic) = self.pop_dynamic() {
                        return Some(LogicalFrame::from_dynamic(dynamic));
                    }
                    self.phase = Phase::Done;
                }
                Phase::Done => return None,
            }
        }
    }
}

impl FusedIterator for FrameReconciler<'_> {}

/// Reconciles an error's frames in the requested order.
pub fn walk<'a>(
    record: &'a ErrorRecord,
    methods: &'a MethodRegistry,
    config: &'a ReconcileConfig,
    reverse_order: bool,
) -> Result<Vec<LogicalFrame<'a>>, PartialTrace<'a>> {
    FrameReconciler::new(record, methods, config, reverse_order).collect_frames()
}

/// Reconciles an error's frames innermost first.
pub fn walk_default<'a>(
    record: &'a ErrorRecord,
    methods: &'a MethodRegistry,
    config: &'a ReconcileConfig,
) -> Result<Vec<LogicalFrame<'a>>, PartialTrace<'a>> {
    walk(record, methods, config, false)
}
