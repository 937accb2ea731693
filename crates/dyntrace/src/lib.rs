#![doc = include_str!("../../../README.md")]

mod capture;
mod config;
mod context;
mod error;
mod frame;
mod handler;
mod method;
mod record;
mod recorder;
pub mod reconcile;
pub mod tracer;

pub use crate::{
    capture::{all_traces, attach, link_dynamic_frames},
    config::{
        DEFAULT_INFRASTRUCTURE_PREFIXES, DEFAULT_OVERLOAD_DELIMITER, DEFAULT_STUB_PREFIX, ReconcileConfig,
        TrampolineMarker,
    },
    context::ThreadDiagnosticContext,
    error::{DiagError, DiagResult, InternalFault, PartialTrace},
    frame::{CapturedTrace, ContextId, DynamicFrame, FrameSource, LogicalFrame, NativeFrame, UNKNOWN_LINE},
    handler::{HandlerStack, InterruptHandle, Popped},
    method::{MethodDesc, MethodId, MethodRegistry},
    record::{AbortReason, ErrorClass, ErrorRecord, ErrorRef, FrameList},
    reconcile::{FrameReconciler, walk, walk_default},
    recorder::FrameRecorder,
    tracer::{DiagEvent, DiagTracer, NoopTracer, RecordingTracer, StderrTracer},
};
