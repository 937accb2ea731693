//! Attaching native traces and recorded frames to errors at raise time.
//!
//! Every throw and every re-raise of the same logical error appends one
//! [`CapturedTrace`]; nothing already attached is removed or reordered.

use crate::{
    frame::{CapturedTrace, NativeFrame},
    record::{ErrorRecord, ErrorRef},
    recorder::FrameRecorder,
};

/// Appends a trace built from `native_frames` and links the recorder's frames.
///
/// Must be called exactly once per raise event; a second call for the same
/// event appends a duplicate trace. Returns the number of traces now attached.
pub fn attach(error: &ErrorRef, native_frames: impl IntoIterator<Item = NativeFrame>, recorder: &FrameRecorder) -> usize {
    let trace: CapturedTrace = native_frames.into_iter().collect();
    link_dynamic_frames(error, recorder);
    error.update(|record| record.push_trace(trace))
}

/// Links the recorder's current log to `error` unless it already has one.
///
/// The first link happens at the innermost raise point, where the log holds
/// every active dynamic call. A re-raise from an outer handler sees a shorter
/// log, so the first snapshot is kept. Returns true if a list was linked.
pub fn link_dynamic_frames(error: &ErrorRef, recorder: &FrameRecorder) -> bool {
    error.update(|record| {
        if record.has_dynamic_frames() || recorder.is_empty() {
            return false;
        }
        record.set_dynamic_frames(recorder.snapshot());
        true
    })
}

/// All traces attached to an error, oldest first, or `None` if it was never raised.
#[must_use]
pub fn all_traces(record: &ErrorRecord) -> Option<&[CapturedTrace]> {
    record.traces()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        method::{MethodDesc, MethodRegistry},
        record::ErrorClass,
    };

    #[test]
    fn attach_creates_history_on_first_raise() {
        let mut methods = MethodRegistry::new();
        let a = methods.register(MethodDesc::new("a", Some("App"), "app"));
        let error = ErrorRef::new(ErrorClass::Host, None);
        let recorder = FrameRecorder::new();

        assert!(all_traces(&error.borrow()).is_none());
        assert_eq!(attach(&error, [NativeFrame::bare(a)], &recorder), 1);
        assert_eq!(all_traces(&error.borrow()).map(<[_]>::len), Some(1));
        assert!(!error.borrow().has_dynamic_frames());
    }

    #[test]
    fn reraise_keeps_first_frame_snapshot() {
        let mut methods = MethodRegistry::new();
        let f = methods.register(MethodDesc::new("f", None, "script"));
        let g = methods.register(MethodDesc::new("g", None, "script"));
        let error = ErrorRef::new(ErrorClass::Script, None);
        let mut recorder = FrameRecorder::new();
        recorder.record(None, g, "g", "s.rb", 1);
        recorder.record(None, f, "f", "s.rb", 5);

        attach(&error, Vec::new(), &recorder);
        recorder.truncate(1);
        attach(&error, Vec::new(), &recorder);

        let record = error.borrow();
        assert_eq!(record.trace_count(), 2);
        assert_eq!(record.dynamic_frames().len(), 2);
        assert_eq!(record.dynamic_frames()[1].name(), "f");
    }
}
