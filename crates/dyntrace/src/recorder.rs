//! Per-thread log of dynamic invocations.

use std::sync::Arc;

use crate::{
    frame::{ContextId, DynamicFrame},
    method::MethodId,
    record::FrameList,
};

/// Append log of [`DynamicFrame`]s, one per dynamic invocation, outermost call first.
///
/// Snapshots share the underlying list. The next [`record`](Self::record) after
/// a snapshot copies the list before appending, so frames already handed to an
/// error are never mutated by later calls on the same thread.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    frames: FrameList,
}

impl FrameRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame for a call that is about to transfer into `callee`.
    pub fn record(&mut self, context: Option<ContextId>, callee: MethodId, name: &str, file: &str, line: u32) {
        Arc::make_mut(&mut self.frames).push(DynamicFrame::new(context, callee, name, file, line));
    }

    /// Shares the current log without clearing it.
    #[must_use]
    pub fn snapshot(&self) -> FrameList {
        Arc::clone(&self.frames)
    }

    /// Takes the current log, leaving the recorder empty.
    pub fn snapshot_and_clear(&mut self) -> FrameList {
        std::mem::take(&mut self.frames)
    }

    /// Swaps in a previously saved log and returns the one it replaces.
    pub fn replace(&mut self, frames: FrameList) -> FrameList {
        std::mem::replace(&mut self.frames, frames)
    }

    /// Number of frames currently recorded.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drops frames recorded after the log was `depth` entries deep.
    ///
    /// Called when a dynamic call returns normally.
    pub fn truncate(&mut self, depth: usize) {
        if depth < self.frames.len() {
            Arc::make_mut(&mut self.frames).truncate(depth);
        }
    }

    #[must_use]
    pub fn frames(&self) -> &[DynamicFrame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{MethodDesc, MethodRegistry};

    fn callee() -> MethodId {
        MethodRegistry::new().register(MethodDesc::new("f", None, "script"))
    }

    #[test]
    fn snapshot_is_not_mutated_by_later_records() {
        let f = callee();
        let mut recorder = FrameRecorder::new();
        recorder.record(None, f, "outer", "s.rb", 1);
        let snap = recorder.snapshot();
        recorder.record(None, f, "inner", "s.rb", 2);

        assert_eq!(snap.len(), 1);
        assert_eq!(recorder.depth(), 2);
    }

    #[test]
    fn snapshot_and_clear_empties_the_log() {
        let f = callee();
        let mut recorder = FrameRecorder::new();
        recorder.record(Some(ContextId(7)), f, "main", "s.rb", 3);
        let taken = recorder.snapshot_and_clear();

        assert!(recorder.is_empty());
        assert_eq!(taken[0].context(), Some(ContextId(7)));
        assert_eq!(taken[0].line(), 3);
    }

    #[test]
    fn truncate_and_replace_restore_saved_depths() {
        let f = callee();
        let mut recorder = FrameRecorder::new();
        recorder.record(None, f, "a", "s.rb", 1);
        let saved = recorder.snapshot();
        let depth = recorder.depth();
        recorder.record(None, f, "b", "s.rb", 2);
        recorder.record(None, f, "c", "s.rb", 3);

        recorder.truncate(depth);
        assert_eq!(recorder.frames().len(), 1);

        recorder.record(None, f, "d", "s.rb", 4);
        let previous = recorder.replace(saved);
        assert_eq!(previous.len(), 2);
        assert_eq!(recorder.frames()[0].name(), "a");
        assert_eq!(recorder.depth(), 1);
    }
}
