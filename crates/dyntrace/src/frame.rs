//! Frame data carried by errors and produced by reconciliation.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::method::MethodId;

/// Line number used when the source line is not known.
pub const UNKNOWN_LINE: u32 = 0;

/// Opaque handle to the execution context a dynamic call ran in.
///
/// Kept for diagnostics only: holding one never keeps the context alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub u32);

/// One recorded dynamic invocation, logged before control enters the callee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFrame {
    context: Option<ContextId>,
    callee: MethodId,
    name: String,
    file: String,
    line: u32,
}

impl DynamicFrame {
    pub fn new(
        context: Option<ContextId>,
        callee: MethodId,
        name: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            context,
            callee,
            name: name.into(),
            file: file.into(),
            line,
        }
    }

    #[must_use]
    pub fn context(&self) -> Option<ContextId> {
        self.context
    }

    /// Identity of the invoked compiled routine.
    #[must_use]
    pub fn callee(&self) -> MethodId {
        self.callee
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// One frame reported by the host's native unwinder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeFrame {
    pub method: MethodId,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl NativeFrame {
    /// A frame with no source information.
    #[must_use]
    pub fn bare(method: MethodId) -> Self {
        Self {
            method,
            file: None,
            line: None,
        }
    }

    pub fn with_source(method: MethodId, file: impl Into<String>, line: u32) -> Self {
        Self {
            method,
            file: Some(file.into()),
            line: Some(line),
        }
    }
}

/// Snapshot of the native call stack at one throw or re-raise, innermost frame first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedTrace {
    frames: Vec<NativeFrame>,
}

impl CapturedTrace {
    #[must_use]
    pub fn new(frames: Vec<NativeFrame>) -> Self {
        Self { frames }
    }

    #[must_use]
    pub fn frames(&self) -> &[NativeFrame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FromIterator<NativeFrame> for CapturedTrace {
    fn from_iter<I: IntoIterator<Item = NativeFrame>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Where a [`LogicalFrame`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
pub enum FrameSource {
    /// A recorded dynamic frame, substituted for a trampoline or matched by identity.
    Dynamic,
    /// Synthesized from a plain native frame.
    Native,
}

/// One entry of a reconciled trace.
///
/// Borrows its strings from the error record and the method registry, so a
/// walk allocates nothing per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogicalFrame<'a> {
    pub name: &'a str,
    pub file: &'a str,
    pub line: u32,
    pub source: FrameSource,
}

impl<'a> LogicalFrame<'a> {
    pub(crate) fn from_dynamic(frame: &'a DynamicFrame) -> Self {
        Self {
            name: frame.name(),
            file: frame.file(),
            line: frame.line(),
            source: FrameSource::Dynamic,
        }
    }

    /// Compares display name, file and line, ignoring [`FrameSource`].
    #[must_use]
    pub fn same_location(&self, name: &str, file: &str, line: u32) -> bool {
        self.name == name && self.file == file && self.line == line
    }
}
