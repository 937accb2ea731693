use serde::{Deserialize, Serialize};

use crate::method::MethodDesc;

/// Prefix of compiler-generated stub methods that never appear in reports.
pub const DEFAULT_STUB_PREFIX: &str = "_stub_";

/// Character that starts the disambiguation suffix on recompiled or overloaded script methods.
pub const DEFAULT_OVERLOAD_DELIMITER: char = '$';

/// Owner prefixes of the runtime's own plumbing: reflection helpers, runtime
/// internals and the dynamic-dispatch/binding layer.
pub const DEFAULT_INFRASTRUCTURE_PREFIXES: &[&str] = &["Host.Reflection.", "Host.Runtime", "Dyn.Runtime", "Dyn.Binding"];

/// Identity of the generic entry point every compiled script routine is invoked through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrampolineMarker {
    pub owner: String,
    pub method: String,
}

impl TrampolineMarker {
    pub fn new(owner: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            method: method.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, desc: &MethodDesc) -> bool {
        desc.owner.as_deref() == Some(self.owner.as_str()) && desc.name == self.method
    }
}

impl Default for TrampolineMarker {
    fn default() -> Self {
        Self::new("Dyn.Lambda", "Invoke")
    }
}

/// Frame classification rules used by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Native frames matching this marker are replaced by recorded dynamic frames.
    pub trampoline: TrampolineMarker,
    /// Frames whose owner starts with any of these are dropped.
    pub infrastructure_prefixes: Vec<String>,
    /// Frames whose method name starts with this are dropped.
    pub stub_prefix: String,
    /// Method names are cut at the first occurrence of this character.
    pub overload_delimiter: char,
}

impl ReconcileConfig {
    /// Creates a config with the runtime's default marker, prefixes and delimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trampoline(mut self, trampoline: TrampolineMarker) -> Self {
        self.trampoline = trampoline;
        self
    }

    #[must_use]
    pub fn with_infrastructure_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.infrastructure_prefixes.push(prefix.into());
        self
    }

    #[must_use]
    pub fn is_trampoline(&self, desc: &MethodDesc) -> bool {
        self.trampoline.matches(desc)
    }

    /// Returns true for runtime plumbing and generated stubs.
    #[must_use]
    pub fn is_infrastructure(&self, desc: &MethodDesc) -> bool {
        let owned_by_runtime = desc.owner.as_deref().is_some_and(|owner| {
            self.infrastructure_prefixes
                .iter()
                .any(|prefix| owner.starts_with(prefix.as_str()))
        });
        owned_by_runtime || desc.name.starts_with(self.stub_prefix.as_str())
    }

    /// Strips the disambiguation suffix from a compiled method name.
    #[must_use]
    pub fn display_name<'a>(&self, method_name: &'a str) -> &'a str {
        match method_name.find(self.overload_delimiter) {
            Some(end) => &method_name[..end],
            None => method_name,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            trampoline: TrampolineMarker::default(),
            infrastructure_prefixes: DEFAULT_INFRASTRUCTURE_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_owned())
                .collect(),
            stub_prefix: DEFAULT_STUB_PREFIX.to_owned(),
            overload_delimiter: DEFAULT_OVERLOAD_DELIMITER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_cuts_at_delimiter() {
        let config = ReconcileConfig::new();
        assert_eq!(config.display_name("each$12"), "each");
        assert_eq!(config.display_name("each"), "each");
        assert_eq!(config.display_name("$anon"), "");
    }

    #[test]
    fn infrastructure_matches_owner_prefix_or_stub_name() {
        let config = ReconcileConfig::new().with_infrastructure_prefix("Vendor.Glue");
        assert!(config.is_infrastructure(&MethodDesc::new("Call", Some("Dyn.Binding.Site"), "rt")));
        assert!(config.is_infrastructure(&MethodDesc::new("Go", Some("Vendor.Glue.X"), "rt")));
        assert!(config.is_infrastructure(&MethodDesc::new("_stub_$3", None, "rt")));
        assert!(!config.is_infrastructure(&MethodDesc::new("main", Some("App.Program"), "app")));
    }

    #[test]
    fn trampoline_requires_owner_and_name() {
        let config = ReconcileConfig::new();
        assert!(config.is_trampoline(&MethodDesc::new("Invoke", Some("Dyn.Lambda"), "rt")));
        assert!(!config.is_trampoline(&MethodDesc::new("Invoke", None, "rt")));
        assert!(!config.is_trampoline(&MethodDesc::new("Compile", Some("Dyn.Lambda"), "rt")));
    }
}
