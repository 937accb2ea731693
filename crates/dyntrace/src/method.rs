//! Stable method identity handles.
//!
//! Both the frame recorder and the native unwinder refer to compiled routines
//! through [`MethodId`]. Ids are minted by a [`MethodRegistry`] and compared by
//! value, which amounts to descriptor identity: registering two routines with
//! identical names yields two different ids.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Index of a registered method descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(u32);

impl MethodId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Description of one routine as the native unwinder sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDesc {
    /// Method name as emitted by the compiler, including any `$` disambiguation suffix.
    pub name: String,
    /// Full path of the owning unit (declaring type), if the routine has one.
    pub owner: Option<String>,
    /// Identity of the module the routine was loaded from.
    pub module: String,
}

impl MethodDesc {
    pub fn new(name: impl Into<String>, owner: Option<&str>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.map(str::to_owned),
            module: module.into(),
        }
    }
}

/// Table of method descriptors, indexed by [`MethodId`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MethodRegistry {
    methods: Vec<MethodDesc>,
    /// Latest id registered for each `(owner, name)` symbol.
    by_symbol: AHashMap<(Option<String>, String), MethodId>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor and returns a fresh id for it.
    ///
    /// Never deduplicates; each call stands for a distinct compiled routine.
    pub fn register(&mut self, desc: MethodDesc) -> MethodId {
        let id = MethodId(u32::try_from(self.methods.len()).expect("method registry exceeds u32::MAX entries"));
        self.by_symbol.insert((desc.owner.clone(), desc.name.clone()), id);
        self.methods.push(desc);
        id
    }

    #[must_use]
    pub fn get(&self, id: MethodId) -> Option<&MethodDesc> {
        self.methods.get(id.index())
    }

    /// Returns the descriptor for an id minted by this registry.
    ///
    /// # Panics
    /// Panics if `id` came from a different registry.
    #[must_use]
    pub fn desc(&self, id: MethodId) -> &MethodDesc {
        &self.methods[id.index()]
    }

    /// Finds the most recently registered routine for a symbol.
    #[must_use]
    pub fn lookup(&self, owner: Option<&str>, name: &str) -> Option<MethodId> {
        self.by_symbol
            .get(&(owner.map(str::to_owned), name.to_owned()))
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
