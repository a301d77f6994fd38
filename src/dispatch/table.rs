//! Behaviour table
//!
//! Maps every dispatchable behaviour name to a tagged handler. Restriction
//! toggles never reach the table; they are recognised by their param first.

use std::collections::HashMap;

/// Information queries; the param is the reply channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryVerb {
    Version,
    VersionNew,
    VersionNum,
    GetGroup,
    GetSitId,
    /// `all` covers every issuer's rules, not just the caller's
    GetStatus { all: bool },
    GetOutfit,
    GetAttach,
    GetInv,
    GetInvWorn,
    FindFolder,
    FindFolders,
    /// `all` lists every matching folder instead of the first
    GetPath { all: bool },
}

/// How attached objects and worn layers treat what is already there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    Replace,
    Over,
    /// Add over when the folder name starts with `+`, replace otherwise
    OverOrReplace,
}

/// Side-effecting verbs; executed only with the force param
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVerb {
    Sit,
    Unsit,
    SetRot,
    TpTo,
    SetGroup,
    /// Attach a folder's contents, addressed by path
    Attach { recursive: bool, mode: AttachMode },
    /// Attach the folder holding a worn item
    AttachThis { recursive: bool },
    Detach,
    RemAttach,
    DetachAll,
    /// Detach the folder holding a worn item
    DetachThis { recursive: bool },
    DetachMe,
    RemOutfit,
}

/// What a behaviour name dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Query(QueryVerb),
    Action(ActionVerb),
}

/// Lookup table from behaviour name to handler
#[derive(Debug, Clone)]
pub struct BehaviourTable {
    handlers: HashMap<&'static str, Handler>,
}

impl BehaviourTable {
    /// Create an empty table
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Table holding the full vocabulary
    pub fn standard() -> Self {
        use ActionVerb as A;
        use Handler::{Action, Query};
        use QueryVerb as Q;

        let mut table = Self::empty();

        table.register("version", Query(Q::Version));
        table.register("versionnew", Query(Q::VersionNew));
        table.register("versionnum", Query(Q::VersionNum));
        table.register("getgroup", Query(Q::GetGroup));
        table.register("getsitid", Query(Q::GetSitId));
        table.register("getstatus", Query(Q::GetStatus { all: false }));
        table.register("getstatusall", Query(Q::GetStatus { all: true }));
        table.register("getoutfit", Query(Q::GetOutfit));
        table.register("getattach", Query(Q::GetAttach));
        table.register("getinv", Query(Q::GetInv));
        table.register("getinvworn", Query(Q::GetInvWorn));
        table.register("findfolder", Query(Q::FindFolder));
        table.register("findfolders", Query(Q::FindFolders));
        table.register("getpath", Query(Q::GetPath { all: false }));
        table.register("getpathnew", Query(Q::GetPath { all: true }));

        table.register("sit", Action(A::Sit));
        table.register("unsit", Action(A::Unsit));
        table.register("setrot", Action(A::SetRot));
        table.register("tpto", Action(A::TpTo));
        table.register("setgroup", Action(A::SetGroup));

        let attach = |recursive, mode| Action(A::Attach { recursive, mode });
        table.register("attach", attach(false, AttachMode::Replace));
        table.register("attachover", attach(false, AttachMode::Over));
        table.register("attachoverorreplace", attach(false, AttachMode::OverOrReplace));
        table.register("attachall", attach(true, AttachMode::Replace));
        table.register("attachallover", attach(true, AttachMode::Over));
        table.register("attachalloverorreplace", attach(true, AttachMode::OverOrReplace));
        table.register("attachthis", Action(A::AttachThis { recursive: false }));
        table.register("attachallthis", Action(A::AttachThis { recursive: true }));

        table.register("detach", Action(A::Detach));
        table.register("remattach", Action(A::RemAttach));
        table.register("detachall", Action(A::DetachAll));
        table.register("detachthis", Action(A::DetachThis { recursive: false }));
        table.register("detachallthis", Action(A::DetachThis { recursive: true }));
        table.register("detachme", Action(A::DetachMe));
        table.register("remoutfit", Action(A::RemOutfit));

        tracing::debug!("[BehaviourTable] Registered {} behaviours", table.len());
        table
    }

    /// Register a handler, replacing any previous one for the name
    pub fn register(&mut self, name: &'static str, handler: Handler) {
        self.handlers.insert(name, handler);
    }

    /// Handler for a lower-cased behaviour name
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for BehaviourTable {
    fn default() -> Self {
        Self::standard()
    }
}
