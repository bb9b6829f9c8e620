//! Function signatures and the run-wide prototype table.
//!
//! A C translation unit may not carry two conflicting declarations of the
//! same function, so the header keeps exactly one prototype per name: the
//! first one recorded wins and later ones are dropped.

use hashbrown::HashSet;
use std::fmt;

/// Signature of an emitted or dispatched C function. Every generated
/// function returns the `int` status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnSig {
    pub name: String,
    pub params: String,
}

impl FnSig {
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
        }
    }
}

impl fmt::Display for FnSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "int {}({})", self.name, self.params)
    }
}

/// Deduplicated forward declarations in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct PrototypeSet {
    seen: HashSet<String>,
    entries: Vec<FnSig>,
    dropped: usize,
}

impl PrototypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `sig`; returns false when the name was already declared.
    pub fn add(&mut self, sig: FnSig) -> bool {
        if self.seen.contains(&sig.name) {
            self.dropped += 1;
            return false;
        }
        self.seen.insert(sig.name.clone());
        self.entries.push(sig);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn get(&self, name: &str) -> Option<&FnSig> {
        self.entries.iter().find(|sig| sig.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FnSig> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of declarations dropped as duplicates.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_declaration_wins() {
        let mut set = PrototypeSet::new();
        assert!(set.add(FnSig::new("MPIR_Bcast_impl", "void *buffer")));
        assert!(!set.add(FnSig::new("MPIR_Bcast_impl", "int other")));
        assert!(set.add(FnSig::new("MPIR_Bcast", "void *buffer")));

        assert_eq!(set.len(), 2);
        assert_eq!(set.dropped(), 1);
        assert_eq!(
            set.get("MPIR_Bcast_impl").map(|s| s.params.as_str()),
            Some("void *buffer")
        );
        let names: Vec<_> = set.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["MPIR_Bcast_impl", "MPIR_Bcast"]);
    }

    #[test]
    fn test_signature_display() {
        let sig = FnSig::new("MPIR_Barrier", "MPIR_Comm * comm_ptr");
        assert_eq!(sig.to_string(), "int MPIR_Barrier(MPIR_Comm * comm_ptr)");
    }
}
