// This module adapts the external operation-signature database for the generator. Each
// collective operation is described by an ordered list of parameters carrying a name, a
// semantic kind tag and the C type used in the public binding. The generator never edits
// signatures; it only looks them up by operation name through the SignatureRegistry trait.
// The concrete Registry is loaded from a line-oriented text format, and a built-in copy with
// the standard signatures of the collective operations is embedded in the crate.

//! Operation signature registry.

mod parser;

use crate::core::{GenError, GenResult};
use hashbrown::HashMap;
use std::fmt;

pub use parser::parse_registry;

const BUILTIN_SIGNATURES: &str = include_str!("../../data/coll_signatures.txt");

/// Semantic kind of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Rebound to the communicator object pointer in emitted code.
    Communicator,
    /// Count or displacement whose `int` is widened to `MPI_Aint`.
    PolySize(String),
    Buffer,
    Plain(String),
}

impl ParamKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "COMMUNICATOR" => ParamKind::Communicator,
            "BUFFER" => ParamKind::Buffer,
            t if t.starts_with("POLY") => ParamKind::PolySize(t.to_string()),
            t => ParamKind::Plain(t.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ParamKind::Communicator => "COMMUNICATOR",
            ParamKind::Buffer => "BUFFER",
            ParamKind::PolySize(t) | ParamKind::Plain(t) => t,
        }
    }

    pub fn is_poly(&self) -> bool {
        matches!(self, ParamKind::PolySize(_))
    }
}

/// One parameter of an operation signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    /// C type; a trailing `[]` marks an array parameter.
    pub c_type: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParamKind, c_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            c_type: c_type.into(),
        }
    }

    /// C declaration of the parameter as in the public binding.
    pub fn declaration(&self) -> String {
        let ty = self.c_type.trim();
        let (base, array) = match ty.strip_suffix("[]") {
            Some(base) => (base.trim_end(), true),
            None => (ty, false),
        };
        let mut decl = if base.ends_with('*') {
            format!("{}{}", base, self.name)
        } else {
            format!("{} {}", base, self.name)
        };
        if array {
            decl.push_str("[]");
        }
        decl
    }
}

/// Ordered parameter list of one collective operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSignature {
    pub name: String,
    pub parameters: Vec<Parameter>,
}

impl OperationSignature {
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decls: Vec<_> = self.parameters.iter().map(Parameter::declaration).collect();
        write!(f, "{}({})", self.name, decls.join(", "))
    }
}

/// Read-only lookup of operation signatures by name.
pub trait SignatureRegistry {
    fn lookup(&self, name: &str) -> Option<&OperationSignature>;

    fn signature(&self, name: &str) -> GenResult<&OperationSignature> {
        self.lookup(name).ok_or_else(|| GenError::UnknownOperation {
            name: name.to_string(),
        })
    }
}

/// Signature registry keyed by operation name.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    signatures: HashMap<String, OperationSignature>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from its text form.
    pub fn parse(text: &str) -> GenResult<Self> {
        parse_registry(text)
    }

    /// Standard signatures of the collective operations.
    pub fn builtin() -> GenResult<Self> {
        parse_registry(BUILTIN_SIGNATURES)
    }

    /// Insert a signature; returns the replaced one, if any.
    pub fn insert(&mut self, sig: OperationSignature) -> Option<OperationSignature> {
        self.signatures.insert(sig.name.clone(), sig)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl SignatureRegistry for Registry {
    fn lookup(&self, name: &str) -> Option<&OperationSignature> {
        self.signatures.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ParamKind::from_tag("COMMUNICATOR"), ParamKind::Communicator);
        assert!(ParamKind::from_tag("POLYXFER_NUM_ELEM_NNI").is_poly());
        assert!(!ParamKind::from_tag("RANK").is_poly());
        assert_eq!(ParamKind::from_tag("DATATYPE").tag(), "DATATYPE");
    }

    #[test]
    fn test_parameter_declarations() {
        let buf = Parameter::new("buffer", ParamKind::Buffer, "void *");
        assert_eq!(buf.declaration(), "void *buffer");

        let counts = Parameter::new(
            "recvcounts",
            ParamKind::from_tag("POLYXFER_NUM_ELEM_NNI"),
            "const int []",
        );
        assert_eq!(counts.declaration(), "const int recvcounts[]");

        let dt = Parameter::new("datatype", ParamKind::from_tag("DATATYPE"), "MPI_Datatype");
        assert_eq!(dt.declaration(), "MPI_Datatype datatype");
    }

    #[test]
    fn test_builtin_registry_covers_collectives() {
        let registry = Registry::builtin().unwrap();
        for name in crate::config::DEFAULT_OPERATIONS {
            let sig = registry.signature(name).unwrap();
            assert!(sig.param("comm").is_some(), "{} has no comm", name);
        }
        assert!(registry.signature("bogus").is_err());
    }
}
