// This module derives, for one operation and one blocking mode, everything the tier emitters
// need to spell function signatures and call sites: the name variants (function name such as
// ibcast or bcast_init, its capitalized and upper-cased forms), the parameter declarations and
// the matching call arguments. The communicator parameter is always rebound to the
// communicator object pointer, and polymorphic-size parameters have their `int` widened to
// `MPI_Aint`. Mode-specific trailing parameters (error flag, schedule out-parameters, request
// and info objects) are appended by the per-tier accessors of EmissionContext.

//! Parameter and argument synthesis.

use crate::core::{GenError, GenResult};
use crate::registry::{OperationSignature, ParamKind};
use std::fmt;
use std::str::FromStr;

/// Blocking flavor of an emitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockingMode {
    Blocking,
    Nonblocking,
    Persistent,
}

impl BlockingMode {
    pub const ALL: [BlockingMode; 3] = [
        BlockingMode::Blocking,
        BlockingMode::Nonblocking,
        BlockingMode::Persistent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockingMode::Blocking => "blocking",
            BlockingMode::Nonblocking => "nonblocking",
            BlockingMode::Persistent => "persistent",
        }
    }

    /// `bcast`, `ibcast` or `bcast_init`.
    pub fn func_name(self, op: &str) -> String {
        match self {
            BlockingMode::Blocking => op.to_string(),
            BlockingMode::Nonblocking => format!("i{}", op),
            BlockingMode::Persistent => format!("{}_init", op),
        }
    }
}

impl FromStr for BlockingMode {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockingMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| GenError::UnknownBlockingMode {
                mode: s.to_string(),
            })
    }
}

impl fmt::Display for BlockingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Replace every `int` type word of a declaration by `MPI_Aint`.
pub fn widen_int(decl: &str) -> String {
    decl.split(' ')
        .map(|word| if word == "int" { "MPI_Aint" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parallel parameter declarations and call arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    params: Vec<String>,
    args: Vec<String>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, param: impl Into<String>, arg: impl Into<String>) {
        self.params.push(param.into());
        self.args.push(arg.into());
    }

    pub fn with(mut self, param: impl Into<String>, arg: impl Into<String>) -> Self {
        self.push(param, arg);
        self
    }

    /// Comma-joined declarations.
    pub fn params(&self) -> String {
        self.params.join(", ")
    }

    /// Comma-joined call arguments.
    pub fn args(&self) -> String {
        self.args.join(", ")
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Parameters and arguments of the public binding, communicator rebound.
pub fn base_params(sig: &OperationSignature) -> ParamList {
    let mut list = ParamList::new();
    for p in &sig.parameters {
        match &p.kind {
            ParamKind::Communicator => list.push("MPIR_Comm * comm_ptr", "comm_ptr"),
            kind if kind.is_poly() => list.push(widen_int(&p.declaration()), p.name.as_str()),
            _ => list.push(p.declaration(), p.name.as_str()),
        }
    }
    list
}

/// Per (operation, blocking mode) emission state.
#[derive(Debug, Clone)]
pub struct EmissionContext<'a> {
    /// Base operation name, e.g. `reduce_scatter`.
    pub op: &'a str,
    pub signature: &'a OperationSignature,
    pub mode: BlockingMode,
    /// `ibcast`
    pub func_name: String,
    /// `Ibcast`
    pub cap_name: String,
    /// `IBCAST`
    pub upper_name: String,
    base: ParamList,
    /// Raised once a restriction guard has been emitted.
    pub need_fallback: bool,
}

impl<'a> EmissionContext<'a> {
    pub fn new(signature: &'a OperationSignature, mode: BlockingMode) -> Self {
        let op = signature.name.as_str();
        let func_name = mode.func_name(op);
        Self {
            op,
            signature,
            mode,
            cap_name: capitalize(&func_name),
            upper_name: func_name.to_uppercase(),
            func_name,
            base: base_params(signature),
            need_fallback: false,
        }
    }

    /// `MPIR_<Name>_<suffix>`
    pub fn mpir(&self, suffix: &str) -> String {
        format!("MPIR_{}_{}", self.cap_name, suffix)
    }

    /// Scan, exscan and neighborhood collectives have no inter variant.
    pub fn intra_only(&self) -> bool {
        ["scan", "exscan", "neighbor_"]
            .iter()
            .any(|prefix| self.op.starts_with(prefix))
    }

    pub fn is_neighbor(&self) -> bool {
        self.op.starts_with("neighbor_")
    }

    /// Reduction-family operations stage device buffers through host memory.
    pub fn needs_buffer_staging(&self) -> bool {
        ["reduce", "allreduce", "scan", "exscan"]
            .iter()
            .any(|prefix| self.op.starts_with(prefix))
    }

    pub fn base(&self) -> &ParamList {
        &self.base
    }

    /// Blocking tiers: the error flag, except for neighborhood collectives.
    pub fn blocking(&self) -> ParamList {
        if self.is_neighbor() {
            self.base.clone()
        } else {
            self.base
                .clone()
                .with("MPIR_Errflag_t * errflag", "errflag")
        }
    }

    /// Nonblocking scheduling tiers.
    pub fn sched_entry(&self) -> ParamList {
        self.base
            .clone()
            .with("bool is_persistent", "is_persistent")
            .with("void **sched_p", "sched_p")
            .with("enum MPIR_sched_type *sched_type_p", "sched_type_p")
    }

    /// Declarations of a graph-scheduled algorithm; the schedule itself is
    /// passed as `*sched_p` at call sites.
    pub fn sched_algo_params(&self) -> String {
        format!("{}, MPIR_Sched_t s", self.base.params())
    }

    /// Outward-facing nonblocking implementation.
    pub fn request(&self) -> ParamList {
        self.base
            .clone()
            .with("MPIR_Request ** request", "request")
    }

    /// Persistent-request setup.
    pub fn persistent(&self) -> ParamList {
        self.base
            .clone()
            .with("MPIR_Info * info_ptr", "info_ptr")
            .with("MPIR_Request ** request", "request")
    }

    /// Parameters of the externally callable entry point.
    pub fn entry(&self) -> ParamList {
        match self.mode {
            BlockingMode::Blocking => self.blocking(),
            BlockingMode::Nonblocking => self.request(),
            BlockingMode::Persistent => self.persistent(),
        }
    }

    /// Parameter names captured in the selector signature.
    pub fn selector_fields(&self) -> impl Iterator<Item = &str> {
        self.signature
            .parameters
            .iter()
            .filter(|p| p.kind != ParamKind::Communicator)
            .map(|p| p.name.as_str())
    }
}

/// Check that every requested mode name is known.
pub fn parse_modes<'s>(names: impl IntoIterator<Item = &'s str>) -> GenResult<Vec<BlockingMode>> {
    names.into_iter().map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Registry, SignatureRegistry};

    fn registry() -> Registry {
        Registry::builtin().unwrap()
    }

    #[test]
    fn test_names() {
        assert_eq!(capitalize("reduce_scatter"), "Reduce_scatter");
        assert_eq!(BlockingMode::Nonblocking.func_name("bcast"), "ibcast");
        assert_eq!(BlockingMode::Persistent.func_name("bcast"), "bcast_init");

        let reg = registry();
        let ctx = EmissionContext::new(reg.signature("bcast").unwrap(), BlockingMode::Persistent);
        assert_eq!(ctx.cap_name, "Bcast_init");
        assert_eq!(ctx.upper_name, "BCAST_INIT");
        assert_eq!(ctx.mpir("impl"), "MPIR_Bcast_init_impl");
    }

    #[test]
    fn test_comm_rebound_and_counts_widened() {
        let reg = registry();
        let ctx = EmissionContext::new(reg.signature("bcast").unwrap(), BlockingMode::Blocking);
        assert_eq!(
            ctx.blocking().params(),
            "void *buffer, MPI_Aint count, MPI_Datatype datatype, int root, \
             MPIR_Comm * comm_ptr, MPIR_Errflag_t * errflag"
        );
        assert_eq!(
            ctx.blocking().args(),
            "buffer, count, datatype, root, comm_ptr, errflag"
        );
    }

    #[test]
    fn test_array_counts_widened() {
        let reg = registry();
        let ctx = EmissionContext::new(reg.signature("allgatherv").unwrap(), BlockingMode::Blocking);
        let params = ctx.base().params();
        assert!(params.contains("const MPI_Aint recvcounts[]"));
        assert!(params.contains("const MPI_Aint displs[]"));
        assert_eq!(widen_int("int *p"), "MPI_Aint *p");
        assert_eq!(widen_int("const uint x"), "const uint x");
    }

    #[test]
    fn test_mode_specific_trailers() {
        let reg = registry();
        let sig = reg.signature("neighbor_alltoall").unwrap();
        let ctx = EmissionContext::new(sig, BlockingMode::Blocking);
        assert!(!ctx.blocking().params().contains("errflag"));
        assert!(ctx.intra_only());

        let ctx = EmissionContext::new(sig, BlockingMode::Nonblocking);
        assert!(ctx
            .sched_entry()
            .params()
            .ends_with("bool is_persistent, void **sched_p, enum MPIR_sched_type *sched_type_p"));
        assert!(ctx.entry().args().ends_with("comm_ptr, request"));

        let ctx = EmissionContext::new(sig, BlockingMode::Persistent);
        assert!(ctx.entry().args().ends_with("info_ptr, request"));
    }

    #[test]
    fn test_staging_family() {
        let reg = registry();
        for (op, staged) in [
            ("reduce", true),
            ("allreduce", true),
            ("reduce_scatter_block", true),
            ("exscan", true),
            ("bcast", false),
            ("neighbor_allgather", false),
        ] {
            let ctx = EmissionContext::new(reg.signature(op).unwrap(), BlockingMode::Blocking);
            assert_eq!(ctx.needs_buffer_staging(), staged, "{}", op);
        }
    }

    #[test]
    fn test_unknown_mode() {
        assert_eq!("persistent".parse::<BlockingMode>().unwrap(), BlockingMode::Persistent);
        assert!(matches!(
            parse_modes(["blocking", "eventually"]),
            Err(GenError::UnknownBlockingMode { .. })
        ));
    }
}
