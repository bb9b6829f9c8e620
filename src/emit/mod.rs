// This module groups the tier emitters of the dispatch layer. Each emitter consumes the
// catalog and an EmissionContext and appends exactly one C function to the session stream:
// the auto-selector tiers (blocking and scheduled) switch on the runtime selector's answer,
// the static tiers switch on the user-configurable algorithm cvar with restriction-guarded
// fallback, the request tiers wrap schedules into nonblocking and persistent requests, and
// the entry tier chooses between the device-offload path and the software path. Helpers
// shared by several tiers (selector lookup, auto-tier case list, call statements) live here.

//! Tier emitters.

pub mod auto;
pub mod cvar;
pub mod entry;
pub mod request;
pub mod sched;

use crate::catalog::{AlgorithmCatalog, AlgorithmDescriptor, CommKind, Scope};
use crate::core::EmitSession;
use crate::synth::EmissionContext;

pub use auto::emit_allcomm_auto;
pub use cvar::emit_impl_blocking;
pub use entry::emit_entry;
pub use request::{emit_impl_nonblocking, emit_impl_persistent};
pub use sched::{emit_allcomm_sched_auto, emit_sched_impl};

/// `mpi_errno = <callee>(<args>);`
pub(crate) fn call(callee: &str, args: &str) -> String {
    format!("mpi_errno = {}({});", callee, args)
}

/// Cases of an auto tier in emission order.
///
/// An `allcomm` descriptor in the intra group covers both communicator
/// kinds; `allcomm` descriptors of the inter group are skipped because the
/// intra pass already emitted them. Intra-only operations never look at
/// their inter group.
pub(crate) fn auto_cases<'c>(
    ctx: &EmissionContext<'_>,
    catalog: &'c AlgorithmCatalog,
) -> Vec<(Scope, &'c AlgorithmDescriptor)> {
    let mut cases = Vec::new();
    for kind in CommKind::ALL {
        if kind == CommKind::Inter && ctx.intra_only() {
            continue;
        }
        for algo in catalog.group(&ctx.func_name, kind) {
            match (algo.allcomm, kind) {
                (true, CommKind::Intra) => cases.push((Scope::Allcomm, algo)),
                (true, CommKind::Inter) => {
                    log::trace!("{}: {} already covered by allcomm", algo.group, algo.name)
                }
                (false, _) => cases.push((kind.into(), algo)),
            }
        }
    }
    cases
}

/// Build the selector signature and look it up; the selector must answer.
pub(crate) fn emit_selector_lookup(session: &mut EmitSession, ctx: &EmissionContext<'_>) {
    let out = &mut session.out;
    out.open("MPIR_Csel_coll_sig_s coll_sig = {");
    out.line(format!(".coll_type = MPIR_CSEL_COLL_TYPE__{},", ctx.upper_name));
    out.line(".comm_ptr = comm_ptr,");
    for field in ctx.selector_fields() {
        out.line(format!(".u.{}.{} = {},", ctx.func_name, field, field));
    }
    out.close("};");
    out.blank();
    out.line("MPII_Csel_container_s *cnt = MPIR_Csel_search(comm_ptr->csel_comm, coll_sig);");
    out.line("MPIR_Assert(cnt);");
    out.blank();
}

/// `case <label>:` followed by an indented body opening.
pub(crate) fn open_case(session: &mut EmitSession, label: &str) {
    session.record_case();
    session.out.line(format!("case {}:", label));
    session.out.indent();
}

/// `break;` and close the case body.
pub(crate) fn close_case(session: &mut EmitSession) {
    session.out.line("break;");
    session.out.dedent();
}

/// The unreachable default of every switch.
pub(crate) fn emit_default_case(session: &mut EmitSession) {
    session.out.line("default:");
    session.out.indent();
    session.out.line("MPIR_Assert(0);");
    session.out.dedent();
}

/// Function prologue shared by all tiers.
pub(crate) fn emit_status_decl(session: &mut EmitSession) {
    session.out.line("int mpi_errno = MPI_SUCCESS;");
    session.out.blank();
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::registry::SignatureRegistry;
    use crate::synth::BlockingMode;

    #[test]
    fn test_auto_cases_collapse_allcomm() {
        let catalog = catalog();
        let registry = registry();
        let ctx = EmissionContext::new(registry.signature("bcast").unwrap(), BlockingMode::Blocking);

        let cases: Vec<_> = auto_cases(&ctx, &catalog)
            .into_iter()
            .map(|(scope, algo)| format!("{}_{}", scope, algo.name))
            .collect();
        assert_eq!(
            cases,
            ["intra_binomial", "intra_scatter_recursive_doubling_allgather"]
        );
    }

    #[test]
    fn test_selector_lookup_skips_comm() {
        let registry = registry();
        let ctx = EmissionContext::new(registry.signature("bcast").unwrap(), BlockingMode::Nonblocking);
        let mut session = EmitSession::new();
        emit_selector_lookup(&mut session, &ctx);

        let text = render(&session);
        assert!(text.contains("    .coll_type = MPIR_CSEL_COLL_TYPE__IBCAST,"));
        assert!(text.contains("    .u.ibcast.root = root,"));
        assert!(!text.contains(".u.ibcast.comm"));
        assert!(text.contains("MPIR_Assert(cnt);"));
    }
}
