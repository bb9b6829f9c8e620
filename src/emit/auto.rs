//! Auto-selector tier for blocking collectives.
//!
//! `MPIR_<Name>_allcomm_auto` asks the runtime selector which algorithm to
//! run and dispatches to it, or to the nonblocking composition for the
//! reserved `nb` answer.

use super::{
    auto_cases, call, close_case, emit_default_case, emit_selector_lookup, emit_status_decl,
    open_case,
};
use crate::catalog::AlgorithmCatalog;
use crate::core::{EmitSession, FnSig, GenResult};
use crate::synth::EmissionContext;

/// Selector container identifier of a dispatched function.
pub(crate) fn container_label(target: &str) -> String {
    format!("MPII_CSEL_CONTAINER_TYPE__ALGORITHM__{}", target)
}

pub fn emit_allcomm_auto(
    session: &mut EmitSession,
    ctx: &EmissionContext<'_>,
    catalog: &AlgorithmCatalog,
) -> GenResult<()> {
    let list = ctx.blocking();
    let (params, args) = (list.params(), list.args());

    session.begin_function(FnSig::new(ctx.mpir("allcomm_auto"), params.as_str()));
    emit_status_decl(session);
    emit_selector_lookup(session, ctx);

    session.out.open("switch (cnt->id) {");
    for (scope, algo) in auto_cases(ctx, catalog) {
        let target = ctx.mpir(&format!("{}_{}", scope, algo.name));
        log::trace!("{}: case {}", ctx.func_name, target);
        open_case(session, &container_label(&target));
        session.declare(FnSig::new(target.as_str(), params.as_str()));
        session.out.stmt(call(&target, &args));
        close_case(session);
        session.out.blank();
    }

    let nb = ctx.mpir("allcomm_nb");
    open_case(session, &container_label(&nb));
    session.declare(FnSig::new(nb.as_str(), params.as_str()));
    session.out.stmt(call(&nb, &args));
    close_case(session);
    session.out.blank();

    emit_default_case(session);
    session.out.close("}");

    session.out.line("MPIR_ERR_CHECK(mpi_errno);");
    session.out.fn_exit();
    session.end_function();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::core::Token;
    use crate::registry::SignatureRegistry;
    use crate::synth::BlockingMode;

    fn emit(op: &str) -> EmitSession {
        let catalog = catalog();
        let registry = registry();
        let ctx = EmissionContext::new(registry.signature(op).unwrap(), BlockingMode::Blocking);
        let mut session = EmitSession::new();
        emit_allcomm_auto(&mut session, &ctx, &catalog).unwrap();
        session
    }

    #[test]
    fn test_bcast_auto_cases() {
        let session = emit("bcast");
        assert_eq!(
            case_labels(&session),
            [
                "case MPII_CSEL_CONTAINER_TYPE__ALGORITHM__MPIR_Bcast_intra_binomial:",
                "case MPII_CSEL_CONTAINER_TYPE__ALGORITHM__MPIR_Bcast_intra_scatter_recursive_doubling_allgather:",
                "case MPII_CSEL_CONTAINER_TYPE__ALGORITHM__MPIR_Bcast_allcomm_nb:",
            ]
        );
        let text = render(&session);
        assert!(text.contains("        default:\n            MPIR_Assert(0);\n"));
        assert!(!text.contains("remote_send_local_bcast"));
    }

    #[test]
    fn test_bcast_auto_dispatch_and_exit() {
        let session = emit("bcast");
        let text = render(&session);
        assert!(text.starts_with("int MPIR_Bcast_allcomm_auto(void *buffer, MPI_Aint count,"));
        assert!(session.out.tokens().contains(&Token::Stmt(
            "mpi_errno = MPIR_Bcast_intra_binomial(buffer, count, datatype, root, comm_ptr, errflag);"
                .to_string()
        )));
        assert!(text.contains("    MPIR_ERR_CHECK(mpi_errno);\n\nfn_exit:\n    return mpi_errno;\nfn_fail:\n    goto fn_exit;\n}\n"));
    }

    #[test]
    fn test_dispatched_functions_declared() {
        let session = emit("bcast");
        let protos = session.prototypes();
        assert!(protos.contains("MPIR_Bcast_allcomm_auto"));
        assert!(protos.contains("MPIR_Bcast_intra_binomial"));
        assert!(protos.contains("MPIR_Bcast_allcomm_nb"));
        assert_eq!(protos.len(), 4);
    }

    #[test]
    fn test_operation_without_groups_keeps_reserved_cases() {
        let session = emit("barrier");
        assert_eq!(
            case_labels(&session),
            ["case MPII_CSEL_CONTAINER_TYPE__ALGORITHM__MPIR_Barrier_allcomm_nb:"]
        );
    }
}
