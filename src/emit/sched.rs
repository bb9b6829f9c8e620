//! Scheduling tiers of nonblocking collectives.
//!
//! Both tiers fill the caller's `sched_p`/`sched_type_p` out-parameters.
//! Every case materializes exactly one empty schedule, graph-based or
//! transport-based depending on the descriptor, before dispatching:
//!
//! - `MPIR_I<name>_allcomm_sched_auto` switches on the runtime selector;
//!   extra algorithm parameters come from the selector container.
//! - `MPIR_I<name>_sched_impl` switches on the algorithm cvar; extra
//!   parameters come from the per-operation cvars.

use super::cvar::{emit_static_function, StaticTier};
use super::{
    auto::container_label, auto_cases, call, close_case, emit_default_case,
    emit_selector_lookup, emit_status_decl, open_case,
};
use crate::catalog::{AlgorithmCatalog, AlgorithmDescriptor, Scope};
use crate::core::{EmitSession, FnSig, GenResult};
use crate::synth::{capitalize, EmissionContext};

/// Where extra algorithm arguments are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraArgs {
    Selector,
    Cvar,
}

fn selector_args(algo: &AlgorithmDescriptor) -> Vec<String> {
    let prefix = format!(
        "cnt->u.{}.{}_{}",
        algo.group.op, algo.group.kind, algo.name
    );
    algo.extra_param_names()
        .into_iter()
        .map(|p| format!("{}.{}", prefix, p))
        .collect()
}

/// Cvar behind a knob; tree shape and throttle are shared across operations.
fn cvar_symbol(op: &str, knob: &str) -> String {
    match knob {
        "TREE_TYPE" => format!("MPIR_{}_tree_type", capitalize(op)),
        "THROTTLE" => "MPIR_CVAR_ALLTOALL_THROTTLE".to_string(),
        _ => format!("MPIR_CVAR_{}_{}", op.to_uppercase(), knob),
    }
}

fn cvar_args(algo: &AlgorithmDescriptor) -> GenResult<Vec<String>> {
    algo.check_cvar_params()?;
    Ok(algo
        .cvar_param_names()
        .iter()
        .map(|knob| cvar_symbol(&algo.group.op, knob))
        .collect())
}

/// Constant arguments followed by the per-algorithm ones.
fn extra_args(algo: &AlgorithmDescriptor, source: ExtraArgs) -> GenResult<Vec<String>> {
    if !algo.has_extra_params() {
        return Ok(Vec::new());
    }
    let mut args: Vec<String> = algo
        .const_params()
        .iter()
        .map(|c| c.arg().to_string())
        .collect();
    match source {
        ExtraArgs::Selector => args.extend(selector_args(algo)),
        ExtraArgs::Cvar => args.extend(cvar_args(algo)?),
    }
    Ok(args)
}

fn extra_param_decls(algo: &AlgorithmDescriptor) -> Vec<String> {
    if !algo.has_extra_params() {
        return Vec::new();
    }
    algo.const_params()
        .into_iter()
        .map(|c| c.name)
        .chain(algo.extra_param_names())
        .map(|name| format!("int {}", name))
        .collect()
}

fn join_extra(base: String, extra: &[String]) -> String {
    if extra.is_empty() {
        base
    } else {
        format!("{}, {}", base, extra.join(", "))
    }
}

/// Create the schedule matching `algo` and dispatch to it.
fn emit_sched_dispatch(
    session: &mut EmitSession,
    ctx: &EmissionContext<'_>,
    algo: &AlgorithmDescriptor,
    scope: Scope,
    source: ExtraArgs,
) -> GenResult<()> {
    let base = ctx.base();
    match algo.transport_stem() {
        Some(stem) => {
            let target = format!("MPIR_TSP_{}_sched_{}_{}", ctx.cap_name, scope, stem);
            let params = join_extra(base.params(), &extra_param_decls(algo));
            session.declare(FnSig::new(
                target.as_str(),
                format!("{}, MPIR_TSP_sched_t sched", params),
            ));
            let args = join_extra(base.args(), &extra_args(algo, source)?);
            session.out.line("MPII_GENTRAN_CREATE_SCHED_P();");
            session
                .out
                .stmt(call(&target, &format!("{}, *sched_p", args)));
        }
        None => {
            let target = ctx.mpir(&format!("{}_{}", scope, algo.name));
            session.declare(FnSig::new(target.as_str(), ctx.sched_algo_params()));
            session.out.line("MPII_SCHED_CREATE_SCHED_P();");
            session
                .out
                .stmt(call(&target, &format!("{}, *sched_p", base.args())));
        }
    }
    Ok(())
}

pub fn emit_allcomm_sched_auto(
    session: &mut EmitSession,
    ctx: &EmissionContext<'_>,
    catalog: &AlgorithmCatalog,
) -> GenResult<()> {
    session.begin_function(FnSig::new(
        ctx.mpir("allcomm_sched_auto"),
        ctx.sched_entry().params(),
    ));
    emit_status_decl(session);
    emit_selector_lookup(session, ctx);

    session.declare(FnSig::new(ctx.mpir("intra_sched_auto"), ctx.sched_algo_params()));
    if !ctx.intra_only() {
        session.declare(FnSig::new(ctx.mpir("inter_sched_auto"), ctx.sched_algo_params()));
    }

    session.out.open("switch (cnt->id) {");
    for (scope, algo) in auto_cases(ctx, catalog) {
        let label = container_label(&ctx.mpir(&format!("{}_{}", scope, algo.name)));
        log::trace!("{}: case {}", ctx.func_name, label);
        open_case(session, &label);
        emit_sched_dispatch(session, ctx, algo, scope, ExtraArgs::Selector)?;
        close_case(session);
        session.out.blank();
    }
    emit_default_case(session);
    session.out.close("}");

    session.out.line("MPIR_ERR_CHECK(mpi_errno);");
    session.out.fn_exit();
    session.end_function();
    Ok(())
}

/// `MPIR_I<name>_sched_impl`.
struct SchedStatic;

impl StaticTier for SchedStatic {
    fn signature(&self, ctx: &EmissionContext<'_>) -> FnSig {
        FnSig::new(ctx.mpir("sched_impl"), ctx.sched_entry().params())
    }

    fn emit_algorithm(
        &self,
        session: &mut EmitSession,
        ctx: &EmissionContext<'_>,
        algo: &AlgorithmDescriptor,
    ) -> GenResult<()> {
        emit_sched_dispatch(session, ctx, algo, algo.scope(), ExtraArgs::Cvar)
    }

    fn emit_reserved(&self, session: &mut EmitSession, ctx: &EmissionContext<'_>, prefix: &str) {
        open_case(session, &format!("{}_auto", prefix));
        session.out.stmt(self.fallback_call(ctx));
        close_case(session);
    }

    fn fallback_call(&self, ctx: &EmissionContext<'_>) -> String {
        call(&ctx.mpir("allcomm_sched_auto"), &ctx.sched_entry().args())
    }
}

pub fn emit_sched_impl(
    session: &mut EmitSession,
    ctx: &mut EmissionContext<'_>,
    catalog: &AlgorithmCatalog,
) -> GenResult<()> {
    emit_static_function(session, ctx, catalog, &SchedStatic)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::core::{GenError, Token};
    use crate::registry::SignatureRegistry;
    use crate::synth::BlockingMode;

    fn stmts(session: &EmitSession) -> Vec<String> {
        session
            .out
            .tokens()
            .iter()
            .filter_map(|t| match t {
                Token::Stmt(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    fn emit_both(catalog: &AlgorithmCatalog) -> GenResult<EmitSession> {
        let registry = registry();
        let mut ctx = EmissionContext::new(
            registry.signature("bcast").unwrap(),
            BlockingMode::Nonblocking,
        );
        let mut session = EmitSession::new();
        emit_allcomm_sched_auto(&mut session, &ctx, catalog)?;
        emit_sched_impl(&mut session, &mut ctx, catalog)?;
        Ok(session)
    }

    #[test]
    fn test_auto_tier_uses_selector_params() {
        let session = emit_both(&catalog()).unwrap();
        let calls = stmts(&session);
        assert!(calls.contains(
            &"mpi_errno = MPIR_TSP_Ibcast_sched_intra_tree(buffer, count, datatype, root, comm_ptr, \
              cnt->u.ibcast.intra_tsp_tree.tree_type, cnt->u.ibcast.intra_tsp_tree.k, \
              cnt->u.ibcast.intra_tsp_tree.chunk_size, *sched_p);"
                .to_string()
        ));
        assert!(calls.contains(
            &"mpi_errno = MPIR_Ibcast_intra_sched_binomial(buffer, count, datatype, root, comm_ptr, *sched_p);"
                .to_string()
        ));
    }

    #[test]
    fn test_static_tier_uses_shared_knobs() {
        let session = emit_both(&catalog()).unwrap();
        let calls = stmts(&session);
        assert!(calls.contains(
            &"mpi_errno = MPIR_TSP_Ibcast_sched_intra_tree(buffer, count, datatype, root, comm_ptr, \
              MPIR_Ibcast_tree_type, MPIR_CVAR_IBCAST_TREE_KVAL, \
              MPIR_CVAR_IBCAST_TREE_PIPELINE_CHUNK_SIZE, *sched_p);"
                .to_string()
        ));
        assert!(calls.contains(
            &"mpi_errno = MPIR_Ibcast_allcomm_sched_auto(buffer, count, datatype, root, comm_ptr, \
              is_persistent, sched_p, sched_type_p);"
                .to_string()
        ));
    }

    #[test]
    fn test_exactly_one_schedule_constructor_per_case() {
        let session = emit_both(&catalog()).unwrap();
        let tokens = session.out.tokens();
        let mut in_case = false;
        let mut creates = 0;
        for t in tokens {
            match t {
                Token::Line(l) if l.starts_with("case ") => {
                    in_case = true;
                    creates = 0;
                }
                Token::Line(l) if l.ends_with("CREATE_SCHED_P();") => creates += 1,
                Token::Line(l) if l == "break;" && in_case => {
                    assert!(creates <= 1);
                    in_case = false;
                }
                _ => {}
            }
        }
        let gentran = tokens
            .iter()
            .filter(|t| **t == Token::Line("MPII_GENTRAN_CREATE_SCHED_P();".to_string()))
            .count();
        assert_eq!(gentran, 2);
    }

    #[test]
    fn test_prototypes_of_scheduled_algorithms() {
        let session = emit_both(&catalog()).unwrap();
        let protos = session.prototypes();
        assert_eq!(
            protos.get("MPIR_TSP_Ibcast_sched_intra_tree").unwrap().params,
            "void *buffer, MPI_Aint count, MPI_Datatype datatype, int root, MPIR_Comm * comm_ptr, \
             int tree_type, int k, int chunk_size, MPIR_TSP_sched_t sched"
        );
        assert_eq!(
            protos.get("MPIR_Ibcast_inter_sched_flat").unwrap().params,
            "void *buffer, MPI_Aint count, MPI_Datatype datatype, int root, MPIR_Comm * comm_ptr, \
             MPIR_Sched_t s"
        );
        assert!(protos.contains("MPIR_Ibcast_intra_sched_auto"));
        assert!(protos.contains("MPIR_Ibcast_inter_sched_auto"));
    }

    #[test]
    fn test_static_tier_has_auto_but_no_nb() {
        let session = emit_both(&catalog()).unwrap();
        let labels = case_labels(&session);
        assert!(labels.contains(&"case MPIR_CVAR_IBCAST_INTRA_ALGORITHM_auto:".to_string()));
        assert!(labels.contains(&"case MPIR_CVAR_IBCAST_INTER_ALGORITHM_sched_flat:".to_string()));
        assert!(!labels.iter().any(|l| l.ends_with("_nb:")));
        assert!(render(&session).contains("fallback:"));
    }

    #[test]
    fn test_const_params_and_throttle() {
        let catalog = AlgorithmCatalog::parse(
            "ialltoall-intra:\n    tsp_scattered\n        extra_const_params: k=2\n        extra_params: batch_size, bblock\n        cvar_params: THROTTLE, BBLOCK\n",
        )
        .unwrap();
        let algo = &catalog.group("ialltoall", crate::catalog::CommKind::Intra)[0];
        assert_eq!(
            extra_args(algo, ExtraArgs::Cvar).unwrap(),
            ["2", "MPIR_CVAR_ALLTOALL_THROTTLE", "MPIR_CVAR_IALLTOALL_BBLOCK"]
        );
        assert_eq!(
            extra_args(algo, ExtraArgs::Selector).unwrap(),
            [
                "2",
                "cnt->u.ialltoall.intra_tsp_scattered.batch_size",
                "cnt->u.ialltoall.intra_tsp_scattered.bblock"
            ]
        );
        assert_eq!(extra_param_decls(algo), ["int k", "int batch_size", "int bblock"]);
    }

    #[test]
    fn test_cvar_mismatch_is_fatal() {
        let catalog = AlgorithmCatalog::parse(
            "ibcast-intra:\n    tsp_tree\n        extra_params: tree_type, k\n",
        )
        .unwrap();
        assert!(matches!(
            emit_both(&catalog),
            Err(GenError::InvalidDescriptor { .. })
        ));
    }
}
