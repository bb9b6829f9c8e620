// This module emits the static-selection tiers. The emitted function switches on the
// user-configurable algorithm cvar of the operation, one per communicator kind. Every catalog
// algorithm becomes a case; algorithms with restrictions first evaluate all their predicates
// and jump to the shared fallback label when one fails. The reserved cases delegate to the
// auto-selector tier (and, for blocking collectives, to the nonblocking composition), and the
// default case is an unreachable assertion. When at least one guard was emitted the function
// ends with a fallback label that re-runs automatic selection and then returns normally. The
// skeleton is shared with the scheduled static tier through the StaticTier trait.

//! Static (cvar-driven) selection tiers with restriction fallback.

use super::{call, close_case, emit_default_case, emit_status_decl, open_case};
use crate::catalog::{AlgorithmCatalog, AlgorithmDescriptor, CommKind};
use crate::core::{EmitSession, FnSig, GenResult, Label};
use crate::synth::{capitalize, EmissionContext};

/// What differs between the blocking and the scheduled static tier.
pub(crate) trait StaticTier {
    /// Signature of the emitted function.
    fn signature(&self, ctx: &EmissionContext<'_>) -> FnSig;

    /// Case body dispatching to `algo`, without guard or `break`.
    fn emit_algorithm(
        &self,
        session: &mut EmitSession,
        ctx: &EmissionContext<'_>,
        algo: &AlgorithmDescriptor,
    ) -> GenResult<()>;

    /// Reserved cases, emitted after the catalog cases.
    fn emit_reserved(&self, session: &mut EmitSession, ctx: &EmissionContext<'_>, prefix: &str);

    /// Statement run under the `fallback` label.
    fn fallback_call(&self, ctx: &EmissionContext<'_>) -> String;
}

/// Emit the guard of a restricted algorithm. Returns false when the
/// restriction list is empty and no guard was needed.
pub(crate) fn emit_fallback_guard(
    session: &mut EmitSession,
    algo: &AlgorithmDescriptor,
) -> GenResult<bool> {
    let restrictions = algo.restriction_list()?;
    if restrictions.is_empty() {
        return Ok(false);
    }
    let conds: Vec<&str> = restrictions.iter().map(|r| r.condition()).collect();
    session.out.stmt(format!(
        "MPII_COLLECTIVE_FALLBACK_CHECK(comm_ptr->rank, {}, mpi_errno, \"{} {} cannot be applied.\\n\");",
        conds.join(" && "),
        capitalize(&algo.group.op),
        algo.name
    ));
    session.record_fallback_guard();
    Ok(true)
}

fn emit_cases(
    session: &mut EmitSession,
    ctx: &mut EmissionContext<'_>,
    catalog: &AlgorithmCatalog,
    tier: &dyn StaticTier,
    kind: CommKind,
) -> GenResult<()> {
    let prefix = format!(
        "MPIR_CVAR_{}_{}_ALGORITHM",
        ctx.upper_name,
        kind.as_str().to_uppercase()
    );
    for algo in catalog.group(&ctx.func_name, kind) {
        open_case(session, &format!("{}_{}", prefix, algo.name));
        if algo.has_restrictions() && emit_fallback_guard(session, algo)? {
            ctx.need_fallback = true;
        }
        tier.emit_algorithm(session, ctx, algo)?;
        close_case(session);
    }
    tier.emit_reserved(session, ctx, &prefix);
    emit_default_case(session);
    Ok(())
}

/// Shared skeleton of the static tiers.
pub(crate) fn emit_static_function(
    session: &mut EmitSession,
    ctx: &mut EmissionContext<'_>,
    catalog: &AlgorithmCatalog,
    tier: &dyn StaticTier,
) -> GenResult<()> {
    ctx.need_fallback = false;
    session.out.blank();
    session.begin_function(tier.signature(ctx));
    emit_status_decl(session);

    session
        .out
        .open("if (comm_ptr->comm_kind == MPIR_COMM_KIND__INTRACOMM) {");
    session
        .out
        .open(format!("switch (MPIR_CVAR_{}_INTRA_ALGORITHM) {{", ctx.upper_name));
    emit_cases(session, ctx, catalog, tier, CommKind::Intra)?;
    session.out.close("}");
    session.out.else_branch();
    if ctx.intra_only() {
        session
            .out
            .line("MPIR_Assert(0 && \"Only intra-communicator allowed\");");
    } else {
        session
            .out
            .open(format!("switch (MPIR_CVAR_{}_INTER_ALGORITHM) {{", ctx.upper_name));
        emit_cases(session, ctx, catalog, tier, CommKind::Inter)?;
        session.out.close("}");
    }
    session.out.close("}");

    session.out.line("MPIR_ERR_CHECK(mpi_errno);");
    if ctx.need_fallback {
        session.out.line("goto fn_exit;");
        session.out.blank();
        session.out.label(Label::Fallback);
        session.out.stmt(tier.fallback_call(ctx));
    }
    session.out.fn_exit();
    session.end_function();
    Ok(())
}

/// `MPIR_<Name>_impl` of a blocking collective.
struct BlockingStatic;

impl StaticTier for BlockingStatic {
    fn signature(&self, ctx: &EmissionContext<'_>) -> FnSig {
        FnSig::new(ctx.mpir("impl"), ctx.blocking().params())
    }

    fn emit_algorithm(
        &self,
        session: &mut EmitSession,
        ctx: &EmissionContext<'_>,
        algo: &AlgorithmDescriptor,
    ) -> GenResult<()> {
        let list = ctx.blocking();
        let target = ctx.mpir(&format!("{}_{}", algo.scope(), algo.name));
        session.declare(FnSig::new(target.as_str(), list.params()));
        session.out.stmt(call(&target, &list.args()));
        Ok(())
    }

    fn emit_reserved(&self, session: &mut EmitSession, ctx: &EmissionContext<'_>, prefix: &str) {
        let list = ctx.blocking();
        for suffix in ["nb", "auto"] {
            let target = ctx.mpir(&format!("allcomm_{}", suffix));
            open_case(session, &format!("{}_{}", prefix, suffix));
            session.declare(FnSig::new(target.as_str(), list.params()));
            session.out.stmt(call(&target, &list.args()));
            close_case(session);
        }
    }

    fn fallback_call(&self, ctx: &EmissionContext<'_>) -> String {
        call(&ctx.mpir("allcomm_auto"), &ctx.blocking().args())
    }
}

pub fn emit_impl_blocking(
    session: &mut EmitSession,
    ctx: &mut EmissionContext<'_>,
    catalog: &AlgorithmCatalog,
) -> GenResult<()> {
    emit_static_function(session, ctx, catalog, &BlockingStatic)
}
