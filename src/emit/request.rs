//! Request tiers: wrap a freshly built schedule into a nonblocking request
//! or stash it in a persistent request for later starts.

use super::{call, emit_status_decl};
use crate::core::{EmitSession, FnSig, GenResult};
use crate::synth::{capitalize, BlockingMode, EmissionContext};

/// `MPIR_I<name>_impl`: build the schedule and start it.
pub fn emit_impl_nonblocking(
    session: &mut EmitSession,
    ctx: &EmissionContext<'_>,
) -> GenResult<()> {
    let base = ctx.base();
    let sched_impl = ctx.mpir("sched_impl");
    session.out.blank();
    session.begin_function(FnSig::new(ctx.mpir("impl"), ctx.request().params()));
    emit_status_decl(session);
    session.declare(FnSig::new(sched_impl.as_str(), ctx.sched_entry().params()));

    let out = &mut session.out;
    out.line("enum MPIR_sched_type sched_type;");
    out.line("void *sched;");
    out.blank();
    out.line("*request = NULL;");
    out.stmt(call(
        &sched_impl,
        &format!("{}, false, &sched, &sched_type", base.args()),
    ));
    out.line("MPIR_ERR_CHECK(mpi_errno);");
    out.line("MPII_SCHED_START(sched_type, sched, comm_ptr, request);");
    out.fn_exit();
    session.end_function();
    Ok(())
}

/// `MPIR_<Name>_init_impl`: allocate a persistent request and record the
/// schedule in it without starting it.
pub fn emit_impl_persistent(
    session: &mut EmitSession,
    ctx: &EmissionContext<'_>,
) -> GenResult<()> {
    let base = ctx.base();
    let sched_impl = format!(
        "MPIR_{}_sched_impl",
        capitalize(&BlockingMode::Nonblocking.func_name(ctx.op))
    );
    session.out.blank();
    session.begin_function(FnSig::new(ctx.mpir("impl"), ctx.persistent().params()));
    emit_status_decl(session);
    // The schedule builder may live in a mode that is not generated.
    session.declare(FnSig::new(sched_impl.as_str(), ctx.sched_entry().params()));

    let out = &mut session.out;
    out.line("MPIR_Request *req = MPIR_Request_create(MPIR_REQUEST_KIND__PREQUEST_COLL);");
    out.line("MPIR_ERR_CHKANDJUMP(!req, mpi_errno, MPI_ERR_OTHER, \"**nomem\");");
    out.line("MPIR_Comm_add_ref(comm_ptr);");
    out.line("req->comm = comm_ptr;");
    out.blank();
    out.line("req->u.persist_coll.sched_type = MPIR_SCHED_INVALID;");
    out.line("req->u.persist_coll.real_request = NULL;");
    out.stmt(call(
        &sched_impl,
        &format!(
            "{}, true, &req->u.persist_coll.sched, &req->u.persist_coll.sched_type",
            base.args()
        ),
    ));
    out.line("MPIR_ERR_CHECK(mpi_errno);");
    out.blank();
    out.line("*request = req;");
    out.fn_exit();
    session.end_function();
    Ok(())
}
