// This module emits the externally callable entry point of an operation. The body picks
// between the device-offload path and the software path from the device collective cvars:
// offload when every collective goes to the device, or when the per-collective setting is in
// effect and this collective opted in. Reduction-family operations stage their buffers
// through host memory around the dispatch. The staged buffers are released on every path:
// blocking calls copy the result back and free at fn_exit, nonblocking and persistent calls
// hand the buffers to the request on success and free them at fn_fail otherwise.

//! Top-level entry tier with host buffer staging.

use super::{call, emit_status_decl};
use crate::core::{EmitSession, FnSig, GenResult, Label};
use crate::synth::{BlockingMode, EmissionContext};

/// Element counts used by buffer staging.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Staging {
    /// Lines computing `count` when the signature has no such parameter.
    count_setup: Vec<&'static str>,
    /// Count of the local result passed when copying back.
    result_count: &'static str,
}

impl Staging {
    fn for_op(op: &str) -> Self {
        match op {
            "reduce_scatter" => Staging {
                count_setup: vec![
                    "MPI_Aint count = 0;",
                    "for (int i = 0; i < MPIR_Comm_size(comm_ptr); i++) {",
                    "    count += recvcounts[i];",
                    "}",
                ],
                result_count: "recvcounts[comm_ptr->rank]",
            },
            "reduce_scatter_block" => Staging {
                count_setup: vec!["MPI_Aint count = MPIR_Comm_size(comm_ptr) * recvcount;"],
                result_count: "recvcount",
            },
            _ => Staging {
                count_setup: Vec::new(),
                result_count: "count",
            },
        }
    }
}

fn emit_staging_setup(session: &mut EmitSession, staging: &Staging) {
    let out = &mut session.out;
    out.line("void *in_recvbuf = recvbuf;");
    out.line("void *host_sendbuf;");
    out.line("void *host_recvbuf;");
    out.blank();
    if !staging.count_setup.is_empty() {
        for line in &staging.count_setup {
            out.line(*line);
        }
        out.blank();
    }
    out.stmt(
        "MPIR_Coll_host_buffer_alloc(sendbuf, recvbuf, count, datatype, &host_sendbuf, &host_recvbuf);",
    );
    for buf in ["sendbuf", "recvbuf"] {
        out.open(format!("if (host_{}) {{", buf));
        out.line(format!("{} = host_{};", buf, buf));
        out.close("}");
    }
    out.blank();
}

fn emit_device_switch(session: &mut EmitSession, ctx: &EmissionContext<'_>, args: &str) {
    let out = &mut session.out;
    out.line("if ((MPIR_CVAR_DEVICE_COLLECTIVES == MPIR_CVAR_DEVICE_COLLECTIVES_all) ||");
    out.line("    ((MPIR_CVAR_DEVICE_COLLECTIVES == MPIR_CVAR_DEVICE_COLLECTIVES_percoll) &&");
    out.open(format!("     MPIR_CVAR_{}_DEVICE_COLLECTIVE)) {{", ctx.upper_name));
    out.stmt(call(&format!("MPID_{}", ctx.cap_name), args));
    out.else_branch();
    out.stmt(call(&ctx.mpir("impl"), args));
    out.close("}");
    out.line("MPIR_ERR_CHECK(mpi_errno);");
}

/// Hand the staged buffers back once the dispatch succeeded.
fn emit_staging_release(session: &mut EmitSession, mode: BlockingMode, staging: &Staging) {
    let out = &mut session.out;
    let count = staging.result_count;
    match mode {
        BlockingMode::Blocking => {
            out.open("if (host_recvbuf) {");
            out.line("recvbuf = in_recvbuf;");
            out.stmt(format!(
                "MPIR_Localcopy(host_recvbuf, {}, datatype, recvbuf, {}, datatype);",
                count, count
            ));
            out.close("}");
        }
        BlockingMode::Nonblocking => out.stmt(format!(
            "MPIR_Coll_host_buffer_swap_back(host_sendbuf, host_recvbuf, in_recvbuf, {}, datatype, *request);",
            count
        )),
        BlockingMode::Persistent => out.stmt(format!(
            "MPIR_Coll_host_buffer_persist_set(host_sendbuf, host_recvbuf, in_recvbuf, {}, datatype, *request);",
            count
        )),
    }
}

/// Exit labels freeing the staged buffers on the paths that still own them.
fn emit_staged_exit(session: &mut EmitSession, mode: BlockingMode) {
    const FREE: &str = "MPIR_Coll_host_buffer_free(host_sendbuf, host_recvbuf);";
    let out = &mut session.out;
    out.blank();
    out.label(Label::FnExit);
    if mode == BlockingMode::Blocking {
        out.line(FREE);
    }
    out.line("return mpi_errno;");
    out.label(Label::FnFail);
    if mode != BlockingMode::Blocking {
        out.line(FREE);
    }
    out.line("goto fn_exit;");
}

/// `MPIR_<Name>`.
pub fn emit_entry(session: &mut EmitSession, ctx: &EmissionContext<'_>) -> GenResult<()> {
    let entry = ctx.entry();
    let staging = ctx.needs_buffer_staging().then(|| Staging::for_op(ctx.op));

    session.out.blank();
    session.begin_function(FnSig::new(format!("MPIR_{}", ctx.cap_name), entry.params()));
    emit_status_decl(session);

    if let Some(staging) = &staging {
        emit_staging_setup(session, staging);
    }
    emit_device_switch(session, ctx, &entry.args());

    match &staging {
        Some(staging) => {
            emit_staging_release(session, ctx.mode, staging);
            emit_staged_exit(session, ctx.mode);
        }
        None => session.out.fn_exit(),
    }
    session.end_function();
    Ok(())
}
