// This module drives one generation run. For every requested operation it resolves the
// signature, then for every requested blocking mode builds an EmissionContext and runs the
// tier emitters of that mode in a fixed order: the auto-selector tier, the static tier and the
// entry point for blocking collectives; the scheduled auto tier, the scheduled static tier,
// the request wrapper and the entry point for nonblocking ones; the persistent setup and the
// entry point for persistent ones. All emitters append to one EmitSession. Only when every
// operation succeeded are the two accumulators rendered, so a failing run never yields a
// partial artifact.

//! Generation driver.

use crate::catalog::{AlgorithmCatalog, CommKind};
use crate::config::GeneratorConfig;
use crate::core::{EmitSession, GenResult, SessionStats};
use crate::emit;
use crate::format::{render_header, render_source};
use crate::registry::SignatureRegistry;
use crate::synth::{BlockingMode, EmissionContext};

/// Rendered output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Implementation source.
    pub source: String,
    /// Prototype header.
    pub header: String,
    pub stats: SessionStats,
}

/// One generation run over a catalog and a signature registry.
pub struct Generator<'a> {
    catalog: &'a AlgorithmCatalog,
    registry: &'a dyn SignatureRegistry,
    config: &'a GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(
        catalog: &'a AlgorithmCatalog,
        registry: &'a dyn SignatureRegistry,
        config: &'a GeneratorConfig,
    ) -> Self {
        Self {
            catalog,
            registry,
            config,
        }
    }

    pub fn run(&self) -> GenResult<Artifacts> {
        let mut session = EmitSession::new();
        for include in &self.config.includes {
            session.out.directive(format!("#include \"{}\"", include));
        }

        for op in &self.config.operations {
            self.emit_operation(&mut session, op)?;
        }

        let stats = session.stats();
        let (out, prototypes) = session.finish();
        let source = render_source(out.tokens(), &self.config.style)?;
        let header = render_header(&prototypes, &self.config.style);
        log::info!(
            "rendered {} source bytes and {} prototypes",
            source.len(),
            prototypes.len()
        );
        Ok(Artifacts {
            source,
            header,
            stats,
        })
    }

    fn emit_operation(&self, session: &mut EmitSession, op: &str) -> GenResult<()> {
        let signature = self.registry.signature(op)?;
        log::info!("generating {}", op);

        for &mode in &self.config.modes {
            let mut ctx = EmissionContext::new(signature, mode);
            self.warn_missing_groups(&ctx);

            session.out.blank();
            session.out.line(format!("/* ---- {} ---- */", ctx.func_name));
            session.out.blank();

            match mode {
                BlockingMode::Blocking => {
                    emit::emit_allcomm_auto(session, &ctx, self.catalog)?;
                    emit::emit_impl_blocking(session, &mut ctx, self.catalog)?;
                }
                BlockingMode::Nonblocking => {
                    emit::emit_allcomm_sched_auto(session, &ctx, self.catalog)?;
                    emit::emit_sched_impl(session, &mut ctx, self.catalog)?;
                    emit::emit_impl_nonblocking(session, &ctx)?;
                }
                BlockingMode::Persistent => emit::emit_impl_persistent(session, &ctx)?,
            }
            emit::emit_entry(session, &ctx)?;
        }
        Ok(())
    }

    /// Missing groups dispatch only through the reserved cases.
    fn warn_missing_groups(&self, ctx: &EmissionContext<'_>) {
        if ctx.mode == BlockingMode::Persistent {
            return;
        }
        for kind in CommKind::ALL {
            if kind == CommKind::Inter && ctx.intra_only() {
                continue;
            }
            if !self.catalog.has_group(&ctx.func_name, kind) {
                log::warn!("catalog has no {}-{} group", ctx.func_name, kind);
            }
        }
    }
}

/// Run a full generation with `config`.
pub fn generate(
    catalog: &AlgorithmCatalog,
    registry: &dyn SignatureRegistry,
    config: &GeneratorConfig,
) -> GenResult<Artifacts> {
    Generator::new(catalog, registry, config).run()
}
