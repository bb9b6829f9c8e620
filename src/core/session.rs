// This module provides the emission session that a generation run threads through every tier
// emitter. EmitSession owns the two run-wide accumulators: the typed output stream and the
// deduplicating prototype table. Both start empty, grow strictly in catalog/registry order and
// are consumed once by the formatter at the end of the run. The session also tracks statistics
// (functions emitted, switch cases, fallback guards, prototypes recorded and dropped) which
// the command line driver logs after a successful run.

//! Emission session: run-wide output stream, prototype table and statistics.

use super::prototypes::{FnSig, PrototypeSet};
use super::stream::CodeBuffer;
use std::fmt;

/// Explicit emission context passed to every emitter.
#[derive(Debug, Default)]
pub struct EmitSession {
    /// Implementation source tokens.
    pub out: CodeBuffer,

    /// Header declarations.
    prototypes: PrototypeSet,

    stats: SessionStats,

    /// Function currently being emitted.
    current_function: Option<String>,
}

impl EmitSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a forward declaration for the header.
    pub fn declare(&mut self, sig: FnSig) {
        if !self.prototypes.add(sig) {
            self.stats.duplicate_prototypes += 1;
        }
    }

    /// Declare `sig` and open its definition in the output stream.
    pub fn begin_function(&mut self, sig: FnSig) {
        log::debug!("emitting {}", sig.name);
        self.stats.functions_emitted += 1;
        self.current_function = Some(sig.name.clone());
        self.out.stmt(sig.to_string());
        self.out.open("{");
        self.declare(sig);
    }

    /// Close the definition opened by [`EmitSession::begin_function`].
    pub fn end_function(&mut self) {
        self.out.close("}");
        self.current_function = None;
    }

    pub fn current_function(&self) -> Option<&str> {
        self.current_function.as_deref()
    }

    pub fn record_case(&mut self) {
        self.stats.cases_emitted += 1;
    }

    pub fn record_fallback_guard(&mut self) {
        self.stats.fallback_guards += 1;
    }

    pub fn prototypes(&self) -> &PrototypeSet {
        &self.prototypes
    }

    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        stats.prototypes = self.prototypes.len();
        stats
    }

    /// Split the session into its two accumulators.
    pub fn finish(self) -> (CodeBuffer, PrototypeSet) {
        (self.out, self.prototypes)
    }
}

/// Emission statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Function definitions emitted.
    pub functions_emitted: usize,

    /// Switch cases emitted across all tiers.
    pub cases_emitted: usize,

    /// Restriction guards emitted.
    pub fallback_guards: usize,

    /// Distinct prototypes recorded.
    pub prototypes: usize,

    /// Declarations dropped because the name was already declared.
    pub duplicate_prototypes: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Emission Session Statistics:")?;
        writeln!(f, "  Functions emitted: {}", self.functions_emitted)?;
        writeln!(f, "  Switch cases: {}", self.cases_emitted)?;
        writeln!(f, "  Fallback guards: {}", self.fallback_guards)?;
        writeln!(f, "  Prototypes: {}", self.prototypes)?;
        writeln!(f, "  Duplicate declarations dropped: {}", self.duplicate_prototypes)
    }
}
