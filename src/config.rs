//! Generation settings.

use crate::format::Style;
use crate::synth::BlockingMode;

/// Collectives emitted when no operation is selected explicitly, in output order.
pub const DEFAULT_OPERATIONS: [&str; 22] = [
    "barrier",
    "bcast",
    "gather",
    "gatherv",
    "scatter",
    "scatterv",
    "allgather",
    "allgatherv",
    "alltoall",
    "alltoallv",
    "alltoallw",
    "reduce",
    "allreduce",
    "reduce_scatter",
    "reduce_scatter_block",
    "scan",
    "exscan",
    "neighbor_allgather",
    "neighbor_allgatherv",
    "neighbor_alltoall",
    "neighbor_alltoallv",
    "neighbor_alltoallw",
];

/// Header files included at the top of the implementation source.
pub const DEFAULT_INCLUDES: [&str; 2] = ["mpiimpl.h", "iallgatherv/iallgatherv.h"];

/// What to generate and how to lay it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Operations in emission order.
    pub operations: Vec<String>,
    /// Blocking modes emitted for every operation, in order.
    pub modes: Vec<BlockingMode>,
    /// Quoted include directives of the source artifact.
    pub includes: Vec<String>,
    pub style: Style,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            operations: DEFAULT_OPERATIONS.iter().map(|s| s.to_string()).collect(),
            modes: BlockingMode::ALL.to_vec(),
            includes: DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect(),
            style: Style::default(),
        }
    }
}

impl GeneratorConfig {
    /// Restrict generation to `operations`, keeping everything else.
    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations = operations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_modes(mut self, modes: Vec<BlockingMode>) -> Self {
        self.modes = modes;
        self
    }
}
