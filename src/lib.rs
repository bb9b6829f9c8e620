//! collgen - dispatch layer generator for collective communication.
//!
//! collgen reads an algorithm catalog (which algorithms exist per collective
//! operation and communicator kind, with their applicability restrictions)
//! and a registry of operation signatures, and writes the C dispatch layer
//! that picks an algorithm at runtime together with a header of prototypes.
//!
//! # Primary Usage
//!
//! ```ignore
//! use collgen::{generate, AlgorithmCatalog, GeneratorConfig, Registry};
//!
//! let catalog = AlgorithmCatalog::parse(&std::fs::read_to_string("coll_algorithms.txt")?)?;
//! let registry = Registry::builtin()?;
//! let artifacts = generate(&catalog, &registry, &GeneratorConfig::default())?;
//! std::fs::write("coll_algos.c", artifacts.source)?;
//! std::fs::write("coll_algos.h", artifacts.header)?;
//! ```
//!
//! # Architecture
//!
//! - [`catalog`] - Algorithm catalog grammar and descriptors
//! - [`registry`] - Operation signatures
//! - [`synth`] - Per-mode parameter and argument lists
//! - [`emit`] - Tier emitters (auto, static, scheduled, request, entry)
//! - [`format`] - Indentation, wrapping and artifact rendering
//! - [`core`] - Errors, emission stream, prototype table, session
//! - [`driver`] - One generation run

pub mod catalog;
pub mod config;
pub mod core;
pub mod driver;
pub mod emit;
pub mod format;
pub mod registry;
pub mod synth;

pub use catalog::{AlgorithmCatalog, AlgorithmDescriptor, CommKind, Restriction, Scope, Transport};
pub use config::GeneratorConfig;
pub use crate::core::{EmitSession, GenError, GenResult, PrototypeSet, SessionStats};
pub use driver::{generate, Artifacts, Generator};
pub use format::Style;
pub use registry::{OperationSignature, Registry, SignatureRegistry};
pub use synth::{BlockingMode, EmissionContext};
