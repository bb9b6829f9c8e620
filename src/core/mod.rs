// This module is the hub for the generator's shared infrastructure: the fatal error type, the
// typed emission stream, the prototype table and the emission session that carries the latter
// two through a run. Everything here is independent of collective semantics; the catalog,
// registry and emitters build on top of it.

//! Core generator infrastructure.
//!
//! # Key Components
//!
//! ## Errors (`error`)
//! - `GenError` / `GenResult`, every variant fatal
//!
//! ## Emission stream (`stream`)
//! - `Token` values instead of pre-indented text
//! - `CodeBuffer` helpers for blocks, else-branches and exit labels
//!
//! ## Prototypes (`prototypes`)
//! - `FnSig` shared by definitions and declarations
//! - `PrototypeSet`, first declaration wins
//!
//! ## Session (`session`)
//! - `EmitSession` threaded explicitly through every emitter
//! - `SessionStats` for the end-of-run summary

pub mod error;
pub mod prototypes;
pub mod session;
pub mod stream;

pub use error::{GenError, GenResult};
pub use prototypes::{FnSig, PrototypeSet};
pub use session::{EmitSession, SessionStats};
pub use stream::{CodeBuffer, Label, Token};
