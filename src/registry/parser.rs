//! Text loader for the signature registry.
//!
//! ```text
//! bcast:
//!     buffer: BUFFER, void *
//!     count: POLYXFER_NUM_ELEM_NNI, int
//!     comm: COMMUNICATOR, MPI_Comm
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use super::{OperationSignature, ParamKind, Parameter, Registry};
use crate::core::{GenError, GenResult};

pub fn parse_registry(text: &str) -> GenResult<Registry> {
    let mut registry = Registry::new();
    let mut current: Option<OperationSignature> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indented = raw.starts_with(char::is_whitespace);
        if !indented {
            let name = trimmed
                .strip_suffix(':')
                .filter(|n| is_identifier(n))
                .ok_or_else(|| {
                    GenError::registry(line_no, format!("expected `<operation>:`, found `{}`", trimmed))
                })?;
            if let Some(sig) = current.take() {
                finish(&mut registry, sig, line_no)?;
            }
            current = Some(OperationSignature {
                name: name.to_string(),
                parameters: Vec::new(),
            });
            continue;
        }

        let sig = current
            .as_mut()
            .ok_or_else(|| GenError::registry(line_no, "parameter before any operation"))?;
        sig.parameters.push(parse_parameter(trimmed, line_no)?);
    }

    if let Some(sig) = current.take() {
        finish(&mut registry, sig, text.lines().count())?;
    }

    log::debug!("loaded {} operation signatures", registry.len());
    Ok(registry)
}

fn finish(registry: &mut Registry, sig: OperationSignature, line_no: usize) -> GenResult<()> {
    let name = sig.name.clone();
    if registry.insert(sig).is_some() {
        return Err(GenError::registry(
            line_no,
            format!("duplicate operation `{}`", name),
        ));
    }
    Ok(())
}

fn parse_parameter(line: &str, line_no: usize) -> GenResult<Parameter> {
    let malformed = || {
        GenError::registry(
            line_no,
            format!("expected `<name>: <KIND>, <C type>`, found `{}`", line),
        )
    };
    let (name, rest) = line.split_once(':').ok_or_else(malformed)?;
    let (kind, c_type) = rest.split_once(',').ok_or_else(malformed)?;
    let (name, kind, c_type) = (name.trim(), kind.trim(), c_type.trim());
    if !is_identifier(name) || !is_identifier(kind) || c_type.is_empty() {
        return Err(malformed());
    }
    Ok(Parameter::new(name, ParamKind::from_tag(kind), c_type))
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
