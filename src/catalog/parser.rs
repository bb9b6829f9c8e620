//! Catalog parser.
//!
//! The catalog is a two-level indented grammar:
//!
//! ```text
//! bcast-intra:
//!     binomial
//!     scatter_recursive_doubling_allgather
//!         restrictions: power-of-two
//! bcast-inter:
//!     remote_send_local_bcast
//!         allcomm: 1
//! ```
//!
//! Each line is first classified into a [`CatalogLine`]; a builder then
//! assembles the catalog and rejects tokens that arrive out of order.

use super::{AlgorithmCatalog, AlgorithmDescriptor, CommKind, GroupKey, RESERVED_NAMES};
use crate::core::{GenError, GenResult};

/// Classified catalog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLine<'a> {
    /// `<op>-<intra|inter>:` at column zero.
    GroupHeader { op: &'a str, kind: CommKind },
    /// Indented bare word.
    DescriptorStart(&'a str),
    /// Indented `key: value`.
    FieldAssignment { key: &'a str, value: &'a str },
    /// Blank line or `#` comment.
    Skip,
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Classify a single catalog line.
pub fn classify_line(line: &str) -> Result<CatalogLine<'_>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(CatalogLine::Skip);
    }

    if !line.starts_with(char::is_whitespace) {
        let header = trimmed
            .strip_suffix(':')
            .ok_or_else(|| format!("expected group header, found `{}`", trimmed))?;
        let (op, kind) = header
            .rsplit_once('-')
            .ok_or_else(|| format!("group `{}` has no communicator kind", header))?;
        let kind = kind
            .parse::<CommKind>()
            .map_err(|_| format!("unknown communicator kind `{}` in `{}`", kind, header))?;
        if !is_word(op) {
            return Err(format!("invalid operation name `{}`", op));
        }
        return Ok(CatalogLine::GroupHeader { op, kind });
    }

    if is_word(trimmed) {
        return Ok(CatalogLine::DescriptorStart(trimmed));
    }

    match trimmed.split_once(':') {
        Some((key, value)) if is_word(key.trim_end()) => {
            let value = value.trim();
            if value.is_empty() {
                return Err(format!("field `{}` has no value", key.trim_end()));
            }
            Ok(CatalogLine::FieldAssignment {
                key: key.trim_end(),
                value,
            })
        }
        _ => Err(format!("unrecognized line `{}`", trimmed)),
    }
}

/// Assembles the catalog from classified lines.
struct CatalogBuilder {
    catalog: AlgorithmCatalog,
    group: Option<GroupKey>,
    has_descriptor: bool,
}

impl CatalogBuilder {
    fn new() -> Self {
        Self {
            catalog: AlgorithmCatalog::new(),
            group: None,
            has_descriptor: false,
        }
    }

    fn apply(&mut self, token: CatalogLine<'_>, line_no: usize) -> GenResult<()> {
        match token {
            CatalogLine::Skip => {}
            CatalogLine::GroupHeader { op, kind } => {
                let key = GroupKey::new(op, kind);
                if !self.catalog.open_group(key.clone()) {
                    return Err(GenError::catalog(line_no, format!("duplicate group `{}`", key)));
                }
                log::trace!("catalog group {}", key);
                self.group = Some(key);
                self.has_descriptor = false;
            }
            CatalogLine::DescriptorStart(name) => {
                let key = self.group.clone().ok_or_else(|| {
                    GenError::catalog(line_no, format!("algorithm `{}` before any group", name))
                })?;
                if RESERVED_NAMES.contains(&name) {
                    return Err(GenError::catalog(
                        line_no,
                        format!("`{}` is reserved and cannot be declared in `{}`", name, key),
                    ));
                }
                let list = self.group_list(&key, line_no)?;
                if list.iter().any(|d| d.name == name) {
                    return Err(GenError::catalog(
                        line_no,
                        format!("duplicate algorithm `{}` in `{}`", name, key),
                    ));
                }
                list.push(AlgorithmDescriptor::new(name, key));
                self.has_descriptor = true;
            }
            CatalogLine::FieldAssignment { key, value } => {
                let group = match (&self.group, self.has_descriptor) {
                    (Some(group), true) => group.clone(),
                    _ => {
                        return Err(GenError::catalog(
                            line_no,
                            format!("field `{}` before any algorithm name", key),
                        ))
                    }
                };
                let list = self.group_list(&group, line_no)?;
                if let Some(descriptor) = list.last_mut() {
                    descriptor.set_field(key, value);
                }
            }
        }
        Ok(())
    }

    fn group_list(
        &mut self,
        key: &GroupKey,
        line_no: usize,
    ) -> GenResult<&mut Vec<AlgorithmDescriptor>> {
        self.catalog
            .group_mut(key)
            .ok_or_else(|| GenError::catalog(line_no, format!("group `{}` was never opened", key)))
    }
}

/// Parse catalog text into an [`AlgorithmCatalog`].
pub fn parse_catalog(text: &str) -> GenResult<AlgorithmCatalog> {
    let mut builder = CatalogBuilder::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let token = classify_line(line).map_err(|reason| GenError::catalog(line_no, reason))?;
        builder.apply(token, line_no)?;
    }
    log::debug!("loaded {} catalog groups", builder.catalog.len());
    Ok(builder.catalog)
}
