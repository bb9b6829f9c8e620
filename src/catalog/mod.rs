// This module models the declarative algorithm catalog. The catalog maps a group key, made of
// an operation function name and a communicator kind (intra or inter), to the ordered list of
// algorithm descriptors available for that shape. Order is significant because it becomes the
// switch-case order of every emitted tier. Descriptors carry optional restrictions, extra call
// parameters (plain, constant with literal defaults, and user-tunable cvar knobs), a function
// name override and the allcomm flag. Whether an algorithm is graph-scheduled or built on the
// transport scheduler is decided once here, when the descriptor is created, from its name.

//! Algorithm catalog types.

mod parser;
mod restriction;

use crate::core::{GenError, GenResult};
use hashbrown::HashMap;
use std::fmt;
use std::str::FromStr;

pub use parser::{classify_line, parse_catalog, CatalogLine};
pub use restriction::{parse_restrictions, Restriction};

/// Names the emitters reserve for their built-in cases.
pub const RESERVED_NAMES: [&str; 2] = ["auto", "nb"];

/// Communicator shape of a catalog group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommKind {
    Intra,
    Inter,
}

impl CommKind {
    pub const ALL: [CommKind; 2] = [CommKind::Intra, CommKind::Inter];

    pub fn as_str(self) -> &'static str {
        match self {
            CommKind::Intra => "intra",
            CommKind::Inter => "inter",
        }
    }
}

impl FromStr for CommKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intra" => Ok(CommKind::Intra),
            "inter" => Ok(CommKind::Inter),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CommKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Communicator segment used in dispatched function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Intra,
    Inter,
    Allcomm,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Intra => "intra",
            Scope::Inter => "inter",
            Scope::Allcomm => "allcomm",
        }
    }
}

impl From<CommKind> for Scope {
    fn from(kind: CommKind) -> Self {
        match kind {
            CommKind::Intra => Scope::Intra,
            CommKind::Inter => Scope::Inter,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<operation>-<intra|inter>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub op: String,
    pub kind: CommKind,
}

impl GroupKey {
    pub fn new(op: impl Into<String>, kind: CommKind) -> Self {
        Self {
            op: op.into(),
            kind,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.op, self.kind)
    }
}

/// How an algorithm builds its schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Explicit operation-dependency graph.
    Sched,
    /// Pipeline for the transport scheduler; `stem` is the name without its
    /// `gentran_`/`tsp_` prefix.
    Gentran { stem: String },
}

impl Transport {
    pub fn from_name(name: &str) -> Self {
        ["gentran_", "tsp_"]
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix))
            .filter(|stem| !stem.is_empty())
            .map(|stem| Transport::Gentran {
                stem: stem.to_string(),
            })
            .unwrap_or(Transport::Sched)
    }
}

/// Constant extra parameter, `name=value` in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstParam {
    pub name: String,
    pub value: Option<String>,
}

impl ConstParam {
    /// Argument passed at call sites.
    pub fn arg(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.name)
    }
}

/// One algorithm of a catalog group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    pub name: String,
    pub group: GroupKey,
    pub transport: Transport,
    pub restrictions: Option<String>,
    pub extra_params: Option<String>,
    pub extra_const_params: Option<String>,
    pub cvar_params: Option<String>,
    pub func_name: Option<String>,
    pub allcomm: bool,
    /// Fields the generator does not interpret.
    pub attributes: Vec<(String, String)>,
}

impl AlgorithmDescriptor {
    pub fn new(name: impl Into<String>, group: GroupKey) -> Self {
        let name = name.into();
        Self {
            transport: Transport::from_name(&name),
            name,
            group,
            restrictions: None,
            extra_params: None,
            extra_const_params: None,
            cvar_params: None,
            func_name: None,
            allcomm: false,
            attributes: Vec::new(),
        }
    }

    /// Apply one `key: value` line.
    pub fn set_field(&mut self, key: &str, value: &str) {
        let value = value.trim().to_string();
        match key {
            "restrictions" => self.restrictions = Some(value),
            "extra_params" => self.extra_params = Some(value),
            "extra_const_params" => self.extra_const_params = Some(value),
            "cvar_params" => self.cvar_params = Some(value),
            "func_name" => self.func_name = Some(value),
            "allcomm" => self.allcomm = true,
            _ => {
                log::debug!("{} {}: keeping unknown field `{}`", self.group, self.name, key);
                self.attributes.push((key.to_string(), value));
            }
        }
    }

    /// Segment used in the dispatched function name.
    pub fn scope(&self) -> Scope {
        if self.allcomm {
            Scope::Allcomm
        } else {
            self.group.kind.into()
        }
    }

    pub fn has_restrictions(&self) -> bool {
        self.restrictions.is_some()
    }

    pub fn restriction_list(&self) -> GenResult<Vec<Restriction>> {
        match &self.restrictions {
            Some(list) => parse_restrictions(&self.name, list),
            None => Ok(Vec::new()),
        }
    }

    pub fn has_extra_params(&self) -> bool {
        self.extra_params.is_some()
    }

    pub fn extra_param_names(&self) -> Vec<String> {
        split_list(self.extra_params.as_deref())
    }

    pub fn cvar_param_names(&self) -> Vec<String> {
        split_list(self.cvar_params.as_deref())
    }

    pub fn const_params(&self) -> Vec<ConstParam> {
        split_list(self.extra_const_params.as_deref())
            .into_iter()
            .map(|item| match item.split_once('=') {
                Some((name, value)) => ConstParam {
                    name: name.trim().to_string(),
                    value: Some(value.trim().to_string()),
                },
                None => ConstParam {
                    name: item,
                    value: None,
                },
            })
            .collect()
    }

    /// Name segment of a transport call, honoring `func_name`.
    pub fn transport_stem(&self) -> Option<&str> {
        match &self.transport {
            Transport::Gentran { stem } => Some(self.func_name.as_deref().unwrap_or(stem)),
            Transport::Sched => None,
        }
    }

    /// Every cvar knob must line up with one extra parameter.
    pub fn check_cvar_params(&self) -> GenResult<()> {
        let extra = self.extra_param_names();
        let cvars = self.cvar_param_names();
        if extra.len() != cvars.len() {
            return Err(GenError::InvalidDescriptor {
                algorithm: format!("{} {}", self.group, self.name),
                reason: format!(
                    "{} extra_params but {} cvar_params",
                    extra.len(),
                    cvars.len()
                ),
            });
        }
        Ok(())
    }
}

fn split_list(list: Option<&str>) -> Vec<String> {
    list.map(|l| {
        l.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Ordered descriptor lists keyed by group.
#[derive(Debug, Default, Clone)]
pub struct AlgorithmCatalog {
    groups: HashMap<GroupKey, Vec<AlgorithmDescriptor>>,
}

impl AlgorithmCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> GenResult<Self> {
        parse_catalog(text)
    }

    pub(crate) fn open_group(&mut self, key: GroupKey) -> bool {
        if self.groups.contains_key(&key) {
            return false;
        }
        self.groups.insert(key, Vec::new());
        true
    }

    pub(crate) fn group_mut(&mut self, key: &GroupKey) -> Option<&mut Vec<AlgorithmDescriptor>> {
        self.groups.get_mut(key)
    }

    /// Descriptors of `op` for `kind`, empty when the group is absent.
    pub fn group(&self, op: &str, kind: CommKind) -> &[AlgorithmDescriptor] {
        self.groups
            .get(&GroupKey::new(op, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_group(&self, op: &str, kind: CommKind) -> bool {
        self.groups.contains_key(&GroupKey::new(op, kind))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> AlgorithmDescriptor {
        AlgorithmDescriptor::new(name, GroupKey::new("ibcast", CommKind::Intra))
    }

    #[test]
    fn test_transport_from_name() {
        assert_eq!(
            Transport::from_name("tsp_tree"),
            Transport::Gentran {
                stem: "tree".to_string()
            }
        );
        assert_eq!(
            Transport::from_name("gentran_ring"),
            Transport::Gentran {
                stem: "ring".to_string()
            }
        );
        assert_eq!(Transport::from_name("sched_binomial"), Transport::Sched);
        assert_eq!(Transport::from_name("tsp_"), Transport::Sched);
    }

    #[test]
    fn test_fields_and_scope() {
        let mut algo = descriptor("tsp_tree");
        algo.set_field("extra_params", "tree_type, k, chunk_size");
        algo.set_field("cvar_params", "TREE_TYPE, TREE_KVAL, TREE_PIPELINE_CHUNK_SIZE");
        algo.set_field("func_name", "tree_pipelined");
        algo.set_field("comment", "kept");

        assert_eq!(algo.scope(), Scope::Intra);
        assert_eq!(algo.extra_param_names(), ["tree_type", "k", "chunk_size"]);
        assert_eq!(algo.transport_stem(), Some("tree_pipelined"));
        assert_eq!(algo.attributes, [("comment".to_string(), "kept".to_string())]);
        assert!(algo.check_cvar_params().is_ok());

        algo.set_field("allcomm", "1");
        assert_eq!(algo.scope(), Scope::Allcomm);
    }

    #[test]
    fn test_const_params() {
        let mut algo = descriptor("tsp_scatterv_allgatherv");
        algo.set_field("extra_const_params", "k=2, scatterv_k");
        let consts = algo.const_params();
        assert_eq!(consts[0].name, "k");
        assert_eq!(consts[0].arg(), "2");
        assert_eq!(consts[1].arg(), "scatterv_k");
    }

    #[test]
    fn test_mismatched_cvar_params() {
        let mut algo = descriptor("tsp_tree");
        algo.set_field("extra_params", "tree_type, k");
        algo.set_field("cvar_params", "TREE_TYPE");
        assert!(matches!(
            algo.check_cvar_params(),
            Err(GenError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_missing_group_is_empty() {
        let catalog = AlgorithmCatalog::new();
        assert!(catalog.group("scan", CommKind::Inter).is_empty());
        assert!(!catalog.has_group("scan", CommKind::Inter));
    }
}
