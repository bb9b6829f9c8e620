//! Closed vocabulary of algorithm restrictions.

use crate::core::{GenError, GenResult};
use std::fmt;
use std::str::FromStr;

/// A precondition an algorithm needs; failing it redirects to automatic
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Restriction {
    InPlace,
    NoInPlace,
    PowerOfTwo,
    SizeGePof2,
    Commutative,
    BuiltinOp,
    ParentComm,
    NodeConsecutive,
    DisplsOrdered,
}

impl Restriction {
    pub const ALL: [Restriction; 9] = [
        Restriction::InPlace,
        Restriction::NoInPlace,
        Restriction::PowerOfTwo,
        Restriction::SizeGePof2,
        Restriction::Commutative,
        Restriction::BuiltinOp,
        Restriction::ParentComm,
        Restriction::NodeConsecutive,
        Restriction::DisplsOrdered,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Restriction::InPlace => "inplace",
            Restriction::NoInPlace => "noinplace",
            Restriction::PowerOfTwo => "power-of-two",
            Restriction::SizeGePof2 => "size-ge-pof2",
            Restriction::Commutative => "commutative",
            Restriction::BuiltinOp => "builtin-op",
            Restriction::ParentComm => "parent-comm",
            Restriction::NodeConsecutive => "node-consecutive",
            Restriction::DisplsOrdered => "displs-ordered",
        }
    }

    /// C predicate that holds when the restriction is satisfied.
    pub fn condition(self) -> &'static str {
        match self {
            Restriction::InPlace => "sendbuf == MPI_IN_PLACE",
            Restriction::NoInPlace => "sendbuf != MPI_IN_PLACE",
            Restriction::PowerOfTwo => "comm_ptr->local_size == comm_ptr->coll.pof2",
            Restriction::SizeGePof2 => "count >= comm_ptr->coll.pof2",
            Restriction::Commutative => "MPIR_Op_is_commutative(op)",
            Restriction::BuiltinOp => "HANDLE_IS_BUILTIN(op)",
            Restriction::ParentComm => "MPIR_Comm_is_parent_comm(comm_ptr)",
            Restriction::NodeConsecutive => "MPII_Comm_is_node_consecutive(comm_ptr)",
            // only allgatherv-shaped operations declare this one
            Restriction::DisplsOrdered => {
                "MPII_Iallgatherv_is_displs_ordered(comm_ptr->local_size, recvcounts, displs)"
            }
        }
    }
}

impl FromStr for Restriction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Restriction::ALL
            .into_iter()
            .find(|r| r.token() == s)
            .ok_or(())
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Parse a comma-separated restriction list; any unknown token is fatal.
pub fn parse_restrictions(algorithm: &str, list: &str) -> GenResult<Vec<Restriction>> {
    list.split(',')
        .map(|t| t.split_whitespace().collect::<String>())
        .filter(|t| !t.is_empty())
        .map(|token| {
            token
                .parse()
                .map_err(|_| GenError::UnsupportedRestriction {
                    algorithm: algorithm.to_string(),
                    token,
                })
        })
        .collect()
}
