//! Errors raised by the state engine and the search.

use thiserror::Error;

/// Everything that can go wrong while turning the cube or searching for a solve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// A move token that is not one of the 18 `{U,L,F,R,B,D}{1,2,3}` rotations.
    #[error("invalid rotation `{token}`")]
    InvalidRotation {
        /// The offending token, as given.
        token: String,
    },

    /// `expand` was called on a node that is terminal or already expanded.
    #[error("node {node} cannot be expanded")]
    IllegalExpansion {
        /// Arena index of the node.
        node: usize,
    },

    /// A child was requested from a node that has none.
    #[error("node {node} has no children to select from")]
    IllegalSelection {
        /// Arena index of the node.
        node: usize,
    },

    /// The reward worker pool stopped answering before a batch completed.
    #[error("search aborted: {reason}")]
    SearchAborted {
        /// What broke.
        reason: String,
    },

    /// A search parameter is out of range.
    #[error("invalid config: {msg}")]
    InvalidConfig {
        /// Which parameter and why.
        msg: &'static str,
    },
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, SolverError>;
