//! Directory collaborator
//!
//! Resolves principals, ids and paths to identities and walks the real
//! (persisted) membership graph. Automatic membership never writes to it.

use std::fmt;
use tracing::{debug, warn};

use crate::error::DirectoryError;
use crate::types::{Identity, PrincipalName};

/// Lazy, forward-only sequence of groups
pub type GroupIter<'a> = Box<dyn Iterator<Item = Identity> + 'a>;

/// Lazy, forward-only sequence of identities
pub type IdentityIter<'a> = Box<dyn Iterator<Item = Identity> + 'a>;

/// Identity directory backed by the content store
pub trait Directory: Send + Sync {
    /// Resolve an identity by principal name
    fn authorizable(&self, principal: &PrincipalName) -> Result<Option<Identity>, DirectoryError>;

    /// Resolve an identity by its stable id
    fn authorizable_by_id(&self, id: &str) -> Result<Option<Identity>, DirectoryError>;

    /// Resolve the identity stored at a content-store path
    fn authorizable_by_path(&self, path: &str) -> Result<Option<Identity>, DirectoryError>;

    /// Current principal of an identity, `None` if it no longer exists
    fn principal_of(&self, identity: &Identity) -> Result<Option<PrincipalName>, DirectoryError>;

    /// Real groups the given group belongs to, declared and inherited
    ///
    /// Implementations must visit each group at most once even when the
    /// real graph contains cycles, and must not yield the group itself.
    fn member_of<'a>(&'a self, group: &Identity) -> Result<GroupIter<'a>, DirectoryError>;
}

/// Why a single element was dropped from a result sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing resolves under the reference (deleted or stale)
    NotFound,
    /// Resolved to a user where a group was required
    NotAGroup,
    /// The directory failed for this element
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::NotAGroup => write!(f, "not a group"),
            Self::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// Outcome of resolving one element of a lazy sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Found(T),
    Skipped(SkipReason),
}

impl<T> Resolved<T> {
    /// Keep the value, logging why it was skipped otherwise
    pub fn log_skip(self, what: &str, reference: &str) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Skipped(SkipReason::Failed(msg)) => {
                warn!("Skipping {} '{}': {}", what, reference, msg);
                None
            }
            Self::Skipped(reason) => {
                debug!("Skipping {} '{}': {}", what, reference, reason);
                None
            }
        }
    }
}

impl Resolved<Identity> {
    /// Classify a directory lookup
    pub fn from_lookup(lookup: Result<Option<Identity>, DirectoryError>) -> Self {
        match lookup {
            Ok(Some(identity)) => Self::Found(identity),
            Ok(None) => Self::Skipped(SkipReason::NotFound),
            Err(e) => Self::Skipped(SkipReason::Failed(e.to_string())),
        }
    }

    /// Classify a directory lookup that must yield a group
    pub fn group_from_lookup(lookup: Result<Option<Identity>, DirectoryError>) -> Self {
        match Self::from_lookup(lookup) {
            Self::Found(identity) if !identity.is_group() => Self::Skipped(SkipReason::NotAGroup),
            other => other,
        }
    }
}
