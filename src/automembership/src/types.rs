//! Core identity types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::provenance::Provenance;

/// Node type of user identities in the content store
pub const NT_USER: &str = "rep:User";

/// Node type of group identities in the content store
pub const NT_GROUP: &str = "rep:Group";

/// String property holding the provenance of a synced identity
pub const REP_EXTERNAL_ID: &str = "rep:externalId";

/// Property holding the stable authorizable id
pub const REP_AUTHORIZABLE_ID: &str = "rep:authorizableId";

/// Stable principal name used for lookup and equality
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalName(String);

impl PrincipalName {
    /// Create a principal name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PrincipalName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for PrincipalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of identity stored in the content store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    User,
    Group,
}

impl IdentityKind {
    /// Node type used for this kind in store queries
    pub fn node_type(self) -> &'static str {
        match self {
            Self::User => NT_USER,
            Self::Group => NT_GROUP,
        }
    }
}

/// A user or group node in the content store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable authorizable id
    pub id: String,

    /// Principal name
    pub principal: PrincipalName,

    /// User or group
    pub kind: IdentityKind,

    /// Location of the identity node in the content store
    pub path: String,

    /// String properties of the identity node
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Identity {
    /// Create a user identity
    pub fn user(
        id: impl Into<String>,
        principal: impl Into<PrincipalName>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(IdentityKind::User, id, principal, path)
    }

    /// Create a group identity
    pub fn group(
        id: impl Into<String>,
        principal: impl Into<PrincipalName>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(IdentityKind::Group, id, principal, path)
    }

    fn new(
        kind: IdentityKind,
        id: impl Into<String>,
        principal: impl Into<PrincipalName>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            principal: principal.into(),
            kind,
            path: path.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Set a string property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Record where this identity was synced from
    pub fn with_provenance(self, provenance: &Provenance) -> Self {
        self.with_property(REP_EXTERNAL_ID, provenance.to_string())
    }

    /// Read a string property
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn is_group(&self) -> bool {
        self.kind == IdentityKind::Group
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.path)
    }
}
