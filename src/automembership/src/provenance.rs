//! Provenance of identities synced from an external identity provider
//!
//! A synced identity carries a single string property of the form
//! `<externalId>;<providerName>`. The provider name is the segment after the
//! last `;`, so the external id itself may contain `;`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::ProvenanceError;
use crate::types::{Identity, REP_EXTERNAL_ID};

const SEPARATOR: char = ';';

/// Where a synced identity originated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the identity inside the external provider
    pub external_id: String,

    /// Name of the external identity provider, absent for unqualified values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
}

impl Provenance {
    /// Create a provider-qualified provenance
    pub fn new(external_id: impl Into<String>, provider_name: impl Into<String>) -> Self {
        let provider_name = provider_name.into();
        Self {
            external_id: external_id.into(),
            provider_name: (!provider_name.is_empty()).then_some(provider_name),
        }
    }

    /// Parse the stored `<externalId>;<providerName>` form
    ///
    /// An empty external id still carries its provider.
    pub fn parse(value: &str) -> Result<Self, ProvenanceError> {
        if value.is_empty() {
            return Err(ProvenanceError::Empty);
        }

        match value.rsplit_once(SEPARATOR) {
            Some((external_id, provider_name)) => Ok(Self::new(external_id, provider_name)),
            None => Ok(Self {
                external_id: value.to_string(),
                provider_name: None,
            }),
        }
    }

    /// Read the provenance recorded on an identity
    ///
    /// Returns `None` for locally created identities and for malformed
    /// values; the latter are logged.
    pub fn of(identity: &Identity) -> Option<Self> {
        let value = identity.property(REP_EXTERNAL_ID)?;
        match Self::parse(value) {
            Ok(provenance) => Some(provenance),
            Err(e) => {
                debug!("Ignoring provenance of {}: {}", identity, e);
                None
            }
        }
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider_name.as_deref()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider_name {
            Some(provider) => write!(f, "{}{}{}", self.external_id, SEPARATOR, provider),
            None => f.write_str(&self.external_id),
        }
    }
}

impl FromStr for Provenance {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Provider name of an externally synced user
///
/// Groups never gain automatic membership, so they always yield `None`, as do
/// users without a provider-qualified provenance.
pub fn provider_name_of(identity: &Identity) -> Option<String> {
    if identity.is_group() {
        return None;
    }
    Provenance::of(identity)?.provider_name
}
