//! Auto-membership configuration
//!
//! Maps an identity provider name to the groups every user synced from that
//! provider automatically belongs to, plus the reverse index from a group
//! principal to the provider names referencing it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, warn};

use crate::directory::{Directory, Resolved};
use crate::error::ConfigError;
use crate::types::{Identity, PrincipalName};

/// Provider name to automatic group lookups
pub trait AutoMembershipConfig: Send + Sync {
    /// Automatic groups for users of a provider, in configuration order
    fn principals_for(&self, provider_name: &str) -> &[PrincipalName];

    /// Providers whose users are automatic members of the group
    fn provider_names_for(&self, principal: &PrincipalName) -> &[String];
}

/// Serializable auto-membership settings
///
/// ```json
/// { "mapping": { "ldap": ["everyone-ldap", "employees"] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoMembershipSettings {
    /// Provider name to group ids
    #[serde(default)]
    pub mapping: BTreeMap<String, Vec<String>>,
}

impl AutoMembershipSettings {
    /// Add the groups of one provider
    pub fn with_provider<I, S>(mut self, provider_name: impl Into<String>, group_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mapping
            .entry(provider_name.into())
            .or_default()
            .extend(group_ids.into_iter().map(Into::into));
        self
    }

    /// Parse and validate settings from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate settings from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check provider names and group ids
    ///
    /// Provider names must be non-empty and free of `;`, the provenance
    /// separator. Group ids must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (provider_name, group_ids) in &self.mapping {
            check_provider_name(provider_name)?;
            if group_ids.iter().any(String::is_empty) {
                return Err(ConfigError::Invalid(format!(
                    "Provider '{}' has an empty group id",
                    provider_name
                )));
            }
        }
        Ok(())
    }
}

/// Provider names end a provenance value, so they cannot be empty or hold `;`
fn check_provider_name(provider_name: &str) -> Result<(), ConfigError> {
    if provider_name.is_empty() {
        return Err(ConfigError::Invalid(
            "Provider name cannot be empty".to_string(),
        ));
    }
    if provider_name.contains(';') {
        return Err(ConfigError::Invalid(format!(
            "Provider name '{}' cannot contain ';'",
            provider_name
        )));
    }
    Ok(())
}

/// In-memory auto-membership configuration with a precomputed reverse index
#[derive(Debug, Clone, Default)]
pub struct AutoMembershipPrincipals {
    by_provider: HashMap<String, Vec<PrincipalName>>,
    by_principal: HashMap<PrincipalName, Vec<String>>,
}

impl AutoMembershipPrincipals {
    /// Build from provider name to group principal mapping
    ///
    /// Duplicate principals of one provider keep their first position.
    /// Providers whose name could never end a provenance value are dropped.
    pub fn from_principals<I, P, G>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (P, G)>,
        P: Into<String>,
        G: IntoIterator<Item = PrincipalName>,
    {
        let mut by_provider: HashMap<String, Vec<PrincipalName>> = HashMap::new();
        for (provider_name, principals) in mapping {
            let provider_name = provider_name.into();
            if let Err(e) = check_provider_name(&provider_name) {
                warn!("Ignoring auto-membership provider: {}", e);
                continue;
            }
            let entry = by_provider.entry(provider_name).or_default();
            for principal in principals {
                if !entry.contains(&principal) {
                    entry.push(principal);
                }
            }
        }

        let mut reverse: HashMap<PrincipalName, BTreeSet<String>> = HashMap::new();
        for (provider_name, principals) in &by_provider {
            for principal in principals {
                reverse
                    .entry(principal.clone())
                    .or_default()
                    .insert(provider_name.clone());
            }
        }
        let by_principal = reverse
            .into_iter()
            .map(|(principal, names)| (principal, names.into_iter().collect()))
            .collect();

        Self {
            by_provider,
            by_principal,
        }
    }

    /// Resolve configured group ids to principals through the directory
    ///
    /// Ids that do not resolve, or resolve to a user, are dropped.
    pub fn resolve(settings: &AutoMembershipSettings, directory: &dyn Directory) -> Self {
        let mapping = settings.mapping.iter().map(|(provider_name, group_ids)| {
            let principals: Vec<PrincipalName> = group_ids
                .iter()
                .filter_map(|id| {
                    match Resolved::<Identity>::group_from_lookup(directory.authorizable_by_id(id)) {
                        Resolved::Found(group) => Some(group.principal),
                        Resolved::Skipped(reason) => {
                            warn!(
                                "Ignoring auto-membership group '{}' of provider '{}': {}",
                                id, provider_name, reason
                            );
                            None
                        }
                    }
                })
                .collect();
            debug!(
                "Provider '{}' grants {} automatic group(s)",
                provider_name,
                principals.len()
            );
            (provider_name.clone(), principals)
        });

        Self::from_principals(mapping)
    }

    /// Names of all configured providers
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.by_provider.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_provider.values().all(Vec::is_empty)
    }
}

impl AutoMembershipConfig for AutoMembershipPrincipals {
    fn principals_for(&self, provider_name: &str) -> &[PrincipalName] {
        self.by_provider
            .get(provider_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn provider_names_for(&self, principal: &PrincipalName) -> &[String] {
        self.by_principal
            .get(principal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
