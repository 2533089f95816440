//! Automatic membership for users synced from an external identity provider
//!
//! Every user whose provenance names provider `p` is a member of the groups
//! configured for `p`. Nothing is stored: answers are recomputed from the
//! configuration, the provenance and the real membership graph on each call.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cretoai_automembership::{
//!     AutoMembershipPrincipals, AutoMembershipProvider, DynamicMembershipProvider,
//!     Identity, InMemoryStore, PrincipalName, Provenance,
//! };
//!
//! let store = Arc::new(InMemoryStore::new());
//! let everyone = Identity::group("everyone-ldap", "everyone-ldap", "/groups/everyone-ldap");
//! store.insert(everyone.clone());
//! let alice = Identity::user("alice", "alice", "/users/alice")
//!     .with_provenance(&Provenance::new("cn=alice", "ldap"));
//! store.insert(alice.clone());
//!
//! let config = AutoMembershipPrincipals::from_principals(vec![(
//!     "ldap",
//!     vec![PrincipalName::from("everyone-ldap")],
//! )]);
//! let provider = AutoMembershipProvider::new(store.clone(), store.clone(), Arc::new(config));
//!
//! assert!(provider.is_member(&everyone, &alice, false).unwrap());
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use super::{Distinct, DynamicMembershipProvider, InheritedMembership};
use crate::config::{AutoMembershipConfig, AutoMembershipPrincipals, AutoMembershipSettings};
use crate::directory::{Directory, GroupIter, IdentityIter, Resolved};
use crate::error::{AutoMembershipError, Result};
use crate::provenance::provider_name_of;
use crate::query::{MembersQuery, QueryEngine, RowIter};
use crate::types::Identity;

/// Derives group membership from identity provenance
pub struct AutoMembershipProvider {
    directory: Arc<dyn Directory>,
    query_engine: Arc<dyn QueryEngine>,
    config: Arc<dyn AutoMembershipConfig>,
}

impl AutoMembershipProvider {
    pub fn new(
        directory: Arc<dyn Directory>,
        query_engine: Arc<dyn QueryEngine>,
        config: Arc<dyn AutoMembershipConfig>,
    ) -> Self {
        Self {
            directory,
            query_engine,
            config,
        }
    }

    /// Create a provider from settings, resolving group ids through the directory
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn from_settings(
        settings: &AutoMembershipSettings,
        directory: Arc<dyn Directory>,
        query_engine: Arc<dyn QueryEngine>,
    ) -> Result<Self> {
        settings.validate()?;
        let principals = AutoMembershipPrincipals::resolve(settings, directory.as_ref());
        info!(
            "AutoMembershipProvider initialized for {} provider(s)",
            settings.mapping.len()
        );
        Ok(Self::new(directory, query_engine, Arc::new(principals)))
    }

    /// Configured groups of the provider that still resolve, in configuration order
    fn direct_groups<'a>(&'a self, provider_name: &str) -> GroupIter<'a> {
        let directory = self.directory.as_ref();
        let groups: Vec<Identity> = self
            .config
            .principals_for(provider_name)
            .iter()
            .filter_map(|principal| {
                Resolved::<Identity>::group_from_lookup(directory.authorizable(principal))
                    .log_skip("auto-membership group", principal.as_str())
            })
            .collect();
        Box::new(groups.into_iter())
    }

    /// Map result rows to identities, dropping rows that no longer resolve
    fn resolve_rows<'a>(&'a self, rows: RowIter<'a>) -> IdentityIter<'a> {
        let directory = self.directory.as_ref();
        Box::new(rows.filter_map(move |row| {
            Resolved::<Identity>::from_lookup(directory.authorizable_by_path(&row.path))
                .log_skip("member", &row.path)
        }))
    }
}

impl DynamicMembershipProvider for AutoMembershipProvider {
    fn covers_all_members(&self, _group: &Identity) -> bool {
        false
    }

    fn get_members<'a>(&'a self, group: &Identity, _include_inherited: bool) -> Result<IdentityIter<'a>> {
        let principal = match self.directory.principal_of(group) {
            Ok(Some(principal)) => principal,
            Ok(None) => return Ok(Box::new(std::iter::empty())),
            Err(e) => {
                debug!("Cannot resolve principal of {}: {}", group, e);
                return Ok(Box::new(std::iter::empty()));
            }
        };

        let provider_names = self.config.provider_names_for(&principal);
        if provider_names.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        // Only users are automatic members, so there is nothing inherited to add.
        let mut results = Vec::with_capacity(provider_names.len());
        for provider_name in provider_names {
            let rows = MembersQuery::for_provider(provider_name)
                .execute(self.query_engine.as_ref())
                .map_err(|source| AutoMembershipError::Enumeration {
                    group: group.id.clone(),
                    source,
                })?;
            results.push(self.resolve_rows(rows));
        }

        Ok(Box::new(results.into_iter().flatten()))
    }

    fn is_member(&self, group: &Identity, identity: &Identity, _include_inherited: bool) -> Result<bool> {
        // Only the configured groups count; ancestors of them are not expanded here.
        let Some(provider_name) = provider_name_of(identity) else {
            return Ok(false);
        };
        Ok(self
            .config
            .principals_for(&provider_name)
            .contains(&group.principal))
    }

    fn get_membership<'a>(&'a self, identity: &Identity, include_inherited: bool) -> Result<GroupIter<'a>> {
        let Some(provider_name) = provider_name_of(identity) else {
            return Ok(Box::new(std::iter::empty()));
        };

        let direct = self.direct_groups(&provider_name);
        if !include_inherited {
            return Ok(direct);
        }

        let inherited = InheritedMembership::new(self.directory.as_ref(), direct);
        Ok(Box::new(Distinct::new(inherited)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::memory::InMemoryStore;
    use crate::provenance::Provenance;
    use crate::query::{Bindings, Statement};
    use crate::types::PrincipalName;

    struct BrokenEngine;

    impl QueryEngine for BrokenEngine {
        fn execute<'a>(&'a self, statement: &Statement, _bindings: &Bindings) -> std::result::Result<RowIter<'a>, QueryError> {
            Err(QueryError::Parse(statement.text.clone()))
        }
    }

    fn setup() -> (Arc<InMemoryStore>, Identity, Identity) {
        let store = Arc::new(InMemoryStore::new());
        let group = Identity::group("everyone-ldap", "everyone-ldap", "/groups/everyone-ldap");
        let user = Identity::user("alice", "alice", "/users/alice")
            .with_provenance(&Provenance::new("cn=alice", "ldap"));
        store.insert(group.clone());
        store.insert(user.clone());
        (store, group, user)
    }

    fn config() -> Arc<AutoMembershipPrincipals> {
        Arc::new(AutoMembershipPrincipals::from_principals(vec![(
            "ldap",
            vec![PrincipalName::from("everyone-ldap")],
        )]))
    }

    #[test]
    fn test_covers_all_members_is_false() {
        let (store, group, _) = setup();
        let provider = AutoMembershipProvider::new(store.clone(), store, config());
        assert!(!provider.covers_all_members(&group));
    }

    #[test]
    fn test_is_member() {
        let (store, group, user) = setup();
        let provider = AutoMembershipProvider::new(store.clone(), store, config());

        assert!(provider.is_member(&group, &user, false).unwrap());
        assert!(provider.is_member(&group, &user, true).unwrap());

        let other = Identity::group("other", "other", "/groups/other");
        assert!(!provider.is_member(&other, &user, false).unwrap());
    }

    #[test]
    fn test_get_members_failure_names_group() {
        let (store, group, _) = setup();
        let provider = AutoMembershipProvider::new(store, Arc::new(BrokenEngine), config());

        match provider.get_members(&group, false) {
            Err(AutoMembershipError::Enumeration { group: id, source }) => {
                assert_eq!(id, "everyone-ldap");
                assert!(matches!(source, QueryError::Parse(_)));
            }
            Err(other) => panic!("Expected Enumeration error, got {}", other),
            Ok(_) => panic!("Expected Enumeration error"),
        };
    }

    #[test]
    fn test_get_members_skips_query_for_unconfigured_group() {
        let (store, _, _) = setup();
        let provider = AutoMembershipProvider::new(store.clone(), Arc::new(BrokenEngine), config());

        let unconfigured = Identity::group("staff", "staff", "/groups/staff");
        store.insert(unconfigured.clone());

        assert_eq!(provider.get_members(&unconfigured, false).unwrap().count(), 0);
    }

    #[test]
    fn test_from_settings_resolves_group_ids() {
        let (store, group, user) = setup();
        let settings = AutoMembershipSettings::default()
            .with_provider("ldap", ["everyone-ldap", "missing", "alice"]);

        let provider = AutoMembershipProvider::from_settings(&settings, store.clone(), store).unwrap();

        let groups: Vec<String> = provider
            .get_membership(&user, false)
            .unwrap()
            .map(|g| g.id)
            .collect();
        assert_eq!(groups, vec![group.id]);
    }

    #[test]
    fn test_from_settings_rejects_invalid_settings() {
        let (store, _, _) = setup();
        let settings = AutoMembershipSettings::default().with_provider("ld;ap", ["everyone-ldap"]);

        assert!(matches!(
            AutoMembershipProvider::from_settings(&settings, store.clone(), store),
            Err(AutoMembershipError::Config(_))
        ));
    }
}
