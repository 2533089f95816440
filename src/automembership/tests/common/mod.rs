//! Shared fixtures for automatic membership integration tests

#![allow(dead_code)]

use cretoai_automembership::{
    AutoMembershipPrincipals, AutoMembershipProvider, Identity, InMemoryStore, PrincipalName,
    Provenance,
};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a fmt subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn group(store: &InMemoryStore, id: &str) -> Identity {
    let group = Identity::group(id, format!("{}-principal", id), format!("/home/groups/{}", id));
    store.insert(group.clone());
    group
}

pub fn synced_user(store: &InMemoryStore, id: &str, external_id: &str, provider: &str) -> Identity {
    let user = Identity::user(id, id, format!("/home/users/{}", id))
        .with_provenance(&Provenance::new(external_id, provider));
    store.insert(user.clone());
    user
}

pub fn local_user(store: &InMemoryStore, id: &str) -> Identity {
    let user = Identity::user(id, id, format!("/home/users/{}", id));
    store.insert(user.clone());
    user
}

/// Configuration mapping each provider to the principals of the given group ids
pub fn config(mapping: &[(&str, &[&str])]) -> Arc<AutoMembershipPrincipals> {
    Arc::new(AutoMembershipPrincipals::from_principals(mapping.iter().map(
        |(provider, groups)| {
            (
                provider.to_string(),
                groups
                    .iter()
                    .map(|id| PrincipalName::from(format!("{}-principal", id)))
                    .collect::<Vec<_>>(),
            )
        },
    )))
}

pub fn provider(
    store: &Arc<InMemoryStore>,
    config: Arc<AutoMembershipPrincipals>,
) -> AutoMembershipProvider {
    init_tracing();
    AutoMembershipProvider::new(store.clone(), store.clone(), config)
}

pub fn ids(identities: impl Iterator<Item = Identity>) -> Vec<String> {
    identities.map(|identity| identity.id).collect()
}
