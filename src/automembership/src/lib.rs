//! # CretoAI Automatic Membership
//!
//! Synthetic group membership for identities synced from an external
//! identity provider.
//!
//! ## Features
//!
//! - **Derived, never stored**: membership follows from a provider-name to
//!   group mapping and the provenance recorded on each synced user
//! - **Both directions**: user to groups from the configuration, group to
//!   users through a provenance search in the content store
//! - **Inherited closure**: lazy, breadth-first merge with the real
//!   membership graph, with duplicate suppression and cycle safety
//! - **Pluggable collaborators**: directory, query engine and configuration
//!   are traits; [`InMemoryStore`] implements the first two
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cretoai_automembership::{
//!     AutoMembershipProvider, AutoMembershipSettings, DynamicMembershipProvider,
//!     Identity, InMemoryStore, Provenance,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new());
//! store.insert(Identity::group("everyone-ldap", "everyone-ldap", "/groups/everyone-ldap"));
//! store.insert(Identity::group("employees", "employees", "/groups/employees"));
//! store.add_member("employees", "everyone-ldap");
//!
//! let alice = Identity::user("alice", "alice", "/users/alice")
//!     .with_provenance(&Provenance::new("cn=alice,ou=people", "ldap"));
//! store.insert(alice.clone());
//!
//! let settings = AutoMembershipSettings::from_json_str(
//!     r#"{ "mapping": { "ldap": ["everyone-ldap"] } }"#,
//! )?;
//! let provider = AutoMembershipProvider::from_settings(&settings, store.clone(), store.clone())?;
//!
//! let groups: Vec<String> = provider.get_membership(&alice, true)?.map(|g| g.id).collect();
//! assert_eq!(groups, vec!["everyone-ldap", "employees"]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod membership;
pub mod memory;
pub mod pattern;
pub mod provenance;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use config::{AutoMembershipConfig, AutoMembershipPrincipals, AutoMembershipSettings};
pub use directory::{Directory, GroupIter, IdentityIter, Resolved, SkipReason};
pub use error::{
    AutoMembershipError, ConfigError, DirectoryError, ProvenanceError, QueryError, Result,
};
pub use membership::{AutoMembershipProvider, DynamicMembershipProvider};
pub use memory::InMemoryStore;
pub use provenance::Provenance;
pub use query::{Bindings, MembersQuery, QueryEngine, ResultRow, Statement};
pub use types::{Identity, IdentityKind, PrincipalName};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
