//! Dynamic membership
//!
//! Membership that is derived at query time instead of stored as edges of the
//! real membership graph. The directory service consults providers of this
//! kind next to persisted membership.

pub mod distinct;
pub mod inherited;
pub mod provider;

pub use distinct::Distinct;
pub use inherited::InheritedMembership;
pub use provider::AutoMembershipProvider;

use crate::directory::{GroupIter, IdentityIter};
use crate::error::Result;
use crate::types::Identity;

/// Source of derived group membership
pub trait DynamicMembershipProvider: Send + Sync {
    /// Whether this provider lists every member of the group
    ///
    /// When `false`, callers must also consult persisted membership.
    fn covers_all_members(&self, group: &Identity) -> bool;

    /// Members of the group known to this provider
    ///
    /// # Errors
    ///
    /// Fails as a whole if the members cannot be looked up; individual
    /// members that fail to resolve are dropped.
    fn get_members<'a>(&'a self, group: &Identity, include_inherited: bool) -> Result<IdentityIter<'a>>;

    /// Whether the identity is a member of the group according to this provider
    fn is_member(&self, group: &Identity, identity: &Identity, include_inherited: bool) -> Result<bool>;

    /// Groups the identity is a member of according to this provider
    fn get_membership<'a>(&'a self, identity: &Identity, include_inherited: bool) -> Result<GroupIter<'a>>;
}
