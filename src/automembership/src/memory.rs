//! In-memory content store
//!
//! Implements both the [`Directory`] and the [`QueryEngine`] collaborators
//! over a small set of identities and real membership edges. Used by tests,
//! benchmarks and embedders without a repository.

use parking_lot::RwLock;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::directory::{Directory, GroupIter};
use crate::error::{DirectoryError, QueryError};
use crate::pattern::like_matches;
use crate::query::{Bindings, QueryEngine, QueryLanguage, ResultRow, RowIter, Statement};
use crate::types::{Identity, IdentityKind, PrincipalName};

const STATEMENT_PATTERN: &str = r"^SELECT \[[^\]]+\] FROM \[(?P<node_type>[^\]]+)\] WHERE PROPERTY\(\[(?P<property>[^\]]+)\], 'String'\) LIKE \$(?P<binding>\w+)(?P<hint> OPTION\(TRAVERSAL OK\))?$";

#[derive(Debug, Default)]
struct StoreState {
    /// Ids in insertion order
    order: Vec<String>,
    by_id: HashMap<String, Identity>,
    by_principal: HashMap<PrincipalName, String>,
    by_path: HashMap<String, String>,
    /// Member id to ids of the groups it is declared in
    declared: HashMap<String, Vec<String>>,
    /// Groups whose membership traversal fails
    failing: HashSet<String>,
}

/// Content store held in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an identity
    pub fn insert(&self, identity: Identity) {
        let mut state = self.state.write();
        if let Some(previous) = state.by_id.remove(&identity.id) {
            state.by_principal.remove(&previous.principal);
            state.by_path.remove(&previous.path);
        } else {
            state.order.push(identity.id.clone());
        }
        state
            .by_principal
            .insert(identity.principal.clone(), identity.id.clone());
        state.by_path.insert(identity.path.clone(), identity.id.clone());
        state.by_id.insert(identity.id.clone(), identity);
    }

    /// Declare `member_id` a real member of `group_id`
    pub fn add_member(&self, group_id: &str, member_id: &str) {
        let mut state = self.state.write();
        let groups = state.declared.entry(member_id.to_string()).or_default();
        if !groups.iter().any(|g| g == group_id) {
            groups.push(group_id.to_string());
        }
    }

    /// Remove an identity and the edges it declares
    ///
    /// Edges of other members pointing at it are kept, as a concurrent
    /// deletion would leave them.
    pub fn remove(&self, id: &str) -> Option<Identity> {
        let mut state = self.state.write();
        let identity = state.by_id.remove(id)?;
        state.by_principal.remove(&identity.principal);
        state.by_path.remove(&identity.path);
        state.declared.remove(id);
        state.order.retain(|existing| existing != id);
        Some(identity)
    }

    /// Make membership traversal of a group fail
    pub fn fail_membership_of(&self, group_id: &str) {
        self.state.write().failing.insert(group_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.state.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Directory for InMemoryStore {
    fn authorizable(&self, principal: &PrincipalName) -> Result<Option<Identity>, DirectoryError> {
        let state = self.state.read();
        Ok(state
            .by_principal
            .get(principal)
            .and_then(|id| state.by_id.get(id))
            .cloned())
    }

    fn authorizable_by_id(&self, id: &str) -> Result<Option<Identity>, DirectoryError> {
        Ok(self.state.read().by_id.get(id).cloned())
    }

    fn authorizable_by_path(&self, path: &str) -> Result<Option<Identity>, DirectoryError> {
        let state = self.state.read();
        Ok(state
            .by_path
            .get(path)
            .and_then(|id| state.by_id.get(id))
            .cloned())
    }

    fn principal_of(&self, identity: &Identity) -> Result<Option<PrincipalName>, DirectoryError> {
        Ok(self
            .state
            .read()
            .by_id
            .get(&identity.id)
            .map(|current| current.principal.clone()))
    }

    fn member_of<'a>(&'a self, group: &Identity) -> Result<GroupIter<'a>, DirectoryError> {
        let state = self.state.read();
        if state.failing.contains(&group.id) {
            return Err(DirectoryError::Traversal(
                group.id.clone(),
                "membership unavailable".to_string(),
            ));
        }

        let pending: VecDeque<String> = state
            .declared
            .get(&group.id)
            .map(|groups| groups.iter().cloned().collect())
            .unwrap_or_default();

        Ok(Box::new(AncestorIter {
            store: self,
            pending,
            visited: HashSet::from([group.id.clone()]),
        }))
    }
}

/// Breadth-first walk over declared group memberships
///
/// Each group is yielded at most once; the start group never is.
struct AncestorIter<'a> {
    store: &'a InMemoryStore,
    pending: VecDeque<String>,
    visited: HashSet<String>,
}

impl Iterator for AncestorIter<'_> {
    type Item = Identity;

    fn next(&mut self) -> Option<Identity> {
        while let Some(id) = self.pending.pop_front() {
            if !self.visited.insert(id.clone()) {
                continue;
            }

            let state = self.store.state.read();
            if let Some(parents) = state.declared.get(&id) {
                self.pending.extend(parents.iter().cloned());
            }
            // Dangling edges to deleted groups are skipped
            match state.by_id.get(&id) {
                Some(group) if group.is_group() => return Some(group.clone()),
                _ => continue,
            }
        }
        None
    }
}

impl QueryEngine for InMemoryStore {
    fn execute<'a>(
        &'a self,
        statement: &Statement,
        bindings: &Bindings,
    ) -> Result<RowIter<'a>, QueryError> {
        if statement.language != QueryLanguage::Sql2 {
            return Err(QueryError::Parse(format!(
                "unsupported language {:?}",
                statement.language
            )));
        }

        let regex = Regex::new(STATEMENT_PATTERN).map_err(|e| QueryError::Parse(e.to_string()))?;
        let captures = regex
            .captures(&statement.text)
            .ok_or_else(|| QueryError::Parse(statement.text.clone()))?;

        let node_type = &captures["node_type"];
        let property = &captures["property"];
        let binding = &captures["binding"];

        let kind = [IdentityKind::User, IdentityKind::Group]
            .into_iter()
            .find(|kind| kind.node_type() == node_type)
            .ok_or_else(|| QueryError::Parse(format!("unknown node type [{}]", node_type)))?;
        let pattern = bindings
            .get(binding)
            .ok_or_else(|| QueryError::MissingBinding(binding.to_string()))?;

        // Nothing is indexed here, so every query is a traversal
        if captures.name("hint").is_none() {
            return Err(QueryError::Execution(format!(
                "no index for [{}] and traversal not permitted",
                property
            )));
        }

        let state = self.state.read();
        let rows: Vec<ResultRow> = state
            .order
            .iter()
            .filter_map(|id| state.by_id.get(id))
            .filter(|identity| identity.kind == kind)
            .filter(|identity| {
                identity
                    .property(property)
                    .is_some_and(|value| like_matches(pattern, value))
            })
            .map(|identity| ResultRow {
                path: identity.path.clone(),
            })
            .collect();

        Ok(Box::new(rows.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::Provenance;
    use crate::query::MembersQuery;

    fn store_with_graph() -> InMemoryStore {
        let store = InMemoryStore::new();
        for id in ["g1", "g2", "g3", "g4"] {
            store.insert(Identity::group(id, format!("{}-principal", id), format!("/groups/{}", id)));
        }
        // g1 -> g2 -> g3 -> g1 (cycle), g2 -> g4
        store.add_member("g2", "g1");
        store.add_member("g3", "g2");
        store.add_member("g1", "g3");
        store.add_member("g4", "g2");
        store
    }

    fn ids(groups: impl Iterator<Item = Identity>) -> Vec<String> {
        groups.map(|g| g.id).collect()
    }

    #[test]
    fn test_lookups() {
        let store = InMemoryStore::new();
        store.insert(Identity::user("alice", "alice-p", "/users/alice"));

        let by_principal = store.authorizable(&PrincipalName::from("alice-p")).unwrap();
        assert_eq!(by_principal.map(|i| i.id), Some("alice".to_string()));
        assert!(store.authorizable_by_id("alice").unwrap().is_some());
        assert!(store.authorizable_by_path("/users/alice").unwrap().is_some());
        assert!(store.authorizable_by_path("/users/bob").unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_replaces_indexes() {
        let store = InMemoryStore::new();
        store.insert(Identity::user("alice", "alice-p", "/users/alice"));
        store.insert(Identity::user("alice", "alice-q", "/users/a/alice"));

        assert_eq!(store.len(), 1);
        assert!(store.authorizable(&PrincipalName::from("alice-p")).unwrap().is_none());
        assert!(store.authorizable_by_path("/users/alice").unwrap().is_none());
        assert!(store.authorizable_by_path("/users/a/alice").unwrap().is_some());
    }

    #[test]
    fn test_member_of_is_transitive_and_cycle_safe() {
        let store = store_with_graph();
        let g1 = store.authorizable_by_id("g1").unwrap().unwrap();

        let ancestors = ids(store.member_of(&g1).unwrap());
        assert_eq!(ancestors, vec!["g2", "g3", "g4"]);
    }

    #[test]
    fn test_member_of_skips_deleted_groups() {
        let store = store_with_graph();
        let g1 = store.authorizable_by_id("g1").unwrap().unwrap();
        store.remove("g2");

        // g2 declared g3 and g4, those edges went with it
        assert!(ids(store.member_of(&g1).unwrap()).is_empty());
    }

    #[test]
    fn test_member_of_failure() {
        let store = store_with_graph();
        let g1 = store.authorizable_by_id("g1").unwrap().unwrap();
        store.fail_membership_of("g1");

        assert!(matches!(
            store.member_of(&g1),
            Err(DirectoryError::Traversal(ref id, _)) if id == "g1"
        ));
    }

    #[test]
    fn test_principal_of_removed_identity() {
        let store = store_with_graph();
        let g1 = store.authorizable_by_id("g1").unwrap().unwrap();
        assert_eq!(
            store.principal_of(&g1).unwrap(),
            Some(PrincipalName::from("g1-principal"))
        );

        store.remove("g1");
        assert_eq!(store.principal_of(&g1).unwrap(), None);
    }

    #[test]
    fn test_members_query_execution() {
        let store = InMemoryStore::new();
        store.insert(
            Identity::user("u1", "u1", "/users/u1").with_provenance(&Provenance::new("u1", "ldap")),
        );
        store.insert(
            Identity::user("u2", "u2", "/users/u2").with_provenance(&Provenance::new("x;y", "ldap")),
        );
        store.insert(
            Identity::user("u3", "u3", "/users/u3").with_provenance(&Provenance::new("u3", "saml")),
        );
        store.insert(
            Identity::group("g", "g", "/groups/g").with_provenance(&Provenance::new("g", "ldap")),
        );

        let rows: Vec<String> = MembersQuery::for_provider("ldap")
            .execute(&store)
            .unwrap()
            .map(|row| row.path)
            .collect();
        assert_eq!(rows, vec!["/users/u1", "/users/u2"]);
    }

    #[test]
    fn test_query_errors() {
        let store = InMemoryStore::new();

        let garbage = Statement::sql2("SELEKT * FROM users");
        assert!(matches!(
            store.execute(&garbage, &Bindings::new()),
            Err(QueryError::Parse(_))
        ));

        let query = MembersQuery::for_provider("ldap");
        assert!(matches!(
            store.execute(&query.statement, &Bindings::new()),
            Err(QueryError::MissingBinding(ref name)) if name == "authorizableIds"
        ));

        let without_hint = Statement::sql2(
            query.statement.text.trim_end_matches(crate::query::TRAVERSAL_HINT),
        );
        assert!(matches!(
            store.execute(&without_hint, &query.bindings),
            Err(QueryError::Execution(_))
        ));
    }
}
