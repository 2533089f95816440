//! Content-store query boundary and the reverse-lookup statement
//!
//! Automatic memberships are never stored, so finding the members of an
//! automatic group means searching user provenance for the provider suffix.

use std::collections::HashMap;
use std::fmt;

use crate::error::QueryError;
use crate::pattern::provider_suffix_pattern;
use crate::types::{NT_USER, REP_AUTHORIZABLE_ID, REP_EXTERNAL_ID};

/// Binding that carries the provenance pattern
pub const BINDING_AUTHORIZABLE_IDS: &str = "authorizableIds";

/// Hint allowing the engine to answer without a supporting index
pub const TRAVERSAL_HINT: &str = " OPTION(TRAVERSAL OK)";

/// Query language of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLanguage {
    Sql2,
}

/// Query statement in the store's native language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub text: String,
    pub language: QueryLanguage,
}

impl Statement {
    pub fn sql2(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: QueryLanguage::Sql2,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Named string bindings for `$name` placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(HashMap<String, String>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a placeholder name
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// One result row of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Path of the matching node
    pub path: String,
}

/// Lazy, forward-only sequence of result rows
pub type RowIter<'a> = Box<dyn Iterator<Item = ResultRow> + 'a>;

/// Query engine of the content store
pub trait QueryEngine: Send + Sync {
    /// Parse and run a statement
    ///
    /// Parse and execution failures are reported before any row is produced.
    fn execute<'a>(
        &'a self,
        statement: &Statement,
        bindings: &Bindings,
    ) -> Result<RowIter<'a>, QueryError>;
}

/// Query selecting users synced from one identity provider
///
/// Matches stored provenance values ending in `;<providerName>`. The external
/// id may contain `;` since only the suffix is anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersQuery {
    pub statement: Statement,
    pub bindings: Bindings,
}

impl MembersQuery {
    pub fn for_provider(provider_name: &str) -> Self {
        let text = format!(
            "SELECT [{}] FROM [{}] WHERE PROPERTY([{}], 'String') LIKE ${}{}",
            REP_AUTHORIZABLE_ID, NT_USER, REP_EXTERNAL_ID, BINDING_AUTHORIZABLE_IDS, TRAVERSAL_HINT
        );
        let bindings = Bindings::new().bind(
            BINDING_AUTHORIZABLE_IDS,
            provider_suffix_pattern(provider_name),
        );

        Self {
            statement: Statement::sql2(text),
            bindings,
        }
    }

    /// Run the query
    pub fn execute<'a>(&self, engine: &'a dyn QueryEngine) -> Result<RowIter<'a>, QueryError> {
        engine.execute(&self.statement, &self.bindings)
    }
}
