//! Duplicate suppression for identity sequences

use std::collections::HashSet;

use crate::types::Identity;

/// Passes each identity through once, keyed by its stable id
pub struct Distinct<I> {
    inner: I,
    seen: HashSet<String>,
}

impl<I> Distinct<I>
where
    I: Iterator<Item = Identity>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
        }
    }
}

impl<I> Iterator for Distinct<I>
where
    I: Iterator<Item = Identity>,
{
    type Item = Identity;

    fn next(&mut self) -> Option<Identity> {
        self.inner
            .by_ref()
            .find(|identity| self.seen.insert(identity.id.clone()))
    }
}
