//! Lazy merge of direct groups with their real-graph ancestors

use std::collections::VecDeque;
use std::iter::Peekable;
use tracing::error;

use crate::directory::{Directory, GroupIter};
use crate::types::Identity;

/// Yields all direct groups first, then the ancestors of each direct group
///
/// Ancestor cursors are requested when their direct group is pulled and are
/// queued only if non-empty, then drained front to back. Single-pass and not
/// restartable; duplicates are left to [`super::Distinct`].
pub struct InheritedMembership<'a> {
    directory: &'a dyn Directory,
    direct: GroupIter<'a>,
    pending: VecDeque<Peekable<GroupIter<'a>>>,
}

impl<'a> InheritedMembership<'a> {
    pub fn new(directory: &'a dyn Directory, direct: GroupIter<'a>) -> Self {
        Self {
            directory,
            direct,
            pending: VecDeque::new(),
        }
    }

    fn enqueue_ancestors(&mut self, group: &Identity) {
        match self.directory.member_of(group) {
            Ok(ancestors) => {
                let mut ancestors = ancestors.peekable();
                if ancestors.peek().is_some() {
                    self.pending.push_back(ancestors);
                }
            }
            // Treated as a group without ancestors
            Err(e) => error!("Failed to retrieve membership of group {}: {}", group, e),
        }
    }
}

impl Iterator for InheritedMembership<'_> {
    type Item = Identity;

    fn next(&mut self) -> Option<Identity> {
        if let Some(group) = self.direct.next() {
            self.enqueue_ancestors(&group);
            return Some(group);
        }

        loop {
            let front = self.pending.front_mut()?;
            match front.next() {
                Some(ancestor) => return Some(ancestor),
                None => {
                    self.pending.pop_front();
                }
            }
        }
    }
}
