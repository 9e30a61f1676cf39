//! Branching undo history.
//!
//! ## Learning: A Tree, not a Stack
//!
//! A classic undo stack throws the redo stack away as soon as a new edit
//! is made after an undo. Here every revision keeps a link to its parent
//! and to all of its children, so nothing the user ever typed is lost:
//!
//! ```text
//!          root
//!           │
//!           A ── undo ──┐
//!          ╱ ╲          │
//!         R   E ◀── new edit after undo
//! ```
//!
//! - `undo` / `redo` walk parent/child links (redo picks the newest child)
//! - `earlier` / `later` walk revisions in global creation order, which
//!   reaches `R` from `E` even though neither is an ancestor of the other
//!
//! A revision stores only the [`Splice`]s it made. Moving between two
//! revisions relinks pieces along the tree path between them; no bytes are
//! copied.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::chain::{PieceChain, Splice};
use crate::BufferResult;

/// Identifier of a revision; also its position in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RevisionId(usize);

impl RevisionId {
    /// The empty revision every history starts from.
    pub const ROOT: RevisionId = RevisionId(0);

    /// Creation sequence number.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One atomic, user-visible edit.
#[derive(Debug, Clone)]
pub struct Revision {
    parent: Option<RevisionId>,
    children: Vec<RevisionId>,
    splices: Vec<Splice>,
    cursor_before: usize,
    cursor_after: usize,
    created: SystemTime,
}

impl Revision {
    fn root() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            splices: Vec::new(),
            cursor_before: 0,
            cursor_after: 0,
            created: SystemTime::now(),
        }
    }

    pub fn parent(&self) -> Option<RevisionId> {
        self.parent
    }

    /// Children in creation order.
    pub fn children(&self) -> &[RevisionId] {
        &self.children
    }

    pub fn splices(&self) -> &[Splice] {
        &self.splices
    }

    pub fn cursor_before(&self) -> usize {
        self.cursor_before
    }

    pub fn cursor_after(&self) -> usize {
        self.cursor_after
    }

    pub fn created(&self) -> SystemTime {
        self.created
    }
}

/// The revision tree plus the group of edits not yet committed.
#[derive(Debug, Clone)]
pub struct History {
    revisions: Vec<Revision>,
    current: RevisionId,
    pending: Vec<Splice>,
    saved: RevisionId,
}

impl History {
    pub fn new() -> Self {
        Self {
            revisions: vec![Revision::root()],
            current: RevisionId::ROOT,
            pending: Vec::new(),
            saved: RevisionId::ROOT,
        }
    }

    /// Makes room for one more pending splice.
    pub(crate) fn reserve(&mut self) -> BufferResult<()> {
        self.pending.try_reserve(1)?;
        Ok(())
    }

    /// Adds an already applied splice to the pending group.
    pub(crate) fn record(&mut self, splice: Splice) {
        self.pending.push(splice);
    }

    /// Takes the newest pending splice back out of the chain.
    pub(crate) fn discard_last(&mut self, chain: &mut PieceChain) -> bool {
        match self.pending.pop() {
            Some(splice) => {
                chain.swap(&splice.new, &splice.old);
                true
            }
            None => false,
        }
    }

    /// True if edits were made since the last commit.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Splices of the uncommitted group, oldest first.
    pub fn pending(&self) -> &[Splice] {
        &self.pending
    }

    /// Turns the pending group into a new child of the current revision.
    ///
    /// Committing while the current revision already has children starts
    /// a new branch; the older branches stay reachable through
    /// [`earlier`](Self::earlier) and [`later`](Self::later).
    pub fn commit(
        &mut self,
        cursor_before: usize,
        cursor_after: usize,
    ) -> BufferResult<Option<RevisionId>> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        self.revisions.try_reserve(1)?;
        self.revisions[self.current.0].children.try_reserve(1)?;

        let id = RevisionId(self.revisions.len());
        self.revisions.push(Revision {
            parent: Some(self.current),
            children: Vec::new(),
            splices: std::mem::take(&mut self.pending),
            cursor_before,
            cursor_after,
            created: SystemTime::now(),
        });
        self.revisions[self.current.0].children.push(id);
        self.current = id;

        tracing::debug!(revision = %id, "committed revision");
        Ok(Some(id))
    }

    /// Moves to the parent revision. Returns the cursor to restore, or
    /// `None` at the root.
    pub fn undo(&mut self, chain: &mut PieceChain) -> Option<usize> {
        let id = self.current;
        let parent = self.revisions[id.0].parent?;
        self.revert(id, chain);
        self.current = parent;
        Some(self.revisions[id.0].cursor_before)
    }

    /// Moves to the most recently created child. Returns the cursor to
    /// restore, or `None` at a leaf.
    pub fn redo(&mut self, chain: &mut PieceChain) -> Option<usize> {
        let child = *self.revisions[self.current.0].children.last()?;
        self.apply(child, chain);
        self.current = child;
        Some(self.revisions[child.0].cursor_after)
    }

    /// Steps `count` revisions back in creation order.
    pub fn earlier(&mut self, count: usize, chain: &mut PieceChain) -> Option<usize> {
        let target = self.current.0.saturating_sub(count.max(1));
        self.goto(RevisionId(target), chain)
    }

    /// Steps `count` revisions forward in creation order.
    pub fn later(&mut self, count: usize, chain: &mut PieceChain) -> Option<usize> {
        let last = self.revisions.len() - 1;
        let target = self.current.0.saturating_add(count.max(1)).min(last);
        self.goto(RevisionId(target), chain)
    }

    /// Moves to an arbitrary revision along the tree path: undo up to the
    /// common ancestor, then redo down to `target`.
    pub fn goto(&mut self, target: RevisionId, chain: &mut PieceChain) -> Option<usize> {
        if target == self.current || target.0 >= self.revisions.len() {
            return None;
        }

        let ancestors = self.ancestors(self.current);
        let mut down = Vec::new();
        let mut lca = target;
        while !ancestors.contains(&lca) {
            down.push(lca);
            lca = self.revisions[lca.0].parent?;
        }

        let mut cursor = None;
        while self.current != lca {
            cursor = self.undo(chain);
        }
        for id in down.into_iter().rev() {
            self.apply(id, chain);
            self.current = id;
            cursor = Some(self.revisions[id.0].cursor_after);
        }

        tracing::debug!(revision = %self.current, "moved through history");
        cursor
    }

    fn ancestors(&self, mut id: RevisionId) -> Vec<RevisionId> {
        let mut out = vec![id];
        while let Some(parent) = self.revisions[id.0].parent {
            out.push(parent);
            id = parent;
        }
        out
    }

    fn apply(&self, id: RevisionId, chain: &mut PieceChain) {
        for splice in &self.revisions[id.0].splices {
            chain.swap(&splice.old, &splice.new);
        }
    }

    fn revert(&self, id: RevisionId, chain: &mut PieceChain) {
        for splice in self.revisions[id.0].splices.iter().rev() {
            chain.swap(&splice.new, &splice.old);
        }
    }

    // ==================== Queries ====================

    pub fn current(&self) -> RevisionId {
        self.current
    }

    pub fn revision(&self, id: RevisionId) -> Option<&Revision> {
        self.revisions.get(id.0)
    }

    /// Number of revisions including the root.
    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.len() == 1
    }

    pub fn can_undo(&self) -> bool {
        self.revisions[self.current.0].parent.is_some()
    }

    pub fn can_redo(&self) -> bool {
        !self.revisions[self.current.0].children.is_empty()
    }

    pub(crate) fn mark_saved(&mut self) {
        self.saved = self.current;
    }

    /// True if the current state differs from the last saved one.
    pub fn is_modified(&self) -> bool {
        self.current != self.saved || self.has_pending()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(chain: &mut PieceChain, history: &mut History, pos: usize, s: &str) {
        history.reserve().unwrap();
        let splice = chain.insert(pos, s.as_bytes()).unwrap().unwrap();
        history.record(splice);
        history.commit(pos, pos + s.len()).unwrap();
    }

    fn text(chain: &PieceChain) -> String {
        String::from_utf8(chain.content()).unwrap()
    }

    #[test]
    fn test_discard_last_restores_chain() {
        let mut chain = PieceChain::from("one two");
        let mut history = History::new();
        edit(&mut chain, &mut history, 0, ">");

        history.reserve().unwrap();
        let splice = chain.delete(1..5).unwrap().unwrap();
        history.record(splice);
        assert_eq!(text(&chain), ">two");

        assert!(history.discard_last(&mut chain));
        assert_eq!(text(&chain), ">one two");
        assert_eq!(chain.len(), 8);
        assert!(!history.has_pending());
        assert!(!history.discard_last(&mut chain));

        // The committed revision is untouched.
        history.undo(&mut chain);
        assert_eq!(text(&chain), "one two");
    }

    #[test]
    fn test_undo_redo_linear() {
        let mut chain = PieceChain::new();
        let mut history = History::new();
        edit(&mut chain, &mut history, 0, "a");
        edit(&mut chain, &mut history, 1, "b");

        assert_eq!(history.undo(&mut chain), Some(1));
        assert_eq!(text(&chain), "a");
        assert_eq!(history.redo(&mut chain), Some(2));
        assert_eq!(text(&chain), "ab");
        assert_eq!(history.redo(&mut chain), None);
    }

    #[test]
    fn test_undo_at_root_is_noop() {
        let mut chain = PieceChain::from("x");
        let mut history = History::new();
        assert_eq!(history.undo(&mut chain), None);
        assert_eq!(history.earlier(1, &mut chain), None);
        assert_eq!(history.later(1, &mut chain), None);
        assert_eq!(text(&chain), "x");
    }

    #[test]
    fn test_new_edit_after_undo_branches() {
        let mut chain = PieceChain::new();
        let mut history = History::new();
        edit(&mut chain, &mut history, 0, "A");
        edit(&mut chain, &mut history, 1, "R");
        history.undo(&mut chain);
        edit(&mut chain, &mut history, 1, "E");
        assert_eq!(text(&chain), "AE");

        let a = history.revision(RevisionId(1)).unwrap();
        assert_eq!(a.children(), &[RevisionId(2), RevisionId(3)]);

        // R is neither ancestor nor descendant of E, yet earlier() gets there.
        history.earlier(1, &mut chain);
        assert_eq!(history.current(), RevisionId(2));
        assert_eq!(text(&chain), "AR");

        history.later(1, &mut chain);
        assert_eq!(text(&chain), "AE");
    }

    #[test]
    fn test_redo_prefers_newest_child() {
        let mut chain = PieceChain::new();
        let mut history = History::new();
        edit(&mut chain, &mut history, 0, "1");
        history.undo(&mut chain);
        edit(&mut chain, &mut history, 0, "2");
        history.undo(&mut chain);
        history.redo(&mut chain);
        assert_eq!(text(&chain), "2");
    }

    #[test]
    fn test_commit_without_pending_is_none() {
        let mut history = History::new();
        assert_eq!(history.commit(0, 0).unwrap(), None);
        assert!(history.is_empty());
    }
}
