//! Property tests for the piece chain and the undo tree.

use proptest::prelude::*;
use vise_buffer::{PieceChain, Text};

#[derive(Debug, Clone)]
enum Edit {
    Insert(usize, Vec<u8>),
    Delete(usize, usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), prop::collection::vec(b'a'..=b'z', 1..8))
            .prop_map(|(pos, bytes)| Edit::Insert(pos, bytes)),
        (any::<usize>(), 0usize..6).prop_map(|(pos, len)| Edit::Delete(pos, len)),
    ]
}

/// Applies `edit` to both the chain and a plain vector model.
fn apply(text: &mut Text, model: &mut Vec<u8>, edit: &Edit) {
    match edit {
        Edit::Insert(pos, bytes) => {
            let pos = pos % (model.len() + 1);
            text.insert(pos, bytes).unwrap();
            model.splice(pos..pos, bytes.iter().copied());
        }
        Edit::Delete(pos, len) => {
            let start = pos % (model.len() + 1);
            let end = (start + len).min(model.len());
            text.delete(start..end).unwrap();
            model.drain(start..end);
        }
    }
}

fn piece_total(chain: &PieceChain) -> usize {
    chain.pieces().map(|p| p.len).sum()
}

proptest! {
    #[test]
    fn length_invariant_holds_after_every_splice(
        initial in "[a-z\n]{0,40}",
        edits in prop::collection::vec(edit(), 0..40),
    ) {
        let mut text = Text::from(initial.as_str());
        let mut model = initial.into_bytes();
        for e in &edits {
            apply(&mut text, &mut model, e);
            prop_assert_eq!(piece_total(text.chain()), text.len());
            prop_assert!(text.chain().pieces().all(|p| p.len > 0));
        }
        prop_assert_eq!(text.content(), model);
    }

    #[test]
    fn undo_restores_each_committed_state(
        initial in "[a-z]{0,20}",
        groups in prop::collection::vec(prop::collection::vec(edit(), 1..4), 1..12),
    ) {
        let mut text = Text::from(initial.as_str());
        let mut model = initial.into_bytes();
        let mut states = vec![model.clone()];
        for group in &groups {
            for e in group {
                apply(&mut text, &mut model, e);
            }
            if text.commit(0, 0).unwrap().is_some() {
                states.push(model.clone());
            }
        }

        let tip = text.content();
        for expected in states.iter().rev().skip(1) {
            text.undo().unwrap();
            prop_assert_eq!(&text.content(), expected);
        }
        prop_assert_eq!(text.undo().unwrap(), None);

        while text.redo().unwrap().is_some() {}
        prop_assert_eq!(text.content(), tip);
    }

    #[test]
    fn earlier_reaches_every_revision_across_branches(
        steps in prop::collection::vec((any::<bool>(), "[a-z]{1,4}"), 1..16),
    ) {
        // Every revision's content, indexed by creation order.
        let mut text = Text::new();
        let mut snapshots = vec![Vec::new()];
        for (undo_first, word) in &steps {
            if *undo_first {
                text.undo().unwrap();
            }
            let len = text.len();
            text.insert(len, word.as_bytes()).unwrap();
            text.commit(len, len + word.len()).unwrap();
            snapshots.push(text.content());
        }

        let current = text.history().current().index();
        for index in (0..current).rev() {
            text.earlier(1).unwrap();
            prop_assert_eq!(text.history().current().index(), index);
            prop_assert_eq!(&text.content(), &snapshots[index]);
        }
        for index in 1..snapshots.len() {
            text.later(1).unwrap();
            prop_assert_eq!(&text.content(), &snapshots[index]);
        }
    }
}
