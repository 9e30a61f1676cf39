//! Property tests: arbitrary key sequences keep the editor consistent.

use proptest::prelude::*;
use vise_buffer::Text;
use vise_core::{Editor, Mode};

const KEYS: &[&str] = &[
    "h", "j", "k", "l", "w", "b", "e", "W", "0", "$", "^", "G", "gg", "}", "{", "%", "x", "X",
    "dd", "dw", "de", "d$", "cw", "cc", "yy", "yw", "p", "P", "u", "<C-r>", "g-", "g+", "J",
    "~", ">>", "<<", "r_", "v", "V", "o", "O", "a", "A", "I", "iab", "<Enter>", "<Backspace>",
    "<Escape>", "2", "3", "diw", "da(", "ci\"",
];

fn key() -> impl Strategy<Value = &'static str> {
    prop::sample::select(KEYS)
}

proptest! {
    #[test]
    fn cursor_stays_within_text(
        initial in "[a-z (){}\"\n]{0,40}",
        keys in prop::collection::vec(key(), 0..60),
    ) {
        let mut editor = Editor::new();
        editor.open_text(Text::from(initial.as_str())).unwrap();
        for k in &keys {
            // Individual commands may fail; the editor must stay usable.
            let _ = editor.feed_str(k);
            prop_assert!(editor.cursor() <= editor.content().len());
            if let Some(selection) = editor.selection() {
                prop_assert!(selection.start <= selection.end);
                prop_assert!(selection.end <= editor.content().len());
            }
        }
    }

    #[test]
    fn escape_always_returns_to_normal_mode(
        keys in prop::collection::vec(key(), 0..40),
    ) {
        let mut editor = Editor::new();
        editor.open_text(Text::from("one two\n(three)\n")).unwrap();
        for k in &keys {
            let _ = editor.feed_str(k);
        }
        let _ = editor.feed_str("<Escape><Escape>");
        prop_assert_eq!(editor.mode(), Mode::Normal);
        prop_assert!(editor.action_state().count.is_none());
    }

    #[test]
    fn undo_everything_restores_the_original(
        initial in "[a-z \n]{0,30}",
        keys in prop::collection::vec(key(), 0..40),
    ) {
        let mut editor = Editor::new();
        editor.open_text(Text::from(initial.as_str())).unwrap();
        for k in &keys {
            let _ = editor.feed_str(k);
        }
        let _ = editor.feed_str("<Escape><Escape>");
        for _ in 0..keys.len() + 1 {
            let _ = editor.feed_str("u");
        }
        prop_assert_eq!(editor.content(), initial.into_bytes());
    }
}
