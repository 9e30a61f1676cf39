//! End-to-end editing sessions driven through the public API.

use std::fs;

use tempfile::TempDir;
use vise_buffer::Text;
use vise_core::register::{RegisterName, RegisterRef};
use vise_core::{Config, Editor, EditorEvent, EventHandler, Key, KeyQueue, Mode};

fn editor(content: &str) -> Editor {
    editor_with(Config::default(), content)
}

fn editor_with(config: Config, content: &str) -> Editor {
    let mut editor = Editor::with_config(config);
    editor.open_text(Text::from(content)).unwrap();
    editor
}

fn config(toml_src: &str) -> Config {
    toml::from_str(toml_src).unwrap()
}

fn warnings(events: &mut EventHandler) -> usize {
    events
        .drain()
        .iter()
        .filter(|e| matches!(e, EditorEvent::Warning(_)))
        .count()
}

// ==================== Control Loop ====================

#[test]
fn test_run_reads_keys_until_source_is_dry() {
    let mut editor = editor("abc def\n");
    let mut keys = KeyQueue::parse("dw");
    editor.run(&mut keys).unwrap();
    assert!(keys.is_empty());
    assert_eq!(editor.content(), b"def\n");

    keys.push_str("u");
    editor.run(&mut keys).unwrap();
    assert_eq!(editor.content(), b"abc def\n");
}

#[test]
fn test_run_flushes_pending_input_at_end() {
    let mut editor = editor("abc\n");
    editor.run(&mut KeyQueue::parse("ifoo")).unwrap();
    assert_eq!(editor.content(), b"fooabc\n");
    assert_eq!(editor.mode(), Mode::Insert);

    editor.run(&mut KeyQueue::parse("<Escape>")).unwrap();
    assert_eq!(editor.mode(), Mode::Normal);
}

#[test]
fn test_failed_command_is_reported_and_loop_continues() {
    let mut editor = editor("abc\n");
    let mut events = EventHandler::new(editor.subscribe());

    editor.run(&mut KeyQueue::parse("\"!x")).unwrap();
    assert_eq!(warnings(&mut events), 1);
    assert_eq!(editor.content(), b"bc\n");
}

// ==================== Registers ====================

#[test]
fn test_register_append() {
    let mut editor = editor("one\ntwo\n");
    editor.feed_str("\"ayyj\"Ayy").unwrap();

    let reg = editor.registers_mut().get(RegisterName::Named('a')).unwrap();
    assert_eq!(reg.data(), b"one\ntwo\n");
    assert!(reg.linewise());

    editor.feed_str("\"ap").unwrap();
    assert_eq!(editor.content(), b"one\ntwo\none\ntwo\n");
}

#[test]
fn test_blackhole_leaves_unnamed_untouched() {
    let mut editor = editor("abc def\n");
    editor.feed_str("yiw\"_dw").unwrap();
    assert_eq!(editor.content(), b"def\n");

    editor.feed_str("p").unwrap();
    assert_eq!(editor.content(), b"dabcef\n");
}

// ==================== Text Objects ====================

#[test]
fn test_bracket_objects() {
    let mut editor = editor("f(a, (b), c)\n");
    editor.feed_str("fbdi(").unwrap();
    assert_eq!(editor.content(), b"f(a, (), c)\n");

    editor.feed_str("0f(ci(x<Escape>").unwrap();
    assert_eq!(editor.content(), b"f(x)\n");
}

// ==================== History ====================

#[test]
fn test_branching_undo() {
    let mut editor = editor("abc\n");
    editor.feed_str("xu").unwrap();
    assert_eq!(editor.content(), b"abc\n");

    // A new edit after undo starts a second branch.
    editor.feed_str("$xu").unwrap();
    assert_eq!(editor.content(), b"abc\n");

    // Redo follows the newest branch.
    editor.feed_str("<C-r>").unwrap();
    assert_eq!(editor.content(), b"ab\n");
    editor.feed_str("u").unwrap();

    // g+ and g- walk the states in the order they were created.
    editor.feed_str("g+").unwrap();
    assert_eq!(editor.content(), b"bc\n");
    editor.feed_str("g+").unwrap();
    assert_eq!(editor.content(), b"ab\n");
    editor.feed_str("g-").unwrap();
    assert_eq!(editor.content(), b"bc\n");
}

// ==================== Configuration ====================

#[test]
fn test_config_bindings() {
    let config = config(
        r#"
        [keyboard.normal]
        "K" = { action = "cursor-line-down" }
        "Q" = { alias = "dd" }
        "#,
    );
    let mut editor = editor_with(config, "one\ntwo\nthree\n");

    editor.feed_str("Kx").unwrap();
    assert_eq!(editor.content(), b"one\nwo\nthree\n");

    editor.feed_str("Q").unwrap();
    assert_eq!(editor.content(), b"one\nthree\n");
}

#[test]
fn test_config_shift_width() {
    let config = config(
        r#"
        [editor]
        expand_tab = true
        shift_width = 2
        "#,
    );
    let mut editor = editor_with(config, "a\n");
    editor.feed_str(">>").unwrap();
    assert_eq!(editor.content(), b"  a\n");
}

#[test]
fn test_alias_cycle_from_config_is_cut_off() {
    let config = config(
        r#"
        [keyboard.normal]
        "Q" = { alias = "lQ" }
        "#,
    );
    let mut editor = editor_with(config, "abc\n");
    let mut events = EventHandler::new(editor.subscribe());

    editor.feed_str("Q").unwrap();
    assert_eq!(warnings(&mut events), 1);
    assert_eq!(editor.cursor(), 2);
}

#[test]
fn test_macro_recursion_is_bounded() {
    let config = config(
        r#"
        [editor]
        max_macro_depth = 3
        "#,
    );
    let mut editor = editor_with(config, &format!("{}\n", "a".repeat(24)));
    editor
        .registers_mut()
        .put(RegisterName::Named('r'), b"x@r", false)
        .unwrap();
    let mut events = EventHandler::new(editor.subscribe());

    editor.feed_str("@r").unwrap();
    assert_eq!(editor.content().len(), 22);
    assert!(warnings(&mut events) >= 1);
}

// ==================== Macros ====================

#[test]
fn test_macro_record_and_replay() {
    let mut editor = editor("abcdef\n");
    editor.run(&mut KeyQueue::parse("qwxlq2@w")).unwrap();
    assert_eq!(editor.content(), b"bdf\n");
    assert!(editor.recording().is_none());
}

#[test]
fn test_macro_replay_matches_live_typing() {
    let mut live = editor("");
    live.feed_str("ihi<Escape>").unwrap();

    let mut replayed = editor("");
    replayed
        .registers_mut()
        .put_keys(RegisterRef::new(RegisterName::Named('q')), Key::parse_sequence("ihi<Escape>"))
        .unwrap();
    replayed.feed_str("@q").unwrap();

    assert_eq!(replayed.content(), b"hi");
    assert_eq!(replayed.content(), live.content());
    assert_eq!(replayed.cursor(), live.cursor());
    assert_eq!(replayed.mode(), Mode::Normal);
}

// ==================== Files ====================

#[test]
fn test_edit_and_save_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "hello\n").unwrap();

    let mut editor = Editor::new();
    editor.open_file(&path).unwrap();
    let mut events = EventHandler::new(editor.subscribe());

    editor.feed_str("x").unwrap();
    assert!(editor.has_unsaved_changes());

    editor.save().unwrap();
    assert!(!editor.has_unsaved_changes());
    assert_eq!(fs::read(&path).unwrap(), b"ello\n");
    assert!(events
        .drain()
        .iter()
        .any(|e| matches!(e, EditorEvent::FileSaved(_))));
}

#[test]
fn test_open_missing_file_then_save_as() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("new.txt");

    let mut editor = Editor::new();
    editor.open_file(&path).unwrap();
    editor.feed_str("ihi<Enter><Escape>").unwrap();

    let copy = dir.path().join("copy.txt");
    editor.save_as(&copy).unwrap();
    assert_eq!(fs::read(&copy).unwrap(), b"hi\n");
}

// ==================== Events ====================

#[tokio::test]
async fn test_events_reach_async_handler() {
    let mut editor = editor("abc\n");
    let mut events = EventHandler::new(editor.subscribe());

    editor.feed_str("x").unwrap();
    drop(editor);

    let mut changed = false;
    while let Some(event) = events.next().await {
        if let EditorEvent::FileChanged(_) = event {
            changed = true;
        }
    }
    assert!(changed);
}
