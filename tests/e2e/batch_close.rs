use crate::common::harness::{Answer, ServerTestHarness};
use tessera::app::{OpenMode, ServerError};
use tessera::model::ids::{Orientation, PaneId};
use tessera::services::dialogs::{BatchChoice, SaveChoice};

/// Two modified files, one of them shown by two clone panes
fn two_modified_files(harness: &mut ServerTestHarness) -> (std::path::PathBuf, std::path::PathBuf) {
    let a = harness.create_file("a.txt", "alpha");
    let b = harness.create_file("b.txt", "beta");
    let p1 = harness
        .server
        .open(&a, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    harness
        .server
        .split_active_pane(Orientation::Horizontal, true)
        .unwrap();
    let p3 = harness
        .server
        .open(&b, OpenMode::NewWindow)
        .unwrap()
        .pane();
    harness.server.edit(p1, "alpha 2").unwrap();
    harness.server.edit(p3, "beta 2").unwrap();
    (a, b)
}

#[test]
fn test_close_all_lists_each_file_once() {
    let mut harness = ServerTestHarness::new();
    let (a, b) = two_modified_files(&mut harness);

    harness.answer(Answer::Batch(BatchChoice::SaveSelected(vec![a
        .display()
        .to_string()])));
    harness.server.close_all().unwrap();

    assert_eq!(
        harness.asked(),
        vec![format!("confirm_batch({}, {})", a.display(), b.display())]
    );
    assert_eq!(harness.read_file("a.txt"), "alpha 2");
    assert_eq!(harness.read_file("b.txt"), "beta");
    assert_eq!(harness.server.window_count(), 0);
    assert_eq!(harness.server.pane_count(), 0);
    assert_eq!(harness.server.graph().linked_entities(), 0);
}

#[test]
fn test_close_all_cancel_has_no_side_effects() {
    let mut harness = ServerTestHarness::new();
    two_modified_files(&mut harness);
    let links = harness.server.graph().linked_entities();
    let windows = harness.server.windows();
    let layouts: Vec<String> = windows
        .iter()
        .flat_map(|&w| harness.server.views_of(w))
        .map(|v| harness.layout_of(v))
        .collect();

    harness.answer(Answer::Batch(BatchChoice::Cancel));
    let result = harness.server.close_all();

    assert!(matches!(result, Err(ServerError::Cancelled)));
    assert_eq!(harness.server.windows(), windows);
    assert_eq!(harness.server.pane_count(), 3);
    assert_eq!(harness.server.graph().linked_entities(), links);
    let after: Vec<String> = windows
        .iter()
        .flat_map(|&w| harness.server.views_of(w))
        .map(|v| harness.layout_of(v))
        .collect();
    assert_eq!(after, layouts);
    assert!(harness.server.is_modified(PaneId(1)));
    assert!(harness.server.is_modified(PaneId(2)));
    assert_eq!(harness.read_file("a.txt"), "alpha");
    harness.assert_invariants();
}

#[test]
fn test_close_all_single_document_uses_plain_prompt() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");
    let pane = harness
        .server
        .open(&a, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    harness.server.new_window();
    harness.server.edit(pane, "saved on exit").unwrap();

    harness.answer(Answer::Save(SaveChoice::Save));
    harness.server.close_all().unwrap();

    assert_eq!(
        harness.asked(),
        vec![format!("confirm_save({})", a.display())]
    );
    assert_eq!(harness.read_file("a.txt"), "saved on exit");
    assert_eq!(harness.server.window_count(), 0);
}

#[test]
fn test_close_all_placeholder_without_path_cancels() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();
    harness.server.edit(PaneId(1), "scratch").unwrap();
    harness.server.new_window();
    harness.server.edit(PaneId(2), "more scratch").unwrap();

    harness.answer(Answer::Batch(BatchChoice::SaveAll));
    harness.answer(Answer::SavePath(Some("one.txt".into())));
    harness.answer(Answer::SavePath(None));
    let result = harness.server.close_all();

    assert!(matches!(result, Err(ServerError::Cancelled)));
    assert!(!harness.path("one.txt").exists());
    assert_eq!(harness.server.window_count(), 2);
    harness.assert_all_answers_used();
}

#[test]
fn test_failed_save_keeps_document_open() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");
    let pane = harness
        .server
        .open(&a, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    harness.server.edit(pane, "unsaveable").unwrap();
    // Replace the file with a directory so the write fails
    std::fs::remove_file(&a).unwrap();
    std::fs::create_dir(&a).unwrap();

    harness.answer(Answer::Save(SaveChoice::Save));
    harness.server.close_all().unwrap();

    assert_eq!(harness.reports().len(), 1);
    assert_eq!(harness.server.window_count(), 1);
    assert!(harness.server.is_modified(pane));
    harness.assert_invariants();
}

#[test]
fn test_close_view_skips_document_shown_elsewhere() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");
    let p1 = harness
        .server
        .open(&a, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    let window = harness.server.active_window().unwrap();
    let first_view = harness.active_view();
    harness.server.new_view(window).unwrap();
    let clone = harness
        .server
        .open_in_direction(&a, Orientation::Vertical)
        .unwrap();
    assert_eq!(harness.server.clone_peers(p1), vec![clone]);
    harness.server.edit(p1, "still open").unwrap();

    harness.server.close_view(first_view).unwrap();

    assert!(harness.asked().is_empty());
    assert_eq!(harness.server.views_of(window).len(), 1);
    assert!(harness.server.is_modified(clone));
    assert_eq!(harness.server.pane_text(clone), Some("still open"));
    harness.assert_invariants();
}

#[test]
fn test_save_all_writes_every_modified_document() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");
    let b = harness.create_file("b.txt", "beta");
    let p1 = harness
        .server
        .open(&a, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    let p2 = harness
        .server
        .open(&b, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    let p3 = harness
        .server
        .split_active_pane(Orientation::Vertical, false)
        .unwrap();
    harness.server.edit(p1, "a!").unwrap();
    harness.server.edit(p2, "b!").unwrap();
    harness.server.edit(p3, "c!").unwrap();

    harness.answer(Answer::SavePath(Some("c.txt".into())));
    let saved = harness.server.save_all().unwrap();

    assert_eq!(saved, 3);
    assert_eq!(harness.asked(), vec!["ask_save_path(Untitled 1)"]);
    assert_eq!(harness.read_file("a.txt"), "a!");
    assert_eq!(harness.read_file("b.txt"), "b!");
    assert_eq!(harness.read_file("c.txt"), "c!");
    for pane in [p1, p2, p3] {
        assert!(!harness.server.is_modified(pane));
    }
    let doc = harness.server.document_of_pane(p3).unwrap();
    assert_eq!(doc.path(), Some(harness.path("c.txt").as_path()));
    assert!(!harness.server.names().is_reserved("Untitled 1"));
    assert_eq!(harness.server.pane_count(), 3);
    harness.assert_invariants();
}
