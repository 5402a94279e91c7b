use crate::common::harness::{Answer, ServerTestHarness};
use tessera::app::{OpenMode, OpenOutcome, ServerError};
use tessera::model::ids::{Orientation, PaneId};
use tessera::services::dialogs::SaveChoice;

/// One file, split as a clone, edited through the clone, original closed,
/// then opened again
#[test]
fn test_clone_split_edit_close_and_reopen() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");

    let p1 = harness
        .server
        .open(&a, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    assert_eq!(harness.layout(), "1");
    assert!(!harness.server.is_modified(p1));

    let p2 = harness
        .server
        .split_active_pane(Orientation::Horizontal, true)
        .unwrap();
    insta::assert_snapshot!(harness.layout(), @"H[1 2]");
    assert_eq!(harness.server.clone_peers(p1), vec![p2]);
    assert_eq!(
        harness.server.document_of(p1),
        harness.server.document_of(p2)
    );
    assert_eq!(harness.server.pane_text(p2), Some("alpha"));
    assert_eq!(harness.active_pane(), p2);

    harness.server.edit(p2, "alpha beta").unwrap();
    assert!(harness.server.is_modified(p1));
    assert!(harness.server.is_modified(p2));
    assert_eq!(harness.server.pane_text(p1), Some("alpha beta"));

    // The clone keeps the data, so no prompt
    harness.server.close_pane(p1).unwrap();
    assert_eq!(harness.layout(), "2");
    assert_eq!(harness.active_pane(), p2);
    assert!(harness.server.is_modified(p2));

    let again = harness.server.open(&a, OpenMode::ActiveWindow).unwrap();
    assert_eq!(again, OpenOutcome::Raised(p2));
    assert_eq!(harness.server.pane_count(), 1);

    assert!(harness.asked().is_empty());
    harness.assert_invariants();
}

#[test]
fn test_split_same_direction_adds_sibling() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();

    harness
        .server
        .split_active_pane(Orientation::Horizontal, false)
        .unwrap();
    harness
        .server
        .split_active_pane(Orientation::Horizontal, false)
        .unwrap();
    insta::assert_snapshot!(harness.layout(), @"H[1 2 3]");

    let p4 = harness
        .server
        .split_active_pane(Orientation::Vertical, false)
        .unwrap();
    insta::assert_snapshot!(harness.layout(), @"H[1 2 V[3 4]]");
    assert_eq!(
        harness
            .server
            .document_of_pane(p4)
            .map(|d| d.display_name()),
        Some("Untitled 4".to_string())
    );
    harness.assert_invariants();
}

#[test]
fn test_split_then_close_restores_layout_and_active_pane() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();
    harness
        .server
        .split_active_pane(Orientation::Horizontal, false)
        .unwrap();
    harness
        .server
        .split_active_pane(Orientation::Vertical, false)
        .unwrap();
    assert_eq!(harness.layout(), "H[1 V[2 3]]");

    harness.server.focus_pane(PaneId(1));
    let before = harness.layout();

    let p4 = harness
        .server
        .split_active_pane(Orientation::Vertical, false)
        .unwrap();
    assert_eq!(harness.layout(), "H[V[1 4] V[2 3]]");

    harness.server.close_pane(p4).unwrap();
    assert_eq!(harness.layout(), before);
    assert_eq!(harness.active_pane(), PaneId(1));
    assert!(!harness.server.names().is_reserved("Untitled 4"));
    harness.assert_invariants();
}

#[test]
fn test_cancelled_close_changes_nothing() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();
    let p2 = harness
        .server
        .split_active_pane(Orientation::Horizontal, false)
        .unwrap();
    harness.server.edit(p2, "draft").unwrap();
    let links = harness.server.graph().linked_entities();

    harness.answer(Answer::Save(SaveChoice::Cancel));
    let err = harness.server.close_pane(p2).unwrap_err();
    assert!(err.is_cancel());
    assert_eq!(harness.layout(), "H[1 2]");
    assert_eq!(harness.server.pane_count(), 2);
    assert_eq!(harness.server.graph().linked_entities(), links);
    assert!(harness.server.is_modified(p2));

    harness.answer(Answer::Save(SaveChoice::Discard));
    harness.server.close_pane(p2).unwrap();
    assert_eq!(harness.layout(), "1");
    assert!(!harness.server.names().is_reserved("Untitled 2"));
    assert_eq!(
        harness.asked(),
        vec!["confirm_save(Untitled 2)", "confirm_save(Untitled 2)"]
    );
    harness.assert_invariants();
}

#[test]
fn test_close_with_save_writes_file_and_closes_window() {
    let mut harness = ServerTestHarness::new();
    let b = harness.create_file("b.txt", "old");
    let pane = harness
        .server
        .open(&b, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    harness.server.edit(pane, "new").unwrap();

    harness.answer(Answer::Save(SaveChoice::Save));
    harness.server.close_pane(pane).unwrap();

    assert_eq!(harness.read_file("b.txt"), "new");
    assert_eq!(harness.server.window_count(), 0);
    assert_eq!(harness.server.document_count(), 0);
    harness.assert_all_answers_used();
}

#[test]
fn test_saving_placeholder_on_close_asks_for_path() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();
    let pane = harness.active_pane();
    harness.server.edit(pane, "notes").unwrap();

    harness.answer(Answer::Save(SaveChoice::Save));
    harness.answer(Answer::SavePath(Some("notes.txt".into())));
    harness.server.close_pane(pane).unwrap();

    assert_eq!(harness.read_file("notes.txt"), "notes");
    assert_eq!(harness.server.window_count(), 0);
    assert!(!harness.server.names().is_reserved("Untitled 1"));
}

#[test]
fn test_declining_save_path_cancels_close() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();
    let pane = harness.active_pane();
    harness.server.edit(pane, "notes").unwrap();

    harness.answer(Answer::Save(SaveChoice::Save));
    harness.answer(Answer::SavePath(None));
    let result = harness.server.close_pane(pane);

    assert!(matches!(result, Err(ServerError::Cancelled)));
    assert_eq!(harness.server.window_count(), 1);
    assert!(harness.server.is_modified(pane));
}

#[test]
fn test_last_clone_prompts_only_once_group_is_gone() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");
    let p1 = harness
        .server
        .open(&a, OpenMode::ActiveWindow)
        .unwrap()
        .pane();
    let p2 = harness
        .server
        .split_active_pane(Orientation::Vertical, true)
        .unwrap();
    harness.server.edit(p1, "changed").unwrap();

    harness.server.close_pane(p2).unwrap();
    assert!(harness.asked().is_empty());
    assert!(harness.server.clone_peers(p1).is_empty());

    harness.answer(Answer::Save(SaveChoice::Discard));
    harness.server.close_pane(p1).unwrap();
    assert_eq!(
        harness.asked(),
        vec![format!("confirm_save({})", a.display())]
    );
    assert_eq!(harness.read_file("a.txt"), "alpha");
}

#[test]
fn test_closing_last_pane_of_view_keeps_window_with_other_views() {
    let mut harness = ServerTestHarness::new();
    let window = harness.server.new_window();
    let second = harness.server.new_view(window).unwrap();
    assert_eq!(harness.server.views_of(window).len(), 2);
    assert_eq!(harness.active_view(), second);

    let pane = harness.active_pane();
    harness.server.close_pane(pane).unwrap();
    assert_eq!(harness.server.views_of(window).len(), 1);
    assert_eq!(harness.server.window_count(), 1);
    assert_ne!(harness.active_view(), second);

    let last = harness.active_pane();
    harness.server.close_pane(last).unwrap();
    assert_eq!(harness.server.window_count(), 0);
    assert_eq!(harness.server.main_window(), None);
    assert_eq!(harness.server.graph().linked_entities(), 0);
}
