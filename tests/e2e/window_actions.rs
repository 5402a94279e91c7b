use crate::common::harness::{Answer, ServerTestHarness};
use tessera::app::{OpenMode, ServerError, WindowAction};
use tessera::model::ids::{Orientation, PaneId, WindowId};
use tessera::services::dialogs::SaveChoice;

#[test]
fn test_split_and_navigate_through_window_actions() {
    let mut harness = ServerTestHarness::new();
    let window = harness.server.new_window();

    harness
        .server
        .dispatch(window, WindowAction::Split(Orientation::Horizontal))
        .unwrap();
    harness
        .server
        .dispatch(window, WindowAction::SplitClone(Orientation::Vertical))
        .unwrap();
    insta::assert_snapshot!(harness.layout(), @"H[1 V[2 3]]");
    assert_eq!(harness.server.clone_peers(PaneId(2)), vec![PaneId(3)]);
    assert_eq!(harness.active_pane(), PaneId(3));

    harness.server.dispatch(window, WindowAction::NextPane).unwrap();
    assert_eq!(harness.active_pane(), PaneId(1));
    harness.server.dispatch(window, WindowAction::PrevPane).unwrap();
    assert_eq!(harness.active_pane(), PaneId(3));

    harness
        .server
        .dispatch(window, WindowAction::CloseActivePane)
        .unwrap();
    assert_eq!(harness.layout(), "H[1 2]");
    assert_eq!(harness.active_pane(), PaneId(2));
    harness.assert_invariants();
}

#[test]
fn test_views_cycle_within_window() {
    let mut harness = ServerTestHarness::new();
    let window = harness.server.new_window();
    let first = harness.active_view();

    harness.server.dispatch(window, WindowAction::NewView).unwrap();
    let second = harness.active_view();
    assert_ne!(first, second);
    assert_eq!(harness.server.views_of(window), vec![first, second]);

    harness.server.dispatch(window, WindowAction::NextView).unwrap();
    assert_eq!(harness.active_view(), first);
    harness.server.dispatch(window, WindowAction::NextView).unwrap();
    assert_eq!(harness.active_view(), second);
}

#[test]
fn test_close_window_confirms_its_unsaved_documents() {
    let mut harness = ServerTestHarness::new();
    let first = harness.server.new_window();
    harness.server.edit(PaneId(1), "keep me").unwrap();
    let second = harness.server.new_window();

    harness.answer(Answer::Save(SaveChoice::Cancel));
    let result = harness.server.dispatch(first, WindowAction::Close);
    assert!(matches!(result, Err(ServerError::Cancelled)));
    assert_eq!(harness.server.window_count(), 2);

    harness.answer(Answer::Save(SaveChoice::Discard));
    harness.server.dispatch(first, WindowAction::Close).unwrap();
    assert_eq!(harness.server.windows(), vec![second]);
    assert_eq!(harness.server.main_window(), Some(second));
}

#[test]
fn test_detach_through_window_action() {
    let mut harness = ServerTestHarness::new();
    let window = harness.server.new_window();
    harness
        .server
        .dispatch(window, WindowAction::Split(Orientation::Vertical))
        .unwrap();

    harness
        .server
        .dispatch(window, WindowAction::DetachActivePane)
        .unwrap();

    assert_eq!(harness.server.window_count(), 2);
    assert_ne!(harness.server.active_window(), Some(window));
    assert_eq!(harness.server.panes_of_window(window), vec![PaneId(1)]);
}

#[test]
fn test_unknown_window_is_rejected() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();
    let result = harness
        .server
        .dispatch(WindowId(99), WindowAction::NextPane);
    assert!(matches!(result, Err(ServerError::UnknownWindow(WindowId(99)))));
}

#[test]
fn test_window_title_follows_active_pane() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");
    harness.server.open(&a, OpenMode::ActiveWindow).unwrap();
    let window = harness.server.active_window().unwrap();

    assert_eq!(
        harness.server.window_title(window),
        Some(a.display().to_string())
    );
    harness.server.edit(PaneId(1), "changed").unwrap();
    assert_eq!(
        harness.server.window_title(window),
        Some(format!("{}*", a.display()))
    );
}
