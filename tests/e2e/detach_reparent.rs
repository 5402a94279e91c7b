use crate::common::harness::ServerTestHarness;
use tessera::app::{DropTarget, OpenMode, ServerError, WindowAction};
use tessera::model::ids::{Orientation, PaneId};

#[test]
fn test_detach_moves_pane_and_keeps_modified_flag() {
    let mut harness = ServerTestHarness::new();
    let first = harness.server.new_window();
    let p2 = harness
        .server
        .split_active_pane(Orientation::Horizontal, false)
        .unwrap();
    harness.server.edit(p2, "unsaved").unwrap();

    let window = harness.server.detach(p2).unwrap();

    assert_ne!(window, first);
    assert_eq!(harness.server.window_count(), 2);
    assert_eq!(harness.server.active_window(), Some(window));
    let moved = harness.server.panes_of_window(window);
    assert_eq!(moved.len(), 1);
    let moved = moved[0];
    assert_ne!(moved, p2);
    assert!(harness.server.is_modified(moved));
    assert_eq!(harness.server.pane_text(moved), Some("unsaved"));
    assert_eq!(
        harness
            .server
            .document_of_pane(moved)
            .map(|d| d.display_name()),
        Some("Untitled 2".to_string())
    );
    assert!(harness.server.clone_peers(moved).is_empty());

    let first_view = harness.server.views_of(first)[0];
    assert_eq!(harness.layout_of(first_view), "1");
    assert_eq!(harness.server.active_pane_of(first_view), Some(PaneId(1)));

    assert!(harness.asked().is_empty());
    harness.assert_invariants();
}

#[test]
fn test_detach_and_reparent_refused_while_cloned() {
    let mut harness = ServerTestHarness::new();
    let a = harness.create_file("a.txt", "alpha");
    harness.server.open(&a, OpenMode::ActiveWindow).unwrap();
    let clone = harness
        .server
        .split_active_pane(Orientation::Horizontal, true)
        .unwrap();
    harness.server.edit(clone, "edited").unwrap();
    let other = harness.server.new_window();
    let other_view = harness.server.views_of(other)[0];

    let links = harness.server.graph().linked_entities();
    let panes = harness.server.pane_count();

    let err = harness.server.detach(clone).unwrap_err();
    assert!(matches!(err, ServerError::HasClones(p) if p == clone));
    let err = harness.server.reparent(clone, other_view, None).unwrap_err();
    assert!(matches!(err, ServerError::HasClones(_)));

    assert_eq!(harness.reports().len(), 2);
    assert_eq!(harness.server.window_count(), 2);
    assert_eq!(harness.server.pane_count(), panes);
    assert_eq!(harness.server.graph().linked_entities(), links);
    assert!(harness.server.is_modified(clone));
    let first_view = harness.server.view_of(clone).unwrap();
    assert_eq!(harness.layout_of(first_view), "H[1 2]");
    assert_eq!(harness.layout_of(other_view), "3");
    harness.assert_invariants();
}

#[test]
fn test_reparent_reuses_empty_slot_and_closes_source_window() {
    let mut harness = ServerTestHarness::new();
    let main = harness.server.new_window();
    let main_view = harness.server.views_of(main)[0];
    harness.server.new_window();
    let source = harness.active_pane();
    harness.server.edit(source, "moving").unwrap();

    let moved = harness.server.reparent(source, main_view, None).unwrap();

    assert_eq!(moved, PaneId(1));
    assert_eq!(harness.server.window_count(), 1);
    assert_eq!(harness.server.active_window(), Some(main));
    assert_eq!(harness.active_pane(), moved);
    assert!(harness.server.is_modified(moved));
    assert_eq!(harness.server.pane_text(moved), Some("moving"));
    assert!(!harness.server.names().is_reserved("Untitled 1"));
    assert!(harness.server.names().is_reserved("Untitled 2"));
    assert!(harness.asked().is_empty());
    harness.assert_invariants();
}

#[test]
fn test_reparent_onto_drop_target_splits_it() {
    let mut harness = ServerTestHarness::new();
    let main = harness.server.new_window();
    let main_view = harness.server.views_of(main)[0];
    harness
        .server
        .split_active_pane(Orientation::Horizontal, false)
        .unwrap();
    harness.server.new_window();
    let source = harness.active_pane();
    harness.server.edit(source, "dragged").unwrap();

    let target = DropTarget {
        pane: PaneId(1),
        orientation: Orientation::Vertical,
    };
    let moved = harness
        .server
        .reparent(source, main_view, Some(target))
        .unwrap();

    insta::assert_snapshot!(harness.layout_of(main_view), @"H[V[1 4] 2]");
    assert_eq!(harness.active_pane(), moved);
    assert_eq!(harness.server.window_count(), 1);
    assert!(harness.server.is_modified(moved));
    harness.assert_invariants();
}

#[test]
fn test_reparent_rejects_drop_target_outside_destination() {
    let mut harness = ServerTestHarness::new();
    let main = harness.server.new_window();
    let main_view = harness.server.views_of(main)[0];
    harness.server.new_window();
    let source = harness.active_pane();

    let target = DropTarget {
        pane: source,
        orientation: Orientation::Horizontal,
    };
    let result = harness.server.reparent(source, main_view, Some(target));
    assert!(matches!(result, Err(ServerError::UnknownPane(_))));
    assert_eq!(harness.server.window_count(), 2);
    harness.assert_invariants();
}

#[test]
fn test_reparent_within_same_view_is_noop() {
    let mut harness = ServerTestHarness::new();
    harness.server.new_window();
    let p2 = harness
        .server
        .split_active_pane(Orientation::Horizontal, false)
        .unwrap();
    let view = harness.active_view();

    assert_eq!(harness.server.reparent(p2, view, None).unwrap(), p2);
    assert_eq!(harness.layout(), "H[1 2]");
}

#[test]
fn test_move_active_pane_to_main_window() {
    let mut harness = ServerTestHarness::new();
    let main = harness.server.new_window();
    harness.server.edit(PaneId(1), "main content").unwrap();
    let second = harness.server.new_window();
    harness.server.edit(PaneId(2), "travels").unwrap();

    harness
        .server
        .dispatch(second, WindowAction::MoveActivePaneToMain)
        .unwrap();

    assert_eq!(harness.server.main_window(), Some(main));
    assert_eq!(harness.server.window_count(), 1);
    assert_eq!(harness.layout(), "H[1 3]");
    assert_eq!(harness.server.pane_text(PaneId(3)), Some("travels"));
    assert!(harness.server.is_modified(PaneId(1)));
    assert!(harness.server.is_modified(PaneId(3)));
    harness.assert_invariants();
}
