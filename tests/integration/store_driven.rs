use crate::support::{parts, snapshot, Fixture};
use notesync::store::StoreEvent;
use notesync::{NotePayload, ResourceHandler};
use std::fs;

#[test]
fn add_item_writes_file_named_by_title() {
    let mut fx = Fixture::new();
    let top = fx.top();

    fx.engine.item_added(top, NotePayload::new("todo.txt", "buy milk"));

    assert_eq!(fx.read("todo.txt"), "buy milk");
    let committed = fx.engine.store().item_by_remote_id("todo.txt").unwrap();
    assert_eq!(committed.parent, top);
    assert!(matches!(
        fx.engine.store().last_event(),
        Some(StoreEvent::ItemCommitted(_))
    ));
}

#[test]
fn add_item_into_nested_collection() {
    let mut fx = Fixture::with(|root| fs::create_dir_all(root.join("Work/Q1")).unwrap());
    let q1 = fx.collection("Work/Q1");

    fx.engine.item_added(q1, NotePayload::new("plan.txt", "ship it"));
    assert_eq!(fx.read("Work/Q1/plan.txt"), "ship it");
}

#[test]
fn add_item_never_overwrites_existing_file() {
    let mut fx = Fixture::with(|root| fs::write(root.join("todo.txt"), "original").unwrap());
    let top = fx.top();

    fx.engine.item_added(top, NotePayload::new("todo.txt", "replacement"));
    assert_eq!(fx.read("todo.txt"), "original");
    assert_eq!(fx.engine.store().cancellations().len(), 1);
}

#[test]
fn title_change_renames_file() {
    let mut fx = Fixture::with(|root| fs::write(root.join("note-a"), "draft").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("note-a").unwrap().id;

    fx.engine
        .item_changed(item, NotePayload::new("note-b", "final"), &parts(true, true));

    assert!(!fx.base().join("note-a").exists());
    assert_eq!(fx.read("note-b"), "final");
    let committed = fx.engine.store().item(item).unwrap();
    assert_eq!(committed.remote_id, "note-b");
}

#[test]
fn title_change_onto_existing_name_is_a_conflict() {
    let mut fx = Fixture::with(|root| {
        fs::write(root.join("note-a"), "a").unwrap();
        fs::write(root.join("note-b"), "b").unwrap();
    });
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("note-a").unwrap().id;

    fx.engine
        .item_changed(item, NotePayload::new("note-b", "clobber"), &parts(true, true));

    assert_eq!(fx.read("note-a"), "a");
    assert_eq!(fx.read("note-b"), "b");
    let reasons = fx.engine.store().cancellations();
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("already exists"));
    assert_eq!(fx.engine.store().item(item).unwrap().remote_id, "note-a");
}

#[test]
fn body_change_rewrites_in_full() {
    let mut fx = Fixture::with(|root| fs::write(root.join("todo.txt"), "a much longer original body").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("todo.txt").unwrap().id;

    fx.engine
        .item_changed(item, NotePayload::new("todo.txt", "short"), &parts(false, true));
    assert_eq!(fx.read("todo.txt"), "short");
}

#[test]
fn change_without_parts_is_processed_without_writing() {
    let mut fx = Fixture::with(|root| fs::write(root.join("todo.txt"), "keep").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("todo.txt").unwrap().id;

    fx.engine
        .item_changed(item, NotePayload::new("other", "discard"), &parts(false, false));
    assert_eq!(fx.read("todo.txt"), "keep");
    assert_eq!(fx.engine.store().last_event(), Some(&StoreEvent::Processed));
}

#[test]
fn rename_collection_keeps_contents() {
    let mut fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Work/Q1")).unwrap();
        fs::write(root.join("Work/plan.txt"), "plan").unwrap();
        fs::write(root.join("Work/Q1/goals.txt"), "goals").unwrap();
    });
    let work = fx.collection("Work");
    let before = snapshot(&fx.base().join("Work"));

    fx.engine.collection_changed(work, "Projects");

    assert!(!fx.base().join("Work").exists());
    assert_eq!(snapshot(&fx.base().join("Projects")), before);
    assert!(matches!(
        fx.engine.store().last_event(),
        Some(StoreEvent::CollectionCommitted(id)) if *id == work
    ));
    assert_eq!(
        fx.engine.directory_for(fx.collection("Projects/Q1")).unwrap(),
        fx.base().join("Projects/Q1")
    );
}

#[test]
fn remove_nested_collection_leaves_no_orphans() {
    let mut fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Work/Q1/Deep")).unwrap();
        fs::write(root.join("Work/plan.txt"), "plan").unwrap();
        fs::write(root.join("Work/Q1/Deep/x.txt"), "x").unwrap();
        fs::write(root.join("keep.txt"), "keep").unwrap();
    });
    let work = fx.collection("Work");
    let deep = fx.collection("Work/Q1/Deep");
    fx.engine.retrieve_items(work);
    fx.engine.retrieve_items(deep);

    fx.engine.collection_removed(work);

    assert!(!fx.base().join("Work").exists());
    assert_eq!(fx.read("keep.txt"), "keep");
    assert_eq!(fx.engine.hierarchy().collection_count(), 1);
    assert!(fx
        .engine
        .hierarchy()
        .items()
        .all(|item| fx.engine.hierarchy().collection(item.parent).is_some()));

    // The cascade already took care of the item's file.
    fx.engine.store_mut().clear_events();
    let orphan = fx.engine.store().item_by_remote_id("plan.txt").unwrap().id;
    fx.engine.item_removed(orphan);
    assert_eq!(fx.engine.store().last_event(), Some(&StoreEvent::Processed));
}

#[test]
fn move_item_between_collections() {
    let mut fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Archive")).unwrap();
        fs::write(root.join("done.txt"), "done").unwrap();
    });
    let top = fx.top();
    let archive = fx.collection("Archive");
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("done.txt").unwrap().id;

    fx.engine.item_moved(item, top, archive);

    assert!(!fx.base().join("done.txt").exists());
    assert_eq!(fx.read("Archive/done.txt"), "done");
    assert_eq!(fx.engine.hierarchy().item(item).unwrap().parent, archive);
}

#[test]
fn move_item_onto_existing_file_fails() {
    let mut fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Archive")).unwrap();
        fs::write(root.join("done.txt"), "new").unwrap();
        fs::write(root.join("Archive/done.txt"), "old").unwrap();
    });
    let top = fx.top();
    let archive = fx.collection("Archive");
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("done.txt").unwrap().id;

    fx.engine.item_moved(item, top, archive);

    assert_eq!(fx.read("done.txt"), "new");
    assert_eq!(fx.read("Archive/done.txt"), "old");
    assert_eq!(fx.engine.store().cancellations().len(), 1);
}

#[test]
fn move_collection_onto_existing_directory_fails() {
    let mut fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Work/Notes")).unwrap();
        fs::create_dir_all(root.join("Home/Notes")).unwrap();
    });
    let work = fx.collection("Work");
    let home = fx.collection("Home");
    let notes = fx.collection("Work/Notes");

    fx.engine.collection_moved(notes, work, home);

    assert!(fx.base().join("Work/Notes").is_dir());
    assert_eq!(fx.engine.store().cancellations().len(), 1);
}

#[test]
fn read_only_tree_is_never_mutated() {
    let mut fx = Fixture::configured(
        |root| {
            fs::create_dir_all(root.join("Work/Q1")).unwrap();
            fs::write(root.join("todo.txt"), "buy milk").unwrap();
        },
        |config| config.read_only = true,
    );
    let top = fx.top();
    let work = fx.collection("Work");
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("todo.txt").unwrap().id;
    let before = snapshot(&fx.base());
    fx.engine.store_mut().clear_events();

    fx.engine.item_added(top, NotePayload::new("new.txt", "x"));
    fx.engine
        .item_changed(item, NotePayload::new("todo.txt", "changed"), &parts(false, true));
    fx.engine.item_moved(item, top, work);
    fx.engine.item_removed(item);
    fx.engine.collection_added(work, "Fresh");
    fx.engine.collection_changed(work, "Renamed");
    fx.engine.collection_removed(work);

    assert_eq!(snapshot(&fx.base()), before);
    let reasons = fx.engine.store().cancellations();
    assert_eq!(reasons.len(), 7);
    assert!(reasons.iter().all(|r| r.contains("read-only")));
}

#[test]
fn retrieve_item_reports_content() {
    let mut fx = Fixture::with(|root| fs::write(root.join("todo.txt"), "buy milk").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("todo.txt").unwrap().id;

    assert!(fx.engine.retrieve_item(item, &parts(true, true)));
    let payload = fx.engine.store().payload(item).unwrap();
    assert_eq!(payload.title, "todo.txt");
    assert_eq!(payload.body, b"buy milk");

    fs::remove_file(fx.base().join("todo.txt")).unwrap();
    assert!(!fx.engine.retrieve_item(item, &parts(false, true)));
}
