use crate::support::Fixture;
use notesync::store::StoreEvent;
use notesync::{NotePayload, ResourceHandler};
use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use std::fs;
use std::path::PathBuf;

fn modified(path: PathBuf) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path)
}

#[test]
fn external_edit_updates_store_content() {
    let mut fx = Fixture::with(|root| fs::write(root.join("todo.txt"), "buy milk").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("todo.txt").unwrap().id;

    let file = fx.base().join("todo.txt");
    fs::write(&file, "buy bread").unwrap();
    fx.engine.handle_notification(&modified(file));

    assert_eq!(fx.engine.store().payload(item).unwrap().body, b"buy bread");
}

#[test]
fn engine_write_is_swallowed_once() {
    let mut fx = Fixture::new();
    let top = fx.top();
    fx.engine.item_added(top, NotePayload::new("todo.txt", "buy milk"));
    fx.engine.store_mut().clear_events();

    let file = fx.base().join("todo.txt");
    fx.engine.handle_notification(&modified(file.clone()));
    assert!(fx.engine.store().events().is_empty());

    fs::write(&file, "edited outside").unwrap();
    fx.engine.handle_notification(&modified(file));
    let item = fx.engine.store().item_by_remote_id("todo.txt").unwrap().id;
    assert_eq!(fx.engine.store().payload(item).unwrap().body, b"edited outside");
}

#[test]
fn unchanged_content_is_not_pushed_again() {
    let mut fx = Fixture::with(|root| fs::write(root.join("todo.txt"), "buy milk").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let file = fx.base().join("todo.txt");

    fx.engine.handle_notification(&modified(file.clone()));
    fx.engine.store_mut().clear_events();
    fx.engine.handle_notification(&modified(file));
    assert!(fx.engine.store().events().is_empty());
}

#[test]
fn new_file_in_nested_collection_becomes_item() {
    let mut fx = Fixture::with(|root| fs::create_dir_all(root.join("Work/Q1")).unwrap());
    let q1 = fx.collection("Work/Q1");
    let file = fx.base().join("Work/Q1/goals.txt");
    fs::write(&file, "goals").unwrap();

    fx.engine
        .handle_notification(&Event::new(EventKind::Create(CreateKind::File)).add_path(file));

    let item = fx.engine.store().item_by_remote_id("goals.txt").unwrap();
    assert_eq!(item.parent, q1);
}

#[test]
fn external_rename_is_reconciled() {
    let mut fx = Fixture::with(|root| fs::write(root.join("note-a"), "text").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);

    let from = fx.base().join("note-a");
    let to = fx.base().join("note-b");
    fs::rename(&from, &to).unwrap();
    fx.engine.handle_notification(
        &Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(from)
            .add_path(to),
    );

    assert!(fx.engine.store().item_by_remote_id("note-a").is_none());
    assert!(fx.engine.store().item_by_remote_id("note-b").is_some());
}

#[test]
fn removed_directory_drops_collection() {
    let mut fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Work/Q1")).unwrap();
        fs::write(root.join("Work/Q1/x.txt"), "x").unwrap();
    });
    let q1 = fx.collection("Work/Q1");
    fx.engine.retrieve_items(q1);

    let dir = fx.base().join("Work/Q1");
    fs::remove_dir_all(&dir).unwrap();
    fx.engine
        .handle_notification(&Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(dir.clone()));

    assert!(fx.engine.store().collection(q1).is_none());
    assert!(fx.engine.store().item_by_remote_id("x.txt").is_none());
    assert!(!fx.engine.watcher().is_watched(&dir));
}

#[test]
fn change_in_base_directory_triggers_full_resync() {
    let mut fx = Fixture::new();
    fs::create_dir_all(fx.base().join("Later")).unwrap();
    fx.engine.store_mut().clear_events();

    let base = fx.base();
    fx.engine.on_directory_changed(&base);

    assert!(matches!(
        fx.engine.store().events().first(),
        Some(StoreEvent::CollectionsRetrieved(2))
    ));
}

#[test]
fn ignored_names_are_dropped() {
    let mut fx = Fixture::new();
    fx.engine.store_mut().clear_events();

    for name in [".swap", "todo.txt~", "edit.swp"] {
        let path = fx.base().join(name);
        fs::write(&path, "x").unwrap();
        fx.engine
            .handle_notification(&Event::new(EventKind::Create(CreateKind::File)).add_path(path));
    }
    assert!(fx.engine.store().events().is_empty());
}
