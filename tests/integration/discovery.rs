use crate::support::Fixture;
use notesync::store::{MemoryStore, StoreEvent};
use notesync::{ResourceHandler, SyncConfig, SyncEngine};
use std::fs;
use tempfile::TempDir;

#[test]
fn discovery_reports_every_directory() {
    let fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Work/Q1")).unwrap();
        fs::create_dir_all(root.join("Home")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
    });

    let mut names: Vec<String> = fx
        .engine
        .store()
        .collections()
        .map(|c| c.remote_id.clone())
        .collect();
    names.sort();
    let base = fx.base().to_string_lossy().to_string();
    let mut expected = vec!["Home".to_string(), "Q1".to_string(), "Work".to_string(), base];
    expected.sort();
    assert_eq!(names, expected);
}

#[test]
fn repeated_discovery_is_stable() {
    let mut fx = Fixture::with(|root| {
        fs::create_dir_all(root.join("Work/Q1")).unwrap();
        fs::write(root.join("Work/plan.txt"), "plan").unwrap();
    });
    let first: Vec<_> = fx.engine.store().collections().cloned().collect();

    fx.engine.retrieve_collections();
    fx.engine.retrieve_collections();

    let again: Vec<_> = fx.engine.store().collections().cloned().collect();
    assert_eq!(first, again);
}

#[test]
fn item_discovery_skips_reserved_names() {
    let mut fx = Fixture::configured(
        |root| {
            fs::write(root.join("todo.txt"), "buy milk").unwrap();
            fs::write(root.join("todo.txt~"), "backup").unwrap();
            fs::write(root.join(".hidden"), "hidden").unwrap();
            fs::write(root.join("edit.swp"), "swap").unwrap();
        },
        |config| config.marker_file = Some("WARNING.txt".to_string()),
    );
    let top = fx.top();
    assert!(fx.base().join("WARNING.txt").is_file());

    fx.engine.retrieve_items(top);
    let names: Vec<String> = fx
        .engine
        .store()
        .items()
        .map(|i| i.remote_id.clone())
        .collect();
    assert_eq!(names, vec!["todo.txt".to_string()]);
}

#[test]
fn items_carry_filesystem_timestamps() {
    let mut fx = Fixture::with(|root| fs::write(root.join("todo.txt"), "buy milk").unwrap());
    let top = fx.top();
    fx.engine.retrieve_items(top);
    let item = fx.engine.store().item_by_remote_id("todo.txt").unwrap();
    assert!(item.modified.is_some());
    assert!(item.created.is_some());
}

#[test]
fn top_level_is_named_and_protected() {
    let fx = Fixture::configured(|_| {}, |config| config.display_name = "Journal".to_string());
    let top = fx.engine.store().collection(fx.top()).unwrap();
    assert_eq!(top.name, "Journal");
    assert!(top.rights.can_create_item);
    assert!(!top.rights.can_delete_collection);
}

#[test]
fn missing_base_directory_is_created() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().join("deep/notes");
    let mut engine = SyncEngine::detached(SyncConfig::for_base_path(&base), MemoryStore::new()).unwrap();
    engine.retrieve_collections();
    assert!(base.is_dir());
    assert_eq!(
        engine.store().last_event(),
        Some(&StoreEvent::CollectionsRetrieved(1))
    );
}

#[test]
fn base_path_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain.txt");
    fs::write(&file, "x").unwrap();
    assert!(SyncEngine::detached(SyncConfig::for_base_path(&file), MemoryStore::new()).is_err());
}

#[test]
fn reconfigure_rediscovers_new_tree() {
    let mut fx = Fixture::with(|root| fs::create_dir_all(root.join("Old")).unwrap());
    let other = TempDir::new().unwrap();
    fs::create_dir_all(other.path().join("New/Nested")).unwrap();
    fs::write(other.path().join("New/idea.txt"), "idea").unwrap();

    fx.engine
        .configure(SyncConfig::for_base_path(other.path()))
        .unwrap();

    let names: Vec<String> = fx
        .engine
        .store()
        .collections()
        .map(|c| c.remote_id.clone())
        .collect();
    assert!(names.contains(&"New".to_string()));
    assert!(!names.contains(&"Old".to_string()));
    assert!(fx.engine.store().item_by_remote_id("idea.txt").is_some());
}
