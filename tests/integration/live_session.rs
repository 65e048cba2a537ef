use notesync::store::MemoryStore;
use notesync::{NotePayload, SessionCommand, SyncConfig, SyncSession};
use parking_lot::Mutex;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn external_edit_reaches_store_through_platform_watcher() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("todo.txt"), "buy milk").unwrap();
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let session = SyncSession::start(SyncConfig::for_base_path(temp.path()), Arc::clone(&store)).unwrap();

    session.synchronize().unwrap();
    assert!(eventually(|| store.lock().item_by_remote_id("todo.txt").is_some()));

    fs::write(temp.path().join("todo.txt"), "buy oat milk").unwrap();
    assert!(eventually(|| {
        let store = store.lock();
        store
            .item_by_remote_id("todo.txt")
            .and_then(|item| store.payload(item.id))
            .map(|payload| payload.body == b"buy oat milk")
            .unwrap_or(false)
    }));

    session.shutdown();
}

#[test]
fn store_commands_and_notifications_share_one_queue() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let mut config = SyncConfig::for_base_path(temp.path());
    config.suppression_ttl_ms = 100;
    let session = SyncSession::start(config, Arc::clone(&store)).unwrap();

    session.send(SessionCommand::RetrieveCollections).unwrap();
    assert!(eventually(|| store.lock().collections().count() == 1));
    let top = store.lock().collections().next().unwrap().id;

    session
        .send(SessionCommand::ItemAdded {
            collection: top,
            payload: NotePayload::new("todo.txt", "buy milk"),
        })
        .unwrap();
    assert!(eventually(|| store.lock().item_by_remote_id("todo.txt").is_some()));

    // Let any leftover suppression token for the base directory expire.
    thread::sleep(Duration::from_millis(300));
    fs::create_dir(temp.path().join("Inbox")).unwrap();

    assert!(eventually(|| store
        .lock()
        .collections()
        .any(|c| c.remote_id == "Inbox")));
    assert_eq!(fs::read(temp.path().join("todo.txt")).unwrap(), b"buy milk");
    session.shutdown();
}
