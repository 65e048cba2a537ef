use notesync::store::MemoryStore;
use notesync::tree::{collection_chain_for, path_for, Hierarchy};
use notesync::types::Parent;
use notesync::{NotePayload, SyncConfig, SyncEngine};
use proptest::prelude::*;
use std::path::Path;
use tempfile::TempDir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn saved_content_reads_back_identically(
        title in "[a-zA-Z0-9][a-zA-Z0-9 _.-]{0,24}",
        body in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        let temp = TempDir::new().unwrap();
        let config = SyncConfig::for_base_path(temp.path());
        let payload = NotePayload::new(title.clone(), body.clone());
        prop_assume!(!config.ignore_filter().is_ignored_name(&payload.declared_identity()));

        let mut engine = SyncEngine::detached(config, MemoryStore::new()).unwrap();
        engine.discover_collections().unwrap();
        let top = engine.hierarchy().top_level().unwrap();

        let saved = engine.save_item(None, top, &payload, true, true).unwrap().unwrap();
        let (node, fetched) = engine.fetch_item(saved.id).unwrap();

        prop_assert_eq!(fetched.body, body);
        prop_assert_eq!(&fetched.title, &node.remote_id);
        prop_assert_eq!(node.remote_id, payload.declared_identity());
    }

    #[test]
    fn chain_resolution_inverts_path_lookup(
        segments in proptest::collection::vec("[a-zA-Z0-9_-]{1,12}", 0..8),
    ) {
        let mut hierarchy = Hierarchy::new();
        let mut current = hierarchy.insert_collection("/data", Parent::Root);
        for segment in &segments {
            current = hierarchy.insert_collection(segment.as_str(), Parent::Collection(current));
        }

        let path = path_for(&hierarchy, current).unwrap();
        let chain = collection_chain_for(Path::new("/data"), &path).unwrap();
        prop_assert_eq!(chain.segments(), segments.as_slice());
        prop_assert_eq!(hierarchy.resolve_chain(&chain), Some(current));
    }
}
