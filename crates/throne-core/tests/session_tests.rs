use tempfile::TempDir;
use throne_core::constants::sessions::{DEFAULT_TITLE, DEVICE_ID_KEY, SESSIONS_KEY};
use throne_core::error::ThroneError;
use throne_core::session::*;

fn memory_store() -> SessionStore {
    SessionStore::open(Box::new(MemoryStorage::new()))
}

/// Storage whose writes always fail.
struct ReadOnlyStorage;

impl KeyValueStorage for ReadOnlyStorage {
    fn get(&self, _key: &str) -> throne_core::Result<Option<String>> {
        Ok(None)
    }

    fn set(&mut self, _key: &str, _value: &str) -> throne_core::Result<()> {
        Err(ThroneError::Persistence("disk full".into()))
    }
}

// ========================================================================
// Lifecycle
// ========================================================================

#[test]
fn test_create_and_get() {
    let mut store = memory_store();
    let session = store.create(None, "gpt-4o");

    assert_eq!(session.title, DEFAULT_TITLE);
    assert_eq!(session.device_id, store.device_id());
    assert!(session.messages.is_empty());
    assert_eq!(session.created_at, session.updated_at);
    assert_eq!(store.get(&session.id), Some(&session));
    assert!(store.get("missing").is_none());
}

#[test]
fn test_create_with_explicit_title() {
    let mut store = memory_store();
    let session = store.create(Some("War Council"), "llama3:latest");
    assert_eq!(session.title, "War Council");
    assert_eq!(session.model, "llama3:latest");
}

#[test]
fn test_append_derives_title_from_first_user_message() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;

    let long = "Tell me everything about the forging of the FlameStack and its fallbacks";
    store.append(&id, Message::user(long)).unwrap();

    let session = store.get(&id).unwrap();
    let expected: String = long.chars().take(50).collect();
    assert_eq!(session.title, format!("{}...", expected));
    assert_eq!(session.messages.len(), 1);
    assert!(session.updated_at >= session.created_at);
}

#[test]
fn test_short_first_message_is_title_verbatim() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;
    store.append(&id, Message::user("Status?")).unwrap();
    store.append(&id, Message::user("A second question")).unwrap();
    assert_eq!(store.get(&id).unwrap().title, "Status?");
}

#[test]
fn test_explicit_title_is_replaced_by_first_user_message() {
    let mut store = memory_store();
    let id = store.create(Some("Sacred chat"), "gpt-4o").id;
    store
        .append(
            &id,
            Message::user("Hello there, this is a long message exceeding fifty characters for truncation testing"),
        )
        .unwrap();
    assert_eq!(
        store.get(&id).unwrap().title,
        "Hello there, this is a long message exceeding fift..."
    );
}

#[test]
fn test_clear_lifts_rename_for_next_first_message() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;
    store.rename(&id, "Pinned").unwrap();
    store.append(&id, Message::user("ignored for title")).unwrap();
    assert_eq!(store.get(&id).unwrap().title, "Pinned");

    store.clear(&id).unwrap();
    store.append(&id, Message::user("fresh start")).unwrap();
    assert_eq!(store.get(&id).unwrap().title, "fresh start");
}

#[test]
fn test_append_to_unknown_session_leaves_store_unchanged() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;
    store.append(&id, Message::user("kept")).unwrap();
    let before: Vec<Session> = store.list().into_iter().cloned().collect();

    let result = store.append("no-such-session", Message::user("lost"));
    assert!(matches!(result, Err(ThroneError::NotFound(_))));

    let after: Vec<Session> = store.list().into_iter().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn test_messages_stay_in_insertion_order() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;
    for i in 0..5 {
        store.append(&id, Message::user(format!("m{i}"))).unwrap();
    }
    let contents: Vec<String> = store
        .get(&id)
        .unwrap()
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents, vec!["m0", "m1", "m2", "m3", "m4"]);
}

#[test]
fn test_rename_and_set_model() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;

    store.rename(&id, "Renamed").unwrap();
    store.set_model(&id, "llama3.1:8b").unwrap();

    let session = store.get(&id).unwrap();
    assert_eq!(session.title, "Renamed");
    assert_eq!(session.model, "llama3.1:8b");
    assert!(matches!(store.rename("nope", "x"), Err(ThroneError::NotFound(_))));
}

#[test]
fn test_clear_is_idempotent() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;
    store.append(&id, Message::user("something")).unwrap();

    store.clear(&id).unwrap();
    let once = store.get(&id).unwrap().clone();
    store.clear(&id).unwrap();
    let twice = store.get(&id).unwrap().clone();

    assert!(once.messages.is_empty());
    assert_eq!(once.title, DEFAULT_TITLE);
    assert_eq!(once.messages, twice.messages);
    assert_eq!(once.title, twice.title);
}

#[test]
fn test_delete() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;
    store.delete(&id).unwrap();
    assert!(store.get(&id).is_none());
    assert!(matches!(store.delete(&id), Err(ThroneError::NotFound(_))));
}

#[test]
fn test_list_for_device_sorted_by_recent_update() {
    let mut store = memory_store();
    let first = store.create(Some("first"), "m").id;
    let second = store.create(Some("second"), "m").id;
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.append(&first, Message::user("bump")).unwrap();

    let device = store.device_id().to_string();
    let titles: Vec<&str> = store
        .list_for_device(&device)
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["first", "second"]);
    assert!(store.list_for_device("other-device").is_empty());
    assert!(store.get(&second).is_some());
}

// ========================================================================
// Retention
// ========================================================================

#[test]
fn test_at_most_fifty_sessions_per_device() {
    let mut store = memory_store();
    let mut ids = Vec::new();
    for i in 0..60 {
        ids.push(store.create(Some(&format!("s{i}")), "m").id);
    }
    assert_eq!(store.list().len(), 50);
    // The most recent creation always survives.
    assert!(store.get(ids.last().unwrap()).is_some());
}

#[test]
fn test_retention_applies_to_other_devices() {
    let foreign: Vec<Session> = (0..55)
        .map(|i| Session::new("device-foreign", format!("f{i}"), "m"))
        .collect();
    let storage = MemoryStorage::new()
        .with_entry(SESSIONS_KEY, serde_json::to_string(&foreign).unwrap())
        .with_entry(DEVICE_ID_KEY, "device-local");

    let mut store = SessionStore::open(Box::new(storage));
    assert_eq!(store.device_id(), "device-local");
    assert_eq!(store.list_for_device("device-foreign").len(), 55);

    store.create(None, "m");
    assert_eq!(store.list_for_device("device-foreign").len(), 50);
    assert_eq!(store.list_for_device("device-local").len(), 1);
}

#[test]
fn test_custom_retention_limit() {
    let mut store = memory_store().with_max_sessions(3);
    for _ in 0..5 {
        store.create(None, "m");
    }
    assert_eq!(store.list().len(), 3);
}

// ========================================================================
// Persistence
// ========================================================================

#[test]
fn test_file_storage_persists_device_and_sessions() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");

    let (device, id) = {
        let mut store = SessionStore::open(Box::new(FileStorage::open(&path).unwrap()));
        let id = store.create(None, "gpt-4o").id;
        store.append(&id, Message::user("remember me")).unwrap();
        (store.device_id().to_string(), id)
    };

    let store = SessionStore::open(Box::new(FileStorage::open(&path).unwrap()));
    assert_eq!(store.device_id(), device);
    let session = store.get(&id).unwrap();
    assert_eq!(session.messages[0].content, "remember me");
    assert_eq!(session.title, "remember me");
}

#[test]
fn test_persisted_layout_uses_two_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");
    {
        let mut store = SessionStore::open(Box::new(FileStorage::open(&path).unwrap()));
        store.create(None, "gpt-4o");
    }

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let device = raw[DEVICE_ID_KEY].as_str().unwrap();
    assert!(device.starts_with("device-"));

    let sessions: serde_json::Value =
        serde_json::from_str(raw[SESSIONS_KEY].as_str().unwrap()).unwrap();
    assert_eq!(sessions[0]["deviceId"], device);
    assert!(chrono::DateTime::parse_from_rfc3339(sessions[0]["createdAt"].as_str().unwrap()).is_ok());
}

#[test]
fn test_malformed_sessions_load_as_empty() {
    let storage = MemoryStorage::new().with_entry(SESSIONS_KEY, "{broken");
    let store = SessionStore::open(Box::new(storage));
    assert!(store.list().is_empty());
}

#[test]
fn test_storage_failures_are_swallowed() {
    let mut store = SessionStore::open(Box::new(ReadOnlyStorage));
    let id = store.create(None, "gpt-4o").id;
    store.append(&id, Message::user("still works")).unwrap();
    assert_eq!(store.get(&id).unwrap().messages.len(), 1);
}

// ========================================================================
// Export
// ========================================================================

#[test]
fn test_export_preserves_messages() {
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;
    store.append(&id, Message::user("question")).unwrap();
    store
        .append(&id, Message::assistant("answer", "gpt-4o"))
        .unwrap();

    let export = store.export(&id).unwrap();
    let json = export.to_json_pretty().unwrap();
    let parsed: SessionExport = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.session.messages.len(), 2);
    assert_eq!(parsed.session.messages, store.get(&id).unwrap().messages);
    assert_eq!(parsed.exported_by, "Sacred Infrastructure Incarnate");
}

#[test]
fn test_export_writes_named_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = memory_store();
    let id = store.create(None, "gpt-4o").id;

    let path = store.export(&id).unwrap().write_to(temp_dir.path()).unwrap();
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with(&format!("session-{id}-")));
    assert!(name.ends_with(".json"));
    assert!(path.exists());
}

#[test]
fn test_export_unknown_session() {
    let store = memory_store();
    assert!(matches!(store.export("ghost"), Err(ThroneError::NotFound(_))));
}
