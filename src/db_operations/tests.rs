use super::*;
use crate::error::AuthError;
use serde_json::json;

fn create_temp_store() -> SledStore {
    let store = SledStore::temporary().unwrap();
    store
        .define_view(ViewDefinition::by_field("user_list", "user", "username"))
        .unwrap();
    store
        .define_view(ViewDefinition::by_embedded(
            "users_by_group",
            "user",
            "groups",
            "name",
        ))
        .unwrap();
    store
}

fn user_doc(name: &str, groups: &[&str]) -> Value {
    json!({
        "doc_type": "user",
        "username": name,
        "groups": groups.iter().map(|g| json!({"name": g})).collect::<Vec<_>>(),
    })
}

#[test]
fn test_save_assigns_id_and_revision() {
    let store = create_temp_store();
    let saved = store.save(user_doc("alice", &[])).unwrap();
    assert!(saved["_id"].as_str().is_some());
    assert_eq!(saved["_rev"], 1);

    let again = store.save(saved).unwrap();
    assert_eq!(again["_rev"], 2);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_query_by_field_and_embedded() {
    let store = create_temp_store();
    store.save(user_doc("alice", &["editors"])).unwrap();
    store.save(user_doc("bob", &["editors", "admins"])).unwrap();
    store.save(user_doc("carol", &[])).unwrap();

    let alice = store.query("user_list", "alice").unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0]["username"], "alice");

    let editors = store.query("users_by_group", "editors").unwrap();
    assert_eq!(editors.len(), 2);
    assert!(store.query("users_by_group", "nobody").unwrap().is_empty());
    assert!(store.query("user_list", "ali").unwrap().is_empty());
}

#[test]
fn test_scan_is_ordered_and_deduplicated() {
    let store = create_temp_store();
    store.save(user_doc("bob", &["b", "a", "a"])).unwrap();
    store.save(user_doc("alice", &["a"])).unwrap();

    let names: Vec<_> = store
        .scan("user_list")
        .unwrap()
        .into_iter()
        .map(|d| d["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["alice", "bob"]);

    assert_eq!(store.scan("users_by_group").unwrap().len(), 2);
}

#[test]
fn test_update_moves_index_entries() {
    let store = create_temp_store();
    let mut doc = store.save(user_doc("alice", &["editors"])).unwrap();
    doc["username"] = json!("alicia");
    doc["groups"] = json!([]);
    store.save(doc).unwrap();

    assert!(store.query("user_list", "alice").unwrap().is_empty());
    assert_eq!(store.query("user_list", "alicia").unwrap().len(), 1);
    assert!(store.query("users_by_group", "editors").unwrap().is_empty());
}

#[test]
fn test_stale_revision_conflicts() {
    let store = create_temp_store();
    let first = store.save(user_doc("alice", &[])).unwrap();
    store.save(first.clone()).unwrap();

    let err = store.save(first.clone()).unwrap_err();
    assert!(matches!(err, AuthError::Conflict { .. }));
    assert!(matches!(
        store.delete(&first).unwrap_err(),
        AuthError::Conflict { .. }
    ));
}

#[test]
fn test_create_over_existing_id_conflicts() {
    let store = create_temp_store();
    let saved = store.save(user_doc("alice", &[])).unwrap();
    let mut clash = user_doc("impostor", &[]);
    clash["_id"] = saved["_id"].clone();
    assert!(matches!(
        store.save(clash).unwrap_err(),
        AuthError::Conflict { .. }
    ));
}

#[test]
fn test_delete_removes_document_and_entries() {
    let store = create_temp_store();
    let saved = store.save(user_doc("alice", &["editors"])).unwrap();
    store.delete(&saved).unwrap();

    assert!(store.is_empty());
    assert!(store.query("user_list", "alice").unwrap().is_empty());
    assert!(store.query("users_by_group", "editors").unwrap().is_empty());
    assert!(matches!(
        store.delete(&saved).unwrap_err(),
        AuthError::DocumentMissing { .. }
    ));
}

#[test]
fn test_delete_unsaved_document_is_missing() {
    let store = create_temp_store();
    assert!(matches!(
        store.delete(&user_doc("ghost", &[])).unwrap_err(),
        AuthError::DocumentMissing { .. }
    ));
}

#[test]
fn test_bulk_save_reports_each_document() {
    let store = create_temp_store();
    let stale = store.save(user_doc("alice", &[])).unwrap();
    store.save(stale.clone()).unwrap();

    let results = store.bulk_save(vec![user_doc("bob", &[]), stale, user_doc("carol", &[])]);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(AuthError::Conflict { .. })));
    assert!(results[2].is_ok());
    assert_eq!(store.len(), 3);
}

#[test]
fn test_view_defined_late_indexes_existing_documents() {
    let store = create_temp_store();
    store.save(user_doc("alice", &[])).unwrap();
    store
        .save(json!({"doc_type": "group", "name": "editors"}))
        .unwrap();

    store
        .define_view(ViewDefinition::by_field("group_list", "group", "name"))
        .unwrap();
    let groups = store.scan("group_list").unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["name"], "editors");
}

#[test]
fn test_unknown_view_is_error() {
    let store = create_temp_store();
    assert!(matches!(
        store.query("missing", "x").unwrap_err(),
        AuthError::UnknownView(_)
    ));
    assert!(matches!(
        store.scan("missing").unwrap_err(),
        AuthError::UnknownView(_)
    ));
}

#[test]
fn test_non_object_document_rejected() {
    let store = create_temp_store();
    assert!(matches!(
        store.save(json!(["not", "an", "object"])).unwrap_err(),
        AuthError::Serialization(_)
    ));
}

#[test]
fn test_documents_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = crate::config::StorageConfig {
        path: dir.path().join("db"),
        temporary: false,
        flush_on_write: true,
    };
    {
        let store = SledStore::open(&config).unwrap();
        store.save(user_doc("alice", &[])).unwrap();
    }

    let store = SledStore::open(&config).unwrap();
    store
        .define_view(ViewDefinition::by_field("user_list", "user", "username"))
        .unwrap();
    assert_eq!(store.query("user_list", "alice").unwrap().len(), 1);
}
