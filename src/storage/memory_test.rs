use super::*;

#[test]
fn set_then_get() {
    let store = MemoryStorage::new();
    store.set_item("token", "abc").unwrap();
    assert_eq!(store.get_item("token").unwrap().as_deref(), Some("abc"));
}

#[test]
fn missing_key_is_none() {
    let store = MemoryStorage::new();
    assert_eq!(store.get_item("nope").unwrap(), None);
}

#[test]
fn remove_absent_key_is_noop() {
    let store = MemoryStorage::new();
    store.remove_item("ghost").unwrap();
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn keys_are_sorted() {
    let store = MemoryStorage::new();
    store.set_item("b", "2").unwrap();
    store.set_item("a", "1").unwrap();
    assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
}

#[test]
fn clear_removes_everything() {
    let store = MemoryStorage::new();
    store.set_item("a", "1").unwrap();
    store.set_item("b", "2").unwrap();
    store.clear().unwrap();
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn unavailable_backend_fails_every_call() {
    let store = MemoryStorage::unavailable();
    assert_eq!(store.get_item("token"), Err(StorageError::Unavailable));
    assert_eq!(store.set_item("token", "x"), Err(StorageError::Unavailable));
    assert_eq!(store.keys(), Err(StorageError::Unavailable));
}
