use super::{temp_path, TestKeyProvider};
use crate::{EncryptedStore, StorageError};

#[test]
fn put_get_delete() {
    let store = EncryptedStore::open(temp_path("store"), "gate", &TestKeyProvider::new(1)).unwrap();
    assert!(store.get("a").unwrap().is_none());
    store.put("a", b"one").unwrap();
    assert_eq!(store.get("a").unwrap(), Some(b"one".to_vec()));
    store.delete("a").unwrap();
    assert!(store.get("a").unwrap().is_none());
    // deleting an absent key is not an error
    store.delete("a").unwrap();
}

#[test]
fn survives_reopen() {
    let path = temp_path("store-reopen");
    {
        let store = EncryptedStore::open(&path, "gate", &TestKeyProvider::new(2)).unwrap();
        store.put("block:abc", b"{}").unwrap();
    }
    let reopened = EncryptedStore::open(&path, "gate", &TestKeyProvider::new(2)).unwrap();
    assert_eq!(reopened.get("block:abc").unwrap(), Some(b"{}".to_vec()));
}

#[test]
fn wrong_key_fails_closed() {
    let path = temp_path("store-key");
    {
        let store = EncryptedStore::open(&path, "gate", &TestKeyProvider::new(3)).unwrap();
        store.put("k", b"v").unwrap();
    }
    let err = EncryptedStore::open(&path, "gate", &TestKeyProvider::new(4)).unwrap_err();
    assert!(matches!(err, StorageError::Crypto));
}

#[test]
fn prefix_scan_is_sorted_and_scoped() {
    let store = EncryptedStore::open(temp_path("store-scan"), "gate", &TestKeyProvider::new(5))
        .unwrap();
    store.put("retry:item:bb", b"2").unwrap();
    store.put("retry:item:aa", b"1").unwrap();
    store.put("block:aa", b"x").unwrap();
    let keys = store.keys_with_prefix("retry:item:").unwrap();
    assert_eq!(keys, vec!["retry:item:aa", "retry:item:bb"]);
}

#[test]
fn rejects_empty_namespace() {
    let err = EncryptedStore::open(temp_path("store-ns"), " ", &TestKeyProvider::new(6)).unwrap_err();
    assert!(matches!(err, StorageError::Invalid));
}

#[test]
fn namespaces_are_isolated() {
    let path = temp_path("store-iso");
    let a = EncryptedStore::open(&path, "alpha", &TestKeyProvider::new(7)).unwrap();
    let b = EncryptedStore::open(&path, "beta", &TestKeyProvider::new(7)).unwrap();
    a.put("k", b"alpha").unwrap();
    assert!(b.get("k").unwrap().is_none());
    assert_eq!(a.namespace(), "alpha");
}
