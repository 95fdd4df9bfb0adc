use super::{client_over, fp, InMemoryRegistryServer, ScriptedTransport};
use crate::RegistryError;

#[tokio::test]
async fn store_then_lookup_then_delete() {
    let server = InMemoryRegistryServer::new();
    let client = client_over(server.clone());
    let fingerprint = fp("happy-path");

    assert!(!client.lookup(&fingerprint).await.unwrap());
    assert!(client.store(&fingerprint).await.unwrap());
    assert!(client.lookup(&fingerprint).await.unwrap());
    assert!(client.delete(&fingerprint).await.unwrap());
    assert!(!client.lookup(&fingerprint).await.unwrap());
}

#[tokio::test]
async fn store_is_idempotent_sequentially() {
    let server = InMemoryRegistryServer::new();
    let client = client_over(server.clone());
    let fingerprint = fp("idempotent");

    assert!(client.store(&fingerprint).await.unwrap());
    // second store collides with the conditional write and is success
    assert!(!client.store(&fingerprint).await.unwrap());
    assert_eq!(server.entry_count(), 1);
}

#[tokio::test]
async fn store_is_idempotent_concurrently() {
    let server = InMemoryRegistryServer::new();
    let client = client_over(server.clone());
    let fingerprint = fp("concurrent");

    let (a, b) = tokio::join!(client.store(&fingerprint), client.store(&fingerprint));
    assert!(a.is_ok());
    assert!(b.is_ok());
    // exactly one call logically created the entry
    assert_eq!(a.unwrap() as u8 + b.unwrap() as u8, 1);
    assert_eq!(server.entry_count(), 1);
}

#[tokio::test]
async fn delete_absent_is_success() {
    let server = InMemoryRegistryServer::new();
    let client = client_over(server);
    let fingerprint = fp("absent");

    assert!(!client.delete(&fingerprint).await.unwrap());
    assert!(!client.delete(&fingerprint).await.unwrap());
}

#[tokio::test]
async fn stored_entry_carries_ttl_expiry() {
    let server = InMemoryRegistryServer::new();
    let client = client_over(server.clone());
    let fingerprint = fp("ttl");

    client.store(&fingerprint).await.unwrap();
    let entry = server.entry(&fingerprint).expect("entry");
    assert_eq!(entry.fingerprint, fingerprint);
    // expires_at is epoch seconds in the future; created_at parses as a date
    assert!(entry.created_at.starts_with("20"));
    assert!(entry.expires_at > 3600);
}

#[tokio::test]
async fn throttled_then_success_takes_two_attempts() {
    let transport = ScriptedTransport::new(vec![
        ScriptedTransport::status(429),
        ScriptedTransport::status(200),
    ]);
    let client = client_over(transport.clone());

    assert!(client.lookup(&fp("retry")).await.unwrap());
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn retry_budget_is_exhausted_on_persistent_fault() {
    let transport = ScriptedTransport::new(vec![
        ScriptedTransport::status(500),
        ScriptedTransport::status(500),
        ScriptedTransport::status(500),
    ]);
    let client = client_over(transport.clone());

    let err = client.lookup(&fp("fault")).await.unwrap_err();
    assert_eq!(err, RegistryError::ServerFault);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn contains_fails_open_on_persistent_fault() {
    let transport = ScriptedTransport::new(vec![
        ScriptedTransport::status(500),
        ScriptedTransport::status(500),
        ScriptedTransport::status(500),
    ]);
    let client = client_over(transport.clone());

    assert!(!client.contains(&fp("fail-open")).await);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn contains_fails_open_on_connectivity_loss() {
    let transport = ScriptedTransport::new(Vec::new());
    let client = client_over(transport);

    assert!(!client.contains(&fp("offline")).await);
}

#[tokio::test]
async fn conflict_during_store_is_not_retried() {
    let transport = ScriptedTransport::new(vec![ScriptedTransport::status(409)]);
    let client = client_over(transport.clone());

    assert!(!client.store(&fp("conflict")).await.unwrap());
    assert_eq!(transport.call_count(), 1);
}
