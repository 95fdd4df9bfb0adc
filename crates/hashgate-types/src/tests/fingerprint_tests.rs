use crate::{Fingerprint, HashgateTypesError};

#[test]
fn compute_is_deterministic() {
    let a = Fingerprint::compute(b"attachment bytes");
    let b = Fingerprint::compute(b"attachment bytes");
    assert_eq!(a, b);
    assert_ne!(a, Fingerprint::compute(b"attachment bytes!"));
}

#[test]
fn hex_round_trip() {
    let fp = Fingerprint::compute(b"payload");
    let parsed = Fingerprint::from_hex(&fp.to_hex()).unwrap();
    assert_eq!(fp, parsed);
}

#[test]
fn rejects_bad_hex() {
    let err = Fingerprint::from_hex("zz").unwrap_err();
    assert!(matches!(err, HashgateTypesError::InvalidFingerprintHex));
    let short = Fingerprint::from_hex("abcd").unwrap_err();
    assert!(matches!(short, HashgateTypesError::InvalidFingerprintHex));
}

#[test]
fn serde_uses_hex_string() {
    let fp = Fingerprint::compute(b"x");
    let json = serde_json::to_string(&fp).unwrap();
    assert_eq!(json, format!("\"{}\"", fp.to_hex()));
    let back: Fingerprint = serde_json::from_str(&json).unwrap();
    assert_eq!(fp, back);
}

#[test]
fn log_prefix_is_truncated() {
    let fp = Fingerprint::compute(b"secret content");
    let prefix = fp.log_prefix();
    assert_eq!(prefix.len(), 8);
    assert!(fp.to_hex().starts_with(&prefix));
}
