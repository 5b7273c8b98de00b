use super::*;

#[test]
fn verify_accepts_matching_signature() {
    let payload = b"{\"event_id\":\"e1\"}";
    let secret = "topsecret";
    let sig = Signer::sign(payload, secret);
    assert!(Signer::verify(payload, &sig, secret));
}

#[test]
fn verify_rejects_wrong_secret() {
    let payload = b"{\"event_id\":\"e1\"}";
    let sig = Signer::sign(payload, "secret-a");
    assert!(!Signer::verify(payload, &sig, "secret-b"));
}

#[test]
fn verify_rejects_tampered_payload() {
    let secret = "topsecret";
    let sig = Signer::sign(b"original", secret);
    assert!(!Signer::verify(b"tampered", &sig, secret));
}

#[test]
fn verify_rejects_length_mismatch_without_panicking() {
    let secret = "topsecret";
    assert!(!Signer::verify(b"payload", "short", secret));
}

#[test]
fn sign_output_is_lowercase_hex() {
    let digest = Signer::sign(b"payload", "secret");
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(digest.len(), 64);
}

#[test]
fn header_value_has_sha256_prefix() {
    let header = Signer::header_value(b"payload", "secret");
    assert!(header.starts_with("sha256="));
}

#[test]
fn parse_header_accepts_well_formed_value() {
    let header = Signer::header_value(b"payload", "secret");
    let parsed = Signer::parse_header(&header).unwrap();
    assert_eq!(parsed.len(), 64);
}

#[test]
fn parse_header_rejects_malformed_values() {
    assert!(Signer::parse_header("sha1=abcd").is_none());
    assert!(Signer::parse_header("sha256=").is_none());
    assert!(Signer::parse_header("sha256=NOTHEX").is_none());
    assert!(Signer::parse_header("sha256=ABCDEF").is_none());
    assert!(Signer::parse_header("no-prefix").is_none());
}
