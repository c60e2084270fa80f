// Webhook signature verification
//
// HMAC-SHA256 over "<timestamp>.<payload>", multiple v1 entries, and the
// replay tolerance window.

use storefront::payments::services::signature::{
    signature_header, verify_signature, SignatureError, SIGNATURE_TOLERANCE_SECS,
};

const SECRET: &str = "whsec_unit_secret";
const NOW: i64 = 1_700_000_000;
const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

fn verify(payload: &[u8], header: &str) -> Result<(), SignatureError> {
    verify_signature(payload, header, SECRET, NOW, SIGNATURE_TOLERANCE_SECS)
}

#[test]
fn test_valid_signature_accepted() {
    let header = signature_header(PAYLOAD, SECRET, NOW).unwrap();
    assert_eq!(verify(PAYLOAD, &header), Ok(()));
}

#[test]
fn test_tampered_payload_rejected() {
    let header = signature_header(PAYLOAD, SECRET, NOW).unwrap();
    let tampered = br#"{"id":"evt_1","type":"payment_intent.canceled"}"#;

    assert_eq!(verify(tampered, &header), Err(SignatureError::Mismatch));
}

#[test]
fn test_wrong_secret_rejected() {
    let header = signature_header(PAYLOAD, "whsec_other", NOW).unwrap();
    assert_eq!(verify(PAYLOAD, &header), Err(SignatureError::Mismatch));
}

#[test]
fn test_any_matching_v1_entry_is_enough() {
    let valid = signature_header(PAYLOAD, SECRET, NOW).unwrap();
    let valid_sig = valid.split_once(",v1=").unwrap().1;

    let header = format!("t={},v1={},v1={}", NOW, "ab".repeat(32), valid_sig);
    assert_eq!(verify(PAYLOAD, &header), Ok(()));
}

#[test]
fn test_unknown_schemes_ignored() {
    let valid = signature_header(PAYLOAD, SECRET, NOW).unwrap();
    let header = format!("{},v0=deadbeef", valid);
    assert_eq!(verify(PAYLOAD, &header), Ok(()));
}

#[test]
fn test_stale_timestamp_rejected() {
    let signed_at = NOW - SIGNATURE_TOLERANCE_SECS - 1;
    let header = signature_header(PAYLOAD, SECRET, signed_at).unwrap();

    assert_eq!(
        verify(PAYLOAD, &header),
        Err(SignatureError::TimestampOutOfTolerance)
    );
}

#[test]
fn test_timestamp_at_tolerance_edge_accepted() {
    let header = signature_header(PAYLOAD, SECRET, NOW - SIGNATURE_TOLERANCE_SECS).unwrap();
    assert_eq!(verify(PAYLOAD, &header), Ok(()));
}

#[test]
fn test_future_timestamp_rejected() {
    let header = signature_header(PAYLOAD, SECRET, NOW + SIGNATURE_TOLERANCE_SECS + 60).unwrap();
    assert_eq!(
        verify(PAYLOAD, &header),
        Err(SignatureError::TimestampOutOfTolerance)
    );
}

#[test]
fn test_header_shape_errors() {
    assert_eq!(verify(PAYLOAD, ""), Err(SignatureError::MissingHeader));
    assert_eq!(verify(PAYLOAD, "   "), Err(SignatureError::MissingHeader));
    assert_eq!(verify(PAYLOAD, "v1=abcd"), Err(SignatureError::MalformedHeader));
    assert_eq!(
        verify(PAYLOAD, "t=yesterday,v1=abcd"),
        Err(SignatureError::MalformedHeader)
    );
    assert_eq!(
        verify(PAYLOAD, &format!("t={}", NOW)),
        Err(SignatureError::NoSignatures)
    );
}

#[test]
fn test_non_hex_signature_is_a_mismatch() {
    let header = format!("t={},v1=not-hex-at-all", NOW);
    assert_eq!(verify(PAYLOAD, &header), Err(SignatureError::Mismatch));
}

#[test]
fn test_extreme_timestamps_are_out_of_tolerance() {
    for ts in [i64::MIN, i64::MAX] {
        let header = signature_header(PAYLOAD, SECRET, ts).unwrap();
        assert_eq!(
            verify(PAYLOAD, &header),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }
}
