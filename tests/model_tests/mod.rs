use notify_service::models::{
    event::{Event, EventType},
    validation::validate_user_id,
};

use crate::support::test_event;

/// Test: increment_retry produces a new value and leaves the original alone
#[test]
fn test_increment_retry_creates_new_event() {
    let original = test_event(EventType::UserNotification, "test-user", &[]);

    let updated = original.increment_retry();

    assert_eq!(original.retry_count, 0);
    assert_eq!(updated.retry_count, 1);
}

/// Test: increment_retry preserves every other field
#[test]
fn test_increment_retry_preserves_other_fields() {
    let mut original = test_event(EventType::SystemAlert, "user-456", &[("key", "value")]);
    original.retry_count = 2;

    let updated = original.increment_retry();

    assert_eq!(updated.event_id, original.event_id);
    assert_eq!(updated.event_type, original.event_type);
    assert_eq!(updated.user_id, original.user_id);
    assert_eq!(updated.payload, original.payload);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.version, original.version);
    assert_eq!(updated.retry_count, 3);
}

/// Test: Serialization is lossless across the queue codec
#[test]
fn test_event_serialization_is_lossless() {
    let mut event = test_event(
        EventType::EmailNotification,
        "user-789",
        &[("to_email", "someone@example.com"), ("message", "hi")],
    );
    event.retry_count = 2;

    let payload = serde_json::to_string(&event).unwrap();
    let decoded = serde_json::from_str::<Event>(&payload).unwrap();

    assert_eq!(decoded.event_id, event.event_id);
    assert_eq!(decoded.event_type, event.event_type);
    assert_eq!(decoded.user_id, event.user_id);
    assert_eq!(decoded.payload, event.payload);
    assert_eq!(decoded.created_at, event.created_at);
    assert_eq!(decoded.retry_count, event.retry_count);
    assert_eq!(decoded.version, event.version);
}

/// Test: Event types use their wire names
#[test]
fn test_event_type_wire_format() {
    let event = test_event(EventType::UserNotification, "test-user", &[]);

    let payload = serde_json::to_string(&event).unwrap();

    assert!(payload.contains("\"USER_NOTIFICATION\""));
}

/// Test: Malformed queue records are rejected, not silently dropped
#[test]
fn test_malformed_event_record_rejected() {
    for payload in [
        "not json at all",
        "{}",
        r#"{"event_id": "not-a-uuid", "event_type": "USER_NOTIFICATION"}"#,
        r#"{"event_id": "7e0e645c-31f7-4f70-a07c-a7e0cf35a9b1", "event_type": "NO_SUCH_TYPE", "user_id": "u", "created_at": "2026-01-01T00:00:00Z"}"#,
    ] {
        assert!(
            serde_json::from_str::<Event>(payload).is_err(),
            "expected rejection for payload: {}",
            payload
        );
    }
}

/// Test: user_id bounds are enforced at the validation boundary
#[test]
fn test_user_id_validation_bounds() {
    assert!(validate_user_id("").is_err());
    assert!(validate_user_id("a").is_ok());
    assert!(validate_user_id(&"x".repeat(128)).is_ok());
    assert!(validate_user_id(&"x".repeat(129)).is_err());
}
