//! Close reason wire codes.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use roomcast_core::CloseReason;

#[test]
fn eviction_status_is_distinct_from_normal_close() {
    assert_ne!(CloseReason::TooSlow.code(), CloseReason::Normal.code());
    assert_ne!(CloseReason::TooSlow.code(), CloseReason::Internal.code());
    assert_eq!(CloseReason::TooSlow.code(), 1008);
    assert_eq!(
        CloseReason::TooSlow.reason(),
        "connection too slow to keep up with messages"
    );
}

#[test]
fn codes_resolve_back_to_reasons() {
    for r in [
        CloseReason::Normal,
        CloseReason::TooSlow,
        CloseReason::Internal,
    ] {
        assert_eq!(CloseReason::from_code(r.code()), Some(r));
    }
    assert_eq!(CloseReason::from_code(4000), None);
}
