#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use roomcast_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
hub:
  mailbox_capacty: 8 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "127.0.0.1:3000");
    assert_eq!(cfg.hub.mailbox_capacity, 16);
    assert_eq!(cfg.hub.publish_burst, 8);
    assert_eq!(cfg.hub.read_burst, 10);
    assert_eq!(cfg.hub.write_timeout(), Duration::from_secs(5));
    assert!(cfg.sessions.sweeping_enabled());
}

#[test]
fn full_config_overrides_defaults() {
    let ok = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
hub:
  mailbox_capacity: 4
  publish_burst: 2
  publish_interval_ms: 250
  read_burst: 3
  write_timeout_ms: 1000
sessions:
  idle_ttl_secs: 0
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.hub.mailbox_capacity, 4);
    assert_eq!(cfg.hub.publish_interval(), Duration::from_millis(250));
    assert_eq!(cfg.hub.read_burst, 3);
    assert!(!cfg.sessions.sweeping_enabled());
}

#[test]
fn unsupported_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn out_of_range_values_are_rejected() {
    for bad in [
        "version: 1\nhub:\n  mailbox_capacity: 0\n",
        "version: 1\nhub:\n  publish_burst: 0\n",
        "version: 1\nhub:\n  read_burst: 0\n",
        "version: 1\nhub:\n  write_timeout_ms: 10\n",
        "version: 1\nsessions:\n  sweep_interval_secs: 0\n",
        "version: 1\ngateway:\n  listen: \"not an address\"\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "{bad}");
    }
}

#[test]
fn missing_file_is_an_internal_error() {
    let err = config::load_from_file("/nonexistent/roomcast.yaml").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "INTERNAL");
}
