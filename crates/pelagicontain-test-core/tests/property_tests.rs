//! Property-based tests for identifiers, bus addressing and result accumulation.

use proptest::prelude::*;

use pelagicontain_test_core::{
    AppId, BusAddress, BusError, CorrelationToken, DriverConfig, RunOutcome, TestResults,
};
use uuid::Uuid;

proptest! {
    /// Tokens never contain the characters D-Bus reserves in object paths.
    #[test]
    fn prop_token_is_path_safe(bits in any::<u128>()) {
        let token = CorrelationToken::from_uuid(Uuid::from_u128(bits));
        let value = token.as_str();

        prop_assert!(!value.is_empty());
        prop_assert!(!value.contains('-'));
        prop_assert!(!value.contains('/'));
        prop_assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
        prop_assert_eq!(value.len(), 12);
    }

    /// A token always yields a launcher path of exactly one extra element.
    #[test]
    fn prop_launcher_path_appends_one_element(bits in any::<u128>()) {
        let token = CorrelationToken::from_uuid(Uuid::from_u128(bits));
        let address = DriverConfig::default().bus.launcher.address(&token);
        let expected = format!("/com/pelagicore/Pelagicontain/{}", token);

        prop_assert_eq!(address.path.as_str(), expected.as_str());
        prop_assert!(!address.path.contains("//"));
    }

    /// App ids are well-formed UUIDs.
    #[test]
    fn prop_app_id_is_uuid(bits in any::<u128>()) {
        let id = AppId::from(Uuid::from_u128(bits));
        let display = id.to_string();

        prop_assert!(!display.is_empty());
        prop_assert_eq!(Uuid::parse_str(&display).unwrap(), *id.as_uuid());
    }

    /// A single failed check anywhere fails the run.
    #[test]
    fn prop_any_failure_fails_run(outcomes in prop::collection::vec(any::<bool>(), 0..32)) {
        let mut results = TestResults::new();
        for (i, passed) in outcomes.iter().enumerate() {
            results.record(format!("check {i}"), *passed);
        }

        let outcome = RunOutcome::new(&results, None);
        let expected = outcomes.iter().all(|p| *p);
        prop_assert_eq!(outcome.passed, expected);
        prop_assert_eq!(outcome.status_code() == 0, expected);
    }

    /// Only the no-reply error name is classified as no-reply.
    #[test]
    fn prop_only_no_reply_is_no_reply(suffix in "[A-Za-z]{1,16}") {
        let name = format!("org.freedesktop.DBus.Error.{suffix}");
        let err = BusError::from_error_name(&name, "message");
        prop_assert_eq!(err.is_no_reply(), suffix == "NoReply");
    }
}

#[test]
fn test_launcher_address_display() {
    let address = BusAddress::new("com.example.Svc", "/com/example/Svc", "com.example.Svc");
    assert_eq!(
        address.to_string(),
        "com.example.Svc/com/example/Svc (com.example.Svc)"
    );
}
