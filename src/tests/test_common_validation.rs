use std::time::Duration;

use crate::{
    AccountId, Clock, CooldownMs, ManualClock, PhoneNumber, RetentionMs, SmsGuardError,
    SweepIntervalMs, Timestamp, WindowSizeMs,
};

#[test]
fn window_size_ms_try_from_validates_nonzero() {
    let w = WindowSizeMs::try_from(1u64).unwrap();
    assert_eq!(*w, 1u64);
    assert_eq!(*WindowSizeMs::default(), 1_000);

    assert_eq!(
        WindowSizeMs::try_from(0u64).unwrap_err(),
        "Window size must be greater than 0"
    );
}

#[test]
fn sweep_interval_and_retention_validate_nonzero_and_default_to_an_hour() {
    assert_eq!(*SweepIntervalMs::default(), 3_600_000);
    assert_eq!(*RetentionMs::default(), 3_600_000);

    assert_eq!(
        SweepIntervalMs::try_from(0u64).unwrap_err(),
        "Sweep interval must be greater than 0"
    );
    assert_eq!(
        RetentionMs::try_from(0u64).unwrap_err(),
        "Retention must be greater than 0"
    );
    assert_eq!(*RetentionMs::try_from(50u64).unwrap(), 50);
}

#[test]
fn cooldown_defaults_to_one_second_and_accepts_zero() {
    assert_eq!(*CooldownMs::default(), 1_000);
    assert_eq!(*CooldownMs::from(0), 0);
}

#[test]
fn phone_number_accepts_e164_shapes() {
    assert_eq!(PhoneNumber::try_from("+1234567890").unwrap().as_str(), "+1234567890");
    assert_eq!(PhoneNumber::try_from("5551234").unwrap().as_str(), "5551234");
    assert_eq!(PhoneNumber::try_from("  +44 ").unwrap().as_str(), "+44");
    assert!(PhoneNumber::try_from("+123456789012345").is_ok());
}

#[test]
fn phone_number_rejects_malformed_input() {
    for raw in ["", "+", "   ", "12a4", "+1-555-1234", "++123", "+1234567890123456"] {
        assert_eq!(
            PhoneNumber::try_from(raw).unwrap_err(),
            SmsGuardError::InvalidPhoneNumber(raw.to_string()),
            "{raw:?} should be rejected"
        );
    }
}

#[test]
fn account_id_parses_uuid_and_rejects_garbage() {
    let id = AccountId::new_v4();
    let parsed: AccountId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);

    assert_eq!(
        "not-a-uuid".parse::<AccountId>().unwrap_err(),
        SmsGuardError::InvalidAccountId("not-a-uuid".to_string())
    );
}

#[test]
fn timestamp_arithmetic_saturates() {
    let t = Timestamp::from_millis(1_000);

    assert_eq!(
        t.saturating_duration_since(Timestamp::from_millis(400)).as_millis(),
        600
    );
    assert_eq!(t.saturating_duration_since(Timestamp::from_millis(2_000)).as_millis(), 0);
    assert_eq!(
        Timestamp::from_millis(u64::MAX)
            .saturating_add(std::time::Duration::from_millis(1))
            .as_millis(),
        u64::MAX
    );
    assert!(Timestamp::EPOCH < t);
}

#[test]
fn manual_clock_advance_saturates() {
    let clock = ManualClock::new(Timestamp::from_millis(u64::MAX - 10));
    clock.advance(Duration::from_millis(5));
    assert_eq!(clock.now(), Timestamp::from_millis(u64::MAX - 5));

    clock.advance(Duration::MAX);
    assert_eq!(clock.now(), Timestamp::from_millis(u64::MAX));
}
