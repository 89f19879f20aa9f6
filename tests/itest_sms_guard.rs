use std::{sync::Arc, thread, time::Duration};

use sms_guard::{
    AccountId, AccountSeed, AdmissionDecision, AdmissionRequest, DenialReason, NumberSeed,
    PhoneNumber, SmsGuard, SmsGuardOptions,
};

fn phone(raw: &str) -> PhoneNumber {
    raw.parse().unwrap()
}

#[test]
fn itest_replace_all_empty_then_list_is_empty() {
    let guard = SmsGuard::new(SmsGuardOptions::default());

    guard
        .check_admission(AccountId::new_v4(), &phone("+15550000001"), 5)
        .into_result()
        .unwrap();
    assert_eq!(guard.list_accounts().len(), 1);

    guard.replace_all(vec![]).unwrap();
    assert!(guard.list_accounts().is_empty());
}

#[test]
fn itest_limit_one_on_wall_clock() {
    let guard = SmsGuard::new(SmsGuardOptions::default());
    let id = AccountId::new_v4();
    let p = phone("+15550000001");

    assert_eq!(guard.check_admission(id, &p, 1), AdmissionDecision::Granted);
    assert_eq!(
        guard.check_admission(id, &p, 1),
        AdmissionDecision::Denied(DenialReason::CooldownNotElapsed)
    );

    thread::sleep(Duration::from_millis(1_100));

    assert_eq!(
        guard.check_admission(id, &p, 1),
        AdmissionDecision::Denied(DenialReason::PersonalLimitExceeded)
    );
    assert_eq!(guard.list_accounts()[0].numbers[0].checks_performed, 1);
}

#[test]
fn itest_bootstrap_seed_then_handler_flow() {
    let guard = Arc::new(SmsGuard::new(SmsGuardOptions::default()));
    let one = AccountId::new_v4();
    let two = AccountId::new_v4();

    let mut exhausted = NumberSeed::new(phone("+1987654321"), 2);
    exhausted.checks_performed = 2;

    guard
        .replace_all(vec![
            AccountSeed::new(one, 10)
                .with_number(NumberSeed::new(phone("+1234567890"), 5))
                .with_number(NumberSeed::new(phone("+1234567891"), 3)),
            AccountSeed::new(two, 5).with_number(exhausted),
        ])
        .unwrap();

    // What a request handler would do with raw query parameters.
    let handle = |account: &str, number: &str, limit: u64| -> Result<(), String> {
        let request = AdmissionRequest::new(account, number, limit).map_err(|e| e.to_string())?;
        guard
            .engine()
            .check(&request)
            .into_result()
            .map_err(|reason| reason.to_string())
    };

    assert_eq!(handle(&one.to_string(), "+1234567890", 5), Ok(()));
    assert_eq!(
        handle(&two.to_string(), "+1987654321", 2),
        Err("The rate limit exceeded for this phone number.".to_string())
    );
    assert!(handle("bogus", "+1234567890", 5).is_err());

    let accounts = guard.list_accounts();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].account_id, one);
    assert_eq!(accounts[0].total_checks_performed, 1);
    assert_eq!(accounts[1].total_checks_performed, 2);
}

#[test]
fn itest_guards_are_independent() {
    let a = SmsGuard::new(SmsGuardOptions::default());
    let b = SmsGuard::new(SmsGuardOptions::default());
    let id = AccountId::new_v4();
    let p = phone("+15550000001");

    assert!(a.check_admission(id, &p, 1).is_granted());
    assert!(b.check_admission(id, &p, 1).is_granted());
}
