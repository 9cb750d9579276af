use taskmaster::{ExitContext, RestartPolicy};

fn exit(policy: RestartPolicy, code: i32) -> ExitContext {
    ExitContext {
        policy,
        max_attempts: 3,
        attempts: 0,
        stopped_early: false,
        user_stopped: false,
        exit_code: code,
        expected_exit_code: 0,
    }
}

#[test]
fn test_restart_policy_default() {
    assert_eq!(RestartPolicy::default(), RestartPolicy::OnFailure);
}

#[test]
fn test_restart_policy_names() {
    let policy: RestartPolicy = serde_json::from_str("\"unless-stopped\"").unwrap();
    assert_eq!(policy, RestartPolicy::UnlessStopped);
    assert_eq!(RestartPolicy::OnFailure.to_string(), "on-failure");
    assert!(serde_json::from_str::<RestartPolicy>("\"sometimes\"").is_err());
}

#[test]
fn test_always_retries_every_exit() {
    assert!(exit(RestartPolicy::Always, 0).should_retry());
    assert!(exit(RestartPolicy::Always, 1).should_retry());
}

#[test]
fn test_never_does_not_retry() {
    assert!(!exit(RestartPolicy::Never, 1).should_retry());
    let early = ExitContext {
        stopped_early: true,
        ..exit(RestartPolicy::Never, 1)
    };
    assert!(!early.should_retry());
}

#[test]
fn test_on_failure_retries_unexpected_exit_only() {
    assert!(exit(RestartPolicy::OnFailure, 2).should_retry());
    assert!(!exit(RestartPolicy::OnFailure, 0).should_retry());

    let custom = ExitContext {
        expected_exit_code: 2,
        ..exit(RestartPolicy::OnFailure, 2)
    };
    assert!(!custom.should_retry());
}

#[test]
fn test_unless_stopped_respects_user_stop() {
    assert!(exit(RestartPolicy::UnlessStopped, 1).should_retry());
    assert!(!exit(RestartPolicy::UnlessStopped, 0).should_retry());

    let stopped = ExitContext {
        user_stopped: true,
        ..exit(RestartPolicy::UnlessStopped, 1)
    };
    assert!(!stopped.should_retry());

    let stopped_early = ExitContext {
        stopped_early: true,
        ..stopped
    };
    assert!(!stopped_early.should_retry());
}

#[test]
fn test_stopped_early_retries_even_expected_exit() {
    for policy in [RestartPolicy::Always, RestartPolicy::OnFailure, RestartPolicy::UnlessStopped] {
        let early = ExitContext {
            stopped_early: true,
            ..exit(policy, 0)
        };
        assert!(early.should_retry(), "{policy} should retry an early exit");
    }
}

#[test]
fn test_attempt_cap() {
    let exhausted = ExitContext {
        attempts: 3,
        ..exit(RestartPolicy::Always, 1)
    };
    assert!(!exhausted.attempts_remain());
    assert!(!exhausted.should_retry());

    let last = ExitContext {
        attempts: 2,
        ..exhausted
    };
    assert!(last.should_retry());
}

#[test]
fn test_zero_cap_is_unlimited() {
    let unlimited = ExitContext {
        max_attempts: 0,
        attempts: 1000,
        ..exit(RestartPolicy::OnFailure, 1)
    };
    assert!(unlimited.attempts_remain());
    assert!(unlimited.should_retry());
}
