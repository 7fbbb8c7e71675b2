use super::*;

fn config() -> SessionConfig {
    SessionConfig {
        is_anonymous: false,
        respondents: Vec::new(),
        duration_minutes: 1,
    }
}

fn ready_session(config: SessionConfig) -> CallSession {
    let mut session = CallSession::new(config);
    session.apply(SessionEvent::Mounted {
        permission: MicPermission::Granted,
    });
    assert_eq!(session.state(), SessionState::Ready);
    session
}

/// Walks a session into `Active`, practice or real.
fn active_session(practice: bool) -> CallSession {
    let mut session = ready_session(config());
    session.apply(SessionEvent::StartClicked {
        practice,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    });
    let commands = session.apply(SessionEvent::MicProbeSucceeded);
    if practice {
        assert!(matches!(commands[0], Command::RegisterCall { practice: true, .. }));
    } else {
        assert!(matches!(commands[0], Command::CheckRespondent { .. }));
        let commands = session.apply(SessionEvent::RespondentChecked {
            already_responded: false,
        });
        assert!(matches!(commands[0], Command::RegisterCall { practice: false, .. }));
    }
    let commands = session.apply(SessionEvent::CallRegistered {
        call_id: "c1".to_string(),
        access_token: "tok".to_string(),
    });
    assert_eq!(
        commands,
        vec![Command::StartTransport {
            access_token: "tok".to_string()
        }]
    );
    session.apply(SessionEvent::TransportStarted);
    assert_eq!(session.state(), SessionState::Active);
    session
}

#[test]
fn mount_with_granted_permission_goes_ready() {
    let mut session = CallSession::new(config());
    session.apply(SessionEvent::Mounted {
        permission: MicPermission::Granted,
    });
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn mount_without_permission_waits_for_grant() {
    let mut session = CallSession::new(config());
    session.apply(SessionEvent::Mounted {
        permission: MicPermission::Prompt,
    });
    assert_eq!(session.state(), SessionState::MicPermissionPending);

    session.apply(SessionEvent::PermissionChanged(MicPermission::Granted));
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn denied_permission_notifies() {
    let mut session = CallSession::new(config());
    session.apply(SessionEvent::Mounted {
        permission: MicPermission::Prompt,
    });
    let commands = session.apply(SessionEvent::PermissionChanged(MicPermission::Denied));
    assert!(matches!(commands[0], Command::Notify { .. }));
    assert_eq!(session.state(), SessionState::MicPermissionPending);
}

#[test]
fn start_without_granted_mic_is_refused() {
    let mut session = CallSession::new(config());
    session.apply(SessionEvent::Mounted {
        permission: MicPermission::Granted,
    });
    session.apply(SessionEvent::PermissionChanged(MicPermission::Denied));

    let commands = session.apply(SessionEvent::StartClicked {
        practice: false,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    });
    assert!(matches!(commands[0], Command::Notify { .. }));
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn real_start_requires_valid_contact() {
    let mut session = ready_session(config());
    let commands = session.apply(SessionEvent::StartClicked {
        practice: false,
        name: String::new(),
        email: "not-an-email".to_string(),
    });
    assert!(matches!(commands[0], Command::Notify { .. }));
    assert!(!commands.contains(&Command::ProbeMicrophone));
}

#[test]
fn anonymous_interview_skips_contact_validation() {
    let mut session = ready_session(SessionConfig {
        is_anonymous: true,
        ..config()
    });
    let commands = session.apply(SessionEvent::StartClicked {
        practice: false,
        name: String::new(),
        email: String::new(),
    });
    assert_eq!(commands, vec![Command::ProbeMicrophone]);
}

#[test]
fn probe_failure_aborts_start() {
    let mut session = ready_session(config());
    session.apply(SessionEvent::StartClicked {
        practice: false,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    });
    let commands = session.apply(SessionEvent::MicProbeFailed);
    assert!(matches!(commands[0], Command::Notify { .. }));
    assert_eq!(session.state(), SessionState::Ready);

    // The stale probe result must not start anything later.
    assert!(session.apply(SessionEvent::MicProbeSucceeded).is_empty());
}

#[test]
fn known_respondent_lands_in_old_user_without_registering() {
    let mut session = ready_session(config());
    session.apply(SessionEvent::StartClicked {
        practice: false,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    });
    session.apply(SessionEvent::MicProbeSucceeded);

    let commands = session.apply(SessionEvent::RespondentChecked {
        already_responded: true,
    });
    assert!(commands.is_empty());
    assert_eq!(session.state(), SessionState::OldUser);
}

#[test]
fn registration_failure_returns_to_ready() {
    let mut session = ready_session(config());
    session.apply(SessionEvent::StartClicked {
        practice: true,
        name: String::new(),
        email: String::new(),
    });
    session.apply(SessionEvent::MicProbeSucceeded);

    let commands = session.apply(SessionEvent::RegistrationFailed {
        message: "Could not initiate the call.".to_string(),
    });
    assert!(matches!(commands[0], Command::Notify { .. }));
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.mode(), None);
}

#[test]
fn real_session_stops_at_minute_budget() {
    let mut session = active_session(false);
    let budget_ticks = 60 * TICKS_PER_SECOND; // 1 minute config

    for _ in 0..budget_ticks - 1 {
        assert!(session.apply(SessionEvent::Tick).is_empty());
    }
    assert_eq!(session.elapsed_seconds(), 59);

    let commands = session.apply(SessionEvent::Tick);
    assert_eq!(
        commands,
        vec![
            Command::StopTransport,
            Command::PersistEnded {
                call_id: "c1".to_string(),
                tab_switch_count: 0
            }
        ]
    );
    assert_eq!(session.state(), SessionState::Ended);

    // The transport's own ended event must not persist a second time.
    assert!(session.apply(SessionEvent::TransportEnded).is_empty());
}

#[test]
fn tab_switches_are_counted_into_the_persisted_response() {
    let mut session = active_session(false);
    session.apply(SessionEvent::TabSwitched);
    session.apply(SessionEvent::TabSwitched);

    // User hangs up; the transport stop is acknowledged asynchronously.
    let commands = session.apply(SessionEvent::EndClicked);
    assert_eq!(commands, vec![Command::StopTransport]);

    let commands = session.apply(SessionEvent::TransportEnded);
    assert_eq!(
        commands,
        vec![Command::PersistEnded {
            call_id: "c1".to_string(),
            tab_switch_count: 2
        }]
    );
}

#[test]
fn practice_countdown_stops_transport_and_never_persists() {
    let mut session = active_session(true);
    assert_eq!(session.practice_seconds_left(), PRACTICE_SECONDS);

    for _ in 0..PRACTICE_SECONDS - 1 {
        assert!(session.apply(SessionEvent::Tick).is_empty());
    }
    assert_eq!(session.practice_seconds_left(), 1);

    let commands = session.apply(SessionEvent::Tick);
    assert_eq!(commands, vec![Command::StopTransport]);
    // Still active until the transport confirms.
    assert_eq!(session.state(), SessionState::Active);

    let commands = session.apply(SessionEvent::TransportEnded);
    assert!(commands.is_empty());
    assert_eq!(session.state(), SessionState::Ended);
}

#[test]
fn practice_restart_reuses_collected_contact() {
    let mut session = active_session(true);
    session.apply(SessionEvent::TransportEnded);
    assert_eq!(session.state(), SessionState::Ended);

    let commands = session.apply(SessionEvent::RestartAsReal);
    assert_eq!(commands, vec![Command::ProbeMicrophone]);

    let commands = session.apply(SessionEvent::MicProbeSucceeded);
    assert_eq!(
        commands,
        vec![Command::CheckRespondent {
            email: "ada@example.com".to_string()
        }]
    );
    assert_eq!(session.state(), SessionState::Starting);
    assert_eq!(session.call_id(), None);
}

#[test]
fn transport_error_stops_and_ends_the_session() {
    let mut session = active_session(false);
    let commands = session.apply(SessionEvent::TransportError {
        message: "connection lost".to_string(),
    });
    assert_eq!(commands[0], Command::StopTransport);
    assert!(commands.iter().any(|c| matches!(c, Command::PersistEnded { .. })));
    assert_eq!(session.state(), SessionState::Ended);
}

#[test]
fn transcript_keeps_last_utterance_per_role() {
    let mut session = active_session(false);
    let turn = |role: &str, content: &str| TranscriptTurn {
        role: role.to_string(),
        content: content.to_string(),
    };

    session.apply(SessionEvent::TranscriptUpdate(vec![
        turn("agent", "Tell me about yourself."),
        turn("user", "Sure."),
    ]));
    session.apply(SessionEvent::TranscriptUpdate(vec![turn(
        "user",
        "Sure. I have been writing Rust for five years.",
    )]));

    assert_eq!(
        session.transcript().last_agent(),
        Some("Tell me about yourself.")
    );
    assert_eq!(
        session.transcript().last_user(),
        Some("Sure. I have been writing Rust for five years.")
    );
    assert_eq!(session.transcript().active_turn(), Some("user"));
}

#[test]
fn exactly_one_timer_runs_per_mode() {
    let real = active_session(false);
    assert_eq!(real.timer(), Some(TimerKind::RealMillis));

    let practice = active_session(true);
    assert_eq!(practice.timer(), Some(TimerKind::PracticeSeconds));

    let mut ended = active_session(false);
    ended.apply(SessionEvent::TransportEnded);
    assert_eq!(ended.timer(), None);
}

#[test]
fn feedback_submission_is_a_terminal_side_effect() {
    let mut session = active_session(false);
    session.apply(SessionEvent::TransportEnded);

    session.apply(SessionEvent::FeedbackSubmitted);
    assert!(session.feedback_submitted());
    assert_eq!(session.state(), SessionState::Ended);
}

#[test]
fn mute_starts_on_and_toggles_during_call() {
    let mut session = active_session(false);
    assert!(session.is_muted());
    session.apply(SessionEvent::MuteToggled);
    assert!(!session.is_muted());
}

#[test]
fn respondent_rejection_covers_duplicates_and_allow_list() {
    let existing = vec!["ada@example.com".to_string()];
    let allow = vec!["grace@example.com".to_string()];

    // Already responded.
    assert!(respondent_rejected("ada@example.com", &existing, &[]));
    // Not on a non-empty allow-list.
    assert!(respondent_rejected("katherine@example.com", &[], &allow));
    // On the allow-list, no prior response.
    assert!(!respondent_rejected("grace@example.com", &[], &allow));
    // Empty allow-list means open.
    assert!(!respondent_rejected("anyone@example.com", &[], &[]));
}

#[test]
fn email_validation_is_minimal_but_strict_enough() {
    assert!(is_valid_email("ada@example.com"));
    assert!(is_valid_email("ada.lovelace@sub.example.co"));
    assert!(!is_valid_email("ada"));
    assert!(!is_valid_email("ada@example"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("ada@.com"));
    assert!(!is_valid_email("ada @example.com"));
}
