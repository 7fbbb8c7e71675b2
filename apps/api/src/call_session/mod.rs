//! Call session state machine.
//!
//! Drives a single interview or practice call's lifecycle: microphone
//! permission, start gating, registration, active timers, transcript view,
//! and end-of-call flows. The machine is pure and synchronous — it owns no
//! I/O and no clocks. The driver (the browser client, or a test) feeds it
//! [`SessionEvent`]s and executes the [`Command`]s it emits: probe the mic,
//! run the duplicate-respondent check, register the call, start/stop the
//! transport, persist the ended response.
//!
//! States: `Idle → MicPermissionPending → Ready → Starting → Active →
//! Ended`, with `OldUser` as a terminal branch for rejected respondents.
//! Exactly one timer exists at a time, selected by mode: real sessions tick
//! every 10ms and stop at the configured minute budget; practice sessions
//! count down a fixed 120 seconds.

pub mod transcript;

pub use transcript::TranscriptView;

use crate::voice::TranscriptTurn;

/// Fixed practice session length.
pub const PRACTICE_SECONDS: u32 = 120;
/// Real-session timer granularity: 100 ticks of 10ms per second.
pub const TICKS_PER_SECOND: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Practice,
    Real,
}

/// Browser microphone permission as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicPermission {
    Unknown,
    Prompt,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    MicPermissionPending,
    Ready,
    /// Probe passed; registration (and for real sessions the duplicate
    /// check) is in flight.
    Starting,
    Active,
    Ended,
    /// Terminal: the candidate already responded or is not on the
    /// respondent allow-list.
    OldUser,
}

/// Interview facts the session needs for gating and timing.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub is_anonymous: bool,
    /// Allow-list of respondent emails; empty means open to anyone.
    pub respondents: Vec<String>,
    pub duration_minutes: u32,
}

/// Everything that can happen to a session, from the UI or the transport.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Component mounted; the initial permission query resolved.
    Mounted { permission: MicPermission },
    /// The browser permission state changed.
    PermissionChanged(MicPermission),
    /// User clicked start (practice or real) with the form's name/email.
    StartClicked {
        practice: bool,
        name: String,
        email: String,
    },
    /// The brief acquire/release liveness probe on the mic.
    MicProbeSucceeded,
    MicProbeFailed,
    /// Result of the duplicate-respondent check (real sessions only).
    RespondentChecked { already_responded: bool },
    /// The provider registered the call.
    CallRegistered {
        call_id: String,
        access_token: String,
    },
    RegistrationFailed { message: String },
    TransportStarted,
    /// One timer tick: 10ms in real mode, 1s in practice mode.
    Tick,
    TranscriptUpdate(Vec<TranscriptTurn>),
    MuteToggled,
    TabSwitched,
    EndClicked,
    TransportError { message: String },
    TransportEnded,
    /// Terminal side effect after a real session; no transition.
    FeedbackSubmitted,
    /// One-click restart from an ended practice into a real session,
    /// reusing the collected name/email.
    RestartAsReal,
}

/// Side effects for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ProbeMicrophone,
    CheckRespondent { email: String },
    RegisterCall {
        practice: bool,
        name: String,
        email: String,
    },
    StartTransport { access_token: String },
    StopTransport,
    /// Persist the ended response; emitted exactly once, real sessions only.
    PersistEnded {
        call_id: String,
        tab_switch_count: u32,
    },
    Notify { message: String },
}

/// Which timer the driver should be running right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// 10ms interval.
    RealMillis,
    /// 1s countdown interval.
    PracticeSeconds,
}

#[derive(Debug)]
pub struct CallSession {
    config: SessionConfig,
    state: SessionState,
    mode: Option<SessionMode>,
    mic: MicPermission,
    /// Set between a start click and the probe result.
    pending_mode: Option<SessionMode>,
    name: String,
    email: String,
    call_id: Option<String>,
    ticks: u32,
    practice_seconds_left: u32,
    transcript: TranscriptView,
    tab_switch_count: u32,
    is_muted: bool,
    feedback_submitted: bool,
    persisted: bool,
}

impl CallSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            mode: None,
            mic: MicPermission::Unknown,
            pending_mode: None,
            name: String::new(),
            email: String::new(),
            call_id: None,
            ticks: 0,
            practice_seconds_left: PRACTICE_SECONDS,
            transcript: TranscriptView::default(),
            tab_switch_count: 0,
            is_muted: true,
            feedback_submitted: false,
            persisted: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Option<SessionMode> {
        self.mode
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    pub fn transcript(&self) -> &TranscriptView {
        &self.transcript
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn feedback_submitted(&self) -> bool {
        self.feedback_submitted
    }

    /// Whole seconds elapsed in a real session.
    pub fn elapsed_seconds(&self) -> u32 {
        self.ticks / TICKS_PER_SECOND
    }

    pub fn practice_seconds_left(&self) -> u32 {
        self.practice_seconds_left
    }

    /// The single timer that should be running, if any. Real and practice
    /// timers are mutually exclusive by mode.
    pub fn timer(&self) -> Option<TimerKind> {
        if self.state != SessionState::Active {
            return None;
        }
        match self.mode? {
            SessionMode::Real => Some(TimerKind::RealMillis),
            SessionMode::Practice => Some(TimerKind::PracticeSeconds),
        }
    }

    /// Feeds one event through the machine, returning the commands the
    /// driver must execute. Events that make no sense in the current state
    /// are ignored.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Command> {
        match event {
            SessionEvent::Mounted { permission } => self.on_mounted(permission),
            SessionEvent::PermissionChanged(permission) => self.on_permission(permission),
            SessionEvent::StartClicked {
                practice,
                name,
                email,
            } => self.on_start_clicked(practice, name, email),
            SessionEvent::MicProbeSucceeded => self.on_probe_succeeded(),
            SessionEvent::MicProbeFailed => self.on_probe_failed(),
            SessionEvent::RespondentChecked { already_responded } => {
                self.on_respondent_checked(already_responded)
            }
            SessionEvent::CallRegistered {
                call_id,
                access_token,
            } => self.on_registered(call_id, access_token),
            SessionEvent::RegistrationFailed { message } => self.on_registration_failed(message),
            SessionEvent::TransportStarted => self.on_transport_started(),
            SessionEvent::Tick => self.on_tick(),
            SessionEvent::TranscriptUpdate(turns) => {
                if self.state == SessionState::Active {
                    self.transcript.update(&turns);
                    if let Some(last) = turns.last() {
                        self.transcript.set_active_turn(&last.role);
                    }
                }
                Vec::new()
            }
            SessionEvent::MuteToggled => {
                if self.state == SessionState::Active {
                    self.is_muted = !self.is_muted;
                }
                Vec::new()
            }
            SessionEvent::TabSwitched => {
                if self.state == SessionState::Active && self.mode == Some(SessionMode::Real) {
                    self.tab_switch_count += 1;
                }
                Vec::new()
            }
            SessionEvent::EndClicked => {
                if self.state == SessionState::Active {
                    vec![Command::StopTransport]
                } else {
                    Vec::new()
                }
            }
            SessionEvent::TransportError { message } => self.on_transport_error(message),
            SessionEvent::TransportEnded => self.on_transport_ended(),
            SessionEvent::FeedbackSubmitted => {
                if self.state == SessionState::Ended && self.mode == Some(SessionMode::Real) {
                    self.feedback_submitted = true;
                }
                Vec::new()
            }
            SessionEvent::RestartAsReal => self.on_restart_as_real(),
        }
    }

    fn on_mounted(&mut self, permission: MicPermission) -> Vec<Command> {
        if self.state != SessionState::Idle {
            return Vec::new();
        }
        self.mic = permission;
        self.state = if permission == MicPermission::Granted {
            SessionState::Ready
        } else {
            SessionState::MicPermissionPending
        };
        Vec::new()
    }

    fn on_permission(&mut self, permission: MicPermission) -> Vec<Command> {
        self.mic = permission;
        match permission {
            MicPermission::Granted if self.state == SessionState::MicPermissionPending => {
                self.state = SessionState::Ready;
                Vec::new()
            }
            MicPermission::Denied => vec![Command::Notify {
                message: "Microphone access denied. Please grant permission in browser settings."
                    .to_string(),
            }],
            _ => Vec::new(),
        }
    }

    fn on_start_clicked(&mut self, practice: bool, name: String, email: String) -> Vec<Command> {
        if self.state != SessionState::Ready {
            return Vec::new();
        }
        self.name = name;
        self.email = email;
        self.begin_start(if practice {
            SessionMode::Practice
        } else {
            SessionMode::Real
        })
    }

    /// Shared gate for first starts and practice-to-real restarts.
    fn begin_start(&mut self, mode: SessionMode) -> Vec<Command> {
        if self.mic != MicPermission::Granted {
            return vec![Command::Notify {
                message: "Please grant microphone permission first.".to_string(),
            }];
        }

        if mode == SessionMode::Real
            && !self.config.is_anonymous
            && (!is_valid_email(&self.email) || self.name.trim().is_empty())
        {
            return vec![Command::Notify {
                message:
                    "Please enter a valid email and your first name to start the interview."
                        .to_string(),
            }];
        }

        self.pending_mode = Some(mode);
        vec![Command::ProbeMicrophone]
    }

    fn on_probe_succeeded(&mut self) -> Vec<Command> {
        let Some(mode) = self.pending_mode.take() else {
            return Vec::new();
        };
        self.mode = Some(mode);
        self.state = SessionState::Starting;

        match mode {
            SessionMode::Real => vec![Command::CheckRespondent {
                email: self.email.clone(),
            }],
            SessionMode::Practice => {
                self.practice_seconds_left = PRACTICE_SECONDS;
                vec![Command::RegisterCall {
                    practice: true,
                    name: self.name.clone(),
                    email: self.email.clone(),
                }]
            }
        }
    }

    fn on_probe_failed(&mut self) -> Vec<Command> {
        self.pending_mode = None;
        vec![Command::Notify {
            message: "Could not access microphone. Please check connection and system settings."
                .to_string(),
        }]
    }

    fn on_respondent_checked(&mut self, already_responded: bool) -> Vec<Command> {
        if self.state != SessionState::Starting || self.mode != Some(SessionMode::Real) {
            return Vec::new();
        }
        if already_responded {
            self.state = SessionState::OldUser;
            return Vec::new();
        }
        vec![Command::RegisterCall {
            practice: false,
            name: self.name.clone(),
            email: self.email.clone(),
        }]
    }

    fn on_registered(&mut self, call_id: String, access_token: String) -> Vec<Command> {
        if self.state != SessionState::Starting {
            return Vec::new();
        }
        self.call_id = Some(call_id);
        vec![Command::StartTransport { access_token }]
    }

    fn on_registration_failed(&mut self, message: String) -> Vec<Command> {
        if self.state != SessionState::Starting {
            return Vec::new();
        }
        self.state = SessionState::Ready;
        self.mode = None;
        vec![Command::Notify { message }]
    }

    fn on_transport_started(&mut self) -> Vec<Command> {
        if self.state != SessionState::Starting {
            return Vec::new();
        }
        self.state = SessionState::Active;
        self.ticks = 0;
        // Mic starts muted; the candidate unmutes deliberately.
        self.is_muted = true;
        Vec::new()
    }

    fn on_tick(&mut self) -> Vec<Command> {
        if self.state != SessionState::Active {
            return Vec::new();
        }
        match self.mode {
            Some(SessionMode::Real) => {
                self.ticks += 1;
                if self.elapsed_seconds() >= self.config.duration_minutes * 60 {
                    return self.end_session(true);
                }
                Vec::new()
            }
            Some(SessionMode::Practice) => {
                self.practice_seconds_left = self.practice_seconds_left.saturating_sub(1);
                if self.practice_seconds_left == 0 {
                    // The transport-ended event completes the transition.
                    return vec![Command::StopTransport];
                }
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn on_transport_error(&mut self, message: String) -> Vec<Command> {
        if !matches!(self.state, SessionState::Starting | SessionState::Active) {
            return Vec::new();
        }
        let mut commands = vec![
            Command::StopTransport,
            Command::Notify { message },
        ];
        commands.extend(self.end_session(false));
        commands
    }

    fn on_transport_ended(&mut self) -> Vec<Command> {
        if self.state != SessionState::Active {
            return Vec::new();
        }
        self.state = SessionState::Ended;
        self.persist_command()
    }

    /// Ends the session from inside the machine (time budget, error).
    /// `stop_transport` is false when the transport is already being stopped
    /// by the caller.
    fn end_session(&mut self, stop_transport: bool) -> Vec<Command> {
        self.state = SessionState::Ended;
        let mut commands = Vec::new();
        if stop_transport {
            commands.push(Command::StopTransport);
        }
        commands.extend(self.persist_command());
        commands
    }

    /// The ended-response write, exactly once, real sessions only.
    fn persist_command(&mut self) -> Vec<Command> {
        if self.persisted || self.mode != Some(SessionMode::Real) {
            return Vec::new();
        }
        let Some(call_id) = self.call_id.clone() else {
            return Vec::new();
        };
        self.persisted = true;
        vec![Command::PersistEnded {
            call_id,
            tab_switch_count: self.tab_switch_count,
        }]
    }

    fn on_restart_as_real(&mut self) -> Vec<Command> {
        if self.state != SessionState::Ended || self.mode != Some(SessionMode::Practice) {
            return Vec::new();
        }
        // Fresh call, same candidate.
        self.state = SessionState::Ready;
        self.call_id = None;
        self.ticks = 0;
        self.persisted = false;
        self.transcript = TranscriptView::default();
        self.begin_start(SessionMode::Real)
    }
}

/// Decides whether a candidate must be turned away before a real session:
/// their email already has a response, or a non-empty allow-list does not
/// include them.
pub fn respondent_rejected(email: &str, existing_emails: &[String], allow_list: &[String]) -> bool {
    existing_emails.iter().any(|existing| existing == email)
        || (!allow_list.is_empty() && !allow_list.iter().any(|allowed| allowed == email))
}

/// Minimal syntactic email check: one `@`, a dot somewhere after it, no
/// whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
}

#[cfg(test)]
mod tests;
