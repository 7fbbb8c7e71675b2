//! Display transcript: append-only, last-value-wins per speaker role.
//!
//! The UI shows only the most recent utterance per role, not a full log;
//! each transport update replaces whatever was displayed for the roles it
//! carries.

use crate::voice::TranscriptTurn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptView {
    last_agent: Option<String>,
    last_user: Option<String>,
    active_turn: Option<String>,
}

impl TranscriptView {
    /// Applies a transport transcript update. Later turns for the same role
    /// win within one batch, matching arrival order.
    pub fn update(&mut self, turns: &[TranscriptTurn]) {
        for turn in turns {
            match turn.role.as_str() {
                "agent" => self.last_agent = Some(turn.content.clone()),
                "user" => self.last_user = Some(turn.content.clone()),
                _ => {}
            }
        }
    }

    pub fn set_active_turn(&mut self, role: &str) {
        self.active_turn = Some(role.to_string());
    }

    pub fn last_agent(&self) -> Option<&str> {
        self.last_agent.as_deref()
    }

    pub fn last_user(&self) -> Option<&str> {
        self.last_user.as_deref()
    }

    pub fn active_turn(&self) -> Option<&str> {
        self.active_turn.as_deref()
    }
}
