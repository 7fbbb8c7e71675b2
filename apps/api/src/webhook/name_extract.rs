//! Caller-name heuristics for phone calls.
//!
//! Phone callers never type their name, so we fish it out of the transcript.
//! Two strategies exist because transcripts arrive in two shapes: structured
//! role/content turns (webhook events) pair the agent's "what's your name"
//! question with the next user turn; flat text (list endpoints) falls back to
//! scanning for self-introduction phrases. Both are best-effort; callers the
//! heuristic cannot name get [`FALLBACK_CALLER_NAME`].

use crate::voice::{Transcript, TranscriptTurn};

pub const FALLBACK_CALLER_NAME: &str = "Phone Caller";

const NAME_QUESTIONS: [&str; 2] = ["what's your name", "what is your name"];
const INTRO_PREFIXES: [&str; 4] = ["my name is", "i'm", "i am", "this is"];
const INTRO_PATTERNS: [&str; 4] = ["my name is ", "this is ", "i'm ", "i am "];

/// Best-effort caller name for a transcript, with fallback.
pub fn caller_name(transcript: Option<&Transcript>) -> String {
    let extracted = match transcript {
        Some(Transcript::Turns(turns)) => extract_name_from_turns(turns),
        Some(Transcript::Text(text)) => extract_name_from_text(text),
        None => None,
    };
    extracted.unwrap_or_else(|| FALLBACK_CALLER_NAME.to_string())
}

/// Looks for an agent turn asking for the caller's name and takes the answer
/// from the following user turn: intro prefix stripped, first two words kept.
pub fn extract_name_from_turns(turns: &[TranscriptTurn]) -> Option<String> {
    for (i, turn) in turns.iter().enumerate() {
        if turn.role != "agent" || !asks_for_name(&turn.content) {
            continue;
        }
        let Some(answer) = turns.get(i + 1) else {
            continue;
        };
        if answer.role != "user" {
            continue;
        }

        let stripped = strip_intro_prefix(answer.content.trim());
        let name = stripped
            .split_whitespace()
            .take(2)
            .collect::<Vec<_>>()
            .join(" ");
        let name = name.trim_end_matches(['.', ',', '!', '?']);
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

/// Scans flat transcript text for a self-introduction phrase and captures up
/// to the next sentence/clause boundary.
pub fn extract_name_from_text(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for pattern in INTRO_PATTERNS {
        let Some(position) = lower.find(pattern) else {
            continue;
        };
        let start = position + pattern.len();
        let rest = &text[start..];
        let end = rest
            .find(['.', ',', '\n'])
            .unwrap_or(rest.len());
        let name = rest[..end].trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

fn asks_for_name(content: &str) -> bool {
    let lower = content.to_lowercase();
    NAME_QUESTIONS.iter().any(|q| lower.contains(q))
}

/// Strips a leading "my name is" / "i'm" / "i am" / "this is" from an answer.
fn strip_intro_prefix(answer: &str) -> &str {
    let lower = answer.to_lowercase();
    for prefix in INTRO_PREFIXES {
        if lower.starts_with(prefix) && answer.is_char_boundary(prefix.len()) {
            return answer[prefix.len()..].trim_start();
        }
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: &str, content: &str) -> TranscriptTurn {
        TranscriptTurn {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn extracts_name_from_question_answer_pair() {
        let turns = vec![
            turn("agent", "Hello! What's your name?"),
            turn("user", "My name is Ada Lovelace, nice to meet you"),
        ];
        assert_eq!(extract_name_from_turns(&turns).as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn strips_intro_prefix_and_caps_at_two_words() {
        let turns = vec![
            turn("agent", "And what is your name please?"),
            turn("user", "I'm Grace Brewster Murray Hopper"),
        ];
        assert_eq!(extract_name_from_turns(&turns).as_deref(), Some("Grace Brewster"));
    }

    #[test]
    fn answer_from_wrong_role_is_ignored() {
        let turns = vec![
            turn("agent", "What's your name?"),
            turn("agent", "I didn't catch that."),
            turn("user", "Alan"),
        ];
        assert_eq!(extract_name_from_turns(&turns), None);
    }

    #[test]
    fn no_name_question_yields_none() {
        let turns = vec![
            turn("agent", "How are you today?"),
            turn("user", "Fine, thanks"),
        ];
        assert_eq!(extract_name_from_turns(&turns), None);
    }

    #[test]
    fn flat_text_intro_phrases_are_found() {
        assert_eq!(
            extract_name_from_text("agent: hello\nuser: hi, my name is Margaret Hamilton. Nice day").as_deref(),
            Some("Margaret Hamilton")
        );
        assert_eq!(
            extract_name_from_text("user: this is Katherine, calling about the role").as_deref(),
            Some("Katherine")
        );
    }

    #[test]
    fn flat_text_without_intro_yields_none() {
        assert_eq!(extract_name_from_text("agent: hello there"), None);
    }

    #[test]
    fn caller_name_falls_back_when_nothing_extractable() {
        assert_eq!(caller_name(None), FALLBACK_CALLER_NAME);
        let transcript = Transcript::Text("agent: hello".to_string());
        assert_eq!(caller_name(Some(&transcript)), FALLBACK_CALLER_NAME);
    }

    #[test]
    fn caller_name_dispatches_on_transcript_shape() {
        let turns = Transcript::Turns(vec![
            turn("agent", "What is your name?"),
            turn("user", "This is Dorothy Vaughan"),
        ]);
        assert_eq!(caller_name(Some(&turns)), "Dorothy Vaughan");
    }
}
