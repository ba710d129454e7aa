//! Recover the model's reply from a free-form transcript
//!
//! A reply sits between a response marker (`🤖 LLM Response:` or
//! `🎨 LLM Response:`) and the next success marker (`✅`). When several runs
//! share one transcript, the most recent response marker that already has a
//! success marker after it wins; a run still in flight is skipped.

use goalrun_backend::{Error, Result, RESPONSE_MARKERS, SUCCESS_MARKER};
use regex::Regex;
use std::sync::OnceLock;

fn response_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        let alternatives: Vec<String> = RESPONSE_MARKERS.iter().map(|m| regex::escape(m)).collect();
        Regex::new(&alternatives.join("|")).expect("escaped markers form a valid pattern")
    })
}

/// Latest completed reply, trimmed, or `None` if there is none
pub fn extract_last_response(transcript: &str) -> Option<String> {
    let starts: Vec<usize> = response_marker()
        .find_iter(transcript)
        .map(|m| m.end())
        .collect();

    starts.into_iter().rev().find_map(|start| {
        transcript[start..]
            .find(SUCCESS_MARKER)
            .map(|len| transcript[start..start + len].trim().to_string())
    })
}

/// Like [`extract_last_response`], but a missing reply is a `ResponseNotFound` error
pub fn require_last_response(transcript: &str) -> Result<String> {
    extract_last_response(transcript)
        .ok_or_else(|| Error::response_not_found().with_operation("extract::require_last_response"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use goalrun_backend::ErrorKind;

    #[test]
    fn test_extracts_trimmed_reply() {
        let transcript = "...🤖 LLM Response:\nHELLO WORLD\n✅ done";
        assert_eq!(extract_last_response(transcript).as_deref(), Some("HELLO WORLD"));
    }

    #[test]
    fn test_reply_spanning_lines() {
        let transcript = "\n🧠 Starting Mistral agent with goal: poem\
                          \n🎨 LLM Response:\n  line one\n\nline two  \n\n✅ Task completed by Mistral agent.";
        assert_eq!(
            extract_last_response(transcript).as_deref(),
            Some("line one\n\nline two")
        );
    }

    #[test]
    fn test_missing_success_marker_yields_none() {
        let transcript = "\n🤖 LLM Response:\nhalf a reply\n❌ Error: disk full";
        assert_eq!(extract_last_response(transcript), None);
        assert_eq!(extract_last_response(""), None);

        let err = require_last_response(transcript).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResponseNotFound);
    }

    #[test]
    fn test_latest_completed_run_wins() {
        let transcript = "\n🤖 LLM Response:\nfirst\n✅ Goal achieved by Nano agent.\
                          \n🤖 LLM Response:\nsecond\n✅ Goal achieved by Nano agent.";
        assert_eq!(extract_last_response(transcript).as_deref(), Some("second"));
    }

    #[test]
    fn test_run_in_flight_is_skipped() {
        let transcript = "\n🤖 LLM Response:\nfinished\n✅ Goal achieved by DeepSeek agent.\
                          \n🎨 LLM Response:\nstill going";
        assert_eq!(extract_last_response(transcript).as_deref(), Some("finished"));
    }

    #[test]
    fn test_interleaved_runs_do_not_bleed_together() {
        // two runs' whole events interleaved: A response, B response, B done, A done
        let transcript = "\n🤖 LLM Response:\nfrom A\
                          \n🎨 LLM Response:\nfrom B\
                          \n✅ Task completed by Mistral agent.\
                          \n✅ Goal achieved by DeepSeek agent.";
        assert_eq!(extract_last_response(transcript).as_deref(), Some("from B"));
    }
}
