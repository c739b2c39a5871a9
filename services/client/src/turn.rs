//! Reassembles one conversational turn from the relayed event stream.
//!
//! The assembler is a two-state machine: `Idle` until a response is
//! requested, `Active` while deltas accumulate, back to `Idle` when the
//! terminal `response.done` event finalizes the turn. It performs no I/O;
//! the caller owns the connection and decides what to do with a finished
//! turn.

use crate::latency::{LatencyTracker, Milestone};
use parley_core::event::ServerEvent;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Active,
}

/// One finalized turn: everything that accumulated between `response.create`
/// and `response.done`.
#[derive(Debug)]
pub struct CompletedTurn {
    /// Ordered concatenation of all text deltas.
    pub text: String,
    /// Decoded audio fragments in arrival order. Arrival order is the
    /// playback order; the protocol has no sequence numbers.
    pub audio_fragments: Vec<Vec<u8>>,
    /// Generation time, when both milestones were observed.
    pub elapsed: Option<Duration>,
}

/// Accumulates text and audio deltas for the turn in progress.
#[derive(Debug, Default)]
pub struct TurnAssembler {
    phase: Phase,
    text: Vec<String>,
    audio: Vec<Vec<u8>>,
    latency: LatencyTracker,
}

impl TurnAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Starts a turn. Called when the client sends `response.create`; marks
    /// the request-sent milestone. Ignored while a turn is already active.
    pub fn begin_turn(&mut self) {
        if self.phase == Phase::Active {
            return;
        }
        self.phase = Phase::Active;
        self.text.clear();
        self.audio.clear();
        self.latency.reset();
        self.latency.mark(Milestone::RequestSent);
    }

    /// Feeds one server event into the state machine.
    ///
    /// Returns the finalized turn when the event was the terminal
    /// `response.done`; otherwise `None`. Events observed while idle
    /// contribute nothing, as do deltas carrying no usable payload.
    pub fn ingest(&mut self, event: &ServerEvent) -> Option<CompletedTurn> {
        if self.phase != Phase::Active {
            return None;
        }
        match event {
            ServerEvent::TextDelta(delta) | ServerEvent::TranscriptDelta(delta) => {
                if let Some(text) = delta.text() {
                    self.text.push(text.to_string());
                }
                None
            }
            ServerEvent::OutputAudioDelta(delta) | ServerEvent::AudioDelta(delta) => {
                if let Some(bytes) = delta.decode() {
                    self.audio.push(bytes);
                }
                None
            }
            ServerEvent::ResponseDone {} => {
                self.latency.mark(Milestone::ResponseComplete);
                self.phase = Phase::Idle;
                Some(CompletedTurn {
                    text: self.text.drain(..).collect::<Vec<_>>().concat(),
                    audio_fragments: std::mem::take(&mut self.audio),
                    elapsed: self.latency.elapsed(),
                })
            }
            ServerEvent::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::event::ServerEvent;

    fn event(raw: &str) -> ServerEvent {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_text_deltas_concatenate_in_order() {
        let mut assembler = TurnAssembler::new();
        assembler.begin_turn();

        for delta in ["Hi", " there", "!"] {
            let raw = format!(r#"{{"type":"response.text.delta","delta":"{delta}"}}"#);
            assert!(assembler.ingest(&event(&raw)).is_none());
        }

        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .expect("terminal event finalizes the turn");
        assert_eq!(turn.text, "Hi there!");
        assert!(turn.audio_fragments.is_empty());
        assert!(turn.elapsed.is_some());
        assert!(!assembler.is_active());
    }

    #[test]
    fn test_audio_fragments_accumulate_in_arrival_order() {
        let mut assembler = TurnAssembler::new();
        assembler.begin_turn();

        assembler.ingest(&event(
            r#"{"type":"response.output_audio.delta","delta":"AQI="}"#,
        ));
        assembler.ingest(&event(
            r#"{"type":"response.audio.delta","delta":{"data":"AwQ="}}"#,
        ));

        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert_eq!(turn.audio_fragments, vec![vec![1u8, 2], vec![3u8, 4]]);
    }

    #[test]
    fn test_two_base64_fragments_total_length() {
        let mut assembler = TurnAssembler::new();
        assembler.begin_turn();

        for _ in 0..2 {
            assembler.ingest(&event(r#"{"type":"response.audio.delta","delta":"AAA="}"#));
        }
        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        let total: usize = turn.audio_fragments.iter().map(Vec::len).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_interleaved_text_and_audio() {
        let mut assembler = TurnAssembler::new();
        assembler.begin_turn();

        assembler.ingest(&event(r#"{"type":"response.text.delta","delta":"A"}"#));
        assembler.ingest(&event(r#"{"type":"response.audio.delta","delta":"AQI="}"#));
        assembler.ingest(&event(
            r#"{"type":"response.output_audio_transcript.delta","text_delta":"B"}"#,
        ));
        assembler.ingest(&event(
            r#"{"type":"response.output_audio.delta","delta":{"data":"AwQ="}}"#,
        ));

        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert_eq!(turn.text, "AB");
        assert_eq!(turn.audio_fragments, vec![vec![1u8, 2], vec![3u8, 4]]);
    }

    #[test]
    fn test_empty_audio_still_yields_latency() {
        let mut assembler = TurnAssembler::new();
        assembler.begin_turn();
        assembler.ingest(&event(r#"{"type":"response.text.delta","delta":"hi"}"#));

        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert!(turn.audio_fragments.is_empty());
        assert!(turn.elapsed.is_some());
    }

    #[test]
    fn test_events_while_idle_contribute_nothing() {
        let mut assembler = TurnAssembler::new();

        assert!(assembler
            .ingest(&event(r#"{"type":"response.text.delta","delta":"hi"}"#))
            .is_none());
        assert!(assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .is_none());
        assert!(!assembler.is_active());

        // A turn started afterwards is unaffected by the stray events.
        assembler.begin_turn();
        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert_eq!(turn.text, "");
        assert!(turn.audio_fragments.is_empty());
    }

    #[test]
    fn test_deltas_without_usable_payload_are_skipped() {
        let mut assembler = TurnAssembler::new();
        assembler.begin_turn();

        assembler.ingest(&event(r#"{"type":"response.text.delta"}"#));
        assembler.ingest(&event(r#"{"type":"response.text.delta","delta":""}"#));
        assembler.ingest(&event(r#"{"type":"response.audio.delta"}"#));

        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert_eq!(turn.text, "");
        assert!(turn.audio_fragments.is_empty());
    }

    #[test]
    fn test_begin_turn_while_active_is_ignored() {
        let mut assembler = TurnAssembler::new();
        assembler.begin_turn();
        assembler.ingest(&event(r#"{"type":"response.text.delta","delta":"keep"}"#));

        assembler.begin_turn();

        let turn = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert_eq!(turn.text, "keep");
    }

    #[test]
    fn test_assembler_is_reusable_across_turns() {
        let mut assembler = TurnAssembler::new();

        assembler.begin_turn();
        assembler.ingest(&event(r#"{"type":"response.text.delta","delta":"one"}"#));
        let first = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert_eq!(first.text, "one");

        assembler.begin_turn();
        assembler.ingest(&event(r#"{"type":"response.text.delta","delta":"two"}"#));
        let second = assembler
            .ingest(&event(r#"{"type":"response.done"}"#))
            .unwrap();
        assert_eq!(second.text, "two");
    }
}
