//! Defines the JSON message protocol for the realtime voice API.
//!
//! Every frame on the wire is a JSON object with a dotted `type` tag. The
//! relay treats frames as opaque passthrough and only needs the tag for its
//! logging policy; the client deserializes the subset of server events it
//! reconstructs turns from.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Mic audio appended by the client. Far too chatty to log.
pub const INPUT_AUDIO_APPEND: &str = "input_audio_buffer.append";

/// Extracts the `type` tag from a raw JSON frame.
///
/// Returns `None` for frames that are not well-formed JSON objects with a
/// string `type`; such frames are still forwarded verbatim by the relay,
/// they just cannot be classified for logging.
pub fn message_type(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value.get("type")?.as_str().map(str::to_owned)
}

/// True when a client-to-upstream frame should be skipped by the relay log.
pub fn is_quiet_client_type(msg_type: &str) -> bool {
    msg_type == INPUT_AUDIO_APPEND
}

/// True when an upstream-to-client frame should be skipped by the relay log.
///
/// Only audio *deltas* are suppressed. A type matching just one of the two
/// substrings (e.g. `response.output_audio.done`, `response.text.delta`)
/// still logs.
pub fn is_quiet_upstream_type(msg_type: &str) -> bool {
    msg_type.contains("audio") && msg_type.contains("delta")
}

/// Events the client sends to the relay (and, through it, upstream).
#[derive(Serialize, Debug)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Configures voice, instructions, turn detection and audio formats.
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },
    /// Appends a user message to the conversation.
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },
    /// Asks the API to produce a response with the given modalities.
    #[serde(rename = "response.create")]
    ResponseCreate { response: ResponseRequest },
}

#[derive(Serialize, Debug)]
pub struct SessionConfig {
    pub voice: String,
    pub instructions: String,
    pub turn_detection: TurnDetection,
    pub audio: AudioConfig,
}

#[derive(Serialize, Debug)]
pub struct TurnDetection {
    pub r#type: String,
}

#[derive(Serialize, Debug)]
pub struct AudioConfig {
    pub input: AudioEndpoint,
    pub output: AudioEndpoint,
}

#[derive(Serialize, Debug)]
pub struct AudioEndpoint {
    pub format: AudioFormatSpec,
}

#[derive(Serialize, Debug)]
pub struct AudioFormatSpec {
    pub r#type: String,
    pub rate: u32,
}

#[derive(Serialize, Debug)]
pub struct ConversationItem {
    pub r#type: String,
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Serialize, Debug)]
pub struct ContentPart {
    pub r#type: String,
    pub text: String,
}

#[derive(Serialize, Debug)]
pub struct ResponseRequest {
    pub modalities: Vec<String>,
}

impl ClientEvent {
    /// Builds the `session.update` event with the reference PCM configuration.
    pub fn session_update(voice: &str, instructions: &str, sample_rate: u32) -> Self {
        let pcm = |rate| AudioEndpoint {
            format: AudioFormatSpec {
                r#type: "audio/pcm".to_string(),
                rate,
            },
        };
        ClientEvent::SessionUpdate {
            session: SessionConfig {
                voice: voice.to_string(),
                instructions: instructions.to_string(),
                turn_detection: TurnDetection {
                    r#type: "server_vad".to_string(),
                },
                audio: AudioConfig {
                    input: pcm(sample_rate),
                    output: pcm(sample_rate),
                },
            },
        }
    }

    /// Builds a `conversation.item.create` event carrying one user text message.
    pub fn user_message(text: &str) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem {
                r#type: "message".to_string(),
                role: "user".to_string(),
                content: vec![ContentPart {
                    r#type: "input_text".to_string(),
                    text: text.to_string(),
                }],
            },
        }
    }

    /// Builds a `response.create` event requesting text and audio.
    pub fn response_create() -> Self {
        ClientEvent::ResponseCreate {
            response: ResponseRequest {
                modalities: vec!["text".to_string(), "audio".to_string()],
            },
        }
    }
}

/// Server events the client cares about when reconstructing a turn.
///
/// Frames with any other `type` fail to deserialize and are ignored by the
/// consumer; the protocol carries many event kinds this client never needs.
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "response.text.delta")]
    TextDelta(TextDelta),
    #[serde(rename = "response.output_audio_transcript.delta")]
    TranscriptDelta(TextDelta),
    #[serde(rename = "response.output_audio.delta")]
    OutputAudioDelta(AudioDelta),
    #[serde(rename = "response.audio.delta")]
    AudioDelta(AudioDelta),
    #[serde(rename = "response.done")]
    ResponseDone {},
    #[serde(rename = "error")]
    Error { error: ErrorDetail },
}

/// An incremental text fragment. The upstream API names the field `delta`
/// in current versions and `text_delta` in older ones; both are accepted.
#[derive(Deserialize, Debug)]
pub struct TextDelta {
    #[serde(default)]
    pub delta: Option<String>,
    #[serde(default)]
    pub text_delta: Option<String>,
}

impl TextDelta {
    /// Whichever field is present and non-empty, normalized to one accessor.
    pub fn text(&self) -> Option<&str> {
        self.delta
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.text_delta.as_deref().filter(|s| !s.is_empty()))
    }
}

/// An incremental audio fragment, base64-encoded PCM.
#[derive(Deserialize, Debug)]
pub struct AudioDelta {
    #[serde(default)]
    pub delta: Option<AudioPayload>,
}

/// The upstream API sends the encoded audio either as a bare string or
/// nested under a `data` key; normalize both at the boundary.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum AudioPayload {
    Encoded(String),
    Wrapped { data: String },
}

impl AudioDelta {
    fn encoded(&self) -> Option<&str> {
        match self.delta.as_ref()? {
            AudioPayload::Encoded(s) => Some(s),
            AudioPayload::Wrapped { data } => Some(data),
        }
    }

    /// Decodes the fragment to raw PCM bytes. `None` when the payload is
    /// absent or not valid base64.
    pub fn decode(&self) -> Option<Vec<u8>> {
        let encoded = self.encoded()?;
        base64::engine::general_purpose::STANDARD.decode(encoded).ok()
    }
}

/// Frames the relay itself originates toward the downstream client.
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// Reports a fatal session error before the connection is closed.
    Error { error: ErrorDetail },
}

impl RelayEvent {
    pub fn error(message: impl Into<String>) -> Self {
        RelayEvent::Error {
            error: ErrorDetail {
                message: message.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
}
