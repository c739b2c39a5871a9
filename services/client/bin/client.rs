//! Command-line client for the parley voice relay.
//!
//! Sends one text message through the relay, streams the reply to stdout as
//! it arrives, and saves the spoken reply as a WAV file next to a latency
//! report. The relay must be running and hold the upstream credential.

use anyhow::{Context, Result};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use parley_client::turn::TurnAssembler;
use parley_core::{
    audio::{self, REPLY_FORMAT},
    event::{ClientEvent, ServerEvent},
};
use std::{io::Write, path::PathBuf};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, info};

/// Matches the app's default personality (all sliders at 50).
const PERSONALITY_PROMPT: &str = "You are a voice assistant with the following personality: \
balanced and adaptable. Respond naturally in conversation. Your personality should influence \
your tone, word choice, and emotional expression. Use appropriate vocal cues like [sigh], \
[laugh], [whisper] when they fit your personality.";

#[derive(Parser, Debug)]
#[command(name = "client", about = "Text + audio client for the parley relay")]
struct Args {
    /// The message to send.
    #[arg(default_value = "hello")]
    message: String,

    /// Voice for the spoken reply.
    #[arg(long, default_value = "Rex")]
    voice: String,

    /// Where to write the reply audio.
    #[arg(long, default_value = "reply.wav")]
    out: PathBuf,

    /// WebSocket URL of the relay.
    #[arg(long, default_value = "ws://localhost:8000/ws")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    let args = Args::parse();

    println!("Connecting to {} ...", args.url);
    let (stream, _) = connect_async(&args.url)
        .await
        .context("Failed to connect to relay")?;
    let (mut tx, mut rx) = stream.split();

    let opening = [
        ClientEvent::session_update(&args.voice, PERSONALITY_PROMPT, REPLY_FORMAT.sample_rate),
        ClientEvent::user_message(&args.message),
        ClientEvent::response_create(),
    ];
    for event in &opening {
        tx.send(WsMessage::Text(serde_json::to_string(event)?.into()))
            .await
            .context("Failed to send to relay")?;
    }
    println!("Sent message, awaiting reply...\n");

    let mut assembler = TurnAssembler::new();
    assembler.begin_turn();

    let completed = loop {
        let Some(frame) = rx.next().await else {
            anyhow::bail!("Connection closed before the response completed");
        };
        let frame = frame.context("Relay connection failed")?;
        let WsMessage::Text(raw) = frame else {
            continue;
        };

        // Frames with event kinds this client does not consume fail to
        // parse and are skipped.
        let Ok(event) = serde_json::from_str::<ServerEvent>(raw.as_str()) else {
            debug!(frame = %raw, "Ignoring unhandled frame");
            continue;
        };

        match &event {
            ServerEvent::TextDelta(delta) | ServerEvent::TranscriptDelta(delta) => {
                if let Some(text) = delta.text() {
                    print!("{}", text);
                    std::io::stdout().flush().ok();
                }
            }
            ServerEvent::Error { error } => {
                anyhow::bail!("Relay reported an error: {}", error.message);
            }
            _ => {}
        }

        if let Some(turn) = assembler.ingest(&event) {
            println!("\n\nComplete.");
            break turn;
        }
    };

    if !completed.audio_fragments.is_empty() {
        let wav = audio::encode_wav(&completed.audio_fragments, REPLY_FORMAT)?;
        std::fs::write(&args.out, wav)
            .with_context(|| format!("Failed to write {}", args.out.display()))?;
        println!("Saved audio to {}", args.out.display());
    } else {
        info!("Turn completed without audio; no file written");
    }

    if let Some(elapsed) = completed.elapsed {
        println!("Generation time: {:.2}s", elapsed.as_secs_f64());
    }

    Ok(())
}
