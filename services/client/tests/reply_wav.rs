//! End-to-end test of the client-side pipeline: raw server frames in, a
//! playable WAV file out.

use base64::Engine;
use parley_client::turn::TurnAssembler;
use parley_core::{
    audio::{self, REPLY_FORMAT},
    event::ServerEvent,
};

fn audio_frame(pcm: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(pcm);
    format!(r#"{{"type":"response.audio.delta","delta":"{encoded}"}}"#)
}

#[test]
fn frames_to_wav_file_round_trip() {
    let fragments: Vec<Vec<u8>> = vec![
        vec![0x01, 0x02, 0x03, 0x04],
        vec![0x05, 0x06],
        vec![0x07, 0x08, 0x09, 0x0A],
    ];

    let mut frames: Vec<String> = fragments.iter().map(|f| audio_frame(f)).collect();
    frames.insert(0, r#"{"type":"response.text.delta","delta":"Hi there!"}"#.into());
    frames.push(r#"{"type":"response.done"}"#.into());

    let mut assembler = TurnAssembler::new();
    assembler.begin_turn();

    let mut completed = None;
    for raw in &frames {
        let event: ServerEvent = serde_json::from_str(raw).unwrap();
        if let Some(turn) = assembler.ingest(&event) {
            completed = Some(turn);
        }
    }
    let turn = completed.expect("response.done finalizes the turn");
    assert_eq!(turn.text, "Hi there!");
    assert_eq!(turn.audio_fragments, fragments);

    let wav = audio::encode_wav(&turn.audio_fragments, REPLY_FORMAT).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reply.wav");
    std::fs::write(&path, &wav).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, 24_000);

    let bytes: Vec<u8> = reader
        .into_samples::<i16>()
        .flat_map(|s| s.unwrap().to_le_bytes())
        .collect();
    assert_eq!(bytes, fragments.concat());
}
