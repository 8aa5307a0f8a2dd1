//! Spoken profile descriptions
//!
//! A recorded description is sent to the configured model as inline audio and
//! the returned transcript becomes (part of) the profile description. Only
//! providers with audio-capable chat endpoints accept clips.

use std::path::Path;

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use simfit_core::config::LlmProvider;
use simfit_core::errors::ApplicationError;
use tracing::{info, warn};

use crate::llm::HttpLlmClient;

const TRANSCRIPTION_INSTRUCTION: &str = "Transcribe the spoken audio exactly as it is spoken. \
Output only the transcript with no labels, introductions or commentary.";

/// Clips above this size are rejected before any upload.
pub const MAX_CLIP_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    pub format: AudioFormat,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    /// Read a clip from disk. Unsupported, empty or oversized files are input
    /// errors, reported before anything is sent.
    pub async fn read(path: &Path) -> Result<Self, ApplicationError> {
        let format = AudioFormat::from_path(path).ok_or_else(|| {
            ApplicationError::InvalidInput(format!(
                "audio file `{}` must be .wav or .mp3",
                path.display()
            ))
        })?;
        let bytes = tokio::fs::read(path).await.map_err(|error| {
            ApplicationError::InvalidInput(format!(
                "audio file `{}` could not be read: {error}",
                path.display()
            ))
        })?;
        if bytes.is_empty() {
            return Err(ApplicationError::InvalidInput(format!(
                "audio file `{}` is empty",
                path.display()
            )));
        }
        if bytes.len() > MAX_CLIP_BYTES {
            return Err(ApplicationError::InvalidInput(format!(
                "audio file `{}` is larger than {MAX_CLIP_BYTES} bytes",
                path.display()
            )));
        }
        Ok(Self { format, bytes })
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;
}

/// Chat request carrying the instruction and the clip as `input_audio`.
pub fn transcription_body(model: &str, clip: &AudioClip) -> Value {
    json!({
        "model": model,
        "modalities": ["text"],
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": TRANSCRIPTION_INSTRUCTION },
                {
                    "type": "input_audio",
                    "input_audio": { "data": clip.base64(), "format": clip.format.key() },
                },
            ],
        }],
    })
}

#[async_trait]
impl Transcriber for HttpLlmClient {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        match self.provider() {
            LlmProvider::OpenAi => self.send(&transcription_body(self.model(), clip)).await,
            provider => bail!("{provider:?} does not accept audio input"),
        }
    }
}

/// Transcribe the clip at `path`. Any provider failure, or a transcript with
/// no words in it, is a transcription failure.
pub async fn transcribe_file(
    transcriber: &dyn Transcriber,
    path: &Path,
) -> Result<String, ApplicationError> {
    let clip = AudioClip::read(path).await?;
    info!(
        event_name = "agent.transcription.start",
        format = clip.format.key(),
        bytes = clip.bytes.len(),
        "transcribing spoken description"
    );

    let transcript = transcriber.transcribe(&clip).await.map_err(|error| {
        warn!(
            event_name = "agent.transcription.failed",
            error = %format!("{error:#}"),
            "transcription failed"
        );
        ApplicationError::Transcription(format!("{error:#}"))
    })?;

    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(ApplicationError::Transcription("model returned no text".to_string()));
    }
    Ok(transcript.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use simfit_core::config::{AppConfig, LlmProvider};
    use simfit_core::errors::ApplicationError;

    use super::{transcribe_file, transcription_body, AudioClip, AudioFormat, Transcriber};
    use crate::llm::HttpLlmClient;

    struct FixedTranscriber(Result<String, String>);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _clip: &AudioClip) -> Result<String> {
            self.0.clone().map_err(|message| anyhow!(message))
        }
    }

    fn clip_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).expect("write clip");
        path
    }

    #[test]
    fn formats_follow_the_file_extension() {
        assert_eq!(AudioFormat::from_path(Path::new("memo.WAV")), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_path(Path::new("memo.mp3")), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_path(Path::new("memo.ogg")), None);
        assert_eq!(AudioFormat::from_path(Path::new("memo")), None);
    }

    #[test]
    fn body_inlines_the_clip_as_base64() {
        let clip = AudioClip { format: AudioFormat::Wav, bytes: b"RIFF".to_vec() };
        let body = transcription_body("gpt-4o-audio-preview", &clip);
        assert_eq!(body["model"], "gpt-4o-audio-preview");
        let audio = &body["messages"][0]["content"][1]["input_audio"];
        assert_eq!(audio["data"], "UklGRg==");
        assert_eq!(audio["format"], "wav");
    }

    #[tokio::test]
    async fn transcript_is_trimmed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = clip_file(dir.path(), "memo.wav", b"RIFF....WAVE");
        let transcriber = FixedTranscriber(Ok("  I work from cafes  \n".to_string()));
        let transcript = transcribe_file(&transcriber, &path).await.expect("transcript");
        assert_eq!(transcript, "I work from cafes");
    }

    #[tokio::test]
    async fn unreadable_or_unsupported_files_are_input_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let transcriber = FixedTranscriber(Ok("unused".to_string()));

        let missing = dir.path().join("missing.mp3");
        let error = transcribe_file(&transcriber, &missing).await.expect_err("missing file");
        assert!(matches!(error, ApplicationError::InvalidInput(_)));

        let ogg = clip_file(dir.path(), "memo.ogg", b"OggS");
        let error = transcribe_file(&transcriber, &ogg).await.expect_err("unsupported format");
        assert!(
            matches!(error, ApplicationError::InvalidInput(message) if message.contains(".wav"))
        );

        let empty = clip_file(dir.path(), "empty.wav", b"");
        let error = transcribe_file(&transcriber, &empty).await.expect_err("empty clip");
        assert!(
            matches!(error, ApplicationError::InvalidInput(message) if message.contains("empty"))
        );
    }

    #[tokio::test]
    async fn provider_failures_and_blank_transcripts_are_transcription_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = clip_file(dir.path(), "memo.mp3", b"ID3");

        let failing = FixedTranscriber(Err("endpoint returned 500".to_string()));
        let error = transcribe_file(&failing, &path).await.expect_err("provider failure");
        assert!(
            matches!(error, ApplicationError::Transcription(message) if message.contains("500"))
        );

        let blank = FixedTranscriber(Ok("   ".to_string()));
        let error = transcribe_file(&blank, &path).await.expect_err("blank transcript");
        assert_eq!(error, ApplicationError::Transcription("model returned no text".to_string()));
    }

    #[tokio::test]
    async fn providers_without_audio_input_refuse_clips() {
        let mut config = AppConfig::default().llm;
        config.provider = LlmProvider::Anthropic;
        let client = HttpLlmClient::from_config(&config).expect("client");
        let clip = AudioClip { format: AudioFormat::Mp3, bytes: b"ID3".to_vec() };
        let error = client.transcribe(&clip).await.expect_err("no audio support");
        assert!(error.to_string().contains("does not accept audio input"));
    }
}
