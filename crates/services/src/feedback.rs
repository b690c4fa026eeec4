use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use renshu_core::model::DrillItem;
use renshu_core::scoring::Verdict;

use crate::error::AudioError;

//
// ─── SPEECH OPTIONS ────────────────────────────────────────────────────────────
//

/// Narration parameters passed to the audio backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
}

impl SpeechOptions {
    /// Japanese narration as the lesson screens use it.
    #[must_use]
    pub fn japanese() -> Self {
        Self {
            language: "ja-JP".to_owned(),
            rate: 0.98,
            pitch: 1.0,
        }
    }
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self::japanese()
    }
}

/// The two feedback sounds a submission can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Correct,
    Incorrect,
}

impl Cue {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Cue::Correct => "correct",
            Cue::Incorrect => "incorrect",
        }
    }
}

//
// ─── AUDIO BACKEND ─────────────────────────────────────────────────────────────
//

/// Playback collaborator for narration and feedback cues.
///
/// Calls are fire-and-forget from the session's point of view: the dispatcher
/// swallows every error, so implementations may fail freely (no speaker, no
/// network) without affecting the quiz.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Speak a piece of text.
    ///
    /// # Errors
    ///
    /// Returns `AudioError` when the backend is unavailable.
    async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), AudioError>;

    /// Play one of the feedback cues.
    ///
    /// # Errors
    ///
    /// Returns `AudioError` when the backend is unavailable.
    async fn play_cue(&self, cue: Cue) -> Result<(), AudioError>;
}

/// Backend that plays nothing. Useful headless and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

#[async_trait]
impl AudioBackend for NullAudio {
    async fn speak(&self, _text: &str, _options: &SpeechOptions) -> Result<(), AudioError> {
        Ok(())
    }

    async fn play_cue(&self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }
}

//
// ─── HTTP SPEECH BACKEND ───────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: String,
}

impl SpeechConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("RENSHU_SPEECH_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("RENSHU_SPEECH_BASE_URL")
            .unwrap_or_else(|_| "https://speech.renshu.dev/v1".into());
        Some(Self { base_url, api_key })
    }
}

/// Speech-synthesis client over a JSON HTTP service.
///
/// Unconfigured instances report `AudioError::Disabled`; the dispatcher
/// treats that like any other playback failure.
#[derive(Clone)]
pub struct HttpSpeechBackend {
    client: Client,
    config: Option<SpeechConfig>,
}

impl HttpSpeechBackend {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SpeechConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<SpeechConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<(String, &SpeechConfig), AudioError> {
        let config = self.config.as_ref().ok_or(AudioError::Disabled)?;
        let url = format!("{}/{path}", config.base_url.trim_end_matches('/'));
        Ok((url, config))
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<(), AudioError> {
        let (url, config) = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AudioError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioBackend for HttpSpeechBackend {
    async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), AudioError> {
        let payload = SpeakRequest {
            text: text.to_owned(),
            language: options.language.clone(),
            rate: options.rate,
            pitch: options.pitch,
        };
        self.post("synthesize", &payload).await
    }

    async fn play_cue(&self, cue: Cue) -> Result<(), AudioError> {
        let payload = CueRequest { name: cue.name() };
        self.post("cues", &payload).await
    }
}

#[derive(Debug, Serialize)]
struct SpeakRequest {
    text: String,
    language: String,
    rate: f32,
    pitch: f32,
}

#[derive(Debug, Serialize)]
struct CueRequest {
    name: &'static str,
}

//
// ─── DISPATCHER ────────────────────────────────────────────────────────────────
//

/// What the screen shows and plays after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub cue: Cue,
    pub explanation: Option<String>,
}

/// Plays the right cue for a verdict and reveals the item's explanation.
///
/// Audio failures are logged and swallowed here; feedback never blocks the
/// session or surfaces an error to the learner.
#[derive(Clone)]
pub struct FeedbackDispatcher {
    audio: Arc<dyn AudioBackend>,
    options: SpeechOptions,
}

impl FeedbackDispatcher {
    #[must_use]
    pub fn new(audio: Arc<dyn AudioBackend>) -> Self {
        Self {
            audio,
            options: SpeechOptions::japanese(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SpeechOptions) -> Self {
        self.options = options;
        self
    }

    /// Dispatch feedback for one scored submission.
    pub async fn dispatch(&self, verdict: Verdict, item: &DrillItem) -> Feedback {
        let cue = if verdict.correct {
            Cue::Correct
        } else {
            Cue::Incorrect
        };

        if let Err(err) = self.audio.play_cue(cue).await {
            warn!(cue = cue.name(), error = %err, "feedback cue failed");
        }

        Feedback {
            cue,
            explanation: item.explanation().map(str::to_owned),
        }
    }

    /// Narrate a piece of lesson text, ignoring playback failures.
    pub async fn narrate(&self, text: &str) {
        if let Err(err) = self.audio.speak(text, &self.options).await {
            warn!(error = %err, "narration failed");
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use renshu_core::model::{ItemId, MultipleChoice};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct RecordingAudio {
        cues: Mutex<Vec<Cue>>,
    }

    #[async_trait]
    impl AudioBackend for RecordingAudio {
        async fn speak(&self, _text: &str, _options: &SpeechOptions) -> Result<(), AudioError> {
            Ok(())
        }

        async fn play_cue(&self, cue: Cue) -> Result<(), AudioError> {
            self.cues.lock().unwrap().push(cue);
            Ok(())
        }
    }

    struct BrokenAudio {
        failures: AtomicU32,
    }

    #[async_trait]
    impl AudioBackend for BrokenAudio {
        async fn speak(&self, _text: &str, _options: &SpeechOptions) -> Result<(), AudioError> {
            self.failures.fetch_add(1, Ordering::SeqCst);
            Err(AudioError::Disabled)
        }

        async fn play_cue(&self, _cue: Cue) -> Result<(), AudioError> {
            self.failures.fetch_add(1, Ordering::SeqCst);
            Err(AudioError::Disabled)
        }
    }

    fn item() -> DrillItem {
        MultipleChoice::new(
            ItemId::new("q1"),
            "prompt",
            vec!["a".into(), "b".into()],
            "a",
            "La respuesta es a.",
        )
        .unwrap()
        .into()
    }

    #[tokio::test]
    async fn dispatch_plays_exactly_one_matching_cue() {
        let audio = Arc::new(RecordingAudio {
            cues: Mutex::new(Vec::new()),
        });
        let dispatcher = FeedbackDispatcher::new(audio.clone());

        let feedback = dispatcher
            .dispatch(
                Verdict {
                    correct: true,
                    points: 100,
                },
                &item(),
            )
            .await;

        assert_eq!(feedback.cue, Cue::Correct);
        assert_eq!(feedback.explanation.as_deref(), Some("La respuesta es a."));
        assert_eq!(audio.cues.lock().unwrap().as_slice(), &[Cue::Correct]);

        let feedback = dispatcher.dispatch(Verdict::incorrect(), &item()).await;
        assert_eq!(feedback.cue, Cue::Incorrect);
        assert_eq!(
            audio.cues.lock().unwrap().as_slice(),
            &[Cue::Correct, Cue::Incorrect]
        );
    }

    #[tokio::test]
    async fn broken_audio_never_surfaces_an_error() {
        let audio = Arc::new(BrokenAudio {
            failures: AtomicU32::new(0),
        });
        let dispatcher = FeedbackDispatcher::new(audio.clone());

        let feedback = dispatcher.dispatch(Verdict::incorrect(), &item()).await;
        assert_eq!(feedback.cue, Cue::Incorrect);
        dispatcher.narrate("こんにちは").await;

        assert_eq!(audio.failures.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unconfigured_http_backend_is_disabled() {
        let backend = HttpSpeechBackend::new(None);
        assert!(!backend.enabled());

        let err = backend
            .speak("こんにちは", &SpeechOptions::japanese())
            .await
            .unwrap_err();
        assert!(matches!(err, AudioError::Disabled));

        let err = backend.play_cue(Cue::Correct).await.unwrap_err();
        assert!(matches!(err, AudioError::Disabled));
    }

    #[test]
    fn default_options_narrate_japanese() {
        let options = SpeechOptions::default();
        assert_eq!(options.language, "ja-JP");
        assert!((options.rate - 0.98).abs() < f32::EPSILON);
        assert!((options.pitch - 1.0).abs() < f32::EPSILON);
    }
}
