//! Pipeline Orchestration
//!
//! Drives one upload through the full run: size gate, audio extraction,
//! transcription, SRT parsing, and timeline population. The pipeline owns
//! the run's state machine and emits progress events over a channel so a
//! frontend (or the CLI) can render status without polling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::audio::{extract_audio_async, MediaDecoder};
use crate::captions::{parse_srt, CaptionTimeline};
use crate::media::UploadedMedia;
use crate::transcribe::{CaptionStyle, Transcriber};
use crate::{CoreError, CoreResult, RunId};

// =============================================================================
// Process State
// =============================================================================

/// State of one pipeline run.
///
/// `Error` is terminal for the run; [`Pipeline::reset`] returns the
/// pipeline to `Idle` for the next one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ProcessState {
    /// Waiting for an upload
    Idle,
    /// Decoding / extracting the audio track
    Extracting,
    /// Waiting on the transcription service
    Transcribing,
    /// Run finished, timeline populated
    Completed,
    /// Run failed
    Error {
        /// User-facing failure message
        message: String,
    },
}

impl ProcessState {
    /// Short state name used in transition errors
    pub fn name(&self) -> &'static str {
        match self {
            ProcessState::Idle => "idle",
            ProcessState::Extracting => "extracting",
            ProcessState::Transcribing => "transcribing",
            ProcessState::Completed => "completed",
            ProcessState::Error { .. } => "error",
        }
    }

    /// Returns true if `next` is a legal successor state
    pub fn can_transition_to(&self, next: &ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (Idle, Extracting)
                | (Extracting, Transcribing)
                | (Transcribing, Completed)
                | (Idle, Error { .. })
                | (Extracting, Error { .. })
                | (Transcribing, Error { .. })
                | (Completed, Idle)
                | (Error { .. }, Idle)
        )
    }
}

// =============================================================================
// Pipeline Events
// =============================================================================

/// Progress update emitted during a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PipelineEvent {
    /// The run entered a new state
    StateChanged { state: ProcessState },
    /// Coarse progress within the run
    Progress { fraction: f32, message: String },
}

// =============================================================================
// Pipeline
// =============================================================================

/// Orchestrates one upload-to-captions run at a time.
///
/// Reusable across runs: `Completed` and `Error` return to `Idle` via
/// [`reset`](Self::reset), which also assigns a fresh run id.
pub struct Pipeline {
    run_id: RunId,
    started_at: Option<String>,
    state: ProcessState,
    timeline: CaptionTimeline,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<PipelineEvent>>,
}

impl Pipeline {
    /// Creates an idle pipeline
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            run_id: ulid::Ulid::new().to_string(),
            started_at: None,
            state: ProcessState::Idle,
            timeline: CaptionTimeline::new(),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Takes the event receiver (available once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<PipelineEvent>> {
        self.event_rx.take()
    }

    /// Identifier of the current (or most recent) run
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// RFC 3339 timestamp of the last run start
    pub fn started_at(&self) -> Option<&str> {
        self.started_at.as_deref()
    }

    /// Current state
    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    /// The populated timeline, only while `Completed`
    pub fn timeline(&self) -> Option<&CaptionTimeline> {
        match self.state {
            ProcessState::Completed => Some(&self.timeline),
            _ => None,
        }
    }

    /// Mutable timeline access for caption edits, only while `Completed`
    pub fn timeline_mut(&mut self) -> Option<&mut CaptionTimeline> {
        match self.state {
            ProcessState::Completed => Some(&mut self.timeline),
            _ => None,
        }
    }

    /// Discards the run result and returns to `Idle` with a fresh run id.
    ///
    /// Only legal from `Completed` or `Error`.
    pub fn reset(&mut self) -> CoreResult<()> {
        self.set_state(ProcessState::Idle)?;
        self.timeline.discard();
        self.run_id = ulid::Ulid::new().to_string();
        self.started_at = None;
        Ok(())
    }

    /// Runs the full pipeline on one upload.
    ///
    /// Rejected unless the pipeline is `Idle`. On failure the pipeline
    /// lands in `Error` with the user-facing message and the error is
    /// also returned; the timeline stays empty.
    pub async fn run(
        &mut self,
        media: UploadedMedia,
        decoder: Arc<dyn MediaDecoder>,
        transcriber: &dyn Transcriber,
        style: CaptionStyle,
    ) -> CoreResult<()> {
        if self.state != ProcessState::Idle {
            return Err(CoreError::InvalidTransition {
                from: self.state.name().to_string(),
                to: ProcessState::Extracting.name().to_string(),
            });
        }

        self.started_at = Some(chrono::Utc::now().to_rfc3339());
        tracing::info!(run_id = %self.run_id, file = %media.file_name, "starting caption run");

        match self.run_inner(media, decoder, transcriber, style).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(run_id = %self.run_id, error = %e, "caption run failed");
                self.enter_error(e.user_message());
                Err(e)
            }
        }
    }

    async fn run_inner(
        &mut self,
        media: UploadedMedia,
        decoder: Arc<dyn MediaDecoder>,
        transcriber: &dyn Transcriber,
        style: CaptionStyle,
    ) -> CoreResult<()> {
        // Size gate runs before any state change or resource acquisition.
        media.check_size()?;

        self.set_state(ProcessState::Extracting)?;
        self.emit_progress(0.10, "Extracting audio track");
        let encoded = extract_audio_async(media, decoder).await?;

        self.set_state(ProcessState::Transcribing)?;
        self.emit_progress(0.40, "Transcribing audio");
        let srt = transcriber.transcribe(&encoded, style).await?;

        self.emit_progress(0.80, "Parsing captions");
        let parsed = parse_srt(&srt);
        if parsed.dropped_blocks > 0 {
            tracing::warn!(
                run_id = %self.run_id,
                dropped = parsed.dropped_blocks,
                "dropped malformed subtitle blocks"
            );
        }

        self.timeline.populate(parsed.captions);
        self.set_state(ProcessState::Completed)?;
        self.emit_progress(1.0, "Completed");

        Ok(())
    }

    fn set_state(&mut self, next: ProcessState) -> CoreResult<()> {
        if !self.state.can_transition_to(&next) {
            return Err(CoreError::InvalidTransition {
                from: self.state.name().to_string(),
                to: next.name().to_string(),
            });
        }

        self.state = next;
        let _ = self.event_tx.send(PipelineEvent::StateChanged {
            state: self.state.clone(),
        });
        Ok(())
    }

    // Error is reachable from every running state, so this cannot be
    // rejected; it bypasses the transition check on purpose.
    fn enter_error(&mut self, message: String) {
        self.state = ProcessState::Error { message };
        let _ = self.event_tx.send(PipelineEvent::StateChanged {
            state: self.state.clone(),
        });
    }

    fn emit_progress(&self, fraction: f32, message: &str) {
        let _ = self.event_tx.send(PipelineEvent::Progress {
            fraction,
            message: message.to_string(),
        });
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::audio::{AudioBuffer, DecodeSession, EncodedAudio};
    use crate::captions::export_srt;

    const TWO_BLOCK_SRT: &str =
        "1\n00:00:00,000 --> 00:00:02,000\nHello there\n\n2\n00:00:02,000 --> 00:00:04,000\nGeneral greeting\n";

    struct StubDecoder {
        calls: AtomicUsize,
    }

    impl StubDecoder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl crate::audio::MediaDecoder for StubDecoder {
        fn decode(&self, _session: &DecodeSession, _data: &[u8]) -> CoreResult<AudioBuffer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            AudioBuffer::new(16_000, vec![vec![0.0f32; 160]])
        }
    }

    struct StubTranscriber {
        srt: String,
        calls: AtomicUsize,
    }

    impl StubTranscriber {
        fn returning(srt: &str) -> Self {
            Self {
                srt: srt.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(
            &self,
            _audio: &EncodedAudio,
            _style: CaptionStyle,
        ) -> CoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.srt.clone())
        }
    }

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(
            &self,
            _audio: &EncodedAudio,
            _style: CaptionStyle,
        ) -> CoreResult<String> {
            Err(CoreError::TranscriptionFailed("service unavailable".to_string()))
        }
    }

    fn video_upload(bytes: usize) -> UploadedMedia {
        UploadedMedia::new("clip.mp4", "video/mp4", vec![0u8; bytes])
    }

    // -------------------------------------------------------------------------
    // State Machine
    // -------------------------------------------------------------------------

    #[test]
    fn test_transition_table() {
        use ProcessState::*;
        let error = Error {
            message: "x".to_string(),
        };

        assert!(Idle.can_transition_to(&Extracting));
        assert!(Extracting.can_transition_to(&Transcribing));
        assert!(Transcribing.can_transition_to(&Completed));
        assert!(Idle.can_transition_to(&error));
        assert!(Extracting.can_transition_to(&error));
        assert!(Transcribing.can_transition_to(&error));
        assert!(Completed.can_transition_to(&Idle));
        assert!(error.can_transition_to(&Idle));

        assert!(!Idle.can_transition_to(&Transcribing));
        assert!(!Idle.can_transition_to(&Completed));
        assert!(!Extracting.can_transition_to(&Completed));
        assert!(!Completed.can_transition_to(&Extracting));
        assert!(!error.can_transition_to(&Extracting));
        assert!(!Completed.can_transition_to(&error));
    }

    // -------------------------------------------------------------------------
    // Runs
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_successful_run_populates_timeline() {
        let mut pipeline = Pipeline::new();
        let mut events = pipeline.take_event_receiver().unwrap();
        let decoder = StubDecoder::new();
        let transcriber = StubTranscriber::returning(TWO_BLOCK_SRT);

        pipeline
            .run(
                video_upload(1024),
                decoder.clone(),
                &transcriber,
                CaptionStyle::Reels,
            )
            .await
            .unwrap();

        assert_eq!(*pipeline.state(), ProcessState::Completed);
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

        let timeline = pipeline.timeline().unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.captions()[0].text, "Hello there");

        // Export reproduces the service output byte for byte.
        assert_eq!(export_srt(timeline.captions()), TWO_BLOCK_SRT);

        // Event stream covers all stages in order.
        let mut collected = Vec::new();
        while let Ok(event) = events.try_recv() {
            collected.push(event);
        }
        let fractions: Vec<f32> = collected
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Progress { fraction, .. } => Some(*fraction),
                _ => None,
            })
            .collect();
        assert_eq!(fractions, vec![0.10, 0.40, 0.80, 1.0]);
        assert!(collected.contains(&PipelineEvent::StateChanged {
            state: ProcessState::Extracting
        }));
        assert!(collected.contains(&PipelineEvent::StateChanged {
            state: ProcessState::Completed
        }));
    }

    #[tokio::test]
    async fn test_oversize_upload_fails_before_any_stage() {
        let mut pipeline = Pipeline::new();
        let decoder = StubDecoder::new();
        let transcriber = StubTranscriber::returning(TWO_BLOCK_SRT);

        let err = pipeline
            .run(
                video_upload(60 * 1024 * 1024),
                decoder.clone(),
                &transcriber,
                CaptionStyle::Reels,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::FileTooLarge { .. }));
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

        match pipeline.state() {
            ProcessState::Error { message } => {
                assert!(message.contains("60.0MB"), "got: {message}");
            }
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(pipeline.timeline().is_none());
    }

    #[tokio::test]
    async fn test_transcription_failure_lands_in_error_state() {
        let mut pipeline = Pipeline::new();
        let decoder = StubDecoder::new();

        let err = pipeline
            .run(
                video_upload(1024),
                decoder,
                &FailingTranscriber,
                CaptionStyle::Standard,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::TranscriptionFailed(_)));
        assert!(matches!(pipeline.state(), ProcessState::Error { .. }));
        assert!(pipeline.timeline().is_none());
    }

    #[tokio::test]
    async fn test_run_rejected_unless_idle() {
        let mut pipeline = Pipeline::new();
        let decoder = StubDecoder::new();
        let transcriber = StubTranscriber::returning(TWO_BLOCK_SRT);

        pipeline
            .run(
                video_upload(1024),
                decoder.clone(),
                &transcriber,
                CaptionStyle::Reels,
            )
            .await
            .unwrap();

        let err = pipeline
            .run(video_upload(1024), decoder, &transcriber, CaptionStyle::Reels)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        // The completed run result is untouched by the rejected call.
        assert_eq!(pipeline.timeline().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_allows_a_new_run() {
        let mut pipeline = Pipeline::new();
        let decoder = StubDecoder::new();
        let transcriber = StubTranscriber::returning(TWO_BLOCK_SRT);

        pipeline
            .run(
                video_upload(1024),
                decoder.clone(),
                &transcriber,
                CaptionStyle::Reels,
            )
            .await
            .unwrap();
        let first_run = pipeline.run_id().to_string();

        pipeline.reset().unwrap();
        assert_eq!(*pipeline.state(), ProcessState::Idle);
        assert_ne!(pipeline.run_id(), first_run);

        pipeline
            .run(video_upload(1024), decoder, &transcriber, CaptionStyle::Fast)
            .await
            .unwrap();
        assert_eq!(*pipeline.state(), ProcessState::Completed);
    }

    #[test]
    fn test_reset_rejected_while_idle_or_running() {
        let mut pipeline = Pipeline::new();
        assert!(matches!(
            pipeline.reset().unwrap_err(),
            CoreError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_transcript_completes_with_empty_timeline() {
        let mut pipeline = Pipeline::new();
        let decoder = StubDecoder::new();
        let transcriber = StubTranscriber::returning("");

        pipeline
            .run(video_upload(1024), decoder, &transcriber, CaptionStyle::Reels)
            .await
            .unwrap();

        assert_eq!(*pipeline.state(), ProcessState::Completed);
        assert!(pipeline.timeline().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeline_edit_through_pipeline() {
        let mut pipeline = Pipeline::new();
        let decoder = StubDecoder::new();
        let transcriber = StubTranscriber::returning(TWO_BLOCK_SRT);

        pipeline
            .run(video_upload(1024), decoder, &transcriber, CaptionStyle::Reels)
            .await
            .unwrap();

        pipeline.timeline_mut().unwrap().edit_text(2, "Edited").unwrap();
        assert_eq!(pipeline.timeline().unwrap().captions()[1].text, "Edited");
    }
}
