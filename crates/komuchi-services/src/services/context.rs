use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use komuchi_core::models::RecordingMode;
use komuchi_core::AppError;
use komuchi_db::{DebriefRepository, RecordingRepository, TranscriptRepository};

/// Aggregated context for a day's conversations, fed to the chat model.
#[derive(Debug, Clone)]
pub struct DayContext {
    pub context: String,
    /// Number of complete recordings on that day.
    pub recording_count: usize,
    /// True when at least one transcript has text.
    pub has_content: bool,
}

/// Context for a single recording, fed to the chat model.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    pub context: String,
    /// True when the recording has a transcript with text.
    pub has_content: bool,
}

/// Builds the textual context the chat provider sees: transcripts (and
/// debriefs) of the user's complete recordings, scoped to a day or a single
/// recording.
#[derive(Clone)]
pub struct ContextService {
    recordings: RecordingRepository,
    transcripts: TranscriptRepository,
    debriefs: DebriefRepository,
}

impl ContextService {
    pub fn new(
        recordings: RecordingRepository,
        transcripts: TranscriptRepository,
        debriefs: DebriefRepository,
    ) -> Self {
        Self {
            recordings,
            transcripts,
            debriefs,
        }
    }

    /// Aggregate titles and transcripts of the day's complete recordings.
    /// Returns an empty context when the day has none.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, date = %date))]
    pub async fn day_context(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<DayContext, AppError> {
        let recordings = self.recordings.list_complete_for_day(user_id, date).await?;
        if recordings.is_empty() {
            return Ok(DayContext {
                context: String::new(),
                recording_count: 0,
                has_content: false,
            });
        }

        let ids = recordings.iter().map(|r| r.id).collect::<Vec<_>>();
        let transcripts = self.transcripts.get_by_recordings(&ids).await?;
        let text_by_recording: HashMap<Uuid, String> = transcripts
            .into_iter()
            .map(|t| (t.recording_id, t.text))
            .collect();

        let entries = recordings
            .iter()
            .map(|r| {
                (
                    r.title.as_str(),
                    text_by_recording.get(&r.id).map(String::as_str),
                )
            })
            .collect::<Vec<_>>();

        let has_content = entries
            .iter()
            .any(|(_, text)| text.is_some_and(|t| !t.trim().is_empty()));

        Ok(DayContext {
            context: format_day_context(&entries),
            recording_count: recordings.len(),
            has_content,
        })
    }

    /// Context for one recording: title, mode, transcript, and debrief when
    /// present. Owner-scoped like the rest of the recording surface.
    #[tracing::instrument(skip(self), fields(recording_id = %recording_id, user_id = %user_id))]
    pub async fn recording_context(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
    ) -> Result<RecordingContext, AppError> {
        let recording = self
            .recordings
            .get_for_user(recording_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recording not found: {}", recording_id)))?;

        let transcript = self.transcripts.get_by_recording(recording_id).await?;
        let debrief = self.debriefs.get_by_recording(recording_id).await?;

        let has_content = transcript
            .as_ref()
            .is_some_and(|t| !t.text.trim().is_empty());

        let context = format_recording_context(
            &recording.title,
            recording.mode,
            transcript.as_ref().map(|t| t.text.as_str()),
            debrief.as_ref().map(|d| d.markdown.as_str()),
        );

        Ok(RecordingContext {
            context,
            has_content,
        })
    }
}

fn format_day_context(entries: &[(&str, Option<&str>)]) -> String {
    entries
        .iter()
        .map(|(title, transcript)| match transcript {
            Some(text) if !text.trim().is_empty() => {
                format!("## {}\n\n{}", title, text.trim())
            }
            _ => format!("## {}\n\n(no transcript)", title),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_recording_context(
    title: &str,
    mode: RecordingMode,
    transcript: Option<&str>,
    debrief: Option<&str>,
) -> String {
    let mut context = format!("Title: {}\nMode: {}", title, mode);
    if let Some(text) = transcript {
        if !text.trim().is_empty() {
            context.push_str("\n\nTranscript:\n");
            context.push_str(text.trim());
        }
    }
    if let Some(markdown) = debrief {
        if !markdown.trim().is_empty() {
            context.push_str("\n\nDebrief:\n");
            context.push_str(markdown.trim());
        }
    }
    context
}
