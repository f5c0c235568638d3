//! Debrief job handler.
//!
//! Feeds the stored transcript to the debrief provider and persists the
//! structured summary. This is the last pipeline stage, so on success the
//! recording transitions to `complete`.

use anyhow::{Context, Result};

use komuchi_ai::DebriefRequest;
use komuchi_core::models::{Job, RecordingStatus};
use komuchi_core::JobError;

use super::JobContext;

#[tracing::instrument(skip(ctx, job), fields(job.id = %job.id, recording_id = %job.recording_id))]
pub(crate) async fn run(ctx: &JobContext, job: &Job) -> Result<()> {
    let recording = ctx
        .recordings
        .get(job.recording_id)
        .await?
        .ok_or_else(|| {
            JobError::unrecoverable(anyhow::anyhow!(
                "Recording not found: {}",
                job.recording_id
            ))
        })?;

    // No transcript means the pipeline is broken upstream; retrying the
    // debrief alone cannot fix it.
    let transcript = ctx
        .transcripts
        .get_by_recording(recording.id)
        .await?
        .ok_or_else(|| {
            JobError::unrecoverable(anyhow::anyhow!(
                "No transcript found for recording: {}",
                recording.id
            ))
        })?;

    tracing::info!(
        transcript_chars = transcript.text.len(),
        mode = %recording.mode,
        provider = ctx.debrief.name(),
        "Generating debrief"
    );

    let result = ctx
        .debrief
        .generate(DebriefRequest {
            transcript_text: transcript.text,
            mode: recording.mode,
            title: recording.title.clone(),
        })
        .await
        .context("Debrief provider failed")?;

    ctx.debriefs
        .create(recording.id, result.markdown, &result.sections)
        .await?;
    ctx.recordings
        .update_status(recording.id, RecordingStatus::Complete)
        .await?;

    tracing::info!(
        section_count = result.sections.len(),
        "Debrief complete, recording finished"
    );

    Ok(())
}
