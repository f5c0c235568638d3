//! Transcription job handler.
//!
//! Downloads the uploaded audio, runs it through the transcription provider,
//! stores the transcript, and queues the follow-up debrief job. The recording
//! stays in `processing` until the debrief handler finishes the pipeline.

use anyhow::{Context, Result};
use bytes::Bytes;

use komuchi_core::models::{Job, JobType, RecordingStatus};
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

    if recording.status != RecordingStatus::Processing {
        return Err(JobError::unrecoverable(anyhow::anyhow!(
            "Recording is not processing (status: {})",
            recording.status
        ))
        .into());
    }

    let audio = ctx
        .storage
        .download(&recording.object_key)
        .await
        .context("Failed to download recording audio")?;

    tracing::info!(
        object_key = %recording.object_key,
        audio_bytes = audio.len(),
        provider = ctx.transcription.name(),
        "Transcribing recording"
    );

    let result = ctx
        .transcription
        .transcribe(
            Bytes::from(audio),
            &recording.mime_type,
            &recording.original_filename,
        )
        .await
        .context("Transcription provider failed")?;

    ctx.transcripts
        .create(recording.id, result.text, &result.segments, result.language)
        .await?;
    ctx.recordings
        .set_duration(recording.id, result.duration_seconds)
        .await?;

    let debrief_job = ctx.jobs.create_job(recording.id, JobType::Debrief).await?;

    tracing::info!(
        duration_seconds = result.duration_seconds,
        segment_count = result.segments.len(),
        debrief_job_id = %debrief_job.id,
        "Transcription complete, debrief queued"
    );

    Ok(())
}
