//! End-to-end pipeline test: create a recording over HTTP, stage and complete
//! the upload, run the transcription and debrief jobs, then chat about the
//! result.
//!
//! Jobs are claimed and dispatched directly through the handler context
//! instead of running the polling queue, so the pipeline stays deterministic.

mod helpers;

use std::sync::Arc;

use helpers::factories::create_test_user;
use helpers::setup_test_app;
use komuchi_ai::{MockDebrief, MockTranscription};
use komuchi_core::models::JobStatus;
use komuchi_db::{
    DebriefRepository, JobRepository, RecordingRepository, TranscriptRepository,
};
use komuchi_services::JobService;
use komuchi_worker::{JobContext, JobHandlerContext};
use serde_json::json;

#[tokio::test]
async fn recording_flows_from_upload_to_debrief() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let user_id = user.id.to_string();

    // Create the recording and stage the audio where the upload URL points.
    let create = app
        .client()
        .post("/api/recordings")
        .add_header("x-user-id", user_id.as_str())
        .json(&json!({
            "title": "Friday retro",
            "mode": "meeting",
            "mimeType": "audio/mpeg"
        }))
        .await;
    assert_eq!(create.status_code(), 201);
    let created: serde_json::Value = create.json();
    let recording_id = created["data"]["recordingId"].as_str().unwrap().to_string();
    let object_key = created["data"]["objectKey"].as_str().unwrap().to_string();

    app.storage
        .upload(&object_key, vec![1u8; 4096], "audio/mpeg")
        .await
        .expect("Failed to stage audio");

    // Completing the upload flips the recording to processing and queues the
    // transcription job.
    let complete = app
        .client()
        .post(&format!("/api/recordings/{}/complete-upload", recording_id))
        .add_header("x-user-id", user_id.as_str())
        .json(&json!({ "fileSize": 4096 }))
        .await;
    assert_eq!(complete.status_code(), 200);
    let completion: serde_json::Value = complete.json();
    assert_eq!(completion["data"]["status"], "processing");

    // Drain the queue through the same dispatch path the worker pool takes.
    // The transcribe job queues a debrief job, so two dispatches finish the
    // pipeline.
    let jobs_repo = JobRepository::new(app.pool.clone());
    let context = Arc::new(JobContext {
        recordings: RecordingRepository::new(app.pool.clone()),
        transcripts: TranscriptRepository::new(app.pool.clone()),
        debriefs: DebriefRepository::new(app.pool.clone()),
        jobs: JobService::new(jobs_repo.clone(), 3),
        storage: app.storage.clone(),
        transcription: Arc::new(MockTranscription),
        debrief: Arc::new(MockDebrief),
    });

    let mut dispatched = 0;
    while let Some(job) = jobs_repo.claim_next().await.expect("Failed to claim job") {
        context
            .clone()
            .dispatch_job(&job)
            .await
            .expect("Job handler failed");
        jobs_repo
            .update_status(job.id, JobStatus::Complete)
            .await
            .expect("Failed to record job completion");
        dispatched += 1;
        assert!(dispatched <= 4, "Job chain did not converge");
    }
    assert_eq!(dispatched, 2, "expected a transcribe and a debrief job");

    // The recording is complete with the transcript-derived duration.
    let detail = app
        .client()
        .get(&format!("/api/recordings/{}", recording_id))
        .add_header("x-user-id", user_id.as_str())
        .await;
    assert_eq!(detail.status_code(), 200);
    let body: serde_json::Value = detail.json();
    assert_eq!(body["data"]["status"], "complete");
    assert_eq!(body["data"]["durationSeconds"], 5.0);

    // Transcript and debrief rows exist for the recording.
    let recording_uuid = recording_id.parse().expect("invalid recording id");
    let transcript = TranscriptRepository::new(app.pool.clone())
        .get_by_recording(recording_uuid)
        .await
        .expect("Failed to load transcript")
        .expect("transcript should exist");
    assert!(transcript.text.starts_with("Mock transcript:"));

    let debrief = DebriefRepository::new(app.pool.clone())
        .get_by_recording(recording_uuid)
        .await
        .expect("Failed to load debrief")
        .expect("debrief should exist");
    assert!(debrief.markdown.starts_with("## Summary"));

    // A chat opener grounded in the finished recording works end to end.
    let opener = app
        .client()
        .post("/api/chat/opener")
        .add_header("x-user-id", user_id.as_str())
        .json(&json!({ "recordingId": recording_id }))
        .await;
    assert_eq!(opener.status_code(), 200);
    let opener_body: serde_json::Value = opener.json();
    assert_eq!(opener_body["alreadyHasOpener"], false);
    assert_eq!(opener_body["message"]["role"], "assistant");
    assert_eq!(opener_body["message"]["content"], "Mock AI response");
}
