use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use komuchi_core::models::{Job, JobType, Recording, RecordingMode, RecordingStatus};
use komuchi_core::validation::extension_for_mime;
use komuchi_core::{AppError, Page, PageParams};
use komuchi_db::RecordingRepository;
use komuchi_storage::Storage;

use crate::services::job::JobService;

/// A freshly created recording plus its one-time upload URL.
#[derive(Debug, Clone)]
pub struct NewRecording {
    pub recording: Recording,
    pub upload_url: String,
    /// Seconds until the upload URL expires.
    pub expires_in: u64,
}

/// Outcome of confirming an upload: the recording (now processing) and the
/// transcription job driving it.
#[derive(Debug, Clone)]
pub struct UploadCompletion {
    pub recording: Recording,
    pub job: Job,
}

const MAX_TITLE_CHARS: usize = 200;

/// Recording lifecycle: creation with a presigned upload URL, owner-scoped
/// reads, and the upload-confirmation transition that kicks off processing.
#[derive(Clone)]
pub struct RecordingService {
    recordings: RecordingRepository,
    jobs: JobService,
    storage: Arc<dyn Storage>,
    upload_url_expiry_secs: u64,
}

impl RecordingService {
    pub fn new(
        recordings: RecordingRepository,
        jobs: JobService,
        storage: Arc<dyn Storage>,
        upload_url_expiry_secs: u64,
    ) -> Self {
        Self {
            recordings,
            jobs,
            storage,
            upload_url_expiry_secs,
        }
    }

    /// Create a pending recording and hand back a presigned PUT URL for the
    /// client to upload the audio directly to storage.
    #[tracing::instrument(skip(self, title), fields(user_id = %user_id, mode = %mode, mime_type = %mime_type))]
    pub async fn create_recording(
        &self,
        user_id: Uuid,
        title: String,
        mode: RecordingMode,
        mime_type: String,
    ) -> Result<NewRecording, AppError> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let extension = extension_for_mime(&mime_type).ok_or_else(|| {
            AppError::InvalidFileType(format!("Unsupported mime type: {}", mime_type))
        })?;

        let recording_id = Uuid::new_v4();
        let object_key = format!("recordings/{}/{}.{}", user_id, recording_id, extension);
        let original_filename = format!("{}.{}", recording_id, extension);

        let expires_in = self.upload_url_expiry_secs;
        let upload_url = self
            .storage
            .presigned_put_url(&object_key, &mime_type, Duration::from_secs(expires_in))
            .await
            .map_err(|e| AppError::Storage(format!("Failed to presign upload URL: {}", e)))?;

        let recording = self
            .recordings
            .create(
                recording_id,
                user_id,
                title,
                mode,
                mime_type,
                object_key,
                original_filename,
            )
            .await?;

        tracing::info!(recording_id = %recording.id, "Recording created, awaiting upload");

        Ok(NewRecording {
            recording,
            upload_url,
            expires_in,
        })
    }

    /// Fetch a recording owned by this user. Other users' recordings are
    /// indistinguishable from absent ones.
    pub async fn get_recording(&self, id: Uuid, user_id: Uuid) -> Result<Recording, AppError> {
        self.recordings
            .get_for_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recording not found: {}", id)))
    }

    pub async fn list_recordings(
        &self,
        user_id: Uuid,
        params: PageParams,
        status: Option<RecordingStatus>,
    ) -> Result<Page<Recording>, AppError> {
        let (recordings, total) = self
            .recordings
            .list_for_user(user_id, params.limit, params.offset(), status)
            .await?;
        Ok(Page::new(recordings, params, total))
    }

    /// Confirm that the client finished uploading. Verifies the object is in
    /// storage, stores its size, and queues transcription. Only valid while
    /// the recording is still pending.
    #[tracing::instrument(skip(self), fields(recording_id = %id, user_id = %user_id))]
    pub async fn complete_upload(
        &self,
        id: Uuid,
        user_id: Uuid,
        client_file_size: Option<i64>,
    ) -> Result<UploadCompletion, AppError> {
        let recording = self.get_recording(id, user_id).await?;

        if recording.status != RecordingStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Recording is not pending (status: {})",
                recording.status
            )));
        }

        let exists = self
            .storage
            .exists(&recording.object_key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to check uploaded object: {}", e)))?;
        if !exists {
            return Err(AppError::Validation(format!(
                "No uploaded object found at {}",
                recording.object_key
            )));
        }

        // The size the backend reports wins over what the client claims.
        let file_size = match self.storage.content_length(&recording.object_key).await {
            Ok(length) => length as i64,
            Err(_) => client_file_size.unwrap_or(0),
        };

        self.recordings
            .complete_upload(id, file_size)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Recording is no longer pending".to_string())
            })?;

        let job = if self
            .jobs
            .has_active_job(recording.id, JobType::Transcribe)
            .await?
        {
            self.jobs
                .get_jobs_by_recording(recording.id)
                .await?
                .into_iter()
                .rev()
                .find(|job| job.job_type == JobType::Transcribe && job.status.is_active())
                .ok_or_else(|| {
                    AppError::Internal("Active transcription job disappeared".to_string())
                })?
        } else {
            self.jobs
                .create_job(recording.id, JobType::Transcribe)
                .await?
        };

        let recording = self
            .recordings
            .update_status(id, RecordingStatus::Processing)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recording not found: {}", id)))?;

        tracing::info!(
            job_id = %job.id,
            file_size,
            "Upload completed, transcription queued"
        );

        Ok(UploadCompletion { recording, job })
    }

    pub async fn update_recording_status(
        &self,
        id: Uuid,
        status: RecordingStatus,
    ) -> Result<Recording, AppError> {
        self.recordings
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recording not found: {}", id)))
    }

    /// Point a recording at a different storage object. Used by admin tooling
    /// and test fixtures.
    pub async fn set_recording_object_key(
        &self,
        id: Uuid,
        object_key: String,
    ) -> Result<Recording, AppError> {
        self.recordings
            .set_object_key(id, object_key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recording not found: {}", id)))
    }
}
