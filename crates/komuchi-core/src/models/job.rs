use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Kind of background work performed against a recording.
///
/// Stored and serialized in upper case ("TRANSCRIBE", "DEBRIEF").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum JobType {
    Transcribe,
    Debrief,
}

impl Display for JobType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobType::Transcribe => write!(f, "TRANSCRIBE"),
            JobType::Debrief => write!(f, "DEBRIEF"),
        }
    }
}

impl FromStr for JobType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRANSCRIBE" => Ok(JobType::Transcribe),
            "DEBRIEF" => Ok(JobType::Debrief),
            _ => Err(anyhow::anyhow!("Invalid job type: {}", s)),
        }
    }
}

/// Job lifecycle: pending -> running -> complete or failed.
/// A failed job that still has retries left goes back to pending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "complete" => Ok(JobStatus::Complete),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

impl JobStatus {
    /// Pending and running jobs count as active for dedup checks.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub error: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Job {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Job {
            id: row.get("id"),
            recording_id: row.get("recording_id"),
            job_type: row.get::<String, _>("job_type").parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse job_type: {}", e).into())
            })?,
            status: row.get("status"),
            error: row.get("error"),
            retry_count: row.get("retry_count"),
            max_retries: row.get("max_retries"),
            scheduled_at: row.get("scheduled_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

impl Job {
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    pub fn is_ready_to_run(&self) -> bool {
        self.status == JobStatus::Pending && self.scheduled_at <= Utc::now()
    }
}

/// Job as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub recording_id: Uuid,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        JobResponse {
            id: job.id,
            recording_id: job.recording_id,
            job_type: job.job_type,
            status: job.status,
            error: job.error,
            started_at: job.started_at,
            completed_at: job.completed_at,
            created_at: job.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_round_trips_upper_case() {
        assert_eq!(JobType::Transcribe.to_string(), "TRANSCRIBE");
        assert_eq!(JobType::Debrief.to_string(), "DEBRIEF");
        assert_eq!("TRANSCRIBE".parse::<JobType>().unwrap(), JobType::Transcribe);
        assert!("transcribe".parse::<JobType>().is_err());
    }

    #[test]
    fn job_type_serializes_upper_case() {
        assert_eq!(
            serde_json::to_value(JobType::Transcribe).unwrap(),
            "TRANSCRIBE"
        );
        assert_eq!(serde_json::to_value(JobType::Debrief).unwrap(), "DEBRIEF");
    }

    #[test]
    fn status_round_trips_lower_case() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Complete,
            JobStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn active_statuses() {
        assert!(JobStatus::Pending.is_active());
        assert!(JobStatus::Running.is_active());
        assert!(!JobStatus::Complete.is_active());
        assert!(!JobStatus::Failed.is_active());
    }

    #[test]
    fn retry_budget() {
        let mut job = sample_job();
        assert!(job.can_retry());
        job.retry_count = 3;
        assert!(!job.can_retry());
    }

    #[test]
    fn ready_to_run_requires_pending_and_due() {
        let mut job = sample_job();
        assert!(job.is_ready_to_run());

        job.scheduled_at = Utc::now() + chrono::Duration::seconds(60);
        assert!(!job.is_ready_to_run());

        job.scheduled_at = Utc::now();
        job.status = JobStatus::Running;
        assert!(!job.is_ready_to_run());
    }

    #[test]
    fn response_uses_type_field() {
        let response = JobResponse::from(sample_job());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "TRANSCRIBE");
        assert_eq!(json["status"], "pending");
        assert!(json.get("recordingId").is_some());
    }

    fn sample_job() -> Job {
        Job {
            id: Uuid::new_v4(),
            recording_id: Uuid::new_v4(),
            job_type: JobType::Transcribe,
            status: JobStatus::Pending,
            error: None,
            retry_count: 0,
            max_retries: 3,
            scheduled_at: Utc::now(),
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
