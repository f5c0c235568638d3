//! Row factories for seeding test data directly through the repositories.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use komuchi_core::models::{
    ChatMessage, ChatRole, ChatSession, Debrief, DebriefSection, Recording, RecordingMode,
    RecordingStatus, Transcript, TranscriptSegment, User,
};
use komuchi_db::{
    ChatRepository, DebriefRepository, RecordingRepository, TranscriptRepository, UserRepository,
};

pub async fn create_test_user(pool: &PgPool) -> User {
    UserRepository::new(pool.clone())
        .create(format!("test-{}@test.local", Uuid::new_v4()))
        .await
        .expect("Failed to create test user")
}

#[derive(Default)]
pub struct RecordingOverrides {
    pub title: Option<String>,
    pub mode: Option<RecordingMode>,
    pub status: Option<RecordingStatus>,
    pub object_key: Option<String>,
}

pub async fn create_test_recording(
    pool: &PgPool,
    user_id: Uuid,
    overrides: RecordingOverrides,
) -> Recording {
    let repo = RecordingRepository::new(pool.clone());
    let id = Uuid::new_v4();
    let object_key = overrides
        .object_key
        .unwrap_or_else(|| format!("recordings/{}/test.mp3", user_id));

    let recording = repo
        .create(
            id,
            user_id,
            overrides
                .title
                .unwrap_or_else(|| "Test Recording".to_string()),
            overrides.mode.unwrap_or(RecordingMode::General),
            "audio/mpeg".to_string(),
            object_key,
            "test.mp3".to_string(),
        )
        .await
        .expect("Failed to create test recording");

    match overrides.status {
        None | Some(RecordingStatus::Pending) => recording,
        Some(status) => repo
            .update_status(id, status)
            .await
            .expect("Failed to set recording status")
            .expect("Recording vanished while setting status"),
    }
}

pub async fn create_test_transcript(pool: &PgPool, recording_id: Uuid) -> Transcript {
    let segments = vec![TranscriptSegment {
        start: 0.0,
        end: 5.0,
        text: "Hello world".to_string(),
        speaker: Some("speaker_0".to_string()),
    }];
    TranscriptRepository::new(pool.clone())
        .create(
            recording_id,
            "Test transcript text".to_string(),
            &segments,
            "en".to_string(),
        )
        .await
        .expect("Failed to create test transcript")
}

pub async fn create_test_debrief(pool: &PgPool, recording_id: Uuid) -> Debrief {
    let sections = vec![DebriefSection {
        title: "Summary".to_string(),
        content: "Test summary".to_string(),
        order: 0,
    }];
    DebriefRepository::new(pool.clone())
        .create(
            recording_id,
            "# Test Debrief\n\nTest content".to_string(),
            &sections,
        )
        .await
        .expect("Failed to create test debrief")
}

pub async fn create_test_day_session(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> ChatSession {
    ChatRepository::new(pool.clone())
        .get_or_create_day_session(user_id, date)
        .await
        .expect("Failed to create chat session")
}

pub async fn add_test_message(
    pool: &PgPool,
    session_id: Uuid,
    role: ChatRole,
    content: &str,
) -> ChatMessage {
    ChatRepository::new(pool.clone())
        .add_message(session_id, role, content.to_string())
        .await
        .expect("Failed to add chat message")
}
