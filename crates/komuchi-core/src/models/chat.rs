use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl Display for ChatRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            _ => Err(anyhow::anyhow!("Invalid chat role: {}", s)),
        }
    }
}

/// A conversation scope: either one per user per calendar day, or one per
/// recording. Exactly one of `session_date` / `recording_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_date: Option<NaiveDate>,
    pub recording_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for ChatSession {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(ChatSession {
            id: row.get("id"),
            user_id: row.get("user_id"),
            session_date: row.get("session_date"),
            recording_id: row.get("recording_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

impl ChatSession {
    pub fn is_day_session(&self) -> bool {
        self.session_date.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for ChatMessage {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(ChatMessage {
            id: row.get("id"),
            session_id: row.get("session_id"),
            role: row.get("role"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        })
    }
}

/// Chat message as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(message: ChatMessage) -> Self {
        ChatMessageResponse {
            id: message.id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

/// Response for `GET /api/chat/session`. Flat, no envelope; `sessionDate` and
/// `recordingId` are always present and null for the scope not in use.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionResponse {
    pub session_id: Uuid,
    pub session_date: Option<NaiveDate>,
    pub recording_id: Option<Uuid>,
    pub messages: Vec<ChatMessageResponse>,
}

impl ChatSessionResponse {
    pub fn new(session: ChatSession, messages: Vec<ChatMessage>) -> Self {
        ChatSessionResponse {
            session_id: session.id,
            session_date: session.session_date,
            recording_id: session.recording_id,
            messages: messages
                .into_iter()
                .map(ChatMessageResponse::from)
                .collect(),
        }
    }
}

/// Response for `POST /api/chat/opener`. `message` is present only when an
/// opener was generated by this call.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenerResponse {
    pub already_has_opener: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessageResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        assert_eq!("user".parse::<ChatRole>().unwrap(), ChatRole::User);
        assert_eq!(
            "assistant".parse::<ChatRole>().unwrap(),
            ChatRole::Assistant
        );
        assert!("system".parse::<ChatRole>().is_err());
        assert_eq!(ChatRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn day_session_response_shape() {
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_date: Some(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()),
            recording_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(session.is_day_session());

        let response = ChatSessionResponse::new(session, vec![]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sessionDate"], "2025-06-15");
        assert_eq!(json["recordingId"], serde_json::Value::Null);
        assert_eq!(json["messages"], serde_json::json!([]));
        assert!(json.get("sessionId").is_some());
    }

    #[test]
    fn recording_session_response_shape() {
        let recording_id = Uuid::new_v4();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_date: None,
            recording_id: Some(recording_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!session.is_day_session());

        let message = ChatMessage {
            id: Uuid::new_v4(),
            session_id: session.id,
            role: ChatRole::Assistant,
            content: "Hello".to_string(),
            created_at: Utc::now(),
        };
        let response = ChatSessionResponse::new(session, vec![message]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sessionDate"], serde_json::Value::Null);
        assert_eq!(json["recordingId"], recording_id.to_string());
        assert_eq!(json["messages"][0]["role"], "assistant");
        assert!(json["messages"][0].get("createdAt").is_some());
    }

    #[test]
    fn opener_response_omits_message_when_present_already() {
        let response = OpenerResponse {
            already_has_opener: true,
            message: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["alreadyHasOpener"], true);
        assert!(json.get("message").is_none());
    }
}
