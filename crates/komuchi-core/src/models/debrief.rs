use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One section of a debrief document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebriefSection {
    pub title: String,
    pub content: String,
    /// Position within the document, starting at 0.
    pub order: i32,
}

/// AI-generated summary of a recording, derived from its transcript.
/// One per recording; regeneration replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debrief {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub markdown: String,
    pub sections: Vec<DebriefSection>,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Debrief {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let sections = serde_json::from_value(row.get::<serde_json::Value, _>("sections"))
            .map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse debrief sections: {}", e).into())
            })?;
        Ok(Debrief {
            id: row.get("id"),
            recording_id: row.get("recording_id"),
            markdown: row.get("markdown"),
            sections,
            created_at: row.get("created_at"),
        })
    }
}

/// Debrief as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebriefResponse {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub markdown: String,
    pub sections: Vec<DebriefSection>,
    pub created_at: DateTime<Utc>,
}

impl From<Debrief> for DebriefResponse {
    fn from(debrief: Debrief) -> Self {
        DebriefResponse {
            id: debrief.id,
            recording_id: debrief.recording_id,
            markdown: debrief.markdown,
            sections: debrief.sections,
            created_at: debrief.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_json_shape() {
        let section = DebriefSection {
            title: "Summary".to_string(),
            content: "Test summary".to_string(),
            order: 0,
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["title"], "Summary");
        assert_eq!(json["content"], "Test summary");
        assert_eq!(json["order"], 0);
    }

    #[test]
    fn sections_keep_order_field() {
        let sections: Vec<DebriefSection> = serde_json::from_value(serde_json::json!([
            {"title": "Summary", "content": "a", "order": 0},
            {"title": "Action Items", "content": "b", "order": 1}
        ]))
        .unwrap();
        assert_eq!(sections[0].order, 0);
        assert_eq!(sections[1].order, 1);
    }
}
