//! OpenAI-backed providers for transcription, debrief generation, and chat.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use komuchi_core::models::{DebriefSection, RecordingMode, TranscriptSegment};

use crate::providers::{
    ChatProvider, ChatTurn, DebriefProvider, DebriefRequest, DebriefResult, TranscriptionProvider,
    TranscriptionResult,
};

const TRANSCRIPTION_MODEL: &str = "whisper-1";
const COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Whisper transcription over the OpenAI audio API.
pub struct OpenAiTranscription {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl Debug for OpenAiTranscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiTranscription").finish()
    }
}

impl OpenAiTranscription {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for long audio files
            .build()
            .context("Failed to create HTTP client for OpenAI transcription")?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl TranscriptionProvider for OpenAiTranscription {
    fn name(&self) -> &str {
        "openai"
    }

    async fn transcribe(
        &self,
        audio: Bytes,
        mime_type: &str,
        filename: &str,
    ) -> Result<TranscriptionResult> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = Part::bytes(audio.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .context("Invalid mime type for transcription upload")?;
        let form = Form::new()
            .part("file", file_part)
            .text("model", TRANSCRIPTION_MODEL)
            .text("response_format", "verbose_json");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to call OpenAI transcription API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "OpenAI transcription failed: {} - {}",
                status,
                error_text
            ));
        }

        let transcription: VerboseTranscription = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        let duration_seconds = transcription
            .duration
            .or_else(|| transcription.segments.last().map(|s| s.end))
            .unwrap_or(0.0);

        let segments = transcription
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
                speaker: None,
            })
            .collect::<Vec<_>>();

        tracing::info!(
            filename = %filename,
            text_length = transcription.text.len(),
            segment_count = segments.len(),
            duration_seconds,
            "Transcription completed"
        );

        Ok(TranscriptionResult {
            text: transcription.text,
            segments,
            language: transcription.language.unwrap_or_else(|| "en".to_string()),
            duration_seconds,
        })
    }
}

/// Debrief generation over the OpenAI chat completions API.
pub struct OpenAiDebrief {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl Debug for OpenAiDebrief {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiDebrief").finish()
    }
}

impl OpenAiDebrief {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client for OpenAI debrief")?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
        })
    }

    /// System prompt tailored to the recording mode.
    fn system_prompt(mode: RecordingMode) -> &'static str {
        match mode {
            RecordingMode::General => {
                "You are a thoughtful assistant that writes debriefs of recorded conversations. \
                 Summarize what was discussed, highlight decisions and open threads, and keep \
                 the author's perspective. Structure the debrief as markdown with `##` section \
                 headings (e.g. `## Summary`, `## Key Points`, `## Follow-ups`)."
            }
            RecordingMode::Sales => {
                "You are a sales coach reviewing a recorded sales conversation. Capture the \
                 prospect's needs and objections, commitments made on both sides, and concrete \
                 next steps. Structure the debrief as markdown with `##` section headings \
                 (e.g. `## Summary`, `## Objections`, `## Next Steps`)."
            }
            RecordingMode::Interview => {
                "You are a hiring assistant reviewing a recorded interview. Summarize the \
                 candidate's background and answers, note signals for and against, and list \
                 follow-up questions. Structure the debrief as markdown with `##` section \
                 headings (e.g. `## Summary`, `## Strengths`, `## Concerns`)."
            }
            RecordingMode::Meeting => {
                "You are a meeting scribe writing a debrief of a recorded meeting. Record the \
                 agenda actually covered, decisions, owners, and action items with owners. \
                 Structure the debrief as markdown with `##` section headings (e.g. \
                 `## Summary`, `## Decisions`, `## Action Items`)."
            }
        }
    }
}

#[async_trait]
impl DebriefProvider for OpenAiDebrief {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: DebriefRequest) -> Result<DebriefResult> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = json!({
            "model": COMPLETION_MODEL,
            "messages": [
                {
                    "role": "system",
                    "content": Self::system_prompt(request.mode),
                },
                {
                    "role": "user",
                    "content": format!(
                        "Title: {}\n\nTranscript:\n{}",
                        request.title, request.transcript_text
                    ),
                },
            ],
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .context("Failed to call OpenAI chat completions API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "OpenAI debrief generation failed: {} - {}",
                status,
                error_text
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse debrief response")?;

        let markdown = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenAI debrief response contained no choices"))?;

        let sections = parse_sections(&markdown);

        tracing::info!(
            title = %request.title,
            mode = %request.mode,
            markdown_length = markdown.len(),
            section_count = sections.len(),
            "Debrief generated"
        );

        Ok(DebriefResult { markdown, sections })
    }
}

/// Chat completion over the OpenAI API.
pub struct OpenAiChat {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl Debug for OpenAiChat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiChat").finish()
    }
}

impl OpenAiChat {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client for OpenAI chat")?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, messages: &[ChatTurn]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_messages = messages
            .iter()
            .map(|turn| {
                json!({
                    "role": turn.role.as_str(),
                    "content": turn.content,
                })
            })
            .collect::<Vec<_>>();

        let request_body = json!({
            "model": COMPLETION_MODEL,
            "messages": request_messages,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .context("Failed to call OpenAI chat completions API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "OpenAI chat completion failed: {} - {}",
                status,
                error_text
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenAI chat completion contained no choices"))
    }
}

/// Split generated markdown into ordered sections at `##` headings.
/// Text before the first heading is kept only in the full markdown.
pub(crate) fn parse_sections(markdown: &str) -> Vec<DebriefSection> {
    let mut sections: Vec<DebriefSection> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in markdown.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            if let Some((title, body)) = current.take() {
                sections.push(DebriefSection {
                    title,
                    content: body.join("\n").trim().to_string(),
                    order: sections.len() as i32,
                });
            }
            current = Some((heading.trim().to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((title, body)) = current {
        sections.push(DebriefSection {
            title,
            content: body.join("\n").trim().to_string(),
            order: sections.len() as i32,
        });
    }

    sections
}

// OpenAI API response types
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}
