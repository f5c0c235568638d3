//! Input validation helpers shared by the API and services.

use validator::ValidateEmail;

/// MIME types accepted for recording uploads. Browsers produce different
/// containers depending on platform (MediaRecorder emits webm on Chrome,
/// mp4 on Safari), so both audio and audio-bearing video types are allowed.
pub const ALLOWED_RECORDING_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp4",
    "audio/wav",
    "audio/x-wav",
    "audio/webm",
    "audio/ogg",
    "audio/flac",
    "audio/m4a",
    "audio/x-m4a",
    "video/mp4",
    "video/webm",
];

/// Check whether a MIME type is accepted for recording uploads.
/// Codec parameters (e.g. "audio/webm;codecs=opus") are ignored.
pub fn is_allowed_recording_mime(mime_type: &str) -> bool {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_lowercase();
    ALLOWED_RECORDING_MIME_TYPES.contains(&base.as_str())
}

/// File extension used for the storage key of an upload with this MIME type.
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_lowercase();
    match base.as_str() {
        "audio/mpeg" => Some("mp3"),
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some("m4a"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/webm" => Some("webm"),
        "audio/ogg" => Some("ogg"),
        "audio/flac" => Some("flac"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        _ => None,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}
