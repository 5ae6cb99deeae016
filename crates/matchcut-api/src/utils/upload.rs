//! Multipart upload helpers: field extraction, size limits, file name hygiene.

use axum::body::Bytes;
use axum::extract::Multipart;
use chrono::Utc;
use matchcut_core::AppError;

const VIDEO_FIELD: &str = "video";
const MAX_FILE_NAME_LEN: usize = 255;

/// A single file pulled out of a multipart request body.
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Extract the uploaded video from a multipart body.
///
/// The request must carry exactly one field named `video`; other fields are
/// ignored, and a second `video` field is rejected.
pub async fn extract_video_file(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("Invalid multipart payload: {}", err)))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }
        if file.is_some() {
            return Err(AppError::BadRequest(
                "Upload must contain exactly one field named 'video'".to_string(),
            ));
        }

        let file_name = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("Failed to read upload: {}", err)))?;

        file = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    file.ok_or_else(|| {
        AppError::BadRequest("Upload must contain exactly one field named 'video'".to_string())
    })
}

pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), AppError> {
    if size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "Video exceeds the maximum upload size of {} MB",
            max_size / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Reduce a client-supplied file name to something safe to put on disk.
///
/// Traversal sequences are rejected outright before any cleanup, so
/// `foo/../bar` fails instead of being silently collapsed to its basename.
pub fn sanitize_filename(file_name: &str) -> Result<String, AppError> {
    if file_name.contains("..") {
        return Err(AppError::InvalidInput(format!(
            "File name contains directory traversal: {}",
            file_name
        )));
    }

    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().count() > MAX_FILE_NAME_LEN {
        sanitized = sanitized.chars().take(MAX_FILE_NAME_LEN).collect();
    }

    if sanitized.chars().count() < 3 {
        sanitized = "file".to_string();
    }

    Ok(sanitized)
}

/// Staged name for an uploaded video: a millisecond timestamp keeps repeated
/// uploads of the same file distinct.
pub fn staged_file_name(sanitized: &str) -> String {
    format!("video_{}_{}", Utc::now().timestamp_millis(), sanitized)
}

/// Validate a staged file name received back from a client before using it as
/// a path component.
pub fn validate_staged_name(file_name: &str) -> Result<(), AppError> {
    if file_name.is_empty() {
        return Err(AppError::InvalidInput("File name cannot be empty".to_string()));
    }
    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        return Err(AppError::InvalidInput(format!(
            "Invalid video file name: {}",
            file_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_ordinary_names() {
        assert_eq!(sanitize_filename("clip.mp4").unwrap(), "clip.mp4");
        assert_eq!(
            sanitize_filename("my-holiday_video.2024.mov").unwrap(),
            "my-holiday_video.2024.mov"
        );
    }

    #[test]
    fn test_sanitize_replaces_special_characters() {
        assert_eq!(
            sanitize_filename("my video (1).mp4").unwrap(),
            "my_video__1_.mp4"
        );
        assert_eq!(sanitize_filename("a;b|c&d.mp4").unwrap(), "a_b_c_d.mp4");
    }

    #[test]
    fn test_sanitize_takes_basename() {
        assert_eq!(sanitize_filename("uploads/clip.mp4").unwrap(), "clip.mp4");
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\clip.mp4").unwrap(),
            "clip.mp4"
        );
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize_filename("../../etc/passwd").is_err());
        assert!(sanitize_filename("foo/../bar").is_err());
        assert!(sanitize_filename("..").is_err());
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(400) + ".mp4";
        let sanitized = sanitize_filename(&long).unwrap();
        assert_eq!(sanitized.chars().count(), 255);
    }

    #[test]
    fn test_sanitize_pads_degenerate_names() {
        assert_eq!(sanitize_filename("").unwrap(), "file");
        assert_eq!(sanitize_filename("??").unwrap(), "file");
    }

    #[test]
    fn test_staged_file_name_shape() {
        let staged = staged_file_name("clip.mp4");
        assert!(staged.starts_with("video_"));
        assert!(staged.ends_with("_clip.mp4"));
        let millis: &str = &staged["video_".len()..staged.len() - "_clip.mp4".len()];
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_validate_file_size_boundary() {
        assert!(validate_file_size(1024, 1024).is_ok());
        let err = validate_file_size(1025, 1024).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_validate_staged_name() {
        assert!(validate_staged_name("video_1700000000000_clip.mp4").is_ok());
        assert!(validate_staged_name("").is_err());
        assert!(validate_staged_name("video_1_..mp4").is_err());
        assert!(validate_staged_name("a/b.mp4").is_err());
        assert!(validate_staged_name("a\\b.mp4").is_err());
    }
}
