//! Storage key layout
//!
//! Key construction is centralized here so every backend (and every caller)
//! produces the same layout. The `output_videos` prefix doubles as the public
//! URL path segment for published analyzer outputs.

/// Prefix for raw uploads referenced by video records.
pub const RAW_PREFIX: &str = "raw";

/// Prefix for published analyzer outputs; also the public URL path segment.
pub const OUTPUT_VIDEOS_PREFIX: &str = "output_videos";

/// Key for a raw upload: `raw/{file_name}`
pub fn raw_key(file_name: &str) -> String {
    format!("{}/{}", RAW_PREFIX, file_name)
}

/// Key for a published output: `output_videos/{file_name}`
pub fn output_video_key(file_name: &str) -> String {
    format!("{}/{}", OUTPUT_VIDEOS_PREFIX, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_key_layout() {
        assert_eq!(
            raw_key("video_1700000000000_clip.mp4"),
            "raw/video_1700000000000_clip.mp4"
        );
    }

    #[test]
    fn test_output_video_key_layout() {
        assert_eq!(
            output_video_key("output_video_1700000000000_clip.mp4"),
            "output_videos/output_video_1700000000000_clip.mp4"
        );
    }
}
