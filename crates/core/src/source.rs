//! Source-locator validation and helpers.
//!
//! URL-shape validation is a caller precondition: the submission
//! orchestrator forwards whatever it is given and lets the runner
//! reject it. Callers (the CLI, embedding UIs) run these checks first.

use crate::error::CoreError;

/// Hosted-platform domains the runner is known to accept directly.
const VIDEO_PLATFORM_DOMAINS: &[&str] = &["youtube.com", "youtu.be"];

/// Validate that a source locator is non-empty and http(s)-shaped.
pub fn validate_source_url(url: &str) -> Result<(), CoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Source URL must not be empty".to_string(),
        ));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(CoreError::Validation(format!(
            "Source URL must start with http:// or https://, got: '{trimmed}'"
        )));
    }
    Ok(())
}

/// Whether the locator points at a known hosted video platform.
pub fn is_video_platform_url(url: &str) -> bool {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host = without_scheme.split(['/', '?', '#']).next().unwrap_or("");
    VIDEO_PLATFORM_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Extract a filename from a URL by taking the last path segment.
///
/// Strips query parameters and fragments. Falls back to `"download"`
/// if no meaningful segment is found.
pub fn extract_filename_from_url(url: &str) -> String {
    let clean = url.split('?').next().unwrap_or(url);
    let clean = clean.split('#').next().unwrap_or(clean);

    let path = if let Some(rest) = clean
        .strip_prefix("https://")
        .or_else(|| clean.strip_prefix("http://"))
    {
        rest.find('/').map(|i| &rest[i..]).unwrap_or("")
    } else {
        clean
    };

    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- validate_source_url -------------------------------------------------

    #[test]
    fn valid_urls_accepted() {
        assert!(validate_source_url("https://youtu.be/abc123").is_ok());
        assert!(validate_source_url("http://example.com/video.mp4").is_ok());
    }

    #[test]
    fn empty_url_rejected() {
        assert!(validate_source_url("").is_err());
        assert!(validate_source_url("   ").is_err());
    }

    #[test]
    fn non_http_url_rejected() {
        assert!(validate_source_url("ftp://example.com/file").is_err());
        assert!(validate_source_url("not-a-url").is_err());
    }

    // -- is_video_platform_url -----------------------------------------------

    #[test]
    fn detects_platform_hosts() {
        assert!(is_video_platform_url("https://youtube.com/watch?v=abc"));
        assert!(is_video_platform_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_video_platform_url("https://youtu.be/abc123"));
        assert!(is_video_platform_url("https://m.youtube.com/watch?v=abc"));
    }

    #[test]
    fn plain_hosts_are_not_platforms() {
        assert!(!is_video_platform_url("https://example.com/video.mp4"));
        assert!(!is_video_platform_url("https://notyoutube.com/watch"));
    }

    // -- extract_filename_from_url -------------------------------------------

    #[test]
    fn extract_simple_filename() {
        assert_eq!(
            extract_filename_from_url("https://example.com/files/s1.mp4"),
            "s1.mp4"
        );
    }

    #[test]
    fn extract_strips_query_params() {
        assert_eq!(
            extract_filename_from_url("https://example.com/s1.mp4?token=abc"),
            "s1.mp4"
        );
    }

    #[test]
    fn extract_empty_path_returns_default() {
        assert_eq!(extract_filename_from_url("https://example.com/"), "download");
    }
}
