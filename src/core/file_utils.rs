//! Attachment helpers
//!
//! Downloading user attachments with a size cap, plus the small filename and
//! size utilities the commands need.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Capped text download and extension checks for script attachments

use anyhow::{anyhow, Result};
use log::debug;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Largest attachment accepted for script hosting (1 MiB)
pub const SCRIPT_ATTACHMENT_LIMIT: u64 = 1024 * 1024;

/// Default timeout for attachment downloads in seconds
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Filename utilities
// ============================================================================

/// Whether `filename` ends with `.{ext}`.
///
/// The comparison is case-sensitive so `notes.TXT` does not count as `txt`.
pub fn has_extension(filename: &str, ext: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(stem, found)| !stem.is_empty() && found == ext)
        .unwrap_or(false)
}

// ============================================================================
// File size utilities
// ============================================================================

/// Format a byte count as a human-readable string (e.g., "1.5 MB", "340 KB").
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

// ============================================================================
// Download
// ============================================================================

fn too_large(size: u64, max_bytes: u64) -> anyhow::Error {
    anyhow!(
        "attachment is {} but the cap is {}",
        format_file_size(size),
        format_file_size(max_bytes)
    )
}

/// Fetch an attachment body, refusing anything over `max_bytes`.
///
/// The advertised length is checked before the body is read and the real
/// length again afterwards, since the CDN may omit the header.
pub async fn download_bytes(url: &str, max_bytes: u64, timeout_secs: u64) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            anyhow!("attachment download timed out after {timeout_secs}s")
        } else {
            anyhow!("attachment download failed: {e}")
        }
    })?;

    let response = response
        .error_for_status()
        .map_err(|e| anyhow!("attachment host refused the download: {e}"))?;

    match response.content_length() {
        Some(advertised) if advertised > max_bytes => return Err(too_large(advertised, max_bytes)),
        _ => {}
    }

    let body = response.bytes().await?;
    let size = body.len() as u64;
    if size > max_bytes {
        return Err(too_large(size, max_bytes));
    }

    debug!("Downloaded {} from {url}", format_file_size(size));
    Ok(body.to_vec())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension_matches() {
        assert!(has_extension("script.txt", "txt"));
        assert!(has_extension("my.script.txt", "txt"));
    }

    #[test]
    fn test_has_extension_rejects_other_types() {
        assert!(!has_extension("script.lua", "txt"));
        assert!(!has_extension("script.txt.png", "txt"));
        assert!(!has_extension("txt", "txt"));
        assert!(!has_extension(".txt", "txt"));
        assert!(!has_extension("script.TXT", "txt"));
    }

    #[test]
    fn test_format_file_size_bytes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
    }

    #[test]
    fn test_format_file_size_kb() {
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
    }

    #[test]
    fn test_format_file_size_mb() {
        assert_eq!(format_file_size(SCRIPT_ATTACHMENT_LIMIT), "1.0 MB");
    }

    #[test]
    fn test_format_file_size_gb() {
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
