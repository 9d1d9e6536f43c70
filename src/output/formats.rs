//! Session report formats

use crate::audio::session::SessionSummary;
use super::format_timestamp;

/// Format as plain text
pub fn format_text(summary: &SessionSummary) -> String {
    let duration_ms = (summary.duration_secs * 1000.0).round() as i64;
    let elapsed_ms = (summary.elapsed_secs * 1000.0).round() as i64;

    let mut out = format!(
        "Saved {} ({} frames, {} samples, {} @ {} Hz)\n",
        summary.output_path.display(),
        summary.frames,
        summary.samples,
        format_timestamp(duration_ms),
        summary.sample_rate
    );
    out.push_str(&format!(
        "Blocks received: {}, samples discarded: {}, pending: {}, session time: {}",
        summary.blocks_received,
        summary.samples_discarded,
        summary.pending_samples,
        format_timestamp(elapsed_ms)
    ));
    out
}

/// Format as JSON
pub fn format_json(summary: &SessionSummary) -> String {
    serde_json::to_string(summary).unwrap_or_else(|_| {
        format!("{{\"output_path\": \"{}\"}}", summary.output_path.display())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_summary() -> SessionSummary {
        SessionSummary {
            output_path: PathBuf::from("enhanced_realtime.wav"),
            sample_rate: 16000,
            frames: 3,
            samples: 6144,
            duration_secs: 0.384,
            blocks_received: 7,
            samples_discarded: 0,
            pending_samples: 1024,
            elapsed_secs: 1.5,
        }
    }

    #[test]
    fn test_format_text() {
        let formatted = format_text(&make_summary());
        assert!(formatted.contains("enhanced_realtime.wav"));
        assert!(formatted.contains("3 frames"));
        assert!(formatted.contains("00:00.384"));
        assert!(formatted.contains("pending: 1024"));
    }

    #[test]
    fn test_format_json() {
        let formatted = format_json(&make_summary());
        assert!(formatted.contains("\"frames\":3"));
        assert!(formatted.contains("\"sample_rate\":16000"));
        assert!(formatted.contains("\"output_path\":\"enhanced_realtime.wav\""));
    }
}
