//! Session report and waveform output

pub mod formats;
pub mod waveform;

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::audio::session::SessionSummary;
use crate::config::{OutputConfig, ReportFormat};

pub use formats::{format_json, format_text};
pub use waveform::render_waveform;

/// Writes session reports to the console and an optional file
pub struct ReportWriter {
    config: OutputConfig,
    file: Option<File>,
}

impl ReportWriter {
    /// Create a new report writer
    pub fn new(config: OutputConfig) -> io::Result<Self> {
        let file = if let Some(ref path) = config.report_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            Some(OpenOptions::new().create(true).append(true).open(path)?)
        } else {
            None
        };

        Ok(Self { config, file })
    }

    /// Write the report for a finished session, followed by the waveform when enabled
    pub fn write(&mut self, summary: &SessionSummary, audio: &[f32]) -> io::Result<()> {
        let formatted = self.format(summary);

        {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", formatted)?;
            if self.config.show_waveform {
                writeln!(
                    stdout,
                    "{}",
                    render_waveform(audio, self.config.waveform_width, self.config.waveform_height)
                )?;
            }
            stdout.flush()?;
        }

        if let Some(ref mut file) = self.file {
            writeln!(file, "{}", formatted)?;
            file.flush()?;
        }

        Ok(())
    }

    /// Format the summary according to the configured format
    pub fn format(&self, summary: &SessionSummary) -> String {
        match self.config.report_format {
            ReportFormat::Text => format_text(summary),
            ReportFormat::Json => format_json(summary),
        }
    }

    /// Get the report file path if configured
    pub fn report_path(&self) -> Option<&PathBuf> {
        self.config.report_path.as_ref()
    }
}

/// Format milliseconds as HH:MM:SS.mmm
pub fn format_timestamp(ms: i64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = ms % 1000;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00.000");
        assert_eq!(format_timestamp(1500), "00:01.500");
        assert_eq!(format_timestamp(61000), "01:01.000");
        assert_eq!(format_timestamp(3661500), "01:01:01.500");
    }

    #[test]
    fn test_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("reports").join("session.json");
        let config = OutputConfig {
            report_path: Some(report_path.clone()),
            report_format: ReportFormat::Json,
            show_waveform: false,
            ..Default::default()
        };

        let mut writer = ReportWriter::new(config).unwrap();
        let summary = SessionSummary {
            output_path: PathBuf::from("out.wav"),
            sample_rate: 16000,
            frames: 0,
            samples: 0,
            duration_secs: 0.0,
            blocks_received: 0,
            samples_discarded: 0,
            pending_samples: 0,
            elapsed_secs: 0.0,
        };
        writer.write(&summary, &[]).unwrap();

        assert_eq!(writer.report_path(), Some(&report_path));
        let content = std::fs::read_to_string(&report_path).unwrap();
        assert!(content.contains("\"frames\":0"));
    }
}
