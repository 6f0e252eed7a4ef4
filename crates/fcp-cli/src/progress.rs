//! Block-level request progress display.

use fcp_client::fcp_proto::messages::SimpleProgress;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar fed by the node's block-level progress notifications.
#[derive(Clone)]
pub struct RequestProgress {
    bar: ProgressBar,
}

impl RequestProgress {
    /// Create a progress tracker for the named operation.
    ///
    /// The total is unknown until the node's first notification, so the bar
    /// starts as a spinner and switches to a bar once a total arrives.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner:.green}")
                .expect("Invalid progress spinner template"),
        );
        bar.set_message(operation.to_string());
        Self { bar }
    }

    /// Apply one progress notification.
    pub fn update(&self, progress: &SimpleProgress) {
        if let Some(total) = progress.required().or_else(|| progress.total()) {
            if self.bar.length() != Some(total) {
                self.bar.set_style(
                    ProgressStyle::default_bar()
                        .template(
                            "{msg}\n[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} blocks",
                        )
                        .expect("Invalid progress bar template")
                        .progress_chars("#>-"),
                );
                self.bar.set_length(total);
            }
        }
        if let Some(succeeded) = progress.succeeded() {
            self.bar.set_position(succeeded);
        }
    }

    /// Finish with a message.
    pub fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Abandon the progress bar (for errors).
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Format bytes in human-readable form.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}
