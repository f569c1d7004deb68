//! Terminal presentation of [`UpdateEvent`]s.
//!
//! The renderer runs on its own task and is the only owner of the progress
//! bars; the orchestrator just sends events.

use colored::Colorize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::update::{ExtractionProgress, TransferProgress, UpdateEvent, UpdatePhase};
use crate::utils::progress::{ProgressBar, format_eta, format_speed};

#[derive(Default)]
pub struct ProgressRenderer {
    download: Option<ProgressBar>,
    extract: Option<ProgressBar>,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `events` on a background task until every sender is dropped.
    pub fn spawn(mut self, mut events: UnboundedReceiver<UpdateEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.handle(event);
            }
            self.finish();
        })
    }

    pub fn handle(&mut self, event: UpdateEvent) {
        match event {
            UpdateEvent::Phase(phase) => self.on_phase(phase),
            UpdateEvent::Download(progress) => self.on_download(&progress),
            UpdateEvent::Extract(progress) => self.on_extract(progress),
            UpdateEvent::Status(message) => println!("{}", message.cyan()),
        }
    }

    fn on_phase(&mut self, phase: UpdatePhase) {
        match phase {
            UpdatePhase::Extracting => {
                if let Some(bar) = self.download.take() {
                    bar.finish_with_message("done");
                }
            }
            UpdatePhase::Finalizing => {
                if let Some(bar) = self.extract.take() {
                    bar.finish_with_message("done");
                }
            }
            UpdatePhase::Failed | UpdatePhase::Idle | UpdatePhase::Succeeded => self.finish(),
            _ => {}
        }
    }

    fn on_download(&mut self, progress: &TransferProgress) {
        let bar = self.download.get_or_insert_with(|| {
            let bar = ProgressBar::new_bytes(progress.bytes_total);
            bar.set_prefix("Downloading");
            bar
        });
        bar.set_position(progress.bytes_done);
        bar.set_message(download_message(progress));
    }

    fn on_extract(&mut self, progress: ExtractionProgress) {
        let bar = self.extract.get_or_insert_with(|| {
            let bar = ProgressBar::new(progress.total as u64);
            bar.set_prefix("Extracting");
            bar
        });
        bar.set_position(progress.processed as u64);
    }

    fn finish(&mut self) {
        if let Some(bar) = self.download.take() {
            bar.finish_and_clear();
        }
        if let Some(bar) = self.extract.take() {
            bar.finish_and_clear();
        }
    }
}

/// Speed and remaining time shown next to the download bar.
pub fn download_message(progress: &TransferProgress) -> String {
    format!("{}  ETA {}", format_speed(progress.throughput()), format_eta(progress.eta()))
}
