//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::path::PathBuf;
use std::time::Instant;

use crate::workflow::{Section, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// Still drawn (faded) until the deadline, hidden afterwards.
    Leaving { until: Instant },
    Hidden,
}

/// Visibility of the three workflow sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections {
    upload: Visibility,
    processing: Visibility,
    results: Visibility,
}

impl Sections {
    /// Idle layout: only the upload section is on screen.
    pub fn initial() -> Self {
        Self {
            upload: Visibility::Visible,
            processing: Visibility::Hidden,
            results: Visibility::Hidden,
        }
    }

    fn slot(&mut self, section: Section) -> &mut Visibility {
        match section {
            Section::Upload => &mut self.upload,
            Section::Processing => &mut self.processing,
            Section::Results => &mut self.results,
        }
    }

    pub fn get(&self, section: Section) -> Visibility {
        match section {
            Section::Upload => self.upload,
            Section::Processing => self.processing,
            Section::Results => self.results,
        }
    }

    pub fn show(&mut self, section: Section) {
        *self.slot(section) = Visibility::Visible;
    }

    pub fn hide(&mut self, section: Section) {
        *self.slot(section) = Visibility::Hidden;
    }

    pub fn hide_after(&mut self, section: Section, until: Instant) {
        let slot = self.slot(section);
        if *slot != Visibility::Hidden {
            *slot = Visibility::Leaving { until };
        }
    }

    pub fn is_shown(&self, section: Section, now: Instant) -> bool {
        match self.get(section) {
            Visibility::Visible => true,
            Visibility::Leaving { until } => now < until,
            Visibility::Hidden => false,
        }
    }

    pub fn is_leaving(&self, section: Section, now: Instant) -> bool {
        matches!(self.get(section), Visibility::Leaving { until } if now < until)
    }

    /// Finish exit transitions whose deadline has passed.  Returns true if
    /// anything changed.
    pub fn settle(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for section in [Section::Upload, Section::Processing, Section::Results] {
            let slot = self.slot(section);
            if let Visibility::Leaving { until } = *slot {
                if now >= until {
                    *slot = Visibility::Hidden;
                    changed = true;
                }
            }
        }
        changed
    }
}

impl Default for Sections {
    fn default() -> Self {
        Self::initial()
    }
}

/// Progress of the processed-artifact download.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadStatus {
    NotDownloaded,
    /// Bytes received so far and the announced total, if any.
    Downloading { received: u64, total: Option<u64> },
    Downloaded(PathBuf),
    Failed(String),
}

impl DownloadStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Downloading { .. })
    }
}

pub struct AppState {
    pub workflow: WorkflowState,
    pub sections: Sections,
    pub server_url: String,
    pub downloads_dir: PathBuf,
    /// When the in-flight upload was dispatched.
    pub upload_started: Option<Instant>,
    pub download: DownloadStatus,
    /// Recent log lines, newest last.
    pub logs: Vec<String>,
}

impl AppState {
    pub fn new(server_url: String, downloads_dir: PathBuf) -> Self {
        Self {
            workflow: WorkflowState::Idle,
            sections: Sections::initial(),
            server_url,
            downloads_dir,
            upload_started: None,
            download: DownloadStatus::NotDownloaded,
            logs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initial_layout_is_idle() {
        let s = Sections::initial();
        let now = Instant::now();
        assert!(s.is_shown(Section::Upload, now));
        assert!(!s.is_shown(Section::Processing, now));
        assert!(!s.is_shown(Section::Results, now));
    }

    #[test]
    fn test_exit_transition_expires() {
        let now = Instant::now();
        let mut s = Sections::initial();
        s.hide_after(Section::Upload, now + Duration::from_millis(300));
        assert!(s.is_leaving(Section::Upload, now));
        assert!(s.is_shown(Section::Upload, now + Duration::from_millis(299)));
        assert!(!s.settle(now + Duration::from_millis(100)));
        assert!(s.settle(now + Duration::from_millis(300)));
        assert_eq!(s.get(Section::Upload), Visibility::Hidden);
    }

    #[test]
    fn test_hide_after_on_hidden_section_stays_hidden() {
        let now = Instant::now();
        let mut s = Sections::initial();
        s.hide_after(Section::Results, now + Duration::from_secs(1));
        assert_eq!(s.get(Section::Results), Visibility::Hidden);
    }

    #[test]
    fn test_show_cancels_pending_exit() {
        let now = Instant::now();
        let mut s = Sections::initial();
        s.hide_after(Section::Upload, now + Duration::from_millis(300));
        s.show(Section::Upload);
        assert!(!s.settle(now + Duration::from_secs(1)));
        assert!(s.is_shown(Section::Upload, now + Duration::from_secs(1)));
    }
}
