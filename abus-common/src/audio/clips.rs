//! Clip lookup
//!
//! Clips are generated offline, one file per route, category and language:
//! - `{bus}_select_{lang}.mp3`, `{bus}_already_{lang}.mp3`,
//!   `{bus}_arrival_{lang}.mp3`
//! - `driver_{bus}_alert_{lang}.mp3`

use crate::route::RouteId;
use std::fmt;
use std::path::{Path, PathBuf};

/// Languages in playback order
pub const LANGUAGES: [&str; 2] = ["ko", "en"];

/// What an announcement is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnounceCategory {
    /// Passenger pressed a route button (call accepted)
    Select,
    /// Passenger pressed a route that is already being called
    Already,
    /// Bus detected at the stop
    Arrival,
    /// Driver terminal alert for an incoming call
    DriverAlert,
}

impl AnnounceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnounceCategory::Select => "select",
            AnnounceCategory::Already => "already",
            AnnounceCategory::Arrival => "arrival",
            AnnounceCategory::DriverAlert => "driver_alert",
        }
    }

    fn file_name(self, route: &RouteId, lang: &str) -> String {
        match self {
            AnnounceCategory::DriverAlert => format!("driver_{}_alert_{}.mp3", route, lang),
            other => format!("{}_{}_{}.mp3", route, other.as_str(), lang),
        }
    }
}

impl fmt::Display for AnnounceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory of pre-generated clips
#[derive(Debug, Clone)]
pub struct ClipLibrary {
    dir: PathBuf,
}

impl ClipLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Expected clip paths, in playback order, whether or not they exist
    pub fn expected(&self, route: &RouteId, category: AnnounceCategory) -> Vec<PathBuf> {
        LANGUAGES
            .iter()
            .map(|lang| self.dir.join(category.file_name(route, lang)))
            .collect()
    }

    /// Clip paths that exist on disk, in playback order
    pub fn resolve(&self, route: &RouteId, category: AnnounceCategory) -> Vec<PathBuf> {
        self.expected(route, category)
            .into_iter()
            .filter(|p| p.is_file())
            .collect()
    }
}
