//! Announcement service

use super::amp::AmpLine;
use super::clips::{AnnounceCategory, ClipLibrary};
use super::player::ClipPlayer;
use crate::route::RouteId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Speaks a route announcement
///
/// Returns once playback has finished. Missing clips and playback failures
/// are logged and otherwise ignored: an announcement is never an error for
/// the caller.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, route: &RouteId, category: AnnounceCategory);
}

/// Announcer driving the node's speaker
pub struct SpeakerAnnouncer {
    clips: ClipLibrary,
    player: Arc<dyn ClipPlayer>,
    amp: Arc<dyn AmpLine>,
    settle: Duration,
    /// Held from amplifier enable to amplifier disable
    play_lock: Mutex<()>,
}

impl SpeakerAnnouncer {
    pub fn new(
        clips: ClipLibrary,
        player: Arc<dyn ClipPlayer>,
        amp: Arc<dyn AmpLine>,
        settle: Duration,
    ) -> Self {
        Self {
            clips,
            player,
            amp,
            settle,
            play_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Announcer for SpeakerAnnouncer {
    async fn announce(&self, route: &RouteId, category: AnnounceCategory) {
        let files = self.clips.resolve(route, category);
        if files.is_empty() {
            warn!(
                bus = %route,
                category = %category,
                dir = %self.clips.dir().display(),
                "No clips found, skipping announcement"
            );
            return;
        }

        let _playing = self.play_lock.lock().await;
        let _amp = AmpSession::enable(Arc::clone(&self.amp));
        tokio::time::sleep(self.settle).await;

        info!(bus = %route, category = %category, clips = files.len(), "Announcing");
        for file in files {
            let player = Arc::clone(&self.player);
            let clip = file.clone();
            match tokio::task::spawn_blocking(move || player.play(&clip)).await {
                Ok(Ok(())) => debug!(clip = %file.display(), "Clip finished"),
                Ok(Err(e)) => warn!(clip = %file.display(), "Clip playback failed: {}", e),
                Err(e) => warn!(clip = %file.display(), "Playback task failed: {}", e),
            }
        }
    }
}

/// Amplifier enabled for the lifetime of the value
///
/// Dropping it disables the amplifier, including when the announcing future
/// is dropped mid-playback.
struct AmpSession {
    amp: Arc<dyn AmpLine>,
}

impl AmpSession {
    fn enable(amp: Arc<dyn AmpLine>) -> Self {
        if let Err(e) = amp.set_enabled(true) {
            warn!("Failed to enable amplifier: {}", e);
        }
        Self { amp }
    }
}

impl Drop for AmpSession {
    fn drop(&mut self) {
        if let Err(e) = self.amp.set_enabled(false) {
            warn!("Failed to disable amplifier: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;

    /// Records amplifier edges and clip plays into one shared log
    #[derive(Default)]
    struct Log(StdMutex<Vec<String>>);

    impl Log {
        fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct LoggingAmp(Arc<Log>);

    impl AmpLine for LoggingAmp {
        fn set_enabled(&self, enabled: bool) -> Result<()> {
            self.0.push(if enabled { "amp on" } else { "amp off" }.to_string());
            Ok(())
        }
    }

    struct LoggingPlayer {
        log: Arc<Log>,
        delay: Duration,
        fail: bool,
    }

    impl ClipPlayer for LoggingPlayer {
        fn play(&self, path: &Path) -> Result<()> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.log.push(format!("start {}", name));
            std::thread::sleep(self.delay);
            self.log.push(format!("end {}", name));
            if self.fail {
                Err(crate::Error::Audio("decoder exploded".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn announcer(dir: &Path, log: &Arc<Log>, fail: bool) -> SpeakerAnnouncer {
        SpeakerAnnouncer::new(
            ClipLibrary::new(dir),
            Arc::new(LoggingPlayer {
                log: Arc::clone(log),
                delay: Duration::from_millis(30),
                fail,
            }),
            Arc::new(LoggingAmp(Arc::clone(log))),
            Duration::from_millis(1),
        )
    }

    fn write_clips(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"clip").unwrap();
        }
    }

    #[tokio::test]
    async fn test_plays_korean_then_english_inside_amp_window() {
        let dir = tempfile::tempdir().unwrap();
        write_clips(dir.path(), &["03_arrival_ko.mp3", "03_arrival_en.mp3"]);
        let log = Arc::new(Log::default());

        announcer(dir.path(), &log, false)
            .announce(&RouteId::parse("03").unwrap(), AnnounceCategory::Arrival)
            .await;

        assert_eq!(
            log.entries(),
            vec![
                "amp on",
                "start 03_arrival_ko.mp3",
                "end 03_arrival_ko.mp3",
                "start 03_arrival_en.mp3",
                "end 03_arrival_en.mp3",
                "amp off",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_clips_leave_amp_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(Log::default());

        announcer(dir.path(), &log, false)
            .announce(&RouteId::parse("47").unwrap(), AnnounceCategory::Select)
            .await;

        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_failed_playback_still_disables_amp() {
        let dir = tempfile::tempdir().unwrap();
        write_clips(dir.path(), &["driver_77_alert_ko.mp3"]);
        let log = Arc::new(Log::default());

        announcer(dir.path(), &log, true)
            .announce(&RouteId::parse("77").unwrap(), AnnounceCategory::DriverAlert)
            .await;

        assert_eq!(log.entries().last().map(String::as_str), Some("amp off"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_announcements_never_overlap() {
        let dir = tempfile::tempdir().unwrap();
        write_clips(
            dir.path(),
            &["03_arrival_ko.mp3", "47_arrival_ko.mp3", "77_arrival_ko.mp3"],
        );
        let log = Arc::new(Log::default());
        let speaker = Arc::new(announcer(dir.path(), &log, false));

        let mut handles = Vec::new();
        for bus in ["03", "47", "77"] {
            let speaker = Arc::clone(&speaker);
            handles.push(tokio::spawn(async move {
                speaker
                    .announce(&RouteId::parse(bus).unwrap(), AnnounceCategory::Arrival)
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every playback is a closed amp on / start / end / amp off block
        let entries = log.entries();
        assert_eq!(entries.len(), 12);
        for block in entries.chunks(4) {
            assert_eq!(block[0], "amp on");
            assert!(block[1].starts_with("start "));
            assert_eq!(block[2], block[1].replace("start", "end"));
            assert_eq!(block[3], "amp off");
        }
    }
}
