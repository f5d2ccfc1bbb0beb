//! # Debounced Persistence
//!
//! Writes the in-memory database to `library.db` once writes go quiet.
//!
//! ## Timeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  t=0    addBook    ──► Schedule  deadline = 300ms                       │
//! │  t=120  issueBook  ──► Schedule  deadline = 420ms   (rescheduled)       │
//! │  t=200  returnBook ──► Schedule  deadline = 500ms   (rescheduled)       │
//! │  t=500  ─────────────────────────► persist()  (one write for three)     │
//! │                                                                         │
//! │  FlushNow  ──► persist now if a write is pending, reply when done       │
//! │  Shutdown  ──► same, then the worker exits                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed save keeps the writes pending, so the next flush or shutdown
//! tries again instead of reporting success.
//!
//! The worker takes the store lock for the whole export and file write, so a
//! snapshot is always a state between two commands.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use super::db::DbState;
use libris_db::DbResult;

/// Messages for the save worker.
#[derive(Debug)]
enum SaveCommand {
    /// A write happened; (re)start the quiet period.
    Schedule,
    /// Persist now if anything is pending.
    FlushNow(oneshot::Sender<DbResult<()>>),
    /// Persist anything pending and stop.
    Shutdown(oneshot::Sender<DbResult<()>>),
}

/// Handle for talking to the save worker.
#[derive(Debug, Clone)]
pub struct SaveHandle {
    cmd_tx: mpsc::UnboundedSender<SaveCommand>,
    saves: Arc<AtomicU64>,
}

impl SaveHandle {
    /// Marks the database dirty. Never blocks.
    pub fn schedule(&self) {
        if self.cmd_tx.send(SaveCommand::Schedule).is_err() {
            warn!("Save worker stopped; write will not be persisted");
        }
    }

    /// Persists pending writes and waits for the result.
    pub async fn flush_now(&self) -> DbResult<()> {
        self.request(SaveCommand::FlushNow).await
    }

    /// Persists pending writes and stops the worker.
    ///
    /// Calling it again after the worker has stopped is a no-op.
    pub async fn shutdown(&self) -> DbResult<()> {
        self.request(SaveCommand::Shutdown).await
    }

    /// Number of snapshots written so far.
    pub fn saves_completed(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<DbResult<()>>) -> SaveCommand,
    ) -> DbResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.cmd_tx.send(make(reply_tx)).is_err() {
            debug!("Save worker already stopped");
            return Ok(());
        }
        reply_rx.await.unwrap_or(Ok(()))
    }
}

/// The background save worker.
pub struct SaveScheduler {
    db: Arc<DbState>,
    debounce: Duration,
    saves: Arc<AtomicU64>,
}

impl SaveScheduler {
    pub fn new(db: Arc<DbState>, debounce: Duration) -> Self {
        SaveScheduler {
            db,
            debounce,
            saves: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawns the worker and returns a handle.
    pub fn start(self) -> SaveHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let saves = self.saves.clone();

        tokio::spawn(async move {
            self.run(cmd_rx).await;
        });

        SaveHandle { cmd_tx, saves }
    }

    /// Main worker loop.
    async fn run(self, mut cmd_rx: mpsc::UnboundedReceiver<SaveCommand>) {
        info!(debounce_ms = self.debounce.as_millis() as u64, "Save worker started");

        let mut deadline: Option<Instant> = None;
        let mut dirty = false;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(SaveCommand::Schedule) => {
                        deadline = Some(Instant::now() + self.debounce);
                        dirty = true;
                    }
                    Some(SaveCommand::FlushNow(reply)) => {
                        let result = self.save_if_pending(&mut deadline, &mut dirty).await;
                        let _ = reply.send(result);
                    }
                    Some(SaveCommand::Shutdown(reply)) => {
                        let result = self.save_if_pending(&mut deadline, &mut dirty).await;
                        let _ = reply.send(result);
                        break;
                    }
                    None => {
                        // Every handle dropped without a shutdown.
                        if let Err(e) = self.save_if_pending(&mut deadline, &mut dirty).await {
                            error!(error = %e, "Final save failed");
                        }
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Err(e) = self.save_if_pending(&mut deadline, &mut dirty).await {
                        error!(error = %e, "Debounced save failed");
                    }
                }
            }
        }

        info!("Save worker stopped");
    }

    /// `dirty` is cleared only once the snapshot is on disk. The timer is
    /// disarmed either way; a failed save waits for the next write or flush.
    async fn save_if_pending(
        &self,
        deadline: &mut Option<Instant>,
        dirty: &mut bool,
    ) -> DbResult<()> {
        *deadline = None;
        if !*dirty {
            return Ok(());
        }

        let guard = self.db.lock().await;
        match guard.as_ref() {
            Some(db) => {
                db.persist().await?;
                *dirty = false;
                self.saves.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => {
                warn!("No database to save");
                *dirty = false;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_db::DbConfig;

    async fn scheduler(debounce: Duration) -> (tempfile::TempDir, std::path::PathBuf, SaveHandle) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");
        let db = Arc::new(DbState::initialize(DbConfig::new(&path)).await);
        let handle = SaveScheduler::new(db, debounce).start();
        (dir, path, handle)
    }

    #[tokio::test]
    async fn test_rapid_schedules_coalesce_into_one_save() {
        let (_dir, path, handle) = scheduler(Duration::from_millis(50)).await;

        for _ in 0..5 {
            handle.schedule();
        }
        assert!(!path.exists());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(path.exists());
        assert_eq!(handle.saves_completed(), 1);
    }

    #[tokio::test]
    async fn test_flush_now_skips_the_wait() {
        let (_dir, path, handle) = scheduler(Duration::from_secs(60)).await;

        handle.schedule();
        handle.flush_now().await.unwrap();
        assert!(path.exists());
        assert_eq!(handle.saves_completed(), 1);

        // Nothing pending: no second write.
        handle.flush_now().await.unwrap();
        assert_eq!(handle.saves_completed(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_persists_pending_and_stops() {
        let (_dir, path, handle) = scheduler(Duration::from_secs(60)).await;

        handle.schedule();
        handle.shutdown().await.unwrap();
        assert!(path.exists());

        // Worker is gone; further calls are harmless.
        handle.schedule();
        handle.shutdown().await.unwrap();
        assert_eq!(handle.saves_completed(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_stays_pending_until_written() {
        let (_dir, path, handle) = scheduler(Duration::from_millis(20)).await;

        // A directory in the way makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        handle.schedule();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(handle.saves_completed(), 0);
        assert!(handle.flush_now().await.is_err());

        std::fs::remove_dir(&path).unwrap();
        handle.shutdown().await.unwrap();
        assert!(path.is_file());
        assert_eq!(handle.saves_completed(), 1);
    }
}
