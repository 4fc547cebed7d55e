//! Durable storage for the player's best score.
//!
//! Persistence is best effort: a store that cannot be read reports 0 and a
//! failed write is logged and dropped. Losing the cached best score degrades
//! the display but never the session.

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, warn};

/// Key under which the best score is stored.
pub const BEST_SCORE_KEY: &str = "dice-best-score";

/// Single-value store of the best score ever recorded.
pub trait BestScoreStore {
    /// Best score recorded so far, or 0 when absent, unavailable or corrupt.
    fn load(&self) -> u64;

    /// Persist `score` as the new best. Failures are swallowed.
    fn save(&self, score: u64);
}

impl<T: BestScoreStore + ?Sized> BestScoreStore for Box<T> {
    fn load(&self) -> u64 {
        (**self).load()
    }

    fn save(&self, score: u64) {
        (**self).save(score)
    }
}

/// In-memory store. Clones share the same value, so several engines can play
/// against one store.
#[derive(Clone, Debug, Default)]
pub struct MemoryBestScore {
    value: Arc<AtomicU64>,
}

impl MemoryBestScore {
    pub fn new(initial: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(initial)),
        }
    }
}

impl BestScoreStore for MemoryBestScore {
    fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    fn save(&self, score: u64) {
        self.value.store(score, Ordering::Relaxed);
    }
}

/// Store holding the score as decimal text in a single file.
#[derive(Clone, Debug)]
pub struct FileBestScore {
    path: PathBuf,
}

impl FileBestScore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<Option<u64>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).context("read best score file"),
        };
        let score = contents
            .trim()
            .parse::<u64>()
            .with_context(|| format!("parse best score {:?}", contents.trim()))?;
        Ok(Some(score))
    }

    fn write(&self, score: u64) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("create best score directory")?;
        }
        // Stage next to the target, then rename over it.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, score.to_string()).context("write best score file")?;
        fs::rename(&staging, &self.path).context("replace best score file")?;
        Ok(())
    }
}

impl BestScoreStore for FileBestScore {
    fn load(&self) -> u64 {
        match self.read() {
            Ok(Some(score)) => score,
            Ok(None) => {
                debug!(path = %self.path.display(), "no best score recorded");
                0
            }
            Err(err) => {
                warn!(path = %self.path.display(), ?err, "best score unreadable; using 0");
                0
            }
        }
    }

    fn save(&self, score: u64) {
        if let Err(err) = self.write(score) {
            warn!(path = %self.path.display(), score, ?err, "failed to persist best score");
        }
    }
}

/// Store backed by a SQLite key/value table.
///
/// A connection is opened per operation; the store is touched once per session
/// start and once per new best.
#[derive(Clone, Debug)]
pub struct SqliteBestScore {
    path: PathBuf,
}

impl SqliteBestScore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> anyhow::Result<Connection> {
        let conn = Connection::open(&self.path).context("open best score db")?;
        init_schema_sqlite(&conn)?;
        Ok(conn)
    }

    fn read(&self) -> anyhow::Result<Option<u64>> {
        let conn = self.open()?;
        let stored = conn
            .query_row(
                "SELECT score FROM best_scores WHERE key = ?",
                params![BEST_SCORE_KEY],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .context("query best score")?;
        stored
            .map(|score| u64::try_from(score).context("negative best score"))
            .transpose()
    }

    fn write(&self, score: u64) -> anyhow::Result<()> {
        let score = i64::try_from(score).context("best score exceeds storage range")?;
        let conn = self.open()?;
        conn.execute(
            "INSERT OR REPLACE INTO best_scores (key, score) VALUES (?, ?)",
            params![BEST_SCORE_KEY, score],
        )
        .context("write best score")?;
        Ok(())
    }
}

fn init_schema_sqlite(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         CREATE TABLE IF NOT EXISTS best_scores (
             key TEXT PRIMARY KEY,
             score INTEGER NOT NULL
         );",
    )
    .context("init best score schema")?;
    Ok(())
}

impl BestScoreStore for SqliteBestScore {
    fn load(&self) -> u64 {
        match self.read() {
            Ok(score) => score.unwrap_or(0),
            Err(err) => {
                warn!(path = %self.path.display(), ?err, "best score unreadable; using 0");
                0
            }
        }
    }

    fn save(&self, score: u64) {
        if let Err(err) = self.write(score) {
            warn!(path = %self.path.display(), score, ?err, "failed to persist best score");
        }
    }
}
