mod app;
mod commands;
mod config;
mod render;

use std::io;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::event::{Event as CEvent, EventStream};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dice_client::{Client, LeaderboardQuery};
use dice_execution::{
    BestScoreStore, DiceRng, EngineConfig, FileBestScore, MemoryBestScore, RandomSource,
    SessionEngine, SqliteBestScore,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::select;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::app::App;
use crate::commands::{Command, HELP};
use crate::config::{default_store_path, Args, Settings, StoreSpec};

type Store = Box<dyn BestScoreStore + Send>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args)?;
    init_logging(&settings)?;

    let rng = match settings.seed {
        Some(seed) => DiceRng::seeded(seed),
        None => DiceRng::from_entropy(),
    };
    let engine = Arc::new(SessionEngine::new(
        EngineConfig {
            resolve_delay: settings.roll_delay,
        },
        rng,
        open_store(&settings.store),
    ));

    let client = match settings.base_url.as_deref() {
        Some(base_url) => {
            let query = LeaderboardQuery {
                game_id: settings.game_id,
                ..LeaderboardQuery::default()
            };
            Some(
                Client::new(base_url)
                    .with_context(|| format!("invalid base URL {base_url}"))?
                    .with_leaderboard_query(query),
            )
        }
        None => None,
    };

    info!(
        base_url = ?settings.base_url,
        player = ?settings.player,
        delay_ms = settings.roll_delay.as_millis() as u64,
        store = ?settings.store,
        "starting dice"
    );

    let result = run(Arc::clone(&engine), client, settings.player.clone()).await;
    engine.shutdown();
    result
}

fn init_logging(settings: &Settings) -> Result<()> {
    let level = Level::from_str(&settings.log_level)
        .map_err(|_| anyhow!("invalid log level {:?}", settings.log_level))?;

    // The terminal belongs to the UI, so logs go to a file.
    let writer = match settings.log_path() {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("create log directory {}", dir.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::sink),
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(writer);
    if settings.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn open_store(store: &StoreSpec) -> Store {
    match store {
        StoreSpec::Memory => Box::new(MemoryBestScore::default()),
        StoreSpec::File(path) => {
            match path.clone().or_else(|| default_store_path("best-score")) {
                Some(path) => Box::new(FileBestScore::new(path)),
                None => {
                    warn!("no data directory; best score will not persist");
                    Box::new(MemoryBestScore::default())
                }
            }
        }
        StoreSpec::Sqlite(path) => {
            match path.clone().or_else(|| default_store_path("scores.db")) {
                Some(path) => {
                    if let Some(dir) = path.parent() {
                        if let Err(err) = std::fs::create_dir_all(dir) {
                            warn!(?err, dir = %dir.display(), "failed to create store directory");
                        }
                    }
                    Box::new(SqliteBestScore::new(path))
                }
                None => {
                    warn!("no data directory; best score will not persist");
                    Box::new(MemoryBestScore::default())
                }
            }
        }
    }
}

async fn run<R>(
    engine: Arc<SessionEngine<R, Store>>,
    client: Option<Client>,
    player: Option<String>,
) -> Result<()>
where
    R: RandomSource + Send + 'static,
{
    enable_raw_mode().context("enable raw mode")?;
    let _restore = TerminalGuard::new(restore_terminal);
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    event_loop(&mut terminal, engine, client, player).await
}

/// Runs its restore hook when dropped, so every exit path from [`run`]
/// leaves the terminal usable.
struct TerminalGuard {
    restore: fn(),
}

impl TerminalGuard {
    fn new(restore: fn()) -> Self {
        Self { restore }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    if let Err(err) = disable_raw_mode() {
        warn!(?err, "failed to disable raw mode");
    }
    if let Err(err) = crossterm::execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show)
    {
        warn!(?err, "failed to leave alternate screen");
    }
}

async fn event_loop<R>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    engine: Arc<SessionEngine<R, Store>>,
    client: Option<Client>,
    player: Option<String>,
) -> Result<()>
where
    R: RandomSource + Send + 'static,
{
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    let mut updates = engine.subscribe();
    let mut app = App::new(engine, client, player, ui_tx);
    app.push_log(HELP);

    let mut events = EventStream::new();
    loop {
        terminal.draw(|f| render::draw(f, &app))?;

        select! {
            maybe_ev = events.next() => match maybe_ev {
                Some(Ok(CEvent::Key(key))) => {
                    if let Some(command) = Command::from_key(key) {
                        if app.handle(command) {
                            break;
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("read terminal events"),
                None => break,
            },
            Some(event) = ui_rx.recv() => app.on_event(event),
            Ok(()) = updates.changed() => {
                app.snapshot = updates.borrow_and_update().clone();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static RESTORED: AtomicUsize = AtomicUsize::new(0);

    fn count_restore() {
        RESTORED.fetch_add(1, Ordering::SeqCst);
    }

    fn failing_setup() -> Result<()> {
        let _restore = TerminalGuard::new(count_restore);
        Err(anyhow!("terminal too small"))
    }

    #[test]
    fn test_guard_restores_on_failed_setup() {
        let before = RESTORED.load(Ordering::SeqCst);
        assert!(failing_setup().is_err());
        assert_eq!(RESTORED.load(Ordering::SeqCst), before + 1);
    }
}
