use std::io::{self, stdout, Stdout};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{self, ClearType},
};
use tracing::{debug, info, trace};

use sineai_runner::render::{self, Frame};
use sineai_runner::{logger, Autopilot, GameEvent, Mode, RunnerConfig, Session};

/// Pause before the autopilot starts the next run on its own.
const AUTOPILOT_RESTART_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(about = "Side-scrolling runner game for the terminal", version)]
struct Args {
    /// TOML file overriding the default tuning values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for obstacle and taunt selection.
    #[arg(long)]
    seed: Option<u64>,
    /// Frame budget in milliseconds; overrides the config file.
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Let the built-in agent play.
    #[arg(long)]
    autopilot: bool,
    /// Log file; defaults to sineai-runner.log in the temp directory.
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Space: jump while running, start otherwise.
    Action,
    Jump,
    Start,
    Quit,
}

fn command_for(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char(' ') => Some(Command::Action),
        KeyCode::Up | KeyCode::Char('w') => Some(Command::Jump),
        KeyCode::Enter => Some(Command::Start),
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Exit {
    Ended,
    Quit,
}

/// Owns the terminal while the game runs; restores it on drop.
struct Screen {
    out: Stdout,
    frame: Frame,
}

impl Screen {
    fn enter() -> io::Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide
        )?;
        let (cols, rows) = terminal::size()?;
        Ok(Screen {
            out,
            frame: Frame::new(cols, rows),
        })
    }

    fn resize(&mut self, cols: u16, rows: u16) -> io::Result<()> {
        debug!(cols, rows, "terminal resized");
        self.frame = Frame::new(cols, rows);
        execute!(self.out, terminal::Clear(ClearType::All))
    }

    fn present(&mut self, session: &Session) -> io::Result<()> {
        render::draw_scene(&mut self.frame, session.state(), session.config());
        render::flush(&self.frame, &mut self.out)
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_path = args
        .log
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("sineai-runner.log"));
    logger::init(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let mut config = match &args.config {
        Some(path) => RunnerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunnerConfig::default(),
    };
    if let Some(tick_ms) = args.tick_ms {
        config.tick_ms = tick_ms.max(1);
    }

    let mut session = match args.seed {
        Some(seed) => Session::with_seed(config, seed)?,
        None => Session::new(config)?,
    };
    let autopilot = args.autopilot.then(Autopilot::default);
    info!(?args, "starting");

    let mut screen = Screen::enter().context("failed to set up terminal")?;
    let result = run(&mut screen, &mut session, autopilot);
    drop(screen);

    info!(best_score = session.state().best_score, "exiting");
    result
}

/// Alternates between waiting on the title / game-over screen and running a
/// session until the player quits.
fn run(
    screen: &mut Screen,
    session: &mut Session,
    autopilot: Option<Autopilot>,
) -> anyhow::Result<()> {
    loop {
        screen.present(session)?;
        if !wait_for_start(screen, session, autopilot.is_some())? {
            return Ok(());
        }
        if run_session(screen, session, autopilot)? == Exit::Quit {
            return Ok(());
        }
    }
}

/// Blocks until a start command (or the autopilot's restart delay), then
/// starts the session. Returns `false` if the player quits instead.
fn wait_for_start(
    screen: &mut Screen,
    session: &mut Session,
    auto_restart: bool,
) -> anyhow::Result<bool> {
    let deadline = Instant::now() + AUTOPILOT_RESTART_DELAY;
    loop {
        let timeout = if auto_restart {
            deadline.saturating_duration_since(Instant::now())
        } else {
            Duration::from_secs(3600)
        };
        if !event::poll(timeout)? {
            if auto_restart {
                break;
            }
            continue;
        }
        match event::read()? {
            Event::Key(key) => match command_for(key) {
                Some(Command::Quit) => return Ok(false),
                Some(Command::Action | Command::Start) => break,
                _ => {}
            },
            Event::Resize(cols, rows) => {
                screen.resize(cols, rows)?;
                screen.present(session)?;
            }
            _ => {}
        }
    }
    session.start();
    Ok(true)
}

/// Frame loop for one run. Returns when the run ends or the player quits;
/// nothing is scheduled after that until the next start.
fn run_session(
    screen: &mut Screen,
    session: &mut Session,
    autopilot: Option<Autopilot>,
) -> anyhow::Result<Exit> {
    let tick_rate = Duration::from_millis(session.config().tick_ms);

    while session.mode() == Mode::Running {
        let start_time = Instant::now();

        // --- INPUT ---
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => match command_for(key) {
                    Some(Command::Quit) => return Ok(Exit::Quit),
                    Some(Command::Action | Command::Jump) => {
                        session.jump();
                    }
                    _ => {}
                },
                Event::Resize(cols, rows) => screen.resize(cols, rows)?,
                _ => {}
            }
        }

        if let Some(pilot) = autopilot {
            if pilot.decide(session.state()) {
                trace!(observation = ?pilot.observe(session.state()), "autopilot jump");
                session.jump();
            }
        }

        // --- UPDATE ---
        for event in session.tick() {
            match event {
                GameEvent::Spawned { kind, frame } => trace!(%kind, frame, "spawn"),
                GameEvent::Scored { score } => debug!(score, "scored"),
                GameEvent::SpeedUp { speed } => debug!(speed, "speed up"),
                GameEvent::Crashed { score, message } => info!(score, %message, "crashed"),
            }
        }

        // --- DRAW ---
        screen.present(session)?;

        let elapsed = start_time.elapsed();
        if let Some(time_to_wait) = tick_rate.checked_sub(elapsed) {
            thread::sleep(time_to_wait);
        }
    }

    Ok(Exit::Ended)
}
