mod actions;
mod app;
mod input;
mod persistence;
mod view;

pub use app::{describe_event, UiLocale};

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use env_logger::{Env, Target};
use luckydraw_core::Viewport;
use luckydraw_data::{clock_seed, resolve_data_dir, resolve_seed, LANG_ENV, LOG_ENV};
use persistence::load_auto_perform_file;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, stdout, IsTerminal};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Pixels per terminal cell used to turn a resize into a viewport.
const CELL_WIDTH: f64 = 10.0;
const CELL_HEIGHT: f64 = 20.0;

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub locale: Option<String>,
    pub seed: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub auto_perform_json: Option<PathBuf>,
}

pub fn run(options: LaunchOptions) -> Result<()> {
    let mut locale_value = options.locale.clone();
    let mut seed_value = options.seed;
    let mut auto_actions = None;
    if let Some(path) = options.auto_perform_json.as_ref() {
        let script = load_auto_perform_file(path)
            .map_err(|err| anyhow::anyhow!(err))
            .with_context(|| format!("load auto perform json from {}", path.display()))?;
        if locale_value.is_none() {
            locale_value = script.locale;
        }
        if seed_value.is_none() {
            seed_value = script.seed;
        }
        auto_actions = Some(script.actions);
    }

    let locale = UiLocale::from_opt(locale_value.as_deref());
    let seed = seed_value.unwrap_or_else(clock_seed);
    let data_dir = resolve_data_dir(options.data_dir.clone());
    let mut app = App::bootstrap(locale, seed, &data_dir)?;
    if let Some(actions) = auto_actions {
        app.auto_perform_actions(&actions)
            .map_err(|err| anyhow::anyhow!(err))
            .context("apply auto perform actions")?;
    }

    ensure_interactive_terminal()?;

    enable_raw_mode().map_err(|err| {
        anyhow::anyhow!(
            "failed to enable raw mode; ensure the process owns an interactive terminal: {err}"
        )
    })?;
    let mut stdout = stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let run_result = run_loop(&mut terminal, &mut app);
    app.session.teardown();
    restore_terminal(&mut terminal)?;
    run_result
}

pub fn run_with_args(args: &[String]) -> Result<()> {
    init_file_logging()?;
    let options = parse_options(args);
    run(options)
}

/// Logging goes to a file in the temp dir, and only when asked for, so the
/// alternate screen stays clean.
fn init_file_logging() -> Result<()> {
    if std::env::var_os(LOG_ENV).is_none() {
        return Ok(());
    }
    let path = std::env::temp_dir().join("luckydraw-cui.log");
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    env_logger::Builder::from_env(Env::new().filter_or(LOG_ENV, "info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("init logger")?;
    Ok(())
}

fn parse_options(args: &[String]) -> LaunchOptions {
    let mut locale = std::env::var(LANG_ENV).ok();
    let mut seed = None;
    let mut data_dir = None;
    let mut auto_perform_json = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--lang" | "-l" => {
                if let Some(value) = args.get(idx + 1) {
                    locale = Some(value.clone());
                    idx += 1;
                }
            }
            "--seed" => {
                if let Some(value) = args.get(idx + 1) {
                    seed = value.parse::<u64>().ok();
                    idx += 1;
                }
            }
            "--data" => {
                if let Some(value) = args.get(idx + 1) {
                    data_dir = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            "--auto-perform-json" | "--auto-json" => {
                if let Some(value) = args.get(idx + 1) {
                    auto_perform_json = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    LaunchOptions {
        locale,
        seed: resolve_seed(seed),
        data_dir,
        auto_perform_json,
    }
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let frame_rate = Duration::from_millis(33);
    let mut last = Instant::now();
    if let Ok(size) = terminal.size() {
        app.session.resize(viewport_for(size.width, size.height));
    }
    while !app.should_quit {
        let elapsed = last.elapsed();
        last = Instant::now();
        app.on_tick(elapsed.as_millis() as u64);
        terminal.draw(|frame| view::draw(frame, app))?;
        if event::poll(frame_rate)? {
            match event::read()? {
                CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    let action = input::map_key(key);
                    actions::dispatch(app, action);
                }
                CEvent::Resize(width, height) => {
                    app.session.resize(viewport_for(width, height));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn viewport_for(columns: u16, rows: u16) -> Viewport {
    Viewport {
        width: f64::from(columns) * CELL_WIDTH,
        height: f64::from(rows) * CELL_HEIGHT,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn ensure_interactive_terminal() -> Result<()> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        return Ok(());
    }
    anyhow::bail!(
        "luckydraw-cui requires an interactive TTY (run directly in a terminal, not a piped/headless shell)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn parses_flags() {
        let options = parse_options(&args(&[
            "--seed", "42", "--data", "/tmp/draw", "--lang", "zh", "--auto-json", "run.json",
        ]));
        assert_eq!(options.seed, Some(42));
        assert_eq!(options.data_dir, Some(PathBuf::from("/tmp/draw")));
        assert_eq!(options.locale.as_deref(), Some("zh"));
        assert_eq!(options.auto_perform_json, Some(PathBuf::from("run.json")));
    }

    #[test]
    fn viewport_scales_with_terminal() {
        let viewport = viewport_for(192, 54);
        assert_eq!(viewport.width, 1920.0);
        assert_eq!(viewport.height, 1080.0);
    }
}
