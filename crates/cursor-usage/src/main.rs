use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use cursor_usage_monitor::prelude::*;
use cursor_usage_monitor::{JsonFileStorage, SnapshotFileScraper};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::interval;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod report;
mod widgets;
use widgets::*;

const DEFAULT_STORE_PATH: &str = "~/.config/cursor-usage/state.json";
const DEFAULT_CONFIG_PATH: &str = "~/.config/cursor-usage/config.json";
const DEFAULT_LOG_PATH: &str = "~/.config/cursor-usage/dashboard.log";

#[derive(Debug, Clone, PartialEq)]
pub enum PopupType {
    RecentActivity,
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Verbose logging; the dashboard writes it to ~/.config/cursor-usage/dashboard.log
    #[arg(short = 'v', global = true)]
    verbose: bool,

    /// Where the latest scrape is stored
    #[arg(short = 's', long = "store", global = true)]
    store: Option<String>,

    /// Path to the config file
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Extract a saved dashboard page and store the result
    Scrape {
        #[arg(long = "snapshot")]
        snapshot: String,
    },
    /// Print usage metrics for a time range
    Report {
        /// period, all, or a number of days
        #[arg(short = 'r', long = "range")]
        range: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Interactive terminal dashboard
    Dashboard {
        #[arg(short = 'r', long = "range")]
        range: Option<String>,

        /// Page snapshot re-read on refresh
        #[arg(long = "snapshot")]
        snapshot: Option<String>,
    },
}

#[derive(Serialize, Deserialize, Debug)]
struct UsageConfig {
    time_range: String,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            time_range: TimeRange::default().to_string(),
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn load_config(path: &Path) -> Result<UsageConfig> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: UsageConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    } else {
        Ok(UsageConfig::default())
    }
}

fn save_config(path: &Path, config: &UsageConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// An explicit range wins and becomes the new default; otherwise the saved one is used.
fn resolve_time_range(explicit: Option<&str>, config_path: &Path) -> Result<TimeRange> {
    let mut config = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {:#}", e);
        UsageConfig::default()
    });

    match explicit {
        Some(range) => {
            let parsed: TimeRange = range.parse()?;
            config.time_range = parsed.to_string();
            if let Err(e) = save_config(config_path, &config) {
                tracing::warn!("Could not save config: {:#}", e);
            }
            Ok(parsed)
        }
        None => Ok(config.time_range.parse().unwrap_or_default()),
    }
}

#[derive(Debug, PartialEq)]
enum LogDestination {
    Stderr,
    File(PathBuf),
}

/// The dashboard owns the terminal, so it only logs with `-v` and then to a file.
fn log_destination(in_dashboard: bool, verbose: bool) -> Option<LogDestination> {
    match (in_dashboard, verbose) {
        (false, _) => Some(LogDestination::Stderr),
        (true, true) => Some(LogDestination::File(expand_path(DEFAULT_LOG_PATH))),
        (true, false) => None,
    }
}

fn setup_logging(verbose: bool, destination: LogDestination) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("cursor_usage=debug,cursor_usage_monitor=debug")
    } else {
        EnvFilter::new("cursor_usage=info,cursor_usage_monitor=info")
    };
    let layer = tracing_subscriber::fmt::layer().with_target(false);

    match destination {
        LogDestination::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_writer(std::io::stderr))
            .init(),
        LogDestination::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
    }

    Ok(())
}

fn local_now() -> chrono::NaiveDateTime {
    Local::now().naive_local()
}

pub struct AppState {
    pub tracker: UsageTracker<JsonFileStorage>,
    pub scraper: Option<SnapshotFileScraper>,
    pub time_range: TimeRange,
    pub report: Option<UsageReport>,
    pub last_reload: DateTime<Utc>,
    pub is_loading: bool,
    pub spinner_state: usize,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
    pub active_popup: Option<PopupType>,
}

impl AppState {
    fn new(
        tracker: UsageTracker<JsonFileStorage>,
        scraper: Option<SnapshotFileScraper>,
        time_range: TimeRange,
    ) -> Self {
        Self {
            tracker,
            scraper,
            time_range,
            report: None,
            last_reload: Utc::now(),
            is_loading: false,
            spinner_state: 0,
            status_message: None,
            error_message: None,
            active_popup: None,
        }
    }

    fn reload(&mut self) {
        self.is_loading = true;

        match self.tracker.report(self.time_range, local_now()) {
            Ok(report) => {
                self.report = report;
                self.error_message = None;
            }
            Err(e) => {
                tracing::error!("Error loading dashboard: {:#}", e);
                self.report = None;
                self.error_message = Some(e.to_string());
            }
        }

        self.is_loading = false;
        self.last_reload = Utc::now();
    }

    fn set_time_range(&mut self, range: TimeRange) {
        tracing::debug!(range = %range, "Changing time range");
        self.time_range = range;
        self.reload();
    }

    fn refresh(&mut self) {
        let status = match &self.scraper {
            Some(scraper) => self.tracker.refresh(scraper, Utc::now()).to_string(),
            None => "No page snapshot configured (use --snapshot)".to_string(),
        };
        self.status_message = Some(status);
        self.reload();
    }

    fn update_spinner(&mut self) {
        self.spinner_state = (self.spinner_state + 1) % 10;
    }

    pub fn get_spinner_char(&self) -> char {
        match self.spinner_state {
            0 => '⠋',
            1 => '⠙',
            2 => '⠹',
            3 => '⠸',
            4 => '⠼',
            5 => '⠴',
            6 => '⠦',
            7 => '⠧',
            8 => '⠇',
            9 => '⠏',
            _ => '⠋',
        }
    }

    pub fn data_loaded(&self) -> bool {
        self.report.is_some()
    }
}

pub struct App {
    state: Arc<Mutex<AppState>>,
    exit: bool,
}

impl App {
    pub fn new(mut app_state: AppState) -> Self {
        app_state.reload();

        Self {
            state: Arc::new(Mutex::new(app_state)),
            exit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let state_clone = Arc::clone(&self.state);

        // Pick up scrapes written by other processes.
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(5));
            loop {
                interval.tick().await;

                if let Ok(mut state) = state_clone.lock() {
                    state.reload();
                }
            }
        });

        let mut tick_interval = interval(Duration::from_millis(100));

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    if let Ok(mut state) = self.state.lock() {
                        state.update_spinner();
                    }

                    terminal.draw(|frame| self.draw(frame))?;
                }

                _ = async {
                    if event::poll(Duration::from_millis(0)).unwrap_or(false) {
                        if let Ok(event) = event::read() {
                            self.handle_event(event);
                        }
                    }
                } => {}
            }

            if self.exit {
                break;
            }
        }

        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(12),
                Constraint::Length(1),
            ])
            .split(area);

        if let Ok(state) = self.state.lock() {
            HeaderWidget::render(frame, chunks[0], &state);
            TimeRangeWidget::render(frame, chunks[1], &state);
            ProgressBarsWidget::render(frame, chunks[2], &state);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[3]);
            StatisticsWidget::render(frame, middle[0], &state);
            PredictionsWidget::render(frame, middle[1], &state);

            ShortcutsWidget::render(frame, chunks[4], &state);

            if let Some(PopupType::RecentActivity) = &state.active_popup {
                PopupWidget::render(frame, area, &state);
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key_event) = event {
            if key_event.kind == KeyEventKind::Press {
                let range = match key_event.code {
                    KeyCode::Char('p') => Some(TimeRange::CurrentPeriod),
                    KeyCode::Char('3') => Some(TimeRange::Days(30)),
                    KeyCode::Char('6') => Some(TimeRange::Days(60)),
                    KeyCode::Char('9') => Some(TimeRange::Days(90)),
                    KeyCode::Char('a') => Some(TimeRange::All),
                    _ => None,
                };
                if let Some(range) = range {
                    if let Ok(mut state) = self.state.lock() {
                        state.set_time_range(range);
                    }
                    return;
                }

                match key_event.code {
                    KeyCode::Char('q') => self.exit = true,
                    KeyCode::Char('r') => {
                        if let Ok(mut state) = self.state.lock() {
                            state.refresh();
                        }
                    }
                    KeyCode::Char('e') => {
                        if let Ok(mut state) = self.state.lock() {
                            state.active_popup =
                                if state.active_popup == Some(PopupType::RecentActivity) {
                                    None
                                } else {
                                    Some(PopupType::RecentActivity)
                                };
                        }
                    }
                    KeyCode::Esc => {
                        if let Ok(mut state) = self.state.lock() {
                            state.active_popup = None;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

fn run_scrape(store_path: &Path, snapshot: &str) -> Result<()> {
    let mut tracker = UsageTracker::new(JsonFileStorage::new(store_path));
    let scraper = SnapshotFileScraper::new(expand_path(snapshot));

    let status = scrape_outcome(tracker.refresh(&scraper, Utc::now()))?;
    println!("{}", status);
    Ok(())
}

/// Failed refreshes become the process error, which `main` prints once.
fn scrape_outcome(status: RefreshStatus) -> Result<RefreshStatus> {
    if status.is_success() {
        Ok(status)
    } else {
        Err(anyhow::anyhow!("{}", status))
    }
}

fn run_report(store_path: &Path, range: TimeRange, json: bool) -> Result<()> {
    let tracker = UsageTracker::new(JsonFileStorage::new(store_path));

    match tracker.report(range, local_now())? {
        Some(report) if json => {
            println!("{}", serde_json::to_string_pretty(&report::to_json(&report))?);
        }
        Some(report) => print!("{}", report::to_text(&report)),
        None => println!("{}", report::NO_DATA_MESSAGE),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let command = args.command.clone().unwrap_or(Command::Dashboard {
        range: None,
        snapshot: None,
    });

    let in_dashboard = matches!(command, Command::Dashboard { .. });
    if let Some(destination) = log_destination(in_dashboard, args.verbose) {
        setup_logging(args.verbose, destination)?;
    }

    let store_path = expand_path(args.store.as_deref().unwrap_or(DEFAULT_STORE_PATH));
    let config_path = expand_path(args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));

    match command {
        Command::Scrape { snapshot } => run_scrape(&store_path, &snapshot),
        Command::Report { range, json } => {
            let range = resolve_time_range(range.as_deref(), &config_path)?;
            run_report(&store_path, range, json)
        }
        Command::Dashboard { range, snapshot } => {
            let range = resolve_time_range(range.as_deref(), &config_path)?;
            let tracker = UsageTracker::new(JsonFileStorage::new(&store_path));
            let scraper = snapshot.map(|path| SnapshotFileScraper::new(expand_path(&path)));

            let mut terminal = ratatui::init();
            let mut app = App::new(AppState::new(tracker, scraper, range));

            let result = app.run(&mut terminal).await;

            ratatui::restore();

            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_range_is_saved_as_default() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");

        let range = resolve_time_range(Some("60"), &config_path).unwrap();
        assert_eq!(range, TimeRange::Days(60));

        let remembered = resolve_time_range(None, &config_path).unwrap();
        assert_eq!(remembered, TimeRange::Days(60));
    }

    #[test]
    fn test_missing_config_defaults_to_current_period() {
        let dir = TempDir::new().unwrap();
        let range = resolve_time_range(None, &dir.path().join("config.json")).unwrap();
        assert_eq!(range, TimeRange::CurrentPeriod);
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(resolve_time_range(Some("fortnight"), &dir.path().join("config.json")).is_err());
    }

    #[test]
    fn test_failed_scrape_is_reported_once() {
        let err = scrape_outcome(RefreshStatus::NoActiveTab).unwrap_err();
        assert_eq!(err.to_string(), "Please open cursor.com in a tab first");
        assert_eq!(
            scrape_outcome(RefreshStatus::Extracted).unwrap(),
            RefreshStatus::Extracted
        );
    }

    #[test]
    fn test_scrape_without_snapshot_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("page.json");
        let store = dir.path().join("state.json");

        let err = run_scrape(&store, missing.to_str().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Please open cursor.com in a tab first");
        assert!(!store.exists());
    }

    #[test]
    fn test_dashboard_logs_only_to_a_file() {
        assert_eq!(log_destination(true, false), None);
        assert!(matches!(
            log_destination(true, true),
            Some(LogDestination::File(path)) if path.ends_with("dashboard.log")
        ));
        assert_eq!(log_destination(false, false), Some(LogDestination::Stderr));
        assert_eq!(log_destination(false, true), Some(LogDestination::Stderr));
    }

    #[test]
    fn test_args_parse_report_command() {
        let args = Args::parse_from(["cursor-usage", "report", "--range", "all", "--json"]);
        match args.command {
            Some(Command::Report { range, json }) => {
                assert_eq!(range.as_deref(), Some("all"));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
