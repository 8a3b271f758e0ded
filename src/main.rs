mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
};

use typemaster::{
    app_dirs::AppDirs,
    logging,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    Catalog, Engine, FileSettingsStore, MemoryResultsStore, ResultsStore, SessionStatus,
    SettingsStore, SqliteResultsStore, TestDuration, TestSettings, ANY_CATEGORY,
};

/// typing speed test with live wpm, accuracy and a persistent history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test: type a passage against the clock, see live words-per-minute and accuracy, and keep a history of every completed test."
)]
pub struct Cli {
    /// test length
    #[clap(short = 'd', long, value_enum)]
    duration: Option<TestDuration>,

    /// passage category, or "All" for any
    #[clap(short = 'c', long)]
    category: Option<String>,

    /// language recorded with the settings
    #[clap(short = 'l', long)]
    language: Option<String>,

    /// keep results, settings and logs in this directory
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// print past results, newest first
    History {
        /// number of results to show
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// write the whole log as CSV instead
        #[clap(long)]
        csv: bool,
    },
    /// list the passage categories
    Categories,
}

impl Cli {
    /// Stored settings with any flags given on the command line applied
    fn merge_settings(&self, mut settings: TestSettings, catalog: &Catalog) -> TestSettings {
        settings.normalize(catalog);
        if let Some(duration) = self.duration {
            settings.duration = duration.secs();
        }
        if let Some(category) = &self.category {
            settings.category = category.clone();
        }
        if let Some(language) = &self.language {
            settings.language = language.clone();
        }
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Setup,
    Testing,
    Results,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Duration,
    Category,
}

/// Selections on the setup screen
#[derive(Debug, Clone)]
pub struct SetupForm {
    pub field: SetupField,
    pub duration_idx: usize,
    pub categories: Vec<String>,
    pub category_idx: usize,
}

impl SetupForm {
    fn new(settings: &TestSettings, catalog: &Catalog) -> Self {
        let categories: Vec<String> = std::iter::once(ANY_CATEGORY.to_string())
            .chain(catalog.categories())
            .collect();
        let duration_idx = TestDuration::ALL
            .iter()
            .position(|d| d.secs() == settings.duration)
            .unwrap_or(0);
        let category_idx = categories
            .iter()
            .position(|c| *c == settings.category)
            .unwrap_or(0);
        Self {
            field: SetupField::Duration,
            duration_idx,
            categories,
            category_idx,
        }
    }

    pub fn duration(&self) -> TestDuration {
        TestDuration::ALL[self.duration_idx]
    }

    pub fn category(&self) -> &str {
        &self.categories[self.category_idx]
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            SetupField::Duration => SetupField::Category,
            SetupField::Category => SetupField::Duration,
        };
    }

    fn cycle(&mut self, forward: bool) {
        let (idx, len) = match self.field {
            SetupField::Duration => (&mut self.duration_idx, TestDuration::ALL.len()),
            SetupField::Category => (&mut self.category_idx, self.categories.len()),
        };
        *idx = if forward {
            (*idx + 1) % len
        } else {
            (*idx + len - 1) % len
        };
    }
}

/// What the event loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// A test just started; restart the countdown schedule
    Started,
    Quit,
}

pub struct App {
    pub engine: Engine<Box<dyn ResultsStore>>,
    pub state: AppState,
    pub setup: SetupForm,
    /// One-line message shown on the current screen
    pub notice: Option<String>,
    history_return: AppState,
    settings_store: Box<dyn SettingsStore>,
}

impl App {
    pub fn new(
        settings: TestSettings,
        catalog: Catalog,
        store: Box<dyn ResultsStore>,
        settings_store: Box<dyn SettingsStore>,
    ) -> typemaster::Result<Self> {
        let setup = SetupForm::new(&settings, &catalog);
        let engine = Engine::new(settings, catalog, store)?;
        Ok(Self {
            engine,
            state: AppState::Setup,
            setup,
            notice: None,
            history_return: AppState::Setup,
            settings_store,
        })
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        match self.state {
            AppState::Setup => self.on_setup_key(key),
            AppState::Testing => self.on_testing_key(key),
            AppState::Results => self.on_results_key(key),
            AppState::History => self.on_history_key(key),
        }
    }

    fn on_setup_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::Tab => self.setup.toggle_field(),
            KeyCode::Left => self.setup.cycle(false),
            KeyCode::Right => self.setup.cycle(true),
            KeyCode::Enter => return self.start_from_setup(),
            KeyCode::Char('h') => self.show_history(),
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn on_testing_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => match self.engine.cancel() {
                Ok(_) => self.state = AppState::Results,
                Err(e) => log::error!("cancel failed: {e}"),
            },
            KeyCode::Enter if self.engine.status() == SessionStatus::Idle => {
                return self.start();
            }
            KeyCode::Char(c) => {
                if self.engine.type_char(c).is_some() {
                    self.state = AppState::Results;
                }
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_results_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('r') | KeyCode::Enter => {
                if let Err(e) = self.engine.reset() {
                    self.notice = Some(e.to_string());
                    return Flow::Continue;
                }
                return self.start();
            }
            KeyCode::Char('s') => {
                if let Err(e) = self.engine.reset() {
                    log::error!("reset failed: {e}");
                }
                self.notice = None;
                self.state = AppState::Setup;
            }
            KeyCode::Char('h') => self.show_history(),
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn on_history_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                self.state = self.history_return;
            }
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn show_history(&mut self) {
        self.history_return = self.state;
        self.state = AppState::History;
    }

    fn start_from_setup(&mut self) -> Flow {
        let settings = TestSettings {
            duration: self.setup.duration().secs(),
            category: self.setup.category().to_string(),
            language: self.engine.settings().language.clone(),
        };
        if let Err(e) = self.engine.reconfigure(settings) {
            self.notice = Some(e.to_string());
            return Flow::Continue;
        }
        if let Err(e) = self.settings_store.save(self.engine.settings()) {
            log::warn!("could not save settings: {e}");
        }
        self.start()
    }

    fn start(&mut self) -> Flow {
        match self.engine.start() {
            Ok(()) => {
                self.state = AppState::Testing;
                Flow::Started
            }
            Err(e) => {
                log::error!("start failed: {e}");
                Flow::Continue
            }
        }
    }

    /// One second elapsed on the countdown
    fn on_tick(&mut self) {
        if !self.engine.timer_armed() {
            return;
        }
        match self.engine.on_tick() {
            Ok(Some(_)) => self.state = AppState::Results,
            Ok(None) => {}
            Err(e) => log::error!("tick rejected: {e}"),
        }
    }
}

fn open_store(dirs: &AppDirs) -> (Box<dyn ResultsStore>, Option<String>) {
    let path = dirs.db_path();
    match SqliteResultsStore::open(&path) {
        Ok(store) => (Box::new(store), None),
        Err(e) => {
            log::warn!("cannot open results at {}: {e}", path.display());
            (
                Box::new(MemoryResultsStore::new()),
                Some("History unavailable: results from this run will not be saved".to_string()),
            )
        }
    }
}

fn print_history(dirs: &AppDirs, limit: usize, csv: bool) -> Result<(), Box<dyn Error>> {
    let (store, _) = open_store(dirs);
    let log = store.all();
    let mut out = io::stdout().lock();

    if csv {
        typemaster::results::write_csv(&log, &mut out)?;
        return Ok(());
    }

    if log.is_empty() {
        writeln!(out, "No tests completed yet.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{} tests   average {} wpm   best {} wpm",
        log.len(),
        typemaster::results::average_wpm(&log),
        typemaster::results::best_wpm(&log)
    )?;
    for r in log.iter().rev().take(limit) {
        writeln!(
            out,
            "{}  {:>3} wpm  {:>3}%  {:>5}  {}",
            r.date.format("%Y-%m-%d %H:%M"),
            r.wpm,
            r.accuracy,
            typemaster::metrics::format_duration(r.duration),
            r.category
        )?;
    }
    Ok(())
}

fn print_categories() -> Result<(), Box<dyn Error>> {
    let catalog = Catalog::builtin()?;
    let mut out = io::stdout().lock();
    writeln!(out, "{ANY_CATEGORY}")?;
    for category in catalog.categories() {
        writeln!(out, "{category}")?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let dirs = AppDirs::resolve(cli.data_dir.as_deref());
    logging::init(&dirs.log_path());

    match &cli.command {
        Some(Command::History { limit, csv }) => return print_history(&dirs, *limit, *csv),
        Some(Command::Categories) => return print_categories(),
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let catalog = Catalog::builtin()?;
    let settings_store = FileSettingsStore::new(&dirs);
    let settings = cli.merge_settings(settings_store.load(), &catalog);
    if let Err(e) = settings.validate(&catalog) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
    }

    let (store, notice) = open_store(&dirs);
    let mut app = App::new(settings, catalog, store, Box::new(settings_store))?;
    app.notice = notice;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::seconds());

    terminal.draw(|f| ui(app, f))?;
    loop {
        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => match app.on_key(key) {
                Flow::Continue => {}
                Flow::Started => runner.rearm(),
                Flow::Quit => break,
            },
        }
        terminal.draw(|f| ui(app, f))?;
    }
    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    ui::screen::current_screen(&app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use typemaster::{Difficulty, StoreError, TextPassage};

    #[derive(Default, Clone)]
    struct RecordingSettings {
        saved: Rc<RefCell<Vec<TestSettings>>>,
    }

    impl SettingsStore for RecordingSettings {
        fn load(&self) -> TestSettings {
            TestSettings::default()
        }

        fn save(&self, settings: &TestSettings) -> Result<(), StoreError> {
            self.saved.borrow_mut().push(settings.clone());
            Ok(())
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            TextPassage {
                id: "1".into(),
                text: "hi".into(),
                category: "General".into(),
                language: "English".into(),
                difficulty: Difficulty::Easy,
            },
            TextPassage {
                id: "2".into(),
                text: "ok".into(),
                category: "Science".into(),
                language: "English".into(),
                difficulty: Difficulty::Medium,
            },
        ])
    }

    fn app_with(settings: RecordingSettings) -> App {
        App::new(
            TestSettings::default(),
            catalog(),
            Box::new(MemoryResultsStore::new()),
            Box::new(settings),
        )
        .unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typemaster"]);
        assert_eq!(cli.duration, None);
        assert_eq!(cli.category, None);
        assert_eq!(cli.language, None);
        assert_eq!(cli.data_dir, None);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_duration() {
        let cli = Cli::parse_from(["typemaster", "-d", "3m"]);
        assert_eq!(cli.duration, Some(TestDuration::ThreeMinutes));
        let cli = Cli::parse_from(["typemaster", "--duration", "5m"]);
        assert_eq!(cli.duration, Some(TestDuration::FiveMinutes));
        assert!(Cli::try_parse_from(["typemaster", "--duration", "2m"]).is_err());
    }

    #[test]
    fn test_cli_history_subcommand() {
        let cli = Cli::parse_from(["typemaster", "history", "--limit", "3", "--csv"]);
        assert_eq!(cli.command, Some(Command::History { limit: 3, csv: true }));
        let cli = Cli::parse_from(["typemaster", "history", "--data-dir", "/tmp/x"]);
        assert_eq!(cli.command, Some(Command::History { limit: 10, csv: false }));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_cli_flags_override_stored_settings() {
        let cli = Cli::parse_from(["typemaster", "-d", "5m", "-c", "Science"]);
        let stored = TestSettings {
            duration: 180,
            category: "General".into(),
            language: "Spanish".into(),
        };
        let merged = cli.merge_settings(stored, &catalog());
        assert_eq!(merged.duration, 300);
        assert_eq!(merged.category, "Science");
        assert_eq!(merged.language, "Spanish");
    }

    #[test]
    fn test_setup_form_reflects_settings() {
        let settings = TestSettings::new(TestDuration::ThreeMinutes, "Science");
        let form = SetupForm::new(&settings, &catalog());
        assert_eq!(form.categories, vec!["All", "General", "Science"]);
        assert_eq!(form.duration(), TestDuration::ThreeMinutes);
        assert_eq!(form.category(), "Science");
    }

    #[test]
    fn test_setup_cycles_and_wraps() {
        let mut app = app_with(RecordingSettings::default());
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.setup.duration(), TestDuration::FiveMinutes);
        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Right));
        app.on_key(key(KeyCode::Right));
        assert_eq!(app.setup.category(), "Science");
    }

    #[test]
    fn test_enter_starts_and_saves_settings() {
        let recorder = RecordingSettings::default();
        let mut app = app_with(recorder.clone());
        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Right));

        assert_eq!(app.on_key(key(KeyCode::Enter)), Flow::Started);
        assert_eq!(app.state, AppState::Testing);
        assert_eq!(app.engine.status(), SessionStatus::Active);
        assert_eq!(app.engine.session().passage().category, "General");
        assert_eq!(recorder.saved.borrow().last().unwrap().category, "General");
    }

    #[test]
    fn test_typing_passage_shows_results() {
        let mut app = app_with(RecordingSettings::default());
        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Right));
        app.on_key(key(KeyCode::Enter));
        type_str(&mut app, "hi");
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.engine.store().count(), 1);

        // try again starts a new active session
        assert_eq!(app.on_key(key(KeyCode::Char('r'))), Flow::Started);
        assert_eq!(app.state, AppState::Testing);
        assert_eq!(app.engine.session().typed_len(), 0);
    }

    #[test]
    fn test_esc_cancels_into_results() {
        let mut app = app_with(RecordingSettings::default());
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Char('x')));
        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.engine.result().unwrap().total_chars, 1);
    }

    #[test]
    fn test_ticks_only_reach_armed_engine() {
        let mut app = app_with(RecordingSettings::default());
        app.on_tick();
        assert_eq!(app.engine.status(), SessionStatus::Idle);

        app.on_key(key(KeyCode::Enter));
        app.on_tick();
        assert_eq!(app.engine.session().time_remaining(), Some(59));
    }

    #[test]
    fn test_history_returns_to_previous_screen() {
        let mut app = app_with(RecordingSettings::default());
        app.on_key(key(KeyCode::Char('h')));
        assert_eq!(app.state, AppState::History);
        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Setup);
    }

    #[test]
    fn test_unopenable_store_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where the data directory should be
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let (store, notice) = open_store(&AppDirs::under(&blocker));
        assert!(store.all().is_empty());
        assert!(notice.unwrap().contains("will not be saved"));
    }

    #[test]
    fn test_corrupt_database_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = AppDirs::under(dir.path());
        std::fs::write(dirs.db_path(), b"definitely not sqlite").unwrap();

        let (store, notice) = open_store(&dirs);
        assert_eq!(store.count(), 0);
        assert!(notice.is_some());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(RecordingSettings::default());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.on_key(ctrl_c), Flow::Quit);
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), Flow::Quit);
    }
}
