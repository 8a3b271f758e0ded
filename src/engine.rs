//! The session engine: owns the current [`Session`], drives it from timer
//! ticks and input events, and hands finished results to a [`ResultsStore`].
//!
//! Ticks and input are expected on one thread, one call at a time. Every
//! call leaves counts and status fully updated before it returns.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::metrics;
use crate::passage::{Catalog, TextPassage};
use crate::results::{ResultsStore, TestResult};
use crate::session::{CharOutcome, InputOutcome, Session, SessionStatus};
use crate::settings::TestSettings;

/// Values the front end shows while a test runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStats {
    pub status: SessionStatus,
    pub time_remaining: u32,
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
    pub chars: Vec<CharOutcome>,
}

pub struct Engine<S: ResultsStore> {
    settings: TestSettings,
    catalog: Catalog,
    store: S,
    session: Session,
    timer_armed: bool,
    last_id: i64,
    save_error: Option<Error>,
}

impl<S: ResultsStore> Engine<S> {
    /// Select a passage for `settings` and prepare an idle session.
    /// Fails when the catalog cannot serve the requested category.
    pub fn new(settings: TestSettings, catalog: Catalog, store: S) -> Result<Self> {
        let passage = catalog.select(&settings.category)?;
        Ok(Self::with_passage(settings, catalog, store, passage))
    }

    pub fn with_passage(
        settings: TestSettings,
        catalog: Catalog,
        store: S,
        passage: TextPassage,
    ) -> Self {
        Self {
            settings,
            catalog,
            store,
            session: Session::new(passage),
            timer_armed: false,
            last_id: 0,
            save_error: None,
        }
    }

    pub fn settings(&self) -> &TestSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the one-second countdown should currently deliver ticks
    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// Result of the current session once it has completed
    pub fn result(&self) -> Option<&TestResult> {
        self.session.result()
    }

    /// Why the last completed result could not be persisted, if it wasn't
    pub fn save_error(&self) -> Option<&Error> {
        self.save_error.as_ref()
    }

    pub fn start(&mut self) -> Result<()> {
        self.session.begin(self.settings.duration)?;
        self.timer_armed = true;
        log::debug!(
            "session started: passage {} ({}s)",
            self.session.passage().id,
            self.settings.duration
        );
        Ok(())
    }

    /// One second elapsed. Returns the result if time ran out.
    pub fn on_tick(&mut self) -> Result<Option<TestResult>> {
        if self.session.tick()? {
            return self.complete();
        }
        Ok(None)
    }

    /// New full contents of the input. Dropped unless the session is
    /// active; completes the session when the passage length is reached.
    pub fn on_input(&mut self, text: &str) -> Option<TestResult> {
        match self.session.accept_input(text) {
            InputOutcome::Finished => self.complete().ok().flatten(),
            InputOutcome::Rejected => {
                log::debug!("ignoring input shorter than what was typed");
                None
            }
            InputOutcome::Ignored | InputOutcome::Updated => None,
        }
    }

    /// Append one character to the typed text
    pub fn type_char(&mut self, c: char) -> Option<TestResult> {
        if self.status() != SessionStatus::Active {
            return None;
        }
        let mut text = self.session.typed_text();
        text.push(c);
        self.on_input(&text)
    }

    /// End an active session early with the usual result computation
    pub fn cancel(&mut self) -> Result<TestResult> {
        if self.status() != SessionStatus::Active {
            return Err(Error::InvalidTransition {
                action: "cancel",
                status: self.status(),
            });
        }
        log::debug!("session cancelled by user");
        match self.complete()? {
            Some(result) => Ok(result),
            None => Err(Error::InvalidTransition {
                action: "cancel",
                status: SessionStatus::Completed,
            }),
        }
    }

    /// Finish the active session and persist its result.
    ///
    /// Returns `Ok(None)` if the session already completed, so racing
    /// completion triggers produce exactly one result. A persistence
    /// failure is logged and kept in [`Engine::save_error`]; the result
    /// is still returned.
    pub fn complete(&mut self) -> Result<Option<TestResult>> {
        let time_remaining = match self.status() {
            SessionStatus::Completed => return Ok(None),
            SessionStatus::Idle => {
                return Err(Error::InvalidTransition {
                    action: "complete",
                    status: SessionStatus::Idle,
                })
            }
            SessionStatus::Active => self.session.time_remaining().unwrap_or(0),
        };
        self.timer_armed = false;

        let elapsed = self.settings.duration.saturating_sub(time_remaining);
        let correct = self.session.correct_count();
        let total = self.session.typed_len();
        let result = TestResult {
            id: self.next_id(),
            wpm: metrics::wpm(correct, elapsed as f64),
            accuracy: metrics::accuracy(correct, total),
            duration: elapsed,
            date: Utc::now(),
            category: self.settings.category.clone(),
            errors: self.session.error_count(),
            correct_chars: correct,
            total_chars: total,
        };

        self.save_error = match self.store.append(&result) {
            Ok(()) => {
                log::info!(
                    "saved result {}: {} wpm, {}% accuracy over {}s",
                    result.id,
                    result.wpm,
                    result.accuracy,
                    result.duration
                );
                None
            }
            Err(e) => {
                let err = Error::PersistenceUnavailable(e);
                log::warn!("result {} kept in memory only: {err}", result.id);
                Some(err)
            }
        };

        self.session.finish(result.clone())?;
        Ok(Some(result))
    }

    /// Fresh idle session with a newly selected passage for the same
    /// settings. Valid from any state.
    pub fn reset(&mut self) -> Result<()> {
        let passage = self.catalog.select(&self.settings.category)?;
        self.session = Session::new(passage);
        self.timer_armed = false;
        self.save_error = None;
        Ok(())
    }

    /// Apply new settings and start over with a fresh session
    pub fn reconfigure(&mut self, settings: TestSettings) -> Result<()> {
        let passage = self.catalog.select(&settings.category)?;
        self.settings = settings;
        self.session = Session::new(passage);
        self.timer_armed = false;
        self.save_error = None;
        Ok(())
    }

    pub fn live(&self) -> LiveStats {
        let status = self.status();
        let time_remaining = self
            .session
            .time_remaining()
            .unwrap_or(self.settings.duration);
        let (wpm, accuracy) = if status == SessionStatus::Active {
            let elapsed = self.settings.duration.saturating_sub(time_remaining);
            let correct = self.session.correct_count();
            (
                metrics::wpm(correct, elapsed as f64),
                metrics::accuracy(correct, self.session.typed_len()),
            )
        } else {
            (0, 100)
        };
        LiveStats {
            status,
            time_remaining,
            wpm,
            accuracy,
            errors: self.session.error_count(),
            chars: self.session.classify(),
        }
    }

    fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last_id = if now > self.last_id {
            now
        } else {
            self.last_id + 1
        };
        self.last_id.to_string()
    }
}
