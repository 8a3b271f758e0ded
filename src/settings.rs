use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result, StoreError};
use crate::passage::{Catalog, ANY_CATEGORY};

/// Test lengths offered to the user, in seconds
pub const ALLOWED_DURATIONS: [u32; 3] = [60, 180, 300];

pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
pub enum TestDuration {
    #[value(name = "1m")]
    #[strum(serialize = "1 Minute")]
    OneMinute,
    #[value(name = "3m")]
    #[strum(serialize = "3 Minutes")]
    ThreeMinutes,
    #[value(name = "5m")]
    #[strum(serialize = "5 Minutes")]
    FiveMinutes,
}

impl TestDuration {
    pub const ALL: [TestDuration; 3] = [
        TestDuration::OneMinute,
        TestDuration::ThreeMinutes,
        TestDuration::FiveMinutes,
    ];

    pub fn secs(self) -> u32 {
        match self {
            TestDuration::OneMinute => 60,
            TestDuration::ThreeMinutes => 180,
            TestDuration::FiveMinutes => 300,
        }
    }

    pub fn from_secs(secs: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.secs() == secs)
    }
}

/// Caller-supplied configuration for one session. `language` is recorded
/// but does not influence passage selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestSettings {
    /// Seconds
    pub duration: u32,
    pub category: String,
    pub language: String,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            duration: TestDuration::OneMinute.secs(),
            category: ANY_CATEGORY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl TestSettings {
    pub fn new(duration: TestDuration, category: impl Into<String>) -> Self {
        Self {
            duration: duration.secs(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Reject settings the setup screen should never have produced
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if !ALLOWED_DURATIONS.contains(&self.duration) {
            return Err(Error::Settings(format!(
                "duration must be one of {ALLOWED_DURATIONS:?} seconds, got {}",
                self.duration
            )));
        }
        if !catalog.offers(&self.category) {
            return Err(Error::NoPassagesForCategory {
                category: self.category.clone(),
            });
        }
        Ok(())
    }

    /// Reset stale values (e.g. from an older settings file) to defaults.
    pub fn normalize(&mut self, catalog: &Catalog) {
        if !ALLOWED_DURATIONS.contains(&self.duration) {
            log::warn!(
                "stored duration {}s is not offered, using {}s",
                self.duration,
                TestDuration::OneMinute.secs()
            );
            self.duration = TestDuration::OneMinute.secs();
        }
        if !catalog.offers(&self.category) {
            log::warn!("stored category '{}' has no passages, using 'All'", self.category);
            self.category = ANY_CATEGORY.to_string();
        }
        if self.language.is_empty() {
            self.language = DEFAULT_LANGUAGE.to_string();
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> TestSettings;
    fn save(&self, settings: &TestSettings) -> std::result::Result<(), StoreError>;
}

/// Last-used settings as pretty JSON on disk
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(dirs: &AppDirs) -> Self {
        Self {
            path: dirs.config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> TestSettings {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<TestSettings>(&bytes).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable settings {}: {e}", self.path.display());
                TestSettings::default()
            }),
            Err(_) => TestSettings::default(),
        }
    }

    fn save(&self, settings: &TestSettings) -> std::result::Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
