// Library surface shared by the binary and the integration tests.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod passage;
pub mod results;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod time_series;

pub use engine::{Engine, LiveStats};
pub use error::{Error, Result, StoreError};
pub use passage::{Catalog, Difficulty, TextPassage, ANY_CATEGORY};
pub use results::{MemoryResultsStore, ResultsStore, SqliteResultsStore, TestResult};
pub use session::{CharOutcome, Session, SessionStatus};
pub use settings::{FileSettingsStore, SettingsStore, TestDuration, TestSettings};
