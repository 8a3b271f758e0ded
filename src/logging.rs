use std::fs::{self, OpenOptions};
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Environment variable overriding the log filter, e.g. `TYPEMASTER_LOG=debug`
pub const LOG_ENV: &str = "TYPEMASTER_LOG";

/// Send log output to `path`. The terminal belongs to the UI while a test
/// runs, so nothing is ever written to stderr. Failure to set up logging is
/// reported once and otherwise ignored.
pub fn init(path: &Path) {
    if let Err(e) = try_init(path) {
        eprintln!("typemaster: logging disabled: {e}");
    }
}

fn try_init(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Builder::from_env(Env::default().filter_or(LOG_ENV, "info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("typemaster.log");
        init(&path);
        assert!(path.exists());
        // a second init is harmless
        init(&path);
    }
}
