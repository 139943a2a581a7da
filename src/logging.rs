use std::path::Path;

use log::LevelFilter;
use simplelog::{SimpleLogger, WriteLogger};

use crate::config::LoggingConfig;

/// Install the process logger.
///
/// `verbose` logs everything at debug level to stderr. Otherwise records
/// at the configured level are appended to the configured file.
/// Best-effort: failures are silently ignored (logging must never stop the shell).
pub fn init(config: &LoggingConfig, verbose: bool) {
    let settings = simplelog::Config::default();

    if verbose {
        let _ = SimpleLogger::init(LevelFilter::Debug, settings);
        return;
    }

    let level = config.level_filter();
    if level == LevelFilter::Off {
        return;
    }
    let Some(path) = config.file_path() else {
        return;
    };
    let Some(file) = open_log_file(&path) else {
        return;
    };
    let _ = WriteLogger::init(level, settings, file);
}

/// Open `path` for appending, creating its directory first.
fn open_log_file(path: &Path) -> Option<std::fs::File> {
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}
