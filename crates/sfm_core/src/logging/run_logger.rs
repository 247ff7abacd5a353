//! Line-oriented run logger with console and optional file output.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Logger for one pipeline run.
///
/// Every line goes to the callback (stdout for [`RunLogger::console`]) and,
/// once [`RunLogger::attach_file`] has been called, to a log file as well.
pub struct RunLogger {
    config: LogConfig,
    callback: Option<LogCallback>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    log_path: Mutex<Option<PathBuf>>,
}

impl RunLogger {
    /// Create a logger that sends lines to `callback` (or nowhere).
    pub fn new(config: LogConfig, callback: Option<LogCallback>) -> Self {
        Self {
            config,
            callback,
            file_writer: Mutex::new(None),
            log_path: Mutex::new(None),
        }
    }

    /// Create a logger that prints every line to stdout.
    pub fn console(config: LogConfig) -> Self {
        Self::new(config, Some(Box::new(|line| println!("{}", line))))
    }

    /// Logger that drops everything.
    pub fn silent() -> Self {
        Self::new(LogConfig::default(), None)
    }

    /// Also append every line to `path`, creating parent directories.
    pub fn attach_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        *self.file_writer.lock() = Some(BufWriter::new(file));
        *self.log_path.lock() = Some(path.to_path_buf());
        Ok(())
    }

    /// Path of the attached log file, if any.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_path.lock().clone()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log a command line about to be executed.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a stage banner.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, &msg);
    }

    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, &msg);
    }

    pub fn skipped(&self, message: &str) {
        let msg = MessagePrefix::Skipped.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and detach the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = self.callback {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RunLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLogger")
            .field("config", &self.config)
            .field("log_path", &*self.log_path.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn plain() -> LogConfig {
        LogConfig {
            level: LogLevel::Info,
            show_timestamps: false,
        }
    }

    #[test]
    fn writes_to_attached_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("sfm_run.log");
        let logger = RunLogger::new(plain(), None);

        logger.attach_file(&path).unwrap();
        logger.phase("Mapping");
        logger.flush();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("=== Mapping ==="));
        assert_eq!(logger.log_path(), Some(path));
    }

    #[test]
    fn calls_callback_per_line() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let count_clone = call_count.clone();
        let callback: LogCallback = Box::new(move |_msg| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let logger = RunLogger::new(plain(), Some(callback));
        logger.info("Message 1");
        logger.command("colmap --help");

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn filters_below_configured_level() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = lines.clone();
        let logger = RunLogger::new(
            plain(),
            Some(Box::new(move |line| sink.lock().push(line.to_string()))),
        );

        logger.debug("hidden");
        logger.warn("shown");

        assert_eq!(*lines.lock(), vec!["[WARNING] shown".to_string()]);
    }

    #[test]
    fn timestamps_are_prefixed() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = lines.clone();
        let logger = RunLogger::new(
            LogConfig::default(),
            Some(Box::new(move |line| sink.lock().push(line.to_string()))),
        );

        logger.info("tick");

        let line = lines.lock()[0].clone();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] tick"));
    }
}
