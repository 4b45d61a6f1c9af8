use std::sync::{Arc, Mutex};

pub const LOG_MESSAGE_PREFIX: &str = "FMLTC_LOG - ";

/// Target attached to records emitted through the `log` facade.
pub const CRITICAL_TARGET: &str = "critical";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// `log` has no level above `Error`, so critical records share it and
    /// are told apart by [`CRITICAL_TARGET`].
    pub fn as_log_level(self) -> log::Level {
        match self {
            Severity::Critical | Severity::Error => log::Level::Error,
            Severity::Warning => log::Level::Warn,
            Severity::Info => log::Level::Info,
        }
    }

    fn target(self) -> &'static str {
        match self {
            Severity::Critical => CRITICAL_TARGET,
            _ => module_path!(),
        }
    }
}

pub fn format_log_line(message: &str) -> String {
    format!("{}{}", LOG_MESSAGE_PREFIX, message)
}

/// Writes a prefixed message at critical severity through the `log` facade.
pub fn log(message: &str) {
    FacadeSink.emit(Severity::Critical, &format_log_line(message));
}

/// Destination for log lines.
pub trait LogSink: Send + Sync {
    fn emit(&self, severity: Severity, line: &str);
}

/// Forwards records to whatever logger the process installed for `log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn emit(&self, severity: Severity, line: &str) {
        log::log!(target: severity.target(), severity.as_log_level(), "{}", line);
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Severity, String)> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, severity: Severity, line: &str) {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((severity, line.to_string()));
    }
}

/// Prefixing logger bound to an explicit sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn log(&self, message: &str) {
        self.sink.emit(Severity::Critical, &format_log_line(message));
    }

    pub fn log_with_severity(&self, severity: Severity, message: &str) {
        self.sink.emit(severity, &format_log_line(message));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Arc::new(FacadeSink))
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}
