use anyhow::Result;
use backtrace::Backtrace;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt::Display};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    Error = 3,
    Warning = 2,
    Info = 1,
    Debug = 0,
}

impl LogSeverity {
    pub fn from_log_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogSeverity::Error,
            log::Level::Warn => LogSeverity::Warning,
            log::Level::Info => LogSeverity::Info,
            log::Level::Debug | log::Level::Trace => LogSeverity::Debug,
        }
    }

    // Bracketed tag used by the streamer log lines, ie "[WARN]"
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "[ERROR]" => Some(LogSeverity::Error),
            "[WARN]" => Some(LogSeverity::Warning),
            "[INFO]" => Some(LogSeverity::Info),
            "[DEBUG]" => Some(LogSeverity::Debug),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            LogSeverity::Error => "[ERROR]",
            LogSeverity::Warning => "[WARN]",
            LogSeverity::Info => "[INFO]",
            LogSeverity::Debug => "[DEBUG]",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub content: String,
}

pub fn set_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let err_str = format!(
            "What happened:\n{panic_info}\n\nBacktrace:\n{:?}",
            Backtrace::new()
        );

        log::error!("{err_str}");
    }))
}

pub fn show_e<E: Display>(e: E) {
    log::error!("{e}");
}

pub fn show_err<T, E: Display>(res: Result<T, E>) -> Option<T> {
    res.map_err(show_e).ok()
}

pub trait ToAny<T> {
    fn to_any(self) -> Result<T>;
}

impl<T> ToAny<T> for Option<T> {
    fn to_any(self) -> Result<T> {
        match self {
            Some(value) => Ok(value),
            None => Err(anyhow::anyhow!("Unexpected None")),
        }
    }
}

impl<T, E: Error + Send + Sync + 'static> ToAny<T> for Result<T, E> {
    fn to_any(self) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_tags() {
        for severity in [
            LogSeverity::Error,
            LogSeverity::Warning,
            LogSeverity::Info,
            LogSeverity::Debug,
        ] {
            assert_eq!(LogSeverity::from_tag(severity.tag()), Some(severity));
        }

        assert_eq!(LogSeverity::from_tag(" [WARN] "), Some(LogSeverity::Warning));
        assert_eq!(LogSeverity::from_tag("[TRACE]"), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(LogSeverity::Error > LogSeverity::Warning);
        assert!(LogSeverity::Info > LogSeverity::Debug);
    }
}
