//! Process-wide `tracing` setup plus the user-facing activity log.

use chrono::{DateTime, Local};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_tracing(default_filter: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_names(true)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Local>,
    pub level: ActivityLevel,
    pub message: String,
}

impl ActivityEntry {
    pub fn to_log_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Append-only activity log shown in the UI. Every entry is mirrored to
/// `tracing`, so nothing is lost when the panel is cleared.
#[derive(Debug, Default, Clone)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(ActivityLevel::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(ActivityLevel::Error, message);
    }

    fn push(&mut self, level: ActivityLevel, message: String) {
        self.entries.push(ActivityEntry {
            timestamp: Local::now(),
            level,
            message,
        });
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityLevel, ActivityLog};

    #[test]
    fn records_levels_in_order_and_clears() {
        let mut log = ActivityLog::default();
        log.info("first");
        log.error("second");
        let levels: Vec<ActivityLevel> = log.entries().iter().map(|entry| entry.level).collect();
        assert_eq!(levels, vec![ActivityLevel::Info, ActivityLevel::Error]);
        assert!(log.entries()[1].to_log_line().ends_with("] second"));

        log.clear();
        assert!(log.entries().is_empty());
    }
}
