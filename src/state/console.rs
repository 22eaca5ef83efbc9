// Console tab state.
// Activity log of notices, connectivity changes, and background failures.

use chrono::{DateTime, Utc};
use ratatui::widgets::ListState;

/// Console message level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Warn,
    Error,
}

/// A console message for the activity log.
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConsoleMessage {
    fn new(level: ConsoleLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Error, message)
    }
}

/// Complete state for the Console tab.
#[derive(Debug, Default)]
pub struct ConsoleState {
    pub messages: Vec<ConsoleMessage>,
    /// Errors and warnings logged since the tab was last viewed.
    pub unread: usize,
    pub list_state: ListState,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ConsoleMessage) {
        match message.level {
            ConsoleLevel::Info => log::info!("{}", message.message),
            ConsoleLevel::Warn => {
                log::warn!("{}", message.message);
                self.unread += 1;
            }
            ConsoleLevel::Error => {
                log::error!("{}", message.message);
                self.unread += 1;
            }
        }
        self.messages.push(message);
        // Rendered newest first, so the newest is at index 0.
        self.list_state.select(Some(0));
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::info(message));
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::warn(message));
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::error(message));
    }

    pub fn mark_read(&mut self) {
        self.unread = 0;
    }

    pub fn select_prev(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let i = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(i));
    }

    pub fn select_next(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let last = self.messages.len() - 1;
        let i = self.list_state.selected().map_or(0, |i| (i + 1).min(last));
        self.list_state.select(Some(i));
    }
}
