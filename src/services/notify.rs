use std::collections::VecDeque;

/// Notice severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Info,
    /// Something degraded but kept working.
    Warning,
    /// An operation failed.
    Error,
}

/// One user-visible message.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Notice {
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}

/// Bounded queue of user-visible messages, drained by the host shell.
#[derive(Clone, Debug)]
pub struct Notifications {
    queue: VecDeque<Notice>,
    capacity: usize,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl Notifications {
    /// Queue keeping at most `capacity` messages; the oldest are dropped first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Post a message.
    pub fn post(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => tracing::info!(%message, "notice"),
            Severity::Warning => tracing::warn!(%message, "notice"),
            Severity::Error => tracing::error!(%message, "notice"),
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(Notice { severity, message });
    }

    /// Post an informational message.
    pub fn info(&mut self, message: impl Into<String>) {
        self.post(Severity::Info, message);
    }

    /// Post an error message.
    pub fn error(&mut self, message: impl Into<String>) {
        self.post(Severity::Error, message);
    }

    /// Pending messages, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    /// Take every pending message.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Return `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/notify.rs"]
mod tests;
