/// Settings the notifier is constructed with, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Logical channel notifications are published to.
    pub notify_channel: String,
}

impl NotifierConfig {
    pub fn new(notify_channel: impl Into<String>) -> Self {
        Self {
            notify_channel: notify_channel.into(),
        }
    }
}
