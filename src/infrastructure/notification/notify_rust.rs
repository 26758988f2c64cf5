//! Desktop notification adapter using notify-rust
//!
//! Works on Windows, macOS, and Linux.

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};
use crate::application::APP_NAME;

/// Desktop notifier backed by notify-rust
pub struct NotifyRustNotifier {
    app_name: String,
}

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self::with_app_name(APP_NAME)
    }

    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Default for NotifyRustNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        let title = title.to_owned();
        let message = message.to_owned();
        let app_name = self.app_name.clone();
        let icon_name = icon.icon_name();
        let timeout = display_time(icon);

        // notify-rust can block on the session bus
        tokio::task::spawn_blocking(move || {
            Notification::new()
                .appname(&app_name)
                .summary(&title)
                .body(&message)
                .icon(icon_name)
                .timeout(timeout)
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}

/// A match stays up long enough to read; "Listening..." is gone before the clip ends
fn display_time(icon: NotificationIcon) -> Timeout {
    match icon {
        NotificationIcon::Listening => Timeout::Milliseconds(3_000),
        NotificationIcon::Match => Timeout::Milliseconds(10_000),
        NotificationIcon::Warning | NotificationIcon::Error => Timeout::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_outlive_the_listening_notice() {
        assert_eq!(display_time(NotificationIcon::Listening), Timeout::Milliseconds(3_000));
        assert_eq!(display_time(NotificationIcon::Match), Timeout::Milliseconds(10_000));
        assert_eq!(display_time(NotificationIcon::Error), Timeout::Default);
    }

    #[test]
    fn default_app_name() {
        let notifier = NotifyRustNotifier::default();
        assert_eq!(notifier.app_name, "AudioPrint");
    }

    #[test]
    fn custom_app_name() {
        let notifier = NotifyRustNotifier::with_app_name("TestApp");
        assert_eq!(notifier.app_name, "TestApp");
    }
}
