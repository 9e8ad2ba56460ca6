use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::constants::NOTIFICATION_TTL_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Short-lived toast shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub shown_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now - self.shown_at < Duration::seconds(NOTIFICATION_TTL_SECS)
    }
}

/// Holds the single current toast; a new one replaces the previous
#[derive(Debug, Default)]
pub struct Notifier {
    last: Option<Notification>,
}

impl Notifier {
    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) {
        let message = message.into();
        match kind {
            NotificationKind::Error => tracing::error!("Notification: {}", message),
            NotificationKind::Warning => tracing::warn!("Notification: {}", message),
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!("Notification: {}", message)
            }
        }

        self.last = Some(Notification {
            message,
            kind,
            shown_at: Utc::now(),
        });
    }

    /// The toast still on screen, if any
    pub fn current(&self) -> Option<&Notification> {
        self.current_at(Utc::now())
    }

    pub fn current_at(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.last.as_ref().filter(|n| n.is_visible_at(now))
    }

    /// Most recent toast, dismissed or not
    pub fn last(&self) -> Option<&Notification> {
        self.last.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_auto_dismisses() {
        let mut notifier = Notifier::default();
        notifier.show("Post saved successfully", NotificationKind::Success);

        let shown_at = notifier.last().unwrap().shown_at;
        assert!(notifier.current_at(shown_at).is_some());
        assert!(notifier
            .current_at(shown_at + Duration::milliseconds(2_999))
            .is_some());
        assert!(notifier
            .current_at(shown_at + Duration::seconds(NOTIFICATION_TTL_SECS))
            .is_none());

        // Still available for inspection after it left the screen
        assert_eq!(notifier.last().unwrap().kind, NotificationKind::Success);
    }

    #[test]
    fn test_new_notification_replaces_previous() {
        let mut notifier = Notifier::default();
        notifier.show("first", NotificationKind::Info);
        notifier.show("second", NotificationKind::Warning);

        let current = notifier.current().unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, NotificationKind::Warning);

        notifier.dismiss();
        assert!(notifier.last().is_none());
    }
}
