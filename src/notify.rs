use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Всплывающее сообщение для пользователя
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct Notifier {
    ttl: Duration,
    items: RwLock<Vec<Notification>>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            items: RwLock::new(Vec::new()),
        }
    }

    pub async fn push(&self, level: NotificationLevel, message: impl Into<String>) -> Notification {
        let now = Utc::now();
        let notification = Notification {
            id: Uuid::new_v4().simple().to_string(),
            level,
            message: message.into(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut items = self.items.write().await;
        items.retain(|n| n.expires_at > now);
        items.push(notification.clone());
        notification
    }

    /// Сообщения, которые ещё не истекли
    pub async fn active(&self) -> Vec<Notification> {
        self.active_at(Utc::now()).await
    }

    async fn active_at(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let items = self.items.read().await;
        items.iter().filter(|n| n.expires_at > now).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_expire_after_ttl() {
        let notifier = Notifier::new(Duration::seconds(3));
        let pushed = notifier.push(NotificationLevel::Success, "done").await;

        let active = notifier.active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, pushed.id);

        let later = pushed.created_at + Duration::seconds(4);
        assert!(notifier.active_at(later).await.is_empty());
    }

    #[tokio::test]
    async fn keeps_newest_last() {
        let notifier = Notifier::new(Duration::seconds(3));
        notifier.push(NotificationLevel::Success, "first").await;
        notifier.push(NotificationLevel::Error, "second").await;

        let active = notifier.active().await;
        assert_eq!(active.len(), 2);
        assert_eq!(active[1].level, NotificationLevel::Error);
    }
}
