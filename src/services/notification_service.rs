/// Notification service: per-user in-app notices.

use crate::error::{AppError, Result};
use crate::models::{Notification, NotificationId, NotificationKind, User};
use crate::services::StorageService;

#[derive(Clone)]
pub struct NotificationService {
    storage: StorageService,
}

impl NotificationService {
    pub fn new(storage: StorageService) -> Self {
        NotificationService { storage }
    }

    pub fn notify(&self, user: &User, kind: NotificationKind, title: &str, message: &str) -> Result<Notification> {
        let notification = Notification::new(user.id, kind, title.to_string(), message.to_string());
        self.storage.notifications.append(notification.clone())?;
        log::debug!("Notified {}: {}", user.username, title);
        Ok(notification)
    }

    /// Notifications for `me`, newest first.
    pub fn list(&self, me: &User) -> Result<Vec<Notification>> {
        let mut notifications = self.storage.notifications.filter(|n| n.user_id == me.id)?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub fn unread_count(&self, me: &User) -> Result<usize> {
        Ok(self
            .storage
            .notifications
            .filter(|n| n.user_id == me.id && !n.read)?
            .len())
    }

    pub fn mark_read(&self, me: &User, id: NotificationId) -> Result<()> {
        self.storage.notifications.modify(|notifications| {
            let notification = notifications
                .iter_mut()
                .find(|n| n.id == id && n.user_id == me.id)
                .ok_or_else(|| AppError::NotFound(format!("notification {}", id)))?;
            notification.read = true;
            Ok(())
        })
    }

    /// Returns how many notifications changed state.
    pub fn mark_all_read(&self, me: &User) -> Result<usize> {
        self.storage.notifications.modify(|notifications| {
            let mut changed = 0;
            for n in notifications.iter_mut().filter(|n| n.user_id == me.id && !n.read) {
                n.read = true;
                changed += 1;
            }
            Ok(changed)
        })
    }

    pub fn clear_all(&self, me: &User) -> Result<usize> {
        let removed = self.storage.notifications.retain(|n| n.user_id != me.id)?;
        log::info!("Cleared {} notifications for {}", removed, me.username);
        Ok(removed)
    }
}
