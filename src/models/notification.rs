/// In-app notifications addressed to a single user.

use super::UserId;
use crate::collection::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id!(NotificationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Message,
    System,
    Star,
    Trash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: UserId, kind: NotificationKind, title: String, message: String) -> Self {
        Notification {
            id: NotificationId::new(),
            user_id,
            kind,
            title,
            message,
            read: false,
            created_at: Utc::now(),
        }
    }
}

impl Record for Notification {
    type Id = NotificationId;

    fn id(&self) -> NotificationId {
        self.id
    }
}
