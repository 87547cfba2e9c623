/// Draft model: an unsent letter owned by its author.

use super::{DataUrl, LetterExtras, LetterStyle, UserId};
use crate::collection::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

uuid_id!(DraftId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: DraftId,
    pub owner_id: UserId,
    /// Intended recipient's username; may be empty or not resolve yet.
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub style: LetterStyle,
    #[serde(default)]
    pub signature: Option<DataUrl>,
    #[serde(default)]
    pub extras: LetterExtras,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(owner_id: UserId, recipient: String, content: String, style: LetterStyle) -> Self {
        let now = Utc::now();
        Draft {
            id: DraftId::new(),
            owner_id,
            recipient,
            content,
            style,
            signature: None,
            extras: LetterExtras::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Record for Draft {
    type Id = DraftId;

    fn id(&self) -> DraftId {
        self.id
    }
}
