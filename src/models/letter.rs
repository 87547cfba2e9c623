/// Letter model.
///
/// A letter is stored exactly once. Inbox, sent, starred, archive and trash
/// are views over the same record, selected through [`Folder`].

use super::{DataUrl, Preferences, UserId};
use crate::collection::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

uuid_id!(LetterId);

/// Who wrote the letter: a registered user, or a visitor writing through a
/// public profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Sender {
    User { id: UserId },
    Guest { name: String, email: String },
}

impl Sender {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Sender::User { id } => Some(*id),
            Sender::Guest { .. } => None,
        }
    }
}

/// Stationery chosen for a letter. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LetterStyle {
    pub paper_style: String,
    pub ink_color: String,
    pub font_style: String,
    pub seal_style: String,
    pub stamp_style: String,
}

impl Default for LetterStyle {
    fn default() -> Self {
        LetterStyle::from(&Preferences::default())
    }
}

impl From<&Preferences> for LetterStyle {
    fn from(prefs: &Preferences) -> Self {
        LetterStyle {
            paper_style: prefs.paper_style.clone(),
            ink_color: prefs.ink_color.clone(),
            font_style: prefs.font_style.clone(),
            seal_style: prefs.seal_style.clone(),
            stamp_style: prefs.stamp_style.clone(),
        }
    }
}

/// Optional decorations attached while composing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LetterExtras {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub id: LetterId,
    pub sender: Sender,
    pub recipient_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub style: LetterStyle,
    #[serde(default)]
    pub signature: Option<DataUrl>,
    #[serde(default)]
    pub extras: LetterExtras,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_replied: bool,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub trashed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_public: bool,
}

impl Letter {
    pub fn new(sender: Sender, recipient_id: UserId, content: String, style: LetterStyle) -> Self {
        let is_public = matches!(sender, Sender::Guest { .. });
        Letter {
            id: LetterId::new(),
            sender,
            recipient_id,
            content,
            created_at: Utc::now(),
            style,
            signature: None,
            extras: LetterExtras::default(),
            is_read: false,
            is_replied: false,
            is_starred: false,
            is_archived: false,
            trashed_at: None,
            is_public,
        }
    }

    pub fn is_sender(&self, user: UserId) -> bool {
        self.sender.user_id() == Some(user)
    }

    pub fn is_recipient(&self, user: UserId) -> bool {
        self.recipient_id == user
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.is_sender(user) || self.is_recipient(user)
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed_at.is_some()
    }
}

impl Record for Letter {
    type Id = LetterId;

    fn id(&self) -> LetterId {
        self.id
    }
}

/// Mailbox views over the letters collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Inbox,
    Sent,
    Starred,
    Archive,
    Trash,
}

impl Folder {
    /// Whether `letter` shows up in this folder for `user`.
    pub fn contains(self, letter: &Letter, user: UserId) -> bool {
        if !letter.involves(user) {
            return false;
        }
        match self {
            Folder::Trash => letter.is_trashed(),
            _ if letter.is_trashed() => false,
            Folder::Inbox => letter.is_recipient(user) && !letter.is_archived,
            Folder::Sent => letter.is_sender(user),
            Folder::Starred => letter.is_starred,
            Folder::Archive => letter.is_archived,
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Folder::Inbox => "inbox",
            Folder::Sent => "sent",
            Folder::Starred => "starred",
            Folder::Archive => "archive",
            Folder::Trash => "trash",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(from: UserId, to: UserId) -> Letter {
        Letter::new(
            Sender::User { id: from },
            to,
            "hello".to_string(),
            LetterStyle::default(),
        )
    }

    #[test]
    fn test_letter_creation() {
        let alice = UserId::new();
        let bob = UserId::new();
        let l = letter(alice, bob);

        assert!(l.is_sender(alice));
        assert!(l.is_recipient(bob));
        assert!(!l.is_read);
        assert!(!l.is_public);
        assert_eq!(l.style.seal_style, "red");
    }

    #[test]
    fn test_guest_letter_is_public() {
        let bob = UserId::new();
        let l = Letter::new(
            Sender::Guest {
                name: "Visitor".to_string(),
                email: "v@example.com".to_string(),
            },
            bob,
            "hi".to_string(),
            LetterStyle::default(),
        );
        assert!(l.is_public);
        assert!(l.sender.user_id().is_none());
    }

    #[test]
    fn test_folder_membership() {
        let alice = UserId::new();
        let bob = UserId::new();
        let carol = UserId::new();
        let mut l = letter(alice, bob);

        assert!(Folder::Inbox.contains(&l, bob));
        assert!(!Folder::Inbox.contains(&l, alice));
        assert!(Folder::Sent.contains(&l, alice));
        assert!(!Folder::Sent.contains(&l, carol));

        l.is_starred = true;
        l.is_archived = true;
        assert!(!Folder::Inbox.contains(&l, bob));
        assert!(Folder::Archive.contains(&l, bob));
        assert!(Folder::Starred.contains(&l, alice));

        l.trashed_at = Some(Utc::now());
        assert!(Folder::Trash.contains(&l, bob));
        for folder in [Folder::Inbox, Folder::Sent, Folder::Starred, Folder::Archive] {
            assert!(!folder.contains(&l, alice));
            assert!(!folder.contains(&l, bob));
        }
    }

    #[test]
    fn test_letter_serialization() {
        let l = letter(UserId::new(), UserId::new());
        let json = serde_json::to_string(&l).unwrap();
        assert!(json.contains("\"kind\":\"user\""));
        assert!(json.contains("\"recipientId\""));

        let back: Letter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, l);
    }
}
