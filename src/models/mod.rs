/// Data models for the letter store.
/// Defines User, Letter, Draft, Contact, Notification and their identifiers.

/// Declares a UUID-backed identifier newtype that serializes as a plain string.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(uuid::Uuid::new_v4())
            }

            pub fn parse(s: &str) -> crate::error::Result<Self> {
                uuid::Uuid::parse_str(s.trim()).map($name).map_err(|_| {
                    crate::error::AppError::Validation(format!(
                        "'{}' is not a valid {}",
                        s,
                        stringify!($name)
                    ))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

pub mod contact;
pub mod data_url;
pub mod draft;
pub mod letter;
pub mod notification;
pub mod user;

pub use contact::{Contact, ContactGroup, ContactId, ContactStatus};
pub use data_url::DataUrl;
pub use draft::{Draft, DraftId};
pub use letter::{Folder, Letter, LetterExtras, LetterId, LetterStyle, Sender};
pub use notification::{Notification, NotificationId, NotificationKind};
pub use user::{Preferences, Role, User, UserId};
