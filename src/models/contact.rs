/// Address-book entries. A contact is free-form and need not match an account.

use super::UserId;
use crate::collection::Record;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

uuid_id!(ContactId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Online,
    #[default]
    Offline,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactGroup {
    Family,
    Friends,
    Work,
    #[default]
    Other,
}

impl ContactGroup {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "family" => Ok(ContactGroup::Family),
            "friends" => Ok(ContactGroup::Friends),
            "work" => Ok(ContactGroup::Work),
            "other" => Ok(ContactGroup::Other),
            other => Err(AppError::Validation(format!("Unknown contact group: {}", other))),
        }
    }
}

impl fmt::Display for ContactGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContactGroup::Family => "family",
            ContactGroup::Friends => "friends",
            ContactGroup::Work => "work",
            ContactGroup::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub owner_id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub group: ContactGroup,
    #[serde(default)]
    pub notes: Option<String>,
    pub last_contact: DateTime<Utc>,
}

impl Contact {
    pub fn new(owner_id: UserId, name: String, email: String) -> Self {
        Contact {
            id: ContactId::new(),
            owner_id,
            name,
            email,
            phone: None,
            location: None,
            status: ContactStatus::Offline,
            is_favorite: false,
            is_blocked: false,
            group: ContactGroup::Other,
            notes: None,
            last_contact: Utc::now(),
        }
    }

    /// Case-insensitive match on name and email, plain substring on phone.
    pub fn matches(&self, term: &str) -> bool {
        let term_lower = term.to_lowercase();
        self.name.to_lowercase().contains(&term_lower)
            || self.email.to_lowercase().contains(&term_lower)
            || self.phone.as_deref().is_some_and(|p| p.contains(term))
    }
}

impl Record for Contact {
    type Id = ContactId;

    fn id(&self) -> ContactId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_defaults() {
        let contact = Contact::new(UserId::new(), "Nila".to_string(), "nila@example.com".to_string());
        assert_eq!(contact.group, ContactGroup::Other);
        assert_eq!(contact.status, ContactStatus::Offline);
        assert!(!contact.is_favorite);
        assert!(!contact.is_blocked);
    }

    #[test]
    fn test_contact_matches() {
        let mut contact = Contact::new(UserId::new(), "Nila Sen".to_string(), "NILA@example.com".to_string());
        contact.phone = Some("+880 1711".to_string());

        assert!(contact.matches("nila"));
        assert!(contact.matches("EXAMPLE"));
        assert!(contact.matches("1711"));
        assert!(!contact.matches("karim"));
    }

    #[test]
    fn test_group_parse() {
        assert_eq!(ContactGroup::parse("Work").unwrap(), ContactGroup::Work);
        assert!(ContactGroup::parse("enemies").is_err());
    }
}
