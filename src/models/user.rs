/// User model: an account plus its stationery and display preferences.

use super::DataUrl;
use crate::collection::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

uuid_id!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "superadmin" => Some(Role::Superadmin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        };
        f.write_str(name)
    }
}

/// Per-user defaults for composing and for the reading experience.
/// Any field missing from stored data falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub paper_style: String,
    pub ink_color: String,
    pub font_style: String,
    pub seal_style: String,
    pub stamp_style: String,
    pub theme: String,
    pub language: String,
    pub notifications: bool,
    pub sound_enabled: bool,
    pub font_size: String,
    pub high_contrast: bool,
    pub reduced_motion: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            paper_style: "classic".to_string(),
            ink_color: "black".to_string(),
            font_style: "handwritten".to_string(),
            seal_style: "red".to_string(),
            stamp_style: "classic".to_string(),
            theme: "light".to_string(),
            language: "bn".to_string(),
            notifications: true,
            sound_enabled: true,
            font_size: "medium".to_string(),
            high_contrast: false,
            reduced_motion: false,
        }
    }
}

impl Preferences {
    /// Set a preference by its stored (camelCase) name.
    pub fn set(&mut self, name: &str, value: &str) -> crate::error::Result<()> {
        let flag = || -> crate::error::Result<bool> {
            value.parse::<bool>().map_err(|_| {
                crate::error::AppError::Validation(format!("'{}' expects true or false", name))
            })
        };

        match name {
            "paperStyle" => self.paper_style = value.to_string(),
            "inkColor" => self.ink_color = value.to_string(),
            "fontStyle" => self.font_style = value.to_string(),
            "sealStyle" => self.seal_style = value.to_string(),
            "stampStyle" => self.stamp_style = value.to_string(),
            "theme" => self.theme = value.to_string(),
            "language" => self.language = value.to_string(),
            "fontSize" => self.font_size = value.to_string(),
            "notifications" => self.notifications = flag()?,
            "soundEnabled" => self.sound_enabled = flag()?,
            "highContrast" => self.high_contrast = flag()?,
            "reducedMotion" => self.reduced_motion = flag()?,
            _ => {
                return Err(crate::error::AppError::Validation(format!(
                    "Unknown preference: {}",
                    name
                )))
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Stored and compared as plain text.
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub profile_image: Option<DataUrl>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl User {
    pub fn new(username: String, email: String, password: String) -> Self {
        User {
            id: UserId::new(),
            username,
            email,
            password,
            full_name: String::new(),
            mobile: String::new(),
            address: String::new(),
            profile_image: None,
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
            bio: None,
            location: None,
            website: None,
            preferences: Preferences::default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Label used wherever a user is shown: full name if set, otherwise username.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

impl Record for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}
