/// Account service: registration, sign-in and self-service profile changes.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::keys;
use crate::models::{DataUrl, Preferences, Role, User};
use crate::services::{SessionService, StorageService};
use chrono::{DateTime, Utc};

/// Registration form.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub mobile: String,
    pub address: String,
    pub profile_image: Option<DataUrl>,
}

/// Profile edits; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub profile_image: Option<DataUrl>,
}

/// What anyone can see of an account through its username.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicProfile {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub member_since: DateTime<Utc>,
    pub letters_received: usize,
}

/// The one credential pair that signs in as superadmin.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl From<&Config> for AdminCredentials {
    fn from(config: &Config) -> Self {
        AdminCredentials {
            email: config.admin_email.clone(),
            password: config.admin_password.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    storage: StorageService,
    session: SessionService,
    admin: AdminCredentials,
}

impl AccountService {
    pub fn new(storage: StorageService, session: SessionService, admin: AdminCredentials) -> Self {
        AccountService {
            storage,
            session,
            admin,
        }
    }

    /// Create an account and sign it in.
    ///
    /// The duplicate check and the insert commit together, so two concurrent
    /// registrations of the same username cannot both succeed.
    pub fn register(&self, form: NewUser) -> Result<User> {
        if form.password != form.confirm_password {
            return Err(AppError::PasswordMismatch);
        }
        if form.mobile.trim().is_empty() {
            return Err(AppError::Validation("Mobile number is required".to_string()));
        }
        validate_username(&form.username)?;
        validate_email(&form.email)?;
        if form.password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        if form.email.eq_ignore_ascii_case(&self.admin.email) {
            return Err(AppError::AlreadyExists(format!("email '{}'", form.email)));
        }

        let user = self.storage.transact(|tx| {
            let mut users = tx.read(&self.storage.users)?;
            if users.iter().any(|u| u.username == form.username) {
                return Err(AppError::AlreadyExists(format!("username '{}'", form.username)));
            }
            if users.iter().any(|u| u.email.eq_ignore_ascii_case(&form.email)) {
                return Err(AppError::AlreadyExists(format!("email '{}'", form.email)));
            }

            let mut user = User::new(form.username.clone(), form.email.clone(), form.password.clone());
            user.full_name = form.full_name.clone();
            user.mobile = form.mobile.clone();
            user.address = form.address.clone();
            user.profile_image = form.profile_image.clone();

            users.push(user.clone());
            tx.write(&self.storage.users, &users)?;
            self.session.stage_sign_in(tx, user.id)?;
            Ok(user)
        })?;

        log::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Sign in by email (or username) and password.
    pub fn login(&self, identifier: &str, password: &str) -> Result<User> {
        if identifier == self.admin.email && password == self.admin.password {
            return self.login_superadmin();
        }

        let user = self
            .storage
            .users
            .find_by(|u| (u.email == identifier || u.username == identifier) && u.password == password)?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::AuthError("Account is deactivated".to_string()));
        }

        self.session.sign_in(&user)?;
        Ok(user)
    }

    /// Sign in as superadmin, creating the account on first use.
    fn login_superadmin(&self) -> Result<User> {
        let user = self.storage.transact(|tx| {
            let mut users = tx.read(&self.storage.users)?;

            let user = match users.iter_mut().find(|u| u.email == self.admin.email) {
                Some(existing) => {
                    existing.role = Role::Superadmin;
                    existing.is_active = true;
                    existing.password = self.admin.password.clone();
                    existing.clone()
                }
                None => {
                    let username = free_username(&users, "superadmin");
                    let mut admin = User::new(username, self.admin.email.clone(), self.admin.password.clone());
                    admin.role = Role::Superadmin;
                    admin.full_name = "Super Admin".to_string();
                    log::info!("Creating superadmin account {}", admin.username);
                    users.push(admin.clone());
                    admin
                }
            };

            tx.write(&self.storage.users, &users)?;
            self.session.stage_sign_in(tx, user.id)?;
            Ok(user)
        })?;

        log::info!("Superadmin signed in");
        Ok(user)
    }

    pub fn logout(&self) -> Result<()> {
        self.session.sign_out()
    }

    pub fn update_profile(&self, me: &User, update: ProfileUpdate) -> Result<User> {
        if let Some(username) = &update.username {
            validate_username(username)?;
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
        }

        self.storage.users.modify(|users| {
            if let Some(username) = &update.username {
                if users.iter().any(|u| u.id != me.id && u.username == *username) {
                    return Err(AppError::AlreadyExists(format!("username '{}'", username)));
                }
            }
            if let Some(email) = &update.email {
                if users.iter().any(|u| u.id != me.id && u.email.eq_ignore_ascii_case(email)) {
                    return Err(AppError::AlreadyExists(format!("email '{}'", email)));
                }
            }

            let user = users
                .iter_mut()
                .find(|u| u.id == me.id)
                .ok_or_else(|| AppError::NotFound(format!("user {}", me.id)))?;

            let update = update.clone();
            if let Some(v) = update.username {
                user.username = v;
            }
            if let Some(v) = update.email {
                user.email = v;
            }
            if let Some(v) = update.full_name {
                user.full_name = v;
            }
            if let Some(v) = update.mobile {
                user.mobile = v;
            }
            if let Some(v) = update.address {
                user.address = v;
            }
            if update.bio.is_some() {
                user.bio = update.bio;
            }
            if update.location.is_some() {
                user.location = update.location;
            }
            if update.website.is_some() {
                user.website = update.website;
            }
            if update.profile_image.is_some() {
                user.profile_image = update.profile_image;
            }
            Ok(user.clone())
        })
    }

    pub fn update_preferences(&self, me: &User, mut f: impl FnMut(&mut Preferences)) -> Result<User> {
        let user = self
            .storage
            .users
            .update(me.id, |u| f(&mut u.preferences))?
            .ok_or_else(|| AppError::NotFound(format!("user {}", me.id)))?;
        log::debug!("Updated preferences for {}", user.username);
        Ok(user)
    }

    /// Set one preference by its stored name against the latest stored
    /// preferences. An unknown name or a bad value writes nothing.
    pub fn set_preference(&self, me: &User, name: &str, value: &str) -> Result<User> {
        let user = self.storage.users.modify(|users| {
            let user = users
                .iter_mut()
                .find(|u| u.id == me.id)
                .ok_or_else(|| AppError::NotFound(format!("user {}", me.id)))?;
            user.preferences.set(name, value)?;
            Ok(user.clone())
        })?;
        log::debug!("Set preference {} for {}", name, user.username);
        Ok(user)
    }

    pub fn change_password(&self, me: &User, current: &str, new: &str, confirm: &str) -> Result<()> {
        if new != confirm {
            return Err(AppError::PasswordMismatch);
        }
        if new.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        self.storage.users.modify(|users| {
            let user = users
                .iter_mut()
                .find(|u| u.id == me.id)
                .ok_or_else(|| AppError::NotFound(format!("user {}", me.id)))?;
            if user.password != current {
                return Err(AppError::InvalidCredentials);
            }
            user.password = new.to_string();
            Ok(())
        })?;

        log::info!("Password changed for {}", me.username);
        Ok(())
    }

    /// Delete the signed-in account with all of its letters, drafts,
    /// contacts and notifications, then sign out.
    pub fn delete_account(&self, me: &User) -> Result<()> {
        self.storage.transact(|tx| {
            self.storage.stage_purge_user(tx, me.id)?;
            tx.remove_raw(keys::CURRENT_USER);
            Ok(())
        })?;
        log::info!("Deleted account {}", me.username);
        Ok(())
    }

    /// Look up an account's public profile, with how many letters it has received.
    pub fn public_profile(&self, username: &str) -> Result<PublicProfile> {
        let user = self
            .storage
            .find_user_by_username(username)?
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))?;
        let letters_received = self.storage.letters.filter(|l| l.recipient_id == user.id)?.len();

        Ok(PublicProfile {
            display_name: user.display_name().to_string(),
            username: user.username,
            email: user.email,
            bio: user.bio,
            location: user.location,
            website: user.website,
            member_since: user.created_at,
            letters_received,
        })
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation("Username cannot contain spaces".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("'{}' is not an email address", email))),
    }
}

fn free_username(users: &[User], base: &str) -> String {
    let taken = |name: &str| users.iter().any(|u| u.username == name);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}{}", base, n))
        .find(|name| !taken(name))
        .unwrap_or_else(|| base.to_string())
}
