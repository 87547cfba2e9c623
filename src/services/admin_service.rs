/// Admin service: user management for admins and the superadmin.

use crate::error::{AppError, Result};
use crate::models::{Role, User, UserId};
use crate::services::StorageService;
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_letters: usize,
    pub letters_today: usize,
    pub unread_letters: usize,
}

#[derive(Clone)]
pub struct AdminService {
    storage: StorageService,
}

impl AdminService {
    pub fn new(storage: StorageService) -> Self {
        AdminService { storage }
    }

    pub fn list_users(&self, me: &User) -> Result<Vec<User>> {
        require_admin(me)?;
        let mut users = self.storage.users.load()?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// Users whose username, email, full name or mobile contains `term`.
    pub fn search_users(&self, me: &User, term: &str) -> Result<Vec<User>> {
        let term = term.trim().to_lowercase();
        let mut users = self.list_users(me)?;
        if !term.is_empty() {
            users.retain(|u| {
                u.username.to_lowercase().contains(&term)
                    || u.email.to_lowercase().contains(&term)
                    || u.full_name.to_lowercase().contains(&term)
                    || u.mobile.contains(&term)
            });
        }
        Ok(users)
    }

    /// Delete a user and everything that belongs to them in one commit.
    pub fn delete_user(&self, me: &User, id: UserId) -> Result<()> {
        require_admin(me)?;
        let target = self.target(id)?;
        if target.role == Role::Superadmin {
            return Err(AppError::Forbidden("the superadmin cannot be deleted".to_string()));
        }

        self.storage.transact(|tx| self.storage.stage_purge_user(tx, id))?;
        log::info!("{} deleted user {}", me.username, target.username);
        Ok(())
    }

    pub fn toggle_active(&self, me: &User, id: UserId) -> Result<User> {
        require_admin(me)?;
        if self.target(id)?.role == Role::Superadmin {
            return Err(AppError::Forbidden("the superadmin cannot be deactivated".to_string()));
        }

        let user = self
            .storage
            .users
            .update(id, |u| u.is_active = !u.is_active)?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;
        log::info!(
            "{} {} user {}",
            me.username,
            if user.is_active { "activated" } else { "deactivated" },
            user.username
        );
        Ok(user)
    }

    /// Promote or demote a user. Only the superadmin may do this, and the
    /// superadmin role itself is never granted or taken away.
    pub fn set_role(&self, me: &User, id: UserId, role: Role) -> Result<User> {
        if me.role != Role::Superadmin {
            return Err(AppError::Forbidden("only the superadmin can change roles".to_string()));
        }
        if role == Role::Superadmin || self.target(id)?.role == Role::Superadmin {
            return Err(AppError::Forbidden("the superadmin role cannot be reassigned".to_string()));
        }

        let user = self
            .storage
            .users
            .update(id, |u| u.role = role)?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;
        log::info!("{} set role of {} to {}", me.username, user.username, role);
        Ok(user)
    }

    pub fn stats(&self, me: &User) -> Result<AdminStats> {
        require_admin(me)?;
        let users = self.storage.users.load()?;
        let letters = self.storage.letters.load()?;
        let today = Utc::now().date_naive();

        Ok(AdminStats {
            total_users: users.len(),
            total_letters: letters.len(),
            letters_today: letters
                .iter()
                .filter(|l| l.created_at.date_naive() == today)
                .count(),
            unread_letters: letters.iter().filter(|l| !l.is_read && !l.is_trashed()).count(),
        })
    }

    fn target(&self, id: UserId) -> Result<User> {
        self.storage
            .find_user(id)?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }
}

fn require_admin(me: &User) -> Result<()> {
    if me.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin access required".to_string()))
    }
}
