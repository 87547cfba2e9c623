/// Session service: who is currently signed in.
///
/// Only the user id is persisted. The full record is always resolved from
/// the users collection, so profile and preference edits can never drift
/// away from what the session reports.

use crate::collection::Transaction;
use crate::error::{AppError, Result};
use crate::keys;
use crate::models::{User, UserId};
use crate::services::StorageService;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPointer {
    pub user_id: UserId,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionService {
    storage: StorageService,
}

impl SessionService {
    pub fn new(storage: StorageService) -> Self {
        SessionService { storage }
    }

    /// Point the session at `user`, replacing whoever was signed in.
    pub fn sign_in(&self, user: &User) -> Result<()> {
        let json = pointer_json(user.id)?;
        self.storage.store().set(keys::CURRENT_USER, &json)?;
        log::info!("Signed in as {}", user.username);
        Ok(())
    }

    /// Same as [`sign_in`](Self::sign_in) but staged into a larger transaction.
    pub(crate) fn stage_sign_in(&self, tx: &mut Transaction<'_>, user_id: UserId) -> Result<()> {
        tx.write_raw(keys::CURRENT_USER, pointer_json(user_id)?);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<()> {
        self.storage.store().remove(keys::CURRENT_USER)?;
        log::info!("Signed out");
        Ok(())
    }

    pub fn pointer(&self) -> Result<Option<SessionPointer>> {
        let Some(raw) = self.storage.store().get(keys::CURRENT_USER)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(pointer) => Ok(Some(pointer)),
            Err(e) => {
                log::warn!("Ignoring unreadable session pointer: {}", e);
                Ok(None)
            }
        }
    }

    /// The signed-in user, or `None`. A pointer to a deleted or deactivated
    /// account is cleared and reported as signed out.
    pub fn current_user(&self) -> Result<Option<User>> {
        let Some(pointer) = self.pointer()? else {
            return Ok(None);
        };

        match self.storage.find_user(pointer.user_id)? {
            Some(user) if user.is_active => Ok(Some(user)),
            Some(_) | None => {
                log::warn!("Session points at unavailable user {}, clearing", pointer.user_id);
                self.storage.store().remove(keys::CURRENT_USER)?;
                Ok(None)
            }
        }
    }

    pub fn require_user(&self) -> Result<User> {
        self.current_user()?.ok_or(AppError::NotSignedIn)
    }
}

fn pointer_json(user_id: UserId) -> Result<String> {
    let pointer = SessionPointer {
        user_id,
        signed_in_at: Utc::now(),
    };
    Ok(serde_json::to_string(&pointer)?)
}
