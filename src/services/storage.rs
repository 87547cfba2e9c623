/// Storage service: the typed collections every other service works through.

use crate::collection::{transact, Collection, Transaction};
use crate::error::Result;
use crate::keys;
use crate::models::{Contact, Draft, Letter, Notification, User, UserId};
use crate::storage::{KeyValueStore, LocalStore, MemoryStore};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
    pub users: Collection<User>,
    pub letters: Collection<Letter>,
    pub drafts: Collection<Draft>,
    pub contacts: Collection<Contact>,
    pub notifications: Collection<Notification>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        StorageService {
            users: Collection::new(Arc::clone(&store), keys::USERS),
            letters: Collection::new(Arc::clone(&store), keys::LETTERS),
            drafts: Collection::new(Arc::clone(&store), keys::DRAFTS),
            contacts: Collection::new(Arc::clone(&store), keys::CONTACTS),
            notifications: Collection::new(Arc::clone(&store), keys::NOTIFICATIONS),
            store,
        }
    }

    /// Open a SQLite-backed store, creating parent directories as needed
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!("Opening store at {}", db_path.display());
        Ok(Self::new(Arc::new(LocalStore::new(db_path)?)))
    }

    /// Create a process-local store (for testing)
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Run a multi-collection update atomically; see [`transact`].
    pub fn transact<R>(&self, f: impl FnMut(&mut Transaction<'_>) -> Result<R>) -> Result<R> {
        transact(&self.store, f)
    }

    pub fn find_user(&self, id: UserId) -> Result<Option<User>> {
        self.users.find(id)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.users.find_by(|u| u.username == username)
    }

    /// Stage removal of a user and everything that belongs to them.
    pub(crate) fn stage_purge_user(&self, tx: &mut Transaction<'_>, user_id: UserId) -> Result<()> {
        let mut users = tx.read(&self.users)?;
        users.retain(|u| u.id != user_id);
        tx.write(&self.users, &users)?;

        let mut letters = tx.read(&self.letters)?;
        letters.retain(|l| !l.involves(user_id));
        tx.write(&self.letters, &letters)?;

        let mut drafts = tx.read(&self.drafts)?;
        drafts.retain(|d| d.owner_id != user_id);
        tx.write(&self.drafts, &drafts)?;

        let mut contacts = tx.read(&self.contacts)?;
        contacts.retain(|c| c.owner_id != user_id);
        tx.write(&self.contacts, &contacts)?;

        let mut notifications = tx.read(&self.notifications)?;
        notifications.retain(|n| n.user_id != user_id);
        tx.write(&self.notifications, &notifications)?;

        Ok(())
    }
}
