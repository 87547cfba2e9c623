/// Chithi - main entry point tying every service to one store.

use crate::config::Config;
use crate::error::Result;
use crate::models::User;
use crate::services::{
    AccountService, AdminCredentials, AdminService, ContactService, DraftService, LetterService,
    NotificationService, SessionService, StorageService,
};

#[derive(Clone)]
pub struct Chithi {
    storage: StorageService,
    session: SessionService,
    accounts: AccountService,
    letters: LetterService,
    drafts: DraftService,
    contacts: ContactService,
    notifications: NotificationService,
    admin: AdminService,
}

impl Chithi {
    /// Open the database under the configured data directory
    pub fn open(config: &Config) -> Result<Self> {
        let db_path = config.db_path()?;
        log::info!("Data directory: {}", config.data_dir()?.display());
        let storage = StorageService::open(&db_path)?;
        Ok(Self::with_storage(storage, AdminCredentials::from(config)))
    }

    /// Process-local instance with default admin credentials
    pub fn in_memory() -> Self {
        Self::with_storage(StorageService::in_memory(), AdminCredentials::from(&Config::default()))
    }

    pub fn with_storage(storage: StorageService, admin: AdminCredentials) -> Self {
        let session = SessionService::new(storage.clone());
        Chithi {
            accounts: AccountService::new(storage.clone(), session.clone(), admin),
            letters: LetterService::new(storage.clone()),
            drafts: DraftService::new(storage.clone()),
            contacts: ContactService::new(storage.clone()),
            notifications: NotificationService::new(storage.clone()),
            admin: AdminService::new(storage.clone()),
            session,
            storage,
        }
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn letters(&self) -> &LetterService {
        &self.letters
    }

    pub fn drafts(&self) -> &DraftService {
        &self.drafts
    }

    pub fn contacts(&self) -> &ContactService {
        &self.contacts
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }

    /// The signed-in user, or `NotSignedIn`.
    pub fn me(&self) -> Result<User> {
        self.session.require_user()
    }
}
