/// Service layer for the letter store.
/// Each service owns one concern and works through the shared typed collections.

pub mod storage;
pub mod session;
pub mod account_service;
pub mod letter_service;
pub mod draft_service;
pub mod contact_service;
pub mod notification_service;
pub mod admin_service;
pub mod chithi;

pub use storage::StorageService;
pub use session::{SessionPointer, SessionService};
pub use account_service::{AccountService, AdminCredentials, NewUser, ProfileUpdate, PublicProfile};
pub use letter_service::{ComposeLetter, LetterService, LetterView};
pub use draft_service::DraftService;
pub use contact_service::{ContactFilter, ContactService, ContactTab, NewContact};
pub use notification_service::NotificationService;
pub use admin_service::{AdminService, AdminStats};
pub use chithi::Chithi;
