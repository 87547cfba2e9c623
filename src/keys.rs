//! Storage keys, one per collection plus the session pointer.

pub const USERS: &str = "users";
pub const CURRENT_USER: &str = "currentUser";
pub const LETTERS: &str = "letters";
pub const DRAFTS: &str = "drafts";
pub const CONTACTS: &str = "contacts";
pub const NOTIFICATIONS: &str = "notifications";
