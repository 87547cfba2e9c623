/// Contact service: each user's private address book.

use crate::error::{AppError, Result};
use crate::models::{Contact, ContactGroup, ContactId, ContactStatus, User};
use crate::services::StorageService;

#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub status: ContactStatus,
    pub group: ContactGroup,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactTab {
    #[default]
    All,
    Favorites,
    Blocked,
}

#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub search: Option<String>,
    pub group: Option<ContactGroup>,
    pub tab: ContactTab,
}

impl ContactFilter {
    fn accepts(&self, contact: &Contact) -> bool {
        let matches_search = self.search.as_deref().map_or(true, |term| contact.matches(term));
        let matches_group = self.group.map_or(true, |g| contact.group == g);
        let matches_tab = match self.tab {
            ContactTab::All => true,
            ContactTab::Favorites => contact.is_favorite,
            ContactTab::Blocked => contact.is_blocked,
        };
        matches_search && matches_group && matches_tab
    }
}

#[derive(Clone)]
pub struct ContactService {
    storage: StorageService,
}

impl ContactService {
    pub fn new(storage: StorageService) -> Self {
        ContactService { storage }
    }

    pub fn add_contact(&self, me: &User, new: NewContact) -> Result<Contact> {
        if new.name.trim().is_empty() || new.email.trim().is_empty() {
            return Err(AppError::Validation("Name and email are required".to_string()));
        }

        let mut contact = Contact::new(me.id, new.name.trim().to_string(), new.email.trim().to_string());
        contact.phone = new.phone;
        contact.location = new.location;
        contact.status = new.status;
        contact.group = new.group;
        contact.notes = new.notes;

        self.storage.contacts.append(contact.clone())?;
        log::info!("{} added contact {}", me.username, contact.name);
        Ok(contact)
    }

    /// Contacts owned by `me` that pass `filter`, sorted by name.
    pub fn list_contacts(&self, me: &User, filter: &ContactFilter) -> Result<Vec<Contact>> {
        let mut contacts = self
            .storage
            .contacts
            .filter(|c| c.owner_id == me.id && filter.accepts(c))?;
        contacts.sort_by_key(|c| c.name.to_lowercase());
        Ok(contacts)
    }

    pub fn toggle_favorite(&self, me: &User, id: ContactId) -> Result<Contact> {
        self.update_contact(me, id, |c| c.is_favorite = !c.is_favorite)
    }

    pub fn toggle_blocked(&self, me: &User, id: ContactId) -> Result<Contact> {
        self.update_contact(me, id, |c| c.is_blocked = !c.is_blocked)
    }

    pub fn set_group(&self, me: &User, id: ContactId, group: ContactGroup) -> Result<Contact> {
        self.update_contact(me, id, |c| c.group = group)
    }

    pub fn update_notes(&self, me: &User, id: ContactId, notes: Option<String>) -> Result<Contact> {
        self.update_contact(me, id, |c| c.notes = notes.clone())
    }

    pub fn remove_contact(&self, me: &User, id: ContactId) -> Result<()> {
        let removed = self
            .storage
            .contacts
            .retain(|c| !(c.id == id && c.owner_id == me.id))?;
        if removed == 0 {
            return Err(AppError::NotFound(format!("contact {}", id)));
        }
        Ok(())
    }

    fn update_contact(&self, me: &User, id: ContactId, mut f: impl FnMut(&mut Contact)) -> Result<Contact> {
        self.storage.contacts.modify(|contacts| {
            let contact = contacts
                .iter_mut()
                .find(|c| c.id == id && c.owner_id == me.id)
                .ok_or_else(|| AppError::NotFound(format!("contact {}", id)))?;
            f(contact);
            Ok(contact.clone())
        })
    }
}
