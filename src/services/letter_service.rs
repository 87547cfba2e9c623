/// Letter service: sending letters and managing them through mailbox views.
///
/// Every letter lives once in the letters collection. Starring, archiving and
/// trashing flip fields on that record; folders are filtered projections.

use crate::collection::Transaction;
use crate::error::{AppError, Result};
use crate::models::{
    DataUrl, Folder, Letter, LetterExtras, LetterId, LetterStyle, Notification, NotificationKind,
    Sender, User, UserId,
};
use crate::services::StorageService;
use chrono::Utc;
use std::collections::HashMap;

/// A letter as composed, before it is addressed to a stored user.
#[derive(Debug, Clone, Default)]
pub struct ComposeLetter {
    /// Recipient username.
    pub recipient: String,
    pub content: String,
    /// Stationery; `None` uses the sender's preferences.
    pub style: Option<LetterStyle>,
    pub signature: Option<DataUrl>,
    pub extras: LetterExtras,
}

impl ComposeLetter {
    pub fn new(recipient: impl Into<String>, content: impl Into<String>) -> Self {
        ComposeLetter {
            recipient: recipient.into(),
            content: content.into(),
            ..ComposeLetter::default()
        }
    }

    pub fn with_style(mut self, style: LetterStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_signature(mut self, signature: DataUrl) -> Self {
        self.signature = Some(signature);
        self
    }
}

/// A letter with both endpoints resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterView {
    pub letter: Letter,
    pub sender_name: String,
    pub recipient_name: String,
}

#[derive(Clone)]
pub struct LetterService {
    storage: StorageService,
}

impl LetterService {
    pub fn new(storage: StorageService) -> Self {
        LetterService { storage }
    }

    /// Send a letter to another registered user (or to oneself).
    ///
    /// Fails with `RecipientNotFound` and writes nothing when the recipient
    /// username does not resolve.
    pub fn send(&self, me: &User, compose: ComposeLetter) -> Result<Letter> {
        validate_content(&compose.content)?;
        let letter = self.storage.transact(|tx| deliver(&self.storage, tx, me, &compose))?;
        log::info!("{} sent letter {} to {}", me.username, letter.id, compose.recipient);
        Ok(letter)
    }

    /// A letter left on someone's public profile by a visitor without an account.
    pub fn send_public(
        &self,
        recipient_username: &str,
        guest_name: &str,
        guest_email: &str,
        content: &str,
    ) -> Result<Letter> {
        validate_content(content)?;
        if guest_name.trim().is_empty() {
            return Err(AppError::Validation("Sender name is required".to_string()));
        }

        let letter = self.storage.transact(|tx| {
            let users = tx.read(&self.storage.users)?;
            let recipient = users
                .iter()
                .find(|u| u.username == recipient_username)
                .ok_or_else(|| AppError::RecipientNotFound(recipient_username.to_string()))?;

            let sender = Sender::Guest {
                name: guest_name.trim().to_string(),
                email: guest_email.trim().to_string(),
            };
            let letter = Letter::new(sender, recipient.id, content.to_string(), LetterStyle::default());

            let mut letters = tx.read(&self.storage.letters)?;
            letters.push(letter.clone());
            tx.write(&self.storage.letters, &letters)?;
            stage_new_letter_notice(&self.storage, tx, recipient, guest_name.trim())?;
            Ok(letter)
        })?;

        log::info!("Public letter {} left for {}", letter.id, recipient_username);
        Ok(letter)
    }

    /// Letters in `folder` for `me`, newest first.
    pub fn list(&self, me: &User, folder: Folder) -> Result<Vec<Letter>> {
        let mut letters = self.storage.letters.filter(|l| folder.contains(l, me.id))?;
        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        log::debug!("{} letter(s) in {} for {}", letters.len(), folder, me.username);
        Ok(letters)
    }

    /// Same as [`list`](Self::list) with sender and recipient names resolved.
    pub fn list_views(&self, me: &User, folder: Folder) -> Result<Vec<LetterView>> {
        let names = self.usernames()?;
        Ok(self
            .list(me, folder)?
            .into_iter()
            .map(|letter| view(letter, &names))
            .collect())
    }

    pub fn inbox(&self, me: &User) -> Result<Vec<Letter>> {
        self.list(me, Folder::Inbox)
    }

    pub fn sent(&self, me: &User) -> Result<Vec<Letter>> {
        self.list(me, Folder::Sent)
    }

    pub fn starred(&self, me: &User) -> Result<Vec<Letter>> {
        self.list(me, Folder::Starred)
    }

    pub fn archived(&self, me: &User) -> Result<Vec<Letter>> {
        self.list(me, Folder::Archive)
    }

    pub fn trash(&self, me: &User) -> Result<Vec<Letter>> {
        self.list(me, Folder::Trash)
    }

    pub fn unread_count(&self, me: &User) -> Result<usize> {
        Ok(self
            .storage
            .letters
            .filter(|l| Folder::Inbox.contains(l, me.id) && !l.is_read)?
            .len())
    }

    /// Case-insensitive search over content and the other party's name,
    /// excluding trashed letters.
    pub fn search(&self, me: &User, query: &str) -> Result<Vec<LetterView>> {
        let query_lower = query.to_lowercase();
        let names = self.usernames()?;

        let mut results: Vec<LetterView> = self
            .storage
            .letters
            .filter(|l| l.involves(me.id) && !l.is_trashed())?
            .into_iter()
            .map(|letter| view(letter, &names))
            .filter(|v| {
                let other = if v.letter.is_sender(me.id) {
                    &v.recipient_name
                } else {
                    &v.sender_name
                };
                v.letter.content.to_lowercase().contains(&query_lower)
                    || other.to_lowercase().contains(&query_lower)
            })
            .collect();

        results.sort_by(|a, b| b.letter.created_at.cmp(&a.letter.created_at));
        Ok(results)
    }

    /// Open a letter for reading. Opening it as the recipient marks it read.
    pub fn open(&self, me: &User, id: LetterId) -> Result<LetterView> {
        let letter = self.update_letter(me, id, |letter| {
            if letter.is_recipient(me.id) {
                letter.is_read = true;
            }
            Ok(())
        })?;
        Ok(view(letter, &self.usernames()?))
    }

    /// Mark a letter read without opening it. Only the recipient's view changes.
    pub fn mark_read(&self, me: &User, id: LetterId) -> Result<Letter> {
        self.update_letter(me, id, |l| {
            if l.is_recipient(me.id) {
                l.is_read = true;
            }
            Ok(())
        })
    }

    pub fn toggle_read(&self, me: &User, id: LetterId) -> Result<Letter> {
        self.update_letter(me, id, |l| {
            l.is_read = !l.is_read;
            Ok(())
        })
    }

    pub fn toggle_star(&self, me: &User, id: LetterId) -> Result<Letter> {
        self.update_letter(me, id, |l| {
            l.is_starred = !l.is_starred;
            Ok(())
        })
    }

    pub fn toggle_archive(&self, me: &User, id: LetterId) -> Result<Letter> {
        self.update_letter(me, id, |l| {
            l.is_archived = !l.is_archived;
            Ok(())
        })
    }

    pub fn mark_replied(&self, me: &User, id: LetterId) -> Result<Letter> {
        self.update_letter(me, id, |l| {
            l.is_replied = true;
            Ok(())
        })
    }

    pub fn move_to_trash(&self, me: &User, id: LetterId) -> Result<Letter> {
        self.update_letter(me, id, |l| {
            if l.trashed_at.is_none() {
                l.trashed_at = Some(Utc::now());
            }
            Ok(())
        })
    }

    pub fn restore(&self, me: &User, id: LetterId) -> Result<Letter> {
        self.update_letter(me, id, |l| {
            l.trashed_at = None;
            Ok(())
        })
    }

    /// Permanently delete a letter that is already in the trash.
    pub fn delete_forever(&self, me: &User, id: LetterId) -> Result<()> {
        self.storage.letters.modify(|letters| {
            let index = letters
                .iter()
                .position(|l| l.id == id)
                .ok_or_else(|| AppError::NotFound(format!("letter {}", id)))?;
            let letter = &letters[index];
            if !letter.involves(me.id) {
                return Err(AppError::Forbidden(format!("letter {}", id)));
            }
            if !letter.is_trashed() {
                return Err(AppError::Validation(
                    "Only letters in the trash can be deleted permanently".to_string(),
                ));
            }
            letters.remove(index);
            Ok(())
        })?;
        log::info!("{} deleted letter {}", me.username, id);
        Ok(())
    }

    /// Permanently delete every trashed letter involving `me`.
    pub fn empty_trash(&self, me: &User) -> Result<usize> {
        let removed = self
            .storage
            .letters
            .retain(|l| !(l.involves(me.id) && l.is_trashed()))?;
        log::info!("{} emptied trash ({} letter(s))", me.username, removed);
        Ok(removed)
    }

    fn update_letter(
        &self,
        me: &User,
        id: LetterId,
        mut f: impl FnMut(&mut Letter) -> Result<()>,
    ) -> Result<Letter> {
        self.storage.letters.modify(|letters| {
            let letter = letters
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or_else(|| AppError::NotFound(format!("letter {}", id)))?;
            if !letter.involves(me.id) {
                return Err(AppError::Forbidden(format!("letter {}", id)));
            }
            f(letter)?;
            Ok(letter.clone())
        })
    }

    fn usernames(&self) -> Result<HashMap<UserId, String>> {
        Ok(self
            .storage
            .users
            .load()?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect())
    }
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Letter content cannot be empty".to_string()));
    }
    Ok(())
}

fn view(letter: Letter, names: &HashMap<UserId, String>) -> LetterView {
    let name_of = |id: UserId| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| "(deleted user)".to_string())
    };
    let sender_name = match &letter.sender {
        Sender::User { id } => name_of(*id),
        Sender::Guest { name, .. } => name.clone(),
    };
    let recipient_name = name_of(letter.recipient_id);
    LetterView {
        letter,
        sender_name,
        recipient_name,
    }
}

/// Stage a new letter from `me` plus the recipient's notification.
pub(crate) fn deliver(
    storage: &StorageService,
    tx: &mut Transaction<'_>,
    me: &User,
    compose: &ComposeLetter,
) -> Result<Letter> {
    validate_content(&compose.content)?;

    let users = tx.read(&storage.users)?;
    let recipient = users
        .iter()
        .find(|u| u.username == compose.recipient.trim())
        .ok_or_else(|| AppError::RecipientNotFound(compose.recipient.clone()))?;

    let style = compose
        .style
        .clone()
        .unwrap_or_else(|| LetterStyle::from(&me.preferences));
    let mut letter = Letter::new(
        Sender::User { id: me.id },
        recipient.id,
        compose.content.clone(),
        style,
    );
    letter.signature = compose.signature.clone();
    letter.extras = compose.extras.clone();

    let mut letters = tx.read(&storage.letters)?;
    letters.push(letter.clone());
    tx.write(&storage.letters, &letters)?;

    stage_new_letter_notice(storage, tx, recipient, &me.username)?;
    Ok(letter)
}

fn stage_new_letter_notice(
    storage: &StorageService,
    tx: &mut Transaction<'_>,
    recipient: &User,
    from: &str,
) -> Result<()> {
    if !recipient.preferences.notifications {
        return Ok(());
    }
    let mut notifications = tx.read(&storage.notifications)?;
    notifications.push(Notification::new(
        recipient.id,
        NotificationKind::Message,
        "New letter".to_string(),
        format!("You have a new letter from {}", from),
    ));
    tx.write(&storage.notifications, &notifications)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (LetterService, StorageService, User, User) {
        let storage = StorageService::in_memory();
        let alice = User::new("alice".to_string(), "a@example.com".to_string(), "pw".to_string());
        let bob = User::new("bob".to_string(), "b@example.com".to_string(), "pw".to_string());
        storage.users.save(&[alice.clone(), bob.clone()]).unwrap();
        (LetterService::new(storage.clone()), storage, alice, bob)
    }

    #[test]
    fn test_send_lands_in_recipient_inbox() -> Result<()> {
        let (letters, storage, alice, bob) = setup();
        let sent = letters.send(&alice, ComposeLetter::new("bob", "Dear Bob"))?;

        let inbox = letters.inbox(&bob)?;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, sent.id);
        assert_eq!(letters.sent(&alice)?.len(), 1);
        assert!(letters.inbox(&alice)?.is_empty());

        let notes = storage.notifications.load()?;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id, bob.id);
        Ok(())
    }

    #[test]
    fn test_send_uses_sender_preferences() -> Result<()> {
        let (letters, _, mut alice, _) = setup();
        alice.preferences.ink_color = "sepia".to_string();
        let sent = letters.send(&alice, ComposeLetter::new("bob", "hi"))?;
        assert_eq!(sent.style.ink_color, "sepia");
        Ok(())
    }

    #[test]
    fn test_unknown_recipient_writes_nothing() {
        let (letters, storage, alice, _) = setup();
        let result = letters.send(&alice, ComposeLetter::new("ghost", "hello?"));

        assert!(matches!(result, Err(AppError::RecipientNotFound(name)) if name == "ghost"));
        assert!(storage.letters.load().unwrap().is_empty());
        assert!(storage.notifications.load().unwrap().is_empty());
    }

    #[test]
    fn test_empty_content_rejected() {
        let (letters, _, alice, _) = setup();
        assert!(matches!(
            letters.send(&alice, ComposeLetter::new("bob", "   ")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_muted_recipient_gets_no_notification() -> Result<()> {
        let (letters, storage, alice, bob) = setup();
        storage.users.update(bob.id, |u| u.preferences.notifications = false)?;
        letters.send(&alice, ComposeLetter::new("bob", "quiet"))?;
        assert!(storage.notifications.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_double_toggles_restore_flags() -> Result<()> {
        let (letters, _, alice, bob) = setup();
        let sent = letters.send(&alice, ComposeLetter::new("bob", "x"))?;

        letters.toggle_star(&bob, sent.id)?;
        letters.toggle_archive(&bob, sent.id)?;
        letters.toggle_read(&bob, sent.id)?;
        letters.toggle_star(&bob, sent.id)?;
        letters.toggle_archive(&bob, sent.id)?;
        let back = letters.toggle_read(&bob, sent.id)?;

        assert_eq!(
            (back.is_starred, back.is_archived, back.is_read),
            (sent.is_starred, sent.is_archived, sent.is_read)
        );
        Ok(())
    }

    #[test]
    fn test_archive_and_star_views() -> Result<()> {
        let (letters, _, alice, bob) = setup();
        let sent = letters.send(&alice, ComposeLetter::new("bob", "x"))?;

        letters.toggle_archive(&bob, sent.id)?;
        letters.toggle_star(&bob, sent.id)?;
        assert!(letters.inbox(&bob)?.is_empty());
        assert_eq!(letters.archived(&bob)?.len(), 1);
        assert_eq!(letters.starred(&bob)?.len(), 1);
        // One record, one state: the sender sees the same star.
        assert_eq!(letters.starred(&alice)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_trash_restore_and_delete() -> Result<()> {
        let (letters, storage, alice, bob) = setup();
        let sent = letters.send(&alice, ComposeLetter::new("bob", "x"))?;

        assert!(matches!(
            letters.delete_forever(&bob, sent.id),
            Err(AppError::Validation(_))
        ));

        letters.move_to_trash(&bob, sent.id)?;
        assert!(letters.inbox(&bob)?.is_empty());
        assert_eq!(letters.trash(&bob)?.len(), 1);

        letters.restore(&bob, sent.id)?;
        assert_eq!(letters.inbox(&bob)?.len(), 1);

        letters.move_to_trash(&bob, sent.id)?;
        letters.delete_forever(&bob, sent.id)?;
        assert!(storage.letters.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_trash_only_touches_own_letters() -> Result<()> {
        let (letters, storage, alice, bob) = setup();
        let carol = User::new("carol".to_string(), "c@example.com".to_string(), "pw".to_string());
        storage.users.append(carol.clone())?;

        let a = letters.send(&alice, ComposeLetter::new("bob", "one"))?;
        let c = letters.send(&carol, ComposeLetter::new("carol", "two"))?;
        letters.move_to_trash(&bob, a.id)?;
        letters.move_to_trash(&carol, c.id)?;

        assert_eq!(letters.empty_trash(&bob)?, 1);
        assert_eq!(letters.trash(&carol)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_outsider_is_forbidden() -> Result<()> {
        let (letters, storage, alice, bob) = setup();
        let eve = User::new("eve".to_string(), "e@example.com".to_string(), "pw".to_string());
        storage.users.append(eve.clone())?;
        let sent = letters.send(&alice, ComposeLetter::new("bob", "private"))?;

        assert!(matches!(letters.toggle_star(&eve, sent.id), Err(AppError::Forbidden(_))));
        assert!(matches!(letters.open(&eve, LetterId::new()), Err(AppError::NotFound(_))));
        assert!(!letters.inbox(&bob)?[0].is_starred);
        Ok(())
    }

    #[test]
    fn test_open_marks_read_for_recipient_only() -> Result<()> {
        let (letters, _, alice, bob) = setup();
        let sent = letters.send(&alice, ComposeLetter::new("bob", "x"))?;

        let as_sender = letters.open(&alice, sent.id)?;
        assert!(!as_sender.letter.is_read);
        assert_eq!(as_sender.sender_name, "alice");
        assert_eq!(as_sender.recipient_name, "bob");

        assert_eq!(letters.unread_count(&bob)?, 1);
        let as_recipient = letters.open(&bob, sent.id)?;
        assert!(as_recipient.letter.is_read);
        assert_eq!(letters.unread_count(&bob)?, 0);
        Ok(())
    }

    #[test]
    fn test_public_letter_from_guest() -> Result<()> {
        let (letters, _, _, bob) = setup();
        let letter = letters.send_public("bob", "A fan", "fan@example.com", "Loved your letters")?;

        assert!(letter.is_public);
        let view = letters.open(&bob, letter.id)?;
        assert_eq!(view.sender_name, "A fan");
        assert!(matches!(
            letters.send_public("nobody", "A fan", "", "hi"),
            Err(AppError::RecipientNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_search_by_content_and_name() -> Result<()> {
        let (letters, _, alice, bob) = setup();
        letters.send(&alice, ComposeLetter::new("bob", "Meet at the Library"))?;
        letters.send(&bob, ComposeLetter::new("alice", "ok"))?;

        assert_eq!(letters.search(&alice, "library")?.len(), 1);
        assert_eq!(letters.search(&alice, "BOB")?.len(), 2);
        assert!(letters.search(&alice, "zebra")?.is_empty());
        Ok(())
    }
}
