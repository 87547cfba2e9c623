/// Draft service: unfinished letters and promoting them to sent letters.

use crate::error::{AppError, Result};
use crate::models::{Draft, DraftId, Letter, LetterStyle, User};
use crate::services::letter_service::{deliver, ComposeLetter};
use crate::services::StorageService;

#[derive(Clone)]
pub struct DraftService {
    storage: StorageService,
}

impl DraftService {
    pub fn new(storage: StorageService) -> Self {
        DraftService { storage }
    }

    /// Save a draft. Unlike sending, the recipient may be empty or unknown.
    pub fn save_draft(&self, me: &User, compose: ComposeLetter) -> Result<Draft> {
        let style = compose
            .style
            .unwrap_or_else(|| LetterStyle::from(&me.preferences));
        let mut draft = Draft::new(me.id, compose.recipient, compose.content, style);
        draft.signature = compose.signature;
        draft.extras = compose.extras;

        self.storage.drafts.append(draft.clone())?;
        log::info!("{} saved draft {}", me.username, draft.id);
        Ok(draft)
    }

    pub fn update_draft(&self, me: &User, id: DraftId, compose: ComposeLetter) -> Result<Draft> {
        self.storage.drafts.modify(|drafts| {
            let draft = drafts
                .iter_mut()
                .find(|d| d.id == id && d.owner_id == me.id)
                .ok_or_else(|| AppError::NotFound(format!("draft {}", id)))?;

            draft.recipient = compose.recipient.clone();
            draft.content = compose.content.clone();
            if let Some(style) = &compose.style {
                draft.style = style.clone();
            }
            draft.signature = compose.signature.clone();
            draft.extras = compose.extras.clone();
            draft.touch();
            Ok(draft.clone())
        })
    }

    /// Drafts owned by `me`, most recently edited first.
    pub fn list_drafts(&self, me: &User) -> Result<Vec<Draft>> {
        let mut drafts = self.storage.drafts.filter(|d| d.owner_id == me.id)?;
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(drafts)
    }

    pub fn get_draft(&self, me: &User, id: DraftId) -> Result<Draft> {
        self.storage
            .drafts
            .find_by(|d| d.id == id && d.owner_id == me.id)?
            .ok_or_else(|| AppError::NotFound(format!("draft {}", id)))
    }

    pub fn delete_draft(&self, me: &User, id: DraftId) -> Result<()> {
        let removed = self.storage.drafts.modify(|drafts| {
            let before = drafts.len();
            drafts.retain(|d| !(d.id == id && d.owner_id == me.id));
            Ok(drafts.len() != before)
        })?;
        if !removed {
            return Err(AppError::NotFound(format!("draft {}", id)));
        }
        Ok(())
    }

    /// Send a draft. The draft disappears and the letter appears in a single
    /// commit; if the recipient does not resolve, the draft is kept.
    pub fn send_draft(&self, me: &User, id: DraftId) -> Result<Letter> {
        let letter = self.storage.transact(|tx| {
            let mut drafts = tx.read(&self.storage.drafts)?;
            let index = drafts
                .iter()
                .position(|d| d.id == id && d.owner_id == me.id)
                .ok_or_else(|| AppError::NotFound(format!("draft {}", id)))?;
            let draft = drafts.remove(index);

            let compose = ComposeLetter {
                recipient: draft.recipient,
                content: draft.content,
                style: Some(draft.style),
                signature: draft.signature,
                extras: draft.extras,
            };
            let letter = deliver(&self.storage, tx, me, &compose)?;
            tx.write(&self.storage.drafts, &drafts)?;
            Ok(letter)
        })?;

        log::info!("{} sent draft {} as letter {}", me.username, id, letter.id);
        Ok(letter)
    }
}
