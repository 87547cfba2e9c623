//! CLI interface for the letter store
//!
//! Subcommand definitions, dispatch onto [`Chithi`], and the plain-text
//! formatting used for terminal output. [`run`] returns the text to print
//! so every command can be exercised without a terminal.

use crate::error::{AppError, Result};
use crate::models::{
    Contact, ContactGroup, ContactId, DataUrl, Draft, DraftId, Folder, LetterExtras, LetterId,
    LetterStyle, Notification, NotificationId, Preferences, Role, Sender, User, UserId,
};
use crate::services::{
    AdminStats, Chithi, ComposeLetter, ContactFilter, ContactTab, LetterView, NewContact, NewUser,
    ProfileUpdate, PublicProfile,
};
use crate::templates::{self, Template, TEMPLATES};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

const PREVIEW_CHARS: usize = 40;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
        /// Repeat of --password (defaults to it)
        #[arg(long)]
        confirm: Option<String>,
        #[arg(long)]
        mobile: String,
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long, default_value = "")]
        address: String,
        /// Profile picture (png, jpg, gif or webp)
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Sign in by email or username
    Login {
        identifier: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show a user's public profile
    User { username: String },
    /// Edit profile fields of the signed-in user
    Profile(ProfileArgs),
    /// Change the signed-in user's password
    Passwd {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Delete the signed-in account and everything it owns
    DeleteAccount {
        #[arg(long)]
        yes: bool,
    },
    /// Write and send a letter
    Compose(LetterArgs),
    /// Reply to a letter in your inbox
    Reply { id: String, content: String },
    /// Leave a letter on a user's public profile without an account
    Guest {
        to: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        content: String,
    },
    Inbox,
    Sent,
    Starred,
    ArchiveList,
    TrashList,
    /// Search letters by content or correspondent
    Search { query: String },
    /// Open a letter (marks it read)
    Read { id: String },
    /// Mark a letter read without opening it
    MarkRead { id: String },
    /// Toggle the star on a letter
    Star { id: String },
    /// Toggle a letter in or out of the archive
    Archive { id: String },
    /// Move a letter to the trash
    Trash { id: String },
    /// Bring a letter back from the trash
    Restore { id: String },
    /// Permanently delete a trashed letter
    Purge { id: String },
    /// Permanently delete everything in the trash
    EmptyTrash,
    Drafts {
        #[command(subcommand)]
        action: DraftCommand,
    },
    Contacts {
        #[command(subcommand)]
        action: ContactCommand,
    },
    Notifications {
        #[command(subcommand)]
        action: NotificationCommand,
    },
    /// Show preferences, or set NAME to VALUE
    Prefs {
        name: Option<String>,
        value: Option<String>,
    },
    /// List letter templates, or show one
    Templates { id: Option<String> },
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct LetterArgs {
    /// Recipient username
    #[arg(long, default_value = "")]
    pub to: String,
    /// Letter body
    pub content: Option<String>,
    /// Start from a built-in template when no body is given
    #[arg(long)]
    pub template: Option<String>,
    #[arg(long)]
    pub paper: Option<String>,
    #[arg(long)]
    pub ink: Option<String>,
    #[arg(long)]
    pub font: Option<String>,
    #[arg(long)]
    pub seal: Option<String>,
    #[arg(long)]
    pub stamp: Option<String>,
    /// Signature image file
    #[arg(long)]
    pub signature: Option<PathBuf>,
    #[arg(long)]
    pub sticker: Option<String>,
    #[arg(long)]
    pub mood: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub gift: Option<String>,
}

impl LetterArgs {
    fn into_compose(self, me: &User) -> Result<ComposeLetter> {
        let content = match (self.content, &self.template) {
            (Some(content), _) => content,
            (None, Some(id)) => find_template(id)?.content.to_string(),
            (None, None) => String::new(),
        };

        let overrides = [&self.paper, &self.ink, &self.font, &self.seal, &self.stamp];
        let style = if overrides.iter().any(|o| o.is_some()) {
            let mut style = LetterStyle::from(&me.preferences);
            if let Some(v) = self.paper {
                style.paper_style = v;
            }
            if let Some(v) = self.ink {
                style.ink_color = v;
            }
            if let Some(v) = self.font {
                style.font_style = v;
            }
            if let Some(v) = self.seal {
                style.seal_style = v;
            }
            if let Some(v) = self.stamp {
                style.stamp_style = v;
            }
            Some(style)
        } else {
            None
        };

        Ok(ComposeLetter {
            recipient: self.to,
            content,
            style,
            signature: self.signature.as_deref().map(read_image).transpose()?,
            extras: LetterExtras {
                sticker: self.sticker,
                mood: self.mood,
                location: self.location,
                gift: self.gift,
                ..LetterExtras::default()
            },
        })
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub mobile: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub avatar: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// Save a new draft
    Save(LetterArgs),
    /// Replace the contents of a draft
    Edit {
        id: String,
        #[command(flatten)]
        letter: LetterArgs,
    },
    List,
    Show { id: String },
    /// Send a draft and remove it
    Send { id: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ContactCommand {
    Add {
        name: String,
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// family, friends, work or other
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long, conflicts_with = "blocked")]
        favorites: bool,
        #[arg(long)]
        blocked: bool,
    },
    Favorite { id: String },
    Block { id: String },
    Group { id: String, group: String },
    /// Set notes on a contact; omit NOTES to clear them
    Notes { id: String, notes: Option<String> },
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommand {
    List,
    Read { id: String },
    ReadAll,
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    Users {
        #[arg(long)]
        search: Option<String>,
    },
    Delete { id: String },
    ToggleActive { id: String },
    /// user or admin
    SetRole { id: String, role: String },
    Stats,
}

/// Execute one command and return the text to show the user
pub fn run(app: &Chithi, command: Command) -> Result<String> {
    match command {
        Command::Register {
            username,
            email,
            password,
            confirm,
            mobile,
            full_name,
            address,
            avatar,
        } => {
            let form = NewUser {
                username,
                email,
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                password,
                full_name,
                mobile,
                address,
                profile_image: avatar.as_deref().map(read_image).transpose()?,
            };
            let user = app.accounts().register(form)?;
            Ok(format!("Registered and signed in as {}", user.username))
        }
        Command::Login { identifier, password } => {
            let user = app.accounts().login(&identifier, &password)?;
            Ok(format!("Signed in as {} ({})", user.username, user.role))
        }
        Command::Logout => {
            app.accounts().logout()?;
            Ok("Signed out".to_string())
        }
        Command::Whoami => Ok(match app.session().current_user()? {
            Some(user) => format_user(&user),
            None => "Not signed in".to_string(),
        }),
        Command::User { username } => {
            let profile = app.accounts().public_profile(&username)?;
            Ok(format_public_profile(&profile))
        }
        Command::Profile(args) => {
            let me = app.me()?;
            let update = ProfileUpdate {
                username: args.username,
                email: args.email,
                full_name: args.full_name,
                mobile: args.mobile,
                address: args.address,
                bio: args.bio,
                location: args.location,
                website: args.website,
                profile_image: args.avatar.as_deref().map(read_image).transpose()?,
            };
            let user = app.accounts().update_profile(&me, update)?;
            Ok(format_user(&user))
        }
        Command::Passwd { current, new, confirm } => {
            let me = app.me()?;
            app.accounts().change_password(&me, &current, &new, &confirm)?;
            Ok("Password changed".to_string())
        }
        Command::DeleteAccount { yes } => {
            if !yes {
                return Err(AppError::Validation(
                    "Pass --yes to delete your account and all of its letters".to_string(),
                ));
            }
            let me = app.me()?;
            app.accounts().delete_account(&me)?;
            Ok(format!("Deleted account {}", me.username))
        }
        Command::Compose(args) => {
            let me = app.me()?;
            let compose = args.into_compose(&me)?;
            let recipient = compose.recipient.clone();
            let letter = app.letters().send(&me, compose)?;
            Ok(format!("Sent letter {} to {}", letter.id, recipient))
        }
        Command::Reply { id, content } => {
            let me = app.me()?;
            let original = app.letters().open(&me, LetterId::parse(&id)?)?;
            if !original.letter.is_recipient(me.id) {
                return Err(AppError::Validation("You can only reply to letters you received".to_string()));
            }
            let Sender::User { .. } = original.letter.sender else {
                return Err(AppError::Validation(
                    "Letters from guests cannot be replied to".to_string(),
                ));
            };
            let letter = app
                .letters()
                .send(&me, ComposeLetter::new(original.sender_name.clone(), content))?;
            app.letters().mark_replied(&me, original.letter.id)?;
            Ok(format!("Sent reply {} to {}", letter.id, original.sender_name))
        }
        Command::Guest { to, name, email, content } => {
            let letter = app.letters().send_public(&to, &name, &email, &content)?;
            Ok(format!("Left letter {} for {}", letter.id, to))
        }
        Command::Inbox => list_folder(app, Folder::Inbox),
        Command::Sent => list_folder(app, Folder::Sent),
        Command::Starred => list_folder(app, Folder::Starred),
        Command::ArchiveList => list_folder(app, Folder::Archive),
        Command::TrashList => list_folder(app, Folder::Trash),
        Command::Search { query } => {
            let me = app.me()?;
            let views = app.letters().search(&me, &query)?;
            if views.is_empty() {
                return Ok(format!("No letters match '{}'", query));
            }
            Ok(join_rows(views.iter().map(|v| format_letter_row(v, me.id))))
        }
        Command::Read { id } => {
            let me = app.me()?;
            let view = app.letters().open(&me, LetterId::parse(&id)?)?;
            Ok(format_letter(&view))
        }
        Command::MarkRead { id } => {
            let me = app.me()?;
            let letter = app.letters().mark_read(&me, LetterId::parse(&id)?)?;
            Ok(format!("Marked {} as read", letter.id))
        }
        Command::Star { id } => {
            let me = app.me()?;
            let letter = app.letters().toggle_star(&me, LetterId::parse(&id)?)?;
            Ok(format!("{} {}", if letter.is_starred { "Starred" } else { "Unstarred" }, letter.id))
        }
        Command::Archive { id } => {
            let me = app.me()?;
            let letter = app.letters().toggle_archive(&me, LetterId::parse(&id)?)?;
            Ok(format!(
                "{} {}",
                if letter.is_archived { "Archived" } else { "Unarchived" },
                letter.id
            ))
        }
        Command::Trash { id } => {
            let me = app.me()?;
            let letter = app.letters().move_to_trash(&me, LetterId::parse(&id)?)?;
            Ok(format!("Moved {} to trash", letter.id))
        }
        Command::Restore { id } => {
            let me = app.me()?;
            let letter = app.letters().restore(&me, LetterId::parse(&id)?)?;
            Ok(format!("Restored {}", letter.id))
        }
        Command::Purge { id } => {
            let me = app.me()?;
            let id = LetterId::parse(&id)?;
            app.letters().delete_forever(&me, id)?;
            Ok(format!("Deleted {} permanently", id))
        }
        Command::EmptyTrash => {
            let me = app.me()?;
            let removed = app.letters().empty_trash(&me)?;
            Ok(format!("Deleted {} letter(s) from trash", removed))
        }
        Command::Drafts { action } => run_drafts(app, action),
        Command::Contacts { action } => run_contacts(app, action),
        Command::Notifications { action } => run_notifications(app, action),
        Command::Prefs { name, value } => run_prefs(app, name, value),
        Command::Templates { id } => match id {
            Some(id) => Ok(format_template(find_template(&id)?)),
            None => Ok(join_rows(TEMPLATES.iter().map(format_template_row))),
        },
        Command::Admin { action } => run_admin(app, action),
    }
}

fn list_folder(app: &Chithi, folder: Folder) -> Result<String> {
    let me = app.me()?;
    let views = app.letters().list_views(&me, folder)?;
    if views.is_empty() {
        return Ok(format!("No letters in {}", folder));
    }

    let mut rows = Vec::with_capacity(views.len() + 1);
    if folder == Folder::Inbox {
        rows.push(format!("Inbox ({} unread)", app.letters().unread_count(&me)?));
    }
    rows.extend(views.iter().map(|v| format_letter_row(v, me.id)));
    Ok(rows.join("\n"))
}

fn run_drafts(app: &Chithi, action: DraftCommand) -> Result<String> {
    let me = app.me()?;
    let drafts = app.drafts();
    match action {
        DraftCommand::Save(args) => {
            let draft = drafts.save_draft(&me, args.into_compose(&me)?)?;
            Ok(format!("Saved draft {}", draft.id))
        }
        DraftCommand::Edit { id, letter } => {
            let draft = drafts.update_draft(&me, DraftId::parse(&id)?, letter.into_compose(&me)?)?;
            Ok(format!("Updated draft {}", draft.id))
        }
        DraftCommand::List => {
            let list = drafts.list_drafts(&me)?;
            if list.is_empty() {
                return Ok("No drafts".to_string());
            }
            Ok(join_rows(list.iter().map(format_draft_row)))
        }
        DraftCommand::Show { id } => {
            let draft = drafts.get_draft(&me, DraftId::parse(&id)?)?;
            Ok(format!(
                "To: {}\nEdited: {}\n\n{}",
                recipient_label(&draft),
                draft.updated_at.format("%Y-%m-%d %H:%M"),
                draft.content
            ))
        }
        DraftCommand::Send { id } => {
            let letter = drafts.send_draft(&me, DraftId::parse(&id)?)?;
            Ok(format!("Sent letter {}", letter.id))
        }
        DraftCommand::Delete { id } => {
            let id = DraftId::parse(&id)?;
            drafts.delete_draft(&me, id)?;
            Ok(format!("Deleted draft {}", id))
        }
    }
}

fn run_contacts(app: &Chithi, action: ContactCommand) -> Result<String> {
    let me = app.me()?;
    let contacts = app.contacts();
    match action {
        ContactCommand::Add {
            name,
            email,
            phone,
            location,
            group,
            notes,
        } => {
            let new = NewContact {
                name,
                email,
                phone,
                location,
                group: group.as_deref().map(ContactGroup::parse).transpose()?.unwrap_or_default(),
                notes,
                ..NewContact::default()
            };
            let contact = contacts.add_contact(&me, new)?;
            Ok(format!("Added contact {}", format_contact(&contact)))
        }
        ContactCommand::List {
            search,
            group,
            favorites,
            blocked,
        } => {
            let tab = if favorites {
                ContactTab::Favorites
            } else if blocked {
                ContactTab::Blocked
            } else {
                ContactTab::All
            };
            let filter = ContactFilter {
                search,
                group: group.as_deref().map(ContactGroup::parse).transpose()?,
                tab,
            };
            let list = contacts.list_contacts(&me, &filter)?;
            if list.is_empty() {
                return Ok("No contacts".to_string());
            }
            Ok(join_rows(list.iter().map(format_contact)))
        }
        ContactCommand::Favorite { id } => {
            let contact = contacts.toggle_favorite(&me, ContactId::parse(&id)?)?;
            Ok(format_contact(&contact))
        }
        ContactCommand::Block { id } => {
            let contact = contacts.toggle_blocked(&me, ContactId::parse(&id)?)?;
            Ok(format_contact(&contact))
        }
        ContactCommand::Group { id, group } => {
            let contact = contacts.set_group(&me, ContactId::parse(&id)?, ContactGroup::parse(&group)?)?;
            Ok(format_contact(&contact))
        }
        ContactCommand::Notes { id, notes } => {
            let contact = contacts.update_notes(&me, ContactId::parse(&id)?, notes)?;
            Ok(format_contact(&contact))
        }
        ContactCommand::Remove { id } => {
            let id = ContactId::parse(&id)?;
            contacts.remove_contact(&me, id)?;
            Ok(format!("Removed contact {}", id))
        }
    }
}

fn run_notifications(app: &Chithi, action: NotificationCommand) -> Result<String> {
    let me = app.me()?;
    let notifications = app.notifications();
    match action {
        NotificationCommand::List => {
            let list = notifications.list(&me)?;
            if list.is_empty() {
                return Ok("No notifications".to_string());
            }
            let mut rows = vec![format!("{} unread", notifications.unread_count(&me)?)];
            rows.extend(list.iter().map(format_notification));
            Ok(rows.join("\n"))
        }
        NotificationCommand::Read { id } => {
            notifications.mark_read(&me, NotificationId::parse(&id)?)?;
            Ok("Marked as read".to_string())
        }
        NotificationCommand::ReadAll => {
            let changed = notifications.mark_all_read(&me)?;
            Ok(format!("Marked {} notification(s) as read", changed))
        }
        NotificationCommand::Clear => {
            let removed = notifications.clear_all(&me)?;
            Ok(format!("Cleared {} notification(s)", removed))
        }
    }
}

fn run_prefs(app: &Chithi, name: Option<String>, value: Option<String>) -> Result<String> {
    let me = app.me()?;
    match (name, value) {
        (None, _) => format_preferences(&me.preferences),
        (Some(name), None) => {
            let prefs = serde_json::to_value(&me.preferences)?;
            let value = prefs
                .get(&name)
                .ok_or_else(|| AppError::Validation(format!("Unknown preference: {}", name)))?;
            Ok(format!("{} = {}", name, value))
        }
        (Some(name), Some(value)) => {
            app.accounts().set_preference(&me, &name, &value)?;
            Ok(format!("{} = {}", name, value))
        }
    }
}

fn run_admin(app: &Chithi, action: AdminCommand) -> Result<String> {
    let me = app.me()?;
    let admin = app.admin();
    match action {
        AdminCommand::Users { search } => {
            let users = match search {
                Some(term) => admin.search_users(&me, &term)?,
                None => admin.list_users(&me)?,
            };
            if users.is_empty() {
                return Ok("No users".to_string());
            }
            Ok(join_rows(users.iter().map(format_user_row)))
        }
        AdminCommand::Delete { id } => {
            let id = UserId::parse(&id)?;
            admin.delete_user(&me, id)?;
            Ok(format!("Deleted user {}", id))
        }
        AdminCommand::ToggleActive { id } => {
            let user = admin.toggle_active(&me, UserId::parse(&id)?)?;
            Ok(format_user_row(&user))
        }
        AdminCommand::SetRole { id, role } => {
            let role = Role::parse(&role)
                .ok_or_else(|| AppError::Validation(format!("Unknown role: {}", role)))?;
            let user = admin.set_role(&me, UserId::parse(&id)?, role)?;
            Ok(format_user_row(&user))
        }
        AdminCommand::Stats => Ok(format_stats(&admin.stats(&me)?)),
    }
}

fn find_template(id: &str) -> Result<&'static Template> {
    templates::template(id).ok_or_else(|| AppError::NotFound(format!("template '{}'", id)))
}

/// Load an image file as a data URL, guessing the type from its extension
fn read_image(path: &Path) -> Result<DataUrl> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => {
            return Err(AppError::Validation(format!(
                "Unsupported image type: {}",
                path.display()
            )))
        }
    };
    let bytes = std::fs::read(path)?;
    Ok(DataUrl::from_bytes(mime, &bytes))
}

fn join_rows(rows: impl Iterator<Item = String>) -> String {
    rows.collect::<Vec<_>>().join("\n")
}

/// First line of `text`, cut to `max` characters
pub fn preview(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.chars().count() > max {
        let cut: String = first_line.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}

/// One line per letter: id, flags (N = unread, * = starred), date, correspondent, preview
pub fn format_letter_row(view: &LetterView, me: UserId) -> String {
    let letter = &view.letter;
    let (direction, other) = if letter.is_recipient(me) {
        ("from", &view.sender_name)
    } else {
        ("to", &view.recipient_name)
    };
    let unread = if letter.is_recipient(me) && !letter.is_read { 'N' } else { ' ' };
    let starred = if letter.is_starred { '*' } else { ' ' };

    format!(
        "{} {}{} {} {} {} {}",
        letter.id,
        unread,
        starred,
        letter.created_at.format("%Y-%m-%d %H:%M"),
        direction,
        other,
        preview(&letter.content, PREVIEW_CHARS)
    )
}

pub fn format_letter(view: &LetterView) -> String {
    let letter = &view.letter;
    let mut lines = vec![
        format!("From: {}", view.sender_name),
        format!("To: {}", view.recipient_name),
        format!("Date: {}", letter.created_at.format("%Y-%m-%d %H:%M")),
        format!(
            "Paper: {}  Ink: {}  Font: {}",
            letter.style.paper_style, letter.style.ink_color, letter.style.font_style
        ),
    ];

    let extras = &letter.extras;
    let labelled = [
        ("Sticker", &extras.sticker),
        ("Music", &extras.music),
        ("Date written", &extras.date),
        ("Location", &extras.location),
        ("Mood", &extras.mood),
        ("Gift", &extras.gift),
        ("Bookmark", &extras.bookmark),
    ];
    for (label, value) in labelled {
        if let Some(value) = value {
            lines.push(format!("{}: {}", label, value));
        }
    }

    lines.push(String::new());
    lines.push(letter.content.clone());
    if let Some(signature) = &letter.signature {
        lines.push(String::new());
        lines.push(format!("[signature: {}]", signature));
    }
    lines.join("\n")
}

fn recipient_label(draft: &Draft) -> &str {
    if draft.recipient.is_empty() {
        "(no recipient)"
    } else {
        &draft.recipient
    }
}

pub fn format_draft_row(draft: &Draft) -> String {
    format!(
        "{} {} to {} {}",
        draft.id,
        draft.updated_at.format("%Y-%m-%d %H:%M"),
        recipient_label(draft),
        preview(&draft.content, PREVIEW_CHARS)
    )
}

/// Contact line with flags (* = favorite, x = blocked)
pub fn format_contact(contact: &Contact) -> String {
    let favorite = if contact.is_favorite { '*' } else { ' ' };
    let blocked = if contact.is_blocked { 'x' } else { ' ' };
    let mut line = format!(
        "{} {}{} {} <{}> [{}]",
        contact.id, favorite, blocked, contact.name, contact.email, contact.group
    );
    if let Some(phone) = &contact.phone {
        line.push_str(&format!(" {}", phone));
    }
    if let Some(notes) = &contact.notes {
        line.push_str(&format!(" - {}", notes));
    }
    line
}

pub fn format_notification(notification: &Notification) -> String {
    format!(
        "{} {} {} {}: {}",
        notification.id,
        if notification.read { ' ' } else { 'N' },
        notification.created_at.format("%Y-%m-%d %H:%M"),
        notification.title,
        notification.message
    )
}

pub fn format_user(user: &User) -> String {
    let mut lines = vec![
        format!("{} <{}>", user.username, user.email),
        format!("Role: {}", user.role),
    ];
    if !user.full_name.is_empty() {
        lines.push(format!("Name: {}", user.full_name));
    }
    if !user.mobile.is_empty() {
        lines.push(format!("Mobile: {}", user.mobile));
    }
    if let Some(bio) = &user.bio {
        lines.push(format!("Bio: {}", bio));
    }
    if !user.is_active {
        lines.push("Account is deactivated".to_string());
    }
    lines.join("\n")
}

pub fn format_public_profile(profile: &PublicProfile) -> String {
    let mut lines = vec![format!("{} ({})", profile.display_name, profile.username)];
    if let Some(bio) = &profile.bio {
        lines.push(bio.clone());
    }
    lines.push(format!("Email: {}", profile.email));
    if let Some(location) = &profile.location {
        lines.push(format!("Location: {}", location));
    }
    if let Some(website) = &profile.website {
        lines.push(format!("Website: {}", website));
    }
    lines.push(format!("Member since: {}", profile.member_since.format("%Y-%m-%d")));
    lines.push(format!("Letters received: {}", profile.letters_received));
    lines.join("\n")
}

pub fn format_user_row(user: &User) -> String {
    format!(
        "{} {} <{}> {}{}",
        user.id,
        user.username,
        user.email,
        user.role,
        if user.is_active { "" } else { " (inactive)" }
    )
}

pub fn format_stats(stats: &AdminStats) -> String {
    format!(
        "Users: {}\nLetters: {}\nLetters today: {}\nUnread letters: {}",
        stats.total_users, stats.total_letters, stats.letters_today, stats.unread_letters
    )
}

pub fn format_preferences(prefs: &Preferences) -> Result<String> {
    let value = serde_json::to_value(prefs)?;
    let rows = value
        .as_object()
        .map(|map| map.iter().map(|(k, v)| format!("{} = {}", k, v)).collect::<Vec<_>>())
        .unwrap_or_default();
    Ok(rows.join("\n"))
}

pub fn format_template_row(template: &Template) -> String {
    format!("{:<16} {} - {}", template.id, template.title, template.description)
}

pub fn format_template(template: &Template) -> String {
    format!("{}\n\n{}", template.title, template.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Letter;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        let argv = std::iter::once("chithi").chain(args.iter().copied());
        TestCli::try_parse_from(argv).unwrap().command
    }

    fn register(app: &Chithi, username: &str) -> User {
        let command = parse(&[
            "register",
            username,
            &format!("{}@example.com", username),
            "--password",
            "pw",
            "--mobile",
            "01700000000",
        ]);
        run(app, command).unwrap();
        app.me().unwrap()
    }

    #[test]
    fn test_parse_compose_command() {
        let command = parse(&["compose", "--to", "rina", "হ্যালো", "--ink", "blue"]);
        assert!(matches!(
            command,
            Command::Compose(LetterArgs { ref to, content: Some(ref c), ink: Some(_), .. })
                if to == "rina" && c == "হ্যালো"
        ));
    }

    #[test]
    fn test_parse_kebab_case_subcommands() {
        assert!(matches!(parse(&["archive-list"]), Command::ArchiveList));
        assert!(matches!(parse(&["empty-trash"]), Command::EmptyTrash));
        assert!(matches!(
            parse(&["notifications", "read-all"]),
            Command::Notifications { action: NotificationCommand::ReadAll }
        ));
        assert!(matches!(
            parse(&["admin", "toggle-active", "x"]),
            Command::Admin { action: AdminCommand::ToggleActive { .. } }
        ));
    }

    #[test]
    fn test_preview_counts_characters() {
        assert_eq!(preview("হ্যালো বন্ধু", 3), "হ্য...");
        assert_eq!(preview("first\nsecond", 40), "first");
        assert_eq!(preview("", 40), "");
    }

    #[test]
    fn test_format_letter_row() {
        let me = UserId::new();
        let other = UserId::new();
        let mut letter = Letter::new(Sender::User { id: other }, me, "Dear me".to_string(), LetterStyle::default());
        letter.is_starred = true;
        let view = LetterView {
            letter,
            sender_name: "bob".to_string(),
            recipient_name: "alice".to_string(),
        };

        let row = format_letter_row(&view, me);
        assert!(row.contains("N*"));
        assert!(row.contains("from bob"));
        assert!(row.ends_with("Dear me"));
        assert!(format_letter_row(&view, other).contains("to alice"));
    }

    #[test]
    fn test_compose_and_read_flow() {
        let app = Chithi::in_memory();
        register(&app, "bob");
        register(&app, "rina");

        let out = run(&app, parse(&["compose", "--to", "bob", "Dear Bob"])).unwrap();
        assert!(out.starts_with("Sent letter"));

        run(&app, parse(&["login", "bob", "--password", "pw"])).unwrap();
        let inbox = run(&app, parse(&["inbox"])).unwrap();
        assert!(inbox.starts_with("Inbox (1 unread)"));
        assert!(inbox.contains("from rina"));

        let id = app.letters().inbox(&app.me().unwrap()).unwrap()[0].id.to_string();
        let letter = run(&app, parse(&["read", &id])).unwrap();
        assert!(letter.contains("From: rina"));
        assert!(letter.ends_with("Dear Bob"));
        assert!(run(&app, parse(&["inbox"])).unwrap().starts_with("Inbox (0 unread)"));
    }

    #[test]
    fn test_reply_marks_original() {
        let app = Chithi::in_memory();
        register(&app, "bob");
        register(&app, "rina");
        run(&app, parse(&["compose", "--to", "bob", "ping"])).unwrap();

        run(&app, parse(&["login", "bob", "--password", "pw"])).unwrap();
        let bob = app.me().unwrap();
        let id = app.letters().inbox(&bob).unwrap()[0].id;
        let out = run(&app, parse(&["reply", &id.to_string(), "pong"])).unwrap();
        assert!(out.ends_with("to rina"));

        let sent = app.letters().sent(&bob).unwrap();
        assert_eq!(sent.len(), 1);
        assert!(app.storage().letters.find(id).unwrap().unwrap().is_replied);
    }

    #[test]
    fn test_compose_from_template() {
        let app = Chithi::in_memory();
        let rina = register(&app, "rina");
        run(&app, parse(&["compose", "--to", "rina", "--template", "family"])).unwrap();

        let inbox = app.letters().inbox(&rina).unwrap();
        assert!(inbox[0].content.starts_with("প্রিয় পরিবার,"));
    }

    #[test]
    fn test_prefs_get_and_set() {
        let app = Chithi::in_memory();
        register(&app, "rina");

        assert_eq!(run(&app, parse(&["prefs", "inkColor"])).unwrap(), "inkColor = \"black\"");
        run(&app, parse(&["prefs", "inkColor", "blue"])).unwrap();
        assert_eq!(app.me().unwrap().preferences.ink_color, "blue");
        assert!(run(&app, parse(&["prefs", "notifications", "maybe"])).is_err());
        assert!(run(&app, parse(&["prefs"])).unwrap().contains("paperStyle = \"classic\""));
    }

    #[test]
    fn test_prefs_set_keeps_edit_made_after_sign_in() {
        let app = Chithi::in_memory();
        let rina = register(&app, "rina");
        // Another handle changes the theme behind this one's back.
        app.accounts()
            .update_preferences(&rina, |p| p.theme = "dark".to_string())
            .unwrap();

        run(&app, parse(&["prefs", "fontSize", "large"])).unwrap();
        let prefs = app.me().unwrap().preferences;
        assert_eq!(prefs.theme, "dark");
        assert_eq!(prefs.font_size, "large");
        assert!(matches!(
            run(&app, parse(&["prefs", "nonsense", "1"])),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_user_shows_public_profile() {
        let app = Chithi::in_memory();
        register(&app, "bob");
        register(&app, "rina");
        run(&app, parse(&["profile", "--bio", "letters only"])).unwrap();
        run(&app, parse(&["compose", "--to", "bob", "one"])).unwrap();
        run(&app, parse(&["compose", "--to", "bob", "two"])).unwrap();
        run(&app, parse(&["logout"])).unwrap();

        let bob = run(&app, parse(&["user", "bob"])).unwrap();
        assert!(bob.starts_with("bob (bob)"));
        assert!(bob.contains("Email: bob@example.com"));
        assert!(bob.ends_with("Letters received: 2"));

        let rina = run(&app, parse(&["user", "rina"])).unwrap();
        assert!(rina.contains("\nletters only\n"));
        assert!(rina.ends_with("Letters received: 0"));
        assert!(matches!(run(&app, parse(&["user", "nobody"])), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_mark_read_without_opening() {
        let app = Chithi::in_memory();
        let bob = register(&app, "bob");
        register(&app, "rina");
        run(&app, parse(&["compose", "--to", "bob", "ping"])).unwrap();
        let id = app.letters().inbox(&bob).unwrap()[0].id;

        // The sender marking it leaves the recipient's unread state alone.
        run(&app, parse(&["mark-read", &id.to_string()])).unwrap();
        assert_eq!(app.letters().unread_count(&bob).unwrap(), 1);

        run(&app, parse(&["login", "bob", "--password", "pw"])).unwrap();
        let out = run(&app, parse(&["mark-read", &id.to_string()])).unwrap();
        assert_eq!(out, format!("Marked {} as read", id));
        assert_eq!(app.letters().unread_count(&bob).unwrap(), 0);
    }

    #[test]
    fn test_contacts_commands() {
        let app = Chithi::in_memory();
        let rina = register(&app, "rina");
        run(&app, parse(&["contacts", "add", "Nila", "nila@example.com", "--group", "family"])).unwrap();

        let contact = app.contacts().list_contacts(&rina, &ContactFilter::default()).unwrap()[0].clone();
        run(&app, parse(&["contacts", "favorite", &contact.id.to_string()])).unwrap();

        let favorites = run(&app, parse(&["contacts", "list", "--favorites"])).unwrap();
        assert!(favorites.contains("Nila <nila@example.com> [family]"));
        assert_eq!(run(&app, parse(&["contacts", "list", "--blocked"])).unwrap(), "No contacts");
        assert!(run(&app, parse(&["contacts", "add", "X", "x@example.com", "--group", "enemies"])).is_err());
    }

    #[test]
    fn test_signed_out_commands_fail() {
        let app = Chithi::in_memory();
        assert!(matches!(run(&app, parse(&["inbox"])), Err(AppError::NotSignedIn)));
        assert_eq!(run(&app, parse(&["whoami"])).unwrap(), "Not signed in");
    }

    #[test]
    fn test_delete_account_requires_yes() {
        let app = Chithi::in_memory();
        register(&app, "rina");
        assert!(matches!(run(&app, parse(&["delete-account"])), Err(AppError::Validation(_))));
        run(&app, parse(&["delete-account", "--yes"])).unwrap();
        assert!(app.session().current_user().unwrap().is_none());
    }

    #[test]
    fn test_templates_listing() {
        let app = Chithi::in_memory();
        let out = run(&app, parse(&["templates"])).unwrap();
        assert_eq!(out.lines().count(), TEMPLATES.len());
        assert!(matches!(run(&app, parse(&["templates", "love"])), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_format_stats() {
        let stats = AdminStats {
            total_users: 2,
            total_letters: 5,
            letters_today: 1,
            unread_letters: 3,
        };
        assert_eq!(
            format_stats(&stats),
            "Users: 2\nLetters: 5\nLetters today: 1\nUnread letters: 3"
        );
    }
}
