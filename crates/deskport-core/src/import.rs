//! Snapshot import
//!
//! Replays a snapshot into a target deployment in dependency order:
//! account, users, contacts, inboxes, labels, teams, conversations with
//! their messages, then the account-level extras. Every record resolves
//! find-or-create against its natural key and lands in the remap table,
//! so re-importing the same document creates nothing new.
//!
//! The whole run executes inside one transaction. Record-level failures
//! are accumulated into the report and do not abort the run; fatal
//! errors roll everything back.

use crate::progress::{MigrationEvent, ProgressReporter};
use crate::remap::IdMap;
use crate::report::{Counter, ImportReport};
use crate::snapshot::{
    AutomationRuleDoc, CannedResponseDoc, Channel, ContactDoc, ConversationDoc, CustomFilterDoc,
    InboxDoc, LabelDoc, MessageDoc, SenderRef, Snapshot, TeamDoc, UserDoc, WebhookDoc,
};
use chrono::Utc;
use deskport_common::types::{
    AccountId, AgentRole, Availability, ContactId, ConversationPriority, ConversationStatus,
    MessageType,
};
use deskport_common::{Error, Result};
use deskport_storage::models::{
    Account, CreateAccount, CreateAccountUser, CreateAttachment, CreateAutomationRule,
    CreateCannedResponse, CreateContact, CreateConversation, CreateCustomFilter, CreateInbox,
    CreateLabel, CreateMessage, CreateTeam, CreateUser, CreateWebhook,
};
use deskport_storage::AccountStore;
use tracing::{error, info};
use uuid::Uuid;

const DEFAULT_LABEL_COLOR: &str = "#1f93ff";
const DEFAULT_WIDGET_COLOR: &str = "#1f93ff";

/// How a snapshot resolves onto a target account
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Import into this existing account instead of resolving the
    /// document's account name. Fails when no such account exists.
    pub target_account_name: Option<String>,
    /// Run every phase, then roll the transaction back
    pub dry_run: bool,
}

/// Import a snapshot inside a single transaction.
///
/// On success the transaction commits (or rolls back for a dry run) and
/// the report describes what happened. On a fatal error the transaction
/// rolls back and no partial data remains.
pub async fn import_snapshot<S: AccountStore>(
    store: &mut S,
    snapshot: &Snapshot,
    options: &ImportOptions,
    progress: &dyn ProgressReporter,
) -> Result<ImportReport> {
    store.begin().await?;

    match run_phases(store, snapshot, options, progress).await {
        Ok(mut report) => {
            if options.dry_run {
                store.rollback().await?;
                report.dry_run = true;
                info!("Dry run finished, transaction rolled back");
            } else {
                store.commit().await?;
                info!("Import committed");
            }
            Ok(report)
        }
        Err(e) => {
            if let Err(rollback_err) = store.rollback().await {
                error!("Rollback after failed import also failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Per-record outcome inside a phase
enum Outcome {
    Created,
    Reused,
    Skipped(String),
}

/// Tally fed back into the report for a record that went through
enum Tally {
    Created,
    Reused,
}

fn bump(counter: &mut Counter, tally: Tally) {
    match tally {
        Tally::Created => counter.created += 1,
        Tally::Reused => counter.reused += 1,
    }
}

/// Fold one record result into the report. Fatal errors propagate;
/// everything else is recorded and the phase moves on.
fn absorb(
    result: Result<Outcome>,
    phase: &'static str,
    key: &str,
    report: &mut ImportReport,
    progress: &dyn ProgressReporter,
) -> Result<Option<Tally>> {
    match result {
        Ok(Outcome::Created) => Ok(Some(Tally::Created)),
        Ok(Outcome::Reused) => Ok(Some(Tally::Reused)),
        Ok(Outcome::Skipped(reason)) => {
            progress.report(MigrationEvent::RecordSkipped {
                phase,
                key: key.to_string(),
                reason: reason.clone(),
            });
            report.skip(phase, key, reason);
            Ok(None)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            progress.report(MigrationEvent::RecordFailed {
                phase,
                key: key.to_string(),
                message: e.to_string(),
            });
            report.record_error(phase, key, e.to_string());
            Ok(None)
        }
    }
}

async fn run_phases<S: AccountStore>(
    store: &mut S,
    snapshot: &Snapshot,
    options: &ImportOptions,
    progress: &dyn ProgressReporter,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let mut idmap = IdMap::new();

    progress.report(MigrationEvent::PhaseStarted { phase: "account" });
    let (account, account_created) = resolve_account(store, snapshot, options).await?;
    report.account_created = account_created;
    progress.report(MigrationEvent::PhaseFinished {
        phase: "account",
        created: account_created as usize,
        reused: !account_created as usize,
    });
    info!(
        account = %account.name,
        created = account_created,
        "Importing into account"
    );

    progress.report(MigrationEvent::PhaseStarted { phase: "users" });
    for doc in &snapshot.users {
        let result = import_user(store, account.id, doc, &mut idmap).await;
        if let Some(tally) = absorb(result, "users", &doc.email, &mut report, progress)? {
            bump(&mut report.users, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "users",
        created: report.users.created,
        reused: report.users.reused,
    });

    progress.report(MigrationEvent::PhaseStarted { phase: "contacts" });
    for doc in &snapshot.contacts {
        let key = contact_key(doc);
        let result = import_contact(store, account.id, doc, &mut idmap).await;
        if let Some(tally) = absorb(result, "contacts", &key, &mut report, progress)? {
            bump(&mut report.contacts, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "contacts",
        created: report.contacts.created,
        reused: report.contacts.reused,
    });

    progress.report(MigrationEvent::PhaseStarted { phase: "inboxes" });
    for doc in &snapshot.inboxes {
        let result = import_inbox(store, account.id, doc, &mut idmap).await;
        if let Some(tally) = absorb(result, "inboxes", &doc.name, &mut report, progress)? {
            bump(&mut report.inboxes, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "inboxes",
        created: report.inboxes.created,
        reused: report.inboxes.reused,
    });

    progress.report(MigrationEvent::PhaseStarted { phase: "labels" });
    for doc in &snapshot.labels {
        let result = import_label(store, account.id, doc, &mut idmap).await;
        if let Some(tally) = absorb(result, "labels", &doc.title, &mut report, progress)? {
            bump(&mut report.labels, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "labels",
        created: report.labels.created,
        reused: report.labels.reused,
    });

    progress.report(MigrationEvent::PhaseStarted { phase: "teams" });
    for doc in &snapshot.teams {
        let result = import_team(store, account.id, doc, &mut idmap).await;
        if let Some(tally) = absorb(result, "teams", &doc.name, &mut report, progress)? {
            bump(&mut report.teams, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "teams",
        created: report.teams.created,
        reused: report.teams.reused,
    });

    progress.report(MigrationEvent::PhaseStarted {
        phase: "conversations",
    });
    for doc in &snapshot.conversations {
        let key = conversation_key(doc);
        let result = import_conversation(
            store,
            account.id,
            doc,
            &snapshot.users,
            &mut idmap,
            &mut report,
            progress,
        )
        .await;
        if let Some(tally) = absorb(result, "conversations", &key, &mut report, progress)? {
            bump(&mut report.conversations, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "conversations",
        created: report.conversations.created,
        reused: report.conversations.reused,
    });

    progress.report(MigrationEvent::PhaseStarted {
        phase: "canned_responses",
    });
    for doc in &snapshot.canned_responses {
        let result = import_canned_response(store, account.id, doc).await;
        if let Some(tally) =
            absorb(result, "canned_responses", &doc.short_code, &mut report, progress)?
        {
            bump(&mut report.canned_responses, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "canned_responses",
        created: report.canned_responses.created,
        reused: report.canned_responses.reused,
    });

    progress.report(MigrationEvent::PhaseStarted {
        phase: "custom_filters",
    });
    for doc in &snapshot.custom_filters {
        let result = import_custom_filter(store, account.id, doc, &idmap).await;
        if let Some(tally) =
            absorb(result, "custom_filters", &doc.name, &mut report, progress)?
        {
            bump(&mut report.custom_filters, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "custom_filters",
        created: report.custom_filters.created,
        reused: report.custom_filters.reused,
    });

    progress.report(MigrationEvent::PhaseStarted { phase: "webhooks" });
    for doc in &snapshot.webhooks {
        let result = import_webhook(store, account.id, doc, &idmap).await;
        if let Some(tally) = absorb(result, "webhooks", &doc.url, &mut report, progress)? {
            bump(&mut report.webhooks, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "webhooks",
        created: report.webhooks.created,
        reused: report.webhooks.reused,
    });

    progress.report(MigrationEvent::PhaseStarted {
        phase: "automation_rules",
    });
    for doc in &snapshot.automation_rules {
        let result = import_automation_rule(store, account.id, doc).await;
        if let Some(tally) =
            absorb(result, "automation_rules", &doc.name, &mut report, progress)?
        {
            bump(&mut report.automation_rules, tally);
        }
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "automation_rules",
        created: report.automation_rules.created,
        reused: report.automation_rules.reused,
    });

    Ok(report)
}

/// Resolve the target account per the options: an explicit target must
/// already exist, otherwise the document's account is found or created.
async fn resolve_account<S: AccountStore>(
    store: &mut S,
    snapshot: &Snapshot,
    options: &ImportOptions,
) -> Result<(Account, bool)> {
    if let Some(name) = &options.target_account_name {
        return match store.account_by_name(name).await? {
            Some(existing) => Ok((existing, false)),
            None => Err(Error::TargetAccountNotFound(name.clone())),
        };
    }

    let doc = &snapshot.account;
    if let Some(existing) = store.account_by_name(&doc.name).await? {
        return Ok((existing, false));
    }

    let account = store
        .create_account(CreateAccount {
            name: doc.name.clone(),
            domain: doc.domain.clone(),
            support_email: doc.support_email.clone(),
            locale: doc.locale.clone().or_else(|| Some("es".to_string())),
            timezone: doc.timezone.clone(),
            custom_attributes: doc.custom_attributes.clone(),
            limits: doc.limits.clone(),
            feature_flags: doc.feature_flags.clone(),
            auto_resolve_duration: doc.auto_resolve_duration,
            status: doc.status.clone().unwrap_or_else(|| "active".to_string()),
            created_at: doc.created_at,
        })
        .await?;
    Ok((account, true))
}

fn random_hex() -> String {
    Uuid::new_v4().simple().to_string()
}

fn role_value(role: &Option<String>) -> Result<String> {
    match role {
        Some(role) => Ok(role.parse::<AgentRole>().map_err(Error::Validation)?.to_string()),
        None => Ok(AgentRole::Agent.to_string()),
    }
}

fn availability_value(availability: &Option<String>) -> Result<String> {
    match availability {
        Some(availability) => Ok(availability
            .parse::<Availability>()
            .map_err(Error::Validation)?
            .to_string()),
        None => Ok(Availability::Online.to_string()),
    }
}

fn status_value(status: &Option<String>) -> Result<String> {
    match status {
        Some(status) => Ok(status
            .parse::<ConversationStatus>()
            .map_err(Error::Validation)?
            .to_string()),
        None => Ok(ConversationStatus::Open.to_string()),
    }
}

fn priority_value(priority: &Option<String>) -> Result<Option<String>> {
    match priority {
        Some(priority) => Ok(Some(
            priority
                .parse::<ConversationPriority>()
                .map_err(Error::Validation)?
                .to_string(),
        )),
        None => Ok(None),
    }
}

fn message_type_value(message_type: &Option<String>) -> Result<String> {
    match message_type {
        Some(message_type) => Ok(message_type
            .parse::<MessageType>()
            .map_err(Error::Validation)?
            .to_string()),
        None => Ok(MessageType::Incoming.to_string()),
    }
}

/// Users resolve globally by email. A hit attaches a membership to the
/// existing user; a miss creates the user with a placeholder password
/// and an immediate confirmation.
async fn import_user<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &UserDoc,
    idmap: &mut IdMap,
) -> Result<Outcome> {
    let role = role_value(&doc.role)?;
    let availability = availability_value(&doc.availability)?;

    let (user, outcome) = match store.user_by_email(&doc.email).await? {
        Some(existing) => (existing, Outcome::Reused),
        None => {
            let user = store
                .create_user(CreateUser {
                    name: doc.name.clone(),
                    email: doc.email.clone(),
                    display_name: doc.display_name.clone(),
                    message_signature: doc.message_signature.clone(),
                    ui_settings: doc.ui_settings.clone(),
                    custom_attributes: doc.custom_attributes.clone(),
                    password_digest: random_hex(),
                    confirmed_at: Some(Utc::now()),
                    created_at: doc.user_created_at,
                })
                .await?;
            (user, Outcome::Created)
        }
    };
    idmap.record_user(&doc.email, user.id);

    if store.membership(account_id, user.id).await?.is_none() {
        store
            .create_membership(CreateAccountUser {
                account_id,
                user_id: user.id,
                role,
                availability,
                auto_offline: doc.auto_offline.unwrap_or(true),
                created_at: doc.account_user_created_at,
            })
            .await?;
    }

    Ok(outcome)
}

fn contact_key(doc: &ContactDoc) -> String {
    doc.email
        .clone()
        .or_else(|| doc.identifier.clone())
        .unwrap_or_else(|| doc.original_id.to_string())
}

/// Contacts match within the account by email first, identifier second.
/// A contact with neither is always created.
async fn import_contact<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &ContactDoc,
    idmap: &mut IdMap,
) -> Result<Outcome> {
    let mut existing = None;
    if let Some(email) = &doc.email {
        existing = store.contact_by_email(account_id, email).await?;
    }
    if existing.is_none() {
        if let Some(identifier) = &doc.identifier {
            existing = store.contact_by_identifier(account_id, identifier).await?;
        }
    }

    if let Some(contact) = existing {
        idmap.record_contact(doc.original_id, contact.id);
        return Ok(Outcome::Reused);
    }

    let contact = store
        .create_contact(CreateContact {
            account_id,
            name: doc.name.clone(),
            email: doc.email.clone(),
            phone_number: doc.phone_number.clone(),
            identifier: doc.identifier.clone(),
            additional_attributes: doc.additional_attributes.clone(),
            custom_attributes: doc.custom_attributes.clone(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
        .await?;
    idmap.record_contact(doc.original_id, contact.id);
    Ok(Outcome::Created)
}

/// Fill in whatever a channel payload needs to be creatable on the
/// target: email inboxes get a placeholder address, web widgets get
/// placeholder site fields. Channel kinds the target cannot host
/// degrade to a bare API channel.
fn channel_with_defaults(channel: Channel) -> Channel {
    match channel {
        Channel::Email {
            email,
            forward_to_email,
            imap_enabled,
            smtp_enabled,
        } => Channel::Email {
            email: email
                .filter(|e| !e.is_empty())
                .or_else(|| Some(format!("imported-{}@example.com", random_hex()))),
            forward_to_email,
            imap_enabled,
            smtp_enabled,
        },
        Channel::WebWidget {
            website_name,
            website_url,
            widget_color,
            welcome_title,
            welcome_tagline,
        } => Channel::WebWidget {
            website_name: website_name.or_else(|| Some("Imported Website".to_string())),
            website_url: website_url.or_else(|| Some("https://example.com".to_string())),
            widget_color: widget_color.or_else(|| Some(DEFAULT_WIDGET_COLOR.to_string())),
            welcome_title,
            welcome_tagline,
        },
        Channel::Api { webhook_url } => Channel::Api { webhook_url },
        Channel::Other { .. } => Channel::Api { webhook_url: None },
    }
}

/// Inboxes match by name. Agents are re-attached through the user remap
/// on both paths; emails with no remap entry are left unattached.
async fn import_inbox<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &InboxDoc,
    idmap: &mut IdMap,
) -> Result<Outcome> {
    let (inbox_id, outcome) = match store.inbox_by_name(account_id, &doc.name).await? {
        Some(existing) => (existing.id, Outcome::Reused),
        None => {
            let channel = channel_with_defaults(Channel::from_wire(&doc.channel_type, &doc.channel));
            let inbox = store
                .create_inbox(CreateInbox {
                    account_id,
                    name: doc.name.clone(),
                    channel_type: channel.channel_type().to_string(),
                    channel: channel.to_wire(),
                    settings: doc.settings.clone(),
                    enable_auto_assignment: doc.enable_auto_assignment.unwrap_or(true),
                    greeting_enabled: doc.greeting_enabled.unwrap_or(false),
                    greeting_message: doc.greeting_message.clone(),
                    created_at: doc.created_at,
                })
                .await?;
            (inbox.id, Outcome::Created)
        }
    };
    idmap.record_inbox(doc.original_id, inbox_id);

    for email in &doc.agents {
        if let Some(user_id) = idmap.user(email) {
            store.add_inbox_member(inbox_id, user_id).await?;
        }
    }

    Ok(outcome)
}

/// Labels match by title; distinct source ids with one title collapse
/// into the same target label.
async fn import_label<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &LabelDoc,
    idmap: &mut IdMap,
) -> Result<Outcome> {
    if let Some(existing) = store.label_by_title(account_id, &doc.title).await? {
        idmap.record_label(&doc.title, existing.id);
        return Ok(Outcome::Reused);
    }

    let label = store
        .create_label(CreateLabel {
            account_id,
            title: doc.title.clone(),
            description: doc.description.clone(),
            color: doc
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_LABEL_COLOR.to_string()),
            show_on_sidebar: doc.show_on_sidebar.unwrap_or(true),
            created_at: doc.created_at,
        })
        .await?;
    idmap.record_label(&doc.title, label.id);
    Ok(Outcome::Created)
}

/// Teams match by name. Members resolve through the user remap; emails
/// that never imported are skipped silently.
async fn import_team<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &TeamDoc,
    idmap: &mut IdMap,
) -> Result<Outcome> {
    let (team_id, outcome) = match store.team_by_name(account_id, &doc.name).await? {
        Some(existing) => (existing.id, Outcome::Reused),
        None => {
            let team = store
                .create_team(CreateTeam {
                    account_id,
                    name: doc.name.clone(),
                    description: doc.description.clone(),
                    allow_auto_assign: doc.allow_auto_assign.unwrap_or(true),
                    created_at: doc.created_at,
                })
                .await?;
            (team.id, Outcome::Created)
        }
    };
    idmap.record_team(doc.original_id, team_id);

    for email in &doc.members {
        if let Some(user_id) = idmap.user(email) {
            store.add_team_member(team_id, user_id).await?;
        }
    }

    Ok(outcome)
}

fn conversation_key(doc: &ConversationDoc) -> String {
    match doc.uuid {
        Some(uuid) => uuid.to_string(),
        None => doc.original_id.to_string(),
    }
}

/// Conversations are identified by uuid; a uuid already present in the
/// account means the conversation, including its messages, was imported
/// before. Missing contact or inbox references soft-skip the record.
/// Message failures inside a new conversation are recorded individually
/// and do not fail the conversation.
async fn import_conversation<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &ConversationDoc,
    users: &[UserDoc],
    idmap: &mut IdMap,
    report: &mut ImportReport,
    progress: &dyn ProgressReporter,
) -> Result<Outcome> {
    let uuid = doc.uuid.unwrap_or_else(Uuid::new_v4);

    if let Some(existing) = store.conversation_by_uuid(account_id, uuid).await? {
        idmap.record_conversation(doc.original_id, existing.id);
        return Ok(Outcome::Reused);
    }

    let Some(contact_id) = doc
        .original_contact_id
        .and_then(|original| idmap.contact(original))
    else {
        return Ok(Outcome::Skipped("contact not imported".to_string()));
    };
    let Some(inbox_id) = doc
        .original_inbox_id
        .and_then(|original| idmap.inbox(original))
    else {
        return Ok(Outcome::Skipped("inbox not imported".to_string()));
    };

    // Assignee goes source id -> document email -> remapped user.
    let assignee_id = doc.original_assignee_id.and_then(|original| {
        users
            .iter()
            .find(|u| u.original_user_id == original)
            .and_then(|u| idmap.user(&u.email))
    });
    let team_id = doc.original_team_id.and_then(|original| idmap.team(original));

    let conversation = store
        .create_conversation(CreateConversation {
            account_id,
            display_id: doc.display_id.unwrap_or(doc.original_id),
            uuid,
            contact_id,
            inbox_id,
            assignee_id,
            team_id,
            status: status_value(&doc.status)?,
            priority: priority_value(&doc.priority)?,
            additional_attributes: doc.additional_attributes.clone(),
            custom_attributes: doc.custom_attributes.clone(),
            identifier: doc.identifier.clone(),
            snoozed_until: doc.snoozed_until,
            agent_last_seen_at: doc.agent_last_seen_at,
            contact_last_seen_at: doc.contact_last_seen_at,
            first_reply_created_at: doc.first_reply_created_at,
            last_activity_at: doc.last_activity_at,
            waiting_since: doc.waiting_since,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
        .await?;
    idmap.record_conversation(doc.original_id, conversation.id);

    // Titles with no remap entry were never imported; drop them silently.
    for title in &doc.label_names {
        if idmap.label(title).is_some() {
            store.add_conversation_label(conversation.id, title).await?;
        }
    }

    for message in &doc.messages {
        let key = message
            .original_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| conversation_key(doc));
        let result =
            import_message(store, account_id, conversation.id, contact_id, message, idmap).await;
        match result {
            Ok(attachments) => {
                report.messages.created += 1;
                report.attachments.created += attachments;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                progress.report(MigrationEvent::RecordFailed {
                    phase: "messages",
                    key: key.clone(),
                    message: e.to_string(),
                });
                report.record_error("messages", key, e.to_string());
            }
        }
    }

    Ok(Outcome::Created)
}

/// Returns how many attachment rows the message carried in.
async fn import_message<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    conversation_id: i64,
    contact_id: ContactId,
    doc: &MessageDoc,
    idmap: &mut IdMap,
) -> Result<usize> {
    let (sender_type, sender_id) = match SenderRef::from_message(doc) {
        SenderRef::User { email } => match email.and_then(|e| idmap.user(&e)) {
            Some(user_id) => (Some("User".to_string()), Some(user_id)),
            None => (None, None),
        },
        // A contact sender is always the conversation's own contact.
        SenderRef::Contact { .. } => (Some("Contact".to_string()), Some(contact_id)),
        SenderRef::None => (None, None),
    };

    let message = store
        .create_message(CreateMessage {
            account_id,
            conversation_id,
            content: doc.content.clone(),
            message_type: message_type_value(&doc.message_type)?,
            private: doc.private.unwrap_or(false),
            status: doc.status.clone(),
            source_id: doc.source_id.clone(),
            content_type: doc
                .content_type
                .clone()
                .unwrap_or_else(|| "text".to_string()),
            content_attributes: doc.content_attributes.clone(),
            sender_type,
            sender_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
        .await?;
    if let Some(original_id) = doc.original_id {
        idmap.record_message(original_id, message.id);
    }

    let mut attachments = 0;
    for attachment in &doc.attachments {
        store
            .create_attachment(CreateAttachment {
                account_id,
                message_id: message.id,
                file_type: attachment
                    .file_type
                    .clone()
                    .unwrap_or_else(|| "file".to_string()),
                file_size: attachment.file_size,
                filename: attachment.filename.clone(),
                content_type: attachment.content_type.clone(),
                pending_download: attachment.download_needed,
                created_at: doc.created_at,
            })
            .await?;
        attachments += 1;
    }

    Ok(attachments)
}

async fn import_canned_response<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &CannedResponseDoc,
) -> Result<Outcome> {
    if store
        .canned_response_by_short_code(account_id, &doc.short_code)
        .await?
        .is_some()
    {
        return Ok(Outcome::Reused);
    }

    store
        .create_canned_response(CreateCannedResponse {
            account_id,
            short_code: doc.short_code.clone(),
            content: doc.content.clone().unwrap_or_default(),
            created_at: doc.created_at,
        })
        .await?;
    Ok(Outcome::Created)
}

/// Custom filters belong to a user; the owner resolves through the user
/// remap and an unresolvable owner soft-skips the filter.
async fn import_custom_filter<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &CustomFilterDoc,
    idmap: &IdMap,
) -> Result<Outcome> {
    let Some(email) = &doc.user_email else {
        return Ok(Outcome::Skipped("no owner email".to_string()));
    };
    let Some(user_id) = idmap.user(email) else {
        return Ok(Outcome::Skipped(format!("owner {} not imported", email)));
    };

    if store
        .custom_filter_by_name(account_id, user_id, &doc.name)
        .await?
        .is_some()
    {
        return Ok(Outcome::Reused);
    }

    store
        .create_custom_filter(CreateCustomFilter {
            account_id,
            user_id,
            name: doc.name.clone(),
            filter_type: doc
                .filter_type
                .clone()
                .unwrap_or_else(|| "conversation".to_string()),
            query: doc.query.clone(),
            created_at: doc.created_at,
        })
        .await?;
    Ok(Outcome::Created)
}

/// Webhooks need their inbox; an unresolvable inbox soft-skips.
async fn import_webhook<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &WebhookDoc,
    idmap: &IdMap,
) -> Result<Outcome> {
    let Some(original_inbox) = doc.inbox_id else {
        return Ok(Outcome::Skipped("no inbox reference".to_string()));
    };
    let Some(inbox_id) = idmap.inbox(original_inbox) else {
        return Ok(Outcome::Skipped(format!(
            "inbox {} not imported",
            original_inbox
        )));
    };

    if store
        .webhook_by_url(account_id, inbox_id, &doc.url)
        .await?
        .is_some()
    {
        return Ok(Outcome::Reused);
    }

    store
        .create_webhook(CreateWebhook {
            account_id,
            inbox_id,
            url: doc.url.clone(),
            subscriptions: doc.subscriptions.clone(),
            webhook_type: doc
                .webhook_type
                .clone()
                .unwrap_or_else(|| "account".to_string()),
            created_at: doc.created_at,
        })
        .await?;
    Ok(Outcome::Created)
}

async fn import_automation_rule<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    doc: &AutomationRuleDoc,
) -> Result<Outcome> {
    if store
        .automation_rule_by_name(account_id, &doc.name)
        .await?
        .is_some()
    {
        return Ok(Outcome::Reused);
    }

    store
        .create_automation_rule(CreateAutomationRule {
            account_id,
            name: doc.name.clone(),
            description: doc.description.clone(),
            event_name: doc
                .event_name
                .clone()
                .unwrap_or_else(|| "conversation_created".to_string()),
            conditions: doc.conditions.clone(),
            actions: doc.actions.clone(),
            active: doc.active.unwrap_or(true),
            created_at: doc.created_at,
        })
        .await?;
    Ok(Outcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_email_channel_gets_placeholder_address() {
        let channel = channel_with_defaults(Channel::Email {
            email: None,
            forward_to_email: None,
            imap_enabled: None,
            smtp_enabled: None,
        });
        let Channel::Email { email, .. } = channel else {
            panic!("expected email channel");
        };
        let email = email.unwrap();
        assert!(email.starts_with("imported-"));
        assert!(email.ends_with("@example.com"));
    }

    #[test]
    fn test_email_channel_keeps_existing_address() {
        let channel = channel_with_defaults(Channel::Email {
            email: Some("help@acme.test".to_string()),
            forward_to_email: None,
            imap_enabled: Some(true),
            smtp_enabled: None,
        });
        let Channel::Email { email, imap_enabled, .. } = channel else {
            panic!("expected email channel");
        };
        assert_eq!(email.as_deref(), Some("help@acme.test"));
        assert_eq!(imap_enabled, Some(true));
    }

    #[test]
    fn test_web_widget_defaults() {
        let channel = channel_with_defaults(Channel::WebWidget {
            website_name: None,
            website_url: None,
            widget_color: None,
            welcome_title: Some("Hi".to_string()),
            welcome_tagline: None,
        });
        let Channel::WebWidget {
            website_name,
            website_url,
            widget_color,
            welcome_title,
            ..
        } = channel
        else {
            panic!("expected web widget channel");
        };
        assert_eq!(website_name.as_deref(), Some("Imported Website"));
        assert_eq!(website_url.as_deref(), Some("https://example.com"));
        assert_eq!(widget_color.as_deref(), Some("#1f93ff"));
        assert_eq!(welcome_title.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_unhosted_channel_falls_back_to_api() {
        let channel = channel_with_defaults(Channel::Other {
            channel_type: "Channel::Telegram".to_string(),
        });
        assert_eq!(channel, Channel::Api { webhook_url: None });
    }

    #[test]
    fn test_enum_values_validated() {
        assert_eq!(role_value(&None).unwrap(), "agent");
        assert_eq!(
            role_value(&Some("administrator".to_string())).unwrap(),
            "administrator"
        );
        assert!(role_value(&Some("superuser".to_string())).is_err());

        assert_eq!(status_value(&None).unwrap(), "open");
        assert!(status_value(&Some("archived".to_string())).is_err());

        assert_eq!(message_type_value(&None).unwrap(), "incoming");
        assert!(priority_value(&Some("asap".to_string())).is_err());
        assert_eq!(priority_value(&None).unwrap(), None);
    }

    use crate::export::export_account;
    use crate::progress::NoopProgress;
    use chrono::{DateTime, TimeZone};
    use deskport_storage::models::{
        CreateAccount as SeedAccount, CreateAccountUser as SeedMembership,
        CreateAttachment as SeedAttachment, CreateAutomationRule as SeedRule,
        CreateCannedResponse as SeedCanned, CreateContact as SeedContact,
        CreateConversation as SeedConversation, CreateCustomFilter as SeedFilter,
        CreateInbox as SeedInbox, CreateLabel as SeedLabel, CreateMessage as SeedMessage,
        CreateTeam as SeedTeam, CreateUser as SeedUser, CreateWebhook as SeedWebhook,
    };
    use deskport_storage::{ConversationFilter, MemoryStore};
    use serde_json::json;

    fn t(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, day, hour, minute, 0).unwrap()
    }

    async fn seed_user(
        store: &mut MemoryStore,
        account_id: AccountId,
        email: &str,
        role: &str,
    ) -> deskport_storage::models::User {
        let user = store
            .create_user(SeedUser {
                name: Some(email.split('@').next().unwrap_or(email).to_string()),
                email: email.to_string(),
                display_name: None,
                message_signature: None,
                ui_settings: json!({}),
                custom_attributes: json!({}),
                password_digest: "seed".to_string(),
                confirmed_at: Some(t(1, 8, 0)),
                created_at: Some(t(1, 8, 0)),
            })
            .await
            .unwrap();
        store
            .create_membership(SeedMembership {
                account_id,
                user_id: user.id,
                role: role.to_string(),
                availability: "online".to_string(),
                auto_offline: true,
                created_at: Some(t(1, 8, 0)),
            })
            .await
            .unwrap();
        user
    }

    /// Source deployment holding the Acme account with one record of
    /// every entity type.
    async fn seed_source() -> (MemoryStore, AccountId) {
        let mut store = MemoryStore::new();
        let account = store
            .create_account(SeedAccount {
                name: "Acme".to_string(),
                domain: Some("acme.test".to_string()),
                support_email: Some("support@acme.test".to_string()),
                locale: Some("en".to_string()),
                timezone: Some("UTC".to_string()),
                custom_attributes: json!({"tier": "gold"}),
                limits: json!({}),
                feature_flags: json!({"audit_log": true}),
                auto_resolve_duration: Some(30),
                status: "active".to_string(),
                created_at: Some(t(1, 8, 0)),
            })
            .await
            .unwrap();

        let ada = seed_user(&mut store, account.id, "a@x.com", "agent").await;
        let bea = seed_user(&mut store, account.id, "b@x.com", "administrator").await;

        let contact = store
            .create_contact(SeedContact {
                account_id: account.id,
                name: Some("Cora".to_string()),
                email: Some("c@x.com".to_string()),
                phone_number: Some("+15550101".to_string()),
                identifier: None,
                additional_attributes: json!({"city": "Lyon"}),
                custom_attributes: json!({}),
                created_at: Some(t(1, 9, 0)),
                updated_at: Some(t(2, 9, 0)),
            })
            .await
            .unwrap();

        let inbox = store
            .create_inbox(SeedInbox {
                account_id: account.id,
                name: "Support".to_string(),
                channel_type: "Channel::WebWidget".to_string(),
                channel: json!({
                    "website_name": "Acme",
                    "website_url": "https://acme.test",
                    "widget_color": "#00ff00",
                    "welcome_title": "Welcome",
                    "welcome_tagline": null,
                }),
                settings: json!({"auto_reply": true}),
                enable_auto_assignment: true,
                greeting_enabled: false,
                greeting_message: None,
                created_at: Some(t(1, 9, 0)),
            })
            .await
            .unwrap();
        store.add_inbox_member(inbox.id, ada.id).await.unwrap();

        store
            .create_label(SeedLabel {
                account_id: account.id,
                title: "urgent".to_string(),
                description: Some("Needs attention".to_string()),
                color: "#ff0000".to_string(),
                show_on_sidebar: true,
                created_at: Some(t(1, 9, 0)),
            })
            .await
            .unwrap();

        let team = store
            .create_team(SeedTeam {
                account_id: account.id,
                name: "Tier 1".to_string(),
                description: None,
                allow_auto_assign: true,
                created_at: Some(t(1, 9, 0)),
            })
            .await
            .unwrap();
        store.add_team_member(team.id, bea.id).await.unwrap();

        let conversation = store
            .create_conversation(SeedConversation {
                account_id: account.id,
                display_id: 1,
                uuid: Uuid::new_v4(),
                contact_id: contact.id,
                inbox_id: inbox.id,
                assignee_id: Some(ada.id),
                team_id: Some(team.id),
                status: "open".to_string(),
                priority: Some("high".to_string()),
                additional_attributes: json!({"browser": "firefox"}),
                custom_attributes: json!({}),
                identifier: None,
                snoozed_until: None,
                agent_last_seen_at: Some(t(3, 10, 5)),
                contact_last_seen_at: None,
                first_reply_created_at: Some(t(3, 10, 5)),
                last_activity_at: Some(t(3, 10, 5)),
                waiting_since: None,
                created_at: Some(t(3, 10, 0)),
                updated_at: Some(t(3, 10, 5)),
            })
            .await
            .unwrap();
        store
            .add_conversation_label(conversation.id, "urgent")
            .await
            .unwrap();

        store
            .create_message(SeedMessage {
                account_id: account.id,
                conversation_id: conversation.id,
                content: Some("Hello, I need help".to_string()),
                message_type: "incoming".to_string(),
                private: false,
                status: Some("sent".to_string()),
                source_id: None,
                content_type: "text".to_string(),
                content_attributes: json!({}),
                sender_type: Some("Contact".to_string()),
                sender_id: Some(contact.id),
                created_at: Some(t(3, 10, 0)),
                updated_at: Some(t(3, 10, 0)),
            })
            .await
            .unwrap();
        let reply = store
            .create_message(SeedMessage {
                account_id: account.id,
                conversation_id: conversation.id,
                content: Some("We are on it".to_string()),
                message_type: "outgoing".to_string(),
                private: false,
                status: Some("sent".to_string()),
                source_id: None,
                content_type: "text".to_string(),
                content_attributes: json!({}),
                sender_type: Some("User".to_string()),
                sender_id: Some(ada.id),
                created_at: Some(t(3, 10, 5)),
                updated_at: Some(t(3, 10, 5)),
            })
            .await
            .unwrap();
        store
            .create_attachment(SeedAttachment {
                account_id: account.id,
                message_id: reply.id,
                file_type: "image".to_string(),
                file_size: Some(2048),
                filename: Some("screen.png".to_string()),
                content_type: Some("image/png".to_string()),
                pending_download: false,
                created_at: Some(t(3, 10, 5)),
            })
            .await
            .unwrap();

        store
            .create_canned_response(SeedCanned {
                account_id: account.id,
                short_code: "thanks".to_string(),
                content: "Thank you for reaching out!".to_string(),
                created_at: Some(t(1, 9, 0)),
            })
            .await
            .unwrap();
        store
            .create_custom_filter(SeedFilter {
                account_id: account.id,
                user_id: ada.id,
                name: "My open".to_string(),
                filter_type: "conversation".to_string(),
                query: json!({"status": "open"}),
                created_at: Some(t(1, 9, 0)),
            })
            .await
            .unwrap();
        store
            .create_webhook(SeedWebhook {
                account_id: account.id,
                inbox_id: inbox.id,
                url: "https://hooks.acme.test/1".to_string(),
                subscriptions: json!(["conversation_created"]),
                webhook_type: "account".to_string(),
                created_at: Some(t(1, 9, 0)),
            })
            .await
            .unwrap();
        store
            .create_automation_rule(SeedRule {
                account_id: account.id,
                name: "Greet".to_string(),
                description: None,
                event_name: "conversation_created".to_string(),
                conditions: json!([{"attribute_key": "status", "values": ["open"]}]),
                actions: json!([{"action_name": "send_message"}]),
                active: true,
                created_at: Some(t(1, 9, 0)),
            })
            .await
            .unwrap();

        (store, account.id)
    }

    async fn acme_snapshot() -> Snapshot {
        let (mut source, account_id) = seed_source().await;
        export_account(
            &mut source,
            account_id,
            &crate::export::ExportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_into_fresh_target() {
        let snapshot = acme_snapshot().await;
        let mut target = MemoryStore::new();

        let report = import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

        assert!(report.account_created);
        assert_eq!(report.users.created, 2);
        assert_eq!(report.contacts.created, 1);
        assert_eq!(report.inboxes.created, 1);
        assert_eq!(report.labels.created, 1);
        assert_eq!(report.teams.created, 1);
        assert_eq!(report.conversations.created, 1);
        assert_eq!(report.messages.created, 2);
        assert_eq!(report.attachments.created, 1);
        assert_eq!(report.canned_responses.created, 1);
        assert_eq!(report.custom_filters.created, 1);
        assert_eq!(report.webhooks.created, 1);
        assert_eq!(report.automation_rules.created, 1);
        assert!(report.errors.is_empty());
        assert!(report.skipped.is_empty());

        let account = target.account_by_name("Acme").await.unwrap().unwrap();
        let conversations = target
            .conversations_for_account(account.id, &ConversationFilter::default())
            .await
            .unwrap();
        assert_eq!(conversations.len(), 1);
        let conversation = &conversations[0];

        assert_eq!(conversation.status, "open");
        assert_eq!(conversation.priority.as_deref(), Some("high"));
        assert_eq!(conversation.created_at, t(3, 10, 0));
        assert_eq!(conversation.last_activity_at, Some(t(3, 10, 5)));

        let contact = target
            .contact_by_id(conversation.contact_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.email.as_deref(), Some("c@x.com"));

        let ada = target.user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(conversation.assignee_id, Some(ada.id));

        assert_eq!(
            target
                .conversation_label_titles(conversation.id)
                .await
                .unwrap(),
            vec!["urgent".to_string()]
        );

        let messages = target
            .messages_for_conversation(conversation.id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content.as_deref(), Some("Hello, I need help"));
        assert_eq!(messages[0].sender_type.as_deref(), Some("Contact"));
        assert_eq!(messages[0].sender_id, Some(contact.id));
        assert_eq!(messages[1].content.as_deref(), Some("We are on it"));
        assert_eq!(messages[1].sender_type.as_deref(), Some("User"));
        assert_eq!(messages[1].sender_id, Some(ada.id));

        let attachments = target
            .attachments_for_message(messages[1].id)
            .await
            .unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename.as_deref(), Some("screen.png"));
        assert!(attachments[0].pending_download);

        let inboxes = target.inboxes_for_account(account.id).await.unwrap();
        assert_eq!(inboxes[0].channel_type, "Channel::WebWidget");
        assert_eq!(inboxes[0].channel["website_url"], "https://acme.test");
        assert_eq!(inboxes[0].settings, json!({"auto_reply": true}));
        assert_eq!(
            target.inbox_member_emails(inboxes[0].id).await.unwrap(),
            vec!["a@x.com".to_string()]
        );

        let teams = target.teams_for_account(account.id).await.unwrap();
        assert_eq!(
            target.team_member_emails(teams[0].id).await.unwrap(),
            vec!["b@x.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_import_reuses_everything() {
        let snapshot = acme_snapshot().await;
        let mut target = MemoryStore::new();

        import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap();
        let second = import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

        assert!(!second.account_created);
        assert_eq!(second.users.created, 0);
        assert_eq!(second.users.reused, 2);
        assert_eq!(second.contacts.created, 0);
        assert_eq!(second.contacts.reused, 1);
        assert_eq!(second.inboxes.created, 0);
        assert_eq!(second.labels.created, 0);
        assert_eq!(second.teams.created, 0);
        assert_eq!(second.conversations.created, 0);
        assert_eq!(second.conversations.reused, 1);
        assert_eq!(second.messages.created, 0);
        assert_eq!(second.attachments.created, 0);
        assert_eq!(second.canned_responses.created, 0);
        assert_eq!(second.custom_filters.created, 0);
        assert_eq!(second.webhooks.created, 0);
        assert_eq!(second.automation_rules.created, 0);
        assert!(second.errors.is_empty());

        let account = target.account_by_name("Acme").await.unwrap().unwrap();
        assert_eq!(
            target.memberships_for_account(account.id).await.unwrap().len(),
            2
        );
        let conversations = target
            .conversations_for_account(account.id, &ConversationFilter::default())
            .await
            .unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(
            target
                .messages_for_conversation(conversations[0].id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_existing_user_gains_membership_only() {
        let snapshot = acme_snapshot().await;

        let mut target = MemoryStore::new();
        let globex = target
            .create_account(SeedAccount {
                name: "Globex".to_string(),
                domain: None,
                support_email: None,
                locale: Some("en".to_string()),
                timezone: None,
                custom_attributes: json!({}),
                limits: json!({}),
                feature_flags: json!({}),
                auto_resolve_duration: None,
                status: "active".to_string(),
                created_at: None,
            })
            .await
            .unwrap();
        seed_user(&mut target, globex.id, "a@x.com", "agent").await;

        let report = import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

        assert_eq!(report.users.created, 1);
        assert_eq!(report.users.reused, 1);

        let acme = target.account_by_name("Acme").await.unwrap().unwrap();
        let memberships = target.memberships_for_account(acme.id).await.unwrap();
        assert_eq!(memberships.len(), 2);

        let ada = target.user_by_email("a@x.com").await.unwrap().unwrap();
        assert!(target
            .membership(globex.id, ada.id)
            .await
            .unwrap()
            .is_some());
        assert!(target.membership(acme.id, ada.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unresolved_references_soft_skip() {
        let document = json!({
            "account": {"original_id": 1, "name": "Orphans"},
            "conversations": [{
                "original_id": 9,
                "uuid": "3f2a7a6e-9c41-4e8b-8f0d-2b5c9d1e4a77",
                "original_contact_id": 77,
                "original_inbox_id": 5,
                "messages": [{"content": "lost"}],
            }],
            "webhooks": [{"original_id": 4, "inbox_id": 44, "url": "https://x.test/h"}],
            "custom_filters": [{"original_id": 6, "name": "mine", "user_email": "ghost@x.com"}],
        });
        let snapshot = Snapshot::from_json(&document.to_string()).unwrap();

        let mut target = MemoryStore::new();
        let report = import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.conversations.created, 0);
        assert_eq!(report.messages.created, 0);

        let account = target.account_by_name("Orphans").await.unwrap().unwrap();
        assert!(target
            .conversations_for_account(account.id, &ConversationFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(target.webhooks_for_account(account.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_label_title_dropped_silently() {
        let mut snapshot = acme_snapshot().await;
        snapshot.conversations[0]
            .label_names
            .push("ghost".to_string());

        let mut target = MemoryStore::new();
        let report = import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

        assert!(report.errors.is_empty());
        assert!(report.skipped.is_empty());
        assert_eq!(report.conversations.created, 1);

        let account = target.account_by_name("Acme").await.unwrap().unwrap();
        let conversations = target
            .conversations_for_account(account.id, &ConversationFilter::default())
            .await
            .unwrap();
        assert_eq!(
            target
                .conversation_label_titles(conversations[0].id)
                .await
                .unwrap(),
            vec!["urgent".to_string()]
        );
    }

    #[tokio::test]
    async fn test_contact_sender_attaches_to_the_conversation_contact() {
        let document = json!({
            "account": {"original_id": 1, "name": "Orbit"},
            "contacts": [{"original_id": 7, "email": "c@x.com"}],
            "inboxes": [{"original_id": 5, "name": "Support", "channel_type": "Channel::Api"}],
            "conversations": [{
                "original_id": 9,
                "uuid": "5d0b8a1c-2f6e-4c3a-9b7d-8e1f0a2c4b6d",
                "original_contact_id": 7,
                "original_inbox_id": 5,
                "messages": [{
                    "content": "checking in",
                    "sender_type": "Contact",
                    "sender_original_id": 99,
                }],
            }],
        });
        let snapshot = Snapshot::from_json(&document.to_string()).unwrap();

        let mut target = MemoryStore::new();
        let report = import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(report.messages.created, 1);

        let account = target.account_by_name("Orbit").await.unwrap().unwrap();
        let conversations = target
            .conversations_for_account(account.id, &ConversationFilter::default())
            .await
            .unwrap();
        let messages = target
            .messages_for_conversation(conversations[0].id)
            .await
            .unwrap();
        assert_eq!(messages[0].sender_type.as_deref(), Some("Contact"));
        assert_eq!(messages[0].sender_id, Some(conversations[0].contact_id));
    }

    #[tokio::test]
    async fn test_fatal_failure_rolls_back_every_write() {
        let snapshot = acme_snapshot().await;

        let mut target = MemoryStore::new();
        target.fail_after_creates(5);

        let err = import_snapshot(
            &mut target,
            &snapshot,
            &ImportOptions::default(),
            &NoopProgress,
        )
        .await
        .unwrap_err();
        assert!(err.is_fatal());

        assert!(target.account_by_name("Acme").await.unwrap().is_none());
        assert!(target.user_by_email("a@x.com").await.unwrap().is_none());
        assert!(target.user_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dry_run_reports_then_rolls_back() {
        let snapshot = acme_snapshot().await;

        let mut target = MemoryStore::new();
        let options = ImportOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = import_snapshot(&mut target, &snapshot, &options, &NoopProgress)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.users.created, 2);
        assert_eq!(report.conversations.created, 1);
        assert!(target.account_by_name("Acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_explicit_target_account_must_exist() {
        let snapshot = acme_snapshot().await;

        let mut target = MemoryStore::new();
        let options = ImportOptions {
            target_account_name: Some("Beta".to_string()),
            ..Default::default()
        };
        let err = import_snapshot(&mut target, &snapshot, &options, &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TargetAccountNotFound(_)));
        assert!(target.account_by_name("Acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_explicit_target_account_receives_import() {
        let snapshot = acme_snapshot().await;

        let mut target = MemoryStore::new();
        target
            .create_account(SeedAccount {
                name: "Beta".to_string(),
                domain: None,
                support_email: None,
                locale: Some("en".to_string()),
                timezone: None,
                custom_attributes: json!({}),
                limits: json!({}),
                feature_flags: json!({}),
                auto_resolve_duration: None,
                status: "active".to_string(),
                created_at: None,
            })
            .await
            .unwrap();

        let options = ImportOptions {
            target_account_name: Some("Beta".to_string()),
            ..Default::default()
        };
        let report = import_snapshot(&mut target, &snapshot, &options, &NoopProgress)
            .await
            .unwrap();

        assert!(!report.account_created);
        assert!(target.account_by_name("Acme").await.unwrap().is_none());

        let beta = target.account_by_name("Beta").await.unwrap().unwrap();
        assert_eq!(
            target.memberships_for_account(beta.id).await.unwrap().len(),
            2
        );
        assert_eq!(
            target
                .conversations_for_account(beta.id, &ConversationFilter::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
