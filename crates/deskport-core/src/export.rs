//! Account export
//!
//! Walks every collection an account owns and assembles a
//! self-contained [`Snapshot`]. Conversations can be narrowed by
//! status, date window, and count; the reference collections (users,
//! contacts, inboxes, and the rest) are always exported in full so the
//! document imports cleanly on its own.

use crate::progress::{MigrationEvent, ProgressReporter};
use crate::snapshot::{
    AccountDoc, AttachmentDoc, AutomationRuleDoc, CannedResponseDoc, Channel, ContactDoc,
    ConversationDoc, CustomFilterDoc, InboxDoc, LabelDoc, MessageDoc, Metadata, Snapshot, TeamDoc,
    UserDoc, WebhookDoc,
};
use chrono::{DateTime, Utc};
use deskport_common::types::{AccountId, ConversationStatus, Timestamp};
use deskport_common::{Error, Result};
use deskport_storage::{AccountStore, ConversationFilter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Conversation selection for an export run
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub limit: Option<i64>,
    pub status: Vec<ConversationStatus>,
    pub from_date: Option<Timestamp>,
    pub to_date: Option<Timestamp>,
    /// Produce a document even when no conversation matches
    pub export_empty_account: bool,
}

impl ExportOptions {
    fn filter(&self) -> ConversationFilter {
        ConversationFilter {
            limit: self.limit,
            status: self.status.clone(),
            from_date: self.from_date,
            to_date: self.to_date,
        }
    }
}

/// Result of writing a snapshot to disk
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub bytes: u64,
    pub conversations: usize,
    pub messages: usize,
}

/// Export one account into a snapshot document.
///
/// Refuses to produce an empty document unless the options ask for one:
/// exporting an account with no matching conversations is almost always
/// a mistyped filter.
pub async fn export_account<S: AccountStore>(
    store: &mut S,
    account_id: AccountId,
    options: &ExportOptions,
    progress: &dyn ProgressReporter,
) -> Result<Snapshot> {
    let account = store
        .account_by_id(account_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Account {} not found", account_id)))?;

    info!(account = %account.name, "Exporting account");

    let conversations = store
        .conversations_for_account(account.id, &options.filter())
        .await?;
    if conversations.is_empty() && !options.export_empty_account {
        return Err(Error::EmptyExport(account.name));
    }

    progress.report(MigrationEvent::PhaseStarted { phase: "users" });
    let mut users = Vec::new();
    for membership in store.memberships_for_account(account.id).await? {
        let Some(user) = store.user_by_id(membership.user_id).await? else {
            progress.report(MigrationEvent::RecordSkipped {
                phase: "users",
                key: membership.user_id.to_string(),
                reason: "user row missing".to_string(),
            });
            continue;
        };
        users.push(UserDoc {
            original_user_id: user.id,
            name: user.name,
            email: user.email,
            display_name: user.display_name,
            message_signature: user.message_signature,
            ui_settings: user.ui_settings,
            custom_attributes: user.custom_attributes,
            role: Some(membership.role),
            availability: Some(membership.availability),
            auto_offline: Some(membership.auto_offline),
            user_created_at: Some(user.created_at),
            account_user_created_at: Some(membership.created_at),
        });
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "users",
        created: users.len(),
        reused: 0,
    });

    progress.report(MigrationEvent::PhaseStarted { phase: "contacts" });
    let contacts: Vec<ContactDoc> = store
        .contacts_for_account(account.id)
        .await?
        .into_iter()
        .map(|contact| ContactDoc {
            original_id: contact.id,
            name: contact.name,
            email: contact.email,
            phone_number: contact.phone_number,
            identifier: contact.identifier,
            additional_attributes: contact.additional_attributes,
            custom_attributes: contact.custom_attributes,
            created_at: Some(contact.created_at),
            updated_at: Some(contact.updated_at),
        })
        .collect();
    progress.report(MigrationEvent::PhaseFinished {
        phase: "contacts",
        created: contacts.len(),
        reused: 0,
    });

    progress.report(MigrationEvent::PhaseStarted { phase: "inboxes" });
    let mut inboxes = Vec::new();
    for inbox in store.inboxes_for_account(account.id).await? {
        let channel = Channel::from_wire(&inbox.channel_type, &inbox.channel);
        let agents = store.inbox_member_emails(inbox.id).await?;
        inboxes.push(InboxDoc {
            original_id: inbox.id,
            name: inbox.name,
            channel_type: channel.channel_type().to_string(),
            channel: channel.to_wire(),
            settings: inbox.settings,
            enable_auto_assignment: Some(inbox.enable_auto_assignment),
            greeting_enabled: Some(inbox.greeting_enabled),
            greeting_message: inbox.greeting_message,
            created_at: Some(inbox.created_at),
            agents,
        });
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "inboxes",
        created: inboxes.len(),
        reused: 0,
    });

    let labels: Vec<LabelDoc> = store
        .labels_for_account(account.id)
        .await?
        .into_iter()
        .map(|label| LabelDoc {
            original_id: label.id,
            title: label.title,
            description: label.description,
            color: Some(label.color),
            show_on_sidebar: Some(label.show_on_sidebar),
            created_at: Some(label.created_at),
        })
        .collect();

    let mut teams = Vec::new();
    for team in store.teams_for_account(account.id).await? {
        let members = store.team_member_emails(team.id).await?;
        teams.push(TeamDoc {
            original_id: team.id,
            name: team.name,
            description: team.description,
            allow_auto_assign: Some(team.allow_auto_assign),
            created_at: Some(team.created_at),
            members,
        });
    }

    progress.report(MigrationEvent::PhaseStarted {
        phase: "conversations",
    });
    let mut conversation_docs = Vec::new();
    let mut total_messages = 0;
    for conversation in conversations {
        let label_names = store.conversation_label_titles(conversation.id).await?;
        let mut messages = Vec::new();
        for message in store.messages_for_conversation(conversation.id).await? {
            let mut attachments = Vec::new();
            for attachment in store.attachments_for_message(message.id).await? {
                attachments.push(AttachmentDoc {
                    original_id: Some(attachment.id),
                    file_type: Some(attachment.file_type),
                    file_size: attachment.file_size,
                    filename: attachment.filename,
                    content_type: attachment.content_type,
                    download_needed: true,
                });
            }

            let (sender_email, sender_name) = match message.sender_type.as_deref() {
                Some("User") => match message.sender_id {
                    Some(id) => store
                        .user_by_id(id)
                        .await?
                        .map(|u| (Some(u.email), u.name))
                        .unwrap_or((None, None)),
                    None => (None, None),
                },
                Some("Contact") => match message.sender_id {
                    Some(id) => store
                        .contact_by_id(id)
                        .await?
                        .map(|c| (c.email, c.name))
                        .unwrap_or((None, None)),
                    None => (None, None),
                },
                Some(_) | None => (None, None),
            };

            total_messages += 1;
            messages.push(MessageDoc {
                original_id: Some(message.id),
                content: message.content,
                message_type: Some(message.message_type),
                private: Some(message.private),
                status: message.status,
                source_id: message.source_id,
                content_type: Some(message.content_type),
                content_attributes: message.content_attributes,
                sender_type: message.sender_type,
                sender_original_id: message.sender_id,
                sender_email,
                sender_name,
                created_at: Some(message.created_at),
                updated_at: Some(message.updated_at),
                attachments,
            });
        }

        conversation_docs.push(ConversationDoc {
            original_id: conversation.id,
            display_id: Some(conversation.display_id),
            uuid: Some(conversation.uuid),
            status: Some(conversation.status),
            priority: conversation.priority,
            original_contact_id: Some(conversation.contact_id),
            original_inbox_id: Some(conversation.inbox_id),
            original_assignee_id: conversation.assignee_id,
            original_team_id: conversation.team_id,
            additional_attributes: conversation.additional_attributes,
            custom_attributes: conversation.custom_attributes,
            identifier: conversation.identifier,
            snoozed_until: conversation.snoozed_until,
            created_at: Some(conversation.created_at),
            updated_at: Some(conversation.updated_at),
            last_activity_at: conversation.last_activity_at,
            agent_last_seen_at: conversation.agent_last_seen_at,
            contact_last_seen_at: conversation.contact_last_seen_at,
            first_reply_created_at: conversation.first_reply_created_at,
            waiting_since: conversation.waiting_since,
            label_names,
            messages,
        });
    }
    progress.report(MigrationEvent::PhaseFinished {
        phase: "conversations",
        created: conversation_docs.len(),
        reused: 0,
    });

    let canned_responses: Vec<CannedResponseDoc> = store
        .canned_responses_for_account(account.id)
        .await?
        .into_iter()
        .map(|canned| CannedResponseDoc {
            original_id: canned.id,
            short_code: canned.short_code,
            content: Some(canned.content),
            created_at: Some(canned.created_at),
        })
        .collect();

    let mut custom_filters = Vec::new();
    for filter in store.custom_filters_for_account(account.id).await? {
        let user_email = store
            .user_by_id(filter.user_id)
            .await?
            .map(|user| user.email);
        custom_filters.push(CustomFilterDoc {
            original_id: filter.id,
            name: filter.name,
            filter_type: Some(filter.filter_type),
            query: filter.query,
            user_email,
            created_at: Some(filter.created_at),
        });
    }

    let webhooks: Vec<WebhookDoc> = store
        .webhooks_for_account(account.id)
        .await?
        .into_iter()
        .map(|webhook| WebhookDoc {
            original_id: webhook.id,
            inbox_id: Some(webhook.inbox_id),
            url: webhook.url,
            subscriptions: webhook.subscriptions,
            webhook_type: Some(webhook.webhook_type),
            created_at: Some(webhook.created_at),
        })
        .collect();

    let automation_rules: Vec<AutomationRuleDoc> = store
        .automation_rules_for_account(account.id)
        .await?
        .into_iter()
        .map(|rule| AutomationRuleDoc {
            original_id: rule.id,
            name: rule.name,
            description: rule.description,
            event_name: Some(rule.event_name),
            conditions: rule.conditions,
            actions: rule.actions,
            active: Some(rule.active),
            created_at: Some(rule.created_at),
        })
        .collect();

    let metadata = Metadata {
        exported_at: Some(Utc::now()),
        source_host: Some(
            std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
        ),
        account_name: Some(account.name.clone()),
        total_users: users.len(),
        total_conversations: conversation_docs.len(),
        total_contacts: contacts.len(),
        total_inboxes: inboxes.len(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    info!(
        conversations = conversation_docs.len(),
        messages = total_messages,
        "Export assembled"
    );

    Ok(Snapshot {
        account: AccountDoc {
            original_id: account.id,
            name: account.name,
            domain: account.domain,
            support_email: account.support_email,
            locale: account.locale,
            timezone: account.timezone,
            custom_attributes: account.custom_attributes,
            limits: account.limits,
            feature_flags: account.feature_flags,
            auto_resolve_duration: account.auto_resolve_duration,
            status: Some(account.status),
            created_at: Some(account.created_at),
        },
        users,
        contacts,
        inboxes,
        labels,
        teams,
        conversations: conversation_docs,
        canned_responses,
        custom_filters,
        webhooks,
        automation_rules,
        metadata,
    })
}

/// Write a snapshot to `output_dir` under its canonical file name
pub fn write_snapshot(snapshot: &Snapshot, output_dir: &Path) -> Result<ExportSummary> {
    let account_name = snapshot
        .metadata
        .account_name
        .as_deref()
        .unwrap_or(&snapshot.account.name);
    let exported_at = snapshot.metadata.exported_at.unwrap_or_else(Utc::now);
    let path = output_dir.join(snapshot_file_name(account_name, exported_at));

    let data = snapshot.to_json()?;

    std::fs::create_dir_all(output_dir).map_err(|e| {
        Error::Snapshot(format!(
            "Failed to create {}: {}",
            output_dir.display(),
            e
        ))
    })?;
    std::fs::write(&path, &data)
        .map_err(|e| Error::Snapshot(format!("Failed to write {}: {}", path.display(), e)))?;

    info!(path = %path.display(), bytes = data.len(), "Snapshot written");

    Ok(ExportSummary {
        path,
        bytes: data.len() as u64,
        conversations: snapshot.conversations.len(),
        messages: snapshot
            .conversations
            .iter()
            .map(|c| c.messages.len())
            .sum(),
    })
}

fn snapshot_file_name(account_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "complete_account_export_{}_{}.json",
        slugify(account_name),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Lowercase the name and collapse every non-alphanumeric run into one
/// underscore. Distinct names can collapse to the same slug; the
/// timestamp keeps file names unique.
fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            slug.push(c.to_ascii_lowercase());
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("account");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Support"), "acme_support");
        assert_eq!(slugify("  Acme -- Support!  "), "acme_support");
        assert_eq!(slugify("ACME"), "acme");
        assert_eq!(slugify("日本語"), "account");
    }

    #[test]
    fn test_snapshot_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 7).unwrap();
        assert_eq!(
            snapshot_file_name("Acme Support", at),
            "complete_account_export_acme_support_20240305_093007.json"
        );
    }

    #[test]
    fn test_write_snapshot_round_trips() {
        let snapshot = Snapshot::from_json(
            r#"{"account": {"original_id": 1, "name": "Acme Support"}}"#,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let summary = write_snapshot(&snapshot, dir.path()).unwrap();
        assert!(summary.path.exists());
        assert!(summary.bytes > 0);
        assert_eq!(summary.conversations, 0);

        let data = std::fs::read_to_string(&summary.path).unwrap();
        let parsed = Snapshot::from_json(&data).unwrap();
        assert_eq!(parsed.account.name, "Acme Support");
    }

    use crate::progress::NoopProgress;
    use deskport_common::types::{ContactId, InboxId};
    use deskport_storage::models::{
        CreateAccount, CreateAccountUser, CreateContact, CreateConversation, CreateInbox,
        CreateUser,
    };
    use deskport_storage::MemoryStore;
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    async fn seed_account(store: &mut MemoryStore) -> (AccountId, ContactId, InboxId) {
        let account = store
            .create_account(CreateAccount {
                name: "Acme Support".to_string(),
                domain: None,
                support_email: None,
                locale: Some("en".to_string()),
                timezone: None,
                custom_attributes: serde_json::json!({}),
                limits: serde_json::json!({}),
                feature_flags: serde_json::json!({}),
                auto_resolve_duration: None,
                status: "active".to_string(),
                created_at: Some(at(1, 8)),
            })
            .await
            .unwrap();
        let user = store
            .create_user(CreateUser {
                name: Some("Ada".to_string()),
                email: "ada@acme.test".to_string(),
                display_name: None,
                message_signature: None,
                ui_settings: serde_json::json!({}),
                custom_attributes: serde_json::json!({}),
                password_digest: "seed".to_string(),
                confirmed_at: None,
                created_at: Some(at(1, 8)),
            })
            .await
            .unwrap();
        store
            .create_membership(CreateAccountUser {
                account_id: account.id,
                user_id: user.id,
                role: "agent".to_string(),
                availability: "online".to_string(),
                auto_offline: true,
                created_at: Some(at(1, 8)),
            })
            .await
            .unwrap();
        let contact = store
            .create_contact(CreateContact {
                account_id: account.id,
                name: Some("Cora".to_string()),
                email: Some("cora@example.com".to_string()),
                phone_number: None,
                identifier: None,
                additional_attributes: serde_json::json!({}),
                custom_attributes: serde_json::json!({}),
                created_at: Some(at(1, 8)),
                updated_at: None,
            })
            .await
            .unwrap();
        let inbox = store
            .create_inbox(CreateInbox {
                account_id: account.id,
                name: "Support".to_string(),
                channel_type: "Channel::Api".to_string(),
                channel: serde_json::json!({"webhook_url": null}),
                settings: serde_json::json!({}),
                enable_auto_assignment: true,
                greeting_enabled: false,
                greeting_message: None,
                created_at: Some(at(1, 8)),
            })
            .await
            .unwrap();
        (account.id, contact.id, inbox.id)
    }

    async fn seed_conversation(
        store: &mut MemoryStore,
        account_id: AccountId,
        contact_id: ContactId,
        inbox_id: InboxId,
        status: &str,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let conversation = store
            .create_conversation(CreateConversation {
                account_id,
                display_id: 1,
                uuid: Uuid::new_v4(),
                contact_id,
                inbox_id,
                assignee_id: None,
                team_id: None,
                status: status.to_string(),
                priority: None,
                additional_attributes: serde_json::json!({}),
                custom_attributes: serde_json::json!({}),
                identifier: None,
                snoozed_until: None,
                agent_last_seen_at: None,
                contact_last_seen_at: None,
                first_reply_created_at: None,
                last_activity_at: None,
                waiting_since: None,
                created_at: Some(created_at),
                updated_at: None,
            })
            .await
            .unwrap();
        conversation.uuid
    }

    fn exported_uuids(snapshot: &Snapshot) -> Vec<Uuid> {
        snapshot.conversations.iter().filter_map(|c| c.uuid).collect()
    }

    #[tokio::test]
    async fn test_unknown_account_rejected() {
        let mut store = MemoryStore::new();
        let err = export_account(&mut store, 999, &ExportOptions::default(), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_account_needs_explicit_opt_in() {
        let mut store = MemoryStore::new();
        let (account_id, _, _) = seed_account(&mut store).await;

        let err = export_account(&mut store, account_id, &ExportOptions::default(), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyExport(_)));

        let options = ExportOptions {
            export_empty_account: true,
            ..Default::default()
        };
        let snapshot = export_account(&mut store, account_id, &options, &NoopProgress)
            .await
            .unwrap();
        assert!(snapshot.conversations.is_empty());
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.contacts.len(), 1);
        assert_eq!(snapshot.metadata.total_conversations, 0);
        assert_eq!(snapshot.metadata.total_users, 1);
    }

    #[tokio::test]
    async fn test_conversation_filters_apply() {
        let mut store = MemoryStore::new();
        let (account_id, contact_id, inbox_id) = seed_account(&mut store).await;
        let first =
            seed_conversation(&mut store, account_id, contact_id, inbox_id, "open", at(1, 9))
                .await;
        let second = seed_conversation(
            &mut store,
            account_id,
            contact_id,
            inbox_id,
            "resolved",
            at(2, 9),
        )
        .await;
        let third =
            seed_conversation(&mut store, account_id, contact_id, inbox_id, "open", at(3, 9))
                .await;

        let snapshot =
            export_account(&mut store, account_id, &ExportOptions::default(), &NoopProgress)
                .await
                .unwrap();
        assert_eq!(exported_uuids(&snapshot), vec![third, second, first]);

        let options = ExportOptions {
            status: vec![ConversationStatus::Resolved],
            ..Default::default()
        };
        let snapshot = export_account(&mut store, account_id, &options, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(exported_uuids(&snapshot), vec![second]);

        let options = ExportOptions {
            limit: Some(2),
            ..Default::default()
        };
        let snapshot = export_account(&mut store, account_id, &options, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(exported_uuids(&snapshot), vec![third, second]);

        let options = ExportOptions {
            from_date: Some(at(1, 9)),
            to_date: Some(at(2, 9)),
            ..Default::default()
        };
        let snapshot = export_account(&mut store, account_id, &options, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(exported_uuids(&snapshot), vec![second, first]);
    }

    #[tokio::test]
    async fn test_to_date_keeps_the_boundary_conversation() {
        let mut store = MemoryStore::new();
        let (account_id, contact_id, inbox_id) = seed_account(&mut store).await;
        let only =
            seed_conversation(&mut store, account_id, contact_id, inbox_id, "open", at(5, 9))
                .await;

        let options = ExportOptions {
            to_date: Some(at(5, 9)),
            ..Default::default()
        };
        let snapshot = export_account(&mut store, account_id, &options, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(exported_uuids(&snapshot), vec![only]);
    }
}
