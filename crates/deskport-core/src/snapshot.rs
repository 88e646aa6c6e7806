//! Snapshot document model
//!
//! The self-contained JSON document an export produces and an import
//! consumes. Records reference each other through source-side ids and
//! natural keys only, never target-side ids, so a snapshot can be
//! replayed into any deployment.
//!
//! Deserialization is tolerant: missing collections become empty and
//! missing scalars become None, so hand-trimmed documents still import.

use deskport_common::types::{
    AccountId, AttachmentId, ContactId, InboxId, MessageId, TeamId, Timestamp, UserId,
};
use deskport_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn empty_object() -> Value {
    serde_json::json!({})
}

fn empty_list() -> Value {
    serde_json::json!([])
}

fn default_true() -> bool {
    true
}

/// Complete account snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub account: AccountDoc,
    #[serde(default)]
    pub users: Vec<UserDoc>,
    #[serde(default)]
    pub contacts: Vec<ContactDoc>,
    #[serde(default)]
    pub inboxes: Vec<InboxDoc>,
    #[serde(default)]
    pub labels: Vec<LabelDoc>,
    #[serde(default)]
    pub teams: Vec<TeamDoc>,
    #[serde(default)]
    pub conversations: Vec<ConversationDoc>,
    #[serde(default)]
    pub canned_responses: Vec<CannedResponseDoc>,
    #[serde(default)]
    pub custom_filters: Vec<CustomFilterDoc>,
    #[serde(default)]
    pub webhooks: Vec<WebhookDoc>,
    #[serde(default)]
    pub automation_rules: Vec<AutomationRuleDoc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Snapshot {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Snapshot(format!("Failed to serialize snapshot: {}", e)))
    }

    /// Parse a snapshot document
    pub fn from_json(data: &str) -> Result<Snapshot> {
        serde_json::from_str(data)
            .map_err(|e| Error::Snapshot(format!("Invalid snapshot document: {}", e)))
    }
}

/// Account section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDoc {
    pub original_id: AccountId,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub support_email: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "empty_object")]
    pub custom_attributes: Value,
    #[serde(default = "empty_object")]
    pub limits: Value,
    #[serde(default = "empty_object")]
    pub feature_flags: Value,
    #[serde(default)]
    pub auto_resolve_duration: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// User section entry. Role and availability describe the membership in
/// the exported account, not the user globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    pub original_user_id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub message_signature: Option<String>,
    #[serde(default = "empty_object")]
    pub ui_settings: Value,
    #[serde(default = "empty_object")]
    pub custom_attributes: Value,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub auto_offline: Option<bool>,
    #[serde(default)]
    pub user_created_at: Option<Timestamp>,
    #[serde(default)]
    pub account_user_created_at: Option<Timestamp>,
}

/// Contact section entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDoc {
    pub original_id: ContactId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default = "empty_object")]
    pub additional_attributes: Value,
    #[serde(default = "empty_object")]
    pub custom_attributes: Value,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Inbox section entry. channel_type tags the payload in channel; see
/// [`Channel`] for the typed view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxDoc {
    pub original_id: InboxId,
    pub name: String,
    pub channel_type: String,
    #[serde(default = "empty_object")]
    pub channel: Value,
    #[serde(default = "empty_object")]
    pub settings: Value,
    #[serde(default)]
    pub enable_auto_assignment: Option<bool>,
    #[serde(default)]
    pub greeting_enabled: Option<bool>,
    #[serde(default)]
    pub greeting_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub agents: Vec<String>,
}

/// Label section entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelDoc {
    pub original_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub show_on_sidebar: Option<bool>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Team section entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDoc {
    pub original_id: TeamId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub allow_auto_assign: Option<bool>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Conversation section entry with nested messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDoc {
    pub original_id: i64,
    #[serde(default)]
    pub display_id: Option<i64>,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub original_contact_id: Option<ContactId>,
    #[serde(default)]
    pub original_inbox_id: Option<InboxId>,
    #[serde(default)]
    pub original_assignee_id: Option<UserId>,
    #[serde(default)]
    pub original_team_id: Option<TeamId>,
    #[serde(default = "empty_object")]
    pub additional_attributes: Value,
    #[serde(default = "empty_object")]
    pub custom_attributes: Value,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub snoozed_until: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub last_activity_at: Option<Timestamp>,
    #[serde(default)]
    pub agent_last_seen_at: Option<Timestamp>,
    #[serde(default)]
    pub contact_last_seen_at: Option<Timestamp>,
    #[serde(default)]
    pub first_reply_created_at: Option<Timestamp>,
    #[serde(default)]
    pub waiting_since: Option<Timestamp>,
    #[serde(default)]
    pub label_names: Vec<String>,
    #[serde(default)]
    pub messages: Vec<MessageDoc>,
}

/// Message entry nested under a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDoc {
    #[serde(default)]
    pub original_id: Option<MessageId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default = "empty_object")]
    pub content_attributes: Value,
    #[serde(default)]
    pub sender_type: Option<String>,
    #[serde(default)]
    pub sender_original_id: Option<i64>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDoc>,
}

/// Attachment metadata nested under a message. Only metadata travels in
/// the snapshot; download_needed marks the binary for an out-of-band
/// fetch after import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentDoc {
    #[serde(default)]
    pub original_id: Option<AttachmentId>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default = "default_true")]
    pub download_needed: bool,
}

/// Canned response section entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedResponseDoc {
    pub original_id: i64,
    pub short_code: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Custom filter section entry, owned by the user with user_email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFilterDoc {
    pub original_id: i64,
    pub name: String,
    #[serde(default)]
    pub filter_type: Option<String>,
    #[serde(default = "empty_object")]
    pub query: Value,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Webhook section entry. inbox_id is the source-side inbox id and goes
/// through the inbox remap on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDoc {
    pub original_id: i64,
    #[serde(default)]
    pub inbox_id: Option<InboxId>,
    pub url: String,
    #[serde(default = "empty_list")]
    pub subscriptions: Value,
    #[serde(default)]
    pub webhook_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Automation rule section entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRuleDoc {
    pub original_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default = "empty_list")]
    pub conditions: Value,
    #[serde(default = "empty_list")]
    pub actions: Value,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Snapshot provenance block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub exported_at: Option<Timestamp>,
    #[serde(default)]
    pub source_host: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub total_users: usize,
    #[serde(default)]
    pub total_conversations: usize,
    #[serde(default)]
    pub total_contacts: usize,
    #[serde(default)]
    pub total_inboxes: usize,
    #[serde(default)]
    pub version: Option<String>,
}

const CHANNEL_EMAIL: &str = "Channel::Email";
const CHANNEL_WEB_WIDGET: &str = "Channel::WebWidget";
const CHANNEL_API: &str = "Channel::Api";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmailChannelWire {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    forward_to_email: Option<String>,
    #[serde(default)]
    imap_enabled: Option<bool>,
    #[serde(default)]
    smtp_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WebWidgetChannelWire {
    #[serde(default)]
    website_name: Option<String>,
    #[serde(default)]
    website_url: Option<String>,
    #[serde(default)]
    widget_color: Option<String>,
    #[serde(default)]
    welcome_title: Option<String>,
    #[serde(default)]
    welcome_tagline: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ApiChannelWire {
    #[serde(default)]
    webhook_url: Option<String>,
}

/// Typed view of an inbox channel.
///
/// Every known channel_type gets a variant; unknown tags are preserved
/// through Other so re-exported snapshots keep them intact.
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    Email {
        email: Option<String>,
        forward_to_email: Option<String>,
        imap_enabled: Option<bool>,
        smtp_enabled: Option<bool>,
    },
    WebWidget {
        website_name: Option<String>,
        website_url: Option<String>,
        widget_color: Option<String>,
        welcome_title: Option<String>,
        welcome_tagline: Option<String>,
    },
    Api {
        webhook_url: Option<String>,
    },
    Other {
        channel_type: String,
    },
}

impl Channel {
    /// Build the typed channel from a tag and payload object.
    /// Malformed payloads degrade to an empty variant of the tagged kind.
    pub fn from_wire(channel_type: &str, payload: &Value) -> Channel {
        match channel_type {
            CHANNEL_EMAIL => {
                let wire: EmailChannelWire =
                    serde_json::from_value(payload.clone()).unwrap_or_default();
                Channel::Email {
                    email: wire.email,
                    forward_to_email: wire.forward_to_email,
                    imap_enabled: wire.imap_enabled,
                    smtp_enabled: wire.smtp_enabled,
                }
            }
            CHANNEL_WEB_WIDGET => {
                let wire: WebWidgetChannelWire =
                    serde_json::from_value(payload.clone()).unwrap_or_default();
                Channel::WebWidget {
                    website_name: wire.website_name,
                    website_url: wire.website_url,
                    widget_color: wire.widget_color,
                    welcome_title: wire.welcome_title,
                    welcome_tagline: wire.welcome_tagline,
                }
            }
            CHANNEL_API => {
                let wire: ApiChannelWire =
                    serde_json::from_value(payload.clone()).unwrap_or_default();
                Channel::Api {
                    webhook_url: wire.webhook_url,
                }
            }
            other => Channel::Other {
                channel_type: other.to_string(),
            },
        }
    }

    /// The wire tag for this channel
    pub fn channel_type(&self) -> &str {
        match self {
            Channel::Email { .. } => CHANNEL_EMAIL,
            Channel::WebWidget { .. } => CHANNEL_WEB_WIDGET,
            Channel::Api { .. } => CHANNEL_API,
            Channel::Other { channel_type } => channel_type,
        }
    }

    /// The payload object for this channel
    pub fn to_wire(&self) -> Value {
        match self {
            Channel::Email {
                email,
                forward_to_email,
                imap_enabled,
                smtp_enabled,
            } => serde_json::json!({
                "email": email,
                "forward_to_email": forward_to_email,
                "imap_enabled": imap_enabled,
                "smtp_enabled": smtp_enabled,
            }),
            Channel::WebWidget {
                website_name,
                website_url,
                widget_color,
                welcome_title,
                welcome_tagline,
            } => serde_json::json!({
                "website_name": website_name,
                "website_url": website_url,
                "widget_color": widget_color,
                "welcome_title": welcome_title,
                "welcome_tagline": welcome_tagline,
            }),
            Channel::Api { webhook_url } => serde_json::json!({
                "webhook_url": webhook_url,
            }),
            Channel::Other { .. } => serde_json::json!({}),
        }
    }
}

/// Typed view of a message sender reference
#[derive(Debug, Clone, PartialEq)]
pub enum SenderRef {
    /// Agent sender, resolved by email on import
    User { email: Option<String> },
    /// Contact sender, attached to the conversation's contact on import
    Contact {
        original_id: Option<i64>,
        email: Option<String>,
    },
    /// System message, no sender row
    None,
}

impl SenderRef {
    pub fn from_message(doc: &MessageDoc) -> SenderRef {
        match doc.sender_type.as_deref() {
            Some("User") => SenderRef::User {
                email: doc.sender_email.clone(),
            },
            Some("Contact") => SenderRef::Contact {
                original_id: doc.sender_original_id,
                email: doc.sender_email.clone(),
            },
            Some(_) | None => SenderRef::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_channel_round_trip() {
        let payload = serde_json::json!({
            "email": "help@acme.test",
            "forward_to_email": null,
            "imap_enabled": true,
            "smtp_enabled": false,
        });
        let channel = Channel::from_wire("Channel::Email", &payload);
        assert_eq!(channel.channel_type(), "Channel::Email");
        assert_eq!(channel.to_wire(), payload);
    }

    #[test]
    fn test_unknown_channel_keeps_tag() {
        let channel = Channel::from_wire("Channel::Telegram", &serde_json::json!({"bot": "x"}));
        assert_eq!(channel.channel_type(), "Channel::Telegram");
        assert_eq!(channel.to_wire(), serde_json::json!({}));
    }

    #[test]
    fn test_malformed_channel_payload_degrades() {
        let channel = Channel::from_wire("Channel::Api", &serde_json::json!("not an object"));
        assert_eq!(
            channel,
            Channel::Api { webhook_url: None }
        );
    }

    #[test]
    fn test_sender_ref_dispatch() {
        let mut doc = MessageDoc {
            original_id: None,
            content: Some("hi".to_string()),
            message_type: None,
            private: None,
            status: None,
            source_id: None,
            content_type: None,
            content_attributes: serde_json::json!({}),
            sender_type: Some("User".to_string()),
            sender_original_id: Some(9),
            sender_email: Some("agent@acme.test".to_string()),
            sender_name: None,
            created_at: None,
            updated_at: None,
            attachments: vec![],
        };
        assert_eq!(
            SenderRef::from_message(&doc),
            SenderRef::User {
                email: Some("agent@acme.test".to_string())
            }
        );

        doc.sender_type = Some("Contact".to_string());
        assert_eq!(
            SenderRef::from_message(&doc),
            SenderRef::Contact {
                original_id: Some(9),
                email: Some("agent@acme.test".to_string())
            }
        );

        doc.sender_type = Some("AgentBot".to_string());
        assert_eq!(SenderRef::from_message(&doc), SenderRef::None);

        doc.sender_type = None;
        assert_eq!(SenderRef::from_message(&doc), SenderRef::None);
    }

    #[test]
    fn test_minimal_document_fills_defaults() {
        let snapshot = Snapshot::from_json(
            r#"{"account": {"original_id": 1, "name": "Acme Support"}}"#,
        )
        .unwrap();

        assert_eq!(snapshot.account.name, "Acme Support");
        assert_eq!(snapshot.account.custom_attributes, serde_json::json!({}));
        assert!(snapshot.users.is_empty());
        assert!(snapshot.conversations.is_empty());
        assert_eq!(snapshot.metadata.total_users, 0);
    }

    #[test]
    fn test_invalid_document_rejected() {
        let err = Snapshot::from_json("{\"users\": []}").unwrap_err();
        assert!(err.to_string().contains("Invalid snapshot document"));
    }
}
