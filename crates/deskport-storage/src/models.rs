//! Datastore records
//!
//! Row models for every entity owned by an account, plus the Create*
//! input structs the store consumes. Status-like columns are stored as
//! strings with typed accessors.

use chrono::{DateTime, Utc};
use deskport_common::types::{
    AccountId, AccountUserId, AgentRole, AttachmentId, AutomationRuleId, Availability,
    CannedResponseId, ContactId, ConversationId, ConversationPriority, ConversationStatus,
    CustomFilterId, InboxId, LabelId, MessageId, MessageType, TeamId, UserId, WebhookId,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account (tenant) model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub domain: Option<String>,
    pub support_email: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub custom_attributes: serde_json::Value,
    pub limits: serde_json::Value,
    pub feature_flags: serde_json::Value,
    pub auto_resolve_duration: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Create account input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    pub domain: Option<String>,
    pub support_email: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub custom_attributes: serde_json::Value,
    pub limits: serde_json::Value,
    pub feature_flags: serde_json::Value,
    pub auto_resolve_duration: Option<i32>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// User model
///
/// Users are global: one row serves every account the user belongs to.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub display_name: Option<String>,
    pub message_signature: Option<String>,
    pub ui_settings: serde_json::Value,
    pub custom_attributes: serde_json::Value,
    pub password_digest: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Create user input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: String,
    pub display_name: Option<String>,
    pub message_signature: Option<String>,
    pub ui_settings: serde_json::Value,
    pub custom_attributes: serde_json::Value,
    pub password_digest: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Account membership model (many-to-many Account to User)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AccountUser {
    pub id: AccountUserId,
    pub account_id: AccountId,
    pub user_id: UserId,
    pub role: String,
    pub availability: String,
    pub auto_offline: bool,
    pub created_at: DateTime<Utc>,
}

impl AccountUser {
    /// Get role enum
    pub fn role_enum(&self) -> Option<AgentRole> {
        self.role.parse().ok()
    }

    /// Get availability enum
    pub fn availability_enum(&self) -> Option<Availability> {
        self.availability.parse().ok()
    }
}

/// Create account membership input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountUser {
    pub account_id: AccountId,
    pub user_id: UserId,
    pub role: String,
    pub availability: String,
    pub auto_offline: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Contact model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub account_id: AccountId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub identifier: Option<String>,
    pub additional_attributes: serde_json::Value,
    pub custom_attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create contact input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContact {
    pub account_id: AccountId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub identifier: Option<String>,
    pub additional_attributes: serde_json::Value,
    pub custom_attributes: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Inbox model
///
/// The channel column holds the variant-specific configuration payload
/// for the channel_type tag; the store treats it opaquely.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Inbox {
    pub id: InboxId,
    pub account_id: AccountId,
    pub name: String,
    pub channel_type: String,
    pub channel: serde_json::Value,
    pub settings: serde_json::Value,
    pub enable_auto_assignment: bool,
    pub greeting_enabled: bool,
    pub greeting_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create inbox input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInbox {
    pub account_id: AccountId,
    pub name: String,
    pub channel_type: String,
    pub channel: serde_json::Value,
    pub settings: serde_json::Value,
    pub enable_auto_assignment: bool,
    pub greeting_enabled: bool,
    pub greeting_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Label model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub account_id: AccountId,
    pub title: String,
    pub description: Option<String>,
    pub color: String,
    pub show_on_sidebar: bool,
    pub created_at: DateTime<Utc>,
}

/// Create label input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLabel {
    pub account_id: AccountId,
    pub title: String,
    pub description: Option<String>,
    pub color: String,
    pub show_on_sidebar: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Team model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub account_id: AccountId,
    pub name: String,
    pub description: Option<String>,
    pub allow_auto_assign: bool,
    pub created_at: DateTime<Utc>,
}

/// Create team input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    pub account_id: AccountId,
    pub name: String,
    pub description: Option<String>,
    pub allow_auto_assign: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Conversation model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub account_id: AccountId,
    pub display_id: i64,
    pub uuid: Uuid,
    pub contact_id: ContactId,
    pub inbox_id: InboxId,
    pub assignee_id: Option<UserId>,
    pub team_id: Option<TeamId>,
    pub status: String,
    pub priority: Option<String>,
    pub additional_attributes: serde_json::Value,
    pub custom_attributes: serde_json::Value,
    pub identifier: Option<String>,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub agent_last_seen_at: Option<DateTime<Utc>>,
    pub contact_last_seen_at: Option<DateTime<Utc>>,
    pub first_reply_created_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub waiting_since: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Get status enum
    pub fn status_enum(&self) -> Option<ConversationStatus> {
        self.status.parse().ok()
    }

    /// Get priority enum
    pub fn priority_enum(&self) -> Option<ConversationPriority> {
        self.priority.as_deref().and_then(|p| p.parse().ok())
    }
}

/// Create conversation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversation {
    pub account_id: AccountId,
    pub display_id: i64,
    pub uuid: Uuid,
    pub contact_id: ContactId,
    pub inbox_id: InboxId,
    pub assignee_id: Option<UserId>,
    pub team_id: Option<TeamId>,
    pub status: String,
    pub priority: Option<String>,
    pub additional_attributes: serde_json::Value,
    pub custom_attributes: serde_json::Value,
    pub identifier: Option<String>,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub agent_last_seen_at: Option<DateTime<Utc>>,
    pub contact_last_seen_at: Option<DateTime<Utc>>,
    pub first_reply_created_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub waiting_since: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Message model
///
/// sender_type/sender_id form a polymorphic reference: "User" points at a
/// user row, "Contact" at a contact row, both unset means no sender.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub account_id: AccountId,
    pub conversation_id: ConversationId,
    pub content: Option<String>,
    pub message_type: String,
    pub private: bool,
    pub status: Option<String>,
    pub source_id: Option<String>,
    pub content_type: String,
    pub content_attributes: serde_json::Value,
    pub sender_type: Option<String>,
    pub sender_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Get message type enum
    pub fn message_type_enum(&self) -> Option<MessageType> {
        self.message_type.parse().ok()
    }
}

/// Create message input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub account_id: AccountId,
    pub conversation_id: ConversationId,
    pub content: Option<String>,
    pub message_type: String,
    pub private: bool,
    pub status: Option<String>,
    pub source_id: Option<String>,
    pub content_type: String,
    pub content_attributes: serde_json::Value,
    pub sender_type: Option<String>,
    pub sender_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Attachment metadata model
///
/// Binary payloads are never stored here; rows flagged pending_download
/// are fetched out of band after a migration.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub account_id: AccountId,
    pub message_id: MessageId,
    pub file_type: String,
    pub file_size: Option<i64>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub pending_download: bool,
    pub created_at: DateTime<Utc>,
}

/// Create attachment input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachment {
    pub account_id: AccountId,
    pub message_id: MessageId,
    pub file_type: String,
    pub file_size: Option<i64>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub pending_download: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Canned response model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CannedResponse {
    pub id: CannedResponseId,
    pub account_id: AccountId,
    pub short_code: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Create canned response input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCannedResponse {
    pub account_id: AccountId,
    pub short_code: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Custom filter model (saved search owned by a user within an account)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomFilter {
    pub id: CustomFilterId,
    pub account_id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub filter_type: String,
    pub query: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Create custom filter input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomFilter {
    pub account_id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub filter_type: String,
    pub query: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

/// Webhook model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Webhook {
    pub id: WebhookId,
    pub account_id: AccountId,
    pub inbox_id: InboxId,
    pub url: String,
    pub subscriptions: serde_json::Value,
    pub webhook_type: String,
    pub created_at: DateTime<Utc>,
}

/// Create webhook input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWebhook {
    pub account_id: AccountId,
    pub inbox_id: InboxId,
    pub url: String,
    pub subscriptions: serde_json::Value,
    pub webhook_type: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Automation rule model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: AutomationRuleId,
    pub account_id: AccountId,
    pub name: String,
    pub description: Option<String>,
    pub event_name: String,
    pub conditions: serde_json::Value,
    pub actions: serde_json::Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Create automation rule input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAutomationRule {
    pub account_id: AccountId,
    pub name: String,
    pub description: Option<String>,
    pub event_name: String,
    pub conditions: serde_json::Value,
    pub actions: serde_json::Value,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_conversation() -> Conversation {
        Conversation {
            id: 1,
            account_id: 1,
            display_id: 42,
            uuid: Uuid::new_v4(),
            contact_id: 7,
            inbox_id: 3,
            assignee_id: None,
            team_id: None,
            status: "open".to_string(),
            priority: Some("urgent".to_string()),
            additional_attributes: serde_json::json!({}),
            custom_attributes: serde_json::json!({}),
            identifier: None,
            snoozed_until: None,
            agent_last_seen_at: None,
            contact_last_seen_at: None,
            first_reply_created_at: None,
            last_activity_at: None,
            waiting_since: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_conversation_status_accessor() {
        let mut conversation = sample_conversation();
        assert_eq!(
            conversation.status_enum(),
            Some(ConversationStatus::Open)
        );
        assert_eq!(
            conversation.priority_enum(),
            Some(ConversationPriority::Urgent)
        );

        conversation.status = "archived".to_string();
        conversation.priority = None;
        assert_eq!(conversation.status_enum(), None);
        assert_eq!(conversation.priority_enum(), None);
    }

    #[test]
    fn test_membership_role_accessor() {
        let membership = AccountUser {
            id: 1,
            account_id: 1,
            user_id: 2,
            role: "administrator".to_string(),
            availability: "busy".to_string(),
            auto_offline: true,
            created_at: Utc::now(),
        };
        assert_eq!(membership.role_enum(), Some(AgentRole::Administrator));
        assert_eq!(membership.availability_enum(), Some(Availability::Busy));
    }
}
