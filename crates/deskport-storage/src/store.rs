//! Account store trait
//!
//! One trait covers every read and write the export and import paths
//! need. Methods take &mut self so an implementation can run all writes
//! on a single transactional connection.

use crate::models::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskport_common::types::{
    AccountId, ContactId, ConversationId, ConversationStatus, InboxId, MessageId, TeamId, UserId,
};
use deskport_common::Result;
use uuid::Uuid;

/// Filter applied when selecting conversations for export.
///
/// An empty status list matches every status. Date bounds are inclusive
/// at both ends.
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    pub limit: Option<i64>,
    pub status: Vec<ConversationStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

/// Account store trait
#[async_trait]
pub trait AccountStore: Send {
    // Transaction control. All writes between begin and commit land
    // atomically; rollback discards them.
    async fn begin(&mut self) -> Result<()>;
    async fn commit(&mut self) -> Result<()>;
    async fn rollback(&mut self) -> Result<()>;

    // Accounts
    async fn account_by_id(&mut self, id: AccountId) -> Result<Option<Account>>;
    async fn account_by_name(&mut self, name: &str) -> Result<Option<Account>>;
    async fn create_account(&mut self, input: CreateAccount) -> Result<Account>;

    // Users are global, keyed by email across accounts.
    async fn user_by_id(&mut self, id: UserId) -> Result<Option<User>>;
    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>>;
    async fn create_user(&mut self, input: CreateUser) -> Result<User>;

    // Account memberships
    async fn membership(
        &mut self,
        account_id: AccountId,
        user_id: UserId,
    ) -> Result<Option<AccountUser>>;
    async fn create_membership(&mut self, input: CreateAccountUser) -> Result<AccountUser>;
    async fn memberships_for_account(&mut self, account_id: AccountId)
        -> Result<Vec<AccountUser>>;

    // Contacts
    async fn contact_by_id(&mut self, id: ContactId) -> Result<Option<Contact>>;
    async fn contact_by_email(
        &mut self,
        account_id: AccountId,
        email: &str,
    ) -> Result<Option<Contact>>;
    async fn contact_by_identifier(
        &mut self,
        account_id: AccountId,
        identifier: &str,
    ) -> Result<Option<Contact>>;
    async fn create_contact(&mut self, input: CreateContact) -> Result<Contact>;
    async fn contacts_for_account(&mut self, account_id: AccountId) -> Result<Vec<Contact>>;

    // Inboxes
    async fn inbox_by_name(&mut self, account_id: AccountId, name: &str)
        -> Result<Option<Inbox>>;
    async fn create_inbox(&mut self, input: CreateInbox) -> Result<Inbox>;
    async fn inboxes_for_account(&mut self, account_id: AccountId) -> Result<Vec<Inbox>>;
    async fn inbox_member_emails(&mut self, inbox_id: InboxId) -> Result<Vec<String>>;
    async fn add_inbox_member(&mut self, inbox_id: InboxId, user_id: UserId) -> Result<()>;

    // Labels
    async fn label_by_title(
        &mut self,
        account_id: AccountId,
        title: &str,
    ) -> Result<Option<Label>>;
    async fn create_label(&mut self, input: CreateLabel) -> Result<Label>;
    async fn labels_for_account(&mut self, account_id: AccountId) -> Result<Vec<Label>>;

    // Teams
    async fn team_by_name(&mut self, account_id: AccountId, name: &str) -> Result<Option<Team>>;
    async fn create_team(&mut self, input: CreateTeam) -> Result<Team>;
    async fn teams_for_account(&mut self, account_id: AccountId) -> Result<Vec<Team>>;
    async fn team_member_emails(&mut self, team_id: TeamId) -> Result<Vec<String>>;
    async fn add_team_member(&mut self, team_id: TeamId, user_id: UserId) -> Result<()>;

    // Conversations
    async fn conversation_by_uuid(
        &mut self,
        account_id: AccountId,
        uuid: Uuid,
    ) -> Result<Option<Conversation>>;
    async fn create_conversation(&mut self, input: CreateConversation) -> Result<Conversation>;
    async fn conversations_for_account(
        &mut self,
        account_id: AccountId,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>>;
    async fn conversation_label_titles(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<String>>;
    async fn add_conversation_label(
        &mut self,
        conversation_id: ConversationId,
        title: &str,
    ) -> Result<()>;

    // Messages and attachments
    async fn create_message(&mut self, input: CreateMessage) -> Result<Message>;
    async fn messages_for_conversation(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>>;
    async fn create_attachment(&mut self, input: CreateAttachment) -> Result<Attachment>;
    async fn attachments_for_message(&mut self, message_id: MessageId)
        -> Result<Vec<Attachment>>;

    // Canned responses
    async fn canned_response_by_short_code(
        &mut self,
        account_id: AccountId,
        short_code: &str,
    ) -> Result<Option<CannedResponse>>;
    async fn create_canned_response(
        &mut self,
        input: CreateCannedResponse,
    ) -> Result<CannedResponse>;
    async fn canned_responses_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<CannedResponse>>;

    // Custom filters
    async fn custom_filter_by_name(
        &mut self,
        account_id: AccountId,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<CustomFilter>>;
    async fn create_custom_filter(&mut self, input: CreateCustomFilter) -> Result<CustomFilter>;
    async fn custom_filters_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<CustomFilter>>;

    // Webhooks
    async fn webhook_by_url(
        &mut self,
        account_id: AccountId,
        inbox_id: InboxId,
        url: &str,
    ) -> Result<Option<Webhook>>;
    async fn create_webhook(&mut self, input: CreateWebhook) -> Result<Webhook>;
    async fn webhooks_for_account(&mut self, account_id: AccountId) -> Result<Vec<Webhook>>;

    // Automation rules
    async fn automation_rule_by_name(
        &mut self,
        account_id: AccountId,
        name: &str,
    ) -> Result<Option<AutomationRule>>;
    async fn create_automation_rule(
        &mut self,
        input: CreateAutomationRule,
    ) -> Result<AutomationRule>;
    async fn automation_rules_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<AutomationRule>>;
}
