//! In-memory store
//!
//! Backs the test suite and dry runs without a database. Transactions
//! clone the whole state on begin and restore it on rollback. Id
//! counters survive rollback, matching sequence behavior in Postgres.

use crate::models::*;
use crate::store::{AccountStore, ConversationFilter};
use async_trait::async_trait;
use chrono::Utc;
use deskport_common::types::{
    AccountId, ContactId, ConversationId, InboxId, MessageId, TeamId, UserId,
};
use deskport_common::{Error, Result};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct State {
    accounts: Vec<Account>,
    users: Vec<User>,
    memberships: Vec<AccountUser>,
    contacts: Vec<Contact>,
    inboxes: Vec<Inbox>,
    inbox_members: Vec<(InboxId, UserId)>,
    labels: Vec<Label>,
    teams: Vec<Team>,
    team_members: Vec<(TeamId, UserId)>,
    conversations: Vec<Conversation>,
    conversation_labels: Vec<(ConversationId, String)>,
    messages: Vec<Message>,
    attachments: Vec<Attachment>,
    canned_responses: Vec<CannedResponse>,
    custom_filters: Vec<CustomFilter>,
    webhooks: Vec<Webhook>,
    automation_rules: Vec<AutomationRule>,
}

/// In-memory account store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: State,
    saved: Option<State>,
    next_id: i64,
    fail_after_creates: Option<usize>,
    creates: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every create once `n` creates have succeeded, as a dropped
    /// connection would. Used to test that a failed import leaves no
    /// partial data behind.
    pub fn fail_after_creates(&mut self, n: usize) {
        self.fail_after_creates = Some(n);
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_write(&mut self) -> Result<()> {
        if let Some(limit) = self.fail_after_creates {
            if self.creates >= limit {
                return Err(Error::Connection("Injected write failure".to_string()));
            }
        }
        self.creates += 1;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn begin(&mut self) -> Result<()> {
        self.saved = Some(self.state.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.saved = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if let Some(saved) = self.saved.take() {
            self.state = saved;
        }
        Ok(())
    }

    async fn account_by_id(&mut self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.state.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn account_by_name(&mut self, name: &str) -> Result<Option<Account>> {
        Ok(self.state.accounts.iter().find(|a| a.name == name).cloned())
    }

    async fn create_account(&mut self, input: CreateAccount) -> Result<Account> {
        self.check_write()?;
        let account = Account {
            id: self.next_id(),
            name: input.name,
            domain: input.domain,
            support_email: input.support_email,
            locale: input.locale,
            timezone: input.timezone,
            custom_attributes: input.custom_attributes,
            limits: input.limits,
            feature_flags: input.feature_flags,
            auto_resolve_duration: input.auto_resolve_duration,
            status: input.status,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.accounts.push(account.clone());
        Ok(account)
    }

    async fn user_by_id(&mut self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        Ok(self.state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&mut self, input: CreateUser) -> Result<User> {
        self.check_write()?;
        if self.state.users.iter().any(|u| u.email == input.email) {
            return Err(Error::Datastore(format!(
                "duplicate key value: users.email = {}",
                input.email
            )));
        }
        let user = User {
            id: self.next_id(),
            name: input.name,
            email: input.email,
            display_name: input.display_name,
            message_signature: input.message_signature,
            ui_settings: input.ui_settings,
            custom_attributes: input.custom_attributes,
            password_digest: input.password_digest,
            confirmed_at: input.confirmed_at,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.users.push(user.clone());
        Ok(user)
    }

    async fn membership(
        &mut self,
        account_id: AccountId,
        user_id: UserId,
    ) -> Result<Option<AccountUser>> {
        Ok(self
            .state
            .memberships
            .iter()
            .find(|m| m.account_id == account_id && m.user_id == user_id)
            .cloned())
    }

    async fn create_membership(&mut self, input: CreateAccountUser) -> Result<AccountUser> {
        self.check_write()?;
        let membership = AccountUser {
            id: self.next_id(),
            account_id: input.account_id,
            user_id: input.user_id,
            role: input.role,
            availability: input.availability,
            auto_offline: input.auto_offline,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn memberships_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<AccountUser>> {
        Ok(self
            .state
            .memberships
            .iter()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn contact_by_id(&mut self, id: ContactId) -> Result<Option<Contact>> {
        Ok(self.state.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn contact_by_email(
        &mut self,
        account_id: AccountId,
        email: &str,
    ) -> Result<Option<Contact>> {
        Ok(self
            .state
            .contacts
            .iter()
            .find(|c| c.account_id == account_id && c.email.as_deref() == Some(email))
            .cloned())
    }

    async fn contact_by_identifier(
        &mut self,
        account_id: AccountId,
        identifier: &str,
    ) -> Result<Option<Contact>> {
        Ok(self
            .state
            .contacts
            .iter()
            .find(|c| c.account_id == account_id && c.identifier.as_deref() == Some(identifier))
            .cloned())
    }

    async fn create_contact(&mut self, input: CreateContact) -> Result<Contact> {
        self.check_write()?;
        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let contact = Contact {
            id: self.next_id(),
            account_id: input.account_id,
            name: input.name,
            email: input.email,
            phone_number: input.phone_number,
            identifier: input.identifier,
            additional_attributes: input.additional_attributes,
            custom_attributes: input.custom_attributes,
            created_at,
            updated_at: input.updated_at.unwrap_or(created_at),
        };
        self.state.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn contacts_for_account(&mut self, account_id: AccountId) -> Result<Vec<Contact>> {
        Ok(self
            .state
            .contacts
            .iter()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn inbox_by_name(
        &mut self,
        account_id: AccountId,
        name: &str,
    ) -> Result<Option<Inbox>> {
        Ok(self
            .state
            .inboxes
            .iter()
            .find(|i| i.account_id == account_id && i.name == name)
            .cloned())
    }

    async fn create_inbox(&mut self, input: CreateInbox) -> Result<Inbox> {
        self.check_write()?;
        let inbox = Inbox {
            id: self.next_id(),
            account_id: input.account_id,
            name: input.name,
            channel_type: input.channel_type,
            channel: input.channel,
            settings: input.settings,
            enable_auto_assignment: input.enable_auto_assignment,
            greeting_enabled: input.greeting_enabled,
            greeting_message: input.greeting_message,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.inboxes.push(inbox.clone());
        Ok(inbox)
    }

    async fn inboxes_for_account(&mut self, account_id: AccountId) -> Result<Vec<Inbox>> {
        Ok(self
            .state
            .inboxes
            .iter()
            .filter(|i| i.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn inbox_member_emails(&mut self, inbox_id: InboxId) -> Result<Vec<String>> {
        let mut emails: Vec<String> = self
            .state
            .inbox_members
            .iter()
            .filter(|(i, _)| *i == inbox_id)
            .filter_map(|(_, u)| {
                self.state
                    .users
                    .iter()
                    .find(|user| user.id == *u)
                    .map(|user| user.email.clone())
            })
            .collect();
        emails.sort();
        Ok(emails)
    }

    async fn add_inbox_member(&mut self, inbox_id: InboxId, user_id: UserId) -> Result<()> {
        if !self.state.inbox_members.contains(&(inbox_id, user_id)) {
            self.state.inbox_members.push((inbox_id, user_id));
        }
        Ok(())
    }

    async fn label_by_title(
        &mut self,
        account_id: AccountId,
        title: &str,
    ) -> Result<Option<Label>> {
        Ok(self
            .state
            .labels
            .iter()
            .find(|l| l.account_id == account_id && l.title == title)
            .cloned())
    }

    async fn create_label(&mut self, input: CreateLabel) -> Result<Label> {
        self.check_write()?;
        let label = Label {
            id: self.next_id(),
            account_id: input.account_id,
            title: input.title,
            description: input.description,
            color: input.color,
            show_on_sidebar: input.show_on_sidebar,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.labels.push(label.clone());
        Ok(label)
    }

    async fn labels_for_account(&mut self, account_id: AccountId) -> Result<Vec<Label>> {
        Ok(self
            .state
            .labels
            .iter()
            .filter(|l| l.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn team_by_name(&mut self, account_id: AccountId, name: &str) -> Result<Option<Team>> {
        Ok(self
            .state
            .teams
            .iter()
            .find(|t| t.account_id == account_id && t.name == name)
            .cloned())
    }

    async fn create_team(&mut self, input: CreateTeam) -> Result<Team> {
        self.check_write()?;
        let team = Team {
            id: self.next_id(),
            account_id: input.account_id,
            name: input.name,
            description: input.description,
            allow_auto_assign: input.allow_auto_assign,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.teams.push(team.clone());
        Ok(team)
    }

    async fn teams_for_account(&mut self, account_id: AccountId) -> Result<Vec<Team>> {
        Ok(self
            .state
            .teams
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn team_member_emails(&mut self, team_id: TeamId) -> Result<Vec<String>> {
        let mut emails: Vec<String> = self
            .state
            .team_members
            .iter()
            .filter(|(t, _)| *t == team_id)
            .filter_map(|(_, u)| {
                self.state
                    .users
                    .iter()
                    .find(|user| user.id == *u)
                    .map(|user| user.email.clone())
            })
            .collect();
        emails.sort();
        Ok(emails)
    }

    async fn add_team_member(&mut self, team_id: TeamId, user_id: UserId) -> Result<()> {
        if !self.state.team_members.contains(&(team_id, user_id)) {
            self.state.team_members.push((team_id, user_id));
        }
        Ok(())
    }

    async fn conversation_by_uuid(
        &mut self,
        account_id: AccountId,
        uuid: Uuid,
    ) -> Result<Option<Conversation>> {
        Ok(self
            .state
            .conversations
            .iter()
            .find(|c| c.account_id == account_id && c.uuid == uuid)
            .cloned())
    }

    async fn create_conversation(&mut self, input: CreateConversation) -> Result<Conversation> {
        self.check_write()?;
        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let conversation = Conversation {
            id: self.next_id(),
            account_id: input.account_id,
            display_id: input.display_id,
            uuid: input.uuid,
            contact_id: input.contact_id,
            inbox_id: input.inbox_id,
            assignee_id: input.assignee_id,
            team_id: input.team_id,
            status: input.status,
            priority: input.priority,
            additional_attributes: input.additional_attributes,
            custom_attributes: input.custom_attributes,
            identifier: input.identifier,
            snoozed_until: input.snoozed_until,
            agent_last_seen_at: input.agent_last_seen_at,
            contact_last_seen_at: input.contact_last_seen_at,
            first_reply_created_at: input.first_reply_created_at,
            last_activity_at: input.last_activity_at,
            waiting_since: input.waiting_since,
            created_at,
            updated_at: input.updated_at.unwrap_or(created_at),
        };
        self.state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn conversations_for_account(
        &mut self,
        account_id: AccountId,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>> {
        let statuses: Vec<String> = filter.status.iter().map(|s| s.to_string()).collect();

        let mut matched: Vec<Conversation> = self
            .state
            .conversations
            .iter()
            .filter(|c| c.account_id == account_id)
            .filter(|c| statuses.is_empty() || statuses.contains(&c.status))
            .filter(|c| filter.from_date.map_or(true, |from| c.created_at >= from))
            .filter(|c| filter.to_date.map_or(true, |to| c.created_at <= to))
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn conversation_label_titles(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<String>> {
        let mut titles: Vec<String> = self
            .state
            .conversation_labels
            .iter()
            .filter(|(c, _)| *c == conversation_id)
            .map(|(_, title)| title.clone())
            .collect();
        titles.sort();
        Ok(titles)
    }

    async fn add_conversation_label(
        &mut self,
        conversation_id: ConversationId,
        title: &str,
    ) -> Result<()> {
        let entry = (conversation_id, title.to_string());
        if !self.state.conversation_labels.contains(&entry) {
            self.state.conversation_labels.push(entry);
        }
        Ok(())
    }

    async fn create_message(&mut self, input: CreateMessage) -> Result<Message> {
        self.check_write()?;
        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let message = Message {
            id: self.next_id(),
            account_id: input.account_id,
            conversation_id: input.conversation_id,
            content: input.content,
            message_type: input.message_type,
            private: input.private,
            status: input.status,
            source_id: input.source_id,
            content_type: input.content_type,
            content_attributes: input.content_attributes,
            sender_type: input.sender_type,
            sender_id: input.sender_id,
            created_at,
            updated_at: input.updated_at.unwrap_or(created_at),
        };
        self.state.messages.push(message.clone());
        Ok(message)
    }

    async fn messages_for_conversation(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn create_attachment(&mut self, input: CreateAttachment) -> Result<Attachment> {
        self.check_write()?;
        let attachment = Attachment {
            id: self.next_id(),
            account_id: input.account_id,
            message_id: input.message_id,
            file_type: input.file_type,
            file_size: input.file_size,
            filename: input.filename,
            content_type: input.content_type,
            pending_download: input.pending_download,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.attachments.push(attachment.clone());
        Ok(attachment)
    }

    async fn attachments_for_message(
        &mut self,
        message_id: MessageId,
    ) -> Result<Vec<Attachment>> {
        Ok(self
            .state
            .attachments
            .iter()
            .filter(|a| a.message_id == message_id)
            .cloned()
            .collect())
    }

    async fn canned_response_by_short_code(
        &mut self,
        account_id: AccountId,
        short_code: &str,
    ) -> Result<Option<CannedResponse>> {
        Ok(self
            .state
            .canned_responses
            .iter()
            .find(|c| c.account_id == account_id && c.short_code == short_code)
            .cloned())
    }

    async fn create_canned_response(
        &mut self,
        input: CreateCannedResponse,
    ) -> Result<CannedResponse> {
        self.check_write()?;
        let canned = CannedResponse {
            id: self.next_id(),
            account_id: input.account_id,
            short_code: input.short_code,
            content: input.content,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.canned_responses.push(canned.clone());
        Ok(canned)
    }

    async fn canned_responses_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<CannedResponse>> {
        Ok(self
            .state
            .canned_responses
            .iter()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn custom_filter_by_name(
        &mut self,
        account_id: AccountId,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<CustomFilter>> {
        Ok(self
            .state
            .custom_filters
            .iter()
            .find(|f| f.account_id == account_id && f.user_id == user_id && f.name == name)
            .cloned())
    }

    async fn create_custom_filter(&mut self, input: CreateCustomFilter) -> Result<CustomFilter> {
        self.check_write()?;
        let custom_filter = CustomFilter {
            id: self.next_id(),
            account_id: input.account_id,
            user_id: input.user_id,
            name: input.name,
            filter_type: input.filter_type,
            query: input.query,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.custom_filters.push(custom_filter.clone());
        Ok(custom_filter)
    }

    async fn custom_filters_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<CustomFilter>> {
        Ok(self
            .state
            .custom_filters
            .iter()
            .filter(|f| f.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn webhook_by_url(
        &mut self,
        account_id: AccountId,
        inbox_id: InboxId,
        url: &str,
    ) -> Result<Option<Webhook>> {
        Ok(self
            .state
            .webhooks
            .iter()
            .find(|w| w.account_id == account_id && w.inbox_id == inbox_id && w.url == url)
            .cloned())
    }

    async fn create_webhook(&mut self, input: CreateWebhook) -> Result<Webhook> {
        self.check_write()?;
        let webhook = Webhook {
            id: self.next_id(),
            account_id: input.account_id,
            inbox_id: input.inbox_id,
            url: input.url,
            subscriptions: input.subscriptions,
            webhook_type: input.webhook_type,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.webhooks.push(webhook.clone());
        Ok(webhook)
    }

    async fn webhooks_for_account(&mut self, account_id: AccountId) -> Result<Vec<Webhook>> {
        Ok(self
            .state
            .webhooks
            .iter()
            .filter(|w| w.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn automation_rule_by_name(
        &mut self,
        account_id: AccountId,
        name: &str,
    ) -> Result<Option<AutomationRule>> {
        Ok(self
            .state
            .automation_rules
            .iter()
            .find(|r| r.account_id == account_id && r.name == name)
            .cloned())
    }

    async fn create_automation_rule(
        &mut self,
        input: CreateAutomationRule,
    ) -> Result<AutomationRule> {
        self.check_write()?;
        let rule = AutomationRule {
            id: self.next_id(),
            account_id: input.account_id,
            name: input.name,
            description: input.description,
            event_name: input.event_name,
            conditions: input.conditions,
            actions: input.actions,
            active: input.active,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        self.state.automation_rules.push(rule.clone());
        Ok(rule)
    }

    async fn automation_rules_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<AutomationRule>> {
        Ok(self
            .state
            .automation_rules
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> CreateAccount {
        CreateAccount {
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
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_account() {
        let mut store = MemoryStore::new();
        let created = store.create_account(sample_account()).await.unwrap();

        let found = store.account_by_name("Acme Support").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));

        let missing = store.account_by_name("Nobody").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_rollback_restores_state() {
        let mut store = MemoryStore::new();
        store.create_account(sample_account()).await.unwrap();

        store.begin().await.unwrap();
        let mut second = sample_account();
        second.name = "Transient".to_string();
        store.create_account(second).await.unwrap();
        store.rollback().await.unwrap();

        assert!(store.account_by_name("Transient").await.unwrap().is_none());
        assert!(store
            .account_by_name("Acme Support")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_write_failure_injection() {
        let mut store = MemoryStore::new();
        store.fail_after_creates(1);

        store.create_account(sample_account()).await.unwrap();

        let mut second = sample_account();
        second.name = "Blocked".to_string();
        let err = store.create_account(second).await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_duplicate_user_email_rejected() {
        let mut store = MemoryStore::new();
        let user = CreateUser {
            name: Some("Jo".to_string()),
            email: "jo@example.com".to_string(),
            display_name: None,
            message_signature: None,
            ui_settings: serde_json::json!({}),
            custom_attributes: serde_json::json!({}),
            password_digest: "x".to_string(),
            confirmed_at: None,
            created_at: None,
        };
        store.create_user(user.clone()).await.unwrap();

        let err = store.create_user(user).await.unwrap_err();
        assert!(matches!(err, Error::Datastore(_)));
    }
}
