//! PostgreSQL store
//!
//! Holds one dedicated connection so the whole import runs inside a
//! single transaction. The schema is expected to exist already; this
//! tool moves data between deployments, it does not provision them.

use crate::models::*;
use crate::store::{AccountStore, ConversationFilter};
use async_trait::async_trait;
use chrono::Utc;
use deskport_common::types::{
    AccountId, ContactId, ConversationId, InboxId, MessageId, TeamId, UserId,
};
use deskport_common::{Error, Result};
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::info;
use uuid::Uuid;

/// Map a sqlx error onto the crate error type.
///
/// Constraint and data errors stay recoverable; everything else means
/// the connection itself is unusable.
fn map_sqlx(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Database(db) => Error::Datastore(db.to_string()),
        sqlx::Error::RowNotFound => Error::Datastore("Row not found".to_string()),
        other => Error::Connection(other.to_string()),
    }
}

/// PostgreSQL-backed account store
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    /// Connect to the database at the given URL
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to database");

        let conn = PgConnection::connect(url)
            .await
            .map_err(|e| Error::Connection(format!("Failed to connect: {}", e)))?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn begin(&mut self) -> Result<()> {
        self.execute("BEGIN").await
    }

    async fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK").await
    }

    async fn account_by_id(&mut self, id: AccountId) -> Result<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn account_by_name(&mut self, name: &str) -> Result<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn create_account(&mut self, input: CreateAccount) -> Result<Account> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts
                (name, domain, support_email, locale, timezone, custom_attributes,
                 limits, feature_flags, auto_resolve_duration, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.domain)
        .bind(&input.support_email)
        .bind(&input.locale)
        .bind(&input.timezone)
        .bind(&input.custom_attributes)
        .bind(&input.limits)
        .bind(&input.feature_flags)
        .bind(input.auto_resolve_duration)
        .bind(&input.status)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn user_by_id(&mut self, id: UserId) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn create_user(&mut self, input: CreateUser) -> Result<User> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (name, email, display_name, message_signature, ui_settings,
                 custom_attributes, password_digest, confirmed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.display_name)
        .bind(&input.message_signature)
        .bind(&input.ui_settings)
        .bind(&input.custom_attributes)
        .bind(&input.password_digest)
        .bind(input.confirmed_at)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn membership(
        &mut self,
        account_id: AccountId,
        user_id: UserId,
    ) -> Result<Option<AccountUser>> {
        sqlx::query_as::<_, AccountUser>(
            "SELECT * FROM account_users WHERE account_id = $1 AND user_id = $2",
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_membership(&mut self, input: CreateAccountUser) -> Result<AccountUser> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, AccountUser>(
            r#"
            INSERT INTO account_users
                (account_id, user_id, role, availability, auto_offline, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(input.user_id)
        .bind(&input.role)
        .bind(&input.availability)
        .bind(input.auto_offline)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn memberships_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<AccountUser>> {
        sqlx::query_as::<_, AccountUser>(
            "SELECT * FROM account_users WHERE account_id = $1 ORDER BY id",
        )
        .bind(account_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn contact_by_id(&mut self, id: ContactId) -> Result<Option<Contact>> {
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn contact_by_email(
        &mut self,
        account_id: AccountId,
        email: &str,
    ) -> Result<Option<Contact>> {
        sqlx::query_as::<_, Contact>(
            "SELECT * FROM contacts WHERE account_id = $1 AND email = $2",
        )
        .bind(account_id)
        .bind(email)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn contact_by_identifier(
        &mut self,
        account_id: AccountId,
        identifier: &str,
    ) -> Result<Option<Contact>> {
        sqlx::query_as::<_, Contact>(
            "SELECT * FROM contacts WHERE account_id = $1 AND identifier = $2",
        )
        .bind(account_id)
        .bind(identifier)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_contact(&mut self, input: CreateContact) -> Result<Contact> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let updated_at = input.updated_at.unwrap_or(created_at);

        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts
                (account_id, name, email, phone_number, identifier,
                 additional_attributes, custom_attributes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(&input.identifier)
        .bind(&input.additional_attributes)
        .bind(&input.custom_attributes)
        .bind(created_at)
        .bind(updated_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn contacts_for_account(&mut self, account_id: AccountId) -> Result<Vec<Contact>> {
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE account_id = $1 ORDER BY id")
            .bind(account_id)
            .fetch_all(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn inbox_by_name(
        &mut self,
        account_id: AccountId,
        name: &str,
    ) -> Result<Option<Inbox>> {
        sqlx::query_as::<_, Inbox>("SELECT * FROM inboxes WHERE account_id = $1 AND name = $2")
            .bind(account_id)
            .bind(name)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn create_inbox(&mut self, input: CreateInbox) -> Result<Inbox> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, Inbox>(
            r#"
            INSERT INTO inboxes
                (account_id, name, channel_type, channel, settings,
                 enable_auto_assignment, greeting_enabled, greeting_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(&input.name)
        .bind(&input.channel_type)
        .bind(&input.channel)
        .bind(&input.settings)
        .bind(input.enable_auto_assignment)
        .bind(input.greeting_enabled)
        .bind(&input.greeting_message)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn inboxes_for_account(&mut self, account_id: AccountId) -> Result<Vec<Inbox>> {
        sqlx::query_as::<_, Inbox>("SELECT * FROM inboxes WHERE account_id = $1 ORDER BY id")
            .bind(account_id)
            .fetch_all(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn inbox_member_emails(&mut self, inbox_id: InboxId) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.email FROM users u
            JOIN inbox_members m ON m.user_id = u.id
            WHERE m.inbox_id = $1
            ORDER BY u.email
            "#,
        )
        .bind(inbox_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn add_inbox_member(&mut self, inbox_id: InboxId, user_id: UserId) -> Result<()> {
        sqlx::query(
            "INSERT INTO inbox_members (inbox_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(inbox_id)
        .bind(user_id)
        .execute(&mut self.conn)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn label_by_title(
        &mut self,
        account_id: AccountId,
        title: &str,
    ) -> Result<Option<Label>> {
        sqlx::query_as::<_, Label>("SELECT * FROM labels WHERE account_id = $1 AND title = $2")
            .bind(account_id)
            .bind(title)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn create_label(&mut self, input: CreateLabel) -> Result<Label> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, Label>(
            r#"
            INSERT INTO labels
                (account_id, title, description, color, show_on_sidebar, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.color)
        .bind(input.show_on_sidebar)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn labels_for_account(&mut self, account_id: AccountId) -> Result<Vec<Label>> {
        sqlx::query_as::<_, Label>("SELECT * FROM labels WHERE account_id = $1 ORDER BY id")
            .bind(account_id)
            .fetch_all(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn team_by_name(&mut self, account_id: AccountId, name: &str) -> Result<Option<Team>> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE account_id = $1 AND name = $2")
            .bind(account_id)
            .bind(name)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn create_team(&mut self, input: CreateTeam) -> Result<Team> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (account_id, name, description, allow_auto_assign, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.allow_auto_assign)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn teams_for_account(&mut self, account_id: AccountId) -> Result<Vec<Team>> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE account_id = $1 ORDER BY id")
            .bind(account_id)
            .fetch_all(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn team_member_emails(&mut self, team_id: TeamId) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.email FROM users u
            JOIN team_members m ON m.user_id = u.id
            WHERE m.team_id = $1
            ORDER BY u.email
            "#,
        )
        .bind(team_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn add_team_member(&mut self, team_id: TeamId, user_id: UserId) -> Result<()> {
        sqlx::query(
            "INSERT INTO team_members (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&mut self.conn)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn conversation_by_uuid(
        &mut self,
        account_id: AccountId,
        uuid: Uuid,
    ) -> Result<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE account_id = $1 AND uuid = $2",
        )
        .bind(account_id)
        .bind(uuid)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_conversation(&mut self, input: CreateConversation) -> Result<Conversation> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let updated_at = input.updated_at.unwrap_or(created_at);

        sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations
                (account_id, display_id, uuid, contact_id, inbox_id, assignee_id,
                 team_id, status, priority, additional_attributes, custom_attributes,
                 identifier, snoozed_until, agent_last_seen_at, contact_last_seen_at,
                 first_reply_created_at, last_activity_at, waiting_since,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(input.display_id)
        .bind(input.uuid)
        .bind(input.contact_id)
        .bind(input.inbox_id)
        .bind(input.assignee_id)
        .bind(input.team_id)
        .bind(&input.status)
        .bind(&input.priority)
        .bind(&input.additional_attributes)
        .bind(&input.custom_attributes)
        .bind(&input.identifier)
        .bind(input.snoozed_until)
        .bind(input.agent_last_seen_at)
        .bind(input.contact_last_seen_at)
        .bind(input.first_reply_created_at)
        .bind(input.last_activity_at)
        .bind(input.waiting_since)
        .bind(created_at)
        .bind(updated_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn conversations_for_account(
        &mut self,
        account_id: AccountId,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>> {
        let mut sql = String::from("SELECT * FROM conversations WHERE account_id = $1");
        let mut idx = 1;

        if !filter.status.is_empty() {
            idx += 1;
            sql.push_str(&format!(" AND status = ANY(${})", idx));
        }
        if filter.from_date.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND created_at >= ${}", idx));
        }
        if filter.to_date.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND created_at <= ${}", idx));
        }

        sql.push_str(" ORDER BY created_at DESC");

        if filter.limit.is_some() {
            idx += 1;
            sql.push_str(&format!(" LIMIT ${}", idx));
        }

        let mut query = sqlx::query_as::<_, Conversation>(&sql).bind(account_id);

        if !filter.status.is_empty() {
            let statuses: Vec<String> = filter.status.iter().map(|s| s.to_string()).collect();
            query = query.bind(statuses);
        }
        if let Some(from) = filter.from_date {
            query = query.bind(from);
        }
        if let Some(to) = filter.to_date {
            query = query.bind(to);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit);
        }

        query.fetch_all(&mut self.conn).await.map_err(map_sqlx)
    }

    async fn conversation_label_titles(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT title FROM conversation_labels WHERE conversation_id = $1 ORDER BY title",
        )
        .bind(conversation_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn add_conversation_label(
        &mut self,
        conversation_id: ConversationId,
        title: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conversation_labels (conversation_id, title)
            VALUES ($1, $2) ON CONFLICT DO NOTHING
            "#,
        )
        .bind(conversation_id)
        .bind(title)
        .execute(&mut self.conn)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn create_message(&mut self, input: CreateMessage) -> Result<Message> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let updated_at = input.updated_at.unwrap_or(created_at);

        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages
                (account_id, conversation_id, content, message_type, private, status,
                 source_id, content_type, content_attributes, sender_type, sender_id,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(input.conversation_id)
        .bind(&input.content)
        .bind(&input.message_type)
        .bind(input.private)
        .bind(&input.status)
        .bind(&input.source_id)
        .bind(&input.content_type)
        .bind(&input.content_attributes)
        .bind(&input.sender_type)
        .bind(input.sender_id)
        .bind(created_at)
        .bind(updated_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn messages_for_conversation(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_attachment(&mut self, input: CreateAttachment) -> Result<Attachment> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments
                (account_id, message_id, file_type, file_size, filename,
                 content_type, pending_download, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(input.message_id)
        .bind(&input.file_type)
        .bind(input.file_size)
        .bind(&input.filename)
        .bind(&input.content_type)
        .bind(input.pending_download)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn attachments_for_message(
        &mut self,
        message_id: MessageId,
    ) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(
            "SELECT * FROM attachments WHERE message_id = $1 ORDER BY id",
        )
        .bind(message_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn canned_response_by_short_code(
        &mut self,
        account_id: AccountId,
        short_code: &str,
    ) -> Result<Option<CannedResponse>> {
        sqlx::query_as::<_, CannedResponse>(
            "SELECT * FROM canned_responses WHERE account_id = $1 AND short_code = $2",
        )
        .bind(account_id)
        .bind(short_code)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_canned_response(
        &mut self,
        input: CreateCannedResponse,
    ) -> Result<CannedResponse> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, CannedResponse>(
            r#"
            INSERT INTO canned_responses (account_id, short_code, content, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(&input.short_code)
        .bind(&input.content)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn canned_responses_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<CannedResponse>> {
        sqlx::query_as::<_, CannedResponse>(
            "SELECT * FROM canned_responses WHERE account_id = $1 ORDER BY id",
        )
        .bind(account_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn custom_filter_by_name(
        &mut self,
        account_id: AccountId,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<CustomFilter>> {
        sqlx::query_as::<_, CustomFilter>(
            "SELECT * FROM custom_filters WHERE account_id = $1 AND user_id = $2 AND name = $3",
        )
        .bind(account_id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_custom_filter(&mut self, input: CreateCustomFilter) -> Result<CustomFilter> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, CustomFilter>(
            r#"
            INSERT INTO custom_filters
                (account_id, user_id, name, filter_type, query, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.filter_type)
        .bind(&input.query)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn custom_filters_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<CustomFilter>> {
        sqlx::query_as::<_, CustomFilter>(
            "SELECT * FROM custom_filters WHERE account_id = $1 ORDER BY id",
        )
        .bind(account_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn webhook_by_url(
        &mut self,
        account_id: AccountId,
        inbox_id: InboxId,
        url: &str,
    ) -> Result<Option<Webhook>> {
        sqlx::query_as::<_, Webhook>(
            "SELECT * FROM webhooks WHERE account_id = $1 AND inbox_id = $2 AND url = $3",
        )
        .bind(account_id)
        .bind(inbox_id)
        .bind(url)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_webhook(&mut self, input: CreateWebhook) -> Result<Webhook> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, Webhook>(
            r#"
            INSERT INTO webhooks
                (account_id, inbox_id, url, subscriptions, webhook_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(input.inbox_id)
        .bind(&input.url)
        .bind(&input.subscriptions)
        .bind(&input.webhook_type)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn webhooks_for_account(&mut self, account_id: AccountId) -> Result<Vec<Webhook>> {
        sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE account_id = $1 ORDER BY id")
            .bind(account_id)
            .fetch_all(&mut self.conn)
            .await
            .map_err(map_sqlx)
    }

    async fn automation_rule_by_name(
        &mut self,
        account_id: AccountId,
        name: &str,
    ) -> Result<Option<AutomationRule>> {
        sqlx::query_as::<_, AutomationRule>(
            "SELECT * FROM automation_rules WHERE account_id = $1 AND name = $2",
        )
        .bind(account_id)
        .bind(name)
        .fetch_optional(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn create_automation_rule(
        &mut self,
        input: CreateAutomationRule,
    ) -> Result<AutomationRule> {
        let created_at = input.created_at.unwrap_or_else(Utc::now);

        sqlx::query_as::<_, AutomationRule>(
            r#"
            INSERT INTO automation_rules
                (account_id, name, description, event_name, conditions, actions,
                 active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.account_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.event_name)
        .bind(&input.conditions)
        .bind(&input.actions)
        .bind(input.active)
        .bind(created_at)
        .fetch_one(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }

    async fn automation_rules_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<AutomationRule>> {
        sqlx::query_as::<_, AutomationRule>(
            "SELECT * FROM automation_rules WHERE account_id = $1 ORDER BY id",
        )
        .bind(account_id)
        .fetch_all(&mut self.conn)
        .await
        .map_err(map_sqlx)
    }
}
