//! Source-to-target id remapping
//!
//! Every phase of an import records the target id it resolved for a
//! source record; later phases read those entries to rewrite foreign
//! keys. Entries are write-once: the first recorded id wins, so a
//! find-or-create that runs twice cannot silently repoint references.

use deskport_common::types::{ContactId, ConversationId, InboxId, LabelId, MessageId, TeamId, UserId};
use std::collections::HashMap;

/// Remap table built up over one import run
#[derive(Debug, Default)]
pub struct IdMap {
    users: HashMap<String, UserId>,
    contacts: HashMap<i64, ContactId>,
    inboxes: HashMap<i64, InboxId>,
    teams: HashMap<i64, TeamId>,
    labels: HashMap<String, LabelId>,
    conversations: HashMap<i64, ConversationId>,
    messages: HashMap<i64, MessageId>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_user(&mut self, email: &str, id: UserId) {
        self.users.entry(email.to_string()).or_insert(id);
    }

    pub fn user(&self, email: &str) -> Option<UserId> {
        self.users.get(email).copied()
    }

    pub fn record_contact(&mut self, original_id: i64, id: ContactId) {
        self.contacts.entry(original_id).or_insert(id);
    }

    pub fn contact(&self, original_id: i64) -> Option<ContactId> {
        self.contacts.get(&original_id).copied()
    }

    pub fn record_inbox(&mut self, original_id: i64, id: InboxId) {
        self.inboxes.entry(original_id).or_insert(id);
    }

    pub fn inbox(&self, original_id: i64) -> Option<InboxId> {
        self.inboxes.get(&original_id).copied()
    }

    pub fn record_team(&mut self, original_id: i64, id: TeamId) {
        self.teams.entry(original_id).or_insert(id);
    }

    pub fn team(&self, original_id: i64) -> Option<TeamId> {
        self.teams.get(&original_id).copied()
    }

    pub fn record_label(&mut self, title: &str, id: LabelId) {
        self.labels.entry(title.to_string()).or_insert(id);
    }

    pub fn label(&self, title: &str) -> Option<LabelId> {
        self.labels.get(title).copied()
    }

    pub fn record_conversation(&mut self, original_id: i64, id: ConversationId) {
        self.conversations.entry(original_id).or_insert(id);
    }

    pub fn conversation(&self, original_id: i64) -> Option<ConversationId> {
        self.conversations.get(&original_id).copied()
    }

    pub fn record_message(&mut self, original_id: i64, id: MessageId) {
        self.messages.entry(original_id).or_insert(id);
    }

    pub fn message(&self, original_id: i64) -> Option<MessageId> {
        self.messages.get(&original_id).copied()
    }
}
