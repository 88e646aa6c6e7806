//! Common types for DeskPort

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for accounts
pub type AccountId = i64;

/// Unique identifier for users
pub type UserId = i64;

/// Unique identifier for account memberships
pub type AccountUserId = i64;

/// Unique identifier for contacts
pub type ContactId = i64;

/// Unique identifier for inboxes
pub type InboxId = i64;

/// Unique identifier for labels
pub type LabelId = i64;

/// Unique identifier for teams
pub type TeamId = i64;

/// Unique identifier for conversations
pub type ConversationId = i64;

/// Unique identifier for messages
pub type MessageId = i64;

/// Unique identifier for attachments
pub type AttachmentId = i64;

/// Unique identifier for canned responses
pub type CannedResponseId = i64;

/// Unique identifier for custom filters
pub type CustomFilterId = i64;

/// Unique identifier for webhooks
pub type WebhookId = i64;

/// Unique identifier for automation rules
pub type AutomationRuleId = i64;

/// Timestamp wrapper
pub type Timestamp = DateTime<Utc>;

/// Conversation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Open,
    Resolved,
    Pending,
    Snoozed,
}

impl Default for ConversationStatus {
    fn default() -> Self {
        ConversationStatus::Open
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationStatus::Open => write!(f, "open"),
            ConversationStatus::Resolved => write!(f, "resolved"),
            ConversationStatus::Pending => write!(f, "pending"),
            ConversationStatus::Snoozed => write!(f, "snoozed"),
        }
    }
}

impl std::str::FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ConversationStatus::Open),
            "resolved" => Ok(ConversationStatus::Resolved),
            "pending" => Ok(ConversationStatus::Pending),
            "snoozed" => Ok(ConversationStatus::Snoozed),
            _ => Err(format!("Invalid conversation status: {}", s)),
        }
    }
}

/// Conversation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl std::fmt::Display for ConversationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationPriority::Low => write!(f, "low"),
            ConversationPriority::Medium => write!(f, "medium"),
            ConversationPriority::High => write!(f, "high"),
            ConversationPriority::Urgent => write!(f, "urgent"),
        }
    }
}

impl std::str::FromStr for ConversationPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ConversationPriority::Low),
            "medium" => Ok(ConversationPriority::Medium),
            "high" => Ok(ConversationPriority::High),
            "urgent" => Ok(ConversationPriority::Urgent),
            _ => Err(format!("Invalid conversation priority: {}", s)),
        }
    }
}

/// Message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Incoming,
    Outgoing,
    Activity,
    Template,
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Incoming
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Incoming => write!(f, "incoming"),
            MessageType::Outgoing => write!(f, "outgoing"),
            MessageType::Activity => write!(f, "activity"),
            MessageType::Template => write!(f, "template"),
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(MessageType::Incoming),
            "outgoing" => Ok(MessageType::Outgoing),
            "activity" => Ok(MessageType::Activity),
            "template" => Ok(MessageType::Template),
            _ => Err(format!("Invalid message type: {}", s)),
        }
    }
}

/// Role of a user within an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Agent,
    Administrator,
}

impl Default for AgentRole {
    fn default() -> Self {
        AgentRole::Agent
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Agent => write!(f, "agent"),
            AgentRole::Administrator => write!(f, "administrator"),
        }
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(AgentRole::Agent),
            "administrator" => Ok(AgentRole::Administrator),
            _ => Err(format!("Invalid agent role: {}", s)),
        }
    }
}

/// Availability of a user within an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Online,
    Offline,
    Busy,
}

impl Default for Availability {
    fn default() -> Self {
        Availability::Online
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Online => write!(f, "online"),
            Availability::Offline => write!(f, "offline"),
            Availability::Busy => write!(f, "busy"),
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Availability::Online),
            "offline" => Ok(Availability::Offline),
            "busy" => Ok(Availability::Busy),
            _ => Err(format!("Invalid availability: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_status_round_trip() {
        for status in [
            ConversationStatus::Open,
            ConversationStatus::Resolved,
            ConversationStatus::Pending,
            ConversationStatus::Snoozed,
        ] {
            assert_eq!(status.to_string().parse::<ConversationStatus>(), Ok(status));
        }
        assert!("archived".parse::<ConversationStatus>().is_err());
    }

    #[test]
    fn test_agent_role_parse() {
        assert_eq!("agent".parse::<AgentRole>(), Ok(AgentRole::Agent));
        assert_eq!(
            "administrator".parse::<AgentRole>(),
            Ok(AgentRole::Administrator)
        );
        assert!("owner".parse::<AgentRole>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ConversationStatus::default(), ConversationStatus::Open);
        assert_eq!(MessageType::default(), MessageType::Incoming);
        assert_eq!(AgentRole::default(), AgentRole::Agent);
        assert_eq!(Availability::default(), Availability::Online);
    }
}
