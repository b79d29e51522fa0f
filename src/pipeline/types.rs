//! Shared types for the ticket triage pipeline.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SourceError;

// ── Raw input ───────────────────────────────────────────────────────

/// Ticket identifier as it appears in the export (usually numeric).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TicketId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Author of a message.
///
/// The export writes `false` for "no author" and `[id, "Display Name"]` for a
/// known partner record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    Absent,
    Known(String),
}

impl Author {
    pub fn known(identity: impl Into<String>) -> Self {
        Self::Known(identity.into())
    }

    /// Interpret the loosely-typed `author_id` field of the export.
    ///
    /// A list whose id slot is empty is treated as an anonymous identity:
    /// known, but with nothing to match on. A list with an id but no label
    /// is identified by the id.
    pub fn from_export_value(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null | Value::Bool(false) => Self::Absent,
            Value::Bool(true) => Self::Known(String::new()),
            Value::String(s) => Self::Known(s.clone()),
            Value::Number(n) => Self::Known(n.to_string()),
            Value::Array(items) => match items.first() {
                None | Some(Value::Null) | Some(Value::Bool(false)) => Self::Known(String::new()),
                Some(id) => {
                    let label = items
                        .iter()
                        .skip(1)
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(" ");
                    if !label.trim().is_empty() {
                        return Self::Known(label);
                    }
                    match id {
                        Value::String(s) => Self::Known(s.clone()),
                        other => Self::Known(other.to_string()),
                    }
                }
            },
            Value::Object(_) => Self::Known(value.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Author {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_export_value(&value))
    }
}

/// Message type tag from the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Email,
    Comment,
    Notification,
    Other(String),
}

impl From<String> for MessageKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "email" => Self::Email,
            "comment" => Self::Comment,
            "notification" => Self::Notification,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for MessageKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

/// One message record from the helpdesk export.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    /// Ticket this message belongs to.
    #[serde(rename = "res_id")]
    pub ticket_id: TicketId,
    /// HTML body, empty when the export has `false` or `null`.
    #[serde(default, deserialize_with = "export_text")]
    pub body: String,
    #[serde(rename = "author_id", default = "absent_author")]
    pub author: Author,
    #[serde(rename = "message_type", default, deserialize_with = "export_kind")]
    pub message_kind: MessageKind,
    /// `YYYY-MM-DD HH:MM:SS`, possibly empty or malformed.
    #[serde(rename = "date", default, deserialize_with = "export_text")]
    pub timestamp: String,
}

impl Default for MessageKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

fn absent_author() -> Author {
    Author::Absent
}

/// Odoo encodes empty text fields as `false`.
fn export_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

fn export_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MessageKind, D::Error> {
    export_text(deserializer).map(MessageKind::from)
}

// ── Normalized message ──────────────────────────────────────────────

/// A message reduced to what the classifier looks at.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub plain_text: String,
    pub is_customer: bool,
    pub is_team: bool,
    pub parsed_time: Option<NaiveDateTime>,
    pub message_kind: MessageKind,
    /// Date string as exported, kept for reporting.
    pub raw_date: String,
    /// Raw body was empty or whitespace only.
    pub body_is_blank: bool,
}

/// A ticket: all messages sharing one id, oldest first.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: TicketId,
    pub messages: Vec<NormalizedMessage>,
}

// ── Classification ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    Closed,
}

/// Why a ticket ended up with its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Spam,
    OrderConfirmation,
    InsolvencyResponded,
    RespondedNoFollowup,
    NoResponse,
    CustomerFollowup,
    PartnerNoResponse,
    PartnerRecent,
    RecentResponse,
    Unclear,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 10] = [
        Self::Spam,
        Self::OrderConfirmation,
        Self::InsolvencyResponded,
        Self::RespondedNoFollowup,
        Self::NoResponse,
        Self::CustomerFollowup,
        Self::PartnerNoResponse,
        Self::PartnerRecent,
        Self::RecentResponse,
        Self::Unclear,
    ];

    /// Status every ticket with this reason carries.
    pub fn status(&self) -> TicketStatus {
        match self {
            Self::Spam
            | Self::OrderConfirmation
            | Self::InsolvencyResponded
            | Self::RespondedNoFollowup
            | Self::Unclear => TicketStatus::Closed,
            Self::NoResponse
            | Self::CustomerFollowup
            | Self::PartnerNoResponse
            | Self::PartnerRecent
            | Self::RecentResponse => TicketStatus::Open,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Spam => "SPAM",
            Self::OrderConfirmation => "ORDER_CONFIRMATION",
            Self::InsolvencyResponded => "INSOLVENCY_RESPONDED",
            Self::RespondedNoFollowup => "RESPONDED_NO_FOLLOWUP",
            Self::NoResponse => "NO_RESPONSE",
            Self::CustomerFollowup => "CUSTOMER_FOLLOWUP",
            Self::PartnerNoResponse => "PARTNER_NO_RESPONSE",
            Self::PartnerRecent => "PARTNER_RECENT",
            Self::RecentResponse => "RECENT_RESPONSE",
            Self::Unclear => "UNCLEAR",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Triage priority. Serialized as its level (1 = high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn level(&self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

/// Contact details captured from a contact-form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub comment: String,
}

impl CustomerContact {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.comment.is_empty()
    }
}

/// Verdict for one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub ticket_id: TicketId,
    pub status: TicketStatus,
    pub reason: ReasonCode,
    pub details: String,
    pub priority: Priority,
    pub customer: Option<CustomerContact>,
}

/// Classification plus the ticket facts the report needs.
#[derive(Debug, Clone, Serialize)]
pub struct TicketRecord {
    pub ticket_id: TicketId,
    pub status: TicketStatus,
    pub reason: ReasonCode,
    pub details: String,
    pub priority: Priority,
    pub first_date: String,
    pub last_date: String,
    pub message_count: usize,
    pub first_message_preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerContact>,
}

// ── Message source trait ────────────────────────────────────────────

/// Where raw messages come from. Pure I/O, no classification logic.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Source name for logging (e.g. a file path).
    fn name(&self) -> &str;

    /// Load every message in the batch.
    async fn fetch(&self) -> Result<Vec<RawMessage>, SourceError>;
}
