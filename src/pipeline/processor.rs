//! Batch processor — normalizes a flat message export, groups it into
//! tickets, and classifies every ticket.
//!
//! Flow:
//! 1. `normalize_all()` — each raw message on its own, no shared state
//! 2. `group_tickets()` — by ticket id, oldest message first
//! 3. `classify()` — one verdict per ticket, no cross-ticket state

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::AnalyzerConfig;
use crate::pipeline::classifier::TicketClassifier;
use crate::pipeline::markup::truncate_chars;
use crate::pipeline::normalizer::normalize;
use crate::pipeline::rules::Indicators;
use crate::pipeline::types::{NormalizedMessage, RawMessage, Ticket, TicketId, TicketRecord};

/// Runs a whole export through normalization and classification.
pub struct TicketProcessor {
    config: AnalyzerConfig,
    classifier: TicketClassifier,
}

impl TicketProcessor {
    /// Create a processor with explicit phrase indicators.
    pub fn new(config: AnalyzerConfig, indicators: Indicators) -> Self {
        Self {
            config,
            classifier: TicketClassifier::new(indicators),
        }
    }

    /// Create a processor with the production phrase lists.
    pub fn with_default_rules(config: AnalyzerConfig) -> Self {
        Self::new(config, Indicators::default_rules())
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Normalize every message, keeping input order and ticket ids.
    pub fn normalize_all(&self, raw: &[RawMessage]) -> Vec<(TicketId, NormalizedMessage)> {
        raw.iter()
            .map(|m| (m.ticket_id.clone(), normalize(m, &self.config.customer_alias)))
            .collect()
    }

    /// Classify every ticket in the batch. Records come out in the order
    /// each ticket first appears in the export.
    pub fn process(&self, raw: &[RawMessage]) -> Vec<TicketRecord> {
        let tickets = group_tickets(self.normalize_all(raw));
        info!(
            messages = raw.len(),
            tickets = tickets.len(),
            "Grouped messages into tickets"
        );

        tickets.iter().map(|t| self.record(t)).collect()
    }

    /// Classify one ticket and attach the facts the report needs.
    pub fn record(&self, ticket: &Ticket) -> TicketRecord {
        let result = self
            .classifier
            .classify(&ticket.id, &ticket.messages, self.config.reference_time);

        let first = ticket.messages.first();
        let last = ticket.messages.last();

        TicketRecord {
            ticket_id: result.ticket_id,
            status: result.status,
            reason: result.reason,
            details: result.details,
            priority: result.priority,
            first_date: first.map(|m| m.raw_date.clone()).unwrap_or_default(),
            last_date: last.map(|m| m.raw_date.clone()).unwrap_or_default(),
            message_count: ticket.messages.len(),
            first_message_preview: first
                .map(|m| truncate_chars(&m.plain_text, self.config.preview_chars))
                .unwrap_or_default(),
            customer: result.customer,
        }
    }
}

/// Group normalized messages by ticket.
///
/// Within a ticket messages are sorted by parsed time. The sort is stable,
/// so equal times keep input order, and messages without a usable
/// timestamp go last in input order.
pub fn group_tickets(messages: Vec<(TicketId, NormalizedMessage)>) -> Vec<Ticket> {
    let mut index: HashMap<TicketId, usize> = HashMap::new();
    let mut tickets: Vec<Ticket> = Vec::new();

    for (id, message) in messages {
        let slot = *index.entry(id.clone()).or_insert_with(|| {
            tickets.push(Ticket {
                id,
                messages: Vec::new(),
            });
            tickets.len() - 1
        });
        tickets[slot].messages.push(message);
    }

    for ticket in &mut tickets {
        ticket
            .messages
            .sort_by_key(|m| (m.parsed_time.is_none(), m.parsed_time));
        let undated = ticket
            .messages
            .iter()
            .filter(|m| m.parsed_time.is_none())
            .count();
        if undated > 0 {
            debug!(ticket_id = %ticket.id, undated, "Ticket has messages without a usable date");
        }
    }

    tickets
}
