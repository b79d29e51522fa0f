//! Raw export message → `NormalizedMessage`.
//!
//! Pure and total: malformed markup, dates, or author fields degrade to
//! empty/unknown values instead of failing the batch.

use chrono::NaiveDateTime;

use crate::config::EXPORT_DATE_FORMAT;
use crate::pipeline::markup::strip_markup;
use crate::pipeline::types::{Author, NormalizedMessage, RawMessage};

/// Normalize one raw message.
///
/// `customer_alias` is the identity fragment that marks a known author as
/// the customer (tickets submitted through the shop's order address).
pub fn normalize(raw: &RawMessage, customer_alias: &str) -> NormalizedMessage {
    let (is_customer, is_team) = classify_author(&raw.author, customer_alias);

    NormalizedMessage {
        plain_text: strip_markup(&raw.body),
        is_customer,
        is_team,
        parsed_time: parse_timestamp(&raw.timestamp),
        message_kind: raw.message_kind.clone(),
        raw_date: raw.timestamp.clone(),
        body_is_blank: raw.body.trim().is_empty(),
    }
}

/// Parse an export timestamp, `None` when malformed.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), EXPORT_DATE_FORMAT).ok()
}

/// Returns `(is_customer, is_team)`. Never both true.
pub fn classify_author(author: &Author, customer_alias: &str) -> (bool, bool) {
    match author {
        Author::Absent => (true, false),
        Author::Known(identity) => {
            if matches_alias(identity, customer_alias) {
                (true, false)
            } else {
                (false, !identity.trim().is_empty())
            }
        }
    }
}

fn matches_alias(identity: &str, alias: &str) -> bool {
    !alias.is_empty() && identity.to_lowercase().contains(&alias.to_lowercase())
}
