//! Ticket triage pipeline.
//!
//! Every export message flows through:
//! 1. `normalizer::normalize()` — markup stripped, author and date interpreted
//! 2. `processor::group_tickets()` — per ticket, oldest first
//! 3. `classifier::TicketClassifier::classify()` — one verdict per ticket
//!
//! The classifier is pure: "now" comes from configuration, never the clock.

pub mod classifier;
pub mod markup;
pub mod normalizer;
pub mod processor;
pub mod rules;
pub mod types;
