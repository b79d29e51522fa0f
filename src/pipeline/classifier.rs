//! Ticket classifier — turns one ticket's ordered messages into a verdict.
//!
//! Two phases:
//! 1. `TicketSignals::scan()` folds the messages into ticket-level signals
//! 2. `decide()` walks the rules in precedence order; first match wins
//!
//! Closing rules (spam, order confirmation, insolvency reply, stale team
//! response) are checked before any opening rule. Classification never
//! fails: unknown timestamps route to the least urgent outcome.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::pipeline::markup::truncate_chars;
use crate::pipeline::rules::{IndicatorKind, Indicators, extract_contact, is_contact_form};
use crate::pipeline::types::{
    ClassificationResult, CustomerContact, MessageKind, NormalizedMessage, Priority, ReasonCode,
    TicketId,
};

/// Characters of the first message kept for the spam exception check.
pub const FIRST_BODY_CHARS: usize = 500;

/// Days after the last team comment before a quiet ticket counts as closed.
pub const STALE_RESPONSE_DAYS: i64 = 3;

/// Age reported when the customer's message has no usable timestamp.
pub const UNKNOWN_AGE_DAYS: i64 = 999;

const SECONDS_PER_DAY: i64 = 86_400;

// ── Signals ─────────────────────────────────────────────────────────

/// Everything the decision rules need to know about a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketSignals {
    pub is_spam: bool,
    pub is_auto_order: bool,
    pub is_partner: bool,
    pub has_insolvency_response: bool,
    pub has_customer_inquiry: bool,
    pub has_team_response: bool,
    pub customer_followup_after_response: bool,
    pub last_customer_time: Option<NaiveDateTime>,
    pub last_team_time: Option<NaiveDateTime>,
    /// Text of the ticket's first message, truncated.
    pub first_message_body: String,
    /// Captured from the first message when it is a contact form.
    pub contact: Option<CustomerContact>,
}

impl TicketSignals {
    /// Fold an ordered message sequence into signals.
    pub fn scan(messages: &[NormalizedMessage], indicators: &Indicators) -> Self {
        messages
            .iter()
            .enumerate()
            .fold(Self::default(), |signals, (index, message)| {
                signals.observe(index, message, indicators)
            })
    }

    fn observe(mut self, index: usize, message: &NormalizedMessage, indicators: &Indicators) -> Self {
        // Empty system notifications (stage changes, followers) carry nothing.
        if message.message_kind == MessageKind::Notification && message.body_is_blank {
            return self;
        }

        let text = message.plain_text.as_str();
        if index == 0 {
            self.first_message_body = truncate_chars(text, FIRST_BODY_CHARS);
        }

        self.is_spam |= indicators.matches(IndicatorKind::Spam, text);
        self.is_auto_order |= indicators.matches(IndicatorKind::OrderConfirmation, text);
        self.is_partner |= indicators.matches(IndicatorKind::Partner, text);
        self.has_insolvency_response |= indicators.matches(IndicatorKind::Insolvency, text);

        if message.is_customer
            && message.message_kind == MessageKind::Email
            && is_contact_form(text)
        {
            self.has_customer_inquiry = true;
            self.last_customer_time = message.parsed_time;
            if index == 0 {
                self.contact = Some(extract_contact(text));
            }
            if self.has_team_response {
                self.customer_followup_after_response = true;
            }
        }

        if message.is_team && message.message_kind == MessageKind::Comment {
            self.has_team_response = true;
            self.last_team_time = message.parsed_time;
        }

        self
    }

    fn customer_name(&self) -> &str {
        self.contact.as_ref().map_or("", |c| c.name.as_str())
    }

    fn customer_email(&self) -> &str {
        self.contact.as_ref().map_or("", |c| c.email.as_str())
    }
}

// ── Decision ────────────────────────────────────────────────────────

/// Outcome of the decision rules, before it is attached to a ticket id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub reason: ReasonCode,
    pub priority: Priority,
    pub details: String,
}

impl Verdict {
    fn new(reason: ReasonCode, priority: Priority, details: impl Into<String>) -> Self {
        Self {
            reason,
            priority,
            details: details.into(),
        }
    }
}

/// Whole days from `earlier` to `later`, floored.
pub fn whole_days_between(later: NaiveDateTime, earlier: NaiveDateTime) -> i64 {
    (later - earlier).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Priority of an unanswered inquiry by age in days.
pub fn inquiry_priority(days_old: i64) -> Priority {
    if days_old <= 1 {
        Priority::High
    } else if days_old <= 3 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Apply the decision rules in precedence order.
pub fn decide(signals: &TicketSignals, now: NaiveDateTime) -> Verdict {
    let days_since_team = signals
        .last_team_time
        .map(|t| whole_days_between(now, t));
    let followup = signals.customer_followup_after_response;

    if signals.is_spam && !is_contact_form(&signals.first_message_body) {
        return Verdict::new(ReasonCode::Spam, Priority::Low, "Marketing or spam email");
    }

    if signals.is_auto_order && !signals.has_customer_inquiry {
        return Verdict::new(
            ReasonCode::OrderConfirmation,
            Priority::Low,
            "Auto-generated order confirmation",
        );
    }

    if signals.has_insolvency_response && !followup {
        return Verdict::new(
            ReasonCode::InsolvencyResponded,
            Priority::Low,
            "Insolvency response sent, no follow-up",
        );
    }

    if signals.has_team_response
        && !followup
        && days_since_team.is_some_and(|days| days >= STALE_RESPONSE_DAYS)
    {
        return Verdict::new(
            ReasonCode::RespondedNoFollowup,
            Priority::Low,
            "Team responded, no customer follow-up for 3+ days",
        );
    }

    if signals.has_customer_inquiry && !signals.has_team_response {
        let days_old = signals
            .last_customer_time
            .map_or(UNKNOWN_AGE_DAYS, |t| whole_days_between(now, t));
        return Verdict::new(
            ReasonCode::NoResponse,
            inquiry_priority(days_old),
            format!(
                "Customer inquiry with NO team response ({days_old} days old) | Name: {} | Email: {}",
                signals.customer_name(),
                signals.customer_email(),
            ),
        );
    }

    if followup {
        return Verdict::new(
            ReasonCode::CustomerFollowup,
            Priority::High,
            format!(
                "Customer followed up after team response | Name: {} | Email: {}",
                signals.customer_name(),
                signals.customer_email(),
            ),
        );
    }

    if signals.is_partner {
        return if signals.has_team_response {
            Verdict::new(ReasonCode::PartnerRecent, Priority::Medium, "Partner communication")
        } else {
            Verdict::new(
                ReasonCode::PartnerNoResponse,
                Priority::High,
                "Partner inquiry with NO response",
            )
        };
    }

    if signals.has_team_response
        && let Some(days) = days_since_team
        && days <= STALE_RESPONSE_DAYS
    {
        return Verdict::new(
            ReasonCode::RecentResponse,
            Priority::Low,
            format!("Recent response ({days} days ago), may need follow-up"),
        );
    }

    Verdict::new(
        ReasonCode::Unclear,
        Priority::Low,
        "No clear customer inquiry detected",
    )
}

// ── Classifier ──────────────────────────────────────────────────────

/// Classifies tickets against a fixed set of phrase indicators.
#[derive(Debug, Clone)]
pub struct TicketClassifier {
    indicators: Indicators,
}

impl Default for TicketClassifier {
    fn default() -> Self {
        Self::new(Indicators::default_rules())
    }
}

impl TicketClassifier {
    pub fn new(indicators: Indicators) -> Self {
        Self { indicators }
    }

    /// Classify one ticket. `messages` must already be in chronological order.
    pub fn classify(
        &self,
        ticket_id: &TicketId,
        messages: &[NormalizedMessage],
        now: NaiveDateTime,
    ) -> ClassificationResult {
        let signals = TicketSignals::scan(messages, &self.indicators);
        let verdict = decide(&signals, now);

        debug!(
            ticket_id = %ticket_id,
            reason = %verdict.reason,
            priority = verdict.priority.level(),
            messages = messages.len(),
            "Ticket classified"
        );

        ClassificationResult {
            ticket_id: ticket_id.clone(),
            status: verdict.reason.status(),
            reason: verdict.reason,
            details: verdict.details,
            priority: verdict.priority,
            customer: signals.contact.filter(|c| !c.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    use crate::pipeline::types::TicketStatus;

    const FORM: &str = "Name: Jo\nEmail: jo@x.de\nKommentar: hallo";

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn at(days: i64) -> NaiveDateTime {
        base_time() + Duration::days(days)
    }

    fn make_message(
        kind: MessageKind,
        is_customer: bool,
        is_team: bool,
        text: &str,
        time: Option<NaiveDateTime>,
    ) -> NormalizedMessage {
        NormalizedMessage {
            plain_text: text.into(),
            is_customer,
            is_team,
            parsed_time: time,
            message_kind: kind,
            raw_date: time.map(|t| t.to_string()).unwrap_or_default(),
            body_is_blank: text.trim().is_empty(),
        }
    }

    fn customer_email(text: &str, time: Option<NaiveDateTime>) -> NormalizedMessage {
        make_message(MessageKind::Email, true, false, text, time)
    }

    fn team_comment(text: &str, time: Option<NaiveDateTime>) -> NormalizedMessage {
        make_message(MessageKind::Comment, false, true, text, time)
    }

    fn classify(messages: &[NormalizedMessage], now: NaiveDateTime) -> ClassificationResult {
        TicketClassifier::default().classify(&TicketId::Numeric(1), messages, now)
    }

    fn assert_verdict(result: &ClassificationResult, reason: ReasonCode, priority: Priority) {
        assert_eq!(result.reason, reason, "details: {}", result.details);
        assert_eq!(result.priority, priority);
        assert_eq!(result.status, reason.status());
    }

    // ── Scenarios ───────────────────────────────────────────────────

    #[test]
    fn unanswered_contact_form_is_open_high() {
        let result = classify(&[customer_email(FORM, Some(at(0)))], at(0));
        assert_verdict(&result, ReasonCode::NoResponse, Priority::High);
        assert_eq!(result.status, TicketStatus::Open);
        assert!(result.details.contains("Jo"));
        assert!(result.details.contains("jo@x.de"));
        assert!(result.details.contains("(0 days old)"));
        let contact = result.customer.unwrap();
        assert_eq!(contact.comment, "hallo");
    }

    #[test]
    fn customer_followup_after_team_comment() {
        let messages = [
            customer_email(FORM, Some(at(0))),
            team_comment("Hallo Jo, wir kümmern uns.", Some(at(0) + Duration::hours(3))),
            customer_email(FORM, Some(at(2))),
        ];
        let result = classify(&messages, at(5));
        assert_verdict(&result, ReasonCode::CustomerFollowup, Priority::High);
        assert!(result.details.contains("Name: Jo"));
        assert!(result.details.contains("Email: jo@x.de"));
    }

    #[test]
    fn newsletter_is_spam() {
        let messages = [customer_email(
            "Click to unsubscribe from our newsletter",
            Some(at(0)),
        )];
        let result = classify(&messages, at(0));
        assert_verdict(&result, ReasonCode::Spam, Priority::Low);
        assert_eq!(result.status, TicketStatus::Closed);
    }

    #[test]
    fn stale_team_response_closes() {
        let result = classify(&[team_comment("Erledigt.", Some(at(0)))], at(4));
        assert_verdict(&result, ReasonCode::RespondedNoFollowup, Priority::Low);
    }

    #[test]
    fn order_confirmation_closes() {
        let messages = [customer_email(
            "Leinen los! Vielen Dank für deine Bestellung.",
            Some(at(0)),
        )];
        let result = classify(&messages, at(0));
        assert_verdict(&result, ReasonCode::OrderConfirmation, Priority::Low);
    }

    #[test]
    fn order_confirmation_with_inquiry_stays_open() {
        let messages = [
            customer_email(FORM, Some(at(0))),
            customer_email("Vielen Dank für deine Bestellung", Some(at(0))),
        ];
        let result = classify(&messages, at(1));
        assert_verdict(&result, ReasonCode::NoResponse, Priority::High);
    }

    #[test]
    fn insolvency_reply_closes() {
        let messages = [
            customer_email(FORM, Some(at(0))),
            team_comment("Bitte melden Sie sich bei info@miomente-inso.de", Some(at(1))),
        ];
        let result = classify(&messages, at(2));
        assert_verdict(&result, ReasonCode::InsolvencyResponded, Priority::Low);
    }

    #[test]
    fn insolvency_reply_with_followup_stays_open() {
        let messages = [
            customer_email(FORM, Some(at(0))),
            team_comment("Das Insolvenzverfahren läuft.", Some(at(1))),
            customer_email(FORM, Some(at(2))),
        ];
        let result = classify(&messages, at(10));
        assert_verdict(&result, ReasonCode::CustomerFollowup, Priority::High);
    }

    #[test]
    fn partner_without_response() {
        let messages = [customer_email("Neue Termine im Partner-Portal", Some(at(0)))];
        let result = classify(&messages, at(1));
        assert_verdict(&result, ReasonCode::PartnerNoResponse, Priority::High);
    }

    #[test]
    fn partner_with_recent_response() {
        let messages = [
            customer_email("Neue Termine im Partner-Portal", Some(at(0))),
            team_comment("Danke, ist eingetragen.", Some(at(1))),
        ];
        let result = classify(&messages, at(2));
        assert_verdict(&result, ReasonCode::PartnerRecent, Priority::Medium);
    }

    #[test]
    fn recent_team_response_is_open_low() {
        let result = classify(&[team_comment("Wir melden uns.", Some(at(0)))], at(2));
        assert_verdict(&result, ReasonCode::RecentResponse, Priority::Low);
        assert!(result.details.contains("(2 days ago)"));
    }

    #[test]
    fn nothing_recognisable_is_unclear() {
        let messages = [customer_email("Hallo?", Some(at(0)))];
        let result = classify(&messages, at(0));
        assert_verdict(&result, ReasonCode::Unclear, Priority::Low);
        assert!(result.customer.is_none());
    }

    // ── Precedence ──────────────────────────────────────────────────

    #[test]
    fn spam_beats_no_response() {
        let messages = [
            customer_email("Unser Newsletter im Januar", Some(at(0))),
            customer_email(FORM, Some(at(0))),
        ];
        let result = classify(&messages, at(0));
        assert_verdict(&result, ReasonCode::Spam, Priority::Low);
    }

    #[test]
    fn contact_form_first_message_bypasses_spam() {
        let text = "Name: Jo\nEmail: jo@x.de\nKommentar: Gibt es ein Angebot für Gruppen?";
        let result = classify(&[customer_email(text, Some(at(0)))], at(0));
        assert_verdict(&result, ReasonCode::NoResponse, Priority::High);
    }

    #[test]
    fn spam_exception_checks_first_message_not_flagged_one() {
        let messages = [
            customer_email(FORM, Some(at(0))),
            customer_email("Jetzt zum Webinar anmelden", Some(at(1))),
        ];
        let result = classify(&messages, at(1));
        assert_verdict(&result, ReasonCode::NoResponse, Priority::High);
    }

    #[test]
    fn spam_exception_uses_first_message_even_from_team() {
        let messages = [
            make_message(MessageKind::Comment, false, true, FORM, Some(at(0))),
            customer_email("newsletter", Some(at(1))),
        ];
        let signals = TicketSignals::scan(&messages, &Indicators::default_rules());
        assert_eq!(signals.first_message_body, FORM);
        let result = classify(&messages, at(1));
        assert_ne!(result.reason, ReasonCode::Spam);
    }

    #[test]
    fn exactly_three_days_closes() {
        let result = classify(&[team_comment("Erledigt.", Some(at(0)))], at(3));
        assert_verdict(&result, ReasonCode::RespondedNoFollowup, Priority::Low);
    }

    #[test]
    fn just_under_three_days_stays_open() {
        let now = at(3) - Duration::seconds(1);
        let result = classify(&[team_comment("Erledigt.", Some(at(0)))], now);
        assert_verdict(&result, ReasonCode::RecentResponse, Priority::Low);
        assert!(result.details.contains("(2 days ago)"));
    }

    // ── Priority ────────────────────────────────────────────────────

    #[test]
    fn no_response_priority_by_age() {
        let cases = [
            (0, Priority::High),
            (1, Priority::High),
            (2, Priority::Medium),
            (3, Priority::Medium),
            (4, Priority::Low),
            (30, Priority::Low),
        ];
        for (age, expected) in cases {
            let result = classify(&[customer_email(FORM, Some(at(0)))], at(age));
            assert_verdict(&result, ReasonCode::NoResponse, expected);
            assert!(result.details.contains(&format!("({age} days old)")));
        }
    }

    #[test]
    fn no_response_unknown_age_is_low() {
        let result = classify(&[customer_email(FORM, None)], at(0));
        assert_verdict(&result, ReasonCode::NoResponse, Priority::Low);
        assert!(result.details.contains("(999 days old)"));
    }

    #[test]
    fn partial_day_is_truncated() {
        assert_eq!(whole_days_between(at(1) + Duration::hours(23), at(0)), 1);
        assert_eq!(whole_days_between(at(0), at(0) + Duration::hours(12)), -1);
    }

    // ── Scan behavior ───────────────────────────────────────────────

    #[test]
    fn blank_notification_is_skipped() {
        let messages = [
            make_message(MessageKind::Notification, false, false, "", Some(at(0))),
            customer_email(FORM, Some(at(0))),
        ];
        let signals = TicketSignals::scan(&messages, &Indicators::default_rules());
        assert!(signals.first_message_body.is_empty());
        assert!(signals.has_customer_inquiry);
        // Contact details come only from the ticket's first message.
        assert!(signals.contact.is_none());
    }

    #[test]
    fn notification_with_body_is_scanned() {
        let messages = [make_message(
            MessageKind::Notification,
            false,
            false,
            "Unser Newsletter",
            Some(at(0)),
        )];
        let result = classify(&messages, at(0));
        assert_verdict(&result, ReasonCode::Spam, Priority::Low);
    }

    #[test]
    fn team_email_is_not_a_response() {
        let messages = [make_message(MessageKind::Email, false, true, "Hallo", Some(at(0)))];
        let signals = TicketSignals::scan(&messages, &Indicators::default_rules());
        assert!(!signals.has_team_response);
        assert_verdict(&classify(&messages, at(5)), ReasonCode::Unclear, Priority::Low);
    }

    #[test]
    fn customer_comment_is_not_an_inquiry() {
        let messages = [make_message(MessageKind::Comment, true, false, FORM, Some(at(0)))];
        let signals = TicketSignals::scan(&messages, &Indicators::default_rules());
        assert!(!signals.has_customer_inquiry);
    }

    #[test]
    fn last_team_time_wins_even_when_unknown() {
        let messages = [
            team_comment("Erste Antwort", Some(at(0))),
            team_comment("Zweite Antwort", None),
        ];
        let signals = TicketSignals::scan(&messages, &Indicators::default_rules());
        assert!(signals.has_team_response);
        assert!(signals.last_team_time.is_none());
        assert_verdict(&classify(&messages, at(10)), ReasonCode::Unclear, Priority::Low);
    }

    #[test]
    fn first_message_body_truncated() {
        let long = "a".repeat(800);
        let signals = TicketSignals::scan(
            &[customer_email(&long, Some(at(0)))],
            &Indicators::default_rules(),
        );
        assert_eq!(signals.first_message_body.chars().count(), FIRST_BODY_CHARS);
    }

    #[test]
    fn injected_indicators_drive_detection() {
        let indicators = Indicators::empty().with_phrase(IndicatorKind::Spam, "gewinnspiel");
        let classifier = TicketClassifier::new(indicators);
        let messages = [customer_email("Großes Gewinnspiel!", Some(at(0)))];
        let result = classifier.classify(&TicketId::Numeric(9), &messages, at(0));
        assert_eq!(result.reason, ReasonCode::Spam);

        let newsletter = [customer_email("newsletter", Some(at(0)))];
        let result = classifier.classify(&TicketId::Numeric(9), &newsletter, at(0));
        assert_eq!(result.reason, ReasonCode::Unclear);
    }

    // ── Properties ──────────────────────────────────────────────────

    #[test]
    fn classification_is_idempotent() {
        let messages = [
            customer_email(FORM, Some(at(0))),
            team_comment("Antwort", Some(at(1))),
        ];
        let classifier = TicketClassifier::default();
        let id = TicketId::Numeric(5);
        assert_eq!(
            classifier.classify(&id, &messages, at(2)),
            classifier.classify(&id, &messages, at(2))
        );
    }

    #[test]
    fn classification_is_total() {
        let texts = ["", FORM, "newsletter", "leinen los", "partner-portal", "insolvenzverfahren", "Hallo"];
        let kinds = [
            MessageKind::Email,
            MessageKind::Comment,
            MessageKind::Notification,
            MessageKind::Other("sms".into()),
        ];
        let roles = [(true, false), (false, true), (false, false)];
        let times = [None, Some(at(0))];

        for text in texts {
            for kind in &kinds {
                for (is_customer, is_team) in roles {
                    for time in times {
                        let first = make_message(kind.clone(), is_customer, is_team, text, time);
                        let messages = [first.clone(), customer_email(FORM, time), first];
                        let result = classify(&messages, at(1));
                        assert!(ReasonCode::ALL.contains(&result.reason));
                        assert_eq!(result.status, result.reason.status());
                    }
                }
            }
        }
    }
}
