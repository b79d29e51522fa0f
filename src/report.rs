//! Analysis report — groups ticket records for the console and the JSON summary.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::ReportError;
use crate::pipeline::markup::truncate_chars;
use crate::pipeline::types::{Priority, ReasonCode, TicketRecord, TicketStatus};

/// Order in which open reasons are listed, most urgent first.
pub const OPEN_DISPLAY_ORDER: [ReasonCode; 5] = [
    ReasonCode::CustomerFollowup,
    ReasonCode::PartnerNoResponse,
    ReasonCode::NoResponse,
    ReasonCode::PartnerRecent,
    ReasonCode::RecentResponse,
];

const HIGH_LIMIT: usize = 20;
const MEDIUM_LIMIT: usize = 10;
const LOW_LIMIT: usize = 5;
const RULE: &str = "================================================================================";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub total_tickets: usize,
    pub total_open: usize,
    pub total_closed: usize,
    pub open_by_reason: BTreeMap<ReasonCode, usize>,
    pub closed_by_reason: BTreeMap<ReasonCode, usize>,
}

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_date: String,
    pub summary: ReportSummary,
    /// Open tickets per reason, sorted by priority then first date.
    pub open_tickets: BTreeMap<ReasonCode, Vec<TicketRecord>>,
    /// Closed tickets are only counted.
    pub closed_tickets: BTreeMap<ReasonCode, usize>,
}

impl AnalysisReport {
    pub fn build(records: Vec<TicketRecord>, analysis_date: NaiveDate) -> Self {
        let mut summary = ReportSummary {
            total_tickets: records.len(),
            ..ReportSummary::default()
        };
        let mut open_tickets: BTreeMap<ReasonCode, Vec<TicketRecord>> = BTreeMap::new();

        for record in records {
            match record.status {
                TicketStatus::Open => {
                    summary.total_open += 1;
                    *summary.open_by_reason.entry(record.reason).or_default() += 1;
                    open_tickets.entry(record.reason).or_default().push(record);
                }
                TicketStatus::Closed => {
                    summary.total_closed += 1;
                    *summary.closed_by_reason.entry(record.reason).or_default() += 1;
                }
            }
        }

        for tickets in open_tickets.values_mut() {
            tickets.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.first_date.cmp(&b.first_date))
            });
        }

        Self {
            analysis_date: analysis_date.format("%Y-%m-%d").to_string(),
            closed_tickets: summary.closed_by_reason.clone(),
            summary,
            open_tickets,
        }
    }

    pub fn open(&self, reason: ReasonCode) -> &[TicketRecord] {
        self.open_tickets
            .get(&reason)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Write the report as pretty-printed JSON.
    pub async fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| ReportError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), "Wrote analysis report");
        Ok(())
    }
}

/// Console rendering of a report.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(RULE.into());
    lines.push("OPEN TICKETS (Need Attention)".into());
    lines.push(RULE.into());

    for reason in OPEN_DISPLAY_ORDER {
        let tickets = report.open(reason);
        if tickets.is_empty() {
            continue;
        }
        let mut tickets = tickets.to_vec();
        tickets.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.last_date.cmp(&b.last_date))
        });

        lines.push(String::new());
        lines.push("=".repeat(60));
        lines.push(format!("### {reason} ({} tickets) ###", tickets.len()));
        lines.push("=".repeat(60));

        let by_priority = |p: Priority| tickets.iter().filter(move |t| t.priority == p);

        let high: Vec<_> = by_priority(Priority::High).collect();
        if !high.is_empty() {
            lines.push(format!("\n  [HIGH PRIORITY - {} tickets]", high.len()));
            for t in high.iter().take(HIGH_LIMIT) {
                lines.push(format!("\n    Ticket ID: {}", t.ticket_id));
                lines.push(format!("    Dates: {} - {}", t.first_date, t.last_date));
                lines.push(format!("    Messages: {}", t.message_count));
                lines.push(format!("    Details: {}", t.details));
                let preview = truncate_chars(&t.first_message_preview.replace('\n', " "), 150);
                lines.push(format!("    Preview: {preview}..."));
            }
        }

        let medium: Vec<_> = by_priority(Priority::Medium).collect();
        if !medium.is_empty() {
            lines.push(format!("\n  [MEDIUM PRIORITY - {} tickets]", medium.len()));
            for t in medium.iter().take(MEDIUM_LIMIT) {
                lines.push(format!("\n    Ticket ID: {}", t.ticket_id));
                lines.push(format!("    Dates: {} - {}", t.first_date, t.last_date));
                lines.push(format!("    Details: {}", t.details));
            }
        }

        let low: Vec<_> = by_priority(Priority::Low).collect();
        if !low.is_empty() {
            lines.push(format!("\n  [LOW PRIORITY - {} tickets]", low.len()));
            lines.push(format!(
                "    (Showing first {} of {})",
                LOW_LIMIT.min(low.len()),
                low.len()
            ));
            for t in low.iter().take(LOW_LIMIT) {
                lines.push(format!("    - Ticket {}: {}", t.ticket_id, truncate_chars(&t.details, 80)));
            }
        }
    }

    lines.push(format!("\n\nTOTAL OPEN TICKETS: {}", report.summary.total_open));

    lines.push(String::new());
    lines.push(RULE.into());
    lines.push("CLOSED TICKETS SUMMARY".into());
    lines.push(RULE.into());
    for (reason, count) in &report.closed_tickets {
        lines.push(format!("  {reason}: {count} tickets"));
    }
    lines.push(format!("\nTOTAL CLOSED TICKETS: {}", report.summary.total_closed));

    lines.push(String::new());
    lines.push(RULE.into());
    lines.push("ACTION ITEMS SUMMARY".into());
    lines.push(RULE.into());

    lines.push("\n1. HIGHEST PRIORITY - Customer Follow-ups:".into());
    for t in report.open(ReasonCode::CustomerFollowup) {
        lines.push(format!("   - Ticket {}: {}", t.ticket_id, truncate_chars(&t.details, 60)));
    }

    lines.push("\n2. HIGH PRIORITY - Unanswered Customer Inquiries (< 2 days old):".into());
    for t in report
        .open(ReasonCode::NoResponse)
        .iter()
        .take(15)
        .filter(|t| t.priority == Priority::High)
    {
        lines.push(format!("   - Ticket {}: {}", t.ticket_id, truncate_chars(&t.details, 60)));
    }

    lines.push("\n3. PARTNER COMMUNICATIONS:".into());
    for t in report.open(ReasonCode::PartnerNoResponse).iter().take(5) {
        lines.push(format!(
            "   - Ticket {}: {}...",
            t.ticket_id,
            truncate_chars(&t.first_message_preview, 80)
        ));
    }

    lines.join("\n")
}
