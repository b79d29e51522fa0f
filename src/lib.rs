//! Ticket triage — classifies helpdesk ticket threads as open or closed.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sources;

use std::path::Path;

use crate::error::Result;
use crate::pipeline::processor::TicketProcessor;
use crate::pipeline::types::MessageSource;
use crate::report::AnalysisReport;

/// Load one batch from `source`, classify it, and write the JSON report to `output`.
///
/// The report is dated by the processor's reference time.
pub async fn run(
    processor: &TicketProcessor,
    source: &dyn MessageSource,
    output: &Path,
) -> Result<AnalysisReport> {
    let messages = source.fetch().await?;
    let records = processor.process(&messages);
    let report = AnalysisReport::build(records, processor.config().reference_time.date());
    report.write_json(output).await?;
    Ok(report)
}
