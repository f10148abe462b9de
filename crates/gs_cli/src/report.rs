use gs_core::PipelineSummary;
use gs_pipeline::PipelineAbort;
use tracing::{error, info, warn};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

pub fn exit_code(outcome: &Result<PipelineSummary, PipelineAbort>) -> u8 {
    match outcome {
        Ok(summary) if summary.is_success() => EXIT_SUCCESS,
        _ => EXIT_FAILURE,
    }
}

pub fn report(outcome: &Result<PipelineSummary, PipelineAbort>) {
    let summary = match outcome {
        Ok(summary) => summary,
        Err(abort) => {
            error!("❌ Run aborted: {}", abort.error);
            &abort.summary
        }
    };

    for failure in summary.failed() {
        warn!(
            "  ✗ {}: {}",
            failure.article_id.as_deref().unwrap_or("<unknown>"),
            failure.reason
        );
    }
    info!(
        "📊 attempted={} published={} failed={}",
        summary.attempted(),
        summary.published(),
        summary.failed().len()
    );

    match exit_code(outcome) {
        EXIT_SUCCESS => println!("Transfer completed successfully."),
        _ => println!(
            "Transfer finished with errors: {} of {} articles published.",
            summary.published(),
            summary.attempted()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_core::{FailedItem, FatalError, SearchError};

    #[test]
    fn test_clean_run_exits_zero() {
        let mut summary = PipelineSummary::new();
        summary.record_published();
        assert_eq!(exit_code(&Ok(summary)), EXIT_SUCCESS);
        assert_eq!(exit_code(&Ok(PipelineSummary::new())), EXIT_SUCCESS);
    }

    #[test]
    fn test_item_failure_exits_non_zero() {
        let mut summary = PipelineSummary::new();
        summary.record_failure(FailedItem::new(Some("a"), "missing field: title"));
        assert_eq!(exit_code(&Ok(summary)), EXIT_FAILURE);
    }

    #[test]
    fn test_abort_exits_non_zero_even_without_failures() {
        let abort = PipelineAbort {
            error: FatalError::Search(SearchError::AuthenticationError("bad key".into())),
            summary: PipelineSummary::new(),
        };
        assert_eq!(exit_code(&Err(abort)), EXIT_FAILURE);
    }
}
