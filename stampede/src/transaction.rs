use crate::error::OperationError;
use stampede_core::RequestOutcome;
use std::future::Future;
use std::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Times one operation and folds its result into a [`RequestOutcome`], recording metrics on
/// the way.
pub(crate) async fn transaction_hook<F>(label: &str, func: F) -> RequestOutcome
where
    F: Future<Output = Result<u16, OperationError>>,
{
    let start = Instant::now();
    let res = func.await;
    let elapsed = start.elapsed();

    #[cfg(feature = "metrics")]
    metrics::histogram!(stampede_core::METRIC_REQUEST_LATENCY, "operation" => label.to_string())
        .record(elapsed.as_nanos() as f64);

    match res {
        Ok(status) => {
            #[cfg(feature = "metrics")]
            metrics::counter!(stampede_core::METRIC_REQUEST_SUCCESS, "operation" => label.to_string())
                .increment(1);

            trace!("{label} -> {status} in {elapsed:?}");
            RequestOutcome::success(label, elapsed).with_status(status)
        }
        Err(err) => {
            let kind = err.kind();

            #[cfg(feature = "metrics")]
            metrics::counter!(
                stampede_core::METRIC_REQUEST_ERROR,
                "operation" => label.to_string(),
                "kind" => kind.to_string()
            )
            .increment(1);

            debug!("{label} failed ({kind}) after {elapsed:?}: {err}");
            let outcome = RequestOutcome::failure(label, kind, elapsed).with_detail(err.to_string());
            match err.status() {
                Some(status) => outcome.with_status(status),
                None => outcome,
            }
        }
    }
}

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    use std::sync::Once;

    static DESCRIBED: Once = Once::new();
    DESCRIBED.call_once(|| {
        metrics::describe_counter!(
            stampede_core::METRIC_REQUEST_SUCCESS,
            "Operations that completed successfully"
        );
        metrics::describe_counter!(stampede_core::METRIC_REQUEST_ERROR, "Operations that failed");
        metrics::describe_histogram!(
            stampede_core::METRIC_REQUEST_LATENCY,
            metrics::Unit::Nanoseconds,
            "Latency of a single operation"
        );
        metrics::describe_gauge!(
            stampede_core::METRIC_TIER_ELAPSED,
            metrics::Unit::Seconds,
            "Wall-clock duration of the most recent tier"
        );
    });
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn describe_metrics() {}
