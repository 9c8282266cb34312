use crate::runner::run_virtual_user;
use crate::workload::{UserContext, Workload};
use stampede_core::{TierResult, VirtualUserResult};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Run one wave of `tier_size` concurrent virtual users and wait for all of them.
///
/// Virtual users are spawned as independent tasks, so they execute in parallel on a
/// multi-threaded runtime. Results are returned in launch order regardless of completion order.
/// If `cancel` fires, users still in flight are recorded as cancelled `Network` failures.
#[instrument(name = "tier", skip_all, fields(size = tier_size.get()))]
pub async fn run_tier<W: Workload>(
    workload: Arc<W>,
    tier_size: NonZeroUsize,
    cancel: &CancellationToken,
) -> TierResult {
    let size = tier_size.get();
    debug!("Launching {size} virtual users");

    let start = Instant::now();
    let handles: Vec<JoinHandle<VirtualUserResult>> = (0..size)
        .map(|user_index| {
            let workload = workload.clone();
            let cancel = cancel.clone();
            let user = UserContext {
                tier_size: size,
                user_index,
            };

            tokio::spawn(
                async move {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            VirtualUserResult::cancelled(user_index, start.elapsed())
                        }
                        res = run_virtual_user(&*workload, user) => res,
                    }
                }
                .in_current_span(),
            )
        })
        .collect();

    // NOTE: This is the barrier. Awaiting in launch order keeps the results ordered while the
    // elapsed time still ends at the last completion.
    let mut user_results = Vec::with_capacity(size);
    for (user_index, handle) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => {
                error!("Virtual user {user_index} did not complete: {err}");
                VirtualUserResult::aborted(user_index, err.to_string())
            }
        };
        user_results.push(result);
    }
    let elapsed = start.elapsed();

    #[cfg(feature = "metrics")]
    metrics::gauge!(stampede_core::METRIC_TIER_ELAPSED, "tier" => size.to_string())
        .set(elapsed.as_secs_f64());

    let tier = TierResult::new(tier_size, elapsed, user_results);
    info!(
        "Tier with {size} users took {} ({} succeeded, {} failed)",
        humantime::format_duration(elapsed),
        tier.success_count(),
        tier.failure_count(),
    );

    tier
}
