use crate::{PassCriterion, ReportSummary, TierSummary};
use serde::Serialize;
use serde_with::{serde_as, DurationMicroSeconds, DurationMilliSeconds};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Why a single operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection refused, reset, timed out, or cancelled before completion.
    Network,
    /// The response status was not the expected one.
    HttpStatus,
    /// The response body could not be decoded.
    Decode,
    /// The virtual user's task panicked.
    Aborted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Network => "network",
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::Decode => "decode",
            ErrorKind::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Result of executing one operation.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestOutcome {
    pub operation: String,
    pub succeeded: bool,
    pub error_kind: Option<ErrorKind>,
    pub status: Option<u16>,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub latency: Duration,
    pub detail: Option<String>,
}

impl RequestOutcome {
    pub fn success(operation: &str, latency: Duration) -> Self {
        Self {
            operation: operation.to_string(),
            succeeded: true,
            error_kind: None,
            status: None,
            latency,
            detail: None,
        }
    }

    pub fn failure(operation: &str, kind: ErrorKind, latency: Duration) -> Self {
        Self {
            operation: operation.to_string(),
            succeeded: false,
            error_kind: Some(kind),
            status: None,
            latency,
            detail: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Outcomes of one virtual user executing its workload once.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VirtualUserResult {
    user: usize,
    outcomes: Vec<RequestOutcome>,
    succeeded: bool,
}

impl VirtualUserResult {
    pub fn new(user: usize, outcomes: Vec<RequestOutcome>) -> Self {
        let succeeded = outcomes.iter().all(|o| o.succeeded);
        Self {
            user,
            outcomes,
            succeeded,
        }
    }

    /// A virtual user whose task died before producing outcomes.
    pub fn aborted(user: usize, detail: impl Into<String>) -> Self {
        let outcome =
            RequestOutcome::failure("<aborted>", ErrorKind::Aborted, Duration::ZERO).with_detail(detail);
        Self::new(user, vec![outcome])
    }

    /// A virtual user that was still in flight when the run was cancelled.
    pub fn cancelled(user: usize, waited: Duration) -> Self {
        let outcome = RequestOutcome::failure("<cancelled>", ErrorKind::Network, waited)
            .with_detail("cancelled before completion");
        Self::new(user, vec![outcome])
    }

    /// Launch index within its tier.
    pub fn user(&self) -> usize {
        self.user
    }

    pub fn outcomes(&self) -> &[RequestOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }
}

/// All virtual users of one concurrency tier, in launch order.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TierResult {
    tier_size: NonZeroUsize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    elapsed: Duration,
    user_results: Vec<VirtualUserResult>,
}

impl TierResult {
    /// `user_results` must hold exactly `tier_size` entries.
    pub fn new(
        tier_size: NonZeroUsize,
        elapsed: Duration,
        user_results: Vec<VirtualUserResult>,
    ) -> Self {
        debug_assert_eq!(user_results.len(), tier_size.get());
        Self {
            tier_size,
            elapsed,
            user_results,
        }
    }

    /// A tier that never started because the run had already been cancelled. Every user is
    /// recorded as cancelled without being launched.
    pub fn cancelled(tier_size: NonZeroUsize) -> Self {
        let user_results = (0..tier_size.get())
            .map(|user| VirtualUserResult::cancelled(user, Duration::ZERO))
            .collect();
        Self::new(tier_size, Duration::ZERO, user_results)
    }

    pub fn tier_size(&self) -> usize {
        self.tier_size.get()
    }

    /// Wall-clock time from the first launch to the last completion.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn user_results(&self) -> &[VirtualUserResult] {
        &self.user_results
    }

    pub fn success_count(&self) -> usize {
        self.user_results.iter().filter(|u| u.succeeded()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.user_results.len() - self.success_count()
    }

    pub fn success_rate(&self) -> f64 {
        if self.user_results.is_empty() {
            return 1.0;
        }
        self.success_count() as f64 / self.user_results.len() as f64
    }

    pub fn all_succeeded(&self) -> bool {
        self.user_results.iter().all(VirtualUserResult::succeeded)
    }

    pub fn summarize(&self, criterion: &PassCriterion) -> TierSummary {
        TierSummary::new(self, criterion)
    }
}

/// Terminal artifact of one orchestrator run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoadTestReport {
    name: String,
    criterion: PassCriterion,
    tiers: Vec<TierResult>,
    cancelled: bool,
    passed: bool,
}

impl LoadTestReport {
    pub fn new(name: &str, criterion: PassCriterion, tiers: Vec<TierResult>) -> Self {
        let passed = tiers.iter().all(|tier| criterion.tier_passed(tier));
        Self {
            name: name.to_string(),
            criterion,
            tiers,
            cancelled: false,
            passed,
        }
    }

    /// Report of a run that was cancelled before it completed. It never passes, whatever the
    /// criterion.
    pub fn cancelled(name: &str, criterion: PassCriterion, tiers: Vec<TierResult>) -> Self {
        Self {
            cancelled: true,
            passed: false,
            ..Self::new(name, criterion, tiers)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn criterion(&self) -> PassCriterion {
        self.criterion
    }

    /// Tier results in configured order.
    pub fn tiers(&self) -> &[TierResult] {
        &self.tiers
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn summarize(&self) -> ReportSummary {
        ReportSummary::new(self)
    }
}
