use crate::{ErrorKind, LoadTestReport, PassCriterion, TierResult};
use serde::Serialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Counts and timing for one tier.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier_size: usize,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub elapsed: Duration,
    /// Virtual users that completed their whole workload.
    pub success_count: usize,
    pub failure_count: usize,
    /// Operations attempted across all virtual users.
    pub request_count: usize,
    /// Failed operations grouped by kind.
    pub errors: BTreeMap<ErrorKind, usize>,
    pub passed: bool,
}

impl TierSummary {
    pub(crate) fn new(tier: &TierResult, criterion: &PassCriterion) -> Self {
        let mut request_count = 0;
        let mut errors = BTreeMap::new();
        for outcome in tier.user_results().iter().flat_map(|u| u.outcomes()) {
            request_count += 1;
            if let Some(kind) = outcome.error_kind {
                *errors.entry(kind).or_insert(0) += 1;
            }
        }

        Self {
            tier_size: tier.tier_size(),
            elapsed: tier.elapsed(),
            success_count: tier.success_count(),
            failure_count: tier.failure_count(),
            request_count,
            errors,
            passed: criterion.tier_passed(tier),
        }
    }
}

/// Overall verdict plus per-tier summaries, in tier order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportSummary {
    pub name: String,
    pub overall_passed: bool,
    pub cancelled: bool,
    pub per_tier: Vec<TierSummary>,
}

impl ReportSummary {
    pub(crate) fn new(report: &LoadTestReport) -> Self {
        let criterion = report.criterion();
        Self {
            name: report.name().to_string(),
            overall_passed: report.passed(),
            cancelled: report.was_cancelled(),
            per_tier: report
                .tiers()
                .iter()
                .map(|tier| tier.summarize(&criterion))
                .collect(),
        }
    }
}

/// Summarize a tier under the strict all-succeed criterion.
pub fn summarize_tier(tier: &TierResult) -> TierSummary {
    tier.summarize(&PassCriterion::AllSucceeded)
}

pub fn summarize_report(report: &LoadTestReport) -> ReportSummary {
    report.summarize()
}

fn verdict(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

impl fmt::Display for TierSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sub-millisecond precision is noise at the tier level.
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        write!(
            f,
            "{} users: {} ({}/{} succeeded, {} requests, took {})",
            self.tier_size,
            verdict(self.passed),
            self.success_count,
            self.tier_size,
            self.request_count,
            humantime::format_duration(elapsed),
        )?;
        for (kind, count) in &self.errors {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, verdict(self.overall_passed))?;
        if self.cancelled {
            f.write_str(" (cancelled)")?;
        }
        writeln!(f)?;
        for tier in &self.per_tier {
            writeln!(f, "  {tier}")?;
        }
        Ok(())
    }
}

impl fmt::Display for LoadTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.summarize(), f)
    }
}
