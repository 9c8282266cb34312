#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod orders;
pub mod runner;
pub mod target;
pub mod tier;
pub mod workload;

mod error;
mod template;
mod transaction;

pub use load_test::{run, run_load_test, ConfigurableLoadTest, LoadTest};
pub use runner::run_virtual_user;
pub use tier::run_tier;
pub use workload::{workload_fn, FnWorkload, HttpWorkload, UserContext, Workload};

/// Data model, configuration and summaries shared with consumers of reports.
pub use stampede_core as core;

pub mod prelude {
    pub use crate::load_test::{ConfigurableLoadTest, LoadTest};
    pub use crate::workload::{workload_fn, HttpWorkload, UserContext, Workload};

    pub use stampede_core::{
        summarize_report, summarize_tier, ConfigError, Decode, ErrorKind, LoadPlan,
        LoadTestReport, Method, Operation, Order, PassCriterion, ReportSummary, RequestOutcome,
        TierResult, TierSummary, VirtualUserResult,
    };
    pub use tokio_util::sync::CancellationToken;
}
