//! Workloads: the fixed sequence of operations each virtual user executes.
use crate::error::OperationError;
use crate::target::Target;
use crate::template::{BodyTemplate, Template, Vars};
use crate::transaction::transaction_hook;
use serde::Deserialize;
use serde_json::Value;
use stampede_core::{
    ConfigError, Decode, LoadPlan, Operation, Order, RequestOutcome, DEFAULT_TIMEOUT,
};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Identity of one virtual user within its tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserContext {
    pub tier_size: usize,
    /// Launch index, `0..tier_size`.
    pub user_index: usize,
}

/// A unit of work executed once per virtual user.
///
/// Implementations are shared read-only across every concurrent virtual user of a tier and must
/// not fail: every problem is reported as a failed [`RequestOutcome`]. A sequence should stop
/// at its first failing operation and return the outcomes gathered so far.
pub trait Workload: Send + Sync + 'static {
    fn execute(&self, user: &UserContext) -> impl Future<Output = Vec<RequestOutcome>> + Send;
}

/// Wraps a closure as a [`Workload`]. See [`workload_fn`].
#[derive(Clone)]
pub struct FnWorkload<F>(F);

/// Build a workload from an async closure.
///
/// ```no_run
/// use stampede::prelude::*;
/// use std::time::Duration;
///
/// let workload = workload_fn(|user: UserContext| async move {
///     vec![RequestOutcome::success(&format!("noop {}", user.user_index), Duration::ZERO)]
/// });
/// ```
pub fn workload_fn<F, Fut>(func: F) -> FnWorkload<F>
where
    F: Fn(UserContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<RequestOutcome>> + Send,
{
    FnWorkload(func)
}

impl<F, Fut> Workload for FnWorkload<F>
where
    F: Fn(UserContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<RequestOutcome>> + Send,
{
    fn execute(&self, user: &UserContext) -> impl Future<Output = Vec<RequestOutcome>> + Send {
        (self.0)(*user)
    }
}

#[derive(Debug)]
struct CompiledOperation {
    operation: Operation,
    label: String,
    path: Template,
    body: Option<BodyTemplate>,
}

/// Descriptor-driven workload issuing HTTP requests against a [`Target`].
#[derive(Debug)]
pub struct HttpWorkload {
    target: Target,
    operations: Vec<CompiledOperation>,
}

impl HttpWorkload {
    pub fn builder(base_url: &str) -> HttpWorkloadBuilder {
        HttpWorkloadBuilder {
            base_url: base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            operations: vec![],
        }
    }

    pub fn from_plan(plan: &LoadPlan) -> Result<Self, ConfigError> {
        Self::builder(&plan.base_url)
            .timeout(plan.timeout)
            .operations(plan.operations.iter().cloned())
            .build()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().map(|op| &op.operation)
    }

    async fn perform(&self, op: &CompiledOperation, vars: &mut Vars) -> Result<u16, OperationError> {
        let path = op.path.render_path(vars);
        let body = op.body.as_ref().map(|b| b.render(vars));

        let response = self
            .target
            .send(op.operation.method, &path, body.as_ref(), op.operation.timeout)
            .await?;

        let status = response.status();
        let code = status.as_u16();
        let expected = match op.operation.expect_status {
            Some(expected) => code == expected,
            None => status.is_success(),
        };
        if !expected {
            return Err(OperationError::Status { status: code });
        }

        // Always drain the body so the connection can be reused.
        let bytes = response.bytes().await?;

        if op.operation.decode == Decode::None && op.operation.captures.is_empty() {
            return Ok(code);
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|source| OperationError::Body { status: code, source })?;

        let shape = match op.operation.decode {
            Decode::None | Decode::Json => Ok(()),
            Decode::Order => Order::deserialize(&value).map(drop),
            Decode::OrderList => Vec::<Order>::deserialize(&value).map(drop),
        };
        shape.map_err(|source| OperationError::Body { status: code, source })?;

        for capture in &op.operation.captures {
            let found = value
                .pointer(&capture.pointer)
                .ok_or_else(|| OperationError::MissingCapture {
                    status: code,
                    var: capture.var.clone(),
                    pointer: capture.pointer.clone(),
                })?;
            let found = match found {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            vars.capture(&capture.var, found);
        }

        Ok(code)
    }
}

impl Workload for HttpWorkload {
    fn execute(&self, user: &UserContext) -> impl Future<Output = Vec<RequestOutcome>> + Send {
        let user = *user;
        async move {
            let mut vars = Vars::new(user);
            let mut outcomes = Vec::with_capacity(self.operations.len());

            for op in &self.operations {
                let outcome = transaction_hook(&op.label, self.perform(op, &mut vars)).await;
                let failed = !outcome.succeeded;
                outcomes.push(outcome);

                if failed {
                    break;
                }
            }

            outcomes
        }
    }
}

pub struct HttpWorkloadBuilder {
    base_url: String,
    timeout: Duration,
    operations: Vec<Operation>,
}

impl HttpWorkloadBuilder {
    /// Default transport timeout for every operation without its own.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(operations);
        self
    }

    pub fn build(self) -> Result<HttpWorkload, ConfigError> {
        if self.operations.is_empty() {
            return Err(ConfigError::EmptyWorkload);
        }

        let target = Target::new(&self.base_url, self.timeout)?;

        // Captured variables only exist for operations after the one capturing them.
        let mut captured: HashSet<String> = HashSet::new();
        let mut operations = Vec::with_capacity(self.operations.len());
        for (index, operation) in self.operations.into_iter().enumerate() {
            let path = Template::parse(&operation.path)?;
            let body = operation.body.as_ref().map(BodyTemplate::parse).transpose()?;

            let mut referenced: Vec<&str> = path.captured_names().collect();
            if let Some(body) = &body {
                referenced.extend(body.captured_names());
            }
            if let Some(name) = referenced.into_iter().find(|n| !captured.contains(*n)) {
                return Err(ConfigError::UnknownPlaceholder {
                    index,
                    name: name.to_string(),
                });
            }

            captured.extend(operation.captures.iter().map(|c| c.var.clone()));
            operations.push(CompiledOperation {
                label: operation.label(),
                operation,
                path,
                body,
            });
        }

        debug!(
            "Built workload of {} operations against {}",
            operations.len(),
            target.base_url()
        );

        Ok(HttpWorkload { target, operations })
    }
}
