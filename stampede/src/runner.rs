use crate::workload::{UserContext, Workload};
use stampede_core::VirtualUserResult;

/// Execute `workload` exactly once as a single virtual user. Never retries.
pub async fn run_virtual_user<W: Workload>(workload: &W, user: UserContext) -> VirtualUserResult {
    let outcomes = workload.execute(&user).await;
    VirtualUserResult::new(user.user_index, outcomes)
}
