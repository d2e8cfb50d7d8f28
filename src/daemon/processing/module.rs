use anyhow::Result;

use crate::daemon::storage::entities::UsageIntervalEntity;

/// Represents a consumer of completed usage intervals. This should realistically be able to
/// abstract over different options: local storage, remote server saving.
pub trait EventProcessor {
    fn process_next(
        &mut self,
        interval: UsageIntervalEntity,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
