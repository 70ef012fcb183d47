use diesel::SqliteConnection;
use failsafe::failure_policy::{ConsecutiveFailures, OrElse, SuccessRateOverTimeWindow};
use failsafe::backoff::EqualJittered;
use failsafe::{CircuitBreaker, StateMachine};

use crate::cache::ListCache;
use crate::config::TransactionMode;
use crate::db::DbPool;
use crate::error::ServiceError;
use crate::files::FileStore;

pub type CircuitBreakerType = StateMachine<
    OrElse<SuccessRateOverTimeWindow<EqualJittered>, ConsecutiveFailures<EqualJittered>>,
    (),
>;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub pool: DbPool,
    pub circuit_breaker: CircuitBreakerType,
    pub cache: ListCache,
    pub files: FileStore,
    pub transactions: TransactionMode,
}

impl AppState {
    pub fn new(pool: DbPool, cache: ListCache, files: FileStore, transactions: TransactionMode) -> Self {
        Self {
            pool,
            circuit_breaker: failsafe::Config::new().build(),
            cache,
            files,
            transactions,
        }
    }

    /// Runs `f` on a pooled connection behind the circuit breaker. Blocking;
    /// call it from `web::block`.
    pub fn with_store<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, ServiceError>,
    {
        let result = self.circuit_breaker.call_with(ServiceError::is_store_failure, || -> Result<T, ServiceError> {
            let mut conn = self.pool.get()?;
            f(&mut *conn)
        });
        match result {
            Ok(value) => Ok(value),
            Err(failsafe::Error::Rejected) => {
                log::warn!("circuit breaker open, store call rejected");
                Err(ServiceError::Unavailable)
            }
            Err(failsafe::Error::Inner(e)) => Err(e),
        }
    }
}
