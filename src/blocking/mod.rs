//! Blocking adapter for synchronous callers.
//!
//! [`BlockingClient`] owns a multi-threaded tokio runtime and runs client
//! operations on it while the calling thread waits. None of its methods may
//! be called from inside an async context.

use crate::client::InstatusClient;
use crate::config::InstatusConfig;
use crate::errors::{InstatusError, InstatusResult};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinError;
use tracing::{debug, warn};

/// Runs Instatus operations to completion on a dedicated runtime.
pub struct BlockingClient {
    runtime: Runtime,
    client: InstatusClient,
}

impl BlockingClient {
    /// Creates the runtime and the client.
    pub fn new(config: InstatusConfig) -> InstatusResult<Self> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("instatus-runtime")
            .build()
            .map_err(|e| {
                InstatusError::configuration(format!("Failed to start runtime: {}", e))
                    .with_cause(e)
            })?;
        let client = {
            let _enter = runtime.enter();
            InstatusClient::new(config)?
        };

        Ok(Self { runtime, client })
    }

    /// Gets the underlying async client.
    pub fn client(&self) -> &InstatusClient {
        &self.client
    }

    /// Drives an arbitrary future on the runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Runs `op` bounded by the configured run timeout.
    ///
    /// See [`run_with_timeout`](Self::run_with_timeout).
    pub fn run<F, Fut, T>(&self, op: F) -> InstatusResult<Option<T>>
    where
        F: FnOnce(InstatusClient) -> Fut,
        Fut: Future<Output = InstatusResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.run_with_timeout(op, self.client.config().run.timeout)
    }

    /// Runs `op` on the runtime and waits up to `timeout` for it.
    ///
    /// On timeout the operation is aborted. The result is then `Ok(None)`
    /// when the client ignores run timeouts and a `Timeout` error otherwise.
    /// `None` waits without bound.
    pub fn run_with_timeout<F, Fut, T>(
        &self,
        op: F,
        timeout: Option<Duration>,
    ) -> InstatusResult<Option<T>>
    where
        F: FnOnce(InstatusClient) -> Fut,
        Fut: Future<Output = InstatusResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let ignore_timeouts = self.client.config().run.ignore_timeouts;
        let mut task = {
            let _enter = self.runtime.enter();
            tokio::spawn(op(self.client.clone()))
        };

        self.runtime.block_on(async {
            let Some(limit) = timeout else {
                return joined(task.await).map(Some);
            };

            match tokio::time::timeout(limit, &mut task).await {
                Ok(result) => joined(result).map(Some),
                Err(_) => {
                    task.abort();
                    if ignore_timeouts {
                        debug!(timeout_ms = limit.as_millis() as u64, "Run timed out, ignoring");
                        Ok(None)
                    } else {
                        warn!(timeout_ms = limit.as_millis() as u64, "Run timed out");
                        Err(InstatusError::timeout(format!(
                            "Operation did not finish within {:?}",
                            limit
                        )))
                    }
                }
            }
        })
    }

    /// Runs a single operation, then closes the client.
    pub fn run_once<F, Fut, T>(
        self,
        op: F,
        timeout: Option<Duration>,
    ) -> InstatusResult<Option<T>>
    where
        F: FnOnce(InstatusClient) -> Fut,
        Fut: Future<Output = InstatusResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let result = self.run_with_timeout(op, timeout);
        self.close();
        result
    }

    /// Closes the client, cancelling anything still running on it.
    pub fn close(&self) {
        self.runtime.block_on(self.client.close());
    }
}

impl std::fmt::Debug for BlockingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingClient")
            .field("client", &self.client)
            .finish()
    }
}

fn joined<T>(result: Result<InstatusResult<T>, JoinError>) -> InstatusResult<T> {
    match result {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(InstatusError::closed()),
    }
}
