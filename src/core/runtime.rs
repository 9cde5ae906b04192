//! Blocking bridge to the async provider clients.
//!
//! Store operations are synchronous. Clients that speak async HTTP own one
//! of these and drive each call to completion on it, bounded by an
//! optional per-call deadline.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::{self, Runtime};

use crate::error::ProviderError;

pub(crate) struct Blocking {
    runtime: Runtime,
    timeout: Option<Duration>,
}

impl Blocking {
    pub(crate) fn new(timeout: Option<Duration>) -> std::io::Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime, timeout })
    }

    /// Run `fut` to completion, or fail with a timeout error for `operation`.
    pub(crate) fn run<F, T>(&self, operation: &'static str, fut: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match self.timeout {
            Some(limit) => self.runtime.block_on(async {
                tokio::time::timeout(limit, fut).await.map_err(|_| {
                    ProviderError::transport(
                        operation,
                        format!("deadline of {}s exceeded", limit.as_secs_f32()),
                    )
                })?
            }),
            None => self.runtime.block_on(fut),
        }
    }

    /// Run a future that cannot fail, such as loading SDK configuration.
    #[cfg_attr(not(feature = "aws"), allow(dead_code))]
    pub(crate) fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}
