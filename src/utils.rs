use std::future::Future;
use tokio::time::Duration;

use crate::dynamodb::{Context, ContextError};

/// Calls `probe` until it yields `Some`, sleeping `delay` between attempts.
///
/// Returns the context's error once it is cancelled or past its deadline. The
/// context is checked after every attempt, so a probe that succeeds on its
/// last chance still wins.
pub async fn poll_until<T, F, Fut>(
    ctx: &Context,
    delay: Duration,
    mut probe: F,
) -> Result<T, ContextError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    loop {
        if let Some(value) = probe().await {
            return Ok(value);
        }

        if let Some(err) = ctx.err() {
            return Err(err);
        }

        // Don't spin too fast.
        ctx.sleep(delay).await?;
    }
}
