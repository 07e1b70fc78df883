use std::env;
use std::time::Duration;

use anyhow::{Context as _, Result};
use argus_dynamodb::{
    argus::Argus,
    dynamodb::{options, Context},
    logging,
};
use tracing::{error, info};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn env_or_default(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a number, got {value:?}")),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let verbosity = env_number("ARGUS_VERBOSITY", 1u32)?;
    let timeout = Duration::from_secs(env_number("ARGUS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
    logging::init_logging(verbosity)?;

    let argus = Argus::new(vec![
        options::credentials(
            env_or_default("AWS_ACCESS_KEY_ID"),
            env_or_default("AWS_SECRET_ACCESS_KEY"),
        ),
        options::region(env_or_default("AWS_REGION")),
        options::endpoint(env_or_default("AWS_ENDPOINT_URL")),
        options::verbosity(verbosity),
    ])?;

    let ctx = Context::background().with_timeout(timeout);
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling");
            interrupt.cancel();
        }
    });

    if let Err(e) = argus.ensure_table(&ctx).await {
        error!(error = %e, "provisioning failed");
        return Err(e.into());
    }

    Ok(())
}
