use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global diagnostics subscriber.
///
/// Diagnostics go to stderr so they never mix with the operator log, which
/// `Dynamo` writes to its own sink (stdout by default).
pub fn init_logging(verbosity: u32) -> Result<()> {
    let level = match verbosity {
        0 | 1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
