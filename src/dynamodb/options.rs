//! Configuration options for [`Dynamo::new`].
//!
//! Options are applied in order: built-in defaults first, then the caller's
//! options (a later option overrides an earlier one touching the same field),
//! then validations that warn about anything left unset.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::dynamodb::client::Dynamo;
use crate::dynamodb::error::ErrorKind;

/// Something that knows how to adjust a [`Dynamo`] under construction.
///
/// Implemented for any `FnOnce(&mut Dynamo) -> Result<(), ErrorKind>`, so
/// ad-hoc options can be written as closures.
pub trait DynamoOption: Send {
    fn apply(self: Box<Self>, dynamo: &mut Dynamo) -> Result<(), ErrorKind>;
}

impl<F> DynamoOption for F
where
    F: FnOnce(&mut Dynamo) -> Result<(), ErrorKind> + Send,
{
    fn apply(self: Box<Self>, dynamo: &mut Dynamo) -> Result<(), ErrorKind> {
        (*self)(dynamo)
    }
}

pub type BoxedOption = Box<dyn DynamoOption>;

/// Shared destination for operator log lines.
pub type Sink = Arc<Mutex<dyn Write + Send>>;

fn option<F>(f: F) -> BoxedOption
where
    F: FnOnce(&mut Dynamo) -> Result<(), ErrorKind> + Send + 'static,
{
    Box::new(f)
}

/// Sets how chatty the operator log is. Lines at or below this level are written.
pub fn verbosity(verbosity: u32) -> BoxedOption {
    option(move |d| {
        d.verbosity = verbosity;
        Ok(())
    })
}

/// Sets the static access and secret keys.
pub fn credentials(access_key: impl Into<String>, secret_key: impl Into<String>) -> BoxedOption {
    let access_key = access_key.into();
    let secret_key = secret_key.into();
    option(move |d| {
        d.access_key = access_key;
        d.secret_key = secret_key;
        Ok(())
    })
}

pub fn region(region: impl Into<String>) -> BoxedOption {
    let region = region.into();
    option(move |d| {
        d.region = region;
        Ok(())
    })
}

/// Sets the endpoint URL, e.g. `http://localhost:8000` for DynamoDB Local.
pub fn endpoint(endpoint: impl Into<String>) -> BoxedOption {
    let endpoint = endpoint.into();
    option(move |d| {
        d.endpoint = endpoint;
        Ok(())
    })
}

/// Sets the maximum time to wait for DynamoDB to accept requests.
///
/// The default is 10 seconds.
pub fn max_wait_for_dynamo(max: Duration) -> BoxedOption {
    option(move |d| {
        d.max_wait_for_dynamo = max;
        Ok(())
    })
}

/// Sets the maximum time to wait for a single response.
///
/// The default is 20 microseconds.
pub fn max_dynamo_response_wait(max: Duration) -> BoxedOption {
    option(move |d| {
        d.max_dynamo_response_wait = max;
        Ok(())
    })
}

/// Sets the maximum time to wait for an action to complete.
///
/// The default is 5 seconds.
pub fn max_dynamo_action_wait(max: Duration) -> BoxedOption {
    option(move |d| {
        d.max_dynamo_action_wait = max;
        Ok(())
    })
}

/// Sets the operator-facing name used to prefix every log line and error.
pub fn human_table_name(name: impl Into<String>) -> BoxedOption {
    let name = name.into();
    option(move |d| {
        d.human_table_name = name;
        Ok(())
    })
}

/// Sets the delay between polls.
///
/// The default is 10 milliseconds.
pub fn general_delay(delay: Duration) -> BoxedOption {
    option(move |d| {
        d.general_delay = delay;
        Ok(())
    })
}

/// Sends operator log lines to `writer` instead of standard output.
pub fn stdout<W>(writer: W) -> BoxedOption
where
    W: Write + Send + 'static,
{
    sink(Arc::new(Mutex::new(writer)))
}

/// Like [`stdout`], for a sink shared with other owners.
pub fn sink(sink: Sink) -> BoxedOption {
    option(move |d| {
        d.stdout = sink;
        Ok(())
    })
}

pub(crate) fn defaults() -> Vec<BoxedOption> {
    vec![
        stdout(std::io::stdout()),
        max_wait_for_dynamo(Duration::from_secs(10)),
        max_dynamo_response_wait(Duration::from_micros(20)),
        max_dynamo_action_wait(Duration::from_secs(5)),
        general_delay(Duration::from_millis(10)),
    ]
}

pub(crate) fn validations() -> Vec<BoxedOption> {
    vec![
        option(|d| {
            if d.access_key.is_empty() || d.secret_key.is_empty() {
                d.warn("credentials");
            }
            Ok(())
        }),
        option(|d| {
            if d.region.is_empty() {
                d.warn("region");
            }
            Ok(())
        }),
        option(|d| {
            if d.endpoint.is_empty() {
                d.warn("endpoint");
            }
            Ok(())
        }),
        option(|d| {
            if d.human_table_name.is_empty() {
                d.warn("human table name");
            }
            Ok(())
        }),
    ]
}
