//! # DynamoDB Module
//!
//! Provisions a DynamoDB table from scratch: waits for the database to answer,
//! drops any existing table of the same name, creates the table again and
//! waits until the service reports it.
//!
//! ## Components
//!
//! - `Dynamo`: connection settings plus the ensure-table workflow.
//! - `options`: the ordered option list `Dynamo::new` is built from.
//! - `TableSpec`: the create-table definition to provision.
//! - `Context`: deadline and cancellation scope for every remote call.
//! - `TableAdmin`: the four remote calls the workflow needs, implemented for
//!   the AWS SDK by `AwsTableAdmin`.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use argus_dynamodb::dynamodb::{options, Context, Dynamo, ScalarType, TableSpec, Throughput};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let dynamo = Dynamo::new(vec![
//!     options::credentials("access", "secret"),
//!     options::region("local"),
//!     options::endpoint("http://localhost:8000"),
//!     options::human_table_name("Orders"),
//! ])?;
//!
//! let spec = TableSpec::new("orders")
//!     .attribute("id", ScalarType::String)
//!     .hash_key("id")
//!     .throughput(Throughput::new(1, 1));
//!
//! let ctx = Context::background().with_timeout(Duration::from_secs(30));
//! dynamo.ensure_table(&ctx, &spec).await?;
//! # Ok(())
//! # }
//! ```

mod admin;
mod client;
mod context;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod options;
mod spec;

pub use admin::{AwsTableAdmin, RemoteError, TableAdmin, TableState};
pub use client::Dynamo;
pub use context::{Context, ContextError};
pub use error::{Error, ErrorKind};
pub use options::{BoxedOption, DynamoOption, Sink};
pub use spec::{
    AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, KeyType, ProjectionType,
    ScalarType, StreamSpec, StreamViewType, TableSpec, Throughput,
};
