//! Provisions and resets the DynamoDB table behind the Argus key/value store.
//!
//! [`dynamodb::Dynamo`] runs the generic ensure-table workflow; [`argus`]
//! supplies the application's table definition.

pub mod argus;
pub mod dynamodb;
pub mod logging;
mod utils;
