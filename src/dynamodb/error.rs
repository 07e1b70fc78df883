use crate::dynamodb::admin::RemoteError;
use crate::dynamodb::context::ContextError;

/// Error returned by [`crate::dynamodb::Dynamo`], prefixed with the human table
/// name so failures from several managed tables can be told apart in logs.
#[derive(Debug, thiserror::Error)]
#[error("{human_table_name} DynamoDB: {kind}")]
pub struct Error {
    human_table_name: String,
    #[source]
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(human_table_name: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            human_table_name: human_table_name.into(),
            kind,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn human_table_name(&self) -> &str {
        &self.human_table_name
    }

    /// True when the call ran out of time or was cancelled.
    pub fn is_context(&self) -> bool {
        self.kind.context_error().is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("table name is required")]
    MissingTableName,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("failed to create service client: {0}")]
    Connect(String),

    #[error("{0}")]
    Context(#[from] ContextError),

    #[error("failed to delete existing table: {0}")]
    DeleteFailed(#[source] RemoteError),

    #[error("failed to delete existing table")]
    DeleteTimedOut(#[source] ContextError),

    #[error("failed to create table")]
    CreateTimedOut(#[source] ContextError),

    #[error("table rejected: {0}")]
    CreateRejected(#[source] RemoteError),

    #[error("table state not confirmed: {0}")]
    NotConfirmed(#[source] ContextError),

    #[error("invalid table specification: {0}")]
    InvalidSpec(String),
}

impl ErrorKind {
    /// The context error behind this failure, if it was caused by one.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            Self::Context(err)
            | Self::DeleteTimedOut(err)
            | Self::CreateTimedOut(err)
            | Self::NotConfirmed(err) => Some(*err),
            _ => None,
        }
    }
}
