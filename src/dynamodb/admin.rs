use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{
        AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, Projection,
        ProvisionedThroughput, StreamSpecification,
    },
    Client,
};
use tracing::debug;

use crate::dynamodb::spec::{self, TableSpec};

/// Whether the remote currently reports a table under a given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Present,
    Absent,
}

/// A failed call to the table-administration API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    code: Option<String>,
    message: String,
}

impl RemoteError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_owned),
            message: message.into(),
        }
    }

    fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let code = err.code().map(str::to_owned);
        Self {
            code,
            message: DisplayErrorContext(&err).to_string(),
        }
    }

    // Client-side request construction failures are reported the same way
    // the service reports a malformed request.
    fn from_build(err: BuildError) -> Self {
        Self::new(Some(VALIDATION_EXCEPTION), err.to_string())
    }

    /// Service error code such as `ResourceInUseException`, when known.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// True when repeating the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        self.code() == Some(VALIDATION_EXCEPTION)
    }

    /// True when the named table does not exist.
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(RESOURCE_NOT_FOUND_EXCEPTION)
    }
}

const VALIDATION_EXCEPTION: &str = "ValidationException";
const RESOURCE_NOT_FOUND_EXCEPTION: &str = "ResourceNotFoundException";

/// The four table-administration calls the provisioning workflow needs.
#[async_trait]
pub trait TableAdmin: Send + Sync {
    /// Lists table names; used as a liveness probe.
    async fn list_tables(&self) -> Result<Vec<String>, RemoteError>;

    async fn describe_table(&self, name: &str) -> Result<TableState, RemoteError>;

    async fn create_table(&self, spec: &TableSpec) -> Result<(), RemoteError>;

    /// Deletes a table. A table that is already gone is reported as a
    /// `ResourceNotFoundException` error.
    async fn delete_table(&self, name: &str) -> Result<(), RemoteError>;
}

/// [`TableAdmin`] backed by the AWS SDK client.
#[derive(Debug, Clone)]
pub struct AwsTableAdmin {
    client: Client,
}

impl AwsTableAdmin {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl TableAdmin for AwsTableAdmin {
    async fn list_tables(&self) -> Result<Vec<String>, RemoteError> {
        let output = self
            .client
            .list_tables()
            .limit(1)
            .send()
            .await
            .map_err(RemoteError::from_sdk)?;
        Ok(output.table_names().to_vec())
    }

    async fn describe_table(&self, name: &str) -> Result<TableState, RemoteError> {
        match self.client.describe_table().table_name(name).send().await {
            Ok(output) if output.table().is_some() => Ok(TableState::Present),
            Ok(_) => Ok(TableState::Absent),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(TableState::Absent)
            }
            Err(err) => Err(RemoteError::from_sdk(err)),
        }
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<(), RemoteError> {
        let mut request = self
            .client
            .create_table()
            .table_name(spec.name())
            .provisioned_throughput(
                throughput(spec.provisioned_throughput()).map_err(RemoteError::from_build)?,
            );

        for attribute in spec.attributes() {
            request = request.attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(&attribute.name)
                    .attribute_type(scalar_type(attribute.scalar_type))
                    .build()
                    .map_err(RemoteError::from_build)?,
            );
        }

        for element in key_schema(spec.key_schema()).map_err(RemoteError::from_build)? {
            request = request.key_schema(element);
        }

        for index in spec.global_secondary_indexes() {
            request = request.global_secondary_indexes(
                GlobalSecondaryIndex::builder()
                    .index_name(index.name())
                    .set_key_schema(Some(
                        key_schema(index.key_schema()).map_err(RemoteError::from_build)?,
                    ))
                    .projection(projection(index.projection_type()))
                    .provisioned_throughput(
                        throughput(index.provisioned_throughput())
                            .map_err(RemoteError::from_build)?,
                    )
                    .build()
                    .map_err(RemoteError::from_build)?,
            );
        }

        if let Some(stream) = spec.stream_spec() {
            request = request.stream_specification(
                StreamSpecification::builder()
                    .stream_enabled(stream.enabled)
                    .stream_view_type(stream_view_type(stream.view_type))
                    .build()
                    .map_err(RemoteError::from_build)?,
            );
        }

        request.send().await.map_err(RemoteError::from_sdk)?;
        debug!(table = spec.name(), "create table accepted");
        Ok(())
    }

    async fn delete_table(&self, name: &str) -> Result<(), RemoteError> {
        self.client
            .delete_table()
            .table_name(name)
            .send()
            .await
            .map_err(RemoteError::from_sdk)?;
        Ok(())
    }
}

fn key_schema(elements: &[spec::KeySchemaElement]) -> Result<Vec<KeySchemaElement>, BuildError> {
    elements
        .iter()
        .map(|element| {
            KeySchemaElement::builder()
                .attribute_name(&element.name)
                .key_type(match element.key_type {
                    spec::KeyType::Hash => aws_sdk_dynamodb::types::KeyType::Hash,
                    spec::KeyType::Range => aws_sdk_dynamodb::types::KeyType::Range,
                })
                .build()
        })
        .collect()
}

fn throughput(throughput: spec::Throughput) -> Result<ProvisionedThroughput, BuildError> {
    ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read_capacity_units)
        .write_capacity_units(throughput.write_capacity_units)
        .build()
}

fn scalar_type(scalar_type: spec::ScalarType) -> aws_sdk_dynamodb::types::ScalarAttributeType {
    use aws_sdk_dynamodb::types::ScalarAttributeType;
    match scalar_type {
        spec::ScalarType::String => ScalarAttributeType::S,
        spec::ScalarType::Number => ScalarAttributeType::N,
        spec::ScalarType::Binary => ScalarAttributeType::B,
    }
}

fn projection(kind: &spec::ProjectionType) -> Projection {
    use aws_sdk_dynamodb::types::ProjectionType;
    match kind {
        spec::ProjectionType::All => Projection::builder()
            .projection_type(ProjectionType::All)
            .build(),
        spec::ProjectionType::KeysOnly => Projection::builder()
            .projection_type(ProjectionType::KeysOnly)
            .build(),
        spec::ProjectionType::Include(attributes) => Projection::builder()
            .projection_type(ProjectionType::Include)
            .set_non_key_attributes(Some(attributes.clone()))
            .build(),
    }
}

fn stream_view_type(view_type: spec::StreamViewType) -> aws_sdk_dynamodb::types::StreamViewType {
    use aws_sdk_dynamodb::types::StreamViewType;
    match view_type {
        spec::StreamViewType::KeysOnly => StreamViewType::KeysOnly,
        spec::StreamViewType::NewImage => StreamViewType::NewImage,
        spec::StreamViewType::OldImage => StreamViewType::OldImage,
        spec::StreamViewType::NewAndOldImages => StreamViewType::NewAndOldImages,
    }
}
