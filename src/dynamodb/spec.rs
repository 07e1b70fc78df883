/// Declarative description of a DynamoDB table, shaped like a `CreateTable`
/// request.
///
/// A `TableSpec` is a plain value: building one never touches the network and
/// never fails. Key-schema checks run when [`crate::dynamodb::Dynamo`]
/// provisions it.
///
/// # Key schema
///
/// Every table has a partition (`HASH`) key and optionally a sort (`RANGE`)
/// key. Each key attribute, including those used only by an index, must also
/// appear in the attribute definitions.
///
/// # Example
///
/// ```
/// use argus_dynamodb::dynamodb::{ScalarType, TableSpec, Throughput};
///
/// let spec = TableSpec::new("orders")
///     .attribute("id", ScalarType::String)
///     .hash_key("id")
///     .throughput(Throughput::new(1, 1));
/// assert_eq!(spec.name(), "orders");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    name: String,
    attributes: Vec<AttributeDefinition>,
    key_schema: Vec<KeySchemaElement>,
    global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    throughput: Throughput,
    stream: Option<StreamSpec>,
}

/// Scalar attribute types that may be used in key schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// `S`
    String,
    /// `N`
    Number,
    /// `B`
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Hash,
    Range,
}

/// Which attributes an index copies from the base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionType {
    All,
    KeysOnly,
    /// The keys plus the listed non-key attributes.
    Include(Vec<String>),
}

/// What a change stream records for each modified item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamViewType {
    KeysOnly,
    NewImage,
    OldImage,
    NewAndOldImages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub name: String,
    pub scalar_type: ScalarType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchemaElement {
    pub name: String,
    pub key_type: KeyType,
}

/// Provisioned read and write capacity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl Throughput {
    pub fn new(read_capacity_units: i64, write_capacity_units: i64) -> Self {
        Self {
            read_capacity_units,
            write_capacity_units,
        }
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub enabled: bool,
    pub view_type: StreamViewType,
}

/// A global secondary index: its own key schema, projection and throughput
/// over the same items as the base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSecondaryIndex {
    name: String,
    key_schema: Vec<KeySchemaElement>,
    projection: ProjectionType,
    throughput: Throughput,
}

impl GlobalSecondaryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_schema: Vec::new(),
            projection: ProjectionType::All,
            throughput: Throughput::default(),
        }
    }

    pub fn hash_key(mut self, name: impl Into<String>) -> Self {
        self.key_schema.push(KeySchemaElement {
            name: name.into(),
            key_type: KeyType::Hash,
        });
        self
    }

    pub fn range_key(mut self, name: impl Into<String>) -> Self {
        self.key_schema.push(KeySchemaElement {
            name: name.into(),
            key_type: KeyType::Range,
        });
        self
    }

    pub fn projection(mut self, projection: ProjectionType) -> Self {
        self.projection = projection;
        self
    }

    pub fn throughput(mut self, throughput: Throughput) -> Self {
        self.throughput = throughput;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_schema(&self) -> &[KeySchemaElement] {
        &self.key_schema
    }

    pub fn projection_type(&self) -> &ProjectionType {
        &self.projection
    }

    pub fn provisioned_throughput(&self) -> Throughput {
        self.throughput
    }
}

impl TableSpec {
    /// Creates an empty spec for the table called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            key_schema: Vec::new(),
            global_secondary_indexes: Vec::new(),
            throughput: Throughput::default(),
            stream: None,
        }
    }

    /// Adds an attribute definition.
    pub fn attribute(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.attributes.push(AttributeDefinition {
            name: name.into(),
            scalar_type,
        });
        self
    }

    /// Sets the partition key of the base table.
    pub fn hash_key(mut self, name: impl Into<String>) -> Self {
        self.key_schema.push(KeySchemaElement {
            name: name.into(),
            key_type: KeyType::Hash,
        });
        self
    }

    /// Sets the sort key of the base table.
    pub fn range_key(mut self, name: impl Into<String>) -> Self {
        self.key_schema.push(KeySchemaElement {
            name: name.into(),
            key_type: KeyType::Range,
        });
        self
    }

    pub fn global_secondary_index(mut self, index: GlobalSecondaryIndex) -> Self {
        self.global_secondary_indexes.push(index);
        self
    }

    pub fn throughput(mut self, throughput: Throughput) -> Self {
        self.throughput = throughput;
        self
    }

    /// Enables (or explicitly disables) the table's change stream.
    pub fn stream(mut self, enabled: bool, view_type: StreamViewType) -> Self {
        self.stream = Some(StreamSpec { enabled, view_type });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    pub fn key_schema(&self) -> &[KeySchemaElement] {
        &self.key_schema
    }

    pub fn global_secondary_indexes(&self) -> &[GlobalSecondaryIndex] {
        &self.global_secondary_indexes
    }

    pub fn provisioned_throughput(&self) -> Throughput {
        self.throughput
    }

    pub fn stream_spec(&self) -> Option<StreamSpec> {
        self.stream
    }
}
