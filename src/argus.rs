//! The application's own key/value table.
//!
//! Items are grouped by `bucket`, identified by `id`, and carry an `expires`
//! timestamp that the `Expires-index` index orders within each bucket.

use crate::dynamodb::{
    options, BoxedOption, Context, Dynamo, Error, GlobalSecondaryIndex, ProjectionType,
    ScalarType, StreamViewType, TableSpec, Throughput,
};

pub const TABLE_NAME: &str = "gifnoc";
pub const HUMAN_TABLE_NAME: &str = "Argus";
pub const EXPIRES_INDEX: &str = "Expires-index";

const BUCKET: &str = "bucket";
const ID: &str = "id";
const EXPIRES: &str = "expires";

/// Table definition for the key/value store, named `table_name`.
pub fn table_spec(table_name: &str) -> TableSpec {
    TableSpec::new(table_name)
        .attribute(BUCKET, ScalarType::String)
        .attribute(EXPIRES, ScalarType::Number)
        .attribute(ID, ScalarType::String)
        .hash_key(BUCKET)
        .range_key(ID)
        .global_secondary_index(
            GlobalSecondaryIndex::new(EXPIRES_INDEX)
                .hash_key(BUCKET)
                .range_key(EXPIRES)
                .projection(ProjectionType::All)
                .throughput(Throughput::new(10, 5)),
        )
        .throughput(Throughput::new(10, 5))
        .stream(true, StreamViewType::NewAndOldImages)
}

/// Provisions the `gifnoc` table.
#[derive(Debug)]
pub struct Argus {
    db: Dynamo,
}

impl Argus {
    /// Builds the provisioner from `opts`. The human table name is always
    /// `Argus`, whatever `opts` says.
    pub fn new<I>(opts: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = BoxedOption>,
    {
        let opts = opts
            .into_iter()
            .chain(std::iter::once(options::human_table_name(HUMAN_TABLE_NAME)));
        Ok(Self {
            db: Dynamo::new(opts)?,
        })
    }

    pub fn dynamo(&self) -> &Dynamo {
        &self.db
    }

    /// Replaces the `gifnoc` table with an empty one.
    pub async fn ensure_table(&self, ctx: &Context) -> Result<(), Error> {
        self.db.ensure_table(ctx, &table_spec(TABLE_NAME)).await
    }
}
