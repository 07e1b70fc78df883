use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{
    config::{Credentials, Region},
    Client,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::dynamodb::admin::{AwsTableAdmin, TableAdmin, TableState};
use crate::dynamodb::context::Context;
use crate::dynamodb::error::{Error, ErrorKind};
use crate::dynamodb::options::{self, BoxedOption, Sink};
use crate::dynamodb::spec::{KeyType, TableSpec};
use crate::utils::poll_until;

// Bound on each reachability probe, nested inside the caller's deadline.
const PROBE_TIMEOUT: Duration = Duration::from_millis(50);

/// Provisions a single DynamoDB table, replacing whatever is there.
///
/// A `Dynamo` holds connection settings only; it connects fresh on every
/// [`Dynamo::ensure_table`] call and shares no state with other instances.
///
/// # Example
///
/// ```no_run
/// use argus_dynamodb::dynamodb::{options, Context, Dynamo, ScalarType, TableSpec};
///
/// # async fn run() -> Result<(), argus_dynamodb::dynamodb::Error> {
/// let dynamo = Dynamo::new(vec![
///     options::credentials("access", "secret"),
///     options::region("local"),
///     options::endpoint("http://localhost:8000"),
///     options::human_table_name("Orders"),
///     options::verbosity(1),
/// ])?;
///
/// let spec = TableSpec::new("orders")
///     .attribute("id", ScalarType::String)
///     .hash_key("id");
/// dynamo.ensure_table(&Context::background(), &spec).await?;
/// # Ok(())
/// # }
/// ```
pub struct Dynamo {
    pub(crate) access_key: String,
    pub(crate) secret_key: String,
    pub(crate) region: String,
    pub(crate) endpoint: String,

    pub(crate) human_table_name: String,

    pub(crate) max_wait_for_dynamo: Duration,
    pub(crate) max_dynamo_response_wait: Duration,
    pub(crate) max_dynamo_action_wait: Duration,
    pub(crate) general_delay: Duration,

    pub(crate) stdout: Sink,

    pub(crate) verbosity: u32,
}

impl std::fmt::Debug for Dynamo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dynamo")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("human_table_name", &self.human_table_name)
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

impl Dynamo {
    /// Builds a `Dynamo` from defaults followed by `opts`.
    ///
    /// Unset credentials, region, endpoint or human table name are not
    /// errors; each is reported as a warning on the configured output.
    pub fn new<I>(opts: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = BoxedOption>,
    {
        let mut dynamo = Self {
            access_key: String::new(),
            secret_key: String::new(),
            region: String::new(),
            endpoint: String::new(),
            human_table_name: String::new(),
            max_wait_for_dynamo: Duration::ZERO,
            max_dynamo_response_wait: Duration::ZERO,
            max_dynamo_action_wait: Duration::ZERO,
            general_delay: Duration::ZERO,
            stdout: Arc::new(Mutex::new(std::io::sink())),
            verbosity: 0,
        };

        let all = options::defaults()
            .into_iter()
            .chain(opts)
            .chain(options::validations());

        for opt in all {
            opt.apply(&mut dynamo)
                .map_err(|kind| Error::new(dynamo.human_table_name.clone(), kind))?;
        }
        Ok(dynamo)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn human_table_name(&self) -> &str {
        &self.human_table_name
    }

    pub fn verbosity(&self) -> u32 {
        self.verbosity
    }

    pub fn max_wait_for_dynamo(&self) -> Duration {
        self.max_wait_for_dynamo
    }

    pub fn max_dynamo_response_wait(&self) -> Duration {
        self.max_dynamo_response_wait
    }

    pub fn max_dynamo_action_wait(&self) -> Duration {
        self.max_dynamo_action_wait
    }

    pub fn general_delay(&self) -> Duration {
        self.general_delay
    }

    /// Creates the table described by `spec`, or replaces an existing one.
    ///
    /// Connects to the configured endpoint, waits for it to answer, deletes
    /// any table of the same name, then creates and confirms the new one.
    /// Every step stops when `ctx` is cancelled or expires.
    ///
    /// # Errors
    ///
    /// Fails without touching the network if `spec` has no table name or an
    /// unusable key schema. Otherwise fails when connecting fails, when the
    /// remote refuses the delete or rejects the table definition outright, or
    /// when `ctx` ends before the table reaches the expected state.
    #[instrument(skip_all, fields(table = spec.name(), human = %self.human_table_name))]
    pub async fn ensure_table(&self, ctx: &Context, spec: &TableSpec) -> Result<(), Error> {
        let start = Instant::now();
        check_spec(spec).map_err(|kind| self.wrap(kind))?;

        self.log(1, "setup starting.");
        let admin = match ctx.run(self.connect()).await {
            Ok(Ok(admin)) => admin,
            Ok(Err(kind)) => {
                self.log(1, "setup failed.");
                return Err(self.wrap(kind));
            }
            Err(err) => {
                self.log(1, "setup failed.");
                return Err(self.wrap(err.into()));
            }
        };

        self.provision(&admin, ctx, spec, start).await
    }

    /// Runs the same workflow as [`Dynamo::ensure_table`] against an existing
    /// table-administration handle instead of connecting.
    #[instrument(skip_all, fields(table = spec.name(), human = %self.human_table_name))]
    pub async fn ensure_table_with<A>(
        &self,
        admin: &A,
        ctx: &Context,
        spec: &TableSpec,
    ) -> Result<(), Error>
    where
        A: TableAdmin + ?Sized,
    {
        let start = Instant::now();
        check_spec(spec).map_err(|kind| self.wrap(kind))?;

        self.log(1, "setup starting.");
        self.provision(admin, ctx, spec, start).await
    }

    async fn provision<A>(
        &self,
        admin: &A,
        ctx: &Context,
        spec: &TableSpec,
        start: Instant,
    ) -> Result<(), Error>
    where
        A: TableAdmin + ?Sized,
    {
        let name = spec.name();

        self.log(1, "waiting for dynamo to respond.");
        self.wait_for_dynamodb(admin, ctx)
            .await
            .map_err(|kind| self.wrap(kind))?;
        self.log(1, "dynamo is ready.");

        self.truncate_table(admin, ctx, name)
            .await
            .map_err(|kind| self.wrap(kind))?;

        self.log(1, "waiting for table to be deleted.");
        self.confirm_table(admin, ctx, name, TableState::Absent)
            .await
            .map_err(|kind| self.wrap(kind))?;

        self.log(1, "create table.");
        self.create_table(admin, ctx, spec)
            .await
            .map_err(|kind| self.wrap(kind))?;

        self.log(1, "waiting for table to be confirmed.");
        self.confirm_table(admin, ctx, name, TableState::Present)
            .await
            .map_err(|kind| self.wrap(kind))?;

        let elapsed = start.elapsed();
        self.log(1, format!("setup complete.  Elapsed time: {elapsed:?}"));
        info!(table = name, ?elapsed, "table ready");
        Ok(())
    }

    async fn connect(&self) -> Result<AwsTableAdmin, ErrorKind> {
        if !self.endpoint.is_empty()
            && !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://"))
        {
            return Err(ErrorKind::Connect(format!(
                "endpoint {:?} is not an http(s) URL",
                self.endpoint
            )));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).credentials_provider(
            Credentials::new(
                self.access_key.clone(),
                self.secret_key.clone(),
                None,
                None,
                "argus-dynamodb",
            ),
        );
        if !self.region.is_empty() {
            loader = loader.region(Region::new(self.region.clone()));
        }
        if !self.endpoint.is_empty() {
            loader = loader.endpoint_url(&self.endpoint);
        }

        let sdk_config = loader.load().await;
        Ok(AwsTableAdmin::new(Client::new(&sdk_config)))
    }

    async fn wait_for_dynamodb<A>(&self, admin: &A, ctx: &Context) -> Result<(), ErrorKind>
    where
        A: TableAdmin + ?Sized,
    {
        let stage = &ctx.with_timeout(self.max_wait_for_dynamo);

        poll_until(stage, self.general_delay, move || async move {
            let probe = stage.with_timeout(PROBE_TIMEOUT);
            match probe.run(admin.list_tables()).await {
                Ok(Ok(_)) => Some(()),
                Ok(Err(err)) => {
                    debug!(error = %err, "dynamo not answering yet");
                    None
                }
                Err(_) => None,
            }
        })
        .await?;

        self.log(1, "db is ready.");
        Ok(())
    }

    async fn truncate_table<A>(&self, admin: &A, ctx: &Context, name: &str) -> Result<(), ErrorKind>
    where
        A: TableAdmin + ?Sized,
    {
        let found = poll_until(ctx, self.general_delay, move || async move {
            match ctx.run(admin.describe_table(name)).await {
                Ok(Ok(state)) => Some(state),
                Ok(Err(err)) => {
                    debug!(error = %err, code = err.code(), "describe failed, table state unknown");
                    None
                }
                Err(_) => None,
            }
        })
        .await;

        match found {
            Ok(TableState::Present) => {
                self.log(1, "existing table found.");
                self.log(1, "removing existing table.");
                self.delete_table(admin, ctx, name).await
            }
            Ok(TableState::Absent) => {
                self.log(1, "no existing table found.");
                Ok(())
            }
            Err(err) => {
                self.log(1, "table state not confirmed before time ran out.");
                Err(ErrorKind::NotConfirmed(err))
            }
        }
    }

    async fn delete_table<A>(&self, admin: &A, ctx: &Context, name: &str) -> Result<(), ErrorKind>
    where
        A: TableAdmin + ?Sized,
    {
        match ctx.run(admin.delete_table(name)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_not_found() => {
                debug!(table = name, "table already gone");
            }
            Ok(Err(err)) => return Err(ErrorKind::DeleteFailed(err)),
            Err(err) => return Err(ErrorKind::DeleteTimedOut(err)),
        }

        self.log(1, "deleted table.");

        poll_until(ctx, self.general_delay, move || async move {
            matches!(
                ctx.run(admin.describe_table(name)).await,
                Ok(Ok(TableState::Absent))
            )
            .then_some(())
        })
        .await
        .map_err(ErrorKind::DeleteTimedOut)?;

        self.log(1, "table deleted successfully.");
        Ok(())
    }

    async fn create_table<A>(&self, admin: &A, ctx: &Context, spec: &TableSpec) -> Result<(), ErrorKind>
    where
        A: TableAdmin + ?Sized,
    {
        loop {
            match ctx.run(admin.create_table(spec)).await {
                Ok(Ok(())) => {
                    self.log(1, "created table.");
                    return Ok(());
                }
                Ok(Err(err)) if err.is_permanent() => {
                    return Err(ErrorKind::CreateRejected(err));
                }
                Ok(Err(err)) => {
                    debug!(error = %err, code = err.code(), "create table refused, retrying");
                }
                Err(_) => {}
            }

            if let Some(err) = ctx.err() {
                return Err(ErrorKind::CreateTimedOut(err));
            }

            // Don't spin too fast.
            ctx.sleep(self.general_delay)
                .await
                .map_err(ErrorKind::CreateTimedOut)?;
        }
    }

    async fn confirm_table<A>(
        &self,
        admin: &A,
        ctx: &Context,
        name: &str,
        want: TableState,
    ) -> Result<(), ErrorKind>
    where
        A: TableAdmin + ?Sized,
    {
        let confirmed = poll_until(ctx, self.general_delay, move || async move {
            matches!(ctx.run(admin.describe_table(name)).await, Ok(Ok(state)) if state == want)
                .then_some(())
        })
        .await;

        match (confirmed, want) {
            (Ok(()), TableState::Present) => {
                self.log(1, "table successfully confirmed.");
                Ok(())
            }
            (Ok(()), TableState::Absent) => {
                self.log(1, "table not present.");
                Ok(())
            }
            (Err(err), _) => {
                self.log(1, "table state not confirmed before time ran out.");
                Err(ErrorKind::NotConfirmed(err))
            }
        }
    }

    /// Writes `message` to the output sink when the verbosity is at least `level`.
    pub(crate) fn log(&self, level: u32, message: impl Display) {
        if self.verbosity < level {
            return;
        }

        let line = format!("{} DynamoDB: {message}\n", self.human_table_name);
        debug!(human = %self.human_table_name, "{}", line.trim_end());
        let mut out = self.stdout.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_all(line.as_bytes());
    }

    pub(crate) fn warn(&self, field: &str) {
        self.log(1, format!("warning: {field} not set"));
    }

    fn wrap(&self, kind: ErrorKind) -> Error {
        Error::new(self.human_table_name.clone(), kind)
    }
}

/// Rejects specs that could never be created, before any network traffic.
fn check_spec(spec: &TableSpec) -> Result<(), ErrorKind> {
    if spec.name().is_empty() {
        return Err(ErrorKind::MissingTableName);
    }

    let keys = spec.key_schema();
    if keys.first().map(|k| k.key_type) != Some(KeyType::Hash) {
        return Err(ErrorKind::InvalidSpec(
            "key schema must start with a hash key".into(),
        ));
    }
    if keys.len() > 2 || keys.iter().skip(1).any(|k| k.key_type != KeyType::Range) {
        return Err(ErrorKind::InvalidSpec(
            "key schema allows one hash key and at most one range key".into(),
        ));
    }

    let indexed = spec
        .global_secondary_indexes()
        .iter()
        .flat_map(|index| index.key_schema());
    for key in keys.iter().chain(indexed) {
        if !spec.attributes().iter().any(|a| a.name == key.name) {
            return Err(ErrorKind::InvalidSpec(format!(
                "key attribute {:?} has no attribute definition",
                key.name
            )));
        }
    }
    Ok(())
}
