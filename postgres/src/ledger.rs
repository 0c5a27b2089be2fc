//! `PostgreSQL`-backed [`CheckoutLedger`].

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use indieevent_core::{
    CheckoutLedger, CheckoutRecord, EventId, FeeSplit, GatewayMode, LedgerError, LedgerResult,
    Money, SessionId, Ticket, UserId,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

/// Schema applied by [`PostgresCheckoutLedger::migrate`].
pub const SCHEMA: &str = include_str!("../migrations/0001_checkout_sessions.sql");

const SELECT_RECORD: &str = r"
    SELECT session_id, event_id, user_id, amount_cents, platform_fee_cents,
           host_revenue_cents, mode, created_at, ticket
    FROM checkout_sessions
    WHERE session_id = $1
";

/// Checkout ledger stored in the `checkout_sessions` table.
///
/// # Example
///
/// ```no_run
/// use indieevent_postgres::PostgresCheckoutLedger;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = PostgresCheckoutLedger::connect("postgres://localhost/indieevent", 5).await?;
/// ledger.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PostgresCheckoutLedger {
    pool: PgPool,
}

impl PostgresCheckoutLedger {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the pool cannot connect.
    pub async fn connect(database_url: &str, max_connections: u32) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(Self::from_pool(pool))
    }

    /// Use an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the table and indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Database`] if the DDL fails.
    pub async fn migrate(&self) -> LedgerResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        tracing::info!("Checkout ledger schema ready");
        Ok(())
    }

    async fn insert(&self, record: CheckoutRecord) -> LedgerResult<()> {
        let result = sqlx::query(
            r"
            INSERT INTO checkout_sessions (
                session_id, event_id, user_id, amount_cents, platform_fee_cents,
                host_revenue_cents, mode, created_at, ticket
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (session_id) DO NOTHING
            ",
        )
        .bind(record.session_id.as_str())
        .bind(record.event_id.as_str())
        .bind(record.user_id.as_str())
        .bind(to_db_cents(record.amount)?)
        .bind(to_db_cents(record.fees.platform_fee)?)
        .bind(to_db_cents(record.fees.host_revenue)?)
        .bind(record.mode.as_str())
        .bind(record.created_at)
        .bind(record.ticket.as_ref().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            tracing::debug!(session_id = %record.session_id, "Checkout session already recorded");
        }
        Ok(())
    }

    async fn select(&self, session_id: &SessionId) -> LedgerResult<Option<CheckoutRecord>> {
        let row = sqlx::query(SELECT_RECORD)
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        row.as_ref().map(decode_record).transpose()
    }

    async fn set_ticket_once(
        &self,
        session_id: &SessionId,
        ticket: Ticket,
    ) -> LedgerResult<Option<Ticket>> {
        let updated = sqlx::query(
            "UPDATE checkout_sessions SET ticket = $2 WHERE session_id = $1 AND ticket IS NULL",
        )
        .bind(session_id.as_str())
        .bind(Json(&ticket))
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        if updated.rows_affected() == 1 {
            return Ok(Some(ticket));
        }

        match self.select(session_id).await? {
            None => Ok(None),
            Some(CheckoutRecord {
                ticket: Some(existing),
                ..
            }) => {
                metrics::counter!("indieevent_ledger_ticket_conflicts_total").increment(1);
                Ok(Some(existing))
            }
            Some(_) => Err(LedgerError::Corrupt(format!(
                "session {session_id} has no ticket after a lost update"
            ))),
        }
    }
}

fn to_db_cents(amount: Money) -> LedgerResult<i64> {
    i64::try_from(amount.cents())
        .map_err(|_| LedgerError::Database(format!("amount {amount} out of range")))
}

fn from_db_cents(row: &PgRow, column: &str) -> LedgerResult<Money> {
    let cents: i64 = row.try_get(column).map_err(|e| LedgerError::Corrupt(e.to_string()))?;
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| LedgerError::Corrupt(format!("negative {column}: {cents}")))
}

fn decode_record(row: &PgRow) -> LedgerResult<CheckoutRecord> {
    let text = |column: &str| -> LedgerResult<String> {
        row.try_get(column).map_err(|e| LedgerError::Corrupt(e.to_string()))
    };
    let empty = |column: &str| LedgerError::Corrupt(format!("empty {column}"));

    let mode = text("mode")?;
    let created_at: DateTime<Utc> =
        row.try_get("created_at").map_err(|e| LedgerError::Corrupt(e.to_string()))?;
    let ticket: Option<Json<Ticket>> =
        row.try_get("ticket").map_err(|e| LedgerError::Corrupt(e.to_string()))?;

    Ok(CheckoutRecord {
        session_id: SessionId::parse(text("session_id")?).ok_or_else(|| empty("session_id"))?,
        event_id: EventId::parse(text("event_id")?).ok_or_else(|| empty("event_id"))?,
        user_id: UserId::parse(text("user_id")?).ok_or_else(|| empty("user_id"))?,
        amount: from_db_cents(row, "amount_cents")?,
        fees: FeeSplit {
            platform_fee: from_db_cents(row, "platform_fee_cents")?,
            host_revenue: from_db_cents(row, "host_revenue_cents")?,
        },
        mode: GatewayMode::parse(&mode)
            .ok_or_else(|| LedgerError::Corrupt(format!("unknown mode: {mode}")))?,
        created_at,
        ticket: ticket.map(|Json(ticket)| ticket),
    })
}

impl CheckoutLedger for PostgresCheckoutLedger {
    fn record(&self, record: CheckoutRecord) -> BoxFuture<'_, LedgerResult<()>> {
        Box::pin(self.insert(record))
    }

    fn find<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, LedgerResult<Option<CheckoutRecord>>> {
        Box::pin(self.select(session_id))
    }

    fn attach_ticket<'a>(
        &'a self,
        session_id: &'a SessionId,
        ticket: Ticket,
    ) -> BoxFuture<'a, LedgerResult<Option<Ticket>>> {
        Box::pin(self.set_ticket_once(session_id, ticket))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
