use crate::db::filters::SqlParam;
use crate::db::queries::Statement;
use crate::models::{RowSet, SqlValue};
use async_trait::async_trait;
use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgColumn, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgConnection, PgPool, Postgres, Row, TypeInfo};

/// The database seen as an opaque executor of prepared statements.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Run a count query and a data query on one connection.
    async fn count_and_fetch(
        &self,
        count: &Statement,
        data: &Statement,
    ) -> Result<(i64, RowSet), sqlx::Error>;

    /// Run a single data query.
    async fn fetch(&self, data: &Statement) -> Result<RowSet, sqlx::Error>;
}

/// `ReportStore` backed by a PostgreSQL pool.
///
/// Each call checks out one pooled connection and holds it only for the
/// duration of the call; the guard returns it to the pool on every path.
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn count_and_fetch(
        &self,
        count: &Statement,
        data: &Statement,
    ) -> Result<(i64, RowSet), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = bind_params(sqlx::query(&count.sql), &count.params)
            .fetch_one(&mut *conn)
            .await?
            .try_get(0)?;
        let rows = fetch_rows(&mut *conn, data).await?;

        Ok((total, rows))
    }

    async fn fetch(&self, data: &Statement) -> Result<RowSet, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_rows(&mut *conn, data).await
    }
}

async fn fetch_rows(conn: &mut PgConnection, data: &Statement) -> Result<RowSet, sqlx::Error> {
    let start = std::time::Instant::now();
    let rows = bind_params(sqlx::query(&data.sql), &data.params)
        .fetch_all(&mut *conn)
        .await?;
    tracing::debug!("data query returned {} rows in {:?}", rows.len(), start.elapsed());

    let columns = match rows.first() {
        Some(row) => row
            .columns()
            .iter()
            .map(|c| c.name().to_lowercase())
            .collect(),
        None => data.columns.clone(),
    };

    let mut set = RowSet::new(columns);
    for row in &rows {
        set.rows.push(decode_row(row)?);
    }
    Ok(set)
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Date(d) => query.bind(*d),
            SqlParam::Text(s) => query.bind(s.as_str()),
            SqlParam::Integer(i) => query.bind(*i),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> Result<Vec<SqlValue>, sqlx::Error> {
    row.columns().iter().map(|c| decode_column(row, c)).collect()
}

/// Decode one cell by its reported type; unknown types are read as text.
fn decode_column(row: &PgRow, column: &PgColumn) -> Result<SqlValue, sqlx::Error> {
    let idx = column.ordinal();
    let value = match column.type_info().name() {
        "NUMERIC" => row.try_get::<Option<BigDecimal>, _>(idx)?.map(SqlValue::Decimal),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .and_then(BigDecimal::from_f32)
            .map(SqlValue::Decimal),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)?
            .and_then(BigDecimal::from_f64)
            .map(SqlValue::Decimal),
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(|v| SqlValue::Integer(v.into())),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(|v| SqlValue::Integer(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(SqlValue::Integer),
        "DATE" => row.try_get::<Option<NaiveDate>, _>(idx)?.map(SqlValue::Date),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| SqlValue::Date(v.date())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|v| SqlValue::Date(v.date_naive())),
        _ => row.try_get::<Option<String>, _>(idx)?.map(SqlValue::Text),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}
