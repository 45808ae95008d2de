use std::str::FromStr;

use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, SqlitePool};
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

use crate::{config::Config, include_res, AppResult};

pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    migrate(&db_pool).await?;
    Ok(db_pool)
}

/// Creates every table and index that does not exist yet.
pub async fn migrate(db_pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::raw_sql(include_res!(str, "/schema.sql"))
        .execute(db_pool)
        .await?;
    Ok(())
}

pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Fixed-width UTC timestamp, so text ordering matches time ordering.
pub fn now() -> AppResult<String> {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    );
    Ok(OffsetDateTime::now_utc().format(&format)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let a = now().unwrap();
        let b = now().unwrap();
        assert_eq!(a.len(), "2024-01-01T00:00:00.000000Z".len());
        assert!(a <= b);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate(&db_pool).await.unwrap();
        migrate(&db_pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'vacancy_applications'")
            .fetch_one(&db_pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
