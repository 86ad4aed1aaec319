use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};
use tracing::{debug, info};

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations");

    create_repos_table(pool).await?;
    create_change_requests_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_repos_table(pool: &SqlitePool) -> Result<()> {
    debug!("Creating repos table");
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS repos (
            repo_id INTEGER PRIMARY KEY,
            repo_name TEXT NOT NULL,
            repo_org TEXT NOT NULL,
            UNIQUE(repo_org, repo_name)
        )
    "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_change_requests_table(pool: &SqlitePool) -> Result<()> {
    debug!("Creating change_requests table");
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS change_requests (
            change_request_id INTEGER PRIMARY KEY,
            repo_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            closed_at TEXT NULL,
            FOREIGN KEY (repo_id) REFERENCES repos(repo_id) ON DELETE CASCADE
        )
    "#,
    )
    .execute(pool)
    .await?;

    // The per-selection query filters on repo_id and orders by creation time.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_change_requests_repo_created
         ON change_requests(repo_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_database_info(pool: &SqlitePool) -> Result<String> {
    let row = sqlx::query("SELECT sqlite_version() as version")
        .fetch_one(pool)
        .await?;

    let version: String = row.get("version");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to connect to test database")
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_database_info_reports_version() {
        let pool = memory_pool().await;
        let version = get_database_info(&pool).await.unwrap();
        assert!(!version.is_empty());
    }
}
