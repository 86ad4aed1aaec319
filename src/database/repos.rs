use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::DbPool;

/// One tracked repository as shown in the picker.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Repo {
    pub repo_id: i64,
    pub repo_name: String,
    pub repo_org: String,
}

impl Repo {
    pub async fn create(pool: &DbPool, repo_id: i64, org: &str, name: &str) -> Result<Repo> {
        let repo = sqlx::query_as::<_, Repo>(
            r#"
            INSERT INTO repos (repo_id, repo_name, repo_org)
            VALUES (?1, ?2, ?3)
            RETURNING repo_id, repo_name, repo_org
        "#,
        )
        .bind(repo_id)
        .bind(name)
        .bind(org)
        .fetch_one(pool)
        .await?;

        Ok(repo)
    }

    pub async fn list_all(pool: &DbPool) -> Result<Vec<Repo>> {
        let repos = sqlx::query_as::<_, Repo>(
            r#"
            SELECT repo_id, repo_name, repo_org
            FROM repos
            ORDER BY repo_org, repo_name
        "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(repos)
    }
}

/// Picker options loaded once at startup, mirroring the store at that point
/// in time. Repositories added later appear after a restart.
pub struct RepoCatalog {
    options: Vec<Repo>,
}

impl RepoCatalog {
    pub async fn load(pool: &DbPool) -> Result<Self> {
        let options = Repo::list_all(pool).await?;
        info!("Loaded {} repositories into the picker catalog", options.len());
        Ok(Self { options })
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Case-insensitive substring match against "org/name". An empty term
    /// returns the full catalog.
    pub fn search(&self, term: &str) -> Vec<Repo> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.options.clone();
        }
        self.options
            .iter()
            .filter(|repo| {
                format!("{}/{}", repo.repo_org, repo.repo_name)
                    .to_lowercase()
                    .contains(&needle)
            })
            .cloned()
            .collect()
    }
}
