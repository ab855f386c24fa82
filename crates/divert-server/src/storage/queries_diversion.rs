//! Diversion subsystem queries: traffic records and rewrite rules.

use divert_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::filter::{self, ListFilter};
use super::models::{DivertRule, DivertedTraffic};

/// Parameters for recording an observed traffic event.
#[derive(Debug, Clone)]
pub struct TrafficParams {
    pub source_ip: String,
    pub destination: String,
    pub user_agent: Option<String>,
    pub processed_by: Option<i64>,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct RuleParams {
    pub name: String,
    pub source_pattern: String,
    pub destination: String,
    pub priority: i64,
    pub is_active: bool,
}

impl Database {
    // =========================================================================
    // Traffic queries
    // =========================================================================

    /// Record a traffic event. The timestamp is set here and never updated.
    pub async fn record_traffic(
        &self,
        params: &TrafficParams,
    ) -> Result<DivertedTraffic, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO diverted_traffic (source_ip, destination, timestamp, user_agent, processed_by, status) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&params.source_ip)
        .bind(&params.destination)
        .bind(unix_timestamp())
        .bind(params.user_agent.as_deref())
        .bind(params.processed_by)
        .bind(&params.status)
        .execute(self.pool())
        .await?;

        self.get_traffic(result.last_insert_rowid()).await
    }

    pub async fn get_traffic(&self, id: i64) -> Result<DivertedTraffic, DatabaseError> {
        sqlx::query_as::<_, DivertedTraffic>("SELECT * FROM diverted_traffic WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Traffic record {id}")))
    }

    /// Correct a traffic record. The recorded timestamp stays.
    pub async fn update_traffic(
        &self,
        id: i64,
        params: &TrafficParams,
    ) -> Result<DivertedTraffic, DatabaseError> {
        let result = sqlx::query(
            "UPDATE diverted_traffic SET source_ip = ?, destination = ?, user_agent = ?, processed_by = ?, status = ? WHERE id = ?",
        )
        .bind(&params.source_ip)
        .bind(&params.destination)
        .bind(params.user_agent.as_deref())
        .bind(params.processed_by)
        .bind(&params.status)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Traffic record {id}")));
        }
        self.get_traffic(id).await
    }

    pub async fn delete_traffic(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM diverted_traffic WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List traffic records, newest first.
    pub async fn list_traffic(
        &self,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DivertedTraffic>, DatabaseError> {
        self.fetch_matching(&filter::TRAFFIC, filter, limit, offset)
            .await
    }

    pub async fn count_traffic(&self, filter: &ListFilter) -> Result<i64, DatabaseError> {
        self.count_matching(&filter::TRAFFIC, filter).await
    }

    // =========================================================================
    // Rule queries
    // =========================================================================

    pub async fn create_rule(
        &self,
        params: &RuleParams,
        created_by: Option<i64>,
    ) -> Result<DivertRule, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO divert_rules (name, source_pattern, destination, priority, is_active, created_at, updated_at, created_by) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&params.name)
        .bind(&params.source_pattern)
        .bind(&params.destination)
        .bind(params.priority)
        .bind(params.is_active)
        .bind(now)
        .bind(now)
        .bind(created_by)
        .execute(self.pool())
        .await?;

        self.get_rule(result.last_insert_rowid()).await
    }

    pub async fn get_rule(&self, id: i64) -> Result<DivertRule, DatabaseError> {
        sqlx::query_as::<_, DivertRule>("SELECT * FROM divert_rules WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Rule {id}")))
    }

    /// Overwrite a rule. `created_by` is kept from creation.
    pub async fn update_rule(
        &self,
        id: i64,
        params: &RuleParams,
    ) -> Result<DivertRule, DatabaseError> {
        let result = sqlx::query(
            "UPDATE divert_rules SET name = ?, source_pattern = ?, destination = ?, priority = ?, is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&params.name)
        .bind(&params.source_pattern)
        .bind(&params.destination)
        .bind(params.priority)
        .bind(params.is_active)
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Rule {id}")));
        }
        self.get_rule(id).await
    }

    pub async fn delete_rule(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM divert_rules WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List rules by priority (highest first), then name.
    pub async fn list_rules(
        &self,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DivertRule>, DatabaseError> {
        self.fetch_matching(&filter::RULES, filter, limit, offset)
            .await
    }

    pub async fn count_rules(&self, filter: &ListFilter) -> Result<i64, DatabaseError> {
        self.count_matching(&filter::RULES, filter).await
    }
}
