//! Number queries.

use divert_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::filter::{self, ListFilter};
use super::models::Number;

/// Form-editable number fields. The counters are maintained elsewhere.
#[derive(Debug, Clone)]
pub struct NumberParams {
    pub work_order_id: Option<i64>,
    pub link_id: Option<i64>,
    pub number_type: i64,
    pub num: String,
    pub status: i64,
}

impl Database {
    // =========================================================================
    // Number queries
    // =========================================================================

    pub async fn create_number(
        &self,
        owner_id: i64,
        params: &NumberParams,
    ) -> Result<Number, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO numbers (owner_id, work_order_id, link_id, number_type, num, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(params.work_order_id)
        .bind(params.link_id)
        .bind(params.number_type)
        .bind(&params.num)
        .bind(params.status)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_number(result.last_insert_rowid()).await
    }

    pub async fn get_number(&self, id: i64) -> Result<Number, DatabaseError> {
        sqlx::query_as::<_, Number>("SELECT * FROM numbers WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Number {id}")))
    }

    pub async fn update_number(
        &self,
        id: i64,
        params: &NumberParams,
    ) -> Result<Number, DatabaseError> {
        let result = sqlx::query(
            "UPDATE numbers SET work_order_id = ?, link_id = ?, number_type = ?, num = ?, status = ? WHERE id = ?",
        )
        .bind(params.work_order_id)
        .bind(params.link_id)
        .bind(params.number_type)
        .bind(&params.num)
        .bind(params.status)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Number {id}")));
        }
        self.get_number(id).await
    }

    pub async fn update_number_with_owner(
        &self,
        id: i64,
        owner_id: i64,
        params: &NumberParams,
    ) -> Result<Number, DatabaseError> {
        let result = sqlx::query(
            "UPDATE numbers SET owner_id = ?, work_order_id = ?, link_id = ?, number_type = ?, num = ?, status = ? WHERE id = ?",
        )
        .bind(owner_id)
        .bind(params.work_order_id)
        .bind(params.link_id)
        .bind(params.number_type)
        .bind(&params.num)
        .bind(params.status)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Number {id}")));
        }
        self.get_number(id).await
    }

    pub async fn set_number_status(&self, id: i64, status: i64) -> Result<Number, DatabaseError> {
        sqlx::query("UPDATE numbers SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(self.pool())
            .await?;
        self.get_number(id).await
    }

    pub async fn delete_number(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM numbers WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List numbers matching `filter`, newest first.
    pub async fn list_numbers(
        &self,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Number>, DatabaseError> {
        self.fetch_matching(&filter::NUMBERS, filter, limit, offset)
            .await
    }

    pub async fn count_numbers(&self, filter: &ListFilter) -> Result<i64, DatabaseError> {
        self.count_matching(&filter::NUMBERS, filter).await
    }
}
