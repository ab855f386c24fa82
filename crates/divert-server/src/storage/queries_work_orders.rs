//! Work order queries.

use super::db::{Database, DatabaseError};
use super::filter::{self, ListFilter};
use super::models::WorkOrder;

/// Form-editable work order fields. `current_count` is progress, not input.
#[derive(Debug, Clone)]
pub struct WorkOrderParams {
    pub order_type: i64,
    pub name: String,
    pub order_url: String,
    pub start_time: i64,
    pub end_time: i64,
    pub num_type: i64,
    pub all_count: i64,
    pub ratio: i64,
    pub order_acct: String,
    pub order_psw: String,
    pub num_size: i64,
    pub status: i64,
}

impl Database {
    // =========================================================================
    // Work order queries
    // =========================================================================

    pub async fn create_work_order(
        &self,
        owner_id: i64,
        params: &WorkOrderParams,
    ) -> Result<WorkOrder, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO work_orders (owner_id, order_type, name, order_url, start_time, end_time, num_type, all_count, ratio, order_acct, order_psw, num_size, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(params.order_type)
        .bind(&params.name)
        .bind(&params.order_url)
        .bind(params.start_time)
        .bind(params.end_time)
        .bind(params.num_type)
        .bind(params.all_count)
        .bind(params.ratio)
        .bind(&params.order_acct)
        .bind(&params.order_psw)
        .bind(params.num_size)
        .bind(params.status)
        .execute(self.pool())
        .await?;

        self.get_work_order(result.last_insert_rowid()).await
    }

    pub async fn get_work_order(&self, id: i64) -> Result<WorkOrder, DatabaseError> {
        sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Work order {id}")))
    }

    pub async fn update_work_order(
        &self,
        id: i64,
        params: &WorkOrderParams,
    ) -> Result<WorkOrder, DatabaseError> {
        let result = sqlx::query(
            "UPDATE work_orders SET order_type = ?, name = ?, order_url = ?, start_time = ?, end_time = ?, num_type = ?, \
             all_count = ?, ratio = ?, order_acct = ?, order_psw = ?, num_size = ?, status = ? WHERE id = ?",
        )
        .bind(params.order_type)
        .bind(&params.name)
        .bind(&params.order_url)
        .bind(params.start_time)
        .bind(params.end_time)
        .bind(params.num_type)
        .bind(params.all_count)
        .bind(params.ratio)
        .bind(&params.order_acct)
        .bind(&params.order_psw)
        .bind(params.num_size)
        .bind(params.status)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Work order {id}")));
        }
        self.get_work_order(id).await
    }

    pub async fn update_work_order_with_owner(
        &self,
        id: i64,
        owner_id: i64,
        params: &WorkOrderParams,
    ) -> Result<WorkOrder, DatabaseError> {
        let result = sqlx::query(
            "UPDATE work_orders SET owner_id = ?, order_type = ?, name = ?, order_url = ?, start_time = ?, end_time = ?, \
             num_type = ?, all_count = ?, ratio = ?, order_acct = ?, order_psw = ?, num_size = ?, status = ? WHERE id = ?",
        )
        .bind(owner_id)
        .bind(params.order_type)
        .bind(&params.name)
        .bind(&params.order_url)
        .bind(params.start_time)
        .bind(params.end_time)
        .bind(params.num_type)
        .bind(params.all_count)
        .bind(params.ratio)
        .bind(&params.order_acct)
        .bind(&params.order_psw)
        .bind(params.num_size)
        .bind(params.status)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Work order {id}")));
        }
        self.get_work_order(id).await
    }

    pub async fn set_work_order_status(
        &self,
        id: i64,
        status: i64,
    ) -> Result<WorkOrder, DatabaseError> {
        sqlx::query("UPDATE work_orders SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(self.pool())
            .await?;
        self.get_work_order(id).await
    }

    /// Delete a work order; links and numbers referencing it are detached.
    pub async fn delete_work_order(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All work orders of one account, oldest first (form choices).
    pub async fn work_orders_owned_by(
        &self,
        owner_id: i64,
    ) -> Result<Vec<WorkOrder>, DatabaseError> {
        let orders = sqlx::query_as::<_, WorkOrder>(
            "SELECT * FROM work_orders WHERE owner_id = ? ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;
        Ok(orders)
    }

    /// List work orders matching `filter`, newest first.
    pub async fn list_work_orders(
        &self,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkOrder>, DatabaseError> {
        self.fetch_matching(&filter::WORK_ORDERS, filter, limit, offset)
            .await
    }

    pub async fn count_work_orders(&self, filter: &ListFilter) -> Result<i64, DatabaseError> {
        self.count_matching(&filter::WORK_ORDERS, filter).await
    }
}
