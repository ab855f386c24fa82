//! Link queries.

use divert_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::filter::{self, ListFilter};
use super::models::Link;

/// Form-editable link fields.
#[derive(Debug, Clone)]
pub struct LinkParams {
    pub work_order_id: Option<i64>,
    pub country: String,
    pub identifier: String,
    pub description: String,
    pub status: i64,
}

impl Database {
    // =========================================================================
    // Link queries
    // =========================================================================

    /// Create a link without any quota check.
    pub async fn create_link(
        &self,
        owner_id: i64,
        params: &LinkParams,
    ) -> Result<Link, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO links (owner_id, work_order_id, country, identifier, description, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(params.work_order_id)
        .bind(&params.country)
        .bind(&params.identifier)
        .bind(&params.description)
        .bind(params.status)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_link(result.last_insert_rowid()).await
    }

    /// Create a link only while the owner holds fewer than `quota` links.
    ///
    /// The count and the insert are one statement, so concurrent creations
    /// cannot both slip under the quota. Returns `None` when the quota is full.
    pub async fn create_link_within_quota(
        &self,
        owner_id: i64,
        quota: i64,
        params: &LinkParams,
    ) -> Result<Option<Link>, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO links (owner_id, work_order_id, country, identifier, description, status, created_at) \
             SELECT ?, ?, ?, ?, ?, ?, ? \
             WHERE (SELECT COUNT(*) FROM links WHERE owner_id = ?) < ?",
        )
        .bind(owner_id)
        .bind(params.work_order_id)
        .bind(&params.country)
        .bind(&params.identifier)
        .bind(&params.description)
        .bind(params.status)
        .bind(unix_timestamp())
        .bind(owner_id)
        .bind(quota)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_link(result.last_insert_rowid()).await.map(Some)
    }

    /// Get a link by ID.
    pub async fn get_link(&self, id: i64) -> Result<Link, DatabaseError> {
        sqlx::query_as::<_, Link>("SELECT * FROM links WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Link {id}")))
    }

    /// Overwrite the form-editable fields. The owner never changes.
    pub async fn update_link(&self, id: i64, params: &LinkParams) -> Result<Link, DatabaseError> {
        let result = sqlx::query(
            "UPDATE links SET work_order_id = ?, country = ?, identifier = ?, description = ?, status = ? WHERE id = ?",
        )
        .bind(params.work_order_id)
        .bind(&params.country)
        .bind(&params.identifier)
        .bind(&params.description)
        .bind(params.status)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Link {id}")));
        }
        self.get_link(id).await
    }

    /// Overwrite the form-editable fields and the owner in one statement.
    pub async fn update_link_with_owner(
        &self,
        id: i64,
        owner_id: i64,
        params: &LinkParams,
    ) -> Result<Link, DatabaseError> {
        let result = sqlx::query(
            "UPDATE links SET owner_id = ?, work_order_id = ?, country = ?, identifier = ?, description = ?, status = ? WHERE id = ?",
        )
        .bind(owner_id)
        .bind(params.work_order_id)
        .bind(&params.country)
        .bind(&params.identifier)
        .bind(&params.description)
        .bind(params.status)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Link {id}")));
        }
        self.get_link(id).await
    }

    pub async fn set_link_status(&self, id: i64, status: i64) -> Result<Link, DatabaseError> {
        sqlx::query("UPDATE links SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(self.pool())
            .await?;
        self.get_link(id).await
    }

    /// Delete a link; numbers referencing it keep existing with a null link.
    pub async fn delete_link(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of links an account owns, for quota checks.
    pub async fn count_links_owned(&self, owner_id: i64) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM links WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool())
            .await?;
        Ok(row.0)
    }

    /// Whether another link already uses `identifier`.
    pub async fn link_identifier_taken(
        &self,
        identifier: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM links WHERE identifier = ? AND id IS NOT ?")
                .bind(identifier)
                .bind(exclude_id)
                .fetch_one(self.pool())
                .await?;
        Ok(row.0 > 0)
    }

    /// All links of one account, oldest first (form choices).
    pub async fn links_owned_by(&self, owner_id: i64) -> Result<Vec<Link>, DatabaseError> {
        let links = sqlx::query_as::<_, Link>("SELECT * FROM links WHERE owner_id = ? ORDER BY id")
            .bind(owner_id)
            .fetch_all(self.pool())
            .await?;
        Ok(links)
    }

    /// List links matching `filter`, newest first.
    pub async fn list_links(
        &self,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, DatabaseError> {
        self.fetch_matching(&filter::LINKS, filter, limit, offset)
            .await
    }

    pub async fn count_links(&self, filter: &ListFilter) -> Result<i64, DatabaseError> {
        self.count_matching(&filter::LINKS, filter).await
    }
}
