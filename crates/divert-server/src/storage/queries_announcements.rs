//! Announcement queries.

use divert_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::filter::{self, ListFilter};
use super::models::Announcement;

#[derive(Debug, Clone)]
pub struct AnnouncementParams {
    pub title: String,
    pub content: String,
    pub is_active: bool,
}

impl Database {
    pub async fn create_announcement(
        &self,
        params: &AnnouncementParams,
    ) -> Result<Announcement, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO announcements (title, content, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.is_active)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_announcement(result.last_insert_rowid()).await
    }

    pub async fn get_announcement(&self, id: i64) -> Result<Announcement, DatabaseError> {
        sqlx::query_as::<_, Announcement>("SELECT * FROM announcements WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Announcement {id}")))
    }

    /// Overwrite an announcement and bump `updated_at`.
    pub async fn update_announcement(
        &self,
        id: i64,
        params: &AnnouncementParams,
    ) -> Result<Announcement, DatabaseError> {
        let result = sqlx::query(
            "UPDATE announcements SET title = ?, content = ?, is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.is_active)
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Announcement {id}")));
        }
        self.get_announcement(id).await
    }

    pub async fn delete_announcement(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active announcements, newest first, for the home page.
    pub async fn active_announcements(&self) -> Result<Vec<Announcement>, DatabaseError> {
        let rows = sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements WHERE is_active = 1 ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn list_announcements(
        &self,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Announcement>, DatabaseError> {
        self.fetch_matching(&filter::ANNOUNCEMENTS, filter, limit, offset)
            .await
    }

    pub async fn count_announcements(&self, filter: &ListFilter) -> Result<i64, DatabaseError> {
        self.count_matching(&filter::ANNOUNCEMENTS, filter).await
    }
}
