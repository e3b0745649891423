use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{AnnouncementCursor, CursorPage, PageRequest},
    application::repos::{
        AnnouncementsRepo, AnnouncementsWriteRepo, CreateAnnouncementParams, RepoError,
        UpdateAnnouncementParams,
    },
    domain::announcements::{AnnouncementRecord, normalize_images},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AnnouncementRow {
    id: Uuid,
    text: String,
    images: Option<Vec<String>>,
    date: OffsetDateTime,
}

impl From<AnnouncementRow> for AnnouncementRecord {
    fn from(row: AnnouncementRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            images: row.images.and_then(normalize_images),
            date: row.date,
        }
    }
}

#[async_trait]
impl AnnouncementsRepo for PostgresRepositories {
    async fn list_announcements(
        &self,
        page: PageRequest<AnnouncementCursor>,
    ) -> Result<CursorPage<AnnouncementRecord>, RepoError> {
        let limit = page.limit.clamp(1, 100) as i64;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, text, images, date FROM announcements",
        );
        if let Some(cursor) = page.cursor {
            qb.push(" WHERE (date, id) < (");
            qb.push_bind(cursor.date());
            qb.push(", ");
            qb.push_bind(cursor.id());
            qb.push(")");
        }
        qb.push(" ORDER BY date DESC, id DESC LIMIT ");
        qb.push_bind(limit + 1);

        let mut rows: Vec<AnnouncementRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }

        let next_cursor = if has_more {
            rows.last()
                .map(|row| AnnouncementCursor::new(row.date, row.id).encode())
        } else {
            None
        };

        let items = rows.into_iter().map(AnnouncementRecord::from).collect();
        Ok(CursorPage::new(items, next_cursor))
    }

    async fn find_announcement(&self, id: Uuid) -> Result<Option<AnnouncementRecord>, RepoError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            "SELECT id, text, images, date FROM announcements WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AnnouncementRecord::from))
    }
}

#[async_trait]
impl AnnouncementsWriteRepo for PostgresRepositories {
    async fn create_announcement(
        &self,
        params: CreateAnnouncementParams,
    ) -> Result<AnnouncementRecord, RepoError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            INSERT INTO announcements (text, images)
            VALUES ($1, $2)
            RETURNING id, text, images, date
            "#,
        )
        .bind(params.text)
        .bind(params.images.and_then(normalize_images))
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_announcement(
        &self,
        params: UpdateAnnouncementParams,
    ) -> Result<AnnouncementRecord, RepoError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            UPDATE announcements
            SET text = $2, images = $3
            WHERE id = $1
            RETURNING id, text, images, date
            "#,
        )
        .bind(params.id)
        .bind(params.text)
        .bind(params.images.and_then(normalize_images))
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(AnnouncementRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_announcement(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
