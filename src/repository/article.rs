//! Diesel-based article store for SQLite.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{ArticleRecord, NewArticle};
use super::pool::{DbError, SqlitePool};
use super::ArticleStore;
use crate::models::Article;
use crate::schema::articles;

#[derive(Clone)]
pub struct DieselArticleRepository {
    pool: SqlitePool,
}

impl DieselArticleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for DieselArticleRepository {
    async fn find_by_guid(&self, guid: &str) -> Result<Option<Article>, DbError> {
        let mut conn = self.pool.get().await?;

        articles::table
            .filter(articles::guid.eq(guid))
            .select(ArticleRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Article::from))
    }

    async fn find_by_link(&self, link: &str) -> Result<Option<Article>, DbError> {
        let mut conn = self.pool.get().await?;

        articles::table
            .filter(articles::link.eq(link))
            .select(ArticleRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Article::from))
    }

    async fn insert(&self, article: &Article) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(articles::table)
            .values(NewArticle::from(article))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn count(&self) -> Result<usize, DbError> {
        let mut conn = self.pool.get().await?;

        let count: i64 = articles::table.count().get_result(&mut conn).await?;
        Ok(count.max(0) as usize)
    }
}
