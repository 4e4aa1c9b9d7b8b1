use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::serp::ExtractedResult;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RankingResultRow {
    pub keyword: String,
    pub position: Option<i32>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SerpFeatureRow {
    pub keyword: String,
    pub result_type: String,
    pub position: Option<i32>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub domain: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// One organic history row per keyword per check; `position` stays null when
/// the tracked domain was not found.
pub async fn insert_ranking_result(
    pool: &PgPool,
    project_id: i32,
    keyword: &str,
    position: Option<i32>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        insert into ranking_results
            (project_id, keyword, position)
        values
            ($1, $2, $3)
        ",
    )
    .bind(project_id)
    .bind(keyword)
    .bind(position)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_serp_features(
    pool: &PgPool,
    project_id: i32,
    keyword: &str,
    results: &[ExtractedResult],
) -> Result<(), sqlx::Error> {
    for result in results {
        sqlx::query(
            r"
            insert into serp_features
                (project_id, keyword, result_type, position, url, title, snippet, domain)
            values
                ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(project_id)
        .bind(keyword)
        .bind(result.category.as_str())
        .bind(result.position as i32)
        .bind(&result.url)
        .bind(&result.title)
        .bind(&result.snippet)
        .bind(&result.domain)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn get_ranking_history(
    pool: &PgPool,
    project_id: i32,
    days: i32,
) -> Result<Vec<RankingResultRow>, sqlx::Error> {
    sqlx::query_as::<_, RankingResultRow>(
        r"
        select
            keyword, position, checked_at
        from
            ranking_results
        where
            project_id = $1
            and checked_at > now() - make_interval(days => $2)
        order by
            checked_at desc, keyword
        ",
    )
    .bind(project_id)
    .bind(days)
    .fetch_all(pool)
    .await
}

/// All features recorded by the most recent check of the project.
pub async fn get_latest_serp_features(
    pool: &PgPool,
    project_id: i32,
) -> Result<Vec<SerpFeatureRow>, sqlx::Error> {
    sqlx::query_as::<_, SerpFeatureRow>(
        r"
        select
            keyword, result_type, position, url, title, snippet, domain, checked_at
        from
            serp_features
        where
            project_id = $1
            and checked_at = (
                select max(checked_at) from serp_features where project_id = $1
            )
        order by
            result_type, position
        ",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}
