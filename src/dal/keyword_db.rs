use sqlx::PgPool;

pub async fn insert_keywords(
    pool: &PgPool,
    project_id: i32,
    keywords: &[String],
) -> Result<(), sqlx::Error> {
    for keyword in keywords {
        sqlx::query(
            r"
            insert into keywords
                (project_id, keyword)
            values
                ($1, $2)
            ",
        )
        .bind(project_id)
        .bind(keyword.trim())
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn get_keywords(pool: &PgPool, project_id: i32) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r"
        select
            keyword
        from
            keywords
        where
            project_id = $1
        order by
            id
        ",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}
