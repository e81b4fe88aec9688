use serde_json::value::RawValue;
use sqlx::types::Json as SqlJson;

/// Remove and return the oldest item of `queue`, or None if it's empty.
/// Concurrent poppers never observe the same item.
pub async fn pop(queue: &str, pool: &sqlx::PgPool) -> sqlx::Result<Option<Box<RawValue>>> {
    let popped: Option<(SqlJson<Box<RawValue>>,)> = sqlx::query_as(
        r#"
        delete from pager_queue
        where id = (
            select id from pager_queue
            where queue = $1
            order by id asc
            limit 1
            for update skip locked
        )
        returning body
        "#,
    )
    .bind(queue)
    .fetch_optional(pool)
    .await?;

    Ok(popped.map(|(SqlJson(body),)| body))
}

/// Append `body` to `queue` and notify listeners of the queue's channel.
pub async fn push(queue: &str, body: &RawValue, pool: &sqlx::PgPool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        with pushed as (
            insert into pager_queue (queue, body) values ($1, $2)
            returning id
        )
        select pg_notify($1, '') from pushed
        "#,
    )
    .bind(queue)
    .bind(SqlJson(body))
    .execute(pool)
    .await?;

    Ok(())
}

/// Begin listening for pushes to `queue`. Pushes which happen after this
/// returns are delivered to the returned listener.
pub async fn listen(queue: &str, pool: &sqlx::PgPool) -> sqlx::Result<sqlx::postgres::PgListener> {
    let mut listener = sqlx::postgres::PgListener::connect_with(pool).await?;
    listener.listen(queue).await?;
    Ok(listener)
}
