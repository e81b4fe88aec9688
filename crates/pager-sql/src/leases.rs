/// Create lease `key` holding `value`, unless an unexpired lease already
/// exists. Returns true iff this call created the lease. A created lease
/// has no expiry until `expire` is called.
pub async fn create_if_absent(key: &str, value: &str, pool: &sqlx::PgPool) -> sqlx::Result<bool> {
    let mut txn = pool.begin().await?;

    sqlx::query("delete from pager_leases where key = $1 and expires_at < now()")
        .bind(key)
        .execute(&mut txn)
        .await?;

    let created = sqlx::query(
        r#"
        insert into pager_leases (key, value) values ($1, $2)
        on conflict (key) do nothing
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(&mut txn)
    .await?
    .rows_affected()
        == 1;

    txn.commit().await?;
    Ok(created)
}

/// Set the lease `key` to expire `ttl` from now. A missing lease is ignored.
pub async fn expire(key: &str, ttl: std::time::Duration, pool: &sqlx::PgPool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        update pager_leases
        set expires_at = now() + make_interval(secs => $2)
        where key = $1
        "#,
    )
    .bind(key)
    .bind(ttl.as_secs_f64())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the lease `key`, whether or not it exists.
pub async fn delete(key: &str, pool: &sqlx::PgPool) -> sqlx::Result<()> {
    sqlx::query("delete from pager_leases where key = $1")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}
