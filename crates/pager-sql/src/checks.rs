use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FailingCheckRow {
    pub entity: String,
    pub check_name: String,
    pub state: String,
    pub scheduled_maintenance_until: Option<DateTime<Utc>>,
    pub unscheduled_maintenance_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub contact_id: String,
    pub contact_name: String,
    pub service_key: Option<String>,
    pub subdomain: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fetch all checks currently in one of `states`, ordered by entity and check.
pub async fn fetch_failing_checks(
    states: &[String],
    pool: &sqlx::PgPool,
) -> sqlx::Result<Vec<FailingCheckRow>> {
    sqlx::query_as::<_, FailingCheckRow>(
        r#"
        select
            entity,
            check_name,
            state,
            scheduled_maintenance_until,
            unscheduled_maintenance_until
        from pager_failing_checks
        where state = any($1)
        order by entity, check_name
        "#,
    )
    .bind(states)
    .fetch_all(pool)
    .await
}

/// Fetch the contacts which own the check `check_name` of `entity`.
pub async fn fetch_contacts(
    entity: &str,
    check_name: &str,
    pool: &sqlx::PgPool,
) -> sqlx::Result<Vec<ContactRow>> {
    sqlx::query_as::<_, ContactRow>(
        r#"
        select
            contact_id,
            contact_name,
            service_key,
            subdomain,
            username,
            password
        from pager_check_contacts
        where entity = $1 and check_name = $2
        order by contact_id
        "#,
    )
    .bind(entity)
    .bind(check_name)
    .fetch_all(pool)
    .await
}
