use std::time::SystemTime;

use anyhow::Result;
use async_trait::async_trait;
use libsql::params;
use uuid::Uuid;

use super::models::{Destination, Principal, Site, millis_to_timestamp, timestamp_to_millis};
use crate::pool::{LibsqlManager, LibsqlPool};

const SITE_COLUMNS: &str = "id, uuid, url, user_id, chat_id, thread_id, interval_minutes, \
                            last_check, is_active, created_at, updated_at";

const PRINCIPAL_COLUMNS: &str =
    "id, user_id, chat_id, thread_id, is_active, daily_digest, created_at, updated_at";

/// Store trait for abstracting persistence of sites and principals.
///
/// The sweep and the command handlers only ever talk to this trait, so
/// tests can substitute an in-memory fake.
#[async_trait]
pub trait Store: Send + Sync {
    /// All sites eligible for monitoring. The sweep's hot read path.
    async fn list_active(&self) -> Result<Vec<Site>>;

    /// Active sites registered in one chat.
    async fn list_active_for_chat(&self, chat_id: i64) -> Result<Vec<Site>>;

    async fn create_site(&self, site: &Site) -> Result<i64>;

    /// Soft-delete matching sites. A no-op when nothing matches.
    async fn deactivate_site(&self, url: &str, chat_id: i64) -> Result<()>;

    /// Persist the time of a probe attempt for exactly one site,
    /// touching no other column.
    async fn record_check(&self, uuid: Uuid, at: SystemTime) -> Result<()>;

    /// Insert a principal or refresh an existing `(user_id, chat_id)` row.
    async fn upsert_principal(&self, principal: &Principal) -> Result<()>;

    async fn set_daily_digest(
        &self,
        user_id: i64,
        destination: Destination,
        enabled: bool,
    ) -> Result<()>;

    /// Active principals that asked for the daily digest.
    async fn list_digest_principals(&self) -> Result<Vec<Principal>>;
}

/// LibSQL-backed store implementation.
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

fn site_from_row(row: &libsql::Row) -> Result<Site> {
    let uuid_str: String = row.get(1)?;

    Ok(Site {
        id: Some(row.get(0)?),
        uuid: Uuid::parse_str(&uuid_str)?,
        url: row.get(2)?,
        user_id: row.get(3)?,
        chat_id: row.get(4)?,
        thread_id: row.get::<Option<i64>>(5)?,
        interval_minutes: row.get::<i64>(6)? as u32,
        last_check: millis_to_timestamp(row.get(7)?),
        is_active: row.get::<i64>(8)? != 0,
        created_at: millis_to_timestamp(row.get(9)?),
        updated_at: millis_to_timestamp(row.get(10)?),
    })
}

fn principal_from_row(row: &libsql::Row) -> Result<Principal> {
    Ok(Principal {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        chat_id: row.get(2)?,
        thread_id: row.get::<Option<i64>>(3)?,
        is_active: row.get::<i64>(4)? != 0,
        daily_digest: row.get::<i64>(5)? != 0,
        created_at: millis_to_timestamp(row.get(6)?),
        updated_at: millis_to_timestamp(row.get(7)?),
    })
}

#[async_trait]
impl Store for LibsqlStore {
    async fn list_active(&self) -> Result<Vec<Site>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE is_active = 1"))
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut sites = Vec::new();
        while let Some(row) = rows.next().await? {
            sites.push(site_from_row(&row)?);
        }

        Ok(sites)
    }

    async fn list_active_for_chat(&self, chat_id: i64) -> Result<Vec<Site>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SITE_COLUMNS} FROM sites WHERE chat_id = ? AND is_active = 1"
            ))
            .await?;

        let mut rows = stmt.query(params![chat_id]).await?;
        let mut sites = Vec::new();
        while let Some(row) = rows.next().await? {
            sites.push(site_from_row(&row)?);
        }

        Ok(sites)
    }

    async fn create_site(&self, site: &Site) -> Result<i64> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO sites (uuid, url, user_id, chat_id, thread_id, interval_minutes, \
             last_check, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                site.uuid.to_string(),
                site.url.clone(),
                site.user_id,
                site.chat_id,
                site.thread_id,
                site.interval_minutes as i64,
                timestamp_to_millis(site.last_check),
                if site.is_active { 1 } else { 0 },
                timestamp_to_millis(site.created_at),
                timestamp_to_millis(site.updated_at)
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn deactivate_site(&self, url: &str, chat_id: i64) -> Result<()> {
        let conn = self.get_conn().await?;
        let now = timestamp_to_millis(SystemTime::now());

        conn.execute(
            "UPDATE sites SET is_active = 0, updated_at = ? \
             WHERE url = ? AND chat_id = ? AND is_active = 1",
            params![now, url, chat_id],
        )
        .await?;

        Ok(())
    }

    async fn record_check(&self, uuid: Uuid, at: SystemTime) -> Result<()> {
        let conn = self.get_conn().await?;

        conn.execute(
            "UPDATE sites SET last_check = ? WHERE uuid = ?",
            params![timestamp_to_millis(at), uuid.to_string()],
        )
        .await?;

        Ok(())
    }

    async fn upsert_principal(&self, principal: &Principal) -> Result<()> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO principals (user_id, chat_id, thread_id, is_active, daily_digest, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, chat_id) DO UPDATE SET \
             thread_id = excluded.thread_id, is_active = 1, updated_at = excluded.updated_at",
            params![
                principal.user_id,
                principal.chat_id,
                principal.thread_id,
                if principal.is_active { 1 } else { 0 },
                if principal.daily_digest { 1 } else { 0 },
                timestamp_to_millis(principal.created_at),
                timestamp_to_millis(principal.updated_at)
            ],
        )
        .await?;

        Ok(())
    }

    async fn set_daily_digest(
        &self,
        user_id: i64,
        destination: Destination,
        enabled: bool,
    ) -> Result<()> {
        let conn = self.get_conn().await?;
        let now = timestamp_to_millis(SystemTime::now());

        conn.execute(
            "INSERT INTO principals (user_id, chat_id, thread_id, is_active, daily_digest, \
             created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?, ?) \
             ON CONFLICT (user_id, chat_id) DO UPDATE SET \
             daily_digest = excluded.daily_digest, thread_id = excluded.thread_id, \
             updated_at = excluded.updated_at",
            params![
                user_id,
                destination.chat_id,
                destination.thread_id,
                if enabled { 1 } else { 0 },
                now,
                now
            ],
        )
        .await?;

        Ok(())
    }

    async fn list_digest_principals(&self) -> Result<Vec<Principal>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PRINCIPAL_COLUMNS} FROM principals \
                 WHERE daily_digest = 1 AND is_active = 1"
            ))
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut principals = Vec::new();
        while let Some(row) = rows.next().await? {
            principals.push(principal_from_row(&row)?);
        }

        Ok(principals)
    }
}
