use crate::{
    model::{Item, ItemPatch, ItemStatus, Swap, SwapStatus, User},
    ItemId, Result, SwapId, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqliteRow, Row, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::from_str(database_url)
                .map_err(sqlx::Error::from)?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal),
        )
        .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT,
                points INTEGER NOT NULL DEFAULT 0,
                swaps_completed INTEGER NOT NULL DEFAULT 0,
                impact_score INTEGER NOT NULL DEFAULT 0,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                category TEXT,
                size TEXT,
                condition TEXT,
                tags TEXT,
                points INTEGER,
                status TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS swaps (
                id TEXT PRIMARY KEY,
                item_id TEXT NOT NULL,
                requester_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                status TEXT NOT NULL,
                message TEXT,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE,
                FOREIGN KEY (requester_id) REFERENCES users(id),
                FOREIGN KEY (owner_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner_id);
            CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);
            CREATE INDEX IF NOT EXISTS idx_swaps_item ON swaps(item_id);
            CREATE INDEX IF NOT EXISTS idx_swaps_requester ON swaps(requester_id);
            CREATE INDEX IF NOT EXISTS idx_swaps_owner ON swaps(owner_id);
            CREATE INDEX IF NOT EXISTS idx_swaps_status ON swaps(status);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    // users

    /// Insert a user row for a known principal if one does not exist yet.
    /// The identity provider owns identity; this is the local projection
    /// that the reward ledger mutates.
    pub async fn ensure_user(&self, user_id: UserId, is_admin: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, points, swaps_completed, impact_score, is_admin, created_at)
            VALUES (?, 0, 0, 0, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(user_id.to_string())
        .bind(is_admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, points, swaps_completed, impact_score, is_admin, created_at
            FROM users WHERE id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, points, swaps_completed, impact_score, is_admin, created_at
            FROM users ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    // items

    pub async fn create_item(&self, item: &Item) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, owner_id, title, description, category, size, condition, tags, points, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.owner_id.to_string())
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.size)
        .bind(&item.condition)
        .bind(&item.tags)
        .bind(item.points)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, category, size, condition, tags, points, status, created_at
            FROM items WHERE id = ?
            "#,
        )
        .bind(item_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| item_from_row(&row)).transpose()
    }

    pub async fn list_items_by_status(
        &self,
        status: ItemStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, category, size, condition, tags, points, status, created_at
            FROM items WHERE status = ? ORDER BY created_at DESC, id LIMIT ? OFFSET ?
            "#,
        )
        .bind(status.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    pub async fn items_for_owner(&self, owner_id: UserId) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, category, size, condition, tags, points, status, created_at
            FROM items WHERE owner_id = ? ORDER BY created_at DESC, id
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Apply an owner patch. Only the allow-listed fields of [`ItemPatch`]
    /// are reachable here; absent fields keep their stored value.
    pub async fn update_item(&self, item_id: ItemId, patch: &ItemPatch) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE items SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                size = COALESCE(?, size),
                condition = COALESCE(?, condition),
                tags = COALESCE(?, tags),
                points = COALESCE(?, points)
            WHERE id = ?
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.category)
        .bind(&patch.size)
        .bind(&patch.condition)
        .bind(&patch.tags)
        .bind(patch.points)
        .bind(item_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_item_status(&self, item_id: ItemId, status: ItemStatus) -> Result<()> {
        sqlx::query("UPDATE items SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(item_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_item(&self, item_id: ItemId) -> Result<()> {
        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(item_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count_pending_swaps_for_item(&self, item_id: ItemId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM swaps WHERE item_id = ? AND status = ?")
            .bind(item_id.to_string())
            .bind(SwapStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("n"))
    }

    // swaps

    pub async fn create_swap(&self, swap: &Swap) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO swaps (id, item_id, requester_id, owner_id, status, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(swap.id.to_string())
        .bind(swap.item_id.to_string())
        .bind(swap.requester_id.to_string())
        .bind(swap.owner_id.to_string())
        .bind(swap.status.as_str())
        .bind(&swap.message)
        .bind(swap.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_swap(&self, swap_id: SwapId) -> Result<Option<Swap>> {
        let row = sqlx::query(
            r#"
            SELECT id, item_id, requester_id, owner_id, status, message, created_at
            FROM swaps WHERE id = ?
            "#,
        )
        .bind(swap_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| swap_from_row(&row)).transpose()
    }

    /// All swaps the user participates in, on either side. Order is
    /// newest-first with the id as tiebreaker so it stays stable.
    pub async fn swaps_for_user(&self, user_id: UserId) -> Result<Vec<Swap>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, requester_id, owner_id, status, message, created_at
            FROM swaps WHERE requester_id = ? OR owner_id = ?
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(swap_from_row).collect()
    }

    pub async fn swap_history_for_user(&self, user_id: UserId) -> Result<Vec<Swap>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, requester_id, owner_id, status, message, created_at
            FROM swaps WHERE (requester_id = ? OR owner_id = ?) AND status != ?
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .bind(SwapStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(swap_from_row).collect()
    }

    // transactional primitives for the decide path

    /// Move a swap out of `pending` with an optimistic guard on the current
    /// status. Returns false when another decision already won, in which
    /// case the caller must roll back.
    pub async fn decide_swap_if_pending(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        swap_id: SwapId,
        status: SwapStatus,
        message: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE swaps SET status = ?, message = COALESCE(?, message)
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(status.as_str())
        .bind(message)
        .bind(swap_id.to_string())
        .bind(SwapStatus::Pending.as_str())
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Claim an item for an accepted swap by flipping it to `swapped`,
    /// guarded against items that are already swapped away. Returns false
    /// when another acceptance claimed the item first, in which case the
    /// caller must roll back.
    pub async fn mark_item_swapped_if_unclaimed(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        item_id: ItemId,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE items SET status = ? WHERE id = ? AND status != ?")
            .bind(ItemStatus::Swapped.as_str())
            .bind(item_id.to_string())
            .bind(ItemStatus::Swapped.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: UserId::parse_str(&row.get::<String, _>("id"))?,
        email: row.get::<Option<String>, _>("email"),
        points: row.get::<i64, _>("points"),
        swaps_completed: row.get::<i64, _>("swaps_completed"),
        impact_score: row.get::<i64, _>("impact_score"),
        is_admin: row.get::<bool, _>("is_admin"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn item_from_row(row: &SqliteRow) -> Result<Item> {
    Ok(Item {
        id: ItemId::parse_str(&row.get::<String, _>("id"))?,
        owner_id: UserId::parse_str(&row.get::<String, _>("owner_id"))?,
        title: row.get::<String, _>("title"),
        description: row.get::<Option<String>, _>("description"),
        category: row.get::<Option<String>, _>("category"),
        size: row.get::<Option<String>, _>("size"),
        condition: row.get::<Option<String>, _>("condition"),
        tags: row.get::<Option<String>, _>("tags"),
        points: row.get::<Option<i64>, _>("points"),
        status: ItemStatus::parse(&row.get::<String, _>("status"))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn swap_from_row(row: &SqliteRow) -> Result<Swap> {
    Ok(Swap {
        id: SwapId::parse_str(&row.get::<String, _>("id"))?,
        item_id: ItemId::parse_str(&row.get::<String, _>("item_id"))?,
        requester_id: UserId::parse_str(&row.get::<String, _>("requester_id"))?,
        owner_id: UserId::parse_str(&row.get::<String, _>("owner_id"))?,
        status: SwapStatus::parse(&row.get::<String, _>("status"))?,
        message: row.get::<Option<String>, _>("message"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}
