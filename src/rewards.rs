//! Reward accounting for accepted swaps.
//!
//! [`credit`] runs inside the ledger's decide transaction and carries no
//! idempotence check of its own: the `pending`-only guard on the swap
//! status write is what guarantees each participant is credited exactly
//! once per accepted swap.

use crate::{Result, UserId};
use sqlx::{Sqlite, Transaction};

/// Points credited to each participant when the item carries no reward
/// value of its own.
pub const DEFAULT_SWAP_POINTS: i64 = 25;

/// Fixed engagement bump applied per accepted swap.
pub const IMPACT_PER_SWAP: i64 = 10;

/// Credit one participant: `points += points_earned`,
/// `swaps_completed += 1`, `impact_score += IMPACT_PER_SWAP`.
pub async fn credit(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: UserId,
    points_earned: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users SET
            points = points + ?,
            swaps_completed = swaps_completed + 1,
            impact_score = impact_score + ?
        WHERE id = ?
        "#,
    )
    .bind(points_earned)
    .bind(IMPACT_PER_SWAP)
    .bind(user_id.to_string())
    .execute(&mut **tx)
    .await?;

    tracing::debug!("Credited {} points to user {}", points_earned, user_id);
    Ok(())
}
