//! The swap ledger: owns swap requests and enforces the
//! request/accept/reject state machine.
//!
//! [`SwapLedger::transition`] is the single mutating entry point after
//! creation. A swap leaves `pending` exactly once; the optimistic guard
//! on the status write serializes racing decisions, and the reward
//! credits ride the same transaction so a partial failure rolls the whole
//! decision back.

use crate::{
    auth::{self, Action, Principal},
    database::Database,
    error::{Result, SwapError},
    model::{ItemStatus, Swap, SwapStatus},
    rewards, ItemId, SwapId, UserId,
};

/// Policy knobs for the decide path.
#[derive(Debug, Clone, Copy)]
pub struct SwapPolicy {
    /// Fallback reward value for items without one.
    pub default_points: i64,
    /// Flip the item to `swapped` when a swap against it is accepted.
    pub mark_item_swapped: bool,
}

impl Default for SwapPolicy {
    fn default() -> Self {
        Self {
            default_points: rewards::DEFAULT_SWAP_POINTS,
            mark_item_swapped: false,
        }
    }
}

#[derive(Clone)]
pub struct SwapLedger {
    db: Database,
    policy: SwapPolicy,
}

impl SwapLedger {
    pub fn new(db: Database, policy: SwapPolicy) -> Self {
        Self { db, policy }
    }

    /// Create a swap request against an item. The owner side is resolved
    /// from the item itself, never taken from the caller.
    pub async fn create_swap(
        &self,
        principal: &Principal,
        item_id: ItemId,
        message: Option<String>,
    ) -> Result<Swap> {
        let item = self
            .db
            .get_item(item_id)
            .await?
            .ok_or_else(|| SwapError::NotFound(format!("Item {} not found", item_id)))?;

        if item.owner_id == principal.id {
            return Err(SwapError::Conflict(
                "Cannot request a swap for your own item".to_string(),
            ));
        }

        // Under the exclusivity policy a swapped item is gone for good;
        // further requests against it are refused outright.
        if self.policy.mark_item_swapped && item.status == ItemStatus::Swapped {
            return Err(SwapError::Conflict(format!(
                "Item {} has already been swapped away",
                item.id
            )));
        }

        self.db.ensure_user(principal.id, principal.is_admin).await?;

        let swap = Swap::new(item.id, principal.id, item.owner_id, message);
        self.db.create_swap(&swap).await?;

        tracing::info!(
            "Swap {} created: item {} requested by {} from {}",
            swap.id,
            swap.item_id,
            swap.requester_id,
            swap.owner_id
        );

        Ok(swap)
    }

    /// All swaps where the user is requester or owner, newest first.
    pub async fn list_swaps(&self, user_id: UserId) -> Result<Vec<Swap>> {
        self.db.swaps_for_user(user_id).await
    }

    pub async fn get_swap(&self, principal: &Principal, swap_id: SwapId) -> Result<Swap> {
        let swap = self
            .db
            .get_swap(swap_id)
            .await?
            .ok_or_else(|| SwapError::NotFound(format!("Swap {} not found", swap_id)))?;

        auth::authorize(
            principal,
            &Action::ViewSwap {
                requester_id: swap.requester_id,
                owner_id: swap.owner_id,
            },
        )?;

        Ok(swap)
    }

    /// Decide a pending swap. On `accepted`, both participants are
    /// credited with the item's reward value and the item optionally flips
    /// to `swapped`, all within one transaction.
    pub async fn transition(
        &self,
        principal: &Principal,
        swap_id: SwapId,
        target: SwapStatus,
        message: Option<String>,
    ) -> Result<Swap> {
        let swap = self
            .db
            .get_swap(swap_id)
            .await?
            .ok_or_else(|| SwapError::NotFound(format!("Swap {} not found", swap_id)))?;

        auth::authorize(
            principal,
            &Action::TransitionSwap {
                requester_id: swap.requester_id,
                owner_id: swap.owner_id,
            },
        )?;

        if !swap.status.can_transition_to(target) {
            return Err(SwapError::Conflict(format!(
                "Swap {} cannot move from {} to {}",
                swap.id,
                swap.status.as_str(),
                target.as_str()
            )));
        }

        let item = self
            .db
            .get_item(swap.item_id)
            .await?
            .ok_or_else(|| SwapError::NotFound(format!("Item {} not found", swap.item_id)))?;

        let mut tx = self.db.begin().await?;

        // Optimistic re-check under the transaction: losing a race to
        // another decision surfaces as Conflict, with nothing applied.
        let won = self
            .db
            .decide_swap_if_pending(&mut tx, swap.id, target, message.as_deref())
            .await?;
        if !won {
            return Err(SwapError::Conflict(format!(
                "Swap {} has already been decided",
                swap.id
            )));
        }

        if target == SwapStatus::Accepted {
            let points = item.points.unwrap_or(self.policy.default_points);
            rewards::credit(&mut tx, swap.owner_id, points).await?;
            rewards::credit(&mut tx, swap.requester_id, points).await?;

            if self.policy.mark_item_swapped {
                // The item itself carries the same optimistic guard: a
                // second pending swap for an already-claimed item loses
                // here and the whole decision rolls back uncredited.
                let claimed = self
                    .db
                    .mark_item_swapped_if_unclaimed(&mut tx, item.id)
                    .await?;
                if !claimed {
                    return Err(SwapError::Conflict(format!(
                        "Item {} has already been swapped away",
                        item.id
                    )));
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Swap {} decided by {}: {}",
            swap.id,
            principal.id,
            target.as_str()
        );

        self.db
            .get_swap(swap.id)
            .await?
            .ok_or_else(|| SwapError::NotFound(format!("Swap {} not found", swap.id)))
    }

    /// Decided swaps only; a pending request is not history yet.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<Swap>> {
        self.db.swap_history_for_user(user_id).await
    }
}
