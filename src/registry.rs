//! The item registry: listing CRUD plus the admin moderation queue.
//!
//! Moderation (`approve`/`reject`) governs listing visibility and is
//! independent of the swap state machine.

use crate::{
    auth::{self, Action, Principal},
    database::Database,
    enrichment::EnrichmentClient,
    error::{Result, SwapError},
    model::{Item, ItemPatch, ItemStatus, NewItem},
    ItemId,
};
use chrono::Utc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ItemRegistry {
    db: Database,
    enrichment: EnrichmentClient,
}

impl ItemRegistry {
    pub fn new(db: Database, enrichment: EnrichmentClient) -> Self {
        Self { db, enrichment }
    }

    /// List a new item. It enters the moderation queue as `pending` and
    /// becomes publicly visible once approved.
    pub async fn create_item(&self, principal: &Principal, new_item: NewItem) -> Result<Item> {
        new_item.validate()?;

        self.db.ensure_user(principal.id, principal.is_admin).await?;

        let mut category = new_item.category;
        if category.is_none() {
            category = self
                .enrichment
                .suggest_category(&new_item.title, new_item.description.as_deref())
                .await;
        }

        let item = Item {
            id: Uuid::new_v4(),
            owner_id: principal.id,
            title: new_item.title,
            description: new_item.description,
            category,
            size: new_item.size,
            condition: new_item.condition,
            tags: new_item.tags,
            points: new_item.points,
            status: ItemStatus::Pending,
            created_at: Utc::now(),
        };

        self.db.create_item(&item).await?;

        tracing::info!("Item {} listed by {}", item.id, item.owner_id);
        Ok(item)
    }

    pub async fn get_item(&self, item_id: ItemId) -> Result<Item> {
        self.db
            .get_item(item_id)
            .await?
            .ok_or_else(|| SwapError::NotFound(format!("Item {} not found", item_id)))
    }

    /// Public listing: approved items only.
    pub async fn list_items(&self, offset: i64, limit: i64) -> Result<Vec<Item>> {
        self.db
            .list_items_by_status(ItemStatus::Available, offset, limit)
            .await
    }

    pub async fn update_item(
        &self,
        principal: &Principal,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> Result<Item> {
        patch.validate()?;

        let item = self.get_item(item_id).await?;
        auth::authorize(principal, &Action::MutateItem { owner_id: item.owner_id })?;

        self.db.update_item(item_id, &patch).await?;
        self.get_item(item_id).await
    }

    /// Remove a listing. An item referenced by a pending swap cannot be
    /// deleted; the request has to be decided first. Decided swap rows
    /// for the item go with it (`ON DELETE CASCADE`).
    pub async fn delete_item(&self, principal: &Principal, item_id: ItemId) -> Result<()> {
        let item = self.get_item(item_id).await?;
        auth::authorize(principal, &Action::MutateItem { owner_id: item.owner_id })?;

        let pending = self.db.count_pending_swaps_for_item(item_id).await?;
        if pending > 0 {
            return Err(SwapError::Conflict(format!(
                "Item {} has {} pending swap request(s)",
                item_id, pending
            )));
        }

        self.db.delete_item(item_id).await?;

        tracing::info!("Item {} deleted by {}", item_id, principal.id);
        Ok(())
    }

    // moderation

    pub async fn pending_items(&self, principal: &Principal) -> Result<Vec<Item>> {
        auth::authorize(principal, &Action::ModerateItem)?;
        self.db
            .list_items_by_status(ItemStatus::Pending, 0, i64::MAX)
            .await
    }

    pub async fn approve_item(&self, principal: &Principal, item_id: ItemId) -> Result<Item> {
        self.moderate(principal, item_id, ItemStatus::Available).await
    }

    pub async fn reject_item(&self, principal: &Principal, item_id: ItemId) -> Result<Item> {
        self.moderate(principal, item_id, ItemStatus::Rejected).await
    }

    async fn moderate(
        &self,
        principal: &Principal,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<Item> {
        auth::authorize(principal, &Action::ModerateItem)?;

        let item = self.get_item(item_id).await?;
        self.db.set_item_status(item.id, status).await?;

        tracing::info!(
            "Item {} moderated to {} by {}",
            item.id,
            status.as_str(),
            principal.id
        );

        self.get_item(item_id).await
    }
}
