use crate::{ItemId, Result, SwapError, SwapId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub tags: Option<String>,
    pub points: Option<i64>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    Pending,
    Swapped,
    Rejected,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Pending => "pending",
            ItemStatus::Swapped => "swapped",
            ItemStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(ItemStatus::Available),
            "pending" => Ok(ItemStatus::Pending),
            "swapped" => Ok(ItemStatus::Swapped),
            "rejected" => Ok(ItemStatus::Rejected),
            _ => Err(SwapError::Validation(format!("Invalid item status: {s}"))),
        }
    }
}

/// Attributes supplied when listing a new item. The reward value in
/// `points` is what both participants are credited with on acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub tags: Option<String>,
    pub points: Option<i64>,
}

impl NewItem {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(SwapError::Validation("Title must not be empty".to_string()));
        }
        if let Some(points) = self.points {
            if points < 0 {
                return Err(SwapError::Validation(
                    "Points must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Explicit allow-list of owner-mutable item fields. `status` and
/// `owner_id` are deliberately absent: status moves only through
/// moderation or swap acceptance, ownership never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub tags: Option<String>,
    pub points: Option<i64>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(SwapError::Validation("Title must not be empty".to_string()));
            }
        }
        if let Some(points) = self.points {
            if points < 0 {
                return Err(SwapError::Validation(
                    "Points must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swap {
    pub id: SwapId,
    pub item_id: ItemId,
    pub requester_id: UserId,
    pub owner_id: UserId,
    pub status: SwapStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Accepted => "accepted",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SwapStatus::Pending),
            "accepted" => Ok(SwapStatus::Accepted),
            "rejected" => Ok(SwapStatus::Rejected),
            "completed" => Ok(SwapStatus::Completed),
            _ => Err(SwapError::Validation(format!("Invalid swap status: {s}"))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }

    /// Transition table for the swap state machine. Only a pending swap
    /// can be decided, and only into `accepted` or `rejected`; a decided
    /// swap is immutable.
    pub fn can_transition_to(&self, target: SwapStatus) -> bool {
        matches!(
            (self, target),
            (SwapStatus::Pending, SwapStatus::Accepted)
                | (SwapStatus::Pending, SwapStatus::Rejected)
        )
    }
}

impl Swap {
    pub fn new(item_id: ItemId, requester_id: UserId, owner_id: UserId, message: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            requester_id,
            owner_id,
            status: SwapStatus::Pending,
            message,
            created_at: Utc::now(),
        }
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        user_id == self.requester_id || user_id == self.owner_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub points: i64,
    pub swaps_completed: i64,
    pub impact_score: i64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}
