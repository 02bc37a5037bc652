//! # Swapbroker
//!
//! A brokering service for exchanging physical items between two parties,
//! paired with a points-based reward ledger.
//!
//! ## Architecture
//!
//! - **Item Registry**: owns item records, their availability status, and
//!   the admin moderation queue
//! - **Swap Ledger**: owns swap requests and enforces the
//!   request/accept/reject state machine
//! - **Reward Accounting**: credits points and engagement counters to both
//!   participants when a swap is accepted
//! - **Authorization Guard**: pure allow/deny decisions over principals
//! - **Identity boundary**: verifies bearer tokens issued by an external
//!   identity provider
//! - **Enrichment**: optional, advisory item-metadata suggestions from an
//!   external classification service

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod enrichment;
pub mod error;
pub mod ledger;
pub mod model;
pub mod registry;
pub mod rewards;

pub use auth::{IdentityVerifier, Principal};
pub use config::AppConfig;
pub use database::Database;
pub use enrichment::EnrichmentClient;
pub use error::{Result, SwapError};
pub use ledger::{SwapLedger, SwapPolicy};
pub use model::{Item, ItemPatch, ItemStatus, NewItem, Swap, SwapStatus, User};
pub use registry::ItemRegistry;

pub type UserId = uuid::Uuid;
pub type ItemId = uuid::Uuid;
pub type SwapId = uuid::Uuid;
