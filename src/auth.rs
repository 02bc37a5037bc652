use crate::{
    error::{Result, SwapError},
    UserId,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The authenticated identity acting in a request. Produced by the
/// identity boundary from a verified bearer token; never constructed
/// from request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub admin: bool,
    pub exp: usize,
    pub iat: usize,
}

/// Boundary to the external identity provider. Token issuance lives
/// outside this service; we only verify HS256 tokens against the shared
/// secret and project them into a [`Principal`].
#[derive(Clone)]
pub struct IdentityVerifier {
    secret: String,
}

impl IdentityVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn verify(&self, token: &str) -> Result<Principal> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| SwapError::Auth(format!("Invalid token: {}", e)))?;

        let id = UserId::parse_str(&claims.sub)
            .map_err(|_| SwapError::Auth("Invalid subject claim".to_string()))?;

        Ok(Principal { id, is_admin: claims.admin })
    }

    /// Mint a token for the given principal. The production issuer is the
    /// external identity provider; this exists for local tooling and tests.
    pub fn issue(&self, principal: Principal) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.id.to_string(),
            admin: principal.is_admin,
            exp: (now + Duration::hours(24)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| SwapError::Auth(format!("Failed to issue token: {}", e)))
    }
}

/// Actions subject to authorization. Each variant carries the resource
/// owner ids the decision needs; nothing else is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Decide (accept/reject) a swap.
    TransitionSwap { requester_id: UserId, owner_id: UserId },
    /// Read a single swap.
    ViewSwap { requester_id: UserId, owner_id: UserId },
    /// Update or delete an item.
    MutateItem { owner_id: UserId },
    /// Approve or reject a listing.
    ModerateItem,
    /// Enumerate all users.
    ListUsers,
}

/// Pure allow/deny decision. No state, no side effects.
pub fn authorize(principal: &Principal, action: &Action) -> Result<()> {
    let allowed = match action {
        Action::TransitionSwap { requester_id, owner_id }
        | Action::ViewSwap { requester_id, owner_id } => {
            principal.id == *requester_id || principal.id == *owner_id
        }
        Action::MutateItem { owner_id } => principal.id == *owner_id,
        Action::ModerateItem | Action::ListUsers => principal.is_admin,
    };

    if allowed {
        Ok(())
    } else {
        Err(SwapError::Forbidden(match action {
            Action::TransitionSwap { .. } => "Only swap participants may decide a swap".to_string(),
            Action::ViewSwap { .. } => "Only swap participants may view this swap".to_string(),
            Action::MutateItem { .. } => "Only the item owner may modify it".to_string(),
            Action::ModerateItem => "Moderation requires an admin principal".to_string(),
            Action::ListUsers => "Listing users requires an admin principal".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(id: UserId, is_admin: bool) -> Principal {
        Principal { id, is_admin }
    }

    #[test]
    fn test_participants_may_transition() {
        let requester_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let action = Action::TransitionSwap { requester_id, owner_id };

        assert!(authorize(&principal(requester_id, false), &action).is_ok());
        assert!(authorize(&principal(owner_id, false), &action).is_ok());

        let stranger = authorize(&principal(Uuid::new_v4(), false), &action);
        assert!(matches!(stranger, Err(SwapError::Forbidden(_))));

        // Admin status grants no swap powers.
        let admin = authorize(&principal(Uuid::new_v4(), true), &action);
        assert!(matches!(admin, Err(SwapError::Forbidden(_))));
    }

    #[test]
    fn test_only_owner_mutates_item() {
        let owner_id = Uuid::new_v4();
        let action = Action::MutateItem { owner_id };

        assert!(authorize(&principal(owner_id, false), &action).is_ok());
        assert!(authorize(&principal(Uuid::new_v4(), false), &action).is_err());
    }

    #[test]
    fn test_moderation_requires_admin() {
        assert!(authorize(&principal(Uuid::new_v4(), true), &Action::ModerateItem).is_ok());
        assert!(authorize(&principal(Uuid::new_v4(), false), &Action::ModerateItem).is_err());
        assert!(authorize(&principal(Uuid::new_v4(), true), &Action::ListUsers).is_ok());
        assert!(authorize(&principal(Uuid::new_v4(), false), &Action::ListUsers).is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let verifier = IdentityVerifier::new("test-secret");
        let original = Principal { id: Uuid::new_v4(), is_admin: true };

        let token = verifier.issue(original).unwrap();
        let verified = verifier.verify(&token).unwrap();
        assert_eq!(verified, original);

        let other = IdentityVerifier::new("other-secret");
        assert!(matches!(other.verify(&token), Err(SwapError::Auth(_))));
    }
}
