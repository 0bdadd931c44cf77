//! Access resolution for posts
//!
//! Read access is granted when any rule in [`READ_RULES`] matches, evaluated in
//! order and short-circuiting on the first match. Management (edit, delete,
//! permission changes) only considers [`MANAGE_RULES`].
//!
//! Every call re-reads the backing store; nothing is cached, so a revoked
//! grant takes effect on the next request.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AccessError;
use crate::models::{Identity, Resource};

/// Live view of posts and grants needed to resolve access
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Look up a resource by id
    async fn find_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, AccessError>;

    /// Whether an explicit grant exists for `(resource_id, identity_id)`
    async fn grant_exists(&self, resource_id: Uuid, identity_id: Uuid)
        -> Result<bool, AccessError>;
}

/// A single predicate in an access decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    Admin,
    Owner,
    Public,
    ExplicitGrant,
}

/// Rules for reading metadata or streaming bytes
pub const READ_RULES: &[AccessRule] = &[
    AccessRule::Admin,
    AccessRule::Owner,
    AccessRule::Public,
    AccessRule::ExplicitGrant,
];

/// Rules for managing a post and its permission list
pub const MANAGE_RULES: &[AccessRule] = &[AccessRule::Admin, AccessRule::Owner];

impl AccessRule {
    /// Evaluate the rule for one identity/resource pair.
    ///
    /// Only `ExplicitGrant` touches the store.
    pub async fn matches(
        self,
        store: &dyn AccessStore,
        identity: &Identity,
        resource: &Resource,
    ) -> Result<bool, AccessError> {
        match self {
            AccessRule::Admin => Ok(identity.is_admin),
            AccessRule::Owner => Ok(resource.is_owned_by(identity)),
            AccessRule::Public => Ok(resource.is_public),
            AccessRule::ExplicitGrant => store.grant_exists(resource.id, identity.id).await,
        }
    }
}

/// First rule of `rules` that admits `identity`, if any
pub async fn first_matching_rule(
    rules: &[AccessRule],
    store: &dyn AccessStore,
    identity: &Identity,
    resource: &Resource,
) -> Result<Option<AccessRule>, AccessError> {
    for rule in rules {
        if rule.matches(store, identity, resource).await? {
            return Ok(Some(*rule));
        }
    }
    Ok(None)
}

async fn resolve(
    rules: &[AccessRule],
    store: &dyn AccessStore,
    resource_id: Uuid,
    identity: &Identity,
) -> Result<Resource, AccessError> {
    let resource = store
        .find_resource(resource_id)
        .await?
        .ok_or(AccessError::NotFound)?;

    match first_matching_rule(rules, store, identity, &resource).await? {
        Some(rule) => {
            tracing::debug!(
                resource_id = %resource_id,
                identity_id = %identity.id,
                ?rule,
                "access granted"
            );
            Ok(resource)
        }
        None => {
            tracing::warn!(
                resource_id = %resource_id,
                identity_id = %identity.id,
                "access denied"
            );
            Err(AccessError::Forbidden)
        }
    }
}

/// Resolve read access: admin, owner, public or explicit grant
pub async fn resolve_read_access(
    store: &dyn AccessStore,
    resource_id: Uuid,
    identity: &Identity,
) -> Result<Resource, AccessError> {
    resolve(READ_RULES, store, resource_id, identity).await
}

/// Resolve management access: admin or owner only
pub async fn resolve_management_access(
    store: &dyn AccessStore,
    resource_id: Uuid,
    identity: &Identity,
) -> Result<Resource, AccessError> {
    resolve(MANAGE_RULES, store, resource_id, identity).await
}
