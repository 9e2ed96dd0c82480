/// Organization model
///
/// Organizations are the tenancy root. Every project, task and comment lives
/// beneath exactly one organization, and deleting an organization removes all
/// of them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     slug VARCHAR(50) NOT NULL,
///     contact_email VARCHAR(254) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT uniq_organization_slug UNIQUE (slug)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::Patch;

/// An organization (tenant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Globally unique, URL-safe identifier used for tenant resolution
    pub slug: String,

    /// Contact address
    pub contact_email: String,

    /// When the organization was created
    pub created_at: DateTime<Utc>,
}

/// Arguments for `createOrganization`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrganizationInput {
    pub name: String,
    pub slug: String,
    pub contact_email: String,
}

/// Arguments for `updateOrganization`
///
/// Only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrganizationInput {
    pub id: Uuid,

    #[serde(default)]
    pub name: Patch<String>,

    #[serde(default)]
    pub slug: Patch<String>,

    #[serde(default)]
    pub contact_email: Patch<String>,
}

/// Validated record ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub name: String,
    pub slug: String,
    pub contact_email: String,
}

/// Validated set of column changes; `None` leaves a column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub contact_email: Option<String>,
}

impl OrganizationChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.contact_email.is_none()
    }
}
