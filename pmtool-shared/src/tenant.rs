/// Tenant resolution
///
/// The tenant of a request is named by a header (`X-Org-Slug` unless
/// configured otherwise) carrying an organization slug. Resolution is a plain
/// lookup: a missing, blank or unknown slug yields
/// [`TenantContext::Unresolved`], which only becomes an error when an
/// operation that needs a tenant calls [`TenantContext::require`].
///
/// The resolved context is passed explicitly into every engine call; nothing
/// is stashed on the request.
///
/// # Example
///
/// ```
/// use pmtool_shared::store::memory::MemoryStore;
/// use pmtool_shared::tenant::TenantResolver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let resolver = TenantResolver::default();
///
/// let tenant = resolver.resolve(&store, Some("acme")).await?;
/// assert!(!tenant.is_resolved());
/// # Ok(())
/// # }
/// ```

use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::models::organization::Organization;
use crate::store::{EntityStore, StoreResult, TenantScope};

/// Default request header carrying the organization slug
pub const DEFAULT_ORG_HEADER: &str = "X-Org-Slug";

/// Outcome of tenant resolution for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantContext {
    /// The header named an existing organization
    Resolved {
        organization: Organization,
        header: String,
    },

    /// No usable header value
    Unresolved { header: String },
}

impl TenantContext {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TenantContext::Resolved { .. })
    }

    /// The resolved organization, if any
    pub fn organization(&self) -> Option<&Organization> {
        match self {
            TenantContext::Resolved { organization, .. } => Some(organization),
            TenantContext::Unresolved { .. } => None,
        }
    }

    /// Scope for tenant-bound operations
    ///
    /// # Errors
    ///
    /// [`EngineError::TenantUnresolved`] when no organization was resolved.
    pub fn require(&self) -> EngineResult<TenantScope> {
        match self {
            TenantContext::Resolved { organization, .. } => Ok(TenantScope::of(organization)),
            TenantContext::Unresolved { header } => Err(EngineError::TenantUnresolved {
                header: header.clone(),
            }),
        }
    }
}

/// Maps a header value to a [`TenantContext`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantResolver {
    header: String,
}

impl Default for TenantResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ORG_HEADER)
    }
}

impl TenantResolver {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    /// Name of the header this resolver reads
    pub fn header_name(&self) -> &str {
        &self.header
    }

    /// Context for requests that carry no header at all
    pub fn unresolved(&self) -> TenantContext {
        TenantContext::Unresolved {
            header: self.header.clone(),
        }
    }

    /// Looks up the organization whose slug equals the (trimmed) header value
    ///
    /// # Errors
    ///
    /// Only store failures; an unknown slug is `Unresolved`, not an error.
    pub async fn resolve(
        &self,
        store: &dyn EntityStore,
        value: Option<&str>,
    ) -> StoreResult<TenantContext> {
        let slug = match value.map(str::trim) {
            Some(slug) if !slug.is_empty() => slug,
            _ => {
                debug!(header = %self.header, "No tenant header supplied");
                return Ok(self.unresolved());
            }
        };

        match store.find_organization_by_slug(slug).await? {
            Some(organization) => {
                debug!(slug = %slug, organization_id = %organization.id, "Tenant resolved");
                Ok(TenantContext::Resolved {
                    organization,
                    header: self.header.clone(),
                })
            }
            None => {
                debug!(slug = %slug, "Tenant header did not match any organization");
                Ok(self.unresolved())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organization::NewOrganization;
    use crate::store::memory::MemoryStore;

    async fn store_with_acme() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_organization(NewOrganization {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                contact_email: "a@acme.com".to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_resolves_known_slug() {
        let store = store_with_acme().await;
        let tenant = TenantResolver::default()
            .resolve(&store, Some("acme"))
            .await
            .unwrap();

        assert_eq!(tenant.organization().map(|o| o.slug.as_str()), Some("acme"));
        assert!(tenant.require().is_ok());
    }

    #[tokio::test]
    async fn test_missing_blank_and_unknown_are_unresolved() {
        let store = store_with_acme().await;
        let resolver = TenantResolver::default();

        for value in [None, Some(""), Some("   "), Some("globex"), Some("ACME")] {
            let tenant = resolver.resolve(&store, value).await.unwrap();
            assert!(!tenant.is_resolved(), "{:?} should not resolve", value);
        }
    }

    #[tokio::test]
    async fn test_require_names_configured_header() {
        let store = MemoryStore::new();
        let tenant = TenantResolver::new("X-Tenant")
            .resolve(&store, None)
            .await
            .unwrap();

        let err = tenant.require().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Organization not resolved. Provide header 'X-Tenant'."
        );
    }
}
