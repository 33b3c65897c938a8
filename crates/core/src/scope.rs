//! Explicit tenant scoping for every unit of work.
//!
//! A [`TenantScope`] is constructed fresh per request or per message and
//! passed explicitly to every repository and handler call. There is no
//! ambient scope object anywhere in the platform; a scope is never shared
//! across concurrent units of work.

use uuid::Uuid;

use crate::error::{BeaconError, Result};

/// The (tenant, school) pair that must accompany every data access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: Uuid,
    school_id: Option<Uuid>,
}

impl TenantScope {
    /// Create a scope for one tenant, optionally narrowed to one school.
    ///
    /// A nil tenant id is rejected: evaluation errors here fail closed,
    /// since an unscoped query could read another tenant's data.
    pub fn new(tenant_id: Uuid, school_id: Option<Uuid>) -> Result<Self> {
        if tenant_id.is_nil() {
            return Err(BeaconError::InvalidTenantScope(
                "tenant id must be a non-nil UUID".to_string(),
            ));
        }
        if let Some(school) = school_id {
            if school.is_nil() {
                return Err(BeaconError::InvalidTenantScope(
                    "school id must be a non-nil UUID when present".to_string(),
                ));
            }
        }
        Ok(Self {
            tenant_id,
            school_id,
        })
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    pub fn school_id(&self) -> Option<Uuid> {
        self.school_id
    }
}
