use std::fmt;
use std::sync::Arc;

use crate::authorization::AuthorizationManager;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::eval::{self, Detail};
use crate::store::FeatureStore;

/// FeatureToggle answers "is this feature active?" for application code.
///
/// It binds one [FeatureStore] and, optionally, one [AuthorizationManager]. Construct it once at
/// startup and hand it (or an `Arc` of it) to whatever needs to check features; see
/// [crate::global] for a process-wide slot usable from entry points.
#[derive(Clone)]
pub struct FeatureToggle {
    store: Arc<dyn FeatureStore>,
    authorization: Option<Arc<dyn AuthorizationManager>>,
}

impl FeatureToggle {
    pub fn new(store: Arc<dyn FeatureStore>) -> Self {
        Self {
            store,
            authorization: None,
        }
    }

    /// Enables role checks for restricted features. Without an authorization manager every
    /// feature is treated as unrestricted.
    pub fn with_authorization_manager(mut self, manager: Arc<dyn AuthorizationManager>) -> Self {
        self.authorization = Some(manager);
        self
    }

    pub fn store(&self) -> &Arc<dyn FeatureStore> {
        &self.store
    }

    pub fn authorization_manager(&self) -> Option<&Arc<dyn AuthorizationManager>> {
        self.authorization.as_ref()
    }

    /// Whether feature `id` is active right now for the current caller.
    ///
    /// Fails only if the feature does not exist or the store fails; a disabled or unauthorized
    /// feature is `Ok(false)`.
    pub fn is_enabled(&self, id: &str) -> Result<bool> {
        self.is_enabled_with(id, &ExecutionContext::new())
    }

    pub fn is_enabled_with(&self, id: &str, context: &ExecutionContext) -> Result<bool> {
        Ok(self.evaluate_detail(id, context)?.enabled)
    }

    /// Like [FeatureToggle::is_enabled_with], but also reports why the feature evaluated the way
    /// it did.
    pub fn evaluate_detail(&self, id: &str, context: &ExecutionContext) -> Result<Detail> {
        let feature = self.store.read(id)?;
        // Roles are only resolved when they can change the outcome.
        let roles = match &self.authorization {
            Some(manager) if feature.is_restricted() => Some(manager.current_roles()),
            _ => None,
        };
        Ok(eval::evaluate(&feature, context, roles.as_ref()))
    }

    pub fn enable(&self, id: &str) -> Result<()> {
        self.store.enable(id)
    }

    pub fn disable(&self, id: &str) -> Result<()> {
        self.store.disable(id)
    }
}

impl fmt::Debug for FeatureToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureToggle")
            .field("authorization", &self.authorization.is_some())
            .finish_non_exhaustive()
    }
}
