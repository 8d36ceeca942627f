use std::collections::BTreeSet;
use std::fmt;

use crate::marshaller;
use crate::strategy::FlippingStrategy;

/// Feature is a named capability that can be switched on and off at runtime.
///
/// The `id` is fixed at construction; everything else may be changed on a copy and written back
/// through [crate::FeatureStore::update]. When a [FlippingStrategy] is attached, activation is
/// decided by the strategy and `enabled` is kept only for display and export.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    id: String,
    pub enabled: bool,
    pub description: Option<String>,
    pub strategy: Option<FlippingStrategy>,
    /// Roles allowed to see this feature. An empty set means no restriction.
    pub authorized_roles: BTreeSet<String>,
}

impl Feature {
    pub fn new(id: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
            description: None,
            strategy: None,
            authorized_roles: BTreeSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_strategy(mut self, strategy: FlippingStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.authorized_roles.insert(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorized_roles
            .extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if the feature is evaluated by a strategy rather than by its `enabled` flag.
    pub fn is_dynamic(&self) -> bool {
        self.strategy.is_some()
    }

    pub fn is_restricted(&self) -> bool {
        !self.authorized_roles.is_empty()
    }
}

/// Renders the canonical JSON encoding, see [crate::marshaller].
impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&marshaller::encode_feature(self))
    }
}
