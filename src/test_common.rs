#![cfg(test)]

use std::collections::HashSet;
use std::sync::Arc;

use crate::authorization::AuthorizationManager;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::marshaller::Marshaller;
use crate::strategy::{FlippingStrategy, InitParams, StrategyEvaluator, StrategyRegistry};

/// Features covering each shape the marshaller has to handle: plain, restricted, strategy-driven
/// and with characters that need escaping.
pub fn sample_features() -> Vec<Feature> {
    vec![
        Feature::new("first", true)
            .with_description("the first feature")
            .with_roles(vec!["USER", "ADMIN"]),
        Feature::new("second", false)
            .with_description("second, \"quoted\"")
            .with_role("USER"),
        Feature::new("third", false)
            .with_strategy(FlippingStrategy::release_date("2013-07-14-14:00").unwrap()),
        Feature::new("fourth", true)
            .with_description("multi\nline\tdescription")
            .with_strategy(FlippingStrategy::AlwaysOff)
            .with_roles(vec!["BETA", "X-TESTER"]),
    ]
}

/// A marshaller that also knows the [UserAllowList] custom strategy.
pub fn test_marshaller() -> Marshaller {
    let mut registry = StrategyRegistry::new();
    registry
        .register("UserAllowList", Arc::new(UserAllowList))
        .unwrap();
    Marshaller::new(registry)
}

/// Custom strategy activating a feature for the comma-separated users in its `users` parameter.
pub struct UserAllowList;

impl StrategyEvaluator for UserAllowList {
    fn validate(&self, params: &InitParams) -> Result<()> {
        match params.get("users") {
            Some(users) if !users.is_empty() => Ok(()),
            _ => Err(Error::Configuration(
                "UserAllowList requires a non-empty 'users' parameter".to_string(),
            )),
        }
    }

    fn evaluate(&self, _feature_id: &str, params: &InitParams, context: &ExecutionContext) -> bool {
        match (params.get("users"), context.user()) {
            (Some(users), Some(user)) => users.split(',').any(|u| u.trim() == user),
            _ => false,
        }
    }
}

/// Authorization manager returning a fixed role set.
pub struct StaticRoles {
    roles: HashSet<String>,
}

impl StaticRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl AuthorizationManager for StaticRoles {
    fn current_roles(&self) -> HashSet<String> {
        self.roles.clone()
    }
}
