use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::authorization::is_authorized;
use crate::context::ExecutionContext;
use crate::feature::Feature;

/// Evaluate a feature for the specified [ExecutionContext].
///
/// Activation comes from the feature's [crate::FlippingStrategy] when it has one, otherwise from
/// its stored `enabled` flag. When `roles` is provided and the feature is restricted, the caller
/// must hold at least one of the feature's authorized roles: an active feature the caller is not
/// authorized for evaluates to `false`. Passing `None` skips the role check entirely.
pub fn evaluate(
    feature: &Feature,
    context: &ExecutionContext,
    roles: Option<&HashSet<String>>,
) -> Detail {
    let (active, reason) = match &feature.strategy {
        Some(strategy) => {
            let strategy_name = strategy.type_name().to_string();
            if strategy.evaluate(feature.id(), context) {
                (true, Reason::StrategyMatched { strategy: strategy_name })
            } else {
                (false, Reason::StrategyRejected { strategy: strategy_name })
            }
        }
        None if feature.enabled => (true, Reason::On),
        None => (false, Reason::Off),
    };

    if !active {
        return Detail { enabled: false, reason };
    }

    match roles {
        Some(held) if !is_authorized(&feature.authorized_roles, held) => {
            debug!("Caller is not authorized for feature {}", feature.id());
            Detail {
                enabled: false,
                reason: Reason::Unauthorized,
            }
        }
        _ => Detail {
            enabled: true,
            reason,
        },
    }
}

/// A Detail is returned from [evaluate], combining the activation result with an explanation of
/// how it was reached.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detail {
    /// Whether the feature is active for this caller.
    pub enabled: bool,

    /// The main factor that decided [Detail::enabled].
    pub reason: Reason,
}

/// Reason describes why a feature evaluated to a particular result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum Reason {
    /// The feature has no strategy and is disabled.
    Off,
    /// The feature has no strategy and is enabled.
    On,
    /// The feature's strategy declared it active.
    StrategyMatched {
        /// Discriminator of the strategy that was evaluated.
        strategy: String,
    },
    /// The feature's strategy declared it inactive.
    StrategyRejected {
        /// Discriminator of the strategy that was evaluated.
        strategy: String,
    },
    /// The feature was active, but the caller holds none of its authorized roles.
    Unauthorized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::FlippingStrategy;
    use chrono::{Duration, Utc};
    use maplit::hashset;
    use serde_json::json;
    use spectral::prelude::*;
    use test_case::test_case;

    #[test_case(true, Reason::On)]
    #[test_case(false, Reason::Off)]
    fn without_strategy_uses_enabled_flag(enabled: bool, reason: Reason) {
        let detail = evaluate(&Feature::new("f", enabled), &ExecutionContext::new(), None);
        assert_that!(detail).is_equal_to(Detail { enabled, reason });
    }

    #[test]
    fn strategy_overrides_enabled_flag() {
        let ctx = ExecutionContext::new();

        let on = Feature::new("f", false).with_strategy(FlippingStrategy::AlwaysOn);
        assert_that!(evaluate(&on, &ctx, None)).is_equal_to(Detail {
            enabled: true,
            reason: Reason::StrategyMatched {
                strategy: "AlwaysOn".into(),
            },
        });

        let off = Feature::new("f", true).with_strategy(FlippingStrategy::AlwaysOff);
        assert_that!(evaluate(&off, &ctx, None)).is_equal_to(Detail {
            enabled: false,
            reason: Reason::StrategyRejected {
                strategy: "AlwaysOff".into(),
            },
        });
    }

    #[test]
    fn release_date_strategy() {
        let now = Utc::now();
        let ctx = ExecutionContext::at(now);

        let past = Feature::new("f", false)
            .with_strategy(FlippingStrategy::release_date_at(now - Duration::hours(1)));
        let future = Feature::new("f", true)
            .with_strategy(FlippingStrategy::release_date_at(now + Duration::hours(1)));

        assert_that!(evaluate(&past, &ctx, None).enabled).is_true();
        assert_that!(evaluate(&future, &ctx, None).enabled).is_false();
    }

    #[test]
    fn restricted_feature_requires_matching_role() {
        let ctx = ExecutionContext::new();
        let feature = Feature::new("f", true).with_role("admin");

        let none = hashset! {};
        let detail = evaluate(&feature, &ctx, Some(&none));
        assert_that!(detail).is_equal_to(Detail {
            enabled: false,
            reason: Reason::Unauthorized,
        });

        let admin = hashset! {"admin".to_string(), "user".to_string()};
        assert_that!(evaluate(&feature, &ctx, Some(&admin))).is_equal_to(Detail {
            enabled: true,
            reason: Reason::On,
        });
    }

    #[test]
    fn inactive_feature_reports_activation_reason_before_authorization() {
        let feature = Feature::new("f", false).with_role("admin");
        let detail = evaluate(&feature, &ExecutionContext::new(), Some(&hashset! {}));
        assert_that!(detail.reason).is_equal_to(Reason::Off);
    }

    #[test]
    fn missing_roles_skip_the_gate() {
        let feature = Feature::new("f", true).with_role("admin");
        assert_that!(evaluate(&feature, &ExecutionContext::new(), None).enabled).is_true();
    }

    #[test]
    fn reasons_serialize_with_kind_tag() {
        assert_that!(serde_json::to_value(Reason::Unauthorized).unwrap())
            .is_equal_to(json!({"kind": "UNAUTHORIZED"}));
        assert_that!(serde_json::to_value(Reason::StrategyMatched {
            strategy: "ReleaseDate".into()
        })
        .unwrap())
        .is_equal_to(json!({"kind": "STRATEGY_MATCHED", "strategy": "ReleaseDate"}));
    }
}
