use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};

use crate::context::ExecutionContext;
use crate::error::{Error, Result};

/// Format of the `releaseDate` parameter of [FlippingStrategy::ReleaseDate], e.g.
/// `2013-07-14-14:00`. Values are interpreted as UTC.
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// Name of the single init parameter understood by [FlippingStrategy::ReleaseDate].
pub const RELEASE_DATE_PARAM: &str = "releaseDate";

pub const ALWAYS_ON: &str = "AlwaysOn";
pub const ALWAYS_OFF: &str = "AlwaysOff";
pub const RELEASE_DATE: &str = "ReleaseDate";

const BUILT_IN_STRATEGIES: &[&str] = &[ALWAYS_ON, ALWAYS_OFF, RELEASE_DATE];

/// Init parameters of a strategy, keyed by parameter name.
pub type InitParams = BTreeMap<String, String>;

/// StrategyEvaluator is the extension point for activation logic that is not covered by the
/// built-in [FlippingStrategy] variants.
///
/// Implementations must be stateless: the same parameters and context always give the same
/// answer, and evaluation must not have side effects.
pub trait StrategyEvaluator: Send + Sync {
    /// Check the parameters a custom strategy is created with. Called once, when the strategy is
    /// constructed, so that bad configuration is reported before any evaluation happens.
    fn validate(&self, _params: &InitParams) -> Result<()> {
        Ok(())
    }

    /// Decide whether `feature_id` is active.
    fn evaluate(&self, feature_id: &str, params: &InitParams, context: &ExecutionContext) -> bool;
}

/// A user-supplied strategy: a discriminator, its parameters and the evaluator registered for it.
#[derive(Clone)]
pub struct CustomStrategy {
    type_name: String,
    params: InitParams,
    evaluator: Arc<dyn StrategyEvaluator>,
}

impl CustomStrategy {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn params(&self) -> &InitParams {
        &self.params
    }
}

impl fmt::Debug for CustomStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomStrategy")
            .field("type_name", &self.type_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// Evaluators are compared by configuration only; two strategies with the same discriminator and
// parameters are interchangeable.
impl PartialEq for CustomStrategy {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.params == other.params
    }
}

/// FlippingStrategy decides at evaluation time whether a feature is active, replacing the
/// feature's stored `enabled` flag.
#[derive(Clone, Debug, PartialEq)]
pub enum FlippingStrategy {
    /// Always active.
    AlwaysOn,
    /// Never active.
    AlwaysOff,
    /// Active from `release_date` onwards, inclusive.
    ReleaseDate { release_date: DateTime<Utc> },
    /// Activation decided by a registered [StrategyEvaluator].
    Custom(CustomStrategy),
}

impl FlippingStrategy {
    /// Build a [FlippingStrategy::ReleaseDate] from text in [RELEASE_DATE_FORMAT].
    pub fn release_date(text: &str) -> Result<Self> {
        let parsed = NaiveDateTime::parse_from_str(text.trim(), RELEASE_DATE_FORMAT).map_err(|e| {
            warn!("Invalid release date '{}': {}", text, e);
            Error::Configuration(format!(
                "release date '{}' does not match format {}",
                text, RELEASE_DATE_FORMAT
            ))
        })?;
        Ok(FlippingStrategy::ReleaseDate {
            release_date: parsed.and_utc(),
        })
    }

    pub fn release_date_at(release_date: DateTime<Utc>) -> Self {
        FlippingStrategy::ReleaseDate { release_date }
    }

    /// Build a [FlippingStrategy::Custom], validating `params` with `evaluator` up front.
    pub fn custom(
        type_name: impl Into<String>,
        params: InitParams,
        evaluator: Arc<dyn StrategyEvaluator>,
    ) -> Result<Self> {
        let type_name = type_name.into();
        check_custom_type(&type_name)?;
        evaluator.validate(&params)?;
        Ok(FlippingStrategy::Custom(CustomStrategy {
            type_name,
            params,
            evaluator,
        }))
    }

    /// The discriminator written to the `type` field of the JSON encoding.
    pub fn type_name(&self) -> &str {
        match self {
            FlippingStrategy::AlwaysOn => ALWAYS_ON,
            FlippingStrategy::AlwaysOff => ALWAYS_OFF,
            FlippingStrategy::ReleaseDate { .. } => RELEASE_DATE,
            FlippingStrategy::Custom(custom) => &custom.type_name,
        }
    }

    /// The parameters written to the `initParams` field of the JSON encoding.
    pub fn init_params(&self) -> InitParams {
        match self {
            FlippingStrategy::AlwaysOn | FlippingStrategy::AlwaysOff => InitParams::new(),
            FlippingStrategy::ReleaseDate { release_date } => {
                let mut params = InitParams::new();
                params.insert(
                    RELEASE_DATE_PARAM.to_string(),
                    release_date.format(RELEASE_DATE_FORMAT).to_string(),
                );
                params
            }
            FlippingStrategy::Custom(custom) => custom.params.clone(),
        }
    }

    pub fn evaluate(&self, feature_id: &str, context: &ExecutionContext) -> bool {
        match self {
            FlippingStrategy::AlwaysOn => true,
            FlippingStrategy::AlwaysOff => false,
            FlippingStrategy::ReleaseDate { release_date } => context.now() >= *release_date,
            FlippingStrategy::Custom(custom) => {
                custom.evaluator.evaluate(feature_id, &custom.params, context)
            }
        }
    }
}

// Custom discriminators must be non-empty and distinct from the built-in ones.
fn check_custom_type(type_name: &str) -> Result<()> {
    if type_name.is_empty() || BUILT_IN_STRATEGIES.contains(&type_name) {
        return Err(Error::Configuration(format!(
            "'{}' cannot be used as a custom strategy type",
            type_name
        )));
    }
    Ok(())
}

/// StrategyRegistry resolves a strategy discriminator and its parameters into a
/// [FlippingStrategy]. Built-in discriminators always resolve; anything else must have been
/// registered with [StrategyRegistry::register].
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    evaluators: HashMap<String, Arc<dyn StrategyEvaluator>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `evaluator` for custom strategies of type `type_name`, replacing any previous
    /// registration. Built-in discriminators cannot be overridden.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        evaluator: Arc<dyn StrategyEvaluator>,
    ) -> Result<&mut Self> {
        let type_name = type_name.into();
        check_custom_type(&type_name)?;
        debug!("Registering custom strategy {}", type_name);
        self.evaluators.insert(type_name, evaluator);
        Ok(self)
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        BUILT_IN_STRATEGIES.contains(&type_name) || self.evaluators.contains_key(type_name)
    }

    pub fn build(&self, type_name: &str, params: InitParams) -> Result<FlippingStrategy> {
        match type_name {
            ALWAYS_ON => Ok(FlippingStrategy::AlwaysOn),
            ALWAYS_OFF => Ok(FlippingStrategy::AlwaysOff),
            RELEASE_DATE => match params.get(RELEASE_DATE_PARAM) {
                Some(text) => FlippingStrategy::release_date(text),
                None => Err(Error::Configuration(format!(
                    "{} strategy requires the '{}' parameter",
                    RELEASE_DATE, RELEASE_DATE_PARAM
                ))),
            },
            _ => match self.evaluators.get(type_name) {
                Some(evaluator) => FlippingStrategy::custom(type_name, params, evaluator.clone()),
                None => Err(Error::UnknownStrategy(type_name.to_string())),
            },
        }
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.evaluators.keys().collect();
        names.sort();
        f.debug_struct("StrategyRegistry")
            .field("custom", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_common::UserAllowList;
    use chrono::{Duration, TimeZone};
    use maplit::btreemap;
    use spectral::prelude::*;
    use test_case::test_case;

    fn allow_list(users: &str) -> FlippingStrategy {
        FlippingStrategy::custom(
            "UserAllowList",
            btreemap! {"users".to_string() => users.to_string()},
            Arc::new(UserAllowList),
        )
        .unwrap()
    }

    #[test_case(FlippingStrategy::AlwaysOn, true)]
    #[test_case(FlippingStrategy::AlwaysOff, false)]
    fn trivial_strategies(strategy: FlippingStrategy, expected: bool) {
        let ctx = ExecutionContext::new();
        assert_that!(strategy.evaluate("any", &ctx)).is_equal_to(expected);
        assert_that!(strategy.init_params()).is_equal_to(InitParams::new());
    }

    #[test]
    fn release_date_parses_fixed_format() {
        let strategy = FlippingStrategy::release_date("2013-07-14-14:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2013, 7, 14, 14, 0, 0).unwrap();
        assert_that!(strategy).is_equal_to(FlippingStrategy::ReleaseDate {
            release_date: expected,
        });
        assert_that!(strategy.init_params().get(RELEASE_DATE_PARAM))
            .contains_value(&"2013-07-14-14:00".to_string());
    }

    #[test_case("2013/07/14 14:00"; "wrong separators")]
    #[test_case("2013-13-14-14:00"; "month out of range")]
    #[test_case(""; "empty")]
    #[test_case("tomorrow"; "free text")]
    fn malformed_release_date_fails_at_construction(text: &str) {
        let result = FlippingStrategy::release_date(text);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn release_date_is_inclusive() {
        let now = Utc::now();
        let ctx = ExecutionContext::at(now);

        let past = FlippingStrategy::release_date_at(now - Duration::days(1));
        let future = FlippingStrategy::release_date_at(now + Duration::days(1));
        let exact = FlippingStrategy::release_date_at(now);

        asserting!("past release date is active")
            .that(&past.evaluate("f", &ctx))
            .is_true();
        asserting!("future release date is inactive")
            .that(&future.evaluate("f", &ctx))
            .is_false();
        asserting!("release date equal to now is active")
            .that(&exact.evaluate("f", &ctx))
            .is_true();
    }

    #[test]
    fn custom_strategy_uses_registered_evaluator() {
        let strategy = allow_list("alice,bob");

        assert_that!(strategy.type_name()).is_equal_to("UserAllowList");
        assert!(strategy.evaluate("f", &ExecutionContext::new().with_user("bob")));
        assert!(!strategy.evaluate("f", &ExecutionContext::new().with_user("carol")));
        assert!(!strategy.evaluate("f", &ExecutionContext::new()));
    }

    #[test]
    fn custom_strategy_validates_params_at_construction() {
        let result = FlippingStrategy::custom(
            "UserAllowList",
            InitParams::new(),
            Arc::new(UserAllowList),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn custom_strategies_compare_by_configuration() {
        assert_that!(allow_list("alice")).is_equal_to(allow_list("alice"));
        assert_that!(allow_list("alice")).is_not_equal_to(allow_list("bob"));
    }

    #[test]
    fn registry_resolves_built_ins_and_registered_types() {
        let mut registry = StrategyRegistry::new();
        registry
            .register("UserAllowList", Arc::new(UserAllowList))
            .unwrap();

        assert_that!(registry.build(ALWAYS_ON, InitParams::new()))
            .is_ok()
            .is_equal_to(FlippingStrategy::AlwaysOn);
        assert_that!(registry.build(
            RELEASE_DATE,
            btreemap! {RELEASE_DATE_PARAM.to_string() => "2030-01-01-00:00".to_string()}
        ))
        .is_ok();
        assert_that!(registry.build(
            "UserAllowList",
            btreemap! {"users".to_string() => "alice".to_string()}
        ))
        .is_ok()
        .is_equal_to(allow_list("alice"));
    }

    #[test]
    fn registry_rejects_unknown_types() {
        let registry = StrategyRegistry::new();
        assert_that!(registry.build("Ponies", InitParams::new()))
            .is_err()
            .is_equal_to(Error::UnknownStrategy("Ponies".to_string()));
        assert!(!registry.is_registered("Ponies"));
        assert!(registry.is_registered(RELEASE_DATE));
    }

    #[test]
    fn registry_requires_release_date_param() {
        let registry = StrategyRegistry::new();
        let result = registry.build(RELEASE_DATE, InitParams::new());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test_case(ALWAYS_ON)]
    #[test_case(ALWAYS_OFF)]
    #[test_case(RELEASE_DATE)]
    #[test_case("")]
    fn custom_strategy_refuses_reserved_names(name: &str) {
        let result = FlippingStrategy::custom(
            name,
            btreemap! {"users".to_string() => "alice".to_string()},
            Arc::new(UserAllowList),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test_case(ALWAYS_ON)]
    #[test_case(RELEASE_DATE)]
    #[test_case("")]
    fn registry_refuses_reserved_names(name: &str) {
        let mut registry = StrategyRegistry::new();
        let result = registry.register(name, Arc::new(UserAllowList)).map(|_| ());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
