use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// ExecutionContext carries everything a [crate::FlippingStrategy] may look at when deciding
/// whether a feature is active: the evaluation time, the caller (if known) and free-form string
/// attributes supplied by the host application.
///
/// A context is built per call and is never stored alongside a feature.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionContext {
    now: DateTime<Utc>,
    user: Option<String>,
    attributes: HashMap<String, String>,
}

impl ExecutionContext {
    /// Create a context evaluated at the current wall-clock time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a context evaluated at a fixed instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            user: None,
            attributes: HashMap::new(),
        }
    }

    /// Sets the key identifying the caller.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets a string attribute, replacing any previous value for `name`.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spectral::prelude::*;

    #[test]
    fn builder_sets_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let ctx = ExecutionContext::at(at)
            .with_user("alice")
            .with_attribute("region", "eu")
            .with_attribute("region", "us");

        assert_that!(ctx.now()).is_equal_to(at);
        assert_that!(ctx.user()).contains_value("alice");
        assert_that!(ctx.attribute("region")).contains_value("us");
        assert_that!(ctx.attribute("missing")).is_none();
    }

    #[test]
    fn default_has_no_caller() {
        let ctx = ExecutionContext::default();
        assert_that!(ctx.user()).is_none();
    }
}
