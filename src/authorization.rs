use std::collections::{BTreeSet, HashSet};

/// AuthorizationManager resolves the roles held by whoever is currently calling.
///
/// It is consulted only for features that carry authorized roles, and it is asked again on every
/// evaluation: implementations must reflect the live caller and never cache across calls.
pub trait AuthorizationManager: Send + Sync {
    /// The role names held by the current caller.
    fn current_roles(&self) -> HashSet<String>;
}

impl<F> AuthorizationManager for F
where
    F: Fn() -> HashSet<String> + Send + Sync,
{
    fn current_roles(&self) -> HashSet<String> {
        self()
    }
}

/// Returns true if a caller holding `held` may see a feature restricted to `required`.
///
/// A feature without required roles is visible to everyone.
pub fn is_authorized(required: &BTreeSet<String>, held: &HashSet<String>) -> bool {
    required.is_empty() || required.iter().any(|role| held.contains(role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::{btreeset, hashset};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    #[test_case(btreeset! {}, hashset! {}, true; "unrestricted with no roles")]
    #[test_case(btreeset! {}, hashset! {"user".to_string()}, true; "unrestricted with roles")]
    #[test_case(btreeset! {"admin".to_string()}, hashset! {}, false; "restricted with no roles")]
    #[test_case(btreeset! {"admin".to_string()}, hashset! {"user".to_string()}, false; "restricted with other roles")]
    #[test_case(btreeset! {"admin".to_string()}, hashset! {"admin".to_string(), "user".to_string()}, true; "restricted with matching role")]
    fn authorization_gate(required: BTreeSet<String>, held: HashSet<String>, expected: bool) {
        assert_eq!(is_authorized(&required, &held), expected);
    }

    #[test]
    fn closures_are_asked_on_every_call() {
        let calls = AtomicUsize::new(0);
        let manager = || {
            calls.fetch_add(1, Ordering::SeqCst);
            hashset! {"admin".to_string()}
        };

        assert!(manager.current_roles().contains("admin"));
        assert!(manager.current_roles().contains("admin"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
