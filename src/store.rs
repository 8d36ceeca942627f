use std::collections::BTreeMap;

use log::debug;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::marshaller::Marshaller;

/// FeatureStore is the contract for anything that holds and mutates features.
///
/// Features returned by [FeatureStore::read] and [FeatureStore::read_all] are detached copies:
/// changing them has no effect until they are passed back through [FeatureStore::update].
///
/// Every mutating operation must be atomic with respect to concurrent callers working on the
/// same id. Backends only need to guarantee this for [FeatureStore::create],
/// [FeatureStore::update], [FeatureStore::delete] and [FeatureStore::modify]; the role and
/// enablement operations are expressed through `modify`.
pub trait FeatureStore: Send + Sync {
    /// Insert a new feature. Fails if the id is empty or already present.
    fn create(&self, feature: Feature) -> Result<()>;

    /// Retrieve a copy of the feature with id `id`.
    fn read(&self, id: &str) -> Result<Feature>;

    /// Replace the stored state of an existing feature.
    fn update(&self, feature: Feature) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;

    fn exists(&self, id: &str) -> bool;

    /// A consistent snapshot of every feature, in an order that is stable for a given store
    /// content.
    fn read_all(&self) -> Result<Vec<Feature>>;

    /// Apply `change` to the stored feature `id` as a single read-modify-write step.
    ///
    /// `change` may run while the store holds a lock, so it must not call back into the store.
    fn modify(&self, id: &str, change: &mut dyn FnMut(&mut Feature)) -> Result<()>;

    /// Add `role` to the feature's authorized roles. Granting a held role is a no-op.
    fn grant_role(&self, id: &str, role: &str) -> Result<()> {
        self.modify(id, &mut |feature| {
            feature.authorized_roles.insert(role.to_string());
        })
    }

    /// Remove `role` from the feature's authorized roles. Revoking an absent role is a no-op.
    fn revoke_role(&self, id: &str, role: &str) -> Result<()> {
        self.modify(id, &mut |feature| {
            feature.authorized_roles.remove(role);
        })
    }

    fn enable(&self, id: &str) -> Result<()> {
        self.modify(id, &mut |feature| feature.enabled = true)
    }

    fn disable(&self, id: &str) -> Result<()> {
        self.modify(id, &mut |feature| feature.enabled = false)
    }
}

/// InMemoryStore keeps features in a map guarded by a single read-write lock.
///
/// Mutations hold the write lock for their whole critical section, so role updates on the same
/// feature never interleave. Iteration order is lexicographic by id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    features: RwLock<BTreeMap<String, Feature>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `features`. Fails on the first empty or duplicated id.
    pub fn with_features<I>(features: I) -> Result<Self>
    where
        I: IntoIterator<Item = Feature>,
    {
        let store = Self::new();
        for feature in features {
            store.create(feature)?;
        }
        Ok(store)
    }

    /// Build a store from a JSON array of features, see [crate::marshaller].
    pub fn from_json(text: &str, marshaller: &Marshaller) -> Result<Self> {
        Self::with_features(marshaller.decode_features(text)?)
    }

    pub fn len(&self) -> usize {
        self.features.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.read().is_empty()
    }
}

impl FeatureStore for InMemoryStore {
    fn create(&self, feature: Feature) -> Result<()> {
        if feature.id().is_empty() {
            return Err(Error::InvalidFeatureId);
        }
        let mut features = self.features.write();
        if features.contains_key(feature.id()) {
            return Err(Error::FeatureAlreadyExists(feature.id().to_string()));
        }
        debug!("Creating feature {}", feature.id());
        features.insert(feature.id().to_string(), feature);
        Ok(())
    }

    fn read(&self, id: &str) -> Result<Feature> {
        self.features
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::FeatureNotFound(id.to_string()))
    }

    fn update(&self, feature: Feature) -> Result<()> {
        let mut features = self.features.write();
        match features.get_mut(feature.id()) {
            Some(stored) => {
                debug!("Updating feature {}", feature.id());
                *stored = feature;
                Ok(())
            }
            None => Err(Error::FeatureNotFound(feature.id().to_string())),
        }
    }

    fn delete(&self, id: &str) -> Result<()> {
        match self.features.write().remove(id) {
            Some(_) => {
                debug!("Deleted feature {}", id);
                Ok(())
            }
            None => Err(Error::FeatureNotFound(id.to_string())),
        }
    }

    fn exists(&self, id: &str) -> bool {
        self.features.read().contains_key(id)
    }

    fn read_all(&self) -> Result<Vec<Feature>> {
        Ok(self.features.read().values().cloned().collect())
    }

    fn modify(&self, id: &str, change: &mut dyn FnMut(&mut Feature)) -> Result<()> {
        let mut features = self.features.write();
        let feature = features
            .get_mut(id)
            .ok_or_else(|| Error::FeatureNotFound(id.to_string()))?;
        change(feature);
        debug!("Modified feature {}", id);
        Ok(())
    }
}
