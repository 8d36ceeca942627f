//! Import and export of feature sets.
//!
//! Parsing an external configuration format is the caller's job; importing takes features keyed
//! by id and folds them into a store, creating the missing ones and replacing the others.

use log::info;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::marshaller::Marshaller;
use crate::store::FeatureStore;

/// Counts of what an import did to the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

/// Fold `features` into `store`.
///
/// Each key must equal the id of its feature. Entries are applied in order; on error the entries
/// already applied stay in the store.
pub fn import_features<I>(store: &dyn FeatureStore, features: I) -> Result<ImportSummary>
where
    I: IntoIterator<Item = (String, Feature)>,
{
    let mut summary = ImportSummary::default();
    for (id, feature) in features {
        if id != feature.id() {
            return Err(Error::Configuration(format!(
                "import key '{}' does not match feature id '{}'",
                id,
                feature.id()
            )));
        }
        info!("Processing feature {}", id);
        if store.exists(&id) {
            store.update(feature)?;
            summary.updated += 1;
        } else {
            store.create(feature)?;
            summary.created += 1;
        }
    }
    Ok(summary)
}

/// Decode a JSON array of features and import them.
pub fn import_json(
    store: &dyn FeatureStore,
    marshaller: &Marshaller,
    text: &str,
) -> Result<ImportSummary> {
    let features = marshaller.decode_features(text)?;
    import_features(
        store,
        features
            .into_iter()
            .map(|feature| (feature.id().to_string(), feature)),
    )
}

/// Every feature of `store`, in store order, ready to be handed to a serializer.
pub fn export_features(store: &dyn FeatureStore) -> Result<Vec<Feature>> {
    store.read_all()
}

/// Every feature of `store` as a JSON array.
pub fn export_json(store: &dyn FeatureStore, marshaller: &Marshaller) -> Result<String> {
    Ok(marshaller.encode_features(&export_features(store)?))
}
