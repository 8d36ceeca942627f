//! Canonical JSON encoding of features.
//!
//! A feature is written as a compact JSON object with a fixed field order:
//!
//! ```text
//! {"uid":"f1","enabled":true,"description":"some text","flippingStrategy":{"type":"ReleaseDate","initParams":{"releaseDate":"2027-01-01-00:00"}},"permissions":["ADMIN","USER"]}
//! ```
//!
//! `description` is `null` when absent, `flippingStrategy` is omitted when absent and
//! `permissions` is always an array. The output is exactly what `serde_json` would produce for a
//! derived struct with the same fields. The object layout is written by hand so it cannot drift
//! with the [Feature] type; string leaves are escaped by `serde_json`.

use itertools::Itertools;
use log::debug;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::strategy::{InitParams, StrategyRegistry};

/// Encode a single feature.
pub fn encode_feature(feature: &Feature) -> String {
    let mut out = String::with_capacity(96);
    write_feature(&mut out, feature);
    out
}

/// Encode features as a JSON array, keeping their order. An empty slice encodes as `[]`.
pub fn encode_features(features: &[Feature]) -> String {
    format!("[{}]", features.iter().map(encode_feature).join(","))
}

fn write_feature(out: &mut String, feature: &Feature) {
    out.push_str("{\"uid\":");
    write_string(out, feature.id());

    out.push_str(",\"enabled\":");
    out.push_str(if feature.enabled { "true" } else { "false" });

    out.push_str(",\"description\":");
    match &feature.description {
        Some(description) => write_string(out, description),
        None => out.push_str("null"),
    }

    if let Some(strategy) = &feature.strategy {
        out.push_str(",\"flippingStrategy\":{\"type\":");
        write_string(out, strategy.type_name());
        out.push_str(",\"initParams\":{");
        for (i, (name, value)) in strategy.init_params().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_string(out, name);
            out.push(':');
            write_string(out, value);
        }
        out.push_str("}}");
    }

    out.push_str(",\"permissions\":[");
    for (i, role) in feature.authorized_roles.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, role);
    }
    out.push_str("]}");
}

fn write_string(out: &mut String, value: &str) {
    // The Display impl of a JSON value writes compact serde_json output and cannot fail.
    out.push_str(&serde_json::Value::from(value).to_string());
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureRecord {
    uid: String,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    flipping_strategy: Option<StrategyRecord>,
    #[serde(default)]
    permissions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrategyRecord {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    init_params: InitParams,
}

/// Marshaller encodes features and decodes them back, resolving strategy discriminators through
/// its [StrategyRegistry].
#[derive(Clone, Debug, Default)]
pub struct Marshaller {
    registry: StrategyRegistry,
}

impl Marshaller {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn encode_feature(&self, feature: &Feature) -> String {
        encode_feature(feature)
    }

    pub fn encode_features(&self, features: &[Feature]) -> String {
        encode_features(features)
    }

    /// Decode a single feature.
    ///
    /// Fails with [Error::UnknownStrategy] if the strategy type is neither built in nor
    /// registered, [Error::Configuration] if its parameters are invalid and [Error::Malformed] if
    /// the text is not a feature object.
    pub fn decode_feature(&self, text: &str) -> Result<Feature> {
        let record: FeatureRecord =
            serde_json::from_str(text).map_err(|e| Error::Malformed(e.to_string()))?;
        self.feature_from_record(record)
    }

    /// Decode a JSON array of features, keeping their order.
    pub fn decode_features(&self, text: &str) -> Result<Vec<Feature>> {
        let records: Vec<FeatureRecord> =
            serde_json::from_str(text).map_err(|e| Error::Malformed(e.to_string()))?;
        debug!("Decoding {} features", records.len());
        records
            .into_iter()
            .map(|record| self.feature_from_record(record))
            .collect()
    }

    fn feature_from_record(&self, record: FeatureRecord) -> Result<Feature> {
        if record.uid.is_empty() {
            return Err(Error::InvalidFeatureId);
        }
        let mut feature = Feature::new(record.uid, record.enabled).with_roles(record.permissions);
        feature.description = record.description;
        if let Some(strategy) = record.flipping_strategy {
            feature.strategy = Some(
                self.registry
                    .build(&strategy.type_name, strategy.init_params)?,
            );
        }
        Ok(feature)
    }
}
