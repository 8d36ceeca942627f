//! Runtime feature toggles.
//!
//! A [Feature] is switched on and off in a [FeatureStore] and checked by application code through
//! a [FeatureToggle]. Activation may be delegated to a [FlippingStrategy], and restricted to
//! callers holding particular roles via an [AuthorizationManager]. Feature sets are exchanged
//! with other systems using the canonical JSON encoding of the [marshaller] module.

mod admin;
mod authorization;
mod context;
mod error;
mod eval;
mod feature;
pub mod global;
pub mod marshaller;
mod store;
mod strategy;
mod test_common;
mod toggle;
mod transfer;

pub use admin::*;
pub use authorization::*;
pub use context::*;
pub use error::*;
pub use eval::*;
pub use feature::*;
pub use marshaller::Marshaller;
pub use store::*;
pub use strategy::*;
pub use toggle::*;
pub use transfer::*;
