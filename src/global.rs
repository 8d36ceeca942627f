//! Process-wide [FeatureToggle] slot.
//!
//! Library code should take a [FeatureToggle] (or its store) as a parameter. This slot exists for
//! application entry points and framework glue that have no other way to reach the instance
//! built at startup.

use std::sync::Arc;

use lazy_static::lazy_static;
use log::{debug, warn};
use parking_lot::RwLock;

use crate::toggle::FeatureToggle;

lazy_static! {
    static ref GLOBAL_TOGGLE: RwLock<Option<Arc<FeatureToggle>>> = RwLock::new(None);
}

/// Install `toggle` as the process-wide instance, returning the one it replaces.
pub fn install(toggle: FeatureToggle) -> Option<Arc<FeatureToggle>> {
    let previous = GLOBAL_TOGGLE.write().replace(Arc::new(toggle));
    if previous.is_some() {
        warn!("Replacing the installed feature toggle");
    } else {
        debug!("Installed feature toggle");
    }
    previous
}

/// The process-wide instance, if one has been installed.
pub fn get() -> Option<Arc<FeatureToggle>> {
    GLOBAL_TOGGLE.read().clone()
}

/// Remove the process-wide instance, returning it.
pub fn uninstall() -> Option<Arc<FeatureToggle>> {
    GLOBAL_TOGGLE.write().take()
}
