//! Administrative commands against a [FeatureStore].
//!
//! A console (web page, CLI, chat bot) turns user input into an [AdminCommand], runs it with
//! [execute] and shows the resulting [Notice]. Failures never escape as errors here: they are
//! mapped to messages the operator can act on.

use log::{info, warn};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::marshaller::Marshaller;
use crate::store::FeatureStore;
use crate::transfer;

/// An operation requested from the admin console.
#[derive(Clone, Debug, PartialEq)]
pub enum AdminCommand {
    Enable { id: String },
    Disable { id: String },
    /// Create a new, disabled feature.
    Create {
        id: String,
        description: Option<String>,
    },
    Delete { id: String },
    UpdateDescription {
        id: String,
        description: Option<String>,
    },
    GrantRole { id: String, role: String },
    RevokeRole { id: String, role: String },
    /// Import a JSON array of features, see [crate::marshaller].
    Import { json: String },
    /// Export every feature as a JSON array, returned as the notice body.
    Export,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// The outcome of a command, ready to be displayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Content to hand to the operator, such as the file produced by [AdminCommand::Export].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Notice {
    fn info(message: String) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message,
            body: None,
        }
    }

    fn error(message: String) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message,
            body: None,
        }
    }

    fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Run `command` against `store`.
pub fn execute(
    store: &dyn FeatureStore,
    marshaller: &Marshaller,
    command: AdminCommand,
) -> Notice {
    if let Some(id) = command.target() {
        if id.is_empty() {
            return Notice::error("A feature id is required".to_string());
        }
    }
    match apply(store, marshaller, &command) {
        Ok(notice) => {
            info!("{}", notice.message);
            notice
        }
        Err(e) => {
            warn!("Admin command {:?} failed: {}", command, e);
            Notice::error(describe(&e))
        }
    }
}

impl AdminCommand {
    /// The feature the command acts on, if it targets a single one.
    pub fn target(&self) -> Option<&str> {
        match self {
            AdminCommand::Enable { id }
            | AdminCommand::Disable { id }
            | AdminCommand::Create { id, .. }
            | AdminCommand::Delete { id }
            | AdminCommand::UpdateDescription { id, .. }
            | AdminCommand::GrantRole { id, .. }
            | AdminCommand::RevokeRole { id, .. } => Some(id),
            AdminCommand::Import { .. } | AdminCommand::Export => None,
        }
    }
}

fn apply(
    store: &dyn FeatureStore,
    marshaller: &Marshaller,
    command: &AdminCommand,
) -> Result<Notice> {
    let message = match command {
        AdminCommand::Enable { id } => {
            store.enable(id)?;
            format!("Feature {} has been successfully enabled", id)
        }
        AdminCommand::Disable { id } => {
            store.disable(id)?;
            format!("Feature {} has been successfully disabled", id)
        }
        AdminCommand::Create { id, description } => {
            let mut feature = Feature::new(id.as_str(), false);
            feature.description = description.clone();
            store.create(feature)?;
            format!("Feature {} has been successfully added", id)
        }
        AdminCommand::Delete { id } => {
            store.delete(id)?;
            format!("Feature {} has been successfully deleted", id)
        }
        AdminCommand::UpdateDescription { id, description } => {
            store.modify(id, &mut |feature| feature.description = description.clone())?;
            format!("Feature {} has been successfully updated", id)
        }
        AdminCommand::GrantRole { id, role } => {
            store.grant_role(id, role)?;
            format!(
                "Role {} has been successfully added to feature {}",
                role, id
            )
        }
        AdminCommand::RevokeRole { id, role } => {
            store.revoke_role(id, role)?;
            format!(
                "Role {} has been successfully removed from feature {}",
                role, id
            )
        }
        AdminCommand::Import { json } => {
            let summary = transfer::import_json(store, marshaller, json)?;
            format!(
                "Import complete: {} features created, {} updated",
                summary.created, summary.updated
            )
        }
        AdminCommand::Export => {
            let json = transfer::export_json(store, marshaller)?;
            return Ok(
                Notice::info("Features have been successfully exported".to_string())
                    .with_body(json),
            );
        }
    };
    Ok(Notice::info(message))
}

fn describe(error: &Error) -> String {
    match error {
        Error::FeatureNotFound(id) => format!("Feature {} does not exist", id),
        Error::FeatureAlreadyExists(id) => format!("Feature {} already exists", id),
        Error::InvalidFeatureId => "A feature id is required".to_string(),
        Error::UnknownStrategy(name) => format!("Strategy {} is not supported", name),
        Error::Configuration(message) => format!("Invalid configuration: {}", message),
        Error::Malformed(message) => format!("Invalid import file: {}", message),
        Error::Store(message) => format!("The feature store failed: {}", message),
    }
}
