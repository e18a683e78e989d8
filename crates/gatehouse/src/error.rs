//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use gatehouse_config::ConfigError;
use gatehouse_core::CoreError;
use gatehouse_core::error::READ_ONLY_MESSAGE;
use gatehouse_web::WebError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Identity ─────────────────────────────────────────────────────
    #[error("'{username}' is not an active account")]
    #[diagnostic(
        code(gatehouse::unknown_actor),
        help(
            "Pass --actor with an enabled, unexpired username,\n\
             or set `cli.actor` in the config file."
        )
    )]
    UnknownActor { username: String },

    #[error("{message}")]
    #[diagnostic(
        code(gatehouse::read_only),
        help("Act as an operator without the read-only privilege.")
    )]
    ReadOnly { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(gatehouse::not_found),
        help("Run: gatehouse {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Captive portal zone '{zone}' not found")]
    #[diagnostic(
        code(gatehouse::zone_not_found),
        help("Run: gatehouse zones list")
    )]
    ZoneNotFound { zone: String },

    #[error("{summary}")]
    #[diagnostic(code(gatehouse::refused))]
    Refused {
        summary: String,
        #[help]
        details: Option<String>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("The request was rejected")]
    #[diagnostic(code(gatehouse::validation))]
    Rejected {
        #[help]
        messages: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gatehouse::invalid_argument))]
    Validation { field: String, reason: String },

    #[error("A captive portal zone is required")]
    #[diagnostic(
        code(gatehouse::zone_required),
        help("Pass --zone <NAME> or set GATEHOUSE_ZONE.")
    )]
    ZoneRequired,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists")]
    #[diagnostic(
        code(gatehouse::config_exists),
        help("Use --force to overwrite {path}")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(gatehouse::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(gatehouse::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Underlying failures ──────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(gatehouse::core))]
    Core(CoreError),

    #[error(transparent)]
    #[diagnostic(code(gatehouse::web))]
    Web(#[from] WebError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(gatehouse::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(gatehouse::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::ZoneNotFound { .. } => exit_code::NOT_FOUND,
            Self::UnknownActor { .. } | Self::ReadOnly { .. } => exit_code::PERMISSION,
            Self::Refused { .. } | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Rejected { .. }
            | Self::Validation { .. }
            | Self::ZoneRequired
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn list_command(entity_type: &str) -> &'static str {
    match entity_type {
        "allowed hostname" => "hostnames list --zone <ZONE>",
        "certificate association" | "privilege" => "users show <USER>",
        "certificate authority" => "users add --help",
        _ => "users list",
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => CliError::Rejected {
                messages: errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            CoreError::ReadOnly => CliError::ReadOnly {
                message: READ_ONLY_MESSAGE.to_owned(),
            },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command(&entity_type).to_owned(),
                resource_type: entity_type,
                identifier,
            },
            CoreError::ZoneNotFound { zone } => CliError::ZoneNotFound { zone },
            other => CliError::Core(other),
        }
    }
}
