// ── Local user account types ──

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::entity_id::EntityId;

/// Longest permitted username.
pub const MAX_USERNAME_LEN: usize = 32;

/// Expiration dates are rendered and stored as MM/DD/YYYY.
pub const EXPIRES_FORMAT: &str = "%m/%d/%Y";

/// Who defined an account.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scope {
    /// Built-in account; cannot be deleted or renamed here.
    System,
    /// Operator-managed account.
    #[default]
    User,
}

/// Per-user web console preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
#[serde(default)]
pub struct UiPreferences {
    pub custom_settings: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgui_css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgui_fixed_menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgui_hostname_menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_columns: Option<u8>,
    pub interfaces_sort: bool,
    pub dashboard_available_widgets_panel: bool,
    pub system_logs_filter_panel: bool,
    pub system_logs_manage_log_panel: bool,
    pub status_monitoring_settings_panel: bool,
    pub webgui_left_column_hyper: bool,
    pub disable_alias_popup_detail: bool,
    pub page_name_first: bool,
}

/// A local account.
///
/// Group membership is not stored here; it lives on [`Group::members`](super::Group)
/// and is derived by cross-referencing uids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    pub uid: u32,
    #[serde(default)]
    pub descr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<NaiveDate>,
    #[serde(default)]
    pub disabled: bool,
    /// bcrypt hash of the console password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipsecpsk: Option<String>,
    /// SSH authorized keys, base64-encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_keys: Option<String>,
    #[serde(default)]
    pub prefs: UiPreferences,
    /// References into `SystemConfig::certs`.
    #[serde(default)]
    pub certs: Vec<EntityId>,
    /// Directly assigned privilege names.
    #[serde(default)]
    pub privileges: Vec<String>,
    #[serde(default)]
    pub keep_history: bool,
}

impl User {
    /// A fresh operator-managed account with no optional data.
    pub fn new(name: impl Into<String>, uid: u32) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            scope: Scope::User,
            uid,
            descr: String::new(),
            expires: None,
            disabled: false,
            password_hash: None,
            ipsecpsk: None,
            authorized_keys: None,
            prefs: UiPreferences::default(),
            certs: Vec::new(),
            privileges: Vec::new(),
            keep_history: false,
        }
    }

    pub fn is_system(&self) -> bool {
        self.scope == Scope::System
    }

    /// Expiration date rendered for forms and listings.
    pub fn expires_display(&self) -> String {
        self.expires
            .map(|d| d.format(EXPIRES_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Decoded authorized keys, empty when unset or undecodable.
    pub fn authorized_keys_text(&self) -> String {
        use base64::Engine as _;
        self.authorized_keys
            .as_deref()
            .and_then(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    }

    /// Store authorized keys in their encoded form; empty input clears them.
    pub fn set_authorized_keys(&mut self, text: &str) {
        use base64::Engine as _;
        self.authorized_keys = if text.trim().is_empty() {
            None
        } else {
            Some(base64::engine::general_purpose::STANDARD.encode(text))
        };
    }
}
