// ── Typed request structs for form submissions ──
//
// Fields mirror what a browser sends: `None` means the field was absent
// from the submission, `Some("")` means it was sent empty. Validation turns
// these into model values.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

// ── Captive portal ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHostnameRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bw_up: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bw_down: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
}

// ── Users ──────────────────────────────────────────────────────────

/// Certificate to issue alongside a new account. Only honored on create,
/// and only when `name` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keytype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keylen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<String>,
}

impl CertRequest {
    pub fn is_requested(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Web console preference fields. Checkboxes are `true` only when sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
#[serde(default)]
pub struct PreferenceFields {
    pub custom_settings: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgui_css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgui_fixed_menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgui_hostname_menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_columns: Option<String>,
    pub interfaces_sort: bool,
    pub dashboard_available_widgets_panel: bool,
    pub system_logs_filter_panel: bool,
    pub system_logs_manage_log_panel: bool,
    pub status_monitoring_settings_panel: bool,
    pub webgui_left_column_hyper: bool,
    pub disable_alias_popup_detail: bool,
    pub page_name_first: bool,
}

/// A submitted user form. Passwords never leave this struct unredacted.
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SaveUserRequest {
    pub username: Option<String>,
    pub old_username: Option<String>,
    pub password: Option<SecretString>,
    pub password_confirm: Option<SecretString>,
    pub descr: Option<String>,
    pub expires: Option<String>,
    /// Account scope, `user` or `system`.
    pub utype: Option<String>,
    pub disabled: bool,
    pub keep_history: bool,
    pub ipsecpsk: Option<String>,
    pub authorized_keys: Option<String>,
    pub groups: Vec<String>,
    pub prefs: PreferenceFields,
    pub cert: CertRequest,
}

impl SaveUserRequest {
    /// Convenience constructor for the common create case.
    pub fn new_user(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_owned()),
            password: Some(SecretString::from(password.to_owned())),
            password_confirm: Some(SecretString::from(password.to_owned())),
            ..Self::default()
        }
    }
}
