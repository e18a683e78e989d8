// ── Form body decoding ──
//
// Browser forms repeat keys for multi-selects (`groups[]`) and checkbox
// lists (`delete_check[]`), and omit unchecked checkboxes entirely. Bodies
// are decoded into ordered pairs and mapped onto the core request types.

use secrecy::SecretString;

use gatehouse_core::{
    CertRequest, EntityId, PreferenceFields, SaveHostnameRequest, SaveUserRequest,
};

use crate::error::WebError;

/// An urlencoded form body as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData(Vec<(String, String)>);

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl FormData {
    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_owned)
    }

    /// Every value sent for `key` or `key[]`, in submission order.
    pub fn all(&self, key: &str) -> Vec<String> {
        let bracketed = format!("{key}[]");
        self.0
            .iter()
            .filter(|(k, _)| *k == key || *k == bracketed)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Checkbox state: checked when the key was sent at all.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Optional identifier; an empty value counts as absent.
    pub fn id(&self, key: &str) -> Result<Option<EntityId>, WebError> {
        parse_id(key, self.get(key))
    }

    pub fn require_id(&self, key: &str) -> Result<EntityId, WebError> {
        self.id(key)?
            .ok_or_else(|| WebError::BadRequest(format!("missing {key}")))
    }

    pub fn ids(&self, key: &str) -> Result<Vec<EntityId>, WebError> {
        self.all(key)
            .iter()
            .map(|raw| {
                raw.parse()
                    .map_err(|_| WebError::BadRequest(format!("invalid {key}: {raw}")))
            })
            .collect()
    }

    fn secret(&self, key: &str) -> Option<SecretString> {
        self.text(key).map(SecretString::from)
    }
}

/// Parse an identifier from a form field or query parameter.
pub fn parse_id(key: &str, raw: Option<&str>) -> Result<Option<EntityId>, WebError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| WebError::BadRequest(format!("invalid {key}: {raw}"))),
    }
}

pub fn hostname_request(form: &FormData) -> SaveHostnameRequest {
    SaveHostnameRequest {
        hostname: form.text("hostname"),
        dir: form.text("dir"),
        sn: form.text("sn"),
        bw_up: form.text("bw_up"),
        bw_down: form.text("bw_down"),
        descr: form.text("descr"),
    }
}

pub fn user_request(form: &FormData) -> SaveUserRequest {
    SaveUserRequest {
        username: form.text("usernamefld"),
        old_username: form.text("oldusername"),
        password: form.secret("passwordfld1"),
        password_confirm: form.secret("passwordfld2"),
        descr: form.text("descr"),
        expires: form.text("expires"),
        utype: form.text("utype"),
        disabled: form.flag("disabled"),
        keep_history: form.flag("keephistory"),
        ipsecpsk: form.text("ipsecpsk"),
        authorized_keys: form.text("authorizedkeys"),
        groups: form.all("groups"),
        prefs: PreferenceFields {
            custom_settings: form.flag("customsettings"),
            webgui_css: form.text("webguicss"),
            webgui_fixed_menu: form.text("webguifixedmenu"),
            webgui_hostname_menu: form.text("webguihostnamemenu"),
            dashboard_columns: form.text("dashboardcolumns"),
            interfaces_sort: form.flag("interfacessort"),
            dashboard_available_widgets_panel: form.flag("dashboardavailablewidgetspanel"),
            system_logs_filter_panel: form.flag("systemlogsfilterpanel"),
            system_logs_manage_log_panel: form.flag("systemlogsmanagelogpanel"),
            status_monitoring_settings_panel: form.flag("statusmonitoringsettingspanel"),
            webgui_left_column_hyper: form.flag("webguileftcolumnhyper"),
            disable_alias_popup_detail: form.flag("disablealiaspopupdetail"),
            page_name_first: form.flag("pagenamefirst"),
        },
        cert: CertRequest {
            name: form.text("name"),
            caref: form.text("caref"),
            keytype: form.text("keytype"),
            keylen: form.text("keylen"),
            ecname: form.text("ecname"),
            digest: form.text("digest_alg"),
            lifetime: form.text("lifetime"),
        },
    }
}
