// ── User manager ──
//
// List, create, edit and delete local accounts. Every write goes through
// the same sequence: read-only gate, validation, mutation of a loaded copy
// of the aggregate, one persist, index rebuild, then system hooks.

use chrono::{Local, NaiveDate};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::Gatehouse;
use crate::actor::Actor;
use crate::command::{CertRequest, PreferenceFields, SaveUserRequest, UserAction};
use crate::error::CoreError;
use crate::expires::{self, INVALID_EXPIRES};
use crate::issuer::IssueParams;
use crate::model::cert::{
    DEFAULT_CURVE, DEFAULT_KEY_LENGTH, DEFAULT_LIFETIME_DAYS, EC_CURVES, RSA_KEY_LENGTHS,
};
use crate::model::privilege::{self, EffectivePrivilege};
use crate::model::user::MAX_USERNAME_LEN;
use crate::model::{
    ALL_GROUP, DigestAlgorithm, EntityId, KeySpec, KeyType, Scope, UiPreferences, User,
};
use crate::password::PasswordPolicy;
use crate::reserved::ReservedNames;
use crate::store::{ChangeNote, SystemConfig};
use crate::validation::{ValidationErrors, require};

/// Prefix the console uses for account changes in the system log.
pub const LOG_PREFIX: &str = "Local User Database";

const SSHD: &str = "sshd";
const MAX_LIFETIME_DAYS: u32 = 12000;
pub const MAX_DASHBOARD_COLUMNS: u8 = 6;
pub const HOSTNAME_MENU_VALUES: &[&str] = &["hostonly", "fqdn"];

// ── Views ───────────────────────────────────────────────────────────

/// One row of the user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: EntityId,
    pub name: String,
    pub descr: String,
    pub scope: Scope,
    pub disabled: bool,
    /// Group names, excluding `all`.
    pub groups: Vec<String>,
    /// Not a system account and not the acting operator.
    pub deletable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRow {
    pub refid: EntityId,
    pub descr: String,
    pub ca: String,
    pub revoked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaChoice {
    pub refid: EntityId,
    pub descr: String,
}

/// Everything the user editor needs to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct UserForm {
    pub id: Option<EntityId>,
    pub username: String,
    pub descr: String,
    pub expires: String,
    pub utype: String,
    pub uid: Option<u32>,
    pub disabled: bool,
    pub keep_history: bool,
    pub ipsecpsk: String,
    pub authorized_keys: String,
    pub groups: Vec<String>,
    pub available_groups: Vec<String>,
    pub prefs: PreferenceFields,
    pub privileges: Vec<EffectivePrivilege>,
    pub certs: Vec<CertificateRow>,
    /// An administrator-equivalent privilege applies to this account.
    pub admin_notice: bool,
    /// Certificate fields, offered only when creating.
    pub cert: CertRequest,
    pub cas: Vec<CaChoice>,
    pub themes: Vec<String>,
    pub password_hints: Vec<String>,
    pub read_only: bool,
}

/// Outcome of a bulk or single delete. Each refused account contributes one
/// error; the rest are deleted and persisted together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub errors: Vec<String>,
    /// Change note persisted, if anything was deleted.
    pub message: Option<String>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SavedUser {
    pub user: User,
    pub created: bool,
    pub message: String,
}

/// Result of a dispatched [`UserAction`].
#[derive(Debug, Clone)]
pub enum UserOutcome {
    List(Vec<UserSummary>),
    Form(Box<UserForm>),
    Saved { id: EntityId, message: String },
    Deleted(DeleteReport),
    /// An association was removed; the edit form is shown again.
    Updated { form: Box<UserForm>, message: String },
}

// ── Validation ──────────────────────────────────────────────────────

/// Inputs `validate_user` checks a submission against.
#[derive(Debug, Clone, Copy)]
pub struct UserCheck<'a> {
    pub config: &'a SystemConfig,
    /// The stored account being edited, `None` when creating.
    pub editing: Option<&'a User>,
    pub policy: &'a PasswordPolicy,
    pub reserved: &'a ReservedNames,
    pub themes: &'a [String],
    pub today: NaiveDate,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUser {
    pub username: String,
    pub scope: Option<Scope>,
    pub expires: Option<NaiveDate>,
    pub dashboard_columns: Option<u8>,
    /// Signing CA and parameters when a certificate was requested.
    pub certificate: Option<(EntityId, IssueParams)>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

/// Check a user form submission. Messages come back in display order.
pub fn validate_user(
    check: &UserCheck<'_>,
    request: &SaveUserRequest,
) -> Result<ValidUser, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let creating = check.editing.is_none();
    let wants_cert = creating && request.cert.is_requested();

    let username = request.username.as_deref().unwrap_or_default();
    let password = request
        .password
        .as_ref()
        .map(|p| p.expose_secret())
        .unwrap_or_default();
    let confirm = request
        .password_confirm
        .as_ref()
        .map(|p| p.expose_secret())
        .unwrap_or_default();

    require(&mut errors, "usernamefld", "Username", request.username.as_deref());
    if creating {
        require(&mut errors, "passwordfld1", "Password", Some(password));
        if wants_cert {
            require(&mut errors, "name", "Descriptive name", request.cert.name.as_deref());
            require(&mut errors, "caref", "Certificate authority", request.cert.caref.as_deref());
            require(&mut errors, "keylen", "Key length", request.cert.keylen.as_deref());
            require(&mut errors, "lifetime", "Lifetime", request.cert.lifetime.as_deref());
        }
    }

    if !username.chars().all(is_username_char) {
        errors.push("usernamefld", "The username contains invalid characters.");
    }
    if username.len() > MAX_USERNAME_LEN {
        errors.push("usernamefld", "The username is longer than 32 characters.");
    }
    if let Some(current) = check.editing {
        if current.is_system() && !username.is_empty() && current.name != username {
            errors.push("usernamefld", "System users cannot be renamed.");
        }
    }

    if !password.is_empty() && password != confirm {
        errors.push("passwordfld2", "The passwords do not match.");
    }
    if !password.is_empty() {
        for message in check.policy.check(username, password) {
            errors.push("passwordfld1", message);
        }
    }
    if request.ipsecpsk.as_deref().is_some_and(|k| !k.is_ascii()) {
        errors.push("ipsecpsk", "IPsec Pre-Shared Key contains invalid characters.");
    }
    if request.groups.iter().any(|g| check.config.group(g).is_none()) {
        errors.push("groups", "One or more invalid groups was submitted.");
    }

    let renamed_or_new = check.editing.is_none_or(|u| u.name != username);
    if errors.is_empty() && renamed_or_new && check.config.user_by_name(username).is_some() {
        errors.push(
            "usernamefld",
            "Another entry with the same username already exists.",
        );
    }
    if errors.is_empty() && renamed_or_new && check.reserved.contains(username) {
        errors.push("usernamefld", "That username is reserved by the system.");
    }

    let expires = match non_empty(request.expires.as_ref()) {
        None => None,
        Some(raw) => {
            let parsed = expires::parse(raw, check.today);
            if parsed.is_none() {
                errors.push("expires", INVALID_EXPIRES);
            }
            parsed
        }
    };

    let certificate = if wants_cert {
        validate_certificate(&mut errors, check.config, &request.cert)
    } else {
        None
    };

    let dashboard_columns = validate_preferences(&mut errors, check.themes, &request.prefs);

    let scope = match non_empty(request.utype.as_ref()) {
        None => None,
        Some(raw) => {
            let parsed = raw.parse::<Scope>().ok();
            if parsed.is_none() {
                errors.push("utype", "A valid user type must be selected.");
            }
            parsed
        }
    };
    if let (Some(current), Some(wanted)) = (check.editing, scope) {
        if current.is_system() && wanted != Scope::System {
            errors.push("utype", "The user type of a system user cannot be changed.");
        }
    }

    errors.into_result(ValidUser {
        username: username.to_owned(),
        scope,
        expires,
        dashboard_columns,
        certificate,
    })
}

fn validate_certificate(
    errors: &mut ValidationErrors,
    config: &SystemConfig,
    cert: &CertRequest,
) -> Option<(EntityId, IssueParams)> {
    let ca = non_empty(cert.caref.as_ref())
        .and_then(|raw| raw.parse::<EntityId>().ok())
        .and_then(|refid| config.ca(refid))
        .filter(|ca| ca.has_private_key);
    if ca.is_none() {
        errors.push("caref", "Invalid internal Certificate Authority");
    }

    let key_type = match non_empty(cert.keytype.as_ref()) {
        None => Some(KeyType::default()),
        Some(raw) => raw.parse::<KeyType>().ok(),
    };

    let key = match key_type {
        None => {
            errors.push("keytype", "Please select a valid Key Type.");
            None
        }
        Some(KeyType::Rsa) => match non_empty(cert.keylen.as_ref()) {
            // Missing length is already reported as a required field.
            None => None,
            Some(raw) => {
                let bits = raw
                    .parse::<u32>()
                    .ok()
                    .filter(|b| RSA_KEY_LENGTHS.contains(b));
                if bits.is_none() {
                    errors.push("keylen", "Please select a valid Key Length.");
                }
                bits.map(|bits| KeySpec::Rsa { bits })
            }
        },
        Some(KeyType::Ecdsa) => {
            let curve = non_empty(cert.ecname.as_ref()).unwrap_or(DEFAULT_CURVE);
            if EC_CURVES.contains(&curve) {
                Some(KeySpec::Ecdsa {
                    curve: curve.to_owned(),
                })
            } else {
                errors.push("ecname", "Please select a valid Elliptic Curve Name.");
                None
            }
        }
    };

    let digest = match non_empty(cert.digest.as_ref()) {
        None => Some(DigestAlgorithm::default()),
        Some(raw) => {
            let parsed = raw.parse::<DigestAlgorithm>().ok();
            if parsed.is_none() {
                errors.push("digest_alg", "Please select a valid Digest Algorithm.");
            }
            parsed
        }
    };

    let lifetime = match non_empty(cert.lifetime.as_ref()) {
        None => None,
        Some(raw) => {
            let days = raw
                .parse::<u32>()
                .ok()
                .filter(|d| (1..=MAX_LIFETIME_DAYS).contains(d));
            if days.is_none() {
                errors.push(
                    "lifetime",
                    format!("The lifetime must be between 1 and {MAX_LIFETIME_DAYS} days."),
                );
            }
            days
        }
    };

    let descr = non_empty(cert.name.as_ref())?.to_owned();
    Some((
        ca?.refid,
        IssueParams {
            descr,
            key: key?,
            digest: digest?,
            lifetime_days: lifetime?,
        },
    ))
}

/// Returns the parsed dashboard column count.
fn validate_preferences(
    errors: &mut ValidationErrors,
    themes: &[String],
    prefs: &PreferenceFields,
) -> Option<u8> {
    if let Some(css) = non_empty(prefs.webgui_css.as_ref()) {
        if !themes.iter().any(|t| t == css) {
            errors.push(
                "webguicss",
                "The submitted Theme could not be found. Pick a different theme.",
            );
        }
    }
    if non_empty(prefs.webgui_fixed_menu.as_ref()).is_some_and(|v| v != "fixed") {
        errors.push("webguifixedmenu", "The submitted Fixed Menu value is invalid.");
    }
    if non_empty(prefs.webgui_hostname_menu.as_ref())
        .is_some_and(|v| !HOSTNAME_MENU_VALUES.contains(&v))
    {
        errors.push(
            "webguihostnamemenu",
            "The submitted Hostname in Menu value is invalid.",
        );
    }

    let raw = non_empty(prefs.dashboard_columns.as_ref())?;
    let columns = raw
        .parse::<u8>()
        .ok()
        .filter(|c| (1..=MAX_DASHBOARD_COLUMNS).contains(c));
    if columns.is_none() {
        errors.push(
            "dashboardcolumns",
            "The submitted Dashboard Columns value is invalid.",
        );
    }
    columns
}

// ── Mutation ────────────────────────────────────────────────────────

/// Copy validated submission values onto the account. Checkboxes that were
/// not sent turn off; optional text fields that were not sent are cleared.
fn apply_request(user: &mut User, request: &SaveUserRequest, valid: &ValidUser) {
    let text = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    if let Some(scope) = valid.scope {
        user.scope = scope;
    }
    if let Some(descr) = &request.descr {
        user.descr.clone_from(descr);
    }
    user.name.clone_from(&valid.username);
    user.expires = valid.expires;
    user.set_authorized_keys(request.authorized_keys.as_deref().unwrap_or_default());
    user.ipsecpsk = text(&request.ipsecpsk);
    user.disabled = request.disabled;
    user.keep_history = request.keep_history;

    let p = &request.prefs;
    user.prefs = UiPreferences {
        custom_settings: p.custom_settings,
        webgui_css: text(&p.webgui_css),
        webgui_fixed_menu: text(&p.webgui_fixed_menu),
        webgui_hostname_menu: text(&p.webgui_hostname_menu),
        dashboard_columns: valid.dashboard_columns,
        interfaces_sort: p.interfaces_sort,
        dashboard_available_widgets_panel: p.dashboard_available_widgets_panel,
        system_logs_filter_panel: p.system_logs_filter_panel,
        system_logs_manage_log_panel: p.system_logs_manage_log_panel,
        status_monitoring_settings_panel: p.status_monitoring_settings_panel,
        webgui_left_column_hyper: p.webgui_left_column_hyper,
        disable_alias_popup_detail: p.disable_alias_popup_detail,
        page_name_first: p.page_name_first,
    };
}

fn preference_fields(prefs: &UiPreferences) -> PreferenceFields {
    PreferenceFields {
        custom_settings: prefs.custom_settings,
        webgui_css: prefs.webgui_css.clone(),
        webgui_fixed_menu: prefs.webgui_fixed_menu.clone(),
        webgui_hostname_menu: prefs.webgui_hostname_menu.clone(),
        dashboard_columns: prefs.dashboard_columns.map(|c| c.to_string()),
        interfaces_sort: prefs.interfaces_sort,
        dashboard_available_widgets_panel: prefs.dashboard_available_widgets_panel,
        system_logs_filter_panel: prefs.system_logs_filter_panel,
        system_logs_manage_log_panel: prefs.system_logs_manage_log_panel,
        status_monitoring_settings_panel: prefs.status_monitoring_settings_panel,
        webgui_left_column_hyper: prefs.webgui_left_column_hyper,
        disable_alias_popup_detail: prefs.disable_alias_popup_detail,
        page_name_first: prefs.page_name_first,
    }
}

/// Group names for display and forms; `all` is implied and left out.
fn visible_groups(config: &SystemConfig, uid: u32) -> Vec<String> {
    config
        .groups_of(uid)
        .into_iter()
        .filter(|g| g != ALL_GROUP)
        .collect()
}

fn summarize(config: &SystemConfig, user: &User, actor: &Actor) -> UserSummary {
    UserSummary {
        id: user.id,
        name: user.name.clone(),
        descr: user.descr.clone(),
        scope: user.scope,
        disabled: user.disabled,
        groups: visible_groups(config, user.uid),
        deletable: !user.is_system() && user.name != actor.username,
    }
}

// ── Service ─────────────────────────────────────────────────────────

/// Local account operations.
pub struct UserManager<'a> {
    gate: &'a Gatehouse,
}

impl<'a> UserManager<'a> {
    pub(crate) fn new(gate: &'a Gatehouse) -> Self {
        Self { gate }
    }

    /// Route one request. Mutations by a read-only actor are refused before
    /// anything is loaded.
    pub fn dispatch(&self, actor: &Actor, action: UserAction) -> Result<UserOutcome, CoreError> {
        debug!(action = action.name(), actor = %actor.username, "user manager request");
        if action.is_mutation() {
            actor.ensure_writable()?;
        }

        match action {
            UserAction::List => self.list(actor).map(UserOutcome::List),
            UserAction::New => self
                .new_form(actor)
                .map(|form| UserOutcome::Form(Box::new(form))),
            UserAction::Edit { id } => self
                .edit_form(actor, id)
                .map(|form| UserOutcome::Form(Box::new(form))),
            UserAction::Save { id, request } => {
                self.save(actor, id, &request).map(|saved| UserOutcome::Saved {
                    id: saved.user.id,
                    message: saved.message,
                })
            }
            UserAction::Delete { id, username } => {
                self.delete(actor, id, &username).map(UserOutcome::Deleted)
            }
            UserAction::DeleteMany { ids } => {
                self.delete_many(actor, &ids).map(UserOutcome::Deleted)
            }
            UserAction::DeleteCertificate { id, cert } => self
                .delete_certificate(actor, id, cert)
                .map(|(form, message)| UserOutcome::Updated {
                    form: Box::new(form),
                    message,
                }),
            UserAction::DeletePrivilege { id, privilege: name } => self
                .delete_privilege(actor, id, &name)
                .map(|(form, message)| UserOutcome::Updated {
                    form: Box::new(form),
                    message,
                }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn list(&self, actor: &Actor) -> Result<Vec<UserSummary>, CoreError> {
        let config = self.gate.repository.load()?;
        Ok(config
            .users
            .iter()
            .map(|u| summarize(&config, u, actor))
            .collect())
    }

    /// Stored account by id.
    pub fn get(&self, id: EntityId) -> Result<User, CoreError> {
        self.gate
            .repository
            .load()?
            .user(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    /// Resolve a username through the index.
    pub fn find(&self, username: &str) -> Result<EntityId, CoreError> {
        self.gate
            .user_id(username)
            .ok_or_else(|| CoreError::not_found("user", username))
    }

    fn base_form(&self, actor: &Actor, config: &SystemConfig) -> UserForm {
        let settings = &self.gate.settings;
        UserForm {
            available_groups: config
                .groups
                .iter()
                .filter(|g| !g.is_all())
                .map(|g| g.name.clone())
                .collect(),
            themes: settings.themes.clone(),
            password_hints: settings.password_policy.hints(),
            read_only: actor.is_read_only(),
            ..UserForm::default()
        }
    }

    /// Blank creation form with certificate defaults.
    pub fn new_form(&self, actor: &Actor) -> Result<UserForm, CoreError> {
        let config = self.gate.repository.load()?;
        Ok(UserForm {
            utype: Scope::User.to_string(),
            cert: CertRequest {
                keytype: Some(KeyType::default().to_string()),
                keylen: Some(DEFAULT_KEY_LENGTH.to_string()),
                ecname: Some(DEFAULT_CURVE.to_owned()),
                digest: Some(DigestAlgorithm::default().to_string()),
                lifetime: Some(DEFAULT_LIFETIME_DAYS.to_string()),
                ..CertRequest::default()
            },
            cas: config
                .cas
                .iter()
                .filter(|ca| ca.has_private_key)
                .map(|ca| CaChoice {
                    refid: ca.refid,
                    descr: ca.descr.clone(),
                })
                .collect(),
            ..self.base_form(actor, &config)
        })
    }

    pub fn edit_form(&self, actor: &Actor, id: EntityId) -> Result<UserForm, CoreError> {
        let config = self.gate.repository.load()?;
        let user = config
            .user(id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        Ok(self.stored_form(actor, &config, user))
    }

    fn stored_form(&self, actor: &Actor, config: &SystemConfig, user: &User) -> UserForm {
        let privileges = privilege::effective_privileges(user, &config.groups);
        let certs = user
            .certs
            .iter()
            .filter_map(|refid| config.cert(*refid))
            .map(|cert| CertificateRow {
                refid: cert.refid,
                descr: cert.descr.clone(),
                ca: config
                    .ca(cert.caref)
                    .map(|ca| ca.descr.clone())
                    .unwrap_or_default(),
                revoked: cert.revoked,
            })
            .collect();

        UserForm {
            id: Some(user.id),
            username: user.name.clone(),
            descr: user.descr.clone(),
            expires: user.expires_display(),
            utype: user.scope.to_string(),
            uid: Some(user.uid),
            disabled: user.disabled,
            keep_history: user.keep_history,
            ipsecpsk: user.ipsecpsk.clone().unwrap_or_default(),
            authorized_keys: user.authorized_keys_text(),
            groups: visible_groups(config, user.uid),
            prefs: preference_fields(&user.prefs),
            admin_notice: privileges.iter().any(|p| p.admin),
            privileges,
            certs,
            ..self.base_form(actor, config)
        }
    }

    /// The form re-rendered after a rejected submission. Passwords are never
    /// echoed back.
    pub fn rejected_form(
        &self,
        actor: &Actor,
        id: Option<EntityId>,
        request: &SaveUserRequest,
    ) -> Result<UserForm, CoreError> {
        let mut form = match id {
            Some(id) => self.edit_form(actor, id)?,
            None => self.new_form(actor)?,
        };
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        form.username = text(&request.username);
        if let Some(descr) = &request.descr {
            form.descr.clone_from(descr);
        }
        form.expires = text(&request.expires);
        if let Some(utype) = &request.utype {
            form.utype.clone_from(utype);
        }
        form.disabled = request.disabled;
        form.keep_history = request.keep_history;
        form.ipsecpsk = text(&request.ipsecpsk);
        form.authorized_keys = text(&request.authorized_keys);
        form.groups.clone_from(&request.groups);
        form.prefs = request.prefs.clone();
        if id.is_none() {
            form.cert = request.cert.clone();
        }
        Ok(form)
    }

    /// A save request carrying the account's current values, for callers
    /// that only change a few fields.
    pub fn edit_request(&self, id: EntityId) -> Result<SaveUserRequest, CoreError> {
        let config = self.gate.repository.load()?;
        let user = config
            .user(id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        let keys = user.authorized_keys_text();
        Ok(SaveUserRequest {
            username: Some(user.name.clone()),
            old_username: Some(user.name.clone()),
            descr: Some(user.descr.clone()),
            expires: user.expires.map(expires::format),
            utype: Some(user.scope.to_string()),
            disabled: user.disabled,
            keep_history: user.keep_history,
            ipsecpsk: user.ipsecpsk.clone(),
            authorized_keys: (!keys.is_empty()).then_some(keys),
            groups: visible_groups(&config, user.uid),
            prefs: preference_fields(&user.prefs),
            ..SaveUserRequest::default()
        })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Create (`id == None`) or update an account.
    pub fn save(
        &self,
        actor: &Actor,
        id: Option<EntityId>,
        request: &SaveUserRequest,
    ) -> Result<SavedUser, CoreError> {
        actor.ensure_writable()?;
        let settings = &self.gate.settings;

        let _guard = self.gate.write_lock.lock();
        let mut config = self.gate.repository.load()?;
        let editing = match id {
            Some(id) => Some(
                config
                    .user(id)
                    .cloned()
                    .ok_or_else(|| CoreError::not_found("user", id))?,
            ),
            None => None,
        };

        let check = UserCheck {
            config: &config,
            editing: editing.as_ref(),
            policy: &settings.password_policy,
            reserved: &settings.reserved,
            themes: &settings.themes,
            today: Local::now().date_naive(),
        };
        let valid = validate_user(&check, request)?;

        let created = editing.is_none();
        let renamed_from = editing
            .as_ref()
            .map(|u| u.name.clone())
            .filter(|old| *old != valid.username);
        let mut user = editing.unwrap_or_else(|| User::new(valid.username.clone(), 0));
        apply_request(&mut user, request, &valid);

        let password = request
            .password
            .as_ref()
            .map(|p| p.expose_secret())
            .unwrap_or_default();
        if !password.is_empty() {
            user.password_hash = Some(settings.password_policy.hash(password)?);
        }

        if created {
            if let Some((caref, params)) = &valid.certificate {
                let ca = config
                    .ca(*caref)
                    .ok_or_else(|| CoreError::not_found("certificate authority", caref))?;
                let cert = self.gate.issuer.issue(ca, &user.name, params)?;
                user.certs.push(cert.refid);
                config.certs.push(cert);
            }
            user.uid = config.allocate_uid()?;
            config.users.push(user.clone());
            if !user.is_system() {
                config.join_all_group(user.uid);
            }
        } else if let Some(slot) = config.user_mut(user.id) {
            *slot = user.clone();
        }
        config.set_user_groups(user.uid, &request.groups);

        let verb = if created { "created" } else { "edited" };
        let message = format!("Successfully {verb} user {}", user.name);
        self.gate
            .repository
            .save(&mut config, ChangeNote::new(&actor.username, &message))?;
        self.gate.rebuild_index(&config);
        info!(source = LOG_PREFIX, actor = %actor.username, uid = user.uid, "{message}");

        if let Some(old) = &renamed_from {
            self.gate.hooks.remove_account(old);
        }
        self.gate.hooks.provision_account(&user);
        self.gate.hooks.run_privilege_hooks();
        if user.uid == 0 {
            info!("Restarting sshd due to admin account change.");
            self.gate.hooks.restart_service(SSHD);
        }

        Ok(SavedUser {
            user,
            created,
            message,
        })
    }

    /// Delete one account. `username` must match the stored name so a stale
    /// page cannot delete a different account.
    pub fn delete(
        &self,
        actor: &Actor,
        id: EntityId,
        username: &str,
    ) -> Result<DeleteReport, CoreError> {
        actor.ensure_writable()?;

        let _guard = self.gate.write_lock.lock();
        let mut config = self.gate.repository.load()?;
        let user = config
            .user(id)
            .filter(|u| u.name == username)
            .cloned()
            .ok_or_else(|| CoreError::not_found("user", username))?;

        let mut report = DeleteReport::default();
        if user.name == actor.username {
            report.errors.push(format!(
                "Cannot delete user {} because you are currently logged in as that user.",
                user.name
            ));
        } else if user.is_system() {
            report.errors.push(format!(
                "Cannot delete user {} because it is a system user.",
                user.name
            ));
        }
        if !report.is_clean() {
            warn!(user = %user.name, actor = %actor.username, "delete refused");
            return Ok(report);
        }

        config.users.retain(|u| u.id != user.id);
        config.remove_from_groups(user.uid);
        let message = format!("Successfully deleted user: {}", user.name);
        self.gate
            .repository
            .save(&mut config, ChangeNote::new(&actor.username, &message))?;
        self.gate.rebuild_index(&config);
        info!(source = LOG_PREFIX, actor = %actor.username, "{message}");
        self.gate.hooks.remove_account(&user.name);

        report.deleted.push(user.name);
        report.message = Some(message);
        Ok(report)
    }

    /// Delete several accounts. Refusals are collected per account; the rest
    /// are removed in a single persist. Unknown ids are skipped.
    pub fn delete_many(&self, actor: &Actor, ids: &[EntityId]) -> Result<DeleteReport, CoreError> {
        actor.ensure_writable()?;

        let _guard = self.gate.write_lock.lock();
        let mut config = self.gate.repository.load()?;
        let mut report = DeleteReport::default();

        for id in ids {
            let Some(user) = config.user(*id).cloned() else {
                debug!(%id, "skipping unknown user id");
                continue;
            };
            if user.is_system() {
                report.errors.push(format!(
                    "Cannot delete user {} because it is a system user.",
                    user.name
                ));
            } else if user.name == actor.username {
                report.errors.push(format!(
                    "Cannot delete user {} because you are currently logged in as that user.",
                    user.name
                ));
            } else {
                config.users.retain(|u| u.id != user.id);
                config.remove_from_groups(user.uid);
                report.deleted.push(user.name);
            }
        }

        for error in &report.errors {
            warn!(actor = %actor.username, "{error}");
        }
        if report.deleted.is_empty() {
            return Ok(report);
        }

        let noun = if report.deleted.len() == 1 { "user" } else { "users" };
        let message = format!("Successfully deleted {noun}: {}", report.deleted.join(", "));
        self.gate
            .repository
            .save(&mut config, ChangeNote::new(&actor.username, &message))?;
        self.gate.rebuild_index(&config);
        info!(source = LOG_PREFIX, actor = %actor.username, "{message}");
        for name in &report.deleted {
            self.gate.hooks.remove_account(name);
        }

        report.message = Some(message);
        Ok(report)
    }

    /// Detach a certificate from an account. The certificate stays stored.
    pub fn delete_certificate(
        &self,
        actor: &Actor,
        id: EntityId,
        cert: EntityId,
    ) -> Result<(UserForm, String), CoreError> {
        actor.ensure_writable()?;

        let _guard = self.gate.write_lock.lock();
        let mut config = self.gate.repository.load()?;
        let descr = config
            .cert(cert)
            .map(|c| c.descr.clone())
            .unwrap_or_default();
        let user = config
            .user_mut(id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        if !user.certs.contains(&cert) {
            return Err(CoreError::not_found("certificate association", cert));
        }
        user.certs.retain(|c| *c != cert);
        let message = format!(
            "Removed certificate association \"{descr}\" from user {}",
            user.name
        );

        self.gate
            .repository
            .save(&mut config, ChangeNote::new(&actor.username, &message))?;
        info!(source = LOG_PREFIX, actor = %actor.username, "{message}");

        let user = config
            .user(id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        Ok((self.stored_form(actor, &config, user), message))
    }

    /// Remove a directly assigned privilege.
    pub fn delete_privilege(
        &self,
        actor: &Actor,
        id: EntityId,
        name: &str,
    ) -> Result<(UserForm, String), CoreError> {
        actor.ensure_writable()?;

        let _guard = self.gate.write_lock.lock();
        let mut config = self.gate.repository.load()?;
        let user = config
            .user_mut(id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        if !user.privileges.iter().any(|p| p == name) {
            return Err(CoreError::not_found("privilege", name));
        }
        user.privileges.retain(|p| p != name);
        let message = format!(
            "Removed Privilege \"{}\" from user {}",
            privilege::describe(name),
            user.name
        );

        self.gate
            .repository
            .save(&mut config, ChangeNote::new(&actor.username, &message))?;
        info!(source = LOG_PREFIX, actor = %actor.username, "{message}");

        let user = config
            .user(id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        self.gate.hooks.provision_account(user);
        Ok((self.stored_form(actor, &config, user), message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::model::CertificateAuthority;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn check<'a>(
        config: &'a SystemConfig,
        editing: Option<&'a User>,
        policy: &'a PasswordPolicy,
        reserved: &'a ReservedNames,
        themes: &'a [String],
    ) -> UserCheck<'a> {
        UserCheck {
            config,
            editing,
            policy,
            reserved,
            themes,
            today: today(),
        }
    }

    fn run(config: &SystemConfig, editing: Option<&User>, request: &SaveUserRequest) -> Result<ValidUser, ValidationErrors> {
        let policy = PasswordPolicy::default();
        let reserved = ReservedNames::new(["root", "toor"]);
        let themes = vec!["default.css".to_owned()];
        validate_user(&check(config, editing, &policy, &reserved, &themes), request)
    }

    #[test]
    fn create_requires_username_and_password() {
        let config = SystemConfig::seeded();
        let err = run(&config, None, &SaveUserRequest::default()).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "The field 'Username' is required.",
                "The field 'Password' is required."
            ]
        );
    }

    #[test]
    fn edit_only_requires_username() {
        let config = SystemConfig::seeded();
        let admin = config.user_by_name("admin").unwrap().clone();
        let request = SaveUserRequest {
            username: Some("admin".into()),
            ..SaveUserRequest::default()
        };
        assert!(run(&config, Some(&admin), &request).is_ok());
    }

    #[test]
    fn username_rules_are_reported_in_order() {
        let config = SystemConfig::seeded();
        let mut request = SaveUserRequest::new_user(&format!("bad name{}", "x".repeat(40)), "longenough1");
        request.password_confirm = Some(SecretString::from("different1".to_owned()));
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "The username contains invalid characters.",
                "The username is longer than 32 characters.",
                "The passwords do not match.",
            ]
        );
    }

    #[test]
    fn uniqueness_and_reserved_only_checked_when_clean() {
        let config = SystemConfig::seeded();
        let err = run(&config, None, &SaveUserRequest::new_user("admin", "longenough1")).unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["Another entry with the same username already exists."]
        );

        let err = run(&config, None, &SaveUserRequest::new_user("root", "longenough1")).unwrap_err();
        assert_eq!(err.messages(), vec!["That username is reserved by the system."]);

        let mut request = SaveUserRequest::new_user("admin", "longenough1");
        request.groups = vec!["nope".into()];
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(err.messages(), vec!["One or more invalid groups was submitted."]);
    }

    #[test]
    fn invalid_groups_reported_once() {
        let config = SystemConfig::seeded();
        let mut request = SaveUserRequest::new_user("carol", "longenough1");
        request.groups = vec!["x".into(), "y".into()];
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn non_ascii_psk_is_rejected() {
        let config = SystemConfig::seeded();
        let mut request = SaveUserRequest::new_user("carol", "longenough1");
        request.ipsecpsk = Some("schlüssel".into());
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["IPsec Pre-Shared Key contains invalid characters."]
        );
    }

    #[test]
    fn password_policy_is_reported_before_psk() {
        let config = SystemConfig::seeded();
        let mut request = SaveUserRequest::new_user("carol", "short");
        request.ipsecpsk = Some("schlüssel".into());
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "The password must be at least 8 characters long.",
                "IPsec Pre-Shared Key contains invalid characters.",
            ]
        );
    }

    #[test]
    fn system_user_type_cannot_change() {
        let config = SystemConfig::seeded();
        let admin = config.user_by_name("admin").unwrap().clone();
        let mut request = SaveUserRequest {
            username: Some("admin".into()),
            utype: Some("user".into()),
            ..SaveUserRequest::default()
        };
        let err = run(&config, Some(&admin), &request).unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["The user type of a system user cannot be changed."]
        );

        request.utype = Some("system".into());
        assert!(run(&config, Some(&admin), &request).is_ok());
    }

    #[test]
    fn expiry_is_normalized_and_validated() {
        let config = SystemConfig::seeded();
        let mut request = SaveUserRequest::new_user("carol", "longenough1");
        request.expires = Some("+1 week".into());
        let valid = run(&config, None, &request).unwrap();
        assert_eq!(valid.expires.map(expires::format).as_deref(), Some("03/08/2026"));

        request.expires = Some("someday".into());
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(err.messages(), vec![INVALID_EXPIRES]);
    }

    #[test]
    fn system_user_cannot_be_renamed() {
        let config = SystemConfig::seeded();
        let admin = config.user_by_name("admin").unwrap().clone();
        let request = SaveUserRequest {
            username: Some("boss".into()),
            ..SaveUserRequest::default()
        };
        let err = run(&config, Some(&admin), &request).unwrap_err();
        assert_eq!(err.messages(), vec!["System users cannot be renamed."]);
    }

    #[test]
    fn certificate_needs_signing_ca() {
        let mut config = SystemConfig::seeded();
        let ca = CertificateAuthority {
            refid: EntityId::new(),
            descr: "Imported".into(),
            has_private_key: false,
            subject: Default::default(),
        };
        let refid = ca.refid;
        config.cas.push(ca);

        let mut request = SaveUserRequest::new_user("carol", "longenough1");
        request.cert = CertRequest {
            name: Some("carol cert".into()),
            caref: Some(refid.to_string()),
            keylen: Some("2048".into()),
            lifetime: Some("3650".into()),
            ..CertRequest::default()
        };
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(err.messages(), vec!["Invalid internal Certificate Authority"]);

        config.cas[0].has_private_key = true;
        let valid = run(&config, None, &request).unwrap();
        let (caref, params) = valid.certificate.unwrap();
        assert_eq!(caref, refid);
        assert_eq!(params.key, KeySpec::Rsa { bits: 2048 });
        assert_eq!(params.digest, DigestAlgorithm::Sha256);
    }

    #[test]
    fn certificate_requires_its_fields() {
        let config = SystemConfig::seeded();
        let mut request = SaveUserRequest::new_user("carol", "longenough1");
        request.cert.name = Some("carol cert".into());
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "The field 'Certificate authority' is required.",
                "The field 'Key length' is required.",
                "The field 'Lifetime' is required.",
                "Invalid internal Certificate Authority",
            ]
        );
    }

    #[test]
    fn preference_fields_are_checked() {
        let config = SystemConfig::seeded();
        let mut request = SaveUserRequest::new_user("carol", "longenough1");
        request.prefs.webgui_css = Some("missing.css".into());
        request.prefs.webgui_fixed_menu = Some("floating".into());
        request.prefs.webgui_hostname_menu = Some("ip".into());
        request.prefs.dashboard_columns = Some("9".into());
        let err = run(&config, None, &request).unwrap_err();
        assert_eq!(err.len(), 4);

        let mut request = SaveUserRequest::new_user("carol", "longenough1");
        request.prefs.dashboard_columns = Some("3".into());
        assert_eq!(run(&config, None, &request).unwrap().dashboard_columns, Some(3));
    }

    #[test]
    fn apply_clears_unsent_fields() {
        let mut user = User::new("carol", 2000);
        user.disabled = true;
        user.ipsecpsk = Some("old".into());
        user.descr = "kept".into();
        user.prefs.interfaces_sort = true;

        let request = SaveUserRequest {
            username: Some("carol".into()),
            ..SaveUserRequest::default()
        };
        let valid = ValidUser {
            username: "carol".into(),
            scope: None,
            expires: None,
            dashboard_columns: None,
            certificate: None,
        };
        apply_request(&mut user, &request, &valid);

        assert!(!user.disabled);
        assert!(user.ipsecpsk.is_none());
        assert_eq!(user.descr, "kept");
        assert!(!user.prefs.interfaces_sort);
    }
}
