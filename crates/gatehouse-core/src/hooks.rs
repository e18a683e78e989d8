// ── System side effects ──
//
// Everything that leaves the configuration store: portal rule reloads,
// host account provisioning, privilege plugins and service restarts.

use parking_lot::Mutex;
use tracing::info;

use crate::model::User;

/// Actions the controllers trigger after a successful persist.
pub trait SystemHooks: Send + Sync {
    /// Drop enforcement state for the zone's current hostname list.
    fn cleanup_allowed_hostnames(&self, zone: &str);
    /// Re-apply the zone's allowed hostnames.
    fn reconfigure_allowed_hostnames(&self, zone: &str);
    /// Create or update the host account for `user`.
    fn provision_account(&self, user: &User);
    fn remove_account(&self, username: &str);
    fn run_privilege_hooks(&self);
    fn restart_service(&self, service: &str);
}

/// Logs every dispatched action and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHooks;

impl SystemHooks for TracingHooks {
    fn cleanup_allowed_hostnames(&self, zone: &str) {
        info!(zone, "cleaning up allowed hostnames");
    }

    fn reconfigure_allowed_hostnames(&self, zone: &str) {
        info!(zone, "reconfiguring allowed hostnames");
    }

    fn provision_account(&self, user: &User) {
        info!(user = %user.name, uid = user.uid, "provisioning account");
    }

    fn remove_account(&self, username: &str) {
        info!(user = username, "removing account");
    }

    fn run_privilege_hooks(&self) {
        info!("running privilege hooks");
    }

    fn restart_service(&self, service: &str) {
        info!(service, "restarting service");
    }
}

/// One observed hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    CleanupAllowedHostnames(String),
    ReconfigureAllowedHostnames(String),
    ProvisionAccount(String),
    RemoveAccount(String),
    RunPrivilegeHooks,
    RestartService(String),
}

/// Remembers every call in order.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<HookCall>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn push(&self, call: HookCall) {
        self.calls.lock().push(call);
    }
}

impl SystemHooks for RecordingHooks {
    fn cleanup_allowed_hostnames(&self, zone: &str) {
        self.push(HookCall::CleanupAllowedHostnames(zone.to_owned()));
    }

    fn reconfigure_allowed_hostnames(&self, zone: &str) {
        self.push(HookCall::ReconfigureAllowedHostnames(zone.to_owned()));
    }

    fn provision_account(&self, user: &User) {
        self.push(HookCall::ProvisionAccount(user.name.clone()));
    }

    fn remove_account(&self, username: &str) {
        self.push(HookCall::RemoveAccount(username.to_owned()));
    }

    fn run_privilege_hooks(&self) {
        self.push(HookCall::RunPrivilegeHooks);
    }

    fn restart_service(&self, service: &str) {
        self.push(HookCall::RestartService(service.to_owned()));
    }
}
