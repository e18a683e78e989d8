// ── Domain model ──
//
// Strongly typed records for everything the console persists. The
// aggregate that owns them is `store::SystemConfig`.

pub mod cert;
pub mod entity_id;
pub mod group;
pub mod hostname;
pub mod privilege;
pub mod user;
pub mod zone;

pub use cert::{
    Certificate, CertificateAuthority, DigestAlgorithm, DistinguishedName, KeySpec, KeyType,
};
pub use entity_id::EntityId;
pub use group::{ALL_GROUP, Group};
pub use hostname::{AllowedHostname, Direction, Hostname, HostnameError};
pub use privilege::{EffectivePrivilege, Privilege};
pub use user::{Scope, UiPreferences, User};
pub use zone::Zone;
