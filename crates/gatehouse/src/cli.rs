//! Clap derive definitions for the `gatehouse` binary.
//!
//! Kept free of workspace crates so build.rs can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// gatehouse: manage firewall console accounts and captive portal hostnames
#[derive(Debug, Parser)]
#[command(
    name = "gatehouse",
    version,
    about = "Manage firewall console accounts and captive portal allowed hostnames",
    long_about = "Administer local console users, their groups, certificates and \
        privileges, and the hostnames each captive portal zone lets through \
        before authentication.\n\n\
        Changes are written to the configuration store; `gatehouse serve` \
        exposes the same operations as a web console.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "GATEHOUSE_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Configuration store file (overrides `store.path`)
    #[arg(long, env = "GATEHOUSE_STORE_PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Operator to act as (overrides `cli.actor`)
    #[arg(long, short = 'a', env = "GATEHOUSE_ACTOR", global = true)]
    pub actor: Option<String>,

    /// Output format (overrides `defaults.output`)
    #[arg(long, short = 'o', env = "GATEHOUSE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal and NO_COLOR is unset
    Auto,
    Always,
    Never,
}

// ── Top-level Commands ───────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web console
    Serve(ServeArgs),

    /// Manage local console users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage a zone's allowed hostnames
    #[command(alias = "hosts")]
    Hostnames(HostnamesArgs),

    /// Inspect captive portal zones
    Zones(ZonesArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Serve ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides `web.listen`)
    #[arg(long, short = 'l')]
    pub listen: Option<String>,

    /// Header carrying the proxy-authenticated username (overrides `web.user_header`)
    #[arg(long)]
    pub user_header: Option<String>,
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List all accounts
    #[command(alias = "ls")]
    List,

    /// Show one account with its groups, privileges and certificates
    #[command(alias = "get")]
    Show {
        /// Username or id
        user: String,
    },

    /// Create an account
    #[command(alias = "create")]
    Add(UserAddArgs),

    /// Change fields of an existing account
    #[command(alias = "update")]
    Edit(UserEditArgs),

    /// Delete one or more accounts
    #[command(alias = "rm")]
    Delete {
        /// Usernames or ids
        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Detach a certificate from an account
    RemoveCert {
        /// Username or id
        user: String,
        /// Certificate reference id
        cert: String,
    },

    /// Remove a directly assigned privilege
    RemovePriv {
        /// Username or id
        user: String,
        /// Privilege name, e.g. `page-all`
        privilege: String,
    },
}

/// Fields shared by `users add` and `users edit`.
#[derive(Debug, Args)]
pub struct UserFieldArgs {
    /// Full name
    #[arg(long)]
    pub descr: Option<String>,

    /// Expiration date, MM/DD/YYYY; empty to clear
    #[arg(long)]
    pub expires: Option<String>,

    /// Group membership; repeat for several
    #[arg(long = "group", short = 'g')]
    pub groups: Vec<String>,

    /// File holding authorized SSH keys
    #[arg(long)]
    pub authorized_keys_file: Option<PathBuf>,

    /// IPsec pre-shared key
    #[arg(long)]
    pub ipsecpsk: Option<String>,

    /// Keep command history between console sessions
    #[arg(long)]
    pub keep_history: bool,

    /// Console theme
    #[arg(long)]
    pub theme: Option<String>,

    /// Dashboard columns
    #[arg(long)]
    pub dashboard_columns: Option<String>,
}

#[derive(Debug, Args)]
pub struct UserAddArgs {
    pub username: String,

    /// Create the account disabled
    #[arg(long)]
    pub disabled: bool,

    #[command(flatten)]
    pub fields: UserFieldArgs,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,

    /// Issue a user certificate with this descriptive name
    #[arg(long)]
    pub cert_name: Option<String>,

    /// Certificate authority reference id for the certificate
    #[arg(long, requires = "cert_name")]
    pub cert_ca: Option<String>,

    /// Key type: rsa or ecdsa
    #[arg(long, requires = "cert_name")]
    pub key_type: Option<String>,

    /// RSA key length in bits
    #[arg(long, requires = "cert_name")]
    pub key_length: Option<String>,

    /// Elliptic curve name
    #[arg(long, requires = "cert_name")]
    pub curve: Option<String>,

    /// Digest algorithm
    #[arg(long, requires = "cert_name")]
    pub digest: Option<String>,

    /// Certificate lifetime in days
    #[arg(long, requires = "cert_name")]
    pub lifetime: Option<String>,
}

#[derive(Debug, Args)]
pub struct UserEditArgs {
    /// Username or id
    pub user: String,

    /// Rename the account
    #[arg(long)]
    pub rename: Option<String>,

    /// Disable the account
    #[arg(long, conflicts_with = "enable")]
    pub disable: bool,

    /// Enable the account
    #[arg(long)]
    pub enable: bool,

    /// Remove the account from every group
    #[arg(long, conflicts_with = "groups")]
    pub no_groups: bool,

    /// Prompt for a new password
    #[arg(long, conflicts_with = "password_stdin")]
    pub password: bool,

    /// Read a new password from stdin
    #[arg(long)]
    pub password_stdin: bool,

    #[command(flatten)]
    pub fields: UserFieldArgs,
}

// ── Hostnames ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HostnamesArgs {
    /// Captive portal zone
    #[arg(long, short = 'z', env = "GATEHOUSE_ZONE", global = true)]
    pub zone: Option<String>,

    #[command(subcommand)]
    pub command: HostnamesCommand,
}

#[derive(Debug, Subcommand)]
pub enum HostnamesCommand {
    /// List the zone's allowed hostnames
    #[command(alias = "ls")]
    List,

    /// Allow a hostname
    #[command(alias = "create")]
    Add(HostnameAddArgs),

    /// Change an allowed hostname entry
    #[command(alias = "update")]
    Edit(HostnameEditArgs),

    /// Remove an allowed hostname entry
    #[command(alias = "rm")]
    Delete {
        /// Entry id or hostname
        entry: String,
    },
}

/// Optional entry fields.
#[derive(Debug, Args)]
pub struct HostnameFieldArgs {
    /// Traffic direction: both, from or to
    #[arg(long)]
    pub dir: Option<String>,

    /// Subnet mask bits
    #[arg(long)]
    pub sn: Option<String>,

    /// Upload limit in Kbit/s
    #[arg(long)]
    pub bw_up: Option<String>,

    /// Download limit in Kbit/s
    #[arg(long)]
    pub bw_down: Option<String>,

    /// Description
    #[arg(long)]
    pub descr: Option<String>,
}

#[derive(Debug, Args)]
pub struct HostnameAddArgs {
    /// Fully qualified hostname, IDN allowed
    pub hostname: String,

    #[command(flatten)]
    pub fields: HostnameFieldArgs,
}

#[derive(Debug, Args)]
pub struct HostnameEditArgs {
    /// Entry id or hostname
    pub entry: String,

    /// Replace the hostname
    #[arg(long)]
    pub hostname: Option<String>,

    #[command(flatten)]
    pub fields: HostnameFieldArgs,
}

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ZonesArgs {
    #[command(subcommand)]
    pub command: ZonesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ZonesCommand {
    /// List configured zones
    #[command(alias = "ls")]
    List,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
