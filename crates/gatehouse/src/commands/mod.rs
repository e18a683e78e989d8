//! Command dispatch: bridges CLI args -> core controllers -> output formatting.

pub mod config_cmd;
pub mod hostnames;
pub mod serve;
pub mod users;
pub mod util;
pub mod zones;

use gatehouse_core::{Actor, Gatehouse};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Everything a store-bound command needs.
pub struct Session<'a> {
    pub gate: Gatehouse,
    pub actor: Actor,
    pub global: &'a GlobalOpts,
    pub format: OutputFormat,
    pub color: bool,
}

impl<'a> Session<'a> {
    /// Open the store and resolve the operator.
    pub fn open(global: &'a GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let gate = config::open_gatehouse(global, cfg)?;
        let actor = config::resolve_actor(global, cfg, &gate)?;
        Ok(Self {
            gate,
            actor,
            global,
            format: config::output_format(global, cfg)?,
            color: output::should_color(config::color_mode(global, cfg)?),
        })
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.global.quiet);
    }

    pub fn status(&self, message: &str) {
        output::print_status(message, self.global.quiet);
    }
}

/// Dispatch a store-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, cfg: Config) -> Result<(), CliError> {
    match cmd {
        Command::Serve(args) => serve::handle(args, global, cfg).await,
        Command::Users(args) => users::handle(args, &Session::open(global, &cfg)?),
        Command::Hostnames(args) => hostnames::handle(args, &Session::open(global, &cfg)?),
        Command::Zones(args) => zones::handle(&args, &Session::open(global, &cfg)?),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
