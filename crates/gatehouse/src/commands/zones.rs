//! `gatehouse zones`: captive portal zones.

use tabled::Tabled;

use gatehouse_core::ZoneSummary;

use crate::cli::{ZonesArgs, ZonesCommand};
use crate::commands::Session;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    name: String,
    #[tabled(rename = "Zone ID")]
    zoneid: u32,
    #[tabled(rename = "Description")]
    descr: String,
    #[tabled(rename = "Allowed hostnames")]
    hostnames: usize,
}

impl From<&ZoneSummary> for ZoneRow {
    fn from(z: &ZoneSummary) -> Self {
        Self {
            name: z.name.clone(),
            zoneid: z.zoneid,
            descr: z.descr.clone(),
            hostnames: z.hostnames,
        }
    }
}

pub fn handle(args: &ZonesArgs, session: &Session<'_>) -> Result<(), CliError> {
    match args.command {
        ZonesCommand::List => {
            let zones = session.gate.portal().zones()?;
            let rendered = output::render_list(
                session.format,
                &zones,
                |z| ZoneRow::from(z),
                |z| z.name.clone(),
            )?;
            session.print(&rendered);
            Ok(())
        }
    }
}
