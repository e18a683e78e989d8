//! `gatehouse serve`: run the web console.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use gatehouse_web::AppState;

use crate::cli::{GlobalOpts, ServeArgs};
use crate::config::{self, Config};
use crate::error::CliError;

pub async fn handle(args: ServeArgs, global: &GlobalOpts, mut cfg: Config) -> Result<(), CliError> {
    if let Some(listen) = args.listen {
        cfg.web.listen = listen;
    }
    if let Some(header) = args.user_header {
        cfg.web.user_header = header;
    }
    cfg.validate()?;

    let addr: SocketAddr = cfg.web.listen.parse().map_err(|_| CliError::Validation {
        field: "listen".into(),
        reason: format!("not a socket address: {}", cfg.web.listen),
    })?;

    let gate = config::open_gatehouse(global, &cfg)?;
    info!(
        store = %config::store_path(global, &cfg).display(),
        header = %cfg.web.user_header,
        "starting console"
    );
    let state = AppState::new(Arc::new(gate), &cfg.web.user_header)?;
    gatehouse_web::serve(state, addr).await?;
    Ok(())
}
