//! Binary entry point: read configuration, open the store, then either print
//! JSON for one of the listing commands or hand the store to the TUI.
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rockbands::cli::{print_json, Cli, Command};
use rockbands::{init_logging, run_app, App, Store};

fn main() -> anyhow::Result<()> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(&cli.log_path()?)?;
    let db_path = cli.database_path()?;
    let mut store = Store::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    let command = cli.command();
    let result = match command {
        Command::Browse => {
            info!("starting terminal interface");
            let mut app = App::new(store).context("failed to load bands")?;
            let result = run_app(&mut app);
            store = app.into_store();
            result
        }
        _ => print_json(&store, &command, &mut io::stdout().lock()),
    };

    store.close().context("failed to close database")?;
    result
}
