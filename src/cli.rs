//! Command-line configuration and the non-interactive JSON commands.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::db::{default_db_path, default_log_path, Store};

#[derive(Parser, Debug)]
#[command(version, about = "Keep track of bands, their members and their albums.")]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database to use (default: ~/.rockbands/rockbands.sqlite)
    #[arg(long, global = true, env = "ROCKBANDS_DB")]
    pub database: Option<PathBuf>,

    /// Log file (default: ~/.rockbands/rockbands.log)
    #[arg(long, global = true, env = "ROCKBANDS_LOG")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Browse and edit the database in the terminal (the default)
    Browse,
    /// Print every band as a JSON array of {id, name}
    Bands,
    /// Print one band with its lineup and albums as JSON
    Band { id: i64 },
    /// Print one album with its contributing bands as JSON
    Album { id: i64 },
    /// Print one member with every band tenure as JSON
    Member { id: i64 },
}

impl Cli {
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => default_log_path(),
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Browse)
    }
}

/// Run one of the JSON commands against `store`, writing pretty JSON to `out`.
/// `Browse` is interactive and writes nothing here.
pub fn print_json(store: &Store, command: &Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Browse => Ok(()),
        Command::Bands => {
            let bands = store.band_summaries().context("failed to list bands")?;
            write_json(out, &bands)
        }
        Command::Band { id } => {
            let detail = store
                .band_detail(*id)
                .with_context(|| format!("failed to load band {id}"))?;
            write_json(out, &detail)
        }
        Command::Album { id } => {
            let detail = store
                .album_detail(*id)
                .with_context(|| format!("failed to load album {id}"))?;
            write_json(out, &detail)
        }
        Command::Member { id } => {
            let detail = store
                .member_detail(*id)
                .with_context(|| format!("failed to load member {id}"))?;
            write_json(out, &detail)
        }
    }
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode JSON")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}
