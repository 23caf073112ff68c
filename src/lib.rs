//! Core library surface for the rock band ledger: a SQLite-backed store of
//! bands, members, memberships and albums, the typed input boundary in front
//! of it, and the terminal and JSON front-ends that sit on top.
pub mod cli;
pub mod db;
pub mod error;
pub mod input;
pub mod logging;
pub mod models;
pub mod ui;

/// The explicitly constructed store every front-end is handed.
pub use db::Store;

pub use error::{Entity, StoreError, StoreResult, ValidationErrors};
pub use input::{MembershipFields, NewAlbum, NewBand, NewMember};
pub use logging::init_logging;
pub use models::{
    Album, AlbumDetail, Band, BandDetail, BandSummary, LineupEntry, Member, MemberDetail,
    Membership,
};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
