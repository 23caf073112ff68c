//! Ratatui front-end. `app` owns the state machine, `forms` the popup editors,
//! `screens` the navigable views and `terminal` the raw-mode event loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
