use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::{AlbumDetail, Band, LineupEntry};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// `Name (1960, Liverpool)`, dropping whichever details are missing.
pub(crate) fn band_heading(band: &Band) -> String {
    let details: Vec<String> = band
        .formed_year
        .map(|year| format!("formed {year}"))
        .into_iter()
        .chain(band.home_location.clone())
        .collect();
    if details.is_empty() {
        band.name.clone()
    } else {
        format!("{} ({})", band.name, details.join(", "))
    }
}

/// `Name - Role, 1960-present`.
pub(crate) fn lineup_line(entry: &LineupEntry) -> String {
    match &entry.membership.role {
        Some(role) => format!(
            "{} - {role}, {}",
            entry.member_name,
            entry.membership.tenure()
        ),
        None => format!("{}, {}", entry.member_name, entry.membership.tenure()),
    }
}

/// `Title (1969)`, followed by the contributor credits when present.
pub(crate) fn album_line(detail: &AlbumDetail) -> String {
    if detail.contributors.is_empty() {
        detail.album.to_string()
    } else {
        format!("{} with {}", detail.album, detail.contributor_names())
    }
}
