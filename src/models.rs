//! Domain models that mirror the SQLite schema. They are plain data holders;
//! persistence lives in `db` and rendering in `ui`.

use std::fmt;

use serde::Serialize;

/// Longest accepted value for the bounded text columns (names, titles,
/// locations, positions).
pub const MAX_TEXT_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A musical group.
pub struct Band {
    pub id: i64,
    pub name: String,
    pub formed_year: Option<i32>,
    pub home_location: Option<String>,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Band {
    /// Trim the band down to its interchange form.
    pub fn summary(&self) -> BandSummary {
        BandSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// The `{id, name}` record used by the JSON listing and by pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A person. Members are tied to bands only through [`Membership`] rows.
pub struct Member {
    pub id: i64,
    pub name: String,
    pub main_position: Option<String>,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.main_position {
            Some(position) => write!(f, "{} ({position})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One member's tenure with one band.
pub struct Membership {
    pub id: i64,
    pub band_id: i64,
    pub member_id: i64,
    pub start_year: Option<i32>,
    /// `None` while the member is still in the band.
    pub end_year: Option<i32>,
    pub role: Option<String>,
}

impl Membership {
    pub fn is_active(&self) -> bool {
        self.end_year.is_none()
    }

    /// Render the tenure as `1960-1970`, `1960-present`, `?-1970` and so on.
    pub fn tenure(&self) -> String {
        let start = self
            .start_year
            .map(|year| year.to_string())
            .unwrap_or_else(|| "?".to_string());
        let end = self
            .end_year
            .map(|year| year.to_string())
            .unwrap_or_else(|| "present".to_string());
        format!("{start}-{end}")
    }
}

/// A member together with every tenure on record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDetail {
    #[serde(flatten)]
    pub member: Member,
    pub memberships: Vec<Membership>,
}

/// A membership joined with the member's name for band detail views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineupEntry {
    #[serde(flatten)]
    pub membership: Membership,
    pub member_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A release credited primarily to `band_id`.
pub struct Album {
    pub id: i64,
    pub band_id: i64,
    pub title: String,
    pub release_year: Option<i32>,
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.release_year {
            Some(year) => write!(f, "{} ({year})", self.title),
            None => write!(f, "{}", self.title),
        }
    }
}

/// An album with its primary band and contributor credits resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumDetail {
    #[serde(flatten)]
    pub album: Album,
    pub primary_band: BandSummary,
    pub contributors: Vec<BandSummary>,
}

impl AlbumDetail {
    pub fn contributor_names(&self) -> String {
        self.contributors
            .iter()
            .map(|band| band.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Everything the band detail view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandDetail {
    #[serde(flatten)]
    pub band: Band,
    pub lineup: Vec<LineupEntry>,
    pub albums: Vec<AlbumDetail>,
    pub contributed_albums: Vec<AlbumDetail>,
}
