//! Typed requests for every store write, plus the parsing that turns raw form
//! text into them. Each field is parsed exactly once here; the store only ever
//! sees typed values. Parsing collects every problem it finds so a form can
//! report them together.

use std::num::IntErrorKind;

use crate::error::ValidationErrors;
use crate::models::MAX_TEXT_LEN;

/// Message shown when an album is submitted without a title or a band.
pub const ALBUM_REQUIRED_MESSAGE: &str = "Please enter an album title and/or choose a band.";

/// Fields for `Store::create_band`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBand {
    pub name: String,
    pub formed_year: Option<i32>,
    pub home_location: Option<String>,
}

impl NewBand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formed_year: None,
            home_location: None,
        }
    }

    pub fn formed_in(mut self, year: i32) -> Self {
        self.formed_year = Some(year);
        self
    }

    pub fn based_in(mut self, location: impl Into<String>) -> Self {
        self.home_location = Some(location.into());
        self
    }

    /// Parse the raw text of the "add band" form.
    pub fn parse(
        name: &str,
        formed_year: &str,
        home_location: &str,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let formed_year = optional_year(&mut errors, "formed_year", "Formed year", formed_year);
        let band = Self {
            name: name.trim().to_string(),
            formed_year,
            home_location: optional_text(home_location),
        };
        band.check(&mut errors);
        errors.into_result().map(|_| band)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        errors.into_result()
    }

    fn check(&self, errors: &mut ValidationErrors) {
        check_required(errors, "name", "Band name", &self.name);
        check_length(errors, "home_location", "Home location", self.home_location.as_deref());
    }
}

/// Fields for `Store::create_member`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub main_position: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            main_position: None,
        }
    }

    pub fn playing(mut self, position: impl Into<String>) -> Self {
        self.main_position = Some(position.into());
        self
    }

    /// Parse the raw text of the "add member" form.
    pub fn parse(name: &str, main_position: &str) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let member = Self {
            name: name.trim().to_string(),
            main_position: optional_text(main_position),
        };
        member.check(&mut errors);
        errors.into_result().map(|_| member)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        errors.into_result()
    }

    fn check(&self, errors: &mut ValidationErrors) {
        check_required(errors, "name", "Member name", &self.name);
        check_length(errors, "main_position", "Main position", self.main_position.as_deref());
    }
}

/// Every mutable field of a membership. Used for both create and update since
/// updates always replace the full row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipFields {
    pub band_id: i64,
    pub member_id: i64,
    pub role: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

impl MembershipFields {
    pub fn new(band_id: i64, member_id: i64) -> Self {
        Self {
            band_id,
            member_id,
            role: None,
            start_year: None,
            end_year: None,
        }
    }

    pub fn as_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn years(mut self, start_year: Option<i32>, end_year: Option<i32>) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    /// Parse the membership form. Band and member come from pickers, so they
    /// arrive already typed but possibly unselected.
    pub fn parse(
        band_id: Option<i64>,
        member_id: Option<i64>,
        role: &str,
        start_year: &str,
        end_year: &str,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if band_id.is_none() {
            errors.push("band_id", "Choose a band.");
        }
        if member_id.is_none() {
            errors.push("member_id", "Choose a member.");
        }
        let start_year = optional_year(&mut errors, "start_year", "Start year", start_year);
        let end_year = optional_year(&mut errors, "end_year", "End year", end_year);

        let (Some(band_id), Some(member_id)) = (band_id, member_id) else {
            return Err(errors);
        };
        let fields = Self {
            band_id,
            member_id,
            role: optional_text(role),
            start_year,
            end_year,
        };
        fields.check(&mut errors);
        errors.into_result().map(|_| fields)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        errors.into_result()
    }

    fn check(&self, errors: &mut ValidationErrors) {
        if let (Some(start), Some(end)) = (self.start_year, self.end_year) {
            if end < start {
                errors.push("end_year", "End year cannot be before start year.");
            }
        }
    }
}

/// Fields for `Store::create_album`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub title: String,
    pub band_id: i64,
    pub release_year: Option<i32>,
    /// Other bands credited on the album. Ids that do not resolve are skipped
    /// by the store.
    pub contributing_band_ids: Vec<i64>,
}

impl NewAlbum {
    pub fn new(title: impl Into<String>, band_id: i64) -> Self {
        Self {
            title: title.into(),
            band_id,
            release_year: None,
            contributing_band_ids: Vec::new(),
        }
    }

    pub fn released_in(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_contributors(mut self, band_ids: impl IntoIterator<Item = i64>) -> Self {
        self.contributing_band_ids.extend(band_ids);
        self
    }

    /// Parse the "add album" form.
    pub fn parse(
        title: &str,
        band_id: Option<i64>,
        release_year: &str,
        contributing_band_ids: &[i64],
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = title.trim();
        let Some(band_id) = band_id.filter(|_| !title.is_empty()) else {
            return Err(ValidationErrors::single("album", ALBUM_REQUIRED_MESSAGE));
        };
        let release_year = optional_year(&mut errors, "release_year", "Release year", release_year);
        let album = Self {
            title: title.to_string(),
            band_id,
            release_year,
            contributing_band_ids: contributing_band_ids.to_vec(),
        };
        album.check(&mut errors);
        errors.into_result().map(|_| album)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        errors.into_result()
    }

    fn check(&self, errors: &mut ValidationErrors) {
        if self.title.trim().is_empty() {
            errors.push("album", ALBUM_REQUIRED_MESSAGE);
        } else {
            check_length(errors, "title", "Album title", Some(&self.title));
        }
    }
}

/// Blank input means "no value", never zero.
fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn optional_year(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<i32>() {
        Ok(year) => Some(year),
        Err(err)
            if matches!(
                err.kind(),
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
            ) =>
        {
            errors.push(field, format!("{label} is out of range."));
            None
        }
        Err(_) => {
            errors.push(field, format!("{label} must be a whole number."));
            None
        }
    }
}

fn check_required(errors: &mut ValidationErrors, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{label} is required."));
    } else {
        check_length(errors, field, label, Some(value));
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: Option<&str>,
) {
    if let Some(value) = value {
        if value.chars().count() > MAX_TEXT_LEN {
            errors.push(
                field,
                format!("{label} must be at most {MAX_TEXT_LEN} characters."),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_form_trims_and_normalizes_blanks() {
        let band = NewBand::parse("  The Beatles ", "1960", "   ").unwrap();
        assert_eq!(band, NewBand::new("The Beatles").formed_in(1960));
    }

    #[test]
    fn band_form_collects_every_error() {
        let errors = NewBand::parse("", "nineteen sixty", "").unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("formed_year"));
        assert_eq!(errors.errors().len(), 2);
    }

    #[test]
    fn band_name_length_is_capped() {
        let long_name = "x".repeat(MAX_TEXT_LEN + 1);
        let errors = NewBand::parse(&long_name, "", "").unwrap_err();
        assert!(errors.has("name"));

        let exact = "x".repeat(MAX_TEXT_LEN);
        assert!(NewBand::parse(&exact, "", "").is_ok());
    }

    #[test]
    fn oversized_year_is_out_of_range() {
        let errors = NewBand::parse("Can", "99999999999", "").unwrap_err();
        assert_eq!(errors.to_string(), "Formed year is out of range.");

        let errors = NewBand::parse("Can", "19x8", "").unwrap_err();
        assert_eq!(errors.to_string(), "Formed year must be a whole number.");
    }

    #[test]
    fn member_form_requires_name() {
        let errors = NewMember::parse(" ", "Drums").unwrap_err();
        assert!(errors.has("name"));

        let member = NewMember::parse("Ringo Starr", "Drums").unwrap();
        assert_eq!(member.main_position.as_deref(), Some("Drums"));
    }

    #[test]
    fn membership_form_keeps_blank_years_empty() {
        let fields = MembershipFields::parse(Some(1), Some(2), "", "1962", "").unwrap();
        assert_eq!(fields.start_year, Some(1962));
        assert_eq!(fields.end_year, None);
        assert_eq!(fields.role, None);
    }

    #[test]
    fn membership_form_accepts_zero_as_a_real_year() {
        let fields = MembershipFields::parse(Some(1), Some(2), "", "", "0").unwrap();
        assert_eq!(fields.end_year, Some(0));
    }

    #[test]
    fn membership_form_rejects_reversed_years() {
        let errors = MembershipFields::parse(Some(1), Some(2), "Bass", "1970", "1960").unwrap_err();
        assert!(errors.has("end_year"));
    }

    #[test]
    fn membership_form_requires_band_and_member() {
        let errors = MembershipFields::parse(None, None, "", "abc", "").unwrap_err();
        assert!(errors.has("band_id"));
        assert!(errors.has("member_id"));
        assert!(errors.has("start_year"));
    }

    #[test]
    fn album_form_without_title_or_band_uses_combined_message() {
        let errors = NewAlbum::parse("", Some(1), "", &[]).unwrap_err();
        assert_eq!(errors.to_string(), ALBUM_REQUIRED_MESSAGE);

        let errors = NewAlbum::parse("Abbey Road", None, "1969", &[]).unwrap_err();
        assert_eq!(errors.to_string(), ALBUM_REQUIRED_MESSAGE);
    }

    #[test]
    fn album_form_keeps_contributors() {
        let album = NewAlbum::parse("Abbey Road", Some(1), "1969", &[2, 3]).unwrap();
        assert_eq!(
            album,
            NewAlbum::new("Abbey Road", 1)
                .released_in(1969)
                .with_contributors([2, 3])
        );
    }
}
