use crossterm::event::KeyCode;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::error::ValidationErrors;
use crate::input::{MembershipFields, NewAlbum, NewBand, NewMember};
use crate::models::{Band, BandSummary, LineupEntry, Member, Membership};

/// What a key press did to a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormEvent {
    Submit,
    Cancel,
    Edited,
    Ignored,
}

/// Rendering hooks shared by every popup form.
pub(crate) trait FormView {
    fn lines(&self) -> Vec<Line<'static>>;
    /// Row and column (inside the popup) of the text cursor, if the active
    /// field takes typed input.
    fn cursor(&self) -> Option<(u16, u16)>;
    fn error(&self) -> Option<&str>;
}

/// Single-choice selector cycled with the arrow keys.
#[derive(Debug, Clone, Default)]
pub(crate) struct Picker {
    pub(crate) options: Vec<(i64, String)>,
    pub(crate) selected: Option<usize>,
}

impl Picker {
    pub(crate) fn new(options: Vec<(i64, String)>, preselect: Option<i64>) -> Self {
        let selected = preselect.and_then(|id| options.iter().position(|(opt, _)| *opt == id));
        Self { options, selected }
    }

    pub(crate) fn cycle(&mut self, offset: isize) {
        if self.options.is_empty() {
            return;
        }
        let len = self.options.len() as isize;
        let next = match self.selected {
            None if offset < 0 => len - 1,
            None => 0,
            Some(idx) => (idx as isize + offset).rem_euclid(len),
        };
        self.selected = Some(next as usize);
    }

    pub(crate) fn selected_id(&self) -> Option<i64> {
        self.selected
            .and_then(|idx| self.options.get(idx))
            .map(|(id, _)| *id)
    }

    fn display(&self) -> String {
        match self.selected.and_then(|idx| self.options.get(idx)) {
            Some((_, name)) => format!("< {name} >"),
            None => String::new(),
        }
    }
}

/// Multi-choice list of bands toggled with Space.
#[derive(Debug, Clone, Default)]
pub(crate) struct Checklist {
    pub(crate) options: Vec<(i64, String)>,
    pub(crate) checked: Vec<bool>,
    pub(crate) cursor: usize,
}

impl Checklist {
    pub(crate) fn new(options: Vec<(i64, String)>) -> Self {
        let checked = vec![false; options.len()];
        Self {
            options,
            checked,
            cursor: 0,
        }
    }

    pub(crate) fn move_cursor(&mut self, offset: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() as isize - 1;
        self.cursor = (self.cursor as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn toggle(&mut self) -> bool {
        match self.checked.get_mut(self.cursor) {
            Some(flag) => {
                *flag = !*flag;
                true
            }
            None => false,
        }
    }

    pub(crate) fn checked_ids(&self) -> Vec<i64> {
        self.options
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|((id, _), _)| *id)
            .collect()
    }

    fn build_lines(&self, is_active: bool) -> Vec<Line<'static>> {
        if self.options.is_empty() {
            return vec![Line::from(Span::styled(
                "  (no bands yet)",
                Style::default().fg(Color::DarkGray),
            ))];
        }
        self.options
            .iter()
            .zip(&self.checked)
            .enumerate()
            .map(|(idx, ((_, name), checked))| {
                let mark = if *checked { "[x]" } else { "[ ]" };
                let style = if is_active && idx == self.cursor {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!("  {mark} {name}"), style))
            })
            .collect()
    }
}

fn band_options(bands: &[Band]) -> Vec<(i64, String)> {
    bands.iter().map(|band| (band.id, band.name.clone())).collect()
}

fn member_options(members: &[Member]) -> Vec<(i64, String)> {
    members
        .iter()
        .map(|member| (member.id, member.to_string()))
        .collect()
}

/// Accept anything printable.
fn push_text(value: &mut String, ch: char) -> bool {
    if ch.is_control() {
        false
    } else {
        value.push(ch);
        true
    }
}

/// Years are typed as plain digits.
fn push_digit(value: &mut String, ch: char) -> bool {
    if ch.is_ascii_digit() {
        value.push(ch);
        true
    } else {
        false
    }
}

fn year_text(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_default()
}

/// One `Label: value` row, highlighting the focused field.
fn field_line(label: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

fn text_cursor(row: usize, label: &str, value: &str) -> Option<(u16, u16)> {
    let col = label.chars().count() + 2 + value.chars().count();
    Some((row as u16, col as u16))
}

fn step<T: Copy + PartialEq>(order: &[T], current: T, offset: isize) -> T {
    let idx = order.iter().position(|f| *f == current).unwrap_or(0) as isize;
    let len = order.len() as isize;
    order[(idx + offset).rem_euclid(len) as usize]
}

/// Shared handling for single-line text fields.
fn edit_text(value: &mut String, code: KeyCode, digits_only: bool) -> FormEvent {
    match code {
        KeyCode::Backspace => {
            if value.pop().is_some() {
                FormEvent::Edited
            } else {
                FormEvent::Ignored
            }
        }
        KeyCode::Char(ch) => {
            let pushed = if digits_only {
                push_digit(value, ch)
            } else {
                push_text(value, ch)
            };
            if pushed {
                FormEvent::Edited
            } else {
                FormEvent::Ignored
            }
        }
        _ => FormEvent::Ignored,
    }
}

/// Fields of the band form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BandField {
    #[default]
    Name,
    FormedYear,
    HomeLocation,
}

const BAND_FIELDS: [BandField; 3] = [
    BandField::Name,
    BandField::FormedYear,
    BandField::HomeLocation,
];

/// Internal representation of the "add band" form fields.
#[derive(Debug, Default, Clone)]
pub(crate) struct BandForm {
    pub(crate) name: String,
    pub(crate) formed_year: String,
    pub(crate) home_location: String,
    pub(crate) active: BandField,
    pub(crate) error: Option<String>,
}

impl BandForm {
    pub(crate) fn handle_key(&mut self, code: KeyCode) -> FormEvent {
        match code {
            KeyCode::Esc => FormEvent::Cancel,
            KeyCode::Enter => FormEvent::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.active = step(&BAND_FIELDS, self.active, 1);
                FormEvent::Ignored
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.active = step(&BAND_FIELDS, self.active, -1);
                FormEvent::Ignored
            }
            _ => match self.active {
                BandField::Name => edit_text(&mut self.name, code, false),
                BandField::FormedYear => edit_text(&mut self.formed_year, code, true),
                BandField::HomeLocation => edit_text(&mut self.home_location, code, false),
            },
        }
    }

    /// Validate the inputs and return typed values ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<NewBand, ValidationErrors> {
        NewBand::parse(&self.name, &self.formed_year, &self.home_location)
    }
}

impl FormView for BandForm {
    fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line("Name", &self.name, "<required>", self.active == BandField::Name),
            field_line(
                "Formed",
                &self.formed_year,
                "<optional year>",
                self.active == BandField::FormedYear,
            ),
            field_line(
                "Home",
                &self.home_location,
                "<optional>",
                self.active == BandField::HomeLocation,
            ),
        ]
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        match self.active {
            BandField::Name => text_cursor(0, "Name", &self.name),
            BandField::FormedYear => text_cursor(1, "Formed", &self.formed_year),
            BandField::HomeLocation => text_cursor(2, "Home", &self.home_location),
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Fields of the member form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum MemberField {
    #[default]
    Name,
    MainPosition,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct MemberForm {
    pub(crate) name: String,
    pub(crate) main_position: String,
    pub(crate) active: MemberField,
    pub(crate) error: Option<String>,
}

impl MemberForm {
    pub(crate) fn handle_key(&mut self, code: KeyCode) -> FormEvent {
        match code {
            KeyCode::Esc => FormEvent::Cancel,
            KeyCode::Enter => FormEvent::Submit,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.active = match self.active {
                    MemberField::Name => MemberField::MainPosition,
                    MemberField::MainPosition => MemberField::Name,
                };
                FormEvent::Ignored
            }
            _ => match self.active {
                MemberField::Name => edit_text(&mut self.name, code, false),
                MemberField::MainPosition => edit_text(&mut self.main_position, code, false),
            },
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<NewMember, ValidationErrors> {
        NewMember::parse(&self.name, &self.main_position)
    }
}

impl FormView for MemberForm {
    fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line("Name", &self.name, "<required>", self.active == MemberField::Name),
            field_line(
                "Position",
                &self.main_position,
                "<optional>",
                self.active == MemberField::MainPosition,
            ),
        ]
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        match self.active {
            MemberField::Name => text_cursor(0, "Name", &self.name),
            MemberField::MainPosition => text_cursor(1, "Position", &self.main_position),
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Fields of the album form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum AlbumField {
    #[default]
    Title,
    ReleaseYear,
    Band,
    Contributors,
}

const ALBUM_FIELDS: [AlbumField; 4] = [
    AlbumField::Title,
    AlbumField::ReleaseYear,
    AlbumField::Band,
    AlbumField::Contributors,
];

/// Album form: text fields, a primary band picker and a contributor checklist.
#[derive(Debug, Clone)]
pub(crate) struct AlbumForm {
    pub(crate) title: String,
    pub(crate) release_year: String,
    pub(crate) band: Picker,
    pub(crate) contributors: Checklist,
    pub(crate) active: AlbumField,
    pub(crate) error: Option<String>,
}

impl AlbumForm {
    pub(crate) fn new(bands: &[Band], preselect: Option<i64>) -> Self {
        Self {
            title: String::new(),
            release_year: String::new(),
            band: Picker::new(band_options(bands), preselect),
            contributors: Checklist::new(band_options(bands)),
            active: AlbumField::Title,
            error: None,
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> FormEvent {
        match code {
            KeyCode::Esc => return FormEvent::Cancel,
            KeyCode::Enter => return FormEvent::Submit,
            KeyCode::Tab => {
                self.active = step(&ALBUM_FIELDS, self.active, 1);
                return FormEvent::Ignored;
            }
            KeyCode::BackTab => {
                self.active = step(&ALBUM_FIELDS, self.active, -1);
                return FormEvent::Ignored;
            }
            _ => {}
        }

        match self.active {
            AlbumField::Title => match code {
                KeyCode::Down => self.focus_step(1),
                KeyCode::Up => self.focus_step(-1),
                _ => edit_text(&mut self.title, code, false),
            },
            AlbumField::ReleaseYear => match code {
                KeyCode::Down => self.focus_step(1),
                KeyCode::Up => self.focus_step(-1),
                _ => edit_text(&mut self.release_year, code, true),
            },
            AlbumField::Band => match code {
                KeyCode::Left => {
                    self.band.cycle(-1);
                    FormEvent::Edited
                }
                KeyCode::Right | KeyCode::Char(' ') => {
                    self.band.cycle(1);
                    FormEvent::Edited
                }
                KeyCode::Down => self.focus_step(1),
                KeyCode::Up => self.focus_step(-1),
                _ => FormEvent::Ignored,
            },
            AlbumField::Contributors => match code {
                KeyCode::Down => {
                    self.contributors.move_cursor(1);
                    FormEvent::Ignored
                }
                KeyCode::Up if self.contributors.cursor == 0 => self.focus_step(-1),
                KeyCode::Up => {
                    self.contributors.move_cursor(-1);
                    FormEvent::Ignored
                }
                KeyCode::Char(' ') => {
                    if self.contributors.toggle() {
                        FormEvent::Edited
                    } else {
                        FormEvent::Ignored
                    }
                }
                _ => FormEvent::Ignored,
            },
        }
    }

    fn focus_step(&mut self, offset: isize) -> FormEvent {
        self.active = step(&ALBUM_FIELDS, self.active, offset);
        FormEvent::Ignored
    }

    pub(crate) fn parse_inputs(&self) -> Result<NewAlbum, ValidationErrors> {
        NewAlbum::parse(
            &self.title,
            self.band.selected_id(),
            &self.release_year,
            &self.contributors.checked_ids(),
        )
    }
}

impl FormView for AlbumForm {
    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            field_line("Title", &self.title, "<required>", self.active == AlbumField::Title),
            field_line(
                "Released",
                &self.release_year,
                "<optional year>",
                self.active == AlbumField::ReleaseYear,
            ),
            field_line(
                "Band",
                &self.band.display(),
                "<choose with \u{2190}/\u{2192}>",
                self.active == AlbumField::Band,
            ),
            Line::from(Span::styled(
                "Contributing bands:",
                if self.active == AlbumField::Contributors {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                },
            )),
        ];
        lines.extend(
            self.contributors
                .build_lines(self.active == AlbumField::Contributors),
        );
        lines
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        match self.active {
            AlbumField::Title => text_cursor(0, "Title", &self.title),
            AlbumField::ReleaseYear => text_cursor(1, "Released", &self.release_year),
            AlbumField::Band | AlbumField::Contributors => None,
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Fields of the membership form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum MembershipField {
    #[default]
    Band,
    Member,
    Role,
    StartYear,
    EndYear,
}

const MEMBERSHIP_FIELDS: [MembershipField; 5] = [
    MembershipField::Band,
    MembershipField::Member,
    MembershipField::Role,
    MembershipField::StartYear,
    MembershipField::EndYear,
];

/// Used both to assign a member to a band and to edit an existing tenure.
#[derive(Debug, Clone)]
pub(crate) struct MembershipForm {
    pub(crate) band: Picker,
    pub(crate) member: Picker,
    pub(crate) role: String,
    pub(crate) start_year: String,
    pub(crate) end_year: String,
    pub(crate) active: MembershipField,
    pub(crate) error: Option<String>,
}

impl MembershipForm {
    pub(crate) fn new(bands: &[Band], members: &[Member], band_id: Option<i64>) -> Self {
        Self {
            band: Picker::new(band_options(bands), band_id),
            member: Picker::new(member_options(members), None),
            role: String::new(),
            start_year: String::new(),
            end_year: String::new(),
            active: if band_id.is_some() {
                MembershipField::Member
            } else {
                MembershipField::Band
            },
            error: None,
        }
    }

    /// Populate the form from an existing membership when editing.
    pub(crate) fn from_membership(
        bands: &[Band],
        members: &[Member],
        membership: &Membership,
    ) -> Self {
        Self {
            band: Picker::new(band_options(bands), Some(membership.band_id)),
            member: Picker::new(member_options(members), Some(membership.member_id)),
            role: membership.role.clone().unwrap_or_default(),
            start_year: year_text(membership.start_year),
            end_year: year_text(membership.end_year),
            active: MembershipField::Role,
            error: None,
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> FormEvent {
        match code {
            KeyCode::Esc => FormEvent::Cancel,
            KeyCode::Enter => FormEvent::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.active = step(&MEMBERSHIP_FIELDS, self.active, 1);
                FormEvent::Ignored
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.active = step(&MEMBERSHIP_FIELDS, self.active, -1);
                FormEvent::Ignored
            }
            _ => match self.active {
                MembershipField::Band => cycle_picker(&mut self.band, code),
                MembershipField::Member => cycle_picker(&mut self.member, code),
                MembershipField::Role => edit_text(&mut self.role, code, false),
                MembershipField::StartYear => edit_text(&mut self.start_year, code, true),
                MembershipField::EndYear => edit_text(&mut self.end_year, code, true),
            },
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<MembershipFields, ValidationErrors> {
        MembershipFields::parse(
            self.band.selected_id(),
            self.member.selected_id(),
            &self.role,
            &self.start_year,
            &self.end_year,
        )
    }
}

fn cycle_picker(picker: &mut Picker, code: KeyCode) -> FormEvent {
    match code {
        KeyCode::Left => picker.cycle(-1),
        KeyCode::Right | KeyCode::Char(' ') => picker.cycle(1),
        _ => return FormEvent::Ignored,
    }
    FormEvent::Edited
}

impl FormView for MembershipForm {
    fn lines(&self) -> Vec<Line<'static>> {
        let choose = "<choose with \u{2190}/\u{2192}>";
        vec![
            field_line(
                "Band",
                &self.band.display(),
                choose,
                self.active == MembershipField::Band,
            ),
            field_line(
                "Member",
                &self.member.display(),
                choose,
                self.active == MembershipField::Member,
            ),
            field_line("Role", &self.role, "<optional>", self.active == MembershipField::Role),
            field_line(
                "Start",
                &self.start_year,
                "<optional year>",
                self.active == MembershipField::StartYear,
            ),
            field_line(
                "End",
                &self.end_year,
                "<blank while active>",
                self.active == MembershipField::EndYear,
            ),
        ]
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        match self.active {
            MembershipField::Band | MembershipField::Member => None,
            MembershipField::Role => text_cursor(2, "Role", &self.role),
            MembershipField::StartYear => text_cursor(3, "Start", &self.start_year),
            MembershipField::EndYear => text_cursor(4, "End", &self.end_year),
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConfirmMembershipDelete {
    pub(crate) id: i64,
    pub(crate) member_name: String,
    pub(crate) band_name: String,
    pub(crate) tenure: String,
}

impl ConfirmMembershipDelete {
    pub(crate) fn new(entry: &LineupEntry, band_name: &str) -> Self {
        Self {
            id: entry.membership.id,
            member_name: entry.member_name.clone(),
            band_name: band_name.to_string(),
            tenure: entry.membership.tenure(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConfirmBandDelete {
    pub(crate) band: BandSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> Vec<Band> {
        ["The Beatles", "Wings", "Plastic Ono Band"]
            .iter()
            .enumerate()
            .map(|(idx, name)| Band {
                id: idx as i64 + 1,
                name: name.to_string(),
                formed_year: None,
                home_location: None,
            })
            .collect()
    }

    fn type_text(form: &mut impl FnMut(KeyCode) -> FormEvent, text: &str) {
        for ch in text.chars() {
            form(KeyCode::Char(ch));
        }
    }

    #[test]
    fn band_form_year_field_only_takes_digits() {
        let mut form = BandForm::default();
        type_text(&mut |code| form.handle_key(code), "Cream");
        form.handle_key(KeyCode::Tab);
        type_text(&mut |code| form.handle_key(code), "19a66");

        assert_eq!(form.formed_year, "1966");
        let band = form.parse_inputs().unwrap();
        assert_eq!(band, NewBand::new("Cream").formed_in(1966));
    }

    #[test]
    fn picker_wraps_in_both_directions() {
        let mut picker = Picker::new(vec![(1, "a".into()), (2, "b".into())], None);
        assert_eq!(picker.selected_id(), None);
        picker.cycle(-1);
        assert_eq!(picker.selected_id(), Some(2));
        picker.cycle(1);
        assert_eq!(picker.selected_id(), Some(1));
    }

    #[test]
    fn album_form_collects_checked_contributors() {
        let mut form = AlbumForm::new(&bands(), Some(1));
        type_text(&mut |code| form.handle_key(code), "Abbey Road");
        form.active = AlbumField::Contributors;
        form.handle_key(KeyCode::Down);
        form.handle_key(KeyCode::Char(' '));
        form.handle_key(KeyCode::Down);
        form.handle_key(KeyCode::Char(' '));

        let album = form.parse_inputs().unwrap();
        assert_eq!(album.band_id, 1);
        assert_eq!(album.contributing_band_ids, vec![2, 3]);
    }

    #[test]
    fn album_form_without_band_reports_combined_message() {
        let mut form = AlbumForm::new(&bands(), None);
        type_text(&mut |code| form.handle_key(code), "Untitled");
        let errors = form.parse_inputs().unwrap_err();
        assert_eq!(errors.to_string(), crate::input::ALBUM_REQUIRED_MESSAGE);
    }

    #[test]
    fn membership_form_round_trips_existing_values() {
        let members = vec![Member {
            id: 9,
            name: "John Lennon".into(),
            main_position: Some("Guitar".into()),
        }];
        let membership = Membership {
            id: 4,
            band_id: 1,
            member_id: 9,
            start_year: Some(1960),
            end_year: None,
            role: Some("Rhythm guitar".into()),
        };

        let form = MembershipForm::from_membership(&bands(), &members, &membership);
        let fields = form.parse_inputs().unwrap();
        assert_eq!(
            fields,
            MembershipFields::new(1, 9)
                .as_role("Rhythm guitar")
                .years(Some(1960), None)
        );
        assert_eq!(form.cursor(), Some((2, 6 + "Rhythm guitar".len() as u16)));
    }
}
