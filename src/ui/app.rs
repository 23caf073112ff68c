use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::db::Store;
use crate::error::StoreError;
use crate::models::Band;

use super::forms::{
    AlbumForm, BandForm, ConfirmBandDelete, ConfirmMembershipDelete, FormEvent, FormView,
    MemberForm, MembershipForm,
};
use super::helpers::{album_line, band_heading, centered_rect, lineup_line, surface_error};
use super::screens::{BandDetailScreen, MenuItem};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// High-level navigation states.
enum Screen {
    Home,
    Bands,
    BandDetail(BandDetailScreen),
}

/// Popups and dialogs layered over the current screen.
enum Mode {
    Normal,
    AddingBand(BandForm),
    AddingMember(MemberForm),
    AddingAlbum(AlbumForm),
    AddingMembership(MembershipForm),
    EditingMembership { id: i64, form: MembershipForm },
    ConfirmMembershipDelete(ConfirmMembershipDelete),
    ConfirmBandDelete(ConfirmBandDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: Store,
    bands: Vec<Band>,
    selected: usize,
    menu_selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: Store) -> Result<Self> {
        let bands = store.list_bands().context("failed to load bands")?;
        Ok(Self {
            store,
            bands,
            selected: 0,
            menu_selected: 0,
            screen: Screen::Home,
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Give the store back so the caller can close it.
    pub fn into_store(self) -> Store {
        self.store
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBand(form) => self.handle_add_band(code, form)?,
            Mode::AddingMember(form) => self.handle_add_member(code, form)?,
            Mode::AddingAlbum(form) => self.handle_add_album(code, form)?,
            Mode::AddingMembership(form) => self.handle_add_membership(code, form)?,
            Mode::EditingMembership { id, form } => self.handle_edit_membership(code, id, form)?,
            Mode::ConfirmMembershipDelete(confirm) => {
                self.handle_confirm_membership_delete(code, confirm)?
            }
            Mode::ConfirmBandDelete(confirm) => self.handle_confirm_band_delete(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Home => match code {
                KeyCode::Char('q') | KeyCode::Esc => *exit = true,
                KeyCode::Up => self.move_menu(-1),
                KeyCode::Down => self.move_menu(1),
                KeyCode::Enter => {
                    let item = MenuItem::ALL[self.menu_selected];
                    return self.activate_menu(item, exit);
                }
                _ => {}
            },
            Screen::Bands => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc => {
                    self.clear_status();
                    self.screen = Screen::Home;
                }
                KeyCode::Up => self.move_band(-1),
                KeyCode::Down => self.move_band(1),
                KeyCode::Enter => match self.current_band().map(|band| band.id) {
                    Some(id) => self.open_band_view(id)?,
                    None => self.set_status("No band selected.", StatusKind::Error),
                },
                KeyCode::Char('+') => {
                    self.clear_status();
                    return Ok(Mode::AddingBand(BandForm::default()));
                }
                KeyCode::Char('a') | KeyCode::Char('A') => {
                    let band_id = self.current_band().map(|band| band.id);
                    return self.open_album_form(band_id);
                }
                KeyCode::Char('-') => match self.current_band() {
                    Some(band) => {
                        let band = band.summary();
                        self.clear_status();
                        return Ok(Mode::ConfirmBandDelete(ConfirmBandDelete { band }));
                    }
                    None => self.set_status("No band selected to remove.", StatusKind::Error),
                },
                _ => {}
            },
            Screen::BandDetail(_) => return self.handle_detail_key(code, exit),
        }
        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::BandDetail(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Up => {
                screen.move_selection(-1);
                return Ok(Mode::Normal);
            }
            KeyCode::Down => {
                screen.move_selection(1);
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        let band_id = screen.band_id();
        let band_name = screen.detail.band.name.clone();
        let entry = screen.current_entry().cloned();

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.clear_status();
                self.screen = Screen::Bands;
            }
            KeyCode::Char('e') | KeyCode::Char('E') => match entry {
                Some(entry) => return self.open_membership_editor(entry.membership.id),
                None => self.set_status("No membership selected to edit.", StatusKind::Error),
            },
            KeyCode::Char('d') | KeyCode::Char('-') => match entry {
                Some(entry) => {
                    self.clear_status();
                    return Ok(Mode::ConfirmMembershipDelete(ConfirmMembershipDelete::new(
                        &entry, &band_name,
                    )));
                }
                None => self.set_status("No membership selected to remove.", StatusKind::Error),
            },
            KeyCode::Char('+') | KeyCode::Char('m') | KeyCode::Char('M') => {
                return self.open_membership_form(Some(band_id));
            }
            KeyCode::Char('a') | KeyCode::Char('A') => return self.open_album_form(Some(band_id)),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn activate_menu(&mut self, item: MenuItem, exit: &mut bool) -> Result<Mode> {
        self.clear_status();
        match item {
            MenuItem::ViewBands => {
                self.reload_bands(None)?;
                self.screen = Screen::Bands;
                Ok(Mode::Normal)
            }
            MenuItem::AddBand => Ok(Mode::AddingBand(BandForm::default())),
            MenuItem::AddMember => Ok(Mode::AddingMember(MemberForm::default())),
            MenuItem::AddAlbum => self.open_album_form(None),
            MenuItem::AddMembership => self.open_membership_form(None),
            MenuItem::Quit => {
                *exit = true;
                Ok(Mode::Normal)
            }
        }
    }

    fn handle_add_band(&mut self, code: KeyCode, mut form: BandForm) -> Result<Mode> {
        match form.handle_key(code) {
            FormEvent::Cancel => {
                self.set_status("Add band cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormEvent::Submit => match self.save_new_band(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => self.report_form_error(&mut form.error, &err),
            },
            FormEvent::Edited => form.error = None,
            FormEvent::Ignored => {}
        }
        Ok(Mode::AddingBand(form))
    }

    fn handle_add_member(&mut self, code: KeyCode, mut form: MemberForm) -> Result<Mode> {
        match form.handle_key(code) {
            FormEvent::Cancel => {
                self.set_status("Add member cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormEvent::Submit => match self.save_new_member(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => self.report_form_error(&mut form.error, &err),
            },
            FormEvent::Edited => form.error = None,
            FormEvent::Ignored => {}
        }
        Ok(Mode::AddingMember(form))
    }

    fn handle_add_album(&mut self, code: KeyCode, mut form: AlbumForm) -> Result<Mode> {
        match form.handle_key(code) {
            FormEvent::Cancel => {
                self.set_status("Add album cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormEvent::Submit => match self.save_new_album(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => self.report_form_error(&mut form.error, &err),
            },
            FormEvent::Edited => form.error = None,
            FormEvent::Ignored => {}
        }
        Ok(Mode::AddingAlbum(form))
    }

    fn handle_add_membership(&mut self, code: KeyCode, mut form: MembershipForm) -> Result<Mode> {
        match form.handle_key(code) {
            FormEvent::Cancel => {
                self.set_status("Membership not assigned.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormEvent::Submit => match self.save_new_membership(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => self.report_form_error(&mut form.error, &err),
            },
            FormEvent::Edited => form.error = None,
            FormEvent::Ignored => {}
        }
        Ok(Mode::AddingMembership(form))
    }

    fn handle_edit_membership(
        &mut self,
        code: KeyCode,
        id: i64,
        mut form: MembershipForm,
    ) -> Result<Mode> {
        match form.handle_key(code) {
            FormEvent::Cancel => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            FormEvent::Submit => match self.save_existing_membership(id, &form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => self.report_form_error(&mut form.error, &err),
            },
            FormEvent::Edited => form.error = None,
            FormEvent::Ignored => {}
        }
        Ok(Mode::EditingMembership { id, form })
    }

    fn handle_confirm_membership_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmMembershipDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_membership_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::ConfirmMembershipDelete(confirm)),
        }
    }

    fn handle_confirm_band_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmBandDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_band_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::ConfirmBandDelete(confirm)),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Home => self.draw_home(frame, content_area),
            Screen::Bands => self.draw_band_list(frame, content_area),
            Screen::BandDetail(screen) => self.draw_band_detail(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBand(form) => self.draw_form(frame, area, "Add Band", form, (60, 40)),
            Mode::AddingMember(form) => self.draw_form(frame, area, "Add Member", form, (60, 35)),
            Mode::AddingAlbum(form) => self.draw_form(frame, area, "Add Album", form, (70, 80)),
            Mode::AddingMembership(form) => {
                self.draw_form(frame, area, "Assign Membership", form, (70, 50))
            }
            Mode::EditingMembership { form, .. } => {
                self.draw_form(frame, area, "Edit Membership", form, (70, 50))
            }
            Mode::ConfirmMembershipDelete(confirm) => {
                self.draw_confirm_membership(frame, area, confirm)
            }
            Mode::ConfirmBandDelete(confirm) => self.draw_confirm_band(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect) {
        let menu_area = centered_rect(50, 60, area);
        let items: Vec<ListItem> = MenuItem::ALL
            .iter()
            .map(|item| ListItem::new(item.label()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Rock Bands ({} on file)", self.bands.len()))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.menu_selected));
        frame.render_stateful_widget(list, menu_area, &mut state);
    }

    fn draw_band_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title("Bands").borders(Borders::ALL);
        if self.bands.is_empty() {
            let paragraph = Paragraph::new("No bands yet. Press + to add one.")
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self
            .bands
            .iter()
            .map(|band| ListItem::new(band_heading(band)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_band_detail(&self, frame: &mut Frame, area: Rect, screen: &BandDetailScreen) {
        let detail = &screen.detail;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Percentage(45),
                Constraint::Min(0),
            ])
            .split(area);

        let active = detail
            .lineup
            .iter()
            .filter(|entry| entry.membership.is_active())
            .count();
        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                band_heading(&detail.band),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "{} membership(s), {active} active, {} album(s)",
                detail.lineup.len(),
                detail.albums.len()
            )),
        ])
        .block(Block::default().title("Band").borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let lineup_block = Block::default().title("Lineup").borders(Borders::ALL);
        if detail.lineup.is_empty() {
            let paragraph = Paragraph::new(Span::styled(
                "No memberships yet. Press + to assign a member.",
                Style::default().fg(Color::DarkGray),
            ))
            .block(lineup_block);
            frame.render_widget(paragraph, chunks[1]);
        } else {
            let items: Vec<ListItem> = detail
                .lineup
                .iter()
                .map(|entry| ListItem::new(lineup_line(entry)))
                .collect();
            let list = List::new(items)
                .block(lineup_block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            let mut state = ListState::default().with_selected(Some(screen.selected));
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }

        let muted = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();
        if detail.albums.is_empty() {
            lines.push(Line::from(Span::styled("No albums yet.", muted)));
        }
        for album in &detail.albums {
            lines.push(Line::from(album_line(album)));
        }
        if !detail.contributed_albums.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Also appears on:",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for album in &detail.contributed_albums {
                lines.push(Line::from(format!(
                    "{} by {}",
                    album.album, album.primary_band.name
                )));
            }
        }
        let albums = Paragraph::new(lines)
            .block(Block::default().title("Albums").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(albums, chunks[2]);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::AddingAlbum(_)) => &[
                ("[Tab]", " Next field   "),
                ("[Left/Right]", " Choose band   "),
                ("[Space]", " Toggle contributor   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::AddingMembership(_)) | (_, Mode::EditingMembership { .. }) => &[
                ("[Tab]", " Next field   "),
                ("[Left/Right]", " Choose   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::AddingBand(_)) | (_, Mode::AddingMember(_)) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::ConfirmMembershipDelete(_)) | (_, Mode::ConfirmBandDelete(_)) => {
                &[("[Y]", " Confirm   "), ("[N/Esc]", " Cancel")]
            }
            (Screen::Home, Mode::Normal) => &[
                ("[Up/Down]", " Navigate   "),
                ("[Enter]", " Open   "),
                ("[Q]", " Quit"),
            ],
            (Screen::Bands, Mode::Normal) => &[
                ("[Enter]", " Details   "),
                ("[+]", " Add band   "),
                ("[A]", " Add album   "),
                ("[-]", " Delete band   "),
                ("[Esc]", " Menu   "),
                ("[Q]", " Quit"),
            ],
            (Screen::BandDetail(_), Mode::Normal) => &[
                ("[+]", " Assign member   "),
                ("[E]", " Edit   "),
                ("[D]", " Remove   "),
                ("[A]", " Add album   "),
                ("[Esc]", " Back   "),
                ("[Q]", " Quit"),
            ],
        };

        Line::from(
            keys.iter()
                .flat_map(|(key, label)| {
                    [
                        Span::styled(key.to_string(), key_style),
                        Span::raw(label.to_string()),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        form: &dyn FormView,
        (percent_x, percent_y): (u16, u16),
    ) {
        let popup_area = centered_rect(percent_x, percent_y, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        if let Some(error) = form.error() {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save, Tab to switch, Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if let Some((row, col)) = form.cursor() {
            if row < inner.height && col < inner.width {
                frame.set_cursor_position((inner.x + col, inner.y + row));
            }
        }
    }

    fn draw_confirm_membership(
        &self,
        frame: &mut Frame,
        area: Rect,
        confirm: &ConfirmMembershipDelete,
    ) {
        let lines = vec![
            Line::from(format!(
                "Remove {} from {} ({})?",
                confirm.member_name, confirm.band_name, confirm.tenure
            )),
            Line::from("The member stays on file; only this tenure is removed."),
        ];
        self.draw_confirm(frame, area, "Confirm Removal", lines);
    }

    fn draw_confirm_band(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBandDelete) {
        let lines = vec![
            Line::from(format!("Delete band {}?", confirm.band.name)),
            Line::from("Bands with memberships or albums cannot be deleted."),
        ];
        self.draw_confirm(frame, area, "Confirm Deletion", lines);
    }

    fn draw_confirm(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        mut lines: Vec<Line<'static>>,
    ) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn report_form_error(&mut self, slot: &mut Option<String>, err: &anyhow::Error) {
        let message = surface_error(err);
        *slot = Some(message.clone());
        self.set_status(message, StatusKind::Error);
    }

    fn open_album_form(&mut self, band_id: Option<i64>) -> Result<Mode> {
        if self.bands.is_empty() {
            self.set_status("Add a band before adding albums.", StatusKind::Error);
            return Ok(Mode::Normal);
        }
        self.clear_status();
        Ok(Mode::AddingAlbum(AlbumForm::new(&self.bands, band_id)))
    }

    fn open_membership_form(&mut self, band_id: Option<i64>) -> Result<Mode> {
        let members = self.store.list_members().context("failed to load members")?;
        if self.bands.is_empty() || members.is_empty() {
            self.set_status(
                "Add at least one band and one member first.",
                StatusKind::Error,
            );
            return Ok(Mode::Normal);
        }
        self.clear_status();
        Ok(Mode::AddingMembership(MembershipForm::new(
            &self.bands,
            &members,
            band_id,
        )))
    }

    fn open_membership_editor(&mut self, id: i64) -> Result<Mode> {
        let membership = match self.store.get_membership(id) {
            Ok(membership) => membership,
            Err(err @ StoreError::NotFound { .. }) => {
                self.set_status(err.to_string(), StatusKind::Error);
                return Ok(Mode::Normal);
            }
            Err(err) => return Err(err).context("failed to load membership"),
        };
        let members = self.store.list_members().context("failed to load members")?;
        self.clear_status();
        Ok(Mode::EditingMembership {
            id,
            form: MembershipForm::from_membership(&self.bands, &members, &membership),
        })
    }

    fn save_new_band(&mut self, form: &BandForm) -> Result<()> {
        let request = form.parse_inputs()?;
        let band = self.store.create_band(&request)?;
        self.reload_bands(Some(band.id))?;
        self.set_status(format!("Band '{}' added.", band.name), StatusKind::Info);
        Ok(())
    }

    fn save_new_member(&mut self, form: &MemberForm) -> Result<()> {
        let request = form.parse_inputs()?;
        let member = self.store.create_member(&request)?;
        self.screen = Screen::Home;
        self.set_status(format!("Member '{}' added.", member.name), StatusKind::Info);
        Ok(())
    }

    fn save_new_album(&mut self, form: &AlbumForm) -> Result<()> {
        let request = form.parse_inputs()?;
        let album = self.store.create_album(&request)?;
        self.reload_bands(Some(album.band_id))?;
        self.refresh_after_change(None)?;
        self.set_status(format!("Album '{}' added.", album.title), StatusKind::Info);
        Ok(())
    }

    fn save_new_membership(&mut self, form: &MembershipForm) -> Result<()> {
        let request = form.parse_inputs()?;
        let membership = self.store.create_membership(&request)?;
        self.reload_bands(Some(membership.band_id))?;
        self.refresh_after_change(Some(membership.id))?;
        self.set_status("Membership assigned.", StatusKind::Info);
        Ok(())
    }

    fn save_existing_membership(&mut self, id: i64, form: &MembershipForm) -> Result<()> {
        let request = form.parse_inputs()?;
        self.store.update_membership(id, &request)?;
        self.refresh_after_change(Some(id))?;
        self.set_status("Membership updated.", StatusKind::Info);
        Ok(())
    }

    fn perform_membership_delete(&mut self, confirm: &ConfirmMembershipDelete) -> Result<()> {
        self.store.delete_membership(confirm.id)?;
        self.refresh_after_change(None)?;
        self.set_status(
            format!("Removed {} from {}.", confirm.member_name, confirm.band_name),
            StatusKind::Info,
        );
        Ok(())
    }

    fn perform_band_delete(&mut self, confirm: &ConfirmBandDelete) -> Result<()> {
        self.store.delete_band(confirm.band.id)?;
        self.reload_bands(None)?;
        self.screen = Screen::Bands;
        self.set_status(
            format!("Band '{}' deleted.", confirm.band.name),
            StatusKind::Info,
        );
        Ok(())
    }

    /// After a lineup or album change, refresh the open band view, or fall back
    /// to the band list when no band is open.
    fn refresh_after_change(&mut self, focus: Option<i64>) -> Result<()> {
        let open_band = match &self.screen {
            Screen::BandDetail(screen) => Some(screen.band_id()),
            _ => None,
        };
        match open_band {
            Some(id) => {
                let detail = self.store.band_detail(id)?;
                if let Screen::BandDetail(screen) = &mut self.screen {
                    screen.replace(detail, focus);
                }
            }
            None => self.screen = Screen::Bands,
        }
        Ok(())
    }

    fn reload_bands(&mut self, focus_id: Option<i64>) -> Result<()> {
        self.bands = self.store.list_bands()?;
        if self.bands.is_empty() {
            self.selected = 0;
            return Ok(());
        }

        if let Some(id) = focus_id {
            if let Some(idx) = self.bands.iter().position(|band| band.id == id) {
                self.selected = idx;
                return Ok(());
            }
        }

        if self.selected >= self.bands.len() {
            self.selected = self.bands.len().saturating_sub(1);
        }

        Ok(())
    }

    fn open_band_view(&mut self, id: i64) -> Result<()> {
        match self.store.band_detail(id) {
            Ok(detail) => {
                debug!(band_id = id, "opened band view");
                self.clear_status();
                self.screen = Screen::BandDetail(BandDetailScreen::new(detail));
            }
            Err(err @ StoreError::NotFound { .. }) => {
                self.set_status(err.to_string(), StatusKind::Error);
                self.reload_bands(None)?;
            }
            Err(err) => return Err(err).context("failed to load band"),
        }
        Ok(())
    }

    fn current_band(&self) -> Option<&Band> {
        self.bands.get(self.selected)
    }

    fn move_band(&mut self, offset: isize) {
        if self.bands.is_empty() {
            return;
        }
        let last = self.bands.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    fn move_menu(&mut self, offset: isize) {
        let len = MenuItem::ALL.len() as isize;
        self.menu_selected = (self.menu_selected as isize + offset).rem_euclid(len) as usize;
    }
}

#[cfg(test)]
mod tests {
    use crate::input::{MembershipFields, NewBand, NewMember};

    use super::*;

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn open_menu_item(app: &mut App, item: MenuItem) {
        let idx = MenuItem::ALL.iter().position(|i| *i == item).unwrap();
        app.screen = Screen::Home;
        app.menu_selected = idx;
        app.handle_key(KeyCode::Enter).unwrap();
    }

    fn status_text(app: &App) -> Option<&str> {
        app.status.as_ref().map(|status| status.text.as_str())
    }

    #[test]
    fn adding_a_band_through_the_form() {
        let mut app = App::new(Store::open_in_memory().unwrap()).unwrap();
        open_menu_item(&mut app, MenuItem::AddBand);
        assert!(matches!(app.mode, Mode::AddingBand(_)));

        type_text(&mut app, "Television");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "1973");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), Some("Band 'Television' added."));
        assert_eq!(app.bands.len(), 1);
        assert_eq!(app.bands[0].formed_year, Some(1973));
    }

    #[test]
    fn band_added_from_the_list_is_selected_there() {
        let store = Store::open_in_memory().unwrap();
        store.create_band(&NewBand::new("Suicide")).unwrap();
        let mut app = App::new(store).unwrap();

        open_menu_item(&mut app, MenuItem::ViewBands);
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Television");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.screen, Screen::Bands));
        assert_eq!(app.bands.len(), 2);
        assert_eq!(app.current_band().unwrap().name, "Television");
    }

    #[test]
    fn empty_band_name_keeps_the_form_open() {
        let mut app = App::new(Store::open_in_memory().unwrap()).unwrap();
        open_menu_item(&mut app, MenuItem::AddBand);
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::AddingBand(form) => {
                assert_eq!(form.error.as_deref(), Some("Band name is required."))
            }
            _ => panic!("form should stay open"),
        }
        assert!(app.bands.is_empty());
    }

    #[test]
    fn album_form_without_band_shows_required_message() {
        let store = Store::open_in_memory().unwrap();
        store.create_band(&NewBand::new("Devo")).unwrap();
        let mut app = App::new(store).unwrap();

        open_menu_item(&mut app, MenuItem::AddAlbum);
        type_text(&mut app, "Freedom of Choice");
        app.handle_key(KeyCode::Enter).unwrap();

        assert_eq!(
            status_text(&app),
            Some(crate::input::ALBUM_REQUIRED_MESSAGE)
        );
        assert!(matches!(app.mode, Mode::AddingAlbum(_)));
    }

    #[test]
    fn album_form_needs_a_band_on_file() {
        let mut app = App::new(Store::open_in_memory().unwrap()).unwrap();
        open_menu_item(&mut app, MenuItem::AddAlbum);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), Some("Add a band before adding albums."));
    }

    #[test]
    fn removing_a_membership_from_band_view() {
        let store = Store::open_in_memory().unwrap();
        let band = store.create_band(&NewBand::new("Blondie")).unwrap();
        let member = store.create_member(&NewMember::new("Debbie Harry")).unwrap();
        store
            .create_membership(&MembershipFields::new(band.id, member.id).as_role("Vocals"))
            .unwrap();
        let mut app = App::new(store).unwrap();

        open_menu_item(&mut app, MenuItem::ViewBands);
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.screen, Screen::BandDetail(_)));

        app.handle_key(KeyCode::Char('d')).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmMembershipDelete(_)));
        app.handle_key(KeyCode::Char('y')).unwrap();

        assert_eq!(status_text(&app), Some("Removed Debbie Harry from Blondie."));
        match &app.screen {
            Screen::BandDetail(screen) => assert!(screen.detail.lineup.is_empty()),
            _ => panic!("band view should stay open"),
        }
    }

    #[test]
    fn editing_a_membership_from_band_view() {
        let store = Store::open_in_memory().unwrap();
        let band = store.create_band(&NewBand::new("Talking Heads")).unwrap();
        let member = store.create_member(&NewMember::new("Tina Weymouth")).unwrap();
        let membership = store
            .create_membership(&MembershipFields::new(band.id, member.id).years(Some(1975), None))
            .unwrap();
        let mut app = App::new(store).unwrap();

        open_menu_item(&mut app, MenuItem::ViewBands);
        app.handle_key(KeyCode::Enter).unwrap();
        app.handle_key(KeyCode::Char('e')).unwrap();
        assert!(matches!(app.mode, Mode::EditingMembership { .. }));

        type_text(&mut app, "Bass");
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Down).unwrap();
        type_text(&mut app, "1991");
        app.handle_key(KeyCode::Enter).unwrap();

        assert_eq!(status_text(&app), Some("Membership updated."));
        let stored = app.store.get_membership(membership.id).unwrap();
        assert_eq!(stored.role.as_deref(), Some("Bass"));
        assert_eq!(stored.end_year, Some(1991));
    }

    #[test]
    fn band_with_members_cannot_be_deleted_from_the_list() {
        let store = Store::open_in_memory().unwrap();
        let band = store.create_band(&NewBand::new("Wire")).unwrap();
        let member = store.create_member(&NewMember::new("Colin Newman")).unwrap();
        store
            .create_membership(&MembershipFields::new(band.id, member.id))
            .unwrap();
        let mut app = App::new(store).unwrap();

        open_menu_item(&mut app, MenuItem::ViewBands);
        app.handle_key(KeyCode::Char('-')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();

        assert_eq!(app.bands.len(), 1);
        assert!(status_text(&app).unwrap().contains("1 membership(s)"));
    }
}
