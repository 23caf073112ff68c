use crate::models::{BandDetail, LineupEntry};

/// Entries of the start menu, in display order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum MenuItem {
    ViewBands,
    AddBand,
    AddMember,
    AddAlbum,
    AddMembership,
    Quit,
}

impl MenuItem {
    pub(crate) const ALL: [MenuItem; 6] = [
        MenuItem::ViewBands,
        MenuItem::AddBand,
        MenuItem::AddMember,
        MenuItem::AddAlbum,
        MenuItem::AddMembership,
        MenuItem::Quit,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuItem::ViewBands => "View bands",
            MenuItem::AddBand => "Add a band",
            MenuItem::AddMember => "Add a member",
            MenuItem::AddAlbum => "Add an album",
            MenuItem::AddMembership => "Assign a member to a band",
            MenuItem::Quit => "Quit",
        }
    }
}

/// A single band drilled into from the band list.
pub(crate) struct BandDetailScreen {
    pub(crate) detail: BandDetail,
    pub(crate) selected: usize,
}

impl BandDetailScreen {
    pub(crate) fn new(detail: BandDetail) -> Self {
        Self {
            detail,
            selected: 0,
        }
    }

    pub(crate) fn band_id(&self) -> i64 {
        self.detail.band.id
    }

    /// Swap in freshly loaded data, keeping the cursor on `focus` when it is
    /// still part of the lineup.
    pub(crate) fn replace(&mut self, detail: BandDetail, focus: Option<i64>) {
        self.detail = detail;
        if let Some(id) = focus {
            if let Some(idx) = self
                .detail
                .lineup
                .iter()
                .position(|entry| entry.membership.id == id)
            {
                self.selected = idx;
                return;
            }
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn current_entry(&self) -> Option<&LineupEntry> {
        self.detail.lineup.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.detail.lineup.is_empty() {
            return;
        }
        let last = self.detail.lineup.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.detail.lineup.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.detail.lineup.len() {
            self.selected = self.detail.lineup.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Band, Membership};

    use super::*;

    fn entry(id: i64, name: &str) -> LineupEntry {
        LineupEntry {
            membership: Membership {
                id,
                band_id: 1,
                member_id: id,
                start_year: None,
                end_year: None,
                role: None,
            },
            member_name: name.to_string(),
        }
    }

    fn detail(lineup: Vec<LineupEntry>) -> BandDetail {
        BandDetail {
            band: Band {
                id: 1,
                name: "Fleetwood Mac".into(),
                formed_year: Some(1967),
                home_location: Some("London".into()),
            },
            lineup,
            albums: Vec::new(),
            contributed_albums: Vec::new(),
        }
    }

    #[test]
    fn selection_is_clamped_to_lineup() {
        let mut screen = BandDetailScreen::new(detail(vec![entry(1, "Mick"), entry(2, "John")]));
        screen.move_selection(5);
        assert_eq!(screen.current_entry().unwrap().member_name, "John");
        screen.move_selection(-9);
        assert_eq!(screen.current_entry().unwrap().member_name, "Mick");
    }

    #[test]
    fn replace_follows_focus_or_clamps() {
        let mut screen = BandDetailScreen::new(detail(vec![entry(1, "Mick"), entry(2, "John")]));
        screen.replace(detail(vec![entry(3, "Stevie"), entry(2, "John")]), Some(2));
        assert_eq!(screen.selected, 1);

        screen.replace(detail(vec![entry(3, "Stevie")]), None);
        assert_eq!(screen.selected, 0);

        screen.replace(detail(Vec::new()), Some(3));
        assert!(screen.current_entry().is_none());
    }
}
