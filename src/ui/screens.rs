use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

use crate::analysis::{analyze_alternatives, AlternativesReport};
use crate::compare::Comparison;
use crate::dataset::Dataset;
use crate::db::{is_saved, load_saved_ids, load_settings, Setting, Settings};
use crate::models::Medicine;

/// Bottom-bar tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Search,
    Compare,
    Saved,
    Settings,
}

impl Tab {
    pub(crate) const ALL: [Tab; 4] = [Tab::Search, Tab::Compare, Tab::Saved, Tab::Settings];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Tab::Search => "Search",
            Tab::Compare => "Compare",
            Tab::Saved => "Saved",
            Tab::Settings => "Settings",
        }
    }

    pub(crate) fn position(self) -> usize {
        Tab::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    pub(crate) fn cycle(self, offset: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        let next = (self.position() as isize + offset).rem_euclid(len);
        Tab::ALL[next as usize]
    }
}

/// Clamp-at-the-edges cursor shared by every list on screen.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Cursor {
    pub(crate) selected: usize,
}

impl Cursor {
    pub(crate) fn move_by(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = len as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, max) as usize;
    }

    pub(crate) fn first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub(crate) fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

/// Search tab: the text typed so far, the committed term, and its results.
#[derive(Default)]
pub(crate) struct SearchScreen {
    pub(crate) input: String,
    pub(crate) term: String,
    pub(crate) results: Vec<Medicine>,
    pub(crate) cursor: Cursor,
}

impl SearchScreen {
    pub(crate) fn set_results(&mut self, term: String, results: Vec<Medicine>) {
        self.term = term;
        self.results = results;
        self.cursor.first();
    }

    pub(crate) fn current(&self) -> Option<&Medicine> {
        self.results.get(self.cursor.selected)
    }
}

/// Detail view for one medicine plus its alternatives report.
pub(crate) struct DetailsScreen {
    pub(crate) medicine: Medicine,
    pub(crate) report: AlternativesReport,
    pub(crate) is_saved: bool,
    pub(crate) scroll: u16,
    /// Tab the view was opened from; it is only shown there.
    pub(crate) origin: Tab,
}

impl DetailsScreen {
    pub(crate) fn open(conn: &Connection, dataset: &Dataset, medicine: Medicine, origin: Tab) -> Self {
        let report = analyze_alternatives(&medicine, dataset.medicines());
        let is_saved = is_saved(conn, &medicine.id).unwrap_or_else(|err| {
            warn!(id = %medicine.id, error = %err, "could not read saved state");
            false
        });
        Self {
            medicine,
            report,
            is_saved,
            scroll: 0,
            origin,
        }
    }

    /// Scroll within `line_count` lines, keeping the last line on screen.
    pub(crate) fn scroll_by(&mut self, offset: i32, line_count: usize) {
        let max = line_count.saturating_sub(1).min(u16::MAX as usize) as i32;
        self.scroll = (self.scroll as i32 + offset).clamp(0, max) as u16;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Side::Left => "Drug A",
            Side::Right => "Drug B",
        }
    }
}

/// One half of the compare tab.
#[derive(Default)]
pub(crate) struct ComparePane {
    pub(crate) query: String,
    pub(crate) candidates: Vec<Medicine>,
    pub(crate) cursor: Cursor,
    pub(crate) picked: Option<Medicine>,
}

impl ComparePane {
    /// A new query invalidates the previous pick.
    pub(crate) fn set_query(&mut self, query: String, candidates: Vec<Medicine>) {
        self.query = query;
        self.candidates = candidates;
        self.cursor.first();
        self.picked = None;
    }

    pub(crate) fn pick_current(&mut self) -> Option<&Medicine> {
        let candidate = self.candidates.get(self.cursor.selected).cloned()?;
        self.picked = Some(candidate);
        self.picked.as_ref()
    }
}

#[derive(Default)]
pub(crate) struct CompareScreen {
    pub(crate) left: ComparePane,
    pub(crate) right: ComparePane,
    pub(crate) active: Side,
}

impl CompareScreen {
    pub(crate) fn pane(&self, side: Side) -> &ComparePane {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub(crate) fn pane_mut(&mut self, side: Side) -> &mut ComparePane {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub(crate) fn comparison(&self) -> Option<Comparison> {
        match (&self.left.picked, &self.right.picked) {
            (Some(left), Some(right)) => Some(Comparison::new(left.clone(), right.clone())),
            _ => None,
        }
    }
}

/// Saved tab, re-read from the store whenever the tab gains focus.
#[derive(Default)]
pub(crate) struct SavedScreen {
    pub(crate) items: Vec<Medicine>,
    pub(crate) cursor: Cursor,
}

impl SavedScreen {
    pub(crate) fn reload(&mut self, conn: &Connection, dataset: &Dataset) -> Result<()> {
        let ids = load_saved_ids(conn)?;
        self.items = dataset.resolve_ids(&ids);
        self.cursor.clamp(self.items.len());
        Ok(())
    }

    pub(crate) fn current(&self) -> Option<&Medicine> {
        self.items.get(self.cursor.selected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingsRow {
    Toggle(Setting),
    Help,
    About,
}

impl SettingsRow {
    pub(crate) const ALL: [SettingsRow; 4] = [
        SettingsRow::Toggle(Setting::Notifications),
        SettingsRow::Toggle(Setting::PriceAlerts),
        SettingsRow::Help,
        SettingsRow::About,
    ];
}

pub(crate) struct SettingsScreen {
    pub(crate) settings: Settings,
    pub(crate) cursor: Cursor,
}

impl SettingsScreen {
    pub(crate) fn load(conn: &Connection) -> Self {
        Self {
            settings: load_settings(conn),
            cursor: Cursor::default(),
        }
    }

    pub(crate) fn current(&self) -> SettingsRow {
        SettingsRow::ALL[self.cursor.selected.min(SettingsRow::ALL.len() - 1)]
    }
}
