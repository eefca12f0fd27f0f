//! Quick-select menu state machine
//!
//! `Closed -> Open -> Committing -> Closed`. While open, navigation moves a
//! selection index that wraps at the entry count. Committing hands back the
//! selected entry exactly once.

use crate::action::{Action, QuickSelectMode};
use crate::input::vector_angle;
use crate::profile::{InputRef, MAX_QUICK_SELECT_ENTRIES};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuPhase {
    #[default]
    Closed,
    Open,
    Committing,
}

#[derive(Debug, Clone, Default)]
pub struct QuickSelect {
    phase: MenuPhase,
    mode: Option<QuickSelectMode>,
    opener: Option<InputRef>,
    entries: Vec<Action>,
    selected: Option<usize>,
}

impl QuickSelect {
    pub fn phase(&self) -> MenuPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == MenuPhase::Open
    }

    pub fn mode(&self) -> Option<QuickSelectMode> {
        self.mode
    }

    /// Input that opened the menu
    pub fn opener(&self) -> Option<&InputRef> {
        self.opener.as_ref()
    }

    pub fn entries(&self) -> &[Action] {
        &self.entries
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Open with the entries of the current context; an empty list keeps
    /// the menu closed
    pub fn open(&mut self, mode: QuickSelectMode, opener: InputRef, entries: &[Action]) -> bool {
        if entries.is_empty() {
            debug!("Quick select has no entries in this context");
            return false;
        }
        self.phase = MenuPhase::Open;
        self.mode = Some(mode);
        self.opener = Some(opener);
        self.entries = entries[..entries.len().min(MAX_QUICK_SELECT_ENTRIES)].to_vec();
        self.selected = None;
        debug!("Quick select open ({:?}, {} entries)", mode, self.entries.len());
        true
    }

    pub fn next(&mut self) {
        if !self.is_open() {
            return;
        }
        let count = self.entries.len();
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) => (i + 1) % count,
        });
    }

    pub fn previous(&mut self) {
        if !self.is_open() {
            return;
        }
        let count = self.entries.len();
        self.selected = Some(match self.selected {
            None => count - 1,
            Some(i) => (i + count - 1) % count,
        });
    }

    /// Radial selection: entry 0 at the top, clockwise
    pub fn point(&mut self, x: f32, y: f32) {
        if !self.is_open() {
            return;
        }
        let count = self.entries.len();
        let clockwise_from_up = (90.0 - vector_angle(x, y)).rem_euclid(360.0);
        let sector = 360.0 / count as f32;
        let index = ((clockwise_from_up / sector).round() as usize) % count;
        self.selected = Some(index);
    }

    /// Move to committing and hand back the selected entry, then close
    pub fn commit(&mut self) -> Option<Action> {
        if !self.is_open() {
            return None;
        }
        self.phase = MenuPhase::Committing;
        let action = self.selected.and_then(|i| self.entries.get(i).cloned());
        debug!(
            "Quick select commit: {}",
            action.as_ref().map(|a| a.label()).unwrap_or_else(|| "nothing".to_string())
        );
        self.close();
        action
    }

    /// Close without dispatching anything
    pub fn close(&mut self) {
        *self = Self::default();
    }
}
