//! Load session accounting
//!
//! One [`LoadSession`] covers a single programmatic multi-panel load. Each
//! panel can contribute at most one completion per session, so duplicate
//! or out-of-order callbacks never settle a session early.

use std::fmt;

/// Identifier of a programmatic load; bumped on every new load or rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Per-panel progress within one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing asked of this panel in the session
    #[default]
    Idle,
    /// Load issued, no page callback yet
    Requested,
    /// Page started after the load was issued
    Started,
    /// Completion counted
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct LoadSession {
    generation: Generation,
    pages_to_load: usize,
    pages_loaded: usize,
    programmatic: bool,
    slots: Vec<SlotState>,
}

impl LoadSession {
    /// Fresh session for `panels` panels, in the programmatic phase
    pub fn start(generation: Generation, panels: usize) -> Self {
        Self {
            generation,
            pages_to_load: 0,
            pages_loaded: 0,
            programmatic: true,
            slots: vec![SlotState::Idle; panels],
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn pages_to_load(&self) -> usize {
        self.pages_to_load
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn is_programmatic(&self) -> bool {
        self.programmatic
    }

    pub fn slot(&self, panel: usize) -> Option<SlotState> {
        self.slots.get(panel).copied()
    }

    /// A real page load was issued to `panel`
    pub fn expect_page(&mut self, panel: usize) {
        if let Some(slot) = self.slots.get_mut(panel) {
            *slot = SlotState::Requested;
            self.pages_to_load += 1;
        }
    }

    /// Static content was rendered into `panel`: expected and complete at once
    pub fn expect_immediate(&mut self, panel: usize) {
        if let Some(slot) = self.slots.get_mut(panel) {
            *slot = SlotState::Done;
            self.pages_to_load += 1;
            self.pages_loaded += 1;
        }
    }

    pub fn mark_started(&mut self, panel: usize) {
        if let Some(slot) = self.slots.get_mut(panel) {
            if *slot == SlotState::Requested {
                *slot = SlotState::Started;
            }
        }
    }

    /// Count a completion from `panel`, with or without a prior page start.
    /// Returns false when the signal is a duplicate or the panel was not
    /// asked to load anything.
    pub fn complete(&mut self, panel: usize) -> bool {
        match self.slots.get_mut(panel) {
            Some(slot) if matches!(*slot, SlotState::Requested | SlotState::Started) => {
                *slot = SlotState::Done;
                self.pages_loaded += 1;
                true
            }
            _ => false,
        }
    }

    pub fn all_loaded(&self) -> bool {
        self.pages_loaded >= self.pages_to_load
    }

    /// Leave the programmatic phase
    pub fn settle(&mut self) {
        self.programmatic = false;
    }
}
