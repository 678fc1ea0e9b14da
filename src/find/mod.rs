//! Cross-panel find-in-page
//!
//! Each panel highlights matches on its own through the injected find
//! script and reports `(match_count, active_index)` back. The coordinator
//! keeps one [`MatchRecord`] per panel and turns them into a single global
//! position, moving the active match across panel boundaries on
//! next/previous.
//!
//! The coordinator never touches surfaces; it returns [`ScriptCommand`]s
//! for the caller to evaluate.

use tracing::debug;

/// In-page find script injected into every panel after each page load
pub const FIND_SCRIPT: &str = include_str!("../../assets/find.js");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchRecord {
    pub match_count: usize,
    pub active_index: usize,
}

/// A script to evaluate in one panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    pub panel: usize,
    pub script: String,
}

impl ScriptCommand {
    fn new(panel: usize, script: impl Into<String>) -> Self {
        Self {
            panel,
            script: script.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn as_js(self) -> &'static str {
        match self {
            Direction::Forward => "true",
            Direction::Backward => "false",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindCoordinator {
    text: String,
    records: Vec<MatchRecord>,
    active_panel: usize,
}

impl FindCoordinator {
    pub fn new(panels: usize) -> Self {
        Self {
            text: String::new(),
            records: vec![MatchRecord::default(); panels],
            active_panel: 0,
        }
    }

    /// Drop the session and size it for a new panel set
    pub fn reset(&mut self, panels: usize) {
        *self = Self::new(panels);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn active_panel(&self) -> usize {
        self.active_panel
    }

    /// New search text: every panel re-highlights, records start from zero.
    ///
    /// Empty text clears every panel's highlighting.
    pub fn set_text(&mut self, text: &str) -> Vec<ScriptCommand> {
        self.text = text.to_string();
        self.active_panel = 0;
        self.records.iter_mut().for_each(|r| *r = MatchRecord::default());

        let script = format!("highlightAll('{}')", escape_js_string(text));
        (0..self.records.len())
            .map(|panel| ScriptCommand::new(panel, script.clone()))
            .collect()
    }

    pub fn clear(&mut self) -> Vec<ScriptCommand> {
        self.set_text("")
    }

    /// Result reported by panel `panel`'s find script
    pub fn on_result(&mut self, panel: usize, match_count: usize, active_index: usize) {
        let Some(record) = self.records.get_mut(panel) else {
            return;
        };
        *record = MatchRecord {
            match_count,
            active_index: active_index.min(match_count.saturating_sub(1)),
        };

        // an empty active panel yields to the first panel that has matches
        if self.records[self.active_panel].match_count == 0 {
            if let Some(first) = self.records.iter().position(|r| r.match_count > 0) {
                self.active_panel = first;
            }
        }
        debug!(panel, match_count, active_index, display = %self.display(), "Find result");
    }

    pub fn total(&self) -> usize {
        self.records.iter().map(|r| r.match_count).sum()
    }

    /// 1-based position of the active match across all panels, 0 when none
    pub fn global_ordinal(&self) -> usize {
        if self.total() == 0 {
            return 0;
        }
        let before: usize = self.records[..self.active_panel]
            .iter()
            .map(|r| r.match_count)
            .sum();
        before + self.records[self.active_panel].active_index + 1
    }

    /// `"{ordinal}/{total}"`, `"0/0"` without matches
    pub fn display(&self) -> String {
        format!("{}/{}", self.global_ordinal(), self.total())
    }

    pub fn next(&mut self) -> Option<ScriptCommand> {
        self.advance(Direction::Forward)
    }

    pub fn previous(&mut self) -> Option<ScriptCommand> {
        self.advance(Direction::Backward)
    }

    fn advance(&mut self, direction: Direction) -> Option<ScriptCommand> {
        let panels = self.records.len();
        if panels == 0 {
            return None;
        }
        let current = self.records[self.active_panel];

        let within = match direction {
            Direction::Forward => current.active_index + 1 < current.match_count,
            Direction::Backward => current.active_index > 0 && current.match_count > 0,
        };
        if within {
            let record = &mut self.records[self.active_panel];
            match direction {
                Direction::Forward => record.active_index += 1,
                Direction::Backward => record.active_index -= 1,
            }
            return Some(self.step(direction));
        }

        // circular scan starting from the neighbour
        for offset in 1..panels {
            let candidate = match direction {
                Direction::Forward => (self.active_panel + offset) % panels,
                Direction::Backward => (self.active_panel + panels - offset) % panels,
            };
            let record = &mut self.records[candidate];
            if record.match_count > 0 {
                record.active_index = match direction {
                    Direction::Forward => 0,
                    Direction::Backward => record.match_count - 1,
                };
                self.active_panel = candidate;
                return Some(ScriptCommand::new(
                    candidate,
                    format!("highlightNext({}, true)", direction.as_js()),
                ));
            }
        }

        // wrap inside the only panel with matches
        if current.match_count > 0 {
            let record = &mut self.records[self.active_panel];
            record.active_index = match direction {
                Direction::Forward => 0,
                Direction::Backward => record.match_count - 1,
            };
            return Some(self.step(direction));
        }
        None
    }

    fn step(&self, direction: Direction) -> ScriptCommand {
        ScriptCommand::new(
            self.active_panel,
            format!("highlightNext({})", direction.as_js()),
        )
    }
}

/// Escape text for a single-quoted JavaScript string literal
pub fn escape_js_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }
    escaped
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn global_ordinal_counts_matches_before_active(
            counts in proptest::collection::vec(0usize..20, 1..6),
            pick in any::<prop::sample::Index>(),
            offset in any::<prop::sample::Index>(),
        ) {
            let mut find = FindCoordinator::new(counts.len());
            find.set_text("x");
            for (panel, &count) in counts.iter().enumerate() {
                find.on_result(panel, count, 0);
            }
            let active = pick.index(counts.len());
            find.active_panel = active;
            if counts[active] > 0 {
                find.on_result(active, counts[active], offset.index(counts[active]));
            }

            let total: usize = counts.iter().sum();
            prop_assert_eq!(find.total(), total);
            if total == 0 {
                prop_assert_eq!(find.display(), "0/0");
            } else if counts[active] > 0 {
                let expected = counts[..active].iter().sum::<usize>() + offset.index(counts[active]) + 1;
                prop_assert_eq!(find.global_ordinal(), expected);
                prop_assert!(find.global_ordinal() <= total);
            }
        }

        #[test]
        fn next_visits_every_match_once_per_cycle(
            counts in proptest::collection::vec(0usize..5, 1..5),
        ) {
            let mut find = FindCoordinator::new(counts.len());
            find.set_text("x");
            for (panel, &count) in counts.iter().enumerate() {
                find.on_result(panel, count, 0);
            }
            let total: usize = counts.iter().sum();
            prop_assume!(total > 0);

            let mut seen = Vec::new();
            for _ in 0..total {
                seen.push(find.global_ordinal());
                find.next();
            }
            seen.sort_unstable();
            prop_assert_eq!(seen, (1..=total).collect::<Vec<_>>());
            prop_assert_eq!(find.global_ordinal(), 1);
        }
    }
}
