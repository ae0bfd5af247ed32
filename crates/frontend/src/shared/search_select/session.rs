//! Headless state machine behind one selector.
//!
//! The component feeds DOM events in and performs the side effects the
//! session asks for (arm a timer, send a query). Keeping the decisions here
//! makes debounce and stale-response handling testable without a browser.

use contracts::shared::lookup::{LookupItem, SuggestionQuery};

use super::model::{FieldValue, SelectedItem, SelectionState, SelectorConfig};
use crate::shared::config::ConfigError;
use crate::shared::sequence::{Sequence, Ticket};

/// What the component must do after a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Query became empty: suggestions were cleared, nothing to fetch.
    Cleared,
    /// Arm the debounce timer; pass the ticket back to [`SearchSession::on_quiet`].
    Scheduled(Ticket),
    /// The selector is inert (invalid configuration).
    Ignored,
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    config: SelectorConfig,
    config_error: Option<ConfigError>,
    selection: SelectionState,
    text: String,
    suggestions: Vec<LookupItem>,
    open: bool,
    loading: bool,
    debounce: Sequence,
    requests: Sequence,
}

impl SearchSession {
    pub fn new(config: SelectorConfig) -> Self {
        let config_error = config.validate().err();
        let mut selection = SelectionState::new(config.mode);
        selection.set_multi(config.initial_values.iter().cloned());
        Self {
            config,
            config_error,
            selection,
            text: String::new(),
            suggestions: Vec::new(),
            open: false,
            loading: false,
            debounce: Sequence::new(),
            requests: Sequence::new(),
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn config_error(&self) -> Option<&ConfigError> {
        self.config_error.as_ref()
    }

    pub fn is_inert(&self) -> bool {
        self.config_error.is_some()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn suggestions(&self) -> &[LookupItem] {
        &self.suggestions
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Dropdown shown, a request in flight, or a debounce timer armed.
    pub fn is_active(&self) -> bool {
        self.open || self.loading || self.debounce.current().is_some()
    }

    /// Records the new input text.
    ///
    /// A blank query closes the dropdown immediately and makes any pending
    /// timer or in-flight request stale.
    pub fn on_input(&mut self, text: String) -> InputOutcome {
        if self.is_inert() {
            return InputOutcome::Ignored;
        }
        self.text = text;
        if self.text.trim().is_empty() {
            self.reset_dropdown();
            return InputOutcome::Cleared;
        }
        InputOutcome::Scheduled(self.debounce.issue())
    }

    /// Debounce timer fired. Returns the query to send only when no newer
    /// keystroke re-armed the timer meanwhile.
    pub fn on_quiet(&mut self, ticket: Ticket) -> Option<(Ticket, SuggestionQuery)> {
        if !self.debounce.is_current(ticket) || self.text.trim().is_empty() {
            return None;
        }
        self.debounce.invalidate();
        self.loading = true;
        let query = SuggestionQuery::first_page(&self.text, self.config.limit);
        Some((self.requests.issue(), query))
    }

    /// Applies a suggestion response. Stale responses are ignored and
    /// reported as `false`.
    ///
    /// Failures degrade to an empty, closed list.
    pub fn on_suggestions(&mut self, ticket: Ticket, result: Result<Vec<LookupItem>, String>) -> bool {
        if !self.requests.is_current(ticket) {
            return false;
        }
        self.loading = false;
        match result {
            Ok(mut items) => {
                items.truncate(self.config.limit as usize);
                self.open = !items.is_empty();
                self.suggestions = items;
            }
            Err(_) => {
                self.suggestions.clear();
                self.open = false;
            }
        }
        true
    }

    /// Picks the suggestion at `index`, then clears the input and dropdown.
    pub fn pick_suggestion(&mut self, index: usize) -> bool {
        let Some(item) = self.suggestions.get(index).cloned() else {
            return false;
        };
        let changed = self.selection.pick(item.into());
        self.text.clear();
        self.reset_dropdown();
        changed
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.selection.remove(id)
    }

    /// Outside click or Escape. Pending work is dropped so a late response
    /// cannot reopen the dropdown.
    pub fn close_dropdown(&mut self) {
        self.reset_dropdown();
    }

    pub fn set_single(&mut self, item: SelectedItem) {
        self.selection.set_single(item);
    }

    pub fn set_multi(&mut self, items: impl IntoIterator<Item = SelectedItem>) {
        self.selection.set_multi(items);
    }

    pub fn clear(&mut self) {
        self.selection.clear();
    }

    /// Replaces the selection with values known only by id.
    pub fn prefill_bare(&mut self, ids: impl IntoIterator<Item = String>) {
        let items: Vec<SelectedItem> = ids.into_iter().map(|id| self.config.bare_item(id)).collect();
        self.selection.clear();
        match self.config.mode {
            super::model::SelectorMode::Single => {
                if let Some(first) = items.into_iter().find(|i| !i.id.is_empty()) {
                    self.selection.set_single(first);
                }
            }
            super::model::SelectorMode::Multi => self.selection.set_multi(items),
        }
    }

    pub fn export(&self) -> Vec<FieldValue> {
        if self.is_inert() {
            return Vec::new();
        }
        self.selection.export(&self.config.field_name)
    }

    fn reset_dropdown(&mut self) {
        self.debounce.invalidate();
        self.requests.invalidate();
        self.suggestions.clear();
        self.open = false;
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::search_select::model::SelectorMode;

    fn session(mode: SelectorMode) -> SearchSession {
        SearchSession::new(SelectorConfig::new(mode, "/api/search/authors", "author_ids"))
    }

    fn scheduled(outcome: InputOutcome) -> Ticket {
        match outcome {
            InputOutcome::Scheduled(t) => t,
            other => panic!("expected a scheduled fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_keystrokes_in_one_window_issue_one_query_with_final_text() {
        let mut s = session(SelectorMode::Multi);
        let timers: Vec<Ticket> = ["s", "sm", "smi", "smit", "smith"]
            .iter()
            .map(|t| scheduled(s.on_input(t.to_string())))
            .collect();

        // every timer fires after the window; only the last one may fetch
        let queries: Vec<_> = timers.into_iter().filter_map(|t| s.on_quiet(t)).collect();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].1, SuggestionQuery { q: "smith".into(), limit: 20, page: 1 });
    }

    #[test]
    fn test_empty_query_clears_without_fetch() {
        let mut s = session(SelectorMode::Multi);
        let t = scheduled(s.on_input("smi".into()));
        let (req, _) = s.on_quiet(t).unwrap();
        s.on_suggestions(req, Ok(vec![LookupItem::new("7", "J. Smith")]));
        assert!(s.is_open());

        assert_eq!(s.on_input("   ".into()), InputOutcome::Cleared);
        assert!(!s.is_open());
        assert!(s.suggestions().is_empty());
    }

    #[test]
    fn test_timer_armed_before_clear_does_not_fetch() {
        let mut s = session(SelectorMode::Multi);
        let t = scheduled(s.on_input("smi".into()));
        s.on_input(String::new());
        assert_eq!(s.on_quiet(t), None);
    }

    #[test]
    fn test_stale_response_arriving_late_is_discarded() {
        let mut s = session(SelectorMode::Multi);
        let t1 = scheduled(s.on_input("sm".into()));
        let (q1, _) = s.on_quiet(t1).unwrap();
        let t2 = scheduled(s.on_input("smith".into()));
        let (q2, _) = s.on_quiet(t2).unwrap();

        assert!(s.on_suggestions(q2, Ok(vec![LookupItem::new("7", "J. Smith")])));
        assert!(!s.on_suggestions(q1, Ok(vec![LookupItem::new("1", "A. Smetana")])));

        assert_eq!(s.suggestions(), &[LookupItem::new("7", "J. Smith")]);
    }

    #[test]
    fn test_failed_fetch_degrades_to_empty_list() {
        let mut s = session(SelectorMode::Single);
        let t = scheduled(s.on_input("x".into()));
        let (req, _) = s.on_quiet(t).unwrap();
        assert!(s.on_suggestions(req, Err("HTTP error: 500".into())));
        assert!(s.suggestions().is_empty());
        assert!(!s.is_open());
        assert!(!s.is_loading());

        // still usable afterwards
        assert!(matches!(s.on_input("xy".into()), InputOutcome::Scheduled(_)));
    }

    #[test]
    fn test_results_are_capped_at_limit() {
        let mut s = SearchSession::new(
            SelectorConfig::new(SelectorMode::Multi, "/api/search", "ids").limit(8),
        );
        let t = scheduled(s.on_input("a".into()));
        let (req, query) = s.on_quiet(t).unwrap();
        assert_eq!(query.limit, 8);
        let many = (0..30).map(|i| LookupItem::new(i.to_string(), format!("item {i}"))).collect();
        s.on_suggestions(req, Ok(many));
        assert_eq!(s.suggestions().len(), 8);
    }

    #[test]
    fn test_smith_end_to_end_in_multi_mode() {
        let mut s = session(SelectorMode::Multi);
        let t = scheduled(s.on_input("smith".into()));
        let (req, query) = s.on_quiet(t).unwrap();
        assert_eq!(query, SuggestionQuery { q: "smith".into(), limit: 20, page: 1 });

        let body = r#"{"results":[{"id":"7","text":"J. Smith"}]}"#;
        let items = serde_json::from_str::<contracts::shared::lookup::SuggestionResponse>(body)
            .unwrap()
            .into_items();
        s.on_suggestions(req, Ok(items));

        assert!(s.pick_suggestion(0));
        assert_eq!(s.selection().items(), &[SelectedItem::new("7", "J. Smith")]);
        assert_eq!(s.export(), vec![FieldValue { name: "author_ids".into(), value: "7".into() }]);
        assert_eq!(s.text(), "");
        assert!(!s.is_open());

        assert!(s.remove("7"));
        assert!(s.selection().is_empty());
        assert!(s.export().is_empty());
    }

    #[test]
    fn test_single_mode_pick_a_then_b() {
        let mut s = session(SelectorMode::Single);
        for (id, label) in [("1", "A"), ("2", "B")] {
            let t = scheduled(s.on_input(label.into()));
            let (req, _) = s.on_quiet(t).unwrap();
            s.on_suggestions(req, Ok(vec![LookupItem::new(id, label)]));
            s.pick_suggestion(0);
            assert_eq!(s.selection().len(), 1);
        }
        assert_eq!(s.selection().items(), &[SelectedItem::new("2", "B")]);
    }

    #[test]
    fn test_response_after_pick_does_not_reopen() {
        let mut s = session(SelectorMode::Multi);
        let t = scheduled(s.on_input("sm".into()));
        let (q1, _) = s.on_quiet(t).unwrap();
        s.on_suggestions(q1, Ok(vec![LookupItem::new("7", "J. Smith")]));
        let t = scheduled(s.on_input("smi".into()));
        let (q2, _) = s.on_quiet(t).unwrap();
        s.pick_suggestion(0);

        assert!(!s.on_suggestions(q2, Ok(vec![LookupItem::new("8", "P. Smith")])));
        assert!(!s.is_open());
    }

    #[test]
    fn test_close_dropdown_drops_pending_work() {
        let mut s = session(SelectorMode::Multi);
        assert!(!s.is_active());
        let t = scheduled(s.on_input("sm".into()));
        assert!(s.is_active());
        s.close_dropdown();
        assert!(!s.is_active());
        assert_eq!(s.on_quiet(t), None);
    }

    #[test]
    fn test_initial_values_and_prefill() {
        let config = SelectorConfig::new(SelectorMode::Multi, "/api/search/sj", "sj_ids")
            .initial_values(vec![SelectedItem::new("3", "SU 3"), SelectedItem::new("3", "dup")]);
        let mut s = SearchSession::new(config);
        assert_eq!(s.selection().ids(), vec!["3"]);

        s.prefill_bare(vec!["10".to_string(), "11".to_string()]);
        assert_eq!(s.selection().ids(), vec!["10", "11"]);
        assert_eq!(s.selection().items()[0].label, "10");

        let mut single = session(SelectorMode::Single);
        single.prefill_bare(vec!["".to_string(), "5".to_string(), "6".to_string()]);
        assert_eq!(single.selection().ids(), vec!["5"]);
    }

    #[test]
    fn test_prefill_labels_use_the_configured_prefix() {
        let config = SelectorConfig::new(SelectorMode::Multi, "/drawings/api/search/sections", "ref_section")
            .label_prefix("Section");
        let mut s = SearchSession::new(config);
        s.prefill_bare(vec!["4".to_string(), " 9 ".to_string()]);

        let labels: Vec<_> = s.selection().items().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Section 4", "Section 9"]);
        assert_eq!(s.selection().ids(), vec!["4", "9"]);
        assert_eq!(s.export()[1].value, "9");
    }

    #[test]
    fn test_inert_session_ignores_input_and_exports_nothing() {
        let mut s = SearchSession::new(SelectorConfig::new(SelectorMode::Multi, "", "ids"));
        assert!(s.is_inert());
        assert_eq!(s.on_input("abc".into()), InputOutcome::Ignored);
        s.set_single(SelectedItem::new("1", "x"));
        assert!(s.export().is_empty());
    }
}
