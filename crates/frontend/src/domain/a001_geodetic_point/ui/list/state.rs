use contracts::domain::a001_geodetic_point::{GeoPointRow, ListQuery};
use leptos::prelude::*;

use crate::shared::notice::Notice;
use crate::shared::sequence::{Sequence, Ticket};

/// What the page must do after a create/update/delete settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterMutation {
    /// Re-query the table and refresh the map.
    ReloadAll,
    /// Keep both views; the error is shown next to the control.
    ShowError,
}

#[derive(Clone, Debug)]
pub struct PointsTableState {
    pub filters: ListQuery,
    pub rows: Vec<GeoPointRow>,
    pub is_loaded: bool,
    pub loading: bool,
    /// Failed list fetch.
    pub error: Option<String>,
    /// Failed delete, shown in the row of that point.
    pub row_error: Option<(i64, String)>,
    requests: Sequence,
}

impl Default for PointsTableState {
    fn default() -> Self {
        Self {
            filters: ListQuery::default(),
            rows: Vec::new(),
            is_loaded: false,
            loading: false,
            error: None,
            row_error: None,
            requests: Sequence::new(),
        }
    }
}

impl PointsTableState {
    /// Starts a list query with the current filters.
    pub fn begin_load(&mut self) -> (Ticket, ListQuery) {
        self.loading = true;
        self.error = None;
        (self.requests.issue(), self.filters.clone())
    }

    /// Applies a list response unless a newer query was issued meanwhile.
    pub fn on_loaded(&mut self, ticket: Ticket, result: Result<Vec<GeoPointRow>, String>) -> bool {
        if !self.requests.is_current(ticket) {
            return false;
        }
        self.requests.invalidate();
        self.loading = false;
        match result {
            Ok(rows) => {
                self.rows = rows;
                self.is_loaded = true;
            }
            Err(e) => self.error = Some(e),
        }
        true
    }

    /// Retryable notice for a failed list fetch.
    pub fn load_notice(&self) -> Option<Notice> {
        self.error
            .as_ref()
            .map(|e| Notice::retryable(format!("Could not load points: {}", e)))
    }

    pub fn row(&self, id_pts: i64) -> Option<&GeoPointRow> {
        self.rows.iter().find(|r| r.id_pts == id_pts)
    }

    pub fn row_error_for(&self, id_pts: i64) -> Option<&str> {
        match &self.row_error {
            Some((id, msg)) if *id == id_pts => Some(msg.as_str()),
            _ => None,
        }
    }

    /// Records the outcome of a delete of `id_pts`.
    ///
    /// Rows are never touched here; on success they are replaced by the
    /// reload that follows.
    pub fn on_mutation_result(&mut self, id_pts: i64, result: Result<(), String>) -> AfterMutation {
        match result {
            Ok(()) => {
                self.row_error = None;
                AfterMutation::ReloadAll
            }
            Err(e) => {
                self.row_error = Some((id_pts, e));
                AfterMutation::ShowError
            }
        }
    }
}

pub fn delete_prompt(id_pts: i64) -> String {
    format!("Delete point ID {}?", id_pts)
}

pub fn create_state() -> RwSignal<PointsTableState> {
    RwSignal::new(PointsTableState::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64) -> GeoPointRow {
        GeoPointRow {
            id_pts: id,
            x: 1.0,
            y: 2.0,
            h: 3.0,
            code: Some("SU".into()),
            notes: None,
        }
    }

    #[test]
    fn test_latest_list_query_wins() {
        let mut s = PointsTableState::default();
        let (first, _) = s.begin_load();
        s.filters.q = "wall".into();
        let (second, query) = s.begin_load();
        assert_eq!(query.q, "wall");
        assert_eq!(query.limit, 1000);

        assert!(s.on_loaded(second, Ok(vec![row(2)])));
        assert!(!s.on_loaded(first, Ok(vec![row(1), row(3)])));
        assert_eq!(s.rows, vec![row(2)]);
        assert!(!s.loading);
    }

    #[test]
    fn test_successful_delete_reloads_everything() {
        let mut s = PointsTableState::default();
        let (t, _) = s.begin_load();
        s.on_loaded(t, Ok(vec![row(1), row(2)]));
        s.row_error = Some((1, "old".into()));

        assert_eq!(s.on_mutation_result(2, Ok(())), AfterMutation::ReloadAll);
        assert_eq!(s.row_error, None);
    }

    #[test]
    fn test_failed_delete_leaves_rows_and_shows_server_text() {
        let mut s = PointsTableState::default();
        let (t, _) = s.begin_load();
        s.on_loaded(t, Ok(vec![row(1), row(2)]));

        let after = s.on_mutation_result(2, Err("point is referenced by a drawing".into()));
        assert_eq!(after, AfterMutation::ShowError);
        assert_eq!(s.rows, vec![row(1), row(2)]);
        assert_eq!(s.row_error_for(2), Some("point is referenced by a drawing"));
        assert_eq!(s.row_error_for(1), None);
    }

    #[test]
    fn test_list_error_keeps_previous_rows() {
        let mut s = PointsTableState::default();
        let (t, _) = s.begin_load();
        s.on_loaded(t, Ok(vec![row(1)]));
        let (t, _) = s.begin_load();
        s.on_loaded(t, Err("db down".into()));
        assert_eq!(s.error.as_deref(), Some("db down"));
        assert_eq!(s.rows.len(), 1);
        assert_eq!(delete_prompt(5), "Delete point ID 5?");
    }

    #[test]
    fn test_list_error_is_a_retryable_notice_until_the_next_load() {
        let mut s = PointsTableState::default();
        assert_eq!(s.load_notice(), None);
        let (t, _) = s.begin_load();
        s.on_loaded(t, Err("HTTP error: 503".into()));
        assert_eq!(
            s.load_notice(),
            Some(Notice::retryable("Could not load points: HTTP error: 503"))
        );

        s.begin_load();
        assert_eq!(s.load_notice(), None);
    }
}
