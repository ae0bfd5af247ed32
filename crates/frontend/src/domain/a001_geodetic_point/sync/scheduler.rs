//! Refresh scheduling for the map layers.
//!
//! Viewport motion and typed filters share one debounce stream. A refresh
//! pass walks the layers in order (points, polygons, markers) and each layer
//! keeps its own request sequence, so only the latest response per layer is
//! ever drawn. Toggles, the code dropdown, reload and saved edits refresh at
//! once and supersede a pending debounce.

use contracts::domain::a001_geodetic_point::LayerQuery;
use contracts::shared::geo::{BoundingBox, FeatureCollection};

use super::layers::{LayerKind, LayerState};
use crate::shared::sequence::{Sequence, Ticket};

/// Free-text filters debounced like viewport motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Text,
    IdFrom,
    IdTo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapFilters {
    pub code: String,
    pub q: String,
    pub id_from: String,
    pub id_to: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl MapFilters {
    fn set(&mut self, field: FilterField, value: String) {
        match field {
            FilterField::Text => self.q = value,
            FilterField::IdFrom => self.id_from = value,
            FilterField::IdTo => self.id_to = value,
        }
    }

    /// Query for `kind` over `bbox`; blank filters are omitted.
    pub fn query(&self, kind: LayerKind, bbox: &BoundingBox) -> LayerQuery {
        let mut query = LayerQuery::bbox_only(bbox, kind.limit());
        if kind.uses_filters() {
            query.code = non_empty(&self.code);
            query.q = non_empty(&self.q);
            query.id_from = non_empty(&self.id_from);
            query.id_to = non_empty(&self.id_to);
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerRequest {
    pub layer: LayerKind,
    pub ticket: Ticket,
    pub query: LayerQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshStep {
    Fetch(LayerRequest),
    /// Layer is disabled: remove its geometry.
    Clear(LayerKind),
}

/// One sequential refresh pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshPlan {
    pub pass: Ticket,
    pub bbox: BoundingBox,
    pub steps: Vec<RefreshStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// New contents drawn; number of features.
    Applied(usize),
    /// A newer request for the layer exists; nothing changed.
    Stale,
    /// Fetch failed; the layer keeps its last contents.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ViewportSync {
    filters: MapFilters,
    enabled: [bool; 3],
    debounce: Sequence,
    passes: Sequence,
    requests: [Sequence; 3],
    layers: [LayerState; 3],
}

impl Default for ViewportSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportSync {
    /// Points and polygons shown, photo markers hidden.
    pub fn new() -> Self {
        Self {
            filters: MapFilters::default(),
            enabled: [true, true, false],
            debounce: Sequence::new(),
            passes: Sequence::new(),
            requests: Default::default(),
            layers: Default::default(),
        }
    }

    pub fn filters(&self) -> &MapFilters {
        &self.filters
    }

    pub fn is_enabled(&self, kind: LayerKind) -> bool {
        self.enabled[kind.index()]
    }

    pub fn layer(&self, kind: LayerKind) -> &LayerState {
        &self.layers[kind.index()]
    }

    /// Viewport finished moving. Arm the debounce timer with the ticket.
    pub fn on_viewport_moved(&mut self) -> Ticket {
        self.debounce.issue()
    }

    /// A free-text filter changed. Arm the debounce timer with the ticket.
    pub fn on_filter_typed(&mut self, field: FilterField, value: String) -> Ticket {
        self.filters.set(field, value);
        self.debounce.issue()
    }

    /// Code dropdown changed; refresh immediately.
    pub fn set_code(&mut self, code: String) {
        self.filters.code = code;
    }

    /// Layer toggle changed; refresh immediately.
    pub fn set_layer_enabled(&mut self, kind: LayerKind, enabled: bool) {
        self.enabled[kind.index()] = enabled;
    }

    /// Debounce timer fired. `true` when no newer trigger re-armed it.
    pub fn on_quiet(&mut self, ticket: Ticket) -> bool {
        if !self.debounce.is_current(ticket) {
            return false;
        }
        self.debounce.invalidate();
        true
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.debounce.current().is_some()
    }

    /// Starts a pass over the live viewport `bbox`.
    ///
    /// Any pending debounce and any older pass become stale, and every
    /// request they issued is superseded.
    pub fn begin_refresh(&mut self, bbox: BoundingBox) -> RefreshPlan {
        self.debounce.invalidate();
        let pass = self.passes.issue();
        let steps = LayerKind::ALL
            .iter()
            .map(|&kind| {
                let seq = &mut self.requests[kind.index()];
                if self.enabled[kind.index()] {
                    RefreshStep::Fetch(LayerRequest {
                        layer: kind,
                        ticket: seq.issue(),
                        query: self.filters.query(kind, &bbox),
                    })
                } else {
                    seq.invalidate();
                    RefreshStep::Clear(kind)
                }
            })
            .collect();
        RefreshPlan { pass, bbox, steps }
    }

    pub fn is_pass_current(&self, pass: Ticket) -> bool {
        self.passes.is_current(pass)
    }

    /// Applies a layer response if it belongs to the latest request for
    /// that layer.
    pub fn apply_layer(
        &mut self,
        request: &LayerRequest,
        result: Result<FeatureCollection, String>,
    ) -> ApplyOutcome {
        let idx = request.layer.index();
        if !self.requests[idx].is_current(request.ticket) {
            return ApplyOutcome::Stale;
        }
        self.requests[idx].invalidate();
        match result {
            Ok(collection) => match collection.error.as_deref().map(str::trim) {
                Some(error) if !error.is_empty() => ApplyOutcome::Failed(error.to_string()),
                _ => ApplyOutcome::Applied(self.layers[idx].replace(request.layer, collection)),
            },
            Err(e) => ApplyOutcome::Failed(e),
        }
    }

    /// Removes a disabled layer's geometry. Ignored when the layer was
    /// re-enabled by a newer pass.
    pub fn clear_layer(&mut self, kind: LayerKind) -> bool {
        if self.enabled[kind.index()] {
            return false;
        }
        self.layers[kind.index()].clear();
        true
    }

    /// Marks the pass finished so later checks treat it as superseded.
    pub fn finish_pass(&mut self, pass: Ticket) {
        if self.passes.is_current(pass) {
            self.passes.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(west: f64) -> BoundingBox {
        BoundingBox::new(49.0, west, 50.0, west + 1.0)
    }

    fn fetches(plan: &RefreshPlan) -> Vec<&LayerRequest> {
        plan.steps
            .iter()
            .filter_map(|s| match s {
                RefreshStep::Fetch(r) => Some(r),
                RefreshStep::Clear(_) => None,
            })
            .collect()
    }

    fn points(ids: &[i64]) -> FeatureCollection {
        let features: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({"geometry": null, "properties": {"id_pts": id}}))
            .collect();
        serde_json::from_value(serde_json::json!({"features": features})).unwrap()
    }

    #[test]
    fn test_pan_burst_yields_one_refresh_with_new_bounds() {
        let mut sync = ViewportSync::new();
        let timers: Vec<Ticket> = (0..6).map(|_| sync.on_viewport_moved()).collect();
        let fired: Vec<bool> = timers.into_iter().map(|t| sync.on_quiet(t)).collect();
        assert_eq!(fired.iter().filter(|f| **f).count(), 1);
        assert!(*fired.last().unwrap());

        let plan = sync.begin_refresh(bbox(14.0));
        let kinds: Vec<LayerKind> = fetches(&plan).iter().map(|r| r.layer).collect();
        assert_eq!(kinds, vec![LayerKind::Points, LayerKind::Polygons]);
        assert_eq!(plan.steps.last(), Some(&RefreshStep::Clear(LayerKind::Markers)));
        assert!(fetches(&plan).iter().all(|r| r.query.bbox == "14,49,15,50"));
    }

    #[test]
    fn test_filter_edit_uses_live_viewport() {
        let mut sync = ViewportSync::new();
        let t = sync.on_filter_typed(FilterField::Text, "kámen".into());
        assert!(sync.on_quiet(t));

        // viewport moved after the keystroke but before the timer fired
        let plan = sync.begin_refresh(bbox(16.0));
        let pts = fetches(&plan)[0];
        assert_eq!(pts.query.bbox, "16,49,17,50");
        assert_eq!(pts.query.q.as_deref(), Some("kámen"));
    }

    #[test]
    fn test_toggle_off_then_on_refetches_with_current_viewport() {
        let mut sync = ViewportSync::new();
        sync.begin_refresh(bbox(14.0));

        sync.set_layer_enabled(LayerKind::Polygons, false);
        let off = sync.begin_refresh(bbox(14.0));
        assert!(off.steps.contains(&RefreshStep::Clear(LayerKind::Polygons)));

        sync.set_layer_enabled(LayerKind::Polygons, true);
        let on = sync.begin_refresh(bbox(14.5));
        let polys = fetches(&on)
            .into_iter()
            .find(|r| r.layer == LayerKind::Polygons)
            .cloned()
            .unwrap();
        assert_eq!(polys.query.bbox, "14.5,49,15.5,50");
        assert_eq!(polys.query.limit, 2000);
    }

    #[test]
    fn test_only_points_carry_filters() {
        let mut sync = ViewportSync::new();
        sync.set_code("SU".into());
        sync.on_filter_typed(FilterField::IdFrom, " 10 ".into());
        sync.on_filter_typed(FilterField::IdTo, "".into());
        sync.set_layer_enabled(LayerKind::Markers, true);
        let plan = sync.begin_refresh(bbox(14.0));
        let reqs = fetches(&plan);

        assert_eq!(reqs[0].query.code.as_deref(), Some("SU"));
        assert_eq!(reqs[0].query.id_from.as_deref(), Some("10"));
        assert_eq!(reqs[0].query.id_to, None);
        assert_eq!(reqs[0].query.limit, 5000);
        for other in &reqs[1..] {
            assert_eq!(other.query, LayerQuery::bbox_only(&bbox(14.0), other.layer.limit()));
        }
    }

    #[test]
    fn test_immediate_refresh_cancels_pending_debounce() {
        let mut sync = ViewportSync::new();
        let t = sync.on_viewport_moved();
        assert!(sync.has_pending_debounce());
        sync.begin_refresh(bbox(14.0));
        assert!(!sync.on_quiet(t));
    }

    #[test]
    fn test_late_layer_response_from_older_pass_is_dropped() {
        let mut sync = ViewportSync::new();
        let first = sync.begin_refresh(bbox(14.0));
        let second = sync.begin_refresh(bbox(15.0));
        assert!(!sync.is_pass_current(first.pass));
        assert!(sync.is_pass_current(second.pass));

        let new_pts = fetches(&second)[0].clone();
        let old_pts = fetches(&first)[0].clone();
        assert_eq!(sync.apply_layer(&new_pts, Ok(points(&[2, 3]))), ApplyOutcome::Applied(2));
        assert_eq!(sync.apply_layer(&old_pts, Ok(points(&[1]))), ApplyOutcome::Stale);
        assert_eq!(sync.layer(LayerKind::Points).len(), 2);
    }

    #[test]
    fn test_response_for_layer_disabled_meanwhile_is_dropped() {
        let mut sync = ViewportSync::new();
        let plan = sync.begin_refresh(bbox(14.0));
        let polys = fetches(&plan)[1].clone();

        sync.set_layer_enabled(LayerKind::Polygons, false);
        let next = sync.begin_refresh(bbox(14.0));
        for step in &next.steps {
            if let RefreshStep::Clear(kind) = step {
                assert!(sync.clear_layer(*kind));
            }
        }
        assert_eq!(sync.apply_layer(&polys, Ok(points(&[1]))), ApplyOutcome::Stale);
        assert!(sync.layer(LayerKind::Polygons).is_empty());
    }

    #[test]
    fn test_failure_keeps_last_known_contents() {
        let mut sync = ViewportSync::new();
        let plan = sync.begin_refresh(bbox(14.0));
        sync.apply_layer(fetches(&plan)[0], Ok(points(&[1, 2])));

        let plan = sync.begin_refresh(bbox(14.0));
        let outcome = sync.apply_layer(fetches(&plan)[0], Err("HTTP error: 502".into()));
        assert_eq!(outcome, ApplyOutcome::Failed("HTTP error: 502".into()));
        assert_eq!(sync.layer(LayerKind::Points).len(), 2);

        let plan = sync.begin_refresh(bbox(14.0));
        let envelope: FeatureCollection =
            serde_json::from_str(r#"{"type":"FeatureCollection","features":[],"error":"bbox invalid"}"#).unwrap();
        assert_eq!(
            sync.apply_layer(fetches(&plan)[0], Ok(envelope)),
            ApplyOutcome::Failed("bbox invalid".into())
        );
        assert_eq!(sync.layer(LayerKind::Points).len(), 2);
    }

    #[test]
    fn test_finished_pass_is_no_longer_current() {
        let mut sync = ViewportSync::new();
        let plan = sync.begin_refresh(bbox(14.0));
        sync.finish_pass(plan.pass);
        assert!(!sync.is_pass_current(plan.pass));
    }
}
