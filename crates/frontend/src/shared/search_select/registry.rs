//! Idempotent mounting of selectors.
//!
//! A selector is identified by a mount key (its container). Mounting the same
//! key again while it is alive hands back the existing state instead of a
//! second copy, so re-initialising a modal or a cloned form block never
//! duplicates chips or submitted values.

use leptos::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::model::{FieldValue, SelectedItem, SelectorConfig};
use super::session::SearchSession;

/// Result of [`MountRegistry::mount_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mounted<H> {
    pub handle: H,
    /// `false` when an existing mount was reused.
    pub fresh: bool,
}

#[derive(Debug)]
struct MountEntry<H> {
    handle: H,
    refs: usize,
}

/// Reference-counted table of live mounts.
#[derive(Debug)]
pub struct MountRegistry<H> {
    entries: HashMap<String, MountEntry<H>>,
}

impl<H> Default for MountRegistry<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H: Copy> MountRegistry<H> {
    pub fn mount_with(&mut self, key: &str, make: impl FnOnce() -> H) -> Mounted<H> {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refs += 1;
            return Mounted {
                handle: entry.handle,
                fresh: false,
            };
        }
        let handle = make();
        self.entries
            .insert(key.to_string(), MountEntry { handle, refs: 1 });
        Mounted {
            handle,
            fresh: true,
        }
    }

    /// Drops one reference; returns the handle once the last one is gone.
    pub fn unmount(&mut self, key: &str) -> Option<H> {
        let entry = self.entries.get_mut(key)?;
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            self.entries.remove(key).map(|e| e.handle)
        } else {
            None
        }
    }

    pub fn get(&self, key: &str) -> Option<H> {
        self.entries.get(key).map(|e| e.handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One live rendering of a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderId(u64);

/// Live renders of one selector.
///
/// The oldest live render is the primary one; only it materializes hidden
/// form fields, so a selector rendered twice still submits each id once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderClaims {
    next: u64,
    live: Vec<u64>,
}

impl RenderClaims {
    pub fn claim(&mut self) -> RenderId {
        self.next += 1;
        self.live.push(self.next);
        RenderId(self.next)
    }

    pub fn release(&mut self, id: RenderId) {
        self.live.retain(|r| *r != id.0);
    }

    pub fn is_primary(&self, id: RenderId) -> bool {
        self.live.first() == Some(&id.0)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

static NEXT_GROUP: AtomicU64 = AtomicU64::new(1);

/// Reactive handle to one mounted selector; the programmatic API.
#[derive(Debug, Clone, Copy)]
pub struct SelectorHandle {
    session: RwSignal<SearchSession>,
    renders: RwSignal<RenderClaims>,
    group: u64,
}

impl SelectorHandle {
    fn new(config: SelectorConfig) -> Self {
        Self {
            session: RwSignal::new(SearchSession::new(config)),
            renders: RwSignal::new(RenderClaims::default()),
            group: NEXT_GROUP.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub(crate) fn session(&self) -> RwSignal<SearchSession> {
        self.session
    }

    /// Identifies every render of this selector to the outside-click hub.
    pub(crate) fn group(&self) -> u64 {
        self.group
    }

    pub(crate) fn claim_render(&self) -> RenderId {
        self.renders
            .try_update(|r| r.claim())
            .unwrap_or(RenderId(0))
    }

    pub(crate) fn release_render(&self, id: RenderId) {
        self.renders.try_update(|r| r.release(id));
    }

    /// Hidden fields `render` must emit: the export for the primary
    /// render, nothing for the others. Tracked.
    pub(crate) fn rendered_fields(&self, render: RenderId) -> Vec<FieldValue> {
        if self.renders.try_with(|r| r.is_primary(render)) != Some(true) {
            return Vec::new();
        }
        self.session.try_with(|s| s.export()).unwrap_or_default()
    }

    pub fn set_single(&self, id: impl Into<String>, label: impl Into<String>) {
        let item = SelectedItem::new(id, label);
        self.session.try_update(|s| s.set_single(item));
    }

    pub fn set_multi(&self, items: Vec<SelectedItem>) {
        self.session.try_update(|s| s.set_multi(items));
    }

    pub fn clear(&self) {
        self.session.try_update(|s| s.clear());
    }

    /// Replaces the selection with values known only by their id.
    pub fn prefill_bare(&self, ids: Vec<String>) {
        self.session.try_update(|s| s.prefill_bare(ids));
    }

    /// Current submittable values (untracked; call from submit handlers).
    pub fn values(&self) -> Vec<FieldValue> {
        self.session
            .try_with_untracked(|s| s.export())
            .unwrap_or_default()
    }

    fn dispose(self) {
        self.session.dispose();
        self.renders.dispose();
    }
}

/// App-wide registry of selector mounts; provided by `App`.
#[derive(Clone)]
pub struct SelectorRegistry {
    owner: Owner,
    mounts: StoredValue<MountRegistry<SelectorHandle>>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self {
            owner: Owner::current().unwrap_or_else(Owner::new),
            mounts: StoredValue::new(MountRegistry::default()),
        }
    }

    /// Mounts (or re-attaches to) the selector under `key`.
    ///
    /// State created here belongs to the registry, not to the caller, and is
    /// disposed when the last mount of `key` is released.
    pub fn mount(&self, key: &str, config: SelectorConfig) -> SelectorHandle {
        let owner = self.owner.clone();
        let mounted = self
            .mounts
            .try_update_value(|m| {
                m.mount_with(key, || owner.with(|| SelectorHandle::new(config.clone())))
            })
            .unwrap_or_else(|| Mounted {
                handle: SelectorHandle::new(config.clone()),
                fresh: true,
            });
        if mounted.fresh {
            if let Some(err) = mounted.handle.session.with_untracked(|s| s.config_error().cloned()) {
                log::warn!("selector '{}' is inert: {}", key, err);
            }
        } else {
            log::debug!("selector '{}' already mounted, reusing state", key);
        }
        mounted.handle
    }

    pub fn release(&self, key: &str) {
        if let Some(Some(handle)) = self.mounts.try_update_value(|m| m.unmount(key)) {
            handle.dispose();
        }
    }

    pub fn mounted_count(&self) -> usize {
        self.mounts.try_with_value(|m| m.len()).unwrap_or(0)
    }
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Mounts a selector for the lifetime of the calling component.
///
/// Calling this twice with the same `key` while both callers are alive yields
/// the same handle.
pub fn use_selector(key: impl Into<String>, config: SelectorConfig) -> SelectorHandle {
    let key = key.into();
    let registry = use_context::<SelectorRegistry>().unwrap_or_else(|| {
        let registry = SelectorRegistry::new();
        provide_context(registry.clone());
        registry
    });
    let handle = registry.mount(&key, config);
    on_cleanup(move || registry.release(&key));
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_mount_reuses_existing_handle() {
        let mut reg = MountRegistry::default();
        let mut created = 0;
        let first = reg.mount_with("photo-authors", || {
            created += 1;
            10u32
        });
        let second = reg.mount_with("photo-authors", || {
            created += 1;
            20u32
        });
        assert!(first.fresh);
        assert!(!second.fresh);
        assert_eq!(second.handle, 10);
        assert_eq!(created, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_entry_survives_until_last_release() {
        let mut reg = MountRegistry::default();
        reg.mount_with("sections", || 1u8);
        reg.mount_with("sections", || 2u8);

        assert_eq!(reg.unmount("sections"), None);
        assert_eq!(reg.get("sections"), Some(1));
        assert_eq!(reg.unmount("sections"), Some(1));
        assert!(reg.is_empty());
        assert_eq!(reg.unmount("sections"), None);

        let again = reg.mount_with("sections", || 3u8);
        assert!(again.fresh);
        assert_eq!(again.handle, 3);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut reg = MountRegistry::default();
        reg.mount_with("edit:author", || 'a');
        reg.mount_with("upload:author", || 'b');
        assert_eq!(reg.get("edit:author"), Some('a'));
        assert_eq!(reg.get("upload:author"), Some('b'));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_oldest_live_render_is_primary() {
        let mut claims = RenderClaims::default();
        let a = claims.claim();
        let b = claims.claim();
        assert!(claims.is_primary(a));
        assert!(!claims.is_primary(b));

        claims.release(a);
        assert!(claims.is_primary(b));
        let c = claims.claim();
        assert!(!claims.is_primary(c));
        claims.release(b);
        claims.release(c);
        assert!(claims.is_empty());
    }

    #[test]
    fn test_two_renders_materialize_one_set_of_fields() {
        use crate::shared::search_select::model::SelectorMode;

        let owner = Owner::new();
        owner.with(|| {
            let registry = SelectorRegistry::new();
            let config = SelectorConfig::new(SelectorMode::Multi, "/drawings/api/search/sj", "ref_sj");
            let first = registry.mount("drawings-filter:ref_sj", config.clone());
            let second = registry.mount("drawings-filter:ref_sj", config);
            assert_eq!(first.group(), second.group());

            let render_a = first.claim_render();
            let render_b = second.claim_render();
            first.set_multi(vec![SelectedItem::new("7", "SU 7"), SelectedItem::new("8", "SU 8")]);

            let rendered: Vec<FieldValue> = [render_a, render_b]
                .into_iter()
                .flat_map(|r| first.rendered_fields(r))
                .collect();
            assert_eq!(rendered, first.values());
            assert_eq!(rendered.len(), 2);

            first.release_render(render_a);
            assert!(first.rendered_fields(render_a).is_empty());
            assert_eq!(second.rendered_fields(render_b), second.values());
        });
    }

    #[test]
    fn test_remount_shares_selection_and_values() {
        use crate::shared::search_select::model::SelectorMode;

        let owner = Owner::new();
        owner.with(|| {
            let registry = SelectorRegistry::new();
            let config = SelectorConfig::new(SelectorMode::Multi, "/api/search/sj", "sj_ids");

            let first = registry.mount("bulk-form:sj", config.clone());
            first.set_multi(vec![SelectedItem::new("1", "SU 1")]);
            let second = registry.mount("bulk-form:sj", config);
            second.set_multi(vec![SelectedItem::new("1", "SU 1")]);

            assert_eq!(second.values().len(), 1);
            assert_eq!(first.values(), second.values());
            assert_eq!(registry.mounted_count(), 1);

            registry.release("bulk-form:sj");
            assert_eq!(registry.mounted_count(), 1);
            assert_eq!(first.values().len(), 1);
            registry.release("bulk-form:sj");
            assert_eq!(registry.mounted_count(), 0);
        });
    }
}
