//! One document-level click listener shared by every dropdown-like widget.
//!
//! Widgets register their root element together with a callback and a
//! group. A click runs a group's callback once when its target lies outside
//! every root of that group, so a widget rendered in two places does not
//! close itself when the user clicks into its other copy. Registration is
//! explicit and must be undone on unmount.

use leptos::prelude::*;
use std::collections::{BTreeMap, HashSet};
use wasm_bindgen::JsCast;
use web_sys::{Element, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Ordered table of registered listeners.
#[derive(Debug)]
pub struct ListenerTable<T> {
    next_id: u64,
    entries: BTreeMap<ListenerId, T>,
}

impl<T> Default for ListenerTable<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: BTreeMap::new(),
        }
    }
}

impl<T> ListenerTable<T> {
    pub fn insert(&mut self, entry: T) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, entry);
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ListenerId, &T)> {
        self.entries.iter()
    }

    /// First entry of every group none of whose entries `contains` the
    /// click, in registration order.
    pub fn outside(&self, group: impl Fn(&T) -> u64, contains: impl Fn(&T) -> bool) -> Vec<&T> {
        let inside: HashSet<u64> = self
            .entries
            .values()
            .filter(|entry| contains(*entry))
            .map(|entry| group(entry))
            .collect();
        let mut notified = HashSet::new();
        self.entries
            .values()
            .filter(|entry| {
                let g = group(*entry);
                !inside.contains(&g) && notified.insert(g)
            })
            .collect()
    }
}

struct OutsideClickEntry {
    group: u64,
    root: Element,
    on_outside: Callback<()>,
}

/// Process-wide hub; provide once near the root of the app.
#[derive(Clone, Copy)]
pub struct OutsideClickHub {
    table: StoredValue<ListenerTable<OutsideClickEntry>, LocalStorage>,
}

impl OutsideClickHub {
    /// Creates the hub and installs the single document listener.
    pub fn install() -> Self {
        let hub = Self {
            table: StoredValue::new_local(ListenerTable::default()),
        };
        // lives as long as the page
        let _ = window_event_listener(leptos::ev::click, move |ev: leptos::ev::MouseEvent| {
            let target = ev.target().and_then(|t| t.dyn_into::<Node>().ok());
            hub.dispatch(target.as_ref());
        });
        hub
    }

    pub fn register(&self, group: u64, root: Element, on_outside: Callback<()>) -> ListenerId {
        self.table
            .try_update_value(|t| {
                t.insert(OutsideClickEntry {
                    group,
                    root,
                    on_outside,
                })
            })
            .unwrap_or(ListenerId(0))
    }

    pub fn unregister(&self, id: ListenerId) {
        let _ = self.table.try_update_value(|t| t.remove(id));
    }

    fn dispatch(&self, target: Option<&Node>) {
        // Collect first: a callback may unregister while we iterate.
        let outside: Vec<Callback<()>> = self
            .table
            .try_with_value(|t| {
                t.outside(|entry| entry.group, |entry| entry.root.contains(target))
                    .into_iter()
                    .map(|entry| entry.on_outside)
                    .collect()
            })
            .unwrap_or_default();
        for callback in outside {
            callback.run(());
        }
    }
}

/// Hub from context; `None` outside of `App` (widgets then skip registration).
pub fn use_outside_click() -> Option<OutsideClickHub> {
    use_context::<OutsideClickHub>()
}
