//! Most-recent-wins bookkeeping for one logical stream of async work.
//!
//! Every time work is issued (a debounce timer armed, a request sent) the
//! stream hands out a new [`Ticket`]. When the work completes, its result may
//! only be applied if the ticket is still the latest one issued. Results for
//! older tickets are stale and must be dropped.

/// Identity of one issued unit of work within a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    latest: u64,
    live: bool,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new ticket; every previously issued ticket becomes stale.
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        self.live = true;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.live && ticket.0 == self.latest
    }

    /// Makes every outstanding ticket stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.live = false;
    }

    /// Latest ticket, if it has not been invalidated.
    pub fn current(&self) -> Option<Ticket> {
        self.live.then_some(Ticket(self.latest))
    }
}
