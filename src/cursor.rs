use serde::Serialize;

/// Bookkeeping for one fetch direction of a pager.
///
/// `position` is the last unit that was applied (a year, or a page number);
/// the pager derives the next unit from it. `in_flight` blocks a second
/// request for the same cursor until the first one is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagingCursor<U> {
    pub position: U,
    pub has_more: bool,
    pub in_flight: bool,
}

impl<U: Copy> PagingCursor<U> {
    pub fn new(position: U) -> Self {
        Self {
            position,
            has_more: true,
            in_flight: false,
        }
    }

    pub fn try_claim(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn release(&mut self) {
        self.in_flight = false;
    }

    pub fn advance(&mut self, position: U) {
        self.position = position;
        self.in_flight = false;
    }
}

/// Proof that a request was issued under a particular pager generation.
///
/// Pagers bump their generation on every reset; a response carrying an older
/// generation is dropped on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<U> {
    pub generation: u64,
    pub unit: U,
}
