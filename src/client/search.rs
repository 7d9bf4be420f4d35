use crate::model::Chat;

use super::{contains_cyrillic, normalize, LayoutCorrector};

pub const MAX_RESULTS: usize = 3;

/// First [`MAX_RESULTS`] chats, in catalog order, whose short or long name
/// contains the normalized query. Cyrillic queries also try the
/// layout-corrected spelling.
pub fn search(query: &str, chats: &[Chat], corrector: &LayoutCorrector) -> Vec<Chat> {
    let normalized = normalize(query);
    if normalized.trim().is_empty() {
        return Vec::new();
    }

    let corrected = contains_cyrillic(query)
        .then(|| normalize(&corrector.reinterpret_as_latin_typed(query)))
        .filter(|corrected| !corrected.trim().is_empty() && *corrected != normalized);

    chats
        .iter()
        .filter(|chat| {
            let short_name = normalize(&chat.short_name);
            let long_name = normalize(&chat.long_name);
            let hit = |needle: &str| short_name.contains(needle) || long_name.contains(needle);
            hit(normalized.as_str()) || corrected.as_deref().is_some_and(hit)
        })
        .take(MAX_RESULTS)
        .cloned()
        .collect()
}

/// Issued for every keystroke; only the newest one may publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Result list of the search box. Lookups may finish out of order; results of
/// anything but the last issued query are dropped.
#[derive(Debug, Default)]
pub struct LiveSearch {
    issued: u64,
    results: Vec<Chat>,
}

impl LiveSearch {
    pub fn issue(&mut self, query: &str) -> SearchTicket {
        self.issued += 1;
        SearchTicket { generation: self.issued, query: query.to_owned() }
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.issued
    }

    /// Returns false, leaving the shown results alone, for a stale ticket.
    pub fn publish(&mut self, ticket: &SearchTicket, results: Vec<Chat>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(query = %ticket.query, "dropping stale search results");
            return false;
        }
        self.results = results;
        true
    }

    pub fn results(&self) -> &[Chat] {
        &self.results
    }
}
