use crate::model::Chat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Saved,
    Removed,
    /// The id is neither saved nor in the catalog; nothing changed.
    UnknownChat,
}

/// The catalog, the saved ids, and the saved chats derived from both.
///
/// `saved` is always `catalog` filtered to the ids in `saved_ids`, in catalog
/// order. It is rebuilt on every change and never edited on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedChats {
    catalog: Vec<Chat>,
    saved_ids: Vec<i64>,
    saved: Vec<Chat>,
}

impl SavedChats {
    pub fn new(catalog: Vec<Chat>, saved_ids: Vec<i64>) -> Self {
        let mut saved_chats = Self { catalog, saved_ids: Vec::new(), saved: Vec::new() };
        saved_chats.set_saved_ids(saved_ids);
        saved_chats
    }

    pub fn catalog(&self) -> &[Chat] {
        &self.catalog
    }

    /// Saved ids in the order they were saved.
    pub fn saved_ids(&self) -> &[i64] {
        &self.saved_ids
    }

    pub fn saved(&self) -> &[Chat] {
        &self.saved
    }

    pub fn is_saved(&self, chat_id: i64) -> bool {
        self.saved_ids.contains(&chat_id)
    }

    pub fn set_catalog(&mut self, catalog: Vec<Chat>) {
        self.catalog = catalog;
        self.recompute();
    }

    /// Adopts an id list from the store. Duplicates keep their first position.
    pub fn set_saved_ids(&mut self, saved_ids: Vec<i64>) {
        self.saved_ids.clear();
        for id in saved_ids {
            if !self.saved_ids.contains(&id) {
                self.saved_ids.push(id);
            }
        }
        self.recompute();
    }

    /// Unsaves a saved id, or saves an id present in the catalog. Ids that
    /// are neither are refused so every saved id can be shown.
    pub fn toggle(&mut self, chat_id: i64) -> Toggle {
        let outcome = if let Some(pos) = self.saved_ids.iter().position(|id| *id == chat_id) {
            self.saved_ids.remove(pos);
            Toggle::Removed
        } else if self.catalog.iter().any(|chat| chat.id == chat_id) {
            self.saved_ids.push(chat_id);
            Toggle::Saved
        } else {
            return Toggle::UnknownChat;
        };

        self.recompute();
        outcome
    }

    fn recompute(&mut self) {
        self.saved = self
            .catalog
            .iter()
            .filter(|chat| self.saved_ids.contains(&chat.id))
            .cloned()
            .collect();
    }
}
