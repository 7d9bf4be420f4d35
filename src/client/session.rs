use std::{future::Future, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use tokio_util::task::TaskTracker;

use crate::model::{Chat, Language, Theme, User};

use super::{
    search, ClientError, Fetched, Identity, LayoutCorrector, LiveSearch, PreferenceStore, SavedChats, Toggle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Default)]
struct SessionState {
    phase: Phase,
    identity: Option<Identity>,
    theme: Theme,
    language: Language,
    saved: SavedChats,
}

/// Read-only copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: Phase,
    pub identity: Option<Identity>,
    pub theme: Theme,
    pub language: Language,
    pub catalog: Vec<Chat>,
    pub saved_ids: Vec<i64>,
    pub saved: Vec<Chat>,
}

struct Preferences {
    theme: Theme,
    language: Language,
    saved_ids: Vec<i64>,
}

impl From<User> for Preferences {
    fn from(user: User) -> Self {
        Self { theme: user.theme, language: user.language, saved_ids: user.saved_chats }
    }
}

/// Single owner of the Mini-App's user state.
///
/// Reads go through [`Session::snapshot`]; changes go through the intent
/// methods, which update local state first and then write to the store in
/// the background. Background writes are best-effort: a failure is logged
/// and never retried or reported.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn PreferenceStore>,
    corrector: Arc<LayoutCorrector>,
    state: Arc<RwLock<SessionState>>,
    live_search: Arc<Mutex<LiveSearch>>,
    writes: TaskTracker,
}

impl Session {
    pub fn new(store: Arc<dyn PreferenceStore>, corrector: LayoutCorrector) -> Self {
        Self {
            store,
            corrector: Arc::new(corrector),
            state: Arc::default(),
            live_search: Arc::default(),
            writes: TaskTracker::new(),
        }
    }

    pub async fn snapshot(&self) -> SessionView {
        let state = self.state.read().await;
        SessionView {
            phase: state.phase,
            identity: state.identity.clone(),
            theme: state.theme,
            language: state.language,
            catalog: state.saved.catalog().to_vec(),
            saved_ids: state.saved.saved_ids().to_vec(),
            saved: state.saved.saved().to_vec(),
        }
    }

    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase
    }

    /// Loads the catalog and the user's preferences concurrently and becomes
    /// `Ready` once both have settled, whatever their outcome. Only the first
    /// call does anything.
    ///
    /// `ambient_theme` is the light/dark preference of the host, used to seed
    /// a freshly created user.
    pub async fn bootstrap(&self, identity: Option<Identity>, ambient_theme: Option<Theme>) {
        {
            let mut state = self.state.write().await;
            if state.phase != Phase::Uninitialized {
                tracing::debug!(phase = ?state.phase, "session already bootstrapped");
                return;
            }
            state.phase = Phase::Loading;
            state.identity = identity.clone();
        }

        let catalog = async {
            match self.store.fetch_catalog().await {
                Ok(catalog) => Some(catalog),
                Err(err) => {
                    tracing::warn!(%err, "failed to fetch chat catalog");
                    None
                }
            }
        };
        let preferences = self.resolve_preferences(identity.as_ref(), ambient_theme);
        let (catalog, preferences) = futures_util::future::join(catalog, preferences).await;

        let mut state = self.state.write().await;
        if let Some(catalog) = catalog {
            state.saved.set_catalog(catalog);
        }
        match preferences {
            Some(Preferences { theme, language, saved_ids }) => {
                state.theme = theme;
                state.language = language;
                state.saved.set_saved_ids(saved_ids);
            }
            // anonymous sessions still follow the host theme, locally
            None if identity.is_none() => state.theme = ambient_theme.unwrap_or_default(),
            None => {}
        }
        state.phase = Phase::Ready;
        tracing::info!(
            telegram_id = state.identity.as_ref().map(|identity| identity.id),
            chats = state.saved.catalog().len(),
            saved = state.saved.saved_ids().len(),
            "session ready"
        );
    }

    async fn resolve_preferences(&self, identity: Option<&Identity>, ambient_theme: Option<Theme>) -> Option<Preferences> {
        let Some(identity) = identity else {
            tracing::info!("no identity, running anonymously");
            return None;
        };

        match self.store.fetch_user(identity.id).await {
            Ok(Fetched::Existing(user)) => Some(user.into()),
            Ok(Fetched::Created(user)) => {
                let language = identity
                    .language_code
                    .as_deref()
                    .and_then(Language::from_code)
                    .unwrap_or_default();
                let theme = ambient_theme.unwrap_or(user.theme);
                tracing::info!(telegram_id = identity.id, %language, %theme, "seeding preferences for new user");

                self.write_language(identity.id, language);
                self.write_theme(identity.id, theme);
                Some(Preferences { theme, language, saved_ids: Vec::new() })
            }
            Err(err) => {
                tracing::warn!(telegram_id = identity.id, %err, "failed to fetch preferences");
                None
            }
        }
    }

    /// Flips the saved state of a chat and writes the new id list in the
    /// background. Unknown chats are refused and nothing is written.
    pub async fn toggle_saved(&self, chat_id: i64) -> Toggle {
        let (outcome, telegram_id, saved_ids) = {
            let mut state = self.state.write().await;
            let outcome = state.saved.toggle(chat_id);
            (outcome, state.identity.as_ref().map(|identity| identity.id), state.saved.saved_ids().to_vec())
        };

        if outcome == Toggle::UnknownChat {
            tracing::warn!(chat_id, "refusing to save a chat missing from the catalog");
            return outcome;
        }

        match telegram_id {
            Some(telegram_id) => {
                let store = Arc::clone(&self.store);
                self.spawn_write("saved chats", telegram_id, async move {
                    store.put_saved_chats(telegram_id, &saved_ids).await
                });
            }
            None => tracing::debug!(chat_id, "anonymous session, saved chats stay local"),
        }
        outcome
    }

    /// Returns false when `theme` was already active.
    pub async fn set_theme(&self, theme: Theme) -> bool {
        let telegram_id = {
            let mut state = self.state.write().await;
            if state.theme == theme {
                return false;
            }
            state.theme = theme;
            state.identity.as_ref().map(|identity| identity.id)
        };

        if let Some(telegram_id) = telegram_id {
            self.write_theme(telegram_id, theme);
        }
        true
    }

    /// Returns false when `language` was already active.
    pub async fn set_language(&self, language: Language) -> bool {
        let telegram_id = {
            let mut state = self.state.write().await;
            if state.language == language {
                return false;
            }
            state.language = language;
            state.identity.as_ref().map(|identity| identity.id)
        };

        if let Some(telegram_id) = telegram_id {
            self.write_language(telegram_id, language);
        }
        true
    }

    /// Runs one keystroke's search. `None` if a newer query was issued while
    /// this one ran; its results are then discarded.
    pub async fn search(&self, query: &str) -> Option<Vec<Chat>> {
        let ticket = self.live_search.lock().await.issue(query);
        let catalog = self.state.read().await.saved.catalog().to_vec();
        let corrector = Arc::clone(&self.corrector);
        let query = ticket.query().to_owned();

        let results = match tokio::task::spawn_blocking(move || search(&query, &catalog, &corrector)).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(%err, "search task failed");
                return None;
            }
        };

        self.live_search
            .lock()
            .await
            .publish(&ticket, results.clone())
            .then_some(results)
    }

    /// Results of the most recent query.
    pub async fn search_results(&self) -> Vec<Chat> {
        self.live_search.lock().await.results().to_vec()
    }

    /// Waits for every background write started so far.
    pub async fn settle(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    fn write_language(&self, telegram_id: i64, language: Language) {
        let store = Arc::clone(&self.store);
        self.spawn_write("language", telegram_id, async move { store.put_language(telegram_id, language).await });
    }

    fn write_theme(&self, telegram_id: i64, theme: Theme) {
        let store = Arc::clone(&self.store);
        self.spawn_write("theme", telegram_id, async move { store.put_theme(telegram_id, theme).await });
    }

    fn spawn_write<F>(&self, what: &'static str, telegram_id: i64, write: F)
    where
        F: Future<Output = Result<User, ClientError>> + Send + 'static,
    {
        self.writes.spawn(async move {
            match write.await {
                Ok(_) => tracing::debug!(telegram_id, what, "preference written"),
                Err(err) => tracing::warn!(telegram_id, what, %err, "preference write failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Write {
        Language(i64, Language),
        Theme(i64, Theme),
        SavedChats(i64, Vec<i64>),
    }

    #[derive(Default)]
    struct MockStore {
        catalog: Option<Vec<Chat>>,
        user: Option<Fetched<User>>,
        writes: StdMutex<Vec<Write>>,
        reject_writes: bool,
    }

    impl MockStore {
        fn writes(&self) -> Vec<Write> {
            self.writes.lock().unwrap().clone()
        }

        fn record(&self, write: Write) -> Result<User, ClientError> {
            self.writes.lock().unwrap().push(write);
            if self.reject_writes {
                return Err(ClientError::Http(reqwest::StatusCode::SERVICE_UNAVAILABLE));
            }
            Ok(User::new(0))
        }
    }

    #[async_trait]
    impl PreferenceStore for MockStore {
        async fn fetch_catalog(&self) -> Result<Vec<Chat>, ClientError> {
            self.catalog.clone().ok_or(ClientError::Http(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }

        async fn fetch_user(&self, _telegram_id: i64) -> Result<Fetched<User>, ClientError> {
            self.user.clone().ok_or(ClientError::Http(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }

        async fn put_language(&self, telegram_id: i64, language: Language) -> Result<User, ClientError> {
            self.record(Write::Language(telegram_id, language))
        }

        async fn put_theme(&self, telegram_id: i64, theme: Theme) -> Result<User, ClientError> {
            self.record(Write::Theme(telegram_id, theme))
        }

        async fn put_saved_chats(&self, telegram_id: i64, saved_chats_ids: &[i64]) -> Result<User, ClientError> {
            self.record(Write::SavedChats(telegram_id, saved_chats_ids.to_vec()))
        }
    }

    fn chat(id: i64, short_name: &str, long_name: &str) -> Chat {
        Chat {
            id,
            short_name: short_name.to_owned(),
            long_name: long_name.to_owned(),
            semester: 1,
            role: "course".to_owned(),
            link: format!("https://t.me/+{id}"),
        }
    }

    fn catalog() -> Vec<Chat> {
        vec![chat(1, "ALG", "Algorithms"), chat(2, "CAF", "Cafe Club"), chat(3, "PRG", "Programming")]
    }

    fn session(store: &Arc<MockStore>) -> Session {
        Session::new(Arc::clone(store) as Arc<dyn PreferenceStore>, LayoutCorrector::russian())
    }

    #[tokio::test]
    async fn existing_user_preferences_are_adopted() {
        let store = Arc::new(MockStore {
            catalog: Some(catalog()),
            user: Some(Fetched::Existing(User {
                telegram_id: 42,
                theme: Theme::Dark,
                language: Language::Kz,
                saved_chats: vec![3, 1],
            })),
            ..Default::default()
        });
        let session = session(&store);

        session.bootstrap(Some(Identity::new(42, Some("ru"))), Some(Theme::Light)).await;
        session.settle().await;

        let view = session.snapshot().await;
        assert_eq!(view.phase, Phase::Ready);
        assert_eq!(view.theme, Theme::Dark);
        assert_eq!(view.language, Language::Kz);
        assert_eq!(view.saved_ids, vec![3, 1]);
        assert_eq!(view.saved, vec![chat(1, "ALG", "Algorithms"), chat(3, "PRG", "Programming")]);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn new_user_is_seeded_from_identity_and_ambient_theme() {
        let store = Arc::new(MockStore {
            catalog: Some(catalog()),
            user: Some(Fetched::Created(User::new(42))),
            ..Default::default()
        });
        let session = session(&store);

        session.bootstrap(Some(Identity::new(42, Some("uk"))), Some(Theme::Dark)).await;
        session.settle().await;

        let view = session.snapshot().await;
        assert_eq!(view.language, Language::Uk);
        assert_eq!(view.theme, Theme::Dark);
        assert!(view.saved_ids.is_empty());

        let mut writes = store.writes();
        writes.sort_by_key(|write| format!("{write:?}"));
        assert_eq!(writes, vec![Write::Language(42, Language::Uk), Write::Theme(42, Theme::Dark)]);
    }

    #[tokio::test]
    async fn unsupported_language_hint_falls_back_to_english() {
        let store = Arc::new(MockStore {
            catalog: Some(catalog()),
            user: Some(Fetched::Created(User::new(42))),
            ..Default::default()
        });
        let session = session(&store);

        session.bootstrap(Some(Identity::new(42, Some("de"))), None).await;
        session.settle().await;

        let view = session.snapshot().await;
        assert_eq!(view.language, Language::En);
        assert_eq!(view.theme, Theme::Light);
        assert!(store.writes().contains(&Write::Language(42, Language::En)));
    }

    #[tokio::test]
    async fn failures_still_reach_ready() {
        let store = Arc::new(MockStore::default());
        let session = session(&store);
        assert_eq!(session.phase().await, Phase::Uninitialized);

        session.bootstrap(Some(Identity::new(42, None)), Some(Theme::Dark)).await;

        let view = session.snapshot().await;
        assert_eq!(view.phase, Phase::Ready);
        assert!(view.catalog.is_empty());
        assert_eq!(view.theme, Theme::Light);
        assert_eq!(view.language, Language::En);
    }

    #[tokio::test]
    async fn toggle_writes_full_id_list() {
        let store = Arc::new(MockStore {
            catalog: Some(catalog()),
            user: Some(Fetched::Existing(User::new(42))),
            ..Default::default()
        });
        let session = session(&store);
        session.bootstrap(Some(Identity::new(42, None)), None).await;

        assert_eq!(session.toggle_saved(3).await, Toggle::Saved);
        assert_eq!(session.toggle_saved(1).await, Toggle::Saved);
        assert_eq!(session.toggle_saved(3).await, Toggle::Removed);
        assert_eq!(session.toggle_saved(99).await, Toggle::UnknownChat);
        session.settle().await;

        let view = session.snapshot().await;
        assert_eq!(view.saved_ids, vec![1]);
        assert_eq!(view.saved, vec![chat(1, "ALG", "Algorithms")]);

        let mut saved_writes: Vec<Vec<i64>> = store
            .writes()
            .into_iter()
            .filter_map(|write| match write {
                Write::SavedChats(42, ids) => Some(ids),
                _ => None,
            })
            .collect();
        saved_writes.sort();
        assert_eq!(saved_writes, vec![vec![1], vec![3], vec![3, 1]]);
    }

    #[tokio::test]
    async fn failed_write_keeps_local_state() {
        let store = Arc::new(MockStore {
            catalog: Some(catalog()),
            user: Some(Fetched::Existing(User::new(42))),
            reject_writes: true,
            ..Default::default()
        });
        let session = session(&store);
        session.bootstrap(Some(Identity::new(42, None)), None).await;

        assert_eq!(session.toggle_saved(2).await, Toggle::Saved);
        session.settle().await;
        session.settle().await;

        let view = session.snapshot().await;
        assert_eq!(view.saved_ids, vec![2]);
        assert_eq!(view.saved, vec![chat(2, "CAF", "Cafe Club")]);
        assert_eq!(store.writes(), vec![Write::SavedChats(42, vec![2])]);
    }

    #[tokio::test]
    async fn anonymous_session_keeps_changes_local() {
        let store = Arc::new(MockStore { catalog: Some(catalog()), ..Default::default() });
        let session = session(&store);
        session.bootstrap(None, Some(Theme::Dark)).await;

        assert_eq!(session.snapshot().await.theme, Theme::Dark);
        assert_eq!(session.toggle_saved(2).await, Toggle::Saved);
        assert!(session.set_theme(Theme::Light).await);
        session.settle().await;

        let view = session.snapshot().await;
        assert_eq!(view.saved_ids, vec![2]);
        assert_eq!(view.theme, Theme::Light);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn unchanged_settings_are_not_written() {
        let store = Arc::new(MockStore {
            catalog: Some(catalog()),
            user: Some(Fetched::Existing(User::new(42))),
            ..Default::default()
        });
        let session = session(&store);
        session.bootstrap(Some(Identity::new(42, None)), None).await;

        assert!(!session.set_theme(Theme::Light).await);
        assert!(!session.set_language(Language::En).await);
        assert!(session.set_language(Language::Cz).await);
        session.settle().await;

        assert_eq!(store.writes(), vec![Write::Language(42, Language::Cz)]);
    }

    #[tokio::test]
    async fn search_uses_loaded_catalog() {
        let store = Arc::new(MockStore { catalog: Some(catalog()), ..Default::default() });
        let session = session(&store);
        session.bootstrap(None, None).await;

        let results = session.search("café").await.unwrap();
        assert_eq!(results, vec![chat(2, "CAF", "Cafe Club")]);
        assert_eq!(session.search_results().await, results);

        assert_eq!(session.search("").await, Some(Vec::new()));
        assert!(session.search_results().await.is_empty());
    }

    #[tokio::test]
    async fn second_bootstrap_is_ignored() {
        let store = Arc::new(MockStore { catalog: Some(catalog()), ..Default::default() });
        let session = session(&store);
        session.bootstrap(None, None).await;
        session.toggle_saved(1).await;

        session.bootstrap(None, None).await;
        assert_eq!(session.snapshot().await.saved_ids, vec![1]);
    }
}
