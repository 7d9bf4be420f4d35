//! Mini-App side of the directory: query matching, the saved-chats projection,
//! and the session that keeps both in step with the preference store.

mod identity;
mod layout;
mod normalize;
mod saved;
mod search;
mod session;
mod store;

pub use identity::Identity;
pub use layout::{contains_cyrillic, LayoutCorrector, LayoutError};
pub use normalize::normalize;
pub use saved::{SavedChats, Toggle};
pub use search::{search, LiveSearch, SearchTicket, MAX_RESULTS};
pub use session::{Phase, Session, SessionView};
pub use store::{ClientError, Fetched, HttpPreferenceStore, PreferenceStore};
