use std::collections::HashMap;

use serde::Deserialize;

/// The user as vouched for by the host platform. Trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub language_code: Option<String>,
}

#[derive(Deserialize)]
struct WebAppUser {
    id: i64,
    language_code: Option<String>,
}

impl Identity {
    pub fn new(id: i64, language_code: Option<&str>) -> Self {
        Self { id, language_code: language_code.map(str::to_owned) }
    }

    /// Reads the `user` field of Telegram WebApp init data. The hash is not
    /// checked. `None` means the session runs anonymously.
    pub fn from_init_data(init_data: &str) -> Option<Self> {
        let params: HashMap<&str, String> = init_data
            .split('&')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                let decoded = urlencoding::decode(value).ok()?;
                Some((key, decoded.into_owned()))
            })
            .collect();

        let user_json = params.get("user")?;
        match serde_json::from_str::<WebAppUser>(user_json) {
            Ok(WebAppUser { id, language_code }) => Some(Self { id, language_code }),
            Err(err) => {
                tracing::warn!(%err, "unreadable user in init data, continuing anonymously");
                None
            }
        }
    }
}
