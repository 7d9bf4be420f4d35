use std::{collections::HashMap, fs, path::Path};

use thiserror::Error;

/// Russian ЙЦУКЕН key caps and the QWERTY characters on the same keys.
const RUSSIAN_TO_QWERTY: &[(char, char)] = &[
    ('й', 'q'), ('ц', 'w'), ('у', 'e'), ('к', 'r'), ('е', 't'), ('н', 'y'),
    ('г', 'u'), ('ш', 'i'), ('щ', 'o'), ('з', 'p'), ('х', '['), ('ъ', ']'),
    ('ф', 'a'), ('ы', 's'), ('в', 'd'), ('а', 'f'), ('п', 'g'), ('р', 'h'),
    ('о', 'j'), ('л', 'k'), ('д', 'l'), ('ж', ';'), ('э', '\''),
    ('я', 'z'), ('ч', 'x'), ('с', 'c'), ('м', 'v'), ('и', 'b'), ('т', 'n'),
    ('ь', 'm'), ('б', ','), ('ю', '.'), ('ё', '`'),
    ('Й', 'Q'), ('Ц', 'W'), ('У', 'E'), ('К', 'R'), ('Е', 'T'), ('Н', 'Y'),
    ('Г', 'U'), ('Ш', 'I'), ('Щ', 'O'), ('З', 'P'), ('Х', '{'), ('Ъ', '}'),
    ('Ф', 'A'), ('Ы', 'S'), ('В', 'D'), ('А', 'F'), ('П', 'G'), ('Р', 'H'),
    ('О', 'J'), ('Л', 'K'), ('Д', 'L'), ('Ж', ':'), ('Э', '"'),
    ('Я', 'Z'), ('Ч', 'X'), ('С', 'C'), ('М', 'V'), ('И', 'B'), ('Т', 'N'),
    ('Ь', 'M'), ('Б', '<'), ('Ю', '>'), ('Ё', '~'), ('№', '#'),
];

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse layout table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("layout table entry {0:?} is not a single character")]
    NotSingleChar(String),
}

pub fn contains_cyrillic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

/// Recovers text typed with the Cyrillic layout active while the user meant
/// Latin: each character becomes the Latin character on the same key.
#[derive(Debug, Clone)]
pub struct LayoutCorrector {
    table: Option<HashMap<char, char>>,
}

impl Default for LayoutCorrector {
    fn default() -> Self {
        Self::russian()
    }
}

impl LayoutCorrector {
    pub fn russian() -> Self {
        Self { table: Some(RUSSIAN_TO_QWERTY.iter().copied().collect()) }
    }

    /// A corrector without a table; it hands every string back untouched.
    pub fn unavailable() -> Self {
        Self { table: None }
    }

    /// Parses a JSON object of single-character keys to single-character values.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        fn single(s: String) -> Result<char, LayoutError> {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(LayoutError::NotSingleChar(s)),
            }
        }

        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        let table = raw
            .into_iter()
            .map(|(from, to)| -> Result<(char, char), LayoutError> { Ok((single(from)?, single(to)?)) })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { table: Some(table) })
    }

    /// Loads a table from disk. Any failure is logged and leaves the
    /// corrector unavailable rather than failing the caller.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path).map_err(LayoutError::from).and_then(|json| Self::from_json(&json)) {
            Ok(corrector) => corrector,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "keyboard layout table unavailable");
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.table.is_some()
    }

    pub fn reinterpret_as_latin_typed(&self, text: &str) -> String {
        let Some(table) = &self.table else {
            tracing::debug!("no layout table, query kept as typed");
            return text.to_owned();
        };

        text.chars().map(|c| table.get(&c).copied().unwrap_or(c)).collect()
    }
}
