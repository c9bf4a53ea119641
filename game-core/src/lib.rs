use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Key of one embeddable game, e.g. `matching-game-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GameId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog entry. The embed URL is only reachable through
/// [`GameRecord::embed_url`] and is left out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct GameRecord {
    target_url: String,
    pub title: String,
    pub description: String,
    pub default_width: u32,
    pub default_height: u32,
}

impl GameRecord {
    pub fn new(
        target_url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        default_width: u32,
        default_height: u32,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            title: title.into(),
            description: description.into(),
            default_width,
            default_height,
        }
    }

    /// Third-party URL for the iframe `src`. Callers must not echo it anywhere else.
    pub fn embed_url(&self) -> &str {
        &self.target_url
    }
}

impl fmt::Debug for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameRecord")
            .field("target_url", &"<hidden>")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("default_width", &self.default_width)
            .field("default_height", &self.default_height)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog entry {position} has an empty id")]
    EmptyId { position: usize },
    #[error("duplicate game id: {0}")]
    DuplicateId(String),
    #[error("game {id} has invalid dimensions {width}x{height}")]
    InvalidDimensions { id: String, width: u32, height: u32 },
    #[error("game {0} has a non-http embed url")]
    InvalidUrl(String),
    #[error("malformed catalog: {0}")]
    Malformed(String),
}

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    games: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    url: String,
    title: String,
    #[serde(default)]
    description: String,
    width: u32,
    height: u32,
}

struct BuiltinGame {
    id: &'static str,
    url: &'static str,
    title: &'static str,
    description: &'static str,
    width: u32,
    height: u32,
}

const BUILTIN_GAMES: &[BuiltinGame] = &[
    BuiltinGame {
        id: "matching-game-1",
        url: "https://wordwall.net/embed/4170af7a0b134f80ba77aa6260dd48f2?themeId=3&templateId=5&fontStackId=0",
        title: "Matching Game 1",
        description: "A fun matching game for learning",
        width: 500,
        height: 380,
    },
    BuiltinGame {
        id: "matching-game-test",
        url: "https://wordwall.net/ar/embed/d4ad152cc47f4e76a949581e6718e0b3?themeId=65&templateId=25&fontStackId=0&premiumEmbed=1&premium=1&noBranding=1&adFree=1",
        title: "Matching Game Test",
        description: "Arabic matching game",
        width: 500,
        height: 380,
    },
];

/// Immutable id -> record mapping, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStore {
    ids: Vec<GameId>,
    records: HashMap<GameId, GameRecord>,
}

impl GameStore {
    /// Validates and builds a store. Iteration order follows `entries`.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (GameId, GameRecord)>,
    ) -> Result<Self, CatalogError> {
        let mut ids = Vec::new();
        let mut records = HashMap::new();
        for (position, (id, record)) in entries.into_iter().enumerate() {
            validate_entry(position, &id, &record)?;
            if records.contains_key(&id) {
                return Err(CatalogError::DuplicateId(id.0));
            }
            ids.push(id.clone());
            records.insert(id, record);
        }
        Ok(Self { ids, records })
    }

    /// Parses a `{"games": [...]}` document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_slice(bytes).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Self::from_entries(file.games.into_iter().map(|entry| {
            (
                GameId(entry.id),
                GameRecord::new(
                    entry.url,
                    entry.title,
                    entry.description,
                    entry.width,
                    entry.height,
                ),
            )
        }))
    }

    pub fn builtin() -> Self {
        let mut ids = Vec::with_capacity(BUILTIN_GAMES.len());
        let mut records = HashMap::with_capacity(BUILTIN_GAMES.len());
        for game in BUILTIN_GAMES {
            let id = GameId::new(game.id);
            ids.push(id.clone());
            records.insert(
                id,
                GameRecord::new(game.url, game.title, game.description, game.width, game.height),
            );
        }
        Self { ids, records }
    }

    pub fn has(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&GameRecord> {
        self.records.get(id)
    }

    /// Keys in insertion order.
    pub fn list_ids(&self) -> &[GameId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GameId, &GameRecord)> {
        self.ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|record| (id, record)))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn validate_entry(position: usize, id: &GameId, record: &GameRecord) -> Result<(), CatalogError> {
    if id.0.is_empty() {
        return Err(CatalogError::EmptyId { position });
    }
    if record.default_width == 0 || record.default_height == 0 {
        return Err(CatalogError::InvalidDimensions {
            id: id.0.clone(),
            width: record.default_width,
            height: record.default_height,
        });
    }
    let url = record.target_url.as_str();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(CatalogError::InvalidUrl(id.0.clone()));
    }
    Ok(())
}

/// Raw request inputs. Values are kept as strings; interpretation happens in
/// [`Resolver::resolve`].
#[derive(Debug, Clone, Default)]
pub struct DisplayOverrides {
    pub id: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub fullscreen: Option<String>,
}

/// Builds overrides from raw key/value pairs. The first value of a repeated
/// key wins and unknown keys are ignored.
impl FromIterator<(String, String)> for DisplayOverrides {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut overrides = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "id" => &mut overrides.id,
                "width" => &mut overrides.width,
                "height" => &mut overrides.height,
                "fullscreen" => &mut overrides.fullscreen,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        overrides
    }
}

impl DisplayOverrides {
    /// A non-empty route id wins over the `id` override.
    pub fn requested_id<'a>(&'a self, route_id: Option<&'a str>) -> Option<&'a str> {
        route_id
            .filter(|id| !id.is_empty())
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedDisplayConfig {
    pub width: i64,
    pub height: i64,
    pub fullscreen: bool,
}

impl ResolvedDisplayConfig {
    pub fn derive(record: &GameRecord, overrides: &DisplayOverrides) -> Self {
        Self {
            width: parse_or_default(overrides.width.as_deref(), record.default_width),
            height: parse_or_default(overrides.height.as_deref(), record.default_height),
            fullscreen: overrides.fullscreen.as_deref() == Some("true"),
        }
    }
}

/// Leading base-10 integer or the default. Bad input is not an error. No range check.
fn parse_or_default(raw: Option<&str>, default: u32) -> i64 {
    raw.and_then(parse_leading_int)
        .unwrap_or_else(|| i64::from(default))
}

/// Optional sign then digits, after leading whitespace; trailing text is
/// ignored, so `"800px"` is 800 and `"12.5"` is 12. Overflow yields `None`.
fn parse_leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let sign = value.len() - unsigned.len();
    value[..sign + digits].parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGame<'a> {
    pub id: &'a GameId,
    pub record: &'a GameRecord,
    pub display: ResolvedDisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Resolution<'a> {
    Found(ResolvedGame<'a>),
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn found(self) -> Option<ResolvedGame<'a>> {
        match self {
            Resolution::Found(game) => Some(game),
            Resolution::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Resolution::NotFound)
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    store: Arc<GameStore>,
}

impl Resolver {
    pub fn new(store: Arc<GameStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    pub fn resolve(&self, id: &str, overrides: &DisplayOverrides) -> Resolution<'_> {
        if id.is_empty() {
            return Resolution::NotFound;
        }
        let Some((id, record)) = self.store.records.get_key_value(id) else {
            return Resolution::NotFound;
        };
        Resolution::Found(ResolvedGame {
            id,
            record,
            display: ResolvedDisplayConfig::derive(record, overrides),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolver() -> Resolver {
        Resolver::new(Arc::new(GameStore::builtin()))
    }

    fn overrides(width: Option<&str>, height: Option<&str>, fullscreen: Option<&str>) -> DisplayOverrides {
        DisplayOverrides {
            id: None,
            width: width.map(str::to_string),
            height: height.map(str::to_string),
            fullscreen: fullscreen.map(str::to_string),
        }
    }

    fn record(url: &str, width: u32, height: u32) -> GameRecord {
        GameRecord::new(url, "Title", "Description", width, height)
    }

    #[test]
    fn builtin_catalog_passes_validation() {
        let builtin = GameStore::builtin();
        let rebuilt = GameStore::from_entries(
            builtin.iter().map(|(id, record)| (id.clone(), record.clone())),
        )
        .unwrap();
        assert_eq!(rebuilt, builtin);
        assert_eq!(
            builtin.list_ids(),
            &[GameId::new("matching-game-1"), GameId::new("matching-game-test")]
        );
    }

    #[test]
    fn every_record_has_positive_defaults() {
        let store = GameStore::builtin();
        for id in store.list_ids() {
            let record = store.get(id.as_str()).unwrap();
            assert!(record.default_width > 0);
            assert!(record.default_height > 0);
        }
    }

    #[test]
    fn lookup_is_stable_and_absent_is_a_value() {
        let store = GameStore::builtin();
        assert_eq!(store.get("matching-game-1"), store.get("matching-game-1"));
        assert!(store.has("matching-game-1"));
        assert!(!store.has(""));
        assert!(!store.has("../etc/passwd?x=<script>"));
        assert_eq!(store.get("no-such-game"), None);
    }

    #[test]
    fn list_ids_has_no_duplicates() {
        let store = GameStore::builtin();
        let mut ids = store.list_ids().to_vec();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), store.len());
    }

    #[test]
    fn debug_output_hides_embed_url() {
        let store = GameStore::builtin();
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("wordwall.net"));
        assert!(rendered.contains("Matching Game 1"));
    }

    #[test]
    fn width_override_keeps_default_height() {
        let resolver = resolver();
        let resolved = resolver
            .resolve("matching-game-1", &overrides(Some("800"), None, None))
            .found()
            .unwrap();
        assert_eq!(resolved.display.width, 800);
        assert_eq!(resolved.display.height, 380);
        assert!(!resolved.display.fullscreen);
        assert_eq!(resolved.record.title, "Matching Game 1");
    }

    #[test]
    fn non_numeric_override_falls_back_to_default() {
        let resolver = resolver();
        let resolved = resolver
            .resolve("matching-game-1", &overrides(Some("abc"), Some(""), None))
            .found()
            .unwrap();
        assert_eq!(resolved.display.width, 500);
        assert_eq!(resolved.display.height, 380);
    }

    #[test]
    fn overrides_read_the_leading_integer() {
        let resolver = resolver();
        let resolved = resolver
            .resolve("matching-game-1", &overrides(Some("800px"), Some("12.5"), None))
            .found()
            .unwrap();
        assert_eq!(resolved.display.width, 800);
        assert_eq!(resolved.display.height, 12);

        let resolved = resolver
            .resolve("matching-game-1", &overrides(Some("  +64 wide"), Some("-"), None))
            .found()
            .unwrap();
        assert_eq!(resolved.display.width, 64);
        assert_eq!(resolved.display.height, 380);

        let resolved = resolver
            .resolve("matching-game-1", &overrides(Some("px800"), Some("99999999999999999999"), None))
            .found()
            .unwrap();
        assert_eq!(resolved.display.width, 500);
        assert_eq!(resolved.display.height, 380);
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let pairs = [
            ("width", "1"),
            ("width", "2"),
            ("fullscreen", "true"),
            ("fullscreen", "x"),
            ("id", "matching-game-1"),
            ("theme", "dark"),
        ];
        let overrides: DisplayOverrides = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(overrides.width.as_deref(), Some("1"));
        assert_eq!(overrides.fullscreen.as_deref(), Some("true"));
        assert_eq!(overrides.id.as_deref(), Some("matching-game-1"));
        assert_eq!(overrides.height, None);
    }

    #[test]
    fn negative_and_zero_overrides_pass_through() {
        let resolver = resolver();
        let resolved = resolver
            .resolve("matching-game-1", &overrides(Some("-20"), Some("0"), None))
            .found()
            .unwrap();
        assert_eq!(resolved.display.width, -20);
        assert_eq!(resolved.display.height, 0);
    }

    #[test]
    fn fullscreen_requires_exact_lowercase_true() {
        let resolver = resolver();
        for raw in ["TRUE", "True", "1", "yes", "", " true"] {
            let resolved = resolver
                .resolve("matching-game-1", &overrides(None, None, Some(raw)))
                .found()
                .unwrap();
            assert!(!resolved.display.fullscreen, "{raw:?} must not enable fullscreen");
        }
        let resolved = resolver
            .resolve("matching-game-1", &overrides(None, None, Some("true")))
            .found()
            .unwrap();
        assert!(resolved.display.fullscreen);
    }

    #[test]
    fn unknown_and_empty_ids_are_not_found() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("no-such-game", &DisplayOverrides::default()),
            Resolution::NotFound
        );
        assert!(resolver.resolve("", &DisplayOverrides::default()).is_not_found());
    }

    #[test]
    fn route_id_takes_precedence_over_query_id() {
        let query = DisplayOverrides {
            id: Some("matching-game-test".into()),
            ..DisplayOverrides::default()
        };
        assert_eq!(query.requested_id(Some("matching-game-1")), Some("matching-game-1"));
        assert_eq!(query.requested_id(Some("")), Some("matching-game-test"));
        assert_eq!(query.requested_id(None), Some("matching-game-test"));
        assert_eq!(DisplayOverrides::default().requested_id(None), None);
        let empty = DisplayOverrides {
            id: Some(String::new()),
            ..DisplayOverrides::default()
        };
        assert_eq!(empty.requested_id(None), None);
    }

    #[test]
    fn from_entries_rejects_bad_catalogs() {
        let dup = GameStore::from_entries(vec![
            (GameId::new("a"), record("https://example.com/a", 1, 1)),
            (GameId::new("a"), record("https://example.com/b", 1, 1)),
        ]);
        assert_eq!(dup.unwrap_err(), CatalogError::DuplicateId("a".into()));

        let empty = GameStore::from_entries(vec![(GameId::new(""), record("https://x.io", 1, 1))]);
        assert_eq!(empty.unwrap_err(), CatalogError::EmptyId { position: 0 });

        let zero = GameStore::from_entries(vec![(GameId::new("z"), record("https://x.io", 0, 10))]);
        assert!(matches!(zero, Err(CatalogError::InvalidDimensions { .. })));

        let url = GameStore::from_entries(vec![(GameId::new("u"), record("javascript:alert(1)", 1, 1))]);
        assert_eq!(url.unwrap_err(), CatalogError::InvalidUrl("u".into()));
    }

    #[test]
    fn from_json_keeps_document_order() {
        let json = br#"{"games": [
            {"id": "zeta", "url": "https://example.com/z", "title": "Zeta", "width": 640, "height": 480},
            {"id": "alpha", "url": "https://example.com/a", "title": "Alpha", "description": "first letter", "width": 320, "height": 240}
        ]}"#;
        let store = GameStore::from_json(json).unwrap();
        assert_eq!(store.list_ids(), &[GameId::new("zeta"), GameId::new("alpha")]);
        let alpha = store.get("alpha").unwrap();
        assert_eq!(alpha.embed_url(), "https://example.com/a");
        assert_eq!(alpha.description, "first letter");
        assert_eq!(store.get("zeta").unwrap().description, "");

        assert!(matches!(
            GameStore::from_json(b"{\"games\": 3}"),
            Err(CatalogError::Malformed(_))
        ));
    }

    proptest! {
        #[test]
        fn ids_outside_the_store_never_resolve(id in "\\PC*") {
            let resolver = resolver();
            prop_assume!(!resolver.store().list_ids().iter().any(|known| known.as_str() == id));
            prop_assert!(!resolver.store().has(&id));
            prop_assert!(resolver.resolve(&id, &DisplayOverrides::default()).is_not_found());
        }
    }
}
