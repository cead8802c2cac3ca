use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

pub const MAX_LIMIT: u64 = 100;
pub const DEFAULT_LIMIT: u64 = 20;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thumbnail {
    pub path: String,
    pub extension: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail: Thumbnail,
}

impl Character {
    pub fn new(id: u64, name: &str, description: Option<&str>) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            thumbnail: Thumbnail {
                path: format!("http://i.annihil.us/u/prod/marvel/i/mg/{id}"),
                extension: "jpg".to_string(),
            },
        }
    }
}

#[derive(Deserialize)]
pub struct CharacterParams {
    pub apikey: Option<String>,
    pub ts: Option<String>,
    pub hash: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    #[serde(rename = "nameStartsWith")]
    pub name_starts_with: Option<String>,
}

/// Keys the catalog accepts and the roster it serves.
#[derive(Clone, Debug)]
pub struct MockCatalog {
    pub public_key: String,
    pub private_key: String,
    pub characters: Arc<Vec<Character>>,
}

impl MockCatalog {
    pub fn new(public_key: &str, private_key: &str, characters: Vec<Character>) -> Self {
        Self {
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
            characters: Arc::new(characters),
        }
    }

    pub fn seeded(public_key: &str, private_key: &str) -> Self {
        Self::new(public_key, private_key, roster())
    }

    fn expected_hash(&self, ts: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(ts.as_bytes());
        hasher.update(self.private_key.as_bytes());
        hasher.update(self.public_key.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Twenty-four well-known characters, ordered by name.
pub fn roster() -> Vec<Character> {
    let mut characters = vec![
        Character::new(1009144, "A.I.M.", Some("AIM is a terrorist organization.")),
        Character::new(1009165, "Avengers", Some("Earth's Mightiest Heroes.")),
        Character::new(1009175, "Beast", None),
        Character::new(1009184, "Black Panther", Some("King of Wakanda.")),
        Character::new(1009189, "Black Widow", Some("Natasha Romanoff.")),
        Character::new(1009220, "Captain America", Some("Steve Rogers.")),
        Character::new(1009257, "Cyclops", None),
        Character::new(1009262, "Daredevil", Some("The man without fear.")),
        Character::new(1009268, "Deadpool", Some("")),
        Character::new(1009282, "Doctor Strange", Some("Sorcerer Supreme.")),
        Character::new(1009297, "Falcon", None),
        Character::new(1009313, "Gambit", None),
        Character::new(1009351, "Hulk", Some("Bruce Banner.")),
        Character::new(1009368, "Iron Man", Some("Tony Stark.")),
        Character::new(1009417, "Magneto", None),
        Character::new(1009504, "Professor X", None),
        Character::new(1009515, "Punisher", None),
        Character::new(1009562, "Scarlet Witch", None),
        Character::new(1009608, "Spider-Girl (May Parker)", None),
        Character::new(1009610, "Spider-Man", Some("Peter Parker.")),
        Character::new(1009609, "Spider-Woman (Jessica Drew)", None),
        Character::new(1009629, "Storm", Some("Ororo Munroe.")),
        Character::new(1009664, "Thor", Some("God of Thunder.")),
        Character::new(1009718, "Wolverine", Some("Logan.")),
    ];
    characters.sort_by(|a, b| a.name.cmp(&b.name));
    characters
}

pub fn app(catalog: MockCatalog) -> Router {
    Router::new()
        .route("/v1/public/characters", get(list_characters))
        .with_state(catalog)
}

pub async fn run(listener: TcpListener, catalog: MockCatalog) -> Result<(), std::io::Error> {
    axum::serve(listener, app(catalog)).await
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "code": code, "message": message })))
}

async fn list_characters(
    State(catalog): State<MockCatalog>,
    Query(params): Query<CharacterParams>,
) -> ApiResult {
    authorize(&catalog, &params)?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        return Err(reject(
            StatusCode::CONFLICT,
            "InvalidLimit",
            "You must pass an integer limit greater than 0.",
        ));
    }
    if limit > MAX_LIMIT {
        return Err(reject(
            StatusCode::CONFLICT,
            "InvalidLimit",
            "You may not request more than 100 items.",
        ));
    }
    let offset = params.offset.unwrap_or(0);

    let prefix = params
        .name_starts_with
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    let matching: Vec<&Character> = catalog
        .characters
        .iter()
        .filter(|c| c.name.to_lowercase().starts_with(&prefix))
        .collect();
    let results: Vec<&Character> = matching
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .copied()
        .collect();
    debug!(offset, limit, total = matching.len(), "serving characters");

    Ok(Json(json!({
        "code": 200,
        "status": "Ok",
        "data": {
            "offset": offset,
            "limit": limit,
            "total": matching.len(),
            "count": results.len(),
            "results": results,
        }
    })))
}

fn authorize(
    catalog: &MockCatalog,
    params: &CharacterParams,
) -> Result<(), (StatusCode, Json<Value>)> {
    let (Some(apikey), Some(ts), Some(hash)) = (&params.apikey, &params.ts, &params.hash) else {
        let missing = if params.apikey.is_none() {
            "You must provide a user key."
        } else if params.ts.is_none() {
            "You must provide a timestamp."
        } else {
            "You must provide a hash."
        };
        return Err(reject(StatusCode::CONFLICT, "MissingParameter", missing));
    };

    if *apikey != catalog.public_key || *hash != catalog.expected_hash(ts) {
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            "InvalidCredentials",
            "That hash, timestamp and key combination is invalid.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_is_sorted_and_unique() {
        let characters = roster();
        assert_eq!(characters.len(), 24);
        assert!(characters.windows(2).all(|w| w[0].name <= w[1].name));
        let mut ids: Vec<u64> = characters.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 24);
    }

    #[test]
    fn expected_hash_matches_provider_documentation() {
        let catalog = MockCatalog::new("1234", "abcd", Vec::new());
        assert_eq!(catalog.expected_hash("1"), "ffd275c5130566a2916217b101f26150");
    }

    #[test]
    fn character_serializes_thumbnail_parts() {
        let json = serde_json::to_value(Character::new(7, "Hulk", None)).unwrap();
        assert_eq!(json["thumbnail"]["extension"], "jpg");
        assert!(json["description"].is_null());
    }
}
