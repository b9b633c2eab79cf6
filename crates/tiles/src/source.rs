use std::collections::BTreeMap;
use std::time::Duration;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use foundation::tile::TileId;
use scene::feature::Feature;

/// Decoded tile contents: features grouped by named source layer.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileData {
    pub layers: BTreeMap<String, Vec<Feature>>,
}

impl TileData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, name: impl Into<String>, features: Vec<Feature>) -> Self {
        self.layers.insert(name.into(), features);
        self
    }

    /// Fold another source's result into this one, layer-wise. Callers merge
    /// in source registration order so overlay features draw after base
    /// features within a layer.
    pub fn merge(&mut self, other: TileData) {
        for (layer, features) in other.layers {
            self.layers.entry(layer).or_default().extend(features);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    NotFound,
    Transport(String),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound => write!(f, "tile not available"),
            FetchError::Transport(e) => write!(f, "transport failure: {e}"),
            FetchError::Decode(e) => write!(f, "payload decode failure: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Completion message for one `(tile, source)` fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub id: TileId,
    pub source: usize,
    pub result: Result<TileData, FetchError>,
}

/// A tile provider.
///
/// `start_fetch` must not block the calling (frame) thread; I/O happens on
/// the implementation's own thread and exactly one `FetchResult` is sent
/// back per call. The channel is the only cross-thread handoff: sources
/// never see the cache.
pub trait DataSource: Send {
    fn name(&self) -> &str;
    fn start_fetch(&self, id: TileId, source_index: usize, reply: Sender<FetchResult>);
}

/// In-memory source for tests and the headless demo. Replies synchronously;
/// the result still travels through the channel like any other source's.
#[derive(Debug, Default, Clone)]
pub struct FixtureSource {
    name: String,
    tiles: BTreeMap<TileId, TileData>,
}

impl FixtureSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tiles: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, id: TileId, data: TileData) {
        self.tiles.insert(id, data);
    }
}

impl DataSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_fetch(&self, id: TileId, source_index: usize, reply: Sender<FetchResult>) {
        let result = match self.tiles.get(&id) {
            Some(data) => Ok(data.clone()),
            None => Err(FetchError::NotFound),
        };
        let _ = reply.send(FetchResult {
            id,
            source: source_index,
            result,
        });
    }
}

/// Fetches JSON tile payloads over HTTP from a `{z}/{x}/{y}` URL template,
/// one spawned thread per fetch.
pub struct HttpSource {
    name: String,
    url_template: String,
    agent: ureq::Agent,
}

impl HttpSource {
    /// `url_template` contains `{z}`, `{x}` and `{y}` placeholders.
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(5))
            .build();
        Self {
            name: name.into(),
            url_template: url_template.into(),
            agent,
        }
    }

    fn url_for(&self, id: TileId) -> String {
        self.url_template
            .replace("{z}", &id.z.to_string())
            .replace("{x}", &id.x.to_string())
            .replace("{y}", &id.y.to_string())
    }
}

impl DataSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_fetch(&self, id: TileId, source_index: usize, reply: Sender<FetchResult>) {
        let url = self.url_for(id);
        let agent = self.agent.clone();
        std::thread::spawn(move || {
            let result = match agent.get(&url).call() {
                Ok(response) => match response.into_string() {
                    Ok(body) => serde_json::from_str::<TileData>(&body)
                        .map_err(|e| FetchError::Decode(e.to_string())),
                    Err(e) => Err(FetchError::Transport(e.to_string())),
                },
                Err(ureq::Error::Status(404, _)) => Err(FetchError::NotFound),
                Err(e) => Err(FetchError::Transport(e.to_string())),
            };
            let _ = reply.send(FetchResult {
                id,
                source: source_index,
                result,
            });
        });
    }
}
