//! Track catalog.
//!
//! Static track data: layouts, scenery palettes, and colours. Ships with the
//! two stock tracks; custom catalogs load from JSON.

use serde::{Deserialize, Serialize};

use crate::track::TrackDirective;

/// Trackside decoration for a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneryConfig {
    /// Chance per segment of placing a left/right pair.
    pub frequency: f64,
    /// Sprite ids picked from uniformly.
    pub objects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "segments")]
    pub directives: Vec<TrackDirective>,
    pub scenery: SceneryConfig,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_fog")]
    pub fog_color: String,
}

fn default_background() -> String {
    "#87CEEB".to_string()
}

fn default_fog() -> String {
    "#000000".to_string()
}

/// Ordered list of tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCatalog {
    pub tracks: Vec<TrackDefinition>,
}

impl TrackCatalog {
    /// Parses a catalog from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn get(&self, index: usize) -> Option<&TrackDefinition> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The stock tracks.
    pub fn builtin() -> Self {
        use TrackDirective::{Curve, Hill, Straight};

        let countryside = TrackDefinition {
            name: "Countryside Sprint".to_string(),
            description: "A scenic route through rolling hills".to_string(),
            directives: vec![
                Straight { length: 50 },
                Curve { length: 50, curve: 1.0 },
                Hill { length: 30, height: 100.0 },
                Curve { length: 50, curve: -1.0 },
                Straight { length: 30 },
                Curve { length: 25, curve: 2.0 },
                Straight { length: 50 },
                Curve { length: 50, curve: -2.0 },
                Straight { length: 30 },
                Hill { length: 20, height: -50.0 },
            ],
            scenery: SceneryConfig {
                frequency: 0.2,
                objects: vec!["tree".to_string(), "mountain".to_string()],
            },
            background_color: "#87CEEB".to_string(),
            fog_color: "#FFFFFF".to_string(),
        };

        let city = TrackDefinition {
            name: "City Nights".to_string(),
            description: "Navigate through neon-lit streets".to_string(),
            directives: vec![
                Straight { length: 30 },
                Curve { length: 25, curve: -1.0 },
                Straight { length: 40 },
                Curve { length: 50, curve: 1.0 },
                Straight { length: 30 },
                Curve { length: 25, curve: -2.0 },
                Straight { length: 40 },
                Curve { length: 25, curve: 2.0 },
                Straight { length: 40 },
                Curve { length: 25, curve: -1.0 },
            ],
            scenery: SceneryConfig {
                frequency: 0.3,
                objects: vec!["building".to_string()],
            },
            background_color: "#1a1a1a".to_string(),
            fog_color: "#000000".to_string(),
        };

        Self {
            tracks: vec![countryside, city],
        }
    }
}

impl Default for TrackCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
