use crate::game::chart::Difficulty;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Catalog entry for one playable track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongInfo {
    pub name: String,
    pub artist: String,
    pub filename: String,
    pub bpm: f32,
    /// Difficulty label; unknown labels resolve to normal at session start.
    pub difficulty: String,
    pub duration_ms: f32,
    #[serde(default)]
    pub description: String,
}

/// Hand-tuned generation hints for a specific song. Only the difficulty
/// override feeds the generator; the beat lists are kept for renderers and
/// future tuning, matching the original data shape.
#[derive(Clone, Debug)]
pub struct ChartOverride {
    pub emphasis_beats: Vec<u32>,
    pub rest_beats: Vec<u32>,
    pub difficulty: Difficulty,
}

/// Owned song table with a current selection. Sessions read it once at
/// start; nothing here is global state.
pub struct SongCatalog {
    songs: BTreeMap<String, SongInfo>,
    overrides: HashMap<String, ChartOverride>,
    selected: Option<String>,
}

impl Default for SongCatalog {
    fn default() -> Self {
        let mut songs = BTreeMap::new();
        songs.insert(
            "song01".to_string(),
            SongInfo {
                name: "Workout Anthem".to_string(),
                artist: "House Band".to_string(),
                filename: "song01.mp3".to_string(),
                bpm: 120.0,
                difficulty: "Normal".to_string(),
                duration_ms: 180_000.0,
                description: "Steady four-on-the-floor opener.".to_string(),
            },
        );
        songs.insert(
            "song02".to_string(),
            SongInfo {
                name: "Chance Encounter".to_string(),
                artist: "House Band".to_string(),
                filename: "song02.mp3".to_string(),
                bpm: 140.0,
                difficulty: "Hard".to_string(),
                duration_ms: 200_000.0,
                description: "Faster closer with dense runs.".to_string(),
            },
        );

        let mut overrides = HashMap::new();
        overrides.insert(
            "song01".to_string(),
            ChartOverride {
                emphasis_beats: vec![4, 8, 12, 16],
                rest_beats: vec![32, 48],
                difficulty: Difficulty::Normal,
            },
        );
        overrides.insert(
            "song02".to_string(),
            ChartOverride {
                emphasis_beats: vec![2, 6, 10, 14],
                rest_beats: vec![24, 40],
                difficulty: Difficulty::Hard,
            },
        );

        Self {
            songs,
            overrides,
            selected: Some("song01".to_string()),
        }
    }
}

impl SongCatalog {
    /// Catalog from a JSON map of id -> song info; the first id (sorted)
    /// becomes the selection.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let songs: BTreeMap<String, SongInfo> = serde_json::from_str(json)?;
        let selected = songs.keys().next().cloned();
        Ok(Self {
            songs,
            overrides: HashMap::new(),
            selected,
        })
    }

    pub fn selected_song(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn song_info(&self, song_id: &str) -> Option<&SongInfo> {
        self.songs.get(song_id)
    }

    pub fn all_songs(&self) -> impl Iterator<Item = (&String, &SongInfo)> {
        self.songs.iter()
    }

    pub fn chart_override(&self, song_id: &str) -> Option<&ChartOverride> {
        self.overrides.get(song_id)
    }

    pub fn select(&mut self, song_id: &str) -> bool {
        if let Some(song) = self.songs.get(song_id) {
            info!("Selected song: {}", song.name);
            self.selected = Some(song_id.to_string());
            true
        } else {
            warn!("Cannot select unknown song '{}'.", song_id);
            false
        }
    }

    pub fn add_song(&mut self, song_id: &str, info: SongInfo) {
        info!("Added song '{}' ({}).", song_id, info.name);
        self.songs.insert(song_id.to_string(), info);
        if self.selected.is_none() {
            self.selected = Some(song_id.to_string());
        }
    }

    pub fn set_chart_override(&mut self, song_id: &str, chart_override: ChartOverride) {
        self.overrides.insert(song_id.to_string(), chart_override);
    }

    /// Removes a song; a removed selection falls back to any remaining song.
    pub fn remove_song(&mut self, song_id: &str) -> bool {
        if self.songs.remove(song_id).is_none() {
            return false;
        }
        self.overrides.remove(song_id);
        if self.selected.as_deref() == Some(song_id) {
            self.selected = self.songs.keys().next().cloned();
        }
        info!("Removed song '{}'.", song_id);
        true
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
