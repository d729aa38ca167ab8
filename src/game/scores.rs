use crate::game::judgment::Accuracy;
use chrono::{DateTime, Local};
use log::info;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

/// End-of-session report handed to the UI layer.
#[derive(Clone, Debug)]
pub struct SessionSummary {
    pub song_id: String,
    pub score: u32,
    pub max_combo: u32,
    pub counts: HashMap<Accuracy, u32>,
    pub played_at: DateTime<Local>,
}

impl SessionSummary {
    pub fn count(&self, accuracy: Accuracy) -> u32 {
        self.counts.get(&accuracy).copied().unwrap_or(0)
    }

    pub fn judged_notes(&self) -> u32 {
        self.counts.values().sum()
    }
}

// Process-lifetime best scores per song; nothing is persisted across runs.
static BEST_SCORES: Lazy<Mutex<HashMap<String, u32>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub fn best_score(song_id: &str) -> Option<u32> {
    BEST_SCORES.lock().unwrap().get(song_id).copied()
}

/// Records a finished score; returns true when it sets a new best.
pub fn record_score(song_id: &str, score: u32) -> bool {
    let mut scores = BEST_SCORES.lock().unwrap();
    match scores.get(song_id) {
        Some(&best) if score <= best => false,
        _ => {
            info!("New best for '{}': {}", song_id, score);
            scores.insert(song_id.to_string(), score);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_score_only_improves() {
        let song = "scores-test-song";
        assert_eq!(best_score(song), None);
        assert!(record_score(song, 1200));
        assert!(!record_score(song, 900));
        assert_eq!(best_score(song), Some(1200));
        assert!(record_score(song, 2500));
        assert_eq!(best_score(song), Some(2500));
    }

    #[test]
    fn summary_counts_default_to_zero() {
        let summary = SessionSummary {
            song_id: "x".to_string(),
            score: 600,
            max_combo: 2,
            counts: HashMap::from_iter([(Accuracy::Perfect, 2)]),
            played_at: Local::now(),
        };
        assert_eq!(summary.count(Accuracy::Perfect), 2);
        assert_eq!(summary.count(Accuracy::Miss), 0);
        assert_eq!(summary.judged_notes(), 2);
    }
}
