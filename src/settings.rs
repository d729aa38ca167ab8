use crate::game::chart::Difficulty;
use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const SETTINGS_DIR: &str = "save";
const SETTINGS_INI_PATH: &str = "save/settings.ini";

#[derive(Debug, Clone)]
pub struct Settings {
    pub display_name: String,
    pub difficulty: Difficulty,
    pub master_volume: f32,
    pub show_particles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_name: "Player 1".to_string(),
            difficulty: Difficulty::Normal,
            master_volume: 0.7,
            show_particles: true,
        }
    }
}

// Global static for the loaded settings.
static SETTINGS: Lazy<Mutex<Settings>> = Lazy::new(|| Mutex::new(Settings::default()));

/// Creates the settings directory and a default .ini if none exists.
fn create_default_files() -> Result<(), std::io::Error> {
    info!(
        "Settings file not found, creating defaults in '{}'.",
        SETTINGS_DIR
    );
    fs::create_dir_all(SETTINGS_DIR)?;

    if !Path::new(SETTINGS_INI_PATH).exists() {
        let mut conf = Ini::new();
        conf.set("player", "DisplayName", Some("Player 1".to_string()));
        conf.set("gameplay", "Difficulty", Some("normal".to_string()));
        conf.set("gameplay", "ShowParticles", Some("1".to_string()));
        conf.set("audio", "MasterVolume", Some("0.7".to_string()));
        conf.write(SETTINGS_INI_PATH)?;
    }

    Ok(())
}

pub fn load() {
    if !Path::new(SETTINGS_INI_PATH).exists() {
        if let Err(e) = create_default_files() {
            warn!("Failed to create default settings: {}", e);
            // Proceed with default struct values.
            return;
        }
    }

    let mut settings = SETTINGS.lock().unwrap();
    let defaults = Settings::default();

    let mut conf = Ini::new();
    if conf.load(SETTINGS_INI_PATH).is_ok() {
        settings.display_name = conf
            .get("player", "DisplayName")
            .unwrap_or(defaults.display_name);
        settings.difficulty = conf
            .get("gameplay", "Difficulty")
            .map_or(defaults.difficulty, |label| {
                Difficulty::from_label_or_default(&label)
            });
        settings.show_particles = conf
            .get("gameplay", "ShowParticles")
            .and_then(|v| v.parse::<u8>().ok())
            .map_or(defaults.show_particles, |v| v != 0);
        settings.master_volume = conf
            .get("audio", "MasterVolume")
            .and_then(|v| v.parse::<f32>().ok())
            .map_or(defaults.master_volume, |v| v.clamp(0.0, 1.0));
    } else {
        warn!("Failed to load '{}', using defaults.", SETTINGS_INI_PATH);
    }
}

/// Returns a copy of the currently loaded settings.
pub fn get() -> Settings {
    SETTINGS.lock().unwrap().clone()
}
