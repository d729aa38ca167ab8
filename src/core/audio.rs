use log::info;
use std::error::Error;

/// Abstraction over audio playback. The session only ever reads spectrum
/// data for cosmetic feedback; judgment timing never depends on it, so a
/// backend that fails to play leaves the note schedule untouched.
pub trait AudioBackend {
    fn play(&mut self) -> Result<(), Box<dyn Error>>;
    fn pause(&mut self) -> Result<(), Box<dyn Error>>;

    /// Seek back to the start of the track.
    fn rewind(&mut self) -> Result<(), Box<dyn Error>>;

    fn set_volume(&mut self, volume: f32);

    /// Fill `bins` with the current frequency spectrum, one byte per FFT bin.
    /// Returns false when no analyser is available; `bins` is left untouched.
    fn spectrum(&mut self, bins: &mut [u8]) -> bool;
}

/// Fallback backend for headless runs or blocked audio: every operation
/// succeeds silently and no spectrum is reported.
pub struct NullAudio {
    playing: bool,
}

impl NullAudio {
    pub fn new() -> Self {
        info!("No audio backend wired; session will run soundless.");
        Self { playing: false }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Default for NullAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for NullAudio {
    fn play(&mut self) -> Result<(), Box<dyn Error>> {
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), Box<dyn Error>> {
        self.playing = false;
        Ok(())
    }

    fn rewind(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn spectrum(&mut self, _bins: &mut [u8]) -> bool {
        false
    }
}
