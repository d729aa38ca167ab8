use crate::config::{LANE_COUNT, LEAD_IN_BEATS, TRAIL_BEATS};
use crate::core::input::Lane;
use crate::game::analysis::BandLevels;
use crate::game::note::{ChartNote, NoteKind};
use crate::game::song::SongCatalog;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::fmt;

// Probability knobs for the hard-only sixteenth-note runs.
const SIXTEENTH_RUN_CHANCE: f64 = 0.3;
const SIXTEENTH_NOTE_CHANCE: f64 = 0.4;
const SUB_BEAT_FREQUENCY_SCALE: f64 = 0.6;
const BAND_BIAS_CHANCE: f64 = 0.7;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Unknown labels fall back to Normal; never an error.
    pub fn from_label_or_default(label: &str) -> Self {
        Difficulty::from_label(label).unwrap_or_else(|| {
            warn!("Unknown difficulty '{}', falling back to normal.", label);
            Difficulty::Normal
        })
    }

    pub const fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                note_frequency: 0.6,
                simultaneous_note_probability: 0.1,
                hold_note_probability: 0.05,
            },
            Difficulty::Normal => DifficultyProfile {
                note_frequency: 0.8,
                simultaneous_note_probability: 0.2,
                hold_note_probability: 0.1,
            },
            Difficulty::Hard => DifficultyProfile {
                note_frequency: 1.0,
                simultaneous_note_probability: 0.4,
                hold_note_probability: 0.2,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Normal => write!(f, "normal"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Static per-difficulty tuning, shared by value; never mutated at runtime.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DifficultyProfile {
    pub note_frequency: f64,
    pub simultaneous_note_probability: f64,
    pub hold_note_probability: f64,
}

/// Procedural note placement from BPM and difficulty. The RNG is seeded at
/// construction so a given (bpm, difficulty, seed) always yields the same
/// chart.
pub struct ChartGenerator {
    bpm: f32,
    beat_interval_ms: f32,
    difficulty: Difficulty,
    rng: StdRng,
}

impl ChartGenerator {
    pub fn new(bpm: f32, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            bpm,
            beat_interval_ms: 60_000.0 / bpm,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm;
        self.beat_interval_ms = 60_000.0 / bpm;
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Beat-grid chart for `duration_ms` of play, sorted ascending by time.
    pub fn generate(&mut self, duration_ms: f32) -> Vec<ChartNote> {
        let notes = generate_notes(
            &mut self.rng,
            self.beat_interval_ms,
            self.difficulty,
            duration_ms,
        );
        info!(
            "Generated {} notes ({} difficulty, {:.0} BPM, {:.0}ms).",
            notes.len(),
            self.difficulty,
            self.bpm,
            duration_ms
        );
        notes
    }

    /// Basic chart plus a lane bias from per-band energy estimates: notes land
    /// on the upper lanes where highs dominate and the lower lanes where lows
    /// dominate, each reassignment applied with 70% probability. Biased notes
    /// are retagged so renderers can tell them apart; judgment is unaffected.
    pub fn generate_advanced(
        &mut self,
        duration_ms: f32,
        band_frames: &[BandLevels],
    ) -> Vec<ChartNote> {
        let mut notes = self.generate(duration_ms);
        if band_frames.is_empty() || duration_ms <= 0.0 {
            return notes;
        }

        for note in &mut notes {
            let frame_index =
                ((note.time_ms / duration_ms) * band_frames.len() as f32) as usize;
            let Some(bands) = band_frames.get(frame_index) else {
                continue;
            };

            if bands.high > bands.low {
                if note.lane.index() < 2 && self.rng.random_bool(BAND_BIAS_CHANCE) {
                    note.lane = Lane::ALL[note.lane.index() + 2];
                    note.kind = NoteKind::Melody;
                }
            } else if bands.low > bands.high
                && note.lane.index() > 1
                && self.rng.random_bool(BAND_BIAS_CHANCE)
            {
                note.lane = Lane::ALL[note.lane.index() - 2];
                note.kind = NoteKind::Beat;
            }
        }
        notes
    }

    /// Applies the catalog's per-song difficulty override (when one exists)
    /// before generating. A configuration lookup, not a distinct algorithm.
    pub fn generate_for_song(
        &mut self,
        song_id: &str,
        catalog: &SongCatalog,
        duration_ms: f32,
    ) -> Vec<ChartNote> {
        if let Some(chart_override) = catalog.chart_override(song_id) {
            info!(
                "Using chart override for '{}': {} difficulty.",
                song_id, chart_override.difficulty
            );
            self.difficulty = chart_override.difficulty;
        }
        self.generate(duration_ms)
    }
}

/// Core placement loop, generic over the RNG so tests can force outcomes.
///
/// Beats run from LEAD_IN_BEATS up to total - TRAIL_BEATS, reserving opening
/// and closing silence. Each beat may carry a main note, a simultaneous
/// second note on a different lane, an eighth-note on even beats, and (hard
/// only) a sixteenth-note run.
pub fn generate_notes<R: Rng>(
    rng: &mut R,
    beat_interval_ms: f32,
    difficulty: Difficulty,
    duration_ms: f32,
) -> Vec<ChartNote> {
    let profile = difficulty.profile();
    let mut notes = Vec::new();
    if duration_ms <= 0.0 || beat_interval_ms <= 0.0 {
        return notes;
    }

    let total_beats = (duration_ms / beat_interval_ms) as u64;
    for beat in LEAD_IN_BEATS..total_beats.saturating_sub(TRAIL_BEATS) {
        let time_ms = beat as f32 * beat_interval_ms;

        if rng.random_bool(profile.note_frequency) {
            let lane = random_lane(rng);
            notes.push(ChartNote::new(lane, time_ms));

            if rng.random_bool(profile.simultaneous_note_probability) {
                notes.push(ChartNote::new(other_lane(rng, lane), time_ms));
            }
        }

        // Eighth-note subdivision on even beats.
        if beat % 2 == 0
            && rng.random_bool(profile.note_frequency * SUB_BEAT_FREQUENCY_SCALE)
        {
            let time_ms = time_ms + beat_interval_ms / 2.0;
            notes.push(ChartNote::new(random_lane(rng), time_ms));
        }

        // Sixteenth-note runs only show up on hard.
        if difficulty == Difficulty::Hard && rng.random_bool(SIXTEENTH_RUN_CHANCE) {
            for sixteenth in 1..4 {
                if rng.random_bool(SIXTEENTH_NOTE_CHANCE) {
                    let time_ms = time_ms + (beat_interval_ms / 4.0) * sixteenth as f32;
                    notes.push(ChartNote::new(random_lane(rng), time_ms));
                }
            }
        }
    }

    // Stable sort keeps same-time notes in emission order.
    notes.sort_by(|a, b| {
        a.time_ms
            .partial_cmp(&b.time_ms)
            .unwrap_or(Ordering::Equal)
    });
    notes
}

#[inline]
fn random_lane<R: Rng>(rng: &mut R) -> Lane {
    Lane::ALL[rng.random_range(0..LANE_COUNT)]
}

/// A lane guaranteed different from `taken`, uniform over the other three.
#[inline]
fn other_lane<R: Rng>(rng: &mut R, taken: Lane) -> Lane {
    Lane::ALL[(taken.index() + 1 + rng.random_range(0..LANE_COUNT - 1)) % LANE_COUNT]
}
