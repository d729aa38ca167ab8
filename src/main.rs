use chrono::Local;
use log::{LevelFilter, info, warn};
use notefall::config::STEP_MS;
use notefall::core::audio::{AudioBackend, NullAudio};
use notefall::core::clock::{SystemClock, TimeSource};
use notefall::core::input::{InputSource, Lane};
use notefall::core::render::{NullRenderer, Renderer};
use notefall::game::analysis::BeatDetector;
use notefall::game::chart::{ChartGenerator, Difficulty};
use notefall::game::judgment::Accuracy;
use notefall::game::scores;
use notefall::game::session;
use notefall::game::song::SongCatalog;
use notefall::settings;
use std::error::Error;

// Demo sessions are capped so a full catalog track doesn't take minutes.
const DEMO_DURATION_MS: f32 = 30_000.0;

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("notefall::game::chart", LevelFilter::Debug)
        .init();

    info!("notefall starting...");
    settings::load();
    let settings = settings::get();
    info!("Playing as '{}'.", settings.display_name);

    // --- Song selection ---
    let catalog = SongCatalog::default();
    if catalog.is_empty() {
        return Err("song catalog is empty".into());
    }
    info!("Catalog has {} songs:", catalog.len());
    for (id, song) in catalog.all_songs() {
        info!("  [{}] {} - {} ({:.0} BPM)", id, song.artist, song.name, song.bpm);
    }

    let song_id = catalog
        .selected_song()
        .ok_or("no song selected")?
        .to_string();
    let song = catalog
        .song_info(&song_id)
        .ok_or("selected song missing from catalog")?
        .clone();
    info!(
        "Selected '{}' by {} ({:.0} BPM, {}).",
        song.name, song.artist, song.bpm, song.difficulty
    );

    // --- Chart generation ---
    let seed = Local::now().timestamp_millis() as u64;
    let mut generator = ChartGenerator::new(
        song.bpm,
        Difficulty::from_label_or_default(&song.difficulty),
        seed,
    );
    let duration_ms = song.duration_ms.min(DEMO_DURATION_MS);
    let chart = generator.generate_for_song(&song_id, &catalog, duration_ms);

    // --- Audio (soundless fallback; never gates the note schedule) ---
    let mut audio = NullAudio::new();
    audio.set_volume(settings.master_volume);
    if let Err(e) = audio.rewind() {
        warn!("Audio rewind failed: {}", e);
    }
    if let Err(e) = audio.play() {
        warn!("Audio playback failed, continuing soundless: {}", e);
    }
    if audio.is_playing() {
        info!("Background track playing.");
    }

    // --- Session: autoplay every note at its chart time ---
    let mut state = session::init(&song_id, chart.clone(), seed);
    let mut renderer = NullRenderer;
    let detector = BeatDetector::new();
    let clock = SystemClock::new();
    let mut spectrum = [0u8; 64];
    let mut beats_seen = 0u32;
    let mut peak_visible = 0usize;

    let mut events: Vec<(f64, Lane, bool)> = chart
        .iter()
        .flat_map(|note| {
            [
                (note.time_ms as f64, note.lane, true),
                (note.time_ms as f64 + 40.0, note.lane, false),
            ]
        })
        .collect();
    events.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut next_event = 0;
    while !session::is_complete(&state) {
        while next_event < events.len() && events[next_event].0 <= state.elapsed_ms + STEP_MS {
            let (_, lane, pressed) = events[next_event];
            session::queue_input_edge(&mut state, InputSource::Keyboard, lane, pressed);
            next_event += 1;
        }

        session::advance(&mut state, STEP_MS);

        let view = session::frame_view(&state);
        peak_visible = peak_visible.max(view.visible_notes().count());
        renderer.draw_frame(&view);

        // Cosmetic only: the note schedule never waits on spectrum data.
        if audio.spectrum(&mut spectrum) && detector.detect_beat(&spectrum) {
            beats_seen += 1;
        }
    }

    if let Err(e) = audio.pause() {
        warn!("Audio pause failed: {}", e);
    }

    // --- Results ---
    let summary = session::finish(&mut state);
    info!(
        "Result for '{}': score {}, max combo {}, {} notes judged ({}/{}/{}/{} perfect/great/good/miss).",
        song.name,
        summary.score,
        summary.max_combo,
        summary.judged_notes(),
        summary.count(Accuracy::Perfect),
        summary.count(Accuracy::Great),
        summary.count(Accuracy::Good),
        summary.count(Accuracy::Miss),
    );
    info!(
        "Peak of {} notes on screen, {} beats detected, {:.1}s simulated in {:.0}ms of wall time.",
        peak_visible,
        beats_seen,
        state.elapsed_ms / 1000.0,
        clock.now_ms()
    );
    if let Some(best) = scores::best_score(&song_id) {
        info!("Best for '{}' this run: {}.", song_id, best);
    }

    info!("notefall exited gracefully.");
    Ok(())
}
