use crate::config::{
    COMBO_BONUS_PER_HIT, HIT_TOLERANCE, HIT_ZONE_Y, LANE_COUNT, LANE_X, LEAD_TIME_MS,
    NOTE_SPEED, SESSION_LOG_INTERVAL_MS, STEP_MS,
};
use crate::core::input::{InputEdge, InputSource, Lane};
use crate::core::render::FrameView;
use crate::game::judgment::{self, Accuracy, Judgment};
use crate::game::note::{ChartNote, RuntimeNote};
use crate::game::particles::{self, Particle};
use crate::game::scores::{self, SessionSummary};
use chrono::Local;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, VecDeque};

// Frame deltas above this are clamped so a stall cannot spiral the
// fixed-step accumulator.
const MAX_FRAME_DELTA_MS: f64 = 250.0;

/// All mutable state for one play-through. Created by `init`, owned by the
/// loop driver, replaced wholesale when the next session starts.
pub struct State {
    pub song_id: String,
    pub notes: Vec<RuntimeNote>,

    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub counts: HashMap<Accuracy, u32>,

    /// Simulated milliseconds since session start; only ever grows.
    pub elapsed_ms: f64,
    pub playing: bool,
    pub particles: Vec<Particle>,
    pub last_judgment: Option<Judgment>,

    chart_end_ms: f64,
    keyboard_lane_state: [bool; LANE_COUNT],
    gamepad_lane_state: [bool; LANE_COUNT],
    pending_edges: VecDeque<InputEdge>,
    step_accumulator_ms: f64,
    log_timer_ms: f64,
    rng: StdRng,
}

pub fn init(song_id: &str, chart: Vec<ChartNote>, seed: u64) -> State {
    let pass_window_ms = (HIT_TOLERANCE / NOTE_SPEED * 1000.0) as f64;
    let chart_end_ms = chart
        .last()
        .map_or(0.0, |note| note.time_ms as f64 + pass_window_ms + STEP_MS);

    info!(
        "Starting session for '{}' with {} notes.",
        song_id,
        chart.len()
    );

    State {
        song_id: song_id.to_string(),
        notes: chart.into_iter().map(RuntimeNote::new).collect(),
        score: 0,
        combo: 0,
        max_combo: 0,
        counts: HashMap::from_iter([
            (Accuracy::Perfect, 0),
            (Accuracy::Great, 0),
            (Accuracy::Good, 0),
            (Accuracy::Miss, 0),
        ]),
        elapsed_ms: 0.0,
        playing: true,
        particles: Vec::new(),
        last_judgment: None,
        chart_end_ms,
        keyboard_lane_state: [false; LANE_COUNT],
        gamepad_lane_state: [false; LANE_COUNT],
        pending_edges: VecDeque::new(),
        step_accumulator_ms: 0.0,
        log_timer_ms: 0.0,
        rng: StdRng::seed_from_u64(seed),
    }
}

pub fn queue_input_edge(state: &mut State, source: InputSource, lane: Lane, pressed: bool) {
    state.pending_edges.push_back(InputEdge {
        lane,
        pressed,
        source,
    });
}

/// Feed one rendered frame's worth of real time into the fixed-step
/// simulation. Zero or more 16ms logical steps run; note motion stays at
/// NOTE_SPEED pixels per second regardless of render cadence.
pub fn advance(state: &mut State, frame_dt_ms: f64) {
    if !state.playing {
        return;
    }

    state.step_accumulator_ms += frame_dt_ms.clamp(0.0, MAX_FRAME_DELTA_MS);
    while state.step_accumulator_ms >= STEP_MS {
        state.step_accumulator_ms -= STEP_MS;
        step(state);
    }
}

fn step(state: &mut State) {
    state.elapsed_ms += STEP_MS;

    // Judge queued edges against positions from the end of the last step,
    // the same way a key handler fires between rendered frames.
    process_input_edges(state);

    update_note_lifecycle(state);
    particles::update(&mut state.particles, STEP_MS);

    state.log_timer_ms += STEP_MS;
    if state.log_timer_ms >= SESSION_LOG_INTERVAL_MS {
        let falling = state
            .notes
            .iter()
            .filter(|n| n.active && !n.hit)
            .count();
        info!(
            "Time: {:.1}s, Score: {}, Combo: {}, Falling notes: {}",
            state.elapsed_ms / 1000.0,
            state.score,
            state.combo,
            falling
        );
        state.log_timer_ms -= SESSION_LOG_INTERVAL_MS;
    }
}

fn process_input_edges(state: &mut State) {
    while let Some(edge) = state.pending_edges.pop_front() {
        let lane_idx = edge.lane.index();
        let was_down =
            state.keyboard_lane_state[lane_idx] || state.gamepad_lane_state[lane_idx];

        match edge.source {
            InputSource::Keyboard => state.keyboard_lane_state[lane_idx] = edge.pressed,
            InputSource::Gamepad => state.gamepad_lane_state[lane_idx] = edge.pressed,
        }

        let is_down =
            state.keyboard_lane_state[lane_idx] || state.gamepad_lane_state[lane_idx];

        // Edge-triggered: a press for a lane already held judges nothing.
        if edge.pressed && is_down && !was_down {
            judge_lane_press(state, edge.lane);
        }
    }
}

fn update_note_lifecycle(state: &mut State) {
    let mut misses: Vec<(Lane, f32)> = Vec::new();

    for runtime in &mut state.notes {
        if runtime.hit {
            continue;
        }

        if !runtime.active {
            let activation_ms = runtime.note.time_ms as f64 - LEAD_TIME_MS as f64;
            if state.elapsed_ms >= activation_ms {
                runtime.active = true;
                // Place exactly for the current elapsed time so step
                // quantization never accumulates position error.
                runtime.y = HIT_ZONE_Y
                    - (runtime.note.time_ms as f64 - state.elapsed_ms) as f32
                        * (NOTE_SPEED / 1000.0);
            }
            continue;
        }

        runtime.y += NOTE_SPEED * (STEP_MS / 1000.0) as f32;

        if runtime.y > HIT_ZONE_Y + HIT_TOLERANCE {
            runtime.hit = true;
            misses.push((runtime.note.lane, runtime.y - HIT_ZONE_Y));
        }
    }

    for (lane, distance) in misses {
        register_miss(state, lane, distance);
    }
}

/// A note scrolled past the hit zone unjudged: terminal miss, no points,
/// combo gone.
fn register_miss(state: &mut State, lane: Lane, distance: f32) {
    state.combo = 0;
    *state.counts.entry(Accuracy::Miss).or_insert(0) += 1;
    state.last_judgment = Some(Judgment {
        lane,
        accuracy: Accuracy::Miss,
        distance,
        points: 0,
    });
    info!("MISSED: Lane {}, Time {:.1}s", lane.index(), state.elapsed_ms / 1000.0);
}

/// Judge a press on `lane`: nearest unhit active note within tolerance wins;
/// outside tolerance the press consumes nothing.
pub fn judge_lane_press(state: &mut State, lane: Lane) -> Option<Judgment> {
    let mut best: Option<(usize, f32)> = None;
    for (index, runtime) in state.notes.iter().enumerate() {
        if runtime.note.lane != lane || runtime.hit || !runtime.active {
            continue;
        }
        let distance = (runtime.y - HIT_ZONE_Y).abs();
        if distance < HIT_TOLERANCE && best.map_or(true, |(_, nearest)| distance < nearest) {
            best = Some((index, distance));
        }
    }

    let (index, distance) = best?;
    state.notes[index].hit = true;

    let accuracy = judgment::accuracy_for_distance(distance);
    // Combo bonus uses the combo standing before this hit.
    let points = judgment::base_points(accuracy) + state.combo * COMBO_BONUS_PER_HIT;
    state.score += points;
    *state.counts.entry(accuracy).or_insert(0) += 1;

    if accuracy == Accuracy::Miss {
        state.combo = 0;
    } else {
        state.combo += 1;
        state.max_combo = state.max_combo.max(state.combo);
        particles::spawn_burst(
            &mut state.particles,
            LANE_X[lane.index()],
            HIT_ZONE_Y,
            &mut state.rng,
        );
    }

    let judgment = Judgment {
        lane,
        accuracy,
        distance,
        points,
    };
    state.last_judgment = Some(judgment);
    info!(
        "JUDGED: Lane {}, Distance {:.1}px, {:?}, +{}",
        lane.index(),
        distance,
        accuracy,
        points
    );
    Some(judgment)
}

pub fn pause(state: &mut State) {
    if state.playing {
        state.playing = false;
        info!("Session paused.");
    }
}

pub fn resume(state: &mut State) {
    if !state.playing {
        state.playing = true;
        info!("Session resumed.");
    }
}

/// True once every chart note has had its chance to resolve.
pub fn is_complete(state: &State) -> bool {
    state.elapsed_ms >= state.chart_end_ms
}

/// Ends the session and reports the final tally; best scores update the
/// process-wide cache.
pub fn finish(state: &mut State) -> SessionSummary {
    state.playing = false;
    let summary = SessionSummary {
        song_id: state.song_id.clone(),
        score: state.score,
        max_combo: state.max_combo,
        counts: state.counts.clone(),
        played_at: Local::now(),
    };
    scores::record_score(&state.song_id, state.score);
    info!(
        "Session finished: score {}, max combo {}.",
        summary.score, summary.max_combo
    );
    summary
}

pub fn frame_view(state: &State) -> FrameView<'_> {
    FrameView {
        notes: &state.notes,
        particles: &state.particles,
        score: state.score,
        combo: state.combo,
        max_combo: state.max_combo,
        elapsed_ms: state.elapsed_ms,
        last_judgment: state.last_judgment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GOOD_WINDOW, PERFECT_WINDOW};
    use crate::test_utils::{ChartBuilder, InputScript, drive, run_script};

    fn single_note_state(lane: Lane, time_ms: f32) -> State {
        init("test-song", ChartBuilder::new().note(lane, time_ms).build(), 1)
    }

    #[test]
    fn notes_activate_one_lead_time_before_their_hit_instant() {
        let mut state = single_note_state(Lane::Key1, 5000.0);
        let activation_ms = 5000.0 - LEAD_TIME_MS as f64;

        drive(&mut state, activation_ms - 32.0);
        assert!(!state.notes[0].active);

        drive(&mut state, 48.0);
        assert!(state.notes[0].active);
        assert!(state.notes[0].y >= crate::config::SPAWN_Y);
    }

    #[test]
    fn press_at_the_hit_instant_scores_a_perfect() {
        let mut state = single_note_state(Lane::Key3, 5000.0);
        drive(&mut state, 4992.0);

        let distance = (state.notes[0].y - HIT_ZONE_Y).abs();
        assert!(distance < PERFECT_WINDOW);

        let judgment = judge_lane_press(&mut state, Lane::Key3).unwrap();
        assert_eq!(judgment.accuracy, Accuracy::Perfect);
        assert_eq!(judgment.points, 300);
        assert_eq!(state.score, 300);
        assert_eq!(state.combo, 1);
        assert_eq!(state.max_combo, 1);
        assert!(state.notes[0].hit);
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn a_note_ten_pixels_out_still_judges_perfect() {
        let mut state = single_note_state(Lane::Key3, 5000.0);
        drive(&mut state, 4000.0);
        assert!(state.notes[0].active);

        state.combo = 5;
        state.notes[0].y = HIT_ZONE_Y - 10.0;
        let judgment = judge_lane_press(&mut state, Lane::Key3).unwrap();
        assert_eq!(judgment.accuracy, Accuracy::Perfect);
        assert_eq!(judgment.points, 300 + 5 * COMBO_BONUS_PER_HIT);
        assert_eq!(state.combo, 6);
    }

    #[test]
    fn combo_bonus_uses_the_combo_before_the_hit() {
        let chart = ChartBuilder::new()
            .note(Lane::Key1, 3000.0)
            .note(Lane::Key1, 4000.0)
            .note(Lane::Key1, 5000.0)
            .build();
        let mut state = init("test-song", chart, 1);

        for target in [3000.0, 4000.0, 5000.0] {
            drive_to(&mut state, target);
            assert!(judge_lane_press(&mut state, Lane::Key1).is_some());
        }

        // 300 + (300 + 10) + (300 + 20)
        assert_eq!(state.score, 930);
        assert_eq!(state.combo, 3);
        assert_eq!(state.max_combo, 3);
    }

    fn drive_to(state: &mut State, target_ms: f64) {
        let remaining = target_ms - state.elapsed_ms;
        if remaining > 0.0 {
            drive(state, remaining);
        }
    }

    #[test]
    fn press_outside_tolerance_consumes_nothing() {
        let mut state = single_note_state(Lane::Key2, 5000.0);
        // ~200ms early: the note is still 60px above the zone.
        drive(&mut state, 4800.0);
        let distance = (state.notes[0].y - HIT_ZONE_Y).abs();
        assert!(distance >= GOOD_WINDOW);

        assert!(judge_lane_press(&mut state, Lane::Key2).is_none());
        assert!(!state.notes[0].hit);
        assert_eq!(state.score, 0);

        // The note is still there to be hit on time.
        drive_to(&mut state, 5000.0);
        assert!(judge_lane_press(&mut state, Lane::Key2).is_some());
    }

    #[test]
    fn press_only_judges_its_own_lane() {
        let mut state = single_note_state(Lane::Key1, 5000.0);
        drive(&mut state, 5000.0);
        assert!(judge_lane_press(&mut state, Lane::Key4).is_none());
        assert!(!state.notes[0].hit);
    }

    #[test]
    fn nearest_candidate_wins_the_press() {
        // Two unhit notes in one lane; the later one is nearer the zone when
        // the press lands between them.
        let chart = ChartBuilder::new()
            .note(Lane::Key2, 4900.0)
            .note(Lane::Key2, 5020.0)
            .build();
        let mut state = init("test-song", chart, 1);
        drive(&mut state, 5008.0);

        let near = (state.notes[1].y - HIT_ZONE_Y).abs();
        let far = (state.notes[0].y - HIT_ZONE_Y).abs();
        assert!(near < far);

        let judgment = judge_lane_press(&mut state, Lane::Key2).unwrap();
        assert!((judgment.distance - near).abs() < 1e-3);
        assert!(state.notes[1].hit);
        assert!(!state.notes[0].hit);
    }

    #[test]
    fn simultaneous_presses_judge_their_lanes_independently() {
        let chart = ChartBuilder::new()
            .note(Lane::Key1, 4000.0)
            .note(Lane::Key3, 4000.0)
            .build();
        let mut state = init("test-song", chart, 1);

        drive_to(&mut state, 3990.0);
        queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key1, true);
        queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key3, true);
        drive(&mut state, 16.0);

        assert!(state.notes[0].hit);
        assert!(state.notes[1].hit);
        assert_eq!(state.counts[&Accuracy::Perfect], 2);
        assert_eq!(state.combo, 2);
    }

    #[test]
    fn unjudged_notes_auto_miss_exactly_once() {
        let mut state = single_note_state(Lane::Key1, 2000.0);
        let pass_ms = 2000.0 + (HIT_TOLERANCE / NOTE_SPEED * 1000.0) as f64;

        drive(&mut state, pass_ms + 64.0);
        assert!(state.notes[0].hit);
        assert_eq!(state.counts[&Accuracy::Miss], 1);
        assert_eq!(state.combo, 0);
        assert_eq!(state.score, 0);

        // Terminal: later presses find no candidate and the count stays put.
        assert!(judge_lane_press(&mut state, Lane::Key1).is_none());
        drive(&mut state, 1000.0);
        assert!(state.notes[0].hit);
        assert_eq!(state.counts[&Accuracy::Miss], 1);
    }

    #[test]
    fn a_miss_resets_the_combo_to_zero() {
        let chart = ChartBuilder::new()
            .note(Lane::Key1, 3000.0)
            .note(Lane::Key2, 4000.0)
            .note(Lane::Key3, 6000.0)
            .build();
        let mut state = init("test-song", chart, 1);

        drive_to(&mut state, 3000.0);
        judge_lane_press(&mut state, Lane::Key1);
        assert_eq!(state.combo, 1);

        // Let the second note pass unjudged.
        drive_to(&mut state, 4400.0);
        assert_eq!(state.combo, 0);
        assert_eq!(state.max_combo, 1);

        drive_to(&mut state, 6000.0);
        judge_lane_press(&mut state, Lane::Key3);
        assert_eq!(state.combo, 1);
    }

    #[test]
    fn held_lanes_ignore_repeated_press_edges() {
        let chart = ChartBuilder::new()
            .note(Lane::Key1, 3000.0)
            .note(Lane::Key1, 3400.0)
            .build();
        let mut state = init("test-song", chart, 1);

        drive_to(&mut state, 2990.0);
        queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key1, true);
        drive(&mut state, 16.0);
        assert!(state.notes[0].hit);

        // Still held: a second press edge judges nothing.
        drive_to(&mut state, 3390.0);
        queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key1, true);
        drive(&mut state, 16.0);
        assert!(!state.notes[1].hit);

        // Release then press again: a fresh rising edge judges.
        queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key1, false);
        queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key1, true);
        drive(&mut state, 16.0);
        assert!(state.notes[1].hit);
    }

    #[test]
    fn a_lane_held_through_another_source_stays_held() {
        let chart = ChartBuilder::new()
            .note(Lane::Key2, 3000.0)
            .note(Lane::Key2, 3400.0)
            .build();
        let mut state = init("test-song", chart, 1);

        drive_to(&mut state, 2990.0);
        queue_input_edge(&mut state, InputSource::Gamepad, Lane::Key2, true);
        drive(&mut state, 16.0);
        assert!(state.notes[0].hit);

        // Keyboard press while the gamepad still holds the lane: no edge.
        drive_to(&mut state, 3390.0);
        queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key2, true);
        drive(&mut state, 16.0);
        assert!(!state.notes[1].hit);
    }

    #[test]
    fn scoring_replay_is_deterministic() {
        let chart = || {
            crate::game::chart::ChartGenerator::new(
                120.0,
                crate::game::chart::Difficulty::Normal,
                77,
            )
            .generate(20_000.0)
        };
        let script = |notes: &[ChartNote]| {
            let mut script = InputScript::new();
            for note in notes {
                script = script.tap(note.lane, note.time_ms as f64);
            }
            script
        };

        let notes_a = chart();
        let mut a = init("replay", notes_a.clone(), 9);
        run_script(&mut a, script(&notes_a), 22_000.0);

        let notes_b = chart();
        let mut b = init("replay", notes_b.clone(), 9);
        run_script(&mut b, script(&notes_b), 22_000.0);

        assert_eq!(notes_a, notes_b);
        assert!(a.score > 0);
        assert_eq!(a.score, b.score);
        assert_eq!(a.max_combo, b.max_combo);
        assert_eq!(a.counts, b.counts);
    }

    #[test]
    fn autoplay_taps_score_every_note() {
        let notes = ChartBuilder::new()
            .note(Lane::Key1, 3000.0)
            .note(Lane::Key2, 3500.0)
            .note(Lane::Key3, 4000.0)
            .note(Lane::Key4, 4500.0)
            .build();
        let mut state = init("autoplay", notes.clone(), 2);

        let mut script = InputScript::new();
        for note in &notes {
            script = script.tap(note.lane, note.time_ms as f64);
        }
        run_script(&mut state, script, 6000.0);

        assert_eq!(state.counts[&Accuracy::Perfect], 4);
        assert_eq!(state.counts[&Accuracy::Miss], 0);
        assert_eq!(state.max_combo, 4);
        // 300 + 310 + 320 + 330
        assert_eq!(state.score, 1260);
        assert!(is_complete(&state));
    }

    #[test]
    fn pause_freezes_the_simulation() {
        let mut state = single_note_state(Lane::Key1, 3000.0);
        drive(&mut state, 1000.0);
        let frozen_at = state.elapsed_ms;

        pause(&mut state);
        drive(&mut state, 2000.0);
        assert_eq!(state.elapsed_ms, frozen_at);

        resume(&mut state);
        drive(&mut state, 160.0);
        assert!(state.elapsed_ms > frozen_at);
    }

    #[test]
    fn advance_runs_whole_steps_only() {
        let mut state = single_note_state(Lane::Key1, 3000.0);
        advance(&mut state, 8.0);
        assert_eq!(state.elapsed_ms, 0.0);
        advance(&mut state, 8.0);
        assert_eq!(state.elapsed_ms, 16.0);
        advance(&mut state, 33.0);
        assert_eq!(state.elapsed_ms, 48.0);
    }

    #[test]
    fn finish_reports_the_tally_and_records_the_best() {
        let mut state = single_note_state(Lane::Key1, 3000.0);
        drive_to(&mut state, 3000.0);
        judge_lane_press(&mut state, Lane::Key1);

        let summary = finish(&mut state);
        assert!(!state.playing);
        assert_eq!(summary.score, 300);
        assert_eq!(summary.max_combo, 1);
        assert_eq!(summary.count(Accuracy::Perfect), 1);
        assert_eq!(scores::best_score("test-song"), Some(300));
    }

    #[test]
    fn empty_charts_complete_immediately() {
        let state = init("empty", Vec::new(), 1);
        assert!(is_complete(&state));
    }

    #[test]
    fn a_recording_renderer_sees_the_session_unfold() {
        use crate::core::render::{FrameRecorder, Renderer};

        let chart = ChartBuilder::new().note(Lane::Key2, 2000.0).build();
        let mut state = init("recorded", chart, 4);
        let mut recorder = FrameRecorder::default();

        let mut fed = 0.0;
        while fed < 3000.0 {
            if (state.elapsed_ms - 2000.0).abs() < STEP_MS / 2.0 {
                queue_input_edge(&mut state, InputSource::Keyboard, Lane::Key2, true);
            }
            advance(&mut state, STEP_MS);
            recorder.draw_frame(&frame_view(&state));
            fed += STEP_MS;
        }

        assert!(recorder.frames > 0);
        assert_eq!(recorder.max_visible_notes, 1);
        assert_eq!(recorder.last_score, 300);
        assert_eq!(recorder.judgments, vec![(Lane::Key2, Accuracy::Perfect)]);
    }

    #[test]
    fn frame_view_exposes_only_falling_notes() {
        let chart = ChartBuilder::new()
            .note(Lane::Key1, 3000.0)
            .note(Lane::Key2, 30_000.0)
            .build();
        let mut state = init("view", chart, 1);
        drive_to(&mut state, 3000.0);

        let view = frame_view(&state);
        assert_eq!(view.visible_notes().count(), 1);
        assert_eq!(view.score, 0);
        assert_eq!(view.elapsed_ms, state.elapsed_ms);
    }
}
