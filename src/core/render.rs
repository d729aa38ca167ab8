use crate::core::input::Lane;
use crate::game::judgment::{Accuracy, Judgment};
use crate::game::note::RuntimeNote;
use crate::game::particles::Particle;

/// Read-only snapshot of one frame of session state. Renderers draw lanes,
/// the hit zone, every active unhit note at its current `y`, and whatever
/// feedback they want for the last judgment; they never mutate game state.
pub struct FrameView<'a> {
    pub notes: &'a [RuntimeNote],
    pub particles: &'a [Particle],
    pub score: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub elapsed_ms: f64,
    pub last_judgment: Option<Judgment>,
}

impl FrameView<'_> {
    /// Notes a renderer should actually draw this frame.
    pub fn visible_notes(&self) -> impl Iterator<Item = &RuntimeNote> {
        self.notes.iter().filter(|n| n.active && !n.hit)
    }
}

pub trait Renderer {
    fn draw_frame(&mut self, view: &FrameView);
}

/// Headless renderer; draws nothing.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_frame(&mut self, _view: &FrameView) {}
}

/// Test renderer that records what it was asked to draw.
#[derive(Default)]
pub struct FrameRecorder {
    pub frames: u32,
    pub max_visible_notes: usize,
    pub last_score: u32,
    pub judgments: Vec<(Lane, Accuracy)>,
}

impl Renderer for FrameRecorder {
    fn draw_frame(&mut self, view: &FrameView) {
        self.frames += 1;
        self.max_visible_notes = self.max_visible_notes.max(view.visible_notes().count());
        self.last_score = view.score;
        if let Some(judgment) = view.last_judgment {
            let repeat = self
                .judgments
                .last()
                .is_some_and(|&(lane, acc)| lane == judgment.lane && acc == judgment.accuracy);
            if !repeat {
                self.judgments.push((judgment.lane, judgment.accuracy));
            }
        }
    }
}
