// Lane layout
pub const LANE_COUNT: usize = 4;
pub const LANE_X: [f32; LANE_COUNT] = [200.0, 300.0, 500.0, 600.0];

// Note travel
pub const NOTE_SPEED: f32 = 300.0; // Pixels per second, straight down
pub const SPAWN_Y: f32 = -50.0;
pub const HIT_ZONE_Y: f32 = 500.0;

// A note spawned at SPAWN_Y reaches the hit zone exactly at its chart time.
pub const LEAD_TIME_MS: f32 = (HIT_ZONE_Y - SPAWN_Y) / NOTE_SPEED * 1000.0;

// Judgment windows, as pixel distance from the hit zone
pub const HIT_TOLERANCE: f32 = 50.0;
pub const PERFECT_WINDOW: f32 = 15.0;
pub const GREAT_WINDOW: f32 = 30.0;
pub const GOOD_WINDOW: f32 = 50.0;

// Scoring
pub const COMBO_BONUS_PER_HIT: u32 = 10;

// Chart generation
pub const LEAD_IN_BEATS: u64 = 8;
pub const TRAIL_BEATS: u64 = 4;

// Simulation
pub const STEP_MS: f64 = 16.0; // Fixed logical step, decoupled from render cadence
pub const SESSION_LOG_INTERVAL_MS: f64 = 1000.0;

// Particles
pub const PARTICLE_BURST_COUNT: usize = 8;
pub const PARTICLE_DECAY_PER_STEP: f32 = 0.02;
