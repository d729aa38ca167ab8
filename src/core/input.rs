#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lane {
    Key1 = 0,
    Key2 = 1,
    Key3 = 2,
    Key4 = 3,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Lane::Key1, Lane::Key2, Lane::Key3, Lane::Key4];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Lane> {
        match index {
            0 => Some(Lane::Key1),
            1 => Some(Lane::Key2),
            2 => Some(Lane::Key3),
            3 => Some(Lane::Key4),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Gamepad,
}

/// A discrete press/release event for one lane, as delivered by the input
/// boundary. Debouncing is the session's job, not the source's.
#[derive(Clone, Copy, Debug)]
pub struct InputEdge {
    pub lane: Lane,
    pub pressed: bool,
    pub source: InputSource,
}

#[inline(always)]
pub fn lane_from_key(key: char) -> Option<Lane> {
    match key.to_ascii_lowercase() {
        'd' => Some(Lane::Key1),
        'f' => Some(Lane::Key2),
        'j' => Some(Lane::Key3),
        'k' => Some(Lane::Key4),
        _ => None,
    }
}
