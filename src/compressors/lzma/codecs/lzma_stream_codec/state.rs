pub const REPS: usize = 4;
pub const STATES: usize = 12;

const LIT_STATES: u8 = 7;
const LIT_LIT: u8 = 0;
const SHORTREP_LIT_LIT: u8 = 3;
const LIT_MATCH: u8 = 7;
const LIT_LONGREP: u8 = 8;
const LIT_SHORTREP: u8 = 9;
const NONLIT_MATCH: u8 = 10;
const NONLIT_REP: u8 = 11;

/// The packet history the coder conditions its control bits on.
///
/// States below 7 mean the previous packet was a literal, the rest mean it was some kind
/// of match, which also switches literals over to delta coding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    state: u8,
}

impl State {
    pub fn new() -> Self {
        Self { state: LIT_LIT }
    }

    pub fn reset(&mut self) {
        self.state = LIT_LIT;
    }

    pub fn get_idx(&self) -> usize {
        self.state as usize
    }

    pub fn update_literal(&mut self) {
        if self.state <= SHORTREP_LIT_LIT {
            self.state = LIT_LIT;
        } else if self.state <= LIT_SHORTREP {
            self.state -= 3;
        } else {
            self.state -= 6;
        }
    }

    #[inline(always)]
    pub fn update_match(&mut self) {
        self.state = if self.state < LIT_STATES {
            LIT_MATCH
        } else {
            NONLIT_MATCH
        };
    }

    #[inline(always)]
    pub fn update_long_rep(&mut self) {
        self.state = if self.state < LIT_STATES {
            LIT_LONGREP
        } else {
            NONLIT_REP
        };
    }

    #[inline(always)]
    pub fn update_short_rep(&mut self) {
        self.state = if self.state < LIT_STATES {
            LIT_SHORTREP
        } else {
            NONLIT_REP
        };
    }

    pub fn is_literal(&self) -> bool {
        self.state < LIT_STATES
    }
}

/// The four most recently used match distances, most recent first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reps {
    reps: [u32; REPS],
}

impl Reps {
    pub fn new() -> Self {
        Self { reps: [0; REPS] }
    }

    pub fn reset(&mut self) {
        self.reps = [0; REPS];
    }

    pub fn get(&self, index: usize) -> u32 {
        self.reps[index]
    }

    pub fn as_array(&self) -> &[u32; REPS] {
        &self.reps
    }

    /// The index of the first rep equal to `distance`.
    pub fn find(&self, distance: u32) -> Option<usize> {
        self.reps.iter().position(|&rep| rep == distance)
    }

    /// A new distance becomes rep0, and rep3 falls off the end.
    pub fn push_fresh(&mut self, distance: u32) {
        self.reps[3] = self.reps[2];
        self.reps[2] = self.reps[1];
        self.reps[1] = self.reps[0];
        self.reps[0] = distance;
    }

    /// Moves rep `index` to the front, shifting the ones before it down by one.
    pub fn promote(&mut self, index: usize) -> u32 {
        let rep_value = self.reps[index];
        self.reps.copy_within(0..index, 1);
        self.reps[0] = rep_value;
        rep_value
    }
}
