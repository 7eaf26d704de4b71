//! Seedable xorshift32 generator shared by every rain style

/// Seed used when the host does not pick one
pub const DEFAULT_SEED: u32 = 0xDEAD_BEEF;

#[derive(Debug, Clone)]
pub struct RainRng {
    state: u32,
}

impl Default for RainRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RainRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max). Reversed bounds are allowed.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns an integer in [min, max), or `min` when the range is empty
    pub fn range_int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max as i64 - min as i64) as u32;
        min + (self.next_u32() % span) as i32
    }

    /// In-place Fisher-Yates shuffle walking down from the back
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        let mut cnt = items.len();
        while cnt > 1 {
            cnt -= 1;
            let j = self.range_int(0, cnt as i32 + 1) as usize;
            items.swap(j, cnt);
        }
    }
}
