use rand::Rng;

const MULTIPLIER_A: i64 = 1103515245;
const INCREMENT_C: i64 = 12345;
const DEFAULT_SEED: i64 = 3819201;

/// Source of randomness for rollouts.
///
/// Rollouts only ever ask for an index into the list of legal moves, so swapping the generator
/// makes a search fully reproducible.
pub trait RandomGenerator: Default {
    fn next(&mut self) -> i32;

    /// Returns a value in `from..to`, or `from` when the range is empty.
    fn next_range(&mut self, from: i32, to: i32) -> i32;

    /// Picks an element of `items`, or `None` if it is empty.
    fn choose<'a, K>(&mut self, items: &'a [K]) -> Option<&'a K> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_range(0, items.len() as i32) as usize)
    }
}

/// Thread-local generator from the `rand` crate. Non-deterministic.
#[derive(Debug, Default)]
pub struct StandardRandomGenerator;

impl RandomGenerator for StandardRandomGenerator {
    fn next(&mut self) -> i32 {
        rand::random()
    }

    fn next_range(&mut self, from: i32, to: i32) -> i32 {
        if to <= from {
            return from;
        }
        rand::rng().random_range(from..to)
    }
}

/// Seeded linear congruential generator producing the same sequence for the same seed.
#[derive(Debug)]
pub struct CustomNumberGenerator {
    seed: i64,
}

impl Default for CustomNumberGenerator {
    fn default() -> Self {
        CustomNumberGenerator::new(DEFAULT_SEED)
    }
}

impl RandomGenerator for CustomNumberGenerator {
    fn next(&mut self) -> i32 {
        self.seed = (self.seed * MULTIPLIER_A + INCREMENT_C) % (i32::MAX as i64);
        self.seed as i32
    }

    fn next_range(&mut self, from: i32, to: i32) -> i32 {
        if to <= from {
            return from;
        }
        (self.next() % (to - from)).abs() + from
    }
}

impl CustomNumberGenerator {
    /// Creates a generator from `seed`, reduced modulo `i32::MAX` like every later state.
    pub const fn new(seed: i64) -> Self {
        Self {
            seed: seed.rem_euclid(i32::MAX as i64),
        }
    }
}

/// Replays a fixed script of values, wrapping around at the end.
///
/// `next_range(from, to)` maps each scripted value `v` to `from + v % (to - from)`, so a script
/// of zeros always picks the first legal move.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    script: Vec<i32>,
    position: usize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<i32>) -> Self {
        Self {
            script,
            position: 0,
        }
    }

    /// Number of values consumed so far.
    pub fn consumed(&self) -> usize {
        self.position
    }
}

impl RandomGenerator for ScriptedGenerator {
    fn next(&mut self) -> i32 {
        if self.script.is_empty() {
            return 0;
        }
        let value = self.script[self.position % self.script.len()];
        self.position += 1;
        value
    }

    fn next_range(&mut self, from: i32, to: i32) -> i32 {
        if to <= from {
            return from;
        }
        self.next().rem_euclid(to - from) + from
    }
}

#[cfg(test)]
mod tests {
    use crate::random::{
        CustomNumberGenerator, RandomGenerator, ScriptedGenerator, StandardRandomGenerator,
    };

    #[test]
    fn outputs_same_numbers() {
        let mut crg = CustomNumberGenerator::new(42);
        assert_eq!(crg.next_range(0, 10), 8);
        assert_eq!(crg.next_range(0, 10), 4);
        assert_eq!(crg.next_range(0, 10), 1);
        assert_eq!(crg.next_range(0, 10), 2);
        assert_eq!(crg.next_range(0, 10), 4);
    }

    #[test]
    fn extreme_seeds_do_not_overflow() {
        for seed in [i64::MAX, i64::MAX / 2, i64::MIN, -1] {
            let mut crg = CustomNumberGenerator::new(seed);
            for _ in 0..100 {
                let value = crg.next_range(0, 9);
                assert!((0..9).contains(&value), "seed {} gave {}", seed, value);
            }
        }
    }

    #[test]
    fn small_seeds_keep_their_sequence() {
        let mut reduced = CustomNumberGenerator::new(42 + i32::MAX as i64);
        let mut plain = CustomNumberGenerator::new(42);
        for _ in 0..5 {
            assert_eq!(reduced.next(), plain.next());
        }
    }

    #[test]
    fn empty_range_returns_start() {
        let mut standard = StandardRandomGenerator;
        let mut custom = CustomNumberGenerator::default();
        let mut scripted = ScriptedGenerator::new(vec![5]);

        assert_eq!(standard.next_range(3, 3), 3);
        assert_eq!(custom.next_range(3, 3), 3);
        assert_eq!(scripted.next_range(3, 3), 3);
        assert_eq!(custom.next_range(4, 2), 4);
    }

    #[test]
    fn choose_stays_inside_the_slice() {
        let moves: Vec<u8> = vec![1, 5, 7];
        let mut standard = StandardRandomGenerator;
        let mut custom = CustomNumberGenerator::default();
        for _ in 0..100 {
            assert!(moves.contains(standard.choose(&moves).unwrap()));
            assert!(moves.contains(custom.choose(&moves).unwrap()));
        }

        let empty: Vec<u8> = vec![];
        assert_eq!(custom.choose(&empty), None);
    }

    #[test]
    fn scripted_generator_replays_and_wraps() {
        let moves = [10, 20, 30];
        let mut scripted = ScriptedGenerator::new(vec![0, 2, 4]);

        assert_eq!(scripted.choose(&moves), Some(&10));
        assert_eq!(scripted.choose(&moves), Some(&30));
        // 4 % 3
        assert_eq!(scripted.choose(&moves), Some(&20));
        assert_eq!(scripted.choose(&moves), Some(&10));
        assert_eq!(scripted.consumed(), 4);
    }

    #[test]
    fn empty_script_yields_zero() {
        let mut scripted = ScriptedGenerator::default();
        assert_eq!(scripted.next(), 0);
        assert_eq!(scripted.next_range(3, 6), 3);
    }
}
