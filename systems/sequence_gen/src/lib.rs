#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic sequence generation system.
//!
//! Watches the session's event stream for [`Event::SequenceNeeded`] and
//! answers each request with a `ProvideSequence` command. Every answer is
//! derived from the configured global seed, the running request index, and a
//! per-payload stream label, so replaying the same session script with the
//! same seed reproduces the same sequences.

use mindspan_core::{Command, Digit, DigitRange, Event, SequencePayload, SequenceSpec};
use sha2::{Digest, Sha256};

const RNG_STREAM_DIGITS: &str = "digits";
const RNG_STREAM_NUMBERS: &str = "numbers";

/// Deterministic configuration for sequence generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    global_seed: u64,
}

impl Config {
    /// Creates a new configuration with the provided global seed.
    #[must_use]
    pub const fn new(global_seed: u64) -> Self {
        Self { global_seed }
    }

    /// Seed every derived sequence originates from.
    #[must_use]
    pub const fn global_seed(&self) -> u64 {
        self.global_seed
    }
}

/// Pure system that answers sequence requests deterministically.
#[derive(Debug)]
pub struct SequenceGeneration {
    config: Config,
    request_index: u64,
}

impl SequenceGeneration {
    /// Creates a new generator with the provided configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            request_index: 0,
        }
    }

    /// Consumes [`Event::SequenceNeeded`] and emits `ProvideSequence` commands.
    pub fn handle(&mut self, events: &[Event], out_commands: &mut Vec<Command>) {
        for event in events {
            if let Event::SequenceNeeded { spec } = event {
                let payload = self.answer(*spec);
                out_commands.push(Command::ProvideSequence { payload });
            }
        }
    }

    fn answer(&mut self, spec: SequenceSpec) -> SequencePayload {
        let index = self.request_index;
        self.request_index = self.request_index.saturating_add(1);

        match spec {
            SequenceSpec::Digits { length, range } => {
                let seed = derive_request_seed(self.config.global_seed, index, RNG_STREAM_DIGITS);
                let mut rng = SplitMix64::new(seed);
                let expected = length.get() as usize;
                let mut digits = Vec::with_capacity(expected);
                for _ in 0..expected {
                    digits.push(sample_digit(&mut rng, range));
                }
                SequencePayload::Digits(digits)
            }
            SequenceSpec::DistinctNumbers { count, min, max } => {
                let seed = derive_request_seed(self.config.global_seed, index, RNG_STREAM_NUMBERS);
                let mut rng = SplitMix64::new(seed);
                SequencePayload::Numbers(sample_distinct_numbers(&mut rng, count.get(), min, max))
            }
        }
    }
}

fn derive_request_seed(global_seed: u64, request_index: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(request_index.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

fn sample_digit(rng: &mut SplitMix64, range: DigitRange) -> Digit {
    let value = sample_uniform_inclusive(rng, u32::from(range.min()), u32::from(range.max()));
    Digit::new(value as u8).unwrap_or(Digit::ZERO)
}

/// Draws `count` distinct numbers from `min..=max`, then shuffles them.
///
/// The draw is capped at the range width, so an oversized request yields
/// every value in the range rather than spinning forever.
fn sample_distinct_numbers(rng: &mut SplitMix64, count: u32, min: u32, max: u32) -> Vec<u32> {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let available = max.saturating_sub(min).saturating_add(1) as usize;
    let target = (count as usize).min(available);

    let mut chosen: Vec<u32> = Vec::with_capacity(target);
    while chosen.len() < target {
        let value = sample_uniform_inclusive(rng, min, max);
        if !chosen.contains(&value) {
            chosen.push(value);
        }
    }

    let mut index = chosen.len();
    while index > 1 {
        index -= 1;
        let swap_with = (rng.next_u64() % (index as u64 + 1)) as usize;
        chosen.swap(index, swap_with);
    }
    chosen
}

fn sample_uniform_inclusive(rng: &mut SplitMix64, min: u32, max: u32) -> u32 {
    if min == max {
        return min;
    }

    let range = u64::from(max.saturating_sub(min)) + 1;
    let value = rng.next_u64();
    let offset = value % range;
    min.saturating_add(offset as u32)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}
