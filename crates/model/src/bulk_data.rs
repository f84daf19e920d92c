use num_rational::Ratio;

use rand::distr::{Alphanumeric, Distribution, SampleString};
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::event::Event;
use crate::route::{SYNC_DSPS, SYNC_SSPS};

const OTHER_ACTIONS: [&str; 2] = ["/user/sync/check", "/user/info"];

/// Synthetic input lines.
///
/// A small pool of busy markers receives a large share of the events so the
/// generated segment partitions get more than one row each. Optionally a
/// share of the lines is corrupted.
pub struct EventGenerator {
    rng: SmallRng,
    marker_pool: Vec<String>,
    source_pool: Vec<String>,
    malformed: Ratio<u32>,
}

impl EventGenerator {
    const NEW_MARKER: Ratio<u32> = Ratio::new_raw(1, 100);
    const POOLED_MARKER: Ratio<u32> = Ratio::new_raw(50, 100);
    const SSPS: Ratio<u32> = Ratio::new_raw(45, 100);
    const DSPS: Ratio<u32> = Ratio::new_raw(45, 100);
    const WITH_SEGMENT: Ratio<u32> = Ratio::new_raw(30, 100);

    const SOURCES: usize = 16;
    const MARKER_LENGTH: usize = 12;
    const USER_ID_LENGTH: usize = 32;
    const SEGMENT_LENGTH: usize = 6;

    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: SmallRng) -> Self {
        let source_pool = (0..Self::SOURCES)
            .map(|_| format!("src-{}", Alphanumeric.sample_string(&mut rng, 4)))
            .collect();
        EventGenerator {
            rng,
            marker_pool: Vec::new(),
            source_pool,
            malformed: Ratio::new_raw(0, 1),
        }
    }

    /// Share of lines that are corrupted on purpose.
    pub fn with_malformed(mut self, malformed: Ratio<u32>) -> Self {
        self.malformed = malformed;
        self
    }

    fn random_ratio(&mut self, ratio: Ratio<u32>) -> bool {
        *ratio.numer() > 0 && self.rng.random_ratio(*ratio.numer(), *ratio.denom())
    }

    fn pick_marker(&mut self) -> String {
        if self.random_ratio(Self::POOLED_MARKER) {
            if let Some(marker) = self.marker_pool.choose(&mut self.rng) {
                return marker.clone();
            }
        }
        Alphanumeric.sample_string(&mut self.rng, Self::MARKER_LENGTH)
    }

    fn pick_action(&mut self) -> &'static str {
        if self.random_ratio(Self::SSPS) {
            SYNC_SSPS
        } else if self.random_ratio(Self::DSPS / (Ratio::new_raw(1, 1) - Self::SSPS)) {
            SYNC_DSPS
        } else {
            OTHER_ACTIONS[self.rng.random_range(0..OTHER_ACTIONS.len())]
        }
    }

    pub fn next_event(&mut self) -> Event {
        if self.random_ratio(Self::NEW_MARKER) {
            let marker = Alphanumeric.sample_string(&mut self.rng, Self::MARKER_LENGTH);
            self.marker_pool.push(marker);
        }
        let action = self.pick_action().to_string();
        let marker = self.pick_marker();
        let source_id = self
            .source_pool
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();
        let user_id = Hexadecimal.sample_string(&mut self.rng, Self::USER_ID_LENGTH);
        let segment = self
            .random_ratio(Self::WITH_SEGMENT)
            .then(|| format!("seg-{}", Alphanumeric.sample_string(&mut self.rng, Self::SEGMENT_LENGTH)));

        Event {
            action,
            marker,
            source_id,
            user_id,
            segment,
        }
    }

    fn corrupt(&mut self, line: String) -> String {
        match self.rng.random_range(0..3) {
            // truncated object
            0 => line[..line.len() / 2].to_string(),
            // required field dropped
            1 => line.replacen("\"userId\"", "\"user\"", 1),
            _ => "not a record".to_string(),
        }
    }
}

impl Default for EventGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for EventGenerator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.next_event();
        let line = serde_json::to_string(&event).ok()?;
        if self.random_ratio(self.malformed) {
            Some(self.corrupt(line))
        } else {
            Some(line)
        }
    }
}

struct Hexadecimal;

impl Distribution<u8> for Hexadecimal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        const HEX_DIGITS_CHARSET: &[u8; 16] = b"0123456789abcdef";

        let var = rng.next_u32() >> (32 - 4);
        HEX_DIGITS_CHARSET[var as usize]
    }
}

impl SampleString for Hexadecimal {
    fn append_string<R: Rng + ?Sized>(&self, rng: &mut R, string: &mut String, len: usize) {
        string.extend(self.sample_iter(rng).take(len).map(char::from));
    }
}
