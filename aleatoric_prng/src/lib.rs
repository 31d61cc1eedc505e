// Seedable pseudo-random generator for song generation.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// A run creates exactly one `SongRng` and hands it down by `&mut` to every
// stochastic step (LFSR seeding, chord inversions, Markov walks, Bernoulli
// rhythms), so the whole output is reproducible from a single `u64` seed.
//
// `SongRng` implements `rand_core::RngCore`, which gives callers the full
// `rand::Rng` surface (`random`, `random_range`, `random_bool`) while keeping
// the bit stream independent of the `rand` crate's own generators.
//
// **Determinism.** The core generator uses integer arithmetic only. Floating
// point is confined to the `next_f64` conversion, which is exact.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

/// Xoshiro256++ generator, the single source of randomness for a song.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRng {
    s: [u64; 4],
}

impl SongRng {
    /// Create a generator seeded from a `u64`.
    ///
    /// SplitMix64 expands the seed into the 256-bit state, so nearby seeds
    /// still produce unrelated streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Upper 32 bits of the next `u64`.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform `f64` in [0, 1) built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Fill `dest` with little-endian bytes from successive `u64`s.
    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl RngCore for SongRng {
    fn next_u32(&mut self) -> u32 {
        SongRng::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        SongRng::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        SongRng::fill_bytes(self, dest)
    }
}

/// SplitMix64, used only to expand a `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
