//! Deterministic branch-choice and simulation-level RNG wrappers.
//!
//! # Two generators, two jobs
//!
//! [`TurnBits`] is the 32-bit random word every plan carries.  The recurrence
//! `x · 3941169319 ⊕ 2902958803` is a weak generator that is only adequate
//! for uncorrelated branch choices — never reuse it for anything statistical.
//! Its virtue is that the *upcoming* turns are all readable in advance: bit
//! `i` of the word is the direction of the i-th future fork, which lets the
//! planner predict a route without mutating the word.
//!
//! [`SimRng`] wraps `SmallRng` for everything else (spawn parameter ranges,
//! test scaffolding).  Each consumer seeds its own instance by mixing the run
//! seed with its slot index so results are reproducible and order-free.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Multiplier of the turn-bit recurrence.
const TURN_MULT: u32 = 3_941_169_319;
/// XOR constant of the turn-bit recurrence.
const TURN_XOR: u32 = 2_902_958_803;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── TurnBits ──────────────────────────────────────────────────────────────────

/// Direction taken at a two-way fork.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Turn {
    Left  = 0,
    Right = 1,
}

impl Turn {
    #[inline]
    fn from_bit(bit: u32) -> Turn {
        if bit & 1 == 0 { Turn::Left } else { Turn::Right }
    }

    /// The fork side this turn selects (0 = left, 1 = right).
    #[inline]
    pub fn side(self) -> usize {
        self as usize
    }
}

/// A plan's 32-bit random word, consumed one or two bits at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnBits {
    bits: u32,
}

impl TurnBits {
    /// Seed the word from an arbitrary integer.
    pub fn seed(seed: u32) -> Self {
        Self { bits: seed.wrapping_mul(TURN_MULT) ^ TURN_XOR }
    }

    /// The next 32 turns, encoded one per bit (bit 0 = next fork).
    #[inline]
    pub fn word(self) -> u32 {
        self.bits
    }

    /// Peek the direction of the `index`-th future fork without consuming it.
    #[inline]
    pub fn direction(self, index: u32) -> Turn {
        Turn::from_bit(self.bits >> index)
    }

    /// Consume the next turn bit and refill the top of the word.
    #[inline]
    pub fn turn(&mut self) -> Turn {
        let turn = Turn::from_bit(self.bits);
        let r = self.bits.wrapping_mul(TURN_MULT) ^ TURN_XOR;
        self.bits = (self.bits >> 1) | (r & 0x8000_0000);
        turn
    }

    /// Advance by two bits and return the whole refreshed word.
    ///
    /// This is the pedestrian-planner variant: the caller reduces the word
    /// modulo its weight sum, so it consumes the word rather than single bits.
    #[inline]
    pub fn next_word(&mut self) -> u32 {
        self.bits = (self.bits >> 2).wrapping_mul(TURN_MULT) ^ TURN_XOR;
        self.bits
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG for spawn parameters and other global draws.
///
/// Used only in single-threaded contexts.  Derive per-entity generators with
/// [`SimRng::for_slot`] so adding or removing entities at the end of a list
/// does not disturb the draws of existing ones.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Deterministically derive a generator for entity slot `slot` from the
    /// run's global seed.
    pub fn for_slot(global_seed: u64, slot: u32) -> Self {
        let seed = global_seed ^ (slot as u64).wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
