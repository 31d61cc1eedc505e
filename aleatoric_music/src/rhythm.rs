// Step patterns for percussion parts.
//
// A `StepPattern` is a fixed-length loop of on/off steps. Patterns come
// from an LFSR bit stream, a per-step coin flip, or a plain "every n
// steps" pulse, and can be rotated or gated against each other before
// render.rs turns them into drum hits.

use crate::error::Result;
use crate::lfsr::Lfsr;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepPattern {
    steps: Vec<bool>,
}

impl StepPattern {
    pub fn new(steps: Vec<bool>) -> Self {
        StepPattern { steps }
    }

    /// Take `steps` output bits from a freshly seeded register.
    pub fn from_lfsr(seed: u32, width: u32, steps: usize) -> Result<Self> {
        Ok(Self::from_register(&mut Lfsr::new(seed, width)?, steps))
    }

    /// Take the next `steps` bits from an existing register.
    pub fn from_register(lfsr: &mut Lfsr, steps: usize) -> Self {
        StepPattern {
            steps: lfsr.take(steps).collect(),
        }
    }

    /// Each step is on with probability `p` (clamped to `0.0..=1.0`).
    pub fn bernoulli(rng: &mut impl Rng, steps: usize, p: f64) -> Self {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        StepPattern {
            steps: (0..steps).map(|_| rng.random_bool(p)).collect(),
        }
    }

    /// On at `offset`, `offset + period`, ... A zero period gives silence.
    pub fn every(steps: usize, period: usize, offset: usize) -> Self {
        StepPattern {
            steps: (0..steps)
                .map(|i| period > 0 && i >= offset && (i - offset) % period == 0)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[bool] {
        &self.steps
    }

    pub fn is_on(&self, step: usize) -> bool {
        self.steps.get(step).copied().unwrap_or(false)
    }

    /// Indices of the on steps.
    pub fn hits(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
            .collect()
    }

    /// Fraction of steps that are on; 0 for an empty pattern.
    pub fn density(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.hits().len() as f64 / self.steps.len() as f64
    }

    /// Shift the loop right by `by` steps, wrapping around.
    pub fn rotate(&self, by: usize) -> Self {
        let mut steps = self.steps.clone();
        if !steps.is_empty() {
            let by = by % steps.len();
            steps.rotate_right(by);
        }
        StepPattern { steps }
    }

    /// Keep only steps that are also on in `mask`. `mask` loops if it is
    /// shorter than this pattern.
    pub fn gate(&self, mask: &StepPattern) -> Self {
        if mask.is_empty() {
            return StepPattern::new(vec![false; self.len()]);
        }
        StepPattern {
            steps: self
                .steps
                .iter()
                .enumerate()
                .map(|(i, &on)| on && mask.steps[i % mask.len()])
                .collect(),
        }
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::lfsr::format_bits(&self.steps))
    }
}
