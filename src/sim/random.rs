//! Seeded random source.
//!
//! A 32-bit linear congruential generator with the reference algorithm's
//! constants. It only feeds `jiggle`, which breaks exact coincidence between
//! nodes, so both kernels draw from it in the same order and stay
//! deterministic for a fixed seed.

const A: u32 = 1_664_525;
const C: u32 = 1_013_904_223;
const M: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(A).wrapping_add(C);
        self.state as f64 / M
    }

    /// A tiny displacement in `[-5e-7, 5e-7)`.
    #[inline]
    pub fn jiggle(&mut self) -> f64 {
        (self.next_f64() - 0.5) * 1e-6
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(1)
    }
}
