//! Deterministic payloads for byte-preservation tests.

/// Minimal xorshift64 PRNG, reproducible for a fixed seed.
pub struct Xorshift64(u64);

impl Xorshift64 {
    /// A zero seed would stay zero forever, so it is replaced.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Returns `usize` in `[min, max)`.
    pub fn range_usize(&mut self, min: usize, max: usize) -> usize {
        let span = (max - min).max(1) as u64;
        min + (self.next_u64() % span) as usize
    }

    pub fn fill(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// `len` pseudo-random bytes from `seed`.
#[must_use]
pub fn payload(seed: u64, len: usize) -> Vec<u8> {
    let mut data = vec![0; len];
    Xorshift64::new(seed).fill(&mut data);
    data
}
