//! Glyph alphabets and random sampling.
//!
//! Two immutable pools behind one type. The active pool is chosen once
//! from the terminal's Unicode capability and never changes afterwards;
//! callers never branch on it.

use rand::Rng;

/// Half-width katakana (U+FF65..U+FF9F subset) followed by numerals.
const PRIMARY: &str = "ｦｱｳｴｵｶｷｹｺｻｼｽｾｿﾀﾂﾃﾅﾆﾇﾈﾊﾋﾎﾏﾐﾑﾒﾓﾔﾕﾗﾘﾜ0123456789";

/// ASCII-only pool for terminals without Unicode output.
const FALLBACK: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz.,;:!?+-=*/";

#[derive(Clone, Debug)]
pub struct GlyphPool {
    glyphs: Box<[char]>,
}

impl GlyphPool {
    pub fn primary() -> Self {
        Self::from_alphabet(PRIMARY)
    }

    pub fn fallback() -> Self {
        Self::from_alphabet(FALLBACK)
    }

    pub fn for_capability(unicode: bool) -> Self {
        if unicode { Self::primary() } else { Self::fallback() }
    }

    fn from_alphabet(alphabet: &str) -> Self {
        GlyphPool { glyphs: alphabet.chars().collect() }
    }

    /// Uniform draw from the pool.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.glyphs[rng.gen_range(0..self.glyphs.len())]
    }

    #[cfg(test)]
    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_ascii(&self) -> bool {
        self.glyphs.iter().all(char::is_ascii)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn capability_selects_alphabet() {
        assert!(!GlyphPool::for_capability(true).is_ascii());
        assert!(GlyphPool::for_capability(false).is_ascii());
        assert_eq!(GlyphPool::primary().len(), 44);
    }

    #[test]
    fn samples_stay_in_pool() {
        let pool = GlyphPool::fallback();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..500 {
            assert!(pool.contains(pool.sample(&mut rng)));
        }
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let pool = GlyphPool::primary();
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let left: String = (0..32).map(|_| pool.sample(&mut a)).collect();
        let right: String = (0..32).map(|_| pool.sample(&mut b)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn sampling_covers_the_pool() {
        let pool = GlyphPool::fallback();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5000 {
            seen.insert(pool.sample(&mut rng));
        }
        assert_eq!(seen.len(), pool.len());
    }
}
