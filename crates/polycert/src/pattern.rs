//! Activation patterns: canonical identifiers for linear regions.
//!
//! One bit per piecewise-linear unit, in the network's global unit order,
//! packed into 64-bit words. Two points with equal keys lie in the same
//! polytope; flipping bit `i` names the region glued across unit `i`'s
//! boundary.

use std::fmt;

/// Canonical, order-independent identity of a linear region.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ActivationKey {
    words: Vec<u64>,
    len: usize,
}

impl ActivationKey {
    /// Build a key from unit states in canonical order (`true` = active).
    pub fn from_signs<I: IntoIterator<Item = bool>>(signs: I) -> Self {
        let mut words = Vec::new();
        let mut len = 0usize;
        for s in signs {
            if len % 64 == 0 {
                words.push(0u64);
            }
            if s {
                words[len / 64] |= 1u64 << (len % 64);
            }
            len += 1;
        }
        Self { words, len }
    }

    /// Number of units in the key.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// State of unit `i`.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        self.words[i / 64] >> (i % 64) & 1 == 1
    }

    /// Key of the region glued across unit `i`'s boundary.
    pub fn flipped(&self, i: usize) -> ActivationKey {
        debug_assert!(i < self.len);
        let mut out = self.clone();
        out.words[i / 64] ^= 1u64 << (i % 64);
        out
    }

    /// Index of the single differing unit, if the keys differ in exactly one.
    pub fn single_diff(&self, other: &ActivationKey) -> Option<usize> {
        if self.len != other.len {
            return None;
        }
        let mut found: Option<usize> = None;
        for (w, (a, b)) in self.words.iter().zip(&other.words).enumerate() {
            let mut diff = a ^ b;
            while diff != 0 {
                if found.is_some() {
                    return None;
                }
                found = Some(w * 64 + diff.trailing_zeros() as usize);
                diff &= diff - 1;
            }
        }
        found
    }
}

impl fmt::Debug for ActivationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActivationKey(")?;
        for i in 0..self.len {
            write!(f, "{}", if self.get(i) { '1' } else { '0' })?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_roundtrip_across_word_boundary() {
        let signs: Vec<bool> = (0..130).map(|i| i % 3 == 0).collect();
        let key = ActivationKey::from_signs(signs.iter().copied());
        assert_eq!(key.len(), 130);
        for (i, s) in signs.iter().enumerate() {
            assert_eq!(key.get(i), *s);
        }
    }

    #[test]
    fn flipped_differs_in_exactly_one_unit() {
        let key = ActivationKey::from_signs([true, false, true, true]);
        let adj = key.flipped(2);
        assert!(!adj.get(2));
        assert_eq!(key.single_diff(&adj), Some(2));
        assert_eq!(adj.single_diff(&key), Some(2));
        assert_eq!(key.single_diff(&key), None);
        let far = adj.flipped(0);
        assert_eq!(key.single_diff(&far), None);
    }

    #[test]
    fn keys_hash_equal_iff_same_pattern() {
        let a = ActivationKey::from_signs([true, true, false]);
        let b = ActivationKey::from_signs([true, true, false]);
        let c = ActivationKey::from_signs([true, false, false]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
