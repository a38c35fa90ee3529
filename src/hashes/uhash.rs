//! First-level bucket hashing.
//!
//! Maps an integer ULSH tuple to a `(main, control)` pair over the prime
//! `UH_PRIME`. One coefficient set is shared by all `L` tables, which lets
//! the index precompute each point's products once and reuse them for every
//! table; the recall guarantee is unaffected because bucket collisions are
//! already conditioned on ULSH equality.

use super::{MAX_HASH_RND, UH_PRIME};
use crate::types::HashValue;
use crate::utils::LshRng;

/// Identity of a g-bucket: the main hash locates the directory slot
/// (`main mod table_size`); the control hash disambiguates chains within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GBucketId {
    /// Main bucket hash in `[0, UH_PRIME)`.
    pub main: u32,
    /// Control hash in `[0, UH_PRIME)`.
    pub control: u32,
}

impl GBucketId {
    /// Directory slot for a table of `table_size` slots.
    #[inline]
    pub fn slot(&self, table_size: u32) -> u32 {
        self.main % table_size
    }
}

/// Per-tuple precomputed products.
///
/// `lo` products use the first half of the coefficient vectors, `hi`
/// products the second half; a u-pair combines the first tuple's `lo` with
/// the second tuple's `hi`. Without u-functions only the `lo` pair is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecomputedUhf {
    pub main_lo: u32,
    pub control_lo: u32,
    pub main_hi: u32,
    pub control_hi: u32,
}

/// Shared bucket-hash coefficient vectors of length `k`.
pub struct UHashCoefficients {
    half_len: usize,
    use_pairs: bool,
    main_hash_a: Vec<u32>,
    control_hash: Vec<u32>,
}

impl UHashCoefficients {
    /// Draw coefficient vectors for compound hashes of width `k`.
    ///
    /// When `use_pairs` is set, `k` must be even; tuples have length `k/2`
    /// and the two halves of each coefficient vector serve the two pair
    /// members. Coefficients are uniform in `[1, MAX_HASH_RND]`.
    pub fn draw(k: usize, use_pairs: bool, rng: &mut LshRng) -> Self {
        debug_assert!(!use_pairs || k % 2 == 0);

        let draw_vec = |rng: &mut LshRng| -> Vec<u32> {
            (0..k).map(|_| rng.uniform_u32(1, MAX_HASH_RND)).collect()
        };
        let main_hash_a = draw_vec(rng);
        let control_hash = draw_vec(rng);

        Self {
            half_len: if use_pairs { k / 2 } else { k },
            use_pairs,
            main_hash_a,
            control_hash,
        }
    }

    /// Tuple length the coefficient halves expect.
    #[inline]
    pub fn tuple_len(&self) -> usize {
        self.half_len
    }

    /// Whether g-functions are pairs of u-functions.
    #[inline]
    pub fn use_pairs(&self) -> bool {
        self.use_pairs
    }

    /// `Σ coeffs[j] · tuple[j] mod UH_PRIME`.
    fn product(coeffs: &[u32], tuple: &[HashValue]) -> u32 {
        debug_assert_eq!(coeffs.len(), tuple.len());
        let mut acc: u64 = 0;
        for (&c, &t) in coeffs.iter().zip(tuple) {
            acc = (acc + c as u64 * t as u64) % UH_PRIME;
        }
        acc as u32
    }

    /// Precompute the coefficient products of one ULSH tuple.
    pub fn precompute(&self, tuple: &[HashValue]) -> PrecomputedUhf {
        debug_assert_eq!(tuple.len(), self.half_len);

        let lo = ..self.half_len;
        let mut pre = PrecomputedUhf {
            main_lo: Self::product(&self.main_hash_a[lo], tuple),
            control_lo: Self::product(&self.control_hash[lo], tuple),
            ..PrecomputedUhf::default()
        };
        if self.use_pairs {
            let hi = self.half_len..2 * self.half_len;
            pre.main_hi = Self::product(&self.main_hash_a[hi.clone()], tuple);
            pre.control_hi = Self::product(&self.control_hash[hi], tuple);
        }
        pre
    }

    /// Bucket identity of a plain g-function (a single u-tuple).
    #[inline]
    pub fn bucket_id_single(&self, pre: &PrecomputedUhf) -> GBucketId {
        GBucketId {
            main: pre.main_lo,
            control: pre.control_lo,
        }
    }

    /// Bucket identity of a g-function formed by a pair of u-tuples.
    ///
    /// The first member contributes its `lo` products, the second its `hi`
    /// products; the combination is addition modulo `UH_PRIME`, identical at
    /// build and query.
    #[inline]
    pub fn bucket_id_pair(&self, first: &PrecomputedUhf, second: &PrecomputedUhf) -> GBucketId {
        GBucketId {
            main: ((first.main_lo as u64 + second.main_hi as u64) % UH_PRIME) as u32,
            control: ((first.control_lo as u64 + second.control_hi as u64) % UH_PRIME) as u32,
        }
    }
}
