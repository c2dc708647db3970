/// [Szudzik pairing function][szudzik] with wrapping arithmetic.
///
/// ```text
/// (a, b) -> if a < b then b*b + a else a*a + a + b
/// ```
///
/// [szudzik]: https://en.wikipedia.org/wiki/Pairing_function
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Hash used for table buckets and cache slots.
///
/// Injective for small operands (below wrap-around), which is what makes the
/// lossy cache's stored-key comparison trustworthy in practice.
pub trait MyHash {
    fn hash(&self) -> u64;
}

impl MyHash for (u64, u64) {
    fn hash(&self) -> u64 {
        pairing2(self.0, self.1)
    }
}
