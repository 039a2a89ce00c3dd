//! Stable 32-bit hashing primitives.
//!
//! String features are mapped to integer indices with a Murmur3-derived
//! 32-bit hash operating on UTF-16 code units; integer indices are mixed with
//! the same finalizer. The constants are fixed so hashes are identical across
//! runs, processes, and platforms, which is required for reproducible serving
//! and training/serving parity.

/// FNV-1 32-bit prime, used to fold component hashes into a definition id.
pub const FNV1_PRIME_32: i32 = 16777619;

/// FNV-1 32-bit offset basis.
pub const FNV1_32_INIT: i32 = 0x811c9dc5u32 as i32;

const C1: i32 = 0xcc9e2d51u32 as i32;
const C2: i32 = 0x1b873593u32 as i32;

#[inline]
fn mix_k1(mut k1: i32) -> i32 {
    k1 = k1.wrapping_mul(C1);
    k1 = k1.rotate_left(15);
    k1.wrapping_mul(C2)
}

#[inline]
fn mix_h1(mut h1: i32, k1: i32) -> i32 {
    h1 ^= k1;
    h1 = h1.rotate_left(13);
    h1.wrapping_mul(5).wrapping_add(0xe6546b64u32 as i32)
}

// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix(mut h1: i32, length: i32) -> i32 {
    h1 ^= length;
    h1 ^= ((h1 as u32) >> 16) as i32;
    h1 = h1.wrapping_mul(0x85ebca6bu32 as i32);
    h1 ^= ((h1 as u32) >> 13) as i32;
    h1 = h1.wrapping_mul(0xc2b2ae35u32 as i32);
    h1 ^= ((h1 as u32) >> 16) as i32;
    h1
}

/// Mixes a single 32-bit integer.
#[inline]
pub fn hash_i32(input: i32) -> i32 {
    let k1 = mix_k1(input);
    let h1 = mix_h1(0, k1);
    fmix(h1, 4)
}

/// Hashes a string over its UTF-16 code units, two units per block.
pub fn hash_string(input: &str) -> i32 {
    let units: Vec<u16> = input.encode_utf16().collect();
    let mut h1: i32 = 0;

    let mut i = 1;
    while i < units.len() {
        let k1 = (units[i - 1] as i32) | ((units[i] as i32) << 16);
        h1 = mix_h1(h1, mix_k1(k1));
        i += 2;
    }

    if units.len() & 1 == 1 {
        let k1 = units[units.len() - 1] as i32;
        h1 ^= mix_k1(k1);
    }

    fmix(h1, 2 * units.len() as i32)
}

/// Folds a sequence of hashes with FNV-1 (XOR then multiply).
pub fn fold_hashes(hashes: &[i32]) -> i32 {
    let mut ret = FNV1_32_INIT;
    for &h in hashes {
        ret ^= h;
        ret = ret.wrapping_mul(FNV1_PRIME_32);
    }
    ret
}
