//! Token placement of partition keys.

use std::fmt::Debug;

/// Maps a serialized partition key to the token that decides its owner and
/// its position in the output file.
pub trait Partitioner: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn token(&self, partition_key: &[u8]) -> i64;
}

/// MurmurHash3 x64/128 partitioner, token compatible with the target store.
///
/// The store's hash reads tail bytes as signed values, so keys containing
/// bytes >= 0x80 in their last partial block hash differently from the
/// reference MurmurHash3. That variant is kept here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3Partitioner;

impl Partitioner for Murmur3Partitioner {
    fn name(&self) -> &'static str {
        "Murmur3Partitioner"
    }

    fn token(&self, partition_key: &[u8]) -> i64 {
        normalize(hash3_x64_128(partition_key, 0)[0] as i64)
    }
}

/// `i64::MIN` is reserved as the minimum token.
fn normalize(token: i64) -> i64 {
    if token == i64::MIN { i64::MAX } else { token }
}

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

fn fmix(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

pub fn hash3_x64_128(key: &[u8], seed: u64) -> [u64; 2] {
    let mut h1 = seed;
    let mut h2 = seed;

    let mut blocks = key.chunks_exact(16);
    for block in &mut blocks {
        h1 ^= mix_k1(read_u64_le(&block[..8]));
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dc_e729);

        h2 ^= mix_k2(read_u64_le(&block[8..]));
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x3849_5ab5);
    }

    let tail = blocks.remainder();
    // sign-extended, see `Murmur3Partitioner`
    let signed = |i: usize| tail[i] as i8 as i64 as u64;

    if tail.len() > 8 {
        let k2 = (8..tail.len()).fold(0u64, |k, i| k ^ (signed(i) << ((i - 8) * 8)));
        h2 ^= mix_k2(k2);
    }
    if !tail.is_empty() {
        let k1 = (0..tail.len().min(8)).fold(0u64, |k, i| k ^ (signed(i) << (i * 8)));
        h1 ^= mix_k1(k1);
    }

    let len = key.len() as u64;
    h1 ^= len;
    h2 ^= len;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix(h1);
    h2 = fmix(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    [h1, h2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_hashes_to_zero() {
        assert_eq!(hash3_x64_128(b"", 0), [0, 0]);
        assert_eq!(Murmur3Partitioner.token(b""), 0);
    }

    #[test]
    fn ascii_key_matches_reference_murmur3() {
        let [h1, h2] = hash3_x64_128(b"foo", 0);
        assert_eq!(h1 as i64, -2129773440516405919);
        assert_eq!(h2, 9128664383759220103);
        assert_eq!(Murmur3Partitioner.token(b"foo"), -2129773440516405919);
    }

    #[test]
    fn tail_bytes_above_0x7f_are_hashed() {
        let a = Murmur3Partitioner.token(&[0x7f]);
        let b = Murmur3Partitioner.token(&[0x80]);
        assert_ne!(a, b);
        assert_eq!(b, Murmur3Partitioner.token(&[0x80]));
    }

    #[test]
    fn long_keys_use_every_block() {
        let base = b"0123456789abcdef0123456789abcdef-tail".to_vec();
        let mut changed = base.clone();
        changed[3] = b'X';
        assert_ne!(
            Murmur3Partitioner.token(&base),
            Murmur3Partitioner.token(&changed)
        );
    }

    #[test]
    fn minimum_token_is_reserved() {
        assert_eq!(normalize(i64::MIN), i64::MAX);
        assert_eq!(normalize(-1), -1);
    }
}
