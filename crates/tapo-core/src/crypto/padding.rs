//! PKCS#7 padding.
//!
//! Every padded buffer ends in `n` bytes of value `n`, where `n` is between 1
//! and the block size. Input that is already block aligned still gets a full
//! block of padding, so [`unpad`] can always tell data from padding.

use super::CipherError;

/// Pads `data` to a multiple of `block_size`.
///
/// Always appends between 1 and `block_size` bytes.
///
/// # Panics
///
/// Panics if `block_size` is 0 or larger than 255, since the pad length must
/// fit in a single byte.
///
/// # Example
///
/// ```
/// use tapo_core::crypto::padding::pad;
///
/// assert_eq!(pad(b"abc", 4), b"abc\x01");
/// assert_eq!(pad(b"abcd", 4), b"abcd\x04\x04\x04\x04");
/// ```
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    assert!(
        (1..=255).contains(&block_size),
        "block size must be between 1 and 255"
    );

    let pad_len = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

/// Strips PKCS#7 padding from `data`.
///
/// Empty input is passed through unchanged. A pad length of zero, a pad length
/// longer than the buffer, or any trailing byte that disagrees with the pad
/// length is rejected with [`CipherError::InvalidPadding`].
///
/// # Example
///
/// ```
/// use tapo_core::crypto::padding::unpad;
///
/// assert_eq!(unpad(b"abc\x01").unwrap(), b"abc");
/// assert!(unpad(b"abc\x02").is_err());
/// ```
pub fn unpad(data: &[u8]) -> Result<&[u8], CipherError> {
    let Some(&last) = data.last() else {
        return Ok(data);
    };

    let pad_len = last as usize;
    if pad_len == 0 || pad_len > data.len() {
        return Err(CipherError::InvalidPadding);
    }

    let (body, padding) = data.split_at(data.len() - pad_len);
    if padding.iter().any(|&b| b != last) {
        return Err(CipherError::InvalidPadding);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Vec<u8>> {
        (0..=40u8).map(|len| (0..len).collect()).collect()
    }

    #[test]
    fn test_pad_unpad_roundtrip() {
        for block_size in [8, 16] {
            for sample in samples() {
                let padded = pad(&sample, block_size);
                assert_eq!(unpad(&padded).unwrap(), sample.as_slice());
            }
        }
    }

    #[test]
    fn test_pad_growth_bounds() {
        for block_size in [8, 16] {
            for sample in samples() {
                let padded = pad(&sample, block_size);
                let grown = padded.len() - sample.len();
                assert!((1..=block_size).contains(&grown));
                assert_eq!(padded.len() % block_size, 0);
            }
        }
    }

    #[test]
    fn test_pad_aligned_input_gets_full_block() {
        let padded = pad(&[0xAA; 16], 16);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn test_unpad_empty_is_passthrough() {
        assert_eq!(unpad(&[]).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_unpad_pad_len_exceeds_buffer() {
        assert_eq!(unpad(&[1, 2, 9]), Err(CipherError::InvalidPadding));
    }

    #[test]
    fn test_unpad_zero_pad_len() {
        assert_eq!(unpad(&[1, 2, 0]), Err(CipherError::InvalidPadding));
    }

    #[test]
    fn test_unpad_mismatched_padding_bytes() {
        assert_eq!(unpad(b"abcd\x03\x04\x04\x04"), Err(CipherError::InvalidPadding));
    }

    #[test]
    fn test_flipped_last_byte_detected() {
        let mut padded = pad(b"hello world", 16);
        let last = padded.len() - 1;
        // 5 bytes of 0x05; flipping the low bit gives 0x04, which leaves a
        // stray 0x05 in front of the four bytes it now claims.
        padded[last] ^= 0x01;
        assert_eq!(unpad(&padded), Err(CipherError::InvalidPadding));

        let mut padded = pad(b"hello world", 16);
        padded[last] ^= 0x80;
        assert_eq!(unpad(&padded), Err(CipherError::InvalidPadding));
    }
}
