//! EDID manufacturer ID decoding.
//!
//! Bytes 8 and 9 of the base EDID block hold a big-endian 16-bit word with
//! three 5-bit letters packed into bits 14..10, 9..5 and 4..0, where 1 is
//! `A` and 26 is `Z`.

/// Offset of the manufacturer ID word within the base block.
const MANUFACTURER_OFFSET: usize = 8;

/// Decodes the three-letter PNP manufacturer ID (`DEL`, `SAM`, ...).
///
/// Returns `None` if the block is too short or a letter is out of range.
pub fn manufacturer_id(edid: &[u8]) -> Option<String> {
    let bytes = edid.get(MANUFACTURER_OFFSET..MANUFACTURER_OFFSET + 2)?;
    let word = u16::from_be_bytes([bytes[0], bytes[1]]);

    [10u16, 5, 0]
        .iter()
        .map(|shift| {
            let code = ((word >> shift) & 0x1F) as u8;
            (1..=26).contains(&code).then(|| char::from(b'@' + code))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with_id(hi: u8, lo: u8) -> Vec<u8> {
        let mut block = vec![0u8; 128];
        block[8] = hi;
        block[9] = lo;
        block
    }

    #[test]
    fn test_decodes_dell() {
        // "DEL" = 4, 5, 12 -> 0b0_00100_00101_01100 = 0x10AC
        assert_eq!(manufacturer_id(&block_with_id(0x10, 0xAC)).as_deref(), Some("DEL"));
    }

    #[test]
    fn test_decodes_samsung() {
        // "SAM" = 19, 1, 13 -> 0x4C2D
        assert_eq!(manufacturer_id(&block_with_id(0x4C, 0x2D)).as_deref(), Some("SAM"));
    }

    #[test]
    fn test_short_block_is_none() {
        assert_eq!(manufacturer_id(&[0u8; 9]), None);
        assert_eq!(manufacturer_id(&[]), None);
    }

    #[test]
    fn test_zero_letter_is_none() {
        assert_eq!(manufacturer_id(&block_with_id(0, 0)), None);
    }
}
