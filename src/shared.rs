/// The order in which the code lengths of the code length alphabet are stored in a dynamic
/// block header.
pub const HUFFMAN_LENGTH_ORDER: [u8; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Initial value of an Adler-32 checksum.
pub const ADLER32_INIT: u32 = 1;

#[doc(hidden)]
#[cfg(not(feature = "simd"))]
pub fn update_adler32(adler: u32, data: &[u8]) -> u32 {
    let mut hash = adler2::Adler32::from_checksum(adler);
    hash.write_slice(data);
    hash.checksum()
}

#[doc(hidden)]
#[cfg(feature = "simd")]
pub fn update_adler32(adler: u32, data: &[u8]) -> u32 {
    let mut hash = simd_adler32::Adler32::from_checksum(adler);
    hash.write(data);
    hash.finish()
}

/// Running Adler-32 checksum.
///
/// Updates must be applied in output order, the checksum is order-sensitive.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Adler32 {
    state: u32,
}

impl Adler32 {
    pub const fn new() -> Adler32 {
        Adler32 {
            state: ADLER32_INIT,
        }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.state = update_adler32(self.state, data);
        }
    }

    #[inline]
    pub fn checksum(&self) -> u32 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ADLER32_INIT;
    }
}

impl Default for Adler32 {
    fn default() -> Adler32 {
        Adler32::new()
    }
}
