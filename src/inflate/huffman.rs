//! Two-level canonical Huffman decoding tables.

use crate::error::Error;

/// Number of bits resolved by the primary lookup table.
pub const FAST_LOOKUP_BITS: u32 = 9;

/// Longest code length DEFLATE allows.
pub const MAX_CODE_LENGTH: usize = 15;

/// Entries needed for the literal/length and distance tables.
///
/// 512 primary entries plus the largest sub-table space any valid set of at most 288
/// literal/length or 32 distance codes can use.
pub(crate) const HUFFMAN_TABLE_SIZE: usize = 1234;

/// Entries needed for the code length table, whose codes are at most 7 bits long.
pub(crate) const CODE_LENGTH_TABLE_SIZE: usize = 128;

/// Set on primary entries that point into a sub-table.
const REDIRECT: u32 = 1 << 31;

/// Which alphabet a table is built for. The alphabets differ in which incomplete code sets
/// they accept.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Alphabet {
    CodeLength,
    LiteralLength,
    Distance,
}

impl Alphabet {
    /// A single code of length one leaves half of the code space unused, but encoders emit
    /// it for blocks that only use one symbol.
    fn allows_single_code(self) -> bool {
        self != Alphabet::CodeLength
    }

    /// Blocks without back-references may not assign any distance codes at all.
    fn allows_empty(self) -> bool {
        self == Alphabet::Distance
    }
}

/// Result of looking up the buffered bits in a table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// A complete code, `length` bits long.
    Symbol { symbol: u16, length: u32 },
    /// The buffered bits are a prefix of a longer code.
    NeedMoreBits,
    /// No code starts with these bits.
    Invalid,
    /// The table itself is malformed.
    Corrupt,
}

/// A decoding table for one alphabet.
///
/// Entries are indexed by the next input bits in stream order (least significant bit
/// first). A symbol entry stores `length << 16 | symbol`, a redirect stores
/// `REDIRECT | sub_table_bits << 16 | sub_table_offset`, and zero marks bit patterns that
/// no code maps to.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct HuffmanTable<const N: usize> {
    #[cfg_attr(feature = "serde", serde(with = "crate::big_array"))]
    entries: [u32; N],
    primary_bits: u32,
}

impl<const N: usize> HuffmanTable<N> {
    pub const fn new() -> HuffmanTable<N> {
        HuffmanTable {
            entries: [0; N],
            primary_bits: 0,
        }
    }

    /// Rebuild the table from per-symbol code lengths, where zero means the symbol is unused.
    ///
    /// On error the table is left empty.
    pub fn build(&mut self, lengths: &[u8], alphabet: Alphabet) -> Result<(), Error> {
        self.entries.fill(0);
        self.primary_bits = 0;

        let mut counts = [0u32; MAX_CODE_LENGTH + 1];
        for &length in lengths {
            match counts.get_mut(usize::from(length)) {
                Some(count) => *count += 1,
                None => return Err(Error::InconsistentHuffmanDecoderState),
            }
        }
        counts[0] = 0;

        let used: u32 = counts.iter().sum();
        if used == 0 {
            return if alphabet.allows_empty() {
                Ok(())
            } else {
                Err(Error::NoHuffmanCodes)
            };
        }

        let mut min_length = 0;
        let mut max_length = 0;
        for length in 1..=MAX_CODE_LENGTH {
            if counts[length] != 0 {
                if min_length == 0 {
                    min_length = length as u32;
                }
                max_length = length as u32;
            }
        }

        // Kraft inequality, counted in units of the shortest remaining code space.
        let mut left: u32 = 1;
        for &count in &counts[1..] {
            left <<= 1;
            if count > left {
                return Err(Error::BadHuffmanCodeOverSubscribed);
            }
            left -= count;
        }
        if left != 0 && !(alphabet.allows_single_code() && used == 1 && counts[1] == 1) {
            return Err(Error::BadHuffmanCodeUnderSubscribed);
        }
        // Unreachable for complete codes over at most 288 symbols.
        if min_length > FAST_LOOKUP_BITS {
            return Err(Error::BadHuffmanMinimumCodeLength);
        }

        let mut next_code = [0u32; MAX_CODE_LENGTH + 1];
        let mut code = 0;
        for length in 1..=MAX_CODE_LENGTH {
            code = (code + counts[length - 1]) << 1;
            next_code[length] = code;
        }

        let primary_bits = max_length.min(FAST_LOOKUP_BITS);
        let primary_size = 1usize << primary_bits;
        let primary_mask = primary_size as u32 - 1;
        if primary_size > N {
            return Err(Error::InconsistentHuffmanDecoderState);
        }

        if max_length > primary_bits {
            // Size each sub-table for the longest code sharing its primary prefix.
            let mut sub_bits = [0u32; 1 << FAST_LOOKUP_BITS];
            let mut codes = next_code;
            for &length in lengths {
                let length = u32::from(length);
                if length == 0 {
                    continue;
                }
                let code = codes[length as usize];
                codes[length as usize] += 1;
                if length > primary_bits {
                    let prefix = (reverse_bits(code, length) & primary_mask) as usize;
                    sub_bits[prefix] = sub_bits[prefix].max(length - primary_bits);
                }
            }

            let mut next_free = primary_size;
            for (prefix, &bits) in sub_bits.iter().enumerate().take(primary_size) {
                if bits == 0 {
                    continue;
                }
                let size = 1usize << bits;
                if next_free + size > N {
                    self.entries.fill(0);
                    return Err(Error::InconsistentHuffmanDecoderState);
                }
                self.entries[prefix] = REDIRECT | (bits << 16) | next_free as u32;
                next_free += size;
            }
        }

        let mut codes = next_code;
        for (symbol, &length) in lengths.iter().enumerate() {
            let length = u32::from(length);
            if length == 0 {
                continue;
            }
            let code = codes[length as usize];
            codes[length as usize] += 1;
            let reversed = reverse_bits(code, length);
            let entry = (length << 16) | symbol as u32;

            if length <= primary_bits {
                let mut index = reversed as usize;
                while index < primary_size {
                    self.entries[index] = entry;
                    index += 1 << length;
                }
            } else {
                let redirect = self.entries[(reversed & primary_mask) as usize];
                let offset = (redirect & 0xFFFF) as usize;
                let size = 1usize << ((redirect >> 16) & 0xFF);
                let mut index = (reversed >> primary_bits) as usize;
                while index < size {
                    self.entries[offset + index] = entry;
                    index += 1 << (length - primary_bits);
                }
            }
        }

        self.primary_bits = primary_bits;
        Ok(())
    }

    /// Look up the code at the front of `bits`, of which the low `n_bits` are valid.
    #[inline]
    pub fn lookup(&self, bits: u32, n_bits: u32) -> Lookup {
        let primary_mask = (1 << self.primary_bits) - 1;
        let entry = self.entries[(bits & primary_mask) as usize];
        if entry & REDIRECT == 0 {
            return resolve(entry, n_bits, self.primary_bits);
        }
        if n_bits <= self.primary_bits {
            return Lookup::NeedMoreBits;
        }

        let offset = (entry & 0xFFFF) as usize;
        let sub_bits = (entry >> 16) & 0xFF;
        let index = offset + ((bits >> self.primary_bits) & ((1 << sub_bits) - 1)) as usize;
        match self.entries.get(index) {
            Some(&entry) if entry & REDIRECT == 0 => {
                resolve(entry, n_bits, self.primary_bits + sub_bits)
            }
            _ => Lookup::Corrupt,
        }
    }
}

impl<const N: usize> Default for HuffmanTable<N> {
    fn default() -> HuffmanTable<N> {
        HuffmanTable::new()
    }
}

#[inline]
fn resolve(entry: u32, n_bits: u32, width: u32) -> Lookup {
    let length = entry >> 16;
    if length == 0 {
        if n_bits >= width {
            Lookup::Invalid
        } else {
            Lookup::NeedMoreBits
        }
    } else if length <= n_bits {
        Lookup::Symbol {
            symbol: entry as u16,
            length,
        }
    } else {
        Lookup::NeedMoreBits
    }
}

/// Canonical codes are defined most significant bit first but arrive least significant
/// bit first.
#[inline]
fn reverse_bits(code: u32, length: u32) -> u32 {
    code.reverse_bits() >> (32 - length)
}
