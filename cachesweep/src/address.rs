/// The fields of an address which matter to a cache
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub tag: u64,
    pub index: usize,
    pub offset: u64,
}

/// Splits addresses into tag, set index, and block offset for a fixed cache geometry
///
/// The layout from the most significant bit down is `tag | index | offset`. Fully associative
/// caches have no index field, so `set_bits` is zero and every address maps to set 0
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressDecoder {
    block_size: u64,
    offset_bits: u32,
    set_bits: u32,
    fully_associative: bool,
}

impl AddressDecoder {
    /// Creates a decoder for a geometry. Both values must be non-zero
    ///
    /// Field widths are the floor of log2, so a block or set count which isn't a power of two
    /// only uses the lower power of two worth of offsets or sets for indexing
    ///
    /// # Arguments
    ///
    /// * `block_size`: The size of a block in bytes
    /// * `num_sets`: The number of sets, 1 for a fully associative cache
    /// * `fully_associative`: Whether the index field should be dropped entirely
    ///
    /// returns: AddressDecoder
    pub fn new(block_size: u64, num_sets: u64, fully_associative: bool) -> Self {
        Self {
            block_size,
            offset_bits: block_size.ilog2(),
            set_bits: if fully_associative { 0 } else { num_sets.ilog2() },
            fully_associative,
        }
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn set_bits(&self) -> u32 {
        self.set_bits
    }

    pub fn tag_shift(&self) -> u32 {
        self.offset_bits + self.set_bits
    }

    pub fn tag(&self, address: u64) -> u64 {
        // A 64 bit shift would overflow, and means there is no tag left
        address.checked_shr(self.tag_shift()).unwrap_or(0)
    }

    pub fn index(&self, address: u64) -> usize {
        if self.fully_associative {
            return 0;
        }
        ((address >> self.offset_bits) & ((1u64 << self.set_bits) - 1)) as usize
    }

    /// Not needed to decide hits, but useful for debugging
    pub fn offset(&self, address: u64) -> u64 {
        address & (self.block_size - 1)
    }

    /// # Examples
    ///
    /// ```
    /// use cachesweep::address::AddressDecoder;
    /// // 32 byte direct mapped cache with 4 byte blocks: 8 sets
    /// let decoder = AddressDecoder::new(4, 8, false);
    /// let decoded = decoder.decode(0x2D);
    /// assert_eq!((decoded.tag, decoded.index, decoded.offset), (1, 3, 1));
    /// ```
    pub fn decode(&self, address: u64) -> DecodedAddress {
        DecodedAddress {
            tag: self.tag(address),
            index: self.index(address),
            offset: self.offset(address),
        }
    }
}
