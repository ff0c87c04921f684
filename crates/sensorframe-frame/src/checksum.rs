//! Frame integrity checks.
//!
//! Two strategies cover the supported wire formats:
//! - an additive 8-bit sum (IMU)
//! - a table-driven, bit-reflected CRC-32 (GPS)

/// Reflected CRC-32 polynomial used by the GPS receiver.
pub const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;

/// Byte-at-a-time lookup table, built once at compile time.
static CRC32_TABLE: [u32; 256] = crc32_table();

const fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = crc32_value(i as u8);
        i += 1;
    }
    table
}

/// Compute one table entry: eight reflected shift steps over `index`.
pub const fn crc32_value(index: u8) -> u32 {
    let mut crc = index as u32;
    let mut bit = 0;
    while bit < 8 {
        if crc & 1 != 0 {
            crc = (crc >> 1) ^ CRC32_POLYNOMIAL;
        } else {
            crc >>= 1;
        }
        bit += 1;
    }
    crc
}

/// Accumulate `bytes` into a CRC-32 starting from `seed`.
///
/// The receiver seeds with 0 and applies no final inversion.
pub fn crc32(seed: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(seed, |crc, &b| {
        (crc >> 8) ^ CRC32_TABLE[((crc ^ u32::from(b)) & 0xFF) as usize]
    })
}

/// Sum of `bytes` modulo 256.
pub fn additive_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Integrity check strategy selected by a protocol descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// One trailing byte holding the 8-bit sum of every preceding byte.
    AdditiveSum,
    /// Four trailing bytes holding a reflected CRC-32, seeded at 0.
    ///
    /// The trailer is read little-endian and compared against the computed
    /// value with its byte order reversed.
    Crc32Reflected,
}

impl ChecksumKind {
    /// Number of trailer bytes carrying the check value.
    pub const fn trailer_len(self) -> usize {
        match self {
            ChecksumKind::AdditiveSum => 1,
            ChecksumKind::Crc32Reflected => 4,
        }
    }

    /// Compute the check value over `bytes`.
    pub fn compute(self, bytes: &[u8]) -> u32 {
        match self {
            ChecksumKind::AdditiveSum => u32::from(additive_sum(bytes)),
            ChecksumKind::Crc32Reflected => crc32(0, bytes),
        }
    }

    /// The trailer value a sender must transmit for a computed check value.
    pub fn expected_trailer(self, computed: u32) -> u32 {
        match self {
            ChecksumKind::AdditiveSum => computed & 0xFF,
            ChecksumKind::Crc32Reflected => computed.swap_bytes(),
        }
    }

    /// Compare a computed value with the little-endian trailer value.
    pub fn matches(self, computed: u32, received: u32) -> bool {
        self.expected_trailer(computed) == received
    }

    /// Short name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ChecksumKind::AdditiveSum => "sum8",
            ChecksumKind::Crc32Reflected => "crc32",
        }
    }
}

/// Outcome of the trailer comparison for a completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChecksumStatus {
    /// Value computed over the frame bytes preceding the trailer.
    pub computed: u32,
    /// Trailer bytes merged little-endian.
    pub received: u32,
    /// Whether the two agree under the strategy's comparison rule.
    pub matched: bool,
}
