///
/// 128-bit decimal values as they cross the ABI: a signed unscaled integer split
/// into high/low 64-bit halves, plus precision and scale.
///

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    pub value: i128,
    pub precision: i32,
    pub scale: i32,
}

impl Decimal128 {
    pub const MAX_PRECISION: i32 = 38;

    pub fn new(value: i128, precision: i32, scale: i32) -> Self {
        Self { value, precision, scale }
    }

    pub fn from_parts(high: i64, low: u64, precision: i32, scale: i32) -> Self {
        let value = ((high as i128) << 64) | (low as i128);
        Self { value, precision, scale }
    }

    pub fn high(&self) -> i64 {
        (self.value >> 64) as i64
    }

    pub fn low(&self) -> u64 {
        self.value as u64
    }

    pub fn to_le_bytes(&self) -> [u8; 16] {
        self.value.to_le_bytes()
    }
}
