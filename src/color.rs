use std::ops::AddAssign;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RGBColorFormat<T> {
    pub red: T,
    pub green: T,
    pub blue: T,
}

impl<T> RGBColorFormat<T> {
    pub fn new(red: T, green: T, blue: T) -> Self {
        RGBColorFormat { red, green, blue }
    }
}

impl RGBColorFormat<u8> {
    pub fn black() -> Self {
        RGBColorFormat::default()
    }

    /// Palette quads are stored as blue, green, red, reserved.
    pub fn from_bgr_quad(quad: [u8; 4]) -> Self {
        RGBColorFormat {
            red: quad[2],
            green: quad[1],
            blue: quad[0],
        }
    }

    pub fn to_bgr_quad(self) -> [u8; 4] {
        [self.blue, self.green, self.red, 0]
    }
}

impl AddAssign<RGBColorFormat<u8>> for RGBColorFormat<u64> {
    fn add_assign(&mut self, rhs: RGBColorFormat<u8>) {
        self.red += rhs.red as u64;
        self.green += rhs.green as u64;
        self.blue += rhs.blue as u64;
    }
}

impl RGBColorFormat<u64> {
    /// Integer mean of accumulated channels, truncated towards zero.
    ///
    /// Callers guarantee `count > 0` and that every summand was at most 255,
    /// so each quotient fits into a byte.
    pub fn mean(&self, count: u64) -> RGBColorFormat<u8> {
        RGBColorFormat {
            red: (self.red / count) as u8,
            green: (self.green / count) as u8,
            blue: (self.blue / count) as u8,
        }
    }
}
