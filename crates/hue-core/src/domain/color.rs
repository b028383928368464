//! 8-bit RGB color.

/// An 8-bit-per-component RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Color every channel holds when a session starts.
    pub const IDLE: Rgb = Rgb::new(180, 180, 180);

    /// Full white at full brightness; written before the final frame so the
    /// lights do not freeze on the last dynamic color.
    pub const NEUTRAL: Rgb = Rgb::new(255, 255, 255);

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}
