use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Platform {
    Auto,
    Win32,
    PS3,
    PS4,
    NSW,
    N3DS,
    X360,
    Android,
}

impl Platform {
    pub fn is_big_endian(self) -> bool {
        matches!(self, Platform::PS3 | Platform::X360)
    }
}
