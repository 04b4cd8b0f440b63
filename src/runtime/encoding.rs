use std::fmt::{self, Display, Formatter};

/// Payload encodings a peer may advertise in a SETTINGS frame. Only HB1
/// exists today; other values are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Encoding {
    #[default]
    Hb1 = 0,
}

impl Encoding {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Encoding::Hb1),
            _ => None,
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Hb1 => f.write_str("HB1"),
        }
    }
}
