//! Key distance model for Camelot labels.
//!
//! Maps a label such as `"8A"` to a scalar: wheel position times ten, plus
//! five for the major (`B`) side. The encoding is linear, so `12A` and `1A`
//! sit at opposite ends of the scale even though they neighbour each other
//! on the wheel.

/// Distance assigned to missing or unparseable keys. Larger than any valid
/// key so those tracks sort last.
pub const UNKNOWN_KEY_DISTANCE: u16 = 999;

/// Offset added for the major side of the wheel.
const MAJOR_OFFSET: u16 = 5;

/// Minor (`A`) or major (`B`) side of the Camelot wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Minor,
    Major,
}

/// A parsed Camelot key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CamelotKey {
    /// Wheel position, 1–12.
    pub position: u8,
    pub mode: Mode,
}

impl CamelotKey {
    #[must_use]
    pub fn distance(self) -> u16 {
        let offset = match self.mode {
            Mode::Minor => 0,
            Mode::Major => MAJOR_OFFSET,
        };
        u16::from(self.position) * 10 + offset
    }
}

/// Parse a Camelot label, tolerating surrounding whitespace and a lower-case
/// suffix. Returns `None` for placeholders like `"?"` or `"Unknown"`.
#[must_use]
pub fn parse_camelot(label: &str) -> Option<CamelotKey> {
    let label = label.trim();
    let suffix = label.chars().last()?;
    let digits = &label[..label.len() - suffix.len_utf8()];

    let mode = match suffix.to_ascii_uppercase() {
        'A' => Mode::Minor,
        'B' => Mode::Major,
        _ => return None,
    };

    let well_formed = matches!(digits.len(), 1 | 2)
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0');
    if !well_formed {
        return None;
    }

    match digits.parse::<u8>() {
        Ok(position @ 1..=12) => Some(CamelotKey { position, mode }),
        _ => None,
    }
}

/// Scalar ordering value for an optional key label.
#[must_use]
pub fn key_distance(label: Option<&str>) -> u16 {
    label
        .and_then(parse_camelot)
        .map_or(UNKNOWN_KEY_DISTANCE, CamelotKey::distance)
}
