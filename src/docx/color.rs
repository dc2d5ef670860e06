/// Closed palette of colour names accepted for watermarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Black,
    White,
    Red,
    DarkRed,
    Maroon,
    Orange,
    Gold,
    Yellow,
    Olive,
    Green,
    DarkGreen,
    Teal,
    Cyan,
    LightBlue,
    Blue,
    DarkBlue,
    Navy,
    Purple,
    Magenta,
    Pink,
    Brown,
    Silver,
    LightGray,
    Gray,
    DarkGray,
}

const PALETTE: &[(NamedColor, &str, &str)] = &[
    (NamedColor::Black, "Black", "000000"),
    (NamedColor::White, "White", "FFFFFF"),
    (NamedColor::Red, "Red", "FF0000"),
    (NamedColor::DarkRed, "DarkRed", "8B0000"),
    (NamedColor::Maroon, "Maroon", "800000"),
    (NamedColor::Orange, "Orange", "FFA500"),
    (NamedColor::Gold, "Gold", "FFD700"),
    (NamedColor::Yellow, "Yellow", "FFFF00"),
    (NamedColor::Olive, "Olive", "808000"),
    (NamedColor::Green, "Green", "008000"),
    (NamedColor::DarkGreen, "DarkGreen", "006400"),
    (NamedColor::Teal, "Teal", "008080"),
    (NamedColor::Cyan, "Cyan", "00FFFF"),
    (NamedColor::LightBlue, "LightBlue", "ADD8E6"),
    (NamedColor::Blue, "Blue", "0000FF"),
    (NamedColor::DarkBlue, "DarkBlue", "00008B"),
    (NamedColor::Navy, "Navy", "000080"),
    (NamedColor::Purple, "Purple", "800080"),
    (NamedColor::Magenta, "Magenta", "FF00FF"),
    (NamedColor::Pink, "Pink", "FFC0CB"),
    (NamedColor::Brown, "Brown", "A52A2A"),
    (NamedColor::Silver, "Silver", "C0C0C0"),
    (NamedColor::LightGray, "LightGray", "D3D3D3"),
    (NamedColor::Gray, "Gray", "808080"),
    (NamedColor::DarkGray, "DarkGray", "A9A9A9"),
];

impl NamedColor {
    /// Case-insensitive lookup; `None` for names outside the palette.
    pub fn parse(name: &str) -> Option<Self> {
        PALETTE
            .iter()
            .find(|(_, candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
            .map(|(color, _, _)| *color)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        PALETTE
            .iter()
            .find(|(_, _, candidate)| candidate.eq_ignore_ascii_case(hex))
            .map(|(color, _, _)| *color)
    }

    pub fn name(&self) -> &'static str {
        self.entry().1
    }

    pub fn hex(&self) -> &'static str {
        self.entry().2
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        PALETTE.iter().map(|(_, name, _)| *name)
    }

    fn entry(&self) -> &'static (NamedColor, &'static str, &'static str) {
        PALETTE
            .iter()
            .find(|(color, _, _)| color == self)
            .unwrap_or(&PALETTE[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_case() {
        assert_eq!(NamedColor::parse("red"), Some(NamedColor::Red));
        assert_eq!(NamedColor::parse("LIGHTGRAY"), Some(NamedColor::LightGray));
        assert_eq!(NamedColor::parse("Chartreuse"), None);
    }

    #[test]
    fn hex_lookup_round_trips() {
        for name in NamedColor::names() {
            let color = NamedColor::parse(name).expect("palette name");
            assert_eq!(color.name(), name);
            assert_eq!(NamedColor::from_hex(color.hex()), Some(color));
        }
        assert_eq!(NamedColor::from_hex("#ff0000"), Some(NamedColor::Red));
    }
}
