/// RGB fill color for text.
///
/// Each component is in the range 0.0 (none) to 1.0 (full intensity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Near-black used when a block has no color of its own.
    pub const DEFAULT_TEXT: Color = Color {
        r: 0.2,
        g: 0.2,
        b: 0.2,
    };

    /// Create a color from RGB components (each 0.0–1.0).
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb`. Short form is
    /// expanded by doubling each digit. Returns None for anything
    /// else.
    pub fn from_hex(hex: &str) -> Option<Color> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let full: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let channel = |i: usize| {
            u8::from_str_radix(&full[i..i + 2], 16)
                .ok()
                .map(|v| f64::from(v) / 255.0)
        };
        Some(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Resolve a CSS color value: hex notation or one of a few
    /// basic color keywords.
    pub fn from_css(value: &str) -> Option<Color> {
        let value = value.trim().to_ascii_lowercase();
        let hex = match value.as_str() {
            "black" => "#000000",
            "white" => "#ffffff",
            "gray" | "grey" => "#808080",
            "red" => "#ff0000",
            "green" => "#008000",
            "blue" => "#0000ff",
            "navy" => "#000080",
            "maroon" => "#800000",
            "orange" => "#ffa500",
            "purple" => "#800080",
            other => other,
        };
        Color::from_hex(hex)
    }

    /// Operands for the `rg`/`RG` operators, three decimals each.
    pub fn operands(&self) -> String {
        format!("{:.3} {:.3} {:.3}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::DEFAULT_TEXT
    }
}
