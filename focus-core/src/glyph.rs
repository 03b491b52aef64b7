//! Block-letter clock digits

const HEIGHT: usize = 5;
const GAP: &str = "  ";

type Glyph = [&'static str; HEIGHT];

static DIGITS: [Glyph; 10] = [
    ["██████", "██  ██", "██  ██", "██  ██", "██████"],
    ["████  ", "  ██  ", "  ██  ", "  ██  ", "██████"],
    ["██████", "    ██", "██████", "██    ", "██████"],
    ["██████", "    ██", "██████", "    ██", "██████"],
    ["██  ██", "██  ██", "██████", "    ██", "    ██"],
    ["██████", "██    ", "██████", "    ██", "██████"],
    ["██████", "██    ", "██████", "██  ██", "██████"],
    ["██████", "    ██", "    ██", "    ██", "    ██"],
    ["██████", "██  ██", "██████", "██  ██", "██████"],
    ["██████", "██  ██", "██████", "    ██", "██████"],
];

static COLON: Glyph = ["  ", "██", "  ", "██", "  "];

/// Same width as a digit so a blanked digit does not shift the clock.
static BLANK: Glyph = ["      "; HEIGHT];

fn glyph(c: char) -> Option<&'static Glyph> {
    match c {
        '0'..='9' => c.to_digit(10).map(|d| &DIGITS[d as usize]),
        ':' => Some(&COLON),
        ' ' => Some(&BLANK),
        _ => None,
    }
}

/// Renders digits, colons and spaces as five rows of block art.
///
/// Other characters are skipped. When nothing is renderable the input comes
/// back unchanged.
pub fn render(text: &str) -> String {
    let glyphs: Vec<&Glyph> = text.chars().filter_map(glyph).collect();
    if glyphs.is_empty() {
        return text.to_string();
    }

    (0..HEIGHT)
        .map(|row| {
            glyphs
                .iter()
                .map(|g| g[row])
                .collect::<Vec<_>>()
                .join(GAP)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
