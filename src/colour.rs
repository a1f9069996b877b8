//! Colour-to-material-name mapping for OBJ emission.
//!
//! `examples/original_source/parser.c` hard-codes a handful of hue constants
//! (`WhiteColour = 0xff`, `OrangeColour = 0x56`, `PeridotColour = 0x74`, ...)
//! used by the procedural generators, and calls out to `get_false_colour`/
//! `get_human_material`/`get_material` (declared in `colours.h`) to turn a
//! colour byte into a material name at OBJ-emit time. The backing palette
//! array behind `get_colour_name` was not present in the retained source set
//! (only the `colours.h` declaration survived) — the table below is this
//! crate's own reconstruction for the `--human` flag and is not claimed to
//! reproduce the original tool's exact strings.

pub const WHITE: u8 = 0xff;
pub const ORANGE: u8 = 0x56;
pub const BLACK: u8 = 0x00;
pub const PERIDOT: u8 = 0x74;
pub const PERU: u8 = 0x5c;
pub const DARK_GREY: u8 = 0x03;

const N_TINTS: u8 = 4;

/// 64 base colour names; each covers 4 tints (`colour % 4`) to span all 256
/// colour indices (`colour / 4` selects the name).
const PALETTE: [&str; 64] = [
    "black",
    "grey",
    "white",
    "red",
    "orange",
    "yellow",
    "peridot",
    "green",
    "cyan",
    "azure",
    "blue",
    "violet",
    "magenta",
    "rose",
    "peru",
    "sienna",
    "tan",
    "khaki",
    "olive",
    "forest",
    "teal",
    "navy",
    "indigo",
    "purple",
    "maroon",
    "crimson",
    "salmon",
    "coral",
    "amber",
    "gold",
    "lime",
    "jade",
    "mint",
    "turquoise",
    "cobalt",
    "sapphire",
    "amethyst",
    "orchid",
    "plum",
    "wine",
    "brick",
    "rust",
    "copper",
    "bronze",
    "sand",
    "wheat",
    "moss",
    "fern",
    "pine",
    "slate",
    "steel",
    "denim",
    "lavender",
    "mauve",
    "fuchsia",
    "cerise",
    "scarlet",
    "vermilion",
    "ochre",
    "mustard",
    "chartreuse",
    "emerald",
    "aqua",
    "riscos_grey",
];

fn human_colour_name(colour: u8) -> &'static str {
    PALETTE[(colour / N_TINTS) as usize]
}

/// Default material naming: `riscos_<n>`.
pub fn riscos_material(colour: u8) -> String {
    format!("riscos_{}", colour)
}

/// Human-readable material naming: `<colour-name>_<tint>`.
pub fn human_material(colour: u8) -> String {
    format!("{}_{}", human_colour_name(colour), colour % N_TINTS)
}

/// State for the false-colour material callback: assigns `(p * 4) % 256` per
/// primitive in output order. Kept as an explicit struct rather than a
/// hidden global counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct FalseColourState {
    ordinal: u32,
}

impl FalseColourState {
    pub fn new() -> Self {
        FalseColourState { ordinal: 0 }
    }

    /// Returns the false colour for the next primitive and advances the
    /// counter.
    pub fn next_colour(&mut self) -> u8 {
        let colour = ((self.ordinal.wrapping_mul(4)) % 256) as u8;
        self.ordinal += 1;
        colour
    }
}

/// The three material-naming strategies selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialStyle {
    Riscos,
    Human,
}

pub fn material_name(style: MaterialStyle, colour: u8) -> String {
    match style {
        MaterialStyle::Riscos => riscos_material(colour),
        MaterialStyle::Human => human_material(colour),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_riscos_material() {
        assert_eq!(riscos_material(255), "riscos_255");
        assert_eq!(riscos_material(0), "riscos_0");
    }

    #[test]
    fn test_human_material_tint() {
        assert_eq!(human_material(0), "black_0");
        assert_eq!(human_material(1), "black_1");
        assert_eq!(human_material(4), "grey_0");
    }

    #[test]
    fn test_false_colour_sequence() {
        let mut state = FalseColourState::new();
        assert_eq!(state.next_colour(), 0);
        assert_eq!(state.next_colour(), 4);
        assert_eq!(state.next_colour(), 8);
    }

    #[test]
    fn test_false_colour_wraps() {
        let mut state = FalseColourState {
            ordinal: 63, // 63*4 = 252
        };
        assert_eq!(state.next_colour(), 252);
        assert_eq!(state.next_colour(), 0); // 64*4=256 -> 0
    }

    #[test]
    fn test_material_name_dispatch() {
        assert_eq!(material_name(MaterialStyle::Riscos, 7), "riscos_7");
        assert_eq!(material_name(MaterialStyle::Human, 7), "grey_3");
    }
}
