//! Monochrome palettes. The field only ever renders white-on-black or its
//! inverse, so palettes are static pairs rather than configurable colors.

/// Fill colors for one render mode. `background` clears the frame, `dot`
/// fills every disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub dot: &'static str,
}

pub const DARK: Palette = Palette {
    background: "#000000",
    dot: "#ffffff",
};

pub const LIGHT: Palette = Palette {
    background: "#ffffff",
    dot: "#000000",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Dark,
    Light,
}

impl Mode {
    #[inline]
    pub fn palette(self) -> Palette {
        match self {
            Mode::Dark => DARK,
            Mode::Light => LIGHT,
        }
    }

    #[inline]
    pub fn inverted(self) -> Mode {
        match self {
            Mode::Dark => Mode::Light,
            Mode::Light => Mode::Dark,
        }
    }

    /// Parses the page-facing mode name. Unknown names map to `None` so the
    /// caller can fall back to its default.
    pub fn from_name(name: &str) -> Option<Mode> {
        match name {
            "dark" => Some(Mode::Dark),
            "light" => Some(Mode::Light),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverting_twice_returns_to_the_original_mode() {
        assert_eq!(Mode::Dark.inverted().inverted(), Mode::Dark);
        assert_eq!(Mode::Light.inverted().inverted(), Mode::Light);
    }

    #[test]
    fn mode_names_parse_and_unknown_names_are_rejected() {
        assert_eq!(Mode::from_name("dark"), Some(Mode::Dark));
        assert_eq!(Mode::from_name("light"), Some(Mode::Light));
        assert_eq!(Mode::from_name("sepia"), None);
    }
}
