use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CardError;

/// Card shapes offered by the editor.
///
/// The two units are unordered; orientation decides which one ends up as the
/// displayed width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    Wide,
    Square,
    #[default]
    Classic,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] =
        [AspectRatio::Wide, AspectRatio::Square, AspectRatio::Classic];

    pub fn units(self) -> (u32, u32) {
        match self {
            AspectRatio::Wide => (16, 9),
            AspectRatio::Square => (1, 1),
            AspectRatio::Classic => (4, 3),
        }
    }

    pub fn is_square(self) -> bool {
        let (w, h) = self.units();
        w == h
    }

    /// Long side divided by short side, always `>= 1.0`.
    pub fn long_to_short(self) -> f64 {
        let (w, h) = self.units();
        f64::from(w.max(h)) / f64::from(w.min(h))
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.units();
        write!(f, "{w}:{h}")
    }
}

impl FromStr for AspectRatio {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CardError::InvalidRatio(s.to_owned());
        let (w, h) = s.trim().split_once(':').ok_or_else(invalid)?;
        let w: u32 = w.trim().parse().map_err(|_| invalid())?;
        let h: u32 = h.trim().parse().map_err(|_| invalid())?;

        AspectRatio::ALL.into_iter().find(|ratio| ratio.units() == (w, h)).ok_or_else(invalid)
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => f.write_str("horizontal"),
            Orientation::Vertical => f.write_str("vertical"),
        }
    }
}

impl FromStr for Orientation {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            _ => Err(CardError::InvalidOrientation(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_ratios() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Wide);
        assert_eq!(" 1:1 ".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!("4:3".parse::<AspectRatio>().unwrap(), AspectRatio::Classic);
    }

    #[test]
    fn rejects_malformed_or_unknown_ratios() {
        for text in ["", "16x9", "16:", ":9", "a:b", "3:2", "9:16"] {
            assert!(text.parse::<AspectRatio>().is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn display_matches_parse() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.to_string().parse::<AspectRatio>().unwrap(), ratio);
        }
    }

    #[test]
    fn long_to_short_is_never_below_one() {
        assert_eq!(AspectRatio::Square.long_to_short(), 1.0);
        assert!((AspectRatio::Wide.long_to_short() - 16.0 / 9.0).abs() < 1e-12);
        assert!((AspectRatio::Classic.long_to_short() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn orientation_text_forms() {
        assert_eq!("Horizontal".parse::<Orientation>().unwrap(), Orientation::Horizontal);
        assert_eq!(Orientation::Vertical.to_string(), "vertical");
        assert!("diagonal".parse::<Orientation>().is_err());
        assert_eq!(Orientation::Horizontal.flipped(), Orientation::Vertical);
    }
}
