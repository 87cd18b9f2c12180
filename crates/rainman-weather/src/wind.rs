use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the 16 points of the compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindDirection {
    North,
    NorthNorthEast,
    NorthEast,
    EastNorthEast,
    East,
    EastSouthEast,
    SouthEast,
    SouthSouthEast,
    South,
    SouthSouthWest,
    SouthWest,
    WestSouthWest,
    West,
    WestNorthWest,
    NorthWest,
    NorthNorthWest,
}

/// 22.5° buckets centred on each point. North appears at both ends so that
/// readings just below 360° wrap back to it.
const COMPASS: [WindDirection; 17] = [
    WindDirection::North,
    WindDirection::NorthNorthEast,
    WindDirection::NorthEast,
    WindDirection::EastNorthEast,
    WindDirection::East,
    WindDirection::EastSouthEast,
    WindDirection::SouthEast,
    WindDirection::SouthSouthEast,
    WindDirection::South,
    WindDirection::SouthSouthWest,
    WindDirection::SouthWest,
    WindDirection::WestSouthWest,
    WindDirection::West,
    WindDirection::WestNorthWest,
    WindDirection::NorthWest,
    WindDirection::NorthNorthWest,
    WindDirection::North,
];

const BUCKET_DEGREES: f64 = 22.5;

impl WindDirection {
    /// Convert a meteorological angle into a compass point.
    ///
    /// Defined for `0.0..=360.0`; anything else (including NaN) yields `None`.
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !(0.0..=360.0).contains(&degrees) {
            return None;
        }
        let index = ((degrees + BUCKET_DEGREES / 2.0) / BUCKET_DEGREES) as usize;
        COMPASS.get(index).copied()
    }

    /// Abbreviated label, e.g. `"NNE"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::North => "N",
            Self::NorthNorthEast => "NNE",
            Self::NorthEast => "NE",
            Self::EastNorthEast => "ENE",
            Self::East => "E",
            Self::EastSouthEast => "ESE",
            Self::SouthEast => "SE",
            Self::SouthSouthEast => "SSE",
            Self::South => "S",
            Self::SouthSouthWest => "SSW",
            Self::SouthWest => "SW",
            Self::WestSouthWest => "WSW",
            Self::West => "W",
            Self::WestNorthWest => "WNW",
            Self::NorthWest => "NW",
            Self::NorthNorthWest => "NNW",
        }
    }
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
