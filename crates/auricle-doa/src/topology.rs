use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speed of sound in air, m/s.
pub const SOUND_SPEED: f64 = 343.2;

const SPACING_SQUARE4_M: f64 = 0.08127;
const SPACING_CIRCULAR_M: f64 = 0.064;

const PAIRS_PAIR2: [[usize; 2]; 1] = [[0, 1]];
const PAIRS_SQUARE4: [[usize; 2]; 2] = [[0, 2], [1, 3]];
const PAIRS_CIRCULAR: [[usize; 2]; 3] = [[1, 4], [2, 5], [3, 6]];

/// Physical microphone arrangement of the array.
///
/// Each topology fixes the capture channel count, the microphone spacing of
/// its delay-estimation pairs, and which channel indices form those pairs.
/// `Hex6Plus1` shares the 8-channel layout and pair groups of `Circular8`;
/// its extra slots carry non-microphone channels that no pair references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayTopology {
    Pair2,
    Square4,
    Hex6Plus1,
    Circular8,
}

impl ArrayTopology {
    /// Number of interleaved capture channels the hardware exposes.
    pub fn channels(self) -> u16 {
        match self {
            Self::Pair2 => 2,
            Self::Square4 => 4,
            Self::Hex6Plus1 | Self::Circular8 => 8,
        }
    }

    /// Distance in meters between the two microphones of a pair.
    pub fn spacing_m(self) -> f64 {
        match self {
            Self::Pair2 | Self::Square4 => SPACING_SQUARE4_M,
            Self::Hex6Plus1 | Self::Circular8 => SPACING_CIRCULAR_M,
        }
    }

    /// Largest physically possible arrival-time difference for a pair.
    pub fn max_tau(self) -> f64 {
        self.spacing_m() / SOUND_SPEED
    }

    /// Channel index pairs used for delay estimation, in group order.
    pub fn pair_groups(self) -> &'static [[usize; 2]] {
        match self {
            Self::Pair2 => &PAIRS_PAIR2,
            Self::Square4 => &PAIRS_SQUARE4,
            Self::Hex6Plus1 | Self::Circular8 => &PAIRS_CIRCULAR,
        }
    }
}

impl fmt::Display for ArrayTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pair2 => "pair2",
            Self::Square4 => "square4",
            Self::Hex6Plus1 => "hex6p1",
            Self::Circular8 => "circular8",
        };
        f.write_str(name)
    }
}

impl FromStr for ArrayTopology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pair2" => Ok(Self::Pair2),
            "square4" => Ok(Self::Square4),
            "hex6p1" | "hex6plus1" => Ok(Self::Hex6Plus1),
            "circular8" => Ok(Self::Circular8),
            other => Err(format!("unknown array topology: {other}")),
        }
    }
}
