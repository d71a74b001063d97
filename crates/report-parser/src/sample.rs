//! Per-frame pupil samples

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which eye a sample was measured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eye {
    #[serde(rename = "left_eye")]
    Left,
    #[serde(rename = "right_eye")]
    Right,
}

impl Eye {
    /// Normalize a report eye label.
    ///
    /// Accepts `left_eye`/`right_eye` as well as the short `left`/`Left` and
    /// `right`/`Right` spellings. Anything else is unrecognized.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "left_eye" | "left" | "Left" => Some(Eye::Left),
            "right_eye" | "right" | "Right" => Some(Eye::Right),
            _ => None,
        }
    }

    /// Canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            Eye::Left => "left_eye",
            Eye::Right => "right_eye",
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measurement of one eye at one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Frame index (each eye may restart numbering from 0)
    pub frame: u32,
    /// Measured eye
    pub eye: Eye,
    /// Pupil diameter in millimetres
    pub diameter_mm: f64,
}

impl Sample {
    pub fn new(frame: u32, eye: Eye, diameter_mm: f64) -> Self {
        Self {
            frame,
            eye,
            diameter_mm,
        }
    }
}
