//! Analysis request settings
//!
//! Echoed into every record for audit. Never interpreted here.

use serde::{Deserialize, Serialize};

/// Which pupils the analysis service was asked to track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PupilSelection {
    #[default]
    Both,
    Left,
    Right,
}

/// Backbone model used by the pupil tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TvModel {
    #[default]
    ResNet18,
    ResNet50,
}

/// Parameters of the external analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub pupil_selection: PupilSelection,
    pub tv_model: TvModel,
    pub blink_detection: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pupil_selection: PupilSelection::Both,
            tv_model: TvModel::ResNet18,
            blink_detection: true,
        }
    }
}
