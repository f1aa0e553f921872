//! Sensory channels rotated across beats.

use serde::{Deserialize, Serialize};

/// One of the five sensory channels a beat is anchored in.
///
/// Beats rotate through the channels in declaration order so that no two
/// consecutive beats lean on the same sense.
///
/// # Examples
///
/// ```
/// use somnia_core::SensoryMode;
///
/// assert_eq!(SensoryMode::for_beat(0), SensoryMode::Sight);
/// assert_eq!(SensoryMode::for_beat(6), SensoryMode::Sound);
/// assert_eq!(SensoryMode::Proprioception.to_string(), "proprioception");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensoryMode {
    /// Light, colour, shape.
    #[default]
    Sight,
    /// Sounds near and far.
    Sound,
    /// Texture, temperature, pressure.
    Touch,
    /// Scents in the air.
    Smell,
    /// The body's own sense of position, weight and breath.
    Proprioception,
}

impl SensoryMode {
    /// Fixed rotation order.
    pub const ROTATION: [SensoryMode; 5] = [
        SensoryMode::Sight,
        SensoryMode::Sound,
        SensoryMode::Touch,
        SensoryMode::Smell,
        SensoryMode::Proprioception,
    ];

    /// Channel for the beat at `index` (0-based) under round-robin rotation.
    pub fn for_beat(index: usize) -> Self {
        Self::ROTATION[index % Self::ROTATION.len()]
    }
}
