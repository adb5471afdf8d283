//! Visual parameters derived from `(frame, state)`.
//!
//! Pure function of its inputs: the same frame and state always produce the
//! same parameters, including the waveform noise (seeded from the frame).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::state::InteractionState;

/// Number of waveform bars
pub const WAVEFORM_WIDTH: usize = 28;

/// Highest bar level (levels run `0..=WAVEFORM_LEVELS`)
pub const WAVEFORM_LEVELS: u8 = 8;

/// Frames between blinks while idle
const BLINK_PERIOD: u64 = 60;
/// Frames the eyes stay shut
const BLINK_FRAMES: u64 = 2;
/// Frames per mouth shape while speaking
const MOUTH_STEP: u64 = 3;
/// Frames per gaze direction while generating
const GAZE_STEP: u64 = 3;
/// Frames per processing dot
const DOT_STEP: u64 = 4;

const TALK_CYCLE: [MouthShape; 4] = [
    MouthShape::Open,
    MouthShape::Round,
    MouthShape::Wide,
    MouthShape::Round,
];

const GAZE_CYCLE: [EyeShape; 4] = [
    EyeShape::LookLeft,
    EyeShape::LookUp,
    EyeShape::LookRight,
    EyeShape::Squint,
];

/// Eye expression
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EyeShape {
    /// Resting, eyes open
    Open,
    /// Mid-blink
    Closed,
    /// Glancing left
    LookLeft,
    /// Glancing up
    LookUp,
    /// Glancing right
    LookRight,
    /// Concentrating
    Squint,
    /// Emphasis while speaking
    Wide,
    /// Broken signal
    Glitch,
}

/// Mouth expression
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouthShape {
    /// Resting
    Closed,
    /// Speaking, open
    Open,
    /// Speaking, rounded
    Round,
    /// Speaking, wide
    Wide,
    /// Working; the value is the number of lit dots (0..=3)
    Processing(u8),
    /// Something went wrong
    Frown,
}

/// Everything the renderer animates for one frame
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationParams {
    /// Frame these parameters were derived for
    pub frame: u64,
    /// Eyes are shut this frame (only ever true in `Idle`)
    pub blink: bool,
    /// Eye expression
    pub eyes: EyeShape,
    /// Mouth expression (only cycles in `Playing`)
    pub mouth: MouthShape,
    /// Index into the talk cycle; stays 0 outside `Playing`
    pub mouth_phase: u8,
    /// Overall waveform amplitude in `0.0..=1.0`; zero outside `Playing`
    pub amplitude: f32,
    /// Bar levels in `0..=WAVEFORM_LEVELS`; all zero outside `Playing`
    pub waveform: Vec<u8>,
    /// Border pulse in `0.0..=1.0`; zero outside `Playing`
    pub pulse: f32,
    /// Progress dots shown while generating (0..=3)
    pub dots: u8,
}

impl AnimationParams {
    /// Derive the visual parameters for `frame` in `state`
    #[must_use]
    pub fn derive(frame: u64, state: InteractionState) -> Self {
        match state {
            InteractionState::Idle => {
                let blink = frame % BLINK_PERIOD >= BLINK_PERIOD - BLINK_FRAMES;
                Self {
                    blink,
                    eyes: if blink { EyeShape::Closed } else { EyeShape::Open },
                    ..Self::resting(frame)
                }
            }
            InteractionState::Generating => {
                let dots = ((frame / DOT_STEP) % 4) as u8;
                Self {
                    eyes: GAZE_CYCLE[((frame / GAZE_STEP) % 4) as usize],
                    mouth: MouthShape::Processing(dots),
                    dots,
                    ..Self::resting(frame)
                }
            }
            InteractionState::Playing => Self::speaking(frame),
            InteractionState::Failed => Self {
                eyes: EyeShape::Glitch,
                mouth: MouthShape::Frown,
                ..Self::resting(frame)
            },
        }
    }

    /// Whether every waveform bar is at rest
    #[must_use]
    pub fn is_waveform_flat(&self) -> bool {
        self.waveform.iter().all(|&level| level == 0)
    }

    fn resting(frame: u64) -> Self {
        Self {
            frame,
            blink: false,
            eyes: EyeShape::Open,
            mouth: MouthShape::Closed,
            mouth_phase: 0,
            amplitude: 0.0,
            waveform: vec![0; WAVEFORM_WIDTH],
            pulse: 0.0,
            dots: 0,
        }
    }

    fn speaking(frame: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(frame);
        let amplitude: f32 = rng.gen_range(0.5..=1.0);

        // Keep the phase argument small so f32 precision holds on long runs.
        let phase = (frame % 10_000) as f32 * 0.5;
        let waveform = (0..WAVEFORM_WIDTH)
            .map(|i| {
                let x = i as f32;
                let wave = (phase + x * 0.5).sin() * 0.4
                    + (phase * 1.5 + x * 0.3).sin() * 0.3
                    + (phase * 2.0 + x * 0.7).sin() * 0.2;
                let noise: f32 = rng.gen_range(-0.15..=0.15);
                let level = (wave + noise + 0.5) * amplitude * f32::from(WAVEFORM_LEVELS);
                level.clamp(0.0, f32::from(WAVEFORM_LEVELS)) as u8
            })
            .collect();

        let mouth_phase = ((frame / MOUTH_STEP) % 4) as u8;
        Self {
            frame,
            blink: false,
            eyes: if frame % 4 == 0 { EyeShape::Wide } else { EyeShape::Open },
            mouth: TALK_CYCLE[usize::from(mouth_phase)],
            mouth_phase,
            amplitude,
            waveform,
            pulse: ((phase * 0.6).sin() + 1.0) / 2.0,
            dots: 0,
        }
    }
}
