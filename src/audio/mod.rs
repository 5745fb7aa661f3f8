//! Audio capture and playback

mod capture;
mod playback;

pub use capture::{mean_abs_amplitude, samples_to_wav, AudioCapture, FRAME_LEN, SAMPLE_RATE};
pub use playback::AudioPlayback;
