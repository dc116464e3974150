//! Audio output.
//! Tone generation, device selection and the cpal output session.

pub mod devices;
pub mod session;
pub mod tone;
