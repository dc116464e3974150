//! Sine tone generation.
//!
//! [`Tone`] is a bare sine oscillator, [`EnvelopedTone`] wraps one in a gain
//! envelope so notes start and end without audible clicks.

use std::f32::consts::PI;

/// Peak envelope gain, well under full scale.
const PEAK_GAIN: f32 = 0.2;
/// Near-silence floor the envelope ramps from and back to.
/// Small but positive so the ramps can be exponential.
const GAIN_FLOOR: f32 = 1e-4;
/// Attack ramp length in seconds.
const ATTACK: f32 = 0.008;
/// Release ramp length in seconds.
const RELEASE: f32 = 0.025;
/// Extra samples emitted past the note duration before the generator
/// terminates, so the tail can never linger.
const STOP_GRACE: f32 = 0.010;

/// An infinite (or fixed-length) sine wave at a given frequency.
#[derive(Clone, Copy, Debug)]
pub struct Tone {
    i: usize,
    frequency: f32,
    sample_rate: f32,
    duration: Option<usize>,
}

impl Tone {
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            i: 0,
            frequency,
            sample_rate: sample_rate as f32,
            duration: None,
        }
    }

    /// Limits the tone to `duration` samples.
    pub fn duration(mut self, duration: usize) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.i += 1;

        match self.duration {
            Some(d) if self.i > d => return None,
            _ => {}
        }

        Some((self.i as f32 * self.frequency * 2.0 * PI / self.sample_rate).sin())
    }
}

/// A sine tone shaped by an attack / hold / release gain envelope.
///
/// The gain ramps exponentially from [`GAIN_FLOOR`] to [`PEAK_GAIN`] over the
/// attack, holds, then ramps back down to the floor by the note duration.
/// The generator keeps running for a short grace period past the duration
/// (emitting silence) and then finishes for good.
#[derive(Clone, Copy, Debug)]
pub struct EnvelopedTone {
    inner: Tone,
    duration: usize,
    attack: usize,
    release: usize,
    peak: f32,
}

impl EnvelopedTone {
    /// Creates a tone of `duration` seconds at `frequency` Hz.
    pub fn new(frequency: f32, sample_rate: u32, duration: f32) -> Self {
        let sr = sample_rate as f32;
        let samples = (sr * duration) as usize;
        Self {
            inner: Tone::new(frequency, sample_rate).duration(samples + (sr * STOP_GRACE) as usize),
            duration: samples,
            attack: (sr * ATTACK) as usize,
            release: (sr * RELEASE) as usize,
            peak: PEAK_GAIN,
        }
    }

    pub fn attack(mut self, attack: f32) -> Self {
        self.attack = (self.inner.sample_rate * attack) as usize;
        self
    }

    pub fn release(mut self, release: f32) -> Self {
        self.release = (self.inner.sample_rate * release) as usize;
        self
    }

    pub fn peak(mut self, peak: f32) -> Self {
        self.peak = peak;
        self
    }

    fn gain(&self, i: usize) -> f32 {
        if i >= self.duration {
            return 0.0;
        }

        // Release starts late enough that the attack always completes.
        let release_start = self.attack.max(self.duration.saturating_sub(self.release));
        if i < self.attack {
            let t = i as f32 / self.attack as f32;
            GAIN_FLOOR * (self.peak / GAIN_FLOOR).powf(t)
        } else if i < release_start {
            self.peak
        } else {
            let span = (self.duration - release_start).max(1);
            let t = (i - release_start) as f32 / span as f32;
            self.peak * (GAIN_FLOOR / self.peak).powf(t)
        }
    }
}

impl Iterator for EnvelopedTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.inner.next()?;
        Some(raw * self.gain(self.inner.i))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tone_period() {
        // 1Hz at 8 samples/sec peaks at sample 2 and troughs at sample 6
        let samples = Tone::new(1.0, 8).take(8).collect::<Vec<_>>();
        assert!((samples[1] - 1.0).abs() < 1e-5);
        assert!((samples[5] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tone_duration_limits_samples() {
        assert_eq!(Tone::new(440.0, 44100).duration(100).count(), 100);
    }

    #[test]
    fn test_envelope_terminates_within_grace() {
        let sr = 44100;
        let count = EnvelopedTone::new(440.0, sr, 0.24).count();
        let expected = (sr as f32 * 0.24) as usize + (sr as f32 * STOP_GRACE) as usize;
        assert_eq!(count, expected);
    }

    #[test]
    fn test_envelope_never_exceeds_peak() {
        for sample in EnvelopedTone::new(880.0, 44100, 0.24) {
            assert!(sample.abs() <= PEAK_GAIN + 1e-6);
        }
    }

    #[test]
    fn test_envelope_starts_and_ends_near_silence() {
        let samples = EnvelopedTone::new(440.0, 44100, 0.24).collect::<Vec<_>>();

        // first sample is still at the ramp floor
        assert!(samples[0].abs() < 1e-3);
        // everything past the note duration is fully silent
        let end = (44100.0 * 0.24) as usize;
        assert!(samples[end..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_envelope_respects_custom_shape() {
        let tone = EnvelopedTone::new(440.0, 1000, 0.1)
            .attack(0.01)
            .release(0.02)
            .peak(0.5);

        // mid-note hold sits at the custom peak, the attack below it
        assert!((tone.gain(50) - 0.5).abs() < 1e-6);
        assert!(tone.gain(5) < 0.5);
    }

    #[test]
    fn test_envelope_holds_at_peak_mid_note() {
        let tone = EnvelopedTone::new(440.0, 44100, 0.24);
        let mid = tone.gain((44100.0 * 0.12) as usize);
        assert!((mid - PEAK_GAIN).abs() < 1e-6);
    }
}
