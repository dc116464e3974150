//! Scale math for equal divisions of the octave.
//!
//! Everything in here is a pure function of the tuning parameters.
//! Playback only sees the frequency list this module produces.

/// Allowed range for the octave division count.
pub const DIVISION_RANGE: (u32, u32) = (5, 53);
/// Allowed range for the base frequency in Hz.
pub const BASE_FREQUENCY_RANGE: (f32, f32) = (50.0, 2000.0);

/// Named division counts selectable from the control surface.
/// Changing the division count away from any of these shows as "Custom".
pub const PRESETS: &[(&str, u32)] = &[
    ("12-TET (standard)", 12),
    ("19-EDO", 19),
    ("22-EDO", 22),
    ("24-EDO (quarter-tone)", 24),
    ("31-EDO", 31),
    ("41-EDO", 41),
    ("53-EDO", 53),
];

/// Tuning parameters, always held in their valid ranges.
/// Out of range values passed to the constructor or setters are clamped,
/// never rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuningParams {
    base_frequency: f32,
    divisions: u32,
    notes: u32,
}

/// One row of the derived scale table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleEntry {
    pub step: u32,
    pub frequency: f32,
    pub cents: f32,
}

impl TuningParams {
    pub fn new(base_frequency: f32, divisions: i64, notes: i64) -> Self {
        let divisions = clamp_divisions(divisions);
        Self {
            base_frequency: clamp_base_frequency(base_frequency),
            divisions,
            notes: clamp_notes(notes, divisions),
        }
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    pub fn divisions(&self) -> u32 {
        self.divisions
    }

    pub fn notes(&self) -> u32 {
        self.notes
    }

    pub fn set_base_frequency(&mut self, hz: f32) {
        self.base_frequency = clamp_base_frequency(hz);
    }

    /// Sets the division count.
    /// The note count is re-clamped since its upper bound just moved.
    pub fn set_divisions(&mut self, divisions: i64) {
        self.divisions = clamp_divisions(divisions);
        self.notes = clamp_notes(self.notes as i64, self.divisions);
    }

    pub fn set_notes(&mut self, notes: i64) {
        self.notes = clamp_notes(notes, self.divisions);
    }

    /// The preset name matching the current division count, or "Custom".
    pub fn preset_label(&self) -> &'static str {
        PRESETS
            .iter()
            .find(|(_, d)| *d == self.divisions)
            .map(|(name, _)| *name)
            .unwrap_or("Custom")
    }
}

impl Default for TuningParams {
    fn default() -> Self {
        Self::new(440.0, 12, 12)
    }
}

/// Frequency of the given step: `base * 2^(step / divisions)`.
/// One octave spans a doubling, split into `divisions` equal log steps.
pub fn step_frequency(base_frequency: f32, divisions: u32, step: u32) -> f32 {
    base_frequency * 2f32.powf(step as f32 / divisions as f32)
}

/// Cent offset of the given step.
/// 1200 cents per octave regardless of the division count.
pub fn step_cents(divisions: u32, step: u32) -> f32 {
    1200.0 * step as f32 / divisions as f32
}

/// Derives the scale table from the tuning parameters.
/// Always returns exactly `notes` entries (already clamped to `1..=divisions`).
pub fn compute_scale(params: &TuningParams) -> Vec<ScaleEntry> {
    let count = params.notes.clamp(1, params.divisions);
    (0..count)
        .map(|step| ScaleEntry {
            step,
            frequency: step_frequency(params.base_frequency, params.divisions, step),
            cents: step_cents(params.divisions, step),
        })
        .collect()
}

fn clamp_base_frequency(hz: f32) -> f32 {
    hz.clamp(BASE_FREQUENCY_RANGE.0, BASE_FREQUENCY_RANGE.1)
}

fn clamp_divisions(divisions: i64) -> u32 {
    divisions.clamp(DIVISION_RANGE.0 as i64, DIVISION_RANGE.1 as i64) as u32
}

fn clamp_notes(notes: i64, divisions: u32) -> u32 {
    notes.clamp(1, divisions as i64) as u32
}
