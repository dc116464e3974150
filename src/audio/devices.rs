//! Output device selection.
//! Picks the device whose name is closest to the one asked for.

use anyhow::{Context, Result};
use cpal::{
    traits::{DeviceTrait, HostTrait},
    Device, SupportedStreamConfig,
};

use crate::misc::Similarity;

/// Picks an output device by name, returning it with its default config.
/// `"default"` uses the system default; anything else picks the device with
/// the highest name similarity (dice coefficient) to the given string.
pub fn get_output_device(wanted: &str) -> Result<(Device, SupportedStreamConfig)> {
    let host = cpal::default_host();
    let wanted = wanted.to_lowercase();

    let device = match wanted.as_str() {
        "default" => host
            .default_output_device()
            .context("No default output device")?,
        _ => host
            .output_devices()?
            .map(|x| {
                let name = x.name().unwrap_or_default().to_lowercase();
                (name.similarity(&wanted), x)
            })
            .reduce(|a, b| if a.0 > b.0 { a } else { b })
            .context("No output device found")?
            .1,
    };

    let config = device
        .default_output_config()
        .context("No default output config")?;

    Ok((device, config))
}
