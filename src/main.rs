use std::sync::Arc;

use cpal::traits::DeviceTrait;

mod args;
mod audio;
mod console;
mod misc;
mod playback;
mod scale;

use audio::{devices, session::CpalSession};
use playback::PlaybackController;

fn main() -> anyhow::Result<()> {
    let args = args::parse_args();
    let params = args::initial_params(&args);

    let wanted = args.get_one::<String>("output-device").unwrap();
    let (device, config) = devices::get_output_device(wanted)?;
    println!(
        "[*] Output hooked into `{}` ({})",
        device.name().unwrap_or_else(|_| "?".into()),
        config.sample_rate().0
    );
    println!(
        "[I] {}: {} divisions, {} notes from {:.1} Hz",
        params.preset_label(),
        params.divisions(),
        params.notes(),
        params.base_frequency()
    );

    // The output session is only opened on the first play.
    let controller = Arc::new(PlaybackController::new(move || {
        CpalSession::new(device.clone(), config.clone())
    }));

    console::run(controller, params)
}
