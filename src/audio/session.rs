//! cpal-backed output session.
//!
//! The cpal `Stream` is not `Send`, so a dedicated thread owns it and the
//! [`CpalSession`] handle talks to it over a channel. The audio callback pulls
//! samples from a shared slot holding the tone for the note in flight.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{Context, Result};
use cpal::{
    traits::{DeviceTrait, StreamTrait},
    Device, SupportedStreamConfig,
};
use crossbeam::channel;
use parking_lot::Mutex;

use super::tone::EnvelopedTone;
use crate::playback::ToneEmitter;

/// Length of each played note in seconds.
const NOTE_DURATION: f32 = 0.24;

enum SessionCommand {
    Suspend,
    Resume,
}

type ToneSlot = Arc<Mutex<Option<EnvelopedTone>>>;

/// A process-lifetime audio output session.
/// Created once on the first play request and never torn down.
pub struct CpalSession {
    slot: ToneSlot,
    commands: channel::Sender<SessionCommand>,
    running: Arc<AtomicBool>,
    sample_rate: u32,
}

impl CpalSession {
    /// Opens an output stream on the device.
    /// Blocks until the stream thread reports that the stream is live.
    pub fn new(device: Device, config: SupportedStreamConfig) -> Result<Self> {
        let slot: ToneSlot = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(false));
        let (commands, command_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);
        let sample_rate = config.sample_rate().0;

        {
            let slot = slot.clone();
            let running = running.clone();
            thread::spawn(move || stream_thread(device, config, slot, running, command_rx, ready_tx));
        }

        ready_rx
            .recv()
            .context("Output stream thread died during startup")??;
        running.store(true, Ordering::Relaxed);

        Ok(Self {
            slot,
            commands,
            running,
            sample_rate,
        })
    }
}

impl ToneEmitter for CpalSession {
    fn begin_note(&self, frequency: f32) {
        *self.slot.lock() = Some(EnvelopedTone::new(frequency, self.sample_rate, NOTE_DURATION));
    }

    fn finish_note(&self) {
        *self.slot.lock() = None;
    }

    fn suspend(&self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.commands.send(SessionCommand::Suspend);
    }

    fn resume(&self) {
        self.running.store(true, Ordering::Relaxed);
        let _ = self.commands.send(SessionCommand::Resume);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Owns the stream for the life of the process, pausing and resuming it on
/// command. Pause/resume failures are logged and otherwise ignored.
fn stream_thread(
    device: Device,
    config: SupportedStreamConfig,
    slot: ToneSlot,
    running: Arc<AtomicBool>,
    commands: channel::Receiver<SessionCommand>,
    ready: channel::Sender<Result<()>>,
) {
    let channels = config.channels() as usize;
    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            fill_output(data, channels, &slot);
        },
        |err| eprintln!("[-] Output stream error: {err}"),
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e).context("Failed to build output stream"));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(e).context("Failed to start output stream"));
        return;
    }
    let _ = ready.send(Ok(()));

    for command in commands {
        match command {
            SessionCommand::Suspend => {
                if let Err(e) = stream.pause() {
                    eprintln!("[-] Failed to suspend output: {e}");
                    running.store(true, Ordering::Relaxed);
                }
            }
            SessionCommand::Resume => {
                if let Err(e) = stream.play() {
                    eprintln!("[-] Failed to resume output: {e}");
                }
            }
        }
    }
}

/// Writes the current tone (or silence) into an output buffer, repeating each
/// mono sample across all channels of a frame.
fn fill_output(data: &mut [f32], channels: usize, slot: &ToneSlot) {
    let mut slot = slot.lock();
    let mut finished = false;
    let mut last = 0.0;

    for (i, e) in data.iter_mut().enumerate() {
        if i % channels == 0 {
            last = match slot.as_mut() {
                Some(tone) => tone.next().unwrap_or_else(|| {
                    finished = true;
                    0.0
                }),
                None => 0.0,
            };
        }

        *e = last;
    }

    // a tone past its grace period is single-use, drop it
    if finished {
        *slot = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fill_output_duplicates_across_channels() {
        let slot: ToneSlot = Arc::new(Mutex::new(Some(EnvelopedTone::new(440.0, 44100, 0.24))));
        let mut data = [0.0f32; 8];
        fill_output(&mut data, 2, &slot);

        for frame in data.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_fill_output_silence_when_empty() {
        let slot: ToneSlot = Arc::new(Mutex::new(None));
        let mut data = [1.0f32; 16];
        fill_output(&mut data, 2, &slot);
        assert!(data.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_fill_output_drops_finished_tone() {
        // a tone shorter than the buffer runs out and is released
        let slot: ToneSlot = Arc::new(Mutex::new(Some(EnvelopedTone::new(440.0, 100, 0.01))));
        let mut data = [0.0f32; 512];
        fill_output(&mut data, 1, &slot);
        assert!(slot.lock().is_none());
    }
}
