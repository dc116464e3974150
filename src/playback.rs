//! Sequential note playback with cooperative cancellation.
//!
//! [`PlaybackController`] owns the playback state machine and paces notes in
//! wall-clock time. It only talks to the audio backend through the
//! [`ToneEmitter`] trait, so the tests below run against a mock.

use std::{sync::Arc, thread, time::Duration};

use anyhow::Result;
use parking_lot::Mutex;

/// How a note-emission backend looks to the controller.
///
/// One generator is created per note and discarded afterwards; suspending
/// mutes the whole session until the next resume.
pub trait ToneEmitter {
    /// Installs a fresh envelope-shaped generator at the given frequency.
    fn begin_note(&self, frequency: f32);
    /// Releases the generator installed by the last [`Self::begin_note`].
    fn finish_note(&self);
    /// Mutes all output. Failures are swallowed by the implementation.
    fn suspend(&self);
    /// Unmutes output. Failures are swallowed by the implementation.
    fn resume(&self);
    /// Whether the session is currently producing output.
    fn is_running(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// No sequence running.
    Idle,
    /// A sequence is actively emitting notes.
    Playing,
    /// Stop was requested; the current note finishes, then the loop exits.
    StopRequested,
}

/// Note pacing. The wait is wall-clock, not the audio clock, so a few ms of
/// drift against the output stream is expected and fine.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    /// Length of each note.
    pub note: Duration,
    /// Silence between consecutive notes.
    pub gap: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            note: Duration::from_millis(240),
            gap: Duration::from_millis(30),
        }
    }
}

/// Plays frequency sequences one note at a time.
///
/// At most one sequence is active; `play` while playing is ignored, not
/// queued. The emitter is created lazily on the first play and lives for the
/// rest of the process.
pub struct PlaybackController<E: ToneEmitter> {
    factory: Box<dyn Fn() -> Result<E> + Send + Sync>,
    emitter: Mutex<Option<Arc<E>>>,
    status: Mutex<Status>,
    timing: Timing,
}

impl<E: ToneEmitter + Send + Sync + 'static> PlaybackController<E> {
    pub fn new(factory: impl Fn() -> Result<E> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            emitter: Mutex::new(None),
            status: Mutex::new(Status::Idle),
            timing: Timing::default(),
        }
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn status(&self) -> Status {
        *self.status.lock()
    }

    /// Starts playing the sequence on a background thread.
    ///
    /// A no-op if a sequence is already active. Fails only if the emitter
    /// cannot be created, which is fatal for the whole program.
    pub fn play(self: &Arc<Self>, frequencies: Vec<f32>) -> Result<()> {
        {
            let mut status = self.status.lock();
            if *status != Status::Idle {
                return Ok(());
            }
            *status = Status::Playing;
        }

        let emitter = match self.emitter() {
            Ok(emitter) => emitter,
            Err(e) => {
                *self.status.lock() = Status::Idle;
                return Err(e);
            }
        };

        // A previous stop may have left the session muted.
        emitter.resume();

        let this = self.clone();
        thread::spawn(move || this.run(emitter, frequencies));
        Ok(())
    }

    /// Requests a cooperative stop and mutes output immediately.
    ///
    /// The note currently being paced still runs out its full wait; the flag
    /// only prevents the next note from starting. A no-op when idle.
    pub fn stop(&self) {
        let mut status = self.status.lock();
        if *status != Status::Playing {
            return;
        }
        *status = Status::StopRequested;

        if let Some(emitter) = self.emitter.lock().as_ref() {
            emitter.suspend();
        }
    }

    fn run(&self, emitter: Arc<E>, frequencies: Vec<f32>) {
        for frequency in frequencies {
            if *self.status.lock() == Status::StopRequested {
                break;
            }

            emitter.begin_note(frequency);
            thread::sleep(self.timing.note + self.timing.gap);
            emitter.finish_note();
        }

        *self.status.lock() = Status::Idle;
    }

    fn emitter(&self) -> Result<Arc<E>> {
        let mut emitter = self.emitter.lock();
        if let Some(emitter) = emitter.as_ref() {
            return Ok(emitter.clone());
        }

        let new = Arc::new((self.factory)()?);
        *emitter = Some(new.clone());
        Ok(new)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicBool, Ordering};

    use anyhow::anyhow;

    use super::*;

    struct MockEmitter {
        begun: Mutex<Vec<f32>>,
        running: AtomicBool,
    }

    impl MockEmitter {
        fn new() -> Self {
            Self {
                begun: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
            }
        }
    }

    impl ToneEmitter for MockEmitter {
        fn begin_note(&self, frequency: f32) {
            self.begun.lock().push(frequency);
        }

        fn finish_note(&self) {}

        fn suspend(&self) {
            self.running.store(false, Ordering::Relaxed);
        }

        fn resume(&self) {
            self.running.store(true, Ordering::Relaxed);
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::Relaxed)
        }
    }

    fn controller() -> Arc<PlaybackController<MockEmitter>> {
        Arc::new(PlaybackController::new(|| Ok(MockEmitter::new())).timing(Timing {
            note: Duration::from_millis(5),
            gap: Duration::from_millis(2),
        }))
    }

    fn wait_for_idle(controller: &PlaybackController<MockEmitter>) {
        while controller.status() != Status::Idle {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_full_sequence_plays() {
        let controller = controller();
        controller.play(vec![440.0, 550.0, 660.0]).unwrap();
        assert_eq!(controller.status(), Status::Playing);

        wait_for_idle(&controller);
        let emitter = controller.emitter().unwrap();
        assert_eq!(*emitter.begun.lock(), vec![440.0, 550.0, 660.0]);
        assert!(emitter.is_running());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let controller = controller();
        controller.stop();
        controller.stop();
        assert_eq!(controller.status(), Status::Idle);
    }

    #[test]
    fn test_play_while_playing_is_ignored() {
        let controller = controller();
        controller.play(vec![440.0; 8]).unwrap();
        controller.play(vec![999.0; 8]).unwrap();

        wait_for_idle(&controller);
        let begun = controller.emitter().unwrap().begun.lock().clone();
        assert_eq!(begun, vec![440.0; 8]);
    }

    #[test]
    fn test_stop_mid_sequence() {
        let controller = controller();
        controller.play(vec![440.0; 12]).unwrap();

        // wait until a couple of notes have started, then cancel
        let emitter = controller.emitter().unwrap();
        while emitter.begun.lock().len() < 2 {
            thread::sleep(Duration::from_millis(1));
        }
        controller.stop();

        wait_for_idle(&controller);
        let begun = emitter.begun.lock().len();
        assert!(begun >= 2 && begun < 12, "begun {begun} notes");
        // output is left muted after a stop
        assert!(!emitter.is_running());
    }

    #[test]
    fn test_play_after_stop_resumes_output() {
        let controller = controller();
        controller.play(vec![440.0; 4]).unwrap();
        controller.stop();
        wait_for_idle(&controller);

        controller.play(vec![550.0]).unwrap();
        assert!(controller.emitter().unwrap().is_running());
        wait_for_idle(&controller);
    }

    #[test]
    fn test_factory_failure_propagates_and_resets() {
        let controller: Arc<PlaybackController<MockEmitter>> =
            Arc::new(PlaybackController::new(|| Err(anyhow!("no output device"))));

        assert!(controller.play(vec![440.0]).is_err());
        assert_eq!(controller.status(), Status::Idle);
    }
}
