//! Interactive terminal control surface.
//!
//! Raw mode, alternate screen. Shows the derived scale table and forwards
//! key presses to the tuning parameters and the playback controller. All
//! parameter edits go through the clamping setters on [`TuningParams`].

use std::{
    io::{stdout, Write},
    panic, process,
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode},
    execute, queue, style,
    terminal::{self, ClearType},
};

use crate::{
    playback::{PlaybackController, Status, ToneEmitter},
    scale::{self, TuningParams, PRESETS},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const HELP: &str =
    "space: play | s: stop | \u{2190}\u{2192}: divisions | \u{2191}\u{2193}: notes | -/=: base Hz | tab: preset | q: quit";

enum Action {
    Continue,
    Play,
    Stop,
    Quit,
}

pub fn run<E: ToneEmitter + Send + Sync + 'static>(
    controller: Arc<PlaybackController<E>>,
    mut params: TuningParams,
) -> Result<()> {
    // The terminal is in a weird state if the program panics in raw mode,
    // so restore it before printing the panic.
    panic::set_hook(Box::new(|info| {
        restore_terminal();
        eprintln!("{info}");
        process::exit(1)
    }));

    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

    loop {
        draw(&params, controller.status())?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) => handle_key(&mut params, key.code),
            Event::Resize(..) => {
                execute!(stdout(), terminal::Clear(ClearType::All))?;
                Action::Continue
            }
            _ => Action::Continue,
        };

        match action {
            Action::Continue => {}
            Action::Play => {
                let frequencies = scale::compute_scale(&params)
                    .iter()
                    .map(|entry| entry.frequency)
                    .collect();

                // Only fails if the output session can't be created,
                // which is fatal.
                if let Err(e) = controller.play(frequencies) {
                    restore_terminal();
                    return Err(e);
                }
            }
            Action::Stop => controller.stop(),
            Action::Quit => break,
        }
    }

    restore_terminal();
    Ok(())
}

fn handle_key(params: &mut TuningParams, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Char(' ') | KeyCode::Char('p') => return Action::Play,
        KeyCode::Char('s') => return Action::Stop,
        KeyCode::Left => params.set_divisions(params.divisions() as i64 - 1),
        KeyCode::Right => params.set_divisions(params.divisions() as i64 + 1),
        KeyCode::Down => params.set_notes(params.notes() as i64 - 1),
        KeyCode::Up => params.set_notes(params.notes() as i64 + 1),
        KeyCode::Char('-') => params.set_base_frequency(params.base_frequency() - 1.0),
        KeyCode::Char('=') | KeyCode::Char('+') => {
            params.set_base_frequency(params.base_frequency() + 1.0)
        }
        KeyCode::PageDown => params.set_base_frequency(params.base_frequency() - 10.0),
        KeyCode::PageUp => params.set_base_frequency(params.base_frequency() + 10.0),
        KeyCode::Tab => cycle_preset(params),
        _ => {}
    }

    Action::Continue
}

/// Moves to the next preset in the table, or the first if the current
/// division count is off-preset.
fn cycle_preset(params: &mut TuningParams) {
    let next = PRESETS
        .iter()
        .position(|(_, d)| *d == params.divisions())
        .map(|i| (i + 1) % PRESETS.len())
        .unwrap_or(0);
    params.set_divisions(PRESETS[next].1 as i64);
}

fn draw(params: &TuningParams, status: Status) -> Result<()> {
    let mut stdout = stdout();
    let rows = terminal::size()?.1 as usize;

    let status = match status {
        Status::Idle => "idle",
        Status::Playing => "playing",
        Status::StopRequested => "stopping",
    };

    queue!(
        stdout,
        cursor::MoveTo(0, 0),
        terminal::Clear(ClearType::All),
        style::Print(format!(
            "{}: {} divisions, {} notes from {:.1} Hz [{status}]",
            params.preset_label(),
            params.divisions(),
            params.notes(),
            params.base_frequency(),
        )),
        cursor::MoveToNextLine(1),
        style::Print(HELP),
        cursor::MoveToNextLine(2),
        style::Print(format!("{:>4}  {:>10}  {:>8}", "step", "freq (Hz)", "cents")),
        cursor::MoveToNextLine(1),
    )?;

    let entries = scale::compute_scale(params);
    let available = rows.saturating_sub(5);
    for entry in entries.iter().take(available) {
        queue!(
            stdout,
            style::Print(format!(
                "{:>4}  {:>10.3}  {:>8.2}",
                entry.step, entry.frequency, entry.cents
            )),
            cursor::MoveToNextLine(1),
        )?;
    }

    if entries.len() > available {
        queue!(stdout, style::Print("   \u{2026}"))?;
    }

    stdout.flush()?;
    Ok(())
}

/// Leaves the alternate screen and disables raw mode.
fn restore_terminal() {
    let _ = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show);
    let _ = terminal::disable_raw_mode();
}
