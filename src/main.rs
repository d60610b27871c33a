mod display;

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};

use ufo_ship::compute::{
    advance_missile, change_weapon, confine, fire, integrate, missile_in_arena, reset,
    tick_shield, toggle_shield,
};
use ufo_ship::config::Settings;
use ufo_ship::entities::{Keys, Missile, Ship, Vec2};

#[derive(Parser, Debug)]
#[command(name = "ufo_ship", about = "Fly the UFO ship around the terminal")]
struct Args {
    /// JSON settings file (tuning and weapon roster)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames per second; movement is one fixed step per frame
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

/// Everything the renderer needs for one frame.
pub struct Session {
    pub ship: Ship,
    pub missiles: Vec<Missile>,
    pub width: u16,
    pub height: u16,
}

// ── Held-key constants ────────────────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many milliseconds.  Covers terminals that don't emit key-release
/// events: the OS key-repeat rate is ≥ 15 Hz, so a ≈133 ms window is always
/// refreshed before expiry.
const HOLD_WINDOW_MS: u64 = 133;

/// Highest frame rate accepted from `--fps`.
const MAX_FPS: u32 = 240;

/// Distance ahead of the ship used as the aim point for keyboard fire.
const KEY_FIRE_REACH: f64 = 100.0;

/// Fixed frame budget for a requested frame rate, plus the rate actually used.
fn frame_budget(fps: u32) -> (u32, Duration) {
    let fps = fps.clamp(1, MAX_FPS);
    (fps, Duration::from_millis(1000 / u64::from(fps)))
}

/// `HOLD_WINDOW_MS` expressed in whole frames of `frame_budget`, at least one.
fn hold_frames(frame_budget: Duration) -> u64 {
    let frame_ms = (frame_budget.as_millis() as u64).max(1);
    HOLD_WINDOW_MS.div_ceil(frame_ms).max(1)
}

/// Returns true if any of `keys` was seen within the last `window` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64, window: u64) -> bool {
    keys.iter().any(|key| {
        key_frame
            .get(key)
            .map(|&last| frame.saturating_sub(last) <= window)
            .unwrap_or(false)
    })
}

fn held_keys(key_frame: &HashMap<KeyCode, u64>, frame: u64, window: u64) -> Keys {
    let held = |keys: &[KeyCode]| is_held(key_frame, keys, frame, window);
    Keys {
        up: held(&[KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Up]),
        left: held(&[KeyCode::Char('a'), KeyCode::Char('A'), KeyCode::Left]),
        down: held(&[KeyCode::Char('s'), KeyCode::Char('S'), KeyCode::Down]),
        right: held(&[KeyCode::Char('d'), KeyCode::Char('D'), KeyCode::Right]),
    }
}

/// Row `offset` lines below `base`, saturating at the bottom of the screen.
fn row_below(base: u16, offset: usize) -> u16 {
    base.saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Launch,
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    ship: &Ship,
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  U F O  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(14), cy.saturating_sub(3)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Weapons on board:"))?;

    for (i, weapon) in ship.roster.weapons().iter().enumerate() {
        let row = row_below(cy.saturating_sub(2), i);
        if row >= height {
            break;
        }
        out.queue(cursor::MoveTo(cx.saturating_sub(14), row))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{}] ", i + 1)))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(&weapon.id))?;
    }

    let bottom = row_below(cy, ship.roster.len());
    out.queue(cursor::MoveTo(cx.saturating_sub(14), bottom))?;
    out.queue(style::SetForegroundColor(Color::Green))?;
    out.queue(Print("ENTER : Launch   Q : Quit"))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(14), bottom.saturating_add(2)))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print(display::CONTROLS))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. })) => match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Launch),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            },
            Ok(_) => {}
            Err(_) => return Ok(MenuResult::Quit),
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs until the user quits.
///
/// Input model: directional keys are tracked in a `key_frame` map recording
/// the frame of their last press/repeat event, so several can be held at
/// once.  One-shot actions (fire, shield, weapon, reset) act on press.
///
/// Per frame: steer inside the arena, integrate one fixed step, advance the
/// shield fade by the frame budget, move and cull missiles, render.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut Session,
    rx: &mpsc::Receiver<Event>,
    frame_budget: Duration,
) -> std::io::Result<()> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let frame_ms = frame_budget.as_millis() as u64;
    let hold_window = hold_frames(frame_budget);

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind, modifiers, .. }) => match kind {
                    KeyEventKind::Press => {
                        key_frame.insert(code.clone(), frame);
                        match code {
                            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                                return Ok(());
                            }
                            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                                return Ok(());
                            }
                            KeyCode::Char('r') | KeyCode::Char('R') => {
                                session.ship = reset(&session.ship);
                                session.missiles.clear();
                            }
                            _ if !session.ship.alive => {}
                            KeyCode::Char('e') | KeyCode::Char('E') => {
                                session.ship = toggle_shield(&session.ship);
                            }
                            KeyCode::Char('x') | KeyCode::Char('X') => {
                                session.ship = change_weapon(&session.ship);
                            }
                            KeyCode::Char('f') | KeyCode::Char('F') => {
                                let center = session.ship.center();
                                let facing = session.ship.facing.to_radians();
                                let target = Vec2::new(
                                    center.x + facing.cos() * KEY_FIRE_REACH,
                                    center.y + facing.sin() * KEY_FIRE_REACH,
                                );
                                launch(session, target);
                            }
                            _ => {}
                        }
                    }
                    KeyEventKind::Repeat => {
                        key_frame.insert(code.clone(), frame);
                    }
                    KeyEventKind::Release => {
                        key_frame.remove(&code);
                    }
                },
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) if session.ship.alive => {
                    launch(session, display::cell_to_scene(column, row));
                }
                Event::Resize(width, height) => {
                    session.width = width;
                    session.height = height;
                }
                _ => {}
            }
        }

        // ── Advance the world one frame ───────────────────────────────────────
        let arena = display::arena_for(session.width, session.height);
        if session.ship.alive {
            let keys = held_keys(&key_frame, frame, hold_window);
            session.ship = integrate(&confine(&session.ship, keys, arena));
            session.ship = tick_shield(&session.ship, frame_ms);
        }
        session.missiles = session
            .missiles
            .iter()
            .map(advance_missile)
            .filter(|m| missile_in_arena(m, arena))
            .collect();

        display::render(out, session)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_budget {
            std::thread::sleep(frame_budget - elapsed);
        }
    }
}

fn launch(session: &mut Session, target: Vec2) {
    let (ship, missile) = fire(&session.ship, target);
    session.ship = ship;
    session.missiles.push(missile);
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; redirect it (2>ufo.log) to keep the screen clean.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .try_init();

    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let ship = settings.build_ship().context("building ship from settings")?;
    let (fps, frame_budget) = frame_budget(args.fps);
    if fps != args.fps {
        log::warn!("--fps {} out of range, using {fps}", args.fps);
    }
    log::info!("starting at {fps} fps, {} weapons", ship.roster.len());

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Request key-release (and key-repeat) events from the terminal.
    // kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(e) => {
                log::warn!("input thread stopped: {e}");
                break;
            }
        }
    });

    let result = run(&mut out, &rx, ship, frame_budget);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.context("terminal I/O failed")
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    ship: Ship,
    frame_budget: Duration,
) -> std::io::Result<()> {
    if let MenuResult::Quit = show_menu(out, rx, &ship)? {
        return Ok(());
    }
    let (width, height) = terminal::size()?;
    let mut session = Session {
        ship,
        missiles: Vec::new(),
        width,
        height,
    };
    game_loop(out, &mut session, rx, frame_budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_budget_clamps_fps() {
        assert_eq!(frame_budget(30), (30, Duration::from_millis(33)));
        assert_eq!(frame_budget(0), (1, Duration::from_millis(1000)));
        assert_eq!(frame_budget(1_000), (MAX_FPS, Duration::from_millis(4)));
    }

    #[test]
    fn hold_window_covers_same_time_at_any_fps() {
        for fps in [1, 30, 60, 144, MAX_FPS] {
            let (_, budget) = frame_budget(fps);
            let frames = hold_frames(budget);
            assert!(frames >= 1);
            assert!(
                frames * budget.as_millis() as u64 >= HOLD_WINDOW_MS,
                "{fps} fps gives {frames} frames"
            );
        }
        assert_eq!(hold_frames(Duration::from_millis(33)), 5);
        assert_eq!(hold_frames(Duration::from_millis(4)), 34);
    }

    #[test]
    fn held_keys_expire_after_window() {
        let mut key_frame = HashMap::new();
        key_frame.insert(KeyCode::Char('w'), 10);
        assert!(held_keys(&key_frame, 44, 34).up);
        assert!(!held_keys(&key_frame, 45, 34).up);
        assert!(!held_keys(&key_frame, 44, 34).down);
    }

    #[test]
    fn row_below_saturates() {
        assert_eq!(row_below(10, 3), 13);
        assert_eq!(row_below(u16::MAX - 1, 5), u16::MAX);
        assert_eq!(row_below(10, usize::MAX), u16::MAX);
    }
}
