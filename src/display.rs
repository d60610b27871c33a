/// Rendering layer — all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// session.  No ship logic is performed; this module only translates scene
/// coordinates into terminal cells and state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use ufo_ship::compute::{shield_duration_ms, shield_opacity};
use ufo_ship::config::MAX_LIVES;
use ufo_ship::entities::{Arena, Missile, ShieldState, Ship, Vec2};

use crate::Session;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_WEAPON: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_SHIELD: Color = Color::Green;
const C_SHIP: Color = Color::White;
const C_MISSILE: Color = Color::Cyan;
const C_HINT: Color = Color::DarkGrey;

// ── Scene ↔ terminal mapping ──────────────────────────────────────────────────

/// Scene pixels covered by one terminal column / row.  Rows are roughly twice
/// as tall as columns are wide.
const PX_PER_COL: f64 = 8.0;
const PX_PER_ROW: f64 = 16.0;

/// First playfield row (row 0 is the HUD, row 1 the top border).
const TOP: u16 = 2;

/// Scene extent that fits inside the border of a `width` × `height` terminal.
pub fn arena_for(width: u16, height: u16) -> Arena {
    Arena {
        width: f64::from(width.saturating_sub(2)) * PX_PER_COL,
        height: f64::from(height.saturating_sub(4)) * PX_PER_ROW,
    }
}

/// Scene point at the centre of terminal cell (`col`, `row`).
pub fn cell_to_scene(col: u16, row: u16) -> Vec2 {
    Vec2::new(
        (f64::from(col) - 1.0 + 0.5) * PX_PER_COL,
        (f64::from(row) - f64::from(TOP) + 0.5) * PX_PER_ROW,
    )
}

/// Terminal cell holding scene point `p`, or `None` if it falls outside the
/// playfield.
fn scene_to_cell(p: Vec2, width: u16, height: u16) -> Option<(u16, u16)> {
    let col = (p.x / PX_PER_COL).floor() + 1.0;
    let row = (p.y / PX_PER_ROW).floor() + f64::from(TOP);
    let inside = col >= 1.0
        && col < f64::from(width.saturating_sub(1))
        && row >= f64::from(TOP)
        && row < f64::from(height.saturating_sub(2));
    inside.then_some((col as u16, row as u16))
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, session: &Session) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, session)?;
    draw_hud(out, session)?;

    for missile in &session.missiles {
        draw_missile(out, missile, session)?;
    }
    draw_shield(out, &session.ship, session)?;
    draw_ship(out, &session.ship, session)?;
    draw_controls_hint(out, session)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, session.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, session: &Session) -> std::io::Result<()> {
    let w = session.width as usize;
    let h = session.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in TOP..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(session.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, session: &Session) -> std::io::Result<()> {
    let ship = &session.ship;

    // Weapon — left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_WEAPON))?;
    out.queue(Print(format!(
        "Weapon: {} [{}/{}]",
        ship.weapon().id,
        ship.roster.index() + 1,
        ship.roster.len()
    )))?;

    // Shield — centre
    let shield_str = match ship.shield {
        ShieldState::Off => "[ SHIELD READY ]".to_string(),
        ShieldState::On(timer) => {
            let left_ms = shield_duration_ms(&ship.tuning).saturating_sub(timer.elapsed_ms);
            format!("[ SHIELD {:>2}s ]", left_ms / 1000 + 1)
        }
    };
    let sx = (session.width / 2).saturating_sub(shield_str.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(sx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SHIELD))?;
    out.queue(Print(&shield_str))?;

    // Lives — right
    let lives_str = lives_label(ship.lives);
    let rx = session
        .width
        .saturating_sub(lives_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(&lives_str))?;

    Ok(())
}

/// One heart per life, or a count once hearts would crowd the HUD.
fn lives_label(lives: u32) -> String {
    if lives <= MAX_LIVES {
        format!("Lives:{}", "♥".repeat(lives as usize))
    } else {
        format!("Lives:♥×{lives}")
    }
}

// ── Entities ──────────────────────────────────────────────────────────────────

/// Arrow glyph for a heading in degrees (0° = right, 90° = down).
fn heading_glyph(degrees: f64) -> &'static str {
    const GLYPHS: [&str; 8] = ["→", "↘", "↓", "↙", "←", "↖", "↑", "↗"];
    let octant = (degrees.rem_euclid(360.0) / 45.0).round() as usize % 8;
    GLYPHS[octant]
}

fn draw_ship<W: Write>(out: &mut W, ship: &Ship, session: &Session) -> std::io::Result<()> {
    // 3-wide sprite centred on the ship, nose arrow in the middle:
    //   ◄→►
    let Some((col, row)) = scene_to_cell(ship.center(), session.width, session.height) else {
        return Ok(());
    };
    out.queue(style::SetForegroundColor(C_SHIP))?;
    out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
    out.queue(Print(format!("◄{}►", heading_glyph(ship.facing))))?;
    Ok(())
}

/// Ring of dots at the shield radius, dimmed as the fade swings low.
fn draw_shield<W: Write>(out: &mut W, ship: &Ship, session: &Session) -> std::io::Result<()> {
    let Some(opacity) = shield_opacity(ship) else {
        return Ok(());
    };
    let circle = ship.collision_circle();
    let color = if opacity >= 0.7 { Color::Green } else { Color::DarkGreen };
    out.queue(style::SetForegroundColor(color))?;

    let steps = 24;
    for i in 0..steps {
        let a = std::f64::consts::TAU * f64::from(i) / f64::from(steps);
        let p = Vec2::new(
            circle.center.x + circle.radius * a.cos(),
            circle.center.y + circle.radius * a.sin(),
        );
        if let Some((col, row)) = scene_to_cell(p, session.width, session.height) {
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(Print("·"))?;
        }
    }
    Ok(())
}

fn draw_missile<W: Write>(
    out: &mut W,
    missile: &Missile,
    session: &Session,
) -> std::io::Result<()> {
    let center = Vec2::new(
        missile.position.x + missile.sprite.width / 2.0,
        missile.position.y + missile.sprite.height / 2.0,
    );
    if let Some((col, row)) = scene_to_cell(center, session.width, session.height) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(C_MISSILE))?;
        // render_angle is heading + 90°
        out.queue(Print(heading_glyph(missile.render_angle - 90.0)))?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

pub const CONTROLS: &str =
    "WASD : Move   Click / F : Fire   E : Shield   X : Weapon   R : Reset   Q : Quit";

fn draw_controls_hint<W: Write>(out: &mut W, session: &Session) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, session.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(CONTROLS))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lives_label_stays_short_for_any_count() {
        assert_eq!(lives_label(3), "Lives:♥♥♥");
        assert_eq!(lives_label(0), "Lives:");
        assert_eq!(lives_label(u32::MAX), format!("Lives:♥×{}", u32::MAX));
    }
}
