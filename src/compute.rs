/// Pure ship-logic functions.
///
/// Every public function takes an immutable reference to the current `Ship`
/// (plus whatever input the frame supplies) and returns a brand-new `Ship`.
/// `fire` additionally hands back the spawned `Missile`; the caller owns it.

use crate::entities::{
    Arena, Circle, Keys, Missile, ShieldState, ShieldTimer, Ship, SpriteSize, Tuning, Vec2,
    WeaponRoster,
};

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build a ship at `tuning.start` with the shield down and the first weapon
/// selected.  The hitbound is sized to the larger sprite dimension.
pub fn init_ship(
    tuning: Tuning,
    sprite: SpriteSize,
    shield_radius: f64,
    roster: WeaponRoster,
) -> Ship {
    let hitbound = Circle {
        center: sprite.center(),
        radius: sprite.width.max(sprite.height) / 2.0,
    };
    let shield_circle = Circle {
        center: sprite.center(),
        radius: shield_radius,
    };
    Ship {
        position: tuning.start,
        velocity: Vec2::ZERO,
        facing: 0.0,
        lives: tuning.lives,
        alive: true,
        out_of_bound_width: false,
        out_of_bound_height: false,
        roster,
        shield: ShieldState::Off,
        sprite,
        hitbound,
        shield_circle,
        tuning,
    }
}

// ── Movement ─────────────────────────────────────────────────────────────────

/// Turn held keys into a velocity of constant magnitude.
///
/// Each axis starts at ±C (down beats up, right beats left when both are
/// held) and is zeroed when neither key is held or its out-of-bound flag is
/// set.  A non-zero result is renormalised so diagonals travel at C too, and
/// the facing follows it.  A zero result keeps the previous facing.
pub fn steer(ship: &Ship, keys: Keys) -> Ship {
    let c = ship.tuning.speed;

    let mut vy = ship.velocity.y;
    if keys.up {
        vy = -c;
    }
    if keys.down {
        vy = c;
    }
    if (!keys.up && !keys.down) || ship.out_of_bound_width {
        vy = 0.0;
    }

    let mut vx = ship.velocity.x;
    if keys.left {
        vx = -c;
    }
    if keys.right {
        vx = c;
    }
    if (!keys.left && !keys.right) || ship.out_of_bound_height {
        vx = 0.0;
    }

    if vx == 0.0 && vy == 0.0 {
        return Ship {
            velocity: Vec2::ZERO,
            ..ship.clone()
        };
    }

    let angle = vy.atan2(vx);
    // Axis-aligned input is already at C; keep its zero component exact.
    let velocity = if vx != 0.0 && vy != 0.0 {
        Vec2::new(angle.cos() * c, angle.sin() * c)
    } else {
        Vec2::new(vx, vy)
    };
    Ship {
        velocity,
        facing: angle.to_degrees(),
        ..ship.clone()
    }
}

/// Apply the current velocity once.  One call per frame; no time scaling.
pub fn integrate(ship: &Ship) -> Ship {
    Ship {
        position: Vec2::new(
            ship.position.x + ship.velocity.x,
            ship.position.y + ship.velocity.y,
        ),
        ..ship.clone()
    }
}

/// Steer while keeping the sprite inside `arena`.
///
/// Stands in for the world's bounds checker: an axis whose next step would
/// carry the sprite outward past an edge gets its out-of-bound flag set, and
/// the ship is steered again with those flags.  Movement back inward is never
/// blocked.
pub fn confine(ship: &Ship, keys: Keys, arena: Arena) -> Ship {
    let mut steered = steer(
        &Ship {
            out_of_bound_width: false,
            out_of_bound_height: false,
            ..ship.clone()
        },
        keys,
    );

    // Suppressing one axis speeds the other up to C, so re-check once.
    for _ in 0..2 {
        let (crosses_tb, crosses_lr) = crossings(&steered, arena);
        let width = steered.out_of_bound_width || crosses_tb;
        let height = steered.out_of_bound_height || crosses_lr;
        if width == steered.out_of_bound_width && height == steered.out_of_bound_height {
            break;
        }
        steered = steer(
            &Ship {
                out_of_bound_width: width,
                out_of_bound_height: height,
                ..steered
            },
            keys,
        );
    }
    steered
}

/// (crosses top/bottom, crosses left/right) for the next step.
fn crossings(ship: &Ship, arena: Arena) -> (bool, bool) {
    let next_x = ship.position.x + ship.velocity.x;
    let next_y = ship.position.y + ship.velocity.y;
    let vertical = (ship.velocity.y < 0.0 && next_y < 0.0)
        || (ship.velocity.y > 0.0 && next_y + ship.sprite.height > arena.height);
    let horizontal = (ship.velocity.x < 0.0 && next_x < 0.0)
        || (ship.velocity.x > 0.0 && next_x + ship.sprite.width > arena.width);
    (vertical, horizontal)
}

// ── Weapons ──────────────────────────────────────────────────────────────────

/// Turn toward `target` and launch the current weapon at it.
///
/// The missile travels at C, is rotated 90° past its heading, and spawns one
/// step ahead of the point that centres its sprite on the ship's.
pub fn fire(ship: &Ship, target: Vec2) -> (Ship, Missile) {
    let c = ship.tuning.speed;
    let center = ship.center();
    let angle = (target.y - center.y).atan2(target.x - center.x);

    let weapon = ship.roster.current();
    let velocity = Vec2::new(angle.cos() * c, angle.sin() * c);
    let offset = Vec2::new(
        (ship.sprite.width - weapon.sprite.width) / 2.0,
        (ship.sprite.height - weapon.sprite.height) / 2.0,
    );
    let missile = Missile {
        weapon: weapon.id.clone(),
        position: Vec2::new(
            ship.position.x + offset.x + velocity.x,
            ship.position.y + offset.y + velocity.y,
        ),
        velocity,
        render_angle: angle.to_degrees() + 90.0,
        sprite: weapon.sprite,
    };
    log::trace!(
        "fired {} heading {:.1}° from ({:.1}, {:.1})",
        missile.weapon,
        angle.to_degrees(),
        missile.position.x,
        missile.position.y
    );

    let ship = Ship {
        facing: angle.to_degrees(),
        ..ship.clone()
    };
    (ship, missile)
}

/// Select the next weapon, wrapping back to the first.
pub fn change_weapon(ship: &Ship) -> Ship {
    let roster = ship.roster.cycled();
    log::debug!("weapon -> {} ({})", roster.current().id, roster.index());
    Ship {
        roster,
        ..ship.clone()
    }
}

pub fn advance_missile(missile: &Missile) -> Missile {
    Missile {
        position: Vec2::new(
            missile.position.x + missile.velocity.x,
            missile.position.y + missile.velocity.y,
        ),
        ..missile.clone()
    }
}

/// True while any part of the missile sprite overlaps the arena.
pub fn missile_in_arena(missile: &Missile, arena: Arena) -> bool {
    missile.position.x + missile.sprite.width >= 0.0
        && missile.position.x <= arena.width
        && missile.position.y + missile.sprite.height >= 0.0
        && missile.position.y <= arena.height
}

// ── Shield ───────────────────────────────────────────────────────────────────

pub fn toggle_shield(ship: &Ship) -> Ship {
    match ship.shield {
        ShieldState::Off => {
            log::debug!("shield up");
            Ship {
                shield: ShieldState::On(ShieldTimer::default()),
                ..ship.clone()
            }
        }
        ShieldState::On(_) => {
            log::debug!("shield dropped");
            deactivate_shield(ship)
        }
    }
}

/// Advance the shield fade by `elapsed_ms`.  Once every cycle has run the
/// shield drops on its own.
pub fn tick_shield(ship: &Ship, elapsed_ms: u64) -> Ship {
    let ShieldState::On(timer) = ship.shield else {
        return ship.clone();
    };
    let elapsed_ms = timer.elapsed_ms.saturating_add(elapsed_ms);
    if elapsed_ms >= shield_duration_ms(&ship.tuning) {
        log::debug!("shield expired after {elapsed_ms} ms");
        return deactivate_shield(ship);
    }
    Ship {
        shield: ShieldState::On(ShieldTimer { elapsed_ms }),
        ..ship.clone()
    }
}

/// Single cleanup path for both manual toggle-off and expiry.
pub fn deactivate_shield(ship: &Ship) -> Ship {
    Ship {
        shield: ShieldState::Off,
        ..ship.clone()
    }
}

/// Total fade length; saturates instead of overflowing on huge tunings.
pub fn shield_duration_ms(tuning: &Tuning) -> u64 {
    u64::from(tuning.shield_cycles).saturating_mul(tuning.shield_cycle_ms)
}

/// Current shield opacity, or `None` while the shield is down.
///
/// Even cycles fade from `shield_opacity_from` to `shield_opacity_to`, odd
/// cycles fade back.
pub fn shield_opacity(ship: &Ship) -> Option<f64> {
    let ShieldState::On(timer) = ship.shield else {
        return None;
    };
    let t = &ship.tuning;
    // `init_ship` takes unvalidated tuning; treat a zero cycle as 1 ms.
    let cycle_ms = t.shield_cycle_ms.max(1);
    let cycle = timer.elapsed_ms / cycle_ms;
    let frac = (timer.elapsed_ms % cycle_ms) as f64 / cycle_ms as f64;
    let (from, to) = if cycle % 2 == 0 {
        (t.shield_opacity_from, t.shield_opacity_to)
    } else {
        (t.shield_opacity_to, t.shield_opacity_from)
    };
    Some(from + (to - from) * frac)
}

// ── Lives & collisions ───────────────────────────────────────────────────────

/// Lose one life unless shielded or already dead.  Reaching zero kills.
pub fn take_damage(ship: &Ship) -> Ship {
    if !ship.alive || ship.shield_on() {
        return ship.clone();
    }
    let lives = ship.lives.saturating_sub(1);
    log::debug!("hit, {lives} lives left");
    Ship {
        lives,
        alive: lives > 0,
        ..ship.clone()
    }
}

/// A fresh ship with the same tuning, sprites and weapons.
pub fn reset(ship: &Ship) -> Ship {
    init_ship(
        ship.tuning,
        ship.sprite,
        ship.shield_circle.radius,
        ship.roster.rewound(),
    )
}

/// Overlap test between the active collision circle and `other` (scene
/// coordinates).
pub fn collides(ship: &Ship, other: &Circle) -> bool {
    let own = ship.collision_circle();
    let dx = own.center.x - other.center.x;
    let dy = own.center.y - other.center.y;
    dx.hypot(dy) <= own.radius + other.radius
}
