/// All ship-side entity types — pure data, no game logic.
///
/// Positions are scene coordinates (x grows right, y grows down).  Circles
/// that belong to the ship are stored in ship-local coordinates, i.e.
/// relative to `Ship::position`.

use serde::Deserialize;

use crate::error::ConfigError;

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Bounds of a sprite image in local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SpriteSize {
    pub width: f64,
    pub height: f64,
}

impl SpriteSize {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

/// The circle the ship currently collides with.  Exactly one is active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionBounds {
    /// The hitbound, sized to the larger sprite dimension.
    Body(Circle),
    Shield(Circle),
}

impl CollisionBounds {
    pub fn circle(&self) -> Circle {
        match self {
            CollisionBounds::Body(c) | CollisionBounds::Shield(c) => *c,
        }
    }
}

// ── Shield ────────────────────────────────────────────────────────────────────

/// Running shield fade.  `elapsed_ms` counts from activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShieldTimer {
    pub elapsed_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShieldState {
    Off,
    On(ShieldTimer),
}

// ── Weapons ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Weapon {
    /// Identifier token, also used as the missile's sprite key.
    pub id: String,
    pub sprite: SpriteSize,
}

/// Ordered, non-empty weapon list plus the current selection.
#[derive(Clone, Debug, PartialEq)]
pub struct WeaponRoster {
    weapons: Vec<Weapon>,
    index: usize,
}

impl WeaponRoster {
    pub fn new(weapons: Vec<Weapon>) -> Result<Self, ConfigError> {
        if weapons.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        Ok(WeaponRoster { weapons, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn current(&self) -> &Weapon {
        &self.weapons[self.index]
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    /// Roster with the selection moved one step forward, wrapping to 0.
    pub fn cycled(&self) -> Self {
        WeaponRoster {
            weapons: self.weapons.clone(),
            index: (self.index + 1) % self.weapons.len(),
        }
    }

    /// Same weapons, selection back at the first entry.
    pub fn rewound(&self) -> Self {
        WeaponRoster {
            weapons: self.weapons.clone(),
            index: 0,
        }
    }
}

// ── Projectiles ───────────────────────────────────────────────────────────────

/// A fired projectile.  Owned by whoever called `fire`; the ship keeps no
/// handle to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Missile {
    pub weapon: String,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Sprite rotation in degrees: travel direction + 90°.
    pub render_angle: f64,
    pub sprite: SpriteSize,
}

// ── Input & world ─────────────────────────────────────────────────────────────

/// One frame of directional input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keys {
    pub up: bool,
    pub left: bool,
    pub down: bool,
    pub right: bool,
}

/// Scene extent, origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

// ── Ship ──────────────────────────────────────────────────────────────────────

/// Fixed per-ship tuning, copied from `Settings` when the ship is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    /// Constant speed C shared by the ship and its missiles.
    pub speed: f64,
    pub lives: u32,
    pub start: Vec2,
    pub shield_cycles: u32,
    pub shield_cycle_ms: u64,
    pub shield_opacity_from: f64,
    pub shield_opacity_to: f64,
}

/// The player ship.  Cloneable so pure update functions can return a new
/// copy without mutating the original.
#[derive(Clone, Debug, PartialEq)]
pub struct Ship {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing in degrees, kept from the last non-zero move or shot.
    pub facing: f64,
    pub lives: u32,
    pub alive: bool,
    /// Set when the ship sits past the top or bottom edge (the edges spanning
    /// the arena width).  Suppresses vertical travel.
    pub out_of_bound_width: bool,
    /// Set when the ship sits past the left or right edge.  Suppresses
    /// horizontal travel.
    pub out_of_bound_height: bool,
    pub roster: WeaponRoster,
    pub shield: ShieldState,
    pub sprite: SpriteSize,
    pub hitbound: Circle,
    pub shield_circle: Circle,
    pub tuning: Tuning,
}

impl Ship {
    pub fn shield_on(&self) -> bool {
        matches!(self.shield, ShieldState::On(_))
    }

    pub fn weapon(&self) -> &Weapon {
        self.roster.current()
    }

    /// Scene coordinates of the sprite centre.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.hitbound.center.x,
            self.position.y + self.hitbound.center.y,
        )
    }

    /// The shield circle while the shield is up, the hitbound otherwise.
    pub fn bounds(&self) -> CollisionBounds {
        match self.shield {
            ShieldState::On(_) => CollisionBounds::Shield(self.shield_circle),
            ShieldState::Off => CollisionBounds::Body(self.hitbound),
        }
    }

    /// Active collision circle in scene coordinates.
    pub fn collision_circle(&self) -> Circle {
        let local = self.bounds().circle();
        Circle {
            center: Vec2::new(
                self.position.x + local.center.x,
                self.position.y + local.center.y,
            ),
            radius: local.radius,
        }
    }
}
