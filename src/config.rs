/// Ship tuning and the weapon roster, read from an optional JSON file.
///
/// Every field has a default, so `{}` is a valid settings file and a file
/// only needs to list what it changes.  Weapons may be written as bare
/// identifiers (`"laser"`) or as objects carrying their own sprite size.

use std::path::Path;

use serde::Deserialize;

use crate::compute::init_ship;
use crate::entities::{Ship, SpriteSize, Tuning, Vec2, Weapon, WeaponRoster};
use crate::error::ConfigError;

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_SPEED: f64 = 3.0;
pub const DEFAULT_LIVES: u32 = 3;
pub const MAX_LIVES: u32 = 9;
pub const DEFAULT_START: Vec2 = Vec2 { x: 350.0, y: 450.0 };
pub const DEFAULT_SHIP_SPRITE: SpriteSize = SpriteSize { width: 64.0, height: 64.0 };
pub const DEFAULT_MISSILE_SPRITE: SpriteSize = SpriteSize { width: 16.0, height: 32.0 };
pub const DEFAULT_SHIELD_RADIUS: f64 = 60.0;
pub const DEFAULT_SHIELD_CYCLES: u32 = 12;
pub const DEFAULT_SHIELD_CYCLE_MS: u64 = 1000;
pub const DEFAULT_SHIELD_OPACITY_FROM: f64 = 1.0;
pub const DEFAULT_SHIELD_OPACITY_TO: f64 = 0.4;
pub const DEFAULT_WEAPONS: [&str; 3] = ["small_missile", "big_missile", "laser"];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WeaponEntry {
    Id(String),
    Detailed { id: String, sprite: SpriteSize },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub speed: f64,
    pub lives: u32,
    pub start: Vec2,
    pub ship_sprite: SpriteSize,
    /// Sprite size for weapons listed by bare identifier.
    pub missile_sprite: SpriteSize,
    pub shield_radius: f64,
    pub shield_cycles: u32,
    pub shield_cycle_ms: u64,
    pub shield_opacity_from: f64,
    pub shield_opacity_to: f64,
    pub weapons: Vec<WeaponEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            speed: DEFAULT_SPEED,
            lives: DEFAULT_LIVES,
            start: DEFAULT_START,
            ship_sprite: DEFAULT_SHIP_SPRITE,
            missile_sprite: DEFAULT_MISSILE_SPRITE,
            shield_radius: DEFAULT_SHIELD_RADIUS,
            shield_cycles: DEFAULT_SHIELD_CYCLES,
            shield_cycle_ms: DEFAULT_SHIELD_CYCLE_MS,
            shield_opacity_from: DEFAULT_SHIELD_OPACITY_FROM,
            shield_opacity_to: DEFAULT_SHIELD_OPACITY_TO,
            weapons: DEFAULT_WEAPONS
                .iter()
                .map(|id| WeaponEntry::Id(id.to_string()))
                .collect(),
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&text)?;
        log::info!(
            "loaded settings from {} ({} weapons)",
            path.display(),
            settings.weapons.len()
        );
        Ok(settings)
    }

    /// Radius of the body hitbound implied by `ship_sprite`.
    pub fn hitbound_radius(&self) -> f64 {
        self.ship_sprite.width.max(self.ship_sprite.height) / 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(invalid("speed", format!("must be positive, got {}", self.speed)));
        }
        if !(1..=MAX_LIVES).contains(&self.lives) {
            return Err(invalid(
                "lives",
                format!("must lie in 1..={MAX_LIVES}, got {}", self.lives),
            ));
        }
        check_sprite("ship_sprite", &self.ship_sprite)?;
        check_sprite("missile_sprite", &self.missile_sprite)?;
        if !(self.shield_radius > self.hitbound_radius()) {
            return Err(invalid(
                "shield_radius",
                format!(
                    "must exceed the hitbound radius {}, got {}",
                    self.hitbound_radius(),
                    self.shield_radius
                ),
            ));
        }
        if self.shield_cycles == 0 {
            return Err(invalid("shield_cycles", "must be at least 1".to_string()));
        }
        if self.shield_cycle_ms == 0 {
            return Err(invalid("shield_cycle_ms", "must be at least 1".to_string()));
        }
        if u64::from(self.shield_cycles)
            .checked_mul(self.shield_cycle_ms)
            .is_none()
        {
            return Err(invalid(
                "shield_cycle_ms",
                format!(
                    "{} cycles of {} ms overflow the shield timer",
                    self.shield_cycles, self.shield_cycle_ms
                ),
            ));
        }
        for (field, value) in [
            ("shield_opacity_from", self.shield_opacity_from),
            ("shield_opacity_to", self.shield_opacity_to),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("must lie in 0..=1, got {value}")));
            }
        }
        for entry in &self.weapons {
            if let WeaponEntry::Detailed { id, sprite } = entry {
                check_sprite("weapons", sprite)
                    .map_err(|_| invalid("weapons", format!("bad sprite size for `{id}`")))?;
            }
        }
        self.roster().map(|_| ())
    }

    pub fn roster(&self) -> Result<WeaponRoster, ConfigError> {
        let weapons = self
            .weapons
            .iter()
            .map(|entry| match entry {
                WeaponEntry::Id(id) => Weapon {
                    id: id.clone(),
                    sprite: self.missile_sprite,
                },
                WeaponEntry::Detailed { id, sprite } => Weapon {
                    id: id.clone(),
                    sprite: *sprite,
                },
            })
            .collect();
        WeaponRoster::new(weapons)
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            speed: self.speed,
            lives: self.lives,
            start: self.start,
            shield_cycles: self.shield_cycles,
            shield_cycle_ms: self.shield_cycle_ms,
            shield_opacity_from: self.shield_opacity_from,
            shield_opacity_to: self.shield_opacity_to,
        }
    }

    /// Validate and build a ship at the configured start position.
    pub fn build_ship(&self) -> Result<Ship, ConfigError> {
        self.validate()?;
        Ok(init_ship(
            self.tuning(),
            self.ship_sprite,
            self.shield_radius,
            self.roster()?,
        ))
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}

fn check_sprite(field: &'static str, sprite: &SpriteSize) -> Result<(), ConfigError> {
    let ok = |v: f64| v.is_finite() && v > 0.0;
    if ok(sprite.width) && ok(sprite.height) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("sprite must be positive, got {}x{}", sprite.width, sprite.height),
        ))
    }
}
