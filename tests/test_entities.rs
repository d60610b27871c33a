use ufo_ship::config::Settings;
use ufo_ship::entities::*;
use ufo_ship::error::ConfigError;

fn weapon(id: &str) -> Weapon {
    Weapon {
        id: id.to_string(),
        sprite: SpriteSize { width: 16.0, height: 32.0 },
    }
}

#[test]
fn roster_rejects_empty_list() {
    assert!(matches!(WeaponRoster::new(Vec::new()), Err(ConfigError::EmptyRoster)));
}

#[test]
fn roster_starts_at_first_weapon() {
    let roster = WeaponRoster::new(vec![weapon("a"), weapon("b")]).unwrap();
    assert_eq!(roster.index(), 0);
    assert_eq!(roster.current().id, "a");
    assert_eq!(roster.len(), 2);
}

#[test]
fn roster_cycled_wraps_and_rewound_resets() {
    let roster = WeaponRoster::new(vec![weapon("a"), weapon("b")]).unwrap();
    let once = roster.cycled();
    assert_eq!(once.current().id, "b");
    let twice = once.cycled();
    assert_eq!(twice.index(), 0);
    assert_eq!(once.rewound().index(), 0);
    // Cycling returns a copy
    assert_eq!(roster.index(), 0);
}

#[test]
fn collision_bounds_yield_their_circle() {
    let c = Circle { center: Vec2::new(1.0, 2.0), radius: 3.0 };
    assert_eq!(CollisionBounds::Body(c).circle(), c);
    assert_eq!(CollisionBounds::Shield(c).circle(), c);
}

#[test]
fn ship_center_and_collision_circle_are_in_scene_coordinates() {
    let ship = Settings::default().build_ship().unwrap();
    // Default start (350, 450), 64 × 64 sprite
    assert_eq!(ship.center(), Vec2::new(382.0, 482.0));
    let circle = ship.collision_circle();
    assert_eq!(circle.center, Vec2::new(382.0, 482.0));
    assert_eq!(circle.radius, 32.0);
}

#[test]
fn ship_clone_is_independent() {
    let original = Settings::default().build_ship().unwrap();
    let mut cloned = original.clone();

    cloned.position.x = 99.0;
    cloned.lives = 1;
    cloned.roster = cloned.roster.cycled();

    assert_eq!(original.position.x, 350.0);
    assert_eq!(original.lives, 3);
    assert_eq!(original.roster.index(), 0);
}

#[test]
fn vec2_length() {
    assert_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
    assert_eq!(Vec2::ZERO.length(), 0.0);
}
