//! Heading-up radar scope.

use engine_core::{wrapped_delta_2d, Faction, Position, Vec2, WorldConfig};
use hecs::{Entity, World};

use crate::entity::{EntityKind, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    Hostile,
    HostileAir,
    Friendly,
    Objective,
}

impl ContactType {
    pub fn color(&self) -> [u8; 3] {
        match self {
            ContactType::Hostile => [230, 50, 40],
            ContactType::HostileAir => [255, 140, 0],
            ContactType::Friendly => [60, 220, 90],
            ContactType::Objective => [255, 215, 0],
        }
    }
}

/// One blip, in scope coordinates: `(0, 0)` is the player, `+y` points up the
/// scope (straight ahead), `+x` to the right. Both axes span
/// `[-radar_size / 2, radar_size / 2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub entity: Option<Entity>,
    pub contact_type: ContactType,
    pub offset: Vec2,
    pub distance: f32,
}

pub struct Radar {
    /// Scope diameter in pixels.
    pub size: f32,
    /// World distance shown at the scope rim.
    pub range: f32,
    map_size: f32,
}

impl Radar {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            size: config.radar_size,
            range: config.radar_range,
            map_size: config.map_size_f32(),
        }
    }

    /// Scope offset of a world point, or `None` beyond radar range.
    pub fn to_scope(&self, observer: &Position, point: Vec2) -> Option<(Vec2, f32)> {
        let delta = wrapped_delta_2d(observer.xy(), point, self.map_size);
        let distance = delta.length();
        if distance > self.range {
            return None;
        }
        let forward = observer.forward();
        let right = Vec2::new(forward.y, -forward.x);
        let scale = self.size * 0.5 / self.range.max(1.0);
        Some((Vec2::new(delta.dot(right), delta.dot(forward)) * scale, distance))
    }

    /// Live units in range, plus extra objective markers.
    pub fn scan(&self, world: &World, observer: &Position, markers: &[Vec2]) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = world
            .query::<(&Position, &Unit)>()
            .iter()
            .filter(|(_, (_, unit))| unit.alive)
            .filter_map(|(e, (pos, unit))| {
                let (offset, distance) = self.to_scope(observer, pos.xy())?;
                Some(Contact {
                    entity: Some(e),
                    contact_type: classify(unit),
                    offset,
                    distance,
                })
            })
            .collect();

        contacts.extend(markers.iter().filter_map(|m| {
            let (offset, distance) = self.to_scope(observer, *m)?;
            Some(Contact {
                entity: None,
                contact_type: ContactType::Objective,
                offset,
                distance,
            })
        }));
        contacts.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        contacts
    }
}

fn classify(unit: &Unit) -> ContactType {
    match (unit.faction, unit.kind) {
        (Faction::Friendly, _) => ContactType::Friendly,
        (Faction::Hostile, EntityKind::AirFighter | EntityKind::AirAttackHeli) => ContactType::HostileAir,
        (Faction::Hostile, _) => ContactType::Hostile,
    }
}
