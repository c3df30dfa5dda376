// src/game/movement.rs
use super::board::{are_adjacent, TerrainMap};
use super::cost::{combine, total, Cost};
use super::types::*;
use super::zoc::{in_zoc, ZoC};
use crate::enums::{Side, TerrainKind};

/// Price of entering a cell of the given terrain.
pub fn terrain_cost(kind: TerrainKind) -> Cost {
    match kind {
        TerrainKind::Road => Cost::half(Cost::Zero),
        TerrainKind::Clear => Cost::one(Cost::Zero),
        TerrainKind::Forest => Cost::two(Cost::Zero),
        TerrainKind::Hills => Cost::one(Cost::half(Cost::Zero)),
        TerrainKind::Marsh => Cost::two(Cost::one(Cost::Zero)),
        TerrainKind::Impassable => Cost::Impossible,
    }
}

fn occupied_by_enemy(side: Side, units: &[Deployment], pos: Position) -> bool {
    units
        .iter()
        .any(|(unit, location)| *location == pos && unit.side() != side)
}

/// Cost for a unit of `side` to move one hex from `from` to `to`.
///
/// Entering an enemy zone of control costs an extra point; moving directly
/// from one enemy zone into another is forbidden.
pub fn step_cost(
    map: &TerrainMap,
    units: &[Deployment],
    side: Side,
    from: Position,
    to: Position,
) -> Cost {
    if !are_adjacent(from, to) || occupied_by_enemy(side, units, to) {
        return Cost::Impossible;
    }
    let base = terrain_cost(map.terrain_at(to));
    match (in_zoc(side, units, from), in_zoc(side, units, to)) {
        (_, ZoC::Free) => base,
        (ZoC::Free, ZoC::InZoC(_)) => combine(base, Cost::one(Cost::Zero)),
        (ZoC::InZoC(_), ZoC::InZoC(_)) => Cost::Impossible,
    }
}

/// Accumulated cost along `path`, which lists every hex including the start.
pub fn path_cost(map: &TerrainMap, units: &[Deployment], side: Side, path: &[Position]) -> Cost {
    total(
        path.windows(2)
            .map(|step| step_cost(map, units, side, step[0], step[1])),
    )
}

/// Index and cost of the cheapest candidate path; ties keep the earliest.
pub fn cheapest<'a, I>(
    map: &TerrainMap,
    units: &[Deployment],
    side: Side,
    candidates: I,
) -> Option<(usize, Cost)>
where
    I: IntoIterator<Item = &'a [Position]>,
{
    let mut best: Option<(usize, Cost)> = None;
    for (index, path) in candidates.into_iter().enumerate() {
        let cost = path_cost(map, units, side, path);
        let improves = best
            .as_ref()
            .map_or(true, |(_, current)| cost < *current);
        if improves {
            best = Some((index, cost));
        }
    }
    best
}
