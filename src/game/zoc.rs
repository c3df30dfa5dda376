// src/game/zoc.rs
use serde::{Deserialize, Serialize};

use super::board::are_adjacent;
use super::types::*;
use crate::enums::Side;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ZoC {
    Free,
    InZoC(Side),
}

impl ZoC {
    pub fn is_free(&self) -> bool {
        matches!(self, ZoC::Free)
    }
}

/// True when `unit` is hostile to `side` and stands next to `pos`.
pub fn in_zoc_of(pos: Position, side: Side, (unit, location): &Deployment) -> bool {
    unit.side() == side.other() && are_adjacent(pos, *location)
}

/// Control of `pos` as seen by `side`.
///
/// Units are scanned in table order and the first one exerting control
/// decides the result. Downstream rules rely on this order, so nearest-unit
/// or side-aggregated resolution must not be substituted here.
pub fn in_zoc(side: Side, units: &[Deployment], pos: Position) -> ZoC {
    units
        .iter()
        .find(|deployment| in_zoc_of(pos, side, deployment))
        .map_or(ZoC::Free, |(unit, _)| ZoC::InZoC(unit.side()))
}
