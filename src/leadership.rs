//! Leadership budget: how much of a member's leadership capacity a chosen
//! troop loadout uses. Advisory only; over-budget loadouts are flagged, never
//! rejected.

use serde::Serialize;

use crate::model::{Catalog, Member, OwnedTroop, OwnedWeapon, Troop};

/// Capacity assumed when no weapon is selected.
pub const DEFAULT_CAPACITY: u32 = 700;

/// Leadership doctrine cost, as a percentage of base cost.
const DOCTRINE_PERCENT: u64 = 84;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub used: u32,
    pub total: u32,
    pub over_budget: bool,
}

/// Cost of fielding `troop`: `floor(base * 0.84)` with leadership doctrine,
/// otherwise the base cost. Computed in `u64`; the result never exceeds the base.
pub fn effective_leadership(troop: &Troop, owned: Option<&OwnedTroop>) -> u32 {
    match owned {
        Some(flags) if flags.leadership_doctrine => {
            (u64::from(troop.leadership) * DOCTRINE_PERCENT / 100) as u32
        }
        _ => troop.leadership,
    }
}

/// Used vs. available leadership for a selection of troop ids.
///
/// Ids the member does not own, or that are missing from the catalog, add nothing.
pub fn budget_report(
    selected_troop_ids: &[String],
    owned_troops: &[OwnedTroop],
    catalog: &Catalog,
    selected_weapon: Option<&OwnedWeapon>,
) -> BudgetReport {
    let total = selected_weapon.map_or(DEFAULT_CAPACITY, |w| w.leadership);
    let used = selected_troop_ids
        .iter()
        .filter_map(|id| {
            let owned = owned_troops.iter().find(|t| &t.troop_id == id)?;
            let troop = catalog.troop(id)?;
            Some(effective_leadership(troop, Some(owned)))
        })
        .fold(0u32, u32::saturating_add);
    BudgetReport {
        used,
        total,
        over_budget: used > total,
    }
}

/// Budget for `member` fielding `troop_ids` with `weapon_id` (resolved against
/// the member's owned weapons).
pub fn member_budget(
    member: &Member,
    troop_ids: &[String],
    weapon_id: Option<&str>,
    catalog: &Catalog,
) -> BudgetReport {
    let weapon = weapon_id.and_then(|id| member.owned_weapon(id));
    budget_report(troop_ids, &member.troops, catalog, weapon)
}
