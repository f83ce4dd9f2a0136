#[macro_use]
mod macros;

pub mod catalog;
pub mod member;
pub mod nobility;
pub mod plan;

pub use catalog::{Artillery, Catalog, NobilityTitle, Troop, Weapon};
pub use member::{Member, OwnedTroop, OwnedWeapon, Role, StaffEdit, TroopPatch, WeaponPatch};
pub use nobility::{Season, TitleAssignment};
pub use plan::{
    BattleGroup, BattleKnight, BattlePlan, BattleTask, CompletedPlan, DraftPlan, Loadout,
    PlanStatus,
};
