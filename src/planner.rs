//! Battle-plan operations. Each operation takes the current plan and returns the
//! updated plan; the input is never modified, so a failed operation leaves the
//! caller's plan exactly as it was.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::GuildError;
use crate::id::IdGenerator;
use crate::leadership::{BudgetReport, effective_leadership, member_budget};
use crate::model::catalog::by_name;
use crate::model::{BattlePlan, Catalog, DraftPlan, Loadout, Member, OwnedTroop, Troop};

/// Create an empty plan with one group per task.
///
/// `date` is an ISO `YYYY-MM-DD` string; an empty name or date is a validation error.
pub fn create_plan(ids: &mut IdGenerator, name: &str, date: &str) -> Result<BattlePlan, GuildError> {
    if name.trim().is_empty() || date.trim().is_empty() {
        return Err(GuildError::validation(
            "a plan needs both a name and a date",
        ));
    }
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| GuildError::validation(format!("invalid plan date {date:?}: {e}")))?;
    let plan_id = ids.next_id("plan");
    let draft = DraftPlan::new(plan_id, name.trim().to_string(), date, |_| {
        ids.next_id("group")
    });
    tracing::info!(plan = %draft.id, name = %draft.name, "battle plan created");
    Ok(BattlePlan::Planning(draft))
}

/// Apply `edit` to a copy of the plan's draft.
fn edit(
    plan: &BattlePlan,
    edit: impl FnOnce(&mut DraftPlan) -> Result<(), GuildError>,
) -> Result<BattlePlan, GuildError> {
    let mut draft = plan.draft()?.clone();
    edit(&mut draft)?;
    Ok(BattlePlan::Planning(draft))
}

pub fn assign_member(
    plan: &BattlePlan,
    group_id: &str,
    member: &Member,
    loadout: Loadout,
) -> Result<BattlePlan, GuildError> {
    edit(plan, |draft| draft.assign(group_id, member, loadout))
}

pub fn unassign_member(
    plan: &BattlePlan,
    group_id: &str,
    member_id: &str,
) -> Result<BattlePlan, GuildError> {
    edit(plan, |draft| draft.unassign(group_id, member_id))
}

pub fn attach_artillery(
    plan: &BattlePlan,
    group_id: &str,
    artillery_id: &str,
) -> Result<BattlePlan, GuildError> {
    edit(plan, |draft| draft.attach_artillery(group_id, artillery_id))
}

pub fn detach_artillery(
    plan: &BattlePlan,
    group_id: &str,
    artillery_id: &str,
) -> Result<BattlePlan, GuildError> {
    edit(plan, |draft| draft.detach_artillery(group_id, artillery_id))
}

/// Freeze the plan. Completing an already completed plan is an invalid-state error.
pub fn complete_plan(plan: &BattlePlan) -> Result<BattlePlan, GuildError> {
    let draft = plan.draft()?.clone();
    tracing::info!(plan = %draft.id, "battle plan completed");
    Ok(BattlePlan::Completed(draft.finalize()))
}

/// Members not yet assigned anywhere in the plan, sorted by name.
pub fn available_members<'a>(members: &'a [Member], plan: &BattlePlan) -> Vec<&'a Member> {
    let contents = plan.contents();
    let mut available: Vec<&Member> = members
        .iter()
        .filter(|m| !contents.is_selected(&m.uid))
        .collect();
    available.sort_by(|a, b| by_name(&a.name, &b.name));
    available
}

/// One of a member's troops as offered in the assignment dialog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TroopOption<'a> {
    pub troop: &'a Troop,
    pub owned: &'a OwnedTroop,
    pub effective_leadership: u32,
}

/// The member's owned troops resolved against the catalog: tier descending,
/// then name ascending. Owned ids missing from the catalog are skipped.
pub fn available_troops<'a>(member: &'a Member, catalog: &'a Catalog) -> Vec<TroopOption<'a>> {
    let mut options: Vec<TroopOption<'a>> = member
        .troops
        .iter()
        .filter_map(|owned| {
            let troop = catalog.troop(&owned.troop_id)?;
            Some(TroopOption {
                troop,
                owned,
                effective_leadership: effective_leadership(troop, Some(owned)),
            })
        })
        .collect();
    options.sort_by(|a, b| {
        b.troop
            .tier
            .cmp(&a.troop.tier)
            .then_with(|| by_name(&a.troop.name, &b.troop.name))
    });
    options
}

/// Plans as listed for loading: most recent date first.
pub fn plans_for_loading(plans: &[BattlePlan]) -> Vec<&BattlePlan> {
    let mut sorted: Vec<&BattlePlan> = plans.iter().collect();
    sorted.sort_by(|a, b| b.contents().date.cmp(&a.contents().date));
    sorted
}

/// A member's own orders for one plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarOrders {
    pub plan_name: String,
    pub plan_date: NaiveDate,
    pub completed: bool,
    pub group_task: String,
    pub weapon_name: Option<String>,
    /// (troop name, effective leadership) in selection order.
    pub troops: Vec<(String, u32)>,
    pub budget: BudgetReport,
    pub group_mates: Vec<String>,
    pub artillery: Vec<String>,
}

/// Resolve `member`'s assignment in `plan`, or `None` if they are not assigned.
/// References that no longer resolve are dropped from the lists.
pub fn war_orders(
    plan: &BattlePlan,
    member: &Member,
    roster: &[Member],
    catalog: &Catalog,
) -> Option<WarOrders> {
    let contents = plan.contents();
    let (group, knight) = contents.assignment_of(&member.uid)?;

    let troops = knight
        .troop_ids
        .iter()
        .filter_map(|id| {
            let owned = member.owned_troop(id)?;
            let troop = catalog.troop(id)?;
            Some((troop.name.clone(), effective_leadership(troop, Some(owned))))
        })
        .collect();
    let weapon_name = knight
        .weapon_id
        .as_deref()
        .filter(|id| member.owned_weapon(id).is_some())
        .and_then(|id| catalog.weapon(id))
        .map(|w| w.name.clone());
    let budget = member_budget(member, &knight.troop_ids, knight.weapon_id.as_deref(), catalog);
    let group_mates = group
        .knights
        .iter()
        .filter(|k| k.member_id != member.uid)
        .filter_map(|k| roster.iter().find(|m| m.uid == k.member_id))
        .map(|m| m.name.clone())
        .collect();
    let artillery = group
        .artillery_ids
        .iter()
        .filter_map(|id| catalog.artillery_piece(id))
        .map(|a| a.name.clone())
        .collect();

    Some(WarOrders {
        plan_name: contents.name.clone(),
        plan_date: contents.date,
        completed: plan.is_completed(),
        group_task: group.task.to_string(),
        weapon_name,
        troops,
        budget,
        group_mates,
        artillery,
    })
}
