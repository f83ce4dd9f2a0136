use std::ops::Deref;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::member::Member;
use crate::error::GuildError;

/// Most troops a member can field in one assignment (the export has five troop columns).
pub const MAX_TROOPS_PER_KNIGHT: usize = 5;

/// The fixed task vocabulary. Every new plan gets one group per task, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BattleTask {
    Gate,
    Breach,
    Wall1,
    Wall2,
    Wall3,
    Popeo,
    Town1,
    Town2,
    Reserve,
    Other,
}

string_enum!(BattleTask {
    Gate => "Puerta",
    Breach => "Brecha",
    Wall1 => "Muralla 1",
    Wall2 => "Muralla 2",
    Wall3 => "Muralla 3",
    Popeo => "Popeo",
    Town1 => "Pueblo 1",
    Town2 => "Pueblo 2",
    Reserve => "Reserva",
    Other => "Otro",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Planning,
    Completed,
}

/// A member's loadout inside one group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BattleKnight {
    #[serde(rename = "userId")]
    pub member_id: String,
    #[serde(rename = "selectedTroops", default)]
    pub troop_ids: Vec<String>,
    #[serde(rename = "selectedWeaponId", default, skip_serializing_if = "Option::is_none")]
    pub weapon_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BattleGroup {
    pub id: String,
    pub task: BattleTask,
    #[serde(default)]
    pub knights: Vec<BattleKnight>,
    /// No capacity limit; the same piece may sit in several groups.
    #[serde(default)]
    pub artillery_ids: Vec<String>,
}

impl BattleGroup {
    pub fn new(id: String, task: BattleTask) -> Self {
        Self {
            id,
            task,
            knights: Vec::new(),
            artillery_ids: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.knights.is_empty() && self.artillery_ids.is_empty()
    }

    pub fn knight(&self, member_id: &str) -> Option<&BattleKnight> {
        self.knights.iter().find(|k| k.member_id == member_id)
    }
}

/// What a member brings to an assignment: owned troops and optionally an owned weapon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loadout {
    pub troop_ids: Vec<String>,
    pub weapon_id: Option<String>,
}

impl Loadout {
    /// Check every referenced troop and weapon against what `member` owns.
    pub fn validate_for(&self, member: &Member) -> Result<(), GuildError> {
        if self.troop_ids.len() > MAX_TROOPS_PER_KNIGHT {
            return Err(GuildError::validation(format!(
                "at most {MAX_TROOPS_PER_KNIGHT} troops per assignment, got {}",
                self.troop_ids.len()
            )));
        }
        for (i, troop_id) in self.troop_ids.iter().enumerate() {
            if self.troop_ids[..i].contains(troop_id) {
                return Err(GuildError::validation(format!(
                    "troop {troop_id} selected twice"
                )));
            }
            if member.owned_troop(troop_id).is_none() {
                return Err(GuildError::validation(format!(
                    "{} does not own troop {troop_id}",
                    member.name
                )));
            }
        }
        if let Some(weapon_id) = &self.weapon_id {
            if member.owned_weapon(weapon_id).is_none() {
                return Err(GuildError::validation(format!(
                    "{} does not own weapon {weapon_id}",
                    member.name
                )));
            }
        }
        Ok(())
    }
}

/// Fields shared by both plan states. Read-only outside this module.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanContents {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub groups: Vec<BattleGroup>,
    /// Flat index of every assigned member id across all groups.
    pub selected_knights: Vec<String>,
}

impl PlanContents {
    pub fn group(&self, group_id: &str) -> Option<&BattleGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn is_selected(&self, member_id: &str) -> bool {
        self.selected_knights.iter().any(|id| id == member_id)
    }

    /// The group (and assignment) holding `member_id`, if any.
    pub fn assignment_of(&self, member_id: &str) -> Option<(&BattleGroup, &BattleKnight)> {
        self.groups
            .iter()
            .find_map(|g| g.knight(member_id).map(|k| (g, k)))
    }
}

/// A plan still open for editing. The only type with mutators.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPlan {
    contents: PlanContents,
}

/// A finalized plan. Frozen: no way to change groups, knights or artillery.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedPlan {
    contents: PlanContents,
}

impl Deref for DraftPlan {
    type Target = PlanContents;

    fn deref(&self) -> &PlanContents {
        &self.contents
    }
}

impl Deref for CompletedPlan {
    type Target = PlanContents;

    fn deref(&self) -> &PlanContents {
        &self.contents
    }
}

impl DraftPlan {
    /// An empty draft with one group per task.
    pub fn new(
        id: String,
        name: String,
        date: NaiveDate,
        mut group_id: impl FnMut(BattleTask) -> String,
    ) -> Self {
        let groups = BattleTask::ALL
            .iter()
            .map(|&task| BattleGroup::new(group_id(task), task))
            .collect();
        Self {
            contents: PlanContents {
                id,
                name,
                date,
                groups,
                selected_knights: Vec::new(),
            },
        }
    }

    fn group_mut(&mut self, group_id: &str) -> Result<&mut BattleGroup, GuildError> {
        self.contents
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| GuildError::validation(format!("group {group_id} does not exist")))
    }

    /// Put `member` into `group_id` with `loadout`. On error the draft is unchanged.
    pub fn assign(
        &mut self,
        group_id: &str,
        member: &Member,
        loadout: Loadout,
    ) -> Result<(), GuildError> {
        if self.is_selected(&member.uid) {
            return Err(GuildError::validation(format!(
                "{} is already assigned in this plan",
                member.name
            )));
        }
        loadout.validate_for(member)?;
        let group = self.group_mut(group_id)?;
        group.knights.push(BattleKnight {
            member_id: member.uid.clone(),
            troop_ids: loadout.troop_ids,
            weapon_id: loadout.weapon_id,
        });
        self.contents.selected_knights.push(member.uid.clone());
        Ok(())
    }

    /// Remove `member_id` from `group_id`. Removing someone who is not in that
    /// group changes nothing.
    pub fn unassign(&mut self, group_id: &str, member_id: &str) -> Result<(), GuildError> {
        let group = self.group_mut(group_id)?;
        let before = group.knights.len();
        group.knights.retain(|k| k.member_id != member_id);
        if group.knights.len() != before {
            self.contents.selected_knights.retain(|id| id != member_id);
        }
        Ok(())
    }

    /// Attach an artillery piece; attaching a piece already in the group is a no-op.
    pub fn attach_artillery(&mut self, group_id: &str, artillery_id: &str) -> Result<(), GuildError> {
        let group = self.group_mut(group_id)?;
        if !group.artillery_ids.iter().any(|id| id == artillery_id) {
            group.artillery_ids.push(artillery_id.to_string());
        }
        Ok(())
    }

    pub fn detach_artillery(&mut self, group_id: &str, artillery_id: &str) -> Result<(), GuildError> {
        let group = self.group_mut(group_id)?;
        group.artillery_ids.retain(|id| id != artillery_id);
        Ok(())
    }

    pub fn rename(&mut self, name: String) -> Result<(), GuildError> {
        if name.trim().is_empty() {
            return Err(GuildError::validation("plan name is required"));
        }
        self.contents.name = name;
        Ok(())
    }

    pub fn finalize(self) -> CompletedPlan {
        CompletedPlan {
            contents: self.contents,
        }
    }
}

/// A battle plan in one of its two lifecycle states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PlanDocument", from = "PlanDocument")]
pub enum BattlePlan {
    Planning(DraftPlan),
    Completed(CompletedPlan),
}

impl BattlePlan {
    pub fn contents(&self) -> &PlanContents {
        match self {
            BattlePlan::Planning(draft) => &draft.contents,
            BattlePlan::Completed(done) => &done.contents,
        }
    }

    pub fn id(&self) -> &str {
        &self.contents().id
    }

    pub fn status(&self) -> PlanStatus {
        match self {
            BattlePlan::Planning(_) => PlanStatus::Planning,
            BattlePlan::Completed(_) => PlanStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, BattlePlan::Completed(_))
    }

    /// Borrow the editable draft, or fail if the plan is already completed.
    pub fn draft(&self) -> Result<&DraftPlan, GuildError> {
        match self {
            BattlePlan::Planning(draft) => Ok(draft),
            BattlePlan::Completed(done) => Err(GuildError::invalid_state(format!(
                "plan {} is completed and can no longer be edited",
                done.id
            ))),
        }
    }
}

/// Stored shape of a plan document.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanDocument {
    id: String,
    name: String,
    date: NaiveDate,
    #[serde(default)]
    groups: Vec<BattleGroup>,
    #[serde(default)]
    selected_knights: Vec<String>,
    status: PlanStatus,
}

impl From<BattlePlan> for PlanDocument {
    fn from(plan: BattlePlan) -> Self {
        let status = plan.status();
        let contents = match plan {
            BattlePlan::Planning(draft) => draft.contents,
            BattlePlan::Completed(done) => done.contents,
        };
        PlanDocument {
            id: contents.id,
            name: contents.name,
            date: contents.date,
            groups: contents.groups,
            selected_knights: contents.selected_knights,
            status,
        }
    }
}

impl From<PlanDocument> for BattlePlan {
    fn from(doc: PlanDocument) -> Self {
        let contents = PlanContents {
            id: doc.id,
            name: doc.name,
            date: doc.date,
            groups: doc.groups,
            selected_knights: doc.selected_knights,
        };
        match doc.status {
            PlanStatus::Planning => BattlePlan::Planning(DraftPlan { contents }),
            PlanStatus::Completed => BattlePlan::Completed(CompletedPlan { contents }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::member::{OwnedTroop, Role};

    fn knight_with(troops: &[&str], weapons: &[&str]) -> Member {
        let mut m = Member {
            uid: "u1".to_string(),
            email: String::new(),
            name: "Juan".to_string(),
            discord_id: None,
            role: Role::Knight,
            troops: troops
                .iter()
                .map(|t| OwnedTroop {
                    troop_id: t.to_string(),
                    ..OwnedTroop::default()
                })
                .collect(),
            weapons: Vec::new(),
        };
        for w in weapons {
            m.add_weapon(w);
        }
        m
    }

    fn draft() -> DraftPlan {
        let mut n = 0;
        DraftPlan::new(
            "plan_1".to_string(),
            "Asedio".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            |_| {
                n += 1;
                format!("group_{n}")
            },
        )
    }

    #[test]
    fn new_draft_has_one_group_per_task() {
        let plan = draft();
        assert_eq!(plan.groups.len(), BattleTask::ALL.len());
        assert_eq!(plan.groups[0].task, BattleTask::Gate);
        assert_eq!(plan.groups[0].id, "group_1");
        assert!(plan.groups.iter().all(BattleGroup::is_empty));
        assert!(plan.selected_knights.is_empty());
    }

    #[test]
    fn task_labels() {
        assert_eq!(BattleTask::Gate.to_string(), "Puerta");
        assert_eq!(
            BattleTask::try_from("Muralla 3".to_string()).unwrap(),
            BattleTask::Wall3
        );
        assert!(BattleTask::try_from("Foso".to_string()).is_err());
    }

    #[test]
    fn loadout_must_be_owned() {
        let member = knight_with(&["t1_serfs"], &["w_pike"]);
        let ok = Loadout {
            troop_ids: vec!["t1_serfs".to_string()],
            weapon_id: Some("w_pike".to_string()),
        };
        assert!(ok.validate_for(&member).is_ok());

        let foreign_troop = Loadout {
            troop_ids: vec!["t5_chevaliers".to_string()],
            weapon_id: None,
        };
        assert!(matches!(
            foreign_troop.validate_for(&member),
            Err(GuildError::Validation(_))
        ));

        let foreign_weapon = Loadout {
            troop_ids: vec![],
            weapon_id: Some("w_maul".to_string()),
        };
        assert!(matches!(
            foreign_weapon.validate_for(&member),
            Err(GuildError::Validation(_))
        ));
    }

    #[test]
    fn loadout_rejects_duplicates_and_overflow() {
        let troops = ["a", "b", "c", "d", "e", "f"];
        let member = knight_with(&troops, &[]);
        let dup = Loadout {
            troop_ids: vec!["a".to_string(), "a".to_string()],
            weapon_id: None,
        };
        assert!(dup.validate_for(&member).is_err());

        let six = Loadout {
            troop_ids: troops.iter().map(|t| t.to_string()).collect(),
            weapon_id: None,
        };
        assert!(six.validate_for(&member).is_err());
    }

    #[test]
    fn failed_assign_leaves_draft_unchanged() {
        let member = knight_with(&["t1_serfs"], &[]);
        let mut plan = draft();
        let before = plan.clone();
        let err = plan
            .assign("group_404", &member, Loadout::default())
            .unwrap_err();
        assert!(matches!(err, GuildError::Validation(_)));
        assert_eq!(plan, before);
    }

    #[test]
    fn unassign_from_wrong_group_keeps_selection() {
        let member = knight_with(&[], &[]);
        let mut plan = draft();
        plan.assign("group_1", &member, Loadout::default()).unwrap();
        plan.unassign("group_2", "u1").unwrap();
        assert!(plan.is_selected("u1"));
        assert_eq!(plan.assignment_of("u1").unwrap().0.id, "group_1");
    }

    #[test]
    fn document_shape_matches_store() {
        let member = knight_with(&["t1_serfs"], &["w_pike"]);
        let mut plan = draft();
        plan.assign(
            "group_1",
            &member,
            Loadout {
                troop_ids: vec!["t1_serfs".to_string()],
                weapon_id: Some("w_pike".to_string()),
            },
        )
        .unwrap();
        plan.attach_artillery("group_1", "art_trebuchet").unwrap();

        let json = serde_json::to_value(BattlePlan::Planning(plan)).unwrap();
        assert_eq!(json["status"], "planning");
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["selectedKnights"][0], "u1");
        assert_eq!(json["groups"][0]["task"], "Puerta");
        assert_eq!(json["groups"][0]["knights"][0]["userId"], "u1");
        assert_eq!(json["groups"][0]["knights"][0]["selectedTroops"][0], "t1_serfs");
        assert_eq!(json["groups"][0]["knights"][0]["selectedWeaponId"], "w_pike");
        assert_eq!(json["groups"][0]["artilleryIds"][0], "art_trebuchet");
    }

    #[test]
    fn completed_status_deserializes_to_frozen_variant() {
        let json = r#"{
            "id": "plan_9", "name": "Defensa", "date": "2024-05-04",
            "groups": [{"id": "g1", "task": "Reserva", "knights": []}],
            "selectedKnights": [], "status": "completed"
        }"#;
        let plan: BattlePlan = serde_json::from_str(json).unwrap();
        assert!(plan.is_completed());
        assert!(plan.contents().groups[0].artillery_ids.is_empty());
        assert!(matches!(plan.draft(), Err(GuildError::InvalidState(_))));
    }
}
