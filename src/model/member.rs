use serde::{Deserialize, Serialize};

use super::catalog::by_name;
use crate::error::GuildError;
use crate::identity::Principal;

/// Leadership a weapon starts with when added to a member's equipment.
pub const MIN_WEAPON_LEADERSHIP: u32 = 700;
pub const MAX_WEAPON_LEADERSHIP: u32 = 1000;
/// Weapon leadership moves in steps of this size.
pub const WEAPON_LEADERSHIP_STEP: u32 = 5;

/// Roster listing page size.
pub const MEMBERS_PER_PAGE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Role {
    Commander,
    Officer,
    Captain,
    LevySergeant,
    Knight,
    Squire,
}

string_enum!(Role {
    Commander => "Comandante",
    Officer => "Oficial",
    Captain => "Capitán",
    LevySergeant => "Sargento de Levas",
    Knight => "Caballero",
    Squire => "Escudero",
});

impl Role {
    /// Position in the guild hierarchy; higher outranks lower.
    pub fn rank(self) -> u8 {
        match self {
            Role::Commander => 5,
            Role::Officer => 4,
            Role::Captain => 3,
            Role::LevySergeant => 2,
            Role::Knight => 1,
            Role::Squire => 0,
        }
    }

    pub fn outranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }

    /// Roles this role may hand out: everything strictly below it.
    pub fn assignable_roles(self) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|r| self.outranks(*r))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedTroop {
    pub troop_id: String,
    #[serde(default)]
    pub mastery: bool,
    /// Reduces the troop's leadership cost to 84%.
    #[serde(default)]
    pub leadership_doctrine: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_max_level: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedWeapon {
    pub weapon_id: String,
    /// Leadership capacity this weapon grants, 700–1000.
    pub leadership: u32,
    #[serde(default)]
    pub epic_weapon_blueprint: bool,
    #[serde(default)]
    pub epic_armor_blueprint: bool,
    #[serde(default)]
    pub reforged_armor: bool,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Partial update of an owned troop's toggles. `None` leaves a flag as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TroopPatch {
    pub mastery: Option<bool>,
    pub leadership_doctrine: Option<bool>,
    pub is_favorite: Option<bool>,
    pub is_max_level: Option<bool>,
}

/// Partial update of an owned weapon. `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeaponPatch {
    pub leadership: Option<u32>,
    pub epic_weapon_blueprint: Option<bool>,
    pub epic_armor_blueprint: Option<bool>,
    pub reforged_armor: Option<bool>,
    pub is_favorite: Option<bool>,
}

/// Fields a higher-ranked member may change on someone else's profile.
#[derive(Debug, Clone)]
pub struct StaffEdit {
    pub name: String,
    pub discord_id: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub troops: Vec<OwnedTroop>,
    #[serde(default)]
    pub weapons: Vec<OwnedWeapon>,
}

/// Snap a requested leadership value into the allowed weapon range.
pub fn clamp_weapon_leadership(value: u32) -> u32 {
    let clamped = value.clamp(MIN_WEAPON_LEADERSHIP, MAX_WEAPON_LEADERSHIP);
    clamped - clamped % WEAPON_LEADERSHIP_STEP
}

impl Member {
    /// Profile created the first time a principal signs in.
    /// Falls back to the e-mail local part when there is no display name.
    pub fn new_profile(principal: &Principal, role: Role) -> Self {
        let name = principal
            .display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                principal
                    .email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });
        Self {
            uid: principal.id.clone(),
            email: principal.email.clone(),
            name,
            discord_id: None,
            role,
            troops: Vec::new(),
            weapons: Vec::new(),
        }
    }

    pub fn owned_troop(&self, troop_id: &str) -> Option<&OwnedTroop> {
        self.troops.iter().find(|t| t.troop_id == troop_id)
    }

    pub fn owned_weapon(&self, weapon_id: &str) -> Option<&OwnedWeapon> {
        self.weapons.iter().find(|w| w.weapon_id == weapon_id)
    }

    pub fn favorite_weapon(&self) -> Option<&OwnedWeapon> {
        self.weapons.iter().find(|w| w.is_favorite)
    }

    /// The weapon pre-selected when assigning this member: favorite, else first owned.
    pub fn default_weapon(&self) -> Option<&OwnedWeapon> {
        self.favorite_weapon().or_else(|| self.weapons.first())
    }

    /// Add a weapon at base leadership. The first weapon becomes the favorite.
    /// Returns false if the weapon was already owned.
    pub fn add_weapon(&mut self, weapon_id: &str) -> bool {
        if self.owned_weapon(weapon_id).is_some() {
            return false;
        }
        let is_favorite = self.weapons.is_empty();
        self.weapons.push(OwnedWeapon {
            weapon_id: weapon_id.to_string(),
            leadership: MIN_WEAPON_LEADERSHIP,
            epic_weapon_blueprint: false,
            epic_armor_blueprint: false,
            reforged_armor: false,
            is_favorite,
        });
        true
    }

    /// Apply a patch to an owned weapon. Marking it favorite clears the flag on
    /// every other weapon so at most one favorite exists.
    pub fn update_weapon(&mut self, weapon_id: &str, patch: WeaponPatch) -> Result<(), GuildError> {
        let weapon = self
            .weapons
            .iter_mut()
            .find(|w| w.weapon_id == weapon_id)
            .ok_or_else(|| GuildError::not_found("owned weapon", weapon_id))?;

        if let Some(v) = patch.leadership {
            weapon.leadership = clamp_weapon_leadership(v);
        }
        if let Some(v) = patch.epic_weapon_blueprint {
            weapon.epic_weapon_blueprint = v;
        }
        if let Some(v) = patch.epic_armor_blueprint {
            weapon.epic_armor_blueprint = v;
        }
        if let Some(v) = patch.reforged_armor {
            weapon.reforged_armor = v;
        }
        if let Some(v) = patch.is_favorite {
            weapon.is_favorite = v;
        }

        if patch.is_favorite == Some(true) {
            for other in self.weapons.iter_mut().filter(|w| w.weapon_id != weapon_id) {
                other.is_favorite = false;
            }
        }
        Ok(())
    }

    pub fn remove_weapon(&mut self, weapon_id: &str) -> bool {
        let before = self.weapons.len();
        self.weapons.retain(|w| w.weapon_id != weapon_id);
        self.weapons.len() != before
    }

    /// Update an owned troop's toggles, adding the troop (all flags off) first
    /// if the member does not own it yet.
    pub fn upsert_troop(&mut self, troop_id: &str, patch: TroopPatch) {
        let idx = match self.troops.iter().position(|t| t.troop_id == troop_id) {
            Some(idx) => idx,
            None => {
                self.troops.push(OwnedTroop {
                    troop_id: troop_id.to_string(),
                    ..OwnedTroop::default()
                });
                self.troops.len() - 1
            }
        };
        let troop = &mut self.troops[idx];
        if let Some(v) = patch.mastery {
            troop.mastery = v;
        }
        if let Some(v) = patch.leadership_doctrine {
            troop.leadership_doctrine = v;
        }
        if let Some(v) = patch.is_favorite {
            troop.is_favorite = v;
        }
        if let Some(v) = patch.is_max_level {
            troop.is_max_level = v;
        }
    }

    pub fn remove_troop(&mut self, troop_id: &str) -> bool {
        let before = self.troops.len();
        self.troops.retain(|t| t.troop_id != troop_id);
        self.troops.len() != before
    }

    /// Whether this member may edit `target`'s staff fields: never themself,
    /// and only members of strictly lower rank.
    pub fn can_edit(&self, target: &Member) -> bool {
        self.uid != target.uid && self.role.outranks(target.role)
    }

    /// Only the Commander removes members, and never themself.
    pub fn can_delete(&self, target: &Member) -> bool {
        self.uid != target.uid && self.role == Role::Commander
    }

    /// Apply a staff edit made by `self` to `target`, returning the updated profile.
    pub fn edit_staff(&self, target: &Member, edit: StaffEdit) -> Result<Member, GuildError> {
        if !self.can_edit(target) {
            return Err(GuildError::Permission(format!(
                "{} may not edit {}",
                self.name, target.name
            )));
        }
        if edit.name.trim().is_empty() {
            return Err(GuildError::validation("member name is required"));
        }
        if !self.role.outranks(edit.role) {
            return Err(GuildError::Permission(format!(
                "{} may not grant the role {}",
                self.role, edit.role
            )));
        }
        Ok(Member {
            name: edit.name,
            discord_id: edit.discord_id.filter(|d| !d.trim().is_empty()),
            role: edit.role,
            ..target.clone()
        })
    }
}

/// One page of the roster, sorted by name.
#[derive(Debug)]
pub struct RosterPage<'a> {
    pub members: Vec<&'a Member>,
    /// 1-based page actually returned (clamped into range).
    pub page: usize,
    pub total_pages: usize,
}

/// Sort the roster by name and slice out `page` (1-based). Pages past the end
/// fall back to the last page.
pub fn roster_page(members: &[Member], page: usize) -> RosterPage<'_> {
    let mut sorted: Vec<&Member> = members.iter().collect();
    sorted.sort_by(|a, b| by_name(&a.name, &b.name));
    let total_pages = sorted.len().div_ceil(MEMBERS_PER_PAGE);
    let page = page.clamp(1, total_pages.max(1));
    let members = sorted
        .into_iter()
        .skip((page - 1) * MEMBERS_PER_PAGE)
        .take(MEMBERS_PER_PAGE)
        .collect();
    RosterPage {
        members,
        page,
        total_pages,
    }
}
