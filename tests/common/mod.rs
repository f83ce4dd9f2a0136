#![allow(dead_code)]

use tercio::model::*;

pub fn troop(id: &str, name: &str, tier: u8, leadership: u32) -> Troop {
    Troop {
        id: id.to_string(),
        name: name.to_string(),
        tier,
        leadership,
        image_url: String::new(),
    }
}

pub fn build_test_catalog() -> Catalog {
    Catalog {
        troops: vec![
            troop("troop_serfs", "Serfs", 1, 40),
            troop("troop_halberdiers", "Halberdiers", 3, 150),
            troop("troop_reapers", "Iron Reapers", 5, 300),
        ],
        weapons: vec![Weapon {
            id: "weapon_pike".to_string(),
            name: "Pica".to_string(),
            image_url: String::new(),
        }],
        artillery: vec![Artillery {
            id: "art_trebuchet".to_string(),
            name: "Trebuchet".to_string(),
            image_url: String::new(),
        }],
        nobility_titles: vec![
            NobilityTitle {
                id: "title_favor".to_string(),
                name: "Favor del Rey".to_string(),
            },
            NobilityTitle {
                id: "title_hero".to_string(),
                name: "Héroe".to_string(),
            },
        ],
        seasons: Vec::new(),
    }
}

/// A knight owning every test troop (doctrine on the reapers) and the pike.
pub fn knight(uid: &str, name: &str) -> Member {
    let mut member = Member {
        uid: uid.to_string(),
        email: format!("{uid}@tercio.es"),
        name: name.to_string(),
        discord_id: None,
        role: Role::Knight,
        troops: Vec::new(),
        weapons: Vec::new(),
    };
    member.add_weapon("weapon_pike");
    member.upsert_troop("troop_serfs", TroopPatch::default());
    member.upsert_troop("troop_halberdiers", TroopPatch::default());
    member.upsert_troop(
        "troop_reapers",
        TroopPatch {
            leadership_doctrine: Some(true),
            ..TroopPatch::default()
        },
    );
    member
}

pub fn build_test_roster() -> Vec<Member> {
    vec![knight("u_juan", "Juan"), knight("u_pedro", "Pedro"), knight("u_ana", "Ana")]
}

pub fn loadout(troops: &[&str]) -> Loadout {
    Loadout {
        troop_ids: troops.iter().map(|t| t.to_string()).collect(),
        weapon_id: Some("weapon_pike".to_string()),
    }
}

pub fn group_id(plan: &BattlePlan, task: BattleTask) -> String {
    plan.contents()
        .groups
        .iter()
        .find(|g| g.task == task)
        .map(|g| g.id.clone())
        .unwrap()
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
