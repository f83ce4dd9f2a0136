use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::plan::MAX_TROOPS_PER_KNIGHT;
use crate::model::{BattlePlan, Catalog, Member};

pub const HEADER: &str =
    "Grupo de Batalla,Tipo de Asignación,Nombre,Arma,Tropa 1,Tropa 2,Tropa 3,Tropa 4,Tropa 5";

const KNIGHT_ROW: &str = "Miembro";
const ARTILLERY_ROW: &str = "Artillería";
const UNKNOWN_MEMBER: &str = "Desconocido";
const NO_WEAPON: &str = "N/A";
const UNKNOWN_ARTILLERY: &str = "Desconocida";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn push_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| quote(f)).collect();
    out.push('\n');
    out.push_str(&row.join(","));
}

/// Render `plan` as CSV: one row per assigned knight, then one per attached
/// artillery piece, group by group. Groups with neither produce no rows.
pub fn export_plan(plan: &BattlePlan, catalog: &Catalog, roster: &[Member]) -> String {
    let mut out = String::from(HEADER);
    for group in &plan.contents().groups {
        if group.is_empty() {
            continue;
        }
        let task = group.task.as_str();

        for knight in &group.knights {
            let name = roster
                .iter()
                .find(|m| m.uid == knight.member_id)
                .map_or(UNKNOWN_MEMBER, |m| m.name.as_str());
            let weapon = knight
                .weapon_id
                .as_deref()
                .and_then(|id| catalog.weapon(id))
                .map_or(NO_WEAPON, |w| w.name.as_str());
            let mut troops: Vec<&str> = knight
                .troop_ids
                .iter()
                .map(|id| catalog.troop(id).map_or("", |t| t.name.as_str()))
                .collect();
            troops.resize(MAX_TROOPS_PER_KNIGHT, "");

            let mut fields = vec![task, KNIGHT_ROW, name, weapon];
            fields.extend(troops);
            push_row(&mut out, &fields);
        }

        for artillery_id in &group.artillery_ids {
            let name = catalog
                .artillery_piece(artillery_id)
                .map_or(UNKNOWN_ARTILLERY, |a| a.name.as_str());
            let mut fields = vec![task, ARTILLERY_ROW, name];
            fields.resize(4 + MAX_TROOPS_PER_KNIGHT, "");
            push_row(&mut out, &fields);
        }
    }
    out
}

/// `plan_<name with spaces replaced by underscores>.csv`
pub fn export_file_name(plan: &BattlePlan) -> String {
    format!("plan_{}.csv", plan.contents().name.replace(' ', "_"))
}

/// Write the export of `plan` into `output_dir`, creating it if needed.
/// Returns the path written.
pub fn write_plan_csv(
    plan: &BattlePlan,
    catalog: &Catalog,
    roster: &[Member],
    output_dir: &Path,
) -> io::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(export_file_name(plan));
    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(export_plan(plan, catalog, roster).as_bytes())?;
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Artillery, BattleTask, DraftPlan, Loadout, OwnedTroop, OwnedWeapon, Role, Troop, Weapon,
    };
    use chrono::NaiveDate;

    fn catalog() -> Catalog {
        Catalog {
            troops: vec![Troop {
                id: "troop_serfs".to_string(),
                name: "Serfs".to_string(),
                tier: 1,
                leadership: 40,
                image_url: String::new(),
            }],
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
            ..Catalog::default()
        }
    }

    fn juan() -> Member {
        Member {
            uid: "u_juan".to_string(),
            email: "juan@example.com".to_string(),
            name: "Juan".to_string(),
            discord_id: None,
            role: Role::Knight,
            troops: vec![OwnedTroop {
                troop_id: "troop_serfs".to_string(),
                ..OwnedTroop::default()
            }],
            weapons: vec![OwnedWeapon {
                weapon_id: "weapon_pike".to_string(),
                leadership: 700,
                epic_weapon_blueprint: false,
                epic_armor_blueprint: false,
                reforged_armor: false,
                is_favorite: true,
            }],
        }
    }

    fn siege_plan() -> BattlePlan {
        let mut n = 0;
        let mut draft = DraftPlan::new(
            "plan_1".to_string(),
            "Asedio de la Ciudad".to_string(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            |_| {
                n += 1;
                format!("group_{n}")
            },
        );
        let gate = draft
            .groups
            .iter()
            .find(|g| g.task == BattleTask::Gate)
            .unwrap()
            .id
            .clone();
        draft
            .assign(
                &gate,
                &juan(),
                Loadout {
                    troop_ids: vec!["troop_serfs".to_string()],
                    weapon_id: Some("weapon_pike".to_string()),
                },
            )
            .unwrap();
        draft.attach_artillery(&gate, "art_trebuchet").unwrap();
        BattlePlan::Planning(draft)
    }

    #[test]
    fn siege_export_has_one_knight_and_one_artillery_row() {
        let csv = export_plan(&siege_plan(), &catalog(), &[juan()]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            r#""Puerta","Miembro","Juan","Pica","Serfs","","","","""#
        );
        assert!(lines[1].ends_with(r#""Serfs","","","","""#));
        assert_eq!(
            lines[2],
            r#""Puerta","Artillería","Trebuchet","","","","","","""#
        );
        assert_eq!(export_file_name(&siege_plan()), "plan_Asedio_de_la_Ciudad.csv");
    }

    #[test]
    fn unknown_references_fall_back_to_labels() {
        let mut catalog = catalog();
        catalog.weapons.clear();
        catalog.artillery.clear();
        catalog.troops.clear();
        let csv = export_plan(&siege_plan(), &catalog, &[]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[1],
            r#""Puerta","Miembro","Desconocido","N/A","","","","","""#
        );
        assert!(lines[2].contains(r#""Desconocida""#));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(quote(r#"El "Rojo""#), r#""El ""Rojo""""#);
    }

    #[test]
    fn empty_plan_is_header_only() {
        let draft = DraftPlan::new(
            "plan_2".to_string(),
            "Vacío".to_string(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            |task| format!("g_{task}"),
        );
        let csv = export_plan(&BattlePlan::Planning(draft), &catalog(), &[]);
        assert_eq!(csv, HEADER);
    }

    #[test]
    fn writes_file_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plan_csv(&siege_plan(), &catalog(), &[juan()], dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "plan_Asedio_de_la_Ciudad.csv");
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written.lines().count(), 3);
    }
}
