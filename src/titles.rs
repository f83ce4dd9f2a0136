//! Season lifecycle and weekly nobility-title bookkeeping.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::GuildError;
use crate::id::IdGenerator;
use crate::model::catalog::by_name;
use crate::model::{Member, NobilityTitle, Season, TitleAssignment};

pub const DAYS_PER_WEEK: i64 = 7;

/// Deactivate every existing season and append a new active one.
/// Returns the full updated season list.
pub fn start_season(
    seasons: &[Season],
    ids: &mut IdGenerator,
    name: &str,
    start_date: NaiveDate,
) -> Result<Vec<Season>, GuildError> {
    if name.trim().is_empty() {
        return Err(GuildError::validation("season name is required"));
    }
    let mut updated: Vec<Season> = seasons
        .iter()
        .map(|s| Season {
            is_active: false,
            ..s.clone()
        })
        .collect();
    let id = ids.next_free_id("season", |id| seasons.iter().any(|s| s.id == id));
    let season = Season {
        id,
        name: name.trim().to_string(),
        start_date,
        is_active: true,
    };
    tracing::info!(season = %season.id, start = %start_date, "season started");
    updated.push(season);
    Ok(updated)
}

pub fn active_season(seasons: &[Season]) -> Option<&Season> {
    seasons.iter().find(|s| s.is_active)
}

/// Seasons newest first.
pub fn seasons_by_start(seasons: &[Season]) -> Vec<&Season> {
    let mut sorted: Vec<&Season> = seasons.iter().collect();
    sorted.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    sorted
}

/// 1-based week of `season` containing `today`: `floor(days / 7) + 1`.
/// Dates before the season start count whole days of distance the same way.
pub fn current_week_number(season: &Season, today: NaiveDate) -> u32 {
    let days = (today - season.start_date).num_days().abs();
    (days / DAYS_PER_WEEK) as u32 + 1
}

/// Result of replacing one week's assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekReplacement {
    /// Records to write for the week.
    pub records: Vec<TitleAssignment>,
    /// Ids of existing records for the week that are no longer present.
    pub removed_ids: Vec<String>,
}

/// Build the full set of records for (`season_id`, `week`) from
/// `by_member`, replacing whatever `existing` held for that exact week.
/// Records for other weeks and seasons are not touched.
pub fn replace_week(
    existing: &[TitleAssignment],
    season_id: &str,
    week: u32,
    by_member: &BTreeMap<String, Option<String>>,
) -> WeekReplacement {
    let records: Vec<TitleAssignment> = by_member
        .iter()
        .map(|(member_id, title_id)| TitleAssignment {
            id: TitleAssignment::document_id(season_id, week, member_id),
            season_id: season_id.to_string(),
            week_number: week,
            member_id: member_id.clone(),
            title_id: title_id.clone().filter(|t| !t.is_empty()),
        })
        .collect();
    let removed_ids = existing
        .iter()
        .filter(|a| a.season_id == season_id && a.week_number == week)
        .filter(|a| !records.iter().any(|r| r.id == a.id))
        .map(|a| a.id.clone())
        .collect();
    WeekReplacement {
        records,
        removed_ids,
    }
}

/// Apply a replacement to an in-memory list of assignments.
pub fn apply_replacement(
    existing: &[TitleAssignment],
    season_id: &str,
    week: u32,
    replacement: &WeekReplacement,
) -> Vec<TitleAssignment> {
    existing
        .iter()
        .filter(|a| !(a.season_id == season_id && a.week_number == week))
        .cloned()
        .chain(replacement.records.iter().cloned())
        .collect()
}

/// The current (member → title) mapping for one week, for pre-filling the editor.
pub fn week_mapping(
    assignments: &[TitleAssignment],
    season_id: &str,
    week: u32,
) -> BTreeMap<String, Option<String>> {
    assignments
        .iter()
        .filter(|a| a.season_id == season_id && a.week_number == week)
        .map(|a| (a.member_id.clone(), a.title_id.clone()))
        .collect()
}

/// How many weeks one member held each title during a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTitleTally {
    pub member_id: String,
    pub member_name: String,
    /// Title id → weeks held. Every catalog title is present, zeros included.
    pub counts: BTreeMap<String, u32>,
}

/// Per-member title counts for `season_id`. Members who never held a title are
/// left out; assignments for unknown members or titles are ignored.
pub fn season_summary(
    season_id: &str,
    assignments: &[TitleAssignment],
    titles: &[NobilityTitle],
    members: &[Member],
) -> Vec<MemberTitleTally> {
    let mut tallies: BTreeMap<&str, MemberTitleTally> = members
        .iter()
        .map(|m| {
            (
                m.uid.as_str(),
                MemberTitleTally {
                    member_id: m.uid.clone(),
                    member_name: m.name.clone(),
                    counts: titles.iter().map(|t| (t.id.clone(), 0)).collect(),
                },
            )
        })
        .collect();

    for assignment in assignments.iter().filter(|a| a.season_id == season_id) {
        let Some(title_id) = assignment.title_id.as_deref() else {
            continue;
        };
        if let Some(count) = tallies
            .get_mut(assignment.member_id.as_str())
            .and_then(|tally| tally.counts.get_mut(title_id))
        {
            *count += 1;
        }
    }

    let mut rows: Vec<MemberTitleTally> = tallies
        .into_values()
        .filter(|t| t.counts.values().any(|&c| c > 0))
        .collect();
    rows.sort_by(|a, b| by_name(&a.member_name, &b.member_name));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn season(id: &str, start: NaiveDate, active: bool) -> Season {
        Season {
            id: id.to_string(),
            name: id.to_string(),
            start_date: start,
            is_active: active,
        }
    }

    fn member(uid: &str, name: &str) -> Member {
        Member {
            uid: uid.to_string(),
            email: String::new(),
            name: name.to_string(),
            discord_id: None,
            role: Role::Knight,
            troops: Vec::new(),
            weapons: Vec::new(),
        }
    }

    fn mapping(pairs: &[(&str, Option<&str>)]) -> BTreeMap<String, Option<String>> {
        pairs
            .iter()
            .map(|(m, t)| (m.to_string(), t.map(str::to_string)))
            .collect()
    }

    #[test]
    fn starting_a_season_deactivates_the_rest() {
        let existing = vec![
            season("s1", date(2023, 6, 1), false),
            season("s2", date(2023, 9, 1), true),
        ];
        let mut ids = IdGenerator::starting_from(3);
        let seasons = start_season(&existing, &mut ids, "Invierno", date(2024, 1, 1)).unwrap();
        assert_eq!(seasons.len(), 3);
        let active: Vec<_> = seasons.iter().filter(|s| s.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "season_3");
        assert_eq!(active_season(&seasons).unwrap().name, "Invierno");
        assert_eq!(seasons_by_start(&seasons)[0].id, "season_3");
    }

    #[test]
    fn fresh_generators_never_reuse_a_season_id() {
        let first = start_season(&[], &mut IdGenerator::new(), "Otoño", date(2024, 9, 1)).unwrap();
        let both = start_season(&first, &mut IdGenerator::new(), "Invierno", date(2024, 12, 1)).unwrap();
        assert_eq!(both.len(), 2);
        assert_ne!(both[0].id, both[1].id);
        assert_eq!(active_season(&both).unwrap().name, "Invierno");
        assert_eq!(both.iter().filter(|s| s.is_active).count(), 1);
    }

    #[test]
    fn season_name_is_required() {
        let mut ids = IdGenerator::new();
        assert!(matches!(
            start_season(&[], &mut ids, " ", date(2024, 1, 1)),
            Err(GuildError::Validation(_))
        ));
    }

    #[test]
    fn week_number_counts_whole_weeks() {
        let s = season("s", date(2024, 1, 1), true);
        assert_eq!(current_week_number(&s, date(2024, 1, 1)), 1);
        assert_eq!(current_week_number(&s, date(2024, 1, 7)), 1);
        assert_eq!(current_week_number(&s, date(2024, 1, 8)), 2);
        assert_eq!(current_week_number(&s, date(2024, 1, 10)), 2);
        assert_eq!(current_week_number(&s, date(2024, 2, 1)), 5);
    }

    #[test]
    fn saving_a_week_twice_keeps_only_the_second_mapping() {
        let first = replace_week(&[], "S", 3, &mapping(&[("u1", Some("title_1")), ("u2", Some("title_2"))]));
        let week2 = replace_week(&[], "S", 2, &mapping(&[("u1", Some("title_5"))]));
        let mut stored = apply_replacement(&[], "S", 2, &week2);
        stored = apply_replacement(&stored, "S", 3, &first);

        let second_map = mapping(&[("u2", Some("title_3"))]);
        let second = replace_week(&stored, "S", 3, &second_map);
        assert_eq!(second.removed_ids, vec!["assign_S_3_u1".to_string()]);
        stored = apply_replacement(&stored, "S", 3, &second);

        assert_eq!(week_mapping(&stored, "S", 3), second_map);
        assert_eq!(
            week_mapping(&stored, "S", 2),
            mapping(&[("u1", Some("title_5"))])
        );
    }

    #[test]
    fn empty_title_is_stored_as_null() {
        let replacement = replace_week(&[], "S", 1, &mapping(&[("u1", Some(""))]));
        assert_eq!(replacement.records[0].title_id, None);
    }

    #[test]
    fn summary_counts_weeks_and_drops_empty_rows() {
        let titles = vec![
            NobilityTitle {
                id: "t1".to_string(),
                name: "Favor".to_string(),
            },
            NobilityTitle {
                id: "t2".to_string(),
                name: "Héroe".to_string(),
            },
        ];
        let members = vec![member("u1", "Zoe"), member("u2", "Ana"), member("u3", "Luis")];
        let mut assignments = Vec::new();
        for (week, map) in [
            (1, mapping(&[("u1", Some("t1")), ("u2", Some("t2")), ("u3", None)])),
            (2, mapping(&[("u1", Some("t1")), ("u2", None), ("ghost", Some("t1"))])),
            (3, mapping(&[("u1", Some("t2")), ("u3", Some("unknown"))])),
        ] {
            let r = replace_week(&assignments, "S", week, &map);
            assignments = apply_replacement(&assignments, "S", week, &r);
        }
        let other = replace_week(&assignments, "OTHER", 1, &mapping(&[("u3", Some("t1"))]));
        assignments = apply_replacement(&assignments, "OTHER", 1, &other);

        let summary = season_summary("S", &assignments, &titles, &members);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].member_name, "Ana");
        assert_eq!(summary[0].counts["t2"], 1);
        assert_eq!(summary[1].member_name, "Zoe");
        assert_eq!(summary[1].counts["t1"], 2);
        assert_eq!(summary[1].counts["t2"], 1);
    }
}
