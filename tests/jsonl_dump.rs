mod common;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;
use tercio::db::MemoryStore;
use tercio::{GuildRepository, IdGenerator, flush, planner};

#[tokio::test]
async fn dump_writes_one_file_per_collection() {
    let repo = GuildRepository::new(MemoryStore::new());
    repo.save_catalog(&common::build_test_catalog()).await.unwrap();
    for member in common::build_test_roster() {
        repo.save_member(&member).await.unwrap();
    }
    let mut ids = IdGenerator::new();
    let plan = planner::create_plan(&mut ids, "Asedio", "2024-05-01").unwrap();
    repo.save_plan(&plan).await.unwrap();
    let season = repo
        .start_season(&mut ids, "Verano", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        .await
        .unwrap();
    let week: BTreeMap<String, Option<String>> = [
        ("u_juan".to_string(), Some("title_favor".to_string())),
        ("u_ana".to_string(), None),
    ]
    .into_iter()
    .collect();
    repo.save_week(&season.id, 1, &week).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = flush::dump_collections(repo.store(), dir.path()).await.unwrap();
    assert_eq!(written.len(), 4);

    let users = common::read_lines(&dir.path().join("users.jsonl"));
    assert_eq!(users.len(), 3);
    let first: Value = serde_json::from_str(&users[0]).unwrap();
    assert_eq!(first["id"], "u_ana");
    assert_eq!(first["body"]["name"], "Ana");

    let master = common::read_lines(&dir.path().join("masterData.jsonl"));
    assert_eq!(master.len(), 1);
    let catalog: Value = serde_json::from_str(&master[0]).unwrap();
    assert_eq!(catalog["id"], "singleton");
    assert_eq!(catalog["body"]["seasons"][0]["name"], "Verano");
    assert_eq!(catalog["body"]["troops"].as_array().unwrap().len(), 3);

    let plans = common::read_lines(&dir.path().join("battlePlans.jsonl"));
    assert_eq!(plans.len(), 1);
    let plan_line: Value = serde_json::from_str(&plans[0]).unwrap();
    assert_eq!(plan_line["body"]["status"], "planning");

    let titles = common::read_lines(&dir.path().join("titleAssignments.jsonl"));
    assert_eq!(titles.len(), 2);
}

#[tokio::test]
async fn dump_of_empty_store_writes_empty_files() {
    let store = MemoryStore::new();
    let dir = tempfile::tempdir().unwrap();
    let written = flush::dump_collections(&store, &dir.path().join("nested")).await.unwrap();
    for path in written {
        assert!(common::read_lines(&path).is_empty());
    }
}
