mod support;

use std::fs;

use predicates::str::contains;
use serde_json::Value;

use support::TestData;

fn add(data: &TestData, quadrant: &str, description: &str) -> u64 {
    let value = data.json(&["add", quadrant, description]);
    value["data"]["task"]["id"].as_u64().expect("task id")
}

fn ids(value: &Value, quadrant_index: usize) -> Vec<u64> {
    value["data"]["quadrants"][quadrant_index]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .filter_map(|task| task["id"].as_u64())
        .collect()
}

#[test]
fn add_assigns_ids_per_quadrant_and_persists() {
    let data = TestData::new();
    assert_eq!(add(&data, "1", "Fix prod outage"), 1);
    assert_eq!(add(&data, "q1", "Page on-call"), 2);
    assert_eq!(add(&data, "2", "Plan roadmap"), 1);

    let store = data.read_json("tasks.json");
    assert_eq!(store["1"].as_array().map(Vec::len), Some(2));
    assert_eq!(store["2"][0]["description"], "Plan roadmap");
    assert_eq!(store["2"][0]["completed"], false);
    assert!(store["2"][0]["completed_at"].is_null());
}

#[test]
fn add_with_fields() {
    let data = TestData::new();
    let value = data.json(&[
        "add",
        "2",
        "Write report",
        "--notes",
        "quarterly",
        "--tags",
        "work, writing",
        "--due",
        "2030-05-01",
        "--meta",
        "owner=sam",
    ]);
    let task = &value["data"]["task"];
    assert_eq!(task["notes"], "quarterly");
    assert_eq!(task["tags"], serde_json::json!(["work", "writing"]));
    assert_eq!(task["due_date"], "2030-05-01");
    assert_eq!(task["metadata"]["owner"], "sam");
}

#[test]
fn bad_due_date_is_rejected_before_saving() {
    let data = TestData::new();
    data.cmd()
        .args(["add", "1", "Task", "--due", "next week"])
        .assert()
        .code(2)
        .stderr(contains("invalid due date"));
    assert!(!data.file("tasks.json").exists());
}

#[test]
fn complete_is_idempotent() {
    let data = TestData::new();
    add(&data, "1", "Fix prod outage");

    let first = data.json(&["done", "1", "1"]);
    assert_eq!(first["data"]["changed"], true);
    let stamp = data.read_json("tasks.json")["1"][0]["completed_at"].clone();
    assert!(stamp.is_string());

    data.json(&["done", "1", "1"]);
    let again = data.read_json("tasks.json")["1"][0]["completed_at"].clone();
    assert_eq!(stamp, again);

    data.json(&["undone", "1", "1"]);
    let task = &data.read_json("tasks.json")["1"][0];
    assert_eq!(task["completed"], false);
    assert!(task["completed_at"].is_null());
}

#[test]
fn missing_task_reports_no_change() {
    let data = TestData::new();
    let value = data.json(&["done", "3", "42"]);
    assert_eq!(value["data"]["changed"], false);
    assert_eq!(value["warnings"][0], "no task Q3#42");
}

#[test]
fn archive_requires_completion() {
    let data = TestData::new();
    add(&data, "4", "Old idea");
    data.cmd()
        .args(["archive", "4", "1"])
        .assert()
        .code(2)
        .stderr(contains("completed"));

    data.json(&["done", "4", "1"]);
    data.json(&["archive", "4", "1"]);

    let active = data.json(&["list", "4"]);
    assert_eq!(active["data"]["total"], 0);
    let archived = data.json(&["list", "4", "--archived"]);
    assert_eq!(ids(&archived, 0), vec![1]);
}

#[test]
fn list_puts_open_tasks_first_and_can_hide_completed() {
    let data = TestData::new();
    add(&data, "2", "a");
    add(&data, "2", "b");
    data.json(&["done", "2", "1"]);

    let all = data.json(&["list", "2"]);
    assert_eq!(ids(&all, 0), vec![2, 1]);

    let open = data.json(&["list", "2", "--hide-completed"]);
    assert_eq!(ids(&open, 0), vec![2]);
}

#[test]
fn config_controls_list_default() {
    let data = TestData::new();
    data.write_file("config.toml", "show_completed = false\n")
        .expect("write config");
    add(&data, "1", "a");
    data.json(&["done", "1", "1"]);

    assert_eq!(data.json(&["list"])["data"]["total"], 0);
    assert_eq!(data.json(&["list", "--show-completed"])["data"]["total"], 1);
}

#[test]
fn move_assigns_destination_id() {
    let data = TestData::new();
    add(&data, "1", "urgent");
    add(&data, "3", "existing");

    let value = data.json(&["mv", "1", "1", "3"]);
    assert_eq!(value["data"]["moved"], true);
    assert_eq!(value["data"]["new_id"], 2);

    let store = data.read_json("tasks.json");
    assert!(store["1"].as_array().expect("q1").is_empty());
    assert_eq!(store["3"][1]["description"], "urgent");

    let missing = data.json(&["mv", "1", "1", "2"]);
    assert_eq!(missing["data"]["moved"], false);
}

#[test]
fn reorder_within_quadrant() {
    let data = TestData::new();
    for name in ["a", "b", "c"] {
        add(&data, "2", name);
    }

    let top = data.json(&["reorder", "2", "1", "up"]);
    assert_eq!(top["data"]["reordered"], false);

    let moved = data.json(&["reorder", "2", "3", "up"]);
    assert_eq!(moved["data"]["reordered"], true);
    let store = data.read_json("tasks.json");
    let order: Vec<u64> = store["2"]
        .as_array()
        .expect("q2")
        .iter()
        .filter_map(|task| task["id"].as_u64())
        .collect();
    assert_eq!(order, vec![1, 3, 2]);

    let sideways = data.json(&["reorder", "2", "3", "sideways"]);
    assert_eq!(sideways["data"]["reordered"], false);
}

#[test]
fn edit_replaces_fields_and_clears_due() {
    let data = TestData::new();
    data.json(&["add", "1", "Draft", "--due", "2030-01-01", "--tags", "x"]);

    data.json(&["edit", "1", "1", "--description", "Final", "--tags", "", "--clear-due"]);
    let task = &data.read_json("tasks.json")["1"][0];
    assert_eq!(task["description"], "Final");
    assert_eq!(task["tags"], serde_json::json!([]));
    assert!(task["due_date"].is_null());

    data.cmd()
        .args(["edit", "1", "1", "--description", " "])
        .assert()
        .code(2);
    data.cmd().args(["edit", "1", "1"]).assert().code(2);
}

#[test]
fn search_and_due_queries() {
    let data = TestData::new();
    data.json(&["add", "1", "Pay invoice", "--tags", "Finance", "--due", "2000-01-01"]);
    data.json(&["add", "2", "Read book"]);

    let tagged = data.json(&["search", "finance"]);
    assert_eq!(tagged["data"]["total"], 1);
    assert_eq!(tagged["data"]["results"][0]["quadrant"], 1);

    let everything = data.json(&["search"]);
    assert_eq!(everything["data"]["total"], 2);

    let scoped = data.json(&["search", "", "--quadrant", "2"]);
    assert_eq!(scoped["data"]["total"], 1);

    let overdue = data.json(&["overdue"]);
    assert_eq!(overdue["data"]["total"], 1);

    let soon = data.json(&["due-soon", "--days", "7"]);
    assert_eq!(soon["data"]["total"], 0);

    data.cmd()
        .args(["due-soon", "--days=-1"])
        .assert()
        .code(2);
}

#[test]
fn remove_task() {
    let data = TestData::new();
    add(&data, "3", "Call back");
    assert_eq!(data.json(&["rm", "3", "1"])["data"]["changed"], true);
    assert_eq!(data.json(&["rm", "3", "1"])["data"]["changed"], false);
}

#[test]
fn events_are_written_as_json_lines() {
    let data = TestData::new();
    let events = data.file("events.jsonl");
    let events_arg = events.to_string_lossy().to_string();
    data.cmd()
        .args(["add", "1", "Observed", "--events", &events_arg])
        .assert()
        .success();
    data.cmd()
        .args(["mv", "1", "1", "2", "--events", &events_arg])
        .assert()
        .success();

    let raw = fs::read_to_string(&events).expect("events file");
    let lines: Vec<Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("event json"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "task_added");
    assert_eq!(lines[0]["schema_version"], "eisen.event.v1");
    assert_eq!(lines[1]["event"], "task_moved");
    assert_eq!(lines[1]["to"], 2);
}
