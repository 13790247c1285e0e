use std::fs;

use chrono::NaiveDateTime;
use schedmaster_core::cli::Invocation;
use schedmaster_core::commands::{CommandContext, dispatch};
use schedmaster_core::config::Config;
use schedmaster_core::render::Renderer;
use schedmaster_core::{CalendarDate, Planner};
use tempfile::tempdir;

fn today() -> CalendarDate {
    "2025-08-04".parse().expect("valid date")
}

fn now() -> NaiveDateTime {
    today().naive().and_hms_opt(9, 5, 0).expect("valid time")
}

fn invoke(planner: &mut Planner, cfg: &Config, command: &str, args: &[&str]) -> anyhow::Result<String> {
    let renderer = Renderer::plain();
    let mut out = Vec::new();
    let inv = Invocation {
        command: command.to_string(),
        args: args.iter().map(|arg| arg.to_string()).collect(),
    };
    let mut ctx = CommandContext {
        planner,
        cfg,
        renderer: &renderer,
        today: today(),
        now: now(),
        out: &mut out,
    };
    dispatch(&mut ctx, &inv)?;
    Ok(String::from_utf8(out).expect("utf8 output"))
}

#[test]
fn month_command_renders_sample_planner() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();

    let text = invoke(&mut planner, &cfg, "month", &["2025-08"]).expect("month");
    assert!(text.starts_with("2025년 8월\n"));
    assert!(text.contains("SUN"));
    assert!(text.contains("광복절"));
    assert!(text.contains("엄마 생신"));
    assert!(text.contains("이번 달 일정: 3개"));
    assert!(text.contains("2025-08-05"));
}

#[test]
fn month_json_lists_forty_two_cells() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();

    let text = invoke(&mut planner, &cfg, "month", &["--json", "2025-08"]).expect("month");
    let cells: serde_json::Value = serde_json::from_str(&text).expect("json");
    let cells = cells.as_array().expect("array");
    assert_eq!(cells.len(), 42);
    assert_eq!(cells[0]["date"], "2025-07-27");
    assert_eq!(cells[41]["date"], "2025-09-06");
    assert_eq!(cells[0]["selectable"], false);
    assert_eq!(cells[5]["selectable"], true);
}

#[test]
fn add_edit_remove_through_commands() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();
    let day: CalendarDate = "2025-08-12".parse().expect("date");

    let text = invoke(&mut planner, &cfg, "add", &["2025-08-12", "work", "코드", "리뷰"]).expect("add");
    assert!(text.contains("코드 리뷰"));

    let id = planner.events.events_on(day)[0].id.to_string();
    let text = invoke(&mut planner, &cfg, "edit", &["2025-08-12", &id, "personal", "산책"]).expect("edit");
    assert!(text.contains("산책"));
    assert!(!text.contains("코드 리뷰"));

    let text = invoke(&mut planner, &cfg, "remove", &["2025-08-12", &id]).expect("remove");
    assert!(text.contains("(no events)"));

    let err = invoke(&mut planner, &cfg, "remove", &["2025-08-12", &id]).expect_err("gone");
    assert!(format!("{err:#}").contains("not found"));
}

#[test]
fn remove_on_wrong_date_names_the_real_one() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();
    let meeting: CalendarDate = "2025-08-05".parse().expect("date");
    let id = planner.events.events_on(meeting)[0].id.to_string();

    let err = invoke(&mut planner, &cfg, "remove", &["2025-08-06", &id]).expect_err("wrong date");
    assert!(format!("{err:#}").contains("filed under 2025-08-05"));
    assert_eq!(planner.events.len(), 3);
}

#[test]
fn add_rejects_unknown_category() {
    let mut planner = Planner::new();
    let cfg = Config::default();
    assert!(invoke(&mut planner, &cfg, "add", &["2025-08-12", "school", "시험"]).is_err());
    assert!(planner.events.is_empty());
}

#[test]
fn week_honors_configured_start() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let mut cfg = Config::default();
    cfg.apply_overrides([("rc.schedule.start".to_string(), "08:00".to_string())]);

    let text = invoke(&mut planner, &cfg, "week", &[]).expect("week");
    assert!(text.starts_with("시작 시간: 08:00"));
    assert!(text.contains("수학 (교실 변경)"));
}

#[test]
fn week_steps_move_the_start_time() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();

    let text = invoke(&mut planner, &cfg, "week", &["+h"]).expect("week");
    assert!(text.starts_with("시작 시간: 10:00"));

    let text = invoke(&mut planner, &cfg, "week", &["-m"]).expect("week");
    assert!(text.starts_with("시작 시간: 08:55"));

    let text = invoke(&mut planner, &cfg, "week", &["+h", "+h", "+m"]).expect("week");
    assert!(text.starts_with("시작 시간: 11:05"));

    assert!(invoke(&mut planner, &cfg, "week", &["+x"]).is_err());
}

#[test]
fn slot_set_and_clear() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();

    let text = invoke(&mut planner, &cfg, "slot", &["set", "수", "15:00", "국어", "도서관"]).expect("set");
    assert!(text.contains("국어 (도서관)"));
    assert_eq!(planner.schedule.len(), 6);

    let text = invoke(&mut planner, &cfg, "slot", &["clear", "wed", "15:00"]).expect("clear");
    assert!(!text.contains("국어"));
    assert_eq!(planner.schedule.len(), 5);

    assert!(invoke(&mut planner, &cfg, "slot", &["clear", "wed", "15:00"]).is_err());
    assert!(invoke(&mut planner, &cfg, "slot", &["set", "수", "15:00"]).is_err());
    assert!(invoke(&mut planner, &cfg, "slot", &["move", "수", "15:00"]).is_err());
}

#[test]
fn memo_add_and_remove() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();

    let text = invoke(&mut planner, &cfg, "memo", &["add", "우유", "사기"]).expect("add");
    assert!(text.starts_with("전체 메모: 4개"));
    assert!(text.contains("2025. 8. 4. 오전 9:05"));

    let newest = planner.memos.iter().next().expect("memo");
    assert_eq!(newest.text, "우유 사기");
    let id = newest.id.to_string();

    let text = invoke(&mut planner, &cfg, "memo", &["remove", &id]).expect("remove");
    assert!(text.starts_with("전체 메모: 3개"));
    assert!(!text.contains("우유 사기"));

    assert!(invoke(&mut planner, &cfg, "memo", &["remove", &id]).is_err());
    assert!(invoke(&mut planner, &cfg, "memo", &["add", "  "]).is_err());
}

#[test]
fn memos_filter_by_query() {
    let mut planner = Planner::with_sample_data().expect("seed");
    let cfg = Config::default();

    let text = invoke(&mut planner, &cfg, "memos", &["숙제"]).expect("memos");
    assert!(text.starts_with("검색 결과: 1개"));

    let text = invoke(&mut planner, &cfg, "memos", &["없는말"]).expect("memos");
    assert!(text.contains("검색 결과가 없습니다."));
}

#[test]
fn rc_file_with_include_is_loaded() {
    let temp = tempdir().expect("tempdir");
    let extra = temp.path().join("extra.rc");
    fs::write(&extra, "calendar.event_limit = 2\n").expect("write include");

    let rc = temp.path().join("schedmasterrc");
    fs::write(
        &rc,
        "# planner settings\ncolor = off\ninclude extra.rc\ntimezone = UTC  # trailing comment\n",
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc)).expect("load config");
    assert_eq!(cfg.get_bool("color"), Some(false));
    assert_eq!(cfg.get("timezone").as_deref(), Some("UTC"));
    assert_eq!(cfg.get_usize("calendar.event_limit").expect("limit"), Some(2));
    assert_eq!(cfg.loaded_files.len(), 2);
}

#[test]
fn malformed_rc_line_is_an_error() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("schedmasterrc");
    fs::write(&rc, "color off\n").expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
}
