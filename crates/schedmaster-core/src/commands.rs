use std::io::Write;

use anyhow::{Context, anyhow, bail};
use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::category::{Category, CategoryRegistry};
use crate::cli::Invocation;
use crate::config::Config;
use crate::date::{CalendarDate, parse_month_expr};
use crate::events::EventId;
use crate::holidays::HolidayTable;
use crate::planner::Planner;
use crate::render::Renderer;
use crate::schedule::{SlotKey, SlotTime, parse_weekday, today_index};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "month",
        "day",
        "add",
        "edit",
        "remove",
        "holidays",
        "categories",
        "week",
        "slot",
        "memos",
        "memo",
        "help",
        "version",
    ]
}

/// Exact name, or the single known command `token` is a prefix of.
pub fn expand_command_abbrev<'a>(token: &str, known: &[&'a str]) -> Option<&'a str> {
    if let Some(exact) = known.iter().copied().find(|name| *name == token) {
        return Some(exact);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Everything a command needs besides its arguments.
pub struct CommandContext<'a> {
    pub planner: &'a mut Planner,
    pub cfg: &'a Config,
    pub renderer: &'a Renderer,
    pub today: CalendarDate,
    /// Wall clock on `today`, stamped onto new memos.
    pub now: NaiveDateTime,
    pub out: &'a mut dyn Write,
}

#[instrument(skip(ctx, inv), fields(command = %inv.command, today = %ctx.today))]
pub fn dispatch(ctx: &mut CommandContext<'_>, inv: &Invocation) -> anyhow::Result<()> {
    debug!(args = ?inv.args, "dispatching command");
    let args = inv.args.as_slice();

    match inv.command.as_str() {
        "month" => cmd_month(ctx, args),
        "day" => cmd_day(ctx, args),
        "add" => cmd_add(ctx, args),
        "edit" => cmd_edit(ctx, args),
        "remove" => cmd_remove(ctx, args),
        "holidays" => ctx
            .renderer
            .write_holidays(ctx.out, HolidayTable::global().iter()),
        "categories" => ctx.renderer.write_categories(ctx.out),
        "week" => cmd_week(ctx, args),
        "slot" => cmd_slot(ctx, args),
        "memos" => cmd_memos(ctx, args),
        "memo" => cmd_memo(ctx, args),
        "help" => cmd_help(ctx),
        "version" => {
            writeln!(ctx.out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(ctx, args))]
fn cmd_month(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    let json = args.iter().any(|arg| arg == "--json");
    let expr = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .map(String::as_str)
        .unwrap_or("today");

    let month = parse_month_expr(expr, ctx.today)?;
    let cells = ctx.planner.month_view(month, ctx.today);
    info!(month = %month, json, "showing month");

    if json {
        serde_json::to_writer_pretty(&mut *ctx.out, &cells).context("failed to encode month as JSON")?;
        writeln!(ctx.out)?;
        return Ok(());
    }
    let agenda = ctx.planner.events.events_in(month);
    ctx.renderer.write_month(ctx.out, month, &cells, &agenda)
}

fn cmd_day(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    let date = parse_date_arg(args.first())?;
    show_day(ctx, date)
}

fn show_day(ctx: &mut CommandContext<'_>, date: CalendarDate) -> anyhow::Result<()> {
    let holiday = HolidayTable::global().lookup(date);
    let events = ctx.planner.events.events_on(date);
    ctx.renderer.write_day(ctx.out, date, holiday, events)
}

/// `add DATE CATEGORY TITLE...`
#[instrument(skip(ctx, args))]
fn cmd_add(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    let date = parse_date_arg(args.first())?;
    let category = parse_category_arg(args.get(1))?;
    let title = args.get(2..).unwrap_or_default().join(" ");

    let event = ctx
        .planner
        .events
        .add_event(date, &title, category)
        .with_context(|| format!("failed to add event on {date}"))?;
    info!(id = %event.id, "event added");
    show_day(ctx, date)
}

/// `edit DATE ID CATEGORY TITLE...`
#[instrument(skip(ctx, args))]
fn cmd_edit(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    let date = parse_date_arg(args.first())?;
    let id = parse_event_id(args.get(1))?;
    let category = parse_category_arg(args.get(2))?;
    let title = args.get(3..).unwrap_or_default().join(" ");

    let result = ctx.planner.events.update_event(date, id, &title, category);
    result.with_context(|| event_failure(ctx, "edit", date, id))?;
    show_day(ctx, date)
}

/// `remove DATE ID`
#[instrument(skip(ctx, args))]
fn cmd_remove(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    let date = parse_date_arg(args.first())?;
    let id = parse_event_id(args.get(1))?;

    let result = ctx.planner.events.remove_event(date, id);
    result.with_context(|| event_failure(ctx, "remove", date, id))?;
    show_day(ctx, date)
}

/// Failure context naming the date `id` is actually filed under, if any.
fn event_failure(ctx: &CommandContext<'_>, action: &str, date: CalendarDate, id: EventId) -> String {
    match ctx.planner.events.find(id) {
        Some((actual, _)) if actual != date => {
            format!("failed to {action} event {id} on {date}; it is filed under {actual}")
        }
        _ => format!("failed to {action} event {id} on {date}"),
    }
}

fn apply_configured_start(ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
    if let Some(raw) = ctx.cfg.get("schedule.start") {
        let start = raw
            .parse::<SlotTime>()
            .with_context(|| format!("invalid schedule.start: {raw}"))?;
        ctx.planner.schedule.set_start(start)?;
    }
    Ok(())
}

fn show_week(ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
    ctx.renderer
        .write_week(ctx.out, &ctx.planner.schedule, today_index(ctx.today))
}

/// `week [+h|-h|+m|-m]...`: nudges the start time from the configured one.
fn cmd_week(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    apply_configured_start(ctx)?;
    let schedule = &mut ctx.planner.schedule;
    for step in args {
        let start = match step.as_str() {
            "+h" => schedule.adjust_hour(1),
            "-h" => schedule.adjust_hour(-1),
            "+m" => schedule.adjust_minute(1),
            "-m" => schedule.adjust_minute(-1),
            other => bail!("unknown week step {other:?} (expected +h, -h, +m or -m)"),
        };
        debug!(step = %step, start = %start, "adjusted start time");
    }
    show_week(ctx)
}

/// `slot set DAY HH:MM SUBJECT [MEMO...]` and `slot clear DAY HH:MM`
#[instrument(skip(ctx, args))]
fn cmd_slot(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    apply_configured_start(ctx)?;
    let action = args.first().map(String::as_str);
    let key = parse_slot_key(args.get(1), args.get(2))?;

    match action {
        Some("set") => {
            let subject = args
                .get(3)
                .ok_or_else(|| anyhow!("missing subject argument"))?;
            let memo = args.get(4..).unwrap_or_default().join(" ");
            ctx.planner
                .schedule
                .save(key, subject, &memo)
                .with_context(|| format!("failed to save slot {key}"))?;
        }
        Some("clear") => {
            ctx.planner
                .schedule
                .remove(key)
                .with_context(|| format!("failed to clear slot {key}"))?;
        }
        other => bail!("expected `slot set` or `slot clear`, got {other:?}"),
    }
    info!(slot = %key, "timetable updated");
    show_week(ctx)
}

fn cmd_memos(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    let query = (!args.is_empty()).then(|| args.join(" "));
    let memos = match &query {
        Some(q) => ctx.planner.memos.search(q),
        None => ctx.planner.memos.iter().collect(),
    };
    ctx.renderer
        .write_memos(ctx.out, &memos, ctx.planner.memos.len(), query.as_deref())
}

/// `memo add TEXT...` and `memo remove ID`
#[instrument(skip(ctx, args))]
fn cmd_memo(ctx: &mut CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => {
            let text = args.get(1..).unwrap_or_default().join(" ");
            let id = ctx
                .planner
                .memos
                .add(&text, ctx.now)
                .context("failed to add memo")?
                .id;
            info!(id, "memo added");
        }
        Some("remove") => {
            let raw = args
                .get(1)
                .ok_or_else(|| anyhow!("missing memo id argument"))?;
            let id = raw
                .parse::<u64>()
                .with_context(|| format!("memo id must be a number, got {raw:?}"))?;
            ctx.planner.memos.remove(id)?;
        }
        other => bail!("expected `memo add` or `memo remove`, got {other:?}"),
    }
    cmd_memos(ctx, &[])
}

fn cmd_help(ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let categories = CategoryRegistry::keys().collect::<Vec<_>>().join("|");
    writeln!(
        ctx.out,
        "usage: schedmaster [-v|-q] [--config FILE] [--rc KEY=VALUE] [--today YYYY-MM-DD] <command>\n\
         \n\
         commands:\n\
         \x20 month [EXPR] [--json]              monthly planner (EXPR: YYYY-MM, next, prev, +N, month name)\n\
         \x20 day DATE                           holiday and events of one date\n\
         \x20 add DATE CATEGORY TITLE...         add an event\n\
         \x20 edit DATE ID CATEGORY TITLE...     replace an event's title and category\n\
         \x20 remove DATE ID                     delete an event\n\
         \x20 holidays                           public holiday table\n\
         \x20 categories                         event categories\n\
         \x20 week [+h|-h|+m|-m]...              weekly timetable, start time nudged per step\n\
         \x20 slot set DAY HH:MM SUBJECT [MEMO]  fill a timetable slot (DAY: 월..일 or mon..sun)\n\
         \x20 slot clear DAY HH:MM               empty a timetable slot\n\
         \x20 memos [QUERY]                      memo list, optionally filtered\n\
         \x20 memo add TEXT...                   add a memo on top of the list\n\
         \x20 memo remove ID                     delete a memo\n\
         \n\
         CATEGORY is one of {categories}"
    )?;
    Ok(())
}

fn parse_date_arg(arg: Option<&String>) -> anyhow::Result<CalendarDate> {
    let raw = arg.ok_or_else(|| anyhow!("missing date argument (YYYY-MM-DD)"))?;
    Ok(raw.parse()?)
}

fn parse_category_arg(arg: Option<&String>) -> anyhow::Result<Category> {
    let raw = arg.ok_or_else(|| anyhow!("missing category argument"))?;
    Ok(raw.parse()?)
}

fn parse_slot_key(day: Option<&String>, time: Option<&String>) -> anyhow::Result<SlotKey> {
    let day = day.ok_or_else(|| anyhow!("missing weekday argument"))?;
    let time = time.ok_or_else(|| anyhow!("missing time argument (HH:MM)"))?;
    Ok(SlotKey::new(parse_weekday(day)?, time.parse()?))
}

fn parse_event_id(arg: Option<&String>) -> anyhow::Result<EventId> {
    let raw = arg.ok_or_else(|| anyhow!("missing event id argument"))?;
    let id = raw
        .parse::<u64>()
        .with_context(|| format!("event id must be a number, got {raw:?}"))?;
    Ok(EventId(id))
}
