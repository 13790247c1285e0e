pub mod category;
pub mod cli;
pub mod commands;
pub mod config;
pub mod date;
pub mod error;
pub mod events;
pub mod grid;
pub mod holidays;
pub mod memo;
pub mod planner;
pub mod policy;
pub mod render;
pub mod schedule;

use std::ffi::OsString;

use clap::Parser;
use tracing::{debug, info};

pub use category::{Category, CategoryRegistry};
pub use date::{CalendarDate, ReferenceMonth};
pub use error::{PlannerError, PlannerResult};
pub use events::{Event, EventId, EventStore};
pub use grid::{CalendarGridCell, generate, month_view};
pub use holidays::HolidayTable;
pub use planner::Planner;
pub use policy::{CellDecoration, decorate};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args);
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting schedmaster"
    );
    debug!(overrides = ?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides
            .into_iter()
            .chain(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value))),
    );

    let tz = date::resolve_timezone(cfg.get("timezone").as_deref());
    let today = cli.today.unwrap_or_else(|| date::today_in(tz));
    let now = today.naive().and_time(date::now_in(tz).time());
    debug!(today = %today, now = %now, "resolved clock");

    let renderer = render::Renderer::new(&cfg)?;
    let inv = cli::Invocation::parse(&cfg, cli.rest)?;
    let mut planner = Planner::with_sample_data()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut ctx = commands::CommandContext {
        planner: &mut planner,
        cfg: &cfg,
        renderer: &renderer,
        today,
        now,
        out: &mut out,
    };
    commands::dispatch(&mut ctx, &inv)?;

    info!("done");
    Ok(())
}
