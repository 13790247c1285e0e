use std::fmt;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

use crate::error::{
  PlannerError,
  PlannerResult
};

const TIMEZONE_CONFIG_FILE: &str =
  "schedmaster-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "SCHEDMASTER_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "SCHEDMASTER_TIME_CONFIG";
pub const DEFAULT_TIMEZONE: &str =
  "Asia/Seoul";

/// Years a reference month may take. Keeps every grid date inside chrono's
/// representable range.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// A calendar day with no time component.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize
)]
#[serde(
  into = "String",
  try_from = "String"
)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
  pub fn new(
    year: i32,
    month: u32,
    day: u32
  ) -> PlannerResult<Self> {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self)
    .ok_or_else(|| {
      PlannerError::Validation(format!(
        "no such date: {year:04}-{month:02}-{day:02}"
      ))
    })
  }

  #[must_use]
  pub fn naive(self) -> NaiveDate {
    self.0
  }

  pub fn year(self) -> i32 {
    self.0.year()
  }

  pub fn month(self) -> u32 {
    self.0.month()
  }

  pub fn day(self) -> u32 {
    self.0.day()
  }

  /// 0 = Sunday … 6 = Saturday.
  pub fn day_of_week(self) -> u8 {
    self
      .0
      .weekday()
      .num_days_from_sunday()
      as u8
  }

  /// Saturates at the ends of chrono's range.
  #[must_use]
  pub fn add_days(
    self,
    days: i64
  ) -> Self {
    Self(
      self
        .0
        .checked_add_signed(
          Duration::days(days)
        )
        .unwrap_or(self.0)
    )
  }

  /// Canonical `YYYY-MM-DD` key.
  pub fn key(self) -> String {
    self.to_string()
  }
}

impl fmt::Display for CalendarDate {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}",
      self.0.format("%Y-%m-%d")
    )
  }
}

impl FromStr for CalendarDate {
  type Err = PlannerError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    NaiveDate::parse_from_str(
      s.trim(),
      "%Y-%m-%d"
    )
    .map(Self)
    .map_err(|err| {
      PlannerError::Validation(format!(
        "expected YYYY-MM-DD, got {s:?}: {err}"
      ))
    })
  }
}

impl From<CalendarDate> for String {
  fn from(date: CalendarDate) -> Self {
    date.key()
  }
}

impl TryFrom<String> for CalendarDate {
  type Error = PlannerError;

  fn try_from(
    value: String
  ) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// The (year, month) a calendar view displays. `month` is 1-based.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize
)]
pub struct ReferenceMonth {
  year:  i32,
  month: u32
}

impl ReferenceMonth {
  pub fn new(
    year: i32,
    month: u32
  ) -> PlannerResult<Self> {
    if !(1..=12).contains(&month) {
      return Err(
        PlannerError::Validation(
          format!(
            "month must be 1-12, got {month}"
          )
        )
      );
    }
    Self::checked(year, month)
  }

  /// Builds a month from a zero-based month index, carrying overflow into
  /// the year in both directions: (2024, 12) is January 2025 and (2025, -1)
  /// is December 2024.
  pub fn from_zero_based(
    year: i32,
    month0: i64
  ) -> PlannerResult<Self> {
    let total = (i64::from(year) * 12)
      .saturating_add(month0);
    let year = i32::try_from(
      total.div_euclid(12)
    )
    .map_err(|_| {
      PlannerError::Validation(format!(
        "year out of range for month index {month0}"
      ))
    })?;
    let month =
      total.rem_euclid(12) as u32 + 1;
    Self::checked(year, month)
  }

  fn checked(
    year: i32,
    month: u32
  ) -> PlannerResult<Self> {
    if !(MIN_YEAR..=MAX_YEAR)
      .contains(&year)
    {
      return Err(
        PlannerError::Validation(
          format!(
            "year must be {MIN_YEAR}-{MAX_YEAR}, got {year}"
          )
        )
      );
    }
    Ok(Self { year, month })
  }

  #[must_use]
  pub fn containing(
    date: CalendarDate
  ) -> Self {
    Self {
      year:  date.year(),
      month: date.month()
    }
  }

  pub fn year(self) -> i32 {
    self.year
  }

  pub fn month(self) -> u32 {
    self.month
  }

  /// Moves by `months`, clamping at the supported year range.
  #[must_use]
  pub fn shift(
    self,
    months: i64
  ) -> Self {
    Self::from_zero_based(
      self.year,
      i64::from(self.month) - 1
        + months
    )
    .unwrap_or(self)
  }

  pub fn first_day(
    self
  ) -> CalendarDate {
    CalendarDate(
      NaiveDate::from_ymd_opt(
        self.year, self.month, 1
      )
      .unwrap_or(NaiveDate::MIN)
    )
  }

  pub fn last_day(
    self
  ) -> CalendarDate {
    let next = NaiveDate::from_ymd_opt(
      if self.month == 12 {
        self.year + 1
      } else {
        self.year
      },
      self.month % 12 + 1,
      1
    )
    .unwrap_or(NaiveDate::MAX);
    CalendarDate(next).add_days(-1)
  }

  pub fn days_in_month(self) -> u32 {
    self.last_day().day()
  }

  pub fn contains(
    self,
    date: CalendarDate
  ) -> bool {
    date.year() == self.year
      && date.month() == self.month
  }

  /// Header text, e.g. `2025년 8월`.
  pub fn label(self) -> String {
    format!(
      "{}년 {}월",
      self.year, self.month
    )
  }
}

impl fmt::Display for ReferenceMonth {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year, self.month
    )
  }
}

fn year_month_re() -> &'static Regex {
  static RE: OnceLock<Regex> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^(?P<year>\d{4})[-/.](?P<month>\d{1,2})$"
    )
    .unwrap_or_else(|_| {
      unreachable!("static pattern")
    })
  })
}

fn offset_re() -> &'static Regex {
  static RE: OnceLock<Regex> =
    OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"^(?P<sign>[+-])(?P<num>\d{1,4})$"
    )
    .unwrap_or_else(|_| {
      unreachable!("static pattern")
    })
  })
}

/// Resolves a month expression relative to `today`.
///
/// Accepts `today`/`this`, `next`, `prev`/`last`, signed offsets (`+3`,
/// `-1`), `YYYY-MM` (also `/` or `.` separated) and English month names,
/// which pick that month in today's year.
#[tracing::instrument(skip(today))]
pub fn parse_month_expr(
  input: &str,
  today: CalendarDate
) -> anyhow::Result<ReferenceMonth> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();
  let current =
    ReferenceMonth::containing(today);

  match lower.as_str() {
    | "" | "today" | "this" => {
      return Ok(current);
    }
    | "next" => return Ok(current.shift(1)),
    | "prev" | "previous" | "last" => {
      return Ok(current.shift(-1));
    }
    | _ => {}
  }

  if let Some(caps) =
    offset_re().captures(token)
  {
    let num: i64 = caps["num"].parse()?;
    let delta = if &caps["sign"] == "-" {
      -num
    } else {
      num
    };
    tracing::debug!(delta, "relative month offset");
    return Ok(current.shift(delta));
  }

  if let Some(caps) =
    year_month_re().captures(token)
  {
    let year: i32 =
      caps["year"].parse()?;
    let month: u32 =
      caps["month"].parse()?;
    return ReferenceMonth::new(
      year, month
    )
    .map_err(anyhow::Error::from);
  }

  if let Some(month) =
    parse_month_name(&lower)
  {
    return ReferenceMonth::new(
      current.year(),
      month
    )
    .map_err(anyhow::Error::from);
  }

  Err(anyhow!(
    "unrecognized month expression: \
     {token}"
  ))
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}

#[derive(Debug, Deserialize)]
struct TimezoneFile {
  timezone: Option<String>
}

/// Picks the timezone "today" is computed in: `$SCHEDMASTER_TIMEZONE`, then
/// the configured value, then `schedmaster-time.toml`, then Asia/Seoul.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "DEFAULT_TIMEZONE"
  )
  .unwrap_or(chrono_tz::UTC)
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneFile
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let Some(timezone) = parsed.timezone
  else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "resolved timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Local wall-clock time in `timezone`.
pub fn now_in(
  timezone: Tz
) -> NaiveDateTime {
  Utc::now()
    .with_timezone(&timezone)
    .naive_local()
}

/// The current calendar date in `timezone`.
pub fn today_in(
  timezone: Tz
) -> CalendarDate {
  CalendarDate(
    now_in(timezone).date()
  )
}
