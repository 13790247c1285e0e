use std::io::{self, IsTerminal, Write};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::category::Category;
use crate::config::Config;
use crate::date::{CalendarDate, ReferenceMonth};
use crate::events::Event;
use crate::grid::{CalendarGridCell, WEEKDAY_HEADERS};
use crate::holidays::short_label;
use crate::memo::Memo;
use crate::policy::{CellBackground, DateTone, visible_split};
use crate::schedule::{SlotKey, WEEKDAY_LABELS, WeeklySchedule};

/// Display columns per calendar cell.
const CELL_WIDTH: usize = 10;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    event_limit: usize,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color").unwrap_or(true) && io::stdout().is_terminal();
        let event_limit = cfg
            .get_usize("calendar.event_limit")?
            .unwrap_or(crate::policy::DEFAULT_VISIBLE_EVENTS);

        Ok(Self { color, event_limit })
    }

    /// Uncolored output with the default event limit.
    pub fn plain() -> Self {
        Self {
            color: false,
            event_limit: crate::policy::DEFAULT_VISIBLE_EVENTS,
        }
    }

    /// Grid of `cells` followed by the month's agenda, which lists every
    /// event in full even when its cell shows only an overflow count.
    #[tracing::instrument(skip(self, out, cells, agenda), fields(month = %month))]
    pub fn write_month(
        &self,
        out: &mut dyn Write,
        month: ReferenceMonth,
        cells: &[CalendarGridCell],
        agenda: &[(CalendarDate, &Event)],
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", month.label())?;

        let header: Vec<String> = WEEKDAY_HEADERS
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let padded = pad(label, CELL_WIDTH);
                match idx {
                    0 => self.paint(&padded, "31"),
                    6 => self.paint(&padded, "34"),
                    _ => padded,
                }
            })
            .collect();
        writeln!(out, "{}", header.join(" ").trim_end())?;

        for week in cells.chunks(7) {
            let columns: Vec<Vec<String>> = week.iter().map(|cell| self.cell_lines(cell)).collect();
            let height = columns.iter().map(Vec::len).max().unwrap_or(0);
            for line in 0..height {
                let row: Vec<String> = columns
                    .iter()
                    .map(|col| col.get(line).cloned().unwrap_or_else(|| " ".repeat(CELL_WIDTH)))
                    .collect();
                writeln!(out, "{}", row.join(" ").trim_end())?;
            }
            writeln!(out)?;
        }

        writeln!(out, "이번 달 일정: {}개", agenda.len())?;
        if agenda.is_empty() {
            return Ok(());
        }
        let rows = agenda
            .iter()
            .map(|(date, event)| {
                vec![
                    date.key(),
                    event.id.to_string(),
                    self.paint_category(event.category, event.category.display_name()),
                    event.title.clone(),
                ]
            })
            .collect();
        write_table(out, vec!["Date", "ID", "Category", "Title"], rows)
    }

    fn cell_lines(&self, cell: &CalendarGridCell) -> Vec<String> {
        let number = pad(&cell.date.day().to_string(), CELL_WIDTH);
        let mut lines = vec![self.paint(&number, &tone_code(cell.tone, cell.background))];

        if let Some(label) = cell.holiday_label {
            lines.push(self.paint(&pad(&short_label(label), CELL_WIDTH), "31"));
        }

        let (shown, hidden) = visible_split(cell.events.len(), self.event_limit);
        for event in &cell.events[..shown] {
            lines.push(self.paint_event(event, CELL_WIDTH));
        }
        if hidden > 0 {
            lines.push(pad(&format!("+{hidden}개 더"), CELL_WIDTH));
        }
        lines
    }

    #[tracing::instrument(skip(self, out, events))]
    pub fn write_day(
        &self,
        out: &mut dyn Write,
        date: CalendarDate,
        holiday: Option<&str>,
        events: &[Event],
    ) -> anyhow::Result<()> {
        write!(out, "{}년 {}월 {}일", date.year(), date.month(), date.day())?;
        if let Some(label) = holiday {
            write!(out, "  {}", self.paint(label, "31"))?;
        }
        writeln!(out)?;

        if events.is_empty() {
            writeln!(out, "  (no events)")?;
            return Ok(());
        }

        let rows = events
            .iter()
            .map(|event| {
                vec![
                    event.id.to_string(),
                    self.paint_category(event.category, event.category.display_name()),
                    event.title.clone(),
                ]
            })
            .collect();
        write_table(out, vec!["ID", "Category", "Title"], rows)
    }

    pub fn write_holidays<'a>(
        &self,
        out: &mut dyn Write,
        holidays: impl Iterator<Item = (CalendarDate, &'a str)>,
    ) -> anyhow::Result<()> {
        let rows = holidays
            .map(|(date, label)| {
                vec![
                    date.key(),
                    WEEKDAY_HEADERS[usize::from(date.day_of_week())].to_string(),
                    self.paint(label, "31"),
                ]
            })
            .collect();
        write_table(out, vec!["Date", "Day", "Holiday"], rows)
    }

    pub fn write_categories(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let rows = Category::ALL
            .into_iter()
            .map(|category| {
                vec![
                    category.as_key().to_string(),
                    self.paint_category(category, category.display_name()),
                    category.color().to_string(),
                ]
            })
            .collect();
        write_table(out, vec!["Key", "Name", "Color"], rows)
    }

    #[tracing::instrument(skip(self, out, schedule))]
    pub fn write_week(
        &self,
        out: &mut dyn Write,
        schedule: &WeeklySchedule,
        today_index: usize,
    ) -> anyhow::Result<()> {
        writeln!(out, "시작 시간: {}", schedule.start())?;

        let mut headers = vec!["시간".to_string()];
        headers.extend(WEEKDAY_LABELS.iter().enumerate().map(|(idx, label)| {
            if idx == today_index {
                self.paint(label, "1;34")
            } else {
                (*label).to_string()
            }
        }));

        let rows = schedule
            .time_slots()
            .into_iter()
            .map(|time| {
                let mut row = vec![time.to_string()];
                row.extend((0..WEEKDAY_LABELS.len()).map(|weekday| {
                    match schedule.entry(SlotKey { weekday, time }) {
                        Some(entry) if entry.memo.is_empty() => entry.subject.clone(),
                        Some(entry) => format!("{} ({})", entry.subject, entry.memo),
                        None => "+".to_string(),
                    }
                }));
                row
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn write_memos(
        &self,
        out: &mut dyn Write,
        memos: &[&Memo],
        total: usize,
        query: Option<&str>,
    ) -> anyhow::Result<()> {
        match query {
            Some(_) => writeln!(out, "검색 결과: {}개", memos.len())?,
            None => writeln!(out, "전체 메모: {total}개")?,
        }

        if memos.is_empty() {
            let message = if query.is_some() {
                "검색 결과가 없습니다."
            } else {
                "메모가 없습니다."
            };
            writeln!(out, "{message}")?;
            return Ok(());
        }

        for (idx, memo) in memos.iter().enumerate() {
            writeln!(
                out,
                "{} {}  [{}]",
                self.paint(&format!("#{}", idx + 1), "33"),
                self.paint(&memo.created_label(), "90"),
                memo.id
            )?;
            writeln!(out, "    {}", memo.text)?;
        }
        Ok(())
    }

    fn paint_event(&self, event: &Event, width: usize) -> String {
        self.paint_category(event.category, &pad(&event.title, width))
    }

    fn paint_category(&self, category: Category, text: &str) -> String {
        let (r, g, b) = category.rgb();
        self.paint(text, &format!("38;2;{r};{g};{b}"))
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || code.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn tone_code(tone: DateTone, background: CellBackground) -> String {
    let fg = match tone {
        DateTone::Holiday => "1;31",
        DateTone::Sunday => "31",
        DateTone::Saturday => "34",
        DateTone::Today => "1;97",
        DateTone::OtherMonth => "90",
        DateTone::Normal => "",
    };
    let bg = match background {
        CellBackground::Today => "44",
        CellBackground::OtherMonth => "2",
        CellBackground::Normal => "",
    };
    [fg, bg]
        .into_iter()
        .filter(|code| !code.is_empty())
        .collect::<Vec<_>>()
        .join(";")
}

/// Truncates `text` to `width` display columns, then pads with spaces.
fn pad(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

fn write_table<H: AsRef<str>>(
    writer: &mut dyn Write,
    headers: Vec<H>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(visible_width(header.as_ref()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    let header_cells: Vec<&str> = headers.iter().map(|h| h.as_ref()).collect();
    write_row(writer, &widths, &header_cells)?;

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule_cells: Vec<&str> = rule.iter().map(String::as_str).collect();
    write_row(writer, &widths, &rule_cells)?;

    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).take(column_count).collect();
        write_row(writer, &widths, &cells)?;
    }

    Ok(())
}

fn write_row(writer: &mut dyn Write, widths: &[usize], cells: &[&str]) -> anyhow::Result<()> {
    let mut line = String::new();
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(visible_width(cell)) + 1));
    }
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_counts_wide_characters() {
        assert_eq!(pad("광복절", 10), "광복절    ");
        assert_eq!(pad("프로젝트 미팅", 10), "프로젝트  ");
        assert_eq!(UnicodeWidthStr::width(pad("프로젝트 미팅", 10).as_str()), 10);
        assert_eq!(pad("abc", 2), "ab");
    }

    #[test]
    fn tone_codes_combine() {
        assert_eq!(tone_code(DateTone::Today, CellBackground::Today), "1;97;44");
        assert_eq!(tone_code(DateTone::Normal, CellBackground::Normal), "");
    }

    #[test]
    fn table_aligns_on_display_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["Key", "Name"],
            vec![
                vec!["work".to_string(), "업무".to_string()],
                vec!["anniversary".to_string(), "기념일".to_string()],
            ],
        )
        .expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Key         Name");
        assert_eq!(lines[2], "work        업무");
    }

    #[test]
    fn renderer_reads_color_and_limit_from_config() {
        let mut cfg = Config::default();
        cfg.apply_overrides([
            ("rc.color".to_string(), "off".to_string()),
            ("calendar.event_limit".to_string(), "5".to_string()),
        ]);
        let renderer = Renderer::new(&cfg).expect("renderer");
        assert!(!renderer.color);
        assert_eq!(renderer.event_limit, 5);
    }

    #[test]
    fn strip_ansi_removes_sequences() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }
}
