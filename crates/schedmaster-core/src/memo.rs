use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::info;

use crate::error::{PlannerError, PlannerResult, validate_text};

pub const MAX_MEMO_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memo {
    pub id: u64,
    pub text: String,
    pub created: NaiveDateTime,
}

impl Memo {
    /// Creation stamp in Korean locale form, e.g. `2025. 8. 4. 오후 2:30`.
    pub fn created_label(&self) -> String {
        korean_timestamp(self.created)
    }
}

pub fn korean_timestamp(at: NaiveDateTime) -> String {
    let (pm, hour12) = at.hour12();
    format!(
        "{}. {}. {}. {} {}:{:02}",
        at.year(),
        at.month(),
        at.day(),
        if pm { "오후" } else { "오전" },
        hour12,
        at.minute()
    )
}

/// Newest-first memo list.
#[derive(Debug, Clone, Default)]
pub struct MemoList {
    memos: Vec<Memo>,
    last_id: u64,
}

impl MemoList {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(skip(self, text))]
    pub fn add(&mut self, text: &str, now: NaiveDateTime) -> PlannerResult<&Memo> {
        let text = validate_text("memo", text, MAX_MEMO_CHARS)?;
        self.last_id += 1;
        self.memos.insert(
            0,
            Memo {
                id: self.last_id,
                text,
                created: now,
            },
        );
        info!(id = self.last_id, total = self.memos.len(), "added memo");
        Ok(&self.memos[0])
    }

    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: u64) -> PlannerResult<Memo> {
        let idx = self
            .memos
            .iter()
            .position(|memo| memo.id == id)
            .ok_or_else(|| PlannerError::NotFound(format!("memo {id}")))?;
        let memo = self.memos.remove(idx);
        info!(remaining = self.memos.len(), "removed memo");
        Ok(memo)
    }

    /// Case-insensitive substring match, keeping list order. An empty query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&Memo> {
        let needle = query.to_lowercase();
        self.memos
            .iter()
            .filter(|memo| memo.text.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Memo> {
        self.memos.iter()
    }

    pub fn len(&self) -> usize {
        self.memos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 4)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn newest_first() {
        let mut memos = MemoList::new();
        memos.add("first", at(9, 0)).expect("add");
        memos.add("second", at(10, 0)).expect("add");
        let texts: Vec<_> = memos.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
    }

    #[test]
    fn search_ignores_case() {
        let mut memos = MemoList::new();
        memos.add("Buy MILK", at(9, 0)).expect("add");
        memos.add("영어 숙제", at(9, 5)).expect("add");
        assert_eq!(memos.search("milk").len(), 1);
        assert_eq!(memos.search("숙제")[0].text, "영어 숙제");
        assert_eq!(memos.search("").len(), 2);
        assert!(memos.search("bread").is_empty());
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut memos = MemoList::new();
        let id = memos.add("x", at(9, 0)).expect("add").id;
        assert!(matches!(memos.remove(id + 1), Err(PlannerError::NotFound(_))));
        memos.remove(id).expect("remove");
        assert!(memos.is_empty());
        assert!(memos.add("   ", at(9, 0)).is_err());
    }

    #[test]
    fn korean_locale_stamp() {
        assert_eq!(korean_timestamp(at(14, 30)), "2025. 8. 4. 오후 2:30");
        assert_eq!(korean_timestamp(at(11, 45)), "2025. 8. 4. 오전 11:45");
        assert_eq!(korean_timestamp(at(0, 5)), "2025. 8. 4. 오전 12:05");
        assert_eq!(korean_timestamp(at(12, 0)), "2025. 8. 4. 오후 12:00");
    }
}
