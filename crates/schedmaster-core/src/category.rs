use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// Fixed event classification, chosen from a closed menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Personal,
    Family,
    Work,
    Holiday,
    Anniversary,
}

impl Category {
    /// Menu order.
    pub const ALL: [Category; 5] = [
        Category::Personal,
        Category::Family,
        Category::Work,
        Category::Holiday,
        Category::Anniversary,
    ];

    pub fn as_key(self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Family => "family",
            Category::Work => "work",
            Category::Holiday => "holiday",
            Category::Anniversary => "anniversary",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Personal => "개인",
            Category::Family => "가족",
            Category::Work => "업무",
            Category::Holiday => "공휴일",
            Category::Anniversary => "기념일",
        }
    }

    /// `#RRGGBB`.
    pub fn color(self) -> &'static str {
        match self {
            Category::Personal => "#1A73E8",
            Category::Family => "#0D7377",
            Category::Work => "#F9AB00",
            Category::Holiday => "#D50000",
            Category::Anniversary => "#9C27B0",
        }
    }

    /// Color as an (r, g, b) triple for terminal output.
    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = &self.color()[1..];
        let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for Category {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_key() == key)
            .ok_or_else(|| PlannerError::InvalidCategory(key.to_string()))
    }
}

/// Key-based lookups for callers holding raw category keys.
pub struct CategoryRegistry;

impl CategoryRegistry {
    pub fn color_of(key: &str) -> PlannerResult<&'static str> {
        key.parse::<Category>().map(Category::color)
    }

    pub fn name_of(key: &str) -> PlannerResult<&'static str> {
        key.parse::<Category>().map(Category::display_name)
    }

    pub fn keys() -> impl Iterator<Item = &'static str> {
        Category::ALL.into_iter().map(Category::as_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookups() {
        assert_eq!(CategoryRegistry::color_of("work"), Ok("#F9AB00"));
        assert_eq!(CategoryRegistry::name_of("anniversary"), Ok("기념일"));
        assert_eq!(
            CategoryRegistry::color_of("birthday"),
            Err(PlannerError::InvalidCategory("birthday".to_string()))
        );
        assert!(CategoryRegistry::name_of("Work").is_err());
    }

    #[test]
    fn keys_follow_menu_order() {
        let keys: Vec<_> = CategoryRegistry::keys().collect();
        assert_eq!(keys, ["personal", "family", "work", "holiday", "anniversary"]);
    }

    #[test]
    fn rgb_matches_hex() {
        assert_eq!(Category::Holiday.rgb(), (0xD5, 0x00, 0x00));
        assert_eq!(Category::Personal.rgb(), (0x1A, 0x73, 0xE8));
    }
}
