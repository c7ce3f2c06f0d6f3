//! Common types used across the platform

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, 200) as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.limit() as u32;
        Self {
            page: pagination.page.max(1),
            per_page,
            total_items,
            total_pages: total_items.div_ceil(per_page as u64) as u32,
        }
    }
}

/// Date range for queries (inclusive on both ends)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Reporting period granularity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    /// Postgres `date_trunc` field for this period
    pub fn trunc_field(&self) -> &'static str {
        match self {
            Period::Daily => "day",
            Period::Weekly => "week",
            Period::Monthly => "month",
        }
    }

    /// First day of the bucket that contains `date`. Weeks start on Monday.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => date,
            Period::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Period::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "harian" => Ok(Period::Daily),
            "weekly" | "mingguan" => Ok(Period::Weekly),
            "monthly" | "bulanan" => Ok(Period::Monthly),
            other => Err(format!("Unknown period: {}", other)),
        }
    }
}

/// Normalize a product or material name for matching: case-insensitive,
/// surrounding whitespace trimmed, inner runs of whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compare two names using [`normalize_name`]
pub fn same_name(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Udang   Crispy "), "udang crispy");
        assert!(same_name("UDANG CRISPY", "udang\tcrispy"));
        assert!(!same_name("Udang Crispy", "Udang Goreng"));
    }

    #[test]
    fn test_period_bucket_start() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(); // Friday
        assert_eq!(Period::Daily.bucket_start(date), date);
        assert_eq!(
            Period::Weekly.bucket_start(date),
            NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()
        );
        assert_eq!(
            Period::Monthly.bucket_start(date),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
        );
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Harian".parse::<Period>().unwrap(), Period::Daily);
        assert_eq!("weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert!("yearly".parse::<Period>().is_err());
    }

    #[test]
    fn test_pagination_meta() {
        let p = Pagination { page: 2, per_page: 20 };
        assert_eq!(p.offset(), 20);
        let meta = PaginationMeta::new(&p, 41);
        assert_eq!(meta.total_pages, 3);
    }
}
