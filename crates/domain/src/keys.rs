//! Canonical store key shapes (spec.md §3 "Key shapes").

use chrono::NaiveDate;
use std::fmt;

/// Partition key for the aggregation scope: an org, or an org+app pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Org(uuid::Uuid),
    App(uuid::Uuid, String),
}

impl ScopeKey {
    pub fn org(org_id: uuid::Uuid) -> Self {
        ScopeKey::Org(org_id)
    }

    pub fn app(org_id: uuid::Uuid, app_id: impl Into<String>) -> Self {
        ScopeKey::App(org_id, app_id.into())
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Org(org) => write!(f, "ORG#{org}"),
            ScopeKey::App(org, app) => write!(f, "ORG#{org}#APP#{app}"),
        }
    }
}

/// A calendar day expressed in the canonical `DAY#YYYYMMDD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        DayKey(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parses a canonical `YYYYMMDD` string (without the `DAY#` prefix).
    pub fn parse_yyyymmdd(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(DayKey)
    }

    /// Parses an ISO `YYYY-MM-DD` string, as used on the historical-aggregate route.
    pub fn parse_iso(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(DayKey)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DAY#{}", self.0.format("%Y%m%d"))
    }
}
