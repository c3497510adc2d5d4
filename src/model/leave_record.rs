use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LeaveId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRecord {
    #[schema(example = 1)]
    /// leave record id
    pub id: LeaveId,
    #[schema(example = 1)]
    pub user_id: UserId,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    /// first day of leave
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    /// last day of leave, inclusive
    pub end_date: NaiveDate,
    #[schema(example = 38.0)]
    pub hours: f64,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub requested_on: DateTime<Utc>,
}

impl LeaveRecord {
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        ranges_overlap(self.start_date, self.end_date, start_date, end_date)
    }
}

/// A record about to be written. The ledger assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeave {
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: f64,
    pub requested_on: DateTime<Utc>,
}

impl NewLeave {
    pub fn into_record(self, id: LeaveId) -> LeaveRecord {
        LeaveRecord {
            id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            hours: self.hours,
            requested_on: self.requested_on,
        }
    }
}

/// Closed-interval intersection: ranges sharing a single boundary day overlap.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn shared_boundary_day_overlaps_both_ways() {
        assert!(ranges_overlap(d("2024-01-10"), d("2024-01-12"), d("2024-01-12"), d("2024-01-15")));
        assert!(ranges_overlap(d("2024-01-12"), d("2024-01-15"), d("2024-01-10"), d("2024-01-12")));
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        assert!(!ranges_overlap(d("2024-01-01"), d("2024-01-05"), d("2024-01-06"), d("2024-01-10")));
        assert!(!ranges_overlap(d("2024-01-06"), d("2024-01-10"), d("2024-01-01"), d("2024-01-05")));
    }

    #[test]
    fn containment_overlaps() {
        assert!(ranges_overlap(d("2024-03-01"), d("2024-03-31"), d("2024-03-10"), d("2024-03-10")));
    }
}
