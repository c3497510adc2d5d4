use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, AppResult};
use crate::model::profile::WeekdayHours;

/// Sums each day's weekday hours over `[start_date, end_date]`, both ends included.
pub fn compute_hours(schedule: &WeekdayHours, start_date: NaiveDate, end_date: NaiveDate) -> f64 {
    start_date
        .iter_days()
        .take_while(|day| *day <= end_date)
        .map(|day| schedule.get(day.weekday().into()))
        .sum()
}

pub fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> AppResult<()> {
    if start_date > end_date {
        return Err(AppError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }
    Ok(())
}

/// Hours a request will consume: the caller's override, or the schedule total.
pub fn resolve_hours(
    schedule: &WeekdayHours,
    start_date: NaiveDate,
    end_date: NaiveDate,
    hours_override: Option<f64>,
) -> AppResult<f64> {
    match hours_override {
        Some(hours) if !hours.is_finite() || hours <= 0.0 => Err(AppError::Validation(
            "hours must be a positive number".into(),
        )),
        Some(hours) => Ok(hours),
        None => {
            let hours = compute_hours(schedule, start_date, end_date);
            if hours <= 0.0 {
                return Err(AppError::Validation(
                    "no working hours fall within the requested dates".into(),
                ));
            }
            Ok(hours)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn schedule() -> WeekdayHours {
        WeekdayHours {
            mon: 7.5,
            tue: 0.0,
            wed: 10.5,
            thu: 11.5,
            fri: 8.5,
            sat: 0.0,
            sun: 0.0,
        }
    }

    #[test]
    fn one_working_week_sums_every_weekday() {
        // 2024-01-08 is a Monday
        assert_eq!(compute_hours(&schedule(), d("2024-01-08"), d("2024-01-12")), 38.0);
    }

    #[test]
    fn single_day_uses_that_weekday() {
        assert_eq!(compute_hours(&schedule(), d("2024-01-10"), d("2024-01-10")), 10.5);
        assert_eq!(compute_hours(&schedule(), d("2024-01-13"), d("2024-01-13")), 0.0);
    }

    #[test]
    fn multi_week_range_counts_each_occurrence() {
        // Monday 2024-01-08 through Sunday 2024-01-21: two full weeks
        assert_eq!(compute_hours(&schedule(), d("2024-01-08"), d("2024-01-21")), 76.0);
        // Wednesday to the following Wednesday: two Wednesdays
        assert_eq!(
            compute_hours(&schedule(), d("2024-01-10"), d("2024-01-17")),
            10.5 + 11.5 + 8.5 + 7.5 + 10.5
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(matches!(
            validate_range(d("2024-01-12"), d("2024-01-10")),
            Err(AppError::Validation(_))
        ));
        assert!(validate_range(d("2024-01-10"), d("2024-01-10")).is_ok());
    }

    #[test]
    fn override_wins_over_schedule() {
        let hours = resolve_hours(&schedule(), d("2024-01-08"), d("2024-01-12"), Some(4.0)).unwrap();
        assert_eq!(hours, 4.0);
    }

    #[test]
    fn non_positive_override_and_empty_weekend_are_rejected() {
        assert!(resolve_hours(&schedule(), d("2024-01-08"), d("2024-01-08"), Some(0.0)).is_err());
        assert!(resolve_hours(&schedule(), d("2024-01-08"), d("2024-01-08"), Some(-2.0)).is_err());
        assert!(resolve_hours(&schedule(), d("2024-01-08"), d("2024-01-08"), Some(f64::NAN)).is_err());
        // Saturday and Sunday carry no hours
        assert!(resolve_hours(&schedule(), d("2024-01-13"), d("2024-01-14"), None).is_err());
    }
}
