use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::UserId;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// Column holding this weekday's hours in the `profiles` table.
    pub fn column(self) -> &'static str {
        match self {
            Weekday::Mon => "mon_hours",
            Weekday::Tue => "tue_hours",
            Weekday::Wed => "wed_hours",
            Weekday::Thu => "thu_hours",
            Weekday::Fri => "fri_hours",
            Weekday::Sat => "sat_hours",
            Weekday::Sun => "sun_hours",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }
}

/// Working hours per weekday. One field per day, so all seven entries always exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "mon": 7.5, "tue": 0.0, "wed": 10.5, "thu": 11.5, "fri": 8.5, "sat": 0.0, "sun": 0.0
}))]
pub struct WeekdayHours {
    pub mon: f64,
    pub tue: f64,
    pub wed: f64,
    pub thu: f64,
    pub fri: f64,
    pub sat: f64,
    pub sun: f64,
}

impl WeekdayHours {
    pub fn get(&self, day: Weekday) -> f64 {
        match day {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    pub fn set(&mut self, day: Weekday, hours: f64) {
        let slot = match day {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        };
        *slot = hours;
    }

    /// Parses seven comma separated values, Monday first (e.g. `7.5,0,10.5,11.5,8.5,0,0`).
    pub fn parse_list(raw: &str) -> Result<Self, String> {
        let values = raw
            .split(',')
            .map(|v| {
                let v = v.trim();
                v.parse::<f64>()
                    .map_err(|_| format!("invalid hours value `{v}`"))
                    .and_then(|h| {
                        if h.is_finite() && h >= 0.0 {
                            Ok(h)
                        } else {
                            Err(format!("hours must be non-negative, got `{v}`"))
                        }
                    })
            })
            .collect::<Result<Vec<f64>, String>>()?;

        match values.as_slice() {
            [mon, tue, wed, thu, fri, sat, sun] => Ok(Self {
                mon: *mon,
                tue: *tue,
                wed: *wed,
                thu: *thu,
                fri: *fri,
                sat: *sat,
                sun: *sun,
            }),
            _ => Err(format!("expected 7 weekday values, got {}", values.len())),
        }
    }
}

impl Default for WeekdayHours {
    fn default() -> Self {
        Self {
            mon: 7.5,
            tue: 0.0,
            wed: 10.5,
            thu: 11.5,
            fri: 8.5,
            sat: 0.0,
            sun: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    #[schema(example = 1)]
    pub user_id: UserId,
    pub weekday_hours: WeekdayHours,
    #[schema(example = 307.5)]
    pub leave_balance: f64,
}

/// Schedule and balance handed to a user the first time their profile is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileDefaults {
    pub weekday_hours: WeekdayHours,
    pub leave_balance: f64,
}

pub const DEFAULT_LEAVE_BALANCE: f64 = 307.5;

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            weekday_hours: WeekdayHours::default(),
            leave_balance: DEFAULT_LEAVE_BALANCE,
        }
    }
}

impl ProfileDefaults {
    pub fn profile_for(&self, user_id: UserId) -> Profile {
        Profile {
            user_id,
            weekday_hours: self.weekday_hours,
            leave_balance: self.leave_balance,
        }
    }
}
