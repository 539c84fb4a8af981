use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub every: u32,
    pub unit: TimeUnit,
}

impl TimeInterval {
    pub fn new(every: u32, unit: TimeUnit) -> Self {
        Self {
            every: every.max(1),
            unit,
        }
    }

    /// The `n`-th step from `start`, measured from the anchor so month and year
    /// steps keep the anchor's day where the target month allows it.
    pub fn nth_after(&self, start: NaiveDate, n: u32) -> NaiveDate {
        let steps = u64::from(self.every) * u64::from(n);
        match self.unit {
            TimeUnit::Day => add_days(start, steps),
            TimeUnit::Week => add_days(start, steps.saturating_mul(7)),
            TimeUnit::Month => shift_month(start, i64::try_from(steps).unwrap_or(i64::MAX)),
            TimeUnit::Year => shift_month(
                start,
                i64::try_from(steps).unwrap_or(i64::MAX).saturating_mul(12),
            ),
        }
    }

    pub fn next_date(&self, from: NaiveDate) -> NaiveDate {
        self.nth_after(from, 1)
    }

    pub fn previous_date(&self, from: NaiveDate) -> NaiveDate {
        let steps = u64::from(self.every);
        match self.unit {
            TimeUnit::Day => from.checked_sub_days(Days::new(steps)).unwrap_or(NaiveDate::MIN),
            TimeUnit::Week => from
                .checked_sub_days(Days::new(steps * 7))
                .unwrap_or(NaiveDate::MIN),
            TimeUnit::Month => shift_month(from, -(steps as i64)),
            TimeUnit::Year => shift_month(from, -(steps as i64) * 12),
        }
    }

    /// Lower bound on the number of whole steps between `start` and `target`.
    ///
    /// `nth_after(start, steps_until(start, target))` never lands after `target`,
    /// which lets projections skip straight to a window instead of walking from
    /// the anchor one step at a time.
    pub fn steps_until(&self, start: NaiveDate, target: NaiveDate) -> u32 {
        if target <= start {
            return 0;
        }
        let every = i64::from(self.every);
        let raw = match self.unit {
            TimeUnit::Day => (target - start).num_days() / every,
            TimeUnit::Week => (target - start).num_days() / (7 * every),
            TimeUnit::Month => month_distance(start, target) / every,
            TimeUnit::Year => month_distance(start, target) / (12 * every),
        };
        // Clamped month arithmetic can overshoot by one step near month ends.
        let mut steps = raw.saturating_sub(1).max(0);
        while self.nth_after(start, (steps + 1) as u32) <= target {
            steps += 1;
        }
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    pub fn label(&self) -> String {
        match (self.every, &self.unit) {
            (1, TimeUnit::Day) => "Daily".into(),
            (1, TimeUnit::Week) => "Weekly".into(),
            (1, TimeUnit::Month) => "Monthly".into(),
            (1, TimeUnit::Year) => "Yearly".into(),
            (n, unit) => format!("Every {} {:?}s", n, unit),
        }
    }
}

/// Frequencies offered when entering a recurring transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    pub fn interval(self) -> TimeInterval {
        let unit = match self {
            Frequency::Daily => TimeUnit::Day,
            Frequency::Weekly => TimeUnit::Week,
            Frequency::Monthly => TimeUnit::Month,
            Frequency::Yearly => TimeUnit::Year,
        };
        TimeInterval::new(1, unit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Option<Frequency> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Some(Frequency::Daily),
            "weekly" | "week" | "w" => Some(Frequency::Weekly),
            "monthly" | "month" | "m" => Some(Frequency::Monthly),
            "yearly" | "year" | "annual" | "y" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn month_distance(start: NaiveDate, target: NaiveDate) -> i64 {
    let start_idx = i64::from(start.year()) * 12 + i64::from(start.month0());
    let target_idx = i64::from(target.year()) * 12 + i64::from(target.month0());
    target_idx - start_idx
}

fn shift_month(date: NaiveDate, months: i64) -> NaiveDate {
    let index = (i64::from(date.year()) * 12 + i64::from(date.month0())).saturating_add(months);
    let Ok(year) = i32::try_from(index.div_euclid(12)) else {
        return if months > 0 { NaiveDate::MAX } else { NaiveDate::MIN };
    };
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(if months > 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    })
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_steps_clamp_without_drifting() {
        let monthly = Frequency::Monthly.interval();
        let start = date(2024, 1, 31);
        assert_eq!(monthly.nth_after(start, 1), date(2024, 2, 29));
        assert_eq!(monthly.nth_after(start, 2), date(2024, 3, 31));
        assert_eq!(monthly.nth_after(start, 3), date(2024, 4, 30));
        assert_eq!(monthly.nth_after(start, 12), date(2025, 1, 31));
    }

    #[test]
    fn yearly_step_from_leap_day_clamps() {
        let yearly = Frequency::Yearly.interval();
        assert_eq!(yearly.next_date(date(2024, 2, 29)), date(2025, 2, 28));
        assert_eq!(yearly.nth_after(date(2024, 2, 29), 4), date(2028, 2, 29));
    }

    #[test]
    fn previous_date_crosses_year_boundary() {
        let monthly = Frequency::Monthly.interval();
        assert_eq!(monthly.previous_date(date(2025, 1, 15)), date(2024, 12, 15));
        let weekly = Frequency::Weekly.interval();
        assert_eq!(weekly.previous_date(date(2025, 1, 3)), date(2024, 12, 27));
    }

    #[test]
    fn steps_until_never_overshoots() {
        let monthly = Frequency::Monthly.interval();
        let start = date(2024, 1, 31);
        let target = date(2024, 6, 1);
        let steps = monthly.steps_until(start, target);
        assert_eq!(steps, 4);
        assert!(monthly.nth_after(start, steps) <= target);
        assert!(monthly.nth_after(start, steps + 1) > target);

        let daily = Frequency::Daily.interval();
        assert_eq!(daily.steps_until(date(2024, 1, 1), date(2024, 12, 31)), 365);
        assert_eq!(daily.steps_until(date(2024, 1, 1), date(2023, 12, 31)), 0);
    }

    #[test]
    fn days_in_month_handles_february() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn frequency_parse_and_labels() {
        assert_eq!(Frequency::parse("Weekly"), Some(Frequency::Weekly));
        assert_eq!(Frequency::parse("annual"), Some(Frequency::Yearly));
        assert_eq!(Frequency::parse("hourly"), None);
        assert_eq!(Frequency::Daily.interval().label(), "Daily");
        assert_eq!(TimeInterval::new(2, TimeUnit::Week).label(), "Every 2 Weeks");
    }
}
