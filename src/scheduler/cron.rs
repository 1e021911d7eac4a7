//! Cron-like scheduling for recurring refreshes

use chrono::{DateTime, Duration, Utc};

/// One recurring schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Schedule name
    pub name: String,
    /// Schedule expression
    pub expression: ScheduleExpression,
    /// Whether the schedule is enabled
    pub enabled: bool,
    /// Last run time
    pub last_run: Option<DateTime<Utc>>,
    /// Next run time
    pub next_run: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Create a new enabled schedule.
    pub fn new(name: impl Into<String>, expression: ScheduleExpression) -> Self {
        let next_run = expression.next_occurrence(Utc::now());
        Self {
            name: name.into(),
            expression,
            enabled: true,
            last_run: None,
            next_run,
        }
    }

    /// Mark as run and advance to the next occurrence.
    pub fn mark_run(&mut self) {
        self.last_run = Some(Utc::now());
        self.next_run = self.expression.next_occurrence(Utc::now());
    }

    /// Check if the schedule is due.
    pub fn should_run(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.next_run {
            Some(next) => Utc::now() >= next,
            None => false,
        }
    }
}

/// Schedule expression (simplified cron-like)
#[derive(Debug, Clone)]
pub enum ScheduleExpression {
    /// Run every N seconds
    EverySeconds(u32),
    /// Run every N minutes
    EveryMinutes(u32),
    /// Run every N hours
    EveryHours(u32),
    /// Run daily at specific time (hour, minute)
    DailyAt(u32, u32),
}

impl ScheduleExpression {
    /// Calculate the next occurrence from a given time.
    pub fn next_occurrence(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ScheduleExpression::EverySeconds(s) => Some(from + Duration::seconds(*s as i64)),
            ScheduleExpression::EveryMinutes(m) => Some(from + Duration::minutes(*m as i64)),
            ScheduleExpression::EveryHours(h) => Some(from + Duration::hours(*h as i64)),
            ScheduleExpression::DailyAt(hour, minute) => {
                let today = from.date_naive();
                let time = chrono::NaiveTime::from_hms_opt(*hour, *minute, 0)?;
                let datetime = today.and_time(time);
                let datetime_utc = DateTime::<Utc>::from_naive_utc_and_offset(datetime, Utc);

                if datetime_utc > from {
                    Some(datetime_utc)
                } else {
                    Some(datetime_utc + Duration::days(1))
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
