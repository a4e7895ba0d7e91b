// Sat Oct 17 2026 - Alex

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::dates::{parse_date, parse_time};
use super::WindowError;

pub const REGISTRATION_LEAD_DAYS: i64 = 56;
pub const DEFAULT_LEAD_TIME_SECONDS: i64 = 5;
/// Upper bound for the monitoring lead time (one day).
pub const MAX_LEAD_TIME_SECONDS: i64 = 86_400;
pub const WORLD_CUP_CLASS: &str = "World Cup 3-Cushion";

pub fn registration_opening_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentWindow {
    pub tournament_id: u32,
    pub registration_opens_at: DateTime<Utc>,
    pub monitoring_starts_at: DateTime<Utc>,
}

impl TournamentWindow {
    pub fn lead_time(&self) -> ChronoDuration {
        self.registration_opens_at - self.monitoring_starts_at
    }

    /// Negative once the opening instant has passed.
    pub fn seconds_until_open(&self, now: DateTime<Utc>) -> f64 {
        (self.registration_opens_at - now).num_milliseconds() as f64 / 1000.0
    }

    pub fn opens_at_in(&self, tz: Tz) -> DateTime<Tz> {
        self.registration_opens_at.with_timezone(&tz)
    }

    pub fn monitoring_starts_in(&self, tz: Tz) -> DateTime<Tz> {
        self.monitoring_starts_at.with_timezone(&tz)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WindowCalculator {
    timezone: Tz,
    lead_time_seconds: i64,
}

impl WindowCalculator {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            lead_time_seconds: DEFAULT_LEAD_TIME_SECONDS,
        }
    }

    pub fn with_lead_time(mut self, seconds: i64) -> Self {
        self.lead_time_seconds = seconds;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn compute(&self, tournament_id: u32, tournament_start: &str) -> Result<TournamentWindow, WindowError> {
        let start = parse_date(tournament_start)?;
        self.compute_for_date(tournament_id, start)
    }

    pub fn compute_for_date(&self, tournament_id: u32, start: NaiveDate) -> Result<TournamentWindow, WindowError> {
        let opens_on = start
            .checked_sub_signed(ChronoDuration::days(REGISTRATION_LEAD_DAYS))
            .ok_or_else(|| WindowError::InvalidDate(start.to_string()))?;
        self.window_at(tournament_id, opens_on, registration_opening_time())
    }

    /// Window from an explicit registration date and time, as carried by race configs.
    pub fn from_registration(
        &self,
        tournament_id: u32,
        registration_date: &str,
        registration_time: &str,
    ) -> Result<TournamentWindow, WindowError> {
        let date = parse_date(registration_date)?;
        let time = parse_time(registration_time)?;
        self.window_at(tournament_id, date, time)
    }

    fn window_at(&self, tournament_id: u32, date: NaiveDate, time: NaiveTime) -> Result<TournamentWindow, WindowError> {
        if self.lead_time_seconds < 0 {
            return Err(WindowError::NegativeLeadTime(self.lead_time_seconds));
        }
        if self.lead_time_seconds > MAX_LEAD_TIME_SECONDS {
            return Err(WindowError::LeadTimeTooLong(self.lead_time_seconds, MAX_LEAD_TIME_SECONDS));
        }

        let naive = date.and_time(time);
        let local = self
            .timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| WindowError::NonexistentLocalTime(naive.to_string(), self.timezone.name().to_string()))?;

        let registration_opens_at = local.with_timezone(&Utc);
        let monitoring_starts_at = ChronoDuration::try_seconds(self.lead_time_seconds)
            .and_then(|lead| registration_opens_at.checked_sub_signed(lead))
            .ok_or(WindowError::LeadTimeTooLong(self.lead_time_seconds, MAX_LEAD_TIME_SECONDS))?;

        Ok(TournamentWindow {
            tournament_id,
            registration_opens_at,
            monitoring_starts_at,
        })
    }
}

pub fn is_world_cup(tournament_class: &str) -> bool {
    tournament_class.trim().eq_ignore_ascii_case(WORLD_CUP_CLASS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use chrono_tz::Europe::Paris;

    fn calculator() -> WindowCalculator {
        WindowCalculator::new(Paris)
    }

    #[test]
    fn test_world_cup_opening_scenario() {
        let window = calculator().compute(362, "15-March-2026").unwrap();
        let opens = window.opens_at_in(Paris);

        assert_eq!(window.tournament_id, 362);
        assert_eq!((opens.year(), opens.month(), opens.day()), (2026, 1, 18));
        assert_eq!((opens.hour(), opens.minute(), opens.second()), (12, 0, 0));
        // Paris is UTC+1 in January
        assert_eq!(window.registration_opens_at.hour(), 11);
    }

    #[test]
    fn test_monitoring_starts_lead_time_before_opening() {
        let window = calculator().with_lead_time(7).compute(1, "15-March-2026").unwrap();
        assert_eq!(window.lead_time(), ChronoDuration::seconds(7));
        assert_eq!(
            window.monitoring_starts_at,
            window.registration_opens_at - ChronoDuration::seconds(7)
        );
    }

    #[test]
    fn test_opening_is_56_days_before_start_for_many_dates() {
        let calc = calculator();
        let mut date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for _ in 0..800 {
            let window = calc.compute_for_date(9, date).unwrap();
            let opens = window.opens_at_in(Paris);
            assert_eq!(opens.date_naive(), date - ChronoDuration::days(56));
            assert_eq!(opens.time(), registration_opening_time());
            assert_eq!(window.lead_time(), ChronoDuration::seconds(DEFAULT_LEAD_TIME_SECONDS));
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_compute_is_idempotent() {
        let calc = calculator();
        let a = calc.compute(5, "02-November-2026").unwrap();
        let b = calc.compute(5, "02-November-2026").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_date_is_reported() {
        let err = calculator().compute(1, "32-March-2026").unwrap_err();
        assert!(matches!(err, WindowError::InvalidDate(_)));
    }

    #[test]
    fn test_negative_lead_time_rejected() {
        let err = calculator().with_lead_time(-1).compute(1, "15-March-2026").unwrap_err();
        assert!(matches!(err, WindowError::NegativeLeadTime(-1)));
    }

    #[test]
    fn test_oversized_lead_time_rejected() {
        let err = calculator()
            .with_lead_time(9_300_000_000_000_000)
            .compute(1, "15-March-2026")
            .unwrap_err();
        assert!(matches!(err, WindowError::LeadTimeTooLong(9_300_000_000_000_000, MAX_LEAD_TIME_SECONDS)));

        let window = calculator().with_lead_time(MAX_LEAD_TIME_SECONDS).compute(1, "15-March-2026").unwrap();
        assert_eq!(window.lead_time(), ChronoDuration::days(1));
    }

    #[test]
    fn test_from_registration_uses_explicit_time() {
        let window = calculator()
            .from_registration(3, "18-January-2026", "12:00:00")
            .unwrap();
        let computed = calculator().compute(3, "15-March-2026").unwrap();
        assert_eq!(window, computed);

        let later = calculator().from_registration(3, "18-January-2026", "14:30").unwrap();
        assert_eq!(later.opens_at_in(Paris).hour(), 14);
    }

    #[test]
    fn test_seconds_until_open() {
        let window = calculator().compute(1, "15-March-2026").unwrap();
        let now = window.registration_opens_at - ChronoDuration::milliseconds(2500);
        assert_eq!(window.seconds_until_open(now), 2.5);
    }

    #[test]
    fn test_is_world_cup() {
        assert!(is_world_cup("World Cup 3-Cushion"));
        assert!(is_world_cup(" world cup 3-cushion "));
        assert!(!is_world_cup("World Championship 3-Cushion"));
    }
}
