//! Session Clock
//!
//! Maps wall-clock time to a named US equity trading session and a static
//! quality profile (volatility class, historical win rate, confidence
//! multiplier). All windows are defined in US/Eastern time.

use analysis_core::VolatilityClass;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingSession {
    PreMarket,
    NyOpen,
    NyAmPowerHour,
    /// Designated low-quality lunch window; never traded
    Midday,
    NyPmSession,
    NyPmPowerHour,
    AfterHours,
    Closed,
}

/// What the session itself suggests before looking at confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRecommendation {
    Trade,
    ReduceSize,
    Avoid,
    Closed,
}

/// Static historical-performance profile of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub session: TradingSession,
    pub name: &'static str,
    pub volatility: VolatilityClass,
    /// Historical hit rate of signals emitted in this window (0-1)
    pub base_win_rate: f64,
    pub confidence_multiplier: f64,
    pub is_optimal: bool,
    pub recommendation: SessionRecommendation,
}

// Session boundaries, minutes after midnight US/Eastern
const PRE_MARKET_OPEN: u32 = 4 * 60;
const REGULAR_OPEN: u32 = 9 * 60 + 30;
const AM_POWER_HOUR_START: u32 = 10 * 60;
const MIDDAY_START: u32 = 11 * 60 + 30;
const PM_SESSION_START: u32 = 13 * 60 + 30;
const PM_POWER_HOUR_START: u32 = 15 * 60;
const REGULAR_CLOSE: u32 = 16 * 60;
const AFTER_HOURS_CLOSE: u32 = 20 * 60;

impl TradingSession {
    pub const INTRADAY: [TradingSession; 7] = [
        TradingSession::PreMarket,
        TradingSession::NyOpen,
        TradingSession::NyAmPowerHour,
        TradingSession::Midday,
        TradingSession::NyPmSession,
        TradingSession::NyPmPowerHour,
        TradingSession::AfterHours,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TradingSession::PreMarket => "Pre-Market",
            TradingSession::NyOpen => "NY Open",
            TradingSession::NyAmPowerHour => "NY AM Power Hour",
            TradingSession::Midday => "NY Midday Chop",
            TradingSession::NyPmSession => "NY PM Session",
            TradingSession::NyPmPowerHour => "NY PM Power Hour",
            TradingSession::AfterHours => "After Hours",
            TradingSession::Closed => "Closed",
        }
    }

    /// Static profile table
    pub fn profile(&self) -> SessionProfile {
        let (volatility, base_win_rate, confidence_multiplier, is_optimal, recommendation) = match self {
            TradingSession::PreMarket => {
                (VolatilityClass::Medium, 0.52, 0.85, false, SessionRecommendation::ReduceSize)
            }
            TradingSession::NyOpen => {
                (VolatilityClass::High, 0.55, 0.90, false, SessionRecommendation::ReduceSize)
            }
            TradingSession::NyAmPowerHour => {
                (VolatilityClass::High, 0.68, 1.20, true, SessionRecommendation::Trade)
            }
            TradingSession::Midday => {
                (VolatilityClass::Low, 0.42, 0.60, false, SessionRecommendation::Avoid)
            }
            TradingSession::NyPmSession => {
                (VolatilityClass::Medium, 0.58, 1.00, false, SessionRecommendation::Trade)
            }
            TradingSession::NyPmPowerHour => {
                (VolatilityClass::Extreme, 0.62, 1.10, true, SessionRecommendation::Trade)
            }
            TradingSession::AfterHours => {
                (VolatilityClass::Low, 0.48, 0.70, false, SessionRecommendation::ReduceSize)
            }
            TradingSession::Closed => {
                (VolatilityClass::Low, 0.45, 0.50, false, SessionRecommendation::Closed)
            }
        };

        SessionProfile {
            session: *self,
            name: self.name(),
            volatility,
            base_win_rate,
            confidence_multiplier,
            is_optimal,
            recommendation,
        }
    }

    fn from_minutes(minutes: u32) -> Self {
        match minutes {
            m if m < PRE_MARKET_OPEN => TradingSession::Closed,
            m if m < REGULAR_OPEN => TradingSession::PreMarket,
            m if m < AM_POWER_HOUR_START => TradingSession::NyOpen,
            m if m < MIDDAY_START => TradingSession::NyAmPowerHour,
            m if m < PM_SESSION_START => TradingSession::Midday,
            m if m < PM_POWER_HOUR_START => TradingSession::NyPmSession,
            m if m < REGULAR_CLOSE => TradingSession::NyPmPowerHour,
            m if m < AFTER_HOURS_CLOSE => TradingSession::AfterHours,
            _ => TradingSession::Closed,
        }
    }
}

/// Resolves wall-clock instants to trading sessions
#[derive(Debug, Clone)]
pub struct SessionClock {
    tz: Tz,
}

impl SessionClock {
    pub fn new() -> Self {
        Self { tz: chrono_tz::US::Eastern }
    }

    pub fn session_at(&self, instant: DateTime<Utc>) -> TradingSession {
        let local = instant.with_timezone(&self.tz);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return TradingSession::Closed;
        }
        TradingSession::from_minutes(local.hour() * 60 + local.minute())
    }

    pub fn current_session(&self) -> TradingSession {
        self.session_at(Utc::now())
    }

    pub fn profile_at(&self, instant: DateTime<Utc>) -> SessionProfile {
        self.session_at(instant).profile()
    }

    /// US/Eastern calendar date of `instant`.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Latest US/Eastern date whose regular-session close had happened by
    /// `instant`. Weekends are not skipped; a daily bar dated on or before it
    /// is already final.
    pub fn last_settled_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        let local = instant.with_timezone(&self.tz);
        let today = local.date_naive();
        if local.hour() * 60 + local.minute() >= REGULAR_CLOSE {
            today
        } else {
            today.pred_opt().unwrap_or(today)
        }
    }

    /// The next optimal session strictly after `session` (wraps to the next day).
    pub fn next_optimal_session(&self, session: TradingSession) -> TradingSession {
        let start = TradingSession::INTRADAY
            .iter()
            .position(|s| *s == session)
            .map(|i| i + 1)
            .unwrap_or(TradingSession::INTRADAY.len());

        TradingSession::INTRADAY[start..]
            .iter()
            .chain(TradingSession::INTRADAY.iter())
            .copied()
            .find(|s| s.profile().is_optimal)
            .unwrap_or(TradingSession::NyAmPowerHour)
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
