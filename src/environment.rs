//! Companion's sense of time and ambient surroundings
//!
//! The clock is real; the weather is an internal fiction refreshed hourly,
//! used only to color generated responses.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

const WEATHER_STATES: [&str; 6] = ["clear", "cloudy", "light rain", "storm", "fog", "snow"];
const WIND_STATES: [&str; 4] = ["still", "breeze", "gusty", "howling"];

const REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Local wall-clock awareness
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalClock;

impl InternalClock {
    /// Create a new clock
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Current local time as `HH:MM`
    #[must_use]
    pub fn now_hhmm(&self) -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }

    /// Coarse time-of-day label for prompt context
    #[must_use]
    pub fn time_of_day(&self) -> &'static str {
        use chrono::Timelike;
        Self::bucket(chrono::Local::now().hour())
    }

    fn bucket(hour: u32) -> &'static str {
        match hour {
            5..=10 => "morning",
            11..=13 => "midday",
            14..=17 => "afternoon",
            18..=21 => "evening",
            _ => "night",
        }
    }
}

struct EnvironmentState {
    weather: &'static str,
    wind: &'static str,
    refreshed_at: Instant,
}

/// Slowly-drifting imagined surroundings
pub struct VirtualEnvironment {
    state: Mutex<EnvironmentState>,
}

impl Default for VirtualEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualEnvironment {
    /// Create an environment with a random initial state
    #[must_use]
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            state: Mutex::new(EnvironmentState {
                weather: WEATHER_STATES.choose(&mut rng).copied().unwrap_or("clear"),
                wind: WIND_STATES.choose(&mut rng).copied().unwrap_or("still"),
                refreshed_at: Instant::now(),
            }),
        }
    }

    /// Current (weather, wind) pair, re-rolled once per hour
    #[must_use]
    pub fn current(&self) -> (&'static str, &'static str) {
        let Ok(mut state) = self.state.lock() else {
            return ("clear", "still");
        };

        if state.refreshed_at.elapsed() >= REFRESH_INTERVAL {
            let mut rng = rand::thread_rng();
            state.weather = WEATHER_STATES.choose(&mut rng).copied().unwrap_or("clear");
            state.wind = WIND_STATES.choose(&mut rng).copied().unwrap_or("still");
            state.refreshed_at = Instant::now();
            tracing::debug!(weather = state.weather, wind = state.wind, "environment drifted");
        }

        (state.weather, state.wind)
    }

    /// One-line description for prompt context
    #[must_use]
    pub fn describe(&self) -> String {
        let (weather, wind) = self.current();
        format!("The weather around you feels {weather}, the air {wind}.")
    }
}
