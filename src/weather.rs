//! Hourly weather stream driven by a daily stochastic model.
//!
//! Each day draws a 24-value temperature curve, an optional rain window and
//! at most one extreme event from month-indexed tables. Hourly samples read
//! the curve and add small jitter. All randomness comes from the caller's
//! generator, so a seeded stream replays the same weather.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::round_to;

/// (low, high) °C per month.
const MONTH_TEMPERATURE: [(f64, f64); 12] = [
    (-3.0, 4.0),
    (0.0, 8.0),
    (4.0, 14.0),
    (10.0, 20.0),
    (15.0, 25.0),
    (20.0, 30.0),
    (24.0, 34.0),
    (22.0, 32.0),
    (16.0, 26.0),
    (10.0, 20.0),
    (2.0, 12.0),
    (-2.0, 6.0),
];

/// (probability of rain, (min mm, max mm)) per month.
const MONTH_RAIN: [(f64, (f64, f64)); 12] = [
    (0.10, (1.0, 8.0)),
    (0.15, (1.0, 10.0)),
    (0.25, (1.0, 15.0)),
    (0.35, (3.0, 20.0)),
    (0.45, (5.0, 25.0)),
    (0.60, (8.0, 35.0)),
    (0.65, (10.0, 40.0)),
    (0.55, (8.0, 30.0)),
    (0.40, (5.0, 20.0)),
    (0.20, (2.0, 12.0)),
    (0.10, (1.0, 6.0)),
    (0.05, (1.0, 5.0)),
];

const DAYLIGHT_START: u32 = 6;
const DAYLIGHT_END: u32 = 18;
const PEAK_SUNLIGHT: f64 = 10.0;
const CURVE_JITTER: f64 = 0.3;
const SUNLIGHT_JITTER: f64 = 1.0;
const WIND_RANGE: (f64, f64) = (0.5, 5.0);
const LATEST_RAIN_START: u32 = 20;
const MAX_RAIN_HOURS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeEvent {
    Storm,
    Snowstorm,
    StrongWind,
}

impl ExtremeEvent {
    /// Season-conditioned draw; categories are mutually exclusive because
    /// each belongs to its own months.
    fn draw<R: Rng + ?Sized>(month: u32, rng: &mut R) -> Option<Self> {
        let (event, chance) = match month {
            6..=8 => (ExtremeEvent::Storm, 0.05),
            12 | 1 | 2 => (ExtremeEvent::Snowstorm, 0.03),
            3 | 4 => (ExtremeEvent::StrongWind, 0.02),
            _ => return None,
        };
        (rng.gen::<f64>() < chance).then_some(event)
    }
}

/// Immutable snapshot of one simulated hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Start of the sampled hour.
    pub at: NaiveDateTime,
    pub temperature: f64,
    /// Millimetres fallen during this hour.
    pub rainfall: f64,
    /// Sunlight intensity, 0 at night, about 10 at noon.
    pub sunlight: f64,
    pub wind: f64,
    pub extreme_event: Option<ExtremeEvent>,
}

impl WeatherSample {
    /// Mild, dry, moderately lit hour. Handy as a baseline in tests.
    pub fn calm(at: NaiveDateTime) -> Self {
        Self {
            at,
            temperature: 18.0,
            rainfall: 0.0,
            sunlight: 6.0,
            wind: 1.0,
            extreme_event: None,
        }
    }
}

/// Day-level summary consumed by the market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub rainfall_total: f64,
    pub extreme_event: Option<ExtremeEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherGenerator {
    now: NaiveDateTime,
    temperature_curve: [f64; 24],
    rainfall_total: f64,
    rain_start: Option<u32>,
    rain_duration: u32,
    extreme_event: Option<ExtremeEvent>,
    current: Option<WeatherSample>,
}

impl WeatherGenerator {
    /// Generator positioned at `now`, with that day's state already drawn.
    pub fn new<R: Rng + ?Sized>(now: NaiveDateTime, rng: &mut R) -> Self {
        let mut generator = Self {
            now,
            temperature_curve: [0.0; 24],
            rainfall_total: 0.0,
            rain_start: None,
            rain_duration: 0,
            extreme_event: None,
            current: None,
        };
        generator.draw_day(now.date(), rng);
        generator
    }

    /// Regenerates the temperature curve, rain window and extreme event for
    /// `date` and moves the clock to its midnight.
    pub fn start_new_day<R: Rng + ?Sized>(&mut self, date: NaiveDate, rng: &mut R) {
        self.now = date.and_hms_opt(0, 0, 0).unwrap_or(self.now);
        self.draw_day(date, rng);
    }

    fn draw_day<R: Rng + ?Sized>(&mut self, date: NaiveDate, rng: &mut R) {
        let month = date.month();
        let index = (month as usize).saturating_sub(1).min(11);

        let (low, high) = MONTH_TEMPERATURE[index];
        let mid = (low + high) / 2.0;
        let midday = rng.gen_range(mid..=high);
        let midnight = rng.gen_range(low..=mid);
        for (hour, slot) in self.temperature_curve.iter_mut().enumerate() {
            let factor = daylight_factor(hour as u32);
            let value = midnight + (midday - midnight) * factor;
            *slot = round_to(value + rng.gen_range(-CURVE_JITTER..=CURVE_JITTER), 1);
        }

        let (chance, (rain_min, rain_max)) = MONTH_RAIN[index];
        self.rainfall_total = if rng.gen::<f64>() < chance {
            round_to(rng.gen_range(rain_min..=rain_max), 1)
        } else {
            0.0
        };
        if self.rainfall_total > 0.0 {
            self.rain_start = Some(rng.gen_range(0..=LATEST_RAIN_START));
            self.rain_duration = rng.gen_range(1..=MAX_RAIN_HOURS);
        } else {
            self.rain_start = None;
            self.rain_duration = 0;
        }

        self.extreme_event = ExtremeEvent::draw(month, rng);
    }

    /// Samples the current hour and advances the clock by one hour.
    pub fn update_hour<R: Rng + ?Sized>(&mut self, rng: &mut R) -> WeatherSample {
        let hour = self.now.hour();
        let temperature = self.temperature_curve[hour as usize % 24];
        let wind = round_to(rng.gen_range(WIND_RANGE.0..=WIND_RANGE.1), 1);

        let rainfall = match self.rain_start {
            Some(start) if start <= hour && hour < start + self.rain_duration => {
                round_to(self.rainfall_total / self.rain_duration as f64, 1)
            }
            _ => 0.0,
        };

        let sunlight = if (DAYLIGHT_START..=DAYLIGHT_END).contains(&hour) {
            let base = daylight_factor(hour) * PEAK_SUNLIGHT;
            let noisy = base + rng.gen_range(-SUNLIGHT_JITTER..=SUNLIGHT_JITTER);
            round_to(noisy.max(0.0), 1)
        } else {
            0.0
        };

        let sample = WeatherSample {
            at: self.now,
            temperature,
            rainfall,
            sunlight,
            wind,
            extreme_event: self.extreme_event,
        };
        self.now += Duration::hours(1);
        self.current = Some(sample);
        sample
    }

    /// True exactly when the clock sits at hour 0.
    pub fn is_new_day(&self) -> bool {
        self.now.hour() == 0
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn current(&self) -> Option<&WeatherSample> {
        self.current.as_ref()
    }

    pub fn temperature_curve(&self) -> &[f64; 24] {
        &self.temperature_curve
    }

    pub fn rain_window(&self) -> Option<(u32, u32)> {
        self.rain_start
            .map(|start| (start, start + self.rain_duration))
    }

    pub fn extreme_event(&self) -> Option<ExtremeEvent> {
        self.extreme_event
    }

    pub fn today(&self) -> DailyWeather {
        DailyWeather {
            date: self.now.date(),
            rainfall_total: self.rainfall_total,
            extreme_event: self.extreme_event,
        }
    }
}

/// Bell factor peaking at noon, zero outside daylight hours.
fn daylight_factor(hour: u32) -> f64 {
    if (DAYLIGHT_START..=DAYLIGHT_END).contains(&hour) {
        1.0 - (hour as f64 - 12.0).abs() / 6.0
    } else {
        0.0
    }
}
