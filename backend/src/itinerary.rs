//! Trip length, seasons, and repair of model-generated day plans and
//! forecasts so they always cover exactly the trip.

use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;
use serde_json::Value;

use crate::models::{Activity, CurrentWeather, Day, ForecastDay, RawActivity, RawDay, Weather};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_trip_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// Whole days between the two dates, both ends included, never below one.
pub fn trip_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days() + 1;
    days.clamp(1, i64::from(u32::MAX)) as u32
}

pub fn season(date: NaiveDate) -> &'static str {
    match date.month() {
        3..=5 => "Spring",
        6..=8 => "Summer",
        9..=11 => "Autumn",
        _ => "Winter",
    }
}

fn nth_date(start: NaiveDate, index: usize) -> String {
    (start + Duration::days(index as i64)).format(DATE_FORMAT).to_string()
}

fn activity(time: &str, what: impl Into<String>, cost: &str) -> Activity {
    Activity {
        time: time.to_string(),
        activity: what.into(),
        cost: cost.to_string(),
    }
}

fn default_activities(destination: &str) -> Vec<Activity> {
    vec![
        activity("09:00 AM", format!("Morning in {destination}"), "₹300"),
        activity("11:00 AM", "Sightseeing", "₹500"),
        activity("02:00 PM", "Lunch", "₹400"),
        activity("04:00 PM", "Explore", "₹200"),
        activity("07:00 PM", "Dinner", "₹600"),
    ]
}

fn filler_activities() -> Vec<Activity> {
    vec![
        activity("09:00 AM", "Morning", "₹300"),
        activity("11:00 AM", "Sightseeing", "₹500"),
        activity("02:00 PM", "Lunch", "₹400"),
        activity("04:00 PM", "Activities", "₹200"),
        activity("07:00 PM", "Dinner", "₹600"),
    ]
}

fn day_number(raw: Option<&Value>, index: usize) -> u32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(index as u32 + 1)
}

fn fill_activity(raw: RawActivity) -> Activity {
    Activity {
        time: raw.time.unwrap_or_else(|| "09:00 AM".to_string()),
        activity: raw.activity.unwrap_or_else(|| "Activity".to_string()),
        cost: raw.cost.unwrap_or_else(|| "₹0".to_string()),
    }
}

/// Trims or pads the model's plan to exactly `days` entries and fills every
/// missing field.
pub fn normalize_daily_plan(raw: Vec<RawDay>, days: u32, start: NaiveDate, destination: &str) -> Vec<Day> {
    let wanted = days as usize;
    if raw.len() > wanted {
        tracing::warn!(got = raw.len(), wanted, "⚠️ model returned extra days, trimming");
    }

    let mut plan: Vec<Day> = raw
        .into_iter()
        .take(wanted)
        .enumerate()
        .map(|(index, day)| {
            let number = day_number(day.day.as_ref(), index);
            let activities = match day.activities {
                Some(list) if !list.is_empty() => list.into_iter().map(fill_activity).collect(),
                _ => {
                    tracing::warn!(day = number, "⚠️ day has no activities, adding defaults");
                    default_activities(destination)
                }
            };

            Day {
                day: number,
                date: day.date.unwrap_or_else(|| nth_date(start, index)),
                activities,
            }
        })
        .collect();

    while plan.len() < wanted {
        let index = plan.len();
        tracing::warn!(day = index + 1, "⚠️ adding missing day");
        plan.push(Day {
            day: index as u32 + 1,
            date: nth_date(start, index),
            activities: filler_activities(),
        });
    }

    plan
}

const BASE_TEMP: f64 = 25.0;
const CONDITIONS: [&str; 3] = ["Sunny", "Partly Cloudy", "Cloudy"];

fn fallback_forecast_day<R: Rng>(start: NaiveDate, index: usize, rng: &mut R) -> ForecastDay {
    ForecastDay {
        date: nth_date(start, index),
        temp: BASE_TEMP + f64::from(rng.gen_range(-3..=2_i32)),
        min_temp: BASE_TEMP - 5.0,
        max_temp: BASE_TEMP + 5.0,
        condition: CONDITIONS[rng.gen_range(0..CONDITIONS.len())].to_string(),
        humidity: f64::from(rng.gen_range(60..80_u32)),
        description: "Pleasant day".to_string(),
    }
}

/// Pleasant generic weather used whenever the forecast cannot be generated.
pub fn fallback_weather<R: Rng>(destination: &str, start: NaiveDate, days: u32, rng: &mut R) -> Weather {
    Weather {
        current: CurrentWeather {
            temp: BASE_TEMP,
            feels_like: BASE_TEMP + 2.0,
            condition: "Partly Cloudy".to_string(),
            description: format!("Pleasant weather in {destination}"),
            humidity: 65.0,
            wind_speed: 12.0,
            icon: Some("02d".to_string()),
        },
        forecast: (0..days as usize)
            .map(|index| fallback_forecast_day(start, index, rng))
            .collect(),
    }
}

/// Forces the forecast to exactly `days` entries. A short forecast repeats
/// its last day with a little temperature jitter.
pub fn ensure_forecast_len<R: Rng>(weather: &mut Weather, days: u32, start: NaiveDate, rng: &mut R) {
    let wanted = days as usize;
    let forecast = &mut weather.forecast;

    if forecast.len() > wanted {
        forecast.truncate(wanted);
        return;
    }

    let Some(last) = forecast.last().cloned() else {
        tracing::warn!(days, "⚠️ forecast is empty, using generic days");
        *forecast = (0..wanted).map(|index| fallback_forecast_day(start, index, rng)).collect();
        return;
    };

    if forecast.len() < wanted {
        tracing::warn!(have = forecast.len(), wanted, "⚠️ forecast too short, padding");
    }

    while forecast.len() < wanted {
        let index = forecast.len();
        forecast.push(ForecastDay {
            date: nth_date(start, index),
            temp: last.temp + f64::from(rng.gen_range(-3..=2_i32)),
            description: "Continued conditions".to_string(),
            ..last.clone()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw_days(value: Value) -> Vec<RawDay> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn trip_days_is_inclusive() {
        assert_eq!(trip_days(date(2025, 3, 1), date(2025, 3, 3)), 3);
        assert_eq!(trip_days(date(2025, 3, 1), date(2025, 3, 1)), 1);
    }

    #[test]
    fn trip_days_never_below_one() {
        assert_eq!(trip_days(date(2025, 3, 5), date(2025, 3, 1)), 1);
    }

    #[test]
    fn parses_date_with_time_suffix() {
        assert_eq!(parse_trip_date("2025-12-24T00:00:00.000Z"), Some(date(2025, 12, 24)));
        assert_eq!(parse_trip_date(" 2025-01-02 "), Some(date(2025, 1, 2)));
        assert_eq!(parse_trip_date("next friday"), None);
    }

    #[test]
    fn seasons_follow_months() {
        assert_eq!(season(date(2025, 3, 1)), "Spring");
        assert_eq!(season(date(2025, 7, 15)), "Summer");
        assert_eq!(season(date(2025, 11, 30)), "Autumn");
        assert_eq!(season(date(2025, 12, 1)), "Winter");
        assert_eq!(season(date(2025, 2, 28)), "Winter");
    }

    #[test]
    fn plan_trimmed_to_requested_days() {
        let raw = raw_days(json!([
            {"day": 1, "date": "d1", "activities": [{"time": "10:00 AM", "activity": "Fort", "cost": "₹50"}]},
            {"day": 2, "date": "d2", "activities": [{"time": "10:00 AM", "activity": "Palace", "cost": "₹50"}]},
            {"day": 3, "date": "d3", "activities": [{"time": "10:00 AM", "activity": "Lake", "cost": "₹50"}]}
        ]));
        let plan = normalize_daily_plan(raw, 2, date(2025, 3, 1), "Jaipur");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].activities[0].activity, "Palace");
    }

    #[test]
    fn plan_padded_with_generic_days() {
        let raw = raw_days(json!([{"day": 1, "activities": [{"activity": "Fort"}]}]));
        let plan = normalize_daily_plan(raw, 3, date(2025, 3, 1), "Jaipur");

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].date, "2025-03-01");
        assert_eq!(plan[0].activities[0], activity("09:00 AM", "Fort", "₹0"));
        assert_eq!(plan[2].day, 3);
        assert_eq!(plan[2].date, "2025-03-03");
        assert_eq!(plan[2].activities[0].activity, "Morning");
        assert_eq!(plan[2].activities[3].activity, "Activities");
    }

    #[test]
    fn empty_activities_get_destination_defaults() {
        let raw = raw_days(json!([{"day": "2", "date": "Mar 2", "activities": []}, {"day": 0}]));
        let plan = normalize_daily_plan(raw, 2, date(2025, 3, 1), "Goa");

        assert_eq!(plan[0].day, 2);
        assert_eq!(plan[0].date, "Mar 2");
        assert_eq!(plan[0].activities.len(), 5);
        assert_eq!(plan[0].activities[0].activity, "Morning in Goa");
        assert_eq!(plan[1].day, 2);
        assert_eq!(plan[1].date, "2025-03-02");
        assert_eq!(plan[1].activities[3].activity, "Explore");
    }

    #[test]
    fn fallback_weather_covers_every_day() {
        let mut rng = StdRng::seed_from_u64(7);
        let weather = fallback_weather("Agra", date(2025, 1, 30), 4, &mut rng);

        assert_eq!(weather.current.description, "Pleasant weather in Agra");
        assert_eq!(weather.forecast.len(), 4);
        assert_eq!(weather.forecast[3].date, "2025-02-02");
        for day in &weather.forecast {
            assert!((22.0..=27.0).contains(&day.temp));
            assert!((60.0..80.0).contains(&day.humidity));
            assert!(CONDITIONS.contains(&day.condition.as_str()));
        }
    }

    #[test]
    fn short_forecast_repeats_last_day() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut weather = fallback_weather("Agra", date(2025, 1, 1), 2, &mut rng);
        weather.forecast[1].condition = "Rain".to_string();
        weather.forecast[1].temp = 18.0;

        ensure_forecast_len(&mut weather, 5, date(2025, 1, 1), &mut rng);

        assert_eq!(weather.forecast.len(), 5);
        let padded = &weather.forecast[4];
        assert_eq!(padded.condition, "Rain");
        assert_eq!(padded.description, "Continued conditions");
        assert_eq!(padded.date, "2025-01-05");
        assert!((15.0..=20.0).contains(&padded.temp));
    }

    #[test]
    fn long_forecast_truncated() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut weather = fallback_weather("Agra", date(2025, 1, 1), 9, &mut rng);
        ensure_forecast_len(&mut weather, 3, date(2025, 1, 1), &mut rng);
        assert_eq!(weather.forecast.len(), 3);
    }

    #[test]
    fn empty_forecast_replaced() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut weather = fallback_weather("Agra", date(2025, 1, 1), 0, &mut rng);
        assert!(weather.forecast.is_empty());

        ensure_forecast_len(&mut weather, 2, date(2025, 1, 1), &mut rng);
        assert_eq!(weather.forecast.len(), 2);
        assert_eq!(weather.forecast[0].description, "Pleasant day");
    }
}
