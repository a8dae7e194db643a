use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// Models answer "4.2" as often as 4.2; both end up as text.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    Ok(if text.trim().is_empty() { None } else { Some(text) })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Budget {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Travelers {
    Solo,
    Duo,
    Group,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportMode {
    Bus,
    Train,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Budget::Low => "Low",
            Budget::Moderate => "Moderate",
            Budget::High => "High",
        })
    }
}

impl fmt::Display for Travelers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Travelers::Solo => "Solo",
            Travelers::Duo => "Duo",
            Travelers::Group => "Group",
        })
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportMode::Bus => "Bus",
            TransportMode::Train => "Train",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripData {
    pub start_location: Location,
    pub destination: Location,
    pub start_date: String,
    pub end_date: String,
    pub travelers: Travelers,
    pub budget: Budget,
    pub transport: TransportMode,
}

// Itinerary

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub time: String,
    pub activity: String,
    pub cost: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Day {
    pub day: u32,
    pub date: String,
    pub activities: Vec<Activity>,
}

/// A day as the model returns it; any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDay {
    #[serde(default)]
    pub day: Option<Value>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date: Option<String>,
    #[serde(default)]
    pub activities: Option<Vec<RawActivity>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivity {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub activity: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub cost: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransportDetails {
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cost: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub emissions: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub departure_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub arrival_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub route: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    pub mode: TransportMode,
    #[serde(flatten)]
    pub details: TransportDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub start_location: String,
    pub destination: String,
    pub dates: String,
    pub travelers: Travelers,
    pub budget: Budget,
    pub transport: Transport,
    pub days: Vec<Day>,
}

// Hotels and trains

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hotel {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rating: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub amenities: Option<String>,
}

impl Hotel {
    pub fn fallback(destination: &str, budget: Budget) -> Self {
        let price = match budget {
            Budget::High => "₹6,500/night",
            Budget::Moderate => "₹2,800/night",
            Budget::Low => "₹1,200/night",
        };
        Hotel {
            name: format!("The Grand {destination} Hotel"),
            price: price.to_string(),
            rating: "4.5".to_string(),
            address: format!("{destination} City Center"),
            amenities: Some("WiFi, Pool, Restaurant, Gym".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Railway {
    #[serde(default, deserialize_with = "lenient_string")]
    pub train_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub train_number: String,
    #[serde(rename = "class", default, deserialize_with = "lenient_string")]
    pub travel_class: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub departure_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub arrival_time: String,
}

// Weather

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub description: String,
    pub humidity: f64,
    pub wind_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    #[serde(default)]
    pub date: String,
    pub temp: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    #[serde(default)]
    pub condition: String,
    pub humidity: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Weather {
    pub current: CurrentWeather,
    #[serde(default)]
    pub forecast: Vec<ForecastDay>,
}

// Destination enrichment

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodSuggestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price_range: String,
    #[serde(default)]
    pub must_try: bool,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContacts {
    #[serde(deserialize_with = "lenient_string")]
    pub police: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ambulance: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fire: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tourist: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub helpline: String,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub local_police: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
}

impl EmergencyContacts {
    /// India's national numbers, used whenever the local ones are unknown.
    pub fn national() -> Self {
        EmergencyContacts {
            police: "100".to_string(),
            ambulance: "108".to_string(),
            fire: "101".to_string(),
            tourist: "1363".to_string(),
            helpline: "1363".to_string(),
            local_police: None,
            hospital: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrowdPrediction {
    pub level: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tips: String,
    #[serde(default)]
    pub festivals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_time_to_visit: Option<String>,
}

impl CrowdPrediction {
    pub fn moderate() -> Self {
        CrowdPrediction {
            level: "🟡 Moderate".to_string(),
            description: "Tourist season with moderate crowds".to_string(),
            tips: "Book accommodations in advance".to_string(),
            festivals: Vec::new(),
            best_time_to_visit: Some("Early morning or late evening".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub destination: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub icon: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
}

impl Notification {
    pub fn fallback(today: chrono::NaiveDate) -> Self {
        Notification {
            id: Value::from(1),
            title: "Upcoming Festivals".to_string(),
            message: "Plan your trip around upcoming Indian festivals for unique cultural experiences"
                .to_string(),
            destination: "India".to_string(),
            date: today.format("%Y-%m-%d").to_string(),
            icon: "🎉".to_string(),
            category: "festival".to_string(),
        }
    }
}

// Image location

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationResult {
    pub location: String,
    pub city: String,
    pub country: String,
    pub confidence: String,
    pub reasoning: String,
    pub landmarks: Vec<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub category: String,
}

impl LocationResult {
    pub fn unknown() -> Self {
        LocationResult {
            location: "Unknown".to_string(),
            city: "Unknown".to_string(),
            country: "Unknown".to_string(),
            confidence: "Low".to_string(),
            reasoning: "Unable to identify location from image. Image may not contain clear landmarks or identifiable features.".to_string(),
            landmarks: Vec::new(),
            lat: None,
            lng: None,
            category: "Unknown".to_string(),
        }
    }
}

/// Place guessed from an image caption.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaceGuess {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub landmark: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub confidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

// Persistence

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub email_verified: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_location: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub travelers: String,
    pub budget: String,
    pub transport: String,
    pub itinerary: Value,
    pub weather: Option<Value>,
    pub hotels: Option<Value>,
    pub railways: Option<Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Columns for a trip about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub user_id: Uuid,
    pub start_location: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub travelers: String,
    pub budget: String,
    pub transport: String,
    pub itinerary: Value,
    pub weather: Option<Value>,
    pub hotels: Option<Value>,
    pub railways: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hotel_accepts_numeric_rating() {
        let hotel: Hotel = serde_json::from_value(json!({
            "name": "Taj View",
            "price": "₹2,500/night",
            "rating": 4.2,
            "address": "Fatehabad Road"
        }))
        .unwrap();
        assert_eq!(hotel.rating, "4.2");
        assert_eq!(hotel.amenities, None);
    }

    #[test]
    fn fallback_hotel_priced_by_budget() {
        assert_eq!(Hotel::fallback("Agra", Budget::High).price, "₹6,500/night");
        assert_eq!(Hotel::fallback("Agra", Budget::Moderate).price, "₹2,800/night");
        let low = Hotel::fallback("Agra", Budget::Low);
        assert_eq!(low.price, "₹1,200/night");
        assert_eq!(low.name, "The Grand Agra Hotel");
    }

    #[test]
    fn transport_flattens_details() {
        let transport = Transport {
            mode: TransportMode::Train,
            details: TransportDetails {
                duration: "12h 30m".to_string(),
                route: "Delhi → Agra".to_string(),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&transport).unwrap();
        assert_eq!(value["mode"], "Train");
        assert_eq!(value["duration"], "12h 30m");
        assert_eq!(value["departureTime"], "");
    }

    #[test]
    fn emergency_numbers_may_be_numbers() {
        let contacts: EmergencyContacts = serde_json::from_value(json!({
            "police": 100,
            "ambulance": "108",
            "fire": 101,
            "hospital": ""
        }))
        .unwrap();
        assert_eq!(contacts.police, "100");
        assert_eq!(contacts.tourist, "");
        assert_eq!(contacts.hospital, None);
    }

    #[test]
    fn railway_class_keeps_wire_name() {
        let railway: Railway = serde_json::from_value(json!({
            "trainName": "Shatabdi Express",
            "trainNumber": 12002,
            "class": "AC Chair Car"
        }))
        .unwrap();
        assert_eq!(railway.train_number, "12002");
        let back = serde_json::to_value(&railway).unwrap();
        assert_eq!(back["class"], "AC Chair Car");
    }
}
