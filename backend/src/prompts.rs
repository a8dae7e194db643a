//! Per-feature instructions and sampling settings sent to the LLM.

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{Budget, TripData};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: Option<&'static str>,
    pub user: String,
    pub sampling: Sampling,
}

pub const GENERATE: Sampling = Sampling { temperature: 0.5, max_tokens: 3000 };
pub const WEATHER: Sampling = Sampling { temperature: 0.7, max_tokens: 3000 };
pub const HOTELS: Sampling = Sampling { temperature: 0.8, max_tokens: 1500 };
pub const FOOD: Sampling = Sampling { temperature: 0.7, max_tokens: 1500 };
pub const EMERGENCY: Sampling = Sampling { temperature: 0.1, max_tokens: 500 };
pub const CROWD: Sampling = Sampling { temperature: 0.3, max_tokens: 700 };
pub const NOTIFICATIONS: Sampling = Sampling { temperature: 0.7, max_tokens: 1500 };
pub const VOICE: Sampling = Sampling { temperature: 0.3, max_tokens: 500 };
pub const IMAGE_LANDMARK: Sampling = Sampling { temperature: 0.2, max_tokens: 1000 };
pub const CAPTION_LANDMARK: Sampling = Sampling { temperature: 0.1, max_tokens: 400 };

const JSON_ONLY: &str = "You are a JSON-only API. You ONLY respond with valid JSON. \
No explanations, no markdown, no text outside JSON. Just pure, valid JSON with no control characters.";

const WEATHER_EXPERT: &str =
    "You are a weather forecasting expert. Generate realistic weather data. Always return valid JSON.";

const FOOD_EXPERT: &str = "You are a food and cuisine expert specializing in Indian regional cuisines. \
Provide accurate local food recommendations. Always return valid JSON.";

const EMERGENCY_EXPERT: &str = "You are an emergency services expert in India. \
Provide accurate emergency contact numbers. Always return valid JSON only.";

const CROWD_EXPERT: &str = "You are an expert on Indian tourism, festivals, and crowd patterns. \
Always return valid JSON only.";

const FESTIVAL_EXPERT: &str = "You are a travel expert specializing in Indian festivals, events, and \
seasonal destinations. Always return valid JSON only.";

const HINDI_ASSISTANT: &str = "You are a helpful Hindi travel assistant that extracts travel information. \
Always respond in Hindi and return valid JSON.";

/// Free-form prompt answered under the JSON-only system message.
pub fn generate(prompt: &str) -> Prompt {
    Prompt {
        system: Some(JSON_ONLY),
        user: prompt.to_string(),
        sampling: GENERATE,
    }
}

pub struct WeatherQuery<'a> {
    pub destination: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub days: u32,
    pub start: NaiveDate,
    pub season: &'static str,
}

pub fn weather(q: &WeatherQuery<'_>) -> Prompt {
    let coords = match (q.lat, q.lng) {
        (Some(lat), Some(lng)) => format!("{lat}, {lng}"),
        _ => "unknown".to_string(),
    };
    let month = q.start.format("%B");
    let first = q.start.format("%Y-%m-%d");
    let days = q.days;

    let user = format!(
        r#"Generate a realistic weather forecast for {dest} for a trip from {from} to {to} ({days} days).

Location coordinates: {coords}
Month: {month}
Season: {season}

Provide the current conditions and a daily forecast for EXACTLY {days} days.

Format as JSON:
{{
  "current": {{"temp": 28, "feelsLike": 30, "condition": "Partly Cloudy", "description": "Warm with scattered clouds", "humidity": 65, "windSpeed": 12, "icon": "02d"}},
  "forecast": [
    {{"date": "{first}", "temp": 28, "minTemp": 22, "maxTemp": 32, "condition": "Sunny", "humidity": 60, "description": "Clear skies"}}
  ]
}}

Use realistic temperatures for {dest} in {month}. Return ONLY JSON."#,
        dest = q.destination,
        from = q.start_date,
        to = q.end_date,
        season = q.season,
    );

    Prompt {
        system: Some(WEATHER_EXPERT),
        user,
        sampling: WEATHER,
    }
}

fn hotel_price_band(budget: Budget) -> &'static str {
    match budget {
        Budget::Low => "₹800-1500",
        Budget::Moderate => "₹2000-4000",
        Budget::High => "₹5000-8000",
    }
}

pub fn hotels(destination: &str, check_in: &str, check_out: &str, budget: Budget) -> Prompt {
    let user = format!(
        r#"Generate 3 realistic hotel recommendations for {destination}.
- Budget level: {budget} (price per night {band})
- Check-in: {check_in}
- Check-out: {check_out}

Format as JSON array:
[
  {{"name": "Hotel Name", "price": "₹2,500/night", "rating": "4.2", "address": "Location in {destination}", "amenities": "Brief amenities list"}}
]

Return ONLY the JSON array, no other text."#,
        band = hotel_price_band(budget),
    );

    Prompt {
        system: None,
        user,
        sampling: HOTELS,
    }
}

pub fn railways(from: &str, to: &str, budget: Budget) -> Prompt {
    generate(&format!(
        r#"Generate 3 train recommendations from {from} to {to}.

Budget: {budget}

Return ONLY a valid JSON array with NO extra text:
[
  {{"trainName": "Train name", "trainNumber": "12345", "class": "AC 2-Tier", "price": "₹1,200", "duration": "12h 30m", "departureTime": "08:00 AM", "arrivalTime": "08:30 PM"}}
]"#
    ))
}

pub fn transport(trip: &TripData) -> Prompt {
    let from = &trip.start_location.name;
    let to = &trip.destination.name;
    generate(&format!(
        r#"Generate realistic transport details from {from} to {to} by {mode}.

Trip details:
- Transport mode: {mode}
- Budget: {budget}
- Travelers: {travelers}

Return ONLY a valid JSON object:
{{"duration": "12h 30m", "cost": "₹1,500", "emissions": "15kg CO2", "departureTime": "08:00 AM", "arrivalTime": "08:30 PM", "route": "{from} → {to}"}}"#,
        mode = trip.transport,
        budget = trip.budget,
        travelers = trip.travelers,
    ))
}

pub fn daily_itinerary(trip: &TripData, days: u32, start: NaiveDate) -> Prompt {
    let dest = &trip.destination.name;
    generate(&format!(
        r#"Create a {days}-day travel itinerary for {dest}.

CRITICAL: Generate EXACTLY {days} days, no more, no less.

Trip details:
- Travelers: {travelers}
- Budget: {budget}
- Start date: {from}
- End date: {to}

Return ONLY a valid JSON array with EXACTLY {days} day objects:
[
  {{
    "day": 1,
    "date": "{first}",
    "activities": [
      {{"time": "09:00 AM", "activity": "Specific activity", "cost": "₹300"}},
      {{"time": "02:00 PM", "activity": "Lunch", "cost": "₹400"}},
      {{"time": "07:00 PM", "activity": "Evening", "cost": "₹600"}}
    ]
  }}
]"#,
        travelers = trip.travelers,
        budget = trip.budget,
        from = trip.start_date,
        to = trip.end_date,
        first = start.format("%Y-%m-%d"),
    ))
}

pub fn food(destination: &str, budget: Budget) -> Prompt {
    let user = format!(
        r#"Recommend 8-10 local foods travelers must try in {destination}, India on a {budget} budget.
Cover street food, local specialties, popular eateries and traditional dishes.

Return ONLY a valid JSON array:
[
  {{"name": "Dish name", "description": "20-30 words", "type": "Street Food/Restaurant/Cafe/Sweet Shop", "priceRange": "₹50-100", "mustTry": true, "vegetarian": true, "location": "Where to find it"}}
]"#
    );

    Prompt {
        system: Some(FOOD_EXPERT),
        user,
        sampling: FOOD,
    }
}

pub fn emergency(destination: &str) -> Prompt {
    let user = format!(
        r#"Provide emergency contact numbers for {destination}, India.

Return ONLY a valid JSON object:
{{"police": "", "ambulance": "", "fire": "", "tourist": "", "helpline": "", "localPolice": "", "hospital": ""}}

If you do not know a local number use the national ones: police 100, ambulance 108, fire 101, tourist helpline 1363."#
    );

    Prompt {
        system: Some(EMERGENCY_EXPERT),
        user,
        sampling: EMERGENCY,
    }
}

pub fn crowd(destination: &str, start_date: &str, end_date: &str) -> Prompt {
    let user = format!(
        r#"Analyze crowd levels for {destination}, India from {start_date} to {end_date}.
Consider festivals, school holidays, tourist season and public holidays.

Return ONLY a valid JSON object:
{{
  "level": "🔴 Very High" OR "🟠 High" OR "🟡 Moderate" OR "🟢 Low",
  "description": "Why this crowd level",
  "tips": "Practical tip for travelers",
  "festivals": ["festivals or events in this period"],
  "bestTimeToVisit": "Best time to visit popular spots"
}}"#
    );

    Prompt {
        system: Some(CROWD_EXPERT),
        user,
        sampling: CROWD,
    }
}

pub fn notifications(user_location: Option<&str>, today: NaiveDate) -> Prompt {
    let until = today
        .checked_add_months(chrono::Months::new(3))
        .unwrap_or(today);
    let user = format!(
        r#"Suggest trips around upcoming festivals and events in India between {from} and {until}.
User location: {location}

Return ONLY a valid JSON array with 3-5 notifications:
[
  {{"id": 1, "title": "Festival name", "message": "40-60 words on where to go and why", "destination": "City", "date": "YYYY-MM-DD", "icon": "🪔", "category": "festival/seasonal/cultural/adventure"}}
]"#,
        from = today.format("%Y-%m-%d"),
        until = until.format("%Y-%m-%d"),
        location = user_location.filter(|l| !l.trim().is_empty()).unwrap_or("India"),
    );

    Prompt {
        system: Some(FESTIVAL_EXPERT),
        user,
        sampling: NOTIFICATIONS,
    }
}

pub fn voice_extraction(input: &str, stage: u8, collected: &Value) -> Prompt {
    let user = format!(
        r#"Extract travel information from the user's Hindi input.

Current stage: {stage}
Stages: 0 = starting location, 1 = destination, 2 = travel dates, 3 = travelers (Solo/Duo/Group), 4 = budget (Low/Moderate/High), 5 = transport (Bus/Train)

User said: "{input}"

Already collected: {collected}

Return ONLY this JSON:
{{
  "extractedData": {{ "startLocation" | "destination" | "startDate" and "endDate" (YYYY-MM-DD) | "travelers" | "budget" | "transport" }},
  "response": "A natural Hindi sentence confirming what you understood",
  "nextStage": {next},
  "complete": {complete}
}}"#,
        next = stage + 1,
        complete = stage >= 5,
    );

    Prompt {
        system: Some(HINDI_ASSISTANT),
        user,
        sampling: VOICE,
    }
}

pub fn identify_location() -> Prompt {
    let user = r#"Identify the location or landmark in this image. Look at landmarks, architecture, landscape, signs and any text.

Reply in this EXACT JSON format:
{"location": "Landmark or Unknown", "city": "City or Unknown", "country": "Country or Unknown", "confidence": "High|Medium|Low", "reasoning": "2-3 sentences", "landmarks": ["..."], "lat": null, "lng": null, "category": "Historical Site|Natural Landmark|Modern Building|Religious Site|Cultural Site|Unknown"}

Give approximate coordinates when you know the place. If unsure, use "Unknown" and confidence "Low". Return ONLY JSON."#;

    Prompt {
        system: None,
        user: user.to_string(),
        sampling: IMAGE_LANDMARK,
    }
}

pub fn caption_landmark(caption: &str) -> Prompt {
    let user = format!(
        r#"An image captioning model described a photo as:

"{caption}"

Identify the real-world place, landmark or monument described. Respond with ONLY a raw JSON object:
{{"name": "place name", "city": "nearest major city", "country": "country", "landmark": "geocodable search string e.g. Eiffel Tower Paris France", "description": "2-3 sentences for a traveller", "confidence": "high|medium|low"}}

If no recognisable location is described, return:
{{"name": "Unknown Location", "city": "", "country": "", "landmark": "", "description": "Could not identify a specific location from this image.", "confidence": "low"}}"#
    );

    Prompt {
        system: None,
        user,
        sampling: CAPTION_LANDMARK,
    }
}

pub fn chat(message: &str, context: &str) -> Prompt {
    let user = format!(
        "You are a helpful travel assistant. {context}\n\nUser question: {message}\n\n\
Provide a helpful, concise response in PLAIN TEXT. Do NOT return JSON."
    );

    Prompt {
        system: None,
        user,
        sampling: GENERATE,
    }
}
