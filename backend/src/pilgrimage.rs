//! Built-in catalogue of pilgrimage sites.

use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Religion {
    Hindu,
    Muslim,
    Sikh,
    Buddhist,
    Christian,
}

impl Religion {
    pub fn as_str(self) -> &'static str {
        match self {
            Religion::Hindu => "Hindu",
            Religion::Muslim => "Muslim",
            Religion::Sikh => "Sikh",
            Religion::Buddhist => "Buddhist",
            Religion::Christian => "Christian",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PilgrimagePlace {
    pub id: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    pub religion: Religion,
    pub description: &'static str,
    pub image: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub significance: &'static str,
    pub best_time_to_visit: &'static str,
}

const CHAR_DHAM_SEASON: &str = "May to June and September to October";

pub static PLACES: &[PilgrimagePlace] = &[
    PilgrimagePlace {
        id: "yamunotri",
        name: "Yamunotri Temple",
        location: "Uttarkashi, Uttarakhand",
        religion: Religion::Hindu,
        description: "Sacred temple dedicated to Goddess Yamuna and the source of River Yamuna",
        image: "/",
        lat: 31.0140,
        lng: 78.4600,
        significance: "First stop of the Char Dham Yatra and an important site for seeking blessings of Goddess Yamuna",
        best_time_to_visit: CHAR_DHAM_SEASON,
    },
    PilgrimagePlace {
        id: "gangotri",
        name: "Gangotri Temple",
        location: "Uttarkashi, Uttarakhand",
        religion: Religion::Hindu,
        description: "Sacred shrine dedicated to Goddess Ganga, origin point of the River Ganges",
        image: "/",
        lat: 30.9947,
        lng: 78.9398,
        significance: "Second stop of the Char Dham Yatra and sacred source of the holy River Ganga",
        best_time_to_visit: CHAR_DHAM_SEASON,
    },
    PilgrimagePlace {
        id: "kedarnath",
        name: "Kedarnath Temple",
        location: "Rudraprayag, Uttarakhand",
        religion: Religion::Hindu,
        description: "Ancient temple dedicated to Lord Shiva and one of the twelve Jyotirlingas",
        image: "/kedarnath.jpeg",
        lat: 30.7352,
        lng: 79.0669,
        significance: "One of the holiest Shiva temples and a major pilgrimage site in the Himalayas",
        best_time_to_visit: CHAR_DHAM_SEASON,
    },
    PilgrimagePlace {
        id: "badrinath",
        name: "Badrinath Temple",
        location: "Chamoli, Uttarakhand",
        religion: Religion::Hindu,
        description: "Sacred temple dedicated to Lord Vishnu in his form as Badrinarayan",
        image: "/",
        lat: 30.7433,
        lng: 79.4938,
        significance: "Final stop of the Char Dham Yatra and one of the most important Vaishnav pilgrimage sites in India",
        best_time_to_visit: CHAR_DHAM_SEASON,
    },
    PilgrimagePlace {
        id: "varanasi",
        name: "Kashi Vishwanath Temple",
        location: "Varanasi, Uttar Pradesh",
        religion: Religion::Hindu,
        description: "One of the twelve Jyotirlingas, the most sacred Shiva temple",
        image: "/",
        lat: 25.3176,
        lng: 82.9739,
        significance: "Holiest of Hindu pilgrimage sites on the banks of Ganges",
        best_time_to_visit: "October to March",
    },
    PilgrimagePlace {
        id: "tirupati",
        name: "Tirumala Venkateswara Temple",
        location: "Tirupati, Andhra Pradesh",
        religion: Religion::Hindu,
        description: "Richest and most visited temple dedicated to Lord Venkateswara",
        image: "/",
        lat: 13.6833,
        lng: 79.3472,
        significance: "Abode of Lord Venkateswara, believed to grant wishes",
        best_time_to_visit: "September to February",
    },
    PilgrimagePlace {
        id: "golden-temple",
        name: "Harmandir Sahib (Golden Temple)",
        location: "Amritsar, Punjab",
        religion: Religion::Sikh,
        description: "The most sacred Gurdwara of Sikhism",
        image: "/",
        lat: 31.6200,
        lng: 74.8765,
        significance: "Spiritual and cultural center of Sikhism",
        best_time_to_visit: "November to March",
    },
    PilgrimagePlace {
        id: "bodh-gaya",
        name: "Mahabodhi Temple",
        location: "Bodh Gaya, Bihar",
        religion: Religion::Buddhist,
        description: "Place where Buddha attained enlightenment",
        image: "/",
        lat: 24.6958,
        lng: 84.9910,
        significance: "Most sacred site in Buddhism, UNESCO World Heritage",
        best_time_to_visit: "October to March",
    },
    PilgrimagePlace {
        id: "ajmer-sharif",
        name: "Ajmer Sharif Dargah",
        location: "Ajmer, Rajasthan",
        religion: Religion::Muslim,
        description: "Sufi shrine of Moinuddin Chishti",
        image: "/",
        lat: 26.4499,
        lng: 74.6399,
        significance: "One of the holiest Islamic shrines in India",
        best_time_to_visit: "October to March",
    },
    PilgrimagePlace {
        id: "jagannath-puri",
        name: "Jagannath Temple",
        location: "Puri, Odisha",
        religion: Religion::Hindu,
        description: "Famous for the annual Rath Yatra festival",
        image: "/",
        lat: 19.8135,
        lng: 85.8312,
        significance: "Part of Char Dham, dedicated to Lord Jagannath",
        best_time_to_visit: "October to March",
    },
    PilgrimagePlace {
        id: "rameshwaram",
        name: "Ramanathaswamy Temple",
        location: "Rameswaram, Tamil Nadu",
        religion: Religion::Hindu,
        description: "One of the twelve Jyotirlinga temples",
        image: "/",
        lat: 9.2876,
        lng: 79.3129,
        significance: "Part of Char Dham, where Lord Rama worshipped Shiva",
        best_time_to_visit: "October to April",
    },
    PilgrimagePlace {
        id: "dwarka",
        name: "Dwarkadhish Temple",
        location: "Dwarka, Gujarat",
        religion: Religion::Hindu,
        description: "Ancient Krishna temple, part of Char Dham",
        image: "/",
        lat: 22.2442,
        lng: 68.9685,
        significance: "Kingdom of Lord Krishna",
        best_time_to_visit: "October to March",
    },
    PilgrimagePlace {
        id: "velankanni",
        name: "Basilica of Our Lady of Good Health",
        location: "Velankanni, Tamil Nadu",
        religion: Religion::Christian,
        description: "Major Catholic pilgrimage site",
        image: "https://images.unsplash.com/photo-1548625149-720134d51a3e?w=500",
        lat: 10.6833,
        lng: 79.8500,
        significance: "Miracles attributed to Virgin Mary",
        best_time_to_visit: "August to September",
    },
    PilgrimagePlace {
        id: "hemkund-sahib",
        name: "Hemkund Sahib",
        location: "Chamoli, Uttarakhand",
        religion: Religion::Sikh,
        description: "High altitude Sikh pilgrimage site",
        image: "/",
        lat: 30.7268,
        lng: 79.7325,
        significance: "Where Guru Gobind Singh meditated",
        best_time_to_visit: "June to October",
    },
];

pub fn by_religion(religion: &str) -> Vec<&'static PilgrimagePlace> {
    let wanted = religion.trim();
    PLACES
        .iter()
        .filter(|place| place.religion.as_str().eq_ignore_ascii_case(wanted))
        .collect()
}

/// Religions present in the catalogue, in first-seen order.
pub fn religions() -> Vec<Religion> {
    let mut seen = Vec::new();
    for place in PLACES {
        if !seen.contains(&place.religion) {
            seen.push(place.religion);
        }
    }
    seen
}

#[derive(Debug, Deserialize)]
pub struct PilgrimageQuery {
    pub religion: Option<String>,
}

pub async fn list_handler(Query(query): Query<PilgrimageQuery>) -> Json<Value> {
    let places: Vec<&PilgrimagePlace> = match query.religion.as_deref().map(str::trim) {
        Some(religion) if !religion.is_empty() => by_religion(religion),
        _ => PLACES.iter().collect(),
    };

    Json(json!({
        "success": true,
        "places": places,
        "religions": religions(),
    }))
}
