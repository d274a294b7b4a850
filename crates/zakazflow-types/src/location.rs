//! Delivery location types.
//!
//! A location is either a native platform pin (latitude/longitude) or a
//! map-service link detected in message text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Map service behind a shared location link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapProvider {
    Google,
    Yandex,
    TwoGis,
}

impl fmt::Display for MapProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapProvider::Google => write!(f, "google"),
            MapProvider::Yandex => write!(f, "yandex"),
            MapProvider::TwoGis => write!(f, "2gis"),
        }
    }
}

/// A delivery location attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// Native platform location pin.
    Native { lat: f64, lon: f64 },
    /// Link to a map service found in the text.
    MapLink { provider: MapProvider, url: String },
    /// Free-text address carried over from a rendered notice during
    /// amendment, when the reply did not change the location.
    Text { raw: String },
}

impl Location {
    /// Human-readable form used in order notices.
    pub fn display_text(&self) -> String {
        match self {
            Location::Native { lat, lon } => {
                format!("Telegram location\nhttps://maps.google.com/?q={lat},{lon}")
            }
            Location::MapLink { provider, url } => format!("{provider} location: {url}"),
            Location::Text { raw } => raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_display_text_embeds_maps_link() {
        let loc = Location::Native {
            lat: 41.31,
            lon: 69.24,
        };
        let text = loc.display_text();
        assert!(text.contains("https://maps.google.com/?q=41.31,69.24"));
    }

    #[test]
    fn test_map_link_display_text() {
        let loc = Location::MapLink {
            provider: MapProvider::Yandex,
            url: "https://yandex.uz/maps/xyz".to_string(),
        };
        assert_eq!(
            loc.display_text(),
            "yandex location: https://yandex.uz/maps/xyz"
        );
    }

    #[test]
    fn test_location_serde_tagged() {
        let loc = Location::MapLink {
            provider: MapProvider::TwoGis,
            url: "https://2gis.uz/abc".to_string(),
        };
        let json = serde_json::to_string(&loc).unwrap();
        assert!(json.contains("\"type\":\"map_link\""));
        assert!(json.contains("\"provider\":\"twogis\""));
        let parsed: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, loc);
    }

    #[test]
    fn test_native_serde_roundtrip() {
        let loc = Location::Native {
            lat: 41.0,
            lon: 69.0,
        };
        let json = serde_json::to_string(&loc).unwrap();
        assert!(json.contains("\"type\":\"native\""));
        let parsed: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, loc);
    }
}
