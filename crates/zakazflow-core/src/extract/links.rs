//! Map-service link detection.
//!
//! Customers often share a Google/Yandex/2GIS link instead of a native pin;
//! either counts as the session location.

use std::sync::LazyLock;

use regex::Regex;

use zakazflow_types::location::{Location, MapProvider};

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://[^\s]+").expect("link pattern"));

/// First recognized map link in the text, if any.
pub fn detect_map_link(text: &str) -> Option<Location> {
    for m in LINK_PATTERN.find_iter(text) {
        let url = m.as_str();
        let lower = url.to_lowercase();

        let provider = if lower.contains("google.com/maps")
            || lower.contains("maps.app.goo.gl")
            || lower.contains("goo.gl/maps")
        {
            Some(MapProvider::Google)
        } else if lower.contains("yandex.") && lower.contains("maps") {
            Some(MapProvider::Yandex)
        } else if lower.contains("2gis") {
            Some(MapProvider::TwoGis)
        } else {
            None
        };

        if let Some(provider) = provider {
            return Some(Location::MapLink {
                provider,
                url: url.to_string(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_maps_link() {
        let loc = detect_map_link("manzil: https://maps.app.goo.gl/Xy12 shu yerda").unwrap();
        assert_eq!(
            loc,
            Location::MapLink {
                provider: MapProvider::Google,
                url: "https://maps.app.goo.gl/Xy12".to_string(),
            }
        );
    }

    #[test]
    fn test_yandex_maps_link() {
        let loc = detect_map_link("https://yandex.uz/maps/10335/tashkent/?ll=69").unwrap();
        assert!(matches!(
            loc,
            Location::MapLink {
                provider: MapProvider::Yandex,
                ..
            }
        ));
    }

    #[test]
    fn test_2gis_link() {
        let loc = detect_map_link("mana https://2gis.uz/tashkent/geo/123").unwrap();
        assert!(matches!(
            loc,
            Location::MapLink {
                provider: MapProvider::TwoGis,
                ..
            }
        ));
    }

    #[test]
    fn test_non_map_link_ignored() {
        assert!(detect_map_link("https://example.com/menu.pdf").is_none());
        assert!(detect_map_link("hech qanday link yo'q").is_none());
    }
}
