// SPDX-License-Identifier: MPL-2.0

//! Address search for the composer, backed by OpenStreetMap's Nominatim.

use serde::Deserialize;
use thiserror::Error;
use url::Url;

const SEARCH_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim asks identified clients for a descriptive agent string.
const USER_AGENT: &str = concat!("ChronoMap/", env!("CARGO_PKG_VERSION"));

/// Results per query; the composer shows a short pick list.
const RESULT_LIMIT: &str = "5";

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A place candidate the user can pick to set the pending pin location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPlace {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    display_name: String,
    // Nominatim returns coordinates as strings.
    lat: String,
    lon: String,
}

fn parse_results(body: &str) -> Result<Vec<GeoPlace>, GeoError> {
    let rows: Vec<SearchRow> =
        serde_json::from_str(body).map_err(|e| GeoError::InvalidResponse(e.to_string()))?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let lat = row.lat.parse().ok()?;
            let lng = row.lon.parse().ok()?;
            Some(GeoPlace {
                label: row.display_name,
                lat,
                lng,
            })
        })
        .collect())
}

/// Look up address candidates for a free-text query.
pub async fn search(query: &str) -> Result<Vec<GeoPlace>, GeoError> {
    let url = Url::parse_with_params(
        SEARCH_ENDPOINT,
        &[("q", query), ("format", "jsonv2"), ("limit", RESULT_LIMIT)],
    )
    .map_err(|e| GeoError::InvalidResponse(e.to_string()))?;

    let response = reqwest::Client::new()
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .map_err(|e| GeoError::Network(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| GeoError::Network(e.to_string()))?;
    if !status.is_success() {
        return Err(GeoError::Network(format!("{status}")));
    }

    parse_results(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let body = r#"[
            {"display_name": "Paris, France", "lat": "48.8588897", "lon": "2.3200410"},
            {"display_name": "Paris, Texas", "lat": "33.6617962", "lon": "-95.5555130"}
        ]"#;
        let places = parse_results(body).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].label, "Paris, France");
        assert!((places[0].lat - 48.8588897).abs() < 1e-9);
        assert!((places[1].lng - -95.5555130).abs() < 1e-9);
    }

    #[test]
    fn test_unparsable_coordinates_are_skipped() {
        let body = r#"[{"display_name": "Nowhere", "lat": "abc", "lon": "1.0"}]"#;
        assert!(parse_results(body).unwrap().is_empty());
    }

    #[test]
    fn test_non_json_body_is_an_error() {
        assert!(parse_results("<html>rate limited</html>").is_err());
    }
}
