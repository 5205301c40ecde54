//! Country boundary parsing.
//!
//! Only the feature id and `properties.name` of each boundary feature are
//! kept. Geometry is drawn by the frontend from the same file.

use farm_map_farm_models::CountryId;
use geojson::{GeoJson, feature::Id};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A country from the boundary file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Feature id (e.g. `"CAN"`).
    pub id: CountryId,
    /// Country name as matched against `Farm::country_name`.
    pub name: String,
}

/// Errors from reading the boundary file.
#[derive(Debug, Error)]
pub enum CountryError {
    /// The file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The file is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Expected a FeatureCollection")]
    NotFeatureCollection,
}

/// Parses a `GeoJSON` `FeatureCollection` into countries.
///
/// Features without an id or a string `name` property are skipped.
///
/// # Errors
///
/// Returns [`CountryError`] if the input is not a `GeoJSON`
/// `FeatureCollection`.
pub fn parse_countries(json: &str) -> Result<Vec<Country>, CountryError> {
    let geojson: GeoJson = json.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(CountryError::NotFeatureCollection);
    };

    let total = collection.features.len();
    let countries: Vec<Country> = collection
        .features
        .iter()
        .filter_map(|feature| {
            let id = match feature.id.as_ref()? {
                Id::String(s) => s.clone(),
                Id::Number(n) => n.to_string(),
            };
            let name = feature
                .property("name")
                .and_then(serde_json::Value::as_str)?
                .to_string();
            Some(Country {
                id: CountryId(id),
                name,
            })
        })
        .collect();

    if countries.len() < total {
        log::debug!(
            "Skipped {} boundary features without id or name",
            total - countries.len()
        );
    }

    Ok(countries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "CAN",
                "properties": { "name": "Canada" },
                "geometry": { "type": "Point", "coordinates": [-106.0, 56.0] }
            },
            {
                "type": "Feature",
                "id": 76,
                "properties": { "name": "Brazil" },
                "geometry": null
            },
            {
                "type": "Feature",
                "properties": { "name": "Nowhere" },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn parses_ids_and_names() {
        let countries = parse_countries(BOUNDARIES).unwrap();
        assert_eq!(
            countries,
            vec![
                Country {
                    id: CountryId::new("CAN"),
                    name: "Canada".to_string(),
                },
                Country {
                    id: CountryId::new("76"),
                    name: "Brazil".to_string(),
                },
            ]
        );
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = parse_countries(r#"{"type":"Point","coordinates":[0.0,0.0]}"#).unwrap_err();
        assert!(matches!(err, CountryError::NotFeatureCollection));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_countries("not json"),
            Err(CountryError::GeoJson(_))
        ));
    }
}
