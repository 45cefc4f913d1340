//! Client for the external OSRM-compatible directions service.
//!
//! One outbound GET per routing request, no retry and no backoff: when the
//! service misbehaves the error is reported to the caller and the request is
//! dropped. The only guard added over the upstream contract is a client-side
//! timeout so a dead service cannot pin a request forever.

use std::time::Duration;

use serde::Deserialize;
use shared::{BusRoute, Coordinate};

pub const DEFAULT_DIRECTIONS_URL: &str = "https://routing.openstreetmap.de/routed-car/route/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    #[error("a routing request needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("directions request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("directions service answered HTTP {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error("directions service rejected the request: {code} {message}")]
    Rejected { code: String, message: String },

    #[error("directions service returned no candidate route")]
    NoRoute,
}

/// Wire shape of an OSRM v1 `/route` response, reduced to the fields we
/// consume: the status code, the first candidate's GeoJSON geometry, and its
/// distance/duration summary.
#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: longitude first.
    coordinates: Vec<[f64; 2]>,
}

pub struct DirectionsClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectionsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectionsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches driving directions through the given waypoints, in order.
    pub async fn route(&self, waypoints: &[Coordinate]) -> Result<BusRoute, DirectionsError> {
        if waypoints.len() < 2 {
            return Err(DirectionsError::TooFewWaypoints(waypoints.len()));
        }

        let url = self.request_url(waypoints);
        tracing::debug!(%url, "requesting directions");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectionsError::UpstreamStatus(status));
        }

        let body: OsrmResponse = response.json().await?;
        into_route(body)
    }

    fn request_url(&self, waypoints: &[Coordinate]) -> String {
        let coords = waypoints
            .iter()
            .map(|w| format!("{},{}", w.lng, w.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/driving/{coords}?overview=full&geometries=geojson&alternatives=false",
            self.base_url
        )
    }
}

fn into_route(body: OsrmResponse) -> Result<BusRoute, DirectionsError> {
    if body.code != "Ok" {
        return Err(DirectionsError::Rejected {
            code: body.code,
            message: body.message.unwrap_or_default(),
        });
    }

    let candidate = body.routes.into_iter().next().ok_or(DirectionsError::NoRoute)?;
    let coordinates = candidate
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| Coordinate { lat, lng })
        .collect();

    Ok(BusRoute {
        coordinates,
        total_distance: candidate.distance,
        total_time: candidate.duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_lists_waypoints_longitude_first() {
        let client = DirectionsClient::new("https://example.test/route/v1/").unwrap();
        let url = client.request_url(&[
            Coordinate { lat: 56.34, lng: -2.79 },
            Coordinate { lat: 56.46, lng: -2.97 },
        ]);
        assert_eq!(
            url,
            "https://example.test/route/v1/driving/-2.79,56.34;-2.97,56.46\
             ?overview=full&geometries=geojson&alternatives=false"
        );
    }

    #[test]
    fn parses_first_candidate_route() {
        let body: OsrmResponse = serde_json::from_str(
            r#"{
                "code": "Ok",
                "routes": [
                    {
                        "geometry": {"coordinates": [[-2.79, 56.34], [-2.80, 56.35]], "type": "LineString"},
                        "distance": 1520.3,
                        "duration": 210.0
                    },
                    {
                        "geometry": {"coordinates": [[-2.79, 56.34]], "type": "LineString"},
                        "distance": 9999.0,
                        "duration": 999.0
                    }
                ]
            }"#,
        )
        .unwrap();

        let route = into_route(body).unwrap();
        assert_eq!(route.total_distance, 1520.3);
        assert_eq!(route.total_time, 210.0);
        assert_eq!(route.coordinates.len(), 2);
        // GeoJSON pairs arrive longitude-first and must be swapped.
        assert_eq!(route.coordinates[0], Coordinate { lat: 56.34, lng: -2.79 });
    }

    #[test]
    fn non_ok_code_is_rejected() {
        let body: OsrmResponse = serde_json::from_str(
            r#"{"code": "NoSegment", "message": "Could not find a matching segment"}"#,
        )
        .unwrap();

        match into_route(body) {
            Err(DirectionsError::Rejected { code, message }) => {
                assert_eq!(code, "NoSegment");
                assert!(message.contains("matching segment"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn ok_code_with_empty_route_list_is_no_route() {
        let body: OsrmResponse =
            serde_json::from_str(r#"{"code": "Ok", "routes": []}"#).unwrap();
        assert!(matches!(into_route(body), Err(DirectionsError::NoRoute)));
    }

    #[tokio::test]
    async fn fewer_than_two_waypoints_is_refused_before_any_request() {
        let client = DirectionsClient::new("http://127.0.0.1:9").unwrap();
        let result = client.route(&[Coordinate { lat: 56.0, lng: -3.0 }]).await;
        assert!(matches!(result, Err(DirectionsError::TooFewWaypoints(1))));
    }
}
