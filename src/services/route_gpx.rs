//! GPX route files.
//!
//! A custom route can replace the built-in one. Each `<wpt>` becomes a
//! milestone: its `<name>` is the place and the `distance_km` extension
//! element (any namespace prefix) its cumulative distance. Waypoints are
//! taken in file order. When the last waypoint falls short of the
//! circumnavigation target a sentinel milestone is appended.
//!
//! ```xml
//! <wpt lat="50.65" lon="6.04">
//!   <name>Kettenis</name>
//!   <extensions><rj:distance_km>0</rj:distance_km></extensions>
//! </wpt>
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use thiserror::Error;

use crate::services::route::{Milestone, Route, RouteError, TARGET_PLACE};

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("IO error reading GPX file: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid field value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
    #[error("Invalid route: {0}")]
    Route(#[from] RouteError),
}

/// Read a route from a GPX file on disk.
pub fn load_route_file(path: &Path, target_km: f64) -> Result<Route, GpxError> {
    let gpx_xml = std::fs::read_to_string(path)?;
    let route = parse_route(&gpx_xml, target_km)?;
    tracing::info!(
        "Loaded route with {} milestones from {}",
        route.milestones().len(),
        path.display()
    );
    Ok(route)
}

/// Parse GPX waypoints into a validated route.
pub fn parse_route(gpx_xml: &str, target_km: f64) -> Result<Route, GpxError> {
    let mut reader = Reader::from_str(gpx_xml);
    let mut milestones: Vec<Milestone> = Vec::new();

    let mut in_wpt = false;
    let mut in_wpt_extensions = false;
    let mut wpt_name: Option<String> = None;
    let mut wpt_distance_km: Option<f64> = None;

    // Element whose text is being captured
    let mut current_element: Option<&'static str> = None;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local_name = local_name_str(e.name().as_ref());
                match local_name.as_str() {
                    "wpt" => {
                        in_wpt = true;
                        wpt_name = None;
                        wpt_distance_km = None;
                    }
                    "extensions" if in_wpt => in_wpt_extensions = true,
                    "name" if in_wpt && !in_wpt_extensions => current_element = Some("name"),
                    "distance_km" if in_wpt_extensions => current_element = Some("distance_km"),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(elem) = current_element {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    if !text.is_empty() {
                        match elem {
                            "name" => wpt_name = Some(text),
                            "distance_km" => {
                                wpt_distance_km =
                                    Some(text.parse().map_err(|_| GpxError::InvalidValue {
                                        field: "distance_km".to_string(),
                                        message: format!("not a valid number: '{}'", text),
                                    })?);
                            }
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = local_name_str(e.name().as_ref());
                current_element = None;
                match local_name.as_str() {
                    "extensions" if in_wpt_extensions => in_wpt_extensions = false,
                    "wpt" => {
                        let place = wpt_name
                            .take()
                            .ok_or_else(|| GpxError::MissingField("waypoint <name>".to_string()))?;
                        let distance_km = wpt_distance_km.take().ok_or_else(|| {
                            GpxError::MissingField(format!("distance_km for waypoint '{}'", place))
                        })?;
                        milestones.push(Milestone { distance_km, place });
                        in_wpt = false;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if milestones.is_empty() {
        return Err(GpxError::MissingField(
            "at least one <wpt> milestone".to_string(),
        ));
    }

    let last_km = milestones[milestones.len() - 1].distance_km;
    if target_km > last_km {
        milestones.push(Milestone {
            distance_km: target_km,
            place: TARGET_PLACE.to_string(),
        });
    }

    Ok(Route::new(milestones)?)
}

/// Local part of a possibly prefixed element name (`rj:distance_km` -> `distance_km`).
fn local_name_str(full: &[u8]) -> String {
    let s = std::str::from_utf8(full).unwrap_or("");
    match s.rfind(':') {
        Some(pos) => s[pos + 1..].to_string(),
        None => s.to_string(),
    }
}
