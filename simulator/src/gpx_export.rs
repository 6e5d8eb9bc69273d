use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::SimError;
use crate::models::Coordinate;

const CREATOR: &str = "swiftride-simulator";

/// Base64 GPX 1.1 document with the route as a single track.
pub fn encode_route_as_gpx(path: &[Coordinate]) -> Result<String, SimError> {
    let mut segment = TrackSegment::new();
    segment.points = path.iter().map(to_waypoint).collect();
    let track = Track {
        name: Some("synthesized route".into()),
        segments: vec![segment],
        ..Default::default()
    };
    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        tracks: vec![track],
        ..Default::default()
    };

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: &Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpx_holds_every_point_of_the_route() {
        let path = [
            Coordinate::new(12.97, 77.59),
            Coordinate::new(12.98, 77.59),
            Coordinate::new(12.98, 77.61),
        ];
        let encoded = encode_route_as_gpx(&path).unwrap();
        let xml = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert!(xml.contains(CREATOR));
        assert_eq!(xml.matches("<trkpt").count(), 3);
    }
}
