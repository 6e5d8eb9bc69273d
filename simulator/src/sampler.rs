use crate::{
    geometry::{haversine_km, path_length_km},
    models::Coordinate,
};

/// Where a progress fraction lands on a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPosition {
    pub coord: Coordinate,
    /// Index of the segment `path[segment]..path[segment + 1]` holding the point.
    pub segment: usize,
    /// Position inside that segment, in [0, 1].
    pub segment_fraction: f64,
    /// Distance travelled from the first point along the polyline.
    pub distance_km: f64,
}

/// Point at `fraction` of the total length of `path`.
///
/// Returns `None` for an empty path. Fractions below 0 land on the first
/// point and fractions of 1 or more on the last.
pub fn point_at_fraction(path: &[Coordinate], fraction: f64) -> Option<Coordinate> {
    locate(path, fraction).map(|position| position.coord)
}

/// Walks the segments of `path` until the accumulated length reaches
/// `fraction * total` and interpolates inside that segment.
pub fn locate(path: &[Coordinate], fraction: f64) -> Option<PathPosition> {
    let (&first, rest) = path.split_first()?;
    let start = PathPosition {
        coord: first,
        segment: 0,
        segment_fraction: 0.0,
        distance_km: 0.0,
    };
    if rest.is_empty() {
        return Some(start);
    }

    let total_km = path_length_km(path);
    if total_km <= 0.0 {
        return Some(start);
    }

    let last_segment = path.len() - 2;
    let end = PathPosition {
        coord: path[path.len() - 1],
        segment: last_segment,
        segment_fraction: 1.0,
        distance_km: total_km,
    };
    if fraction >= 1.0 {
        return Some(end);
    }

    let target_km = fraction * total_km;
    let mut travelled_km = 0.0;
    for (segment, pair) in path.windows(2).enumerate() {
        let segment_km = haversine_km(pair[0], pair[1]);
        if travelled_km + segment_km >= target_km {
            if segment_km <= 0.0 {
                return Some(PathPosition {
                    coord: pair[0],
                    segment,
                    segment_fraction: 0.0,
                    distance_km: travelled_km,
                });
            }
            let t = ((target_km - travelled_km) / segment_km).clamp(0.0, 1.0);
            return Some(PathPosition {
                coord: pair[0].interpolate(pair[1], t),
                segment,
                segment_fraction: t,
                distance_km: travelled_km + t * segment_km,
            });
        }
        travelled_km += segment_km;
    }

    // Floating-point drift left the target just past the last segment.
    Some(end)
}
