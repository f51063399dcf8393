//! Planar helpers shared by the model and the polygon handler.

use stride_protocol::Point2d;

use super::BoundingBox;

/// Arithmetic mean of the vertices; `None` for an empty outline.
#[must_use]
pub fn centroid(shape: &[Point2d]) -> Option<Point2d> {
    if shape.is_empty() {
        return None;
    }
    let count = shape.len() as f64;
    let (sum_x, sum_y) = shape
        .iter()
        .fold((0.0, 0.0), |(x, y), point| (x + point.x, y + point.y));
    Some(Point2d::new(sum_x / count, sum_y / count))
}

#[must_use]
pub fn bounding_box(shape: &[Point2d]) -> Option<BoundingBox> {
    let first = shape.first()?;
    let mut min = *first;
    let mut max = *first;
    for point in shape {
        min.x = min.x.min(point.x);
        min.y = min.y.min(point.y);
        max.x = max.x.max(point.x);
        max.y = max.y.max(point.y);
    }
    Some(BoundingBox { min, max })
}

/// Even-odd ray casting test.
#[must_use]
pub fn contains(shape: &[Point2d], point: Point2d) -> bool {
    let mut inside = false;
    let mut previous = match shape.last() {
        Some(last) => *last,
        None => return false,
    };
    for current in shape {
        let crosses = (current.y > point.y) != (previous.y > point.y);
        if crosses {
            let x_at = (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y)
                + current.x;
            if point.x < x_at {
                inside = !inside;
            }
        }
        previous = *current;
    }
    inside
}

pub(crate) fn distance(from: Point2d, to: Point2d) -> f64 {
    (to.x - from.x).hypot(to.y - from.y)
}
