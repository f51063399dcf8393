//! Typed values carried by Set payloads and Get responses.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// A point in the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2d {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2d {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A point with elevation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3d {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Elevation.
    pub z: f64,
}

impl Point3d {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Discriminant of a [`Value`], used to declare what a variable yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    /// [`Value::Integer`].
    Integer,
    /// [`Value::Double`].
    Double,
    /// [`Value::Text`].
    Text,
    /// [`Value::TextList`].
    TextList,
    /// [`Value::Point2d`].
    Point2d,
    /// [`Value::Point3d`].
    Point3d,
    /// [`Value::Polygon`].
    Polygon,
}

/// A typed protocol value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Signed 32-bit integer.
    Integer(i32),
    /// Double precision float.
    Double(f64),
    /// UTF-8 string.
    Text(String),
    /// List of strings, typically entity ids.
    TextList(Vec<String>),
    /// Planar position.
    Point2d(Point2d),
    /// Position with elevation.
    Point3d(Point3d),
    /// Closed polygon path.
    Polygon(Vec<Point2d>),
}

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Double(_) => ValueKind::Double,
            Self::Text(_) => ValueKind::Text,
            Self::TextList(_) => ValueKind::TextList,
            Self::Point2d(_) => ValueKind::Point2d,
            Self::Point3d(_) => ValueKind::Point3d,
            Self::Polygon(_) => ValueKind::Polygon,
        }
    }

    /// Returns `true` when every float inside the value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Integer(_) | Self::Text(_) | Self::TextList(_) => true,
            Self::Double(value) => value.is_finite(),
            Self::Point2d(point) => point.is_finite(),
            Self::Point3d(point) => {
                point.x.is_finite() && point.y.is_finite() && point.z.is_finite()
            }
            Self::Polygon(points) => points.iter().all(|point| point.is_finite()),
        }
    }

    /// Returns the text content of a [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}
