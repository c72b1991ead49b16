//! Route requests and running pace.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RoutePoint;

/// Default allowed deviation from the target distance (±5 %).
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Default target distance in metres.
pub const DEFAULT_DISTANCE_M: f64 = 5_000.0;

/// Shortest target distance accepted by [`RouteRequest::new`], in metres.
pub const MIN_TARGET_DISTANCE_M: f64 = 500.0;

/// Longest target distance accepted by [`RouteRequest::new`], in metres.
pub const MAX_TARGET_DISTANCE_M: f64 = 100_000.0;

/// Shape of the requested route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    /// Returns to the starting point.
    #[default]
    Loop,
    /// Runs from the start point to a distinct end point.
    PointToPoint,
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loop => f.write_str("loop"),
            Self::PointToPoint => f.write_str("point_to_point"),
        }
    }
}

/// Running pace expressed as time per kilometre.
///
/// Parsed from the conventional `"M:SS"` notation.
///
/// # Examples
///
/// ```
/// use runroute_core::Pace;
///
/// let pace: Pace = "5:30".parse()?;
/// assert_eq!(pace.seconds_per_km(), 330);
/// assert_eq!(pace.to_string(), "5:30");
/// # Ok::<(), runroute_core::PaceError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPace")]
pub struct Pace {
    seconds_per_km: u32,
}

#[derive(Deserialize)]
struct RawPace {
    seconds_per_km: u32,
}

impl TryFrom<RawPace> for Pace {
    type Error = PaceError;

    fn try_from(raw: RawPace) -> Result<Self, Self::Error> {
        Self::from_seconds_per_km(raw.seconds_per_km)
    }
}

/// Errors returned when parsing or constructing a [`Pace`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaceError {
    /// Text was not `M:SS` with seconds below sixty.
    #[error("pace must look like M:SS (e.g. 5:30), got {0:?}")]
    Format(String),
    /// A zero pace would make every route instantaneous.
    #[error("pace must be greater than zero")]
    Zero,
}

impl Pace {
    /// Construct a pace from whole seconds per kilometre.
    pub const fn from_seconds_per_km(seconds_per_km: u32) -> Result<Self, PaceError> {
        if seconds_per_km == 0 {
            return Err(PaceError::Zero);
        }
        Ok(Self { seconds_per_km })
    }

    /// Seconds needed to cover one kilometre.
    #[must_use]
    pub const fn seconds_per_km(self) -> u32 {
        self.seconds_per_km
    }

    /// Time needed to cover `distance_m` metres at this pace.
    #[must_use]
    pub fn duration_for(self, distance_m: f64) -> Duration {
        let seconds = distance_m.max(0.0) / 1_000.0 * f64::from(self.seconds_per_km);
        Duration::from_secs_f64(seconds)
    }
}

impl Default for Pace {
    /// 5:30 per kilometre.
    fn default() -> Self {
        Self {
            seconds_per_km: 330,
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}",
            self.seconds_per_km / 60,
            self.seconds_per_km % 60
        )
    }
}

impl FromStr for Pace {
    type Err = PaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_error = || PaceError::Format(s.to_owned());
        let (minutes, seconds) = s.trim().split_once(':').ok_or_else(format_error)?;
        let minutes: u32 = minutes.parse().map_err(|_| format_error())?;
        let seconds: u32 = seconds.parse().map_err(|_| format_error())?;
        if seconds >= 60 {
            return Err(format_error());
        }
        let total = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .ok_or_else(format_error)?;
        Self::from_seconds_per_km(total)
    }
}

/// Parameters for a single route search.
///
/// Requests are immutable once built; use [`RouteRequest::new`] for a loop
/// and [`RouteRequest::point_to_point`] for a route between two points.
///
/// # Examples
///
/// ```
/// use runroute_core::{RoutePoint, RouteRequest, RouteMode};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let start = RoutePoint::new(59.3293, 18.0686)?;
/// let request = RouteRequest::new(start, 5_000.0)?.with_tolerance(0.1)?;
/// assert_eq!(request.mode(), RouteMode::Loop);
/// assert_eq!(request.bounds(), (4_500.0, 5_500.0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequest")]
pub struct RouteRequest {
    mode: RouteMode,
    start: RoutePoint,
    end: Option<RoutePoint>,
    target_distance_m: f64,
    tolerance: f64,
    pace: Pace,
    seed: u64,
}

/// Unchecked wire form of a [`RouteRequest`]; rebuilt through the
/// validating constructors.
#[derive(Deserialize)]
struct RawRequest {
    #[serde(default)]
    mode: RouteMode,
    start: RoutePoint,
    #[serde(default)]
    end: Option<RoutePoint>,
    target_distance_m: f64,
    #[serde(default = "default_tolerance")]
    tolerance: f64,
    #[serde(default)]
    pace: Pace,
    #[serde(default)]
    seed: u64,
}

const fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl TryFrom<RawRequest> for RouteRequest {
    type Error = RequestError;

    /// Loops ignore any end point.
    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let request = match raw.mode {
            RouteMode::Loop => Self::new(raw.start, raw.target_distance_m)?,
            RouteMode::PointToPoint => {
                let end = raw.end.ok_or(RequestError::MissingEndPoint)?;
                Self::point_to_point(raw.start, end, raw.target_distance_m)?
            }
        };
        Ok(request
            .with_tolerance(raw.tolerance)?
            .with_pace(raw.pace)
            .with_seed(raw.seed))
    }
}

/// Validation failures for [`RouteRequest`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// Target distance outside the supported range.
    #[error("target distance {distance_m} m is outside the supported range 500-100000 m")]
    InvalidDistance {
        /// The rejected distance in metres.
        distance_m: f64,
    },
    /// Tolerance outside `(0, 1]`.
    #[error("tolerance {0} must be a fraction in (0, 1]")]
    InvalidTolerance(f64),
    /// Start and end of a point-to-point route coincide.
    #[error("point-to-point routes need distinct start and end points")]
    SameEndpoints,
    /// A point-to-point request arrived without an end point.
    #[error("point-to-point routes need an end point")]
    MissingEndPoint,
}

impl RouteRequest {
    /// Build a loop request with the default tolerance, pace and seed.
    pub fn new(start: RoutePoint, target_distance_m: f64) -> Result<Self, RequestError> {
        validate_distance(target_distance_m)?;
        Ok(Self {
            mode: RouteMode::Loop,
            start,
            end: None,
            target_distance_m,
            tolerance: DEFAULT_TOLERANCE,
            pace: Pace::default(),
            seed: 0,
        })
    }

    /// Build a point-to-point request.
    pub fn point_to_point(
        start: RoutePoint,
        end: RoutePoint,
        target_distance_m: f64,
    ) -> Result<Self, RequestError> {
        if start.lat == end.lat && start.lon == end.lon {
            return Err(RequestError::SameEndpoints);
        }
        let mut request = Self::new(start, target_distance_m)?;
        request.mode = RouteMode::PointToPoint;
        request.end = Some(end);
        Ok(request)
    }

    /// Replace the tolerance fraction (e.g. `0.05` for ±5 %).
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self, RequestError> {
        if !tolerance.is_finite() || tolerance <= 0.0 || tolerance > 1.0 {
            return Err(RequestError::InvalidTolerance(tolerance));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Replace the running pace.
    #[must_use]
    pub const fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = pace;
        self
    }

    /// Replace the variation seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Route shape.
    #[must_use]
    pub const fn mode(&self) -> RouteMode {
        self.mode
    }

    /// Starting point.
    #[must_use]
    pub const fn start(&self) -> RoutePoint {
        self.start
    }

    /// End point for point-to-point routes.
    #[must_use]
    pub const fn end(&self) -> Option<RoutePoint> {
        self.end
    }

    /// Target distance in metres.
    #[must_use]
    pub const fn target_distance_m(&self) -> f64 {
        self.target_distance_m
    }

    /// Allowed fractional deviation.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Runner's pace.
    #[must_use]
    pub const fn pace(&self) -> Pace {
        self.pace
    }

    /// Variation seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Inclusive `(lower, upper)` distance bounds in metres.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        let slack = self.target_distance_m * self.tolerance;
        (self.target_distance_m - slack, self.target_distance_m + slack)
    }

    /// Whether `distance_m` lies within the tolerance band.
    #[must_use]
    pub fn accepts(&self, distance_m: f64) -> bool {
        let (lower, upper) = self.bounds();
        (lower..=upper).contains(&distance_m)
    }

    /// Signed deviation of `distance_m` from the target as a fraction.
    #[must_use]
    pub fn deviation(&self, distance_m: f64) -> f64 {
        (distance_m - self.target_distance_m) / self.target_distance_m
    }
}

fn validate_distance(distance_m: f64) -> Result<(), RequestError> {
    if distance_m.is_finite() && (MIN_TARGET_DISTANCE_M..=MAX_TARGET_DISTANCE_M).contains(&distance_m)
    {
        Ok(())
    } else {
        Err(RequestError::InvalidDistance { distance_m })
    }
}
