//! Summary statistics for a planned route.
//!
//! [`route_stats`] is a pure function over the route distance, its elevation
//! profile and the runner's pace. It never calls a provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Pace, RoutePoint};

/// Time and elevation summary for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    /// Route distance in metres.
    pub distance_m: f64,
    /// Estimated running time at the requested pace.
    pub duration: Duration,
    /// Cumulative climb in metres.
    pub elevation_gain_m: f64,
    /// Cumulative descent in metres.
    pub elevation_loss_m: f64,
    /// Lowest sampled elevation, when any sample exists.
    pub min_elevation_m: Option<f64>,
    /// Highest sampled elevation, when any sample exists.
    pub max_elevation_m: Option<f64>,
}

/// Errors from [`route_stats`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// The distance was negative or not finite.
    #[error("invalid profile: distance {0} m is not a finite, non-negative value")]
    InvalidDistance(f64),
    /// An elevation sample was not finite.
    #[error("invalid profile: elevation sample {index} is {value}")]
    InvalidProfile {
        /// Position of the offending sample.
        index: usize,
        /// The offending value.
        value: f64,
    },
}

/// Compute duration and elevation statistics.
///
/// # Examples
///
/// ```
/// use runroute_core::{Pace, route_stats};
///
/// let stats = route_stats(5_000.0, &[10.0, 15.0, 12.0, 20.0], Pace::default())?;
/// assert_eq!(stats.duration.as_secs(), 1_650);
/// assert_eq!(stats.elevation_gain_m, 13.0);
/// assert_eq!(stats.elevation_loss_m, 3.0);
/// # Ok::<(), runroute_core::StatsError>(())
/// ```
pub fn route_stats(
    distance_m: f64,
    elevation_profile: &[f64],
    pace: Pace,
) -> Result<RouteStats, StatsError> {
    if !distance_m.is_finite() || distance_m < 0.0 {
        return Err(StatsError::InvalidDistance(distance_m));
    }
    if let Some((index, value)) = elevation_profile
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !value.is_finite())
    {
        return Err(StatsError::InvalidProfile { index, value });
    }

    let (gain, loss) = climb_and_descent(elevation_profile.iter().copied());
    let min_elevation_m = elevation_profile.iter().copied().reduce(f64::min);
    let max_elevation_m = elevation_profile.iter().copied().reduce(f64::max);

    Ok(RouteStats {
        distance_m,
        duration: pace.duration_for(distance_m),
        elevation_gain_m: gain,
        elevation_loss_m: loss,
        min_elevation_m,
        max_elevation_m,
    })
}

/// Climb summed over consecutive known elevations.
///
/// Points without an elevation sample are skipped rather than treated as
/// zero.
#[must_use]
pub fn elevation_gain(points: &[RoutePoint]) -> f64 {
    climb_and_descent(points.iter().filter_map(|point| point.elevation)).0
}

fn climb_and_descent(samples: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut gain = 0.0;
    let mut loss = 0.0;
    let mut previous: Option<f64> = None;
    for sample in samples {
        if let Some(prev) = previous {
            let delta = sample - prev;
            if delta > 0.0 {
                gain += delta;
            } else {
                loss -= delta;
            }
        }
        previous = Some(sample);
    }
    (gain, loss)
}

/// Render a duration as `HH:MM:SS`, or `MM:SS` below one hour.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use runroute_core::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(1_650)), "27:30");
/// assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
