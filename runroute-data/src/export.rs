//! GPX 1.1 export of planned routes.
//!
//! A route becomes a single `running` track with one segment; every route
//! point is a track point carrying its elevation when known. The metadata
//! description summarises distance, estimated duration and climb.

use std::io::{Read, Write};

use camino::Utf8Path;
use gpx::errors::GpxError;
use gpx::{Gpx, GpxVersion, Metadata, Track, TrackSegment, Waypoint};
use runroute_core::{PointError, RoutePoint, RouteResult, RouteStats, format_duration};
use thiserror::Error;

/// Value of the `creator` attribute on exported files.
pub const GPX_CREATOR: &str = "runroute";

/// Track type recorded on exported tracks.
pub const TRACK_TYPE: &str = "running";

/// Errors raised while exporting or importing GPX.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The `gpx` crate failed to serialise or parse the document.
    #[error("GPX error: {0}")]
    Gpx(#[from] GpxError),
    /// The serialised document was not UTF-8.
    #[error("GPX output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    /// The document contains no track to read.
    #[error("GPX document contains no track")]
    NoTrack,
    /// A track point lies outside the valid coordinate range.
    #[error("GPX track point is invalid: {0}")]
    InvalidPoint(#[from] PointError),
    /// Reading or writing the file failed.
    #[error("failed to access GPX file {path}: {source}")]
    Io {
        /// File that could not be accessed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Build the GPX document for `route`.
fn build_document(route: &RouteResult, stats: &RouteStats, name: &str) -> Gpx {
    let mut segment = TrackSegment::new();
    segment.points = route
        .points
        .iter()
        .map(|point| {
            let mut waypoint = Waypoint::new(geo::Point::new(point.lon, point.lat));
            waypoint.elevation = point.elevation;
            waypoint
        })
        .collect();

    let mut track = Track::new();
    track.name = Some(name.to_owned());
    track.type_ = Some(TRACK_TYPE.to_owned());
    track.segments.push(segment);

    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(GPX_CREATOR.to_owned()),
        metadata: Some(Metadata {
            name: Some(name.to_owned()),
            description: Some(describe(stats)),
            ..Metadata::default()
        }),
        tracks: vec![track],
        ..Gpx::default()
    }
}

fn describe(stats: &RouteStats) -> String {
    format!(
        "{:.2} km, {}, {:.0} m elevation gain",
        stats.distance_m / 1_000.0,
        format_duration(stats.duration),
        stats.elevation_gain_m
    )
}

/// Serialise `route` as a GPX 1.1 document.
///
/// # Errors
///
/// Returns [`ExportError::Gpx`] if the writer rejects the document.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use runroute_core::{RoutePoint, RouteResult, RouteStats};
/// use runroute_data::export::export_gpx;
///
/// let points = vec![
///     RoutePoint::new(59.33, 18.07)?.with_elevation(Some(12.0)),
///     RoutePoint::new(59.34, 18.08)?.with_elevation(Some(15.0)),
/// ];
/// let route = RouteResult::new(points, 1_250.0, Some(3.0), "example");
/// let stats = RouteStats {
///     distance_m: 1_250.0,
///     duration: Duration::from_secs(412),
///     elevation_gain_m: 3.0,
///     elevation_loss_m: 0.0,
///     min_elevation_m: Some(12.0),
///     max_elevation_m: Some(15.0),
/// };
/// let xml = export_gpx(&route, &stats, "Morning loop")?;
/// assert!(xml.contains("Morning loop"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn export_gpx(
    route: &RouteResult,
    stats: &RouteStats,
    name: &str,
) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_gpx(&mut buffer, route, stats, name)?;
    Ok(String::from_utf8(buffer)?)
}

/// Serialise `route` as GPX 1.1 into `writer`.
///
/// # Errors
///
/// Returns [`ExportError::Gpx`] if writing fails.
pub fn write_gpx<W: Write>(
    writer: W,
    route: &RouteResult,
    stats: &RouteStats,
    name: &str,
) -> Result<(), ExportError> {
    gpx::write(&build_document(route, stats, name), writer)?;
    Ok(())
}

/// Read the points of the first track in a GPX document, across all of its
/// segments.
///
/// # Errors
///
/// Returns [`ExportError::NoTrack`] for documents without tracks and
/// [`ExportError::Gpx`] for malformed XML.
pub fn read_gpx_track<R: Read>(reader: R) -> Result<Vec<RoutePoint>, ExportError> {
    let document = gpx::read(reader)?;
    let track = document.tracks.first().ok_or(ExportError::NoTrack)?;
    track
        .segments
        .iter()
        .flat_map(|segment| &segment.points)
        .map(|waypoint| {
            let point = waypoint.point();
            Ok(RoutePoint::new(point.y(), point.x())?.with_elevation(waypoint.elevation))
        })
        .collect()
}

/// File name for a route called `name`: lowercase ASCII words joined by
/// hyphens, with a `.gpx` extension.
///
/// # Examples
///
/// ```
/// use runroute_data::export::gpx_file_name;
///
/// assert_eq!(gpx_file_name("Sunday: 10 km loop"), "sunday-10-km-loop.gpx");
/// assert_eq!(gpx_file_name("  "), "route.gpx");
/// ```
#[must_use]
pub fn gpx_file_name(name: &str) -> String {
    let slug = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "route.gpx".to_owned()
    } else {
        format!("{slug}.gpx")
    }
}

/// Export `route` to the file at `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be written.
pub fn save_gpx(
    path: &Utf8Path,
    route: &RouteResult,
    stats: &RouteStats,
    name: &str,
) -> Result<(), ExportError> {
    let xml = export_gpx(route, stats, name)?;
    runroute_fs::write_file(path, xml).map_err(|source| ExportError::Io {
        path: path.to_string(),
        source,
    })?;
    log::info!("wrote {} track points to {path}", route.points.len());
    Ok(())
}

/// Read the first track of the GPX file at `path`.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be opened, otherwise as
/// [`read_gpx_track`].
pub fn load_gpx_track(path: &Utf8Path) -> Result<Vec<RoutePoint>, ExportError> {
    let file = runroute_fs::open_utf8_file(path).map_err(|source| ExportError::Io {
        path: path.to_string(),
        source,
    })?;
    read_gpx_track(std::io::BufReader::new(file))
}
