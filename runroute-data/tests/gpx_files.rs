//! Saving and loading GPX files on disk.

use std::time::Duration;

use camino::Utf8PathBuf;
use rstest::rstest;
use runroute_core::{RoutePoint, RouteResult, RouteStats};
use runroute_data::export::{ExportError, gpx_file_name, load_gpx_track, save_gpx};

fn sample_route() -> (RouteResult, RouteStats) {
    let points: Vec<RoutePoint> = [
        (59.3293, 18.0686, 21.0),
        (59.3320, 18.0741, 26.5),
        (59.3351, 18.0702, 30.0),
        (59.3293, 18.0686, 21.0),
    ]
    .into_iter()
    .map(|(lat, lon, ele)| {
        RoutePoint::new(lat, lon)
            .expect("valid point")
            .with_elevation(Some(ele))
    })
    .collect();
    let route = RouteResult::new(points, 1_480.0, Some(9.0), "openrouteservice");
    let stats = RouteStats {
        distance_m: 1_480.0,
        duration: Duration::from_secs(488),
        elevation_gain_m: 9.0,
        elevation_loss_m: 9.0,
        min_elevation_m: Some(21.0),
        max_elevation_m: Some(30.0),
    };
    (route, stats)
}

#[rstest]
fn saved_tracks_load_back_in_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
    let path = root.join("exports").join(gpx_file_name("Evening Loop"));
    let (route, stats) = sample_route();

    save_gpx(&path, &route, &stats, "Evening Loop").expect("save");
    assert!(path.as_str().ends_with("exports/evening-loop.gpx"));

    let points = load_gpx_track(&path).expect("load");
    assert_eq!(points.len(), route.points.len());
    for (loaded, original) in points.iter().zip(&route.points) {
        assert!((loaded.lat - original.lat).abs() < 1e-9);
        assert!((loaded.lon - original.lon).abs() < 1e-9);
        assert_eq!(loaded.elevation, original.elevation);
    }
}

#[rstest]
fn loading_a_missing_file_names_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
    let path = root.join("absent.gpx");
    let err = load_gpx_track(&path).expect_err("missing file");
    assert!(
        matches!(&err, ExportError::Io { path: reported, .. } if reported == path.as_str()),
        "got {err:?}"
    );
}
