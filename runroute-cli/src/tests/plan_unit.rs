//! Focused unit tests covering plan CLI configuration and execution.

use super::helpers::StubPlanBackend;
use super::*;
use crate::plan::{
    DEFAULT_ROUTE_NAME, ModeChoice, PlanArgs, PlanConfig, PlanSummary,
    config_from_layers_for_test, run_plan_with,
};
use crate::services::{GeocoderChoice, ProviderChoice, build_providers};
use camino::Utf8PathBuf;
use rstest::rstest;
use runroute_core::{LocationInput, Pace, RequestError, RouteMode, SearchError};
use tempfile::TempDir;

const START: &str = "59.3293,18.0686";

fn loop_args() -> PlanArgs {
    PlanArgs {
        from: Some(START.to_owned()),
        ..PlanArgs::default()
    }
}

fn run_with(args: PlanArgs, backend: &StubPlanBackend) -> Result<PlanSummary, CliError> {
    let mut buffer = Vec::new();
    run_plan_with(args, backend, &mut buffer)?;
    let stdout = String::from_utf8(buffer).expect("stdout utf-8");
    Ok(serde_json::from_str(&stdout).expect("output should be a JSON plan summary"))
}

#[rstest]
fn converting_plan_without_start_errors() {
    let err = PlanConfig::try_from(PlanArgs::default()).expect_err("missing start should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_FROM);
            assert_eq!(env, ENV_PLAN_FROM);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn defaults_describe_a_five_kilometre_loop() {
    let config = PlanConfig::try_from(loop_args()).expect("config should build");
    assert_eq!(config.mode, RouteMode::Loop);
    assert_eq!(config.distance_m, 5_000.0);
    assert!((config.tolerance - 0.05).abs() < 1e-12);
    assert_eq!(config.pace, Pace::default());
    assert_eq!(config.seed, 0);
    assert_eq!(config.provider, ProviderChoice::Auto);
    assert_eq!(config.geocoder, GeocoderChoice::Nominatim);
    assert_eq!(config.name, DEFAULT_ROUTE_NAME);
    assert!(matches!(config.from, LocationInput::Coordinates(_)));
}

#[rstest]
#[case::graphhopper_only(None, Some("gh"), "graphhopper")]
#[case::ors_only(Some("ors"), None, "openrouteservice")]
#[case::both_prefer_graphhopper(Some("ors"), Some("gh"), "graphhopper")]
fn auto_provider_follows_configured_keys(
    #[case] ors_key: Option<&str>,
    #[case] graphhopper_key: Option<&str>,
    #[case] expected: &str,
) {
    let args = PlanArgs {
        ors_api_key: ors_key.map(str::to_owned),
        graphhopper_api_key: graphhopper_key.map(str::to_owned),
        ..loop_args()
    };
    let config = PlanConfig::try_from(args).expect("config should build");
    let names: Vec<String> = build_providers(config.provider, &config.services)
        .expect("provider should build")
        .iter()
        .map(|provider| provider.name().to_owned())
        .collect();
    assert_eq!(names, vec![expected.to_owned()]);
}

#[rstest]
fn auto_provider_without_keys_asks_for_the_ors_key() {
    let config = PlanConfig::try_from(loop_args()).expect("config should build");
    let err = build_providers(config.provider, &config.services)
        .err()
        .expect("a key is required");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_ORS_API_KEY);
            assert_eq!(env, ENV_PLAN_ORS_API_KEY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn destination_implies_point_to_point() {
    let args = PlanArgs {
        to: Some("Slussen, Stockholm".to_owned()),
        ..loop_args()
    };
    let config = PlanConfig::try_from(args).expect("config should build");
    assert_eq!(config.mode, RouteMode::PointToPoint);
    assert_eq!(
        config.to,
        Some(LocationInput::Address("Slussen, Stockholm".to_owned()))
    );
}

#[rstest]
fn point_to_point_without_destination_errors() {
    let args = PlanArgs {
        mode: Some(ModeChoice::PointToPoint),
        ..loop_args()
    };
    let err = PlanConfig::try_from(args).expect_err("destination is required");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_TO);
            assert_eq!(env, ENV_PLAN_TO);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn explicit_loop_ignores_destination() {
    let args = PlanArgs {
        mode: Some(ModeChoice::Loop),
        to: Some(START.to_owned()),
        ..loop_args()
    };
    let config = PlanConfig::try_from(args).expect("config should build");
    assert_eq!(config.mode, RouteMode::Loop);
}

#[rstest]
#[case(Some(8.0), Some(10.0), 8_000.0, 0.10)]
#[case(Some(21.1), None, 21_100.0, 0.05)]
#[case(None, Some(2.5), 5_000.0, 0.025)]
fn units_convert_to_metres_and_fractions(
    #[case] distance_km: Option<f64>,
    #[case] tolerance_percent: Option<f64>,
    #[case] distance_m: f64,
    #[case] tolerance: f64,
) {
    let args = PlanArgs {
        distance_km,
        tolerance_percent,
        ..loop_args()
    };
    let config = PlanConfig::try_from(args).expect("config should build");
    assert!((config.distance_m - distance_m).abs() < 1e-6);
    assert!((config.tolerance - tolerance).abs() < 1e-12);
}

#[rstest]
#[case("5:75")]
#[case("fast")]
#[case("0:00")]
fn malformed_pace_is_rejected(#[case] pace: &str) {
    let args = PlanArgs {
        pace: Some(pace.to_owned()),
        ..loop_args()
    };
    let err = PlanConfig::try_from(args).expect_err("pace should be rejected");
    match err {
        CliError::InvalidPace { value, .. } => assert_eq!(value, pace),
        other => panic!("expected InvalidPace, found {other:?}"),
    }
}

#[rstest]
fn zero_attempts_are_rejected() {
    let args = PlanArgs {
        max_attempts: Some(0),
        ..loop_args()
    };
    let err = PlanConfig::try_from(args).expect_err("zero attempts should error");
    assert!(matches!(
        err,
        CliError::InvalidArgument {
            field: "max-attempts",
            ..
        }
    ));
}

#[rstest]
fn blank_name_falls_back_to_default() {
    let args = PlanArgs {
        name: Some("  ".to_owned()),
        ..loop_args()
    };
    let config = PlanConfig::try_from(args).expect("config should build");
    assert_eq!(config.name, DEFAULT_ROUTE_NAME);
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "distance_km": "far" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "from": "Odenplan, Stockholm",
            "distance_km": 8.0,
            "pace": "6:00",
        }),
        None,
    );
    composer.push_environment(json!({
        "distance_km": 10.0,
        "ors_api_key": "from-env",
    }));
    composer.push_cli(json!({ "from": START }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert!(matches!(config.from, LocationInput::Coordinates(_)));
    assert_eq!(config.distance_m, 10_000.0);
    assert_eq!(config.pace.seconds_per_km(), 360);
    assert_eq!(config.services.ors_api_key.as_deref(), Some("from-env"));
}

#[rstest]
fn coordinates_skip_the_geocoder() {
    let backend = StubPlanBackend::with_distances([5_000.0]);
    let summary = run_with(loop_args(), &backend).expect("plan succeeds");
    assert_eq!(backend.geocoder_builds(), 0);
    assert_eq!(summary.provider, "stub");
    assert_eq!(summary.distance_m, 5_000.0);
    assert!(summary.within_tolerance);
    assert_eq!(summary.notice, None);
    assert_eq!(summary.duration_s, 1_650);
    assert_eq!(summary.duration, "27:30");
    assert_eq!(summary.pace, "5:30");
    assert!(summary.point_count >= 2);
}

#[rstest]
fn addresses_share_one_geocoder() {
    let backend = StubPlanBackend::with_distances([5_000.0]);
    let args = PlanArgs {
        from: Some("Stureplan, Stockholm".to_owned()),
        to: Some("Slussen, Stockholm".to_owned()),
        distance_km: Some(0.6),
        ..PlanArgs::default()
    };
    let result = run_with(args, &backend);
    assert_eq!(backend.geocoder_builds(), 1);
    assert!(matches!(
        result,
        Err(CliError::InvalidRequest(RequestError::SameEndpoints))
    ));
}

#[rstest]
fn shortfall_is_reported_not_fatal() {
    let backend = StubPlanBackend::with_distances([3_000.0]);
    let summary = run_with(loop_args(), &backend).expect("closest route is still returned");
    assert!(!summary.within_tolerance);
    assert!(summary.notice.is_some());
    assert_eq!(summary.distance_m, 3_000.0);
}

#[rstest]
fn unroutable_provider_surfaces_search_error() {
    let backend = StubPlanBackend::unroutable();
    let err = run_with(loop_args(), &backend).expect_err("no route can be found");
    match err {
        CliError::Plan(runroute_core::PlanError::Search(SearchError::NoRouteFound {
            provider,
            ..
        })) => assert_eq!(provider, "stub"),
        other => panic!("expected NoRouteFound, found {other:?}"),
    }
}

#[rstest]
fn gpx_is_written_when_requested() {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    let gpx_path = root.join("routes").join("evening.gpx");
    let args = PlanArgs {
        gpx: Some(gpx_path.clone()),
        name: Some("Evening loop".to_owned()),
        ..loop_args()
    };

    let backend = StubPlanBackend::with_distances([5_000.0]);
    let summary = run_with(args, &backend).expect("plan succeeds");
    assert_eq!(summary.gpx.as_ref(), Some(&gpx_path));
    assert_eq!(summary.name, "Evening loop");

    let track = runroute_data::export::load_gpx_track(&gpx_path).expect("GPX readable");
    assert_eq!(track.len(), summary.point_count);
    let first = track.first().expect("track has points");
    assert!((first.lat - 59.3293).abs() < 1e-6);
}
