//! End-to-end optimizer tests
//!
//! Scenarios over validation, batching, reassembly, retry and the
//! collaborator pipeline.

mod fixtures;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use batch_router::projection::{UtmProjection, planar_distance};
use batch_router::traits::{CollaboratorError, PayloadSource, RouteSink};
use batch_router::{
    Error, OptimizedRoute, OptimizerConfig, RouteOptimizer, ValidationError, optimize_routes,
};

use fixtures::{CROSS_ZONE, SINGLE_A, SINGLE_B, THREE_DELIVERIES, generated, header_only};

// ============================================================================
// Helpers
// ============================================================================

fn optimizer(batch_size: usize) -> RouteOptimizer {
    RouteOptimizer::new(OptimizerConfig {
        worker_threads: Some(2),
        ..OptimizerConfig::with_batch_size(batch_size)
    })
    .expect("valid config")
}

fn ids(routes: &[OptimizedRoute]) -> Vec<u64> {
    routes.iter().map(|r| r.delivery_id()).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn three_deliveries_in_one_batch() {
    let routes = optimize_routes(&[THREE_DELIVERIES], 10).unwrap();

    assert_eq!(routes.len(), 3);
    let unique: HashSet<u64> = ids(&routes).into_iter().collect();
    assert_eq!(unique, HashSet::from([1, 2, 3]));
    assert!(routes.iter().all(|r| r.batch_index == 0));

    let sequences: Vec<usize> = routes.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}

#[test]
fn two_payloads_are_combined() {
    let routes = optimize_routes(&[SINGLE_A, SINGLE_B], 10).unwrap();
    assert_eq!(ids(&routes), vec![1, 2]);
    assert!(routes.iter().all(|r| r.batch_index == 0), "Both rows fit in one batch");
}

#[test]
fn header_only_payload_yields_no_routes() {
    let routes = optimize_routes(&[header_only()], 10).unwrap();
    assert!(routes.is_empty());
}

#[test]
fn many_batches_keep_input_order() {
    let payload = generated(1, 95);
    let routes = optimizer(10).optimize(&[payload]).unwrap();

    assert_eq!(routes.len(), 95);
    assert_eq!(ids(&routes), (1..=95).collect::<Vec<u64>>());

    let batches: Vec<usize> = routes.iter().map(|r| r.batch_index).collect();
    assert_eq!(batches.first(), Some(&0));
    assert_eq!(batches.last(), Some(&9));
    assert!(batches.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn output_geometry_is_the_input_pickup() {
    let routes = optimize_routes(&[generated(100, 30)], 8).unwrap();
    assert_eq!(routes.len(), 30);
    for route in &routes {
        assert_eq!(route.geometry, route.delivery.pickup());
    }
}

#[test]
fn batch_spanning_zones_and_hemispheres_keeps_input_geometry() {
    let routes = optimize_routes(&[CROSS_ZONE], 10).unwrap();

    assert_eq!(ids(&routes), vec![1, 2, 3, 4, 5]);
    assert!(routes.iter().all(|r| r.batch_index == 0), "One batch, one projection zone");
    for route in &routes {
        assert_eq!(route.geometry, route.delivery.pickup(), "delivery {}", route.delivery_id());
        assert!(route.geometry.x().abs() <= 180.0 && route.geometry.y().abs() <= 90.0);
    }
    assert_eq!(routes[1].geometry_wkt(), "POINT (-77.0428 -12.0464)");
}

#[test]
fn consecutive_steps_have_finite_planar_distances() {
    let routes = optimize_routes(&[CROSS_ZONE], 10).unwrap();

    // The whole batch shares the zone of its first pickup.
    let projection = UtmProjection::for_reference(routes[0].delivery.pickup()).unwrap();
    let projected: Vec<_> = routes
        .iter()
        .map(|r| projection.forward(r.delivery.pickup()).unwrap())
        .collect();
    for pair in projected.windows(2) {
        let d = planar_distance(&pair[0], &pair[1]);
        assert!(d.is_finite() && d > 0.0, "got {}", d);
    }
}

#[test]
fn sort_by_delivery_id_reorders_combined_input() {
    let config = OptimizerConfig {
        sort_by_delivery_id: true,
        worker_threads: Some(1),
        ..OptimizerConfig::with_batch_size(2)
    };
    let optimizer = RouteOptimizer::new(config).unwrap();

    let routes = optimizer.optimize(&[SINGLE_B, SINGLE_A]).unwrap();
    assert_eq!(ids(&routes), vec![1, 2]);

    let unsorted = optimize_routes(&[SINGLE_B, SINGLE_A], 2).unwrap();
    assert_eq!(ids(&unsorted), vec![2, 1]);
}

#[test]
fn repeated_runs_are_identical() {
    let payload = generated(1, 57);
    let optimizer = optimizer(13);
    let first = optimizer.optimize(&[payload.as_str()]).unwrap();
    let second = optimizer.optimize(&[payload.as_str()]).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn wrong_header_is_schema_mismatch() {
    let err = optimize_routes(&["id,lat,lon,time\n1,40.7128,-74.0060,2025-02-20"], 10).unwrap_err();
    assert!(
        matches!(err, Error::Validation(ValidationError::SchemaMismatch { .. })),
        "got {:?}",
        err
    );
}

#[test]
fn empty_payload_is_empty_input() {
    let err = optimize_routes(&[""], 10).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::EmptyInput { payload: 0 })));
}

#[test]
fn no_payloads_is_configuration_error() {
    let none: [&str; 0] = [];
    assert!(matches!(optimize_routes(&none, 10), Err(Error::Configuration(_))));
}

#[test]
fn zero_batch_size_is_configuration_error() {
    assert!(matches!(optimize_routes(&[THREE_DELIVERIES], 0), Err(Error::Configuration(_))));
}

#[test]
fn validation_rejects_bad_rows() {
    let non_numeric = "delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp\n\
                       1,invalid,-74.0060,40.7140,-74.0070,2025-02-20 10:00:00";
    assert!(matches!(
        optimize_routes(&[non_numeric], 10),
        Err(Error::Validation(ValidationError::TypeViolation { .. }))
    ));

    let out_of_range = "delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp\n\
                        1,95,-74.0060,40.7140,-74.0070,2025-02-20 10:00:00";
    assert!(matches!(
        optimize_routes(&[out_of_range], 10),
        Err(Error::Validation(ValidationError::RangeViolation { .. }))
    ));

    let duplicate = "delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp\n\
                     7,40.7128,-74.0060,40.7140,-74.0070,2025-02-20 10:00:00\n\
                     7,40.7130,-74.0050,40.7150,-74.0060,2025-02-20 10:05:00";
    assert!(matches!(
        optimize_routes(&[duplicate], 10),
        Err(Error::Validation(ValidationError::DuplicateKey { delivery_id: 7, .. }))
    ));
}

#[test]
fn one_bad_payload_rejects_everything() {
    let bad = "delivery_id,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,timestamp\n\
               9,40.0,-74.0,40.1,-74.1,not-a-time";
    let err = optimize_routes(&[THREE_DELIVERIES, bad], 10).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::TimestampViolation { .. })));
}

#[test]
fn validation_errors_do_not_wait_for_retry() {
    // Default policy would sleep 4 s + 8 s if this were retried.
    let optimizer = RouteOptimizer::new(OptimizerConfig::default()).unwrap();
    let started = Instant::now();
    let result = optimizer.optimize(&["id,lat,lon,time\n1,2,3,4"]);
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn batch_timeout_is_retried_then_reported() {
    let mut config = OptimizerConfig {
        batch_timeout_ms: Some(0),
        worker_threads: Some(2),
        ..OptimizerConfig::with_batch_size(5)
    };
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 2;
    let optimizer = RouteOptimizer::new(config).unwrap();

    let err = optimizer.optimize(&[generated(1, 12)]).unwrap_err();
    assert!(matches!(err, Error::BatchTimeout { batch: 0, .. }), "got {:?}", err);
}

// ============================================================================
// Pipeline
// ============================================================================

struct FailingSource;

impl PayloadSource for FailingSource {
    fn fetch(&self) -> Result<Vec<String>, CollaboratorError> {
        Err("bucket not found".into())
    }
}

struct FailingSink;

impl RouteSink for FailingSink {
    fn store(&mut self, _routes: &[OptimizedRoute]) -> Result<(), CollaboratorError> {
        Err("disk full".into())
    }
}

#[test]
fn pipeline_stores_routes() {
    let source = vec![THREE_DELIVERIES.to_string(), generated(10, 4)];
    let mut sink: Vec<OptimizedRoute> = Vec::new();

    let stored = optimizer(10).run(&source, &mut sink).unwrap();

    assert_eq!(stored, 7);
    assert_eq!(ids(&sink), vec![1, 2, 3, 10, 11, 12, 13]);
}

#[test]
fn pipeline_reports_ingest_failure() {
    let mut sink: Vec<OptimizedRoute> = Vec::new();
    let err = optimizer(10).run(&FailingSource, &mut sink).unwrap_err();
    assert!(matches!(err, Error::Ingest(ref message) if message.contains("bucket")));
    assert!(sink.is_empty());
}

#[test]
fn pipeline_reports_storage_failure() {
    let source = vec![THREE_DELIVERIES.to_string()];
    let err = optimizer(10).run(&source, &mut FailingSink).unwrap_err();
    assert!(matches!(err, Error::Storage(ref message) if message.contains("disk full")));
    assert!(!err.is_transient());
}
