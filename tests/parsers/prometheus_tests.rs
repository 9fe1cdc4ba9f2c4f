//! Tests for the prometheus range query parser

use yeri::parsers::{Prometheus, SourceError};

#[test]
fn test_parse_api_envelope() {
    let json = br#"{
        "status": "success",
        "data": {
            "resultType": "matrix",
            "result": [
                {
                    "metric": {"__name__": "node_load1", "instance": "a:9100", "job": "node"},
                    "values": [[1500000000, "0.5"], [1500000015.5, "0.75"], [1500000030, "NaN"]]
                }
            ]
        }
    }"#;
    let series = Prometheus::parse(json).expect("parse");
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].name, r#"node_load1{instance="a:9100",job="node"}"#);
    assert_eq!(
        series[0].to_vec(),
        vec![(1500000000, Some(0.5)), (1500000015, Some(0.75)), (1500000030, None)]
    );
}

#[test]
fn test_parse_bare_matrix() {
    let json = br#"{"resultType": "matrix", "result": [
        {"metric": {"__name__": "up"}, "values": [[10, "1"]]},
        {"metric": {"job": "api"}, "values": [[10, "+Inf"], [20, "oops"]]}
    ]}"#;
    let series = Prometheus::parse(json).expect("parse");
    assert_eq!(series[0].name, "up");
    assert_eq!(series[0].to_vec(), vec![(10, Some(1.0))]);
    assert_eq!(series[1].name, r#"{job="api"}"#);
    assert_eq!(series[1].values, vec![None, None]);
}

#[test]
fn test_scalar_is_unsupported() {
    let json = br#"{"status": "success", "data": {"resultType": "scalar", "result": []}}"#;
    let err = Prometheus::parse(json).expect_err("scalar");
    assert!(matches!(err, SourceError::UnsupportedResultType(ref t) if t == "scalar"));
    assert!(err.to_string().contains("scalar"));
}

#[test]
fn test_not_a_query_result() {
    assert!(matches!(
        Prometheus::parse(br#"{"hello": "world"}"#),
        Err(SourceError::Json(_))
    ));
}
