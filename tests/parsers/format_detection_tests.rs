//! Format detection and loading through the shared entry point

use yeri::parsers::{self, Format, SourceError};

use crate::common::rrd_builder::RrdBuilder;

fn rrd() -> Vec<u8> {
    RrdBuilder::new(10, 1000)
        .source("temp", "GAUGE")
        .archive_values("AVERAGE", 1, 1, &[20.0, 21.0, 22.0])
        .archive_values("MAX", 1, 0, &[25.0, 26.0, 27.0])
        .archive_values("AVERAGE", 3, 0, &[20.5, 21.5, 22.5])
        .build()
}

#[test]
fn test_detect() {
    assert_eq!(Format::detect(&rrd()), Format::Rrd);
    assert_eq!(Format::detect(b"\n  [{\"target\": \"x\"}]"), Format::Graphite);
    assert_eq!(Format::detect(b"{\"resultType\": \"matrix\"}"), Format::Prometheus);
    assert_eq!(Format::detect(b"timestamp,value\n"), Format::Unknown);
    assert_eq!(Format::detect(b""), Format::Unknown);
}

#[test]
fn test_format_names() {
    assert_eq!(Format::Rrd.to_string(), "Rrd");
    assert_eq!(Format::Prometheus.as_ref(), "Prometheus");
}

#[test]
fn test_load_rrd_default_window() {
    let series = parsers::load(&rrd(), None).expect("load");
    let names: Vec<&str> = series.iter().map(|ts| ts.name.as_str()).collect();
    assert_eq!(names, vec!["temp:AVERAGE", "temp:MAX"]);
    assert_eq!(series[0].to_vec(), vec![(980, Some(20.0)), (990, Some(21.0)), (1000, Some(22.0))]);
    assert_eq!(series[1].values, vec![Some(25.0), Some(26.0), Some(27.0)]);
}

#[test]
fn test_load_rrd_window() {
    let series = parsers::load(&rrd(), Some((990, 1000))).expect("load");
    assert_eq!(series[0].to_vec(), vec![(990, Some(21.0))]);
}

#[test]
fn test_load_json() {
    let graphite = parsers::load(br#"[{"target": "a", "datapoints": [[1, 5]]}]"#, None).expect("load");
    assert_eq!(graphite[0].name, "a");

    let prometheus = parsers::load(
        br#"{"resultType": "matrix", "result": [{"metric": {"__name__": "b"}, "values": [[5, "2"]]}]}"#,
        None,
    )
    .expect("load");
    assert_eq!(prometheus[0].to_vec(), vec![(5, Some(2.0))]);
}

#[test]
fn test_load_json_window() {
    let json = br#"[{"target": "a", "datapoints": [[1, 0], [2, 60], [3, 120], [4, 180]]}]"#;
    let trimmed = parsers::load(json, Some((60, 180))).expect("load");
    assert_eq!(trimmed[0].name, "a");
    assert_eq!(trimmed[0].to_vec(), vec![(60, Some(2.0)), (120, Some(3.0))]);

    let prometheus = parsers::load(
        br#"{"resultType": "matrix", "result": [{"metric": {"__name__": "b"}, "values": [[5, "2"], [15, "3"]]}]}"#,
        Some((10, i64::MAX)),
    )
    .expect("load");
    assert_eq!(prometheus[0].to_vec(), vec![(15, Some(3.0))]);
}

#[test]
fn test_load_unknown() {
    assert!(matches!(parsers::load(b"hello", None), Err(SourceError::UnknownFormat)));
}

#[test]
fn test_load_broken_rrd() {
    let mut data = rrd();
    data.truncate(40);
    assert!(matches!(parsers::load(&data, None), Err(SourceError::Rrd(_))));
}
