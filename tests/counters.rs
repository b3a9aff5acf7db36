use std::path::Path;
use telemlab::coerce::Value;
use telemlab::coerce::coerce;
use telemlab::counters::CounterHierarchy;
use telemlab::counters::parse_counters;
use telemlab::counters::parse_counters_file;
use telemlab::error::CounterError;

const SAMPLE: &str = "\
GUID,Description,Port,Iteration,VL,Xmit Pkts,Rcv Pkts
0xd006,edge switch A,57,0,Overall,1000,990
0xd006,edge switch A,57,1,Overall,2000,1985.5
0xd007,core switch B,1,0,Overall,5000,n/a
";

#[test]
fn test_coercion_order() {
  assert_eq!(coerce("42"), Value::Int(42));
  assert_eq!(coerce("-7"), Value::Int(-7));
  assert_eq!(coerce("4.0"), Value::Float(4.0));
  assert_eq!(coerce("1e3"), Value::Float(1000.0));
  assert_eq!(coerce("abc"), Value::Text("abc".to_string()));
  assert_eq!(coerce(""), Value::Text(String::new()));
}

#[test]
fn test_values_land_at_their_coordinates() {
  let parsed = parse_counters(SAMPLE.as_bytes()).unwrap();
  let hierarchy = &parsed.hierarchy;

  assert_eq!(parsed.attributes, vec!["Xmit Pkts", "Rcv Pkts"]);
  assert_eq!(
    hierarchy.get_value("0xd006", "0", "57", "Overall", "Xmit Pkts"),
    Some(&Value::Int(1000))
  );
  assert_eq!(
    hierarchy.get_value("0xd006", "1", "57", "Overall", "Rcv Pkts"),
    Some(&Value::Float(1985.5))
  );
  assert_eq!(
    hierarchy.get_value("0xd007", "0", "1", "Overall", "Rcv Pkts"),
    Some(&Value::Text("n/a".to_string()))
  );
  assert!(parsed.warnings.is_empty());
}

#[test]
fn test_absent_coordinates_are_not_errors() {
  let parsed = parse_counters(SAMPLE.as_bytes()).unwrap();
  let hierarchy = &parsed.hierarchy;

  assert_eq!(hierarchy.get_value("0xffff", "0", "57", "Overall", "Xmit Pkts"), None);
  assert_eq!(hierarchy.get_value("0xd006", "9", "57", "Overall", "Xmit Pkts"), None);
  assert_eq!(hierarchy.get_value("0xd006", "0", "57", "Overall", "Nope"), None);
  assert_eq!(hierarchy.get_description("0xffff"), None);
  assert_eq!(hierarchy.get_description("0xd006"), Some("edge switch A"));
}

#[test]
fn test_missing_vl_header_is_named() {
  let source = "GUID,Description,Port,Iteration,Xmit Pkts\n0xd006,sw,57,0,1000\n";
  let err = parse_counters(source.as_bytes()).unwrap_err();

  match err {
    CounterError::MissingHeaders { missing } => assert_eq!(missing, vec!["VL"]),
    other => panic!("expected MissingHeaders, got {other:?}"),
  }
}

#[test]
fn test_all_missing_headers_are_named() {
  let source = "Xmit Pkts,Rcv Pkts\n1000,990\n";
  let err = parse_counters(source.as_bytes()).unwrap_err();

  match err {
    CounterError::MissingHeaders { missing } => {
      assert_eq!(
        missing,
        vec!["GUID", "Description", "Port", "Iteration", "VL"]
      );
    }
    other => panic!("expected MissingHeaders, got {other:?}"),
  }
}

#[test]
fn test_empty_input_fails() {
  let err = parse_counters("".as_bytes()).unwrap_err();
  assert!(matches!(err, CounterError::EmptyCsv));
}

#[test]
fn test_short_row_is_skipped_with_warning() {
  let source = "\
GUID,Description,Port,Iteration,VL,Xmit Pkts
0xd006,edge switch A,57,0,Overall,1000
0xd006,edge switch A,57,1,Overall
0xd006,edge switch A,57,2,Overall,3000
";
  let parsed = parse_counters(source.as_bytes()).unwrap();

  assert_eq!(parsed.warnings.len(), 1);
  assert!(parsed.warnings.entries()[0].contains("Row 3"));

  // the surrounding rows are unaffected
  assert_eq!(
    parsed.hierarchy.get_value("0xd006", "0", "57", "Overall", "Xmit Pkts"),
    Some(&Value::Int(1000))
  );
  assert_eq!(
    parsed.hierarchy.get_value("0xd006", "1", "57", "Overall", "Xmit Pkts"),
    None
  );
  assert_eq!(
    parsed.hierarchy.get_value("0xd006", "2", "57", "Overall", "Xmit Pkts"),
    Some(&Value::Int(3000))
  );
}

#[test]
fn test_description_conflict_keeps_first_and_warns_once() {
  let source = "\
GUID,Description,Port,Iteration,VL,Xmit Pkts
0xd006,first name,57,0,Overall,1000
0xd006,second name,57,1,Overall,2000
";
  let parsed = parse_counters(source.as_bytes()).unwrap();

  assert_eq!(parsed.hierarchy.get_description("0xd006"), Some("first name"));
  assert_eq!(parsed.warnings.len(), 1);
  assert!(parsed.warnings.entries()[0].contains("first name"));
  assert!(parsed.warnings.entries()[0].contains("second name"));

  // the conflicting row's counters are still merged
  assert_eq!(
    parsed.hierarchy.get_value("0xd006", "1", "57", "Overall", "Xmit Pkts"),
    Some(&Value::Int(2000))
  );
}

#[test]
fn test_available_attributes() {
  let parsed = parse_counters(SAMPLE.as_bytes()).unwrap();
  let attributes = parsed.hierarchy.available_attributes().unwrap();

  assert_eq!(attributes, vec!["Rcv Pkts", "Xmit Pkts"]);
}

#[test]
fn test_available_attributes_on_empty_hierarchy_fails() {
  let err = CounterHierarchy::default().available_attributes().unwrap_err();
  assert!(matches!(err, CounterError::EmptyHierarchy));
}

#[test]
fn test_parse_is_deterministic() {
  let first = parse_counters(SAMPLE.as_bytes()).unwrap();
  let second = parse_counters(SAMPLE.as_bytes()).unwrap();
  assert_eq!(first.hierarchy, second.hierarchy);
  assert_eq!(first.attributes, second.attributes);
}

#[test]
fn test_layout_is_sorted() {
  let parsed = parse_counters_file(Path::new("tests/fixtures/pma.csv")).unwrap();
  let layout = parsed.hierarchy.layout("0xd006").unwrap();

  assert_eq!(layout.iterations, vec!["0", "1"]);
  assert_eq!(layout.ports, vec!["57", "58"]);
  assert_eq!(layout.vls, vec!["0", "Overall"]);
}

#[test]
fn test_missing_file_fails_with_not_found() {
  let err = parse_counters_file(Path::new("does_not_exist.csv")).unwrap_err();
  assert!(matches!(err, CounterError::FileNotFound(_)));
}

#[test]
fn test_fixture_device_count() {
  let parsed = parse_counters_file(Path::new("tests/fixtures/pma.csv")).unwrap();

  assert_eq!(parsed.hierarchy.device_count(), 2);
  assert_eq!(
    parsed.attributes,
    vec!["Xmit Pkts", "Rcv Pkts", "Congestion Discards"]
  );
  assert!(parsed.warnings.is_empty());
}
