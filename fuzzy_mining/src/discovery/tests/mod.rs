use crate::{core::io::Importable, utils::test_utils::get_test_data_path, EventLog};


fn repair_example() -> EventLog {
    EventLog::import_from_path(get_test_data_path().join("repair_example.csv")).unwrap()
}

#[test]
fn test_repair_example_import() {
    let log = repair_example();
    assert_eq!(log.num_cases(), 6);
    assert_eq!(log.activities.len(), 8);
    assert_eq!(log.max_trace_len(), 9);
}
