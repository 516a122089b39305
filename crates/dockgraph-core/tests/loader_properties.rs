use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use dockgraph_core::UserType;
use dockgraph_core::load::read_trips;
use proptest::prelude::*;

const HEADER: &str = "started_at,start_station_id,start_station_name,end_station_id,end_station_name,member_casual";

fn station_id() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[0-9]{4}\\.[0-9]{2}",
        1 => Just(String::new()),
    ]
}

fn rider() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("member"), Just("casual"), Just("Subscriber"), Just("")]
}

fn rows() -> impl Strategy<Value = Vec<(String, String, &'static str)>> {
    prop::collection::vec((station_id(), station_id(), rider()), 0..40)
}

fn render(rows: &[(String, String, &str)]) -> String {
    let mut csv = format!("{HEADER}\n");
    for (start, end, rider) in rows {
        writeln!(csv, "2022-06-01 08:00:00,{start},Dock {start},{end},Dock {end},{rider}")
            .expect("write to string");
    }
    csv
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_row_with_a_timestamp_becomes_a_record(rows in rows()) {
        let loaded = read_trips(render(&rows).as_bytes(), Path::new("prop.csv")).expect("load");

        prop_assert_eq!(loaded.trips.len(), rows.len());
        prop_assert_eq!(loaded.unreadable_rows, 0);

        let well_formed = rows.iter().filter(|(s, e, _)| !s.is_empty() && !e.is_empty()).count();
        prop_assert_eq!(loaded.trips.iter().filter(|t| t.is_well_formed()).count(), well_formed);
    }

    #[test]
    fn directory_holds_every_named_station(rows in rows()) {
        let loaded = read_trips(render(&rows).as_bytes(), Path::new("prop.csv")).expect("load");

        let expected: BTreeSet<&str> = rows
            .iter()
            .flat_map(|(s, e, _)| [s.as_str(), e.as_str()])
            .filter(|id| !id.is_empty())
            .collect();
        let actual: BTreeSet<&str> = loaded.stations.iter().map(|s| s.id.as_str()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn user_type_parsing_never_fails(raw in "\\PC{0,12}") {
        let parsed: UserType = raw.parse().expect("infallible");
        prop_assert!(matches!(parsed, UserType::Member | UserType::Casual | UserType::Unknown));
    }
}
