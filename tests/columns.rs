use chrono::{FixedOffset, NaiveDate, NaiveTime};
use colcast::{CellValue, ColType, Column, CreationCounter};

const ALL_TYPES: [ColType; 5] = [
    ColType::Text,
    ColType::Int,
    ColType::Float,
    ColType::Date,
    ColType::DateTime,
];

fn round_trip(col: &Column, s: &str) -> String {
    let value = col.from_str(Some(s)).unwrap();
    col.to_str(value.as_ref())
}

#[test]
fn canonical_literals_round_trip_exactly() {
    let cases = [
        (Column::text(), vec!["hello", "  spaced  ", "12"]),
        (Column::int(), vec!["12", "-7", "0", "9223372036854775807"]),
        (
            Column::float(),
            vec![
                "3.14", "1.0", "-0.001", "1e+300", "1e-05", "1e+16", "2.5e-07", "inf", "-inf",
                "nan",
            ],
        ),
        (Column::date(), vec!["2023-04-05", "1999-12-31", "2024-02-29"]),
        (
            Column::datetime(),
            vec![
                "2023-04-05T10:30:00",
                "2023-04-05T10:30:00.250000",
                "2023-04-05T10:30:00+02:00",
                "2023-04-05T23:59:59-05:30",
                "2016-12-31T23:59:60+00:00",
            ],
        ),
    ];

    for (col, literals) in &cases {
        for s in literals {
            assert_eq!(&round_trip(col, s), s, "{col}");
        }
    }
}

#[test]
fn hand_entered_dates_normalize() {
    let date = Column::date();
    for s in ["April 5, 2023", "04/05/2023", "2023/04/05", "5 Apr 2023"] {
        assert_eq!(round_trip(&date, s), "2023-04-05", "{s}");
    }

    let dt = Column::datetime();
    assert_eq!(round_trip(&dt, "2023-04-05 10:30"), "2023-04-05T10:30:00");
    assert_eq!(round_trip(&dt, "2023-04-05"), "2023-04-05T00:00:00");
    assert_eq!(round_trip(&dt, "2023-04-05T10:30:00Z"), "2023-04-05T10:30:00+00:00");
    assert_eq!(
        round_trip(&dt, "Wed, 05 Apr 2023 10:30:00 +0200"),
        "2023-04-05T10:30:00+02:00"
    );
}

#[test]
fn absent_values() {
    let counter = CreationCounter::new();
    for ty in ALL_TYPES {
        let col = Column::with_counter(ty, &counter);
        assert_eq!(col.from_str(Some("")).unwrap(), None);
        assert_eq!(col.from_str(None).unwrap(), None);
        assert_eq!(col.to_str(None), "");
    }
}

#[test]
fn typed_decoding() {
    assert_eq!(
        Column::int().from_str(Some("12")).unwrap(),
        Some(CellValue::Int(12))
    );
    assert!(Column::int().from_str(Some("abc")).is_err());

    #[allow(clippy::approx_constant)]
    let pi_ish = 3.14;
    assert_eq!(
        Column::float().from_str(Some("3.14")).unwrap(),
        Some(CellValue::Float(pi_ish))
    );
    assert_eq!(Column::float().to_str(Some(&CellValue::Float(pi_ish))), "3.14");

    let d = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
    assert_eq!(
        Column::date().from_str(Some("2023-04-05")).unwrap(),
        Some(CellValue::Date(d))
    );
    assert_eq!(Column::date().to_str(Some(&CellValue::Date(d))), "2023-04-05");

    let naive = d.and_time(NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    assert_eq!(
        Column::datetime().from_str(Some("2023-04-05T10:30:00")).unwrap(),
        Some(CellValue::DateTime(naive))
    );

    let zoned = naive
        .and_local_timezone(FixedOffset::east_opt(3600).unwrap())
        .unwrap();
    assert_eq!(
        Column::datetime()
            .from_str(Some("2023-04-05T10:30:00+01:00"))
            .unwrap(),
        Some(CellValue::DateTimeTz(zoned))
    );
}

#[test]
fn conversion_errors_carry_input_and_target() {
    let err = Column::date().from_str(Some("not-a-date")).unwrap_err();
    assert_eq!(err.target, ColType::Date);
    assert_eq!(err.input, "not-a-date");

    let err = Column::float().from_str(Some("1,5")).unwrap_err();
    assert_eq!(err.target, ColType::Float);

    let err = Column::datetime().from_str(Some("yesterday")).unwrap_err();
    assert_eq!(err.target, ColType::DateTime);
}

#[test]
fn creation_order_follows_construction() {
    let counter = CreationCounter::new();
    let a = Column::with_counter(ColType::Text, &counter);
    let b = Column::with_counter(ColType::Int, &counter);
    let c = Column::with_counter(ColType::Float, &counter);
    assert!(a.creation_order() < b.creation_order());
    assert!(b.creation_order() < c.creation_order());

    let b2 = b.clone();
    assert_eq!(b2.creation_order(), b.creation_order());
}

#[test]
fn global_counter_is_monotonic() {
    let a = Column::int();
    let b = Column::int();
    assert!(a.creation_order() < b.creation_order());
}

#[test]
fn global_counter_is_unique_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                (0..100)
                    .map(|_| Column::text().creation_order())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut orders: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    orders.sort_unstable();
    orders.dedup();
    assert_eq!(orders.len(), 400);
}

#[test]
fn explicit_creation_order() {
    let col = Column::with_creation_order(ColType::Date, 42).with_label("due");
    assert_eq!(col.creation_order(), 42);
    assert_eq!(col.to_string(), "DateColumn(label=due)");
}

#[test]
fn verbose_name_defaults_to_label() {
    let counter = CreationCounter::new();
    for ty in ALL_TYPES {
        let col = Column::with_counter(ty, &counter).with_label("amount");
        assert_eq!(col.verbose_name(), "amount");

        let col = col.with_verbose_name("Total amount");
        assert_eq!(col.verbose_name(), "Total amount");
        assert_eq!(col.label(), Some("amount"));
    }
}
