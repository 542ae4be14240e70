//! Query Shaping Tests
//!
//! End-to-end behaviour of `QueryDescriptor::parse` + `QueryShaper::apply`:
//! - An empty query returns the collection unchanged
//! - Filter keeps a subsequence in source order
//! - Order by is stable
//! - Select is a pure projection
//! - Skip/top obey the pagination laws
//! - Invalid options fail before any result is produced

use std::sync::OnceLock;

use roster::query::{QueryDescriptor, QueryError, QuerySettings, QueryShaper};
use roster::schema::{EntitySchema, FieldType, Record};
use roster::store::{Entity, RecordStore, StudentStore};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Minimal entity with an int, a string and a nullable year.
#[derive(Debug, Clone)]
struct Course {
    id: i64,
    name: &'static str,
    year: Option<i64>,
}

impl Entity for Course {
    fn schema() -> &'static EntitySchema {
        static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            EntitySchema::new("Course")
                .with_field("id", FieldType::Int)
                .with_field("name", FieldType::String)
                .with_field("year", FieldType::Int)
        })
    }

    fn to_record(&self) -> Record {
        match json!({"id": self.id, "name": self.name, "year": self.year}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }
}

fn course(id: i64, name: &'static str, year: i64) -> Course {
    Course {
        id,
        name,
        year: Some(year),
    }
}

fn courses() -> Vec<Course> {
    vec![
        course(1, "A", 2020),
        course(2, "B", 2019),
        course(3, "C", 2020),
    ]
}

fn shape<E: Entity>(entities: &[E], params: &[(&str, &str)]) -> Result<Value, QueryError> {
    let query = QueryDescriptor::parse(params.iter().copied())?;
    let shaped = QueryShaper::default().apply(entities, &query)?;
    Ok(serde_json::to_value(shaped).unwrap())
}

fn students(params: &[(&str, &str)]) -> Result<Value, QueryError> {
    shape(StudentStore::seeded().get_all(), params)
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

// =============================================================================
// Pipeline Tests
// =============================================================================

/// Filter, order by and select compose in that order.
#[test]
fn test_filter_order_select_example() {
    let result = shape(
        &courses(),
        &[
            ("$filter", "year eq 2020"),
            ("$orderby", "name desc"),
            ("$select", "id,name"),
        ],
    )
    .unwrap();

    assert_eq!(
        result,
        json!([{"id": 3, "name": "C"}, {"id": 1, "name": "A"}])
    );
}

/// No options: every record, every field, source order.
#[test]
fn test_empty_query_is_identity() {
    let result = shape(&courses(), &[]).unwrap();
    assert_eq!(
        result,
        json!([
            {"id": 1, "name": "A", "year": 2020},
            {"id": 2, "name": "B", "year": 2019},
            {"id": 3, "name": "C", "year": 2020}
        ])
    );
}

/// Custom (non-`$`) query parameters are ignored.
#[test]
fn test_custom_parameters_ignored() {
    let result = shape(&courses(), &[("api-version", "2"), ("$top", "1")]).unwrap();
    assert_eq!(ids(&result), vec![1]);
}

/// The `$` prefix is optional.
#[test]
fn test_options_without_prefix() {
    let result = shape(&courses(), &[("filter", "year lt 2020"), ("select", "id")]).unwrap();
    assert_eq!(result, json!([{"id": 2}]));
}

// =============================================================================
// Filter Tests
// =============================================================================

/// A filter that matches nothing yields an empty array, not an error.
#[test]
fn test_filter_without_matches_is_empty() {
    let result = shape(&courses(), &[("$filter", "year eq 5000")]).unwrap();
    assert_eq!(result, json!([]));
}

/// Filtered records keep their source order.
#[test]
fn test_filter_preserves_order() {
    let result = students(&[("$filter", "gpa ge 3.2")]).unwrap();
    assert_eq!(ids(&result), vec![1, 3, 5, 6]);
}

#[test]
fn test_filter_boolean_logic() {
    let result = students(&[(
        "$filter",
        "(gpa gt 3.6 or enrollment_date lt 2019-01-01) and not (id eq 3)",
    )])
    .unwrap();
    assert_eq!(ids(&result), vec![1, 4]);
}

/// `and` binds tighter than `or`.
#[test]
fn test_filter_precedence() {
    let result = students(&[("$filter", "id eq 1 or id eq 2 and active eq false")]).unwrap();
    assert_eq!(ids(&result), vec![1]);
}

#[test]
fn test_filter_string_functions() {
    let result = students(&[("$filter", "contains(name,'ar')")]).unwrap();
    assert_eq!(ids(&result), vec![2, 6]);

    let result = students(&[("$filter", "startswith(name,'E') or endswith(name,'Kim')")]).unwrap();
    assert_eq!(ids(&result), vec![4, 5]);
}

/// Quotes inside string literals are escaped by doubling.
#[test]
fn test_filter_escaped_quote() {
    let result = students(&[("$filter", "name eq 'Chloe O''Neil'"), ("$select", "id")]).unwrap();
    assert_eq!(result, json!([{"id": 3}]));
}

/// Integer literals compare against float fields.
#[test]
fn test_filter_numeric_promotion() {
    let result = students(&[("$filter", "gpa lt 3")]).unwrap();
    assert_eq!(ids(&result), vec![4]);
}

/// `le` includes the boundary value.
#[test]
fn test_filter_less_or_equal() {
    let result = students(&[("$filter", "gpa le 3.1")]).unwrap();
    assert_eq!(ids(&result), vec![2, 4]);

    let result = shape(&courses(), &[("$filter", "year le 2019")]).unwrap();
    assert_eq!(ids(&result), vec![2]);
}

#[test]
fn test_filter_not_equal_value() {
    let result = students(&[("$filter", "id ne 3")]).unwrap();
    assert_eq!(ids(&result), vec![1, 2, 4, 5, 6]);

    let result = students(&[("$filter", "name ne 'Alice Johnson' and active ne false")]).unwrap();
    assert_eq!(ids(&result), vec![2, 3, 5]);
}

/// Two fields of compatible types compare against each other per record.
#[test]
fn test_filter_field_to_field() {
    let result = students(&[("$filter", "gpa gt id")]).unwrap();
    assert_eq!(ids(&result), vec![1, 2, 3]);

    let result = students(&[("$filter", "id le gpa")]).unwrap();
    assert_eq!(ids(&result), vec![1, 2, 3]);

    let result = students(&[("$filter", "enrollment_date eq enrollment_date")]).unwrap();
    assert_eq!(ids(&result), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_filter_field_to_field_type_mismatch() {
    let err = students(&[("$filter", "name eq id")]).unwrap_err();
    assert_eq!(err.option(), "$filter");

    let err = students(&[("$filter", "active lt enrollment_date")]).unwrap_err();
    assert_eq!(err.option(), "$filter");
}

/// `eq null` matches missing values; ordering never matches null.
#[test]
fn test_filter_null_semantics() {
    let mut data = courses();
    data.push(Course {
        id: 4,
        name: "D",
        year: None,
    });

    let result = shape(&data, &[("$filter", "year eq null")]).unwrap();
    assert_eq!(ids(&result), vec![4]);

    let result = shape(&data, &[("$filter", "year ne null")]).unwrap();
    assert_eq!(ids(&result), vec![1, 2, 3]);

    let result = shape(&data, &[("$filter", "not (year gt 2019)")]).unwrap();
    assert_eq!(ids(&result), vec![2, 4]);
}

// =============================================================================
// Order By Tests
// =============================================================================

/// Equal keys keep their relative input order.
#[test]
fn test_order_by_is_stable() {
    let result = shape(&courses(), &[("$orderby", "year")]).unwrap();
    assert_eq!(ids(&result), vec![2, 1, 3]);

    let result = shape(&courses(), &[("$orderby", "year desc")]).unwrap();
    assert_eq!(ids(&result), vec![1, 3, 2]);
}

/// Nulls sort before every value.
#[test]
fn test_order_by_nulls_first() {
    let mut data = courses();
    data.push(Course {
        id: 4,
        name: "D",
        year: None,
    });

    let result = shape(&data, &[("$orderby", "year asc,id")]).unwrap();
    assert_eq!(ids(&result), vec![4, 2, 1, 3]);
}

#[test]
fn test_order_by_string_and_date() {
    let result = students(&[("$orderby", "name desc"), ("$top", "2")]).unwrap();
    assert_eq!(ids(&result), vec![6, 5]);

    let result = students(&[("$orderby", "enrollment_date desc"), ("$top", "1")]).unwrap();
    assert_eq!(ids(&result), vec![5]);
}

// =============================================================================
// Select Tests
// =============================================================================

/// Projection keeps exactly the requested fields.
#[test]
fn test_select_is_projection() {
    let result = students(&[("$select", "gpa,id")]).unwrap();
    for record in result.as_array().unwrap() {
        let keys: Vec<_> = record.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "gpa"]);
    }
    assert_eq!(result.as_array().unwrap().len(), 6);
}

#[test]
fn test_select_star() {
    let result = shape(&courses(), &[("$select", "*"), ("$top", "1")]).unwrap();
    assert_eq!(result, json!([{"id": 1, "name": "A", "year": 2020}]));
}

// =============================================================================
// Pagination Tests
// =============================================================================

/// skip(a) then skip(b) equals skip(a + b); top(n) caps the length.
#[test]
fn test_pagination_laws() {
    let all = ids(&students(&[]).unwrap());

    for skip in 0..=7usize {
        for top in 0..=7usize {
            let (skip_s, top_s) = (skip.to_string(), top.to_string());
            let page = ids(&students(&[("$skip", skip_s.as_str()), ("$top", top_s.as_str())]).unwrap());
            let expected: Vec<i64> = all.iter().copied().skip(skip).take(top).collect();
            assert_eq!(page, expected, "skip={} top={}", skip, top);
        }
    }
}

#[test]
fn test_skip_past_end_is_empty() {
    assert_eq!(students(&[("$skip", "6")]).unwrap(), json!([]));
}

/// `$count` reports the filtered size before paging.
#[test]
fn test_count_envelope() {
    let result = students(&[
        ("$filter", "active"),
        ("$orderby", "id desc"),
        ("$top", "2"),
        ("$select", "id"),
        ("$count", "true"),
    ])
    .unwrap();

    assert_eq!(
        result,
        json!({"@odata.count": 4, "value": [{"id": 5}, {"id": 3}]})
    );
}

#[test]
fn test_count_false_is_bare_array() {
    let result = students(&[("$count", "false"), ("$top", "1"), ("$select", "id")]).unwrap();
    assert_eq!(result, json!([{"id": 1}]));
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_unknown_order_by_field() {
    let err = shape(&courses(), &[("$orderby", "bogusField")]).unwrap_err();
    assert_eq!(err.code(), "InvalidQuery");
    assert_eq!(err.option(), "$orderby");
    assert!(err.message().contains("bogusField"));
}

#[test]
fn test_invalid_options_rejected() {
    let cases: &[(&str, &str, &str)] = &[
        ("$top", "-1", "$top"),
        ("$skip", "abc", "$skip"),
        ("$filter", "gpa gt", "$filter"),
        ("$filter", "name gt 3", "$filter"),
        ("$filter", "surname eq 'x'", "$filter"),
        ("$filter", "gpa gt null", "$filter"),
        ("$filter", "contains(gpa,'3')", "$filter"),
        ("$filter", "length(name) eq 3", "$filter"),
        ("$select", "id,,name", "$select"),
        ("$select", "nickname", "$select"),
        ("$orderby", "name sideways", "$orderby"),
        ("$count", "yes", "$count"),
        ("$expand", "courses", "$expand"),
    ];

    for (key, value, option) in cases {
        let err = students(&[(*key, *value)]).unwrap_err();
        assert_eq!(err.option(), *option, "{}={}", key, value);
    }
}

#[test]
fn test_repeated_option_rejected() {
    let err = students(&[("$top", "1"), ("top", "2")]).unwrap_err();
    assert_eq!(err.option(), "$top");
}

/// Disabled options are rejected even when otherwise valid.
#[test]
fn test_settings_restrict_options() {
    let settings = QuerySettings {
        filter: false,
        max_top: Some(3),
        ..Default::default()
    };
    let shaper = QueryShaper::new(settings);
    let store = StudentStore::seeded();

    let query = QueryDescriptor::parse([("$filter", "active")]).unwrap();
    let err = shaper.apply(store.get_all(), &query).unwrap_err();
    assert_eq!(err.option(), "$filter");

    let query = QueryDescriptor::parse([("$top", "4")]).unwrap();
    assert!(shaper.apply(store.get_all(), &query).is_err());

    let query = QueryDescriptor::parse([("$top", "3")]).unwrap();
    assert_eq!(shaper.apply(store.get_all(), &query).unwrap().len(), 3);
}
