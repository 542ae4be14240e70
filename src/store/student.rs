//! Student entity and its in-memory store

use std::sync::OnceLock;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Entity, RecordStore};
use crate::schema::{EntitySchema, FieldType, Record};

/// A student record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub enrollment_date: NaiveDate,
    pub gpa: f64,
    pub active: bool,
}

impl Student {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        enrollment_date: NaiveDate,
        gpa: f64,
        active: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            enrollment_date,
            gpa,
            active,
        }
    }
}

impl Entity for Student {
    fn schema() -> &'static EntitySchema {
        static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            EntitySchema::new("Student")
                .with_field("id", FieldType::Int)
                .with_field("name", FieldType::String)
                .with_field("enrollment_date", FieldType::Date)
                .with_field("gpa", FieldType::Float)
                .with_field("active", FieldType::Bool)
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("id".into(), json!(self.id));
        record.insert("name".into(), json!(self.name));
        record.insert(
            "enrollment_date".into(),
            json!(self.enrollment_date.format("%Y-%m-%d").to_string()),
        );
        record.insert("gpa".into(), json!(self.gpa));
        record.insert("active".into(), json!(self.active));
        record
    }
}

/// In-memory student store, populated once at construction
#[derive(Debug, Clone, Default)]
pub struct StudentStore {
    students: Vec<Student>,
}

impl StudentStore {
    /// Create a store holding exactly `students`, in the given order
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    /// Create a store with the fixed demonstration roster
    pub fn seeded() -> Self {
        Self::new(seed_students())
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

impl RecordStore for StudentStore {
    type Entity = Student;

    fn get_all(&self) -> &[Student] {
        &self.students
    }
}

fn seed_students() -> Vec<Student> {
    [
        (1, "Alice Johnson", (2019, 9, 2), 3.7, true),
        (2, "Bob Martinez", (2020, 9, 1), 3.1, true),
        (3, "Chloe O'Neil", (2020, 1, 15), 3.9, true),
        (4, "David Kim", (2018, 9, 4), 2.8, false),
        (5, "Elena Petrova", (2021, 9, 1), 3.5, true),
        (6, "Farid Haddad", (2019, 9, 2), 3.2, false),
    ]
    .into_iter()
    .filter_map(|(id, name, (y, m, d), gpa, active)| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| Student::new(id, name, date, gpa, active))
    })
    .collect()
}
