//! # Query Shaper
//!
//! Applies a [`QueryDescriptor`] to an entity sequence in a fixed order:
//! filter, order by, select, then skip/top.
//!
//! Shaping happens in two steps. Binding checks every option against the
//! service settings and the entity schema and is the only step that can
//! fail. Evaluation of a bound query is infallible, so a caller gets either a
//! fully shaped result or an error, never a mixture.

use std::cmp::Ordering;

use super::errors::{QueryError, QueryResult};
use super::filter::{FilterExpr, Scalar};
use super::options::{QueryOption, QuerySettings};
use super::parser::{OrderBy, QueryDescriptor, Selection, SortDirection};
use super::response::Shaped;
use crate::schema::{EntitySchema, FieldType, Record};
use crate::store::Entity;

/// Applies query options to in-memory entity sequences.
///
/// Holds only immutable settings; one shaper is shared by all requests.
#[derive(Debug, Clone, Default)]
pub struct QueryShaper {
    settings: QuerySettings,
}

impl QueryShaper {
    pub fn new(settings: QuerySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Shape `entities` according to `query`.
    ///
    /// The source slice is never modified.
    pub fn apply<E: Entity>(&self, entities: &[E], query: &QueryDescriptor) -> QueryResult<Shaped> {
        let bound = self.bind(E::schema(), query)?;
        Ok(bound.evaluate(entities))
    }

    /// Validate `query` against the settings and `schema`.
    fn bind<'q>(
        &self,
        schema: &'q EntitySchema,
        query: &'q QueryDescriptor,
    ) -> QueryResult<BoundQuery<'q>> {
        for option in query.options() {
            if !self.settings.is_enabled(option) {
                return Err(QueryError::invalid(option, "query option is not allowed"));
            }
        }

        if let (Some(top), Some(max_top)) = (query.top, self.settings.max_top) {
            if top > max_top {
                return Err(QueryError::invalid(
                    QueryOption::Top,
                    format!("{} exceeds the maximum of {}", top, max_top),
                ));
            }
        }

        if let Some(filter) = &query.filter {
            let nodes = filter.node_count();
            if nodes > self.settings.max_node_count {
                return Err(QueryError::invalid(
                    QueryOption::Filter,
                    format!(
                        "expression has {} nodes, the maximum is {}",
                        nodes, self.settings.max_node_count
                    ),
                ));
            }
            filter.validate(schema, &self.settings)?;
        }

        let mut sort_keys = Vec::new();
        for clause in query.order_by.iter().flatten() {
            let field_type = schema.field_type(&clause.field).ok_or_else(|| {
                QueryError::invalid(
                    QueryOption::OrderBy,
                    format!("unknown field '{}' on {}", clause.field, schema.name),
                )
            })?;
            sort_keys.push((clause, field_type));
        }

        let projection = match &query.select {
            None | Some(Selection::All) => None,
            Some(Selection::Fields(fields)) => {
                if let Some(unknown) = fields.iter().find(|f| !schema.contains(f)) {
                    return Err(QueryError::invalid(
                        QueryOption::Select,
                        format!("unknown field '{}' on {}", unknown, schema.name),
                    ));
                }
                Some(fields.as_slice())
            }
        };

        Ok(BoundQuery {
            schema,
            filter: query.filter.as_ref(),
            sort_keys,
            projection,
            skip: query.skip.unwrap_or(0),
            top: query.top,
            count: query.count.unwrap_or(false),
        })
    }
}

/// A query that has passed validation against one schema
struct BoundQuery<'q> {
    schema: &'q EntitySchema,
    filter: Option<&'q FilterExpr>,
    sort_keys: Vec<(&'q OrderBy, FieldType)>,
    projection: Option<&'q [String]>,
    skip: usize,
    top: Option<usize>,
    count: bool,
}

impl BoundQuery<'_> {
    fn evaluate<E: Entity>(&self, entities: &[E]) -> Shaped {
        let matched: Vec<Record> = entities
            .iter()
            .map(E::to_record)
            .filter(|record| self.filter.map_or(true, |f| f.matches(record, self.schema)))
            .collect();
        let total = matched.len();

        let ordered = if self.sort_keys.is_empty() {
            matched
        } else {
            self.sort(matched)
        };

        // Projecting only the returned page gives the same records as
        // projecting before paging.
        let records = ordered
            .into_iter()
            .skip(self.skip)
            .take(self.top.unwrap_or(usize::MAX))
            .map(|record| self.project(record))
            .collect();

        Shaped {
            records,
            count: self.count.then_some(total),
        }
    }

    /// Stable multi-key sort; ties keep their input order.
    fn sort(&self, records: Vec<Record>) -> Vec<Record> {
        let mut keyed: Vec<(Vec<Scalar>, Record)> = records
            .into_iter()
            .map(|record| {
                let key = self
                    .sort_keys
                    .iter()
                    .map(|(clause, field_type)| {
                        Scalar::from_json(record.get(&clause.field), *field_type)
                    })
                    .collect();
                (key, record)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| self.compare_keys(a, b));
        keyed.into_iter().map(|(_, record)| record).collect()
    }

    fn compare_keys(&self, a: &[Scalar], b: &[Scalar]) -> Ordering {
        for (((clause, _), a), b) in self.sort_keys.iter().zip(a).zip(b) {
            let ordering = match clause.direction {
                SortDirection::Asc => a.sort_cmp(b),
                SortDirection::Desc => a.sort_cmp(b).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn project(&self, record: Record) -> Record {
        match self.projection {
            None => record,
            Some(fields) => record
                .into_iter()
                .filter(|(name, _)| fields.contains(name))
                .collect(),
        }
    }
}
