//! # Query Options and Settings
//!
//! Names of the supported query options and the switches that control which
//! of them a service accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::filter::StringFunction;

/// Default maximum number of nodes in a `$filter` tree
pub const DEFAULT_MAX_NODE_COUNT: usize = 100;

/// Maximum nesting of `not` and parentheses in a `$filter` expression
pub const MAX_FILTER_DEPTH: usize = 32;

/// A system query option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOption {
    Select,
    Filter,
    OrderBy,
    Skip,
    Top,
    Count,
}

impl QueryOption {
    /// Canonical `$`-prefixed name
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOption::Select => "$select",
            QueryOption::Filter => "$filter",
            QueryOption::OrderBy => "$orderby",
            QueryOption::Skip => "$skip",
            QueryOption::Top => "$top",
            QueryOption::Count => "$count",
        }
    }

    /// Resolve a query-string key. The `$` prefix is optional.
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix('$').unwrap_or(name);
        match bare {
            "select" => Some(QueryOption::Select),
            "filter" => Some(QueryOption::Filter),
            "orderby" => Some(QueryOption::OrderBy),
            "skip" => Some(QueryOption::Skip),
            "top" => Some(QueryOption::Top),
            "count" => Some(QueryOption::Count),
            _ => None,
        }
    }
}

impl fmt::Display for QueryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which query options are accepted, and their limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Allow `$select`
    #[serde(default = "enabled")]
    pub select: bool,

    /// Allow `$filter`
    #[serde(default = "enabled")]
    pub filter: bool,

    /// Allow `$orderby`
    #[serde(default = "enabled")]
    pub order_by: bool,

    /// Allow `$skip` and `$top`
    #[serde(default = "enabled")]
    pub paging: bool,

    /// Allow `$count`
    #[serde(default = "enabled")]
    pub count: bool,

    /// Largest accepted `$top` (default: unbounded)
    #[serde(default)]
    pub max_top: Option<usize>,

    /// Largest accepted `$filter` tree, in nodes
    #[serde(default = "default_max_node_count")]
    pub max_node_count: usize,

    /// String functions usable in `$filter`
    #[serde(default = "default_functions")]
    pub functions: Vec<StringFunction>,
}

fn enabled() -> bool {
    true
}

fn default_max_node_count() -> usize {
    DEFAULT_MAX_NODE_COUNT
}

fn default_functions() -> Vec<StringFunction> {
    vec![
        StringFunction::Contains,
        StringFunction::StartsWith,
        StringFunction::EndsWith,
    ]
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            select: enabled(),
            filter: enabled(),
            order_by: enabled(),
            paging: enabled(),
            count: enabled(),
            max_top: None,
            max_node_count: default_max_node_count(),
            functions: default_functions(),
        }
    }
}

impl QuerySettings {
    /// Whether `option` may appear in a request
    pub fn is_enabled(&self, option: QueryOption) -> bool {
        match option {
            QueryOption::Select => self.select,
            QueryOption::Filter => self.filter,
            QueryOption::OrderBy => self.order_by,
            QueryOption::Skip | QueryOption::Top => self.paging,
            QueryOption::Count => self.count,
        }
    }

    pub fn allows_function(&self, function: StringFunction) -> bool {
        self.functions.contains(&function)
    }

    /// Validates the settings themselves
    pub fn validate(&self) -> Result<(), String> {
        if self.max_top == Some(0) {
            return Err("max_top must be > 0".into());
        }
        if self.max_node_count == 0 {
            return Err("max_node_count must be > 0".into());
        }
        Ok(())
    }
}
