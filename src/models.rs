use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::QueryError;

/// Decision value that counts as a pass.
pub const PASS_DECISION: &str = "Admis";

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub identifier: i64,
    pub name: Option<String>,
    pub score: f64,
    pub decision: Option<String>,
    pub region: Option<String>,
    pub birthplace: Option<String>,
    pub birthdate: Option<String>,
    /// Every source column in header order, as read.
    pub attributes: Vec<(String, String)>,
}

impl StudentRecord {
    pub fn is_pass(&self) -> bool {
        self.decision.as_deref() == Some(PASS_DECISION)
    }
}

/// A record together with the fields computed at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub record: StudentRecord,
    pub age: Option<i32>,
}

/// Fields a record set can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Region,
    Birthplace,
    Age,
}

impl GroupKey {
    pub fn extract(&self, derived: &DerivedRecord) -> Option<GroupValue> {
        match self {
            GroupKey::Region => derived.record.region.clone().map(GroupValue::Text),
            GroupKey::Birthplace => derived.record.birthplace.clone().map(GroupValue::Text),
            GroupKey::Age => derived.age.map(GroupValue::Age),
        }
    }

    /// Ordinal keys are reported in ascending key order, the rest by group size.
    pub fn is_ordinal(&self) -> bool {
        matches!(self, GroupKey::Age)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Region => "region",
            GroupKey::Birthplace => "birthplace",
            GroupKey::Age => "age",
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKey {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "region" | "wilaya" => Ok(GroupKey::Region),
            "birthplace" | "lieu_naiss" => Ok(GroupKey::Birthplace),
            "age" => Ok(GroupKey::Age),
            _ => Err(QueryError::UnknownGroupKey(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupValue {
    Text(String),
    Age(i32),
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Text(value) => f.write_str(value),
            GroupValue::Age(age) => write!(f, "{age}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pass_count: usize,
    pub pass_rate: f64,
    pub mean_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: GroupValue,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefView {
    pub name: String,
    pub score: f64,
    pub decision: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}
