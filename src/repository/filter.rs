//! Search filters shared by the list queries.
//!
//! A [`Filter`] is a disjunction of branches, each branch a conjunction of
//! [`Condition`]s. An empty filter matches every record.

/// A single column predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Case-insensitive substring match on a text column
    Contains { column: &'static str, needle: String },
    /// Exact match on an integer column
    Equals { column: &'static str, value: i32 },
}

/// Value bound to a placeholder produced by [`Filter::to_sql`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i32),
}

/// Borrowed column value exposed by a [`Filterable`] record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Int(i32),
}

/// Records that can be matched against a [`Filter`] in memory
pub trait Filterable {
    /// Value of `column`, or `None` when the column is null or unknown
    fn field(&self, column: &str) -> Option<FieldValue<'_>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    branches: Vec<Vec<Condition>>,
}

impl Filter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// One branch per column, each requiring the column to contain `needle`
    pub fn any_contains(columns: &[&'static str], needle: &str) -> Self {
        Self {
            branches: columns
                .iter()
                .map(|column| {
                    vec![Condition::Contains {
                        column: *column,
                        needle: needle.to_string(),
                    }]
                })
                .collect(),
        }
    }

    /// AND an equality onto every branch.
    ///
    /// On an empty filter this creates a single branch, so the equality is
    /// never lost when combined with a search.
    pub fn and_equals(mut self, column: &'static str, value: i32) -> Self {
        let condition = Condition::Equals { column, value };
        if self.branches.is_empty() {
            self.branches.push(vec![condition]);
        } else {
            for branch in &mut self.branches {
                branch.push(condition.clone());
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Render a `WHERE` clause body with `$n` placeholders starting at
    /// `first_param`.
    ///
    /// `qualifier` prefixes every column (e.g. `"b."`). An empty filter
    /// renders as `TRUE`.
    pub fn to_sql(&self, qualifier: &str, first_param: usize) -> (String, Vec<SqlParam>) {
        if self.branches.is_empty() {
            return ("TRUE".to_string(), Vec::new());
        }

        let mut idx = first_param;
        let mut params = Vec::new();
        let branches: Vec<String> = self
            .branches
            .iter()
            .map(|branch| {
                let parts: Vec<String> = branch
                    .iter()
                    .map(|condition| {
                        let sql = match condition {
                            Condition::Contains { column, needle } => {
                                params.push(SqlParam::Text(format!("%{}%", escape_like(needle))));
                                format!("{}{} ILIKE ${} ESCAPE '\\'", qualifier, column, idx)
                            }
                            Condition::Equals { column, value } => {
                                params.push(SqlParam::Int(*value));
                                format!("{}{} = ${}", qualifier, column, idx)
                            }
                        };
                        idx += 1;
                        sql
                    })
                    .collect();
                format!("({})", parts.join(" AND "))
            })
            .collect();

        (branches.join(" OR "), params)
    }

    /// Evaluate the filter against an in-memory record
    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        if self.branches.is_empty() {
            return true;
        }
        self.branches.iter().any(|branch| {
            branch.iter().all(|condition| match condition {
                Condition::Contains { column, needle } => match record.field(column) {
                    Some(FieldValue::Text(text)) => {
                        text.to_lowercase().contains(&needle.to_lowercase())
                    }
                    _ => false,
                },
                Condition::Equals { column, value } => {
                    matches!(record.field(column), Some(FieldValue::Int(v)) if v == *value)
                }
            })
        })
    }
}

/// Escape LIKE wildcards so the needle is matched literally
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
