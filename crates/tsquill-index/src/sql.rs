//! SQL generation for vector maintenance and search.
//!
//! Everything here is pure string building. Identifiers come from a
//! validated [`EntityVectors`]; user input only ever reaches the database
//! as a bound parameter.

use std::fmt;

use tsquill_core::{Error, Result, SqlValue};

use crate::config::{ColumnRef, EntityVectors, FieldGroup, VectorDef};

/// Default `ts_rank` weights in `{D, C, B, A}` order.
pub const DEFAULT_RANK_WEIGHTS: [f64; 4] = [0.1, 0.2, 0.4, 1.0];

/// Alias of the rank column in search results.
pub const RANK_COLUMN: &str = "tsearch_rank";

/// Alias of the count column in count results.
pub const COUNT_COLUMN: &str = "tsearch_count";

/// Alias of the parsed query in the FROM list.
const QUERY_ALIAS: &str = "tsearch_query";

// ============================================================================
// Weights
// ============================================================================

/// One of the four tsvector weight labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeightLabel {
    A,
    B,
    C,
    D,
}

impl WeightLabel {
    const ORDERED: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// The label character used by `setweight`.
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    /// Position in the `ts_rank` weights array (`{D, C, B, A}`).
    fn rank_slot(self) -> usize {
        match self {
            Self::D => 0,
            Self::C => 1,
            Self::B => 2,
            Self::A => 3,
        }
    }
}

impl fmt::Display for WeightLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Mapping from a vector's group weights to labels and rank weights.
///
/// Distinct weights, highest first, take labels A, B, C, D; the fourth and
/// lower share D. Each used label's rank weight is its highest group weight
/// divided by the vector's highest weight; unused labels keep
/// [`DEFAULT_RANK_WEIGHTS`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeightScheme {
    labels: Vec<WeightLabel>,
    rank_weights: [f64; 4],
}

impl WeightScheme {
    /// Compute the scheme for a vector's groups.
    pub fn for_groups(groups: &[FieldGroup]) -> Self {
        let mut distinct: Vec<f64> = groups.iter().map(|g| g.weight).collect();
        distinct.sort_by(|a, b| b.total_cmp(a));
        distinct.dedup();

        let max = distinct.first().copied().unwrap_or(1.0);
        let mut rank_weights = DEFAULT_RANK_WEIGHTS;
        let mut assigned = [false; 4];
        let mut labels = Vec::with_capacity(groups.len());

        for group in groups {
            let position = distinct
                .iter()
                .position(|w| *w == group.weight)
                .unwrap_or(0)
                .min(3);
            let label = WeightLabel::ORDERED[position];
            let slot = label.rank_slot();
            let normalized = group.weight / max;
            if !assigned[slot] || normalized > rank_weights[slot] {
                rank_weights[slot] = normalized;
                assigned[slot] = true;
            }
            labels.push(label);
        }

        Self {
            labels,
            rank_weights,
        }
    }

    /// Compute the scheme for a vector.
    pub fn for_vector(vector: &VectorDef) -> Self {
        Self::for_groups(&vector.field_groups)
    }

    /// Label of the group at `index`.
    pub fn label(&self, index: usize) -> WeightLabel {
        self.labels.get(index).copied().unwrap_or(WeightLabel::D)
    }

    /// Rank weights in `{D, C, B, A}` order.
    pub fn rank_weights(&self) -> [f64; 4] {
        self.rank_weights
    }

    /// Rank weights as a `float4[]` literal.
    pub fn rank_weights_literal(&self) -> String {
        let parts: Vec<String> = self.rank_weights.iter().map(|w| w.to_string()).collect();
        format!("'{{{}}}'::float4[]", parts.join(","))
    }
}

// ============================================================================
// Vector expression
// ============================================================================

/// Builds the SQL expression that computes a vector for a primary-table row.
///
/// Primary-table columns are read directly; each joined table contributes a
/// correlated subquery aggregating its columns. The expression references
/// the primary table by name, so it is valid in `UPDATE <table> SET ...`.
#[derive(Debug, Clone, Copy)]
pub struct VectorExpression<'a> {
    entity: &'a EntityVectors,
    vector: &'a VectorDef,
    text_search_config: &'a str,
}

impl<'a> VectorExpression<'a> {
    /// Create a builder for one vector.
    pub fn new(
        entity: &'a EntityVectors,
        vector: &'a VectorDef,
        text_search_config: &'a str,
    ) -> Self {
        Self {
            entity,
            vector,
            text_search_config,
        }
    }

    /// Render the full expression.
    pub fn to_sql(&self) -> String {
        let scheme = WeightScheme::for_vector(self.vector);
        self.vector
            .field_groups
            .iter()
            .enumerate()
            .map(|(idx, group)| {
                format!(
                    "setweight(to_tsvector('{}', {}), '{}')",
                    self.text_search_config,
                    self.group_text(group),
                    scheme.label(idx)
                )
            })
            .collect::<Vec<_>>()
            .join(" || ")
    }

    /// Text of one group: its sources joined with single spaces.
    fn group_text(&self, group: &FieldGroup) -> String {
        // Preserve first-appearance order; a joined table is one source no
        // matter how many of its columns the group uses.
        let mut sources: Vec<(&str, Vec<&ColumnRef>)> = Vec::new();
        for column in &group.columns {
            if column.table == self.entity.table {
                sources.push((column.table.as_str(), vec![column]));
            } else if let Some((_, cols)) = sources
                .iter_mut()
                .find(|(table, _)| *table == column.table.as_str())
            {
                cols.push(column);
            } else {
                sources.push((column.table.as_str(), vec![column]));
            }
        }

        sources
            .into_iter()
            .map(|(table, cols)| match self.vector.joins.get(table) {
                Some(join) => format!(
                    "coalesce((SELECT string_agg({}, ' ') FROM {} WHERE {}), '')",
                    concat_columns(&cols),
                    join.from_clause,
                    join.where_clause
                ),
                None => concat_columns(&cols),
            })
            .collect::<Vec<_>>()
            .join(" || ' ' || ")
    }
}

impl fmt::Display for VectorExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn concat_columns(columns: &[&ColumnRef]) -> String {
    columns
        .iter()
        .map(|c| format!("coalesce({}::text, '')", c))
        .collect::<Vec<_>>()
        .join(" || ' ' || ")
}

// ============================================================================
// Maintenance statements
// ============================================================================

/// `UPDATE` recomputing a vector for every row.
pub fn resync_all_sql(entity: &EntityVectors, vector: &VectorDef, ts_config: &str) -> String {
    format!(
        "UPDATE {} SET {} = {}",
        entity.table,
        vector.name,
        VectorExpression::new(entity, vector, ts_config)
    )
}

/// Statements creating a vector's column and GIN index, both idempotent.
pub fn vector_column_ddl(entity: &EntityVectors, vector: &VectorDef) -> Vec<String> {
    vec![
        format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} tsvector",
            entity.table, vector.name
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {t}_{v}_idx ON {t} USING gin({v})",
            t = entity.table,
            v = vector.name
        ),
    ]
}

// ============================================================================
// Conditions
// ============================================================================

/// Extra filter predicates ANDed onto a search.
///
/// Fragments use `?` for placeholders; they are renumbered to follow the
/// query's own parameters. Every `?` in a fragment is a placeholder.
///
/// ```
/// use tsquill_index::Conditions;
///
/// let conditions = Conditions::new()
///     .filter("author_id = ?", [7])
///     .filter_sql("published");
/// assert_eq!(conditions.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    fragments: Vec<(String, usize)>,
    params: Vec<SqlValue>,
}

impl Conditions {
    /// No conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment with bound values for its placeholders.
    pub fn filter<I, V>(mut self, fragment: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let before = self.params.len();
        self.params.extend(params.into_iter().map(Into::into));
        self.fragments
            .push((fragment.into(), self.params.len() - before));
        self
    }

    /// Add a fragment without placeholders.
    pub fn filter_sql(self, fragment: impl Into<String>) -> Self {
        self.filter(fragment, std::iter::empty::<SqlValue>())
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether there are no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Render as `(f1) AND (f2)`, numbering placeholders from `first`.
    pub fn render(&self, first: usize) -> Result<String> {
        let mut next = first;
        let mut parts = Vec::with_capacity(self.fragments.len());
        for (fragment, expected) in &self.fragments {
            let found = fragment.matches('?').count();
            if found != *expected {
                return Err(Error::invalid_query(format!(
                    "condition `{fragment}` has {found} placeholder(s) but {expected} value(s)"
                )));
            }
            let mut rendered = String::with_capacity(fragment.len() + 4 * found);
            for c in fragment.chars() {
                if c == '?' {
                    rendered.push('$');
                    rendered.push_str(&next.to_string());
                    next += 1;
                } else {
                    rendered.push(c);
                }
            }
            parts.push(format!("({rendered})"));
        }
        Ok(parts.join(" AND "))
    }
}

// ============================================================================
// Search statements
// ============================================================================

/// A statement and its parameters, ready for [`SearchStore::execute`].
///
/// [`SearchStore::execute`]: tsquill_core::SearchStore::execute
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `$n` placeholders.
    pub sql: String,
    /// Values for the placeholders.
    pub params: Vec<SqlValue>,
}

/// Builder for ranked search and count statements against one vector.
///
/// `$1` is always the tsquery expression.
#[derive(Debug, Clone)]
pub struct SearchSql<'a> {
    entity: &'a EntityVectors,
    vector: &'a VectorDef,
    text_search_config: &'a str,
    conditions: Option<&'a Conditions>,
}

impl<'a> SearchSql<'a> {
    /// Create a builder.
    pub fn new(
        entity: &'a EntityVectors,
        vector: &'a VectorDef,
        text_search_config: &'a str,
    ) -> Self {
        Self {
            entity,
            vector,
            text_search_config,
            conditions: None,
        }
    }

    /// Restrict matches with extra conditions.
    pub fn with_conditions(mut self, conditions: Option<&'a Conditions>) -> Self {
        self.conditions = conditions;
        self
    }

    fn from_where(&self, params: &mut Vec<SqlValue>) -> Result<String> {
        let table = &self.entity.table;
        let mut sql = format!(
            " FROM {table}, to_tsquery('{}', $1) AS {QUERY_ALIAS} WHERE {table}.{} @@ {QUERY_ALIAS}",
            self.text_search_config, self.vector.name
        );
        if let Some(conditions) = self.conditions.filter(|c| !c.is_empty()) {
            sql.push_str(" AND ");
            sql.push_str(&conditions.render(params.len() + 1)?);
            params.extend_from_slice(conditions.params());
        }
        Ok(sql)
    }

    /// Ranked SELECT of matching rows.
    pub fn select(
        &self,
        expression: &str,
        headlines: &[String],
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Statement> {
        let table = &self.entity.table;
        let scheme = WeightScheme::for_vector(self.vector);
        let mut params = vec![SqlValue::from(expression)];

        let mut sql = format!(
            "SELECT {table}.*, ts_rank({}, {table}.{}, {QUERY_ALIAS}) AS {RANK_COLUMN}",
            scheme.rank_weights_literal(),
            self.vector.name
        );
        for column in headlines {
            sql.push_str(&format!(
                ", ts_headline('{}', coalesce({table}.{column}::text, ''), {QUERY_ALIAS}) \
                 AS {column}_headline",
                self.text_search_config
            ));
        }
        sql.push_str(&self.from_where(&mut params)?);
        sql.push_str(&format!(
            " ORDER BY {RANK_COLUMN} DESC, {table}.{} ASC",
            self.entity.primary_key
        ));
        if let Some(limit) = limit {
            params.push(SqlValue::Int(to_i64(limit)?));
            sql.push_str(&format!(" LIMIT ${}", params.len()));
        }
        if let Some(offset) = offset {
            params.push(SqlValue::Int(to_i64(offset)?));
            sql.push_str(&format!(" OFFSET ${}", params.len()));
        }

        Ok(Statement { sql, params })
    }

    /// `count(*)` of matching rows.
    pub fn count(&self, expression: &str) -> Result<Statement> {
        let mut params = vec![SqlValue::from(expression)];
        let mut sql = format!("SELECT count(*) AS {COUNT_COLUMN}");
        sql.push_str(&self.from_where(&mut params)?);
        Ok(Statement { sql, params })
    }
}

fn to_i64(n: usize) -> Result<i64> {
    i64::try_from(n).map_err(|_| Error::invalid_query(format!("{n} is out of range")))
}

// ============================================================================
// Tests
// ============================================================================
