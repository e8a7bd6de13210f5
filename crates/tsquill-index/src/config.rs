//! Vector configuration: the declarative surface and its validated form.
//!
//! Hosts describe searchable entities with [`EntitySpec`], usually
//! deserialized from their own TOML/JSON configuration:
//!
//! ```toml
//! [entities.blog_entries]
//! fields = ["title", "description"]          # shorthand → vector "vectors"
//!
//! [entities.profiles.public_vector]
//! fields = ["name", "public_info"]
//!
//! [entities.profiles.private_vector]
//! fields = ["name", "private_info"]
//! auto_update_index = false
//!
//! [entities.posts.vectors.fields.a]
//! columns = ["posts.title"]
//! weight = 1.0
//!
//! [entities.posts.vectors.fields.b]
//! columns = ["comments.body"]
//! weight = 0.5
//!
//! [entities.posts.vectors.tables.comments]
//! from = "posts p2 left outer join comments on comments.post_id = p2.id"
//! where = "p2.id = posts.id"
//! ```
//!
//! [`VectorConfig::configure`] turns a spec into [`EntityVectors`], checking
//! every referenced column against the store before anything is registered.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tsquill_core::{Error, Result, SearchStore};

/// Name of the vector produced by the `fields` shorthand.
pub const DEFAULT_VECTOR: &str = "vectors";

/// Name of the field group produced by a plain column list.
pub const DEFAULT_GROUP: &str = "a";

/// Primary-key column assumed when none is configured.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Text search configuration passed to `to_tsvector` / `to_tsquery`.
pub const DEFAULT_TEXT_SEARCH_CONFIG: &str = "english";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|e| unreachable!("{e}"))
});

static QUALIFIED_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .unwrap_or_else(|e| unreachable!("{e}"))
});

/// Whether `name` can be spliced into SQL as a bare identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

// ============================================================================
// Declarative surface
// ============================================================================

/// The columns of a field group: one name or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnsSpec {
    /// A single column.
    One(String),
    /// Several columns, concatenated in order.
    Many(Vec<String>),
}

impl ColumnsSpec {
    fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// A named, weighted group of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Source columns (`column` or `table.column`).
    pub columns: ColumnsSpec,

    /// Relative weight; higher ranks higher.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl GroupSpec {
    /// Create a group over the given columns.
    pub fn new<I, S>(columns: I, weight: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: ColumnsSpec::Many(columns.into_iter().map(Into::into).collect()),
            weight,
        }
    }
}

/// The `fields` option: a column, a column list, or named groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldsSpec {
    /// One column, one group.
    Single(String),
    /// Several columns, one group.
    List(Vec<String>),
    /// Named groups with their own weights.
    Groups(BTreeMap<String, GroupSpec>),
}

impl FieldsSpec {
    /// A single column.
    pub fn single(column: impl Into<String>) -> Self {
        Self::Single(column.into())
    }

    /// A list of columns in one group.
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(columns.into_iter().map(Into::into).collect())
    }

    /// Named weighted groups.
    pub fn groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, GroupSpec)>,
        S: Into<String>,
    {
        Self::Groups(groups.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Expand into `(group name, group spec)` pairs.
    fn expand(&self) -> Vec<(String, GroupSpec)> {
        match self {
            Self::Single(column) => vec![(
                DEFAULT_GROUP.to_string(),
                GroupSpec {
                    columns: ColumnsSpec::One(column.clone()),
                    weight: default_weight(),
                },
            )],
            Self::List(columns) => vec![(
                DEFAULT_GROUP.to_string(),
                GroupSpec {
                    columns: ColumnsSpec::Many(columns.clone()),
                    weight: default_weight(),
                },
            )],
            Self::Groups(groups) => groups
                .iter()
                .map(|(name, group)| (name.clone(), group.clone()))
                .collect(),
        }
    }
}

/// A joined table contributing columns to a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// FROM fragment producing the joined rows.
    pub from: String,

    /// Predicate correlating the joined rows with the primary record.
    #[serde(rename = "where")]
    pub where_clause: String,

    /// Real table name, when the alias differs from it. Used for column
    /// validation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl JoinSpec {
    /// Create a join.
    pub fn new(from: impl Into<String>, where_clause: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            where_clause: where_clause.into(),
            table: None,
        }
    }

    /// Set the real table name behind the alias.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// Full definition of one vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSpec {
    /// Source fields.
    pub fields: FieldsSpec,

    /// Joined tables keyed by alias.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, JoinSpec>,

    /// Recompute on every save.
    #[serde(default = "default_true")]
    pub auto_update_index: bool,
}

impl VectorSpec {
    /// Create a vector spec with auto-update on and no joins.
    pub fn new(fields: FieldsSpec) -> Self {
        Self {
            fields,
            tables: BTreeMap::new(),
            auto_update_index: true,
        }
    }

    /// Add a joined table.
    pub fn with_table(mut self, alias: impl Into<String>, join: JoinSpec) -> Self {
        self.tables.insert(alias.into(), join);
        self
    }

    /// Set auto-update.
    pub fn with_auto_update(mut self, enabled: bool) -> Self {
        self.auto_update_index = enabled;
        self
    }
}

/// Search configuration for one entity type.
///
/// `fields` is shorthand for a vector named [`DEFAULT_VECTOR`]; every other
/// key names a vector of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Primary table; defaults to the entity name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Primary-key column; defaults to [`DEFAULT_PRIMARY_KEY`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,

    /// Shorthand fields for the default vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldsSpec>,

    /// Named vectors.
    #[serde(flatten)]
    pub vectors: BTreeMap<String, VectorSpec>,
}

impl EntitySpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand: one default vector over `fields`.
    pub fn with_fields(fields: FieldsSpec) -> Self {
        Self {
            fields: Some(fields),
            ..Self::default()
        }
    }

    /// Set the primary table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the primary-key column.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Add a named vector.
    pub fn vector(mut self, name: impl Into<String>, spec: VectorSpec) -> Self {
        self.vectors.insert(name.into(), spec);
        self
    }
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Validated model
// ============================================================================

/// A column reference resolved to its owning table (or join alias).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Primary table name or join alias.
    pub table: String,
    /// Column name.
    pub column: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// One weighted component of a vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGroup {
    /// Group name.
    pub name: String,
    /// Columns, in concatenation order.
    pub columns: Vec<ColumnRef>,
    /// Positive weight.
    pub weight: f64,
}

/// A joined table's FROM fragment and correlation predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct TableJoin {
    /// Alias used to qualify columns.
    pub alias: String,
    /// Table checked for column existence.
    pub table: String,
    /// FROM fragment.
    pub from_clause: String,
    /// WHERE fragment correlating with the primary record.
    pub where_clause: String,
}

/// A validated vector definition.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDef {
    /// Vector name (also its storage column).
    pub name: String,
    /// Weighted field groups.
    pub field_groups: Vec<FieldGroup>,
    /// Joined tables keyed by alias.
    pub joins: BTreeMap<String, TableJoin>,
    /// Recompute on every save.
    pub auto_update: bool,
}

impl VectorDef {
    /// Every column of every group, in order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnRef> {
        self.field_groups.iter().flat_map(|g| g.columns.iter())
    }
}

/// All vectors of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityVectors {
    /// Entity type name.
    pub entity: String,
    /// Primary table.
    pub table: String,
    /// Primary-key column.
    pub primary_key: String,
    /// Vectors keyed by name.
    pub vectors: BTreeMap<String, VectorDef>,
}

impl EntityVectors {
    /// Build from a spec without touching the store.
    ///
    /// Checks everything that can be checked syntactically: identifiers,
    /// weights, table references, and the `fields`/`vectors` conflict.
    pub fn from_spec(entity: &str, spec: &EntitySpec) -> Result<Self> {
        let table = spec.table.clone().unwrap_or_else(|| entity.to_string());
        let primary_key = spec
            .primary_key
            .clone()
            .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());

        if !is_identifier(&table) {
            return Err(Error::config(format!(
                "entity '{entity}': table name '{table}' is not a valid identifier"
            )));
        }
        if !is_identifier(&primary_key) {
            return Err(Error::invalid_field(
                &table,
                &primary_key,
                "primary key is not a valid identifier",
            ));
        }

        let mut specs: Vec<(String, VectorSpec)> = spec
            .vectors
            .iter()
            .map(|(name, v)| (name.clone(), v.clone()))
            .collect();
        if let Some(fields) = &spec.fields {
            if spec.vectors.contains_key(DEFAULT_VECTOR) {
                return Err(Error::config(format!(
                    "entity '{entity}': `fields` shorthand conflicts with an explicit \
                     `{DEFAULT_VECTOR}` vector"
                )));
            }
            specs.push((DEFAULT_VECTOR.to_string(), VectorSpec::new(fields.clone())));
        }

        let mut vectors = BTreeMap::new();
        for (name, vector_spec) in specs {
            let def = build_vector(&table, &name, &vector_spec)?;
            vectors.insert(name, def);
        }

        Ok(Self {
            entity: entity.to_string(),
            table,
            primary_key,
            vectors,
        })
    }

    /// Vector names in sorted order.
    pub fn vector_names(&self) -> Vec<&str> {
        self.vectors.keys().map(String::as_str).collect()
    }

    /// Resolve a vector by name, or the sole vector when `name` is `None`.
    pub fn vector(&self, name: Option<&str>) -> Result<&VectorDef> {
        match name {
            Some(name) => self
                .vectors
                .get(name)
                .ok_or_else(|| Error::vector_not_found(&self.entity, name)),
            None => match self.vectors.len() {
                0 => Err(Error::vector_not_found(&self.entity, DEFAULT_VECTOR)),
                1 => self
                    .vectors
                    .values()
                    .next()
                    .ok_or_else(|| Error::vector_not_found(&self.entity, DEFAULT_VECTOR)),
                _ => Err(Error::AmbiguousVector {
                    entity: self.entity.clone(),
                    candidates: self.vectors.keys().cloned().collect(),
                }),
            },
        }
    }

    /// Real table name behind a column's owner.
    fn owning_table<'a>(&'a self, vector: &'a VectorDef, column: &'a ColumnRef) -> &'a str {
        vector
            .joins
            .get(&column.table)
            .map(|join| join.table.as_str())
            .unwrap_or(&column.table)
    }

    /// Check every referenced column against the store.
    pub async fn verify_columns(&self, store: &dyn SearchStore) -> Result<()> {
        for vector in self.vectors.values() {
            for column in vector.columns() {
                let table = self.owning_table(vector, column);
                if !store.column_exists(table, &column.column).await? {
                    return Err(Error::invalid_field(
                        table,
                        &column.column,
                        format!("column does not exist (vector '{}')", vector.name),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn build_vector(table: &str, name: &str, spec: &VectorSpec) -> Result<VectorDef> {
    if !is_identifier(name) {
        return Err(Error::config(format!(
            "vector name '{name}' is not a valid identifier"
        )));
    }

    let mut joins = BTreeMap::new();
    for (alias, join) in &spec.tables {
        if !is_identifier(alias) {
            return Err(Error::config(format!(
                "vector '{name}': join alias '{alias}' is not a valid identifier"
            )));
        }
        if alias == table {
            return Err(Error::config(format!(
                "vector '{name}': join alias '{alias}' shadows the primary table"
            )));
        }
        if join.from.trim().is_empty() || join.where_clause.trim().is_empty() {
            return Err(Error::config(format!(
                "vector '{name}': join '{alias}' needs both `from` and `where`"
            )));
        }
        let real = join.table.clone().unwrap_or_else(|| alias.clone());
        if !is_identifier(&real) {
            return Err(Error::config(format!(
                "vector '{name}': join table '{real}' is not a valid identifier"
            )));
        }
        joins.insert(
            alias.clone(),
            TableJoin {
                alias: alias.clone(),
                table: real,
                from_clause: join.from.trim().to_string(),
                where_clause: join.where_clause.trim().to_string(),
            },
        );
    }

    let expanded = spec.fields.expand();
    if expanded.is_empty() {
        return Err(Error::config(format!("vector '{name}' has no field groups")));
    }

    let mut field_groups = Vec::with_capacity(expanded.len());
    for (group_name, group) in expanded {
        if !group.weight.is_finite() || group.weight <= 0.0 {
            return Err(Error::config(format!(
                "vector '{name}', group '{group_name}': weight must be positive, got {}",
                group.weight
            )));
        }
        let names = group.columns.names();
        if names.is_empty() {
            return Err(Error::config(format!(
                "vector '{name}', group '{group_name}' has no columns"
            )));
        }
        let columns = names
            .into_iter()
            .map(|raw| parse_column(table, &joins, raw))
            .collect::<Result<Vec<_>>>()?;
        field_groups.push(FieldGroup {
            name: group_name,
            columns,
            weight: group.weight,
        });
    }

    Ok(VectorDef {
        name: name.to_string(),
        field_groups,
        joins,
        auto_update: spec.auto_update_index,
    })
}

fn parse_column(
    table: &str,
    joins: &BTreeMap<String, TableJoin>,
    raw: &str,
) -> Result<ColumnRef> {
    let raw = raw.trim();
    if !QUALIFIED_IDENTIFIER.is_match(raw) {
        return Err(Error::invalid_field(
            table,
            raw,
            "expected `column` or `table.column`",
        ));
    }
    let (owner, column) = match raw.split_once('.') {
        Some((owner, column)) => (owner, column),
        None => (table, raw),
    };
    if owner != table && !joins.contains_key(owner) {
        return Err(Error::invalid_field(
            owner,
            column,
            "unknown table; declare it under `tables`",
        ));
    }
    Ok(ColumnRef {
        table: owner.to_string(),
        column: column.to_string(),
    })
}

// ============================================================================
// VectorConfig
// ============================================================================

/// Search configuration for every entity type, keyed by entity name.
///
/// Built once at startup and shared read-only (typically behind an `Arc`)
/// by the synchronizer and the executor.
#[derive(Debug, Clone)]
pub struct VectorConfig {
    entities: HashMap<String, EntityVectors>,
    text_search_config: String,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            text_search_config: DEFAULT_TEXT_SEARCH_CONFIG.to_string(),
        }
    }
}

impl VectorConfig {
    /// Create an empty configuration using [`DEFAULT_TEXT_SEARCH_CONFIG`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different text search configuration (e.g. `simple`,
    /// `pg_catalog.english`).
    pub fn with_text_search_config(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !QUALIFIED_IDENTIFIER.is_match(&name) {
            return Err(Error::config(format!(
                "text search configuration '{name}' is not a valid identifier"
            )));
        }
        self.text_search_config = name;
        Ok(self)
    }

    /// Text search configuration name.
    pub fn text_search_config(&self) -> &str {
        &self.text_search_config
    }

    /// Enable search for `entity`, replacing any previous definition.
    ///
    /// Fails without registering anything if the spec is malformed or any
    /// referenced column is missing from the store.
    pub async fn configure(
        &mut self,
        entity: &str,
        spec: &EntitySpec,
        store: &dyn SearchStore,
    ) -> Result<&EntityVectors> {
        let vectors = EntityVectors::from_spec(entity, spec)?;
        vectors.verify_columns(store).await?;

        log::debug!(
            "configured entity '{}' (table {}) with vectors [{}]",
            entity,
            vectors.table,
            vectors.vector_names().join(", ")
        );
        if self.entities.contains_key(entity) {
            log::info!("replacing search configuration for entity '{entity}'");
        }

        self.entities.insert(entity.to_string(), vectors);
        self.entities
            .get(entity)
            .ok_or_else(|| Error::EntityNotConfigured(entity.to_string()))
    }

    /// Configure every entity of a map, stopping at the first failure.
    pub async fn configure_all(
        &mut self,
        specs: &BTreeMap<String, EntitySpec>,
        store: &dyn SearchStore,
    ) -> Result<()> {
        for (entity, spec) in specs {
            self.configure(entity, spec, store).await?;
        }
        Ok(())
    }

    /// Drop an entity's configuration.
    pub fn remove(&mut self, entity: &str) -> Option<EntityVectors> {
        self.entities.remove(entity)
    }

    /// Look up an entity.
    pub fn entity(&self, entity: &str) -> Option<&EntityVectors> {
        self.entities.get(entity)
    }

    /// Configured entity names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve an entity and one of its vectors.
    pub fn resolve(
        &self,
        entity: &str,
        vector: Option<&str>,
    ) -> Result<(&EntityVectors, &VectorDef)> {
        let vectors = self
            .entity(entity)
            .ok_or_else(|| Error::EntityNotConfigured(entity.to_string()))?;
        Ok((vectors, vectors.vector(vector)?))
    }
}

// ============================================================================
// Tests
// ============================================================================
