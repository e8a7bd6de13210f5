//! Vector synchronization: keep stored vectors in step with source columns.

use async_trait::async_trait;
use std::sync::Arc;

use tsquill_core::{ColumnUpdate, Result, SaveCallback, SearchStore, SqlValue};

use crate::config::{EntityVectors, VectorConfig};
use crate::sql::{self, VectorExpression};

/// Recomputes stored vectors from their source columns.
///
/// Holds the shared configuration and store. Cheap to clone.
#[derive(Clone)]
pub struct Synchronizer {
    config: Arc<VectorConfig>,
    store: Arc<dyn SearchStore>,
}

impl Synchronizer {
    /// Create a synchronizer.
    pub fn new(config: Arc<VectorConfig>, store: Arc<dyn SearchStore>) -> Self {
        Self { config, store }
    }

    /// The shared configuration.
    pub fn config(&self) -> &VectorConfig {
        &self.config
    }

    /// Entity with at least one vector, or `None` when there is nothing to do.
    fn syncable(&self, entity: &str) -> Option<&EntityVectors> {
        match self.config.entity(entity) {
            Some(vectors) if !vectors.vectors.is_empty() => Some(vectors),
            _ => {
                log::debug!("no vectors configured for '{entity}', nothing to resync");
                None
            }
        }
    }

    /// Recompute one vector (or the sole vector) for every row.
    pub async fn resync_all(&self, entity: &str, vector: Option<&str>) -> Result<()> {
        let Some(vectors) = self.syncable(entity) else {
            return Ok(());
        };
        let def = vectors.vector(vector)?;
        let sql = sql::resync_all_sql(vectors, def, self.config.text_search_config());

        log::info!("resyncing {}.{} for all rows", vectors.table, def.name);
        self.store.execute(&sql, &[]).await?;
        Ok(())
    }

    /// Recompute every vector of an entity for every row.
    ///
    /// Returns the number of vectors refreshed.
    pub async fn resync_entity(&self, entity: &str) -> Result<usize> {
        let Some(vectors) = self.syncable(entity) else {
            return Ok(0);
        };
        for def in vectors.vectors.values() {
            let sql = sql::resync_all_sql(vectors, def, self.config.text_search_config());
            log::info!("resyncing {}.{} for all rows", vectors.table, def.name);
            self.store.execute(&sql, &[]).await?;
        }
        Ok(vectors.vectors.len())
    }

    /// Recompute one vector (or the sole vector) for a single record.
    ///
    /// Returns the number of rows updated; zero means the record is gone.
    pub async fn resync_one(
        &self,
        entity: &str,
        primary_key: &SqlValue,
        vector: Option<&str>,
    ) -> Result<u64> {
        let Some(vectors) = self.syncable(entity) else {
            return Ok(0);
        };
        let def = vectors.vector(vector)?;
        self.update_record(vectors, &def.name, primary_key).await
    }

    /// Recompute the auto-updating vectors of one record.
    ///
    /// Vectors with auto-update off are left alone. Returns the number of
    /// vectors refreshed.
    pub async fn refresh_record(&self, entity: &str, primary_key: &SqlValue) -> Result<usize> {
        let Some(vectors) = self.syncable(entity) else {
            return Ok(0);
        };
        let mut refreshed = 0;
        for def in vectors.vectors.values().filter(|v| v.auto_update) {
            self.update_record(vectors, &def.name, primary_key).await?;
            refreshed += 1;
        }
        Ok(refreshed)
    }

    async fn update_record(
        &self,
        vectors: &EntityVectors,
        vector: &str,
        primary_key: &SqlValue,
    ) -> Result<u64> {
        let def = vectors.vector(Some(vector))?;
        let update = ColumnUpdate {
            table: vectors.table.clone(),
            primary_key_column: vectors.primary_key.clone(),
            primary_key: primary_key.clone(),
            column: def.name.clone(),
            expression: VectorExpression::new(vectors, def, self.config.text_search_config())
                .to_sql(),
        };

        let affected = self.store.update_column(&update).await?;
        if affected == 0 {
            log::warn!(
                "resync of {}.{} matched no row with {} = {}",
                vectors.table,
                def.name,
                vectors.primary_key,
                primary_key
            );
        } else {
            log::debug!(
                "resynced {}.{} for {} = {}",
                vectors.table,
                def.name,
                vectors.primary_key,
                primary_key
            );
        }
        Ok(affected)
    }

    /// DDL creating the storage column and GIN index for a vector.
    pub fn vector_column_ddl(&self, entity: &str, vector: Option<&str>) -> Result<Vec<String>> {
        let (vectors, def) = self.config.resolve(entity, vector)?;
        Ok(sql::vector_column_ddl(vectors, def))
    }

    /// Create the storage column and GIN index for a vector.
    pub async fn create_vector_column(&self, entity: &str, vector: Option<&str>) -> Result<()> {
        for statement in self.vector_column_ddl(entity, vector)? {
            log::debug!("{statement}");
            self.store.execute(&statement, &[]).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SaveCallback for Synchronizer {
    async fn after_save(&self, entity: &str, primary_key: &SqlValue) -> Result<usize> {
        self.refresh_record(entity, primary_key).await
    }
}
