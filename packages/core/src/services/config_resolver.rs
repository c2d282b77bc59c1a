//! Site Configuration Resolver
//!
//! Resolves the site configuration from a two-column Name/Value database:
//!
//! | Name              | Value                      | Type   |
//! |-------------------|----------------------------|--------|
//! | `title`           | `My Blog`                  |        |
//! | `seo.titleSuffix` | ` \| My Blog`              |        |
//! | `nav`             | `["posts", "about"]`       | `JSON` |
//!
//! Dotted names nest (`seo.titleSuffix` → `{ "seo": { "titleSuffix": .. } }`)
//! and the optional `Type` column opts a row into JSON decoding, per
//! `ValueDecoding`.
//!
//! Without a config page, or in a local build, the configuration bundled with
//! the crate is used and nothing is fetched. Once a config page is set its
//! failures propagate; there is no fallback to the bundled defaults.

use crate::accessors::{CollectionAccessor, PageAccessor};
use crate::config::ContentConfig;
use crate::error::ContentError;
use crate::models::{ConfigTree, InsertOutcome, PageId, PropertyValue, SiteSettings, ValueDecoding};
use crate::remote::RecordClient;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Configuration shipped with the crate
const BUNDLED_CONFIG: &str = include_str!("../../assets/default_site_config.json");

pub const NAME_PROPERTY: &str = "Name";
pub const VALUE_PROPERTY: &str = "Value";
pub const TYPE_PROPERTY: &str = "Type";

/// One raw row of the configuration database
#[derive(Debug)]
struct ConfigRow {
    page_id: PageId,
    name: PropertyValue,
    value: PropertyValue,
    type_cell: PropertyValue,
}

/// Resolves the site configuration tree
pub struct ConfigResolver {
    config_page: Option<CollectionAccessor>,
    client: Arc<dyn RecordClient>,
    decoding: ValueDecoding,
    fetch_concurrency: usize,
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("config_page", &self.config_page)
            .field("decoding", &self.decoding)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish_non_exhaustive()
    }
}

impl ConfigResolver {
    pub fn new(config: &ContentConfig, client: Arc<dyn RecordClient>) -> Self {
        let config_page = config
            .remote_config_page_id()
            .map(|id| CollectionAccessor::new(id.clone(), Arc::clone(&client)));

        Self {
            config_page,
            client,
            decoding: config.value_decoding,
            fetch_concurrency: config.fetch_concurrency.max(1),
        }
    }

    /// Whether `resolve` reads from the remote store
    pub fn is_remote(&self) -> bool {
        self.config_page.is_some()
    }

    /// Resolve the configuration tree
    pub async fn resolve(&self) -> Result<ConfigTree, ContentError> {
        let Some(config_page) = &self.config_page else {
            tracing::info!("No remote config page, using bundled configuration");
            return bundled_config();
        };

        let ids = config_page.child_page_ids().await?;
        tracing::debug!(
            config_page_id = %config_page.page_id(),
            rows = ids.len(),
            "Resolving site configuration"
        );

        let rows = self.read_rows(ids).await?;
        Ok(build_tree(rows, self.decoding))
    }

    /// Resolve and decode into typed settings
    pub async fn resolve_settings(&self) -> Result<SiteSettings, ContentError> {
        self.resolve().await?.deserialize()
    }

    async fn read_rows(&self, ids: Vec<PageId>) -> Result<Vec<ConfigRow>, ContentError> {
        let client = Arc::clone(&self.client);
        stream::iter(ids)
            .map(move |page_id| {
                let page = PageAccessor::new(page_id, Arc::clone(&client));
                async move {
                    let (name, value, type_cell) = tokio::try_join!(
                        page.raw_property(NAME_PROPERTY),
                        page.raw_property(VALUE_PROPERTY),
                        page.raw_property(TYPE_PROPERTY),
                    )?;
                    Ok::<_, ContentError>(ConfigRow {
                        page_id: page.page_id().clone(),
                        name,
                        value,
                        type_cell,
                    })
                }
            })
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await
    }
}

/// The configuration bundled with the crate
pub fn bundled_config() -> Result<ConfigTree, ContentError> {
    let value = serde_json::from_str(BUNDLED_CONFIG).map_err(|e| {
        ContentError::invalid_configuration(format!("bundled configuration is not valid JSON: {}", e))
    })?;
    ConfigTree::from_json(value)
}

/// Insert rows in database order
fn build_tree(rows: Vec<ConfigRow>, decoding: ValueDecoding) -> ConfigTree {
    let mut tree = ConfigTree::new();

    for row in rows {
        let (PropertyValue::String(name), PropertyValue::String(value)) = (row.name, row.value)
        else {
            tracing::debug!(page_id = %row.page_id, "Skipping config row without string Name and Value");
            continue;
        };

        let leaf = decoding.coerce(value, row.type_cell.as_str());
        match tree.insert(&name, leaf) {
            InsertOutcome::Inserted => {}
            InsertOutcome::EmptyKey => {
                tracing::warn!(page_id = %row.page_id, name = %name, "Skipping config row with empty name");
            }
            InsertOutcome::Conflict { segment } => {
                tracing::warn!(
                    page_id = %row.page_id,
                    name = %name,
                    segment = %segment,
                    "Skipping config row, path segment already holds a value"
                );
            }
        }
    }

    tree
}
