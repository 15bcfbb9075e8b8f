use crate::domain::model::QueryResult;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// The narrow slice of the CRM API the relocator depends on.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Run a SOQL query and return the first page of results.
    async fn query(&self, soql: &str) -> Result<QueryResult>;

    /// Update fields on a single record.
    async fn update(&self, object_type: &str, id: &str, fields: &Map<String, Value>) -> Result<()>;
}
