use tracing::info;

use crate::config::AppConfig;
use crate::warehouse::data_api::DataApiClient;
use crate::warehouse::executor::StatementExecutor;
use crate::warehouse::{QueryRequest, QueryStatus, WarehouseError};

/// DDL mapping an external schema onto a data-catalog database. Idempotent
/// on the catalog side thanks to IF NOT EXISTS.
pub fn external_schema_ddl(schema: &str, catalog_database: &str) -> String {
    format!(
        "CREATE EXTERNAL SCHEMA {} \
         FROM DATA CATALOG DATABASE '{}' \
         IAM_ROLE default \
         CREATE EXTERNAL DATABASE IF NOT EXISTS",
        schema, catalog_database
    )
}

/// One-shot administrative action: create the external schema and report the
/// terminal status. A FAILED or ABORTED statement surfaces as an error so
/// the process can exit non-zero.
pub async fn init_schema(
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sql = external_schema_ddl(
        &config.warehouse.external_schema,
        &config.warehouse.catalog_database,
    );
    info!(
        "creating external schema {} over catalog database {}",
        config.warehouse.external_schema, config.warehouse.catalog_database
    );

    let client = DataApiClient::new(&config.warehouse)?;
    let executor = StatementExecutor::new(client, config.warehouse.poll_interval());
    let request = QueryRequest::new(sql, &config.warehouse);

    match executor.wait(&request).await {
        Ok(execution_id) => {
            println!(
                "schema statement {} finished with status {}",
                execution_id,
                QueryStatus::Finished
            );
            Ok(())
        }
        Err(e @ WarehouseError::StatementFailed { .. }) => {
            println!("schema statement failed: {}", e);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
