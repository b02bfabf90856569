use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WarehouseConfig;
use crate::warehouse::{
    Cell, QueryRequest, QueryStatus, SqlParameter, WarehouseClient, WarehouseError,
};

/// HTTP client for the warehouse's asynchronous data API. Actions are posted
/// to a single endpoint and dispatched by target header; credential
/// resolution happens service-side via the secret reference carried in each
/// request.
pub struct DataApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExecuteStatementInput<'a> {
    sql: &'a str,
    database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    workgroup_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cluster_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_user: Option<&'a str>,
    secret_arn: &'a str,
    #[serde(skip_serializing_if = "no_parameters")]
    parameters: &'a [SqlParameter],
}

fn no_parameters(parameters: &&[SqlParameter]) -> bool {
    parameters.is_empty()
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExecuteStatementOutput {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StatementRef<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStatementOutput {
    status: QueryStatus,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ColumnMetadata {
    label: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetStatementResultOutput {
    #[serde(default)]
    column_metadata: Vec<ColumnMetadata>,
    #[serde(default)]
    records: Vec<Vec<Cell>>,
}

impl DataApiClient {
    pub fn new(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| WarehouseError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<R, WarehouseError> {
        let payload =
            serde_json::to_vec(body).map_err(|e| WarehouseError::Protocol(e.to_string()))?;

        debug!("calling warehouse action {}", action);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("RedshiftData.{}", action))
            .header("Content-Type", "application/x-amz-json-1.1")
            .body(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WarehouseError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WarehouseError::Protocol(format!(
                "{} responded with status {}: {}",
                action, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WarehouseError::Protocol(e.to_string()))
    }

    async fn fetch_result(
        &self,
        execution_id: &str,
    ) -> Result<GetStatementResultOutput, WarehouseError> {
        self.post("GetStatementResult", &StatementRef { id: execution_id })
            .await
    }
}

#[async_trait]
impl WarehouseClient for DataApiClient {
    async fn submit(&self, request: &QueryRequest) -> Result<String, WarehouseError> {
        let input = ExecuteStatementInput {
            sql: &request.sql,
            database: &request.database,
            workgroup_name: request.workgroup.as_deref(),
            cluster_identifier: request.cluster_id.as_deref(),
            db_user: request.db_user.as_deref(),
            secret_arn: &request.secret_arn,
            parameters: &request.parameters,
        };
        let output: ExecuteStatementOutput = self.post("ExecuteStatement", &input).await?;
        Ok(output.id)
    }

    async fn status(&self, execution_id: &str) -> Result<QueryStatus, WarehouseError> {
        let output: DescribeStatementOutput = self
            .post("DescribeStatement", &StatementRef { id: execution_id })
            .await?;
        Ok(output.status)
    }

    async fn columns(&self, execution_id: &str) -> Result<Vec<String>, WarehouseError> {
        let output = self.fetch_result(execution_id).await?;
        Ok(output.column_metadata.into_iter().map(|c| c.label).collect())
    }

    async fn rows(&self, execution_id: &str) -> Result<Vec<Vec<Cell>>, WarehouseError> {
        let output = self.fetch_result(execution_id).await?;
        Ok(output.records)
    }

    async fn error_detail(&self, execution_id: &str) -> Result<String, WarehouseError> {
        let output: DescribeStatementOutput = self
            .post("DescribeStatement", &StatementRef { id: execution_id })
            .await?;
        Ok(output
            .error
            .unwrap_or_else(|| "no error detail reported".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_statement_input_matches_wire_shape() {
        let params = vec![SqlParameter::new("user_id", "1028169")];
        let input = ExecuteStatementInput {
            sql: "select 1",
            database: "dev",
            workgroup_name: Some("travel-wg"),
            cluster_identifier: None,
            db_user: None,
            secret_arn: "arn:secret",
            parameters: &params,
        };
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["Sql"], "select 1");
        assert_eq!(value["WorkgroupName"], "travel-wg");
        assert_eq!(value["SecretArn"], "arn:secret");
        assert_eq!(value["Parameters"][0]["name"], "user_id");
        assert_eq!(value["Parameters"][0]["value"], "1028169");
        // Absent optionals must be omitted, not serialized as null
        assert!(value.get("ClusterIdentifier").is_none());
        assert!(value.get("DbUser").is_none());
    }

    #[test]
    fn empty_parameter_list_is_omitted() {
        let input = ExecuteStatementInput {
            sql: "create schema s",
            database: "dev",
            workgroup_name: Some("travel-wg"),
            cluster_identifier: None,
            db_user: None,
            secret_arn: "arn:secret",
            parameters: &[],
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("Parameters").is_none());
    }

    #[test]
    fn statement_result_decodes_columns_and_records() {
        let body = r#"{
            "ColumnMetadata": [{"label": "full_name"}, {"label": "age"}],
            "Records": [[{"stringValue": "Jane Doe"}, {"longValue": 30}]]
        }"#;
        let output: GetStatementResultOutput = serde_json::from_str(body).unwrap();
        assert_eq!(output.column_metadata.len(), 2);
        assert_eq!(output.column_metadata[1].label, "age");
        assert_eq!(output.records[0][1], Cell::LongValue(30));
    }

    #[test]
    fn describe_statement_decodes_error_field() {
        let body = r#"{"Status": "FAILED", "Error": "relation does not exist"}"#;
        let output: DescribeStatementOutput = serde_json::from_str(body).unwrap();
        assert_eq!(output.status, QueryStatus::Failed);
        assert_eq!(output.error.as_deref(), Some("relation does not exist"));
    }
}
