use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::warehouse::{QueryRequest, QueryStatus, ResultSet, WarehouseClient, WarehouseError};

/// A finished statement together with the id the service assigned it.
#[derive(Debug)]
pub struct StatementOutcome {
    pub execution_id: String,
    pub result: ResultSet,
}

/// Submits statements and blocks until a terminal status. Polls at a fixed
/// interval with no attempt cap and no cancellation path; a statement the
/// service never finishes will be polled forever.
pub struct StatementExecutor<C> {
    client: C,
    poll_interval: Duration,
}

impl<C: WarehouseClient> StatementExecutor<C> {
    pub fn new(client: C, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Submits the request and polls until terminal. Returns the execution
    /// id on FINISHED; any other terminal status becomes StatementFailed
    /// carrying the remote error detail, and result data is never touched.
    pub async fn wait(&self, request: &QueryRequest) -> Result<String, WarehouseError> {
        let execution_id = self.client.submit(request).await?;
        info!("statement submitted with id {}", execution_id);

        let mut status = self.client.status(&execution_id).await?;
        while !status.is_terminal() {
            debug!("statement {} is {}, polling again", execution_id, status);
            sleep(self.poll_interval).await;
            status = self.client.status(&execution_id).await?;
        }
        info!("statement {} ended with status {}", execution_id, status);

        if status == QueryStatus::Finished {
            return Ok(execution_id);
        }

        let detail = match self.client.error_detail(&execution_id).await {
            Ok(detail) => detail,
            Err(e) => format!("error detail unavailable: {}", e),
        };
        Err(WarehouseError::StatementFailed {
            execution_id,
            status,
            detail,
        })
    }

    /// Like `wait`, but also fetches column metadata and all rows once the
    /// statement finishes.
    pub async fn run(&self, request: &QueryRequest) -> Result<StatementOutcome, WarehouseError> {
        let execution_id = self.wait(request).await?;
        let columns = self.client.columns(&execution_id).await?;
        let rows = self.client.rows(&execution_id).await?;
        debug!(
            "statement {} returned {} rows, {} columns",
            execution_id,
            rows.len(),
            columns.len()
        );
        Ok(StatementOutcome {
            execution_id,
            result: ResultSet { columns, rows },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarehouseConfig;
    use crate::warehouse::Cell;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeClient {
        statuses: Mutex<Vec<QueryStatus>>,
        status_calls: AtomicUsize,
        result_calls: AtomicUsize,
        error_detail: String,
    }

    impl FakeClient {
        fn with_statuses(statuses: Vec<QueryStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses),
                status_calls: AtomicUsize::new(0),
                result_calls: AtomicUsize::new(0),
                error_detail: "syntax error at line 1".to_string(),
            }
        }
    }

    #[async_trait]
    impl WarehouseClient for FakeClient {
        async fn submit(&self, _request: &QueryRequest) -> Result<String, WarehouseError> {
            Ok("exec-1".to_string())
        }

        async fn status(&self, _execution_id: &str) -> Result<QueryStatus, WarehouseError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.remove(0))
            } else {
                Ok(statuses[0])
            }
        }

        async fn columns(&self, _execution_id: &str) -> Result<Vec<String>, WarehouseError> {
            self.result_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["full_name".to_string()])
        }

        async fn rows(&self, _execution_id: &str) -> Result<Vec<Vec<Cell>>, WarehouseError> {
            self.result_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![vec![Cell::StringValue("Jane Doe".to_string())]])
        }

        async fn error_detail(&self, _execution_id: &str) -> Result<String, WarehouseError> {
            Ok(self.error_detail.clone())
        }
    }

    fn test_request() -> QueryRequest {
        let config = WarehouseConfig {
            endpoint: "http://localhost:8080".to_string(),
            api_key: None,
            cluster_id: None,
            db_user: None,
            workgroup: Some("travel-wg".to_string()),
            secret_arn: "arn:secret".to_string(),
            database_name: "dev".to_string(),
            schema_name: "travel".to_string(),
            external_schema: "ext_spectrum".to_string(),
            catalog_database: "hotelbookingdb".to_string(),
            tables_to_be_fed_to_llm: String::new(),
            poll_interval_secs: 10,
        };
        QueryRequest::new("select 1", &config)
    }

    fn executor(client: FakeClient) -> StatementExecutor<FakeClient> {
        StatementExecutor::new(client, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn finished_statement_yields_result_set() {
        let exec = executor(FakeClient::with_statuses(vec![
            QueryStatus::Submitted,
            QueryStatus::Running,
            QueryStatus::Finished,
        ]));
        let outcome = exec.run(&test_request()).await.unwrap();

        assert_eq!(outcome.execution_id, "exec-1");
        assert_eq!(outcome.result.columns, vec!["full_name".to_string()]);
        assert_eq!(outcome.result.rows.len(), 1);
        // One status call per observed state, none after the terminal one
        assert_eq!(exec.client.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn immediately_finished_statement_polls_once() {
        let exec = executor(FakeClient::with_statuses(vec![QueryStatus::Finished]));
        exec.run(&test_request()).await.unwrap();
        assert_eq!(exec.client.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_statement_short_circuits_before_result_fetch() {
        let exec = executor(FakeClient::with_statuses(vec![
            QueryStatus::Running,
            QueryStatus::Failed,
        ]));
        let err = exec.run(&test_request()).await.unwrap_err();

        match err {
            WarehouseError::StatementFailed {
                execution_id,
                status,
                detail,
            } => {
                assert_eq!(execution_id, "exec-1");
                assert_eq!(status, QueryStatus::Failed);
                assert_eq!(detail, "syntax error at line 1");
            }
            other => panic!("expected StatementFailed, got {}", other),
        }
        // Columns and rows must never be requested for a failed statement
        assert_eq!(exec.client.result_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn aborted_statement_reports_terminal_status() {
        let exec = executor(FakeClient::with_statuses(vec![QueryStatus::Aborted]));
        let err = exec.wait(&test_request()).await.unwrap_err();
        match err {
            WarehouseError::StatementFailed { status, .. } => {
                assert_eq!(status, QueryStatus::Aborted)
            }
            other => panic!("expected StatementFailed, got {}", other),
        }
        assert_eq!(exec.client.result_calls.load(Ordering::SeqCst), 0);
    }
}
