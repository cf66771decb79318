//! Client facade metrics regression tests

use super::helpers::*;
use backend_resilience::errors::{BackendFailure, ClassifiedError};
use backend_resilience::pool::ConnectionFactory;
use backend_resilience::{ClientConfig, ResilientClient};
use serial_test::serial;

struct Loopback;

impl ConnectionFactory for Loopback {
    type Connection = ();

    async fn connect(&self) -> Result<(), ClassifiedError> {
        Ok(())
    }
}

#[tokio::test]
#[serial]
async fn client_metrics_exist() {
    init_recorder();

    let client = ResilientClient::builder()
        .config(ClientConfig::builder().name("test_client").build())
        .factory(Loopback)
        .probe(|| async { true })
        .build()
        .await
        .unwrap();

    client
        .execute(|_conn| async { Ok::<_, ClassifiedError>(1) })
        .await
        .unwrap();
    let _ = client
        .execute(|_conn| async {
            Err::<(), _>(BackendFailure::new("row violates check").code("23514"))
        })
        .await;
    client.shutdown().await;

    assert_counter_exists("client_executions_total");
    assert_metric_has_label("client_executions_total", "client", "test_client");
    assert_metric_has_label("client_executions_total", "result", "success");
    assert_metric_has_label("client_executions_total", "result", "failure");
    assert_metric_has_label("client_executions_total", "category", "validation");

    // Components inherit the client name.
    assert_metric_has_label("pool_acquire_total", "pool", "test_client");
    assert_metric_has_label("retry_calls_total", "retry", "test_client");
}
