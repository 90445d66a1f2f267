pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::{storage::ResourceFiles, tasks::orchestrator::BatchOrchestrator};

#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub files: ResourceFiles,
    pub default_jurisdiction: Arc<str>,
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .route("/items/", get(handlers::submit_batch))
        .route("/items/delete/", delete(handlers::delete_output))
        .route("/items/add/", put(handlers::append_url))
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/{id}", get(handlers::job_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use reqwest::{Client, StatusCode};
    use tokio::net::TcpListener;

    use super::{handlers::ApiResponse, *};
    use crate::{
        config::{BatchConfig, FetchConfig, FlushPolicy},
        fetch::PageFetcher,
        tasks::jobs::JobRegistry,
    };

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn start_gateway(data_dir: &Path) -> String {
        std::fs::write(
            data_dir.join("salestax.json"),
            r#"[{"State": "Colorado", "State Tax Rate": 0.029}, {"State": "Texas", "State Tax Rate": 0.0625}]"#,
        )
        .unwrap();
        let files = ResourceFiles::new(data_dir);
        let orchestrator = Arc::new(BatchOrchestrator::new(
            PageFetcher::new(
                Client::new(),
                FetchConfig {
                    timeout: Duration::from_secs(5),
                },
            ),
            files.clone(),
            data_dir.join("salestax.json"),
            BatchConfig {
                max_concurrent_fetches: 8,
                flush_policy: FlushPolicy::BatchEnd,
                default_jurisdiction: "Colorado".into(),
                max_finished_jobs: 16,
            },
            Arc::new(JobRegistry::new(16)),
        ));
        serve(router(GatewayState {
            orchestrator,
            files,
            default_jurisdiction: Arc::from("Colorado"),
        }))
        .await
    }

    async fn wait_until_done(client: &Client, base: &str, id: uuid::Uuid) -> serde_json::Value {
        for _ in 0..100 {
            let status: serde_json::Value = client
                .get(format!("{base}/jobs/{id}"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if status["state"] == "done" {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("job {id} did not finish");
    }

    #[tokio::test]
    async fn submit_uses_default_jurisdiction_and_reports_completion() {
        let dir = tempfile::tempdir().unwrap();
        let shop = serve(Router::new().route(
            "/p",
            get(|| async { r#"<title>Widget</title>"{\"current_retail\":19.99,""# }),
        ))
        .await;
        std::fs::write(dir.path().join("urls.txt"), format!("{shop}/p")).unwrap();
        let base = start_gateway(dir.path()).await;
        let client = Client::new();

        let response = client
            .get(format!("{base}/items/?url_file=urls&file=out"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse = response.json().await.unwrap();
        assert_eq!(body.status, 200);
        let job_id = body.job_id.expect("job id returned");

        let status = wait_until_done(&client, &base, job_id).await;
        assert_eq!(status["jurisdiction"], "Colorado");
        assert_eq!(status["tax_rate"], 0.029);
        assert_eq!(status["total_units"], 1);
        assert_eq!(status["succeeded"], 1);

        let raw = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        let output: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(output["unit-0001"]["price_with_tax"], 20.57);
    }

    #[tokio::test]
    async fn submit_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let base = start_gateway(dir.path()).await;
        let response = Client::new()
            .get(format!("{base}/items/?url_file=..%2Fsecret&file=out"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiResponse = response.json().await.unwrap();
        assert_eq!(body.status, 400);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.json"), "{}").unwrap();
        let base = start_gateway(dir.path()).await;
        let client = Client::new();

        let first: ApiResponse = client
            .delete(format!("{base}/items/delete/?file=out"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!((first.status, first.message.as_str()), (200, "File Deleted"));

        let second: ApiResponse = client
            .delete(format!("{base}/items/delete/?file=out"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!((second.status, second.message.as_str()), (200, "No File Found"));
    }

    #[tokio::test]
    async fn append_requires_existing_input() {
        let dir = tempfile::tempdir().unwrap();
        let base = start_gateway(dir.path()).await;
        let client = Client::new();

        let missing = client
            .put(format!("{base}/items/add/?url_file=urls&url=http://a"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ApiResponse = missing.json().await.unwrap();
        assert_eq!(body.message, "File Not Found");

        std::fs::write(dir.path().join("urls.txt"), "http://a").unwrap();
        let added = client
            .put(format!("{base}/items/add/?url_file=urls&url=http://b"))
            .send()
            .await
            .unwrap();
        assert_eq!(added.status(), StatusCode::OK);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("urls.txt")).unwrap(),
            "http://a\nhttp://b"
        );
    }

    #[tokio::test]
    async fn unknown_job_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let base = start_gateway(dir.path()).await;
        let response = Client::new()
            .get(format!("{base}/jobs/{}", uuid::Uuid::new_v4()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
