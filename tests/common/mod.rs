#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const PASSWORD: &str = "Sup3r$ecret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Cargo builds the binary before integration tests run
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_todo-api"));
        cmd.env("APP_ENV", "development")
            .env("STORAGE_BACKEND", "memory")
            .env("TODO_API_PORT", port.to_string())
            .env("JWT_SECRET", "integration-test-secret")
            .env("SECURITY_SINGLE_SESSION", "false")
            .env("RUST_LOG", "todo_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Thin JSON client bound to one server and, optionally, one bearer token
#[derive(Clone)]
pub struct Api {
    pub base_url: String,
    pub token: Option<String>,
    client: reqwest::Client,
}

impl Api {
    pub async fn anonymous() -> Result<Self> {
        let server = ensure_server().await?;
        Ok(Self {
            base_url: server.base_url.clone(),
            token: None,
            client: reqwest::Client::new(),
        })
    }

    /// Register a fresh user and return a client carrying its token
    pub async fn new_user() -> Result<Self> {
        let anonymous = Self::anonymous().await?;
        let email = unique_email();
        let (status, body) = anonymous
            .post(
                "/api/users/register",
                json!({
                    "username": "test_user",
                    "name": "Test User",
                    "email": email,
                    "password": PASSWORD
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);

        let token = body["data"]["token"]
            .as_str()
            .context("register response without token")?
            .to_string();
        Ok(anonymous.with_token(token))
    }

    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).with_context(|| format!("non-JSON body: {}", text))?
        };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, None).await
    }

    /// Create a project and return its id
    pub async fn create_project(&self, name: &str) -> Result<String> {
        let (status, body) = self.post("/api/projects", json!({ "name": name })).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create project failed: {} {}", status, body);
        id_of(&body)
    }

    pub async fn create_list(&self, project_id: &str, name: &str) -> Result<String> {
        let (status, body) = self
            .post(&format!("/api/projects/{}/todolists", project_id), json!({ "name": name }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create list failed: {} {}", status, body);
        id_of(&body)
    }

    pub async fn create_task(&self, project_id: &str, list_id: &str, title: &str) -> Result<String> {
        let (status, body) = self
            .post(&tasks_path(project_id, list_id), json!({ "title": title }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create task failed: {} {}", status, body);
        id_of(&body)
    }
}

pub fn tasks_path(project_id: &str, list_id: &str) -> String {
    format!("/api/projects/{}/todolists/{}/tasks", project_id, list_id)
}

pub fn id_of(body: &Value) -> Result<String> {
    Ok(body["data"]["id"].as_str().context("response without data.id")?.to_string())
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", uuid::Uuid::new_v4().simple())
}
