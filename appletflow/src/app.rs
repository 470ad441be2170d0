use crate::constants::{PREVIEW_ID_KEY, WORKFLOW_KEY};
use crate::errors::AppletflowError;
use crate::models::history::HistoryLog;
use crate::models::workflow::Workflow;
use crate::resources::resource::Resource;
use crate::services::ai::OpenRouterClient;
use crate::services::autosave::Autosave;
use crate::services::generator::GenerationLock;
use crate::services::local_store::LocalStore;
use crate::services::preview::PreviewStore;
use actix_cors::Cors;
use actix_web::http;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use std::{env, fs};

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AiCfg {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub referer: String,
    pub title: String,
}

impl Default for AiCfg {
    fn default() -> Self {
        AiCfg {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.6,
            max_tokens: 20000,
            timeout_secs: 120,
            referer: "http://localhost:3000".to_string(),
            title: "AppletFlow".to_string(),
        }
    }
}

impl AiCfg {
    /// Configured key, blank counts as missing.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PreviewBackend {
    #[default]
    Memory,
    S3,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct PreviewCfg {
    pub backend: PreviewBackend,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AwsCfg {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,

    #[serde(default = "default_force_path_style")]
    pub force_path_style: bool,

    pub public_base_url: Option<String>,
}

fn default_force_path_style() -> bool {
    true
}

impl AwsCfg {
    /// Base for direct object links: the configured public url, else `{endpoint}/{bucket}`.
    pub fn public_base_url(&self) -> Option<String> {
        self.public_base_url.clone().or_else(|| {
            self.endpoint
                .as_ref()
                .map(|endpoint| format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket))
        })
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub allowed_origin: String,
    pub public_url: String,
    pub data_dir: PathBuf,
    pub autosave_delay_ms: u64,
    pub ai: AiCfg,
    pub preview: PreviewCfg,
    pub aws: Option<AwsCfg>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3001,
            allowed_origin: "http://localhost:3000".to_string(),
            public_url: "http://localhost:3001".to_string(),
            data_dir: PathBuf::from("data"),
            autosave_delay_ms: 1000,
            ai: AiCfg::default(),
            preview: PreviewCfg::default(),
            aws: None,
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self, AppletflowError> {
        let config: Config = toml::from_str(contents)?;

        if config.preview.backend == PreviewBackend::S3 && config.aws.is_none() {
            return Err(AppletflowError::ConfigError(
                "preview.backend = \"s3\" requires an [aws] section".to_string(),
            ));
        }

        Ok(config)
    }

    /// `OPENROUTER_API_KEY` and `DEFAULT_MODEL` take precedence over the file.
    pub fn apply_env(&mut self) {
        if let Ok(key) = env::var("OPENROUTER_API_KEY") {
            self.ai.api_key = Some(key);
        }

        if let Ok(model) = env::var("DEFAULT_MODEL") {
            if !model.trim().is_empty() {
                self.ai.model = model;
            }
        }
    }
}

#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub local_store: LocalStore,
    pub workflow: Arc<RwLock<Workflow>>,
    pub history: Arc<Mutex<HistoryLog>>,
    pub preview_store: Arc<PreviewStore>,
    pub ai_client: Arc<OpenRouterClient>,
    pub generation_lock: Arc<GenerationLock>,
    pub autosave: Autosave,
}

impl App {
    pub async fn new() -> Result<Self, AppletflowError> {
        dotenv::dotenv().ok();

        let env = env::var("ENV").map_err(|_| AppletflowError::ConfigError("ENV must be set".to_string()))?;
        let config_file = format!("config.{}.toml", env);
        let contents = fs::read_to_string(&config_file)
            .map_err(|e| AppletflowError::ConfigError(format!("Unable to read {}: {}", config_file, e)))?;

        let mut config = Config::parse(&contents)?;
        config.apply_env();

        let local_store = LocalStore::init_resource(&config.data_dir).await?;
        let preview_store = PreviewStore::init_resource(&config).await?;
        let ai_client = OpenRouterClient::init_resource(&config.ai).await?;

        Ok(Self::from_parts(config, local_store, preview_store, ai_client))
    }

    /// Restores persisted state from `local_store` and starts the autosave task.
    pub fn from_parts(
        config: Config,
        local_store: LocalStore,
        preview_store: PreviewStore,
        ai_client: OpenRouterClient,
    ) -> Self {
        let workflow: Workflow = local_store.get(WORKFLOW_KEY).unwrap_or_default();
        let workflow = Arc::new(RwLock::new(workflow));
        let history = HistoryLog::load(local_store.clone());
        let autosave = Autosave::spawn(
            workflow.clone(),
            local_store.clone(),
            Duration::from_millis(config.autosave_delay_ms),
        );

        Self {
            config,
            local_store,
            workflow,
            history: Arc::new(Mutex::new(history)),
            preview_store: Arc::new(preview_store),
            ai_client: Arc::new(ai_client),
            generation_lock: Arc::new(GenerationLock::default()),
            autosave,
        }
    }

    /// Init processes that need to be run on startup
    pub fn init(&self) {
        // init logger
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

        let nodes = self.workflow.read().map(|w| w.nodes.len()).unwrap_or_default();
        let generations = self.history.lock().map(|h| h.len()).unwrap_or_default();

        log::info!(
            "restored workflow with {} node(s) and {} generation(s) from {}",
            nodes,
            generations,
            self.config.data_dir.display()
        );
        log::info!("AI model: {}", self.ai_client.model());
    }

    /// Copy of the current graph.
    pub fn workflow(&self) -> Result<Workflow, AppletflowError> {
        Ok(self.workflow.read()?.clone())
    }

    /// Applies `change` under the write lock and schedules an autosave when it succeeds.
    pub fn mutate_workflow<T>(
        &self,
        change: impl FnOnce(&mut Workflow) -> Result<T, AppletflowError>,
    ) -> Result<T, AppletflowError> {
        let result = {
            let mut workflow = self.workflow.write()?;
            change(&mut *workflow)?
        };

        self.autosave.notify();

        Ok(result)
    }

    /// Preview id shared by every generation, minted on first use.
    pub fn preview_id(&self) -> Result<String, AppletflowError> {
        if let Some(id) = self.local_store.get::<String>(PREVIEW_ID_KEY) {
            return Ok(id);
        }

        let id = PreviewStore::mint_id();
        self.local_store.set(PREVIEW_ID_KEY, &id)?;

        Ok(id)
    }

    pub fn cors(&self) -> Cors {
        Cors::default()
            .allowed_origin(self.config.allowed_origin.as_str())
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::ACCEPT,
                http::header::ORIGIN,
                http::header::USER_AGENT,
                http::header::CONTENT_TYPE,
            ])
            .expose_headers(vec![http::header::CONTENT_DISPOSITION])
            .max_age(86400)
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory app with no AI key and a short autosave window.
    pub(crate) fn test_app() -> App {
        let config = Config {
            autosave_delay_ms: 10,
            ..Config::default()
        };
        let preview_store = PreviewStore::memory(config.public_url.clone());
        let ai_client = OpenRouterClient::new(&config.ai).unwrap();

        App::from_parts(config, LocalStore::memory(), preview_store, ai_client)
    }

    #[test]
    fn parses_partial_config_with_defaults() {
        let config = Config::parse(
            r#"
            port = 8080
            [ai]
            model = "x/y"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.ai.model, "x/y");
        assert_eq!(config.ai.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.preview.backend, PreviewBackend::Memory);
    }

    #[test]
    fn s3_backend_requires_aws_section() {
        let result = Config::parse("[preview]\nbackend = \"s3\"");

        assert!(matches!(result, Err(AppletflowError::ConfigError(_))));
    }

    #[test]
    fn aws_public_base_url_falls_back_to_endpoint() {
        let config = Config::parse(
            r#"
            [preview]
            backend = "s3"
            [aws]
            bucket = "previews"
            endpoint = "http://localhost:9000/"
            "#,
        )
        .unwrap();

        let aws = config.aws.unwrap();
        assert!(aws.force_path_style);
        assert_eq!(aws.public_base_url().as_deref(), Some("http://localhost:9000/previews"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = AiCfg {
            api_key: Some("  ".to_string()),
            ..AiCfg::default()
        };

        assert_eq!(cfg.api_key(), None);
    }

    #[actix_web::test]
    async fn preview_id_is_stable() {
        let app = test_app();

        let first = app.preview_id().unwrap();

        assert_eq!(app.preview_id().unwrap(), first);
    }
}
