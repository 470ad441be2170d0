use crate::app::{AiCfg, AwsCfg, Config, PreviewBackend};
use crate::errors::AppletflowError;
use crate::services::ai::OpenRouterClient;
use crate::services::local_store::LocalStore;
use crate::services::preview::{PreviewStorage, PreviewStore, S3Storage};
use aws_config::BehaviorVersion;
use std::path::Path;
use std::sync::Arc;

/// Resources live for the whole application runtime.
/// Usually clients of external services: S3, the AI provider, the data directory.
#[allow(async_fn_in_trait)]
pub trait Resource<'a>: Sized {
    type Cfg;

    async fn init_resource(config: Self::Cfg) -> Result<Self, AppletflowError>;
}

impl<'a> Resource<'a> for aws_sdk_s3::Client {
    type Cfg = &'a AwsCfg;

    async fn init_resource(config: Self::Cfg) -> Result<Self, AppletflowError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(aws_sdk_s3::Client::from_conf(builder.build()))
    }
}

impl<'a> Resource<'a> for OpenRouterClient {
    type Cfg = &'a AiCfg;

    async fn init_resource(config: Self::Cfg) -> Result<Self, AppletflowError> {
        OpenRouterClient::new(config)
    }
}

impl<'a> Resource<'a> for LocalStore {
    type Cfg = &'a Path;

    async fn init_resource(data_dir: Self::Cfg) -> Result<Self, AppletflowError> {
        LocalStore::file(data_dir)
    }
}

impl<'a> Resource<'a> for PreviewStore {
    type Cfg = &'a Config;

    async fn init_resource(config: Self::Cfg) -> Result<Self, AppletflowError> {
        let storage = match config.preview.backend {
            PreviewBackend::Memory => PreviewStorage::Memory(Default::default()),
            PreviewBackend::S3 => {
                let aws = config.aws.as_ref().ok_or_else(|| {
                    AppletflowError::ConfigError("preview.backend = \"s3\" requires an [aws] section".to_string())
                })?;
                let client = aws_sdk_s3::Client::init_resource(aws).await?;

                PreviewStorage::S3(S3Storage {
                    client: Arc::new(client),
                    bucket: aws.bucket.clone(),
                    public_base_url: aws.public_base_url(),
                })
            }
        };

        log::info!("preview store backend: {}", config.preview.backend);

        Ok(PreviewStore::new(storage, config.public_url.clone()))
    }
}
