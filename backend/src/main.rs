use std::sync::Arc;

use anyhow::Context;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use backend::{
    jwt::JwtManager,
    media_storage::MediaStorage,
    server,
    types::{Environment, StorageConfig},
};
use flashcards_storage::image::ImageStorage;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON logs for staging/production, human readable for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let config_path = environment.config_path();
    let storage_config = StorageConfig::load(&config_path)
        .with_context(|| format!("failed to load storage config from {}", config_path.display()))?;
    tracing::info!(?storage_config, "Loaded storage config");

    let aws_config = environment.aws_config(&storage_config).await;

    let s3_client = Arc::new(S3Client::from_conf(
        environment.s3_client_config(&aws_config),
    ));
    let public_base_url = storage_config.public_base_url(&environment);
    let public_base_url = Url::parse(&public_base_url)
        .with_context(|| format!("invalid public bucket URL {public_base_url}"))?;
    let media_storage = Arc::new(MediaStorage::new(
        s3_client,
        storage_config.bucket_name.clone(),
        public_base_url,
    ));

    let dynamodb_client = Arc::new(DynamoDbClient::new(&aws_config));
    let image_storage = Arc::new(ImageStorage::new(
        dynamodb_client,
        environment.images_table_name(),
    ));

    let jwt_manager = Arc::new(JwtManager::new(environment.jwt_secret()));

    server::start(environment, image_storage, media_storage, jwt_manager).await
}
