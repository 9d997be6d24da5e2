//! Test helpers: an upload pipeline over in-memory collaborators and fake media tools.
//!
//! Nothing here needs Postgres, ffmpeg or network access. Run with `cargo test -p tubely-api`.

#![allow(dead_code)]

pub mod sources;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::AsyncRead;
use tubely_api::auth::JwtAuthenticator;
use tubely_api::services::upload::{UploadPipeline, UploadPipelineConfig};
use tubely_api::setup::routes;
use tubely_api::state::AppState;
use tubely_core::models::Video;
use tubely_core::{AppError, BaseConfig, Config, StorageBackend, UploadServiceConfig, UrlStrategyKind};
use tubely_db::{MemoryVideoRepository, VideoRepository};
use tubely_processing::fake::{FakeProbe, FakeProber, FakeRemux, FakeRemuxer};
use tubely_processing::Stager;
use tubely_storage::{
    MemoryStorage, Storage, StorageError, StorageResult, StoredObject, UrlStrategy,
};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-that-is-at-least-32-chars";
pub const ASSETS_BASE_URL: &str = "http://localhost:8091/assets";

/// Knobs for [`TestApp::start`].
pub struct TestOptions {
    pub probe: FakeProbe,
    pub remux: FakeRemux,
    pub fail_publish: bool,
    pub fail_update: bool,
    /// The record disappears between lookup and update
    pub lose_record: bool,
    pub fail_delete: bool,
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            probe: FakeProbe::Dimensions(1920, 1080),
            remux: FakeRemux::CopyInput,
            fail_publish: false,
            fail_update: false,
            lose_record: false,
            fail_delete: false,
            max_video_bytes: 1024 * 1024,
            max_thumbnail_bytes: 64 * 1024,
        }
    }
}

/// Pipeline plus handles on everything it talks to.
pub struct TestApp {
    pub pipeline: Arc<UploadPipeline>,
    pub storage: Arc<MemoryStorage>,
    pub videos: MemoryVideoRepository,
    pub prober: Arc<FakeProber>,
    pub remuxer: Arc<FakeRemuxer>,
    pub authenticator: JwtAuthenticator,
    pub staging_dir: TempDir,
    /// Routes are served from this storage, so it includes any injected failures
    published: Arc<dyn Storage>,
}

impl TestApp {
    pub async fn start() -> Self {
        Self::start_with(TestOptions::default()).await
    }

    pub async fn start_with(options: TestOptions) -> Self {
        let staging_dir = tempfile::tempdir().expect("Failed to create staging directory");
        let storage = Arc::new(MemoryStorage::new());
        let videos = MemoryVideoRepository::new();
        let prober = Arc::new(FakeProber::with_outcome(options.probe));
        let remuxer = Arc::new(FakeRemuxer::with_behaviour(options.remux));

        let published: Arc<dyn Storage> = Arc::new(FlakyStorage {
            inner: storage.clone(),
            fail_puts: options.fail_publish,
            fail_deletes: options.fail_delete,
        });
        let repository: Arc<dyn VideoRepository> = Arc::new(FlakyVideos {
            inner: videos.clone(),
            fail_updates: options.fail_update,
            lose_record: options.lose_record,
        });

        let config = UploadPipelineConfig {
            stager: Stager::new(Some(staging_dir.path().to_path_buf())),
            urls: UrlStrategy::LocalMount {
                base_url: ASSETS_BASE_URL.to_string(),
            },
            max_video_bytes: options.max_video_bytes,
            max_thumbnail_bytes: options.max_thumbnail_bytes,
            max_concurrent_transcodes: 2,
        };

        let pipeline = UploadPipeline::new(
            Arc::new(JwtAuthenticator::new(TEST_JWT_SECRET)),
            repository,
            published.clone(),
            prober.clone(),
            remuxer.clone(),
            config,
        );

        Self {
            pipeline: Arc::new(pipeline),
            storage,
            videos,
            prober,
            remuxer,
            authenticator: JwtAuthenticator::new(TEST_JWT_SECRET),
            staging_dir,
            published,
        }
    }

    /// Insert a video owned by a fresh user and return it.
    pub async fn create_video(&self) -> Video {
        let video = Video::new(Uuid::new_v4(), "Boots demo");
        self.videos.insert(video.clone()).await;
        video
    }

    pub fn bearer(&self, user_id: Uuid) -> String {
        let token = self
            .authenticator
            .issue(user_id, chrono::Duration::hours(1))
            .expect("Failed to issue token");
        format!("Bearer {}", token)
    }

    pub async fn stored_video(&self, id: Uuid) -> Video {
        self.videos
            .get(id)
            .await
            .expect("Repository error")
            .expect("Video missing")
    }

    /// Files left in the staging directory. Zero after every request, successful or not.
    pub fn staging_entries(&self) -> usize {
        count_entries(self.staging_dir.path())
    }

    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            config: test_config(self.staging_dir.path()),
            pipeline: self.pipeline.clone(),
            storage: self.published.clone(),
        });
        routes::build_router(state)
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router().into_make_service()).expect("Failed to create test server")
    }
}

pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("Failed to read staging directory")
        .count()
}

pub fn test_config(staging_dir: &Path) -> Config {
    Config(Box::new(UploadServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            db_max_connections: 1,
            db_timeout_seconds: 1,
            log_format: "compact".to_string(),
        },
        database_url: "postgres://localhost/tubely_test".to_string(),
        storage_backend: StorageBackend::Memory,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: None,
        public_url_strategy: UrlStrategyKind::Local,
        assets_base_url: ASSETS_BASE_URL.to_string(),
        cloudfront_distribution: None,
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        max_video_size_bytes: 1024 * 1024,
        max_thumbnail_size_bytes: 64 * 1024,
        max_concurrent_transcodes: 2,
        staging_dir: Some(staging_dir.to_path_buf()),
    }))
}

/// Memory storage that can be told to fail writes or deletes.
struct FlakyStorage {
    inner: Arc<MemoryStorage>,
    fail_puts: bool,
    fail_deletes: bool,
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn put(&self, storage_key: &str, content_type: &str, data: Vec<u8>) -> StorageResult<()> {
        if self.fail_puts {
            return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
        }
        self.inner.put(storage_key, content_type, data).await
    }

    async fn put_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<()> {
        if self.fail_puts {
            return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
        }
        self.inner
            .put_stream(storage_key, content_type, content_length, reader)
            .await
    }

    async fn get(&self, storage_key: &str) -> StorageResult<StoredObject> {
        self.inner.get(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_deletes {
            return Err(StorageError::DeleteFailed("bucket unavailable".to_string()));
        }
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

/// Memory repository whose updates can be made to fail.
struct FlakyVideos {
    inner: MemoryVideoRepository,
    fail_updates: bool,
    lose_record: bool,
}

#[async_trait]
impl VideoRepository for FlakyVideos {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        self.inner.get(id).await
    }

    async fn update(&self, video: &Video) -> Result<Video, AppError> {
        if self.fail_updates {
            return Err(AppError::Internal("connection reset".to_string()));
        }
        if self.lose_record {
            return Err(AppError::NotFound(format!("Video {} not found", video.id)));
        }
        self.inner.update(video).await
    }
}
