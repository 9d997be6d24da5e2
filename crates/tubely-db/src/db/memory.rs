use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tubely_core::models::Video;
use tubely_core::AppError;
use uuid::Uuid;

use super::video::VideoRepository;

/// In-memory video repository for development and tests.
#[derive(Clone, Default)]
pub struct MemoryVideoRepository {
    videos: Arc<RwLock<HashMap<Uuid, Video>>>,
}

impl MemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }
}

#[async_trait]
impl VideoRepository for MemoryVideoRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn update(&self, video: &Video) -> Result<Video, AppError> {
        let mut videos = self.videos.write().await;
        let existing = videos
            .get_mut(&video.id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video.id)))?;

        let mut updated = video.clone();
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        *existing = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_existing_video() {
        let repo = MemoryVideoRepository::new();
        let mut video = Video::new(Uuid::new_v4(), "boots");
        repo.insert(video.clone()).await;

        video.video_url = Some("https://cdn.example.com/landscape/a.mp4".to_string());
        let returned = repo.update(&video).await.unwrap();
        assert_eq!(returned.video_url, video.video_url);

        let stored = repo.get(video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url, video.video_url);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_video() {
        let repo = MemoryVideoRepository::new();
        let video = Video::new(Uuid::new_v4(), "ghost");
        let result = repo.update(&video).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(repo.get(video.id).await.unwrap().is_none());
    }
}
