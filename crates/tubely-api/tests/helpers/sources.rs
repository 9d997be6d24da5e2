//! In-memory request bodies for driving the pipeline without HTTP.

use async_trait::async_trait;
use std::io::Cursor;
use tubely_api::services::upload::{stage_part, PartRules, PartSource, StagedPart, UploadError};
use tubely_processing::Stager;

pub struct MemoryPart {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Form parts held in memory.
#[derive(Default)]
pub struct MemoryParts {
    parts: Vec<MemoryPart>,
}

impl MemoryParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_part(mut self, name: &str, content_type: Option<&str>, data: &[u8]) -> Self {
        self.parts.push(MemoryPart {
            name: name.to_string(),
            content_type: content_type.map(str::to_string),
            data: data.to_vec(),
        });
        self
    }

    pub fn video(data: &[u8]) -> Self {
        Self::new().with_part("video", Some("video/mp4"), data)
    }

    pub fn thumbnail(content_type: &str, data: &[u8]) -> Self {
        Self::new().with_part("thumbnail", Some(content_type), data)
    }
}

#[async_trait]
impl PartSource for MemoryParts {
    async fn stage_file(
        &mut self,
        rules: &PartRules,
        stager: &Stager,
    ) -> Result<StagedPart, UploadError> {
        let position = self
            .parts
            .iter()
            .position(|part| part.name == rules.field_name)
            .ok_or_else(|| {
                UploadError::BadInput(format!("Unable to find form file '{}'", rules.field_name))
            })?;
        let part = self.parts.remove(position);

        stage_part(
            rules,
            part.content_type.as_deref(),
            Cursor::new(part.data),
            stager,
        )
        .await
    }
}
