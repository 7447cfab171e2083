//! Wire types for the metadata service API.

use kandan_db::models::{BindingRecord, VideoRecord};
use serde::{Deserialize, Serialize};

/// Body of a `POST /api/v2/match` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// File name without extension.
    pub file_name: String,
    pub file_hash: String,
    pub file_size: i64,
    pub video_duration: i64,
    pub match_mode: &'static str,
}

impl MatchRequest {
    pub fn from_video(video: &VideoRecord) -> Self {
        Self {
            file_name: video.file_name.clone(),
            file_hash: video.hash.clone(),
            file_size: video.file_size,
            video_duration: video.duration_secs,
            match_mode: "hashAndFileName",
        }
    }
}

/// Body of a match response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub is_matched: bool,
    #[serde(default)]
    pub matches: Vec<MatchCandidate>,
}

/// One episode candidate returned by the match endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub anime_id: i64,
    pub episode_id: i64,
    pub anime_title: String,
    pub episode_title: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub type_description: String,
    #[serde(default)]
    pub shift: i64,
}

impl MatchCandidate {
    /// Turn this candidate into a persistent binding for `hash`.
    pub fn into_binding(self, hash: impl Into<String>) -> BindingRecord {
        BindingRecord {
            hash: hash.into(),
            anime_id: self.anime_id,
            episode_id: self.episode_id,
            anime_title: self.anime_title,
            episode_title: self.episode_title,
            source_type: self.source_type,
            source_type_desc: self.type_description,
            shift_secs: self.shift,
        }
    }
}

/// Body of a `GET /api/v2/comment/{episodeId}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub comments: Vec<CommentItem>,
}

/// One raw comment as delivered by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentItem {
    /// Packed attributes: "offset,modeCode,colorCode,authorId".
    pub p: String,
    /// Comment text.
    pub m: String,
}
