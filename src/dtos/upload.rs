//! Upload DTOs

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UploadDTO {
    pub url: String,
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
}
