use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::UPLOADS_URL_PREFIX;

/// Purpose an uploaded image is stored for.
///
/// Each category owns its own directory on disk and its own URL namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum StorageCategory {
    #[serde(rename = "profileImage")]
    Profile,
    #[serde(rename = "postImage")]
    Post,
}

impl StorageCategory {
    pub const ALL: [StorageCategory; 2] = [StorageCategory::Profile, StorageCategory::Post];

    /// Path segment used both for the directory name and the URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageCategory::Profile => "profileImage",
            StorageCategory::Post => "postImage",
        }
    }

    /// `/uploads/<category>/<file_name>`
    pub fn file_url(&self, file_name: &str) -> String {
        format!("{}/{}/{}", UPLOADS_URL_PREFIX, self.as_str(), file_name)
    }

    /// Human readable label used in upload responses.
    pub fn label(&self) -> &'static str {
        match self {
            StorageCategory::Profile => "Profile image",
            StorageCategory::Post => "Post image",
        }
    }
}

impl FromStr for StorageCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profileImage" => Ok(StorageCategory::Profile),
            "postImage" => Ok(StorageCategory::Post),
            _ => Err(anyhow::anyhow!("Invalid storage category: {}", s)),
        }
    }
}

impl Display for StorageCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
