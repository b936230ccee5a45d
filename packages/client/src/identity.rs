//! Identity Resolver
//!
//! 参加者の識別子を決定します。ログイン済みならアカウント ID、
//! そうでなければ永続化されたゲスト ID を使います。
//! 表示名と色もゲスト ID と同じファイルに保存します。

use std::{fs, path::PathBuf};

use groove_shared::{protocol::ProfileDto, time::now_millis};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const PROFILE_FILE_NAME: &str = "groove-profile.json";
pub const DEFAULT_DISPLAY_NAME: &str = "Guest";
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Stable participant identifier used for authority and attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Account(String),
    Guest(String),
}

impl Identity {
    pub fn id(&self) -> &str {
        match self {
            Self::Account(id) | Self::Guest(id) => id,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

/// Locally persisted guest profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub guest_id: String,
    pub display_name: String,
    pub color: String,
}

impl StoredProfile {
    fn fresh() -> Self {
        Self {
            guest_id: generate_guest_id(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// `guest_{random}_{millis}`; uniqueness is best effort, not a security property
pub fn generate_guest_id() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("guest_{}_{}", &random[..9], now_millis())
}

/// Storage for the guest profile
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore {
    fn load(&self) -> Result<Option<StoredProfile>, ClientError>;
    fn save(&self, profile: &StoredProfile) -> Result<(), ClientError>;
}

/// JSON file backed profile store
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> Result<Option<StoredProfile>, ClientError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                // A corrupt file is replaced with a fresh profile.
                tracing::warn!("Ignoring unreadable profile {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, profile: &StoredProfile) -> Result<(), ClientError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(profile)?)?;
        Ok(())
    }
}

/// Identity plus the profile sent with `join_room`
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub profile: ProfileDto,
}

/// Display overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct ProfileOverrides {
    pub display_name: Option<String>,
    pub color: Option<String>,
}

pub struct IdentityResolver<S: ProfileStore> {
    store: S,
}

impl<S: ProfileStore> IdentityResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve the identity, creating and persisting a guest profile on first use.
    ///
    /// A non-empty `account_id` wins over the guest id. Overrides are
    /// persisted so the next run keeps them.
    pub fn resolve(
        &self,
        account_id: Option<&str>,
        overrides: &ProfileOverrides,
    ) -> Result<ResolvedIdentity, ClientError> {
        let (mut stored, mut dirty) = match self.store.load()? {
            Some(stored) => (stored, false),
            None => (StoredProfile::fresh(), true),
        };

        if let Some(name) = non_empty(overrides.display_name.as_deref())
            && name != stored.display_name
        {
            stored.display_name = name.to_string();
            dirty = true;
        }
        if let Some(color) = non_empty(overrides.color.as_deref())
            && color != stored.color
        {
            stored.color = color.to_string();
            dirty = true;
        }
        if dirty {
            self.store.save(&stored)?;
        }

        let identity = match non_empty(account_id) {
            Some(account_id) => Identity::Account(account_id.to_string()),
            None => Identity::Guest(stored.guest_id.clone()),
        };
        tracing::debug!("Resolved identity {:?}", identity);

        Ok(ResolvedIdentity {
            identity,
            profile: ProfileDto {
                display_name: stored.display_name,
                color: stored.color,
            },
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
