//! Sharing profile files and the `--profile` argument.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Result, SharingError};

const MAX_CREDENTIALS_VERSION: u32 = 1;

/// Credentials file handed out by a sharing server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub share_credentials_version: u32,
    pub endpoint: String,
    pub bearer_token: String,
    #[serde(default)]
    pub expiration_time: Option<String>,
}

impl Profile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| SharingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut profile: Profile = serde_json::from_str(text)?;
        if profile.share_credentials_version > MAX_CREDENTIALS_VERSION {
            return Err(SharingError::profile(format!(
                "shareCredentialsVersion {} is newer than the supported version {}",
                profile.share_credentials_version, MAX_CREDENTIALS_VERSION
            )));
        }
        if profile.endpoint.trim().is_empty() {
            return Err(SharingError::profile("endpoint is empty"));
        }
        while profile.endpoint.ends_with('/') {
            profile.endpoint.pop();
        }
        Ok(profile)
    }
}

/// Optional `share.schema.table` that preselects a table at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCoordinate {
    pub share: String,
    pub schema: String,
    pub table: String,
}

impl TableCoordinate {
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, '.');
        let share = parts.next()?.trim();
        let schema = parts.next()?.trim();
        let table = parts.next()?.trim();
        if share.is_empty() || schema.is_empty() || table.is_empty() {
            return None;
        }
        Some(Self {
            share: share.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }
}

/// The `--profile` value: `<path>[#<share>.<schema>.<table>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLocator {
    pub path: PathBuf,
    pub table: Option<TableCoordinate>,
}

impl ProfileLocator {
    pub fn parse(arg: &str) -> Self {
        match arg.split_once('#') {
            Some((path, coordinate)) => Self {
                path: PathBuf::from(path),
                table: TableCoordinate::parse(coordinate),
            },
            None => Self {
                path: PathBuf::from(arg),
                table: None,
            },
        }
    }
}
