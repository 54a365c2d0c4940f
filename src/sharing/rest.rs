//! Blocking REST implementation of [`SharingClient`].

use std::time::Duration;

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::model::{File, FileSet, Metadata, Protocol, Schema, Share, Table};
use super::profile::Profile;
use super::{Result, SharingClient, SharingError};

const USER_AGENT: &str = concat!("rime/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Rows per decoded batch; only the first batch is ever shown.
    pub batch_rows: usize,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            batch_rows: 1000,
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct RestClient {
    http: Client,
    profile: Profile,
    batch_rows: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryLine {
    protocol: Option<Protocol>,
    meta_data: Option<Metadata>,
    file: Option<File>,
}

impl RestClient {
    pub fn new(profile: Profile, options: ClientOptions) -> Result<Self> {
        let endpoint = profile.endpoint.clone();
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .build()
            .map_err(|source| SharingError::Http {
                url: endpoint,
                source,
            })?;
        Ok(Self {
            http,
            profile,
            batch_rows: options.batch_rows.max(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.profile.endpoint
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.profile.endpoint)
            .map_err(|e| SharingError::profile(format!("bad endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SharingError::profile("endpoint cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn check(url: &Url, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SharingError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.profile.bearer_token)
            .send()
            .map_err(|source| SharingError::Http {
                url: url.to_string(),
                source,
            })?;
        let text = Self::check(&url, response)?
            .text()
            .map_err(|source| SharingError::Http {
                url: url.to_string(),
                source,
            })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn list_paged<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut url = self.url(segments)?;
            if let Some(tok) = &token {
                url.query_pairs_mut().append_pair("pageToken", tok);
            }
            let page: Page<T> = self.get_json(url)?;
            items.extend(page.items);
            match page.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        Ok(items)
    }

    fn download(&self, file: &File) -> Result<Bytes> {
        // pre-signed URL: no bearer token
        let response = self
            .http
            .get(&file.url)
            .send()
            .map_err(|source| SharingError::Http {
                url: file.url.clone(),
                source,
            })?;
        let url = Url::parse(&file.url)
            .map_err(|e| SharingError::unsupported(format!("bad file url: {e}")))?;
        Self::check(&url, response)?
            .bytes()
            .map_err(|source| SharingError::Http {
                url: file.url.clone(),
                source,
            })
    }
}

impl SharingClient for RestClient {
    fn list_shares(&self) -> Result<Vec<Share>> {
        self.list_paged(&["shares"])
    }

    fn list_schemas(&self, share: &Share) -> Result<Vec<Schema>> {
        self.list_paged(&["shares", &share.name, "schemas"])
    }

    fn list_tables(&self, schema: &Schema) -> Result<Vec<Table>> {
        self.list_paged(&["shares", &schema.share, "schemas", &schema.name, "tables"])
    }

    fn list_files_in_table(&self, table: &Table) -> Result<FileSet> {
        let url = self.url(&[
            "shares",
            &table.share,
            "schemas",
            &table.schema,
            "tables",
            &table.name,
            "query",
        ])?;
        tracing::debug!(%url, "POST query");
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(&self.profile.bearer_token)
            .json(&serde_json::json!({}))
            .send()
            .map_err(|source| SharingError::Http {
                url: url.to_string(),
                source,
            })?;
        let body = Self::check(&url, response)?
            .text()
            .map_err(|source| SharingError::Http {
                url: url.to_string(),
                source,
            })?;
        parse_query_response(&body)
    }

    fn load_table(&self, table: &Table, file_id: &str) -> Result<RecordBatch> {
        let files = self.list_files_in_table(table)?;
        let file = files.file(file_id).ok_or_else(|| SharingError::FileNotFound {
            id: file_id.to_string(),
            table: table.coordinate(),
        })?;
        let bytes = self.download(file)?;
        tracing::debug!(file = %file_id, bytes = bytes.len(), "downloaded parquet file");
        first_batch(bytes, self.batch_rows)
    }
}

/// Parse the newline-delimited JSON body of a table query.
pub(crate) fn parse_query_response(body: &str) -> Result<FileSet> {
    let mut protocol = None;
    let mut metadata = None;
    let mut add_files = Vec::new();

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed: QueryLine = serde_json::from_str(line)?;
        if let Some(p) = parsed.protocol {
            protocol = Some(p);
        }
        if let Some(m) = parsed.meta_data {
            metadata = Some(m);
        }
        if let Some(f) = parsed.file {
            add_files.push(f);
        }
    }

    let metadata =
        metadata.ok_or_else(|| SharingError::unsupported("query response has no metaData line"))?;
    if metadata.format.provider != "parquet" && !metadata.format.provider.is_empty() {
        return Err(SharingError::unsupported(format!(
            "file format '{}'",
            metadata.format.provider
        )));
    }
    Ok(FileSet {
        protocol: protocol.unwrap_or_default(),
        metadata,
        add_files,
    })
}

/// Decode the first record batch of a Parquet file.
pub(crate) fn first_batch(bytes: Bytes, batch_rows: usize) -> Result<RecordBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
    let schema = builder.schema().clone();
    let mut reader = builder.with_batch_size(batch_rows).build()?;
    match reader.next() {
        Some(batch) => Ok(batch?),
        None => Ok(RecordBatch::new_empty(schema)),
    }
}
