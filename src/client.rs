use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

use crate::datasets::DEFAULT_URL;
use crate::error::{Error, Result};
use crate::request::Request;

const TOKEN_HEADER: &str = "private-token";

/// Outcome of a completed retrieval.
#[derive(Debug, Clone)]
pub struct Download {
    pub database: String,
    pub target: PathBuf,
    pub job_id: Option<String>,
    pub size_bytes: u64,
}

/// Anything that can fetch a CDS dataset request into a file.
pub trait Retrieve {
    fn retrieve(&self, database: &str, request: &Request, target: &Path) -> Result<Download>;
}

/// API endpoint and key, as found in `~/.cdsapirc` or the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl Credentials {
    /// `CDSAPI_URL`/`CDSAPI_KEY` first, then the rc file named by `CDSAPI_RC`
    /// or `~/.cdsapirc`.
    pub fn from_env() -> Result<Self> {
        let rc = match env::var_os("CDSAPI_RC") {
            Some(p) => Ok(PathBuf::from(p)),
            None => env::var_os("HOME")
                .map(|h| PathBuf::from(h).join(".cdsapirc"))
                .ok_or_else(|| {
                    Error::MissingCredentials("HOME is not set and CDSAPI_RC is empty".into())
                }),
        };
        Self::resolve(env::var("CDSAPI_URL").ok(), env::var("CDSAPI_KEY").ok(), rc)
    }

    /// Layer explicit url/key values over the rc file. Blank values count as unset.
    pub fn resolve(
        url: Option<String>,
        key: Option<String>,
        rc: Result<PathBuf>,
    ) -> Result<Self> {
        let url = url.filter(|u| !u.trim().is_empty());
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            return Ok(Self {
                url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
                key,
            });
        }

        let mut creds = Self::from_rc_file(&rc?)?;
        if let Some(url) = url {
            creds.url = url;
        }
        Ok(creds)
    }

    pub fn from_rc_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingCredentials(format!(
                "{} not found; set CDSAPI_KEY or create the file",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)?;
        Self::parse_rc(&text).map_err(|e| match e {
            Error::MissingCredentials(msg) => {
                Error::MissingCredentials(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse `key: value` lines. Unknown keys and comments are ignored.
    pub fn parse_rc(text: &str) -> Result<Self> {
        let mut url = None;
        let mut key = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((k, v)) = line.split_once(':') else {
                continue;
            };
            match k.trim() {
                "url" => url = Some(v.trim().to_string()),
                "key" => key = Some(v.trim().to_string()),
                _ => {}
            }
        }

        let key = key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::MissingCredentials("no `key:` entry".into()))?;
        Ok(Self {
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            key,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub verify_tls: bool,
    /// Honour `HTTP(S)_PROXY` from the environment.
    pub use_system_proxy: bool,
    /// First delay between job status polls.
    pub sleep_min: Duration,
    /// Upper bound on the delay between job status polls.
    pub sleep_max: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            verify_tls: true,
            use_system_proxy: true,
            sleep_min: Duration::from_secs(1),
            sleep_max: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Accepted,
    Running,
    Successful,
    Failed,
    Dismissed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: JobState,
}

#[derive(Debug, Deserialize)]
struct Results {
    asset: Asset,
}

#[derive(Debug, Deserialize)]
struct Asset {
    value: AssetValue,
}

#[derive(Debug, Deserialize)]
struct AssetValue {
    href: String,
    #[serde(rename = "file:size")]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    title: Option<String>,
    detail: Option<String>,
}

impl ErrorBody {
    fn message(self) -> String {
        match (self.title, self.detail) {
            (Some(t), Some(d)) => format!("{t}: {d}"),
            (Some(t), None) => t,
            (None, Some(d)) => d,
            (None, None) => "no details given".to_string(),
        }
    }
}

/// Blocking client for the CDS retrieve API.
#[derive(Debug, Clone)]
pub struct Client {
    opts: ClientOptions,
    base_url: Url,
    http: HttpClient,
}

impl Client {
    pub fn new(credentials: Credentials, opts: ClientOptions) -> Result<Self> {
        let base = credentials.url.trim_end_matches('/');
        let base_url = Url::parse(&format!("{base}/"))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("era5-cds-rs/0.1"));
        let mut token = HeaderValue::from_str(&credentials.key)
            .map_err(|_| Error::MissingCredentials("key contains invalid characters".into()))?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let mut builder = HttpClient::builder()
            .default_headers(headers)
            .connect_timeout(opts.connect_timeout)
            // Results can be large; no overall deadline on a transfer.
            .timeout(None::<Duration>);
        if !opts.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if !opts.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            opts,
            base_url,
            http,
        })
    }

    /// Client configured from `CDSAPI_*` variables or `~/.cdsapirc`.
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env()?, ClientOptions::default())
    }

    pub fn execution_url(&self, database: &str) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("retrieve/v1/processes/{database}/execution"))?)
    }

    pub fn job_url(&self, job_id: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("retrieve/v1/jobs/{job_id}"))?)
    }

    pub fn results_url(&self, job_id: &str) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("retrieve/v1/jobs/{job_id}/results"))?)
    }

    /// Submit a request; returns the job as first reported by the service.
    pub fn submit(&self, database: &str, request: &Request) -> Result<JobStatus> {
        let url = self.execution_url(database)?;
        debug!(%url, "submitting request");
        let resp = self.http.post(url).json(&json!({ "inputs": request })).send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let msg = resp
                .json::<ErrorBody>()
                .map(ErrorBody::message)
                .unwrap_or_else(|_| status.to_string());
            return Err(Error::InvalidRequest(format!(
                "{database} rejected the request: {msg}"
            )));
        }
        Ok(resp.json()?)
    }

    pub fn status(&self, job_id: &str) -> Result<JobStatus> {
        Ok(self
            .http
            .get(self.job_url(job_id)?)
            .send()?
            .error_for_status()?
            .json()?)
    }

    /// Poll until the job leaves the queue.
    pub fn wait(&self, mut job: JobStatus) -> Result<JobStatus> {
        let mut sleep = self.opts.sleep_min;
        loop {
            match job.status {
                JobState::Successful => return Ok(job),
                JobState::Failed | JobState::Dismissed => {
                    let message = self.failure_message(&job.job_id);
                    return Err(Error::JobFailed {
                        job_id: job.job_id,
                        message,
                    });
                }
                JobState::Accepted | JobState::Running | JobState::Unknown => {
                    debug!(job_id = %job.job_id, state = ?job.status, ?sleep, "job pending");
                    thread::sleep(sleep);
                    sleep = next_sleep(sleep, self.opts.sleep_max);
                    job = self.status(&job.job_id)?;
                }
            }
        }
    }

    fn failure_message(&self, job_id: &str) -> String {
        let fetch = || -> Result<String> {
            let body: ErrorBody = self.http.get(self.results_url(job_id)?).send()?.json()?;
            Ok(body.message())
        };
        fetch().unwrap_or_else(|e| format!("could not fetch error details: {e}"))
    }

    /// Stream the job's result asset into `target`.
    pub fn download(&self, job_id: &str, target: &Path) -> Result<u64> {
        let results: Results = self
            .http
            .get(self.results_url(job_id)?)
            .send()?
            .error_for_status()?
            .json()?;
        let asset = results.asset.value;
        let href = self.base_url.join(&asset.href)?;
        info!(%href, target = %target.display(), size = ?asset.size, "downloading");

        let mut resp = self.http.get(href).send()?.error_for_status()?;

        // Stage next to the target so a failed transfer leaves any existing file alone.
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        let written = resp.copy_to(staged.as_file_mut())?;

        if let Some(expected) = asset.size {
            if expected != written {
                return Err(Error::UnexpectedResponse(format!(
                    "downloaded {written} bytes, expected {expected}"
                )));
            }
        }
        staged.persist(target).map_err(|e| e.error)?;
        Ok(written)
    }
}

impl Retrieve for Client {
    fn retrieve(&self, database: &str, request: &Request, target: &Path) -> Result<Download> {
        let job = self.submit(database, request)?;
        info!(job_id = %job.job_id, database, "request queued");
        let job = self.wait(job)?;
        let size_bytes = self.download(&job.job_id, target)?;
        Ok(Download {
            database: database.to_string(),
            target: target.to_path_buf(),
            job_id: Some(job.job_id),
            size_bytes,
        })
    }
}

fn next_sleep(current: Duration, max: Duration) -> Duration {
    current.mul_f64(1.5).min(max)
}
