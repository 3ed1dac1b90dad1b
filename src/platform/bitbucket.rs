//! Bitbucket Cloud service implementation

use crate::error::{Error, Result};
use crate::platform::HostingService;
use crate::types::{CascadeOptions, NewPullRequest, PullRequest, RepoRef, Repository};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Public Bitbucket Cloud API root
pub const DEFAULT_API_URL: &str = "https://api.bitbucket.org/2.0";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Branch type kind marking release branches in the branching model
const RELEASE_KIND: &str = "release";

#[derive(Deserialize)]
struct BranchingModel {
    development: Option<DevelopmentBranch>,
    #[serde(default)]
    branch_types: Vec<BranchType>,
}

#[derive(Deserialize)]
struct BranchingModelBranch {
    name: String,
}

/// `name` is null when the model uses the main branch; the resolved
/// branch is then only under `branch`.
#[derive(Deserialize)]
struct DevelopmentBranch {
    name: Option<String>,
    branch: Option<BranchingModelBranch>,
}

impl DevelopmentBranch {
    fn into_name(self) -> Option<String> {
        self.name
            .filter(|name| !name.is_empty())
            .or_else(|| self.branch.map(|b| b.name))
    }
}

#[derive(Deserialize)]
struct BranchType {
    kind: String,
    prefix: String,
}

#[derive(Serialize)]
struct BranchSpec<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct RefSpec<'a> {
    branch: BranchSpec<'a>,
}

#[derive(Serialize)]
struct CreatePrPayload<'a> {
    title: &'a str,
    description: &'a str,
    source: RefSpec<'a>,
    destination: RefSpec<'a>,
    close_source_branch: bool,
}

#[derive(Deserialize)]
struct PrResponse {
    id: u64,
    title: String,
    source: PrResponseRef,
    destination: PrResponseRef,
    #[serde(default)]
    links: PrResponseLinks,
}

#[derive(Deserialize)]
struct PrResponseRef {
    branch: BranchingModelBranch,
}

#[derive(Deserialize, Default)]
struct PrResponseLinks {
    html: Option<PrResponseHref>,
}

#[derive(Deserialize)]
struct PrResponseHref {
    href: String,
}

impl From<PrResponse> for PullRequest {
    fn from(pr: PrResponse) -> Self {
        Self {
            id: pr.id,
            title: pr.title,
            source: pr.source.branch.name,
            destination: pr.destination.branch.name,
            html_url: pr.links.html.map(|l| l.href),
        }
    }
}

/// Bitbucket service using reqwest with basic authentication
pub struct BitbucketService {
    client: Client,
    api_url: String,
    username: String,
    password: String,
}

impl BitbucketService {
    /// Create a new Bitbucket service
    pub fn new(
        api_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent("cascade-merge")
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Bitbucket(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    fn repo_url(&self, repo: &RepoRef, path: &str) -> String {
        format!(
            "{}/repositories/{}/{}{}",
            self.api_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            path
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
    }
}

#[async_trait]
impl HostingService for BitbucketService {
    async fn clone_url(&self, repo: &RepoRef, protocol: &str) -> Result<String> {
        debug!(repo = %repo, protocol, "fetching clone url");
        let url = self.repo_url(repo, "");

        let repository: Repository = self
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Bitbucket(e.to_string()))?
            .json()
            .await?;

        let clone_url = repository.clone_url(&[protocol])?;
        debug!(repo = %repo, clone_url = %clone_url, "resolved clone url");
        Ok(clone_url)
    }

    async fn cascade_options(&self, repo: &RepoRef) -> Result<CascadeOptions> {
        debug!(repo = %repo, "fetching branching model");
        let url = self.repo_url(repo, "/branching-model");

        let model: BranchingModel = self
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Bitbucket(e.to_string()))?
            .json()
            .await?;

        let development_branch = model
            .development
            .and_then(DevelopmentBranch::into_name)
            .ok_or_else(|| {
                Error::Bitbucket(format!("branching model of {repo} has no development branch"))
            })?;

        let release_prefix = model
            .branch_types
            .into_iter()
            .find(|t| t.kind == RELEASE_KIND)
            .map(|t| t.prefix)
            .ok_or_else(|| Error::MissingReleaseBranchType(repo.to_string()))?;

        debug!(
            repo = %repo,
            development_branch = %development_branch,
            release_prefix = %release_prefix,
            "resolved cascade options"
        );
        Ok(CascadeOptions {
            development_branch,
            release_prefix,
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequest> {
        debug!(
            repo = %repo,
            source = %request.source,
            destination = %request.destination,
            "creating pull request"
        );
        let url = self.repo_url(repo, "/pullrequests");

        let payload = CreatePrPayload {
            title: &request.title,
            description: &request.description,
            source: RefSpec {
                branch: BranchSpec {
                    name: &request.source,
                },
            },
            destination: RefSpec {
                branch: BranchSpec {
                    name: &request.destination,
                },
            },
            close_source_branch: false,
        };

        let pr: PrResponse = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Bitbucket(e.to_string()))?
            .json()
            .await?;

        let pr: PullRequest = pr.into();
        debug!(repo = %repo, pr_id = pr.id, "created pull request");
        Ok(pr)
    }
}
