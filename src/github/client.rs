use crate::types::{FileChange, ReviewRequest};
use anyhow::{Context, Result};
use octocrab::Octocrab;
use tracing::{debug, info};

/// GitHub API client: fetches the pull request under review and posts
/// the finished report back as a comment.
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a new GitHub client with authentication token
    pub fn new(token: String) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self { client })
    }

    /// Build a review request from a pull request: the description is
    /// the PR title and body, and each changed file carries its patch
    /// excerpt for prompt context.
    pub async fn fetch_review_request(&self, repo: &str, pr_number: u64) -> Result<ReviewRequest> {
        info!("Fetching PR data for {}/pull/{}", repo, pr_number);

        let (owner, repo_name) = Self::parse_repo(repo)?;

        let pr = self
            .client
            .pulls(&owner, &repo_name)
            .get(pr_number)
            .await
            .context("Failed to fetch PR details")?;

        let files = self
            .client
            .pulls(&owner, &repo_name)
            .list_files(pr_number)
            .await
            .context("Failed to fetch PR files")?;

        let changed_files: Vec<FileChange> = files
            .into_iter()
            .map(|file| FileChange {
                filename: file.filename,
                additions: file.additions as u32,
                deletions: file.deletions as u32,
                patch: file.patch,
            })
            .collect();

        debug!("Found {} changed files in PR", changed_files.len());

        let title = pr.title.unwrap_or_default();
        let description = match pr.body {
            Some(body) if !body.is_empty() => format!("{}\n\n{}", title, body),
            _ => title,
        };

        let mut request = ReviewRequest::new(description, changed_files);
        request.repository = Some(repo.to_string());
        request.pr_number = Some(pr_number);

        Ok(request)
    }

    /// Post the merged review document as a PR comment
    pub async fn post_report_comment(&self, repo: &str, pr_number: u64, body: &str) -> Result<()> {
        let (owner, repo_name) = Self::parse_repo(repo)?;

        self.client
            .issues(&owner, &repo_name)
            .create_comment(pr_number, body)
            .await
            .context("Failed to post PR comment")?;

        info!("Posted review comment on PR #{}", pr_number);
        Ok(())
    }

    /// Parse repository string into owner and name
    fn parse_repo(repo: &str) -> Result<(String, String)> {
        let parts: Vec<&str> = repo.split('/').collect();
        if parts.len() != 2 {
            return Err(anyhow::anyhow!(
                "Invalid repository format. Expected 'owner/repo', got '{}'",
                repo
            ));
        }
        Ok((parts[0].to_string(), parts[1].to_string()))
    }

    /// Check if the client can authenticate
    pub async fn check_authentication(&self) -> Result<String> {
        let user = self
            .client
            .current()
            .user()
            .await
            .context("Failed to authenticate with GitHub")?;

        Ok(user.login)
    }
}
