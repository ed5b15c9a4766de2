//! GitHub host implementation, wrapping the `gh` CLI.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use super::{AsyncHost, BatchPrStatus, Host, PrRecord, PrSpec, PrState, RepoInfo};

const MAX_RATE_LIMIT_RETRIES: u32 = 3;
const RATE_LIMIT_BASE_DELAY_SECS: u64 = 5;

pub struct GitHubHost {
    /// Custom host for GitHub Enterprise, passed via `GH_HOST`.
    host: Option<String>,
}

impl GitHubHost {
    pub fn new(host: Option<String>) -> Self {
        Self { host }
    }

    fn run_gh(&self, args: &[&str]) -> Result<Output> {
        self.run_gh_with_retry(args, MAX_RATE_LIMIT_RETRIES)
    }

    fn run_gh_with_retry(&self, args: &[&str], max_retries: u32) -> Result<Output> {
        let mut retries = 0;

        loop {
            let mut cmd = Command::new("gh");
            if let Some(ref host) = self.host {
                cmd.env("GH_HOST", host);
            }

            let output = cmd
                .args(args)
                .output()
                .with_context(|| format!("failed to run 'gh {}'. Is gh CLI installed?", args.join(" ")))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if Self::is_rate_limited(&stderr) && retries < max_retries {
                    retries += 1;
                    let delay_secs = RATE_LIMIT_BASE_DELAY_SECS * (1 << retries);
                    eprintln!(
                        "GitHub API rate limited. Retrying in {} seconds ({}/{})",
                        delay_secs, retries, max_retries
                    );
                    thread::sleep(Duration::from_secs(delay_secs));
                    continue;
                }
            }

            return Ok(output);
        }
    }

    fn is_rate_limited(stderr: &str) -> bool {
        let s = stderr.to_lowercase();
        s.contains("rate limit") || s.contains("secondary rate") || s.contains("abuse detection") || s.contains("try again later")
    }

    fn format_gh_error(args: &[&str], output: &Output) -> String {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);

        let mut msg = format!("gh {} failed", args.join(" "));
        if !stderr.is_empty() {
            msg.push_str(&format!("\n  Error: {}", stderr.trim()));
        }
        if !stdout.is_empty() && stderr.is_empty() {
            msg.push_str(&format!("\n  Output: {}", stdout.trim()));
        }

        if stderr.contains("not logged") || stderr.contains("authentication") {
            msg.push_str("\n  Hint: Run 'gh auth login' to authenticate.");
        } else if stderr.contains("Could not resolve") {
            msg.push_str("\n  Hint: Ensure you're in a git repository with a GitHub remote.");
        }

        msg
    }

    fn find_pr_by_head(&self, head: &str) -> Result<Option<PrRecord>> {
        let args = [
            "pr",
            "list",
            "--head",
            head,
            "--state",
            "all",
            "--json",
            "number,url,title,body,state,isDraft,headRefName,baseRefName",
            "--limit",
            "1",
        ];
        let output = self.run_gh(&args)?;
        if !output.status.success() {
            anyhow::bail!("{}", Self::format_gh_error(&args, &output));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).context("failed to parse gh pr list output")?;
        let Some(entry) = json.as_array().and_then(|a| a.first()) else {
            return Ok(None);
        };

        Ok(Some(record_from_json(entry)))
    }
}

fn record_from_json(json: &serde_json::Value) -> PrRecord {
    let is_draft = json["isDraft"].as_bool().unwrap_or(false);
    PrRecord {
        number: json["number"].as_u64().unwrap_or(0),
        url: json["url"].as_str().unwrap_or("").to_string(),
        state: PrState::normalize(json["state"].as_str().unwrap_or("OPEN"), is_draft),
        title: json["title"].as_str().unwrap_or("").to_string(),
        body: json["body"].as_str().unwrap_or("").to_string(),
        base: json["baseRefName"].as_str().unwrap_or("").to_string(),
        head: json["headRefName"].as_str().unwrap_or("").to_string(),
        draft: is_draft,
        last_pushed_commit: String::new(),
        comment_id: None,
    }
}

impl Host for GitHubHost {
    fn cli_name(&self) -> &str {
        "gh"
    }

    fn check_auth(&self) -> Result<()> {
        let output = self.run_gh(&["auth", "status"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not logged") {
                anyhow::bail!("Not authenticated with GitHub CLI. Run 'gh auth login' to authenticate.");
            }
            anyhow::bail!("GitHub CLI auth check failed: {}", stderr);
        }
        Ok(())
    }

    fn sync_pr(&self, spec: &PrSpec) -> Result<PrRecord> {
        let existing = if spec.number > 0 {
            let args = [
                "pr",
                "view",
                &spec.number.to_string(),
                "--json",
                "number,url,title,body,state,isDraft,headRefName,baseRefName",
            ];
            let output = self.run_gh(&args)?;
            if !output.status.success() {
                anyhow::bail!("{}", Self::format_gh_error(&args, &output));
            }
            let json: serde_json::Value =
                serde_json::from_slice(&output.stdout).context("failed to parse gh pr view output")?;
            Some(record_from_json(&json))
        } else {
            let args = ["pr", "create", "--head", &spec.head, "--base", &spec.base, "--title", &spec.title, "--body", &spec.body];
            let mut args: Vec<&str> = args.to_vec();
            if spec.draft {
                args.push("--draft");
            }
            let output = self.run_gh(&args)?;

            if output.status.success() {
                None
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stderr.contains("already exists") {
                    self.find_pr_by_head(&spec.head)?
                } else {
                    anyhow::bail!("{}", Self::format_gh_error(&args, &output));
                }
            }
        };

        if let Some(record) = existing {
            if record.state == PrState::Merged {
                anyhow::bail!("PR #{} is already merged on the host", record.number);
            }

            if record.title != spec.title || record.body != spec.body {
                let output = self.run_gh(&["pr", "edit", &record.number.to_string(), "--title", &spec.title, "--body", &spec.body])?;
                if !output.status.success() {
                    anyhow::bail!("failed to update PR title/body: {}", String::from_utf8_lossy(&output.stderr));
                }
            }
            if record.base != spec.base {
                let output = self.run_gh(&["pr", "edit", &record.number.to_string(), "--base", &spec.base])?;
                if !output.status.success() {
                    anyhow::bail!("failed to update PR base: {}", String::from_utf8_lossy(&output.stderr));
                }
            }
            if record.draft != spec.draft {
                if spec.draft {
                    self.mark_draft(record.number)?;
                } else {
                    self.mark_ready(record.number)?;
                }
            }

            let args = [
                "pr",
                "view",
                &record.number.to_string(),
                "--json",
                "number,url,title,body,state,isDraft,headRefName,baseRefName",
            ];
            let output = self.run_gh(&args)?;
            if !output.status.success() {
                anyhow::bail!("{}", Self::format_gh_error(&args, &output));
            }
            let json: serde_json::Value =
                serde_json::from_slice(&output.stdout).context("failed to parse gh pr view output")?;
            Ok(record_from_json(&json))
        } else {
            let args = ["pr", "view", &spec.head, "--json", "number,url,title,body,state,isDraft,headRefName,baseRefName"];
            let output = self.run_gh(&args)?;
            if !output.status.success() {
                anyhow::bail!("{}", Self::format_gh_error(&args, &output));
            }
            let json: serde_json::Value =
                serde_json::from_slice(&output.stdout).context("failed to parse gh pr view output")?;
            Ok(record_from_json(&json))
        }
    }

    fn get_repo_info(&self) -> Result<RepoInfo> {
        let args = ["repo", "view", "--json", "owner,name,defaultBranchRef"];
        let output = self.run_gh(&args)?;
        if !output.status.success() {
            anyhow::bail!("{}", Self::format_gh_error(&args, &output));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).context("failed to parse gh repo view output")?;

        Ok(RepoInfo {
            owner: json["owner"]["login"].as_str().unwrap_or("").to_string(),
            name: json["name"].as_str().unwrap_or("").to_string(),
            default_branch: json["defaultBranchRef"]["name"].as_str().unwrap_or("main").to_string(),
        })
    }

    fn mark_ready(&self, number: u64) -> Result<()> {
        let output = self.run_gh(&["pr", "ready", &number.to_string()])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a draft") || stderr.contains("already") {
                return Ok(());
            }
            anyhow::bail!("failed to mark PR #{} ready: {}", number, stderr);
        }
        Ok(())
    }

    fn mark_draft(&self, number: u64) -> Result<()> {
        let output = self.run_gh(&["pr", "ready", &number.to_string(), "--undo"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("already") {
                return Ok(());
            }
            anyhow::bail!("failed to mark PR #{} draft: {}", number, stderr);
        }
        Ok(())
    }

    fn list_comments(&self, number: u64) -> Result<Vec<(String, String)>> {
        let args = ["pr", "view", &number.to_string(), "--json", "comments"];
        let output = self.run_gh(&args)?;
        if !output.status.success() {
            anyhow::bail!("{}", Self::format_gh_error(&args, &output));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).context("failed to parse gh pr view output")?;
        let comments = json["comments"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .map(|c| {
                        (
                            c["id"].as_str().unwrap_or("").to_string(),
                            c["body"].as_str().unwrap_or("").to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(comments)
    }

    fn create_comment(&self, number: u64, body: &str) -> Result<String> {
        let args = ["pr", "comment", &number.to_string(), "--body", body];
        let output = self.run_gh(&args)?;
        if !output.status.success() {
            anyhow::bail!("{}", Self::format_gh_error(&args, &output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn update_comment(&self, _number: u64, comment_id: &str, body: &str) -> Result<()> {
        let endpoint = format!("repos/{{owner}}/{{repo}}/issues/comments/{}", comment_id);
        let body_field = format!("body={}", body);
        let mut cmd = Command::new("gh");
        if let Some(ref host) = self.host {
            cmd.env("GH_HOST", host);
        }
        let output = cmd
            .args(["api", &endpoint, "-X", "PATCH", "-f", &body_field])
            .output()
            .context("failed to run gh api to update comment")?;

        if !output.status.success() {
            anyhow::bail!("failed to update comment: {}", String::from_utf8_lossy(&output.stderr));
        }
        Ok(())
    }

    fn open_in_browser(&self, number: u64) -> Result<()> {
        let output = self.run_gh(&["pr", "view", &number.to_string(), "--web"])?;
        if !output.status.success() {
            anyhow::bail!("failed to open PR #{} in browser: {}", number, String::from_utf8_lossy(&output.stderr));
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncHost for GitHubHost {
    async fn batch_get_prs(&self, numbers: &[u64]) -> Vec<BatchPrStatus> {
        let futures: Vec<_> = numbers
            .iter()
            .map(|&number| async move {
                let args = ["pr", "view", &number.to_string(), "--json", "number,state,isDraft"];
                let result = self.run_gh(&args);
                result.ok().and_then(|output| {
                    if !output.status.success() {
                        return None;
                    }
                    let json: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
                    let is_draft = json["isDraft"].as_bool().unwrap_or(false);
                    let state = PrState::normalize(json["state"].as_str().unwrap_or("OPEN"), is_draft);
                    Some(BatchPrStatus {
                        number,
                        state,
                        is_merged: state == PrState::Merged,
                    })
                })
            })
            .collect();

        futures::future::join_all(futures).await.into_iter().flatten().collect()
    }
}
