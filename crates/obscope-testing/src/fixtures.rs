//! Synthetic rollout generation.
//!
//! `obscope-providers`'s wire-format structs are crate-private, so unlike the
//! teacher's fixtures (which copy and patch fixed sample files) these
//! builders emit raw JSONL matching the documented shapes directly. Each
//! builder accumulates records in memory and writes them out with
//! [`ClaudeRolloutBuilder::write_to`] / [`CodexRolloutBuilder::write_to`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Claude encodes a project root like `/Users/foo/bar` as `-Users-foo-bar`.
pub fn encode_claude_project_dir(project_root: &str) -> String {
    let encoded = project_root
        .replace(['/', '.'], "-")
        .trim_start_matches('-')
        .to_string();
    format!("-{encoded}")
}

/// Create `<log_root>/<encoded project dir>/` and return its path.
pub fn claude_project_dir(log_root: &Path, project_root: &str) -> Result<PathBuf> {
    let dir = log_root.join(encode_claude_project_dir(project_root));
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

/// Builds a single Claude Code rollout file record-by-record.
pub struct ClaudeRolloutBuilder {
    session_id: String,
    cwd: String,
    git_branch: Option<String>,
    records: Vec<Value>,
    last_uuid: Option<String>,
}

impl ClaudeRolloutBuilder {
    pub fn new(session_id: impl Into<String>, cwd: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            cwd: cwd.into(),
            git_branch: None,
            records: Vec::new(),
            last_uuid: None,
        }
    }

    pub fn git_branch(mut self, branch: impl Into<String>) -> Self {
        self.git_branch = Some(branch.into());
        self
    }

    /// Append a user turn. `text` becomes the sole text content block.
    pub fn user_turn(mut self, uuid: impl Into<String>, at: DateTime<Utc>, text: &str) -> Self {
        let uuid = uuid.into();
        let record = json!({
            "type": "user",
            "uuid": uuid,
            "parentUuid": self.last_uuid,
            "sessionId": self.session_id,
            "timestamp": at.to_rfc3339(),
            "isSidechain": false,
            "isMeta": false,
            "cwd": self.cwd,
            "gitBranch": self.git_branch,
            "userType": "external",
            "message": {
                "role": "user",
                "content": text,
            },
        });
        self.last_uuid = Some(uuid);
        self.records.push(record);
        self
    }

    /// Append an assistant turn with a single text block and token usage.
    pub fn assistant_text(
        mut self,
        uuid: impl Into<String>,
        at: DateTime<Utc>,
        model: &str,
        text: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        let uuid = uuid.into();
        let record = json!({
            "type": "assistant",
            "uuid": uuid,
            "parentUuid": self.last_uuid,
            "sessionId": self.session_id,
            "timestamp": at.to_rfc3339(),
            "isSidechain": false,
            "isMeta": false,
            "cwd": self.cwd,
            "gitBranch": self.git_branch,
            "message": {
                "id": format!("msg_{uuid}"),
                "type": "message",
                "role": "assistant",
                "model": model,
                "content": [{"type": "text", "text": text}],
                "stopReason": "end_turn",
                "stopSequence": Value::Null,
                "usage": {
                    "input_tokens": input_tokens,
                    "output_tokens": output_tokens,
                    "cache_creation_input_tokens": 0,
                    "cache_read_input_tokens": 0,
                },
            },
        });
        self.last_uuid = Some(uuid);
        self.records.push(record);
        self
    }

    /// Append an assistant turn invoking a single tool.
    #[allow(clippy::too_many_arguments)]
    pub fn assistant_tool_use(
        mut self,
        uuid: impl Into<String>,
        at: DateTime<Utc>,
        model: &str,
        tool_use_id: &str,
        tool_name: &str,
        input: Value,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        let uuid = uuid.into();
        let record = json!({
            "type": "assistant",
            "uuid": uuid,
            "parentUuid": self.last_uuid,
            "sessionId": self.session_id,
            "timestamp": at.to_rfc3339(),
            "isSidechain": false,
            "isMeta": false,
            "cwd": self.cwd,
            "gitBranch": self.git_branch,
            "message": {
                "id": format!("msg_{uuid}"),
                "type": "message",
                "role": "assistant",
                "model": model,
                "content": [{
                    "type": "tool_use",
                    "id": tool_use_id,
                    "name": tool_name,
                    "input": input,
                }],
                "stopReason": "tool_use",
                "stopSequence": Value::Null,
                "usage": {
                    "input_tokens": input_tokens,
                    "output_tokens": output_tokens,
                    "cache_creation_input_tokens": 0,
                    "cache_read_input_tokens": 0,
                },
            },
        });
        self.last_uuid = Some(uuid);
        self.records.push(record);
        self
    }

    /// Append the user-role tool result record matching a prior tool use.
    pub fn tool_result(
        mut self,
        uuid: impl Into<String>,
        at: DateTime<Utc>,
        tool_use_id: &str,
        content: &str,
        is_error: bool,
    ) -> Self {
        let uuid = uuid.into();
        let record = json!({
            "type": "user",
            "uuid": uuid,
            "parentUuid": self.last_uuid,
            "sessionId": self.session_id,
            "timestamp": at.to_rfc3339(),
            "isSidechain": false,
            "isMeta": false,
            "cwd": self.cwd,
            "gitBranch": self.git_branch,
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_use_id,
                    "content": content,
                    "is_error": is_error,
                }],
            },
        });
        self.last_uuid = Some(uuid);
        self.records.push(record);
        self
    }

    /// Write the accumulated records as JSONL to `path`, one record per line.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut body = String::new();
        for record in &self.records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }
        fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Write into `<log_root>/<encoded cwd>/<session_id>.jsonl`, matching
    /// how Claude Code lays out its own project directories.
    pub fn write_into_log_root(&self, log_root: &Path) -> Result<PathBuf> {
        let dir = claude_project_dir(log_root, &self.cwd)?;
        let path = dir.join(format!("{}.jsonl", self.session_id));
        self.write_to(&path)?;
        Ok(path)
    }
}

/// Builds a single Codex rollout file record-by-record.
pub struct CodexRolloutBuilder {
    session_id: String,
    cwd: String,
    records: Vec<Value>,
}

impl CodexRolloutBuilder {
    pub fn new(session_id: impl Into<String>, cwd: impl Into<String>) -> Self {
        let session_id = session_id.into();
        let cwd = cwd.into();
        let meta = json!({
            "type": "session_meta",
            "timestamp": Utc::now().to_rfc3339(),
            "payload": {
                "id": session_id,
                "timestamp": Utc::now().to_rfc3339(),
                "cwd": cwd,
                "originator": "codex_cli_rs",
                "cli_version": "0.1.0",
                "source": "cli",
            },
        });
        Self { session_id, cwd, records: vec![meta] }
    }

    pub fn user_message(mut self, at: DateTime<Utc>, text: &str) -> Self {
        self.records.push(json!({
            "type": "response_item",
            "timestamp": at.to_rfc3339(),
            "payload": {
                "type": "message",
                "role": "user",
                "content": [{"type": "input_text", "text": text}],
            },
        }));
        self
    }

    pub fn assistant_message(mut self, at: DateTime<Utc>, text: &str) -> Self {
        self.records.push(json!({
            "type": "response_item",
            "timestamp": at.to_rfc3339(),
            "payload": {
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": text}],
            },
        }));
        self
    }

    pub fn function_call(mut self, at: DateTime<Utc>, call_id: &str, name: &str, arguments: &str) -> Self {
        self.records.push(json!({
            "type": "response_item",
            "timestamp": at.to_rfc3339(),
            "payload": {
                "type": "function_call",
                "call_id": call_id,
                "name": name,
                "arguments": arguments,
            },
        }));
        self
    }

    pub fn function_call_output(mut self, at: DateTime<Utc>, call_id: &str, output: &str) -> Self {
        self.records.push(json!({
            "type": "response_item",
            "timestamp": at.to_rfc3339(),
            "payload": {
                "type": "function_call_output",
                "call_id": call_id,
                "output": output,
            },
        }));
        self
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut body = String::new();
        for record in &self.records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }
        fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Codex lays sessions out under `<log_root>/<yyyy>/<mm>/<dd>/rollout-*.jsonl`;
    /// tests only need a stable, discoverable location, so this uses today's
    /// date at write time.
    pub fn write_into_log_root(&self, log_root: &Path, today: DateTime<Utc>) -> Result<PathBuf> {
        let dir = log_root
            .join(format!("{:04}", today.format("%Y")))
            .join(format!("{:02}", today.format("%m")))
            .join(format!("{:02}", today.format("%d")));
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(format!("rollout-{}.jsonl", self.session_id));
        self.write_to(&path)?;
        let _ = &self.cwd;
        Ok(path)
    }
}
