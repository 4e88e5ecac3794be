//! Operator config and Relay config (spec §6): both are JSON documents at a
//! well-known path, loaded with the same explicit-path → env var → XDG data
//! dir → dotfile-fallback priority the teacher used for its TOML config.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use obscope_core::SecretCipher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// TODO: Path utilities are currently scattered across crates (technical debt).
// This function is temporarily in runtime/config.rs.
// Related utilities like `discover_project_root()` are in obscope-types/src/util.rs
// but types should only contain schemas, not utilities.
// See: https://github.com/lanegrid/obscope/issues/19

/// Resolve the workspace data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. OBSCOPE_PATH environment variable (with tilde expansion)
/// 3. XDG data directory (recommended default)
/// 4. ~/.obscope (fallback for systems without XDG)
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Explicit path
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    // Priority 2: OBSCOPE_PATH environment variable
    if let Ok(env_path) = std::env::var("OBSCOPE_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    // Priority 3: XDG data directory (recommended default)
    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("obscope"));
    }

    // Priority 4: Fallback to ~/.obscope (last resort for systems without XDG)
    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".obscope"));
    }

    // This should never happen, but provide a working directory fallback
    Err(Error::Config(
        "Could not determine workspace path: no HOME directory or XDG data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// One teammate's log-root overrides, as listed in the operator config's
/// `operators` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub name: String,
    #[serde(default)]
    pub claude: Option<PathBuf>,
    #[serde(default)]
    pub codex: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SelfSection {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct OperatorConfigBody {
    #[serde(default, rename = "self")]
    self_section: Option<SelfSection>,
    #[serde(default)]
    operators: Vec<OperatorEntry>,
}

/// The operator config's wire format accepts either a bare array of operator
/// entries (legacy shape) or the full `{self, operators}` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OperatorConfigWire {
    Legacy(Vec<OperatorEntry>),
    Full(OperatorConfigBody),
}

/// Who's on this machine and which alternate rollout roots, if any, each
/// operator's agents write to. Malformed config degrades to empty per §7.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub self_name: Option<String>,
    pub operators: Vec<OperatorEntry>,
}

impl OperatorConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let wire: OperatorConfigWire = match serde_json::from_str(&content) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "malformed operator config, using empty");
                return Ok(Self::default());
            }
        };

        Ok(match wire {
            OperatorConfigWire::Legacy(operators) => Self { self_name: None, operators },
            OperatorConfigWire::Full(body) => Self {
                self_name: body.self_section.and_then(|s| s.name),
                operators: body.operators,
            },
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = OperatorConfigBody {
            self_section: Some(SelfSection { name: self.self_name.clone() }),
            operators: self.operators.clone(),
        };
        let content = serde_json::to_string_pretty(&body)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_workspace_path(None)?.join("operators.json"))
    }
}

/// Fixed color palette operators are assigned from, in order, cycling if
/// there are more operators than colors (§4.5 step 1).
const OPERATOR_PALETTE: &[&str] =
    &["#4C9BE8", "#E8744C", "#57B894", "#C25FD1", "#D1A23E", "#5F87D1", "#D15F86"];

/// Expand an `OperatorConfig` into the `Operator` list (for the Snapshot)
/// and the per-provider rollout roots (for Discovery), per §4.5 step 1-2.
/// The local user is always `self`; peers are assigned a stable id derived
/// from their name and a palette color by position.
pub fn expand_operators(
    config: &OperatorConfig,
    default_claude_root: Option<PathBuf>,
    default_codex_root: Option<PathBuf>,
) -> (Vec<obscope_types::Operator>, Vec<crate::runtime::WatchedRoot>) {
    use crate::runtime::WatchedRoot;

    let mut operators = Vec::new();
    let mut roots = Vec::new();

    let self_id = obscope_types::OperatorId::this_machine();
    operators.push(obscope_types::Operator {
        id: self_id.clone(),
        display_name: config.self_name.clone().unwrap_or_else(|| "self".to_string()),
        color: OPERATOR_PALETTE[0].to_string(),
        online: true,
    });
    if let Some(root) = default_claude_root {
        roots.push(WatchedRoot { provider_id: "claude_code", log_root: root, operator_id: self_id.clone() });
    }
    if let Some(root) = default_codex_root {
        roots.push(WatchedRoot { provider_id: "codex", log_root: root, operator_id: self_id.clone() });
    }

    for (i, entry) in config.operators.iter().enumerate() {
        let id = obscope_types::OperatorId(stable_operator_id(&entry.name));
        let color = OPERATOR_PALETTE[(i + 1) % OPERATOR_PALETTE.len()].to_string();
        operators.push(obscope_types::Operator {
            id: id.clone(),
            display_name: entry.name.clone(),
            color,
            online: true,
        });
        if let Some(root) = &entry.claude {
            roots.push(WatchedRoot { provider_id: "claude_code", log_root: root.clone(), operator_id: id.clone() });
        }
        if let Some(root) = &entry.codex {
            roots.push(WatchedRoot { provider_id: "codex", log_root: root.clone(), operator_id: id.clone() });
        }
    }

    (operators, roots)
}

fn stable_operator_id(name: &str) -> String {
    name.to_lowercase().chars().map(|c| if c.is_alphanumeric() { c } else { '-' }).collect()
}


/// One configured uplink target (spec §6's Relay config / §4.10's Uplink
/// channel). Secrets are stored encrypted at rest; `token`/`refresh_token`
/// hold plaintext only until the next `RelayConfig::save` re-encrypts them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkTarget {
    pub pylon_id: String,
    pub pylon_name: String,
    pub ws_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_enc: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_enc: Option<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    pub added_at: DateTime<Utc>,
}

impl UplinkTarget {
    /// The bearer token to authenticate with, decrypting `token_enc` if that's
    /// the only copy on disk.
    pub fn resolve_token(&self, cipher: &dyn SecretCipher) -> Result<String> {
        if let Some(plain) = &self.token {
            return Ok(plain.clone());
        }
        let Some(enc) = &self.token_enc else {
            return Err(Error::Config(format!("uplink target {} has no token", self.pylon_id)));
        };
        let bytes = base64_decode(enc)?;
        let plaintext = cipher
            .decrypt(&bytes)
            .map_err(|e| Error::Config(format!("failed to decrypt token for {}: {e}", self.pylon_id)))?;
        String::from_utf8(plaintext).map_err(|e| Error::Config(e.to_string()))
    }

    /// Encrypt any plaintext `token`/`refresh_token` left over from a
    /// hand-edited config, moving them into the `*_enc` fields.
    fn encrypt_in_place(&mut self, cipher: &dyn SecretCipher) -> Result<()> {
        if let Some(plain) = self.token.take() {
            let ciphertext = cipher
                .encrypt(plain.as_bytes())
                .map_err(|e| Error::Config(format!("failed to encrypt token for {}: {e}", self.pylon_id)))?;
            self.token_enc = Some(base64_encode(&ciphertext));
        }
        if let Some(plain) = self.refresh_token.take() {
            let ciphertext = cipher
                .encrypt(plain.as_bytes())
                .map_err(|e| Error::Config(format!("failed to encrypt refresh token for {}: {e}", self.pylon_id)))?;
            self.refresh_token_enc = Some(base64_encode(&ciphertext));
        }
        Ok(())
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn base64_decode(s: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s.trim())
        .map_err(|e| Error::Config(format!("invalid base64 in token field: {e}")))
}

/// Configured uplink targets. Malformed config degrades to an empty set
/// (no uplinks), per §7's Configuration error taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub targets: Vec<UplinkTarget>,
}

impl RelayConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "malformed relay config, using empty");
                Ok(Self::default())
            }
        }
    }

    /// Write the config, re-encrypting any plaintext tokens first, then
    /// restrict the file to 0600 as the spec requires for secrets at rest.
    pub fn save(&self, cipher: &dyn SecretCipher) -> Result<()> {
        self.save_to(&Self::default_path()?, cipher)
    }

    pub fn save_to(&self, path: &PathBuf, cipher: &dyn SecretCipher) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut encrypted = self.clone();
        for target in &mut encrypted.targets {
            target.encrypt_in_place(cipher)?;
        }

        let content = serde_json::to_string_pretty(&encrypted)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_workspace_path(None)?.join("relay.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscope_core::NullCipher;
    use tempfile::TempDir;

    #[test]
    fn operator_config_default_is_empty() {
        let config = OperatorConfig::default();
        assert!(config.operators.is_empty());
        assert!(config.self_name.is_none());
    }

    #[test]
    fn operator_config_round_trips() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("operators.json");

        let mut config = OperatorConfig { self_name: Some("joe".to_string()), operators: vec![] };
        config.operators.push(OperatorEntry {
            name: "mira".to_string(),
            claude: Some(PathBuf::from("/home/mira/.claude/projects")),
            codex: None,
        });

        config.save_to(&path)?;
        let loaded = OperatorConfig::load_from(&path)?;
        assert_eq!(loaded.self_name.as_deref(), Some("joe"));
        assert_eq!(loaded.operators.len(), 1);
        assert_eq!(loaded.operators[0].name, "mira");

        Ok(())
    }

    #[test]
    fn operator_config_accepts_legacy_array_shape() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("operators.json");
        std::fs::write(&path, r#"[{"name": "mira", "claude": "/home/mira/.claude/projects"}]"#)?;

        let loaded = OperatorConfig::load_from(&path)?;
        assert_eq!(loaded.operators.len(), 1);
        assert!(loaded.self_name.is_none());

        Ok(())
    }

    #[test]
    fn operator_config_malformed_json_degrades_to_empty() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("operators.json");
        std::fs::write(&path, "not json at all")?;

        let loaded = OperatorConfig::load_from(&path)?;
        assert!(loaded.operators.is_empty());

        Ok(())
    }

    #[test]
    fn operator_config_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nonexistent.json");

        let config = OperatorConfig::load_from(&path)?;
        assert!(config.operators.is_empty());

        Ok(())
    }

    #[test]
    fn relay_config_encrypts_plaintext_token_on_save() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("relay.json");
        let cipher = NullCipher;

        let config = RelayConfig {
            targets: vec![UplinkTarget {
                pylon_id: "pylon-1".to_string(),
                pylon_name: "team relay".to_string(),
                ws_url: "wss://relay.example/ws".to_string(),
                token: Some("plain-bearer-token".to_string()),
                token_enc: None,
                refresh_token: None,
                refresh_token_enc: None,
                projects: vec!["my-project".to_string()],
                added_at: Utc::now(),
            }],
        };

        config.save_to(&path, &cipher)?;
        let loaded = RelayConfig::load_from(&path)?;
        assert_eq!(loaded.targets.len(), 1);
        assert!(loaded.targets[0].token.is_none(), "plaintext token must be cleared on save");
        assert!(loaded.targets[0].token_enc.is_some());
        assert_eq!(loaded.targets[0].resolve_token(&cipher)?, "plain-bearer-token");

        Ok(())
    }

    #[test]
    fn relay_config_malformed_json_degrades_to_empty() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("relay.json");
        std::fs::write(&path, "{not json")?;

        let loaded = RelayConfig::load_from(&path)?;
        assert!(loaded.targets.is_empty());

        Ok(())
    }
}
