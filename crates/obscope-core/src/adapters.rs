//! External-system adapters the observability core consumes but never
//! implements directly: process enumeration, VCS working-tree state, and
//! at-rest secret encryption. Each is a small trait so the pipeline can be
//! driven deterministically in tests without shelling out.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const ADAPTER_TIMEOUT: Duration = Duration::from_secs(5);

/// A running process belonging to an agent CLI, as seen by the OS.
#[derive(Debug, Clone)]
pub struct RunningAgentProcess {
    pub pid: u32,
    pub cwd: Option<PathBuf>,
    pub open_files: Vec<PathBuf>,
}

/// Enumerates running agent processes. Implementations degrade to an empty
/// result on any failure — active/collision detection must fail open, never
/// panic or block the tick.
pub trait ProcessInspector: Send + Sync {
    fn list_running_agents(&self, command_name: &str) -> Vec<RunningAgentProcess>;
}

/// Run `f` on a worker thread, killing it off (by abandoning the receiver)
/// if it hasn't produced a result within `ADAPTER_TIMEOUT`.
fn with_timeout<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> Option<T> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(ADAPTER_TIMEOUT).ok()
}

/// POSIX process inspector backed by `lsof`. On any failure (binary
/// missing, timeout, non-UTF8 output) returns an empty list.
pub struct LsofProcessInspector;

impl ProcessInspector for LsofProcessInspector {
    fn list_running_agents(&self, command_name: &str) -> Vec<RunningAgentProcess> {
        let command_name = command_name.to_string();
        let output = with_timeout(move || {
            Command::new("lsof")
                .args(["-c", &command_name, "-a", "-d", "cwd,txt,0-99", "-Fpfn"])
                .output()
        });

        let Some(Ok(output)) = output else {
            return Vec::new();
        };
        if !output.status.success() {
            return Vec::new();
        }

        let Ok(text) = String::from_utf8(output.stdout) else {
            return Vec::new();
        };

        parse_lsof_field_output(&text)
    }
}

/// Parse `lsof -Fpfn` field-mode output: each process starts with a `p<pid>`
/// line, followed by `f<fd>`/`n<path>` pairs for its open files.
fn parse_lsof_field_output(text: &str) -> Vec<RunningAgentProcess> {
    let mut processes = Vec::new();
    let mut current: Option<RunningAgentProcess> = None;

    for line in text.lines() {
        let Some((tag, rest)) = line.split_at_checked(1) else {
            continue;
        };
        match tag {
            "p" => {
                if let Some(proc) = current.take() {
                    processes.push(proc);
                }
                if let Ok(pid) = rest.parse() {
                    current = Some(RunningAgentProcess {
                        pid,
                        cwd: None,
                        open_files: Vec::new(),
                    });
                }
            }
            "n" => {
                if let Some(ref mut proc) = current {
                    let path = PathBuf::from(rest);
                    // lsof reports the cwd as an fd named "cwd" in a preceding
                    // "f" line; we don't track fd kind here so anything that
                    // looks absolute is recorded as both a candidate cwd and
                    // an open file, and callers match on whichever they need.
                    if proc.cwd.is_none() && path.is_absolute() {
                        proc.cwd = Some(path.clone());
                    }
                    proc.open_files.push(path);
                }
            }
            _ => {}
        }
    }
    if let Some(proc) = current.take() {
        processes.push(proc);
    }

    processes
}

/// Dirty-file query result for `VcsAdapter::dirty_files`. Falls back to
/// `AllDirty` when the underlying VCS call fails, per §4.6's safe-fallback
/// rule — collision detection then treats every touched file as dirty.
#[derive(Debug, Clone)]
pub enum DirtyFiles {
    Known(BTreeSet<PathBuf>),
    AllDirty,
}

impl DirtyFiles {
    pub fn contains(&self, path: &Path) -> bool {
        match self {
            DirtyFiles::Known(set) => set.contains(path),
            DirtyFiles::AllDirty => true,
        }
    }
}

/// Adapter over a project's VCS working tree. Every call is per-project and
/// expected to be cached for the duration of one tick by the caller.
pub trait VcsAdapter: Send + Sync {
    fn last_commit_time(&self, project_root: &Path) -> Option<DateTime<Utc>>;
    fn dirty_files(&self, project_root: &Path) -> DirtyFiles;
}

/// Git-backed `VcsAdapter`. Treats any failure (not a repo, timeout,
/// unparseable output) as "all files dirty" for `dirty_files`, and as "no
/// commit" (the recency floor degrades to `now - 15min`) for commit time.
pub struct GitVcsAdapter;

impl VcsAdapter for GitVcsAdapter {
    fn last_commit_time(&self, project_root: &Path) -> Option<DateTime<Utc>> {
        let root = project_root.to_path_buf();
        let output = with_timeout(move || {
            Command::new("git")
                .args(["log", "-1", "--format=%cI"])
                .current_dir(&root)
                .output()
        })?
        .ok()?;

        if !output.status.success() {
            return None;
        }

        let text = String::from_utf8(output.stdout).ok()?;
        DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn dirty_files(&self, project_root: &Path) -> DirtyFiles {
        let root = project_root.to_path_buf();
        let output = with_timeout(move || {
            Command::new("git")
                .args(["status", "--porcelain"])
                .current_dir(&root)
                .output()
        });

        let Some(Ok(output)) = output else {
            return DirtyFiles::AllDirty;
        };
        if !output.status.success() {
            return DirtyFiles::AllDirty;
        }
        let Ok(text) = String::from_utf8(output.stdout) else {
            return DirtyFiles::AllDirty;
        };

        let mut files = BTreeSet::new();
        for line in text.lines() {
            // Porcelain format: "XY path" or "XY orig -> path" for renames.
            if line.len() < 4 {
                continue;
            }
            let rel = line[3..].split(" -> ").next_back().unwrap_or("").trim();
            if rel.is_empty() {
                continue;
            }
            files.insert(root.join(rel));
        }
        DirtyFiles::Known(files)
    }
}

/// Encrypts/decrypts relay uplink secrets at rest. Implementations must be
/// deterministic for the same key, but are free to vary the nonce per call.
pub trait SecretCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// AES-256-GCM cipher over a 32-byte key, nonce prepended to the ciphertext.
pub struct AesGcmCipher {
    key: ring::aead::LessSafeKey,
}

impl AesGcmCipher {
    pub fn new(key_bytes: [u8; 32]) -> Result<Self> {
        let unbound = ring::aead::UnboundKey::new(&ring::aead::AES_256_GCM, &key_bytes)
            .map_err(|_| anyhow::anyhow!("invalid AES-256-GCM key"))?;
        Ok(Self {
            key: ring::aead::LessSafeKey::new(unbound),
        })
    }

    /// Load a key from a 0600 key file, or from a 32-byte base64 value in
    /// `env_var` if the file doesn't exist.
    pub fn from_key_file_or_env(key_path: &Path, env_var: &str) -> Result<Self> {
        if key_path.exists() {
            let bytes = std::fs::read(key_path)
                .with_context(|| format!("reading key file {}", key_path.display()))?;
            let key_bytes: [u8; 32] = bytes
                .try_into()
                .map_err(|_| anyhow::anyhow!("key file is not exactly 32 bytes"))?;
            return Self::new(key_bytes);
        }

        let encoded = std::env::var(env_var)
            .with_context(|| format!("no key file at {} and {env_var} unset", key_path.display()))?;
        let bytes = base64_decode(&encoded)?;
        let key_bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("{env_var} did not decode to 32 bytes"))?;

        let cipher = Self::new(key_bytes)?;
        write_key_file(key_path, &cipher_key_bytes(&encoded)?)?;
        Ok(cipher)
    }
}

fn cipher_key_bytes(encoded: &str) -> Result<[u8; 32]> {
    base64_decode(encoded)?
        .try_into()
        .map_err(|_| anyhow::anyhow!("key did not decode to 32 bytes"))
}

fn write_key_file(path: &Path, key_bytes: &[u8; 32]) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, key_bytes)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

fn base64_decode(s: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s.trim())
        .context("invalid base64 key material")
}

impl SecretCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let rng = ring::rand::SystemRandom::new();
        let mut nonce_bytes = [0u8; ring::aead::NONCE_LEN];
        ring::rand::SecureRandom::fill(&rng, &mut nonce_bytes)
            .map_err(|_| anyhow::anyhow!("failed to generate nonce"))?;

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(
                ring::aead::Nonce::assume_unique_for_key(nonce_bytes),
                ring::aead::Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| anyhow::anyhow!("encryption failed"))?;

        let mut out = nonce_bytes.to_vec();
        out.extend(in_out);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < ring::aead::NONCE_LEN {
            anyhow::bail!("ciphertext shorter than nonce");
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(ring::aead::NONCE_LEN);
        let nonce = ring::aead::Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| anyhow::anyhow!("invalid nonce length"))?;

        let mut in_out = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, ring::aead::Aad::empty(), &mut in_out)
            .map_err(|_| anyhow::anyhow!("decryption failed (bad key or corrupt data)"))?;
        Ok(plaintext.to_vec())
    }
}

/// Identity cipher for tests and for plain-text-token fallback paths; never
/// use outside test code or an explicit "unencrypted" opt-in.
pub struct NullCipher;

impl SecretCipher for NullCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lsof_output_groups_files_by_process() {
        let text = "p123\nn/home/joe/app\nn/home/joe/app/rollout.jsonl\np456\nn/tmp\n";
        let procs = parse_lsof_field_output(text);
        assert_eq!(procs.len(), 2);
        assert_eq!(procs[0].pid, 123);
        assert_eq!(procs[0].open_files.len(), 2);
        assert_eq!(procs[1].pid, 456);
    }

    #[test]
    fn dirty_files_all_dirty_contains_everything() {
        let dirty = DirtyFiles::AllDirty;
        assert!(dirty.contains(Path::new("/any/path")));
    }

    #[test]
    fn dirty_files_known_only_contains_listed_paths() {
        let mut set = BTreeSet::new();
        set.insert(PathBuf::from("/repo/src/lib.rs"));
        let dirty = DirtyFiles::Known(set);
        assert!(dirty.contains(Path::new("/repo/src/lib.rs")));
        assert!(!dirty.contains(Path::new("/repo/src/other.rs")));
    }

    #[test]
    fn aes_gcm_round_trips() {
        let cipher = AesGcmCipher::new([7u8; 32]).unwrap();
        let plaintext = b"super-secret-bearer-token";
        let ciphertext = cipher.encrypt(plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);
        let decrypted = cipher.decrypt(&ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn aes_gcm_rejects_tampered_ciphertext() {
        let cipher = AesGcmCipher::new([1u8; 32]).unwrap();
        let mut ciphertext = cipher.encrypt(b"hello").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;
        assert!(cipher.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn null_cipher_is_identity() {
        let cipher = NullCipher;
        let ciphertext = cipher.encrypt(b"plain").unwrap();
        assert_eq!(ciphertext, b"plain");
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), b"plain");
    }
}
