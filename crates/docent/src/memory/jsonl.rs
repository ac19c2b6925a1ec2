//! Durable history: one JSONL file per session
//!
//! Every append is a single complete line. A reader skips any line that does
//! not parse, which covers a torn write at the end of the file.

use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use uuid::Uuid;

use super::{ConversationTurn, Role, Session, SessionLocks, SessionStore};
use crate::error::{DocentError, Result};

const EXTENSION: &str = "jsonl";
/// Marks a file name that is a hex encoding of the session id
const ENCODED_PREFIX: char = '~';
/// Marks a file name derived from a UUID v5 of an overlong session id
const HASHED_PREFIX: char = '+';
/// Holds the original id next to a hashed session file
const SIDECAR_EXTENSION: &str = "id";
/// Longest stem written as-is or hex-encoded; file systems cap names at 255 bytes
const MAX_STEM_LEN: usize = 200;

pub struct JsonlSessionStore {
  dir: PathBuf,
  locks: SessionLocks,
}

impl JsonlSessionStore {
  /// Store rooted at `dir`, which is created if needed
  pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    std::fs::create_dir_all(&dir)
      .map_err(|e| store_error(format!("cannot create {}: {e}", dir.display())))?;
    Ok(Self { dir, locks: SessionLocks::default() })
  }

  fn session_path(&self, session_id: &str) -> PathBuf {
    self.dir.join(format!("{}.{EXTENSION}", file_stem(session_id)))
  }

  fn sidecar_path(&self, stem: &str) -> PathBuf {
    self.dir.join(format!("{stem}.{SIDECAR_EXTENSION}"))
  }

  /// Hashed stems lose the id, so keep it beside the session file
  async fn write_sidecar(&self, session_id: &str) -> Result<()> {
    let stem = file_stem(session_id);
    if !stem.starts_with(HASHED_PREFIX) {
      return Ok(());
    }

    let path = self.sidecar_path(&stem);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
      return Ok(());
    }
    tokio::fs::write(&path, session_id)
      .await
      .map_err(|e| store_error(format!("cannot write {}: {e}", path.display())))
  }

  async fn session_id_for(&self, stem: &str) -> Option<String> {
    if !stem.starts_with(HASHED_PREFIX) {
      return session_id_from_stem(stem);
    }

    match tokio::fs::read_to_string(self.sidecar_path(stem)).await {
      Ok(id) => Some(id),
      Err(e) => {
        bentley::warn!("Session file {stem}.{EXTENSION} has no readable id: {e}");
        None
      }
    }
  }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
  async fn get_history(&self, session_id: &str) -> Result<Session> {
    let _guard = self.locks.acquire(session_id).await;

    let path = self.session_path(session_id);
    let raw = match tokio::fs::read_to_string(&path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::empty(session_id)),
      Err(e) => return Err(store_error(format!("cannot read {}: {e}", path.display()))),
    };

    let mut turns = Vec::new();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
      match serde_json::from_str::<ConversationTurn>(line) {
        Ok(turn) => turns.push(turn),
        Err(e) => bentley::verbose!("Skipping unreadable line in {}: {e}", path.display()),
      }
    }

    Ok(Session { session_id: session_id.to_string(), turns })
  }

  async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
    let _guard = self.locks.acquire(session_id).await;

    self.write_sidecar(session_id).await?;
    let path = self.session_path(session_id);
    let mut line = serde_json::to_string(&ConversationTurn::new(role, content))?;
    line.push('\n');

    let io = async {
      let mut file = OpenOptions::new().create(true).read(true).append(true).open(&path).await?;

      // a torn previous line must not swallow this one
      if file.metadata().await?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).await?;
        file.read_exact(&mut last).await?;
        if last[0] != b'\n' {
          line.insert(0, '\n');
        }
      }

      file.write_all(line.as_bytes()).await?;
      file.flush().await
    };

    io.await.map_err(|e| store_error(format!("cannot append to {}: {e}", path.display())))
  }

  async fn list_sessions(&self) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(&self.dir)
      .await
      .map_err(|e| store_error(format!("cannot list {}: {e}", self.dir.display())))?;

    let mut ids = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| store_error(e.to_string()))? {
      let path = entry.path();
      if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        continue;
      }
      let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        continue;
      };
      if let Some(id) = self.session_id_for(stem).await {
        ids.push(id);
      }
    }

    ids.sort();
    Ok(ids)
  }
}

/// File stem for a session id: the id itself when it is filesystem-safe,
/// otherwise `~` followed by the hex of its bytes. Stems longer than
/// [`MAX_STEM_LEN`] become `+` and the UUID v5 of the id.
fn file_stem(session_id: &str) -> String {
  let safe = !session_id.is_empty()
    && session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

  let stem = if safe {
    session_id.to_string()
  } else {
    let mut stem = String::with_capacity(1 + session_id.len() * 2);
    stem.push(ENCODED_PREFIX);
    for byte in session_id.bytes() {
      stem.push_str(&format!("{byte:02x}"));
    }
    stem
  };

  if stem.len() <= MAX_STEM_LEN {
    return stem;
  }
  let hashed = Uuid::new_v5(&Uuid::NAMESPACE_OID, session_id.as_bytes());
  format!("{HASHED_PREFIX}{}", hashed.simple())
}

fn session_id_from_stem(stem: &str) -> Option<String> {
  let Some(hex) = stem.strip_prefix(ENCODED_PREFIX) else {
    return Some(stem.to_string());
  };
  if hex.len() % 2 != 0 {
    return None;
  }

  let bytes: Option<Vec<u8>> =
    (0..hex.len()).step_by(2).map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()).collect();
  String::from_utf8(bytes?).ok()
}

fn store_error(message: String) -> DocentError {
  DocentError::SessionStore(message)
}
