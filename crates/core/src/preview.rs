use crate::extract::GameDocument;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("no active document to reset")]
    NoActiveDocument,
    #[error("failed to materialize preview: {0}")]
    Io(#[from] io::Error),
}

/// Isolation attributes the hosting surface must apply to the rendering
/// context. Script execution, pointer capture and same-origin resource
/// loading are permitted by default; network, storage and top-level
/// navigation are never granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxPolicy {
    pub allow_scripts: bool,
    pub allow_pointer_lock: bool,
    pub allow_same_origin: bool,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            allow_scripts: true,
            allow_pointer_lock: true,
            allow_same_origin: true,
        }
    }
}

impl SandboxPolicy {
    /// Token list for the host's sandbox attribute. Capabilities absent from
    /// the list are denied by the rendering context.
    pub fn attribute_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if self.allow_scripts {
            tokens.push("allow-scripts".to_string());
        }
        if self.allow_pointer_lock {
            tokens.push("allow-pointer-lock".to_string());
        }
        if self.allow_same_origin {
            tokens.push("allow-same-origin".to_string());
        }
        tokens
    }
}

/// Opaque reference to one materialized preview: the temp file backing the
/// rendering context, its `file://` URL, and the sandbox attributes to apply.
#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
    url: Url,
    sandbox: SandboxPolicy,
}

impl PreviewHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn sandbox(&self) -> &SandboxPolicy {
        &self.sandbox
    }
}

/// Owns the single live preview resource and the document bound to it.
///
/// At most one handle is live at a time; the previous backing file is
/// removed on every replacement, on teardown, and on drop.
#[derive(Debug, Default)]
pub struct PreviewSession {
    document: Option<GameDocument>,
    live: Option<PreviewHandle>,
    sandbox: SandboxPolicy,
}

impl PreviewSession {
    pub fn new(sandbox: SandboxPolicy) -> Self {
        Self {
            document: None,
            live: None,
            sandbox,
        }
    }

    /// Binds `doc` to this session and materializes a fresh handle for it.
    /// Any previously live handle is released first.
    pub fn show(&mut self, doc: GameDocument) -> Result<&PreviewHandle, PreviewError> {
        self.teardown();
        let doc = self.document.insert(doc);
        let fresh = materialize(doc, &self.sandbox)?;
        Ok(&*self.live.insert(fresh))
    }

    /// Re-materializes a fresh handle from the currently bound document,
    /// clearing any runtime state inside the rendering context. Generation
    /// and extraction are not re-run.
    pub fn reset(&mut self) -> Result<&PreviewHandle, PreviewError> {
        let doc = self.document.as_ref().ok_or(PreviewError::NoActiveDocument)?;
        let fresh = materialize(doc, &self.sandbox)?;
        if let Some(old) = self.live.take() {
            release(old);
        }
        Ok(&*self.live.insert(fresh))
    }

    /// Releases the live handle. Idempotent; the bound document stays
    /// available for export until the next `show` replaces it.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.live.take() {
            release(handle);
        }
    }

    pub fn active(&self) -> Option<&PreviewHandle> {
        self.live.as_ref()
    }

    pub fn document(&self) -> Option<&GameDocument> {
        self.document.as_ref()
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn materialize(doc: &GameDocument, sandbox: &SandboxPolicy) -> Result<PreviewHandle, PreviewError> {
    let path = temp_preview_path();
    fs::write(&path, doc.html())?;
    let url = Url::from_file_path(&path).map_err(|_| {
        PreviewError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "preview path is not absolute",
        ))
    })?;
    Ok(PreviewHandle {
        path,
        url,
        sandbox: sandbox.clone(),
    })
}

fn release(handle: PreviewHandle) {
    let _ = fs::remove_file(&handle.path);
}

fn temp_preview_path() -> PathBuf {
    // Monotonic suffix keeps paths unique when handles are replaced within
    // the same millisecond.
    static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(0);
    let seq = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "gamesmith-{millis}-{}-{seq}.html",
        std::process::id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract, BEGIN_MARKER, END_MARKER};

    fn doc(body: &str) -> GameDocument {
        let raw = format!("{BEGIN_MARKER}<html><body>{body}</body></html>{END_MARKER}");
        extract(&raw).expect("valid document")
    }

    #[test]
    fn show_materializes_backing_file() {
        let mut session = PreviewSession::default();
        let handle = session.show(doc("snake")).expect("show");
        assert!(handle.path().exists());
        assert_eq!(handle.url().scheme(), "file");
        let written = fs::read_to_string(handle.path()).expect("read back");
        assert!(written.contains("snake"));
    }

    #[test]
    fn second_show_releases_first_handle() {
        let mut session = PreviewSession::default();
        let first_path = session.show(doc("one")).expect("first").path().to_path_buf();
        assert!(first_path.exists());

        let second = session.show(doc("two")).expect("second");
        assert!(second.path().exists());
        assert_ne!(second.path(), first_path.as_path());
        assert!(!first_path.exists(), "previous backing file must be removed");
        assert!(session.active().is_some());
    }

    #[test]
    fn reset_without_document_fails() {
        let mut session = PreviewSession::default();
        assert!(matches!(
            session.reset(),
            Err(PreviewError::NoActiveDocument)
        ));
    }

    #[test]
    fn reset_rebinds_same_document_with_fresh_handle() {
        let mut session = PreviewSession::default();
        let first_path = session.show(doc("pong")).expect("show").path().to_path_buf();
        let html_before = session.document().expect("bound").html().to_string();

        let fresh = session.reset().expect("reset");
        assert!(fresh.path().exists());
        assert_ne!(fresh.path(), first_path.as_path());
        assert!(!first_path.exists());
        assert_eq!(session.document().expect("still bound").html(), html_before);
    }

    #[test]
    fn teardown_is_idempotent_and_keeps_document() {
        let mut session = PreviewSession::default();
        let path = session.show(doc("maze")).expect("show").path().to_path_buf();

        session.teardown();
        session.teardown();
        assert!(!path.exists());
        assert!(session.active().is_none());
        assert!(session.document().is_some(), "document survives teardown");
    }

    #[test]
    fn drop_releases_backing_file() {
        let path = {
            let mut session = PreviewSession::default();
            session.show(doc("drop")).expect("show").path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn default_sandbox_matches_preview_contract() {
        let tokens = SandboxPolicy::default().attribute_tokens();
        assert_eq!(
            tokens,
            vec!["allow-scripts", "allow-pointer-lock", "allow-same-origin"]
        );
    }

    #[test]
    fn disabled_capabilities_drop_out_of_token_list() {
        let policy = SandboxPolicy {
            allow_scripts: true,
            allow_pointer_lock: false,
            allow_same_origin: false,
        };
        assert_eq!(policy.attribute_tokens(), vec!["allow-scripts"]);
    }

    #[test]
    fn handle_carries_session_sandbox() {
        let policy = SandboxPolicy {
            allow_scripts: true,
            allow_pointer_lock: false,
            allow_same_origin: true,
        };
        let mut session = PreviewSession::new(policy);
        let handle = session.show(doc("sandboxed")).expect("show");
        assert!(!handle.sandbox().allow_pointer_lock);
    }
}
