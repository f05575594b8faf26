//! Stub screen-capture capability.
//!
//! Real screen grabbing is platform work outside this crate; the handler
//! writes a 1x1 placeholder PNG so the capability path (command routing,
//! artifact envelope, room message) works end to end.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use agentdesk_core::capability::{CapabilityArtifact, CapabilityFuture, CapabilityHandler};
use agentdesk_core::router::StructuredCommand;
use agentdesk_types::chat::CommandVerb;
use agentdesk_types::error::ChatError;

/// Smallest valid PNG: one grey pixel.
const PLACEHOLDER_PNG: [u8; 68] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x04, 0x00, 0x00, 0x00, 0xb5,
    0x1c, 0x0c, 0x02, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64,
    0x60, 0x00, 0x00, 0x00, 0x06, 0x00, 0x02, 0x30, 0x81, 0xd0, 0x2f, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[derive(Debug, Clone)]
pub struct ScreenCaptureHandler {
    output_dir: PathBuf,
}

impl ScreenCaptureHandler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    async fn capture(&self, command: &StructuredCommand) -> Result<CapabilityArtifact, ChatError> {
        let failed = |e: std::io::Error| ChatError::Capability {
            verb: CommandVerb::CaptureScreen.to_string(),
            message: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(failed)?;
        let path = self
            .output_dir
            .join(format!("capture-{}.png", uuid::Uuid::now_v7()));
        tokio::fs::write(&path, PLACEHOLDER_PNG)
            .await
            .map_err(failed)?;

        let subject = command.target.as_deref().unwrap_or("screen");
        tracing::info!(
            agent_id = %command.agent_id,
            path = %path.display(),
            "captured {subject}"
        );

        Ok(CapabilityArtifact {
            description: format!("Captured {subject} to {}", path.display()),
            media_type: Some("image/png".to_string()),
            data: Some(STANDARD.encode(PLACEHOLDER_PNG)),
            path: Some(path.display().to_string()),
        })
    }
}

impl CapabilityHandler for ScreenCaptureHandler {
    fn verb(&self) -> CommandVerb {
        CommandVerb::CaptureScreen
    }

    fn invoke<'a>(&'a self, command: &'a StructuredCommand) -> CapabilityFuture<'a> {
        Box::pin(self.capture(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn command(target: Option<&str>) -> StructuredCommand {
        StructuredCommand {
            agent_id: "desk".to_string(),
            verb: CommandVerb::CaptureScreen,
            target: target.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_capture_writes_png_artifact() {
        let tmp = TempDir::new().unwrap();
        let handler = ScreenCaptureHandler::new(tmp.path().join("caps"));
        let artifact = handler.invoke(&command(Some("main window"))).await.unwrap();

        let path = PathBuf::from(artifact.path.as_deref().unwrap());
        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(&written[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(artifact.media_type.as_deref(), Some("image/png"));
        assert_eq!(
            STANDARD.decode(artifact.data.unwrap()).unwrap(),
            PLACEHOLDER_PNG.to_vec()
        );
        assert!(artifact.description.starts_with("Captured main window"));
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_capability_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        tokio::fs::write(&blocker, "x").await.unwrap();
        let handler = ScreenCaptureHandler::new(blocker.join("sub"));
        let err = handler.invoke(&command(None)).await.unwrap_err();
        assert!(matches!(err, ChatError::Capability { .. }));
    }

    #[test]
    fn test_verb() {
        assert_eq!(ScreenCaptureHandler::new("/tmp").verb(), CommandVerb::CaptureScreen);
    }
}
