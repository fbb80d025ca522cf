//! In-process style generation: a diffusion pipeline renders frames which are
//! then encoded into an mp4 under the output directory.
//!
//! The pipeline and encoder sit behind traits. The defaults drive external
//! commands (a pipeline runner and `ffmpeg`), tests plug in fakes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use global_constants::DOWNLOAD_ROUTE_PREFIX;
use serde_json::Value;
use tempfile::TempDir;
use tokio::process::Command;
use uuid::Uuid;

use super::{truncate, BackendAdapter, BackendHandle, BackendSettings};
use crate::models::{BackendCall, BackendKind, BackendRef, ModelDescriptor};
use crate::types::VideoGenError;

/// Rendered frames, removed with the owning temp directory.
pub struct FrameSequence {
    dir: TempDir,
    frames: Vec<PathBuf>,
}

impl FrameSequence {
    /// Collects the `.png` files in `dir`, sorted by name.
    pub fn from_dir(dir: TempDir) -> std::io::Result<Self> {
        let mut frames = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
            .collect::<Vec<_>>();
        frames.sort();
        Ok(Self { dir, frames })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
pub trait DiffusionPipeline: Send + Sync {
    async fn run(
        &self,
        prompt: &str,
        frame_count: u32,
        inference_steps: u32,
        guidance_scale: f32,
    ) -> Result<FrameSequence, VideoGenError>;
}

/// Loads pipeline weights for a checkpoint. Slow, so handles are cached.
#[async_trait]
pub trait PipelineLoader: Send + Sync {
    async fn load(&self, checkpoint: &str) -> Result<Arc<dyn DiffusionPipeline>, VideoGenError>;
}

#[async_trait]
pub trait FrameEncoder: Send + Sync {
    async fn encode(
        &self,
        frames: &FrameSequence,
        output: &Path,
        fps: u32,
    ) -> Result<(), VideoGenError>;
}

/// Runs an external pipeline command that writes numbered PNG frames.
pub struct CommandPipelineLoader {
    program: String,
}

impl CommandPipelineLoader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl PipelineLoader for CommandPipelineLoader {
    async fn load(&self, checkpoint: &str) -> Result<Arc<dyn DiffusionPipeline>, VideoGenError> {
        // Only a missing binary counts as a load failure here.
        Command::new(&self.program)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                VideoGenError::ServiceUnavailable(format!(
                    "pipeline command {} is not runnable: {e}",
                    self.program
                ))
            })?;

        log::info!("Loaded pipeline {checkpoint} via {}", self.program);
        Ok(Arc::new(CommandPipeline {
            program: self.program.clone(),
            checkpoint: checkpoint.to_string(),
        }))
    }
}

pub struct CommandPipeline {
    program: String,
    checkpoint: String,
}

#[async_trait]
impl DiffusionPipeline for CommandPipeline {
    async fn run(
        &self,
        prompt: &str,
        frame_count: u32,
        inference_steps: u32,
        guidance_scale: f32,
    ) -> Result<FrameSequence, VideoGenError> {
        let dir = tempfile::Builder::new()
            .prefix("videogen-frames-")
            .tempdir()?;

        let output = Command::new(&self.program)
            .arg("--checkpoint")
            .arg(&self.checkpoint)
            .arg("--prompt")
            .arg(prompt)
            .arg("--num-frames")
            .arg(frame_count.to_string())
            .arg("--num-inference-steps")
            .arg(inference_steps.to_string())
            .arg("--guidance-scale")
            .arg(guidance_scale.to_string())
            .arg("--output-dir")
            .arg(dir.path())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                VideoGenError::ServiceUnavailable(format!("pipeline did not start: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoGenError::ProviderError(format!(
                "pipeline exited with {}: {}",
                output.status,
                truncate(stderr.trim(), 500)
            )));
        }

        let frames = FrameSequence::from_dir(dir)?;
        if frames.is_empty() {
            return Err(VideoGenError::ProviderError(
                "pipeline produced no frames".to_string(),
            ));
        }
        Ok(frames)
    }
}

/// Encodes frames with `ffmpeg` into H.264 / yuv420p.
pub struct FfmpegEncoder {
    program: String,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl FrameEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        frames: &FrameSequence,
        output: &Path,
        fps: u32,
    ) -> Result<(), VideoGenError> {
        let pattern = frames.dir().join("*.png");
        let result = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-framerate"])
            .arg(fps.to_string())
            .args(["-pattern_type", "glob", "-i"])
            .arg(&pattern)
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VideoGenError::Internal(format!("failed to run {}: {e}", self.program)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(VideoGenError::Internal(format!(
                "encoding {} frames failed: {}",
                frames.len(),
                truncate(stderr.trim(), 500)
            )));
        }
        Ok(())
    }
}

pub struct LocalPipelineAdapter {
    loader: Arc<dyn PipelineLoader>,
    encoder: Arc<dyn FrameEncoder>,
    output_dir: PathBuf,
}

impl LocalPipelineAdapter {
    pub fn new(
        loader: Arc<dyn PipelineLoader>,
        encoder: Arc<dyn FrameEncoder>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            loader,
            encoder,
            output_dir: output_dir.into(),
        }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(
            Arc::new(CommandPipelineLoader::new(&settings.pipeline_command)),
            Arc::new(FfmpegEncoder::new(&settings.ffmpeg_path)),
            &settings.output_dir,
        )
    }
}

#[async_trait]
impl BackendAdapter for LocalPipelineAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalPipeline
    }

    async fn initialize(
        &self,
        model: &ModelDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, VideoGenError> {
        let BackendRef::LocalPipeline { checkpoint } = &model.backend else {
            return Err(VideoGenError::Internal(format!(
                "model {} is not a local pipeline",
                model.id
            )));
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        log::info!("Loading {checkpoint}, this can take several minutes");
        let pipeline = self.loader.load(checkpoint).await?;

        Ok(Arc::new(LocalPipelineHandle {
            pipeline,
            encoder: self.encoder.clone(),
            output_dir: self.output_dir.clone(),
        }))
    }
}

pub struct LocalPipelineHandle {
    pipeline: Arc<dyn DiffusionPipeline>,
    encoder: Arc<dyn FrameEncoder>,
    output_dir: PathBuf,
}

#[async_trait]
impl BackendHandle for LocalPipelineHandle {
    /// Returns the download path of the written mp4.
    async fn generate(&self, call: BackendCall) -> Result<Value, VideoGenError> {
        let BackendCall::Pipeline {
            prompt,
            frame_count,
            inference_steps,
            guidance_scale,
            fps,
        } = call
        else {
            return Err(VideoGenError::Internal(
                "local pipelines only take pipeline calls".to_string(),
            ));
        };

        let frames = self
            .pipeline
            .run(&prompt, frame_count, inference_steps, guidance_scale)
            .await?;

        let file_name = format!("{}.mp4", Uuid::new_v4());
        let output = self.output_dir.join(&file_name);
        if let Err(e) = self.encoder.encode(&frames, &output, fps).await {
            if let Err(cleanup) = tokio::fs::remove_file(&output).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove partial video {}: {cleanup}", output.display());
                }
            }
            return Err(e);
        }
        log::info!("Wrote {} frames to {}", frames.len(), output.display());

        Ok(Value::String(format!("{DOWNLOAD_ROUTE_PREFIX}{file_name}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::models::{BackendInput, COGVIDEOX_2B_LOCAL_MODEL};

    struct FakePipeline;

    #[async_trait]
    impl DiffusionPipeline for FakePipeline {
        async fn run(
            &self,
            _prompt: &str,
            frame_count: u32,
            _inference_steps: u32,
            _guidance_scale: f32,
        ) -> Result<FrameSequence, VideoGenError> {
            let dir = tempfile::tempdir()?;
            for i in 0..frame_count.min(3) {
                std::fs::write(dir.path().join(format!("frame_{i:04}.png")), b"png")?;
            }
            std::fs::write(dir.path().join("notes.txt"), b"ignored")?;
            Ok(FrameSequence::from_dir(dir)?)
        }
    }

    #[derive(Default)]
    struct FakeLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl PipelineLoader for FakeLoader {
        async fn load(
            &self,
            _checkpoint: &str,
        ) -> Result<Arc<dyn DiffusionPipeline>, VideoGenError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FakePipeline))
        }
    }

    struct CopyEncoder;

    #[async_trait]
    impl FrameEncoder for CopyEncoder {
        async fn encode(
            &self,
            frames: &FrameSequence,
            output: &Path,
            fps: u32,
        ) -> Result<(), VideoGenError> {
            assert_eq!(fps, 8);
            std::fs::write(output, format!("{} frames", frames.len()))?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn writes_video_and_returns_download_path() {
        let out = tempfile::tempdir().unwrap();
        let output_dir = out.path().join("generated_videos");
        let loader = Arc::new(FakeLoader::default());
        let adapter = LocalPipelineAdapter::new(loader.clone(), Arc::new(CopyEncoder), &output_dir);

        let handle = adapter.initialize(&COGVIDEOX_2B_LOCAL_MODEL).await.unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(output_dir.is_dir());

        let call = COGVIDEOX_2B_LOCAL_MODEL
            .request_for(&BackendInput {
                prompt: "a lighthouse at dusk",
                image: None,
            })
            .unwrap();
        let value = handle.generate(call).await.unwrap();
        let location = value.as_str().unwrap();
        let file_name = location.strip_prefix("/download/").unwrap();
        assert!(file_name.ends_with(".mp4"));
        assert_eq!(
            std::fs::read_to_string(output_dir.join(file_name)).unwrap(),
            "3 frames"
        );
    }

    struct TruncatingEncoder;

    #[async_trait]
    impl FrameEncoder for TruncatingEncoder {
        async fn encode(
            &self,
            _frames: &FrameSequence,
            output: &Path,
            _fps: u32,
        ) -> Result<(), VideoGenError> {
            std::fs::write(output, b"partial")?;
            Err(VideoGenError::ProviderError("encoder exited with status 1".into()))
        }
    }

    #[tokio::test]
    async fn failed_encode_leaves_no_partial_video() {
        let out = tempfile::tempdir().unwrap();
        let adapter = LocalPipelineAdapter::new(
            Arc::new(FakeLoader::default()),
            Arc::new(TruncatingEncoder),
            out.path(),
        );
        let handle = adapter.initialize(&COGVIDEOX_2B_LOCAL_MODEL).await.unwrap();
        let call = COGVIDEOX_2B_LOCAL_MODEL
            .request_for(&BackendInput {
                prompt: "a lighthouse at dusk",
                image: None,
            })
            .unwrap();

        assert_eq!(
            handle.generate(call).await.unwrap_err(),
            VideoGenError::ProviderError("encoder exited with status 1".into())
        );
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn frame_sequence_keeps_only_sorted_pngs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png", "c.jpg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let frames = FrameSequence::from_dir(dir).unwrap();
        let names: Vec<_> = frames
            .frames()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.png", "b.png"]);
    }

    #[tokio::test]
    async fn missing_pipeline_command_is_unavailable() {
        let loader = CommandPipelineLoader::new("/nonexistent/videogen-pipeline");
        let err = loader.load("THUDM/CogVideoX-2b").await.err().unwrap();
        assert!(matches!(err, VideoGenError::ServiceUnavailable(_)));
    }
}
