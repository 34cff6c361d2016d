use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

/// Directory layout of one named run:
///
///   {log_root}/{exp}/
///     ckpt/      best weights, best_record.json, train_config.json
///     figure/    epoch{N}.png
///     metrics.csv, events.out.tfevents.* (TensorBoard)
#[derive(Debug, Clone)]
pub struct Experiment {
    name: String,
    root: PathBuf,
}

impl Experiment {
    /// Create the run directories (like `mkdir -p`) for a new training run.
    pub fn prepare(log_root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let exp = Self::at(log_root, name);
        for dir in [exp.root.clone(), exp.ckpt_dir(), exp.figure_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }
        tracing::info!("Experiment '{}' at '{}'", name, exp.root.display());
        Ok(exp)
    }

    /// Open an existing run; fails if it was never trained.
    pub fn open(log_root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let exp = Self::at(log_root, name);
        anyhow::ensure!(
            exp.ckpt_dir().is_dir(),
            "No experiment '{}' under '{}'. Have you run 'train' first?",
            name,
            exp.root.display()
        );
        Ok(exp)
    }

    fn at(log_root: impl AsRef<Path>, name: &str) -> Self {
        Self { name: name.to_string(), root: log_root.as_ref().join(name) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ckpt_dir(&self) -> PathBuf {
        self.root.join("ckpt")
    }

    pub fn figure_dir(&self) -> PathBuf {
        self.root.join("figure")
    }

    pub fn figure_path(&self, epoch: usize) -> PathBuf {
        self.figure_dir().join(format!("epoch{epoch}.png"))
    }
}
