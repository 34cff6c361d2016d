// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `test`, and all
// their configurable flags. Defaults reproduce the reference
// experiment: 8 sensors, SNR 80 dB, 300 epochs, batch 16.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{test_use_case::TestConfig, train_use_case::TrainConfig};
use crate::domain::range::IndexRange;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CNN reconstruction model
    Train(TrainArgs),

    /// Evaluate a trained checkpoint on held-out snapshots
    Test(TestArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Experiment name; outputs go to {log_root}/{exp}
    #[arg(long, default_value = "recon_cnn_cylinder_8_snr80")]
    pub exp: String,

    /// Root directory for all experiments
    #[arg(long, default_value = "logs")]
    pub log_root: String,

    /// .npy file of shape [N, H, W]; synthetic wake when omitted
    #[arg(long)]
    pub data_file: Option<String>,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 300)]
    pub epochs: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Initial Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Learning rate is multiplied by this after every epoch
    #[arg(long, default_value_t = 0.98)]
    pub gamma: f64,

    /// Index of the discrete GPU to train on
    #[arg(long)]
    pub gpu_id: Option<usize>,

    /// Train on the CPU (NdArray backend) instead of WGPU
    #[arg(long)]
    pub cpu: bool,

    /// Validate every N epochs
    #[arg(long, default_value_t = 1)]
    pub val_interval: usize,

    /// Plot a validation sample every N epochs (on validation epochs)
    #[arg(long, default_value_t = 10)]
    pub plot_freq: usize,

    /// Sensor signal-to-noise ratio in dB
    #[arg(long, default_value_t = 80.0)]
    pub snr_db: f64,

    /// Train on clean sensor values (ignores --snr-db)
    #[arg(long)]
    pub no_noise: bool,

    /// Snapshot indices used for training
    #[arg(long, default_value = "0..3500")]
    pub train_range: IndexRange,

    /// Snapshot indices used for validation
    #[arg(long, default_value = "3500..4250")]
    pub val_range: IndexRange,

    /// Data loader worker threads
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Shuffle seed for the training loader
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Height of the coarse feature map; output height is 16x this
    #[arg(long, default_value_t = 7)]
    pub fc_height: usize,

    /// Width of the coarse feature map; output width is 16x this
    #[arg(long, default_value_t = 12)]
    pub fc_width: usize,

    /// Hidden width of the sensor MLP
    #[arg(long, default_value_t = 128)]
    pub hidden: usize,

    /// Channels of the coarse feature map
    #[arg(long, default_value_t = 64)]
    pub channels: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            exp:          a.exp,
            log_root:     a.log_root,
            data_file:    a.data_file,
            epochs:       a.epochs,
            batch_size:   a.batch_size,
            lr:           a.lr,
            gamma:        a.gamma,
            gpu_id:       a.gpu_id,
            cpu:          a.cpu,
            val_interval: a.val_interval,
            plot_freq:    a.plot_freq,
            snr_db:       a.snr_db,
            no_noise:     a.no_noise,
            train_range:  a.train_range,
            val_range:    a.val_range,
            num_workers:  a.num_workers,
            seed:         a.seed,
            fc_height:    a.fc_height,
            fc_width:     a.fc_width,
            hidden:       a.hidden,
            channels:     a.channels,
        }
    }
}

/// All arguments for the `test` command
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Experiment to evaluate
    #[arg(long, default_value = "recon_cnn_cylinder_8_snr80")]
    pub exp: String,

    /// Root directory for all experiments
    #[arg(long, default_value = "logs")]
    pub log_root: String,

    /// Checkpoint file to load instead of the experiment's best
    #[arg(long)]
    pub snapshot: Option<String>,

    /// .npy snapshot file; defaults to the one used for training
    #[arg(long)]
    pub data_file: Option<String>,

    /// Number of snapshots evaluated together in one forward pass
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Sensor signal-to-noise ratio in dB
    #[arg(long, default_value_t = 80.0)]
    pub snr_db: f64,

    /// Evaluate on clean sensor values (ignores --snr-db)
    #[arg(long)]
    pub no_noise: bool,

    /// Snapshot indices to evaluate
    #[arg(long, default_value = "4250..5000")]
    pub test_range: IndexRange,

    /// Seed for the (repeatable) test noise
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Index of the discrete GPU to evaluate on
    #[arg(long)]
    pub gpu_id: Option<usize>,

    /// Evaluate on the CPU (NdArray backend) instead of WGPU
    #[arg(long)]
    pub cpu: bool,
}

impl From<TestArgs> for TestConfig {
    fn from(a: TestArgs) -> Self {
        TestConfig {
            exp:        a.exp,
            log_root:   a.log_root,
            snapshot:   a.snapshot,
            data_file:  a.data_file,
            batch_size: a.batch_size,
            snr_db:     a.snr_db,
            no_noise:   a.no_noise,
            test_range: a.test_range,
            seed:       a.seed,
            gpu_id:     a.gpu_id,
            cpu:        a.cpu,
        }
    }
}
