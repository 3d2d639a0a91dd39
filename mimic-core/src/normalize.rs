//! Running-average statistics and observation normalization.
//!
//! [`ObsNormalizer`] keeps the statistics of observations (and returns) seen during
//! training. The statistics are persisted next to a model checkpoint with
//! [`ObsNormalizer::save_running_average`], so that a policy can be fed
//! observations on the scale it was trained with after being loaded.
mod normalizer;
mod running_mean_std;
pub use normalizer::{ObsNormalizer, ObsNormalizerConfig, OBS_RMS_FILE_NAME, RET_RMS_FILE_NAME};
pub use running_mean_std::RunningMeanStd;
