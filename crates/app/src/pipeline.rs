use auricle_audio::{EpochWindow, SampleBlock, SlidingWindow};
use auricle_detect::{KeywordSpotter, SpeechDetector};
use auricle_doa::{channel_samples, DirectionFinder, TdoaEstimator};
use auricle_foundation::ShutdownToken;
use auricle_indicator::DirectionIndicator;

/// Keyword-triggered loop: every block enters the sliding history; a
/// positive detection score on the reference channel flushes the history
/// into one buffer and resolves a bearing from it. Returns the number of
/// bearings pushed to the indicator.
pub fn run_triggered<I, S, E, D>(
    blocks: I,
    spotter: &mut S,
    window: &mut SlidingWindow,
    finder: &mut DirectionFinder<E>,
    indicator: &mut D,
    shutdown: &ShutdownToken,
) -> usize
where
    I: IntoIterator<Item = SampleBlock>,
    S: KeywordSpotter,
    E: TdoaEstimator,
    D: DirectionIndicator,
{
    let channels = finder.topology().channels() as usize;
    let mut resolved = 0;

    for block in blocks {
        if shutdown.is_triggered() {
            break;
        }
        let reference = channel_samples(&block.samples, channels, 0);
        window.push(block);

        let score = spotter.run_detection(&reference);
        if score > 0.0 {
            tracing::debug!(score, "keyword trigger");
            if let Some(bearing) = finder.estimate(&window.concat()) {
                indicator.set_direction(bearing);
                resolved += 1;
            }
        }
    }

    resolved
}

/// Epoch-gated loop: each block is classified on the reference channel and
/// accumulated; epochs with enough active blocks are resolved. Returns the
/// number of bearings pushed to the indicator.
pub fn run_gated<I, V, E, D>(
    blocks: I,
    detector: &mut V,
    window: &mut EpochWindow,
    finder: &mut DirectionFinder<E>,
    indicator: &mut D,
    shutdown: &ShutdownToken,
) -> usize
where
    I: IntoIterator<Item = SampleBlock>,
    V: SpeechDetector,
    E: TdoaEstimator,
    D: DirectionIndicator,
{
    let channels = finder.topology().channels() as usize;
    let mut resolved = 0;

    for block in blocks {
        if shutdown.is_triggered() {
            break;
        }
        let reference = channel_samples(&block.samples, channels, 0);
        let active = detector.is_speech(&reference, block.sample_rate);

        if let Some(epoch) = window.push(block, active) {
            if let Some(bearing) = finder.estimate(&epoch) {
                indicator.set_direction(bearing);
                resolved += 1;
            }
        }
    }

    resolved
}

/// Ungated loop: resolve a bearing for every captured block. Returns the
/// number of bearings pushed to the indicator.
pub fn run_continuous<I, E, D>(
    blocks: I,
    finder: &mut DirectionFinder<E>,
    indicator: &mut D,
    shutdown: &ShutdownToken,
) -> usize
where
    I: IntoIterator<Item = SampleBlock>,
    E: TdoaEstimator,
    D: DirectionIndicator,
{
    let mut resolved = 0;

    for block in blocks {
        if shutdown.is_triggered() {
            break;
        }
        if let Some(bearing) = finder.estimate(&block.samples) {
            indicator.set_direction(bearing);
            resolved += 1;
        }
    }

    resolved
}
