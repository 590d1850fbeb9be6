pub mod worker;

pub use worker::{IndicatorCommand, IndicatorHandle, IndicatorWorker};

/// Directional indicator collaborator. `set_direction` is called once per
/// successful resolution with a bearing in [0, 360) degrees.
pub trait DirectionIndicator: Send {
    fn set_direction(&mut self, degrees: u16);
    fn off(&mut self);
}

/// Textual status indicator: prints each bearing and mirrors it to the log
/// stream. Stands in for LED-ring hardware.
#[derive(Debug, Default)]
pub struct LogIndicator;

impl DirectionIndicator for LogIndicator {
    fn set_direction(&mut self, degrees: u16) {
        println!("{degrees}");
        tracing::info!(degrees, "direction");
    }

    fn off(&mut self) {
        tracing::info!("indicator off");
    }
}
