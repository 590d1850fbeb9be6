use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::DirectionIndicator;

/// Tagged commands crossing the indicator queue. Hardware indicators can be
/// slow (USB round-trips), so commands are serialized through one worker
/// thread instead of calling the device from the audio path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorCommand {
    SetDirection(u16),
    Off,
}

/// Single-worker queue in front of a `DirectionIndicator`.
pub struct IndicatorWorker;

impl IndicatorWorker {
    pub fn spawn<I>(mut indicator: I) -> std::io::Result<IndicatorHandle>
    where
        I: DirectionIndicator + 'static,
    {
        let (tx, rx): (Sender<IndicatorCommand>, Receiver<IndicatorCommand>) = unbounded();
        let handle = thread::Builder::new()
            .name("indicator".to_string())
            .spawn(move || {
                for command in rx {
                    match command {
                        IndicatorCommand::SetDirection(degrees) => {
                            indicator.set_direction(degrees);
                        }
                        IndicatorCommand::Off => indicator.off(),
                    }
                }
                // Queue closed: leave the indicator dark.
                indicator.off();
            })?;

        Ok(IndicatorHandle {
            tx: Some(tx),
            handle: Some(handle),
        })
    }
}

/// Sending half of the indicator queue. Sends never block; dropping the
/// handle closes the queue, turns the indicator off, and joins the worker.
pub struct IndicatorHandle {
    tx: Option<Sender<IndicatorCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl IndicatorHandle {
    pub fn send(&self, command: IndicatorCommand) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(command);
        }
    }
}

impl DirectionIndicator for IndicatorHandle {
    fn set_direction(&mut self, degrees: u16) {
        self.send(IndicatorCommand::SetDirection(degrees));
    }

    fn off(&mut self) {
        self.send(IndicatorCommand::Off);
    }
}

impl Drop for IndicatorHandle {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectionIndicator;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recording {
        events: Arc<Mutex<Vec<IndicatorCommand>>>,
    }

    impl DirectionIndicator for Recording {
        fn set_direction(&mut self, degrees: u16) {
            self.events
                .lock()
                .unwrap()
                .push(IndicatorCommand::SetDirection(degrees));
        }

        fn off(&mut self) {
            self.events.lock().unwrap().push(IndicatorCommand::Off);
        }
    }

    #[test]
    fn commands_arrive_in_order() {
        let recording = Recording::default();
        let events = recording.events.clone();

        let mut handle = IndicatorWorker::spawn(recording).unwrap();
        handle.set_direction(30);
        handle.set_direction(300);
        handle.off();
        drop(handle);

        let seen = events.lock().unwrap();
        assert_eq!(
            &seen[..3],
            &[
                IndicatorCommand::SetDirection(30),
                IndicatorCommand::SetDirection(300),
                IndicatorCommand::Off,
            ]
        );
    }

    #[test]
    fn drop_turns_the_indicator_off() {
        let recording = Recording::default();
        let events = recording.events.clone();

        let handle = IndicatorWorker::spawn(recording).unwrap();
        handle.send(IndicatorCommand::SetDirection(90));
        drop(handle);

        let seen = events.lock().unwrap();
        assert_eq!(seen.last(), Some(&IndicatorCommand::Off));
    }
}
