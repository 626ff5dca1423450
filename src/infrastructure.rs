//! Actuation side of the interlocking.
//!
//! The interlocking turns switches and sets signal aspects through every
//! registered provider. The physical bridge of a simulation is one provider;
//! the ones here log or record the commands.

use crate::models::{SignalState, SwitchState};
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

pub trait InfrastructureProvider {
    fn turn_switch(&mut self, switch: &str, state: SwitchState);

    fn set_signal_state(&mut self, signal: &str, state: SignalState);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfrastructureCommand {
    TurnSwitch { switch: String, state: SwitchState },
    SetSignal { signal: String, state: SignalState },
}

/// Writes every command to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProvider;

impl InfrastructureProvider for LoggingProvider {
    fn turn_switch(&mut self, switch: &str, state: SwitchState) {
        info!("turn switch {switch} to {state:?}");
    }

    fn set_signal_state(&mut self, signal: &str, state: SignalState) {
        info!("set signal {signal} to {state:?}");
    }
}

/// Keeps every command in a shared list
#[derive(Debug, Default, Clone)]
pub struct RecordingProvider {
    commands: Rc<RefCell<Vec<InfrastructureCommand>>>,
}

impl RecordingProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle on the recorded commands, still valid after the provider is boxed
    #[must_use]
    pub fn commands(&self) -> Rc<RefCell<Vec<InfrastructureCommand>>> {
        Rc::clone(&self.commands)
    }
}

impl InfrastructureProvider for RecordingProvider {
    fn turn_switch(&mut self, switch: &str, state: SwitchState) {
        self.commands.borrow_mut().push(InfrastructureCommand::TurnSwitch {
            switch: switch.to_string(),
            state,
        });
    }

    fn set_signal_state(&mut self, signal: &str, state: SignalState) {
        self.commands.borrow_mut().push(InfrastructureCommand::SetSignal {
            signal: signal.to_string(),
            state,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_provider_shares_commands() {
        let recorder = RecordingProvider::new();
        let commands = recorder.commands();

        let mut provider: Box<dyn InfrastructureProvider> = Box::new(recorder);
        provider.turn_switch("W1", SwitchState::Right);
        provider.set_signal_state("S1", SignalState::Go);

        assert_eq!(
            *commands.borrow(),
            vec![
                InfrastructureCommand::TurnSwitch { switch: "W1".to_string(), state: SwitchState::Right },
                InfrastructureCommand::SetSignal { signal: "S1".to_string(), state: SignalState::Go },
            ]
        );
    }
}
