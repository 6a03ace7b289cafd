//! Outbound command queue and its send / ack / retry state machine.
//!
//! The engine is sans-IO: [`CommandEngine::next_transmission`] says which
//! frame to write now, and [`CommandEngine::on_ack`] feeds back every
//! acknowledgement seen on the bus. Only the queue head is ever in flight.

use std::collections::VecDeque;

use estia_frame::{Frame, FrameKind};
use tracing::{debug, warn};

use crate::metrics::{inc, COMMANDS_ACKED, COMMANDS_DROPPED, COMMANDS_REJECTED, COMMANDS_SENT};

/// Defaults for the command channel.
pub const DEFAULT_COMMAND_QUEUE_LEN: usize = 10;
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_COMMAND_RETRIES: u8 = 2;

/// A command waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub frame: Frame,
    /// Data-type code an ack must carry to complete the command.
    pub data_type: u16,
}

impl PendingCommand {
    /// Wrap a sealed command frame, taking the data type from its header.
    pub fn new(frame: Frame) -> Self {
        let data_type = frame.data_type().unwrap_or_default();
        PendingCommand { frame, data_type }
    }
}

/// Head-of-queue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Nothing in flight.
    Idle,
    /// Head written at the given time, awaiting its ack.
    Sent { at_ms: u64 },
}

/// Bounded FIFO of commands with best-effort delivery.
#[derive(Debug)]
pub struct CommandEngine {
    queue: VecDeque<PendingCommand>,
    capacity: usize,
    timeout_ms: u64,
    retry_limit: u8,
    retries: u8,
    state: CommandState,
}

impl Default for CommandEngine {
    fn default() -> Self {
        CommandEngine::new(
            DEFAULT_COMMAND_QUEUE_LEN,
            DEFAULT_COMMAND_TIMEOUT_MS,
            DEFAULT_COMMAND_RETRIES,
        )
    }
}

impl CommandEngine {
    pub fn new(capacity: usize, timeout_ms: u64, retry_limit: u8) -> Self {
        CommandEngine {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            timeout_ms,
            retry_limit,
            retries: 0,
            state: CommandState::Idle,
        }
    }

    /// Queue a command. Returns `false` when the queue is full and the
    /// command was discarded.
    pub fn enqueue(&mut self, command: PendingCommand) -> bool {
        if self.queue.len() >= self.capacity {
            inc(COMMANDS_REJECTED);
            warn!(
                data_type = command.data_type,
                capacity = self.capacity,
                "command queue full, discarding command"
            );
            return false;
        }
        debug!(data_type = command.data_type, "queued command {}", command.frame);
        self.queue.push_back(command);
        true
    }

    /// Queue a sealed command frame.
    pub fn enqueue_frame(&mut self, frame: Frame) -> bool {
        debug_assert!(frame.kind().is_some_and(FrameKind::is_command));
        self.enqueue(PendingCommand::new(frame))
    }

    /// Advance timers and return the frame to write now, if any.
    ///
    /// An unacknowledged head is resent after the timeout until it has been
    /// retransmitted `retry_limit` times, then dropped.
    pub fn next_transmission(&mut self, now_ms: u64) -> Option<Frame> {
        if let CommandState::Sent { at_ms } = self.state {
            if now_ms.saturating_sub(at_ms) <= self.timeout_ms {
                return None;
            }
            if self.retries >= self.retry_limit {
                if let Some(dropped) = self.queue.pop_front() {
                    inc(COMMANDS_DROPPED);
                    warn!(
                        data_type = dropped.data_type,
                        attempts = u16::from(self.retries) + 1,
                        "command not acknowledged, dropping"
                    );
                }
                self.retries = 0;
            } else {
                self.retries += 1;
                debug!(retry = self.retries, "command ack timed out, resending");
            }
            self.state = CommandState::Idle;
        }

        let head = self.queue.front()?;
        self.state = CommandState::Sent { at_ms: now_ms };
        inc(COMMANDS_SENT);
        debug!(data_type = head.data_type, "sending command {}", head.frame);
        Some(head.frame.clone())
    }

    /// Feed an observed ack code. Returns `true` if it completed the
    /// command in flight.
    pub fn on_ack(&mut self, data_type: u16) -> bool {
        if !matches!(self.state, CommandState::Sent { .. }) {
            return false;
        }
        match self.queue.front() {
            Some(head) if head.data_type == data_type => {
                self.queue.pop_front();
                self.retries = 0;
                self.state = CommandState::Idle;
                inc(COMMANDS_ACKED);
                debug!(data_type, "command acknowledged");
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Retries spent on the current head.
    pub fn retries(&self) -> u8 {
        self.retries
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.retries = 0;
        self.state = CommandState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estia_frame::{
        ForcedDefrost, Mode, ModeSwitch, Operation, OperationSwitch, DATA_TYPE_MODE_CHANGE,
        DATA_TYPE_OPERATION_SWITCH,
    };

    fn mode_command() -> PendingCommand {
        PendingCommand::new(ModeSwitch::new(Mode::Auto, true).encode())
    }

    #[test]
    fn test_pending_command_takes_data_type() {
        assert_eq!(mode_command().data_type, DATA_TYPE_MODE_CHANGE);
    }

    #[test]
    fn test_unacknowledged_command_sent_three_times_then_dropped() {
        let mut engine = CommandEngine::default();
        assert!(engine.enqueue(mode_command()));

        let mut transmissions = 0;
        let mut now = 0;
        while now < 10_000 {
            if engine.next_transmission(now).is_some() {
                transmissions += 1;
            }
            now += 100;
        }

        assert_eq!(transmissions, usize::from(DEFAULT_COMMAND_RETRIES) + 1);
        assert!(engine.is_empty());
        assert_eq!(engine.state(), CommandState::Idle);
        assert_eq!(engine.retries(), 0);
    }

    #[test]
    fn test_no_resend_before_timeout() {
        let mut engine = CommandEngine::default();
        engine.enqueue(mode_command());
        assert!(engine.next_transmission(0).is_some());
        assert!(engine.next_transmission(500).is_none());
        assert!(engine.next_transmission(1000).is_none());
        assert!(engine.next_transmission(1001).is_some());
        assert_eq!(engine.retries(), 1);
    }

    #[test]
    fn test_matching_ack_pops_head() {
        let mut engine = CommandEngine::default();
        engine.enqueue(mode_command());
        engine.enqueue(PendingCommand::new(
            OperationSwitch::new(Operation::Heating, true).encode(),
        ));

        let first = engine.next_transmission(0).expect("head sent");
        assert_eq!(first.data_type(), Some(DATA_TYPE_MODE_CHANGE));

        // Ack for some other command is ignored
        assert!(!engine.on_ack(DATA_TYPE_OPERATION_SWITCH));
        assert_eq!(engine.len(), 2);

        assert!(engine.on_ack(DATA_TYPE_MODE_CHANGE));
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.state(), CommandState::Idle);

        let second = engine.next_transmission(10).expect("next head sent");
        assert_eq!(second.data_type(), Some(DATA_TYPE_OPERATION_SWITCH));
    }

    #[test]
    fn test_ack_without_outstanding_send_is_ignored() {
        let mut engine = CommandEngine::default();
        engine.enqueue(mode_command());
        assert!(!engine.on_ack(DATA_TYPE_MODE_CHANGE));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_full_queue_rejects() {
        let mut engine = CommandEngine::new(2, 1000, 2);
        assert!(engine.enqueue_frame(ForcedDefrost::new(true).encode()));
        assert!(engine.enqueue_frame(ForcedDefrost::new(false).encode()));
        assert!(!engine.enqueue(mode_command()));
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_drop_moves_to_next_command() {
        let mut engine = CommandEngine::new(10, 1000, 0);
        engine.enqueue(mode_command());
        engine.enqueue_frame(ForcedDefrost::new(true).encode());

        assert!(engine.next_transmission(0).is_some());
        // With no retries the head is dropped at the first timeout and the
        // next command goes out in the same call
        let next = engine.next_transmission(1001).expect("second command");
        assert_eq!(next.kind(), Some(FrameKind::ForcedDefrost));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_largest_retry_limit_still_drops() {
        let mut engine = CommandEngine::new(1, 10, u8::MAX);
        engine.enqueue(mode_command());

        let mut transmissions = 0;
        let mut now = 0;
        while !engine.is_empty() {
            if engine.next_transmission(now).is_some() {
                transmissions += 1;
            }
            now += 11;
        }

        assert_eq!(transmissions, usize::from(u8::MAX) + 1);
        assert_eq!(engine.retries(), 0);
    }
}
