use tycho_types::crc::crc_16;
use tycho_types::prelude::*;

use crate::message::InternalMessage;
use crate::stack::StackValue;

/// Exit code of a getter call with an unknown method id.
pub const UNKNOWN_METHOD_EXIT_CODE: i32 = 11;

/// Contract execution result.
pub type ExecResult<T, E = ExecError> = ::core::result::Result<T, E>;

/// Contract execution error.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The contract rejected the message (it would bounce on a real network).
    #[error("rejected with exit code {0}")]
    Rejected(i32),
    /// The engine itself failed.
    #[error("fatal error")]
    Fatal(#[from] anyhow::Error),
}

impl From<tycho_types::error::Error> for ExecError {
    #[inline]
    fn from(value: tycho_types::error::Error) -> Self {
        Self::Fatal(anyhow::Error::from(value))
    }
}

/// A single addressable state machine.
pub trait Executable {
    /// Handles one inbound message.
    ///
    /// Returns outbound messages in the order they were emitted.
    /// State must stay untouched when the message is rejected.
    fn receive(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>>;

    /// Runs a read-only get method.
    fn run_getter(&self, method_id: u32, args: Vec<StackValue>) -> ExecResult<Vec<StackValue>>;

    /// Current persisted data.
    fn data(&self) -> ExecResult<Cell>;
}

impl<T: Executable + ?Sized> Executable for Box<T> {
    #[inline]
    fn receive(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        T::receive(self, msg)
    }

    #[inline]
    fn run_getter(&self, method_id: u32, args: Vec<StackValue>) -> ExecResult<Vec<StackValue>> {
        T::run_getter(self, method_id, args)
    }

    #[inline]
    fn data(&self) -> ExecResult<Cell> {
        T::data(self)
    }
}

pub trait GetterMethodId {
    fn as_getter_method_id(&self) -> u32;
}

impl<T: GetterMethodId + ?Sized> GetterMethodId for &T {
    fn as_getter_method_id(&self) -> u32 {
        T::as_getter_method_id(*self)
    }
}

impl GetterMethodId for u32 {
    fn as_getter_method_id(&self) -> u32 {
        *self
    }
}

impl GetterMethodId for str {
    fn as_getter_method_id(&self) -> u32 {
        let crc = crc_16(self.as_bytes());
        crc as u32 | 0x10000
    }
}

/// A participant which rejects every message and every getter call.
#[derive(Debug, Clone, Copy)]
pub struct Rejecting {
    pub exit_code: i32,
}

impl Executable for Rejecting {
    fn receive(&mut self, _: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        Err(ExecError::Rejected(self.exit_code))
    }

    fn run_getter(&self, _: u32, _: Vec<StackValue>) -> ExecResult<Vec<StackValue>> {
        Err(ExecError::Rejected(self.exit_code))
    }

    fn data(&self) -> ExecResult<Cell> {
        Ok(Cell::empty_cell())
    }
}
