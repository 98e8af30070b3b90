use tycho_types::error::Error;
use tycho_types::models::StdAddr;
use tycho_types::num::Tokens;
use tycho_types::prelude::*;
use tycho_vote_pipe::{
    ExecError, ExecResult, GetterMethodId, InternalMessage, ResultStack, StackError, StackValue,
    UNKNOWN_METHOD_EXIT_CODE,
};

use crate::codec::{self, Excesses, Header, Payload};
use crate::error::{MALFORMED, STACK_UNDERFLOW, TYPE_CHECK, UNKNOWN_OP};

/// Balance of every freshly deployed contract (10 TON).
pub const INITIAL_BALANCE: Tokens = Tokens::new(10_000_000_000);
/// Value kept by a contract for every message it handles.
pub const COMPUTE_FEE: Tokens = Tokens::new(10_000_000);
/// Balance which reset operations leave on the contract.
pub const STORAGE_RESERVE: Tokens = Tokens::new(50_000_000);

/// Address and balance of a native contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Account {
    pub address: StdAddr,
    pub balance: Tokens,
}

impl Account {
    pub fn new(address: StdAddr, balance: Tokens) -> Self {
        Self { address, balance }
    }

    pub fn credit(&mut self, value: Tokens) {
        self.balance = Tokens::new(self.balance.into_inner().saturating_add(value.into_inner()));
    }

    /// Sends the inbound value minus the compute fee.
    pub fn forward(&mut self, dst: StdAddr, inbound: Tokens, body: Cell) -> InternalMessage {
        let value = inbound.into_inner().saturating_sub(COMPUTE_FEE.into_inner());
        self.send(dst, Tokens::new(value), body)
    }

    /// Returns the inbound value minus the compute fee with an [`Excesses`] body.
    pub fn refund(
        &mut self,
        dst: StdAddr,
        inbound: Tokens,
        query_id: u64,
    ) -> Result<InternalMessage, Error> {
        let body = codec::encode(&Excesses, query_id)?;
        Ok(self.forward(dst, inbound, body).with_bounce(false))
    }

    /// Sends everything above the storage reserve with an [`Excesses`] body.
    pub fn withdraw(&mut self, dst: StdAddr, query_id: u64) -> Result<InternalMessage, Error> {
        let body = codec::encode(&Excesses, query_id)?;
        let excess = self.balance.into_inner().saturating_sub(STORAGE_RESERVE.into_inner());
        Ok(self.send(dst, Tokens::new(excess), body).with_bounce(false))
    }

    fn send(&mut self, dst: StdAddr, value: Tokens, body: Cell) -> InternalMessage {
        let value = std::cmp::min(value, self.balance);
        self.balance = Tokens::new(self.balance.into_inner() - value.into_inner());
        InternalMessage::new(self.address.clone(), dst, value, body)
    }
}

/// Runs `f` and restores `state` when it fails.
pub(crate) fn transaction<S, T, F>(state: &mut S, f: F) -> ExecResult<T>
where
    S: Clone,
    F: FnOnce(&mut S) -> ExecResult<T>,
{
    let snapshot = state.clone();
    let res = f(state);
    if res.is_err() {
        *state = snapshot;
    }
    res
}

/// Parses an inbound body. `None` is a plain transfer.
pub(crate) fn parse_body<T: Payload>(msg: &InternalMessage) -> ExecResult<Option<(u64, T)>> {
    let mut cs = msg.body.as_slice()?;
    if codec::is_empty_slice(&cs) {
        return Ok(None);
    }

    let header = Header::load_from(&mut cs).map_err(|_| ExecError::Rejected(MALFORMED))?;
    if !T::is_known_op(header.op) {
        return Err(ExecError::Rejected(UNKNOWN_OP));
    }

    match T::load_fields(header.op, &mut cs) {
        Ok(payload) => Ok(Some((header.query_id, payload))),
        Err(_) => Err(ExecError::Rejected(MALFORMED)),
    }
}

/// Finds the getter name with the specified id.
pub(crate) fn resolve_getter(method_id: u32, names: &[&'static str]) -> Option<&'static str> {
    names
        .iter()
        .copied()
        .find(|name| name.as_getter_method_id() == method_id)
}

pub(crate) fn unknown_method() -> ExecError {
    ExecError::Rejected(UNKNOWN_METHOD_EXIT_CODE)
}

/// Reads a single address slice argument.
pub(crate) fn address_arg(args: Vec<StackValue>) -> ExecResult<StdAddr> {
    let stack = ResultStack::from(args);
    stack.reader().read_address().map_err(|e| match e {
        StackError::Underflow => ExecError::Rejected(STACK_UNDERFLOW),
        _ => ExecError::Rejected(TYPE_CHECK),
    })
}

pub(crate) fn address_value(addr: &StdAddr) -> ExecResult<StackValue> {
    Ok(StackValue::address_slice(Some(addr))?)
}

pub(crate) fn data_cell<T: Store>(data: &T) -> ExecResult<Cell> {
    Ok(CellBuilder::build_from(data)?)
}
