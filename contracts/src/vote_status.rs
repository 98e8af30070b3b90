use tycho_types::error::Error;
use tycho_types::models::StdAddr;
use tycho_types::num::Tokens;
use tycho_types::prelude::*;
use tycho_vote_pipe::{ExecResult, Executable, InternalMessage, StackValue};

use crate::codec::{self, Payload, Vote, VoteDelta, op};
use crate::error::{INVALID_SENDER, INVALID_VOTE, ensure};
use crate::native::{self, Account};
use crate::vote_storage::VoteStorageMsg;

pub const GET_VOTE_STATUS_DATA: &str = "get_vote_status_data";

/// Persisted data of a vote status contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteStatusData {
    pub vote_address: StdAddr,
    pub voter: StdAddr,
    pub vote_storage: StdAddr,
    pub vote: Vote,
}

impl VoteStatusData {
    pub fn initial(vote_address: StdAddr, voter: StdAddr, vote_storage: StdAddr) -> Self {
        Self {
            vote_address,
            voter,
            vote_storage,
            vote: Vote::RESET,
        }
    }
}

impl Store for VoteStatusData {
    fn store_into(
        &self,
        builder: &mut CellBuilder,
        context: &dyn CellContext,
    ) -> Result<(), Error> {
        self.vote_address.store_into(builder, context)?;
        self.voter.store_into(builder, context)?;
        self.vote_storage.store_into(builder, context)?;
        self.vote.store_into(builder, context)
    }
}

impl Load<'_> for VoteStatusData {
    fn load_from(slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self {
            vote_address: StdAddr::load_from(slice)?,
            voter: StdAddr::load_from(slice)?,
            vote_storage: StdAddr::load_from(slice)?,
            vote: Vote::load_from(slice)?,
        })
    }
}

/// Messages accepted by a vote status contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteStatusMsg {
    /// Sent by the vote storage with the new vote of the voter.
    VerifyVote { vote: Vote },
    /// Sent by the voter to withdraw the accumulated value.
    ResetGas,
}

impl Payload for VoteStatusMsg {
    fn op(&self) -> u32 {
        match self {
            Self::VerifyVote { .. } => op::VERIFY_VOTE,
            Self::ResetGas => op::RESET_GAS,
        }
    }

    fn is_known_op(op: u32) -> bool {
        matches!(op, op::VERIFY_VOTE | op::RESET_GAS)
    }

    fn store_fields(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        match self {
            Self::VerifyVote { vote } => vote.store_into(builder, Cell::empty_context()),
            Self::ResetGas => Ok(()),
        }
    }

    fn load_fields(op: u32, slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        match op {
            op::VERIFY_VOTE => Ok(Self::VerifyVote {
                vote: Vote::load_from(slice)?,
            }),
            op::RESET_GAS => Ok(Self::ResetGas),
            _ => Err(Error::InvalidTag),
        }
    }
}

/// Vote of one voter for one subject.
#[derive(Debug, Clone)]
pub struct VoteStatus {
    account: Account,
    data: VoteStatusData,
}

impl VoteStatus {
    pub fn new(address: StdAddr, data: VoteStatusData, balance: Tokens) -> Self {
        Self {
            account: Account::new(address, balance),
            data,
        }
    }

    pub fn address(&self) -> &StdAddr {
        &self.account.address
    }

    pub fn balance(&self) -> Tokens {
        self.account.balance
    }

    pub fn state(&self) -> &VoteStatusData {
        &self.data
    }

    fn handle(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        self.account.credit(msg.value);

        let Some((query_id, payload)) = native::parse_body::<VoteStatusMsg>(msg)? else {
            return Ok(Vec::new());
        };

        match payload {
            VoteStatusMsg::VerifyVote { vote } => {
                ensure(msg.src == self.data.vote_storage, INVALID_SENDER)?;
                ensure(vote.is_valid(), INVALID_VOTE)?;

                if vote == self.data.vote {
                    let voter = self.data.voter.clone();
                    return Ok(vec![self.account.refund(voter, msg.value, query_id)?]);
                }

                let delta = VoteDelta::between(self.data.vote, vote);
                self.data.vote = vote;

                let body = codec::encode(
                    &VoteStorageMsg::AddVote {
                        voter: self.data.voter.clone(),
                        delta,
                    },
                    query_id,
                )?;
                let storage = self.data.vote_storage.clone();
                Ok(vec![self.account.forward(storage, msg.value, body)])
            }
            VoteStatusMsg::ResetGas => {
                ensure(msg.src == self.data.voter, INVALID_SENDER)?;
                let voter = self.data.voter.clone();
                Ok(vec![self.account.withdraw(voter, query_id)?])
            }
        }
    }
}

impl Executable for VoteStatus {
    fn receive(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        native::transaction(self, |this| this.handle(msg))
    }

    fn run_getter(&self, method_id: u32, _: Vec<StackValue>) -> ExecResult<Vec<StackValue>> {
        match native::resolve_getter(method_id, &[GET_VOTE_STATUS_DATA]) {
            Some(GET_VOTE_STATUS_DATA) => Ok(vec![
                native::address_value(&self.data.vote_address)?,
                native::address_value(&self.data.voter)?,
                native::address_value(&self.data.vote_storage)?,
                StackValue::int(self.data.vote.positive as u8),
                StackValue::int(self.data.vote.negative as u8),
            ]),
            _ => Err(native::unknown_method()),
        }
    }

    fn data(&self) -> ExecResult<Cell> {
        native::data_cell(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tycho_vote_pipe::{ExecError, GetterMethodId, ResultStack, UNKNOWN_METHOD_EXIT_CODE};

    use super::*;
    use crate::codec::Excesses;
    use crate::deploy::address_from_seed;
    use crate::tests::send_to;

    struct Fixture {
        status: VoteStatus,
        storage: StdAddr,
        voter: StdAddr,
    }

    fn make_fixture() -> Fixture {
        let voter = address_from_seed("alice");
        let storage = address_from_seed("storage");
        let jetton = address_from_seed("jetton");
        let data = VoteStatusData::initial(jetton, voter.clone(), storage.clone());
        let status = VoteStatus::new(address_from_seed("status"), data, native::INITIAL_BALANCE);
        Fixture {
            status,
            storage,
            voter,
        }
    }

    fn verify(f: &mut Fixture, vote: Vote) -> ExecResult<Vec<InternalMessage>> {
        let msg = send_to(&f.storage, f.status.address(), &VoteStatusMsg::VerifyVote { vote })
            .map_err(ExecError::from)?;
        f.status.receive(&msg)
    }

    #[test]
    fn should_bounce_user_calls() -> Result<()> {
        let mut f = make_fixture();
        let before = f.status.data()?;

        let msg = send_to(&f.voter, f.status.address(), &VoteStatusMsg::VerifyVote {
            vote: Vote::POSITIVE,
        })?;
        assert!(matches!(f.status.receive(&msg), Err(ExecError::Rejected(INVALID_SENDER))));
        assert_eq!(f.status.data()?, before);
        assert_eq!(f.status.balance(), native::INITIAL_BALANCE);
        Ok(())
    }

    #[test]
    fn should_accept_storage_change_vote_calls() -> Result<()> {
        let mut f = make_fixture();

        for (vote, delta) in [
            (Vote::POSITIVE, VoteDelta::new(1, 0)),
            (Vote::NEGATIVE, VoteDelta::new(-1, 1)),
            (Vote::RESET, VoteDelta::new(0, -1)),
        ] {
            let out = verify(&mut f, vote)?;
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].dst, f.storage);

            let (_, payload) = codec::decode::<VoteStorageMsg>(&out[0].body)?.unwrap();
            assert_eq!(payload, VoteStorageMsg::AddVote {
                voter: f.voter.clone(),
                delta
            });
            assert_eq!(f.status.state().vote, vote);
        }
        Ok(())
    }

    #[test]
    fn should_return_gas_on_same_vote() -> Result<()> {
        let mut f = make_fixture();
        verify(&mut f, Vote::POSITIVE)?;

        let out = verify(&mut f, Vote::POSITIVE)?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst, f.voter);
        assert!(!out[0].bounce);
        assert!(codec::decode::<Excesses>(&out[0].body)?.is_some());
        Ok(())
    }

    #[test]
    fn should_bounce_both_flags() -> Result<()> {
        let mut f = make_fixture();
        let res = verify(&mut f, Vote::new(true, true));
        assert!(matches!(res, Err(ExecError::Rejected(INVALID_VOTE))));
        assert_eq!(f.status.state().vote, Vote::RESET);
        Ok(())
    }

    #[test]
    fn user_should_call_reset_gas() -> Result<()> {
        let mut f = make_fixture();

        let msg = send_to(&f.storage, f.status.address(), &VoteStatusMsg::ResetGas)?;
        assert!(matches!(f.status.receive(&msg), Err(ExecError::Rejected(INVALID_SENDER))));

        let msg = send_to(&f.voter, f.status.address(), &VoteStatusMsg::ResetGas)?;
        let out = f.status.receive(&msg)?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst, f.voter);
        assert_eq!(f.status.balance(), native::STORAGE_RESERVE);
        Ok(())
    }

    #[test]
    fn getters() -> Result<()> {
        let mut f = make_fixture();
        verify(&mut f, Vote::NEGATIVE)?;

        let stack = ResultStack::from(
            f.status.run_getter(GET_VOTE_STATUS_DATA.as_getter_method_id(), Vec::new())?,
        );
        let mut reader = stack.reader();
        assert_eq!(reader.read_address()?, address_from_seed("jetton"));
        assert_eq!(reader.read_address()?, f.voter);
        assert_eq!(reader.read_address()?, f.storage);
        assert!(!reader.read_bool()?);
        assert!(reader.read_bool()?);

        assert!(matches!(
            f.status.run_getter(0, Vec::new()),
            Err(ExecError::Rejected(UNKNOWN_METHOD_EXIT_CODE))
        ));
        Ok(())
    }
}
