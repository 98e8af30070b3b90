use tycho_types::error::Error;
use tycho_types::models::StdAddr;
use tycho_types::num::Tokens;
use tycho_types::prelude::*;
use tycho_vote_pipe::{ExecError, ExecResult, Executable, InternalMessage, StackValue};

use crate::codec::{self, Payload, Vote, VoteDelta, op};
use crate::deploy;
use crate::error::{INVALID_SENDER, INVALID_VOTE, ensure};
use crate::native::{self, Account};
use crate::vote_status::VoteStatusMsg;

pub const GET_VOTE_STORAGE_DATA: &str = "get_vote_storage_data";
pub const GET_VOTE_STATUS_ADDRESS: &str = "get_vote_status_address";

/// Persisted data of a vote storage contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteStorageData {
    pub register: StdAddr,
    pub vote_address: StdAddr,
    pub positive: u64,
    pub negative: u64,
    pub vote_status_code: Cell,
}

impl VoteStorageData {
    pub fn initial(register: StdAddr, vote_address: StdAddr, vote_status_code: Cell) -> Self {
        Self {
            register,
            vote_address,
            positive: 0,
            negative: 0,
            vote_status_code,
        }
    }
}

impl Store for VoteStorageData {
    fn store_into(
        &self,
        builder: &mut CellBuilder,
        context: &dyn CellContext,
    ) -> Result<(), Error> {
        self.register.store_into(builder, context)?;
        self.vote_address.store_into(builder, context)?;
        builder.store_u64(self.positive)?;
        builder.store_u64(self.negative)?;
        builder.store_reference(self.vote_status_code.clone())
    }
}

impl Load<'_> for VoteStorageData {
    fn load_from(slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self {
            register: StdAddr::load_from(slice)?,
            vote_address: StdAddr::load_from(slice)?,
            positive: slice.load_u64()?,
            negative: slice.load_u64()?,
            vote_status_code: slice.load_reference_cloned()?,
        })
    }
}

/// Messages accepted by a vote storage contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteStorageMsg {
    /// Sent by the register on behalf of a validated voter.
    CastVote { voter: StdAddr, vote: Vote },
    /// Sent by the status contract of `voter`.
    AddVote { voter: StdAddr, delta: VoteDelta },
    /// Sent by the register to withdraw the accumulated value to `admin`.
    ResetGas { admin: StdAddr },
}

impl Payload for VoteStorageMsg {
    fn op(&self) -> u32 {
        match self {
            Self::CastVote { .. } => op::CAST_VOTE,
            Self::AddVote { .. } => op::ADD_VOTE,
            Self::ResetGas { .. } => op::RESET_GAS,
        }
    }

    fn is_known_op(op: u32) -> bool {
        matches!(op, op::CAST_VOTE | op::ADD_VOTE | op::RESET_GAS)
    }

    fn store_fields(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        let context = Cell::empty_context();
        match self {
            Self::CastVote { voter, vote } => {
                voter.store_into(builder, context)?;
                vote.store_into(builder, context)
            }
            Self::AddVote { voter, delta } => {
                voter.store_into(builder, context)?;
                delta.store_into(builder, context)
            }
            Self::ResetGas { admin } => admin.store_into(builder, context),
        }
    }

    fn load_fields(op: u32, slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        match op {
            op::CAST_VOTE => Ok(Self::CastVote {
                voter: StdAddr::load_from(slice)?,
                vote: Vote::load_from(slice)?,
            }),
            op::ADD_VOTE => Ok(Self::AddVote {
                voter: StdAddr::load_from(slice)?,
                delta: VoteDelta::load_from(slice)?,
            }),
            op::RESET_GAS => Ok(Self::ResetGas {
                admin: StdAddr::load_from(slice)?,
            }),
            _ => Err(Error::InvalidTag),
        }
    }
}

/// Vote counters of one subject.
#[derive(Debug, Clone)]
pub struct VoteStorage {
    account: Account,
    data: VoteStorageData,
}

impl VoteStorage {
    pub fn new(address: StdAddr, data: VoteStorageData, balance: Tokens) -> Self {
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

    pub fn state(&self) -> &VoteStorageData {
        &self.data
    }

    pub fn vote_status_address(&self, voter: &StdAddr) -> Result<StdAddr, Error> {
        deploy::vote_status_address(
            self.address(),
            &self.data.vote_address,
            voter,
            &self.data.vote_status_code,
        )
    }

    fn handle(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        self.account.credit(msg.value);

        let Some((query_id, payload)) = native::parse_body::<VoteStorageMsg>(msg)? else {
            return Ok(Vec::new());
        };

        match payload {
            VoteStorageMsg::CastVote { voter, vote } => {
                ensure(msg.src == self.data.register, INVALID_SENDER)?;

                let status = self.vote_status_address(&voter)?;
                let body = codec::encode(&VoteStatusMsg::VerifyVote { vote }, query_id)?;
                Ok(vec![self.account.forward(status, msg.value, body)])
            }
            VoteStorageMsg::AddVote { voter, delta } => {
                ensure(msg.src == self.vote_status_address(&voter)?, INVALID_SENDER)?;

                let Some((positive, negative)) = delta.apply(self.data.positive, self.data.negative)
                else {
                    return Err(ExecError::Rejected(INVALID_VOTE));
                };
                self.data.positive = positive;
                self.data.negative = negative;
                Ok(Vec::new())
            }
            VoteStorageMsg::ResetGas { admin } => {
                ensure(msg.src == self.data.register, INVALID_SENDER)?;
                Ok(vec![self.account.withdraw(admin, query_id)?])
            }
        }
    }
}

impl Executable for VoteStorage {
    fn receive(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        native::transaction(self, |this| this.handle(msg))
    }

    fn run_getter(&self, method_id: u32, args: Vec<StackValue>) -> ExecResult<Vec<StackValue>> {
        const GETTERS: &[&str] = &[GET_VOTE_STORAGE_DATA, GET_VOTE_STATUS_ADDRESS];

        match native::resolve_getter(method_id, GETTERS) {
            Some(GET_VOTE_STORAGE_DATA) => Ok(vec![
                native::address_value(&self.data.register)?,
                native::address_value(&self.data.vote_address)?,
                StackValue::int(self.data.positive),
                StackValue::int(self.data.negative),
                StackValue::Cell(self.data.vote_status_code.clone()),
            ]),
            Some(GET_VOTE_STATUS_ADDRESS) => {
                let voter = native::address_arg(args)?;
                let status = self.vote_status_address(&voter)?;
                Ok(vec![native::address_value(&status)?])
            }
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
    use tycho_vote_pipe::{GetterMethodId, ResultStack};

    use super::*;
    use crate::error::{MALFORMED, UNKNOWN_OP};
    use crate::deploy::address_from_seed;
    use crate::tests::send_to;

    const VOTER_NAMES: [&str; 3] = ["alice", "bob", "jack"];

    struct Fixture {
        storage: VoteStorage,
        register: StdAddr,
    }

    fn make_fixture() -> Fixture {
        let register = address_from_seed("register");
        let data = VoteStorageData::initial(
            register.clone(),
            address_from_seed("jetton"),
            Cell::empty_cell(),
        );
        let storage = VoteStorage::new(address_from_seed("storage"), data, native::INITIAL_BALANCE);
        Fixture { storage, register }
    }

    fn add_vote(f: &mut Fixture, voter: &StdAddr, delta: VoteDelta) -> Result<()> {
        let status = f.storage.vote_status_address(voter)?;
        let msg = send_to(&status, f.storage.address(), &VoteStorageMsg::AddVote {
            voter: voter.clone(),
            delta,
        })?;
        let out = f.storage.receive(&msg)?;
        assert!(out.is_empty());
        Ok(())
    }

    fn counters(f: &Fixture) -> (u64, u64) {
        (f.storage.state().positive, f.storage.state().negative)
    }

    #[test]
    fn should_bounce_on_wrong_op_code() -> Result<()> {
        let mut f = make_fixture();

        let mut b = CellBuilder::new();
        b.store_u32(0xdeadbeef)?;
        b.store_u64(0)?;
        let msg = InternalMessage::new(
            f.register.clone(),
            f.storage.address().clone(),
            Tokens::new(1_000_000_000),
            b.build()?,
        );
        assert!(matches!(f.storage.receive(&msg), Err(ExecError::Rejected(UNKNOWN_OP))));

        let mut b = CellBuilder::new();
        b.store_u32(op::CAST_VOTE)?;
        let msg = InternalMessage {
            body: b.build()?,
            ..msg
        };
        assert!(matches!(f.storage.receive(&msg), Err(ExecError::Rejected(MALFORMED))));

        assert_eq!(f.storage.balance(), native::INITIAL_BALANCE);
        Ok(())
    }

    #[test]
    fn should_ignore_empty_messages() -> Result<()> {
        let mut f = make_fixture();
        let before = f.storage.data()?;

        let msg = InternalMessage::new(
            address_from_seed("alice"),
            f.storage.address().clone(),
            Tokens::new(1_000_000_000),
            Cell::empty_cell(),
        );
        assert!(f.storage.receive(&msg)?.is_empty());
        assert_eq!(f.storage.data()?, before);
        assert_eq!(f.storage.balance(), Tokens::new(11_000_000_000));
        Ok(())
    }

    #[test]
    fn should_bounce_user_calls() -> Result<()> {
        let mut f = make_fixture();

        for name in VOTER_NAMES.into_iter().chain(["mallory"]) {
            let user = address_from_seed(name);
            let msg = send_to(&user, f.storage.address(), &VoteStorageMsg::CastVote {
                voter: user.clone(),
                vote: Vote::POSITIVE,
            })?;
            assert!(matches!(f.storage.receive(&msg), Err(ExecError::Rejected(INVALID_SENDER))));

            // Only the own status contract may change counters.
            let msg = send_to(&user, f.storage.address(), &VoteStorageMsg::AddVote {
                voter: user.clone(),
                delta: VoteDelta::new(1, 0),
            })?;
            assert!(matches!(f.storage.receive(&msg), Err(ExecError::Rejected(INVALID_SENDER))));
        }
        assert_eq!(counters(&f), (0, 0));
        Ok(())
    }

    #[test]
    fn should_accept_register_calls() -> Result<()> {
        let mut f = make_fixture();

        for name in VOTER_NAMES {
            let voter = address_from_seed(name);
            for vote in [Vote::POSITIVE, Vote::NEGATIVE] {
                let msg = send_to(&f.register, f.storage.address(), &VoteStorageMsg::CastVote {
                    voter: voter.clone(),
                    vote,
                })?;
                let out = f.storage.receive(&msg)?;
                assert_eq!(out.len(), 1);
                assert_eq!(out[0].dst, f.storage.vote_status_address(&voter)?);

                let (_, payload) = codec::decode::<VoteStatusMsg>(&out[0].body)?.unwrap();
                assert_eq!(payload, VoteStatusMsg::VerifyVote { vote });
            }
        }
        assert_eq!(counters(&f), (0, 0));
        Ok(())
    }

    #[test]
    fn should_accept_votes_of_multiple_users() -> Result<()> {
        let mut f = make_fixture();

        let voters = VOTER_NAMES.map(address_from_seed);
        for (i, voter) in voters.iter().enumerate() {
            add_vote(&mut f, voter, VoteDelta::new(1, 0))?;
            assert_eq!(counters(&f), (i as u64 + 1, 0));
        }

        // Change vote.
        add_vote(&mut f, &voters[0], VoteDelta::new(-1, 1))?;
        assert_eq!(counters(&f), (2, 1));
        Ok(())
    }

    #[test]
    fn should_bounce_counter_underflow() -> Result<()> {
        let mut f = make_fixture();
        let voter = address_from_seed("alice");
        let status = f.storage.vote_status_address(&voter)?;

        let msg = send_to(&status, f.storage.address(), &VoteStorageMsg::AddVote {
            voter,
            delta: VoteDelta::new(0, -1),
        })?;
        assert!(matches!(f.storage.receive(&msg), Err(ExecError::Rejected(INVALID_VOTE))));
        assert_eq!(counters(&f), (0, 0));
        Ok(())
    }

    #[test]
    fn should_reset_gas() -> Result<()> {
        let mut f = make_fixture();
        let admin = address_from_seed("admin");

        let msg = send_to(&admin, f.storage.address(), &VoteStorageMsg::ResetGas {
            admin: admin.clone(),
        })?;
        assert!(matches!(f.storage.receive(&msg), Err(ExecError::Rejected(INVALID_SENDER))));

        let msg = send_to(&f.register, f.storage.address(), &VoteStorageMsg::ResetGas {
            admin: admin.clone(),
        })?;
        let out = f.storage.receive(&msg)?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst, admin);
        assert_eq!(out[0].value, Tokens::new(10_950_000_000));
        assert_eq!(f.storage.balance(), native::STORAGE_RESERVE);
        Ok(())
    }

    #[test]
    fn should_get_vote_status_address() -> Result<()> {
        let f = make_fixture();
        let voter = address_from_seed("alice");

        let stack = ResultStack::from(f.storage.run_getter(
            GET_VOTE_STATUS_ADDRESS.as_getter_method_id(),
            vec![native::address_value(&voter)?],
        )?);
        assert_eq!(stack.reader().read_address()?, f.storage.vote_status_address(&voter)?);

        let stack = ResultStack::from(
            f.storage.run_getter(GET_VOTE_STORAGE_DATA.as_getter_method_id(), Vec::new())?,
        );
        let mut reader = stack.reader();
        assert_eq!(reader.read_address()?, f.register);
        assert_eq!(reader.read_address()?, address_from_seed("jetton"));
        assert_eq!(reader.read_u64()?, 0);
        assert_eq!(reader.read_u64()?, 0);
        assert_eq!(reader.read_cell()?, Cell::empty_cell());
        Ok(())
    }
}
