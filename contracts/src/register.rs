use tycho_types::error::Error;
use tycho_types::models::StdAddr;
use tycho_types::num::Tokens;
use tycho_types::prelude::*;
use tycho_vote_pipe::{ExecResult, Executable, InternalMessage, StackValue};

use crate::codec::{
    self, Payload, Vote, VoterMark, VoterSet, load_opt_std_addr, op, store_opt_std_addr,
};
use crate::deploy;
use crate::error::{INVALID_VOTE, LOW_VALUE, NOT_ADMIN, NOT_PENDING_ADMIN, NOT_VOTER, ensure};
use crate::native::{self, Account};
use crate::vote_storage::VoteStorageMsg;

pub const GET_REGISTER_DATA: &str = "get_register_data";
pub const GET_VOTE_STORAGE_ADDRESS: &str = "get_vote_storage_address";

/// Minimal value attached to a vote.
pub const MIN_CAST_VALUE: Tokens = Tokens::new(50_000_000);

/// Persisted data of the register contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterData {
    pub admin: StdAddr,
    pub pending_admin: Option<StdAddr>,
    pub voters: VoterSet,
    pub vote_storage_code: Cell,
    pub vote_status_code: Cell,
}

impl Store for RegisterData {
    fn store_into(
        &self,
        builder: &mut CellBuilder,
        context: &dyn CellContext,
    ) -> Result<(), Error> {
        self.admin.store_into(builder, context)?;
        store_opt_std_addr(builder, self.pending_admin.as_ref())?;
        self.voters.store_into(builder, context)?;
        builder.store_reference(self.vote_storage_code.clone())?;
        builder.store_reference(self.vote_status_code.clone())
    }
}

impl Load<'_> for RegisterData {
    fn load_from(slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self {
            admin: StdAddr::load_from(slice)?,
            pending_admin: load_opt_std_addr(slice)?,
            voters: VoterSet::load_from(slice)?,
            vote_storage_code: slice.load_reference_cloned()?,
            vote_status_code: slice.load_reference_cloned()?,
        })
    }
}

/// Messages accepted by the register contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterMsg {
    CastVote { vote_address: StdAddr, vote: Vote },
    AddVoter { voter: StdAddr },
    RemoveVoter { voter: StdAddr },
    ChangeAdmin { new_admin: StdAddr },
    ClaimAdmin,
    ResetGas,
    ResetGasStorage { vote_address: StdAddr },
}

impl Payload for RegisterMsg {
    fn op(&self) -> u32 {
        match self {
            Self::CastVote { .. } => op::CAST_VOTE,
            Self::AddVoter { .. } => op::ADD_VOTER,
            Self::RemoveVoter { .. } => op::REMOVE_VOTER,
            Self::ChangeAdmin { .. } => op::CHANGE_ADMIN,
            Self::ClaimAdmin => op::CLAIM_ADMIN,
            Self::ResetGas => op::RESET_GAS,
            Self::ResetGasStorage { .. } => op::RESET_GAS_STORAGE,
        }
    }

    fn is_known_op(op: u32) -> bool {
        matches!(
            op,
            op::CAST_VOTE
                | op::ADD_VOTER
                | op::REMOVE_VOTER
                | op::CHANGE_ADMIN
                | op::CLAIM_ADMIN
                | op::RESET_GAS
                | op::RESET_GAS_STORAGE
        )
    }

    fn store_fields(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        let context = Cell::empty_context();
        match self {
            Self::CastVote { vote_address, vote } => {
                vote_address.store_into(builder, context)?;
                vote.store_into(builder, context)
            }
            Self::AddVoter { voter } | Self::RemoveVoter { voter } => {
                voter.store_into(builder, context)
            }
            Self::ChangeAdmin { new_admin } => new_admin.store_into(builder, context),
            Self::ClaimAdmin | Self::ResetGas => Ok(()),
            Self::ResetGasStorage { vote_address } => vote_address.store_into(builder, context),
        }
    }

    fn load_fields(op: u32, slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(match op {
            op::CAST_VOTE => Self::CastVote {
                vote_address: StdAddr::load_from(slice)?,
                vote: Vote::load_from(slice)?,
            },
            op::ADD_VOTER => Self::AddVoter {
                voter: StdAddr::load_from(slice)?,
            },
            op::REMOVE_VOTER => Self::RemoveVoter {
                voter: StdAddr::load_from(slice)?,
            },
            op::CHANGE_ADMIN => Self::ChangeAdmin {
                new_admin: StdAddr::load_from(slice)?,
            },
            op::CLAIM_ADMIN => Self::ClaimAdmin,
            op::RESET_GAS => Self::ResetGas,
            op::RESET_GAS_STORAGE => Self::ResetGasStorage {
                vote_address: StdAddr::load_from(slice)?,
            },
            _ => return Err(Error::InvalidTag),
        })
    }
}

/// Entry point of voters and the admin.
#[derive(Debug, Clone)]
pub struct Register {
    account: Account,
    data: RegisterData,
}

impl Register {
    pub fn new(address: StdAddr, data: RegisterData, balance: Tokens) -> Self {
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

    pub fn state(&self) -> &RegisterData {
        &self.data
    }

    pub fn vote_storage_address(&self, vote_address: &StdAddr) -> Result<StdAddr, Error> {
        deploy::vote_storage_address(
            self.address(),
            vote_address,
            &self.data.vote_storage_code,
            &self.data.vote_status_code,
        )
    }

    fn ensure_admin(&self, sender: &StdAddr) -> ExecResult<()> {
        ensure(*sender == self.data.admin, NOT_ADMIN)
    }

    fn handle(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        self.account.credit(msg.value);

        let Some((query_id, payload)) = native::parse_body::<RegisterMsg>(msg)? else {
            return Ok(Vec::new());
        };

        match payload {
            RegisterMsg::CastVote { vote_address, vote } => {
                let is_voter = msg.src.workchain == self.address().workchain
                    && self.data.voters.contains_key(msg.src.address)?;
                ensure(is_voter, NOT_VOTER)?;
                ensure(msg.value >= MIN_CAST_VALUE, LOW_VALUE)?;
                ensure(vote.is_valid(), INVALID_VOTE)?;

                let storage = self.vote_storage_address(&vote_address)?;
                let body = codec::encode(
                    &VoteStorageMsg::CastVote {
                        voter: msg.src.clone(),
                        vote,
                    },
                    query_id,
                )?;
                Ok(vec![self.account.forward(storage, msg.value, body)])
            }
            RegisterMsg::AddVoter { voter } => {
                self.ensure_admin(&msg.src)?;
                self.data.voters.set(voter.address, VoterMark)?;
                Ok(vec![self.account.refund(msg.src.clone(), msg.value, query_id)?])
            }
            RegisterMsg::RemoveVoter { voter } => {
                self.ensure_admin(&msg.src)?;
                self.data.voters.remove(voter.address)?;
                Ok(vec![self.account.refund(msg.src.clone(), msg.value, query_id)?])
            }
            RegisterMsg::ChangeAdmin { new_admin } => {
                self.ensure_admin(&msg.src)?;
                self.data.pending_admin = Some(new_admin);
                Ok(vec![self.account.refund(msg.src.clone(), msg.value, query_id)?])
            }
            RegisterMsg::ClaimAdmin => {
                ensure(self.data.pending_admin.as_ref() == Some(&msg.src), NOT_PENDING_ADMIN)?;
                self.data.admin = msg.src.clone();
                self.data.pending_admin = None;
                Ok(vec![self.account.refund(msg.src.clone(), msg.value, query_id)?])
            }
            RegisterMsg::ResetGas => {
                self.ensure_admin(&msg.src)?;
                Ok(vec![self.account.withdraw(msg.src.clone(), query_id)?])
            }
            RegisterMsg::ResetGasStorage { vote_address } => {
                self.ensure_admin(&msg.src)?;

                let storage = self.vote_storage_address(&vote_address)?;
                let body = codec::encode(
                    &VoteStorageMsg::ResetGas {
                        admin: self.data.admin.clone(),
                    },
                    query_id,
                )?;
                Ok(vec![self.account.forward(storage, msg.value, body)])
            }
        }
    }
}

impl Executable for Register {
    fn receive(&mut self, msg: &InternalMessage) -> ExecResult<Vec<InternalMessage>> {
        native::transaction(self, |this| this.handle(msg))
    }

    fn run_getter(&self, method_id: u32, args: Vec<StackValue>) -> ExecResult<Vec<StackValue>> {
        const GETTERS: &[&str] = &[GET_REGISTER_DATA, GET_VOTE_STORAGE_ADDRESS];

        match native::resolve_getter(method_id, GETTERS) {
            Some(GET_REGISTER_DATA) => Ok(vec![
                native::address_value(&self.data.admin)?,
                StackValue::address_slice(self.data.pending_admin.as_ref())?,
                StackValue::cell_opt(self.data.voters.root().clone()),
                StackValue::Cell(self.data.vote_storage_code.clone()),
                StackValue::Cell(self.data.vote_status_code.clone()),
            ]),
            Some(GET_VOTE_STORAGE_ADDRESS) => {
                let vote_address = native::address_arg(args)?;
                let storage = self.vote_storage_address(&vote_address)?;
                Ok(vec![native::address_value(&storage)?])
            }
            _ => Err(native::unknown_method()),
        }
    }

    fn data(&self) -> ExecResult<Cell> {
        native::data_cell(&self.data)
    }
}
