use rand::Rng;
use tycho_types::error::Error;
use tycho_types::models::StdAddr;
use tycho_types::prelude::*;

pub use tycho_vote_pipe::{load_opt_std_addr, store_opt_std_addr};

/// Operation codes.
pub mod op {
    pub const CAST_VOTE: u32 = 0x13828ee9;
    pub const ADD_VOTER: u32 = 0x9b3f4098;
    pub const REMOVE_VOTER: u32 = 0x9b23def8;
    pub const CHANGE_ADMIN: u32 = 0xd4deb03b;
    pub const CLAIM_ADMIN: u32 = 0xb443e630;
    pub const RESET_GAS: u32 = 0x42a0fb43;
    pub const RESET_GAS_STORAGE: u32 = 0xda764ba3;
    pub const ADD_VOTE: u32 = 0x54e85894;
    pub const VERIFY_VOTE: u32 = 0x5e73911f;
    pub const EXCESSES: u32 = 0xd53276db;
}

/// Common message body prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub op: u32,
    pub query_id: u64,
}

impl Store for Header {
    fn store_into(&self, builder: &mut CellBuilder, _: &dyn CellContext) -> Result<(), Error> {
        builder.store_u32(self.op)?;
        builder.store_u64(self.query_id)
    }
}

impl Load<'_> for Header {
    fn load_from(slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self {
            op: slice.load_u32()?,
            query_id: slice.load_u64()?,
        })
    }
}

/// Random query id in `[0, 2^31)`.
pub fn new_query_id() -> u64 {
    rand::thread_rng().gen_range(0..1 << 31)
}

/// Typed body of messages accepted by one contract.
pub trait Payload: Sized {
    fn op(&self) -> u32;

    fn is_known_op(op: u32) -> bool;

    /// Stores everything after the header.
    fn store_fields(&self, builder: &mut CellBuilder) -> Result<(), Error>;

    /// Loads everything after the header. `op` is always known.
    fn load_fields(op: u32, slice: &mut CellSlice<'_>) -> Result<Self, Error>;
}

pub fn encode<T: Payload>(payload: &T, query_id: u64) -> Result<Cell, Error> {
    let mut b = CellBuilder::new();
    let header = Header {
        op: payload.op(),
        query_id,
    };
    header.store_into(&mut b, Cell::empty_context())?;
    payload.store_fields(&mut b)?;
    b.build()
}

/// Decodes a message body. Returns `None` for an empty body.
pub fn decode<T: Payload>(body: &Cell) -> Result<Option<(u64, T)>, Error> {
    let mut cs = body.as_slice()?;
    if is_empty_slice(&cs) {
        return Ok(None);
    }

    let header = Header::load_from(&mut cs)?;
    if !T::is_known_op(header.op) {
        return Err(Error::InvalidTag);
    }
    let payload = T::load_fields(header.op, &mut cs)?;
    Ok(Some((header.query_id, payload)))
}

pub(crate) fn is_empty_slice(cs: &CellSlice<'_>) -> bool {
    cs.is_data_empty() && cs.is_refs_empty()
}

/// A pair of vote flags.
///
/// Both flags clear means "no vote", both set is invalid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub positive: bool,
    pub negative: bool,
}

impl Vote {
    pub const POSITIVE: Self = Self {
        positive: true,
        negative: false,
    };
    pub const NEGATIVE: Self = Self {
        positive: false,
        negative: true,
    };
    pub const RESET: Self = Self {
        positive: false,
        negative: false,
    };

    pub const fn new(positive: bool, negative: bool) -> Self {
        Self { positive, negative }
    }

    pub const fn is_valid(&self) -> bool {
        !(self.positive && self.negative)
    }

    pub const fn is_reset(&self) -> bool {
        !self.positive && !self.negative
    }
}

impl Store for Vote {
    fn store_into(&self, builder: &mut CellBuilder, _: &dyn CellContext) -> Result<(), Error> {
        builder.store_bit(self.positive)?;
        builder.store_bit(self.negative)
    }
}

impl Load<'_> for Vote {
    fn load_from(slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self {
            positive: slice.load_bit()?,
            negative: slice.load_bit()?,
        })
    }
}

/// Change of vote counters, each stored as `int2`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VoteDelta {
    pub positive: i8,
    pub negative: i8,
}

impl VoteDelta {
    pub const fn new(positive: i8, negative: i8) -> Self {
        Self { positive, negative }
    }

    pub const fn between(old: Vote, new: Vote) -> Self {
        Self {
            positive: new.positive as i8 - old.positive as i8,
            negative: new.negative as i8 - old.negative as i8,
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.positive == 0 && self.negative == 0
    }

    /// Applies the delta to the counters. Returns `None` on under- or overflow.
    pub fn apply(&self, positive: u64, negative: u64) -> Option<(u64, u64)> {
        Some((
            positive.checked_add_signed(self.positive as i64)?,
            negative.checked_add_signed(self.negative as i64)?,
        ))
    }
}

impl Store for VoteDelta {
    fn store_into(&self, builder: &mut CellBuilder, _: &dyn CellContext) -> Result<(), Error> {
        store_int2(builder, self.positive)?;
        store_int2(builder, self.negative)
    }
}

impl Load<'_> for VoteDelta {
    fn load_from(slice: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self {
            positive: load_int2(slice)?,
            negative: load_int2(slice)?,
        })
    }
}

fn store_int2(builder: &mut CellBuilder, value: i8) -> Result<(), Error> {
    if !(-2..=1).contains(&value) {
        return Err(Error::IntOverflow);
    }
    builder.store_small_uint(value as u8 & 0b11, 2)
}

fn load_int2(slice: &mut CellSlice<'_>) -> Result<i8, Error> {
    let raw = slice.load_small_uint(2)?;
    // Sign extension.
    Ok(((raw << 6) as i8) >> 6)
}

/// Empty value of a voter set entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VoterMark;

impl Store for VoterMark {
    #[inline]
    fn store_into(&self, _: &mut CellBuilder, _: &dyn CellContext) -> Result<(), Error> {
        Ok(())
    }
}

impl Load<'_> for VoterMark {
    #[inline]
    fn load_from(_: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self)
    }
}

/// Set of voters keyed by account id.
pub type VoterSet = Dict<HashBytes, VoterMark>;

pub fn voter_dict(voters: &[StdAddr]) -> Result<VoterSet, Error> {
    let mut dict = VoterSet::new();
    for voter in voters {
        dict.set(voter.address, VoterMark)?;
    }
    Ok(dict)
}

/// Account ids of all voters in the set.
pub fn voter_ids(voters: &VoterSet) -> Result<Vec<HashBytes>, Error> {
    voters.keys().collect()
}

/// Returns the unused value back to a user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Excesses;

impl Payload for Excesses {
    fn op(&self) -> u32 {
        op::EXCESSES
    }

    fn is_known_op(op: u32) -> bool {
        op == op::EXCESSES
    }

    fn store_fields(&self, _: &mut CellBuilder) -> Result<(), Error> {
        Ok(())
    }

    fn load_fields(_: u32, _: &mut CellSlice<'_>) -> Result<Self, Error> {
        Ok(Self)
    }
}
