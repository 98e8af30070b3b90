use tycho_types::error::Error;
use tycho_types::models::{CurrencyCollection, IntAddr, IntMsgInfo, MsgInfo, OwnedMessage, StdAddr};
use tycho_types::num::Tokens;
use tycho_types::prelude::*;

/// Internal message between two participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalMessage {
    pub src: StdAddr,
    pub dst: StdAddr,
    pub value: Tokens,
    /// Whether a failed delivery would be bounced back on a real network.
    pub bounce: bool,
    pub body: Cell,
}

impl InternalMessage {
    /// Creates a bounceable message.
    pub fn new(src: StdAddr, dst: StdAddr, value: Tokens, body: Cell) -> Self {
        Self {
            src,
            dst,
            value,
            bounce: true,
            body,
        }
    }

    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    pub fn with_value(mut self, value: Tokens) -> Self {
        self.value = value;
        self
    }

    /// Whether the message carries no payload (a plain transfer).
    pub fn has_empty_body(&self) -> bool {
        self.body.bit_len() == 0 && self.body.reference_count() == 0
    }

    /// Builds a full message cell with an `int_msg_info` header.
    pub fn build_cell(&self) -> Result<Cell, Error> {
        CellBuilder::build_from(OwnedMessage {
            info: MsgInfo::Int(IntMsgInfo {
                bounce: self.bounce,
                src: self.src.clone().into(),
                dst: self.dst.clone().into(),
                value: CurrencyCollection::from(self.value),
                ..Default::default()
            }),
            init: None,
            body: self.body.clone().into(),
            layout: None,
        })
    }

    /// Representation hash of the full message cell.
    pub fn hash(&self) -> Result<HashBytes, Error> {
        self.build_cell().map(|cell| *cell.repr_hash())
    }

    /// Extracts an internal message between two standard addresses.
    pub fn from_owned(msg: &OwnedMessage) -> Result<Self, Error> {
        let MsgInfo::Int(info) = &msg.info else {
            return Err(Error::InvalidTag);
        };
        let (IntAddr::Std(src), IntAddr::Std(dst)) = (&info.src, &info.dst) else {
            return Err(Error::InvalidData);
        };

        let (range, cell) = &msg.body;
        let body = if range.is_full(cell) {
            cell.clone()
        } else {
            CellBuilder::build_from(range.apply_allow_exotic(cell))?
        };

        Ok(Self {
            src: src.clone(),
            dst: dst.clone(),
            value: info.value.tokens,
            bounce: info.bounce,
            body,
        })
    }
}
