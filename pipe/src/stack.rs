use num_bigint::{BigInt, Sign};
use tycho_types::error::Error;
use tycho_types::models::StdAddr;
use tycho_types::prelude::*;

use crate::util::{load_opt_std_addr, store_opt_std_addr};

/// Typed value returned by (or passed into) a get method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackValue {
    Null,
    Int(BigInt),
    Cell(Cell),
    /// Slice over the whole cell.
    Slice(Cell),
    Tuple(Vec<StackValue>),
}

impl StackValue {
    pub fn int<T: Into<BigInt>>(value: T) -> Self {
        Self::Int(value.into())
    }

    pub fn bool(value: bool) -> Self {
        // TVM booleans are `-1` and `0`.
        Self::Int(BigInt::from(-(value as i32)))
    }

    /// A slice with an `addr_std` (or `addr_none` for `None`).
    pub fn address_slice(addr: Option<&StdAddr>) -> Result<Self, Error> {
        let mut b = CellBuilder::new();
        store_opt_std_addr(&mut b, addr)?;
        b.build().map(Self::Slice)
    }

    /// A cell or `null` for an absent one.
    pub fn cell_opt(cell: Option<Cell>) -> Self {
        match cell {
            Some(cell) => Self::Cell(cell),
            None => Self::Null,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "int",
            Self::Cell(_) => "cell",
            Self::Slice(_) => "slice",
            Self::Tuple(_) => "tuple",
        }
    }
}

/// Raw get method output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResultStack {
    pub items: Vec<StackValue>,
}

impl ResultStack {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&StackValue> {
        self.items.get(index)
    }

    /// Reads items from the first returned value to the last.
    pub fn reader(&self) -> StackReader<'_> {
        StackReader {
            items: self.items.iter(),
        }
    }
}

impl From<Vec<StackValue>> for ResultStack {
    #[inline]
    fn from(items: Vec<StackValue>) -> Self {
        Self { items }
    }
}

/// Sequential typed access to a [`ResultStack`].
pub struct StackReader<'a> {
    items: std::slice::Iter<'a, StackValue>,
}

impl<'a> StackReader<'a> {
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    pub fn read(&mut self) -> Result<&'a StackValue, StackError> {
        self.items.next().ok_or(StackError::Underflow)
    }

    pub fn read_int(&mut self) -> Result<BigInt, StackError> {
        match self.read()? {
            StackValue::Int(value) => Ok(value.clone()),
            other => Err(StackError::mismatch("int", other)),
        }
    }

    pub fn read_u64(&mut self) -> Result<u64, StackError> {
        let value = self.read_int()?;
        u64::try_from(&value).map_err(|_| StackError::IntOverflow)
    }

    /// Any non-zero integer is `true`.
    pub fn read_bool(&mut self) -> Result<bool, StackError> {
        let value = self.read_int()?;
        Ok(value.sign() != Sign::NoSign)
    }

    pub fn read_cell(&mut self) -> Result<Cell, StackError> {
        match self.read()? {
            StackValue::Cell(cell) => Ok(cell.clone()),
            other => Err(StackError::mismatch("cell", other)),
        }
    }

    pub fn read_cell_opt(&mut self) -> Result<Option<Cell>, StackError> {
        match self.read()? {
            StackValue::Null => Ok(None),
            StackValue::Cell(cell) => Ok(Some(cell.clone())),
            other => Err(StackError::mismatch("cell or null", other)),
        }
    }

    pub fn read_slice(&mut self) -> Result<Cell, StackError> {
        match self.read()? {
            StackValue::Slice(cell) => Ok(cell.clone()),
            other => Err(StackError::mismatch("slice", other)),
        }
    }

    pub fn read_address(&mut self) -> Result<StdAddr, StackError> {
        self.read_address_opt()?.ok_or(StackError::NoneAddress)
    }

    pub fn read_address_opt(&mut self) -> Result<Option<StdAddr>, StackError> {
        let cell = self.read_slice()?;
        let mut cs = cell.as_slice()?;
        Ok(load_opt_std_addr(&mut cs)?)
    }
}

/// Result stack access error.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("stack underflow")]
    Underflow,
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("integer does not fit into the requested type")]
    IntOverflow,
    #[error("expected a standard address, found `addr_none`")]
    NoneAddress,
    #[error("invalid slice")]
    Cell(#[from] Error),
}

impl StackError {
    fn mismatch(expected: &'static str, found: &StackValue) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }
}
