use tycho_types::error::Error;
use tycho_types::models::StdAddr;
use tycho_types::prelude::*;

/// Stores either `addr_std` or `addr_none$00`.
pub fn store_opt_std_addr(builder: &mut CellBuilder, addr: Option<&StdAddr>) -> Result<(), Error> {
    match addr {
        Some(addr) => addr.store_into(builder, Cell::empty_context()),
        None => builder.store_zeros(2),
    }
}

/// Loads either `addr_std` or `addr_none$00`.
pub fn load_opt_std_addr(slice: &mut CellSlice<'_>) -> Result<Option<StdAddr>, Error> {
    let mut prefix = *slice;
    if prefix.load_small_uint(2)? == 0 {
        *slice = prefix;
        return Ok(None);
    }
    StdAddr::load_from(slice).map(Some)
}
