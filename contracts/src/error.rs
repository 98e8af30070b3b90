use tycho_vote_pipe::{ExecError, ExecResult};

/// Cell underflow while parsing a message body.
pub const MALFORMED: i32 = 9;
pub const NOT_ADMIN: i32 = 101;
pub const NOT_PENDING_ADMIN: i32 = 102;
pub const NOT_VOTER: i32 = 103;
pub const INVALID_SENDER: i32 = 104;
pub const INVALID_VOTE: i32 = 105;
pub const LOW_VALUE: i32 = 106;
pub const UNKNOWN_OP: i32 = 0xffff;

/// Getter argument stack is too short.
pub const STACK_UNDERFLOW: i32 = 2;
/// Getter argument has an unexpected type.
pub const TYPE_CHECK: i32 = 7;

#[inline]
pub(crate) fn ensure(condition: bool, exit_code: i32) -> ExecResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ExecError::Rejected(exit_code))
    }
}
