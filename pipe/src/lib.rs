#[macro_use]
mod log;

pub use self::config::{DEFAULT_FORWARD_VALUE, DEFAULT_MAX_HOPS, ForwardValue, PipeConfig};
pub use self::contract::{
    ExecError, ExecResult, Executable, GetterMethodId, Rejecting, UNKNOWN_METHOD_EXIT_CODE,
};
pub use self::error::{PipeError, PipeResult};
pub use self::message::InternalMessage;
pub use self::pipe::{Delivery, Outcome, Pipe, RouteTrace};
pub use self::registry::{Entry, Registry};
pub use self::stack::{ResultStack, StackError, StackReader, StackValue};
pub use self::util::{load_opt_std_addr, store_opt_std_addr};

mod config;
mod contract;
mod error;
mod message;
mod pipe;
mod registry;
mod stack;
mod util;
