pub use self::codec::{Excesses, Payload, Vote, VoteDelta, VoterSet, new_query_id};
pub use self::deploy::{VotingCode, VotingLayout, address_from_seed, derive_address};
pub use self::native::{COMPUTE_FEE, INITIAL_BALANCE, STORAGE_RESERVE};
pub use self::register::{MIN_CAST_VALUE, Register, RegisterData, RegisterMsg};
pub use self::vote_status::{VoteStatus, VoteStatusData, VoteStatusMsg};
pub use self::vote_storage::{VoteStorage, VoteStorageData, VoteStorageMsg};

pub mod codec;
pub mod deploy;
/// Exit codes of rejected messages.
pub mod error;
pub mod register;
pub mod vote_status;
pub mod vote_storage;

mod native;
