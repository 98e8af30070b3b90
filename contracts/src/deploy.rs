//! Deterministic addresses and initial states of the voting contracts.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tycho_types::boc::Boc;
use tycho_types::cell::HashBytes;
use tycho_types::error::Error;
use tycho_types::models::{StateInit, StdAddr};
use tycho_types::num::Tokens;
use tycho_types::prelude::*;
use tycho_vote_pipe::{Entry, Registry};

use crate::codec::voter_dict;
use crate::native::INITIAL_BALANCE;
use crate::register::{Register, RegisterData};
use crate::vote_status::{VoteStatus, VoteStatusData};
use crate::vote_storage::{VoteStorage, VoteStorageData};

/// Address of a contract deployed with the specified code and data.
pub fn derive_address(workchain: i8, code: &Cell, data: &Cell) -> Result<StdAddr, Error> {
    let state_init = StateInit {
        code: Some(code.clone()),
        data: Some(data.clone()),
        ..Default::default()
    };
    let cell = CellBuilder::build_from(&state_init)?;
    Ok(StdAddr::new(workchain, *cell.repr_hash()))
}

/// Deterministic account in the base workchain.
pub fn address_from_seed(seed: &str) -> StdAddr {
    let hash = Sha256::digest(seed.as_bytes());
    StdAddr::new(0, HashBytes(hash.into()))
}

/// Vote storage of `vote_address` deployed by `register`.
pub fn vote_storage_address(
    register: &StdAddr,
    vote_address: &StdAddr,
    vote_storage_code: &Cell,
    vote_status_code: &Cell,
) -> Result<StdAddr, Error> {
    let data = VoteStorageData::initial(
        register.clone(),
        vote_address.clone(),
        vote_status_code.clone(),
    );
    let data = CellBuilder::build_from(&data)?;
    derive_address(register.workchain, vote_storage_code, &data)
}

/// Vote status of `voter` deployed by `vote_storage`.
pub fn vote_status_address(
    vote_storage: &StdAddr,
    vote_address: &StdAddr,
    voter: &StdAddr,
    vote_status_code: &Cell,
) -> Result<StdAddr, Error> {
    let data = VoteStatusData::initial(vote_address.clone(), voter.clone(), vote_storage.clone());
    let data = CellBuilder::build_from(&data)?;
    derive_address(vote_storage.workchain, vote_status_code, &data)
}

/// Code of all three contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotingCode {
    pub register: Cell,
    pub vote_storage: Cell,
    pub vote_status: Cell,
}

impl VotingCode {
    /// Placeholder code of the native models.
    ///
    /// Only used to derive distinct addresses.
    pub fn native() -> Result<Self, Error> {
        fn make_code(name: &str) -> Result<Cell, Error> {
            let mut b = CellBuilder::new();
            b.store_raw(name.as_bytes(), name.len() as u16 * 8)?;
            b.build()
        }

        Ok(Self {
            register: make_code("native:register")?,
            vote_storage: make_code("native:vote_storage")?,
            vote_status: make_code("native:vote_status")?,
        })
    }

    /// Compiled code from serialized bags of cells.
    pub fn from_boc(register: &[u8], vote_storage: &[u8], vote_status: &[u8]) -> Result<Self> {
        Ok(Self {
            register: Boc::decode(register).context("invalid register code")?,
            vote_storage: Boc::decode(vote_storage).context("invalid vote storage code")?,
            vote_status: Boc::decode(vote_status).context("invalid vote status code")?,
        })
    }
}

/// Full description of one voting deployment.
#[derive(Debug, Clone)]
pub struct VotingLayout {
    pub workchain: i8,
    pub admin: StdAddr,
    pub voters: Vec<StdAddr>,
    pub code: VotingCode,
    pub initial_balance: Tokens,
}

impl VotingLayout {
    pub fn new(admin: StdAddr, voters: Vec<StdAddr>, code: VotingCode) -> Self {
        Self {
            workchain: 0,
            admin,
            voters,
            code,
            initial_balance: INITIAL_BALANCE,
        }
    }

    pub fn register_data(&self) -> Result<RegisterData, Error> {
        Ok(RegisterData {
            admin: self.admin.clone(),
            pending_admin: None,
            voters: voter_dict(&self.voters)?,
            vote_storage_code: self.code.vote_storage.clone(),
            vote_status_code: self.code.vote_status.clone(),
        })
    }

    pub fn register_address(&self) -> Result<StdAddr, Error> {
        let data = CellBuilder::build_from(self.register_data()?)?;
        derive_address(self.workchain, &self.code.register, &data)
    }

    pub fn vote_storage_address(&self, vote_address: &StdAddr) -> Result<StdAddr, Error> {
        vote_storage_address(
            &self.register_address()?,
            vote_address,
            &self.code.vote_storage,
            &self.code.vote_status,
        )
    }

    pub fn vote_status_address(
        &self,
        vote_address: &StdAddr,
        voter: &StdAddr,
    ) -> Result<StdAddr, Error> {
        vote_status_address(
            &self.vote_storage_address(vote_address)?,
            vote_address,
            voter,
            &self.code.vote_status,
        )
    }

    pub fn register(&self) -> Result<Register, Error> {
        Ok(Register::new(
            self.register_address()?,
            self.register_data()?,
            self.initial_balance,
        ))
    }

    pub fn vote_storage(&self, vote_address: &StdAddr) -> Result<VoteStorage, Error> {
        let register = self.register_address()?;
        let address = self.vote_storage_address(vote_address)?;
        let data = VoteStorageData::initial(
            register,
            vote_address.clone(),
            self.code.vote_status.clone(),
        );
        Ok(VoteStorage::new(address, data, self.initial_balance))
    }

    pub fn vote_status(
        &self,
        vote_address: &StdAddr,
        voter: &StdAddr,
    ) -> Result<VoteStatus, Error> {
        let storage = self.vote_storage_address(vote_address)?;
        let address = vote_status_address(&storage, vote_address, voter, &self.code.vote_status)?;
        let data = VoteStatusData::initial(vote_address.clone(), voter.clone(), storage);
        Ok(VoteStatus::new(address, data, self.initial_balance))
    }

    /// Registry with every participant needed to vote for `vote_addresses`.
    ///
    /// The admin and the voters are inert accounts.
    pub fn build_registry(&self, vote_addresses: &[StdAddr]) -> Result<Registry, Error> {
        let mut registry = Registry::new();
        registry.register(self.admin.clone(), Entry::Inert);
        for voter in &self.voters {
            registry.register(voter.clone(), Entry::Inert);
        }

        let register = self.register()?;
        registry.register(register.address().clone(), Entry::contract(register));

        for vote_address in vote_addresses {
            let storage = self.vote_storage(vote_address)?;
            registry.register(storage.address().clone(), Entry::contract(storage));

            for voter in &self.voters {
                let status = self.vote_status(vote_address, voter)?;
                registry.register(status.address().clone(), Entry::contract(status));
            }
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_addresses_are_stable() {
        for (seed, expected) in [
            ("alice", "2bd806c97f0e00af1a1fc3328fa763a9269723c8db8fac4f93af71db186d6e90"),
            ("admin", "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"),
        ] {
            let addr = address_from_seed(seed);
            assert_eq!(addr.workchain, 0);
            assert_eq!(hex::encode(addr.address.0), expected);
        }
    }

    #[test]
    fn derived_address_depends_on_state() -> anyhow::Result<()> {
        let code = VotingCode::native()?;
        let data = Cell::empty_cell();

        let base = derive_address(0, &code.register, &data)?;
        assert_eq!(base, derive_address(0, &code.register, &data)?);
        assert_ne!(base, derive_address(0, &code.vote_storage, &data)?);

        let other_wc = derive_address(-1, &code.register, &data)?;
        assert_eq!(other_wc.workchain, -1);
        assert_eq!(other_wc.address, base.address);
        Ok(())
    }

    #[test]
    fn layout_matches_contract_getters() -> anyhow::Result<()> {
        let voters = ["alice", "bob"].map(address_from_seed).to_vec();
        let admin = address_from_seed("admin");
        let layout = VotingLayout::new(admin, voters.clone(), VotingCode::native()?);
        let jetton = address_from_seed("jetton");

        let register = layout.register()?;
        assert_eq!(register.address(), &layout.register_address()?);
        assert_eq!(
            register.vote_storage_address(&jetton)?,
            layout.vote_storage_address(&jetton)?
        );

        let storage = layout.vote_storage(&jetton)?;
        for voter in &voters {
            assert_eq!(
                storage.vote_status_address(voter)?,
                layout.vote_status_address(&jetton, voter)?
            );
        }

        let registry = layout.build_registry(&[jetton])?;
        // admin, two voters, register, storage and two statuses.
        assert_eq!(registry.len(), 7);
        Ok(())
    }

    #[test]
    fn code_from_boc() -> anyhow::Result<()> {
        let native = VotingCode::native()?;
        let code = VotingCode::from_boc(
            &Boc::encode(&native.register),
            &Boc::encode(&native.vote_storage),
            &Boc::encode(&native.vote_status),
        )?;
        assert_eq!(code, native);

        assert!(VotingCode::from_boc(b"garbage", &[], &[]).is_err());
        Ok(())
    }
}
