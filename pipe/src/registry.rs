use ahash::HashMap;
use tycho_types::models::StdAddr;

use crate::contract::Executable;
use crate::error::{PipeError, PipeResult};

/// What happens when a message arrives at an address.
pub enum Entry {
    /// Executes the message and may emit new ones.
    Contract(Box<dyn Executable>),
    /// Absorbs the message without any effect.
    Inert,
}

impl Entry {
    pub fn contract<T: Executable + 'static>(contract: T) -> Self {
        Self::Contract(Box::new(contract))
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contract(_) => f.write_str("Contract(..)"),
            Self::Inert => f.write_str("Inert"),
        }
    }
}

/// Scenario-scoped directory of participants.
#[derive(Default, Debug)]
pub struct Registry {
    entries: HashMap<StdAddr, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites an entry, returning the previous one.
    pub fn register(&mut self, address: StdAddr, entry: Entry) -> Option<Entry> {
        self.entries.insert(address, entry)
    }

    pub fn lookup(&self, address: &StdAddr) -> PipeResult<&Entry> {
        self.entries
            .get(address)
            .ok_or_else(|| PipeError::NotFound(address.clone()))
    }

    pub fn lookup_mut(&mut self, address: &StdAddr) -> PipeResult<&mut Entry> {
        self.entries
            .get_mut(address)
            .ok_or_else(|| PipeError::NotFound(address.clone()))
    }

    pub fn contains(&self, address: &StdAddr) -> bool {
        self.entries.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered addresses in no particular order.
    pub fn addresses(&self) -> impl Iterator<Item = &StdAddr> {
        self.entries.keys()
    }
}

impl FromIterator<(StdAddr, Entry)> for Registry {
    fn from_iter<I: IntoIterator<Item = (StdAddr, Entry)>>(iter: I) -> Self {
        let mut registry = Self::default();
        registry.extend(iter);
        registry
    }
}

impl Extend<(StdAddr, Entry)> for Registry {
    fn extend<I: IntoIterator<Item = (StdAddr, Entry)>>(&mut self, iter: I) {
        for (address, entry) in iter {
            self.register(address, entry);
        }
    }
}
