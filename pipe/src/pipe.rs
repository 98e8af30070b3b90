use tycho_types::models::StdAddr;
use tycho_types::num::Tokens;
use tycho_types::prelude::*;

use crate::config::PipeConfig;
use crate::contract::{ExecError, GetterMethodId};
use crate::error::{PipeError, PipeResult};
use crate::message::InternalMessage;
use crate::registry::{Entry, Registry};
use crate::stack::{ResultStack, StackValue};

/// Delivers messages between registered participants.
///
/// Every message emitted by a contract is delivered before the next
/// sibling message, so one [`route`] call is a depth-first walk
/// over the whole message tree caused by the root message.
///
/// [`route`]: Self::route
pub struct Pipe {
    registry: Registry,
    config: PipeConfig,
}

impl Pipe {
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, PipeConfig::default())
    }

    pub fn with_config(registry: Registry, config: PipeConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn add_contract(&mut self, address: StdAddr, entry: Entry) -> Option<Entry> {
        self.registry.register(address, entry)
    }

    /// Delivers `msg` and everything it causes.
    ///
    /// Fails on the first unknown destination, rejected message or
    /// exceeded hop limit. Deliveries that already happened are not
    /// rolled back, and pending siblings are dropped.
    pub fn route(&mut self, msg: InternalMessage) -> PipeResult<RouteTrace> {
        let mut trace = RouteTrace::default();

        // Children are pushed in reverse order so that they pop in emission order.
        let mut pending = vec![(0usize, msg)];
        while let Some((depth, msg)) = pending.pop() {
            if let Some(limit) = self.config.max_hops {
                if trace.len() >= limit {
                    pipe_log_trace!(limit, dst = %msg.dst, "hop limit exceeded");
                    return Err(PipeError::HopLimitExceeded { limit });
                }
            }

            let hash = msg.hash()?;
            let contract = match self.registry.lookup_mut(&msg.dst)? {
                Entry::Contract(contract) => contract,
                Entry::Inert => {
                    pipe_log_delivery!(depth, msg, hash, Outcome::Absorbed);
                    trace.push(depth, &msg, hash, Outcome::Absorbed);
                    continue;
                }
            };

            let emitted = match contract.receive(&msg) {
                Ok(emitted) => emitted,
                Err(e) => {
                    if let ExecError::Rejected(_exit_code) = &e {
                        pipe_log_rejected!(depth, msg, hash, *_exit_code);
                    }
                    return Err(exec_error(&msg.dst, e));
                }
            };

            let outcome = Outcome::Executed {
                emitted: emitted.len(),
            };
            pipe_log_delivery!(depth, msg, hash, outcome);
            trace.push(depth, &msg, hash, outcome);

            let forward_value = self.config.forward_value;
            pending.extend(
                emitted
                    .into_iter()
                    .rev()
                    .map(|out| (depth + 1, forward_value.apply(out))),
            );
        }

        Ok(trace)
    }

    /// Runs a get method without arguments.
    pub fn query<M: GetterMethodId>(
        &self,
        address: &StdAddr,
        method: M,
    ) -> PipeResult<ResultStack> {
        self.query_with_args(address, method, Vec::new())
    }

    /// Runs a get method. Never changes any participant.
    pub fn query_with_args<M: GetterMethodId>(
        &self,
        address: &StdAddr,
        method: M,
        args: Vec<StackValue>,
    ) -> PipeResult<ResultStack> {
        let Entry::Contract(contract) = self.registry.lookup(address)? else {
            return Err(PipeError::NotAContract(address.clone()));
        };

        let method_id = method.as_getter_method_id();
        pipe_log_trace!(%address, method_id, "query");

        match contract.run_getter(method_id, args) {
            Ok(items) => Ok(ResultStack::from(items)),
            Err(e) => Err(exec_error(address, e)),
        }
    }

    /// Persisted data of a registered contract.
    pub fn contract_data(&self, address: &StdAddr) -> PipeResult<Cell> {
        let Entry::Contract(contract) = self.registry.lookup(address)? else {
            return Err(PipeError::NotAContract(address.clone()));
        };
        contract.data().map_err(|e| exec_error(address, e))
    }
}

fn exec_error(address: &StdAddr, error: ExecError) -> PipeError {
    match error {
        ExecError::Rejected(exit_code) => PipeError::Rejected {
            address: address.clone(),
            exit_code,
        },
        ExecError::Fatal(e) => PipeError::Fatal(e.context(format!("contract {address} failed"))),
    }
}

/// Ordered list of deliveries made by one [`Pipe::route`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteTrace {
    deliveries: Vec<Delivery>,
}

impl RouteTrace {
    #[inline]
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Delivery> {
        self.deliveries.iter()
    }

    pub fn last(&self) -> Option<&Delivery> {
        self.deliveries.last()
    }

    pub fn executed_count(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|item| matches!(item.outcome, Outcome::Executed { .. }))
            .count()
    }

    pub fn max_depth(&self) -> usize {
        self.deliveries
            .iter()
            .map(|item| item.depth)
            .max()
            .unwrap_or_default()
    }

    /// Destinations in delivery order.
    pub fn destinations(&self) -> Vec<StdAddr> {
        self.deliveries.iter().map(|item| item.dst.clone()).collect()
    }

    fn push(&mut self, depth: usize, msg: &InternalMessage, hash: HashBytes, outcome: Outcome) {
        self.deliveries.push(Delivery {
            depth,
            hash,
            src: msg.src.clone(),
            dst: msg.dst.clone(),
            value: msg.value,
            outcome,
        });
    }
}

impl<'a> IntoIterator for &'a RouteTrace {
    type Item = &'a Delivery;
    type IntoIter = std::slice::Iter<'a, Delivery>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.deliveries.iter()
    }
}

/// A single delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Zero for the routed message itself.
    pub depth: usize,
    /// Representation hash of the delivered message cell.
    pub hash: HashBytes,
    pub src: StdAddr,
    pub dst: StdAddr,
    /// Value after the forwarding policy was applied.
    pub value: Tokens,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handled by a contract which emitted `emitted` messages.
    Executed { emitted: usize },
    /// Absorbed by an inert account.
    Absorbed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Executed { emitted } => write!(f, "executed (emitted {emitted})"),
            Self::Absorbed => f.write_str("absorbed"),
        }
    }
}
