use serde::Deserialize;
use tycho_types::num::Tokens;

use crate::message::InternalMessage;

/// Value attached to every re-forwarded message by default (1 TON).
pub const DEFAULT_FORWARD_VALUE: Tokens = Tokens::new(1_000_000_000);

/// Default limit of deliveries caused by one routed message.
pub const DEFAULT_MAX_HOPS: usize = 1024;

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// What value re-forwarded messages carry.
    ///
    /// Default: [`ForwardValue::Fixed`] with [`DEFAULT_FORWARD_VALUE`].
    pub forward_value: ForwardValue,
    /// Maximum number of deliveries in one [`route`] call.
    /// `None` disables the guard.
    ///
    /// Default: [`DEFAULT_MAX_HOPS`].
    ///
    /// [`route`]: crate::Pipe::route
    pub max_hops: Option<usize>,
}

impl PipeConfig {
    pub fn with_forward_value(mut self, forward_value: ForwardValue) -> Self {
        self.forward_value = forward_value;
        self
    }

    pub fn with_max_hops(mut self, max_hops: Option<usize>) -> Self {
        self.max_hops = max_hops;
        self
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            forward_value: ForwardValue::default(),
            max_hops: Some(DEFAULT_MAX_HOPS),
        }
    }
}

/// Value policy for messages emitted by contracts.
///
/// The router does not keep a value ledger across hops, so the amount
/// declared by a contract is only meaningful with [`ForwardValue::Declared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "ForwardValueRepr")]
pub enum ForwardValue {
    /// Replace the declared value with a fixed amount.
    Fixed(Tokens),
    /// Keep the value declared by the emitting contract.
    Declared,
}

impl ForwardValue {
    pub fn apply(&self, mut msg: InternalMessage) -> InternalMessage {
        if let Self::Fixed(value) = self {
            msg.value = *value;
        }
        msg
    }
}

impl Default for ForwardValue {
    #[inline]
    fn default() -> Self {
        Self::Fixed(DEFAULT_FORWARD_VALUE)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum ForwardValueRepr {
    Declared,
    Fixed(u64),
}

impl From<ForwardValueRepr> for ForwardValue {
    fn from(value: ForwardValueRepr) -> Self {
        match value {
            ForwardValueRepr::Declared => Self::Declared,
            ForwardValueRepr::Fixed(nanotons) => Self::Fixed(Tokens::new(nanotons as u128)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tycho_types::models::StdAddr;
    use tycho_types::prelude::*;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() -> anyhow::Result<()> {
        let config = serde_json::from_str::<PipeConfig>("{}")?;
        assert_eq!(config, PipeConfig::default());
        assert_eq!(config.forward_value, ForwardValue::Fixed(DEFAULT_FORWARD_VALUE));
        assert_eq!(config.max_hops, Some(DEFAULT_MAX_HOPS));
        Ok(())
    }

    #[test]
    fn config_parses_both_policies() -> anyhow::Result<()> {
        let config = serde_json::from_str::<PipeConfig>(
            r#"{ "forward_value": "declared", "max_hops": null }"#,
        )?;
        assert_eq!(config.forward_value, ForwardValue::Declared);
        assert_eq!(config.max_hops, None);

        let config = serde_json::from_str::<PipeConfig>(
            r#"{ "forward_value": { "fixed": 50000000 }, "max_hops": 16 }"#,
        )?;
        assert_eq!(config.forward_value, ForwardValue::Fixed(Tokens::new(50_000_000)));
        assert_eq!(config.max_hops, Some(16));
        Ok(())
    }

    #[test]
    fn fixed_policy_overrides_declared_value() {
        let msg = InternalMessage::new(
            StdAddr::new(0, HashBytes([1; 32])),
            StdAddr::new(0, HashBytes([2; 32])),
            Tokens::new(123),
            Cell::empty_cell(),
        );

        let fixed = ForwardValue::Fixed(Tokens::new(777)).apply(msg.clone());
        assert_eq!(fixed.value, Tokens::new(777));
        assert_eq!(fixed.body, msg.body);
        assert_eq!(fixed.dst, msg.dst);

        let declared = ForwardValue::Declared.apply(msg.clone());
        assert_eq!(declared, msg);
    }
}
