use serde::{Deserialize, Serialize};

use crate::{Epoch, Lovelace, RawCoin};

/// The largest amount a transaction can carry on the wire
pub const MAX_COIN: Lovelace = RawCoin::MAX as Lovelace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u64,
    pub minor: u64,
}

/// The protocol parameters that govern deposits, fees and pool policy
///
/// Field names follow the JSON layout clients expect from a
/// `query protocol-parameters` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtocolParams {
    pub decentralization: f64,
    pub max_block_body_size: u64,
    pub max_block_header_size: u64,
    pub max_tx_size: u64,
    pub min_pool_cost: Lovelace,
    #[serde(rename = "minUTxOValue")]
    pub min_utxo_value: Lovelace,
    pub monetary_expansion: f64,
    pub pool_pledge_influence: f64,
    pub pool_retire_max_epoch: Epoch,
    pub protocol_version: ProtocolVersion,
    pub stake_address_deposit: Lovelace,
    pub stake_pool_deposit: Lovelace,
    pub stake_pool_target_num: u64,
    pub treasury_cut: f64,
    pub tx_fee_fixed: Lovelace,
    pub tx_fee_per_byte: Lovelace,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            decentralization: 0.0,
            max_block_body_size: 65_536,
            max_block_header_size: 1_100,
            max_tx_size: 16_384,
            min_pool_cost: 0,
            min_utxo_value: 1_000_000,
            monetary_expansion: 0.003,
            pool_pledge_influence: 0.3,
            pool_retire_max_epoch: 18,
            protocol_version: ProtocolVersion { major: 6, minor: 0 },
            stake_address_deposit: 400_000,
            stake_pool_deposit: 500_000_000,
            stake_pool_target_num: 500,
            treasury_cut: 0.2,
            tx_fee_fixed: 155_381,
            tx_fee_per_byte: 44,
        }
    }
}

impl ProtocolParams {
    /// Returns a copy with every field set in `update` overridden
    pub fn apply_update(&self, update: &ProtocolParamUpdate) -> Self {
        let mut next = self.clone();

        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(value) = update.$field {
                    next.$field = value;
                })*
            };
        }

        merge!(
            decentralization,
            max_block_body_size,
            max_block_header_size,
            max_tx_size,
            min_pool_cost,
            min_utxo_value,
            monetary_expansion,
            pool_pledge_influence,
            pool_retire_max_epoch,
            protocol_version,
            stake_address_deposit,
            stake_pool_deposit,
            stake_pool_target_num,
            treasury_cut,
            tx_fee_fixed,
            tx_fee_per_byte
        );

        next
    }
}

/// A partial set of protocol parameters proposed for the next epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParamUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decentralization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_block_body_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_block_header_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tx_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pool_cost: Option<Lovelace>,
    #[serde(
        default,
        rename = "minUTxOValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_utxo_value: Option<Lovelace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetary_expansion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_pledge_influence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_retire_max_epoch: Option<Epoch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<ProtocolVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_address_deposit: Option<Lovelace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_pool_deposit: Option<Lovelace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_pool_target_num: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasury_cut: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_fee_fixed: Option<Lovelace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_fee_per_byte: Option<Lovelace>,
}

impl ProtocolParamUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The first coin-valued field set above [`MAX_COIN`], if any
    ///
    /// Deposits and fees beyond that bound could never be paid and would
    /// overflow the deposit and fee pots once accumulated.
    pub fn oversized_amount(&self) -> Option<(&'static str, Lovelace)> {
        [
            ("minPoolCost", self.min_pool_cost),
            ("minUTxOValue", self.min_utxo_value),
            ("stakeAddressDeposit", self.stake_address_deposit),
            ("stakePoolDeposit", self.stake_pool_deposit),
            ("txFeeFixed", self.tx_fee_fixed),
            ("txFeePerByte", self.tx_fee_per_byte),
        ]
        .into_iter()
        .find_map(|(name, value)| value.filter(|x| *x > MAX_COIN).map(|x| (name, x)))
    }

    /// Folds a later proposal on top of this one, later values win
    pub fn merge(&mut self, later: &ProtocolParamUpdate) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if later.$field.is_some() {
                    self.$field = later.$field;
                })*
            };
        }

        merge!(
            decentralization,
            max_block_body_size,
            max_block_header_size,
            max_tx_size,
            min_pool_cost,
            min_utxo_value,
            monetary_expansion,
            pool_pledge_influence,
            pool_retire_max_epoch,
            protocol_version,
            stake_address_deposit,
            stake_pool_deposit,
            stake_pool_target_num,
            treasury_cut,
            tx_fee_fixed,
            tx_fee_per_byte
        );
    }
}
