use stakeledger_core::{
    Address, CredentialId, Lovelace, PoolId, PoolMetadata, PoolRegistrationCert, Relay,
    UnitInterval,
};

mod harness;

pub use harness::*;

/// Well-known participants used across tests
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestAddress {
    Alice,
    Bob,
    Carol,
    Dave,
    Eve,
    Custom(String),
}

impl TestAddress {
    pub fn everyone() -> Vec<Self> {
        vec![
            TestAddress::Alice,
            TestAddress::Bob,
            TestAddress::Carol,
            TestAddress::Dave,
            TestAddress::Eve,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            TestAddress::Alice => "addr_test1alice",
            TestAddress::Bob => "addr_test1bob",
            TestAddress::Carol => "addr_test1carol",
            TestAddress::Dave => "addr_test1dave",
            TestAddress::Eve => "addr_test1eve",
            TestAddress::Custom(addr) => addr,
        }
    }

    pub fn address(&self) -> Address {
        self.as_str().parse().unwrap()
    }

    /// The stake verification key this participant controls
    pub fn stake_vkey(&self) -> Vec<u8> {
        format!("{}-stake.vkey", self.as_str()).into_bytes()
    }

    pub fn credential(&self) -> CredentialId {
        CredentialId::from_stake_key(&self.stake_vkey())
    }
}

impl From<&str> for TestAddress {
    fn from(value: &str) -> Self {
        TestAddress::Custom(value.to_owned())
    }
}

impl From<String> for TestAddress {
    fn from(value: String) -> Self {
        TestAddress::Custom(value)
    }
}

impl From<&TestAddress> for TestAddress {
    fn from(value: &TestAddress) -> Self {
        value.clone()
    }
}

/// A fresh cold verification key, so every call yields a new pool id
pub fn random_cold_key() -> Vec<u8> {
    rand::random::<[u8; 32]>().to_vec()
}

/// Builds pool registration certificates with sensible defaults
#[derive(Clone, Debug)]
pub struct PoolBuilder {
    cert: PoolRegistrationCert,
}

impl PoolBuilder {
    /// A pool owned by `owner`, with its reward account set to the same credential
    pub fn new(owner: impl Into<TestAddress>) -> Self {
        let owner = owner.into().credential();

        Self {
            cert: PoolRegistrationCert {
                cold_vkey: random_cold_key(),
                vrf_keyhash: rand::random(),
                pledge: 1_000_000,
                cost: 340_000_000,
                margin: UnitInterval::new(1, 100),
                reward_account: owner,
                owners: vec![owner],
                relays: vec![Relay::SingleHostName {
                    dns: "relay.example.com".into(),
                    port: Some(3001),
                }],
                metadata: None,
            },
        }
    }

    pub fn cold_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.cert.cold_vkey = key.into();
        self
    }

    pub fn cost(mut self, cost: i64) -> Self {
        self.cert.cost = cost;
        self
    }

    pub fn pledge(mut self, pledge: i64) -> Self {
        self.cert.pledge = pledge;
        self
    }

    pub fn margin(mut self, numerator: u64, denominator: u64) -> Self {
        self.cert.margin = UnitInterval::new(numerator, denominator);
        self
    }

    pub fn owner(mut self, owner: impl Into<TestAddress>) -> Self {
        self.cert.owners.push(owner.into().credential());
        self
    }

    pub fn metadata(mut self, url: &str) -> Self {
        self.cert.metadata = Some(PoolMetadata {
            url: url.to_owned(),
            hash: rand::random(),
        });
        self
    }

    pub fn pool_id(&self) -> PoolId {
        self.cert.pool_id()
    }

    pub fn build(self) -> PoolRegistrationCert {
        self.cert
    }
}

pub const INITIAL_FUNDS: Lovelace = 100_000_000_000;
