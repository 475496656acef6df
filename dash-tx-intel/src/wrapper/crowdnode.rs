//! CrowdNode account sign-up.
//!
//! Signing up with CrowdNode is a handshake of small payments between the
//! account address and the CrowdNode address, each amount encoding a request
//! or response code on top of a fixed offset:
//!
//! 1. top-up: the wallet funds the account address
//! 2. sign-up request: account pays CrowdNode `offset + 131072`
//! 3. accept-terms response: CrowdNode pays the account `offset + 2`
//! 4. accept-terms request: account pays CrowdNode `offset + 65536`
//! 5. welcome response: CrowdNode pays the account `offset + 4`
//!
//! The sign-up request is the seed of a workflow instance; the account
//! address is read from its first resolved input.

use std::collections::HashSet;

use dashcore::address::Payload;
use dashcore::hashes::Hash;
use dashcore::{Address, Network, PubkeyHash};
use tracing::{debug, trace};

use crate::filters::{CoinsFromAddressTxFilter, CoinsToAddressTxFilter, TxFilter};
use crate::transaction::{OutPoint, Txid, WalletTransaction, pays_to};

/// Added to every request and response code.
pub const API_OFFSET: u64 = 20_000;

pub const SIGN_UP_REQUEST: u64 = API_OFFSET + 131_072;
pub const ACCEPT_TERMS_REQUEST: u64 = API_OFFSET + 65_536;
pub const ACCEPT_TERMS_RESPONSE: u64 = API_OFFSET + 2;
pub const WELCOME_TO_API_RESPONSE: u64 = API_OFFSET + 4;

const MAINNET_ADDRESS_HASH: [u8; 20] = [
    0x61, 0xba, 0x0f, 0x43, 0xe1, 0x3c, 0x1c, 0xdf, 0x5b, 0xc8, 0x1d, 0xb6, 0xbc, 0x46, 0xfd, 0xaf,
    0x16, 0x2f, 0x03, 0x8c,
];

const TESTNET_ADDRESS_HASH: [u8; 20] = [
    0x0d, 0x5b, 0xcb, 0xee, 0xb4, 0x59, 0xaf, 0x40, 0xf9, 0x7f, 0xcb, 0x4a, 0x98, 0xe9, 0xd1, 0xed,
    0x13, 0xe9, 0x04, 0xc8,
];

/// The CrowdNode service address. Networks other than mainnet share the
/// testnet service.
pub fn crowdnode_address(network: Network) -> Address {
    let hash = match network {
        Network::Dash => MAINNET_ADDRESS_HASH,
        _ => TESTNET_ADDRESS_HASH,
    };
    Address::new(network, Payload::PubkeyHash(PubkeyHash::from_byte_array(hash)))
}

/// Steps of the sign-up handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignUpStep {
    TopUp,
    SignUpRequest,
    AcceptTermsResponse,
    AcceptTermsRequest,
    WelcomeResponse,
}

/// One sign-up attempt and the transactions recognized as part of it.
#[derive(Debug, Clone)]
pub struct CrowdNodeSignUpTxSet<'a> {
    network: Network,
    seed: Txid,
    seed_funding: Vec<OutPoint>,
    account: Address,
    accept_terms_response: TxFilter,
    accept_terms_request: TxFilter,
    welcome_response: TxFilter,
    completed: HashSet<SignUpStep>,
    members: Vec<&'a WalletTransaction>,
}

impl<'a> CrowdNodeSignUpTxSet<'a> {
    /// Start a set from a sign-up request, if `seed` is one.
    pub fn from_seed(network: Network, seed: &WalletTransaction) -> Option<Self> {
        let crowdnode = crowdnode_address(network);
        let mut signup = CoinsToAddressTxFilter::new(crowdnode.clone(), SIGN_UP_REQUEST);
        if !signup.matches(seed) {
            return None;
        }
        let Some(account) = seed.first_input_address(network) else {
            debug!("Sign-up request {} has no resolved account input", seed.txid);
            return None;
        };

        Some(Self {
            network,
            seed: seed.txid,
            seed_funding: seed.inputs().iter().map(|input| input.previous_output).collect(),
            accept_terms_response: CoinsFromAddressTxFilter::new(
                crowdnode.clone(),
                ACCEPT_TERMS_RESPONSE,
            )
            .into(),
            accept_terms_request: CoinsToAddressTxFilter::new(crowdnode.clone(), ACCEPT_TERMS_REQUEST)
                .into(),
            welcome_response: CoinsFromAddressTxFilter::new(crowdnode, WELCOME_TO_API_RESPONSE).into(),
            account,
            completed: HashSet::new(),
            members: Vec::new(),
        })
    }

    pub fn id(&self) -> String {
        format!("crowdnode-signup:{}", self.seed)
    }

    pub fn account_address(&self) -> &Address {
        &self.account
    }

    pub fn transactions(&self) -> &[&'a WalletTransaction] {
        &self.members
    }

    pub fn is_complete(&self) -> bool {
        self.completed.len() == 5
    }

    pub fn has_completed(&self, step: SignUpStep) -> bool {
        self.completed.contains(&step)
    }

    pub fn try_include(&mut self, tx: &'a WalletTransaction) -> bool {
        if self.members.iter().any(|member| member.txid == tx.txid) {
            return true;
        }
        let Some(step) = self.match_step(tx) else {
            return false;
        };
        trace!("{} matched {:?} of {}", tx.txid, step, self.id());
        self.completed.insert(step);
        self.members.push(tx);
        true
    }

    fn match_step(&mut self, tx: &WalletTransaction) -> Option<SignUpStep> {
        if tx.txid == self.seed {
            return self.pending(SignUpStep::SignUpRequest);
        }

        let account = &self.account;
        let funds_seed = self.seed_funding.iter().any(|funding| {
            funding.txid == tx.txid
                && tx.outputs().get(funding.vout as usize).is_some_and(|o| pays_to(o, account))
        });
        if funds_seed {
            return self.pending(SignUpStep::TopUp);
        }

        if !self.has_completed(SignUpStep::AcceptTermsResponse)
            && self.accept_terms_response.matches(tx)
            && counterpart_is(&self.accept_terms_response, account)
        {
            return Some(SignUpStep::AcceptTermsResponse);
        }

        if !self.has_completed(SignUpStep::AcceptTermsRequest)
            && self.accept_terms_request.matches(tx)
            && tx.first_input_address(self.network).is_some_and(|from| same_destination(&from, account))
        {
            return Some(SignUpStep::AcceptTermsRequest);
        }

        if !self.has_completed(SignUpStep::WelcomeResponse)
            && self.welcome_response.matches(tx)
            && counterpart_is(&self.welcome_response, account)
        {
            return Some(SignUpStep::WelcomeResponse);
        }

        None
    }

    fn pending(&self, step: SignUpStep) -> Option<SignUpStep> {
        (!self.has_completed(step)).then_some(step)
    }
}

fn counterpart_is(filter: &TxFilter, account: &Address) -> bool {
    filter.counterpart().is_some_and(|address| same_destination(address, account))
}

/// Devnet and regtest addresses encode like testnet ones; compare what they lock to.
fn same_destination(a: &Address, b: &Address) -> bool {
    a.script_pubkey() == b.script_pubkey()
}
