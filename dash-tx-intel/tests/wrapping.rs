//! Workflow grouping over a full wallet history.

use std::collections::BTreeSet;

use dash_tx_intel::test_utils::{TestTransaction, p2pkh};
use dash_tx_intel::wrapper::crowdnode::{
    ACCEPT_TERMS_REQUEST, ACCEPT_TERMS_RESPONSE, SIGN_UP_REQUEST, SignUpStep,
    WELCOME_TO_API_RESPONSE, crowdnode_address,
};
use dash_tx_intel::transaction::WalletScripts;
use dash_tx_intel::{
    IntelConfig, Network, TxOut, TxWrapper, Txid, WalletTransaction, WrappedTransactions,
    wrap_transactions,
};

const DENOM: u64 = 100_001_000;

struct History {
    top_up: WalletTransaction,
    sign_up: WalletTransaction,
    response: WalletTransaction,
    accept: WalletTransaction,
    welcome: WalletTransaction,
    unrelated: WalletTransaction,
    mixing_a: WalletTransaction,
    mixing_b: WalletTransaction,
    mixing_next_day: WalletTransaction,
}

impl History {
    fn new() -> Self {
        let crowdnode = crowdnode_address(Network::Testnet);
        let account = p2pkh(1);
        let funding = p2pkh(9);

        let top_up = TestTransaction::new(1)
            .spending(funding.clone(), 2_000_000)
            .output(account.clone(), 1_000_000)
            .output(funding, 990_000)
            .build();
        let sign_up = TestTransaction::new(2)
            .spends(&top_up, 0)
            .output(crowdnode.clone(), SIGN_UP_REQUEST)
            .output(account.clone(), 847_928)
            .build();
        let response = TestTransaction::new(3)
            .spending(crowdnode.clone(), 500_000)
            .output(account.clone(), ACCEPT_TERMS_RESPONSE)
            .output(crowdnode.clone(), 479_000)
            .build();
        let accept = TestTransaction::new(4)
            .spends(&sign_up, 1)
            .output(crowdnode.clone(), ACCEPT_TERMS_REQUEST)
            .output(account.clone(), 761_392)
            .build();
        let welcome = TestTransaction::new(5)
            .spending(crowdnode, 500_000)
            .output(account, WELCOME_TO_API_RESPONSE)
            .build();
        let unrelated =
            TestTransaction::new(6).spending(p2pkh(7), 300_000).output(p2pkh(8), 299_000).build();
        let mixing = |id: u8, timestamp: u64| {
            TestTransaction::new(id)
                .spending(p2pkh(id), DENOM)
                .spending(p2pkh(id + 1), DENOM)
                .output(p2pkh(id + 2), DENOM)
                .output(p2pkh(id + 3), DENOM)
                .timestamp(timestamp)
                .build()
        };

        Self {
            top_up,
            sign_up,
            response,
            accept,
            welcome,
            unrelated,
            mixing_a: mixing(20, 1_700_000_100),
            mixing_b: mixing(30, 1_700_000_200),
            mixing_next_day: mixing(40, 1_700_100_000),
        }
    }

    /// Scripts of the account and of the address that funded it.
    fn wallet() -> WalletScripts {
        [p2pkh(1), p2pkh(9)].into_iter().collect()
    }

    fn all(&self) -> Vec<WalletTransaction> {
        vec![
            self.top_up.clone(),
            self.sign_up.clone(),
            self.response.clone(),
            self.accept.clone(),
            self.welcome.clone(),
            self.unrelated.clone(),
            self.mixing_a.clone(),
            self.mixing_b.clone(),
            self.mixing_next_day.clone(),
        ]
    }
}

fn members(wrapper: &TxWrapper<'_>) -> BTreeSet<Txid> {
    wrapper.transactions().iter().map(|tx| tx.txid).collect()
}

fn summary(wrapped: &WrappedTransactions<'_>) -> (Vec<(String, BTreeSet<Txid>)>, BTreeSet<Txid>) {
    let wrappers = wrapped.wrappers.iter().map(|w| (w.id(), members(w))).collect();
    let ungrouped = wrapped.ungrouped.iter().map(|tx| tx.txid).collect();
    (wrappers, ungrouped)
}

#[test]
fn test_full_crowdnode_sign_up() {
    let history = History::new();
    let all = history.all();
    let factories = IntelConfig::testnet().wrapper_factories();
    let wrapped = wrap_transactions(&all, &factories, &History::wallet()).unwrap();

    let signup = wrapped.wrapper_of(&history.sign_up.txid).unwrap();
    let TxWrapper::CrowdNodeSignUp(set) = signup else {
        panic!("expected a CrowdNode wrapper, got {}", signup.id());
    };
    assert!(set.is_complete());
    assert_eq!(set.account_address(), &p2pkh(1));
    for step in [
        SignUpStep::TopUp,
        SignUpStep::SignUpRequest,
        SignUpStep::AcceptTermsResponse,
        SignUpStep::AcceptTermsRequest,
        SignUpStep::WelcomeResponse,
    ] {
        assert!(set.has_completed(step), "{:?} missing", step);
    }

    let expected: BTreeSet<Txid> = [
        history.top_up.txid,
        history.sign_up.txid,
        history.response.txid,
        history.accept.txid,
        history.welcome.txid,
    ]
    .into_iter()
    .collect();
    assert_eq!(members(signup), expected);
    assert_eq!(signup.grouped_date(), Some(history.top_up.timestamp));
}

#[test]
fn test_crowdnode_takes_priority_over_coinjoin() {
    // Small CrowdNode payments look like collateral creation. Even when every
    // output counts as the wallet's own, the sign-up wrapper is offered them
    // first.
    let history = History::new();
    let all = history.all();
    let everything_mine = |_: &TxOut| true;
    let factories = IntelConfig::testnet().wrapper_factories();
    let wrapped = wrap_transactions(&all, &factories, &everything_mine).unwrap();

    let coinjoin: Vec<&TxWrapper<'_>> = wrapped
        .wrappers
        .iter()
        .filter(|wrapper| matches!(wrapper, TxWrapper::CoinJoinMixing(_)))
        .collect();
    assert_eq!(coinjoin.len(), 2);

    let first_day: BTreeSet<Txid> = [history.mixing_a.txid, history.mixing_b.txid].into_iter().collect();
    assert_eq!(members(coinjoin[0]), first_day);
    assert_eq!(members(coinjoin[1]), [history.mixing_next_day.txid].into_iter().collect());
    assert!(wrapped.wrapper_of(&history.welcome.txid).is_some_and(|w| w.id().starts_with("crowdnode")));
}

#[test]
fn test_every_transaction_has_one_home() {
    let history = History::new();
    let all = history.all();
    let factories = IntelConfig::testnet().wrapper_factories();
    let wrapped = wrap_transactions(&all, &factories, &History::wallet()).unwrap();

    let mut seen = BTreeSet::new();
    for wrapper in &wrapped.wrappers {
        assert!(!wrapper.is_empty());
        for tx in wrapper.transactions() {
            assert!(seen.insert(tx.txid), "{} wrapped twice", tx.txid);
        }
    }
    for tx in &wrapped.ungrouped {
        assert!(seen.insert(tx.txid), "{} both wrapped and ungrouped", tx.txid);
    }
    assert_eq!(seen.len(), all.len());
    assert_eq!(
        wrapped.ungrouped.iter().map(|tx| tx.txid).collect::<Vec<_>>(),
        vec![history.unrelated.txid]
    );
}

#[test]
fn test_wrapping_is_idempotent_and_order_independent() {
    let history = History::new();
    let factories = IntelConfig::testnet().wrapper_factories();
    let wallet = History::wallet();

    let all = history.all();
    let first = summary(&wrap_transactions(&all, &factories, &wallet).unwrap());
    let again = summary(&wrap_transactions(&all, &factories, &wallet).unwrap());
    assert_eq!(first, again);

    let mut reversed = history.all();
    reversed.reverse();
    assert_eq!(first, summary(&wrap_transactions(&reversed, &factories, &wallet).unwrap()));

    let mut with_repeats = history.all();
    with_repeats.extend(history.all());
    assert_eq!(first, summary(&wrap_transactions(&with_repeats, &factories, &wallet).unwrap()));
}

#[test]
fn test_disabled_workflows_leave_transactions_ungrouped() {
    let history = History::new();
    let all = history.all();
    let config = IntelConfig::testnet().with_crowdnode_wrapping(false).with_coinjoin_wrapping(false);
    let wrapped = wrap_transactions(&all, &config.wrapper_factories(), &History::wallet()).unwrap();
    assert!(wrapped.wrappers.is_empty());
    assert_eq!(wrapped.ungrouped.len(), all.len());
}

#[test]
fn test_response_to_another_account_is_not_wrapped() {
    let history = History::new();
    let stranger_welcome = TestTransaction::new(50)
        .spending(crowdnode_address(Network::Testnet), 500_000)
        .output(p2pkh(2), WELCOME_TO_API_RESPONSE)
        .output(p2pkh(2), 400_000)
        .build();
    let all = vec![history.sign_up.clone(), stranger_welcome.clone()];
    let factories = IntelConfig::testnet().wrapper_factories();
    let wrapped = wrap_transactions(&all, &factories, &History::wallet()).unwrap();

    assert_eq!(wrapped.wrappers.len(), 1);
    assert!(wrapped.wrapper_of(&stranger_welcome.txid).is_none());
    assert_eq!(wrapped.ungrouped.len(), 1);
}

#[test]
fn test_payments_are_not_coinjoin_activity() {
    let mine = p2pkh(1);
    let collateral_address = p2pkh(2);
    let stranger = p2pkh(3);
    let wallet: WalletScripts = [mine.clone(), collateral_address.clone()].into_iter().collect();

    let small_payment = TestTransaction::new(1)
        .spending(mine.clone(), 5_000_000)
        .output(stranger.clone(), 50_000)
        .output(mine.clone(), 4_949_000)
        .build();
    let denominated_payment = TestTransaction::new(2)
        .spending(mine.clone(), 50_000_000)
        .output(stranger, 10_000_100)
        .output(mine.clone(), 39_989_000)
        .build();
    let collateral = TestTransaction::new(3)
        .spending(mine.clone(), 5_000_000)
        .output(collateral_address, 50_000)
        .output(mine, 4_949_000)
        .build();
    let all = vec![small_payment.clone(), denominated_payment.clone(), collateral.clone()];

    let factories = IntelConfig::testnet().wrapper_factories();
    let wrapped = wrap_transactions(&all, &factories, &wallet).unwrap();

    assert_eq!(wrapped.wrappers.len(), 1);
    assert!(matches!(wrapped.wrappers[0], TxWrapper::CoinJoinMixing(_)));
    assert_eq!(members(&wrapped.wrappers[0]), [collateral.txid].into_iter().collect());
    let ungrouped: BTreeSet<Txid> = wrapped.ungrouped.iter().map(|tx| tx.txid).collect();
    assert_eq!(ungrouped, [small_payment.txid, denominated_payment.txid].into_iter().collect());
}
