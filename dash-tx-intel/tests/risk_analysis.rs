//! Locktime risk analysis fed by network observations.

use dash_tx_intel::test_utils::TestTransaction;
use dash_tx_intel::transaction::Confidence;
use dash_tx_intel::{
    ChainTip, IntelConfig, NetworkObservation, NetworkSnapshot, OfflineRiskAnalyzer, RiskAnalyzer,
    RiskVerdict, WalletTransaction,
};

const LOCAL_TIME: u64 = 1_700_000_000;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn height_locked(id: u8, lock: u32) -> WalletTransaction {
    TestTransaction::new(id).version(2).lock_time(lock).input_sequence(0, 0xffff_fffe).build()
}

#[tokio::test]
async fn test_tracker_follows_the_bus() {
    init_logging();
    let config = IntelConfig::testnet().with_event_bus_capacity(16);
    let bus = config.event_bus();
    let tracker = config.time_tracker();
    let analyzer = tracker.analyzer();
    let handle = tracker.spawn(bus.subscribe());

    let tx = height_locked(1, 2_050);
    let wallet_tip = ChainTip::new(1_000, LOCAL_TIME);
    assert_eq!(analyzer.analyze_at(&tx, &[], wallet_tip, LOCAL_TIME), RiskVerdict::NonFinal);

    bus.emit(&[
        NetworkObservation::PeerConnected {
            peer_time: LOCAL_TIME as i64 + 60,
            local_time: LOCAL_TIME as i64,
            common_height: 2_000,
        },
        NetworkObservation::PeerConnected {
            peer_time: LOCAL_TIME as i64 - 20,
            local_time: LOCAL_TIME as i64,
            common_height: 0,
        },
        NetworkObservation::BlocksDownloaded {
            common_height: 2_100,
        },
    ]);
    drop(bus);
    handle.await.unwrap().unwrap();

    assert_eq!(
        analyzer.snapshot(),
        NetworkSnapshot {
            common_height: Some(2_100),
            time_offset: 20,
        }
    );
    assert_eq!(analyzer.analyze_at(&tx, &[], wallet_tip, LOCAL_TIME), RiskVerdict::Final);
    assert_eq!(
        analyzer.analyze_at(&height_locked(2, 2_200), &[], wallet_tip, LOCAL_TIME),
        RiskVerdict::NonFinal
    );
}

#[tokio::test]
async fn test_analyzers_share_one_tracker() {
    init_logging();
    let config = IntelConfig::default();
    let bus = config.event_bus();
    let tracker = config.time_tracker();
    let first = tracker.analyzer();
    let second = first.clone();
    let handle = tracker.spawn(bus.subscribe());

    bus.emit(&[NetworkObservation::BlocksDownloaded {
        common_height: 500,
    }]);
    drop(bus);
    handle.await.unwrap().unwrap();

    assert_eq!(first.snapshot(), second.snapshot());
    assert_eq!(first.snapshot().common_height, Some(500));
}

#[test]
fn test_offline_analyzer_before_peers_connect() {
    let analyzer = OfflineRiskAnalyzer::new(2_000, LOCAL_TIME);
    let wallet_tip = ChainTip::new(100, LOCAL_TIME - 86_400);

    assert_eq!(analyzer.analyze(&height_locked(1, 2_000), &[], wallet_tip), RiskVerdict::Final);
    assert_eq!(analyzer.analyze(&height_locked(2, 2_001), &[], wallet_tip), RiskVerdict::NonFinal);

    let announced = TestTransaction::new(3)
        .version(2)
        .lock_time(2_001)
        .input_sequence(0, 0xffff_fffe)
        .confidence(Confidence::pending().with_broadcast_peers(3))
        .build();
    assert_eq!(analyzer.analyze(&announced, &[], wallet_tip), RiskVerdict::Final);
}

#[test]
fn test_unlocked_transaction_is_final_everywhere() {
    let tx = TestTransaction::new(1).version(2).build();
    let wallet_tip = ChainTip::new(0, 0);
    assert_eq!(OfflineRiskAnalyzer::new(0, 0).analyze(&tx, &[], wallet_tip), RiskVerdict::Final);
    assert_eq!(
        IntelConfig::default().time_tracker().analyzer().analyze(&tx, &[], wallet_tip),
        RiskVerdict::Final
    );
}
