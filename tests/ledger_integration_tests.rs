//! Ledger integration tests
//!
//! Exercises the public API end to end: intents are queued through the
//! `Ledger` facade and settled by mined blocks. Every scenario runs against
//! both the in-memory store and the Sled store.

use std::sync::Arc;
use std::thread;
use support_ledger::{
    AccountType, Block, Ledger, LedgerConfig, LedgerError, LedgerStore, LotteryRewardDistributor,
    MemoryStore, NoRewards, SeededAddressGenerator, SledStore, Transaction, TxKind,
};
use tempfile::{tempdir, TempDir};

fn config() -> LedgerConfig {
    LedgerConfig {
        address_seed: "integration".to_string(),
        ..LedgerConfig::default()
    }
}

fn ledger_over<S: LedgerStore + 'static>(store: Arc<S>) -> Ledger<S> {
    Ledger::with_components(
        store,
        config(),
        Box::new(SeededAddressGenerator::new("integration")),
        Box::new(NoRewards),
    )
}

fn sled_store() -> (Arc<SledStore>, TempDir) {
    let temp_dir = tempdir().unwrap();
    let store = SledStore::open(&temp_dir.path().join("ledger")).unwrap();
    (Arc::new(store), temp_dir)
}

fn total_value<S: LedgerStore>(store: &S) -> u64 {
    store
        .accounts()
        .unwrap()
        .iter()
        .map(|account| account.total())
        .sum()
}

fn minted(block: &Block) -> u64 {
    block
        .get_transactions()
        .iter()
        .filter(|tx| matches!(tx.get_kind(), TxKind::Coinbase | TxKind::Reward))
        .map(|tx| tx.get_amount())
        .sum()
}

// Mines a block and checks that value only grew by what the block minted
fn mine_and_check_conservation<S: LedgerStore + 'static>(ledger: &Ledger<S>) -> Block {
    let before = total_value(ledger.get_store().as_ref());
    let block = ledger.mine_now().unwrap();
    let after = total_value(ledger.get_store().as_ref());
    assert_eq!(after, before + minted(&block));
    block
}

fn check_genesis_reward<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = ledger_over(store);
    let service = ledger.init().unwrap();

    let genesis = ledger.mine_now().unwrap();
    assert_eq!(genesis.get_height(), 0);
    assert_eq!(genesis.get_transactions()[0].get_kind(), TxKind::Coinbase);
    assert_eq!(genesis.get_transactions()[0].get_amount(), 1_000_000);

    let second = ledger.mine_now().unwrap();
    assert_eq!(second.get_height(), 1);
    assert_eq!(second.get_transactions()[0].get_amount(), 1);

    assert_eq!(ledger.get_account(&service).unwrap().get_balance(), 1_000_001);
    let info = ledger.block_info(1).unwrap().unwrap();
    assert_eq!(info.height, 1);
    assert_eq!(info.tx_ids, second.tx_ids());
}

fn check_empty_pool_still_produces_block<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = ledger_over(store);
    ledger.init().unwrap();
    ledger.mine_now().unwrap();

    assert!(ledger.pending().unwrap().is_empty());
    assert!(ledger.trigger_if_pending().unwrap().is_none());

    let block = ledger.mine_now().unwrap();
    assert_eq!(block.get_height(), 1);
    assert_eq!(block.get_transactions().len(), 1);
    assert_eq!(ledger.block_height().unwrap(), 2);
}

fn check_in_block_ordering<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = ledger_over(store);
    let service = ledger.init().unwrap();
    ledger.mine_now().unwrap();

    let x = ledger.create_address().unwrap();
    let y = ledger.create_address().unwrap();
    let z = ledger.create_address().unwrap();
    ledger.send(&service, &x, 10).unwrap();
    ledger.send(&service, &y, 10).unwrap();
    mine_and_check_conservation(&ledger);
    // 50 bounty + 10
    assert_eq!(ledger.get_account(&y).unwrap().get_balance(), 60);

    // Y spends more than it holds before A lands; only A's credit makes B valid
    ledger.send(&x, &y, 10).unwrap();
    let b = Transaction::new_normal(&y, &z, 65).unwrap();
    ledger.get_store().add_pending(b.clone()).unwrap();

    let block = mine_and_check_conservation(&ledger);
    assert_eq!(block.get_transactions().last().unwrap().get_id(), b.get_id());
    assert_eq!(ledger.get_account(&x).unwrap().get_balance(), 50);
    assert_eq!(ledger.get_account(&y).unwrap().get_balance(), 5);
    assert_eq!(ledger.get_account(&z).unwrap().get_balance(), 115);
}

fn check_concurrent_support_dedup<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = ledger_over(store);
    let service = ledger.init().unwrap();
    ledger.mine_now().unwrap();
    let target = ledger.create_address().unwrap();
    let ledger = Arc::new(ledger);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let ledger = ledger.clone();
            let service = service.clone();
            let target = target.clone();
            thread::spawn(move || ledger.support(&service, &target, true))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(LedgerError::DuplicatePending(_)))));

    let pending_supports: Vec<_> = ledger
        .pending()
        .unwrap()
        .into_iter()
        .filter(|tx| tx.get_kind() == TxKind::Support)
        .collect();
    assert_eq!(pending_supports.len(), 1);

    mine_and_check_conservation(&ledger);
    let supporter = ledger.get_account(&service).unwrap();
    assert_eq!(supporter.get_locked_balance(), 1);
    assert_eq!(
        ledger.get_store().relationships().unwrap(),
        vec![(service.clone(), target.clone())]
    );
}

fn check_claim_generator<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = ledger_over(store);
    let service = ledger.init().unwrap();
    ledger.mine_now().unwrap();
    let generator = ledger.create_address().unwrap();
    ledger.send(&service, &generator, 100).unwrap();
    mine_and_check_conservation(&ledger);
    assert_eq!(ledger.get_account(&generator).unwrap().get_balance(), 150);

    ledger.claim_generator(&generator, true).unwrap();
    assert!(matches!(
        ledger.claim_generator(&generator, true),
        Err(LedgerError::DuplicatePending(_))
    ));

    mine_and_check_conservation(&ledger);
    let account = ledger.get_account(&generator).unwrap();
    assert_eq!(account.get_balance(), 50);
    assert_eq!(account.get_locked_balance(), 100);
    assert_eq!(account.get_account_type(), Some(AccountType::Generator));

    ledger.claim_generator(&generator, false).unwrap();
    mine_and_check_conservation(&ledger);
    let account = ledger.get_account(&generator).unwrap();
    assert_eq!(account.get_balance(), 150);
    assert_eq!(account.get_locked_balance(), 0);
    assert_eq!(account.get_account_type(), Some(AccountType::Supporter));
}

fn check_insufficient_send_recorded_but_skipped<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = ledger_over(store);
    let service = ledger.init().unwrap();
    ledger.mine_now().unwrap();
    let user = ledger.create_address().unwrap();
    mine_and_check_conservation(&ledger);

    // Each send passes intake on its own; together they overdraw the account
    let first = ledger.send(&user, &service, 40).unwrap();
    let second = ledger.send(&user, &service, 40).unwrap();
    let service_before = ledger.get_account(&service).unwrap().get_balance();

    let block = mine_and_check_conservation(&ledger);
    let ids = block.tx_ids();
    assert!(ids.contains(&first.get_id().to_string()));
    assert!(ids.contains(&second.get_id().to_string()));
    assert!(ledger.pending().unwrap().is_empty());

    assert_eq!(ledger.get_account(&user).unwrap().get_balance(), 10);
    // Coinbase (1) plus the one send that went through
    assert_eq!(
        ledger.get_account(&service).unwrap().get_balance(),
        service_before + 1 + 40
    );
}

fn check_rewards_are_minted<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = Ledger::with_components(
        store.clone(),
        LedgerConfig {
            distribute_reward: 7,
            ..config()
        },
        Box::new(SeededAddressGenerator::new("integration")),
        Box::new(LotteryRewardDistributor::new(store)),
    );
    let service = ledger.init().unwrap();
    ledger.mine_now().unwrap();

    let generator = ledger.create_address().unwrap();
    ledger.send(&service, &generator, 100).unwrap();
    mine_and_check_conservation(&ledger);
    ledger.claim_generator(&generator, true).unwrap();
    ledger.support(&service, &generator, true).unwrap();
    mine_and_check_conservation(&ledger);

    let block = mine_and_check_conservation(&ledger);
    let rewards: Vec<_> = block
        .get_transactions()
        .iter()
        .filter(|tx| tx.get_kind() == TxKind::Reward)
        .collect();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].get_address_to(), Some(generator.as_str()));
    assert_eq!(rewards[0].get_amount(), 7);
    // Rewards follow the coinbase directly
    assert_eq!(block.get_transactions()[1].get_kind(), TxKind::Reward);
}

fn check_balances_never_negative<S: LedgerStore + 'static>(store: Arc<S>) {
    let ledger = ledger_over(store);
    let service = ledger.init().unwrap();
    ledger.mine_now().unwrap();

    let users: Vec<String> = (0..4).map(|_| ledger.create_address().unwrap()).collect();
    mine_and_check_conservation(&ledger);

    for round in 0..3 {
        for (i, user) in users.iter().enumerate() {
            let next = &users[(i + 1) % users.len()];
            let _ = ledger.send(user, next, 30 + round * 5);
            let _ = ledger.support(user, next, round % 2 == 0);
            let _ = ledger.claim_generator(user, round == 1);
        }
        let _ = ledger.send(&service, &users[round as usize], 75);
        mine_and_check_conservation(&ledger);
    }

    // u64 balances cannot go below zero; the books must still add up exactly
    let locked: u64 = ledger
        .get_store()
        .accounts()
        .unwrap()
        .iter()
        .map(|account| account.get_locked_balance())
        .sum();
    let edges = ledger.get_store().relationships().unwrap().len() as u64;
    let generators = ledger
        .get_store()
        .accounts()
        .unwrap()
        .iter()
        .filter(|account| account.get_account_type() == Some(AccountType::Generator))
        .count() as u64;
    assert_eq!(locked, edges + generators * 100);
}

macro_rules! over_both_stores {
    ($($check:ident => $memory:ident, $sled:ident;)*) => {
        $(
            #[test]
            fn $memory() {
                $check(Arc::new(MemoryStore::new()));
            }

            #[test]
            fn $sled() {
                let (store, _temp_dir) = sled_store();
                $check(store);
            }
        )*
    };
}

over_both_stores! {
    check_genesis_reward => test_genesis_reward_memory, test_genesis_reward_sled;
    check_empty_pool_still_produces_block => test_empty_pool_block_memory, test_empty_pool_block_sled;
    check_in_block_ordering => test_in_block_ordering_memory, test_in_block_ordering_sled;
    check_concurrent_support_dedup => test_support_dedup_memory, test_support_dedup_sled;
    check_claim_generator => test_claim_generator_memory, test_claim_generator_sled;
    check_insufficient_send_recorded_but_skipped => test_insufficient_send_memory, test_insufficient_send_sled;
    check_rewards_are_minted => test_rewards_memory, test_rewards_sled;
    check_balances_never_negative => test_balances_never_negative_memory, test_balances_never_negative_sled;
}

#[test]
fn test_sled_ledger_survives_restart() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("ledger");

    let (service, user) = {
        let ledger = ledger_over(Arc::new(SledStore::open(&path).unwrap()));
        let service = ledger.init().unwrap();
        ledger.mine_now().unwrap();
        let user = ledger.create_address().unwrap();
        (service, user)
    };

    let ledger = ledger_over(Arc::new(SledStore::open(&path).unwrap()));
    assert_eq!(ledger.init().unwrap(), service);
    assert_eq!(ledger.pending().unwrap().len(), 1);
    ledger.mine_now().unwrap();
    assert_eq!(ledger.get_account(&user).unwrap().get_balance(), 50);
    assert_eq!(ledger.block_height().unwrap(), 2);
}
