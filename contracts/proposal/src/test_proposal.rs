use crowdfund_common::testing::{account, emitted, emitted_names, near};
use crowdfund_common::{Error, ProposalStage};
use near_sdk::json_types::U128;
use near_sdk::NearToken;
use proptest::prelude::*;

use crate::invariants::assert_proposal_invariants;
use crate::testutils::{call, configured, initialized, pledge, FACTORY};
use crate::ProposalContract;

const ZERO: NearToken = NearToken::from_yoctonear(0);

fn terms(goal: u128, min_deposit: u128) -> (U128, U128) {
    (
        U128(near(goal).as_yoctonear()),
        U128(near(min_deposit).as_yoctonear()),
    )
}

// ── initialize ───────────────────────────────────────────────────────

#[test]
fn test_initialize_records_caller_as_factory() {
    let contract = initialized();

    assert_eq!(contract.get_factory().unwrap(), account(FACTORY));
    assert!(!contract.is_configured().unwrap());
    assert_eq!(contract.get_stage().unwrap(), ProposalStage::Initialized);
    assert_eq!(emitted_names(), vec!["proposal_initialized"]);
}

#[test]
fn test_initialize_is_one_shot() {
    let mut contract = initialized();

    call("mallory", near(3));
    assert_eq!(contract.initialize(), Err(Error::AlreadyInitialized));
    assert_eq!(contract.get_factory().unwrap(), account(FACTORY));
}

#[test]
fn test_initialize_rejects_small_stake() {
    call(FACTORY, near(3).saturating_sub(NearToken::from_yoctonear(1)));
    let mut contract = ProposalContract::default();

    assert_eq!(contract.initialize(), Err(Error::InsufficientStake));
    assert_eq!(contract.get_proposal(), Err(Error::NotInitialized));
}

#[test]
fn test_calls_before_initialize_fail() {
    call("alice", near(5));
    let mut contract = ProposalContract::default();
    let (goal, min_deposit) = terms(50, 3);

    assert_eq!(
        contract.configure("t".into(), "d".into(), goal, min_deposit),
        Err(Error::NotInitialized)
    );
    assert_eq!(contract.add_supporter(), Err(Error::NotInitialized));
    assert_eq!(contract.get_factory(), Err(Error::NotInitialized));
    assert_eq!(contract.is_configured(), Err(Error::NotInitialized));
    assert_eq!(contract.retry_conversion(), Err(Error::NotInitialized));
}

// ── configure ────────────────────────────────────────────────────────

#[test]
fn test_configure_sets_details_and_terms() {
    let contract = configured(50, 3);

    let record = contract.get_proposal().unwrap();
    let details = record.details.unwrap();
    assert_eq!(details.title, "some proposal");
    assert_eq!(details.description, "really tho");
    assert_eq!(details.author, account("alice"));

    let funding = record.funding.unwrap();
    assert_eq!(funding.goal, near(50));
    assert_eq!(funding.min_deposit, near(3));
    assert_eq!(funding.total, ZERO);
    assert!(!funding.funded);

    assert!(contract.is_configured().unwrap());
    assert_eq!(contract.get_stage().unwrap(), ProposalStage::Configured);
    assert_eq!(contract.list_supporters().unwrap(), vec![]);

    let events = emitted();
    assert_eq!(events[0]["event"], "proposal_configured");
    assert_eq!(events[0]["data"]["author"], "alice");
}

#[test]
fn test_configure_can_repeat_until_first_pledge() {
    let mut contract = configured(50, 3);

    call("bob", ZERO);
    let (goal, min_deposit) = terms(80, 5);
    contract
        .configure("second".into(), "draft".into(), goal, min_deposit)
        .unwrap();
    let record = contract.get_proposal().unwrap();
    assert_eq!(record.details.unwrap().author, account("bob"));
    assert_eq!(record.funding.unwrap().goal, near(80));

    pledge(&mut contract, "cc", near(5)).unwrap();
    call("bob", ZERO);
    let (goal, min_deposit) = terms(10, 5);
    assert_eq!(
        contract.configure("third".into(), "late".into(), goal, min_deposit),
        Err(Error::ConfigurationLocked)
    );
    assert_eq!(contract.get_proposal().unwrap().funding.unwrap().goal, near(80));
}

#[test]
fn test_configure_rejects_bad_terms() {
    let mut contract = initialized();
    call("alice", ZERO);

    for (goal, min_deposit) in [terms(2, 1), terms(50, 0), terms(5, 6)] {
        assert_eq!(
            contract.configure("t".into(), "d".into(), goal, min_deposit),
            Err(Error::InvalidFundingTerms)
        );
    }
    assert!(!contract.is_configured().unwrap());
}

// ── add_supporter ────────────────────────────────────────────────────

#[test]
fn test_pledge_below_goal_keeps_collecting() {
    let mut contract = configured(50, 3);

    pledge(&mut contract, "cc", near(4)).unwrap();

    let supporters = contract.list_supporters().unwrap();
    assert_eq!(supporters.len(), 1);
    assert_eq!(supporters[0].account, account("cc"));
    assert_eq!(supporters[0].amount, near(4));
    assert_eq!(contract.get_funding_total().unwrap(), U128(near(4).as_yoctonear()));
    assert!(!contract.is_fully_funded().unwrap());
    assert_eq!(contract.get_stage().unwrap(), ProposalStage::Open);
    assert_eq!(emitted_names(), vec!["supporter_added"]);
    assert_proposal_invariants(&contract);
}

#[test]
fn test_pledge_reaching_goal_funds_and_stops_pledging() {
    let mut contract = configured(50, 3);

    pledge(&mut contract, "cc", near(4)).unwrap();
    pledge(&mut contract, "bob", near(50)).unwrap();
    assert!(contract.is_fully_funded().unwrap());
    assert_eq!(contract.get_stage().unwrap(), ProposalStage::FullyFunded);

    assert_eq!(
        pledge(&mut contract, "alice", near(5)),
        Err(Error::AlreadyFunded)
    );
    assert_eq!(contract.list_supporters().unwrap().len(), 2);
    assert_eq!(contract.get_funding_total().unwrap(), U128(near(54).as_yoctonear()));
    assert_proposal_invariants(&contract);
}

#[test]
fn test_pledge_below_minimum_is_rejected() {
    let mut contract = configured(50, 3);

    assert_eq!(
        pledge(&mut contract, "cc", near(2)),
        Err(Error::DepositTooLow)
    );
    assert_eq!(contract.list_supporters().unwrap(), vec![]);
    assert_eq!(contract.get_stage().unwrap(), ProposalStage::Configured);
}

#[test]
fn test_pledge_before_configure_is_rejected() {
    let mut contract = initialized();

    assert_eq!(
        pledge(&mut contract, "cc", near(5)),
        Err(Error::NotConfigured)
    );
    assert_eq!(contract.list_supporters(), Err(Error::NotConfigured));
    assert_eq!(contract.is_fully_funded(), Err(Error::NotConfigured));
}

#[test]
fn test_repeat_pledges_are_separate_entries() {
    let mut contract = configured(50, 3);

    pledge(&mut contract, "cc", near(4)).unwrap();
    pledge(&mut contract, "cc", near(6)).unwrap();

    let amounts: Vec<_> = contract
        .list_supporters()
        .unwrap()
        .into_iter()
        .map(|s| s.amount)
        .collect();
    assert_eq!(amounts, vec![near(4), near(6)]);
    assert_eq!(contract.get_funding_total().unwrap(), U128(near(10).as_yoctonear()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_total_tracks_pledges(amounts in prop::collection::vec(3u128..20, 1..12)) {
        let mut contract = configured(1_000, 3);
        for amount in &amounts {
            pledge(&mut contract, "cc", near(*amount)).unwrap();
        }

        let expected: u128 = amounts.iter().sum();
        prop_assert_eq!(
            contract.get_funding_total().unwrap(),
            U128(near(expected).as_yoctonear())
        );
        prop_assert_eq!(contract.list_supporters().unwrap().len(), amounts.len());
        assert_proposal_invariants(&contract);
    }
}
