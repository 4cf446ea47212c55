use crowdfund_common::testing::{account, emitted, emitted_names, near};
use crowdfund_common::{ContributionStatus, Error, Expense, ProjectStage};
use near_sdk::json_types::U128;
use near_sdk::serde_json;
use near_sdk::NearToken;
use proptest::prelude::*;

use crate::testutils::{call, configured, contribution, initialized, FACTORY, PROPOSAL};
use crate::ProjectContract;

const ZERO: NearToken = NearToken::from_yoctonear(0);

fn yocto(amount: NearToken) -> U128 {
    U128(amount.as_yoctonear())
}

fn assert_spent_matches_expenses(contract: &ProjectContract) {
    let funding = contract.get_project().unwrap().funding.unwrap();
    let sum = contract
        .get_expenses()
        .unwrap()
        .iter()
        .fold(ZERO, |acc, e: &Expense| acc.saturating_add(e.amount));
    assert_eq!(funding.spent, sum, "spent {} != sum of expenses {}", funding.spent, sum);
}

// ── initialize / configure ───────────────────────────────────────────

#[test]
fn test_initialize_records_factory_and_proposal() {
    let contract = initialized();

    assert_eq!(contract.get_factory().unwrap(), account(FACTORY));
    assert_eq!(contract.get_proposal().unwrap(), account(PROPOSAL));
    assert!(!contract.is_configured().unwrap());
    assert_eq!(contract.get_stage().unwrap(), ProjectStage::Initialized);
    assert_eq!(emitted_names(), vec!["project_initialized"]);
}

#[test]
fn test_initialize_is_one_shot() {
    let mut contract = configured();

    call("mallory", near(3), near(6));
    assert_eq!(
        contract.initialize(account("other")),
        Err(Error::AlreadyInitialized)
    );
    assert_eq!(contract.get_proposal().unwrap(), account(PROPOSAL));
}

#[test]
fn test_initialize_rejects_small_stake() {
    call(FACTORY, near(1), near(1));
    let mut contract = ProjectContract::default();

    assert_eq!(
        contract.initialize(account(PROPOSAL)),
        Err(Error::InsufficientStake)
    );
    assert_eq!(contract.get_project(), Err(Error::NotInitialized));
}

#[test]
fn test_mutators_before_configure_fail() {
    call("alice", near(1), near(3));
    let mut contract = ProjectContract::default();
    assert_eq!(contract.add_funds(), Err(Error::NotInitialized));

    let mut contract = initialized();
    call("alice", near(1), near(4));
    assert_eq!(contract.add_funds(), Err(Error::NotConfigured));
    assert_eq!(
        contract.add_expense("paint".into(), yocto(near(1)), None),
        Err(Error::NotConfigured)
    );
    assert_eq!(
        contract.add_contributor(
            account("alice"),
            contribution("t", 1, ContributionStatus::Assigned)
        ),
        Err(Error::NotConfigured)
    );
    assert_eq!(contract.get_remaining_budget(), Err(Error::NotConfigured));
    assert_eq!(contract.get_expenses(), Err(Error::NotConfigured));
}

#[test]
fn test_configure_seeds_budget_from_balance_above_reserve() {
    let mut contract = initialized();

    call("bob", ZERO, near(20));
    contract
        .configure("garden".to_string(), "beds".to_string())
        .unwrap();

    let record = contract.get_project().unwrap();
    let details = record.details.unwrap();
    assert_eq!(details.title, "garden");
    assert_eq!(details.owner, account("bob"));
    assert_eq!(record.funding.unwrap().total, near(17));
    assert_eq!(contract.get_remaining_budget().unwrap(), yocto(near(17)));
    assert_eq!(contract.get_stage().unwrap(), ProjectStage::Configured);

    let events = emitted();
    assert_eq!(events[0]["event"], "project_configured");
    assert_eq!(events[0]["data"]["owner"], "bob");
}

#[test]
fn test_configure_is_one_shot() {
    let mut contract = configured();

    call("mallory", ZERO, near(50));
    assert_eq!(
        contract.configure("mine now".to_string(), String::new()),
        Err(Error::ConfigurationLocked)
    );
    let record = contract.get_project().unwrap();
    assert_eq!(record.details.unwrap().owner, account("alice"));
    assert_eq!(record.funding.unwrap().total, ZERO);
}

// ── budget ───────────────────────────────────────────────────────────

#[test]
fn test_budget_overspend_then_top_up() {
    let mut contract = configured();
    assert_eq!(contract.get_remaining_budget().unwrap(), yocto(ZERO));

    call("alice", ZERO, near(3));
    assert_eq!(
        contract.add_expense("x".into(), yocto(near(4)), None),
        Err(Error::ExceedsBudget)
    );
    assert!(contract.get_expenses().unwrap().is_empty());

    contract
        .add_expense("x".into(), yocto(near(4)), Some(true))
        .unwrap();
    let expenses = contract.get_expenses().unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].label, "x");
    assert_eq!(expenses[0].amount, near(4));
    assert_eq!(
        contract.get_remaining_budget(),
        Err(Error::BudgetOverdrawn)
    );
    assert_spent_matches_expenses(&contract);

    call("bob", near(10), near(13));
    contract.add_funds().unwrap();
    assert_eq!(contract.get_remaining_budget().unwrap(), yocto(near(6)));
    assert_eq!(emitted_names(), vec!["funds_added"]);
    assert_spent_matches_expenses(&contract);
}

#[test]
fn test_expenses_accumulate_in_order() {
    let mut contract = configured();
    call("alice", near(10), near(13));
    contract.add_funds().unwrap();

    for (label, amount) in [("seeds", 2), ("soil", 3), ("tools", 5)] {
        contract
            .add_expense(label.into(), yocto(near(amount)), None)
            .unwrap();
    }

    let labels: Vec<_> = contract
        .get_expenses()
        .unwrap()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(labels, ["seeds", "soil", "tools"]);
    assert_eq!(contract.get_remaining_budget().unwrap(), yocto(ZERO));
    assert_eq!(
        contract.add_expense("one more".into(), U128(1), None),
        Err(Error::ExceedsBudget)
    );
    assert_eq!(contract.get_stage().unwrap(), ProjectStage::Active);
}

// ── contributors ─────────────────────────────────────────────────────

#[test]
fn test_contributor_upsert_last_write_wins() {
    let mut contract = configured();
    let dana = account("dana");

    call("alice", ZERO, near(3));
    contract
        .add_contributor(
            dana.clone(),
            contribution("weeding", 2, ContributionStatus::Assigned),
        )
        .unwrap();
    contract
        .add_contributor(
            dana.clone(),
            contribution("weeding", 2, ContributionStatus::Completed),
        )
        .unwrap();

    let contributors = contract.get_contributors().unwrap();
    assert_eq!(contributors.len(), 1);
    assert_eq!(contributors[0].status, ContributionStatus::Completed);
    // The key wins over whatever account the payload carried.
    assert_eq!(contributors[0].account, dana);
    assert_eq!(
        contract.get_contribution(dana).unwrap().map(|c| c.status),
        Some(ContributionStatus::Completed)
    );
    assert_eq!(contract.get_contribution(account("erin")).unwrap(), None);
    assert_eq!(contract.get_stage().unwrap(), ProjectStage::Active);

    let events = emitted();
    assert_eq!(events[1]["event"], "contributor_set");
    assert_eq!(events[1]["data"]["status"], "COMPLETED");
}

#[test]
fn test_contributors_listed_in_insertion_order() {
    let mut contract = configured();

    call("alice", ZERO, near(3));
    for (who, status) in [
        ("zed", ContributionStatus::Blocked),
        ("amy", ContributionStatus::InProgress),
        ("max", ContributionStatus::Assigned),
        ("zed", ContributionStatus::Completed),
    ] {
        contract
            .add_contributor(account(who), contribution("task", 1, status))
            .unwrap();
    }

    let accounts: Vec<_> = contract
        .get_contributors()
        .unwrap()
        .into_iter()
        .map(|c| c.account)
        .collect();
    assert_eq!(accounts, [account("zed"), account("amy"), account("max")]);
}

#[test]
fn test_contribution_status_wire_format() {
    let json = serde_json::to_string(&ContributionStatus::InProgress).unwrap();
    assert_eq!(json, "\"IN_PROGRESS\"");
}

// ── properties ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_remaining_is_total_minus_spent(
        budget in 1u128..50,
        expenses in prop::collection::vec(1u128..15, 0..10),
    ) {
        let mut contract = configured();
        call("alice", near(budget), near(3 + budget));
        contract.add_funds().unwrap();

        let mut spent = 0u128;
        for amount in expenses {
            let result = contract.add_expense("item".into(), yocto(near(amount)), None);
            if spent + amount > budget {
                prop_assert_eq!(result, Err(Error::ExceedsBudget));
            } else {
                prop_assert!(result.is_ok());
                spent += amount;
            }
        }

        assert_spent_matches_expenses(&contract);
        prop_assert_eq!(
            contract.get_project().unwrap().funding.unwrap().spent,
            near(spent)
        );
        prop_assert_eq!(
            contract.get_remaining_budget().unwrap(),
            yocto(near(budget - spent))
        );
    }
}
