//! Integration tests for the full engine pipeline.
//!
//! Tests: Engine operation → locks → aggregate → UnitOfWork → store (+ journal)
//!
//! Verifies:
//! - Deal lifecycle gating (conditions, funding, cascade)
//! - Balance invariant, idempotent completion and reversal symmetry
//! - One audit record per domain event, committed with the mutation
//! - Lock timeouts surface as retryable contention
//! - Journal replay reproduces committed state

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use chrono::{Days, Utc};

    use closingdesk_audit::{AuditFilter, AuditQuery, EntityType, Pagination};
    use closingdesk_core::{
        AggregateRoot, DealId, EngineError, Money, PropertyId, TransactionId, UserId,
    };
    use closingdesk_deals::{
        ConditionChange, ConditionStatus, ConditionType, Deal, DealStatus, Participant,
        ParticipantRole, ParticipantSnapshot, Participants,
    };
    use closingdesk_ledger::{
        AccountStatus, Posting, TransactionStatus, TransactionType, TrustAccount,
    };

    use crate::config::EngineConfig;
    use crate::engine::{
        AccountChanges, CompletionOutcome, ConditionSpec, DealChanges, Engine, NewAccount,
        NewDeal, NewTransaction,
    };
    use crate::store::{DealFilter, EngineStore, InMemoryStore, TransactionFilter, UnitOfWork};

    fn actor() -> UserId {
        UserId::parse("agent-7").unwrap()
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            lock_timeout: Duration::from_millis(50),
            contention_retries: 1,
            retry_backoff: Duration::from_millis(1),
            journal_path: None,
        }
    }

    fn engine() -> Engine {
        Engine::new(InMemoryStore::new(), &EngineConfig::default())
    }

    fn money(major: i64) -> Money {
        Money::from_major(major).unwrap()
    }

    fn person(id: &str, name: &str) -> Participant {
        Participant {
            user_id: UserId::parse(id).unwrap(),
            snapshot: ParticipantSnapshot {
                name: name.to_string(),
                email: None,
                phone: None,
                license_number: None,
                brokerage: None,
                law_firm: None,
            },
        }
    }

    fn principals() -> Participants {
        let mut participants = Participants::new();
        participants.insert(ParticipantRole::Buyer, person("buyer-1", "Bea Buyer"));
        participants.insert(ParticipantRole::Seller, person("seller-1", "Sam Seller"));
        participants
    }

    fn new_deal(price: i64, conditions: Vec<ConditionType>) -> NewDeal {
        NewDeal {
            property_id: PropertyId::parse("prop-12").unwrap(),
            offer_price: Some(money(price)),
            participants: principals(),
            conditions: conditions
                .into_iter()
                .map(|condition_type| ConditionSpec {
                    condition_type,
                    description: format!("{condition_type} clause"),
                    deadline: None,
                })
                .collect(),
            closing_date: Some(Utc::now().date_naive() + Days::new(30)),
            notes: None,
        }
    }

    fn open(engine: &Engine, number: &str) -> TrustAccount {
        engine
            .open_account(
                &actor(),
                NewAccount {
                    account_number: number.to_string(),
                    holder_name: "Closing Desk Trust".to_string(),
                },
            )
            .unwrap()
    }

    fn advance(engine: &Engine, deal: &Deal, statuses: &[DealStatus]) -> Deal {
        let mut current = deal.clone();
        for status in statuses {
            current = engine
                .change_status(&actor(), deal.id(), *status, None)
                .unwrap();
        }
        current
    }

    fn deposit(engine: &Engine, deal_id: &DealId, amount: i64, to: &TrustAccount) -> TransactionId {
        let tx = engine
            .create_transaction(
                &actor(),
                NewTransaction {
                    deal_id: deal_id.clone(),
                    amount: money(amount),
                    transaction_type: TransactionType::Deposit,
                    from_account: None,
                    to_account: Some(to.id_typed()),
                    description: None,
                },
            )
            .unwrap();
        tx.id_typed()
    }

    fn audit_total(engine: &Engine, filter: AuditFilter) -> u64 {
        engine
            .query_audit(&AuditQuery {
                filter,
                pagination: Pagination::default(),
            })
            .unwrap()
            .total
    }

    #[test]
    fn firm_is_gated_on_conditions_then_funds_post_once() {
        let engine = engine();
        let deal = engine
            .create_deal(&actor(), new_deal(500_000, vec![ConditionType::Financing]))
            .unwrap();
        let deal = advance(&engine, &deal, &[DealStatus::Submitted]);
        let financing = deal.conditions().iter().next().unwrap().id.clone();

        let err = engine
            .change_status(&actor(), deal.id(), DealStatus::Firm, None)
            .unwrap_err();
        assert_eq!(err.kind(), "condition_not_satisfied");
        assert_eq!(engine.get_deal(deal.id()).unwrap().status_history().len(), 2);

        engine
            .update_condition(
                &actor(),
                deal.id(),
                &financing,
                ConditionChange {
                    status: ConditionStatus::Satisfied,
                    description: None,
                },
            )
            .unwrap();
        let firm = engine
            .change_status(&actor(), deal.id(), DealStatus::Firm, None)
            .unwrap();
        assert_eq!(firm.status(), DealStatus::Firm);
        assert_eq!(firm.status_history().len(), 3);

        let account = open(&engine, "TRUST-0001");
        let tx = engine
            .create_transaction(
                &actor(),
                NewTransaction {
                    deal_id: deal.id().clone(),
                    amount: money(500_000),
                    transaction_type: TransactionType::Deposit,
                    from_account: None,
                    to_account: Some(account.id_typed()),
                    description: Some("deposit".to_string()),
                },
            )
            .unwrap();
        assert_eq!(tx.status(), TransactionStatus::Pending);
        assert_eq!(engine.get_account(account.id_typed()).unwrap().balance(), Money::ZERO);

        let outcome = engine.complete_transaction(&actor(), tx.id_typed()).unwrap();
        assert!(matches!(outcome, CompletionOutcome::Completed(_)));
        assert_eq!(
            engine.get_account(account.id_typed()).unwrap().balance(),
            money(500_000)
        );

        let again = engine.complete_transaction(&actor(), tx.id_typed()).unwrap();
        assert!(matches!(again, CompletionOutcome::AlreadyCompleted(_)));
        assert_eq!(again.transaction().status(), TransactionStatus::Completed);
        assert_eq!(
            engine.get_account(account.id_typed()).unwrap().balance(),
            money(500_000)
        );
    }

    #[test]
    fn concurrent_completion_posts_exactly_once() {
        let engine = Arc::new(engine());
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let account = open(&engine, "TRUST-0002");
        let tx_id = deposit(&engine, deal.id(), 1_000, &account);
        let tx_id = tx_id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || engine.complete_transaction(&actor(), tx_id))
            })
            .collect();
        let outcomes: Vec<CompletionOutcome> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();

        let completed = outcomes
            .iter()
            .filter(|o| matches!(o, CompletionOutcome::Completed(_)))
            .count();
        assert_eq!(completed, 1);
        assert_eq!(
            engine.get_account(account.id_typed()).unwrap().balance(),
            money(1_000)
        );
        assert_eq!(
            audit_total(
                &engine,
                AuditFilter {
                    event: Some("transaction.completed".to_string()),
                    ..AuditFilter::default()
                }
            ),
            1
        );
    }

    #[test]
    fn held_deal_lock_times_out_as_contention_and_changes_nothing() {
        let engine = Engine::new(InMemoryStore::new(), &fast_config());
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();

        let guard = engine.hold_deal_lock(deal.id()).unwrap();
        let err = engine
            .change_status(&actor(), deal.id(), DealStatus::Submitted, None)
            .unwrap_err();
        drop(guard);

        assert!(err.is_retryable());
        assert_eq!(err.kind(), "contention");
        assert_eq!(engine.get_deal(deal.id()).unwrap().status(), DealStatus::Draft);

        let submitted = engine
            .change_status(&actor(), deal.id(), DealStatus::Submitted, None)
            .unwrap();
        assert_eq!(submitted.status(), DealStatus::Submitted);
    }

    #[test]
    fn insufficient_funds_fails_the_transaction_without_touching_balances() {
        let engine = engine();
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let source = open(&engine, "TRUST-0003");
        let target = open(&engine, "TRUST-0004");
        let funding = deposit(&engine, deal.id(), 100, &source);
        engine.complete_transaction(&actor(), funding).unwrap();

        let transfer = engine
            .create_transaction(
                &actor(),
                NewTransaction {
                    deal_id: deal.id().clone(),
                    amount: money(250),
                    transaction_type: TransactionType::Payment,
                    from_account: Some(source.id_typed()),
                    to_account: Some(target.id_typed()),
                    description: None,
                },
            )
            .unwrap();

        let outcome = engine
            .complete_transaction(&actor(), transfer.id_typed())
            .unwrap();
        let CompletionOutcome::Failed {
            transaction,
            reason,
        } = outcome
        else {
            panic!("expected a failed completion");
        };

        assert_eq!(reason.kind(), "insufficient_funds");
        assert_eq!(transaction.status(), TransactionStatus::Failed);
        assert!(transaction.failure_reason().is_some());
        assert_eq!(engine.get_account(source.id_typed()).unwrap().balance(), money(100));
        assert_eq!(engine.get_account(target.id_typed()).unwrap().balance(), Money::ZERO);

        let err = engine
            .complete_transaction(&actor(), transfer.id_typed())
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn complete_then_reverse_restores_balances() {
        let engine = engine();
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let a1 = open(&engine, "TRUST-0005");
        let a2 = open(&engine, "TRUST-0006");
        let funding = deposit(&engine, deal.id(), 700, &a1);
        engine.complete_transaction(&actor(), funding).unwrap();

        let transfer = engine
            .create_transaction(
                &actor(),
                NewTransaction {
                    deal_id: deal.id().clone(),
                    amount: money(300),
                    transaction_type: TransactionType::Commission,
                    from_account: Some(a1.id_typed()),
                    to_account: Some(a2.id_typed()),
                    description: None,
                },
            )
            .unwrap();
        engine.complete_transaction(&actor(), transfer.id_typed()).unwrap();
        assert_eq!(engine.get_account(a1.id_typed()).unwrap().balance(), money(400));
        assert_eq!(engine.get_account(a2.id_typed()).unwrap().balance(), money(300));

        let reversed = engine
            .reverse_transaction(&actor(), transfer.id_typed(), Some("keyed twice".to_string()))
            .unwrap();
        assert_eq!(reversed.status(), TransactionStatus::Reversed);
        assert_eq!(engine.get_account(a1.id_typed()).unwrap().balance(), money(700));
        assert_eq!(engine.get_account(a2.id_typed()).unwrap().balance(), Money::ZERO);

        // Reversing again is a no-op.
        engine.reverse_transaction(&actor(), transfer.id_typed(), None).unwrap();
        assert_eq!(engine.get_account(a1.id_typed()).unwrap().balance(), money(700));

        for account in [&a1, &a2] {
            let report = engine.reconcile_account(account.id_typed()).unwrap();
            assert!(report.balanced, "{report:?}");
        }
    }

    #[test]
    fn reversal_that_would_overdraw_is_rejected() {
        let engine = engine();
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let a1 = open(&engine, "TRUST-0007");
        let a2 = open(&engine, "TRUST-0008");
        let funding = deposit(&engine, deal.id(), 500, &a1);
        let funding = funding;
        engine.complete_transaction(&actor(), funding).unwrap();

        let transfer = engine
            .create_transaction(
                &actor(),
                NewTransaction {
                    deal_id: deal.id().clone(),
                    amount: money(500),
                    transaction_type: TransactionType::Payment,
                    from_account: Some(a1.id_typed()),
                    to_account: Some(a2.id_typed()),
                    description: None,
                },
            )
            .unwrap();
        engine.complete_transaction(&actor(), transfer.id_typed()).unwrap();

        // a1 is now empty; undoing the deposit would take it negative.
        let err = engine
            .reverse_transaction(&actor(), funding, None)
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_funds");
        assert_eq!(
            engine.get_transaction(funding).unwrap().status(),
            TransactionStatus::Completed
        );
    }

    #[test]
    fn failed_condition_cascades_conditional_deal_to_cancelled() {
        let engine = engine();
        let deal = engine
            .create_deal(
                &actor(),
                new_deal(1_000, vec![ConditionType::Inspection, ConditionType::Appraisal]),
            )
            .unwrap();
        let deal = advance(&engine, &deal, &[DealStatus::Submitted, DealStatus::Conditional]);
        let inspection = deal.conditions().iter().next().unwrap().id.clone();

        let after = engine
            .update_condition(
                &actor(),
                deal.id(),
                &inspection,
                ConditionChange {
                    status: ConditionStatus::Failed,
                    description: None,
                },
            )
            .unwrap();

        assert_eq!(after.status(), DealStatus::Cancelled);
        let last = after.status_history().last().unwrap();
        assert_eq!(
            last.note.as_deref(),
            Some(format!("condition failed: {inspection}").as_str())
        );
        assert_eq!(
            audit_total(&engine, AuditFilter::for_entity(EntityType::Condition, inspection.as_str())),
            1
        );
        assert_eq!(
            audit_total(
                &engine,
                AuditFilter {
                    event: Some("deal.status_changed".to_string()),
                    entity_id: Some(deal.id().to_string()),
                    ..AuditFilter::default()
                }
            ),
            3
        );
    }

    #[test]
    fn completing_a_deal_requires_full_funding() {
        let engine = engine();
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let deal = advance(
            &engine,
            &deal,
            &[DealStatus::Submitted, DealStatus::Conditional, DealStatus::Closing],
        );
        assert_eq!(deal.status(), DealStatus::Closing);

        let account = open(&engine, "TRUST-0009");
        let partial = deposit(&engine, deal.id(), 600, &account);
        engine.complete_transaction(&actor(), partial).unwrap();

        let err = engine
            .change_status(&actor(), deal.id(), DealStatus::Completed, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::IncompleteFunding { .. }));

        let rest = deposit(&engine, deal.id(), 400, &account);
        engine.complete_transaction(&actor(), rest).unwrap();
        let completed = engine
            .change_status(&actor(), deal.id(), DealStatus::Completed, None)
            .unwrap();
        assert_eq!(completed.status(), DealStatus::Completed);

        let err = engine
            .create_transaction(
                &actor(),
                NewTransaction {
                    deal_id: deal.id().clone(),
                    amount: money(10),
                    transaction_type: TransactionType::Deposit,
                    from_account: None,
                    to_account: Some(account.id_typed()),
                    description: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "operation_not_permitted");

        let refund = engine.create_transaction(
            &actor(),
            NewTransaction {
                deal_id: deal.id().clone(),
                amount: money(10),
                transaction_type: TransactionType::Refund,
                from_account: Some(account.id_typed()),
                to_account: None,
                description: None,
            },
        );
        assert!(refund.is_ok());
    }

    #[test]
    fn frozen_account_accepts_credits_but_not_debits() {
        let engine = engine();
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let account = open(&engine, "TRUST-0010");
        let funding = deposit(&engine, deal.id(), 100, &account);
        engine.complete_transaction(&actor(), funding).unwrap();

        let frozen = engine
            .update_account(
                &actor(),
                account.id_typed(),
                AccountChanges {
                    holder_name: None,
                    status: Some(AccountStatus::Frozen),
                },
            )
            .unwrap();
        assert_eq!(frozen.status(), AccountStatus::Frozen);

        let credit = deposit(&engine, deal.id(), 50, &account);
        let outcome = engine
            .complete_transaction(&actor(), credit)
            .unwrap();
        assert!(matches!(outcome, CompletionOutcome::Completed(_)));

        let debit = engine
            .create_transaction(
                &actor(),
                NewTransaction {
                    deal_id: deal.id().clone(),
                    amount: money(10),
                    transaction_type: TransactionType::Refund,
                    from_account: Some(account.id_typed()),
                    to_account: None,
                    description: None,
                },
            )
            .unwrap();
        let outcome = engine
            .complete_transaction(&actor(), debit.id_typed())
            .unwrap();
        let CompletionOutcome::Failed { reason, .. } = outcome else {
            panic!("expected a failed completion");
        };
        assert_eq!(reason.kind(), "account_frozen");
        assert_eq!(engine.get_account(account.id_typed()).unwrap().balance(), money(150));
    }

    #[test]
    fn duplicate_account_number_is_rejected() {
        let engine = engine();
        open(&engine, "TRUST-0011");

        let err = engine
            .open_account(
                &actor(),
                NewAccount {
                    account_number: "TRUST-0011".to_string(),
                    holder_name: "Someone Else".to_string(),
                },
            )
            .unwrap_err();

        assert_eq!(err, EngineError::validation("account_number", "account number TRUST-0011 is already in use"));
        assert_eq!(engine.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn draft_deletion_requires_no_transactions() {
        let engine = engine();
        let empty = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        engine.delete_deal(&actor(), empty.id()).unwrap();
        assert_eq!(
            engine.get_deal(empty.id()).unwrap_err().kind(),
            "not_found"
        );

        let funded = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let account = open(&engine, "TRUST-0012");
        deposit(&engine, funded.id(), 10, &account);
        let err = engine.delete_deal(&actor(), funded.id()).unwrap_err();
        assert_eq!(err.kind(), "operation_not_permitted");

        assert_eq!(
            audit_total(
                &engine,
                AuditFilter {
                    event: Some("deal.deleted".to_string()),
                    ..AuditFilter::default()
                }
            ),
            1
        );
    }

    #[test]
    fn amendment_resnapshots_participants_and_locks_price_after_firm() {
        let engine = engine();
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        assert_eq!(deal.snapshot_version(), 1);

        let mut participants = principals();
        participants.insert(ParticipantRole::BuyerAgent, person("agent-2", "Ada Agent"));
        let amended = engine
            .amend_deal(
                &actor(),
                deal.id(),
                DealChanges {
                    offer_price: Some(money(1_100)),
                    participants: Some(participants),
                    ..DealChanges::default()
                },
            )
            .unwrap();
        assert_eq!(amended.snapshot_version(), 2);
        assert_eq!(amended.offer_price(), Some(money(1_100)));

        advance(&engine, &deal, &[DealStatus::Submitted, DealStatus::Firm]);
        let err = engine
            .amend_deal(
                &actor(),
                deal.id(),
                DealChanges {
                    offer_price: Some(money(900)),
                    ..DealChanges::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "operation_not_permitted");
    }

    #[test]
    fn every_event_has_exactly_one_audit_record() {
        let engine = engine();
        let deal = engine
            .create_deal(&actor(), new_deal(1_000, vec![ConditionType::Financing]))
            .unwrap();
        let deal = advance(&engine, &deal, &[DealStatus::Submitted]);
        engine
            .add_condition(
                &actor(),
                deal.id(),
                ConditionSpec {
                    condition_type: ConditionType::Other,
                    description: "survey".to_string(),
                    deadline: None,
                },
            )
            .unwrap();
        let account = open(&engine, "TRUST-0013");
        let tx = deposit(&engine, deal.id(), 100, &account);
        engine.complete_transaction(&actor(), tx).unwrap();

        // created, submitted, condition added, account opened, tx created, tx completed
        assert_eq!(audit_total(&engine, AuditFilter::default()), 6);

        // Rejections leave no record.
        let _ = engine.change_status(&actor(), deal.id(), DealStatus::Completed, None);
        assert_eq!(audit_total(&engine, AuditFilter::default()), 6);

        let completed = engine
            .query_audit(&AuditQuery {
                filter: AuditFilter::for_entity(EntityType::Transaction, tx.to_string()),
                pagination: Pagination::default(),
            })
            .unwrap();
        let newest = &completed.records[0];
        assert_eq!(newest.event, "transaction.completed");
        assert_eq!(newest.actor_id, actor());
        assert_eq!(newest.before["accounts"][0]["balance"], "0.00");
        assert_eq!(newest.after["accounts"][0]["balance"], "100.00");
    }

    #[test]
    fn listing_filters_and_ordering() {
        let engine = engine();
        let first = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let second = engine.create_deal(&actor(), new_deal(2_000, vec![])).unwrap();
        advance(&engine, &second, &[DealStatus::Submitted]);

        let drafts = engine
            .list_deals(&DealFilter {
                status: Some(DealStatus::Draft),
                property_id: None,
            })
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id(), first.id());

        let account = open(&engine, "TRUST-0014");
        let older = deposit(&engine, first.id(), 1, &account);
        let newer = deposit(&engine, first.id(), 2, &account);
        let listed = engine
            .list_transactions(&TransactionFilter::for_deal(first.id().clone()))
            .unwrap();
        let ids: Vec<TransactionId> = listed.iter().map(|t| t.id_typed()).collect();
        assert_eq!(ids, vec![newer, older]);
        assert!(engine.deal_transactions(second.id()).unwrap().is_empty());
    }

    #[test]
    fn journal_replay_restores_state_and_id_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            journal_path: Some(dir.path().join("closingdesk.journal")),
            ..EngineConfig::default()
        };

        let (deal_id, account_id, audit_records) = {
            let engine = Engine::from_config(&config).unwrap();
            let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
            let account = open(&engine, "TRUST-0015");
            let tx = deposit(&engine, deal.id(), 250, &account);
            engine.complete_transaction(&actor(), tx).unwrap();
            (
                deal.id().clone(),
                account.id_typed(),
                audit_total(&engine, AuditFilter::default()),
            )
        };

        let engine = Engine::from_config(&config).unwrap();
        assert_eq!(engine.get_deal(&deal_id).unwrap().status(), DealStatus::Draft);
        assert_eq!(engine.get_account(account_id).unwrap().balance(), money(250));
        assert_eq!(audit_total(&engine, AuditFilter::default()), audit_records);
        assert!(engine.reconcile_account(account_id).unwrap().balanced);

        let next = engine.store().next_transaction_id();
        assert_eq!(next.get(), 2);
    }

    #[test]
    fn drifted_balance_fails_reconciliation() {
        let engine = engine();
        let deal = engine.create_deal(&actor(), new_deal(1_000, vec![])).unwrap();
        let account = open(&engine, "TRUST-0016");
        let tx = deposit(&engine, deal.id(), 200, &account);
        engine.complete_transaction(&actor(), tx).unwrap();

        // Balance moved without a completed transaction behind it.
        let current = engine.get_account(account.id_typed()).unwrap();
        let mut drifted = current.clone();
        drifted
            .post(&Posting::credit(account.id_typed(), money(50)), Utc::now())
            .unwrap();
        let mut unit = UnitOfWork::new();
        unit.put_account(drifted, current.version());
        engine.store().commit(unit).unwrap();

        let err = engine.reconcile_account(account.id_typed()).unwrap_err();
        assert_eq!(err.kind(), "invariant_violation");
        assert!(err.to_string().contains("250.00"), "{err}");
        assert!(err.to_string().contains("200.00"), "{err}");
        assert_eq!(engine.get_account(account.id_typed()).unwrap().balance(), money(250));
    }
}
