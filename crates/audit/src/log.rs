use closingdesk_core::{AppendOnlyLog, EngineError, EngineResult};

use crate::query::{AuditPage, AuditQuery};
use crate::record::{AuditRecord, UncommittedAuditRecord};

/// Append-only, gap-free sequence of audit records.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: AppendOnlyLog<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_sequence(&self) -> u64 {
        self.records.last().map(|r| r.sequence + 1).unwrap_or(1)
    }

    /// Assign sequence numbers without appending.
    ///
    /// Used to build a journal entry before the records become visible.
    pub fn sequence(&self, pending: Vec<UncommittedAuditRecord>) -> Vec<AuditRecord> {
        let start = self.next_sequence();
        pending
            .into_iter()
            .zip(start..)
            .map(|(record, seq)| AuditRecord::commit(seq, record))
            .collect()
    }

    /// Check that `records` continue the log exactly, without appending.
    pub fn check_continues(&self, records: &[AuditRecord]) -> EngineResult<()> {
        let mut expected = self.next_sequence();
        for record in records {
            if record.sequence != expected {
                return Err(EngineError::invariant(format!(
                    "audit sequence gap: expected {expected}, got {}",
                    record.sequence
                )));
            }
            expected += 1;
        }
        Ok(())
    }

    /// Append already-sequenced records; they must continue the log exactly.
    pub fn extend(&mut self, records: &[AuditRecord]) -> EngineResult<()> {
        self.check_continues(records)?;
        for record in records {
            self.records.append(record.clone());
        }
        Ok(())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AuditRecord> {
        self.records.iter()
    }

    pub fn query(&self, query: &AuditQuery) -> AuditPage {
        let matching: Vec<&AuditRecord> = self
            .records
            .iter()
            .rev()
            .filter(|r| query.filter.matches(r))
            .collect();

        let total = matching.len() as u64;
        let offset = query.pagination.offset as usize;
        let limit = query.pagination.limit as usize;
        let records: Vec<AuditRecord> = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        let has_more = (offset + records.len()) < total as usize;

        AuditPage {
            records,
            total,
            pagination: query.pagination,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{AuditFilter, Pagination};
    use crate::record::EntityType;
    use chrono::{Duration, Utc};
    use closingdesk_core::UserId;
    use serde_json::json;

    fn record(entity_type: EntityType, entity_id: &str, actor: &str) -> UncommittedAuditRecord {
        UncommittedAuditRecord {
            entity_type,
            entity_id: entity_id.to_string(),
            event: format!("{entity_type}.touched"),
            before: json!(null),
            after: json!({ "status": "draft" }),
            timestamp: Utc::now(),
            actor_id: UserId::parse(actor).unwrap(),
        }
    }

    fn log_with(records: Vec<UncommittedAuditRecord>) -> AuditLog {
        let mut log = AuditLog::new();
        let sequenced = log.sequence(records);
        log.extend(&sequenced).unwrap();
        log
    }

    #[test]
    fn sequences_are_gap_free_across_batches() {
        let mut log = log_with(vec![record(EntityType::Deal, "d1", "u1")]);
        let batch = log.sequence(vec![
            record(EntityType::Transaction, "1", "u1"),
            record(EntityType::TrustAccount, "1", "u1"),
        ]);
        log.extend(&batch).unwrap();

        let seqs: Vec<u64> = log.iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn extend_rejects_out_of_order_records() {
        let mut log = log_with(vec![record(EntityType::Deal, "d1", "u1")]);
        let stale = AuditRecord::commit(1, record(EntityType::Deal, "d1", "u1"));

        assert_eq!(log.extend(&[stale]).unwrap_err().kind(), "invariant_violation");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn check_continues_accepts_next_batch_only() {
        let log = log_with(vec![record(EntityType::Deal, "d1", "u1")]);
        let next = log.sequence(vec![record(EntityType::Deal, "d1", "u1")]);
        let gapped = AuditRecord::commit(3, record(EntityType::Deal, "d1", "u1"));

        assert!(log.check_continues(&next).is_ok());
        assert!(log.check_continues(&[gapped]).is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn query_filters_by_entity_and_actor_newest_first() {
        let log = log_with(vec![
            record(EntityType::Deal, "d1", "alice"),
            record(EntityType::Deal, "d2", "alice"),
            record(EntityType::Deal, "d1", "bob"),
        ]);

        let page = log.query(&AuditQuery {
            filter: AuditFilter::for_entity(EntityType::Deal, "d1"),
            pagination: Pagination::default(),
        });
        assert_eq!(page.total, 2);
        assert_eq!(page.records[0].sequence, 3);

        let page = log.query(&AuditQuery {
            filter: AuditFilter {
                actor_id: Some(UserId::parse("alice").unwrap()),
                ..AuditFilter::default()
            },
            pagination: Pagination::new(Some(1), Some(0)),
        });
        assert_eq!(page.total, 2);
        assert_eq!(page.records.len(), 1);
        assert!(page.has_more);
    }

    #[test]
    fn time_window_is_half_open() {
        let log = log_with(vec![record(EntityType::Condition, "c1", "u1")]);
        let at = log.iter().next().unwrap().timestamp;

        let inside = AuditFilter {
            from: Some(at),
            to: Some(at + Duration::seconds(1)),
            ..AuditFilter::default()
        };
        let outside = AuditFilter {
            to: Some(at),
            ..AuditFilter::default()
        };

        let q = |filter| AuditQuery {
            filter,
            pagination: Pagination::default(),
        };
        assert_eq!(log.query(&q(inside)).total, 1);
        assert_eq!(log.query(&q(outside)).total, 0);
    }
}
