use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use log::debug;
use typed_builder::TypedBuilder;

use cits_core::message::FleetReport;
use cits_core::mobility::{Position, Route};
use cits_core::node::NodeId;
use cits_core::time::TimeS;

/// TTL applied when this node is the authoritative source of an entry. The
/// vehicle re-announces every few seconds, so a short window is enough.
pub const LOCAL_TTL: TimeS = TimeS::new(4);

/// Observation window for an entry learned from elsewhere without a
/// freshness hint, before it is considered stale absent further updates.
pub const OBSERVATION_WINDOW: TimeS = TimeS::new(10);

/// One row of fleet knowledge: the last known state of a vehicle and when
/// that knowledge stops being trusted.
#[derive(Clone, Debug, TypedBuilder)]
pub struct FleetEntry {
    pub obu_id: NodeId,
    pub position: Position,
    pub originating_rsu: NodeId,
    pub route: Route,
    pub expiry: TimeS,
}

/// Soft-state table of known vehicles, keyed by OBU id. Entries self-expire
/// unless refreshed, which tolerates lost beacons and RSU handoff without
/// explicit leave messages. There is never more than one entry per vehicle.
#[derive(Debug)]
pub struct FleetTable {
    local: NodeId,
    entries: HashMap<NodeId, FleetEntry>,
}

impl FleetTable {
    pub fn new(local: NodeId) -> Self {
        Self {
            local,
            entries: HashMap::new(),
        }
    }

    /// Folds one reported row into the table.
    ///
    /// The expiry rule is the same on insert and update: when the reported
    /// originating RSU is this node, the entry is refreshed to a short local
    /// TTL; otherwise the remote RSU's freshness hint is adopted verbatim,
    /// falling back to the observation window when the report carries none.
    /// A report with a different originating RSU than the stored entry is an
    /// inter-RSU handoff and simply adopts the new origin.
    pub fn ingest(&mut self, report: FleetReport, now: TimeS) {
        let expiry = self.fresh_expiry(&report, now);
        match self.entries.get_mut(&report.obu_id) {
            Some(entry) => {
                if entry.originating_rsu != report.originating_rsu {
                    debug!(
                        "OBU {} handed off from RSU {} to RSU {}",
                        report.obu_id, entry.originating_rsu, report.originating_rsu
                    );
                    entry.originating_rsu = report.originating_rsu;
                }
                entry.position = report.position;
                entry.route = report.route;
                entry.expiry = expiry;
            }
            None => {
                self.entries.insert(
                    report.obu_id,
                    FleetEntry::builder()
                        .obu_id(report.obu_id)
                        .position(report.position)
                        .originating_rsu(report.originating_rsu)
                        .route(report.route)
                        .expiry(expiry)
                        .build(),
                );
            }
        }
    }

    fn fresh_expiry(&self, report: &FleetReport, now: TimeS) -> TimeS {
        if report.originating_rsu == self.local {
            now + LOCAL_TTL
        } else {
            report.expiry_hint.unwrap_or(now + OBSERVATION_WINDOW)
        }
    }

    /// Drops every entry whose expiry has passed. Returns how many were
    /// removed.
    pub fn prune(&mut self, now: TimeS) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expiry > now);
        before - self.entries.len()
    }

    pub fn get(&self, obu_id: &NodeId) -> Option<&FleetEntry> {
        self.entries.get(obu_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The table as wire rows, each carrying its stored expiry as the
    /// freshness hint for the receiving RSU.
    pub fn snapshot(&self) -> Vec<FleetReport> {
        self.entries
            .values()
            .map(|entry| FleetReport {
                obu_id: entry.obu_id,
                position: entry.position,
                originating_rsu: entry.originating_rsu,
                route: entry.route.clone(),
                expiry_hint: Some(entry.expiry),
            })
            .collect()
    }
}

/// The table is mutated by the business worker and the prune worker, and
/// read for dispatch; one lock serializes them all.
pub type SharedFleet = Arc<Mutex<FleetTable>>;

pub fn shared(table: FleetTable) -> SharedFleet {
    Arc::new(Mutex::new(table))
}

/// Locks the shared table, recovering the inner value if a holder panicked.
pub fn lock(fleet: &SharedFleet) -> std::sync::MutexGuard<'_, FleetTable> {
    match fleet.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use cits_testutils::report::fleet_report;

    use super::*;

    fn report(obu: u32, rsu: u32, hint: Option<TimeS>) -> FleetReport {
        fleet_report(obu, rsu, &[(0, 0), (4, 0)], hint)
    }

    #[test]
    fn first_local_report_gets_local_ttl() {
        let mut table = FleetTable::new(NodeId::from(1));
        let now = TimeS::new(100);
        table.ingest(report(7, 1, None), now);
        let entry = table.get(&NodeId::from(7)).unwrap();
        assert_eq!(entry.originating_rsu, NodeId::from(1));
        assert_eq!(entry.expiry, now + LOCAL_TTL);
    }

    #[test]
    fn remote_report_adopts_hint_verbatim() {
        let mut table = FleetTable::new(NodeId::from(1));
        let now = TimeS::new(100);
        table.ingest(report(7, 2, Some(TimeS::new(117))), now);
        assert_eq!(table.get(&NodeId::from(7)).unwrap().expiry, TimeS::new(117));
    }

    #[test]
    fn remote_report_without_hint_gets_observation_window() {
        let mut table = FleetTable::new(NodeId::from(1));
        let now = TimeS::new(100);
        table.ingest(report(7, 2, None), now);
        assert_eq!(
            table.get(&NodeId::from(7)).unwrap().expiry,
            now + OBSERVATION_WINDOW
        );
    }

    #[test]
    fn repeated_ingests_keep_one_entry_per_obu() {
        let mut table = FleetTable::new(NodeId::from(1));
        let now = TimeS::new(100);
        for _ in 0..5 {
            table.ingest(report(7, 1, None), now);
            table.ingest(report(7, 2, Some(TimeS::new(200))), now);
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn local_refresh_pins_short_ttl() {
        let mut table = FleetTable::new(NodeId::from(1));
        table.ingest(report(7, 1, None), TimeS::new(100));
        table.ingest(report(7, 1, None), TimeS::new(103));
        assert_eq!(
            table.get(&NodeId::from(7)).unwrap().expiry,
            TimeS::new(103) + LOCAL_TTL
        );
    }

    #[test]
    fn handoff_adopts_new_origin_and_its_rule() {
        let mut table = FleetTable::new(NodeId::from(1));
        let now = TimeS::new(100);
        table.ingest(report(7, 1, None), now);
        // Handoff to a remote RSU: origin changes, hint adopted verbatim.
        table.ingest(report(7, 2, Some(TimeS::new(150))), now);
        let entry = table.get(&NodeId::from(7)).unwrap();
        assert_eq!(entry.originating_rsu, NodeId::from(2));
        assert_eq!(entry.expiry, TimeS::new(150));
        // Handoff back to the local node: short TTL again.
        table.ingest(report(7, 1, None), TimeS::new(160));
        let entry = table.get(&NodeId::from(7)).unwrap();
        assert_eq!(entry.originating_rsu, NodeId::from(1));
        assert_eq!(entry.expiry, TimeS::new(160) + LOCAL_TTL);
    }

    #[test]
    fn prune_removes_at_expiry_instant() {
        let mut table = FleetTable::new(NodeId::from(1));
        table.ingest(report(7, 2, Some(TimeS::new(110))), TimeS::new(100));
        assert_eq!(table.prune(TimeS::new(109)), 0);
        assert_eq!(table.prune(TimeS::new(110)), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn snapshot_rows_carry_stored_expiry_as_hint() {
        let mut table = FleetTable::new(NodeId::from(1));
        table.ingest(report(7, 1, None), TimeS::new(100));
        let rows = table.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].expiry_hint, Some(TimeS::new(100) + LOCAL_TTL));
    }
}
