use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use types::{
    AutofillEnvelope, AutofillResult, CapOverride, CohortId, DayRecord, Instance, Placement,
    PlacementId,
};
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("cohort {0} already has an auto-fill in flight")]
    CohortBusy(CohortId),
    #[error("snapshot taken at revision {expected} is stale, store is at {found}")]
    StaleSnapshot { expected: u64, found: u64 },
    #[error("cohort {0} is not part of the instance")]
    UnknownCohort(CohortId),
}

/// A request to auto-fill one cohort against the live plan.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutofillOrder {
    pub cohort_id: CohortId,
    #[serde(default)]
    pub pinned: Vec<PlacementId>,
    #[serde(default)]
    pub cap_override: Option<CapOverride>,
    #[serde(default)]
    pub plan_from: Option<NaiveDate>,
}

impl AutofillOrder {
    pub fn new(cohort_id: impl Into<CohortId>) -> Self {
        Self {
            cohort_id: cohort_id.into(),
            pinned: vec![],
            cap_override: None,
            plan_from: None,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    instance: Instance,
    placements: Vec<Placement>,
    day_records: Vec<DayRecord>,
    revision: u64,
}

/// Releases the cohort when the checkout that holds it goes away.
#[derive(Debug)]
struct CohortGuard {
    cohort: CohortId,
    busy: Arc<Mutex<HashSet<CohortId>>>,
}

impl Drop for CohortGuard {
    fn drop(&mut self) {
        self.busy.lock().remove(&self.cohort);
        debug!(cohort = %self.cohort, "cohort released");
    }
}

/// A snapshot handed to a planner together with the revision it was taken at.
#[derive(Debug)]
pub struct Checkout {
    envelope: AutofillEnvelope,
    revision: u64,
    _guard: CohortGuard,
}

impl Checkout {
    pub fn envelope(&self) -> &AutofillEnvelope {
        &self.envelope
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Live plan with optimistic, all-or-nothing commits.
#[derive(Debug, Default)]
pub struct PlanStore {
    state: RwLock<State>,
    busy: Arc<Mutex<HashSet<CohortId>>>,
}

impl PlanStore {
    pub fn new(instance: Instance) -> Self {
        Self::with_plan(instance, vec![], vec![])
    }

    pub fn with_plan(
        instance: Instance,
        placements: Vec<Placement>,
        day_records: Vec<DayRecord>,
    ) -> Self {
        Self {
            state: RwLock::new(State {
                instance,
                placements,
                day_records,
                revision: 0,
            }),
            busy: Default::default(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    pub fn placements(&self) -> Vec<Placement> {
        self.state.read().placements.clone()
    }

    pub fn day_records(&self) -> Vec<DayRecord> {
        self.state.read().day_records.clone()
    }

    /// Snapshots the plan for `order`, reserving its cohort until the checkout is dropped.
    pub fn checkout(&self, order: AutofillOrder) -> Result<Checkout, StoreError> {
        let state = self.state.read();
        if state.instance.cohort(&order.cohort_id).is_none() {
            return Err(StoreError::UnknownCohort(order.cohort_id));
        }
        if !self.busy.lock().insert(order.cohort_id.clone()) {
            return Err(StoreError::CohortBusy(order.cohort_id));
        }
        let guard = CohortGuard {
            cohort: order.cohort_id.clone(),
            busy: self.busy.clone(),
        };
        debug!(cohort = %order.cohort_id, revision = state.revision, "checked out snapshot");
        Ok(Checkout {
            envelope: AutofillEnvelope {
                instance: state.instance.clone(),
                placements: state.placements.clone(),
                day_records: state.day_records.clone(),
                cohort_id: order.cohort_id,
                pinned: order.pinned,
                cap_override: order.cap_override,
                plan_from: order.plan_from,
            },
            revision: state.revision,
            _guard: guard,
        })
    }

    /// Applies `result` iff nothing was written since the checkout.
    pub fn commit(&self, checkout: Checkout, result: &AutofillResult) -> Result<u64, StoreError> {
        let mut state = self.state.write();
        if state.revision != checkout.revision {
            return Err(StoreError::StaleSnapshot {
                expected: checkout.revision,
                found: state.revision,
            });
        }
        let changed = !(result.added.is_empty()
            && result.released.is_empty()
            && result.deleted.is_empty()
            && result.day_records == state.day_records);
        if changed {
            state.placements = result.placements.clone();
            state.day_records = result.day_records.clone();
            state.revision += 1;
        }
        info!(
            cohort = %checkout.envelope.cohort_id,
            revision = state.revision,
            changed,
            "auto-fill committed"
        );
        Ok(state.revision)
    }

    /// Applies an outside change, invalidating every open checkout.
    pub fn edit<R>(
        &self,
        f: impl FnOnce(&mut Instance, &mut Vec<Placement>, &mut Vec<DayRecord>) -> R,
    ) -> R {
        let mut state = self.state.write();
        let State {
            instance,
            placements,
            day_records,
            revision,
        } = &mut *state;
        let out = f(instance, placements, day_records);
        *revision += 1;
        out
    }
}
