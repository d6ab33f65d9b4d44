//! Assignment runs: grouping, matching and persistence as one transaction.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use database::{assignment, Database, DatabaseError, RosterEntry, Tx};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::EngineError;
use crate::grouping::partition;
use crate::matching::{match_group, Pairing, DEFAULT_MAX_ATTEMPTS};
use crate::restriction::RestrictionSet;

/// Tunables for an assignment run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Shuffles tried per group before giving up.
    pub max_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Pairings created for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub label: String,
    pub pairings: Vec<Pairing>,
}

/// A group too small to produce assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGroup {
    pub label: String,
    pub members: Vec<String>,
}

/// Outcome of a committed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub groups: Vec<GroupSummary>,
    pub skipped: Vec<SkippedGroup>,
}

impl RunSummary {
    /// Number of groups written to the store.
    pub fn groups_created(&self) -> usize {
        self.groups.len()
    }

    /// Number of assignments written across all groups.
    pub fn total_assignments(&self) -> usize {
        self.groups.iter().map(|g| g.pairings.len()).sum()
    }

    /// Human-readable listing of the run, grouped by label.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Created {} group(s) with {} assignment(s).",
            self.groups_created(),
            self.total_assignments()
        );

        for group in &self.groups {
            let _ = write!(out, "\n\n{}:", group.label);
            for pairing in &group.pairings {
                let _ = write!(out, "\n  {} -> {}", pairing.giver, pairing.receiver);
            }
        }

        if !self.skipped.is_empty() {
            out.push_str("\n\nSkipped (fewer than 2 members):");
            for group in &self.skipped {
                let _ = write!(out, "\n  {}: {}", group.label, group.members.join(", "));
            }
        }

        out
    }
}

/// Runs grouping and matching over the roster and replaces the stored
/// groups, memberships and assignments.
///
/// Cloning is cheap and clones share the single-run guard.
#[derive(Clone)]
pub struct AssignmentEngine {
    db: Database,
    config: EngineConfig,
    run_guard: Arc<Mutex<()>>,
}

impl AssignmentEngine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self {
            db,
            config,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_defaults(db: Database) -> Self {
        Self::new(db, EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a full assignment over `roster` with OS randomness.
    ///
    /// Either every group is committed or nothing changes. A run started
    /// while another is in flight fails with [`EngineError::RunInProgress`].
    pub async fn run(
        &self,
        roster: &[RosterEntry],
        group_count: usize,
        restrictions: &RestrictionSet,
    ) -> Result<RunSummary, EngineError> {
        self.run_with_rng(roster, group_count, restrictions, &mut OsRng)
            .await
    }

    /// Same as [`run`](Self::run) with a caller-supplied generator.
    pub async fn run_with_rng<R>(
        &self,
        roster: &[RosterEntry],
        group_count: usize,
        restrictions: &RestrictionSet,
        rng: &mut R,
    ) -> Result<RunSummary, EngineError>
    where
        R: Rng + CryptoRng + Send,
    {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| EngineError::RunInProgress)?;

        info!(
            "Starting assignment run: {} participants, {} groups, {} restrictions",
            roster.len(),
            group_count,
            restrictions.len()
        );

        let mut tx = self.db.begin().await?;
        match self
            .write_run(&mut tx, roster, group_count, restrictions, rng)
            .await
        {
            Ok(summary) => {
                tx.commit().await.map_err(DatabaseError::from)?;
                info!(
                    "Assignment run committed: {} groups, {} assignments, {} skipped",
                    summary.groups_created(),
                    summary.total_assignments(),
                    summary.skipped.len()
                );
                Ok(summary)
            }
            Err(e) => {
                warn!("Assignment run failed, rolling back: {}", e);
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn write_run<R>(
        &self,
        tx: &mut Tx,
        roster: &[RosterEntry],
        group_count: usize,
        restrictions: &RestrictionSet,
        rng: &mut R,
    ) -> Result<RunSummary, EngineError>
    where
        R: Rng + CryptoRng + Send,
    {
        assignment::clear_assignment_data(tx).await?;

        let ids: HashMap<&str, i64> = roster.iter().map(|e| (e.name.as_str(), e.id)).collect();
        let resolve = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| EngineError::UnknownParticipant(name.to_string()))
        };

        let names: Vec<String> = roster.iter().map(|e| e.name.clone()).collect();
        let groups = partition(&names, group_count, rng)?;

        let mut summary = RunSummary::default();
        for (index, members) in groups.into_iter().enumerate() {
            let label = format!("Group {}", index + 1);

            if members.len() < 2 {
                warn!("{} has {} member(s), skipping", label, members.len());
                summary.skipped.push(SkippedGroup { label, members });
                continue;
            }

            let pairings = match_group(&label, &members, restrictions, self.config.max_attempts, rng)?;

            let group_id = assignment::insert_group(tx, &label).await?;
            for member in &members {
                assignment::insert_membership(tx, group_id, resolve(member)?).await?;
            }
            for pairing in &pairings {
                let giver = resolve(&pairing.giver)?;
                let receiver = resolve(&pairing.receiver)?;
                assignment::insert_assignment(tx, group_id, giver, receiver).await?;
            }

            info!("{}: {} assignments", label, pairings.len());
            summary.groups.push(GroupSummary { label, pairings });
        }

        Ok(summary)
    }
}
