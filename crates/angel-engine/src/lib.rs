//! Assignment engine for the Secret Angel organizer.
//!
//! This crate turns a roster of registered participants into gift groups
//! and giver/receiver assignments:
//!
//! - [`shuffle`] - uniform permutation from a cryptographically secure source
//! - [`partition`] - split participants into N near-equal groups
//! - [`match_group`] - cyclic giver/receiver pairing honoring restrictions
//! - [`parse_restrictions`] - admin-authored restriction text
//! - [`AssignmentEngine`] - runs all of the above and persists the result
//!   in one transaction
//!
//! # Example
//!
//! ```no_run
//! use angel_engine::{parse_restrictions, AssignmentEngine, RestrictionSet};
//! use database::{participant, Database};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:angel.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let roster = participant::roster(db.pool()).await?;
//! let names: Vec<&str> = roster.iter().map(|e| e.name.as_str()).collect();
//! let restrictions: RestrictionSet = parse_restrictions("Alice, Bob", &names)?
//!     .into_iter()
//!     .collect();
//!
//! let engine = AssignmentEngine::with_defaults(db);
//! let summary = engine.run(&roster, 2, &restrictions).await?;
//! println!("{}", summary.render());
//! # Ok(())
//! # }
//! ```

mod error;
mod grouping;
mod matching;
mod orchestrator;
mod restriction;
mod shuffle;

pub use error::EngineError;
pub use grouping::partition;
pub use matching::{match_group, Pairing, DEFAULT_MAX_ATTEMPTS};
pub use orchestrator::{AssignmentEngine, EngineConfig, GroupSummary, RunSummary, SkippedGroup};
pub use restriction::{parse_restrictions, Restriction, RestrictionParseError, RestrictionSet};
pub use shuffle::shuffle;
