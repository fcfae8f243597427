//! # COBie Graph
//!
//! Incremental alignment of COBie source rows into a typed element graph.
//!
//! Provides the repository and change-tracker collaborators (Neo4j, in-memory
//! and SQLite implementations), the alignment engine and the connector job
//! that ties source reading, schema synthesis and alignment together.

pub mod client;
pub mod constraints;
pub mod error;
pub mod job;
pub mod memory;
pub mod neo4j;
pub mod repository;
pub mod sync;
pub mod tracker;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use constraints::initialize_constraints;
pub use error::{RepositoryError, RepositoryResult, SyncError, TrackerError, TrackerResult};
pub use job::{job_subject_name, run_job, JobOptions, JobReport};
pub use memory::{MemoryRepository, WriteStats};
pub use neo4j::Neo4jRepository;
pub use repository::{ElementProps, RelatedElement, Repository};
pub use sync::{AlignmentEngine, SyncResult, SyncSession};
pub use tracker::{ChangeResult, ChangeTracker, SourceItem, SqliteChangeTracker};
