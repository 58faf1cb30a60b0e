pub mod config;
pub mod engine;
pub mod folder;
pub mod ledger;
pub mod metrics;
pub mod monitor;
pub mod mover;
pub mod result;
pub mod revert;
pub mod rule;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, HistoryConfig, LogFormat,
};
pub use engine::SortingEngine;
pub use folder::{
    FolderError, FolderStore, IgnoreList, MonitoredFolder, NewFolder, SqliteFolderStore,
};
pub use ledger::{
    ActionFilter, ActionRecord, ActionStatus, ActionType, HistoryLedger, LedgerError, NewAction,
    SqliteHistoryLedger,
};
pub use monitor::{FolderMonitor, MonitorConfig, MonitorError};
pub use mover::{FileMover, FsMover, MoveOutcome, MoverConfig, MoverError};
pub use result::{ErrorCategory, OperationResult};
pub use revert::{RevertEngine, RevertError, RevertGuard};
pub use rule::{matches, FileStats, Rule, RuleCriteria, RuleError};
