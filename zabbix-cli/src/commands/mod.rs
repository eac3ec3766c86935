pub mod analyze;
pub mod backup;
pub mod detect;
pub mod init;
pub mod rename;
pub mod rollback;
pub mod template;

// Init command
pub use init::run_init;

// Backup commands
pub use backup::{run_backup, run_list_backups};

// Rename / rollback commands
pub use rename::run_rename;
pub use rollback::run_rollback;

// Template commands
pub use template::handle_template_command;

// Detect commands
pub use detect::handle_detect_command;

// Analyze command
pub use analyze::run_analyze;
