use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one folder can be watched
/// - Mover buffer and collision suffix bounds are positive
/// - History default limit fits under the maximum
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.monitor.max_watches == 0 {
        return Err(invalid("monitor.max_watches must be at least 1"));
    }

    if config.mover.buffer_size == 0 {
        return Err(invalid("mover.buffer_size cannot be 0"));
    }
    if config.mover.max_collision_suffix == 0 {
        return Err(invalid("mover.max_collision_suffix cannot be 0"));
    }

    if config.history.default_limit <= 0 || config.history.max_limit <= 0 {
        return Err(invalid("history limits must be positive"));
    }
    if config.history.default_limit > config.history.max_limit {
        return Err(invalid(
            "history.default_limit cannot exceed history.max_limit",
        ));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
