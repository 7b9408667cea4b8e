//! Validated runtime configuration built from the parsed CLI.

use std::time::Duration;

use dispatcher::Affinity;
use middleware::Verbosity;
use newsfeed_bot::ControllerConfig;
use newsfeed_core::{BotError, Chat, LogConfig};

use crate::cli::{Cli, Commands};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub log: LogConfig,
    pub controller: ControllerConfig,
    pub workers: usize,
    pub queue_capacity: usize,
    pub affinity: Affinity,
    /// Origin assigned to every console line.
    pub console_chat: Chat,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let Commands::Run(args) = &cli.command;

        let admin_ids = args
            .admin_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        Self {
            log: LogConfig {
                json: cli.json_logs,
                debug: cli.debug,
                file: cli.log_file.clone(),
            },
            controller: ControllerConfig {
                admin_ids,
                auth_token: args.auth_token.clone(),
                handler_timeout: Duration::from_secs(args.timeout_secs),
                verbosity: Verbosity::from_debug(cli.debug),
            },
            workers: args.workers,
            queue_capacity: args.queue_capacity,
            affinity: args.affinity,
            console_chat: Chat {
                id: args.chat_id.clone(),
                username: args.username.clone(),
            },
        }
    }

    pub fn validate(&self) -> Result<(), BotError> {
        if self.workers == 0 {
            return Err(BotError::Config("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(BotError::Config(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.controller.handler_timeout.is_zero() {
            return Err(BotError::Config("timeout must be positive".to_string()));
        }
        if self.controller.auth_token.trim().is_empty() {
            return Err(BotError::Config("auth token must not be empty".to_string()));
        }
        if self.console_chat.id.is_empty() {
            return Err(BotError::Config("console chat id must not be empty".to_string()));
        }
        Ok(())
    }
}
