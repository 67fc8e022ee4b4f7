use crate::commands::{connect, load_config, runtime, CommandResult};
use coffeebot_db::migrations;

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await.map_err(|message| ("db_connectivity", message, 4u8))?;
        let outcome = migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8));
        pool.close().await;
        outcome
    });

    match result {
        Ok(()) => CommandResult::success(
            "migrate",
            format!("applied pending migrations to `{}`", config.database.url),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
