use crate::commands::{connect, load_config, runtime, CommandResult};
use coffeebot_db::{migrations, reset};

/// Empties every coffee table. Refuses to touch data unless `confirmed`.
pub fn run(confirmed: bool) -> CommandResult {
    if !confirmed {
        return CommandResult::failure(
            "reset",
            "confirmation_required",
            "reset deletes all preferences, orders and test users; rerun with --yes",
            7,
        );
    }

    let config = match load_config("reset") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("reset") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await.map_err(|message| ("db_connectivity", message, 4u8))?;
        let outcome = async {
            migrations::run_pending(&pool)
                .await
                .map_err(|error| ("migration", error.to_string(), 5u8))?;
            reset::clear_all(&pool).await.map_err(|error| ("reset", error.to_string(), 8u8))
        }
        .await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(deleted) => CommandResult::success(
            "reset",
            format!("deleted {deleted} rows from {} tables", reset::CLEARED_TABLES.len()),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("reset", error_class, message, exit_code)
        }
    }
}
