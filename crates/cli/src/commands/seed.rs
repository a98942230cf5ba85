use crate::commands::CommandResult;
use storefront_core::config::{AppConfig, LoadOptions};
use storefront_db::{connect_with_settings, migrations, DemoDataset};

pub fn run(force: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let existing = DemoDataset::existing_product_count(&pool)
            .await
            .map_err(|error| ("seed_precheck", error.to_string(), 5u8))?;

        // Refuse to mix fixtures into a populated catalog unless forced.
        if existing > 0 {
            if !force {
                pool.close().await;
                return Err((
                    "seed_precondition",
                    format!("catalog already has {existing} products; pass --force to seed anyway"),
                    6u8,
                ));
            }
            DemoDataset::clean(&pool)
                .await
                .map_err(|error| ("seed_cleanup", error.to_string(), 5u8))?;
        }

        let seed_result = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if !verification.all_present {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            let message = if failed_checks.is_empty() {
                "Some seed data failed to load".to_string()
            } else {
                format!("Seed verification failed for checks: {}", failed_checks.join(", "))
            };
            Err(("seed_verification", message, 6u8))
        } else {
            Ok(seed_result)
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => CommandResult::success(
            "seed",
            format!(
                "demo dataset loaded: {} products, {} orders, {} activity records",
                output.products_seeded, output.orders_seeded, output.activity_seeded,
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
