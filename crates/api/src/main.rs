/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: Apache-2.0
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */
use clap::CommandFactory;
use eyre::WrapErr;
use hil::api::Api;
use hil::cfg::command_line::{Command, ConfigPaths, Options};
use hil::cfg::file::HilApiConfig;
use hil::logging::setup::setup_logging;

fn load_config(paths: &ConfigPaths) -> eyre::Result<HilApiConfig> {
    HilApiConfig::load(&paths.config_path, paths.site_config_path.as_deref())
        .wrap_err_with(|| format!("loading {}", paths.config_path.display()))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let options = Options::load();
    if options.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    setup_logging(options.debug, options.json_logs)?;

    let sub_cmd = match &options.sub_cmd {
        None => {
            return Ok(Options::command().print_long_help()?);
        }
        Some(s) => s,
    };
    match sub_cmd {
        Command::Migrate(paths) => {
            tracing::info!("Running migrations");
            let config = load_config(paths)?;
            // Connecting brings the schema up to date
            db::connect(&config.database_url, 1).await?;
        }
        Command::Populate(paths) => {
            let config = load_config(paths)?;
            let Some(vlans) = &config.network_allocator.vlans else {
                eyre::bail!("network_allocator.vlans is not configured");
            };
            let api = Api::from_config(&config).await?;
            let added = api.populate_pool(vlans).await?;
            let stats = api.pool_stats().await?;
            println!("added {added}, used {}, free {}", stats.used, stats.free);
        }
        Command::ApplyNetworking(paths) => {
            let config = load_config(paths)?;
            let api = Api::from_config(&config).await?;
            let report = api.apply_networking().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_success() {
                eyre::bail!("some switches still have pending networking actions");
            }
        }
        Command::Run(paths) => {
            // Everything besides loading the configuration belongs in hil::run
            let config = load_config(paths)?;
            let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = stop_tx.send(());
                }
            });
            hil::run(config, stop_rx).await?;
        }
    }
    Ok(())
}
