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
use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser)]
#[clap(name = "hil-api")]
pub struct Options {
    #[clap(long, default_value = "false", help = "Print version number and exit")]
    pub version: bool,

    #[clap(short, long, action = ArgAction::Count)]
    pub debug: u8,

    #[clap(long, default_value = "false", help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[clap(subcommand)]
    pub sub_cmd: Option<Command>,
}

#[derive(Parser)]
pub enum Command {
    #[clap(about = "Performs database migrations")]
    Migrate(ConfigPaths),

    #[clap(about = "Adds the configured VLANs to the network identifier pool")]
    Populate(ConfigPaths),

    #[clap(about = "Applies all pending networking actions once and exits")]
    ApplyNetworking(ConfigPaths),

    #[clap(about = "Run the API service")]
    Run(Box<ConfigPaths>),
}

#[derive(Parser, Debug)]
pub struct ConfigPaths {
    /// Path to the configuration file
    /// The contents of this configuration file can be patched by providing
    /// site specific configuration overrides via an additional config file at
    /// `site-config-path`.
    /// Additionally all configuration file contents can be overridden using
    /// environmental variables that are prefixed with `HIL_API_`.
    /// E.g. an environmental variable with the name `HIL_API_DATABASE_URL`
    /// will take precedence over the field `database_url` in the site specific
    /// configuration, and `HIL_API_RECONCILER__INTERVAL` over `interval` in the
    /// `[reconciler]` section.
    #[clap(long)]
    pub config_path: PathBuf,
    /// Path to the configuration file which contains per-site overwrites
    #[clap(long)]
    pub site_config_path: Option<PathBuf>,
}

impl Options {
    pub fn load() -> Self {
        Self::parse()
    }
}
