// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use Commands::Counters;
use Commands::Log;
use anyhow::Result;
use clap::Parser;
use telemlab::cli::Cli;
use telemlab::cli::Commands;
use telemlab::config::Config;
use telemlab::config::Overrides;
use telemlab::logging::setup_tracing;
use telemlab::report::run_counters;
use telemlab::report::run_log;

fn main() -> Result<()> {
  setup_tracing()?;

  let Cli { command } = Cli::parse();
  let main_span = tracing::info_span!("telem");
  let _enter = main_span.enter();

  match command {
    Log {
      logfile,
      format,
      output,
    } => {
      tracing::info!("Parsing benchmark log {}", logfile.display());

      run_log(&logfile, format, &output)?;

      tracing::info!("Log parse complete.");
    }
    Counters {
      csvfile,
      comparison_vl,
      output_dir,
      export,
      summary,
    } => {
      tracing::info!("Parsing counter CSV {}", csvfile.display());

      let config = Config::load(Overrides {
        output_dir,
        comparison_vl,
      })?;

      run_counters(&csvfile, &config, export, summary)?;
    }
  }

  Ok(())
}
