// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

mod client;

use anyhow::Result;
use clap::Parser;
use client::SasClient;
use std::process::ExitCode;

/// Fetch a short-lived access link from a blobsas server and print it.
#[derive(Debug, Parser)]
#[command(name = "blobsas", version, about)]
struct Args {
    /// Blob to request a read-only link for. May contain `/`.
    #[arg(required_unless_present = "container")]
    filename: Option<String>,

    /// Request a read and list token for the whole container instead.
    #[arg(long, conflicts_with = "filename")]
    container: bool,

    /// Base URL of the server.
    #[arg(long, env = "SAS_BACKEND_URL", default_value = "http://localhost:80")]
    backend: String,
}

async fn run(args: Args) -> Result<()> {
    let client = SasClient::new(reqwest::Client::new(), args.backend);

    match args.filename {
        Some(filename) if !args.container => {
            let url = client.blob_url(&filename).await?;
            println!("Access link for \"{filename}\": ");
            println!("{url}");
        }
        _ => {
            let token = client.container_token().await?;
            println!("Access token for the container: ");
            println!("{token}");
        }
    }
    println!("\n↳ Valid for 10 minutes.");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error fetching SAS link: {err}");
            ExitCode::FAILURE
        }
    }
}
