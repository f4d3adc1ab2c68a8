use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use bridge_runtime::schema::{responses_schema, snapshot_schema};
use bridge_runtime::{Response, Status};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Controller-side tooling for the simulation bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send command lines to a running bridge server
    Send(SendArgs),
    /// Print the JSON Schema of an artifact the bridge writes
    Schema {
        #[arg(value_enum)]
        artifact: Artifact,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Artifact {
    Responses,
    Snapshot,
}

#[derive(clap::Args, Debug)]
struct SendArgs {
    /// Server address
    #[arg(long, default_value = "127.0.0.1:41101")]
    addr: SocketAddr,

    /// Seconds to wait for each response
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Print the raw JSON response instead of the message
    #[arg(long)]
    json: bool,

    /// Command lines to send, e.g. "walk north" "status"
    #[arg(required = true)]
    commands: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Send(args) => send(&args),
        Command::Schema { artifact } => print_schema(artifact).map(|()| true),
    };
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("bridge_send: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn print_schema(artifact: Artifact) -> Result<()> {
    let schema = match artifact {
        Artifact::Responses => responses_schema(),
        Artifact::Snapshot => snapshot_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Returns whether every command succeeded.
fn send(args: &SendArgs) -> Result<bool> {
    let stream = TcpStream::connect_timeout(&args.addr, Duration::from_secs(args.timeout))
        .with_context(|| format!("connecting to {}", args.addr))?;
    stream.set_read_timeout(Some(Duration::from_secs(args.timeout)))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let mut all_ok = true;
    let mut line = String::new();
    for command in &args.commands {
        writeln!(writer, "{command}").context("sending command")?;
        writer.flush()?;

        line.clear();
        let read = reader.read_line(&mut line).context("waiting for response")?;
        if read == 0 {
            anyhow::bail!("server closed the connection");
        }
        let response: Response =
            serde_json::from_str(line.trim()).context("decoding response")?;
        all_ok &= response.status != Status::Error;

        if args.json {
            println!("{}", line.trim());
        } else {
            println!("[{}] {:?}: {}", response.id, response.status, response.message);
        }
    }
    Ok(all_ok)
}
