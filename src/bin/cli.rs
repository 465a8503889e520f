//! arbordb CLI Client
//!
//! One-shot client for the line protocol: sends a single command and
//! prints the single response line.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// arbordb CLI
#[derive(Parser, Debug)]
#[command(name = "arbordb-cli")]
#[command(about = "CLI for the arbordb key-value store")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4000")]
    server: String,

    /// Connection and read timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query a name
    Get {
        /// The name to look up
        name: String,
    },

    /// Add a name/value pair
    Add {
        /// The name to add
        name: String,

        /// The value to store
        value: String,
    },

    /// Remove a name
    Del {
        /// The name to remove
        name: String,
    },

    /// Send a raw command line
    Raw {
        /// The line to send verbatim
        line: String,
    },
}

fn main() {
    let args = Args::parse();

    let line = match &args.command {
        Commands::Get { name } => format!("q {name}"),
        Commands::Add { name, value } => format!("a {name} {value}"),
        Commands::Del { name } => format!("d {name}"),
        Commands::Raw { line } => line.clone(),
    };

    let timeout = Duration::from_millis(args.timeout);
    let addr = match args.server.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid server address {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let mut stream = match TcpStream::connect_timeout(&addr, timeout) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));
    let _ = stream.set_nodelay(true);

    // Single-stream sequential write-then-read: send the command line,
    // then wrap the same stream in a BufReader for the response.
    if let Err(e) = stream.write_all(format!("{line}\n").as_bytes()) {
        eprintln!("Failed to send command: {}", e);
        std::process::exit(1);
    }

    let mut reader = BufReader::new(&stream);
    let mut response = String::new();
    match reader.read_line(&mut response) {
        Ok(0) => {
            eprintln!("Server closed the connection");
            std::process::exit(1);
        }
        Ok(_) => print!("{response}"),
        Err(e) => {
            eprintln!("Failed to read response: {}", e);
            std::process::exit(1);
        }
    }
}
