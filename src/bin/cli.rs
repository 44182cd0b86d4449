//! EmberKV CLI Client
//!
//! Interactive shell that forwards each line to the server.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process;

use clap::{Parser, Subcommand};

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "Interactive client for the EmberKV server")]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 6370)]
    port: u16,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the client version
    Version,
}

fn main() {
    let args = Args::parse();

    if let Some(Commands::Version) = args.command {
        println!("EmberKV CLI v{}", emberkv::VERSION);
        return;
    }

    let addr = format!("{}:{}", args.host, args.port);
    if let Err(e) = run(&addr) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(addr: &str) -> io::Result<()> {
    let stream = TcpStream::connect(addr).map_err(|e| {
        io::Error::new(e.kind(), format!("cannot connect to {}: {}", addr, e))
    })?;
    let mut server_reader = BufReader::new(stream.try_clone()?);
    let mut server_writer = stream;
    println!("Connected to EmberKV server at {}", addr);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    let mut reply = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command.eq_ignore_ascii_case("exit") {
            break;
        }

        server_writer.write_all(command.as_bytes())?;
        server_writer.write_all(b"\n")?;
        server_writer.flush()?;

        reply.clear();
        if server_reader.read_line(&mut reply)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        println!("{}", reply.trim_end());
    }

    Ok(())
}
