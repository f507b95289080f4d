//! Cellar CLI
//!
//! Command-line driver for a file-backed persistent list. Each invocation
//! opens the list file, performs one operation, and closes it again — the
//! list's contents survive between runs.

use std::fmt;
use std::path::PathBuf;

use bytes::{Buf, BufMut};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

use cellar::{PersistentList, Record, Result};

/// Fixed-size record driven by the CLI: a 4-byte value plus an 8-byte tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    value: i32,
    tag: [u8; 8],
}

impl Entry {
    fn new(value: i32, tag: &str) -> Self {
        let mut bytes = [0u8; 8];
        let src = tag.as_bytes();
        let len = src.len().min(8);
        bytes[..len].copy_from_slice(&src[..len]);
        Self { value, tag: bytes }
    }
}

impl Record for Entry {
    const SIZE: usize = 12;

    fn encode(&self, buf: &mut impl BufMut) {
        self.value.encode(buf);
        self.tag.encode(buf);
    }

    fn decode(buf: &mut impl Buf) -> Self {
        Self {
            value: Record::decode(buf),
            tag: Record::decode(buf),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = String::from_utf8_lossy(&self.tag);
        let tag = tag.trim_end_matches('\0');
        if tag.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} ({})", self.value, tag)
        }
    }
}

/// Cellar CLI
#[derive(Parser, Debug)]
#[command(name = "cellar-cli")]
#[command(about = "Driver for a file-backed persistent list")]
#[command(version)]
struct Args {
    /// Path to the list file
    #[arg(short, long, default_value = "cellar.list")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty list file
    New,

    /// Insert a value at the front
    PushFront {
        value: i32,

        /// Optional 8-byte tag
        #[arg(default_value = "")]
        tag: String,
    },

    /// Insert a value at the back
    PushBack {
        value: i32,

        /// Optional 8-byte tag
        #[arg(default_value = "")]
        tag: String,
    },

    /// Insert a value at a position
    Insert {
        position: u64,
        value: i32,

        /// Optional 8-byte tag
        #[arg(default_value = "")]
        tag: String,
    },

    /// Print the element at a position
    Get { position: u64 },

    /// Print the first element
    Front,

    /// Print the last element
    Back,

    /// Print the position of the first element with the given value
    Find { value: i32 },

    /// Remove and print the first element
    PopFront,

    /// Remove and print the last element
    PopBack,

    /// Remove and print the element at a position
    Remove { position: u64 },

    /// Print the number of elements
    Len,

    /// Remove all elements
    Clear,

    /// Print every element in order
    Dump,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cellar=info"));

    tracing_fmt().with_env_filter(filter).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if let Commands::New = args.command {
        let list = PersistentList::<Entry>::create(&args.file)?;
        list.close()?;
        println!("created {}", args.file.display());
        return Ok(());
    }

    let mut list = PersistentList::<Entry>::open(&args.file)?;

    match args.command {
        Commands::New => unreachable!("handled above"),
        Commands::PushFront { value, tag } => {
            list.push_front(Entry::new(value, &tag))?;
        }
        Commands::PushBack { value, tag } => {
            list.push_back(Entry::new(value, &tag))?;
        }
        Commands::Insert {
            position,
            value,
            tag,
        } => {
            list.insert(position, Entry::new(value, &tag))?;
        }
        Commands::Get { position } => {
            println!("{}", list.get(position)?);
        }
        Commands::Front => {
            println!("{}", list.front()?);
        }
        Commands::Back => {
            println!("{}", list.back()?);
        }
        Commands::Find { value } => match list.find(|e| e.value == value)? {
            Some(position) => println!("{position}"),
            None => println!("not found"),
        },
        Commands::PopFront => {
            println!("{}", list.pop_front()?);
        }
        Commands::PopBack => {
            println!("{}", list.pop_back()?);
        }
        Commands::Remove { position } => {
            println!("{}", list.remove(position)?);
        }
        Commands::Len => {
            println!("{}", list.len());
        }
        Commands::Clear => {
            list.clear()?;
        }
        Commands::Dump => {
            for (position, element) in list.iter().enumerate() {
                println!("{position}: {}", element?);
            }
        }
    }

    list.close()
}
