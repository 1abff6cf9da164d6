use clap::Parser;
use env_content::content::EnvContent;
use std::path::PathBuf;

const SAMPLE: &str = "#This is a comment1
#This is a comment2

key1 = value1
key2 = value2
key3 = value3
key4 = value4

key5 = value5
key7 = value7";

#[derive(Parser)]
#[command(
  name = "env-content",
  about = "Load key=value env files and show what they contain",
  version,
  author
)]
struct Cli {
  /// Env files to load, later files overriding earlier ones
  #[arg(default_values = ["test1.txt", "test2.txt"])]
  files: Vec<PathBuf>,

  /// Export the loaded files to the environment of this process
  #[arg(short, long)]
  export: bool,

  /// Verbose output (-v for verbose, -vv for very verbose)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn setup_tracing(verbose: u8) {
  use tracing_subscriber::fmt;
  use tracing_subscriber::prelude::*;

  let log_level = match verbose {
    1 => "debug",
    2 => "trace",
    _ => "info",
  };

  tracing_subscriber::registry()
    .with(fmt::layer())
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
    ))
    .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  setup_tracing(cli.verbose);

  let mut env = EnvContent::new();

  if let Some(first) = cli.files.first() {
    println!("{}:", first.display());
    print_result(env.load_from_file(first));
  }

  println!("all files:");
  print_result(env.load_from_files(&cli.files));

  if cli.export {
    // SAFETY: single-threaded at this point, nothing else touches the environment.
    let exported = unsafe { env.export_to_env() }?;
    println!("exported {exported} variables");
  }

  println!("inline sample:");
  let mut sample = EnvContent::new();
  print_result(sample.load_from_str(SAMPLE));

  for key in ["key5", "key0"] {
    match sample.get(key) {
      Ok(value) => println!("{key} = {value}"),
      Err(err) => println!("{key}: {err}"),
    }
  }

  Ok(())
}

fn print_result<E: std::fmt::Display>(
  result: Result<&std::collections::HashMap<String, String>, E>,
) {
  match result {
    Ok(pairs) => {
      let mut keys: Vec<_> = pairs.keys().collect();
      keys.sort();
      for key in keys {
        println!("  {key} = {}", pairs[key]);
      }
    }
    Err(err) => println!("  error: {err}"),
  }
}
