use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use brine_idl::{Codec, CodecLimits, Value};
use brine_idl_compiler::compile_schema;
use brine_idl_compiler::error::IdlError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bidl")]
#[command(about = "Check schemas and encode or decode binary payloads against them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema and print it as JSON
    Check {
        /// Input schema file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Encode a JSON value as the named struct
    Encode {
        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Struct to encode as
        #[arg(short, long)]
        name: String,

        /// Input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output binary file (if omitted, writes to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Decode a binary payload as the named struct and print it as JSON
    Decode {
        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Struct to decode as
        #[arg(short, long)]
        name: String,

        /// Input binary file
        #[arg(short, long)]
        input: PathBuf,

        /// Byte offset to start decoding at
        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[command(flatten)]
        limits: LimitArgs,
    },
}

#[derive(Args)]
struct LimitArgs {
    /// Maximum nesting depth of structs
    #[arg(long, default_value_t = CodecLimits::default().max_depth)]
    max_depth: usize,

    /// Maximum length in bytes of any length-prefixed payload
    #[arg(long, default_value_t = CodecLimits::default().max_length)]
    max_length: usize,
}

impl From<&LimitArgs> for CodecLimits {
    fn from(args: &LimitArgs) -> Self {
        CodecLimits {
            max_depth:  args.max_depth,
            max_length: args.max_length,
        }
    }
}

fn main() -> Result<(), IdlError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Check { input } => {
            let text = fs::read_to_string(input)?;
            let schema = compile_schema(&text)?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }

        Commands::Encode { schema, name, input, output, limits } => {
            let schema = compile_schema(&fs::read_to_string(schema)?)?;
            let value = Value::from_json_str(&fs::read_to_string(input)?)?;

            let bytes = Codec::new(&schema).with_limits(limits.into()).encode(name, &value)?;
            if let Some(out_path) = output {
                fs::write(out_path, &bytes)?;
                tracing::info!(path = %out_path.display(), bytes = bytes.len(), "wrote payload");
            } else {
                let mut stdout = io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
            Ok(())
        }

        Commands::Decode { schema, name, input, offset, limits } => {
            let schema = compile_schema(&fs::read_to_string(schema)?)?;
            let data = fs::read(input)?;

            let (value, end) = Codec::new(&schema).with_limits(limits.into()).decode(name, &data, *offset)?;
            tracing::info!(consumed = end.saturating_sub(*offset), end, "decoded payload");
            println!("{}", serde_json::to_string_pretty(&value.to_json())?);
            Ok(())
        }
    }
}
