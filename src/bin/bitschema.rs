//! bitschema CLI: layout inspection, visualization, JSON Schema export,
//! Rust code generation, and one-shot encode/decode against a schema file.
//!
//! Usage:
//!   bitschema layout schema.yaml
//!   bitschema visualize schema.yaml --format markdown
//!   bitschema jsonschema schema.yaml --indent 2
//!   bitschema generate schema.yaml --struct-name Packed
//!   bitschema encode schema.yaml data.json
//!   bitschema decode schema.yaml 85

use anyhow::Context;
use bitschema::{
    decode, encode, generate_json_schema, generate_rust_code, layout_report, load_schema,
    plan_schema, render_layout, Schema, TableFormat, Value,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bitschema",
    about = "Bit-level data packing with mathematical correctness",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the planned bit layout as JSON
    Layout {
        /// Schema file (JSON or YAML)
        schema_file: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render the bit layout as a table
    Visualize {
        schema_file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Ascii)]
        format: Format,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export JSON Schema Draft 2020-12
    Jsonschema {
        schema_file: PathBuf,
        /// JSON indentation spaces
        #[arg(long, default_value_t = 2)]
        indent: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate Rust code with encode/decode methods
    Generate {
        schema_file: PathBuf,
        /// Override the generated struct name
        #[arg(long)]
        struct_name: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Encode a data JSON file to a packed integer
    Encode {
        schema_file: PathBuf,
        /// Data file: JSON object mapping field names to values
        data_file: PathBuf,
    },
    /// Decode a packed integer back to data JSON
    Decode {
        schema_file: PathBuf,
        /// Packed unsigned integer (decimal, or hex with 0x prefix)
        packed: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Ascii,
    Markdown,
}

fn load(path: &PathBuf) -> anyhow::Result<(Schema, Vec<bitschema::FieldLayout>, u32)> {
    let schema = load_schema(path)?;
    let (layouts, total_bits) = plan_schema(&schema)?;
    Ok((schema, layouts, total_bits))
}

fn emit(output: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("written to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn parse_packed(s: &str) -> anyhow::Result<u64> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("invalid packed integer '{}'", s))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Layout {
            schema_file,
            output,
        } => {
            let (schema, layouts, total_bits) = load(&schema_file)?;
            let report = layout_report(&schema, &layouts, total_bits);
            emit(output.as_ref(), &serde_json::to_string_pretty(&report)?)
        }
        Command::Visualize {
            schema_file,
            format,
            output,
        } => {
            let (_, layouts, _) = load(&schema_file)?;
            let table_format = match format {
                Format::Ascii => TableFormat::Ascii,
                Format::Markdown => TableFormat::Markdown,
            };
            emit(output.as_ref(), &render_layout(&layouts, table_format))
        }
        Command::Jsonschema {
            schema_file,
            indent,
            output,
        } => {
            let (schema, layouts, _) = load(&schema_file)?;
            let doc = generate_json_schema(&schema, &layouts);
            let rendered = if indent == 0 {
                serde_json::to_string(&doc)?
            } else {
                let spaces = vec![b' '; indent];
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&spaces);
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                serde::Serialize::serialize(&doc, &mut ser)?;
                String::from_utf8(buf)?
            };
            emit(output.as_ref(), &rendered)
        }
        Command::Generate {
            schema_file,
            struct_name,
            output,
        } => {
            let (schema, layouts, _) = load(&schema_file)?;
            let code = generate_rust_code(&schema, &layouts, struct_name.as_deref());
            emit(output.as_ref(), &code)
        }
        Command::Encode {
            schema_file,
            data_file,
        } => {
            let (_, layouts, _) = load(&schema_file)?;
            let content = fs::read_to_string(&data_file)
                .with_context(|| format!("failed to read {}", data_file.display()))?;
            let data: HashMap<String, Value> = serde_json::from_str(&content)
                .with_context(|| format!("invalid data JSON in {}", data_file.display()))?;
            let packed = encode(&data, &layouts)?;
            println!("{}", packed);
            Ok(())
        }
        Command::Decode {
            schema_file,
            packed,
        } => {
            let (_, layouts, _) = load(&schema_file)?;
            let packed = parse_packed(&packed)?;
            let data = decode(packed, &layouts);
            // Emit fields in declaration order, not hash order.
            let mut doc = serde_json::Map::new();
            for layout in &layouts {
                if let Some(value) = data.get(&layout.name) {
                    doc.insert(layout.name.clone(), serde_json::to_value(value)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
