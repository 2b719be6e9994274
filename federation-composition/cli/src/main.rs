use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use federation_composition::CompositionError;
use federation_composition::CompositionResult;
use federation_composition::ServiceDefinition;
use federation_composition::build_federated_schema;
use federation_composition::compose_and_validate;
use federation_composition::normalize_type_defs;
use tracing_subscriber::EnvFilter;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Composes services and prints the composed schema, or the findings if there are any
    Compose {
        /// `name=path.graphql`, or a bare path named after its file stem. `-` reads stdin.
        #[arg(required = true)]
        services: Vec<String>,
        /// Print findings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Prints the normalized SDL of one service
    Normalize {
        /// The path to the service SDL, or `-` for stdin
        service: PathBuf,
    },
    /// Prints what `_service { sdl }` returns for one service
    Subgraph {
        /// The path to the service SDL, or `-` for stdin
        service: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Compose { services, json } => compose(&services, json),
        Command::Normalize { service } => normalize(&service),
        Command::Subgraph { service } => subgraph(&service),
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        io::read_to_string(io::stdin()).context("reading stdin")
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

/// Splits `name=path`; a bare path is named after its file stem.
fn parse_service_arg(arg: &str) -> (String, PathBuf) {
    if let Some((name, path)) = arg.split_once('=') {
        return (name.to_owned(), PathBuf::from(path));
    }
    let path = PathBuf::from(arg);
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| arg.to_owned());
    (name, path)
}

fn read_service(arg: &str) -> anyhow::Result<ServiceDefinition> {
    let (name, path) = parse_service_arg(arg);
    let sdl = read_input(&path)?;
    ServiceDefinition::parse(name.as_str(), &sdl).with_context(|| format!("parsing service {name}"))
}

fn compose(service_args: &[String], json: bool) -> anyhow::Result<ExitCode> {
    let services = service_args
        .iter()
        .map(|arg| read_service(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let result = compose_and_validate(&services)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.errors)?);
    } else {
        print_findings(&result.errors);
        if let Some(sdl) = servable_sdl(&result) {
            print!("{sdl}");
        }
    }
    Ok(if result.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// The composed SDL, unless an error-severity finding makes it unfit to serve.
fn servable_sdl(result: &CompositionResult) -> Option<String> {
    (!result.has_errors()).then(|| result.schema.print_sdl())
}

fn print_findings(findings: &[CompositionError]) {
    for finding in findings {
        eprintln!("{finding}");
    }
}

fn normalize(path: &Path) -> anyhow::Result<ExitCode> {
    let sdl = read_input(path)?;
    let document = apollo_compiler::ast::Document::parse(sdl, path)
        .map_err(|e| anyhow::anyhow!("{}", e.errors))?;
    print!("{}", normalize_type_defs(&document));
    Ok(ExitCode::SUCCESS)
}

fn subgraph(path: &Path) -> anyhow::Result<ExitCode> {
    let sdl = read_input(path)?;
    let document = apollo_compiler::ast::Document::parse(sdl, path)
        .map_err(|e| anyhow::anyhow!("{}", e.errors))?;
    let schema = build_federated_schema(&document)?;
    print!("{}", schema.service_sdl());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_services_after_their_file() {
        assert_eq!(
            parse_service_arg("accounts=schemas/a.graphql"),
            ("accounts".to_owned(), PathBuf::from("schemas/a.graphql"))
        );
        assert_eq!(
            parse_service_arg("schemas/reviews.graphql"),
            ("reviews".to_owned(), PathBuf::from("schemas/reviews.graphql"))
        );
    }

    fn compose_sdl(services: &[(&str, &str)]) -> CompositionResult {
        let services: Vec<ServiceDefinition> = services
            .iter()
            .map(|(name, sdl)| ServiceDefinition::parse(*name, sdl).unwrap())
            .collect();
        compose_and_validate(&services).unwrap()
    }

    #[test]
    fn prints_schema_when_only_warnings_are_found() {
        let result = compose_sdl(&[
            (
                "products",
                r#"extend type Query { product: Product } type Product @key(fields: "upc") { upc: String! name: String }"#,
            ),
            (
                "reviews",
                r#"extend type Product @key(fields: "upc") { upc: String! @external name: String @external score: Int }"#,
            ),
        ]);
        assert!(!result.errors.is_empty());
        assert!(!result.has_errors(), "{:?}", result.errors);
        let sdl = servable_sdl(&result).unwrap();
        assert!(sdl.contains("type Product"), "{sdl}");
    }

    #[test]
    fn withholds_schema_with_errors() {
        let result = compose_sdl(&[
            (
                "products",
                r#"extend type Query { product: Product } type Product @key(fields: "upc") { upc: String! }"#,
            ),
            (
                "reviews",
                r#"extend type Product @key(fields: "upc") { upc: String! score: Int }"#,
            ),
        ]);
        assert!(result.has_errors(), "{:?}", result.errors);
        assert_eq!(servable_sdl(&result), None);
    }
}
