//! Ponto de entrada: treina a PCFG com um treebank, decodifica as sentenças do
//! conjunto gold em paralelo e grava `<experimento>.parsed`, `.gram` e `.lex`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pcfg_core::train::TrainStats;
use pcfg_core::{BatchParser, BatchSummary, Markovization, ParserConfig, Trainer, Treebank};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pcfg", about = "Treina uma PCFG e decodifica um treebank gold com CKY")]
struct Args {
    /// Treebank cujas sentenças serão decodificadas.
    gold: PathBuf,
    /// Treebank de treinamento.
    train: PathBuf,
    /// Prefixo dos arquivos de saída.
    experiment: String,
    /// Ordem da markovização horizontal (-1 = ilimitada).
    #[arg(short = 'm', long, allow_negative_numbers = true)]
    markovization: Option<i32>,
    /// Threads de decodificação (padrão: metade dos núcleos).
    #[arg(short = 't', long)]
    threads: Option<usize>,
    /// Arquivo JSON de configuração; os flags acima têm precedência.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Imprime um resumo JSON do treino e da decodificação.
    #[arg(long)]
    summary: bool,
}

#[derive(Serialize)]
struct Report {
    training: TrainStats,
    decoding: BatchSummary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        h = %config.markovization,
        cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        threads = config.thread_count(),
        "configuração"
    );

    let gold = Treebank::read(&args.gold).with_context(|| format!("lendo {}", args.gold.display()))?;
    let train = Treebank::read(&args.train).with_context(|| format!("lendo {}", args.train.display()))?;

    let (grammar, training) = Trainer::new(config.markovization).train(train.trees());
    let parser = BatchParser::new(&grammar, &config)?;
    let (outcomes, decoding) = parser.parse_all(&gold.yields());

    let experiment = &args.experiment;
    write_lines(
        format!("{experiment}.parsed"),
        outcomes.iter().map(|o| o.tree.to_string()),
    )?;
    write_lines(format!("{experiment}.gram"), grammar.write_rules())?;
    write_lines(format!("{experiment}.lex"), grammar.write_lexicon())?;

    if args.summary {
        let report = Report { training, decoding };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<ParserConfig> {
    let mut config = match &args.config {
        Some(path) => ParserConfig::from_json_file(path)
            .with_context(|| format!("lendo configuração {}", path.display()))?,
        None => ParserConfig::default(),
    };
    if let Some(h) = args.markovization {
        config.markovization = Markovization::try_from(h)?;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    config.validate()?;
    Ok(config)
}

fn write_lines(path: impl AsRef<Path>, lines: impl IntoIterator<Item = String>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("criando {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    info!(path = %path.display(), "arquivo gravado");
    Ok(())
}
