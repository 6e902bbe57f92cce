//! Command-line interface for `certbox`.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use certbox_core::{
    CertificateData, CertificateDraft, CertificateRecord, CertificateStatus, DecryptionKey, Nonce,
};
use certbox_render::{RawHtmlPolicy, Renderer};
use certbox_viewer::{
    error_page, page_shell, Pipeline, RenderedCertificate, RpcFetcher, StaticPage, ViewerConfig,
    ViewerError,
};
use clap::{Args, Parser, Subcommand};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Encrypted certificate CLI.
#[derive(Parser)]
#[command(
    name = "certbox",
    version,
    author,
    about = "Seal certificates and render them the way the viewer page does"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a certificate with a fresh key and print its viewer link.
    Seal {
        /// Team name or a person's full name.
        #[arg(long, value_name = "NAME")]
        name: String,
        /// Template file rendered by viewers.
        #[arg(long, value_name = "FILE")]
        template: PathBuf,
        /// Template kind, e.g. `svg-template`.
        #[arg(long, default_value = "html-template")]
        kind: String,
        /// Template fields as a JSON object of strings.
        #[arg(long, value_name = "JSON")]
        fields: Option<String>,
        /// Registry id to put in the viewer link.
        #[arg(long)]
        id: Option<String>,
        /// Output path for the record JSON (stdout if absent).
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Viewer base address overriding the configuration.
        #[arg(long, value_name = "URL")]
        viewer_url: Option<String>,
        /// Optional RNG seed for reproducible keys and nonces.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Render a sealed record with the key from a viewer link.
    View {
        /// Record JSON file.
        #[arg(long, value_name = "FILE")]
        record: PathBuf,
        /// Viewer link carrying the key after `#`.
        #[arg(long, value_name = "URL")]
        url: String,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Fetch a record from the registry and render it.
    Fetch {
        /// Viewer link carrying the key after `#`.
        #[arg(long, value_name = "URL")]
        url: String,
        /// Registry id (taken from the link path if absent).
        #[arg(long)]
        id: Option<String>,
        /// JSON-RPC endpoint overriding the configuration.
        #[arg(long, value_name = "URL")]
        rpc_url: Option<String>,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Seal a sample certificate and render it back.
    Demo {
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Write a full HTML page here instead of printing the markup.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Permit `{{{raw}}}` insertions in the certificate template.
    #[arg(long, default_value_t = false)]
    allow_raw_html: bool,
    /// Render absent template fields as empty strings.
    #[arg(long, default_value_t = false)]
    lenient: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Seal {
            name,
            template,
            kind,
            fields,
            id,
            out,
            viewer_url,
            seed,
        } => cmd_seal(
            config,
            SealInput {
                name,
                template: &template,
                kind,
                fields: fields.as_deref(),
                id: id.as_deref(),
                viewer_url: viewer_url.as_deref(),
            },
            out.as_deref(),
            seed,
        ),
        Commands::View {
            record,
            url,
            render,
        } => cmd_view(&config, &record, &url, &render),
        Commands::Fetch {
            url,
            id,
            rpc_url,
            render,
        } => cmd_fetch(config, &url, id, rpc_url, &render).await,
        Commands::Demo { seed } => cmd_demo(&config, seed),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path).context("load configuration"),
        None => Ok(ViewerConfig::default()),
    }
}

struct SealInput<'a> {
    name: String,
    template: &'a Path,
    kind: String,
    fields: Option<&'a str>,
    id: Option<&'a str>,
    viewer_url: Option<&'a str>,
}

fn cmd_seal(
    mut config: ViewerConfig,
    input: SealInput<'_>,
    out: Option<&Path>,
    seed: Option<u64>,
) -> Result<()> {
    if let Some(viewer_url) = input.viewer_url {
        config.viewer_base_url = viewer_url.to_owned();
    }
    let certificate_template = fs::read_to_string(input.template)
        .with_context(|| format!("read {}", input.template.display()))?;
    let certificate_fields: BTreeMap<String, String> = match input.fields {
        Some(json) => {
            serde_json::from_str(json).context("parse --fields as a JSON object of strings")?
        }
        None => BTreeMap::new(),
    };
    let draft = CertificateDraft {
        issued_for_display_name: input.name,
        certificate_template_kind: input.kind,
        certificate_template,
        certificate_fields,
    };
    let data = draft.into_data().context("serialize certificate")?;

    let mut rng = seeded_rng(seed);
    let key = DecryptionKey::generate(&mut rng);
    let nonce = Nonce::generate(&mut rng);
    let record = CertificateRecord::seal(&data, &nonce, &key).context("seal certificate")?;
    let record_json = serde_json::to_string_pretty(&record).context("serialize record")?;

    match out {
        Some(path) => {
            fs::write(path, &record_json).with_context(|| format!("write {}", path.display()))?
        }
        None => println!("{record_json}"),
    }
    tracing::info!(
        ciphertext_len = record.encrypted_certificate_data.len(),
        "certificate sealed"
    );
    println!(
        "ciphertext length: {}",
        record.encrypted_certificate_data.len()
    );
    println!("nonce: {}", hex::encode(nonce.as_bytes()));
    println!("key: {}", key.to_hex());
    println!("link: {}", config.viewer_url(input.id, &key));
    Ok(())
}

fn cmd_view(config: &ViewerConfig, record_path: &Path, url: &str, args: &RenderArgs) -> Result<()> {
    let record = load_record(record_path)?;
    let page = StaticPage::new(url).with_certificate(record);
    let mut pipeline = Pipeline::new(renderer(config, args));
    let outcome = pipeline.run(&page);
    present(outcome, args.out.as_deref())
}

async fn cmd_fetch(
    mut config: ViewerConfig,
    url: &str,
    id: Option<String>,
    rpc_url: Option<String>,
    args: &RenderArgs,
) -> Result<()> {
    if let Some(rpc_url) = rpc_url {
        config.rpc_url = rpc_url;
    }
    let mut page = StaticPage::new(url);
    if let Some(id) = id {
        page = page.with_certificate_id(id);
    }
    let fetcher = RpcFetcher::new(&config).context("build RPC client")?;

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received, cancelling fetch");
                token.cancel();
            }
        });
    }

    let mut pipeline = Pipeline::new(renderer(&config, args));
    let outcome = pipeline.run_remote(&page, &fetcher, &token).await;
    present(outcome, args.out.as_deref())
}

fn cmd_demo(config: &ViewerConfig, seed: Option<u64>) -> Result<()> {
    let mut rng = seeded_rng(seed);
    let key = DecryptionKey::generate(&mut rng);
    let nonce = Nonce::generate(&mut rng);
    let data: CertificateData = serde_json::from_str(
        r#"{"certificate_template":"Hello {{name}}","name":"Ana"}"#,
    )
    .context("demo payload")?;
    let record = CertificateRecord::seal(&data, &nonce, &key).context("seal demo certificate")?;

    let link = config.viewer_url(Some("0"), &key);
    let page = StaticPage::new(link.as_str()).with_certificate(record);
    let rendered = Pipeline::new(Renderer::with_config(config.render_config()))
        .run(&page)
        .context("render demo certificate")?;

    println!("demo key: {}", key.to_hex());
    println!("nonce: {}", hex::encode(nonce.as_bytes()));
    println!("link: {link}");
    println!("rendered: {}", rendered.markup);
    if rendered.markup.as_str() != "Hello Ana" {
        bail!("demo roundtrip failed");
    }
    Ok(())
}

fn renderer(config: &ViewerConfig, args: &RenderArgs) -> Renderer {
    let mut render_config = config.render_config();
    if args.allow_raw_html {
        render_config.raw_html = RawHtmlPolicy::Allow;
    }
    if args.lenient {
        render_config.strict = false;
    }
    Renderer::with_config(render_config)
}

/// Prints or writes the markup; a failed run writes the error page and exits non-zero.
fn present(outcome: Result<RenderedCertificate, ViewerError>, out: Option<&Path>) -> Result<()> {
    let (title, markup) = match &outcome {
        Ok(rendered) => {
            if let Some(CertificateStatus::Revoked { reason }) = &rendered.status {
                eprintln!("warning: certificate has been revoked: {reason}");
            }
            let title = rendered.issued_for.as_deref().unwrap_or("Certificate");
            (title.to_owned(), rendered.markup.clone())
        }
        Err(err) => ("Certificate".to_owned(), error_page(err)),
    };

    match out {
        Some(path) => fs::write(path, page_shell(&title, &markup))
            .with_context(|| format!("write {}", path.display()))?,
        None => println!("{markup}"),
    }
    outcome.map(|_| ()).context("certificate viewer failed")
}

fn load_record(path: &Path) -> Result<CertificateRecord> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).context("parse certificate record")
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => {
            let mut seed_bytes = [0u8; 32];
            seed_bytes[..8].copy_from_slice(&value.to_le_bytes());
            ChaCha20Rng::from_seed(seed_bytes)
        }
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}
