use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tower_lsp::{LspService, Server};
use trlc_lsp::engine::{
    AnalysisEngine, AnalysisOutput, DiagnosticCollector, EngineFactory, ProgressObserver,
};
use trlc_lsp::TrlcLanguageServer;

#[derive(Parser)]
#[command(name = "trlc-lsp", about = "TRLC language server")]
struct Args {
    /// Serve over TCP instead of stdin/stdout
    #[arg(long)]
    tcp: bool,
    /// Bind to this address in TCP mode
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Bind to this port in TCP mode
    #[arg(long, default_value_t = 2087)]
    port: u16,
}

// TODO: replace with an adapter over the trlc analyzer crate once it is
// published; until then the server runs with document sync and empty
// analysis output.
struct PendingEngine;

impl AnalysisEngine for PendingEngine {
    fn register_include(&mut self, _root: &Path, _handler: &mut DiagnosticCollector) -> bool {
        true
    }

    fn register_file(
        &mut self,
        _path: &Path,
        _content: Option<&str>,
        _handler: &mut DiagnosticCollector,
    ) -> bool {
        true
    }

    fn process(
        &mut self,
        _handler: &mut DiagnosticCollector,
        _progress: &mut dyn ProgressObserver,
    ) -> AnalysisOutput {
        AnalysisOutput::default()
    }
}

struct PendingEngineFactory;

impl EngineFactory for PendingEngineFactory {
    fn create_engine(&self) -> Box<dyn AnalysisEngine> {
        Box::new(PendingEngine)
    }
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let factory: Arc<dyn EngineFactory> = Arc::new(PendingEngineFactory);

    if args.tcp {
        let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
            .await
            .expect("failed to bind TCP listener");
        let (stream, _) = listener
            .accept()
            .await
            .expect("failed to accept editor connection");
        let (read, write) = tokio::io::split(stream);
        let (service, socket) =
            LspService::new(move |client| TrlcLanguageServer::new(client, factory.clone()));
        Server::new(read, write, socket).serve(service).await;
    } else {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let (service, socket) =
            LspService::new(move |client| TrlcLanguageServer::new(client, factory.clone()));
        Server::new(stdin, stdout, socket).serve(service).await;
    }
}
