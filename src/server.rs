//! Main language server implementation.
//!
//! The server layer is deliberately thin: protocol handlers enqueue
//! change events or read the current analysis snapshot and delegate to
//! the query modules. All mutable state lives in the [`Session`]; the
//! validation worker is the only writer of analysis results.

use std::sync::Arc;

use tower_lsp::async_trait;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, GotoDefinitionParams, GotoDefinitionResponse, Hover,
    HoverContents, HoverParams, HoverProviderCapability, InitializeParams, InitializeResult,
    InitializedParams, Location, MarkupContent, MarkupKind, OneOf, Position, ReferenceParams,
    RenameParams, SemanticTokens, SemanticTokensFullOptions, SemanticTokensOptions,
    SemanticTokensParams, SemanticTokensResult, SemanticTokensServerCapabilities,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
    WorkDoneProgressOptions, WorkspaceEdit,
};
use tower_lsp::Client;
use tracing::debug;

use crate::completion::{completion_candidates, CompletionCandidate};
use crate::config::Settings;
use crate::diagnostics::{DiagnosticsPublisher, DiagnosticsSink};
use crate::documents::{path_from_uri, ChangeEvent};
use crate::engine::EngineFactory;
use crate::features::semantic_tokens;
use crate::index::token_at_greedy;
use crate::rename::build_rename;
use crate::resolve::{
    find_references, find_references_excluding_declarations, resolve_entity,
};
use crate::session::Session;
use crate::symbols::EntityId;
use crate::worker::{self, ChangeQueue};

pub struct TrlcLanguageServer<S: DiagnosticsSink = Client> {
    session: Arc<Session>,
    queue: ChangeQueue,
    publisher: Arc<DiagnosticsPublisher<S>>,
}

impl TrlcLanguageServer<Client> {
    pub fn new(client: Client, factory: Arc<dyn EngineFactory>) -> Self {
        Self::with_sink(client, factory)
    }
}

impl<S: DiagnosticsSink> TrlcLanguageServer<S> {
    /// Build the server around any diagnostics sink; tests substitute a
    /// recorder for the protocol client. Spawns the validation worker, so
    /// this must run inside a tokio runtime.
    pub fn with_sink(sink: S, factory: Arc<dyn EngineFactory>) -> Self {
        let session = Arc::new(Session::new());
        let publisher = Arc::new(DiagnosticsPublisher::new(sink));
        let queue = worker::spawn(session.clone(), factory, publisher.clone());
        Self {
            session,
            queue,
            publisher,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Entity under the cursor, resolved against the current snapshot.
    async fn entity_at(
        &self,
        uri: &Url,
        position: Position,
        include_builtins: bool,
    ) -> Option<(Arc<crate::symbols::AnalysisSnapshot>, EntityId)> {
        let snapshot = self.session.snapshot().await;
        let unit = snapshot.unit(uri)?;
        let (_, token) = token_at_greedy(unit, position)?;
        let entity = resolve_entity(token, &snapshot.symbols, include_builtins)?;
        Some((snapshot.clone(), entity))
    }
}

fn completion_item(candidate: CompletionCandidate) -> CompletionItem {
    CompletionItem {
        label: candidate.label,
        kind: Some(candidate.kind),
        detail: candidate.detail,
        insert_text: candidate.insert_text,
        ..CompletionItem::default()
    }
}

fn hover_markup(snapshot: &crate::symbols::AnalysisSnapshot, entity: EntityId) -> String {
    let entity = snapshot.symbols.entity(entity);
    match entity.package {
        Some(package) => format!(
            "**{}**, {} in package `{}`",
            entity.name,
            entity.kind_name(),
            snapshot.symbols.entity(package).name
        ),
        None => format!("**{}**, {}", entity.name, entity.kind_name()),
    }
}

#[async_trait]
impl<S: DiagnosticsSink> tower_lsp::LanguageServer for TrlcLanguageServer<S> {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Prefer workspace folders, falling back to the older root URI.
        #[allow(deprecated)]
        let root_uri = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or_else(|| params.root_uri.clone());
        if let Some(root) = root_uri.as_ref().and_then(path_from_uri) {
            *self.session.workspace_root.write().await = Some(root);
        }
        if let Some(settings) = params
            .initialization_options
            .as_ref()
            .and_then(Settings::from_value)
        {
            *self.session.settings.write().await = settings;
        }

        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            rename_provider: Some(OneOf::Left(true)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(vec![".".into(), "{".into(), "=".into()]),
                ..CompletionOptions::default()
            }),
            semantic_tokens_provider: Some(
                SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                    legend: semantic_tokens::legend(),
                    range: None,
                    full: Some(SemanticTokensFullOptions::Bool(true)),
                }),
            ),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "trlc-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.publisher
            .log("TRLC language server initialized".to_string())
            .await;
        // First full pass over the workspace.
        self.queue.enqueue(ChangeEvent::Rescan);
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.queue.enqueue(ChangeEvent::Update {
            uri: doc.uri,
            text: doc.text,
        });
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Sync kind is FULL, so the last change carries the whole text.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.queue.enqueue(ChangeEvent::Update {
                uri: params.text_document.uri,
                text: change.text,
            });
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.queue.enqueue(ChangeEvent::Delete {
            uri: params.text_document.uri,
        });
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if let Some(settings) = Settings::from_value(&params.settings) {
            *self.session.settings.write().await = settings;
            debug!("settings updated, forcing a rescan");
            self.queue.enqueue(ChangeEvent::Rescan);
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position_params = params.text_document_position_params;
        let uri = position_params.text_document.uri;
        let Some((snapshot, entity)) = self
            .entity_at(&uri, position_params.position, false)
            .await
        else {
            return Ok(None);
        };
        Ok(snapshot
            .symbols
            .entity(entity)
            .location
            .clone()
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let position_params = params.text_document_position;
        let uri = position_params.text_document.uri;
        let Some((snapshot, entity)) = self
            .entity_at(&uri, position_params.position, false)
            .await
        else {
            return Ok(None);
        };
        let locations = if params.context.include_declaration {
            find_references(&snapshot, entity, &uri)
        } else {
            find_references_excluding_declarations(&snapshot, entity, &uri)
        };
        Ok(Some(locations))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position_params = params.text_document_position_params;
        let uri = position_params.text_document.uri;
        let snapshot = self.session.snapshot().await;
        let Some(unit) = snapshot.unit(&uri) else {
            return Ok(None);
        };
        let Some((_, token)) = token_at_greedy(unit, position_params.position) else {
            return Ok(None);
        };
        let Some(entity) = resolve_entity(token, &snapshot.symbols, true) else {
            return Ok(None);
        };
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: hover_markup(&snapshot, entity),
            }),
            range: Some(token.range),
        }))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let position_params = params.text_document_position;
        let uri = position_params.text_document.uri;
        let snapshot = self.session.snapshot().await;
        let mode = self.session.settings.read().await.parsing;
        let history = self.publisher.history().await;
        match build_rename(
            &snapshot,
            &history,
            mode,
            &uri,
            position_params.position,
            &params.new_name,
        ) {
            Ok(changes) => Ok(Some(WorkspaceEdit {
                changes: Some(changes),
                ..WorkspaceEdit::default()
            })),
            // Precondition failures surface as a short human-readable
            // message, never as a crash or a partial edit.
            Err(reason) => Err(Error::invalid_params(reason.to_string())),
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position_params = params.text_document_position;
        let uri = position_params.text_document.uri;
        let trigger = params
            .context
            .and_then(|context| context.trigger_character)
            .and_then(|text| text.chars().next());
        let snapshot = self.session.snapshot().await;
        let items: Vec<CompletionItem> =
            completion_candidates(&snapshot, &uri, position_params.position, trigger)
                .into_iter()
                .map(completion_item)
                .collect();
        // Always a list, possibly empty; never an absent response.
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let snapshot = self.session.snapshot().await;
        let Some(unit) = snapshot.unit(&params.text_document.uri) else {
            return Ok(None);
        };
        let data = semantic_tokens::encode(unit, &snapshot.symbols);
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        })))
    }
}
